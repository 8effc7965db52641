// Wire types and client of the backend cache empty RPC.
//
// package cachewake.proxy.v1;
// service CacheEmptyProxy {
//   rpc NotifyCacheEmpty(NotifyCacheEmptyRequest) returns (NotifyCacheEmptyResponse);
// }

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

use notify_domain::{NotifyRequest, NotifyResponse, NotifyResult};

pub const NOTIFY_CACHE_EMPTY_PATH: &str = "/cachewake.proxy.v1.CacheEmptyProxy/NotifyCacheEmpty";

#[derive(Clone, PartialEq, prost::Message)]
pub struct NotifyCacheEmptyRequest {
    #[prost(string, tag = "1")]
    pub channel: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NotifyCacheEmptyResult {
    #[prost(bool, tag = "1")]
    pub populated: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NotifyCacheEmptyResponse {
    #[prost(message, optional, tag = "1")]
    pub result: Option<NotifyCacheEmptyResult>,
}

impl From<&NotifyRequest> for NotifyCacheEmptyRequest {
    fn from(value: &NotifyRequest) -> Self {
        Self {
            channel: value.channel.clone(),
        }
    }
}

impl From<NotifyCacheEmptyResponse> for NotifyResponse {
    fn from(value: NotifyCacheEmptyResponse) -> Self {
        Self {
            result: value
                .result
                .map(|result| NotifyResult {
                    populated: result.populated,
                })
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEmptyProxyClient {
    inner: tonic::client::Grpc<Channel>,
}

impl CacheEmptyProxyClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn notify_cache_empty(
        &mut self,
        request: tonic::Request<NotifyCacheEmptyRequest>,
    ) -> Result<tonic::Response<NotifyCacheEmptyResponse>, tonic::Status> {
        self.inner
            .ready()
            .await
            .map_err(|err| tonic::Status::unknown(format!("service was not ready: {}", err)))?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static(NOTIFY_CACHE_EMPTY_PATH);
        self.inner.unary(request, path, codec).await
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn missing_result_decodes_as_not_populated() {
        let response = NotifyResponse::from(NotifyCacheEmptyResponse { result: None });
        assert!(!response.is_populated());
    }

    #[test]
    fn request_keeps_channel_on_the_wire() {
        let request = NotifyCacheEmptyRequest::from(&NotifyRequest::new("news:sport"));
        let bytes = request.encode_to_vec();
        let decoded = NotifyCacheEmptyRequest::decode(bytes.as_slice()).expect("decode");
        assert_eq!(decoded.channel, "news:sport");
    }
}
