pub mod grpc_proxy;
pub mod http_proxy;
pub mod proto;
pub mod registry_builder;

pub use grpc_proxy::*;
pub use http_proxy::*;
pub use registry_builder::*;
