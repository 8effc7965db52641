use std::sync::Arc;

use anyhow::Result;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use notify_domain::{NotifyError, NotifyResponse};

use crate::context::AppContext;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub channels: Vec<String>,
    pub read_stdin: bool,
}

/// One printed line per handled channel.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub populated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotifyOutcome {
    pub fn new(channel: &str, outcome: &Result<NotifyResponse, NotifyError>) -> Self {
        match outcome {
            Ok(response) => Self {
                channel: channel.to_string(),
                populated: Some(response.is_populated()),
                error: None,
            },
            Err(err) => Self {
                channel: channel.to_string(),
                populated: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub async fn run_standalone(options: RunOptions) -> Result<()> {
    let context = Arc::new(AppContext::new().await?);
    let ctx = CancellationToken::new();

    let canceler = ctx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested, canceling pending notifications");
        canceler.cancel();
    });

    if !options.channels.is_empty() {
        handle_channels(&context, &ctx, &options.channels).await;
    }
    if options.read_stdin {
        handle_stdin(&context, &ctx).await?;
    }
    if options.channels.is_empty() && !options.read_stdin {
        warn!("no channels given, pass channel ids as arguments or use --stdin");
    }

    let snapshot = context.metrics.snapshot();
    info!(
        "cache empty notifier finished: leader_calls={}, follower_joins={}, lock_timeouts={}, canceled_waits={}, abandoned_leaders={}",
        snapshot.leader_calls,
        snapshot.follower_joins,
        snapshot.lock_timeouts,
        snapshot.canceled_waits,
        snapshot.abandoned_leaders
    );
    Ok(())
}

async fn handle_channels(context: &AppContext, ctx: &CancellationToken, channels: &[String]) {
    let calls = channels.iter().map(|channel| async move {
        let outcome = context.handler.handle(ctx, channel).await;
        NotifyOutcome::new(channel, &outcome)
    });
    for outcome in join_all(calls).await {
        print_outcome(&outcome);
    }
}

async fn handle_stdin(context: &Arc<AppContext>, ctx: &CancellationToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    loop {
        let line = tokio::select! {
            _ = ctx.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let channel = line.trim().to_string();
        if channel.is_empty() {
            continue;
        }

        let context = Arc::clone(context);
        let ctx = ctx.clone();
        tasks.spawn(async move {
            let outcome = context.handler.handle(&ctx, &channel).await;
            print_outcome(&NotifyOutcome::new(&channel, &outcome));
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!("cache empty task failed: {}", err);
        }
    }
    Ok(())
}

fn print_outcome(outcome: &NotifyOutcome) {
    match serde_json::to_string(outcome) {
        Ok(line) => println!("{}", line),
        Err(err) => warn!("failed to encode outcome: channel={}, err={}", outcome.channel, err),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("sigterm handler unavailable: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
