//! Serve command: in-process server loops answering calls read from stdin

use crate::line::{CallLine, is_blank};
use crate::session::LocalSession;
use anyhow::{Context, Result};
use busrpc_core::RpcConfig;
use busrpc_logging::init_logging_from_config;
use busrpc_runtime::{AsyncRuntime, RuntimeConfig, ShutdownSignal};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::info;

/// Run the serve command until stdin closes or Ctrl+C
pub fn run(config: RpcConfig) -> Result<()> {
    init_logging_from_config(&config)?;
    let runtime =
        AsyncRuntime::new(RuntimeConfig::from(&config).with_thread_name("busrpc-serve"))?;
    let shutdown = runtime.shutdown_handle();

    // Blocking stdin reads cannot be cancelled, so they stay off the runtime
    let (lines_tx, lines_rx) = mpsc::channel(64);
    std::thread::Builder::new()
        .name("busrpc-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if lines_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start stdin reader")?;

    let result = runtime.block_on(async {
        let _ctrl_c = shutdown.trigger_on_ctrl_c();
        let session = LocalSession::start(&config, shutdown.clone()).await?;
        info!(
            instances = config.instances,
            queue = %config.request_queue,
            "Reading calls from stdin (METHOD /path {{json}})"
        );
        let answered = answer_lines(&session, lines_rx, tokio::io::stdout(), shutdown.signal()).await;
        let stats = session.finish().await?;
        anyhow::Ok((answered?, stats))
    });
    runtime.shutdown(config.shutdown_timeout())?;

    let (answered, stats) = result?;
    info!(answered, ?stats, "Server stopped");
    Ok(())
}

/// Answer each call line until the input ends or shutdown is signalled
///
/// Every line gets exactly one output line: `STATUS BODY` for a reply, or
/// `error: ...` for a bad line or failed call. A transport failure ends the
/// loop with an error. Returns the number of replies written.
pub async fn answer_lines<W>(
    session: &LocalSession,
    mut lines: mpsc::Receiver<String>,
    mut output: W,
    mut shutdown: ShutdownSignal,
) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut answered = 0;
    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else { break };
        if is_blank(&line) {
            continue;
        }

        let text = match line.parse::<CallLine>() {
            Err(err) => format!("error: {err:#}"),
            Ok(call) => match session.call(&call).await {
                Ok(reply) => {
                    answered += 1;
                    format!("{} {}", reply.status, String::from_utf8_lossy(&reply.body))
                }
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => format!("error: {err}"),
            },
        };
        output.write_all(text.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(answered)
}

#[cfg(test)]
#[path = "serve/serve_tests.rs"]
mod serve_tests;
