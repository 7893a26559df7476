//! Explicit server-mode entry point

use crate::{LoopStats, ServerLoop};
use busrpc_bus::MessageBus;
use busrpc_core::{Handler, RpcConfig, RpcError, RpcResult};
use busrpc_runtime::{ShutdownHandle, ShutdownSignal};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Run `config.instances` competing server loops until shutdown
///
/// Every instance consumes the same request queue. When one instance fails
/// (a transport error) the others are stopped as well and the first error
/// is returned; after a clean shutdown the per-instance stats are summed.
///
/// # Example
///
/// ```ignore
/// let shutdown = ShutdownHandle::new();
/// shutdown.trigger_on_ctrl_c();
/// let stats = serve(bus, Arc::new(UsersHandler::new()), &config, shutdown.signal()).await?;
/// ```
pub async fn serve(
    bus: Arc<dyn MessageBus>,
    handler: Arc<dyn Handler>,
    config: &RpcConfig,
    mut shutdown: ShutdownSignal,
) -> RpcResult<LoopStats> {
    config.validate()?;

    let first = ServerLoop::new(bus.clone(), handler.clone(), config);
    first.declare().await?;

    let local = ShutdownHandle::new();
    let mut loops = JoinSet::new();
    loops.spawn(first.run(local.signal()));
    for instance in 1..config.instances {
        let server = ServerLoop::new(bus.clone(), handler.clone(), config).with_instance(instance);
        loops.spawn(server.run(local.signal()));
    }

    info!(
        instances = config.instances,
        queue = %config.request_queue,
        handler = handler.name(),
        "Server mode started"
    );

    let forward = {
        let local = local.clone();
        tokio::spawn(async move {
            shutdown.wait().await;
            local.trigger();
        })
    };

    let mut total = LoopStats::default();
    let mut failure = None;
    while let Some(joined) = loops.join_next().await {
        let outcome = joined.unwrap_or_else(|join_error| {
            Err(RpcError::Internal(format!("server loop task failed: {join_error}")))
        });
        match outcome {
            Ok(stats) => total += stats,
            Err(err) => {
                error!(error = %err, "Server loop instance failed, stopping the others");
                local.trigger();
                failure.get_or_insert(err);
            }
        }
    }
    forward.abort();

    match failure {
        Some(err) => Err(err),
        None => {
            info!(?total, "Server mode stopped");
            Ok(total)
        }
    }
}
