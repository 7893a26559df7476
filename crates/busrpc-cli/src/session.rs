//! In-process server plus caller sharing one bus

use crate::line::CallLine;
use anyhow::{Context, Result, bail};
use busrpc_bus::{InMemoryBus, MessageBus};
use busrpc_client::{RpcClient, RpcReply};
use busrpc_core::{Handler, RpcConfig, RpcResult};
use busrpc_logging::init_logging_from_config;
use busrpc_runtime::{AsyncRuntime, RuntimeConfig, ShutdownHandle};
use busrpc_server::{LoopStats, ServerLoop, serve};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use users_service::UsersHandler;

/// Server loops serving the users service, and a caller connected to them
pub struct LocalSession {
    shutdown: ShutdownHandle,
    server: JoinHandle<RpcResult<LoopStats>>,
    client: RpcClient,
}

impl LocalSession {
    /// Start `config.instances` server loops and connect a caller
    pub async fn start(config: &RpcConfig, shutdown: ShutdownHandle) -> Result<Self> {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let handler: Arc<dyn Handler> = Arc::new(UsersHandler::new());

        // Queues must exist before the caller publishes its first call
        ServerLoop::new(bus.clone(), handler.clone(), config)
            .declare()
            .await
            .context("Failed to declare queues")?;

        let server = tokio::spawn({
            let bus = bus.clone();
            let config = config.clone();
            let signal = shutdown.signal();
            async move { serve(bus, handler, &config, signal).await }
        });

        let client = RpcClient::connect(bus, config)
            .await
            .context("Failed to connect caller")?;

        Ok(Self {
            shutdown,
            server,
            client,
        })
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Issue one call
    pub async fn call(&self, call: &CallLine) -> RpcResult<RpcReply> {
        self.client
            .call_reply(call.method, &call.path, call.parameters.clone())
            .await
    }

    /// Stop the server loops and return their combined stats
    pub async fn finish(self) -> Result<LoopStats> {
        self.client.close().await?;
        self.shutdown.trigger();
        let stats = self.server.await.context("Server task failed")??;
        Ok(stats)
    }
}

/// Run the call command: one call against a fresh in-process server
pub fn call_once(config: RpcConfig, call: CallLine) -> Result<()> {
    init_logging_from_config(&config)?;
    let runtime = AsyncRuntime::new(RuntimeConfig::from(&config).with_thread_name("busrpc-call"))?;

    let reply = runtime.block_on(async {
        let session = LocalSession::start(&config, runtime.shutdown_handle()).await?;
        let reply = session.call(&call).await;
        let stats = session.finish().await?;
        info!(?stats, "Session finished");
        anyhow::Ok(reply?)
    });
    runtime.shutdown(config.shutdown_timeout())?;
    let reply = reply?;

    println!("{}", String::from_utf8_lossy(&reply.body));
    if !reply.is_success() {
        bail!("{} {} failed with status {}", call.method, call.path, reply.status);
    }
    Ok(())
}
