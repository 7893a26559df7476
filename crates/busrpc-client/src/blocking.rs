//! Synchronous facade over [`RpcClient`]

use crate::{RpcClient, RpcReply};
use busrpc_bus::MessageBus;
use busrpc_core::{Method, RpcConfig, RpcResult};
use busrpc_runtime::{AsyncBridge, AsyncRuntime, RuntimeConfig};
use busrpc_transport::Parameters;
use std::sync::Arc;

/// Blocking correlated caller
///
/// Owns its own Tokio runtime, so it must not be used from inside an async
/// context. Calls block the current thread until the response arrives or
/// the deadline passes.
pub struct BlockingRpcClient {
    client: RpcClient,
    bridge: AsyncBridge,
}

impl BlockingRpcClient {
    /// Start a runtime and connect a client on it
    pub fn connect(bus: Arc<dyn MessageBus>, config: &RpcConfig) -> RpcResult<Self> {
        let runtime_config = RuntimeConfig::from(config).with_thread_name("busrpc-client");
        let bridge = AsyncBridge::new(Arc::new(AsyncRuntime::new(runtime_config)?));
        let client = bridge.call_sync(RpcClient::connect(bus, config))?;
        Ok(Self { client, bridge })
    }

    /// The underlying async client
    pub fn inner(&self) -> &RpcClient {
        &self.client
    }

    /// Issue a call and return the response body
    pub fn call(&self, method: Method, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.bridge
            .call_sync(self.client.call(method, path, parameters))
    }

    /// Issue a call and return status and body
    pub fn call_reply(
        &self,
        method: Method,
        path: &str,
        parameters: Parameters,
    ) -> RpcResult<RpcReply> {
        self.bridge
            .call_sync(self.client.call_reply(method, path, parameters))
    }

    /// `GET path`
    pub fn get(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Get, path, parameters)
    }

    /// `POST path`
    pub fn post(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Post, path, parameters)
    }

    /// `PUT path`
    pub fn put(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Put, path, parameters)
    }

    /// `DELETE path`
    pub fn delete(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Delete, path, parameters)
    }

    /// Close the client and shut its runtime down
    pub fn close(self) -> RpcResult<()> {
        self.bridge.call_sync(self.client.close())?;
        self.bridge.runtime().shutdown(self.client.timeout())
    }
}
