//! busrpc-server - Server side of the request/response protocol
//!
//! Each [`ServerLoop`] instance consumes the shared request queue with a
//! prefetch of one and drives every delivery through:
//!
//! ```text
//! decode → RequestTranslator → Dispatcher → ResponsePublisher → ack
//! ```
//!
//! Malformed deliveries are rejected, handler failures become error
//! responses, and a delivery is acknowledged only after its response was
//! published. [`serve`] runs several competing instances until shutdown.

mod dispatcher;
mod publisher;
mod serve;
mod server_loop;
mod translator;

pub use dispatcher::Dispatcher;
pub use publisher::ResponsePublisher;
pub use serve::serve;
pub use server_loop::{LoopStats, ServerLoop};
pub use translator::RequestTranslator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Dispatcher, LoopStats, RequestTranslator, ResponsePublisher, ServerLoop, serve};
}
