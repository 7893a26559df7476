//! busrpc-transport - Wire envelopes and JSON codec
//!
//! This crate provides:
//! - [`Codec`] trait for encoding/decoding messages
//! - [`JsonCodec`] implementation for JSON transport
//! - [`WireMessage`] and [`MessageProperties`], the body-plus-metadata unit handed to the bus
//! - [`CallEnvelope`] and [`ResponseEnvelope`] with [`EnvelopeCodec`] translating them to and from wire messages

mod codec;
mod envelope;
mod message;

pub use codec::{Codec, CodecError, JsonCodec};
pub use envelope::{CallEnvelope, EnvelopeCodec, Parameters, ResponseEnvelope, STATUS_HEADER};
pub use message::{MessageProperties, WireMessage};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CallEnvelope, Codec, CodecError, EnvelopeCodec, JsonCodec, MessageProperties, Parameters,
        ResponseEnvelope, WireMessage,
    };
}
