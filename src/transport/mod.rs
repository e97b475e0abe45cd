mod errors;
pub mod openai;
mod sse;

use futures_util::Stream;
use std::future::Future;
use std::pin::Pin;

pub use errors::TransportError;
pub use openai::OpenAiTransport;

use crate::model::Message;

/// Lazy, finite, non-restartable sequence of reply fragments in arrival order.
pub type FragmentStream<'a> = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + 'a>>;

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<FragmentStream<'a>, TransportError>> + 'a>>;

/// Sends a conversation to the chat API and hands back the reply as fragments.
///
/// With `stream` unset the reply arrives as a single fragment. Implementations
/// never retry.
pub trait Transport {
    fn send<'a>(&'a self, messages: &'a [Message], stream: bool) -> TransportFuture<'a>;
}
