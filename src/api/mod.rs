//! Client side of the `/api/chat` contract.
//!
//! - [`ChatTransport`]: the seam the widget sends through
//! - [`HttpChatClient`]: reqwest implementation
//! - [`BotReply`]: response validated at the network boundary

mod client;
mod types;

pub use client::{ChatTransport, HttpChatClient};
pub use types::{BotReply, ChatRequest, ChatResponseBody};
