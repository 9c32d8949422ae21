//! Banking assistant chat widget
//!
//! Binds to a page's chat elements, relays user questions to a `/api/chat`
//! backend and renders the exchange as timestamped message bubbles with the
//! backend's category/confidence metadata.
//!
//! # Architecture
//!
//! - **Widget**: owns the session and the UI flags, drives the page
//! - **Transport**: one JSON POST per message, validated at the boundary
//! - **Page**: in-process element tree standing in for the browser DOM
//!
//! # Modules
//!
//! - [`api`]: `/api/chat` client and wire types
//! - [`config`]: layered configuration and CLI arguments
//! - [`error`]: transport error types
//! - [`page`]: page document, events and HTML markup
//! - [`widget`]: the chat widget and its messages

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod api;
pub mod config;
pub mod error;
pub mod page;
pub mod widget;

pub use api::{BotReply, ChatTransport, HttpChatClient};
pub use config::WidgetConfig;
pub use error::{ChatError, ErrorKind};
pub use page::{Page, PageEvent};
pub use widget::{ChatWidget, InitOutcome, Message, SendOutcome, boot};
