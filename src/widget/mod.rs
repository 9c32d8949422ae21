//! The chat widget.
//!
//! [`ChatWidget`] binds to the page elements named in
//! [`ElementIds`](crate::config::ElementIds), relays user input through a
//! [`ChatTransport`] and renders the exchange as timestamped bubbles.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bank_chat_widget::api::HttpChatClient;
//! use bank_chat_widget::config::WidgetConfig;
//! use bank_chat_widget::page::{Page, PageEvent};
//! use bank_chat_widget::widget::boot;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WidgetConfig::default();
//! let page = Page::standard(&config.elements);
//! let transport = Arc::new(HttpChatClient::from_config(&config.endpoint)?);
//!
//! let widget = boot(page.clone(), transport, config.clone()).expect("page hosts a widget");
//! page.set_value(&config.elements.input, "Quel est mon solde ?");
//! widget
//!     .handle_event(&PageEvent::click(&config.elements.send_button))
//!     .await;
//! # Ok(())
//! # }
//! ```

mod message;

pub use message::{Clock, FixedClock, Message, MessageMeta, Sender, SystemClock};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{BotReply, ChatRequest, ChatTransport};
use crate::config::WidgetConfig;
use crate::error::ChatError;
use crate::page::markup::message_html;
use crate::page::{Page, PageEvent};

/// Result of [`ChatWidget::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Bound to the page; the greeting is scheduled when a runtime is running.
    Initialized,
    /// A previous call already succeeded.
    AlreadyInitialized,
    /// The page has no message list, so it hosts no widget.
    Absent,
}

/// Result of one [`ChatWidget::send_message`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was empty after trimming; nothing happened.
    Skipped,
    /// Another request is still pending; nothing happened.
    Busy,
    /// The bot answered.
    Answered,
    /// The backend replied `success: false`.
    ApplicationFailure,
    /// Non-2xx status, transport failure or malformed body.
    TransportFailure,
}

/// Result of [`ChatWidget::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The widget does not listen to this event.
    Ignored,
    /// A suggestion was copied into the input.
    SuggestionApplied,
    /// The event triggered a send.
    Sent(SendOutcome),
}

/// Snapshot of the widget's UI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetState {
    pub initialized: bool,
    /// Mirrors the send control's disabled flag.
    pub input_enabled: bool,
    pub typing_visible: bool,
}

struct WidgetInner {
    page: Page,
    transport: Arc<dyn ChatTransport>,
    config: WidgetConfig,
    clock: Arc<dyn Clock>,
    session: RwLock<Vec<Message>>,
    initialized: AtomicBool,
    in_flight: AtomicBool,
    welcome: Mutex<Option<JoinHandle<()>>>,
}

/// Chat widget bound to one page.
///
/// Cloning is cheap; clones drive the same widget.
#[derive(Clone)]
pub struct ChatWidget {
    inner: Arc<WidgetInner>,
}

impl fmt::Debug for ChatWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatWidget")
            .field("state", &self.state())
            .field("messages", &self.message_count())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag when a send finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Initialize a widget if `page` hosts one.
///
/// Returns `None` when the message list is missing. The greeting is only
/// scheduled when called from within a Tokio runtime.
pub fn boot(
    page: Page,
    transport: Arc<dyn ChatTransport>,
    config: WidgetConfig,
) -> Option<ChatWidget> {
    if !page.contains(&config.elements.message_list) {
        debug!(name: "widget.boot.absent", "Page has no chat widget");
        return None;
    }
    let widget = ChatWidget::new(page, transport, config);
    widget.initialize();
    Some(widget)
}

impl ChatWidget {
    /// Create an uninitialized widget using the system clock.
    pub fn new(page: Page, transport: Arc<dyn ChatTransport>, config: WidgetConfig) -> Self {
        Self::with_clock(page, transport, config, Arc::new(SystemClock))
    }

    /// Create an uninitialized widget with a custom clock.
    pub fn with_clock(
        page: Page,
        transport: Arc<dyn ChatTransport>,
        config: WidgetConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(WidgetInner {
                page,
                transport,
                config,
                clock,
                session: RwLock::new(Vec::new()),
                initialized: AtomicBool::new(false),
                in_flight: AtomicBool::new(false),
                welcome: Mutex::new(None),
            }),
        }
    }

    /// Bind to the page and schedule the greeting.
    ///
    /// Idempotent. Outside a Tokio runtime the widget still binds but no
    /// greeting is scheduled.
    pub fn initialize(&self) -> InitOutcome {
        let page = &self.inner.page;
        let ids = &self.inner.config.elements;

        if !page.contains(&ids.message_list) {
            return InitOutcome::Absent;
        }
        if self
            .inner
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return InitOutcome::AlreadyInitialized;
        }

        for id in [&ids.input, &ids.send_button] {
            if !page.contains(id) {
                warn!(name: "widget.element.missing", id = %id, "Widget element not found");
            }
        }
        page.focus(&ids.input);

        if let Ok(runtime) = Handle::try_current() {
            let widget = self.clone();
            let delay = self.inner.config.timing.welcome_delay();
            let handle = runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let greeting = widget.inner.config.labels.welcome.clone();
                widget.add_bot_message(greeting, None);
            });
            *self
                .inner
                .welcome
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        } else {
            warn!(
                name: "widget.welcome.skipped",
                "No Tokio runtime; greeting not scheduled"
            );
        }

        info!(
            name: "widget.initialized",
            message_list = %ids.message_list,
            welcome_delay_ms = self.inner.config.timing.welcome_delay_ms,
            "Chat widget initialized"
        );
        InitOutcome::Initialized
    }

    /// Wait until the scheduled greeting has been rendered.
    ///
    /// Returns immediately if no greeting is pending.
    pub async fn wait_for_welcome(&self) {
        let handle = self
            .inner
            .welcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(name: "widget.welcome.failed", error = %e, "Greeting task failed");
            }
        }
    }

    /// Route a page event to the widget.
    ///
    /// Send-button clicks (while enabled) and `Enter` in the input trigger a
    /// send once the widget is initialized. Suggestion clicks are handled
    /// regardless.
    pub async fn handle_event(&self, event: &PageEvent) -> EventOutcome {
        let ids = &self.inner.config.elements;
        let page = &self.inner.page;
        let bound = self.is_initialized();

        match event {
            PageEvent::Click { target } if bound && *target == ids.send_button => {
                if page.is_disabled(target) {
                    return EventOutcome::Ignored;
                }
                EventOutcome::Sent(self.send_message().await)
            }
            PageEvent::KeyPress { target, key } if bound && *target == ids.input => {
                if key != "Enter" {
                    return EventOutcome::Ignored;
                }
                EventOutcome::Sent(self.send_message().await)
            }
            PageEvent::Click { target } => {
                if page.activate_suggestion(target, ids) {
                    EventOutcome::SuggestionApplied
                } else {
                    EventOutcome::Ignored
                }
            }
            PageEvent::KeyPress { .. } => EventOutcome::Ignored,
        }
    }

    /// Send the current input value.
    ///
    /// Renders the user message, clears the input, disables the send control
    /// and shows the typing indicator before the request; hides the indicator
    /// and re-enables the control once the reply (or the error) is rendered.
    pub async fn send_message(&self) -> SendOutcome {
        let page = &self.inner.page;
        let ids = &self.inner.config.elements;

        let text = page.value(&ids.input).unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return SendOutcome::Skipped;
        }

        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(name: "widget.send.busy", "Request already pending; ignoring send");
            return SendOutcome::Busy;
        }
        let _in_flight = InFlight(&self.inner.in_flight);

        self.add_message(Message::user(text.as_str(), self.inner.clock.timestamp()));
        page.set_value(&ids.input, "");
        page.set_disabled(&ids.send_button, true);
        self.show_typing_indicator();

        let outcome = match self.inner.transport.send(&ChatRequest::new(text)).await {
            Ok(reply) => self.handle_bot_response(reply),
            Err(e) => {
                self.handle_error(&e);
                SendOutcome::TransportFailure
            }
        };

        self.hide_typing_indicator();
        page.set_disabled(&ids.send_button, false);
        outcome
    }

    /// Render a validated reply.
    pub fn handle_bot_response(&self, reply: BotReply) -> SendOutcome {
        let kind = reply.kind();
        match reply {
            BotReply::Answer {
                text,
                category,
                confidence,
            } => {
                let meta = MessageMeta::from_parts(category, confidence);
                debug!(
                    name: "widget.reply.answer",
                    category = ?meta.as_ref().map(|m| m.category.as_str()),
                    "Rendering bot answer"
                );
                self.add_bot_message(text, meta);
                SendOutcome::Answered
            }
            BotReply::Failure { detail } => {
                warn!(
                    name: "widget.reply.failure",
                    kind = ?kind,
                    detail = ?detail,
                    "Chat backend reported failure"
                );
                let apology = self.inner.config.labels.apology.clone();
                self.add_bot_message(apology, None);
                SendOutcome::ApplicationFailure
            }
        }
    }

    /// Log a failed round trip and render the fixed "didn't understand" reply.
    pub fn handle_error(&self, err: &ChatError) {
        error!(
            name: "widget.send.failed",
            error = %err,
            status = ?err.status(),
            kind = ?err.kind(),
            "Chat request failed"
        );
        self.hide_typing_indicator();
        let fallback = self.inner.config.labels.not_understood.clone();
        self.add_bot_message(fallback, None);
    }

    /// Append a message to the session and the page, then scroll to it.
    ///
    /// Dropped when the message list is no longer on the page, so the session
    /// keeps mirroring the rendered children.
    pub fn add_message(&self, message: Message) {
        let page = &self.inner.page;
        let list = &self.inner.config.elements.message_list;

        if !page.append_child_html(list, message_html(&message, &self.inner.config.labels)) {
            warn!(
                name: "widget.message.dropped",
                message_list = %list,
                "Message list missing; message not rendered"
            );
            return;
        }
        page.scroll_to_bottom(list);
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    fn add_bot_message(&self, text: impl Into<String>, meta: Option<MessageMeta>) {
        self.add_message(Message::bot(text, self.inner.clock.timestamp(), meta));
    }

    pub fn show_typing_indicator(&self) {
        let ids = &self.inner.config.elements;
        let page = &self.inner.page;
        if page.set_visible(&ids.typing_indicator, true) {
            page.scroll_to_bottom(&ids.message_list);
        }
    }

    pub fn hide_typing_indicator(&self) {
        self.inner
            .page
            .set_visible(&self.inner.config.elements.typing_indicator, false);
    }

    /// Messages rendered so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn state(&self) -> WidgetState {
        let ids = &self.inner.config.elements;
        let page = &self.inner.page;
        WidgetState {
            initialized: self.is_initialized(),
            input_enabled: !page.is_disabled(&ids.send_button),
            typing_visible: page.is_visible(&ids.typing_indicator),
        }
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.inner.page
    }

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::NaiveTime;

    use crate::error::Result;

    struct Canned(BotReply);

    #[async_trait]
    impl ChatTransport for Canned {
        async fn send(&self, _request: &ChatRequest) -> Result<BotReply> {
            Ok(self.0.clone())
        }
    }

    fn widget(reply: BotReply) -> ChatWidget {
        let config = WidgetConfig::default();
        let page = Page::standard(&config.elements);
        let clock = Arc::new(FixedClock(NaiveTime::from_hms_opt(14, 3, 0).unwrap()));
        ChatWidget::with_clock(page, Arc::new(Canned(reply)), config, clock)
    }

    #[test]
    fn test_answer_with_zero_confidence_has_no_footer() {
        let w = widget(BotReply::answer("unused"));
        let outcome = w.handle_bot_response(BotReply::Answer {
            text: "Je ne sais pas.".to_string(),
            category: Some("Inconnue".to_string()),
            confidence: Some(0.0),
        });
        assert_eq!(outcome, SendOutcome::Answered);
        let messages = w.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].meta.is_none());
    }

    #[test]
    fn test_add_message_scrolls_to_newest() {
        let w = widget(BotReply::answer("unused"));
        w.add_message(Message::user("un", "14:03"));
        w.add_message(Message::user("deux", "14:03"));

        let list = &w.config().elements.message_list;
        assert_eq!(w.page().children(list).len(), 2);
        assert_eq!(w.page().scroll_top(list), 2);
    }

    #[test]
    fn test_message_dropped_when_list_removed() {
        let w = widget(BotReply::answer("unused"));
        let list = w.config().elements.message_list.clone();
        w.add_message(Message::user("avant", "14:03"));

        w.page().remove(&list);
        w.add_message(Message::user("après", "14:03"));

        assert_eq!(w.message_count(), 1);
        assert_eq!(w.messages()[0].text, "avant");
    }

    #[test]
    fn test_initialize_without_runtime_binds_without_greeting() {
        let w = widget(BotReply::answer("unused"));
        assert_eq!(w.initialize(), InitOutcome::Initialized);
        assert!(w.is_initialized());
        assert_eq!(
            w.page().focused().as_deref(),
            Some(w.config().elements.input.as_str())
        );
        assert_eq!(w.message_count(), 0);
        assert_eq!(w.initialize(), InitOutcome::AlreadyInitialized);
    }

    #[test]
    fn test_typing_indicator_toggle() {
        let w = widget(BotReply::answer("unused"));
        assert!(!w.state().typing_visible);
        w.show_typing_indicator();
        assert!(w.state().typing_visible);
        w.hide_typing_indicator();
        assert!(!w.state().typing_visible);
    }

    #[tokio::test]
    async fn test_uninitialized_widget_ignores_send_click() {
        let w = widget(BotReply::answer("Bonjour"));
        let ids = w.config().elements.clone();
        w.page().set_value(&ids.input, "Salut");

        let outcome = w.handle_event(&PageEvent::click(&ids.send_button)).await;
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(w.message_count(), 0);
    }

    #[tokio::test]
    async fn test_send_uses_fixed_clock() {
        let w = widget(BotReply::answer("Bonjour"));
        let ids = w.config().elements.clone();
        w.page().set_value(&ids.input, "Salut");

        assert_eq!(w.send_message().await, SendOutcome::Answered);
        let messages = w.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.timestamp == "14:03"));
    }

    #[tokio::test]
    async fn test_other_keys_do_not_send() {
        let w = widget(BotReply::answer("Bonjour"));
        let ids = w.config().elements.clone();
        w.initialize();
        w.page().set_value(&ids.input, "Salut");

        let outcome = w.handle_event(&PageEvent::key_press(&ids.input, "a")).await;
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(w.page().value(&ids.input).as_deref(), Some("Salut"));
    }
}
