//! In-process page document.
//!
//! [`Page`] stands in for the browser DOM: an element tree keyed by id that
//! carries exactly the state the widget reads and writes. It is cheap to
//! clone; clones share the same document.
//!
//! # Example
//!
//! ```rust
//! use bank_chat_widget::config::ElementIds;
//! use bank_chat_widget::page::Page;
//!
//! let ids = ElementIds::default();
//! let page = Page::standard(&ids).with_suggestions(&ids, ["Bloquer ma carte"]);
//!
//! assert!(page.activate_suggestion("suggestion-0", &ids));
//! assert_eq!(page.value(&ids.input).as_deref(), Some("Bloquer ma carte"));
//! ```

pub mod markup;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::config::ElementIds;

/// Kind of page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Scrollable container of rendered children.
    Container,
    /// Single-line text input.
    TextInput,
    /// Clickable control.
    Button,
    /// Block shown or hidden as a whole.
    Indicator,
}

/// A single element in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
    pub text: String,
    pub value: String,
    pub classes: Vec<String>,
    pub disabled: bool,
    pub visible: bool,
    /// Rendered child markup, in insertion order.
    pub children: Vec<String>,
    pub scroll_top: usize,
}

impl Element {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            text: String::new(),
            value: String::new(),
            classes: Vec::new(),
            disabled: false,
            visible: true,
            children: Vec::new(),
            scroll_top: 0,
        }
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// User interaction delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Click { target: String },
    KeyPress { target: String, key: String },
}

impl PageEvent {
    pub fn click(target: impl Into<String>) -> Self {
        Self::Click {
            target: target.into(),
        }
    }

    pub fn key_press(target: impl Into<String>, key: impl Into<String>) -> Self {
        Self::KeyPress {
            target: target.into(),
            key: key.into(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Click { target } | Self::KeyPress { target, .. } => target,
        }
    }
}

#[derive(Debug, Default)]
struct PageInner {
    elements: HashMap<String, Element>,
    /// Ids in insertion order.
    order: Vec<String>,
    focused: Option<String>,
}

/// Shared page document.
#[derive(Debug, Clone, Default)]
pub struct Page {
    inner: Arc<RwLock<PageInner>>,
}

impl Page {
    /// Empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Page carrying the four elements the widget binds to.
    ///
    /// The typing indicator starts hidden.
    #[must_use]
    pub fn standard(ids: &ElementIds) -> Self {
        let page = Self::new();
        page.insert(Element::new(&ids.message_list, ElementKind::Container));
        page.insert(Element::new(&ids.input, ElementKind::TextInput));
        page.insert(Element::new(&ids.send_button, ElementKind::Button));
        page.insert(Element::new(&ids.typing_indicator, ElementKind::Indicator).hidden());
        page
    }

    /// Add one suggestion button per label, with ids `suggestion-0`, `suggestion-1`, ...
    #[must_use]
    pub fn with_suggestions<I, S>(self, ids: &ElementIds, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (n, label) in labels.into_iter().enumerate() {
            self.insert(
                Element::new(format!("suggestion-{n}"), ElementKind::Button)
                    .class(&ids.suggestion_class)
                    .text(label),
            );
        }
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, PageInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PageInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, id: &str, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        self.write().elements.get_mut(id).map(f)
    }

    /// Insert (or replace) an element.
    pub fn insert(&self, element: Element) {
        let mut guard = self.write();
        if !guard.elements.contains_key(&element.id) {
            guard.order.push(element.id.clone());
        }
        guard.elements.insert(element.id.clone(), element);
    }

    /// Remove an element, returning it.
    pub fn remove(&self, id: &str) -> Option<Element> {
        let mut guard = self.write();
        guard.order.retain(|existing| existing != id);
        if guard.focused.as_deref() == Some(id) {
            guard.focused = None;
        }
        guard.elements.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.read().elements.contains_key(id)
    }

    /// Snapshot of an element.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<Element> {
        self.read().elements.get(id).cloned()
    }

    #[must_use]
    pub fn value(&self, id: &str) -> Option<String> {
        self.read().elements.get(id).map(|e| e.value.clone())
    }

    pub fn set_value(&self, id: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        self.update(id, |e| e.value = value).is_some()
    }

    #[must_use]
    pub fn text_content(&self, id: &str) -> Option<String> {
        self.read().elements.get(id).map(|e| e.text.clone())
    }

    pub fn focus(&self, id: &str) -> bool {
        let mut guard = self.write();
        if guard.elements.contains_key(id) {
            guard.focused = Some(id.to_string());
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn focused(&self) -> Option<String> {
        self.read().focused.clone()
    }

    pub fn set_disabled(&self, id: &str, disabled: bool) -> bool {
        self.update(id, |e| e.disabled = disabled).is_some()
    }

    /// Missing elements are reported as not disabled.
    #[must_use]
    pub fn is_disabled(&self, id: &str) -> bool {
        self.read().elements.get(id).is_some_and(|e| e.disabled)
    }

    pub fn set_visible(&self, id: &str, visible: bool) -> bool {
        self.update(id, |e| e.visible = visible).is_some()
    }

    /// Missing elements are reported as not visible.
    #[must_use]
    pub fn is_visible(&self, id: &str) -> bool {
        self.read().elements.get(id).is_some_and(|e| e.visible)
    }

    pub fn append_child_html(&self, id: &str, html: impl Into<String>) -> bool {
        let html = html.into();
        self.update(id, |e| e.children.push(html)).is_some()
    }

    #[must_use]
    pub fn children(&self, id: &str) -> Vec<String> {
        self.read()
            .elements
            .get(id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    /// Height of a container, counted in rendered children.
    #[must_use]
    pub fn scroll_height(&self, id: &str) -> usize {
        self.read().elements.get(id).map_or(0, |e| e.children.len())
    }

    #[must_use]
    pub fn scroll_top(&self, id: &str) -> usize {
        self.read().elements.get(id).map_or(0, |e| e.scroll_top)
    }

    pub fn scroll_to_bottom(&self, id: &str) -> bool {
        self.update(id, |e| e.scroll_top = e.children.len()).is_some()
    }

    /// Ids of elements carrying `class`, in insertion order.
    #[must_use]
    pub fn elements_with_class(&self, class: &str) -> Vec<String> {
        let guard = self.read();
        guard
            .order
            .iter()
            .filter(|id| guard.elements.get(*id).is_some_and(|e| e.has_class(class)))
            .cloned()
            .collect()
    }

    /// Click handler for suggestion buttons.
    ///
    /// Copies the suggestion's trimmed text into the input and focuses it.
    /// Never sends. Returns `false` when `target` is not a suggestion or the
    /// page has no input.
    pub fn activate_suggestion(&self, target: &str, ids: &ElementIds) -> bool {
        let label = {
            let guard = self.read();
            match guard.elements.get(target) {
                Some(e) if e.has_class(&ids.suggestion_class) => e.text.trim().to_string(),
                _ => return false,
            }
        };

        if !self.set_value(&ids.input, label.as_str()) {
            return false;
        }
        self.focus(&ids.input);

        debug!(
            name: "page.suggestion.activated",
            target = %target,
            label = %label,
            "Suggestion copied to input"
        );
        true
    }

    /// Page-level event dispatch for pages that do not host a widget.
    pub fn dispatch(&self, event: &PageEvent, ids: &ElementIds) -> bool {
        match event {
            PageEvent::Click { target } => self.activate_suggestion(target, ids),
            PageEvent::KeyPress { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_page_layout() {
        let ids = ElementIds::default();
        let page = Page::standard(&ids);

        assert!(page.contains("chatMessages"));
        assert!(page.contains("userInput"));
        assert!(page.contains("sendButton"));
        assert!(!page.is_visible("typingIndicator"));
        assert!(!page.is_disabled("sendButton"));
    }

    #[test]
    fn test_scroll_follows_children() {
        let page = Page::new();
        page.insert(Element::new("list", ElementKind::Container));

        page.append_child_html("list", "<div>a</div>");
        page.append_child_html("list", "<div>b</div>");
        assert_eq!(page.scroll_top("list"), 0);

        page.scroll_to_bottom("list");
        assert_eq!(page.scroll_top("list"), page.scroll_height("list"));
        assert_eq!(page.scroll_height("list"), 2);
    }

    #[test]
    fn test_missing_elements_are_inert() {
        let page = Page::new();
        assert!(!page.set_value("nope", "x"));
        assert!(!page.focus("nope"));
        assert!(!page.is_disabled("nope"));
        assert!(page.children("nope").is_empty());
    }

    #[test]
    fn test_remove_clears_focus() {
        let ids = ElementIds::default();
        let page = Page::standard(&ids);
        page.focus(&ids.input);

        let removed = page.remove(&ids.input).unwrap();
        assert_eq!(removed.kind, ElementKind::TextInput);
        assert!(page.focused().is_none());
        assert!(page.element(&ids.input).is_none());
    }

    #[test]
    fn test_suggestion_copies_trimmed_label() {
        let ids = ElementIds::default();
        let page = Page::standard(&ids);
        page.insert(
            Element::new("s1", ElementKind::Button)
                .class(&ids.suggestion_class)
                .text("  Quel est mon solde ?  "),
        );

        assert!(page.activate_suggestion("s1", &ids));
        assert_eq!(page.value(&ids.input).as_deref(), Some("Quel est mon solde ?"));
        assert_eq!(page.focused().as_deref(), Some("userInput"));
    }

    #[test]
    fn test_plain_button_is_not_a_suggestion() {
        let ids = ElementIds::default();
        let page = Page::standard(&ids);
        assert!(!page.activate_suggestion(&ids.send_button, &ids));
        assert_eq!(page.value(&ids.input).as_deref(), Some(""));
    }

    #[test]
    fn test_suggestion_without_input() {
        let ids = ElementIds::default();
        let page = Page::new().with_suggestions(&ids, ["Mes cartes"]);
        assert!(!page.dispatch(&PageEvent::click("suggestion-0"), &ids));
    }

    #[test]
    fn test_elements_with_class_keeps_order() {
        let ids = ElementIds::default();
        let page = Page::new().with_suggestions(&ids, ["a", "b", "c"]);
        assert_eq!(
            page.elements_with_class(&ids.suggestion_class),
            vec!["suggestion-0", "suggestion-1", "suggestion-2"]
        );
    }
}
