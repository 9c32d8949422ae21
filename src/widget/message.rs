//! Rendered chat messages and the render-time clock.

use std::fmt;

use chrono::{Local, NaiveTime};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Category/confidence footer carried by some bot messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMeta {
    pub category: String,
    pub confidence: f64,
}

impl MessageMeta {
    /// Build the footer only when both parts are present.
    ///
    /// The backend reports an unknown intent as confidence `0`, so a zero
    /// confidence (or an empty category) means "no footer".
    #[must_use]
    pub fn from_parts(category: Option<String>, confidence: Option<f64>) -> Option<Self> {
        match (category, confidence) {
            (Some(category), Some(confidence)) if !category.is_empty() && confidence > 0.0 => {
                Some(Self {
                    category,
                    confidence,
                })
            }
            _ => None,
        }
    }

    /// Category in upper case, as displayed.
    #[must_use]
    pub fn category_display(&self) -> String {
        self.category.to_uppercase()
    }

    /// Confidence as a whole percentage, e.g. `87%`. Halves round up.
    #[must_use]
    pub fn confidence_display(&self) -> String {
        format!("{:.0}%", (self.confidence * 100.0).round())
    }
}

/// One message in the session. Immutable once rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    /// `HH:MM`, taken when the message was rendered.
    pub timestamp: String,
    pub meta: Option<MessageMeta>,
}

impl Message {
    #[must_use]
    pub fn user(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp: timestamp.into(),
            meta: None,
        }
    }

    #[must_use]
    pub fn bot(
        text: impl Into<String>,
        timestamp: impl Into<String>,
        meta: Option<MessageMeta>,
    ) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            timestamp: timestamp.into(),
            meta,
        }
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match self.sender {
            Sender::User => "vous",
            Sender::Bot => "assistant",
        };
        write!(f, "[{}] {who}: {}", self.timestamp, self.text)?;
        if let Some(meta) = &self.meta {
            write!(
                f,
                " ({} | {})",
                meta.category_display(),
                meta.confidence_display()
            )?;
        }
        Ok(())
    }
}

/// Source of wall-clock time for message timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;

    /// 24-hour `HH:MM`.
    fn timestamp(&self) -> String {
        self.now().format("%H:%M").to_string()
    }
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_requires_both_parts() {
        assert!(MessageMeta::from_parts(Some("cards".into()), None).is_none());
        assert!(MessageMeta::from_parts(None, Some(0.5)).is_none());
        assert!(MessageMeta::from_parts(Some(String::new()), Some(0.5)).is_none());
        assert!(MessageMeta::from_parts(Some("Inconnue".into()), Some(0.0)).is_none());
        assert!(MessageMeta::from_parts(Some("cards".into()), Some(0.5)).is_some());
    }

    #[test]
    fn test_meta_display() {
        let meta = MessageMeta::from_parts(Some("general".into()), Some(0.87)).unwrap();
        assert_eq!(meta.category_display(), "GENERAL");
        assert_eq!(meta.confidence_display(), "87%");
    }

    #[test]
    fn test_confidence_half_rounds_up() {
        let meta = MessageMeta::from_parts(Some("cartes".into()), Some(0.125)).unwrap();
        assert_eq!(meta.confidence_display(), "13%");

        let meta = MessageMeta::from_parts(Some("cartes".into()), Some(0.005)).unwrap();
        assert_eq!(meta.confidence_display(), "1%");
    }

    #[test]
    fn test_fixed_clock_timestamp_is_24h() {
        let clock = FixedClock(NaiveTime::from_hms_opt(21, 5, 59).unwrap());
        assert_eq!(clock.timestamp(), "21:05");
    }

    #[test]
    fn test_display_line() {
        let meta = MessageMeta::from_parts(Some("comptes".into()), Some(0.5));
        let msg = Message::bot("Votre solde est disponible.", "09:30", meta);
        assert_eq!(
            msg.to_string(),
            "[09:30] assistant: Votre solde est disponible. (COMPTES | 50%)"
        );
    }
}
