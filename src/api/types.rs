//! Wire types for `/api/chat` and the validated reply handed to rendering.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChatError, ErrorKind};

/// Request body posted to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message, already trimmed.
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw response body as the backend sends it.
///
/// Every field is optional on the wire; [`BotReply`] is the checked form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseBody {
    /// Application-level success flag.
    #[serde(default)]
    pub success: bool,
    /// Bot answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Intent category predicted by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Prediction confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Backend error detail on `success: false`. Never shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validated answer from the chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum BotReply {
    /// The backend produced an answer.
    Answer {
        text: String,
        category: Option<String>,
        confidence: Option<f64>,
    },
    /// The backend reported `success: false`.
    Failure {
        /// Backend-provided detail, for diagnostics only.
        detail: Option<String>,
    },
}

impl BotReply {
    /// Answer with no metadata.
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer {
            text: text.into(),
            category: None,
            confidence: None,
        }
    }

    /// Error kind carried by this reply: `Application` for a failure.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Answer { .. } => None,
            Self::Failure { .. } => Some(ErrorKind::Application),
        }
    }
}

impl TryFrom<ChatResponseBody> for BotReply {
    type Error = ChatError;

    fn try_from(body: ChatResponseBody) -> Result<Self, Self::Error> {
        if !body.success {
            return Ok(Self::Failure { detail: body.error });
        }

        let text = body.response.ok_or_else(|| {
            ChatError::MalformedResponse("success without a `response` field".to_string())
        })?;

        let confidence = match body.confidence {
            Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => Some(c),
            Some(c) => {
                warn!(
                    name: "api.chat.confidence_out_of_range",
                    confidence = c,
                    "Dropping confidence outside [0, 1]"
                );
                None
            }
            None => None,
        };

        Ok(Self::Answer {
            text,
            category: body.category,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<BotReply, ChatError> {
        let body: ChatResponseBody = serde_json::from_str(json).unwrap();
        BotReply::try_from(body)
    }

    #[test]
    fn test_request_serializes_message_only() {
        let json = serde_json::to_string(&ChatRequest::new("Bonjour")).unwrap();
        assert_eq!(json, r#"{"message":"Bonjour"}"#);
    }

    #[test]
    fn test_success_with_metadata() {
        let reply =
            parse(r#"{"success": true, "response": "Hi", "category": "general", "confidence": 0.87}"#)
                .unwrap();
        assert_eq!(reply.kind(), None);
        assert_eq!(
            reply,
            BotReply::Answer {
                text: "Hi".to_string(),
                category: Some("general".to_string()),
                confidence: Some(0.87),
            }
        );
    }

    #[test]
    fn test_failure_keeps_detail_for_logs() {
        let reply = parse(r#"{"success": false, "error": "NLP down"}"#).unwrap();
        assert_eq!(
            reply,
            BotReply::Failure {
                detail: Some("NLP down".to_string())
            }
        );
        assert_eq!(reply.kind(), Some(ErrorKind::Application));
    }

    #[test]
    fn test_missing_success_flag_is_failure() {
        let reply = parse(r#"{"response": "Hi"}"#).unwrap();
        assert!(matches!(reply, BotReply::Failure { detail: None }));
    }

    #[test]
    fn test_success_without_response_is_malformed() {
        let err = parse(r#"{"success": true, "category": "cards"}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedResponse(_)));
    }

    #[test]
    fn test_out_of_range_confidence_is_dropped() {
        let reply = parse(r#"{"success": true, "response": "ok", "confidence": 87}"#).unwrap();
        assert!(matches!(
            reply,
            BotReply::Answer {
                confidence: None,
                ..
            }
        ));
    }

    #[test]
    fn test_null_fields_accepted() {
        let reply =
            parse(r#"{"success": true, "response": "ok", "category": null, "confidence": null}"#)
                .unwrap();
        assert_eq!(reply, BotReply::answer("ok"));
    }
}
