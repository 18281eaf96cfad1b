use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Minimum message length (in chars, after trimming) accepted for analysis.
pub const MIN_MESSAGE_CHARS: usize = 5;

/// How long an error stays on screen before auto-dismissing back to `Initial`.
pub const ERROR_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Request body for the `/predict` endpoint.
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub message: &'a str,
}

/// Decoded successful response from the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The analyzed message, echoed back by the server.
    pub message: String,
    pub is_spam: bool,
    /// Human-readable label, e.g. "Spam" or "Not Spam".
    pub prediction: String,
    /// Confidence percentage in [0, 100].
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn tier(&self) -> AccuracyTier {
        AccuracyTier::from_confidence(self.confidence)
    }

    /// Display string for the accuracy line, e.g. "High (92% confidence)".
    pub fn accuracy_text(&self) -> String {
        format!("{} ({}% confidence)", self.tier().label(), self.confidence)
    }

    pub fn verdict_text(&self) -> &'static str {
        if self.is_spam {
            "This message appears to be SPAM"
        } else {
            "This message appears to be LEGITIMATE"
        }
    }
}

/// Confidence bucketed into a display-only accuracy label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyTier {
    Low,
    Medium,
    High,
}

impl AccuracyTier {
    pub fn from_confidence(pct: f64) -> Self {
        if pct < 60.0 {
            AccuracyTier::Low
        } else if pct < 80.0 {
            AccuracyTier::Medium
        } else {
            AccuracyTier::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccuracyTier::Low => "Low",
            AccuracyTier::Medium => "Medium",
            AccuracyTier::High => "High",
        }
    }
}

/// Everything that can go wrong between hitting submit and rendering a result.
///
/// All variants are recoverable: they resolve to the `Error` view state with
/// `user_message()` and never propagate past the controller.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("empty input")]
    EmptyInput,

    #[error("input shorter than {MIN_MESSAGE_CHARS} chars")]
    TooShort,

    /// No HTTP response was obtained at all.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server responded with a non-success status.
    #[error("server returned {status}")]
    Server {
        status: u16,
        /// `message` field of the error body, when the body was JSON.
        detail: Option<String>,
    },

    /// Transport succeeded but the body was not valid JSON.
    #[error("invalid response body")]
    Decode,

    /// Well-formed response that self-reports failure via its `error` field.
    #[error("prediction failed")]
    Logical { detail: Option<String> },
}

impl ClassifyError {
    /// The exact message shown in the error region for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ClassifyError::EmptyInput => "Please enter a message to analyze".into(),
            ClassifyError::TooShort => {
                "Message is too short. Please enter at least 5 characters.".into()
            }
            ClassifyError::Transport(_) => {
                "Failed to connect to the server. Please check your network and try again.".into()
            }
            ClassifyError::Server { status, detail } => match detail {
                Some(msg) => format!("Server returned {status} - {msg}"),
                None => format!("Server returned {status}"),
            },
            ClassifyError::Decode => "Received invalid response from server.".into(),
            ClassifyError::Logical { detail } => detail
                .clone()
                .unwrap_or_else(|| "An error occurred during prediction".into()),
        }
    }
}

/// Validate a trimmed message before any network activity.
pub fn validate_message(trimmed: &str) -> Result<(), ClassifyError> {
    if trimmed.is_empty() {
        return Err(ClassifyError::EmptyInput);
    }
    if trimmed.chars().count() < MIN_MESSAGE_CHARS {
        return Err(ClassifyError::TooShort);
    }
    Ok(())
}

/// The single enumerated mode controlling which UI region is visible.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Initial,
    Loading,
    Result(ClassificationResult),
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_mapping_is_total_over_range() {
        assert_eq!(AccuracyTier::from_confidence(0.0), AccuracyTier::Low);
        assert_eq!(AccuracyTier::from_confidence(59.999), AccuracyTier::Low);
        assert_eq!(AccuracyTier::from_confidence(60.0), AccuracyTier::Medium);
        assert_eq!(AccuracyTier::from_confidence(79.999), AccuracyTier::Medium);
        assert_eq!(AccuracyTier::from_confidence(80.0), AccuracyTier::High);
        assert_eq!(AccuracyTier::from_confidence(100.0), AccuracyTier::High);
    }

    #[test]
    fn accuracy_text_formats_tier_and_percent() {
        let r = ClassificationResult {
            message: "hello there".into(),
            is_spam: false,
            prediction: "Not Spam".into(),
            confidence: 92.0,
        };
        assert_eq!(r.accuracy_text(), "High (92% confidence)");

        let r = ClassificationResult {
            confidence: 87.35,
            ..r
        };
        assert_eq!(r.accuracy_text(), "High (87.35% confidence)");
    }

    #[test]
    fn validation_rejects_empty_and_short_input() {
        assert!(matches!(validate_message(""), Err(ClassifyError::EmptyInput)));
        assert!(matches!(validate_message("hey"), Err(ClassifyError::TooShort)));
        assert!(validate_message("hello").is_ok());
    }

    #[test]
    fn validation_messages_are_exact() {
        assert_eq!(
            ClassifyError::EmptyInput.user_message(),
            "Please enter a message to analyze"
        );
        assert_eq!(
            ClassifyError::TooShort.user_message(),
            "Message is too short. Please enter at least 5 characters."
        );
    }

    #[test]
    fn server_message_includes_detail_when_present() {
        let with_detail = ClassifyError::Server {
            status: 429,
            detail: Some("rate limited".into()),
        };
        assert_eq!(
            with_detail.user_message(),
            "Server returned 429 - rate limited"
        );

        let bare = ClassifyError::Server {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.user_message(), "Server returned 500");
    }

    #[test]
    fn logical_error_falls_back_to_generic_message() {
        let with_detail = ClassifyError::Logical {
            detail: Some("Model not loaded".into()),
        };
        assert_eq!(with_detail.user_message(), "Model not loaded");

        let bare = ClassifyError::Logical { detail: None };
        assert_eq!(bare.user_message(), "An error occurred during prediction");
    }
}
