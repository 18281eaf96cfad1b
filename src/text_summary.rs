//! Text summary builder for one-shot CLI output.

use crate::model::ClassificationResult;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a classification result.
pub(crate) fn build_text_summary(result: &ClassificationResult) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Verdict:    {} {}",
        if result.is_spam { "⚠" } else { "✓" },
        result.prediction
    ));
    lines.push(format!("Confidence: {}%", result.confidence));
    lines.push(format!("Accuracy:   {}", result.accuracy_text()));
    lines.push(format!("Message:    {}", result.message));

    TextSummary { lines }
}
