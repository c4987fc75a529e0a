use serde::{Deserialize, Serialize};

const SUMMARY_MAX_CHARS: usize = 500;

/// Structured vision-model output for one capture. Immutable after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub context: String,
    pub activities: Vec<String>,
    pub key_elements: Vec<String>,
    pub user_intent: String,
}

/// Strict DTO for the model's JSON reply. A field with an unexpected shape
/// fails the whole parse, which routes the reply through the raw-text
/// fallback instead of surfacing an error.
#[derive(Debug, Deserialize)]
struct AnalysisDto {
    summary: Option<String>,
    context: Option<String>,
    activities: Option<Vec<String>>,
    key_elements: Option<Vec<String>>,
    user_intent: Option<String>,
}

/// Parse the assistant's reply into an [`AnalysisResult`].
///
/// First attempts a strict JSON parse; on any failure the raw text becomes
/// the summary (truncated to 500 chars) and the remaining fields take their
/// sentinel defaults. Parse errors never propagate.
pub fn parse_analysis(content: &str) -> AnalysisResult {
    match serde_json::from_str::<AnalysisDto>(content) {
        Ok(dto) => AnalysisResult {
            summary: dto
                .summary
                .unwrap_or_else(|| truncate_summary(content)),
            context: dto.context.unwrap_or_else(|| "unknown".to_string()),
            activities: dto.activities.unwrap_or_default(),
            key_elements: dto.key_elements.unwrap_or_default(),
            user_intent: dto.user_intent.unwrap_or_else(|| "unknown".to_string()),
        },
        Err(_) => AnalysisResult {
            summary: truncate_summary(content),
            context: "unknown".to_string(),
            activities: Vec::new(),
            key_elements: Vec::new(),
            user_intent: "unknown".to_string(),
        },
    }
}

fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_reply() {
        let content = r#"{
            "summary": "Editing a Markdown file",
            "context": "work",
            "activities": ["writing"],
            "key_elements": ["editor"],
            "user_intent": "drafting a note"
        }"#;
        let result = parse_analysis(content);
        assert_eq!(result.summary, "Editing a Markdown file");
        assert_eq!(result.context, "work");
        assert_eq!(result.activities, vec!["writing"]);
        assert_eq!(result.key_elements, vec!["editor"]);
        assert_eq!(result.user_intent, "drafting a note");
    }

    #[test]
    fn test_plain_text_falls_back_to_summary() {
        let result = parse_analysis("not json here; just prose");
        assert_eq!(result.summary, "not json here; just prose");
        assert_eq!(result.context, "unknown");
        assert!(result.activities.is_empty());
        assert!(result.key_elements.is_empty());
        assert_eq!(result.user_intent, "unknown");
    }

    #[test]
    fn test_partial_json_keeps_sentinels() {
        let result = parse_analysis(r#"{"summary": "Browsing the news"}"#);
        assert_eq!(result.summary, "Browsing the news");
        assert_eq!(result.context, "unknown");
        assert!(result.activities.is_empty());
    }

    #[test]
    fn test_wrong_shape_falls_back_to_raw() {
        let content = r#"{"summary": 42, "context": "work"}"#;
        let result = parse_analysis(content);
        assert_eq!(result.summary, content);
        assert_eq!(result.context, "unknown");
    }

    #[test]
    fn test_long_text_is_truncated_with_ellipsis() {
        let long = "x".repeat(900);
        let result = parse_analysis(&long);
        assert_eq!(result.summary.chars().count(), 503);
        assert!(result.summary.ends_with("..."));
    }

    #[test]
    fn test_non_string_array_entries_fail_strict_parse() {
        let content = r#"{"summary": "s", "activities": ["ok", 3]}"#;
        let result = parse_analysis(content);
        // Mixed-type array routes the whole reply through the fallback
        assert_eq!(result.summary, content);
        assert!(result.activities.is_empty());
    }
}
