use glimpse_memory::SearchResult;
use serde::{Deserialize, Serialize};

/// Score above which a search result counts as a high-confidence match.
const HIGH_SCORE_GATE: f64 = 0.85;

/// How a prompt was enhanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementType {
    None,
    Contextual,
    Detailed,
    Minimal,
}

impl std::fmt::Display for EnhancementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnhancementType::None => "none",
            EnhancementType::Contextual => "contextual",
            EnhancementType::Detailed => "detailed",
            EnhancementType::Minimal => "minimal",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one enhancement. `memories_used` is the full retrieval
/// footprint in score order, not just the entries that made it into the
/// prompt appendix.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementResult {
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub memories_used: Vec<String>,
    pub enhancement_type: EnhancementType,
}

impl EnhancementResult {
    /// The degenerate result for an empty retrieval: the prompt passes
    /// through untouched.
    pub fn unchanged(prompt: &str) -> Self {
        Self {
            original_prompt: prompt.to_string(),
            enhanced_prompt: prompt.to_string(),
            memories_used: Vec::new(),
            enhancement_type: EnhancementType::None,
        }
    }
}

/// Build an [`EnhancementResult`] from a prompt and its search results.
/// Deterministic: the same inputs always produce the same output bytes.
pub(crate) fn build_enhancement(prompt: &str, results: &[SearchResult]) -> EnhancementResult {
    if results.is_empty() {
        return EnhancementResult::unchanged(prompt);
    }

    let mut memories_used = Vec::with_capacity(results.len());
    let mut high = Vec::new();
    let mut contextual = Vec::new();
    let mut formatted = Vec::new();

    for result in results {
        let content = result.memory.content.clone();
        memories_used.push(content.clone());

        if result.score > HIGH_SCORE_GATE {
            high.push(content);
        } else {
            contextual.push(content);
        }

        // Detailed/minimal renderings carry the memory's context tag when
        // it has one
        let tag = &result.memory.metadata.context;
        if tag.is_empty() {
            formatted.push(result.memory.content.clone());
        } else {
            formatted.push(format!("[{}] {}", tag, result.memory.content));
        }
    }

    let enhancement_type = classify(high.len(), contextual.len());
    let enhanced_prompt = render(prompt, &high, &contextual, &formatted, enhancement_type);

    EnhancementResult {
        original_prompt: prompt.to_string(),
        enhanced_prompt,
        memories_used,
        enhancement_type,
    }
}

/// Four-way decision over the partition sizes. Total over all non-empty
/// result sets; empty sets never reach here.
fn classify(high: usize, contextual: usize) -> EnhancementType {
    if high >= 2 {
        return EnhancementType::Contextual;
    }
    if high == 1 && contextual >= 2 {
        return EnhancementType::Detailed;
    }
    if high == 0 && contextual > 0 {
        return EnhancementType::Minimal;
    }
    EnhancementType::Contextual
}

fn render(
    original: &str,
    high: &[String],
    contextual: &[String],
    formatted: &[String],
    enhancement_type: EnhancementType,
) -> String {
    let mut out = String::from(original);

    match enhancement_type {
        EnhancementType::Contextual => {
            out.push_str("\n\n[Context from previous sessions]\n");
            out.push_str("Based on my previous activities and context:\n");
            for memory in high.iter().take(3) {
                out.push_str("- ");
                out.push_str(memory);
                out.push('\n');
            }
            if !contextual.is_empty() {
                out.push_str("\nAdditional context:\n");
                for memory in contextual.iter().take(2) {
                    out.push_str("- ");
                    out.push_str(memory);
                    out.push('\n');
                }
            }
        }
        EnhancementType::Detailed => {
            out.push_str("\n\n[Relevant background]\n");
            for memory in formatted.iter().take(4) {
                out.push_str("- ");
                out.push_str(memory);
                out.push('\n');
            }
        }
        EnhancementType::Minimal => {
            if let Some(first) = formatted.first() {
                out.push_str("\n\n[Note: Consider previous context: ");
                out.push_str(first);
                if formatted.len() > 1 {
                    out.push_str(" and related activities");
                }
                out.push(']');
            }
        }
        EnhancementType::None => {}
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use glimpse_memory::{Memory, Metadata};

    fn result(content: &str, score: f64) -> SearchResult {
        SearchResult {
            memory: Memory {
                id: String::new(),
                content: content.to_string(),
                user_id: "u".to_string(),
                metadata: Metadata::default(),
                created_at: Utc::now(),
            },
            score,
            distance: 1.0 - score,
        }
    }

    #[test]
    fn test_empty_results_leave_prompt_unchanged() {
        let out = build_enhancement("q", &[]);
        assert_eq!(out.enhanced_prompt, "q");
        assert_eq!(out.enhancement_type, EnhancementType::None);
        assert!(out.memories_used.is_empty());
    }

    #[test]
    fn test_contextual_enhancement() {
        let results = vec![
            result("A", 0.92),
            result("B", 0.88),
            result("C", 0.70),
            result("D", 0.40),
        ];
        let out = build_enhancement("help me continue", &results);

        assert_eq!(out.enhancement_type, EnhancementType::Contextual);
        assert_eq!(
            out.enhanced_prompt,
            "help me continue\n\n[Context from previous sessions]\n\
             Based on my previous activities and context:\n- A\n- B\n\n\
             Additional context:\n- C\n- D\n"
        );
        assert_eq!(out.memories_used, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_minimal_enhancement() {
        let results = vec![result("X", 0.40), result("Y", 0.20)];
        let out = build_enhancement("q", &results);

        assert_eq!(out.enhancement_type, EnhancementType::Minimal);
        assert!(out
            .enhanced_prompt
            .ends_with("[Note: Consider previous context: X and related activities]"));
    }

    #[test]
    fn test_minimal_single_result_has_no_suffix() {
        let out = build_enhancement("q", &[result("X", 0.40)]);
        assert!(out
            .enhanced_prompt
            .ends_with("[Note: Consider previous context: X]"));
    }

    #[test]
    fn test_detailed_enhancement() {
        let results = vec![result("A", 0.90), result("B", 0.50), result("C", 0.40)];
        let out = build_enhancement("q", &results);

        assert_eq!(out.enhancement_type, EnhancementType::Detailed);
        assert_eq!(
            out.enhanced_prompt,
            "q\n\n[Relevant background]\n- A\n- B\n- C\n"
        );
    }

    #[test]
    fn test_detailed_caps_at_four_entries() {
        let results = vec![
            result("A", 0.90),
            result("B", 0.50),
            result("C", 0.45),
            result("D", 0.40),
            result("E", 0.35),
            result("F", 0.30),
        ];
        let out = build_enhancement("q", &results);

        assert_eq!(out.enhancement_type, EnhancementType::Detailed);
        assert!(out.enhanced_prompt.contains("- D\n"));
        assert!(!out.enhanced_prompt.contains("- E"));
        assert_eq!(out.memories_used.len(), 6);
    }

    #[test]
    fn test_contextual_caps() {
        let results = vec![
            result("H1", 0.99),
            result("H2", 0.95),
            result("H3", 0.92),
            result("H4", 0.90),
            result("C1", 0.60),
            result("C2", 0.50),
            result("C3", 0.40),
        ];
        let out = build_enhancement("q", &results);

        assert_eq!(out.enhancement_type, EnhancementType::Contextual);
        assert!(out.enhanced_prompt.contains("- H3\n"));
        assert!(!out.enhanced_prompt.contains("- H4"));
        assert!(out.enhanced_prompt.contains("- C2\n"));
        assert!(!out.enhanced_prompt.contains("- C3"));
    }

    #[test]
    fn test_single_high_few_contextual_is_contextual() {
        let results = vec![result("A", 0.90), result("B", 0.50)];
        let out = build_enhancement("q", &results);
        assert_eq!(out.enhancement_type, EnhancementType::Contextual);
    }

    #[test]
    fn test_context_tag_prefixes_detailed_rendering() {
        let mut tagged = result("reviewing a PR", 0.90);
        tagged.memory.metadata.context = "work".to_string();
        let results = vec![tagged, result("B", 0.50), result("C", 0.40)];
        let out = build_enhancement("q", &results);
        assert!(out.enhanced_prompt.contains("- [work] reviewing a PR\n"));
    }

    #[test]
    fn test_determinism() {
        let results = vec![result("A", 0.92), result("B", 0.70)];
        let first = build_enhancement("same prompt", &results);
        let second = build_enhancement("same prompt", &results);
        assert_eq!(first.enhanced_prompt, second.enhanced_prompt);
        assert_eq!(first.enhancement_type, second.enhancement_type);
    }

    #[test]
    fn test_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EnhancementType::Contextual).unwrap(),
            "\"contextual\""
        );
        assert_eq!(EnhancementType::Minimal.to_string(), "minimal");
    }
}
