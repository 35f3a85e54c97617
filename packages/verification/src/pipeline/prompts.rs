//! LLM prompts for verdict explanations.
//!
//! The score thresholds quoted to the model come from the verdict constants,
//! so the explanation and the classifier always describe the same rules.

use sha2::{Digest, Sha256};

use crate::pipeline::verdict::{
    AMBIGUOUS_MAX_SCORE, CONTRADICTION_MIN_SCORE, RELIABLE_MAX_SCORE, UNSUPPORTED_MAX_SCORE,
};
use crate::traits::explainer::ExplanationRequest;

/// Longest supporting-source block sent to the model, in characters.
pub const MAX_SUPPORTING_CHARS: usize = 3500;

/// System message for explanation requests.
pub const EXPLANATION_SYSTEM_PROMPT: &str = "You are a factual, neutral assistant.";

/// Prompt for explaining how sources relate to a claim.
pub const EXPLANATION_PROMPT: &str = r#"You are a fact-checking assistant. Below is the user's claim, followed by content scraped from the best supporting sources.
You are also given two scores, the max score and the min score, derived from cosine similarity between the user's text and the articles with the best and the worst similarity respectively.

This is how the scores are gauged:
- if min score < {contradiction_min}: Highly unreliable. Sources suggest the opposite of the claim.
- if max score < {unsupported_max}: Unreliable. No credible sources back up the claim.
- if max score > {ambiguous_max} and max score < {reliable_max}: It is ambiguous whether the claim is reliable. Some credible sources support it slightly.
- if max score > {reliable_max}: There is strong evidence that the claim is reliable.

Here are the scores:
max_score = {max_score}
min_score = {min_score}

Considering the scores, explain in clear, user-friendly terms how these sources support or disprove the user's statement.
For example, if the user claims that a person is the current president, an article mentioning "President <name>" supports the claim; give the reasoning and say which article it comes from.
If the supporting evidence is insufficient after considering the max and min scores, you may refute or accept the claim.

User's claim:
{claim}

Supporting sources:
{sources}

Please provide a concise reasoning summary."#;

/// Generate a hash of the explanation prompt for auditing stored outputs.
pub fn explanation_prompt_hash() -> String {
    let mut hasher = Sha256::new();
    hasher.update(EXPLANATION_PROMPT.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Join supporting texts with blank lines, truncated to [`MAX_SUPPORTING_CHARS`].
pub fn combine_supporting_texts(texts: &[String]) -> String {
    let combined = texts.join("\n\n");
    if combined.chars().count() > MAX_SUPPORTING_CHARS {
        let truncated: String = combined.chars().take(MAX_SUPPORTING_CHARS).collect();
        format!("{truncated}...")
    } else {
        combined
    }
}

/// Format the explanation prompt for a request.
pub fn format_explanation_prompt(request: &ExplanationRequest) -> String {
    fill_placeholders(
        EXPLANATION_PROMPT,
        &[
            ("{contradiction_min}", CONTRADICTION_MIN_SCORE.to_string()),
            ("{unsupported_max}", UNSUPPORTED_MAX_SCORE.to_string()),
            ("{ambiguous_max}", AMBIGUOUS_MAX_SCORE.to_string()),
            ("{reliable_max}", RELIABLE_MAX_SCORE.to_string()),
            ("{max_score}", request.max_score.to_string()),
            ("{min_score}", request.min_score.to_string()),
            ("{claim}", request.claim.clone()),
            ("{sources}", combine_supporting_texts(&request.supporting_texts)),
        ],
    )
}

/// Single pass over the template. Substituted values are never rescanned.
fn fill_placeholders(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(*key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_hash_is_consistent() {
        let hash = explanation_prompt_hash();
        assert_eq!(hash, explanation_prompt_hash());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_prompt_quotes_classifier_thresholds() {
        let request = ExplanationRequest::new("claim text", vec!["source".into()], 0.72, -0.1);
        let prompt = format_explanation_prompt(&request);

        assert!(prompt.contains("if min score < -0.5:"));
        assert!(prompt.contains("if max score < 0.55:"));
        assert!(prompt.contains("if max score > 0.5 and max score < 0.6:"));
        assert!(prompt.contains("max_score = 0.72"));
        assert!(prompt.contains("min_score = -0.1"));
        assert!(prompt.contains("claim text"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_braces_in_request_text_are_kept() {
        let request = ExplanationRequest::new(
            "the {sources} tag",
            vec!["see {claim} here".into()],
            0.7,
            0.1,
        );
        let prompt = format_explanation_prompt(&request);

        assert!(prompt.contains("User's claim:\nthe {sources} tag\n"));
        assert!(prompt.contains("Supporting sources:\nsee {claim} here\n"));
        assert_eq!(prompt.matches("see {claim} here").count(), 1);
    }

    #[test]
    fn test_supporting_texts_truncated() {
        let long = "x".repeat(MAX_SUPPORTING_CHARS);
        let combined = combine_supporting_texts(&[long, "tail".to_string()]);
        assert_eq!(combined.chars().count(), MAX_SUPPORTING_CHARS + 3);
        assert!(combined.ends_with("..."));

        let short = combine_supporting_texts(&["a".to_string(), "b".to_string()]);
        assert_eq!(short, "a\n\nb");
    }
}
