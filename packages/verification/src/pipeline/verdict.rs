//! Threshold rules mapping score extremes to a [`Verdict`].

use crate::types::{
    contracts::{VerdictRequest, VerdictResponse},
    report::ReliabilityReport,
    verdict::Verdict,
};

/// Below this minimum score, sources contradict the claim.
pub const CONTRADICTION_MIN_SCORE: f64 = -0.5;

/// Below this maximum score, nothing backs the claim.
pub const UNSUPPORTED_MAX_SCORE: f64 = 0.55;

/// Lower bound (exclusive) of the ambiguous band.
pub const AMBIGUOUS_MAX_SCORE: f64 = 0.5;

/// Above this maximum score, the claim is reliable.
pub const RELIABLE_MAX_SCORE: f64 = 0.60;

/// Stateless classifier over a report's score extremes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerdictClassifier;

impl VerdictClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a report, citing its supporting or challenging article.
    pub fn classify(&self, report: &ReliabilityReport) -> Verdict {
        classify_scores(
            report.min_score,
            report.max_score,
            report.supporting_url.as_deref(),
            report.challenging_url.as_deref(),
        )
    }

    /// Handle a stage request. Scores alone carry no citations.
    pub fn handle(&self, request: VerdictRequest) -> VerdictResponse {
        classify_scores(request.min_score, request.max_score, None, None).into()
    }
}

/// Apply the rules in order; the first that matches wins.
///
/// The bands overlap between 0.5 and 0.55 and leave a gap at exactly 0.60
/// (and at NaN), which maps to [`Verdict::Undetermined`].
pub fn classify_scores(
    min_score: f64,
    max_score: f64,
    supporting_url: Option<&str>,
    challenging_url: Option<&str>,
) -> Verdict {
    let cite = |url: Option<&str>| url.map(str::to_string);

    if min_score < CONTRADICTION_MIN_SCORE {
        Verdict::HighlyUnreliable {
            citation_url: cite(challenging_url),
        }
    } else if max_score < UNSUPPORTED_MAX_SCORE {
        Verdict::Unreliable { citation_url: None }
    } else if max_score > AMBIGUOUS_MAX_SCORE && max_score < RELIABLE_MAX_SCORE {
        Verdict::Ambiguous {
            citation_url: cite(supporting_url),
        }
    } else if max_score > RELIABLE_MAX_SCORE {
        Verdict::Reliable {
            citation_url: cite(supporting_url),
        }
    } else {
        Verdict::Undetermined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::SimilarityRecord;

    const SUPPORTING: Option<&str> = Some("https://who.int/best");
    const CHALLENGING: Option<&str> = Some("https://cdc.gov/worst");

    #[test]
    fn test_contradiction_takes_priority() {
        let verdict = classify_scores(-0.6, 0.9, SUPPORTING, CHALLENGING);
        assert_eq!(
            verdict,
            Verdict::HighlyUnreliable {
                citation_url: Some("https://cdc.gov/worst".to_string())
            }
        );
    }

    #[test]
    fn test_unreliable_has_no_citation() {
        assert_eq!(
            classify_scores(0.1, 0.3, SUPPORTING, CHALLENGING),
            Verdict::Unreliable { citation_url: None }
        );
        // Overlap: 0.52 is below 0.55, so the earlier rule wins.
        assert_eq!(
            classify_scores(0.1, 0.52, SUPPORTING, CHALLENGING),
            Verdict::Unreliable { citation_url: None }
        );
    }

    #[test]
    fn test_ambiguous_and_reliable_cite_supporting() {
        assert_eq!(
            classify_scores(0.1, 0.57, SUPPORTING, CHALLENGING),
            Verdict::Ambiguous {
                citation_url: Some("https://who.int/best".to_string())
            }
        );
        assert_eq!(
            classify_scores(0.1, 0.95, SUPPORTING, CHALLENGING),
            Verdict::Reliable {
                citation_url: Some("https://who.int/best".to_string())
            }
        );
    }

    #[test]
    fn test_threshold_comparisons_are_strict() {
        // -0.5 is not below -0.5, so the contradiction rule is skipped.
        assert_eq!(
            classify_scores(-0.5, 0.9, SUPPORTING, CHALLENGING),
            Verdict::Reliable {
                citation_url: Some("https://who.int/best".to_string())
            }
        );
        assert!(matches!(
            classify_scores(-0.5000001, 0.9, SUPPORTING, CHALLENGING),
            Verdict::HighlyUnreliable { .. }
        ));

        // 0.5 is below 0.55 and never reaches the ambiguous band.
        assert_eq!(
            classify_scores(0.1, 0.5, SUPPORTING, CHALLENGING),
            Verdict::Unreliable { citation_url: None }
        );

        // 0.55 is not below 0.55 and sits inside (0.5, 0.6).
        assert_eq!(
            classify_scores(0.1, 0.55, SUPPORTING, CHALLENGING),
            Verdict::Ambiguous {
                citation_url: Some("https://who.int/best".to_string())
            }
        );
        assert_eq!(
            classify_scores(0.1, 0.5499999, SUPPORTING, CHALLENGING),
            Verdict::Unreliable { citation_url: None }
        );

        assert!(matches!(
            classify_scores(0.1, 0.6000001, SUPPORTING, CHALLENGING),
            Verdict::Reliable { .. }
        ));
    }

    #[test]
    fn test_gaps_are_undetermined() {
        assert_eq!(classify_scores(0.1, 0.60, SUPPORTING, CHALLENGING), Verdict::Undetermined);
        assert_eq!(classify_scores(0.1, f64::NAN, SUPPORTING, CHALLENGING), Verdict::Undetermined);
    }

    #[test]
    fn test_no_evidence_report_is_unreliable() {
        let verdict = VerdictClassifier::new().classify(&ReliabilityReport::no_evidence());
        assert_eq!(verdict, Verdict::Unreliable { citation_url: None });
    }

    #[test]
    fn test_classify_report() {
        let report = ReliabilityReport::from_records(vec![
            SimilarityRecord::new("https://a.gov/1", "one", 0.9),
            SimilarityRecord::new("https://a.gov/2", "two", 0.2),
        ]);
        let verdict = VerdictClassifier::new().classify(&report);
        assert_eq!(verdict.citation_url(), Some("https://a.gov/1"));
    }

    #[test]
    fn test_handle() {
        let response = VerdictClassifier::new().handle(VerdictRequest {
            min_score: 0.2,
            max_score: 0.8,
        });
        assert_eq!(response.verdict.label(), "reliable");
        assert!(response.citation_url.is_none());
        assert!(response.message.starts_with("There is strong evidence"));
    }
}
