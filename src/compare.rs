//! Reference-vs-scraped comparison
//!
//! Titles and URLs must match exactly. Suggestion and place lists only need
//! to share a fraction of their entries: ranking and composition drift
//! between a library call and a live response.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Minimum share of entries two lists must have in common
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapPolicy {
    min_fraction: f64,
}

impl OverlapPolicy {
    pub fn new(min_fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_fraction) {
            return Err(Error::Config(format!(
                "overlap fraction must be within [0, 1], got {}",
                min_fraction
            )));
        }
        Ok(Self { min_fraction })
    }

    pub fn min_fraction(&self) -> f64 {
        self.min_fraction
    }

    /// Number of shared entries needed when the shorter list has `min_count` entries
    pub fn required(&self, min_count: usize) -> f64 {
        self.min_fraction * min_count as f64
    }
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self { min_fraction: 0.3 }
    }
}

/// Result of a passing comparison
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    Exact {
        reference: String,
        scraped: String,
    },
    Overlap {
        shared: BTreeSet<String>,
        count: usize,
        min_count: usize,
        required: f64,
    },
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOutcome::Exact { reference, scraped } => {
                write!(f, "exact match: library {:?} / browser {:?}", reference, scraped)
            }
            ComparisonOutcome::Overlap {
                shared,
                count,
                min_count,
                required,
            } => write!(
                f,
                "Overlap: {:?}, Count: {}, Min Count: {} (needed {:.1})",
                shared, count, min_count, required
            ),
        }
    }
}

/// Require `reference == scraped`
pub fn exact(label: &str, reference: &str, scraped: &str) -> Result<ComparisonOutcome> {
    if reference == scraped {
        Ok(ComparisonOutcome::Exact {
            reference: reference.to_string(),
            scraped: scraped.to_string(),
        })
    } else {
        Err(Error::Mismatch(format!(
            "{} do not match. Library: {:?}, Browser: {:?}",
            label, reference, scraped
        )))
    }
}

/// Require the lists to share at least `policy.required(min(len))` distinct entries
pub fn overlap(policy: OverlapPolicy, reference: &[String], scraped: &[String]) -> Result<ComparisonOutcome> {
    let reference_set: BTreeSet<&String> = reference.iter().collect();
    let shared: BTreeSet<String> = scraped
        .iter()
        .filter(|s| reference_set.contains(s))
        .cloned()
        .collect();
    let count = shared.len();
    let min_count = reference.len().min(scraped.len());
    let required = policy.required(min_count);

    if count as f64 >= required {
        Ok(ComparisonOutcome::Overlap {
            shared,
            count,
            min_count,
            required,
        })
    } else {
        Err(Error::Mismatch(format!(
            "Not enough overlap ({} of required {:.1}). Library: {:?} Browser: {:?}",
            count, required, reference, scraped
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_and_mismatch() {
        assert_eq!(
            exact("Titles", "Python", "Python").unwrap(),
            ComparisonOutcome::Exact {
                reference: "Python".into(),
                scraped: "Python".into(),
            }
        );
        let err = exact("Titles", "Python", "Pithon").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"Python\"") && msg.contains("\"Pithon\""));
    }

    #[test]
    fn overlap_at_threshold_passes() {
        // min_count = 10, required = 3.0, shared = 3
        let reference = list(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let scraped = list(&["a", "b", "c", "x1", "x2", "x3", "x4", "x5", "x6", "x7"]);
        let outcome = overlap(OverlapPolicy::default(), &reference, &scraped).unwrap();
        match outcome {
            ComparisonOutcome::Overlap { count, min_count, .. } => {
                assert_eq!(count, 3);
                assert_eq!(min_count, 10);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn overlap_below_threshold_fails_with_both_lists() {
        let reference = list(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let scraped = list(&["a", "b", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8"]);
        let err = overlap(OverlapPolicy::default(), &reference, &scraped).unwrap_err();
        assert!(matches!(err, Error::Mismatch(_)));
        assert!(err.to_string().contains("\"x8\""));
    }

    #[test]
    fn shorter_list_sets_the_bar() {
        let reference = list(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let scraped = list(&["a", "zz"]);
        // min_count = 2, required = 0.6, shared = 1
        assert!(overlap(OverlapPolicy::default(), &reference, &scraped).is_ok());
    }

    #[test]
    fn duplicates_count_once() {
        let reference = list(&["a", "a", "a"]);
        let scraped = list(&["a", "a", "a"]);
        let strict = OverlapPolicy::new(1.0).unwrap();
        // one distinct shared entry against min_count 3
        assert!(overlap(strict, &reference, &scraped).is_err());
    }

    #[test]
    fn empty_lists_pass_trivially() {
        assert!(overlap(OverlapPolicy::default(), &[], &list(&["a"])).is_ok());
    }

    #[test]
    fn policy_is_validated() {
        assert!(OverlapPolicy::new(-0.1).is_err());
        assert!(OverlapPolicy::new(f64::NAN).is_err());
        assert_eq!(OverlapPolicy::new(0.5).unwrap().required(4), 2.0);
    }
}
