//! Log-content assertions
//!
//! Terms are caller-provided plain strings; they are regex-escaped before
//! being interpreted as patterns so a term like "progress: 50%" matches
//! literally.

use crate::error::{Error, Result};
use regex::Regex;

/// What a set of search terms is expected to satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogExpectation {
    /// Every term matches at least one entry
    Present,
    /// No term matches any entry
    Absent,
    /// Every term matches exactly this many entries
    Count(usize),
}

/// Number of log entries a (escaped) term matches
pub fn occurrences(messages: &[String], term: &str) -> Result<usize> {
    let pattern = Regex::new(&regex::escape(term))
        .map_err(|e| Error::InvalidArgument(format!("unusable search term '{}': {}", term, e)))?;
    Ok(messages.iter().filter(|m| pattern.is_match(m)).count())
}

/// Check every term against the captured messages.
///
/// The first violated term fails the whole assertion with its observed
/// count; terms are checked in caller order.
pub fn assert_terms(
    messages: &[String],
    terms: &[String],
    expectation: LogExpectation,
) -> Result<()> {
    if terms.is_empty() {
        return Err(Error::InvalidArgument(
            "at least one search term is required".to_string(),
        ));
    }

    for term in terms {
        let found = occurrences(messages, term)?;
        let holds = match expectation {
            LogExpectation::Present => found >= 1,
            LogExpectation::Absent => found == 0,
            LogExpectation::Count(expected) => found == expected,
        };
        if !holds {
            let expected = match expectation {
                LogExpectation::Present => "at least 1".to_string(),
                LogExpectation::Absent => "0".to_string(),
                LogExpectation::Count(n) => format!("exactly {}", n),
            };
            return Err(Error::LogAssertion {
                term: term.clone(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<String> {
        vec![
            "Session created".to_string(),
            "progress: 50% done".to_string(),
            "progress: 50% done".to_string(),
            "upload finished".to_string(),
        ]
    }

    #[test]
    fn test_terms_are_escaped_not_interpreted() {
        // unescaped, "50%" would still match, but ".*" would match everything
        assert_eq!(occurrences(&messages(), ".*").unwrap(), 0);
        assert_eq!(occurrences(&messages(), "progress: 50%").unwrap(), 2);
    }

    #[test]
    fn test_present_expectation() {
        let terms = vec!["Session created".to_string(), "upload".to_string()];
        assert!(assert_terms(&messages(), &terms, LogExpectation::Present).is_ok());

        let missing = vec!["crash".to_string()];
        let err = assert_terms(&messages(), &missing, LogExpectation::Present).unwrap_err();
        assert!(matches!(err, Error::LogAssertion { found: 0, .. }));
    }

    #[test]
    fn test_absent_expectation() {
        let terms = vec!["crash".to_string()];
        assert!(assert_terms(&messages(), &terms, LogExpectation::Absent).is_ok());

        let present = vec!["upload".to_string()];
        assert!(assert_terms(&messages(), &present, LogExpectation::Absent).is_err());
    }

    #[test]
    fn test_exact_count_expectation() {
        let terms = vec!["progress: 50%".to_string()];
        assert!(assert_terms(&messages(), &terms, LogExpectation::Count(2)).is_ok());
        assert!(assert_terms(&messages(), &terms, LogExpectation::Count(1)).is_err());
    }

    #[test]
    fn test_empty_terms_rejected_before_matching() {
        let err = assert_terms(&messages(), &[], LogExpectation::Present).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
