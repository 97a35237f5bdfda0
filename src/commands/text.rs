//! Label casing normalization
//!
//! Android renders button labels with version-dependent casing: older
//! releases title-case them, newer ones upper-case them. Text-matching
//! commands normalize the caller's text the same way so a test written
//! against one OS release matches on another. The version threshold is a
//! policy knob, not an inferred constant.

/// Casing rule parameterized by the version at which labels switch from
/// title case to upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasingPolicy {
    pub uppercase_from: (u32, u32),
}

impl Default for CasingPolicy {
    fn default() -> Self {
        Self {
            uppercase_from: (7, 0),
        }
    }
}

/// Title-case each whitespace-separated word
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Normalize a label for text matching on a given platform version.
///
/// Below `policy.uppercase_from` the label is title-cased; at or above it is
/// upper-cased. `preserve=true` opts out entirely.
pub fn normalize_label(
    text: &str,
    platform_version: (u32, u32),
    policy: &CasingPolicy,
    preserve: bool,
) -> String {
    if preserve {
        return text.to_string();
    }
    if platform_version >= policy.uppercase_from {
        text.to_uppercase()
    } else {
        title_case(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("sign in now"), "Sign In Now");
        assert_eq!(title_case("ALREADY UPPER"), "Already Upper");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_below_threshold_title_cases() {
        let policy = CasingPolicy::default();
        assert_eq!(
            normalize_label("sign in", (6, 0), &policy, false),
            "Sign In"
        );
    }

    #[test]
    fn test_at_and_above_threshold_upper_cases() {
        let policy = CasingPolicy::default();
        assert_eq!(
            normalize_label("sign in", (7, 0), &policy, false),
            "SIGN IN"
        );
        assert_eq!(
            normalize_label("sign in", (8, 1), &policy, false),
            "SIGN IN"
        );
    }

    #[test]
    fn test_minor_version_participates_in_threshold() {
        let policy = CasingPolicy {
            uppercase_from: (7, 1),
        };
        assert_eq!(
            normalize_label("sign in", (7, 0), &policy, false),
            "Sign In"
        );
        assert_eq!(
            normalize_label("sign in", (7, 1), &policy, false),
            "SIGN IN"
        );
    }

    #[test]
    fn test_preserve_skips_normalization() {
        let policy = CasingPolicy::default();
        assert_eq!(
            normalize_label("MiXeD Case", (8, 0), &policy, true),
            "MiXeD Case"
        );
    }
}
