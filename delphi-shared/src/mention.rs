//! `@name` mention detection.
//!
//! Matching is a case-insensitive substring test, the same rule the backend
//! applies when deciding whether a bot should answer.

/// Name of the bot every backend ships with.
pub const DEFAULT_BOT: &str = "delphibot";

/// Returns `true` when `text` mentions `@name`.
#[must_use]
pub fn mentions(text: &str, name: &str) -> bool {
    let name = name.trim().trim_start_matches('@');
    if name.is_empty() {
        return false;
    }
    text.to_lowercase()
        .contains(&format!("@{}", name.to_lowercase()))
}

/// The bots from `names` that `text` mentions, each once, in `names` order.
#[must_use]
pub fn mentioned_bots<'a, S>(text: &str, names: &'a [S]) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    let mut found: Vec<&'a str> = Vec::new();
    for name in names {
        let name = name.as_ref();
        if mentions(text, name) && !found.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            found.push(name);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_is_case_insensitive() {
        assert!(mentions("Hey @DelphiBot what's up", DEFAULT_BOT));
        assert!(mentions("@delphibot", "DELPHIBOT"));
        assert!(!mentions("delphibot without at", DEFAULT_BOT));
    }

    #[test]
    fn test_substring_match_counts() {
        assert!(mentions("ping @delphibot2", DEFAULT_BOT));
        assert!(mentions("email me at x@delphibot.io", DEFAULT_BOT));
    }

    #[test]
    fn test_blank_name_never_matches() {
        assert!(!mentions("@ anything", ""));
        assert!(!mentions("@ anything", "@"));
    }

    #[test]
    fn test_leading_at_in_name_is_ignored() {
        assert!(mentions("hello @oracle", "@oracle"));
    }

    #[test]
    fn test_mentioned_bots_order_and_dedup() {
        let names = ["sibyl", "delphibot", "oracle", "DelphiBot"];
        let text = "@oracle and @delphibot, also @DELPHIBOT";
        assert_eq!(mentioned_bots(text, &names), vec!["delphibot", "oracle"]);
    }

    #[test]
    fn test_mentioned_bots_none() {
        let names = vec![DEFAULT_BOT.to_string()];
        assert!(mentioned_bots("no bots here", &names).is_empty());
    }
}
