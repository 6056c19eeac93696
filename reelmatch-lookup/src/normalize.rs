//! Title canonicalization
//!
//! `normalize` produces the key titles are compared by; `escape_query`
//! produces the joined search string sent to the review service.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that are neither word characters, whitespace nor hyphens
static NON_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]+").expect("static pattern is valid"));

/// Runs of whitespace and hyphens
static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s-]+").expect("static pattern is valid"));

/// Characters dropped from query words
static NON_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\-.~]+").expect("static pattern is valid"));

/// Canonical comparison key of a title
///
/// Upper-cases, drops punctuation and turns every run of whitespace or
/// hyphens into a single `-`. Hyphens at either end are removed, so the key
/// never starts or ends with a separator. Idempotent.
///
/// ```
/// use reelmatch_lookup::normalize::normalize;
///
/// assert_eq!(normalize("Die Hard: With a Vengeance"), "DIE-HARD-WITH-A-VENGEANCE");
/// assert_eq!(normalize(&normalize("Spider-Man  2")), "SPIDER-MAN-2");
/// ```
pub fn normalize(title: &str) -> String {
    let upper = title.trim().to_uppercase();
    let stripped = NON_TITLE.replace_all(&upper, "");
    let hyphened = SEPARATORS.replace_all(&stripped, "-");
    hyphened.trim_matches('-').to_string()
}

/// Search string of `+`-joined words
///
/// Characters outside `[\w\-.~]` are removed from each word; words left
/// empty are dropped. Blank input gives an empty string.
pub fn escape_query(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| NON_QUERY.replace_all(word, ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("Die Hard"), "DIE-HARD");
        assert_eq!(normalize("DIE HARD"), "DIE-HARD");
        assert_eq!(normalize("  die   hard! "), "DIE-HARD");
        assert_eq!(normalize("Kill Bill: Vol. 1"), "KILL-BILL-VOL-1");
        assert_eq!(normalize("Spider-Man - Homecoming"), "SPIDER-MAN-HOMECOMING");
        assert_eq!(normalize("Amélie"), "AMÉLIE");
        assert_eq!(normalize("?!"), "");
        assert_eq!(normalize("-Foo-"), "FOO");
        assert_eq!(normalize(" -- Foo -- Bar -- "), "FOO-BAR");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for title in [
            "Die Hard",
            " -- Leading hyphens",
            "Trailing ---",
            "Mr. & Mrs. Smith",
            "WALL·E",
            "Straße",
            "snake_case_title",
            "tabs\tand\nnewlines",
            "",
        ] {
            let once = normalize(title);
            assert_eq!(normalize(&once), once, "{:?}", title);
        }
    }

    #[test]
    fn test_equivalent_titles_normalize_identically() {
        let variants = [
            "The Good, the Bad and the Ugly",
            "THE GOOD THE BAD AND THE UGLY",
            "the good - the bad - and the ugly",
            "  The Good... the Bad, and the Ugly!  ",
        ];
        let expected = normalize(variants[0]);
        for title in variants {
            assert_eq!(normalize(title), expected, "{:?}", title);
        }
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("Die Hard"), "Die+Hard");
        assert_eq!(escape_query("Kill Bill: Vol. 1"), "Kill+Bill+Vol.+1");
        assert_eq!(escape_query("  spaced   out  "), "spaced+out");
        assert_eq!(escape_query("Mr. & Mrs. Smith"), "Mr.+Mrs.+Smith");
        assert_eq!(escape_query("X-Men ~ Origins"), "X-Men+~+Origins");
        assert_eq!(escape_query("   "), "");
        assert_eq!(escape_query(""), "");
    }
}
