//! Text search over node display text
//!
//! Queries are split into terms on whitespace, keeping double-quoted phrases
//! intact. A text matches a query when every term matches:
//!
//! - matching ignores case and diacritics (`"Creme"` matches `"Crème"`)
//! - a term matches at the start of a word: `typ` matches `typically` and
//!   `type` but not `atypical`
//! - a leading `*` lifts the word anchor: `*typ` also matches `atypical`
//! - a trailing `*` is accepted and changes nothing, terms are prefixes
//!   already
//! - a `*` inside a term stands for any run of characters: `ty*al` matches
//!   `typical`
//!
//! An empty query matches everything.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static QUERY_TOKEN: OnceLock<Regex> = OnceLock::new();

fn query_token_regex() -> &'static Regex {
    QUERY_TOKEN
        .get_or_init(|| Regex::new(r#"[^\s"]+|"[^"]*""#).expect("query token regex is valid"))
}

/// Fold text for matching: Unicode decomposition, diacritics dropped, lowercase
pub fn normalize_text(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Split a query string on whitespace, unless wrapped in double quotes.
///
/// Quoted phrases lose their quotes and any `*`; bare terms lose stray
/// quotes. Empty terms are dropped.
pub fn parse_search_query_string(query: &str) -> Vec<String> {
    query_token_regex()
        .find_iter(query)
        .map(|m| {
            let token = m.as_str();
            if token.starts_with('"') {
                token.trim_matches('"').replace('*', "")
            } else {
                token.trim_matches('"').to_string()
            }
        })
        .filter(|term| !term.is_empty())
        .collect()
}

/// Does a single term occur in `haystack`? See the module docs for the rules.
pub fn is_term_in_string(term: &str, haystack: &str) -> bool {
    let term = normalize_text(term);
    let (anywhere, needle) = match term.strip_prefix('*') {
        Some(rest) => (true, rest.trim_start_matches('*')),
        None => (false, term.as_str()),
    };
    let mut parts = needle.split('*').filter(|part| !part.is_empty());
    let Some(head) = parts.next() else {
        return true;
    };
    let rest: Vec<&str> = parts.collect();

    let haystack = normalize_text(haystack);
    haystack.match_indices(head).any(|(start, _)| {
        let anchored = anywhere
            || haystack[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_word_char(c));
        anchored && parts_in_order(&haystack[start + head.len()..], &rest)
    })
}

/// Do `parts` occur in `haystack` in this order, without overlapping?
fn parts_in_order(haystack: &str, parts: &[&str]) -> bool {
    let mut remaining = haystack;
    for part in parts {
        match remaining.find(part) {
            Some(at) => remaining = &remaining[at + part.len()..],
            None => return false,
        }
    }
    true
}

/// Do all terms occur in `haystack`? An empty term list matches.
pub fn are_terms_in_string<S: AsRef<str>>(terms: &[S], haystack: &str) -> bool {
    terms
        .iter()
        .all(|term| is_term_in_string(term.as_ref(), haystack))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// =============================================================================
// SEARCH QUERY
// =============================================================================

/// A parsed search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    terms: Vec<String>,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Self {
        Self {
            raw: query.to_string(),
            terms: parse_search_query_string(query),
        }
    }

    /// The query as typed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Blank queries match everything
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        are_terms_in_string(&self.terms, text)
    }
}
