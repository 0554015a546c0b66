//! Content protection for machine translation
//!
//! Proper nouns and `{identifier}` placeholders must come back from the
//! backend byte-for-byte. Before a string is sent, each protected span is
//! swapped for an opaque token of the form `##0001##`; after translation the
//! tokens are swapped back.
//!
//! ```ignore
//! Source:      "Welcome to Acme, {name}"
//! Protected:   "Welcome to ##0001##, ##0002##"
//! Translated:  "Bienvenue chez ##0001##, ##0002##"
//! Restored:    "Bienvenue chez Acme, {name}"
//! ```
//!
//! Restoration runs in two passes:
//! 1. Delimited tokens are replaced, tolerating mangled delimiters
//!    (`#0001#`, `## 0001 ##`, full-width `＃`).
//! 2. Ids still short of their expected count are matched as bare digit
//!    runs. Only whole runs equal to a pending id are touched, so numbers in
//!    the translated prose survive.
//!
//! Anything that cannot be accounted for is reported in `RestoreOutcome`,
//! never turned into an error: a slightly damaged string beats losing the
//! whole batch.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// A string made of exactly one placeholder, e.g. `{count}`
static PURE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{[a-zA-Z0-9_]+\}$").expect("valid regex"));

/// Placeholders that get protected inside larger strings
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[a-zA-Z_][a-zA-Z0-9_]*\}").expect("valid regex"));

/// Token with (possibly mangled) delimiters
static DELIMITED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#＃]{1,2}\s*([0-9]+)\s*[#＃]{1,2}").expect("valid regex"));

/// Maximal ASCII digit run, with any stray delimiters stuck to it
static BARE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#＃]*([0-9]+)[#＃]*").expect("valid regex"));

/// Well-formed token left in final output
static LEAKED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"##[0-9]{4,}##").expect("valid regex"));

/// True for strings that are nothing but a single placeholder
///
/// These are never sent to the backend.
pub fn is_pure_placeholder(text: &str) -> bool {
    PURE_PLACEHOLDER.is_match(text)
}

/// Tokens still visible in a final, restored string
pub fn find_leaked_tokens(text: &str) -> Vec<String> {
    LEAKED_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// An opaque marker standing in for a protected span
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtectedToken {
    /// Zero-padded numeric id, e.g. "0001"
    pub id: String,
}

impl ProtectedToken {
    /// The form that is written into the text sent to the backend
    pub fn marker(&self) -> String {
        format!("##{}##", self.id)
    }
}

impl std::fmt::Display for ProtectedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "##{}##", self.id)
    }
}

/// Hands out tokens with strictly increasing ids
///
/// One generator serves one batch, so ids are never reused within a batch.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    counter: u64,
}

impl TokenGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next token whose id does not already occur in `text`
    ///
    /// Skipping ids that appear in the source keeps bare-digit restoration
    /// from matching a number the author wrote.
    pub fn next_for(&mut self, text: &str) -> ProtectedToken {
        loop {
            self.counter += 1;
            let id = format!("{:04}", self.counter);
            if !text.contains(&id) {
                return ProtectedToken { id };
            }
        }
    }
}

/// One protected span of a source string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub token: ProtectedToken,
    /// The text the token replaced
    pub original: String,
    /// How many times the token was written into the protected text
    pub occurrences: usize,
}

/// Token → original content, for one string's round trip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionMap {
    spans: Vec<ProtectedSpan>,
}

impl ProtectionMap {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn spans(&self) -> &[ProtectedSpan] {
        &self.spans
    }

    /// Original content for a token id
    pub fn original(&self, id: &str) -> Option<&str> {
        self.spans
            .iter()
            .find(|span| span.token.id == id)
            .map(|span| span.original.as_str())
    }

    fn push(&mut self, token: ProtectedToken, original: String, occurrences: usize) {
        self.spans.push(ProtectedSpan {
            token,
            original,
            occurrences,
        });
    }
}

/// Result of restoring one translated string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Text with every recoverable token replaced by its original content
    pub text: String,
    /// Number of token occurrences that were restored
    pub restored: usize,
    /// Count mismatches and missing tokens
    pub warnings: Vec<String>,
    /// Tokens still present in `text`
    pub leaked: Vec<String>,
}

impl RestoreOutcome {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.leaked.is_empty()
    }
}

/// Replace proper nouns and placeholders with tokens
///
/// Proper nouns go first, longest first, so "Acme Cloud" wins over "Acme".
/// All occurrences of a noun share one token. Each placeholder occurrence
/// gets its own token.
pub fn protect(
    text: &str,
    proper_nouns: &[String],
    tokens: &mut TokenGenerator,
) -> (String, ProtectionMap) {
    let mut map = ProtectionMap::default();
    let mut result = text.to_string();

    let mut nouns: Vec<&str> = proper_nouns
        .iter()
        .map(String::as_str)
        .filter(|noun| !noun.is_empty())
        .collect();
    nouns.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    nouns.dedup();

    for noun in nouns {
        let occurrences = result.matches(noun).count();
        if occurrences == 0 {
            continue;
        }
        let token = tokens.next_for(text);
        result = result.replace(noun, &token.marker());
        map.push(token, noun.to_string(), occurrences);
    }

    let result = PLACEHOLDER
        .replace_all(&result, |caps: &Captures| {
            let token = tokens.next_for(text);
            let marker = token.marker();
            map.push(token, caps[0].to_string(), 1);
            marker
        })
        .into_owned();

    (result, map)
}

enum Piece {
    Raw(String),
    Restored(String),
}

/// Run one restoration pass over the raw pieces
///
/// `accept` decides whether a matched id should be replaced; it is called
/// with the id and the number of times it has been restored so far.
fn restore_pass<'m>(
    pieces: Vec<Piece>,
    pattern: &Regex,
    map: &'m ProtectionMap,
    counts: &mut HashMap<&'m str, usize>,
    accept: impl Fn(&ProtectedSpan, usize) -> bool,
) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());

    for piece in pieces {
        let raw = match piece {
            Piece::Raw(raw) => raw,
            restored => {
                out.push(restored);
                continue;
            }
        };

        // A rejected match only consumes its digits, so a delimiter it
        // swallowed can still open the next token.
        let mut last = 0;
        let mut pos = 0;
        while let Some(caps) = pattern.captures_at(&raw, pos) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let span = map.spans.iter().find(|s| s.token.id == id.as_str());
            let accepted = span.filter(|span| {
                let seen = counts.get(span.token.id.as_str()).copied().unwrap_or(0);
                accept(span, seen)
            });
            let span = match accepted {
                Some(span) => span,
                None => {
                    pos = id.end();
                    continue;
                }
            };
            out.push(Piece::Raw(raw[last..whole.start()].to_string()));
            out.push(Piece::Restored(span.original.clone()));
            *counts.entry(span.token.id.as_str()).or_insert(0) += 1;
            last = whole.end();
            pos = whole.end();
        }
        out.push(Piece::Raw(raw[last..].to_string()));
    }

    out
}

/// Put protected content back into a translated string
pub fn restore(translated: &str, map: &ProtectionMap) -> RestoreOutcome {
    if map.is_empty() {
        return RestoreOutcome {
            text: translated.to_string(),
            restored: 0,
            warnings: Vec::new(),
            leaked: Vec::new(),
        };
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();

    let pieces = vec![Piece::Raw(translated.to_string())];
    let pieces = restore_pass(pieces, &DELIMITED_TOKEN, map, &mut counts, |_, _| true);
    let pieces = restore_pass(pieces, &BARE_TOKEN, map, &mut counts, |span, seen| {
        seen < span.occurrences
    });

    let text: String = pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Raw(s) | Piece::Restored(s) => s,
        })
        .collect();

    let mut warnings = Vec::new();
    for span in &map.spans {
        let seen = counts.get(span.token.id.as_str()).copied().unwrap_or(0);
        if seen == 0 {
            warnings.push(format!(
                "token {} for '{}' missing from translation",
                span.token, span.original
            ));
        } else if seen != span.occurrences {
            warnings.push(format!(
                "token {} for '{}' restored {} times, expected {}",
                span.token, span.original, seen, span.occurrences
            ));
        }
    }

    let leaked = find_leaked_tokens(&text);

    RestoreOutcome {
        text,
        restored: counts.values().sum(),
        warnings,
        leaked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nouns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn protect_fresh(text: &str, proper_nouns: &[String]) -> (String, ProtectionMap) {
        protect(text, proper_nouns, &mut TokenGenerator::new())
    }

    // ========== Pure Placeholder Tests ==========

    #[test]
    fn test_pure_placeholder_detection() {
        assert!(is_pure_placeholder("{name}"));
        assert!(is_pure_placeholder("{count_2}"));
        assert!(is_pure_placeholder("{0}"));
        assert!(!is_pure_placeholder("Welcome back, {name}"));
        assert!(!is_pure_placeholder("{name} "));
        assert!(!is_pure_placeholder("{first}{last}"));
        assert!(!is_pure_placeholder("{}"));
        assert!(!is_pure_placeholder(""));
    }

    // ========== Token Generator Tests ==========

    #[test]
    fn test_tokens_increase_monotonically() {
        let mut tokens = TokenGenerator::new();
        let ids: Vec<String> = (0..3).map(|_| tokens.next_for("").id).collect();
        assert_eq!(ids, vec!["0001", "0002", "0003"]);
    }

    #[test]
    fn test_token_skips_id_present_in_text() {
        let mut tokens = TokenGenerator::new();
        let token = tokens.next_for("Order 0001 shipped");
        assert_eq!(token.id, "0002");
        assert_eq!(token.marker(), "##0002##");
    }

    #[test]
    fn test_generator_is_shared_across_strings() {
        let mut tokens = TokenGenerator::new();
        let (first, _) = protect("Hi {name}", &[], &mut tokens);
        let (second, _) = protect("Bye {name}", &[], &mut tokens);
        assert_eq!(first, "Hi ##0001##");
        assert_eq!(second, "Bye ##0002##");
    }

    // ========== Protection Tests ==========

    #[test]
    fn test_protect_placeholder() {
        let (text, map) = protect_fresh("Welcome back, {name}", &[]);
        assert_eq!(text, "Welcome back, ##0001##");
        assert_eq!(map.len(), 1);
        assert_eq!(map.original("0001"), Some("{name}"));
    }

    #[test]
    fn test_protect_nouns_before_placeholders() {
        let (text, map) = protect_fresh("{user} joined Acme", &nouns(&["Acme"]));
        assert_eq!(text, "##0002## joined ##0001##");
        assert_eq!(map.original("0001"), Some("Acme"));
        assert_eq!(map.original("0002"), Some("{user}"));
    }

    #[test]
    fn test_protect_longest_noun_first() {
        let (text, map) = protect_fresh(
            "Acme Cloud is built by Acme",
            &nouns(&["Acme", "Acme Cloud"]),
        );
        assert_eq!(text, "##0001## is built by ##0002##");
        assert_eq!(map.original("0001"), Some("Acme Cloud"));
        assert_eq!(map.original("0002"), Some("Acme"));
    }

    #[test]
    fn test_protect_repeated_noun_shares_token() {
        let (text, map) = protect_fresh("Acme loves Acme", &nouns(&["Acme"]));
        assert_eq!(text, "##0001## loves ##0001##");
        assert_eq!(map.len(), 1);
        assert_eq!(map.spans()[0].occurrences, 2);
    }

    #[test]
    fn test_protect_repeated_placeholder_gets_own_tokens() {
        let (text, map) = protect_fresh("{a} and {a}", &[]);
        assert_eq!(text, "##0001## and ##0002##");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_protect_ignores_numeric_braces_and_empty_nouns() {
        let (text, map) = protect_fresh("Step {1} of {total}", &nouns(&[""]));
        assert_eq!(text, "Step {1} of ##0001##");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_protect_plain_text_untouched() {
        let (text, map) = protect_fresh("Save", &nouns(&["Acme"]));
        assert_eq!(text, "Save");
        assert!(map.is_empty());
    }

    // ========== Round Trip Tests ==========

    #[test]
    fn test_roundtrip_without_backend_changes() {
        let proper = nouns(&["Acme", "Acme Cloud", "Banana"]);
        let samples = [
            "Welcome back, {name}",
            "{user} uploaded {count} files to Acme Cloud",
            "Acme, Acme and Banana",
            "Order 0001 for {customer_id} at Acme",
            "{a}{b}{c}",
            "Nothing to protect here.",
            "日本語 {name} テキスト Banana",
        ];
        for sample in samples {
            let (protected, map) = protect_fresh(sample, &proper);
            let outcome = restore(&protected, &map);
            assert_eq!(outcome.text, sample, "round trip failed for {:?}", sample);
            assert!(outcome.is_clean(), "unexpected warnings for {:?}", sample);
        }
    }

    #[test]
    fn test_roundtrip_with_hash_signs_in_prose() {
        let samples = [
            "Top #1 #{tag}",
            "Top #1 ##{tag}",
            "Ranked #1 {name}",
            "5#{a}",
            "C# by Acme {x}",
            "Issue #42 for {name}",
            "## 7 ## {x} #",
        ];
        for sample in samples {
            let (protected, map) = protect_fresh(sample, &nouns(&["Acme"]));
            let outcome = restore(&protected, &map);
            assert_eq!(outcome.text, sample, "round trip failed for {:?}", sample);
            assert!(outcome.is_clean(), "unexpected warnings for {:?}", sample);
        }
    }

    #[test]
    fn test_unknown_delimited_id_does_not_eat_next_marker() {
        let (protected, map) = protect_fresh("Top #1 #{tag}", &[]);
        assert_eq!(protected, "Top #1 ###0001##");
        let outcome = restore("Classement #1 ###0001##", &map);
        assert_eq!(outcome.text, "Classement #1 #{tag}");
    }

    #[test]
    fn test_restore_after_reordering() {
        let (protected, map) = protect_fresh("{sender} sent {count} messages", &[]);
        assert_eq!(protected, "##0001## sent ##0002## messages");

        let outcome = restore("##0002## 件のメッセージを ##0001## が送信しました", &map);
        assert_eq!(outcome.text, "{count} 件のメッセージを {sender} が送信しました");
        assert!(outcome.is_clean());
    }

    // ========== Backend Mutation Tests ==========

    #[test]
    fn test_restore_tolerates_mangled_delimiters() {
        let (_, map) = protect_fresh("{a} {b} {c} {d}", &[]);
        let outcome = restore("#0001# ## 0002 ## ＃＃0003＃＃ ##0004#", &map);
        assert_eq!(outcome.text, "{a} {b} {c} {d}");
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_restore_bare_digits_when_delimiters_lost() {
        let (_, map) = protect_fresh("Hello {name}", &[]);
        let outcome = restore("Bonjour 0001", &map);
        assert_eq!(outcome.text, "Bonjour {name}");
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_restore_leaves_coincidental_numbers() {
        let (_, map) = protect_fresh("Since 2024, {name}", &[]);
        let outcome = restore("Depuis 2024, ##0001##, 0001 fois", &map);
        // 0001 is already fully restored, so the bare "0001" is prose
        assert_eq!(outcome.text, "Depuis 2024, {name}, 0001 fois");
    }

    #[test]
    fn test_restore_does_not_rescan_restored_content() {
        let (_, map) = protect_fresh("Route 0002 by Acme {x}", &nouns(&["Route 0002"]));
        // 0002 occurs in the source, so ids skip it
        assert_eq!(map.original("0001"), Some("Route 0002"));
        assert_eq!(map.original("0003"), Some("{x}"));

        let outcome = restore("##0001## par Acme 0003", &map);
        assert_eq!(outcome.text, "Route 0002 par Acme {x}");
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_restore_digit_run_must_match_exactly() {
        let (_, map) = protect_fresh("Hi {name}", &[]);
        let outcome = restore("Salut 10001", &map);
        assert_eq!(outcome.text, "Salut 10001");
        assert_eq!(outcome.warnings.len(), 1);
    }

    // ========== Integrity Reporting Tests ==========

    #[test]
    fn test_restore_reports_missing_token() {
        let (_, map) = protect_fresh("Hi {name}", &[]);
        let outcome = restore("Salut", &map);
        assert_eq!(outcome.text, "Salut");
        assert_eq!(outcome.restored, 0);
        assert!(outcome.warnings[0].contains("missing"));
    }

    #[test]
    fn test_restore_reports_duplicated_token() {
        let (_, map) = protect_fresh("Hi {name}", &[]);
        let outcome = restore("##0001## ##0001##", &map);
        assert_eq!(outcome.text, "{name} {name}");
        assert_eq!(outcome.restored, 2);
        assert!(outcome.warnings[0].contains("expected 1"));
    }

    #[test]
    fn test_restore_reports_leaked_unknown_token() {
        let (_, map) = protect_fresh("Hi {name}", &[]);
        let outcome = restore("##0001## ##0042##", &map);
        assert_eq!(outcome.text, "{name} ##0042##");
        assert_eq!(outcome.leaked, vec!["##0042##"]);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_restore_with_empty_map_is_identity() {
        let outcome = restore("Bonjour ##0001##", &ProtectionMap::default());
        assert_eq!(outcome.text, "Bonjour ##0001##");
        assert_eq!(outcome.restored, 0);
        assert!(outcome.leaked.is_empty());
    }

    #[test]
    fn test_find_leaked_tokens() {
        assert_eq!(find_leaked_tokens("a ##0001## b ##12345##"), vec![
            "##0001##",
            "##12345##"
        ]);
        assert!(find_leaked_tokens("#0001# 0001 ##01##").is_empty());
    }
}
