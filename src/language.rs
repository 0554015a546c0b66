//! Target language resolution
//!
//! Catalog directories are named after locales (`messages/zh-CN`,
//! `messages/pt-br`). DeepL wants its own upper-case codes, so the
//! directory name is mapped through a fixed table.

use std::path::Path;
use tracing::warn;

/// Used when a directory name matches nothing in the table
pub const DEFAULT_INFERRED_LANGUAGE: &str = "IT";

/// Used when an explicit code is not a known DeepL target
pub const DEFAULT_EXPLICIT_LANGUAGE: &str = "EN";

/// Locale directory name (lower case) → DeepL language code
fn dir_language(name: &str) -> Option<&'static str> {
    let code = match name {
        "en" => "EN",
        "zh-cn" | "zh-tw" => "ZH",
        "ja" => "JA",
        "ko" => "KO",
        "ar" => "AR",
        "fr" => "FR",
        "de" => "DE",
        "it" => "IT",
        "es" => "ES",
        "pt" | "pt-br" => "PT-BR",
        "ru" => "RU",
        "nl" => "NL",
        "sv" => "SV",
        "da" => "DA",
        "pl" => "PL",
        "tr" => "TR",
        _ => return None,
    };
    Some(code)
}

/// Infer the DeepL code from a target directory
///
/// The basename is lower-cased and looked up; failing that its first
/// hyphen-separated segment; failing that, `DEFAULT_INFERRED_LANGUAGE`.
pub fn infer_language_from_dir(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    dir_language(&name)
        .or_else(|| name.split('-').next().and_then(dir_language))
        .unwrap_or(DEFAULT_INFERRED_LANGUAGE)
        .to_string()
}

/// Normalize an explicitly given language code
///
/// Codes are upper-cased; `PT` becomes `PT-BR`. Unknown codes fall back to
/// `DEFAULT_EXPLICIT_LANGUAGE` with a warning.
pub fn resolve_language_code(code: &str) -> String {
    let upper = code.trim().to_uppercase();
    let resolved = match upper.as_str() {
        "EN" | "ZH" | "DE" | "FR" | "IT" | "ES" | "RU" | "JA" | "KO" | "AR" | "NL" | "SV"
        | "DA" | "PL" | "TR" | "PT-BR" => Some(upper.clone()),
        "PT" => Some("PT-BR".to_string()),
        _ => None,
    };

    resolved.unwrap_or_else(|| {
        warn!(
            "Unknown target language '{}', falling back to {}",
            code, DEFAULT_EXPLICIT_LANGUAGE
        );
        DEFAULT_EXPLICIT_LANGUAGE.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_exact_match() {
        assert_eq!(infer_language_from_dir(Path::new("./messages/fr")), "FR");
        assert_eq!(infer_language_from_dir(Path::new("messages/ja")), "JA");
        assert_eq!(infer_language_from_dir(Path::new("messages/pt-br")), "PT-BR");
    }

    #[test]
    fn test_infer_is_case_insensitive() {
        assert_eq!(infer_language_from_dir(Path::new("messages/zh-CN")), "ZH");
        assert_eq!(infer_language_from_dir(Path::new("messages/DE")), "DE");
    }

    #[test]
    fn test_infer_falls_back_to_first_segment() {
        assert_eq!(infer_language_from_dir(Path::new("messages/de-AT")), "DE");
        assert_eq!(infer_language_from_dir(Path::new("messages/es-419")), "ES");
    }

    #[test]
    fn test_infer_default_for_unknown() {
        assert_eq!(infer_language_from_dir(Path::new("messages/xx")), "IT");
        assert_eq!(infer_language_from_dir(Path::new("messages/no")), "IT");
        assert_eq!(infer_language_from_dir(Path::new("/")), "IT");
    }

    #[test]
    fn test_resolve_explicit_codes() {
        assert_eq!(resolve_language_code("fr"), "FR");
        assert_eq!(resolve_language_code("PT"), "PT-BR");
        assert_eq!(resolve_language_code("pt-br"), "PT-BR");
        assert_eq!(resolve_language_code(" de "), "DE");
    }

    #[test]
    fn test_resolve_unknown_code_falls_back() {
        assert_eq!(resolve_language_code("klingon"), "EN");
    }
}
