use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Languages are accepted as ISO 639-1, ISO 639-2/B, ISO 639-2/T or 639-3
/// codes, optionally with a region suffix (`pt-BR`), or as English names
/// ("Arabic"). Right-to-left detection works on the resolved 639-3 code.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T or 639-3 (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
    /// English language name
    Name,
}

/// Value meaning "let the provider detect the source language"
pub const AUTO_LANGUAGE: &str = "auto";

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Languages written right-to-left, as ISO 639-3 codes
pub const RTL_LANGUAGES: &[&str] = &[
    "ara", "arb", // Arabic
    "heb", // Hebrew
    "fas", "pes", "prs", // Persian, Dari
    "urd", // Urdu
    "yid", "ydd", "yih", // Yiddish
    "pus", "pbt", "pbu", // Pashto
    "snd", // Sindhi
    "div", // Dhivehi
    "kur", "ckb", // Kurdish (Sorani)
    "uig", // Uyghur
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Strip whitespace and any region suffix, lowercase the rest
fn base_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn from_english_name(name: &str) -> Option<Language> {
    let name = name.trim();
    if let Some(language) = Language::from_name(name) {
        return Some(language);
    }
    let mut chars = name.chars();
    let first = chars.next()?;
    let title_case: String = first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect();
    Language::from_name(&title_case)
}

/// Resolve a code or English name into a language
pub fn resolve_language(input: &str) -> Result<Language> {
    let code = base_code(input);
    let language = match code.len() {
        2 => Language::from_639_1(&code),
        3 => Language::from_639_3(part2b_to_part2t(&code).unwrap_or(&code)),
        _ => None,
    };
    language
        .or_else(|| from_english_name(input))
        .ok_or_else(|| anyhow!("Invalid language code: {}", input))
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code, or a language name
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = base_code(code);

    if normalized_code.len() == 2 && Language::from_639_1(&normalized_code).is_some() {
        return Ok(LanguageCodeType::Part1);
    }
    if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if part2b_to_part2t(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }
    if from_english_name(code).is_some() {
        return Ok(LanguageCodeType::Name);
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve_language(code)
        .map(|language| language.to_639_3().to_string())
        .map_err(|_| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let language =
        resolve_language(code).map_err(|_| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(language
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| language.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(first), Ok(second)) => first == second,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_name().to_string())
}

/// Whether the language is written right-to-left; unknown languages are not
pub fn is_rtl(code: &str) -> bool {
    normalize_to_part2t(code)
        .map(|part2t| RTL_LANGUAGES.contains(&part2t.as_str()))
        .unwrap_or(false)
}

/// Whether the value asks for source-language detection
pub fn is_auto(code: &str) -> bool {
    code.trim().is_empty() || code.trim().eq_ignore_ascii_case(AUTO_LANGUAGE)
}
