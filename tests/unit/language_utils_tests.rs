/*!
 * Tests for language code utilities
 */

use yadtwai::language_utils::{
    get_language_name, is_auto, is_rtl, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    resolve_language, validate_language_code, LanguageCodeType,
};

#[test]
fn test_validateLanguageCode_shouldClassifyCodes() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code("German").unwrap(), LanguageCodeType::Name);
    assert!(validate_language_code("zz").is_err());
    assert!(validate_language_code("").is_err());
}

#[test]
fn test_normalizeToPart2t_shouldAcceptEveryForm() {
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("DEU").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("pt-BR").unwrap(), "por");
    assert_eq!(normalize_to_part2t("arabic").unwrap(), "ara");
}

#[test]
fn test_normalizeToPart1OrPart2t_shouldPreferTwoLetterCodes() {
    assert_eq!(normalize_to_part1_or_part2t("fra").unwrap(), "fr");
    assert_eq!(normalize_to_part1_or_part2t("he").unwrap(), "he");
    assert!(normalize_to_part1_or_part2t("zz").is_err());
}

#[test]
fn test_languageCodesMatch_shouldCompareAcrossStandards() {
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("zh", "chi"));
    assert!(!language_codes_match("fr", "de"));
    assert!(!language_codes_match("zz", "zz"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert_eq!(resolve_language("heb").unwrap().to_name(), "Hebrew");
}

#[test]
fn test_isRtl_shouldRecognizeRightToLeftLanguages() {
    for code in ["ar", "ara", "he", "fa", "per", "ur", "yi", "Arabic", "ar-EG"] {
        assert!(is_rtl(code), "{} should be right-to-left", code);
    }
    for code in ["en", "fr", "zh", "ja", "zz", ""] {
        assert!(!is_rtl(code), "{} should be left-to-right", code);
    }
}

#[test]
fn test_isAuto_shouldAcceptAutoAndBlank() {
    assert!(is_auto("auto"));
    assert!(is_auto("AUTO"));
    assert!(is_auto(""));
    assert!(!is_auto("en"));
}
