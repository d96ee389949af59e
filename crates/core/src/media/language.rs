//! Language tag to display name resolution.
//!
//! Tags are looked up as ISO 639-1, then ISO 639-3 (which shares its codes
//! with ISO 639-2/T). Regional subtags are dropped ("pt-BR" → "Portuguese").

use isolang::Language;

/// ISO 639-2/B codes that differ from their 639-2/T counterpart.
const BIBLIOGRAPHIC: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("mao", "mri"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("tib", "bod"),
    ("wel", "cym"),
];

/// Resolve a language tag to a display name.
///
/// Unknown codes are returned unchanged so the release still shows something.
pub fn display_name(tag: &str) -> String {
    let primary = tag
        .split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .trim()
        .to_ascii_lowercase();

    lookup(&primary)
        .map(|language| short_name(language.to_name()).to_string())
        .unwrap_or_else(|| tag.to_string())
}

fn lookup(code: &str) -> Option<Language> {
    match code.len() {
        2 => Language::from_639_1(code),
        3 => {
            let code = BIBLIOGRAPHIC
                .iter()
                .find(|(b, _)| *b == code)
                .map_or(code, |(_, t)| *t);
            Language::from_639_3(code)
        }
        _ => None,
    }
}

// "Malay (macrolanguage)" → "Malay"
fn short_name(name: &str) -> &str {
    name.split(" (").next().unwrap_or(name).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_and_three_letter_codes() {
        assert_eq!(display_name("en"), "English");
        assert_eq!(display_name("jpn"), "Japanese");
        assert_eq!(display_name("ger"), "German");
        assert_eq!(display_name("fre"), "French");
    }

    #[test]
    fn test_region_is_dropped() {
        assert_eq!(display_name("pt-BR"), "Portuguese");
        assert_eq!(display_name("es-419"), "Spanish");
        assert_eq!(display_name("zh_Hant"), "Chinese");
    }

    #[test]
    fn test_less_common_codes() {
        assert_eq!(display_name("gsw"), "Swiss German");
        assert_eq!(display_name("ms"), "Malay");
        assert_eq!(display_name("yue"), "Yue Chinese");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        assert_eq!(display_name("zz"), "zz");
        assert_eq!(display_name("xx-XX"), "xx-XX");
        assert_eq!(display_name("klingon"), "klingon");
    }
}
