//! Countries offered for trend search and their search locales.

use sous_ai::Locale;

/// Option that turns trend search off for the session.
pub const NO_TREND_OPTION: &str = "트렌드 반영 안 함";

static COUNTRY_LOCALES: &[(&str, Locale)] = &[
    ("한국", Locale::new("ko", "kr")),
    ("일본", Locale::new("ja", "jp")),
    ("중국", Locale::new("zh-cn", "cn")),
    ("대만", Locale::new("zh-tw", "tw")),
    ("베트남", Locale::new("vi", "vn")),
    ("미국", Locale::new("en", "us")),
    ("독일", Locale::new("de", "de")),
];

/// Search locale for a supported country
pub fn locale_for(country: &str) -> Option<Locale> {
    COUNTRY_LOCALES
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, locale)| *locale)
}

/// Options shown at country selection, in display order
pub fn country_options() -> Vec<String> {
    COUNTRY_LOCALES
        .iter()
        .map(|(name, _)| name.to_string())
        .chain(std::iter::once(NO_TREND_OPTION.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_country() {
        assert_eq!(locale_for("대만"), Some(Locale::new("zh-tw", "tw")));
        assert_eq!(locale_for("독일"), Some(Locale::new("de", "de")));
    }

    #[test]
    fn test_unknown_country() {
        assert_eq!(locale_for("프랑스"), None);
        assert_eq!(locale_for(NO_TREND_OPTION), None);
    }

    #[test]
    fn test_options_end_with_opt_out() {
        let options = country_options();
        assert_eq!(options.len(), 8);
        assert_eq!(options[0], "한국");
        assert_eq!(options.last().map(String::as_str), Some(NO_TREND_OPTION));
    }
}
