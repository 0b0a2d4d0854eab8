//! Date format and locale preferences.
//!
//! Resolves what the client renders from two inputs: the UI language and the
//! `DateFormat` stored in the user's settings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Short-date pattern token meaning "the locale's default".
pub const LOCALE_DEFAULT_PATTERN: &str = "L";
/// Long-date pattern token meaning "the locale's default".
pub const LOCALE_DEFAULT_LONG_PATTERN: &str = "LL";

/// User-selectable date display pattern, stored in `UserSettings.DateFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "YYYY/MM/DD")]
    YearMonthDay,
}

impl DateFormat {
    pub const ALL: [DateFormat; 4] = [
        Self::Default,
        Self::MonthDayYear,
        Self::DayMonthYear,
        Self::YearMonthDay,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::MonthDayYear => "MM/DD/YYYY",
            Self::DayMonthYear => "DD/MM/YYYY",
            Self::YearMonthDay => "YYYY/MM/DD",
        }
    }

    /// Strict parse, `None` for anything that is not a stored value.
    pub fn parse_stored(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == raw)
    }

    pub fn short_pattern(&self) -> &'static str {
        match self {
            Self::Default => LOCALE_DEFAULT_PATTERN,
            other => other.as_str(),
        }
    }

    pub fn long_pattern(&self) -> &'static str {
        match self {
            Self::Default => LOCALE_DEFAULT_LONG_PATTERN,
            Self::MonthDayYear => "MMMM D, YYYY",
            Self::DayMonthYear => "D MMMM YYYY",
            Self::YearMonthDay => "YYYY MMMM D",
        }
    }

    /// chrono format string for the short pattern, `None` for the locale default.
    pub fn chrono_pattern(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::MonthDayYear => Some("%m/%d/%Y"),
            Self::DayMonthYear => Some("%d/%m/%Y"),
            Self::YearMonthDay => Some("%Y/%m/%d"),
        }
    }
}

/// Unknown values fall back to [`DateFormat::Default`].
impl FromStr for DateFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_stored(s.trim()).unwrap_or_default())
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// UI language setting, stored in `UserSettings.Language`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "default")]
    SystemDefault,
    #[serde(rename = "en-us")]
    EnUs,
    #[serde(rename = "de")]
    De,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "zh-hans")]
    ZhHans,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Self::SystemDefault,
        Self::EnUs,
        Self::De,
        Self::Fr,
        Self::ZhHans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemDefault => "default",
            Self::EnUs => "en-us",
            Self::De => "de",
            Self::Fr => "fr",
            Self::ZhHans => "zh-hans",
        }
    }

    pub fn parse_stored(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == raw)
    }
}

/// Date-library locale for a UI language; anything unmapped renders as `en`.
pub fn date_locale(language: &str) -> &'static str {
    match language {
        "en-us" => "en",
        "de" => "de",
        "fr" => "fr",
        "zh-hans" => "zh-cn",
        _ => "en",
    }
}

/// Decimal and thousands separators used by a date locale.
fn separators(locale: &str) -> (char, char) {
    match locale {
        "de" => (',', '.'),
        "fr" => (',', '\u{202F}'),
        _ => ('.', ','),
    }
}

/// chrono pattern of a locale's default short date (`L`).
fn locale_default_pattern(locale: &str) -> &'static str {
    match locale {
        "de" => "%d.%m.%Y",
        "fr" => "%d/%m/%Y",
        "zh-cn" => "%Y/%m/%d",
        _ => "%m/%d/%Y",
    }
}

/// Display preferences derived from language and user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalePreferences {
    pub date_locale: String,
    pub intl_locale: String,
    pub date_format: String,
    pub long_date_format: String,
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl LocalePreferences {
    /// A user format other than `default` is passed through as stored, even
    /// when it is not one of the known patterns.
    pub fn resolve(language: &str, user_date_format: Option<&str>) -> Self {
        let locale = date_locale(language);
        let date_format = match user_date_format {
            Some(raw) if !raw.is_empty() && raw != DateFormat::Default.as_str() => raw,
            _ => LOCALE_DEFAULT_PATTERN,
        };
        let long_date_format = DateFormat::parse_stored(date_format)
            .map(|f| f.long_pattern())
            .unwrap_or(LOCALE_DEFAULT_LONG_PATTERN);
        let (decimal_separator, thousands_separator) = separators(locale);

        Self {
            date_locale: locale.to_string(),
            intl_locale: language.to_string(),
            date_format: date_format.to_string(),
            long_date_format: long_date_format.to_string(),
            decimal_separator,
            thousands_separator,
        }
    }

    pub fn from_settings(settings: &crate::model::UserSettings) -> Self {
        Self::resolve(&settings.language, Some(settings.date_format.as_str()))
    }

    /// Renders a date with the short pattern. Patterns without a chrono
    /// equivalent render with the locale default.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let pattern = DateFormat::parse_stored(&self.date_format)
            .and_then(|f| f.chrono_pattern())
            .unwrap_or_else(|| locale_default_pattern(&self.date_locale));
        date.format(pattern).to_string()
    }
}

impl Default for LocalePreferences {
    fn default() -> Self {
        Self::resolve("en-us", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_format_round_trip_strings() {
        for format in DateFormat::ALL {
            assert_eq!(DateFormat::parse_stored(format.as_str()), Some(format));
        }
        assert_eq!("nonsense".parse::<DateFormat>().unwrap(), DateFormat::Default);
    }

    #[test]
    fn test_long_patterns() {
        assert_eq!(DateFormat::MonthDayYear.long_pattern(), "MMMM D, YYYY");
        assert_eq!(DateFormat::DayMonthYear.long_pattern(), "D MMMM YYYY");
        assert_eq!(DateFormat::YearMonthDay.long_pattern(), "YYYY MMMM D");
        assert_eq!(DateFormat::Default.long_pattern(), "LL");
    }

    #[test]
    fn test_resolve_defaults_to_locale_pattern() {
        let prefs = LocalePreferences::resolve("de", Some("default"));
        assert_eq!(prefs.date_locale, "de");
        assert_eq!(prefs.intl_locale, "de");
        assert_eq!(prefs.date_format, "L");
        assert_eq!(prefs.long_date_format, "LL");
        assert_eq!(prefs.decimal_separator, ',');
        assert_eq!(prefs.thousands_separator, '.');
    }

    #[test]
    fn test_resolve_user_format_and_unknown_language() {
        let prefs = LocalePreferences::resolve("pt-br", Some("YYYY/MM/DD"));
        assert_eq!(prefs.date_locale, "en");
        assert_eq!(prefs.intl_locale, "pt-br");
        assert_eq!(prefs.date_format, "YYYY/MM/DD");
        assert_eq!(prefs.long_date_format, "YYYY MMMM D");
        assert_eq!(prefs.decimal_separator, '.');
    }

    #[test]
    fn test_unknown_user_format_is_passed_through() {
        let prefs = LocalePreferences::resolve("fr", Some("DD.MM.YY"));
        assert_eq!(prefs.date_format, "DD.MM.YY");
        assert_eq!(prefs.long_date_format, "LL");
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(prefs.format_date(date), "14/02/2026");

        assert_eq!(LocalePreferences::resolve("fr", Some("")).date_format, "L");
    }

    #[test]
    fn test_zh_hans_maps_to_zh_cn() {
        assert_eq!(date_locale("zh-hans"), "zh-cn");
        assert_eq!(date_locale("default"), "en");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(
            LocalePreferences::resolve("en-us", Some("DD/MM/YYYY")).format_date(date),
            "14/02/2026"
        );
        assert_eq!(LocalePreferences::resolve("de", None).format_date(date), "14.02.2026");
        assert_eq!(LocalePreferences::default().format_date(date), "02/14/2026");
    }

    #[test]
    fn test_serde_uses_stored_strings() {
        let json = serde_json::to_string(&DateFormat::DayMonthYear).unwrap();
        assert_eq!(json, "\"DD/MM/YYYY\"");
        let lang: Language = serde_json::from_str("\"zh-hans\"").unwrap();
        assert_eq!(lang, Language::ZhHans);
    }
}
