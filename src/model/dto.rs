use super::UserSettings;
use crate::core::{DbError, Result};
use crate::settings::{DateFormat, Language};
use serde::{Deserialize, Serialize};

/// Settings as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsResponse {
    pub currency: String,
    pub language: String,
    pub date_format: String,
    pub budget_warning_threshold: i64,
    pub force_sync_lookback_months: i64,
    pub disable_built_in_transaction_categories: bool,
    pub enable_auto_categorizer: bool,
    pub auto_categorizer_minimum_probability_percentage: i64,
}

impl From<&UserSettings> for UserSettingsResponse {
    fn from(settings: &UserSettings) -> Self {
        Self {
            currency: settings.currency.clone(),
            language: settings.language.clone(),
            date_format: settings.date_format.clone(),
            budget_warning_threshold: settings.budget_warning_threshold,
            force_sync_lookback_months: settings.force_sync_lookback_months,
            disable_built_in_transaction_categories: settings
                .disable_built_in_transaction_categories,
            enable_auto_categorizer: settings.enable_auto_categorizer,
            auto_categorizer_minimum_probability_percentage: settings
                .auto_categorizer_minimum_probability_percentage,
        }
    }
}

/// Partial settings update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettingsUpdateRequest {
    pub currency: Option<String>,
    pub language: Option<String>,
    pub date_format: Option<String>,
    pub budget_warning_threshold: Option<i64>,
    pub force_sync_lookback_months: Option<i64>,
    pub disable_built_in_transaction_categories: Option<bool>,
    pub enable_auto_categorizer: Option<bool>,
    pub auto_categorizer_minimum_probability_percentage: Option<i64>,
}

impl UserSettingsUpdateRequest {
    /// Validates the request and copies its fields onto `settings`.
    ///
    /// Unknown languages and date formats are rejected rather than coerced.
    pub fn apply_to(&self, settings: &mut UserSettings) -> Result<()> {
        if let Some(language) = &self.language
            && Language::parse_stored(language).is_none()
        {
            return Err(DbError::ConstraintViolation(format!(
                "Unsupported language '{}'",
                language
            )));
        }
        if let Some(format) = &self.date_format
            && DateFormat::parse_stored(format).is_none()
        {
            return Err(DbError::ConstraintViolation(format!(
                "Unsupported date format '{}'",
                format
            )));
        }
        if let Some(pct) = self.auto_categorizer_minimum_probability_percentage
            && !(0..=100).contains(&pct)
        {
            return Err(DbError::ConstraintViolation(format!(
                "Probability percentage {} is out of range",
                pct
            )));
        }

        if let Some(currency) = &self.currency {
            settings.currency = currency.clone();
        }
        if let Some(language) = &self.language {
            settings.language = language.clone();
        }
        if let Some(format) = &self.date_format {
            settings.date_format = format.clone();
        }
        if let Some(threshold) = self.budget_warning_threshold {
            settings.budget_warning_threshold = threshold;
        }
        if let Some(months) = self.force_sync_lookback_months {
            settings.force_sync_lookback_months = months;
        }
        if let Some(flag) = self.disable_built_in_transaction_categories {
            settings.disable_built_in_transaction_categories = flag;
        }
        if let Some(flag) = self.enable_auto_categorizer {
            settings.enable_auto_categorizer = flag;
        }
        if let Some(pct) = self.auto_categorizer_minimum_probability_percentage {
            settings.auto_categorizer_minimum_probability_percentage = pct;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_response_is_camel_case() {
        let settings = UserSettings::new(Uuid::new_v4());
        let json = serde_json::to_value(UserSettingsResponse::from(&settings)).unwrap();
        assert_eq!(json["dateFormat"], "default");
        assert_eq!(json["budgetWarningThreshold"], 80);
        assert!(json.get("date_format").is_none());
    }

    #[test]
    fn test_update_applies_present_fields() {
        let mut settings = UserSettings::new(Uuid::new_v4());
        let request: UserSettingsUpdateRequest =
            serde_json::from_str(r#"{"dateFormat":"DD/MM/YYYY","language":"fr"}"#).unwrap();
        request.apply_to(&mut settings).unwrap();

        assert_eq!(settings.date_format(), DateFormat::DayMonthYear);
        assert_eq!(settings.language, "fr");
        assert_eq!(settings.currency, "USD");
    }

    #[test]
    fn test_update_rejects_unknown_format_without_partial_write() {
        let mut settings = UserSettings::new(Uuid::new_v4());
        let request = UserSettingsUpdateRequest {
            currency: Some("EUR".into()),
            date_format: Some("DD-MM-YY".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.apply_to(&mut settings),
            Err(DbError::ConstraintViolation(_))
        ));
        assert_eq!(settings.currency, "USD");
    }
}
