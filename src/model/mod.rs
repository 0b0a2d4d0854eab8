//! BudgetBoard entities.
//!
//! The tables mirror the application's schema. Free-text columns such as
//! merchant names and sync ids come from bank imports and are the usual
//! carriers of stray NUL characters.

mod dto;
mod migrations;

pub use dto::{UserSettingsResponse, UserSettingsUpdateRequest};
pub use migrations::{
    ADD_DATE_FORMAT, INITIAL_CREATE, budget_board_migrations, open_context, open_context_with,
};

use crate::settings::DateFormat;
use chrono::{DateTime, Utc};
use uuid::Uuid;

crate::entity_struct! {
    /// A bank or brokerage that owns accounts.
    pub struct Institution table = "Institutions" {
        id: Uuid => "Id",
        name: String => "Name",
        user_id: Uuid => "UserID",
    }
}

impl Institution {
    pub fn new(name: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            user_id,
        }
    }
}

crate::entity_struct! {
    pub struct Account table = "Accounts" {
        id: Uuid => "Id",
        name: String => "Name",
        institution_id: Option<Uuid> => "InstitutionID",
        account_type: String => "Type",
        subtype: Option<String> => "Subtype",
        source: String => "Source",
        user_id: Uuid => "UserID",
    }
}

impl Account {
    pub fn new(name: impl Into<String>, account_type: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            institution_id: None,
            account_type: account_type.into(),
            subtype: None,
            source: "Manual".to_string(),
            user_id,
        }
    }
}

crate::entity_struct! {
    /// A single posted or imported transaction.
    pub struct Transaction table = "Transactions" {
        id: Uuid => "Id",
        sync_id: Option<String> => "SyncID",
        amount: f64 => "Amount",
        date: DateTime<Utc> => "Date",
        category: Option<String> => "Category",
        subcategory: Option<String> => "Subcategory",
        merchant_name: Option<String> => "MerchantName",
        source: String => "Source",
        account_id: Uuid => "AccountID",
    }
}

impl Transaction {
    pub fn new(account_id: Uuid, amount: f64, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sync_id: None,
            amount,
            date,
            category: None,
            subcategory: None,
            merchant_name: None,
            source: "Manual".to_string(),
            account_id,
        }
    }
}

crate::entity_struct! {
    /// Per-user preferences.
    pub struct UserSettings table = "UserSettings" {
        id: Uuid => "Id",
        user_id: Uuid => "UserID",
        currency: String => "Currency",
        language: String => "Language",
        date_format: String => "DateFormat",
        budget_warning_threshold: i64 => "BudgetWarningThreshold",
        force_sync_lookback_months: i64 => "ForceSyncLookbackMonths",
        disable_built_in_transaction_categories: bool => "DisableBuiltInTransactionCategories",
        enable_auto_categorizer: bool => "EnableAutoCategorizer",
        auto_categorizer_minimum_probability_percentage: i64 => "AutoCategorizerMinimumProbabilityPercentage",
    }
}

impl UserSettings {
    /// Settings with application defaults for `user_id`.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            currency: "USD".to_string(),
            language: "default".to_string(),
            date_format: DateFormat::Default.as_str().to_string(),
            budget_warning_threshold: 80,
            force_sync_lookback_months: 0,
            disable_built_in_transaction_categories: false,
            enable_auto_categorizer: false,
            auto_categorizer_minimum_probability_percentage: 70,
        }
    }

    /// Parsed date format; unrecognized stored values read as the default.
    pub fn date_format(&self) -> DateFormat {
        self.date_format.parse().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::entity::{Entity, EntityType};

    #[test]
    fn test_transaction_text_columns() {
        let names: Vec<&str> = Transaction::entity_descriptor()
            .text_properties()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            vec!["SyncID", "Category", "Subcategory", "MerchantName", "Source"]
        );
    }

    #[test]
    fn test_account_schema_nullability() {
        let schema = Account::entity_descriptor().table_schema();
        let subtype = schema.schema().get_column("Subtype").unwrap();
        assert!(subtype.nullable);
        assert_eq!(subtype.data_type, DataType::Text);
        assert!(!schema.schema().get_column("Type").unwrap().nullable);
    }

    #[test]
    fn test_user_settings_defaults() {
        let settings = UserSettings::new(Uuid::new_v4());
        assert_eq!(settings.date_format(), DateFormat::Default);
        assert_eq!(settings.property("DateFormat").unwrap().as_str(), Some("default"));
    }

    #[test]
    fn test_constructors_assign_fresh_ids() {
        let user = Uuid::new_v4();
        let a = Institution::new("Bank", user);
        let b = Institution::new("Bank", user);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.name, b.name);
    }
}
