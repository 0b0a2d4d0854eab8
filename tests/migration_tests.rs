/// Migration tests
///
/// Covers the BudgetBoard migration list against the in-memory store,
/// including the DateFormat column added to existing settings rows.
/// Run with: cargo test --test migration_tests

use budgetboard_persist::migration::MIGRATIONS_HISTORY_TABLE;
use budgetboard_persist::model::{
    ADD_DATE_FORMAT, INITIAL_CREATE, UserSettings, budget_board_migrations, open_context,
};
use budgetboard_persist::settings::DateFormat;
use budgetboard_persist::{
    DataType, DbContext, DbError, InMemoryStorage, Migrator, SchemaMigration, StorageEngine,
    Value,
};
use std::sync::Arc;
use uuid::Uuid;

fn migrator() -> Migrator {
    Migrator::new(budget_board_migrations()).unwrap()
}

#[tokio::test]
async fn test_fresh_store_gets_every_migration() {
    let storage = InMemoryStorage::new();
    let applied = migrator().migrate(&storage).unwrap();

    assert_eq!(applied, vec![INITIAL_CREATE, ADD_DATE_FORMAT]);
    assert!(storage.table_exists(MIGRATIONS_HISTORY_TABLE));

    let schema = storage.schema("UserSettings").unwrap();
    let column = schema.schema().get_column("DateFormat").unwrap();
    assert_eq!(column.data_type, DataType::Text);
    assert!(!column.nullable);
    assert_eq!(column.default, Some(Value::Text("default".into())));
}

#[tokio::test]
async fn test_date_format_backfills_existing_rows() {
    let storage: Arc<dyn StorageEngine> = Arc::new(InMemoryStorage::new());
    let migrator = migrator();

    migrator.migrate(storage.as_ref()).unwrap();
    migrator.rollback_last(storage.as_ref()).unwrap();
    assert!(
        storage
            .schema("UserSettings")
            .unwrap()
            .schema()
            .get_column("DateFormat")
            .is_none()
    );

    // A row written before the column existed.
    let user_id = Uuid::new_v4();
    let key = Uuid::new_v4();
    storage
        .apply(&[budgetboard_persist::transaction::Change::InsertRow {
            table: "UserSettings".into(),
            key,
            values: vec![
                ("UserID".into(), Value::Uuid(user_id)),
                ("Currency".into(), Value::from("EUR")),
                ("Language".into(), Value::from("de")),
                ("BudgetWarningThreshold".into(), Value::Integer(80)),
                ("ForceSyncLookbackMonths".into(), Value::Integer(0)),
                ("DisableBuiltInTransactionCategories".into(), Value::Boolean(false)),
                ("EnableAutoCategorizer".into(), Value::Boolean(false)),
                (
                    "AutoCategorizerMinimumProbabilityPercentage".into(),
                    Value::Integer(70),
                ),
            ],
        }])
        .unwrap();

    assert_eq!(migrator.migrate(storage.as_ref()).unwrap(), vec![ADD_DATE_FORMAT]);

    let mut ctx = DbContext::with_storage(storage.clone());
    let settings: UserSettings = ctx.find(key).unwrap().unwrap();
    assert_eq!(settings.date_format, "default");
    assert_eq!(settings.date_format(), DateFormat::Default);
    assert_eq!(settings.currency, "EUR");
}

#[tokio::test]
async fn test_settings_round_trip_after_migration() {
    let storage: Arc<dyn StorageEngine> = Arc::new(InMemoryStorage::new());
    let mut ctx = open_context(storage.clone()).unwrap();

    let mut settings = UserSettings::new(Uuid::new_v4());
    settings.date_format = DateFormat::YearMonthDay.as_str().to_string();
    let key = ctx.add(settings).unwrap();
    ctx.save_changes_async().await.unwrap();

    let mut fresh = DbContext::with_storage(storage);
    let loaded: UserSettings = fresh.find(key).unwrap().unwrap();
    assert_eq!(loaded.date_format(), DateFormat::YearMonthDay);
}

#[tokio::test]
async fn test_rollback_everything_leaves_only_history() {
    let storage = InMemoryStorage::new();
    let migrator = migrator();
    migrator.migrate(&storage).unwrap();

    assert_eq!(
        migrator.rollback_last(&storage).unwrap().as_deref(),
        Some(ADD_DATE_FORMAT)
    );
    assert_eq!(
        migrator.rollback_last(&storage).unwrap().as_deref(),
        Some(INITIAL_CREATE)
    );
    assert_eq!(storage.list_tables(), vec![MIGRATIONS_HISTORY_TABLE.to_string()]);
    assert_eq!(migrator.pending(&storage).unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_migration_reports_its_id() {
    let storage = InMemoryStorage::new();
    let broken = Migrator::new(vec![SchemaMigration::new("0001_DropMissing").up(
        budgetboard_persist::SchemaOperation::DropTable("Nope".into()),
    )])
    .unwrap();

    match broken.migrate(&storage) {
        Err(DbError::MigrationError(msg)) => assert!(msg.contains("0001_DropMissing")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(broken.applied(&storage).unwrap().is_empty());
}
