mod common;

use anyhow::Result;
use common::{SampleExpenses, ledger_path, read_ledger, test_store};
use spendlog::LedgerStore;
use spendlog::application::AppError;
use spendlog::domain::ExpenseRecord;
use tempfile::TempDir;

#[test]
fn test_init_creates_header_only() -> Result<()> {
    let (_store, temp) = test_store()?;
    assert_eq!(read_ledger(&temp), "Date,Category,Amount\n");
    Ok(())
}

#[test]
fn test_init_is_idempotent() -> Result<()> {
    let (mut store, temp) = test_store()?;
    SampleExpenses::load(&mut store)?;
    let before = read_ledger(&temp);

    assert!(!store.initialize()?);
    let reopened = LedgerStore::init(ledger_path(&temp))?;

    assert_eq!(read_ledger(&temp), before);
    assert_eq!(reopened.list()?, SampleExpenses::records());
    assert_eq!(before.matches("Date,Category,Amount").count(), 1);
    Ok(())
}

#[test]
fn test_append_then_list_round_trip() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    SampleExpenses::load(&mut store)?;
    let before = store.list()?;

    let record = ExpenseRecord::new("2024-02-01", "Books, magazines", "12.99");
    store.append(&record)?;

    let mut expected = before;
    expected.push(record);
    assert_eq!(store.list()?, expected);
    Ok(())
}

#[test]
fn test_duplicates_are_allowed() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    let record = ExpenseRecord::new("2024-01-01", "Food", "10.00");
    store.append(&record)?;
    store.append(&record)?;
    assert_eq!(store.list()?, vec![record.clone(), record]);
    Ok(())
}

#[test]
fn test_missing_file_is_reported_not_raised() -> Result<()> {
    let temp = TempDir::new()?;
    let store = LedgerStore::open(temp.path().join("nope.csv"));

    assert!(matches!(store.list(), Err(AppError::MissingStore(_))));
    assert!(matches!(
        store.totals_by_category(),
        Err(AppError::MissingStore(_))
    ));
    assert!(!temp.path().join("nope.csv").exists());
    Ok(())
}

#[test]
fn test_delete_by_category_on_file() -> Result<()> {
    let (mut store, temp) = test_store()?;
    SampleExpenses::load(&mut store)?;

    let before = store.list()?.len();
    let deleted = store.delete_by_category("Food", false)?;
    let after = store.list()?.len();

    assert_eq!(deleted, 2);
    assert_eq!(deleted, before - after);
    assert_eq!(
        read_ledger(&temp),
        "Date,Category,Amount\n2024-01-02,Transport,25.50\n"
    );
    Ok(())
}

#[test]
fn test_delete_where_custom_predicate() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    SampleExpenses::load(&mut store)?;

    let deleted = store.delete_where(|r| r.date.as_str() >= "2024-01-02")?;
    assert_eq!(deleted, 2);
    assert_eq!(
        store.list()?,
        vec![ExpenseRecord::new("2024-01-01", "Food", "10.00")]
    );
    Ok(())
}

#[test]
fn test_delete_everything_keeps_header() -> Result<()> {
    let (mut store, temp) = test_store()?;
    SampleExpenses::load(&mut store)?;

    assert_eq!(store.delete_where(|_| true)?, 3);
    assert!(store.list()?.is_empty());
    assert_eq!(read_ledger(&temp), "Date,Category,Amount\n");
    Ok(())
}

#[test]
fn test_delete_at_position() -> Result<()> {
    let (mut store, _temp) = test_store()?;
    SampleExpenses::load(&mut store)?;

    let removed = store.delete_at(1)?;
    assert_eq!(removed, ExpenseRecord::new("2024-01-01", "Food", "10.00"));

    match store.delete_at(3) {
        Err(AppError::SelectionOutOfRange { position, len }) => {
            assert_eq!(position, 3);
            assert_eq!(len, 2);
        }
        other => panic!("expected SelectionOutOfRange, got {:?}", other),
    }
    assert_eq!(store.list()?.len(), 2);
    Ok(())
}

#[test]
fn test_reads_files_written_by_other_tools() -> Result<()> {
    let temp = TempDir::new()?;
    let path = ledger_path(&temp);
    std::fs::write(
        &path,
        "Date,Category,Amount\r\n2024-03-01,Food,12.5\r\n2024-03-02,\"Gifts, cards\",40.0\r\n",
    )?;

    let mut store = LedgerStore::open(&path);
    let records = store.list()?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].category, "Gifts, cards");

    let report = store.totals_by_category()?;
    assert_eq!(report.get("Gifts, cards"), Some(4000));

    store.add_expense("2024-03-03", "Food", "2")?;
    assert_eq!(store.list()?.len(), 3);
    Ok(())
}

#[test]
fn test_validated_add_rejects_bad_input() -> Result<()> {
    let (mut store, temp) = test_store()?;

    assert!(matches!(
        store.add_expense("2024-02-30", "Food", "10"),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        store.add_expense("2024-02-29", "Food", "-10"),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        store.add_expense("2024-02-29", "Food", "abc"),
        Err(AppError::InvalidInput(_))
    ));
    assert_eq!(read_ledger(&temp), "Date,Category,Amount\n");

    store.add_expense("2024-02-29", "Food", "10")?;
    assert_eq!(
        read_ledger(&temp),
        "Date,Category,Amount\n2024-02-29,Food,10.00\n"
    );
    Ok(())
}

#[test]
fn test_independent_stores_do_not_interfere() -> Result<()> {
    let (mut first, _a) = test_store()?;
    let (second, _b) = test_store()?;

    SampleExpenses::load(&mut first)?;
    assert_eq!(first.list()?.len(), 3);
    assert!(second.list()?.is_empty());
    Ok(())
}
