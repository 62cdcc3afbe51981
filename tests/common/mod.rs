// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use spendlog::LedgerStore;
use spendlog::domain::ExpenseRecord;
use tempfile::TempDir;

/// Helper to create an initialized ledger file in a temporary directory
pub fn test_store() -> Result<(LedgerStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = LedgerStore::init(ledger_path(&temp_dir))?;
    Ok((store, temp_dir))
}

/// Path of the ledger file inside a test directory
pub fn ledger_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("expenses.csv")
}

/// Raw file content, for checks on the on-disk format
pub fn read_ledger(temp_dir: &TempDir) -> String {
    std::fs::read_to_string(ledger_path(temp_dir)).unwrap()
}

/// Test fixture: the three-row ledger used throughout the docs
pub struct SampleExpenses;

impl SampleExpenses {
    pub fn records() -> Vec<ExpenseRecord> {
        vec![
            ExpenseRecord::new("2024-01-01", "Food", "10.00"),
            ExpenseRecord::new("2024-01-02", "Transport", "25.50"),
            ExpenseRecord::new("2024-01-03", "Food", "5.00"),
        ]
    }

    pub fn load(store: &mut LedgerStore) -> Result<()> {
        for record in Self::records() {
            store.append(&record)?;
        }
        Ok(())
    }
}
