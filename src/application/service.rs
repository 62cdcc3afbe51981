use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{
    self, AggregateError, CategoryStyle, ExpenseRecord, RecordMatch, normalize_category,
    validate_amount, validate_date,
};
use crate::storage::{Backend, FileBackend, MemoryBackend, Repository};

use super::{AppError, CategoryReport, CategorySummary};

/// The expense ledger: every operation a client can run against one store.
///
/// Each call is a complete read (then write, for mutations) of the backing
/// store, so a `LedgerStore` holds no cached records between calls.
pub struct LedgerStore<B: Backend = FileBackend> {
    repo: Repository<B>,
    category_style: CategoryStyle,
}

impl LedgerStore<FileBackend> {
    /// Open the ledger file at `path` without touching it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(path))
    }

    /// Open the ledger file at `path`, creating it with a header if needed.
    pub fn init(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let mut store = Self::open(path);
        store.initialize()?;
        Ok(store)
    }
}

impl LedgerStore<MemoryBackend> {
    /// A ledger that lives only in memory. It starts missing, like an
    /// uninitialized file.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: Backend> LedgerStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            repo: Repository::new(backend),
            category_style: CategoryStyle::default(),
        }
    }

    /// Set how categories are written by [`LedgerStore::add_expense`].
    pub fn with_category_style(mut self, style: CategoryStyle) -> Self {
        self.category_style = style;
        self
    }

    pub fn backend(&self) -> &B {
        self.repo.backend()
    }

    pub fn location(&self) -> String {
        self.repo.location()
    }

    // ========================
    // Lifecycle
    // ========================

    /// Write the header row if the store doesn't exist yet.
    /// Safe to call on every startup; returns true if it created the store.
    pub fn initialize(&mut self) -> Result<bool, AppError> {
        Ok(self.repo.init()?)
    }

    // ========================
    // Writes
    // ========================

    /// Append a record as-is. No validation happens here.
    pub fn append(&mut self, record: &ExpenseRecord) -> Result<(), AppError> {
        Ok(self.repo.append(record)?)
    }

    /// Validate user input, then append it.
    ///
    /// The date must be a real YYYY-MM-DD date and the amount a positive
    /// number. A blank category becomes "Uncategorized". The stored amount is
    /// rewritten in two-decimal form.
    pub fn add_expense(
        &mut self,
        date: &str,
        category: &str,
        amount: &str,
    ) -> Result<ExpenseRecord, AppError> {
        let date = validate_date(date)?;
        let amount = validate_amount(amount)?;
        let category = normalize_category(category, self.category_style);

        let record = ExpenseRecord::from_parts(date, category, amount);
        self.append(&record)?;
        Ok(record)
    }

    /// Remove every record matching `predicate` and return how many went.
    /// Remaining records keep their order.
    pub fn delete_where<F>(&mut self, predicate: F) -> Result<usize, AppError>
    where
        F: Fn(&ExpenseRecord) -> bool,
    {
        let _guard = self.repo.lock()?;
        let records = self.load_existing()?;

        let (removed, kept): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| predicate(r));
        if removed.is_empty() {
            debug!(ledger = %self.location(), "no records matched");
            return Ok(0);
        }

        self.repo.replace_all(&kept)?;
        info!(
            ledger = %self.location(),
            removed = removed.len(),
            remaining = kept.len(),
            "deleted records"
        );
        Ok(removed.len())
    }

    /// Remove records matching a single-field condition.
    pub fn delete_matching(&mut self, condition: &RecordMatch) -> Result<usize, AppError> {
        self.delete_where(|r| condition.matches(r))
    }

    /// Remove every record dated `date` (exact text match).
    pub fn delete_by_date(&mut self, date: &str) -> Result<usize, AppError> {
        self.delete_matching(&RecordMatch::date(date))
    }

    /// Remove every record in `category`.
    pub fn delete_by_category(
        &mut self,
        category: &str,
        ignore_case: bool,
    ) -> Result<usize, AppError> {
        let condition = if ignore_case {
            RecordMatch::category_ignore_case(category)
        } else {
            RecordMatch::category(category)
        };
        self.delete_matching(&condition)
    }

    /// Remove the record at 1-based `position`, as numbered by [`LedgerStore::list`].
    pub fn delete_at(&mut self, position: usize) -> Result<ExpenseRecord, AppError> {
        let _guard = self.repo.lock()?;
        let mut records = self.load_existing()?;

        if position == 0 || position > records.len() {
            return Err(AppError::SelectionOutOfRange {
                position,
                len: records.len(),
            });
        }

        let removed = records.remove(position - 1);
        self.repo.replace_all(&records)?;
        info!(ledger = %self.location(), position, "deleted record");
        Ok(removed)
    }

    // ========================
    // Reads
    // ========================

    /// All records in file order. An existing but empty ledger gives an
    /// empty list; a missing one gives [`AppError::MissingStore`].
    pub fn list(&self) -> Result<Vec<ExpenseRecord>, AppError> {
        self.load_existing()
    }

    /// Sum of amounts per category, in first-seen order.
    pub fn totals_by_category(&self) -> Result<CategoryReport, AppError> {
        let records = self.load_existing()?;
        let totals = domain::totals_by_category(&records).map_err(aggregate_error)?;
        let total = domain::total_amount(&records).map_err(aggregate_error)?;

        let categories = totals
            .into_iter()
            .map(|t| CategorySummary {
                percentage: if total != 0 {
                    t.total as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                category: t.category,
                total: t.total,
                count: t.count,
            })
            .collect();

        Ok(CategoryReport { categories, total })
    }

    /// The record with the largest amount; the earliest one wins a tie.
    /// `None` when the ledger has no records.
    pub fn most_expensive(&self) -> Result<Option<ExpenseRecord>, AppError> {
        let records = self.load_existing()?;
        let top = domain::most_expensive(&records).map_err(aggregate_error)?;
        Ok(top.map(|(_, record)| record.clone()))
    }

    fn load_existing(&self) -> Result<Vec<ExpenseRecord>, AppError> {
        self.repo
            .load()?
            .ok_or_else(|| AppError::MissingStore(self.location()))
    }
}

fn aggregate_error(err: AggregateError) -> AppError {
    match err {
        AggregateError::MalformedAmount { index, value } => AppError::MalformedRecord {
            position: index + 1,
            value,
        },
        AggregateError::Overflow { index } => AppError::TotalOverflow {
            position: index + 1,
        },
    }
}
