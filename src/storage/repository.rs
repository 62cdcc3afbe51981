use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::domain::ExpenseRecord;

use super::{Backend, BackendLock, HEADER};

/// Repository for persisting expense records as CSV in a [`Backend`].
pub struct Repository<B: Backend> {
    backend: B,
}

impl<B: Backend> Repository<B> {
    /// Create a new repository over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Human-readable location of the ledger.
    pub fn location(&self) -> String {
        self.backend.describe()
    }

    /// Take the backend's exclusive lock for a read-modify-write cycle.
    pub fn lock(&self) -> Result<BackendLock> {
        self.backend
            .lock()
            .with_context(|| format!("Failed to lock ledger {}", self.location()))
    }

    /// Write the header if nothing is stored yet (or the store is empty).
    /// Returns true when the header was written.
    pub fn init(&mut self) -> Result<bool> {
        let _guard = self.lock()?;
        match self.read_raw()? {
            Some(bytes) if !bytes.is_empty() => {
                debug!(ledger = %self.location(), "ledger already initialized");
                Ok(false)
            }
            _ => {
                let bytes = encode(&[], true)?;
                self.backend
                    .replace(&bytes)
                    .with_context(|| format!("Failed to initialize ledger {}", self.location()))?;
                info!(ledger = %self.location(), "initialized ledger");
                Ok(true)
            }
        }
    }

    /// Load every record after the header, in file order.
    /// Returns `None` if the ledger doesn't exist.
    pub fn load(&self) -> Result<Option<Vec<ExpenseRecord>>> {
        let Some(bytes) = self.read_raw()? else {
            debug!(ledger = %self.location(), "ledger missing");
            return Ok(None);
        };
        let records = decode(&bytes)
            .with_context(|| format!("Failed to read ledger {}", self.location()))?;
        debug!(ledger = %self.location(), count = records.len(), "loaded records");
        Ok(Some(records))
    }

    /// Append one record at the end of the ledger.
    /// A missing or empty ledger gets its header first.
    pub fn append(&mut self, record: &ExpenseRecord) -> Result<()> {
        let _guard = self.lock()?;
        let existing = self.read_raw()?;

        match existing {
            Some(bytes) if !bytes.is_empty() => {
                let mut row = Vec::new();
                // Hand-edited files sometimes lose their trailing newline.
                if !bytes.ends_with(b"\n") {
                    row.push(b'\n');
                }
                row.extend(encode(std::slice::from_ref(record), false)?);
                self.backend
                    .append(&row)
                    .with_context(|| format!("Failed to append to ledger {}", self.location()))?;
            }
            _ => {
                let bytes = encode(std::slice::from_ref(record), true)?;
                self.backend
                    .replace(&bytes)
                    .with_context(|| format!("Failed to write ledger {}", self.location()))?;
            }
        }

        info!(
            ledger = %self.location(),
            date = %record.date,
            category = %record.category,
            amount = %record.amount,
            "appended record"
        );
        Ok(())
    }

    /// Rewrite the ledger with the header followed by `records`.
    /// The caller is expected to hold the lock.
    pub fn replace_all(&mut self, records: &[ExpenseRecord]) -> Result<()> {
        let bytes = encode(records, true)?;
        self.backend
            .replace(&bytes)
            .with_context(|| format!("Failed to rewrite ledger {}", self.location()))?;
        info!(ledger = %self.location(), count = records.len(), "rewrote ledger");
        Ok(())
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        self.backend
            .read()
            .with_context(|| format!("Failed to read ledger {}", self.location()))
    }
}

/// Serialize records as CSV, optionally preceded by the header row.
fn encode(records: &[ExpenseRecord], with_header: bool) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(HEADER)?;
    }
    for record in records {
        writer.write_record([&record.date, &record.category, &record.amount])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

/// Parse ledger bytes. The first row is the header and is skipped.
fn decode(bytes: &[u8]) -> Result<Vec<ExpenseRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header = reader.headers().context("Failed to read header row")?.clone();
    if !header.is_empty() && header.iter().map(str::trim).ne(HEADER) {
        warn!(header = ?header, "unexpected ledger header");
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.context("CSV parse error")?;
        records.push(row_to_record(&row)?);
    }
    Ok(records)
}

fn row_to_record(row: &StringRecord) -> Result<ExpenseRecord> {
    if row.len() != 3 {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        bail!(
            "Line {} has {} fields, expected 3 (date, category, amount)",
            line,
            row.len()
        );
    }
    Ok(ExpenseRecord::new(&row[0], &row[1], &row[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn repo_with(content: &str) -> Repository<MemoryBackend> {
        Repository::new(MemoryBackend::with_content(content))
    }

    #[test]
    fn test_init_writes_header_once() {
        let mut repo = Repository::new(MemoryBackend::new());
        assert!(repo.init().unwrap());
        assert!(!repo.init().unwrap());
        assert_eq!(repo.backend().content(), Some(&b"Date,Category,Amount\n"[..]));
    }

    #[test]
    fn test_init_fills_empty_file() {
        let mut repo = repo_with("");
        assert!(repo.init().unwrap());
        assert_eq!(repo.load().unwrap(), Some(vec![]));
    }

    #[test]
    fn test_load_missing_is_none() {
        let repo = Repository::new(MemoryBackend::new());
        assert_eq!(repo.load().unwrap(), None);
    }

    #[test]
    fn test_append_to_missing_ledger_writes_header() {
        let mut repo = Repository::new(MemoryBackend::new());
        repo.append(&ExpenseRecord::new("2024-01-01", "Food", "10.00"))
            .unwrap();
        assert_eq!(
            repo.backend().content(),
            Some(&b"Date,Category,Amount\n2024-01-01,Food,10.00\n"[..])
        );
    }

    #[test]
    fn test_append_repairs_missing_newline() {
        let mut repo = repo_with("Date,Category,Amount\r\n2024-01-01,Food,10");
        repo.append(&ExpenseRecord::new("2024-01-02", "Rent", "500"))
            .unwrap();
        let records = repo.load().unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], ExpenseRecord::new("2024-01-02", "Rent", "500"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut repo = Repository::new(MemoryBackend::new());
        let record = ExpenseRecord::new("2024-01-01", "Food, drinks", "4.50");
        repo.append(&record).unwrap();

        let raw = String::from_utf8(repo.backend().content().unwrap().to_vec()).unwrap();
        assert!(raw.contains("\"Food, drinks\""));
        assert_eq!(repo.load().unwrap(), Some(vec![record]));
    }

    #[test]
    fn test_short_row_is_an_error() {
        let repo = repo_with("Date,Category,Amount\n2024-01-01,Food\n");
        let err = repo.load().unwrap_err();
        assert!(format!("{:#}", err).contains("Line 2 has 2 fields"));
    }

    #[test]
    fn test_replace_all_keeps_header() {
        let mut repo = repo_with("Date,Category,Amount\n2024-01-01,Food,1\n");
        repo.replace_all(&[]).unwrap();
        assert_eq!(repo.backend().content(), Some(&b"Date,Category,Amount\n"[..]));
    }
}
