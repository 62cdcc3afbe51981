use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, ParseCentsError, format_cents, parse_cents};

/// Date format used in the ledger file and accepted on input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Category written when the user leaves it blank.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// One row of the ledger file.
///
/// Fields are kept as the text found in the file. Rows written by hand (or by
/// older tools) may carry amounts that don't parse; those are only rejected
/// when an operation actually needs the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: String,
    pub category: String,
    pub amount: String,
}

impl ExpenseRecord {
    pub fn new(
        date: impl Into<String>,
        category: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            category: category.into(),
            amount: amount.into(),
        }
    }

    /// Build a record from already-validated parts, writing the amount in
    /// canonical two-decimal form.
    pub fn from_parts(date: NaiveDate, category: impl Into<String>, amount: Cents) -> Self {
        Self::new(
            date.format(DATE_FORMAT).to_string(),
            category,
            format_cents(amount),
        )
    }

    /// Parse the stored amount.
    pub fn amount_cents(&self) -> Result<Cents, ParseCentsError> {
        parse_cents(&self.amount)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid amount '{0}'. Use '50.00' or '50'")]
    InvalidAmount(String),

    #[error("Amount must be positive, got '{0}'")]
    NonPositiveAmount(String),
}

/// Check that `input` is a real calendar date in YYYY-MM-DD form.
pub fn validate_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

/// Check that `input` is a number strictly greater than zero.
pub fn validate_amount(input: &str) -> Result<Cents, ValidationError> {
    let cents =
        parse_cents(input).map_err(|_| ValidationError::InvalidAmount(input.trim().to_string()))?;
    if cents <= 0 {
        return Err(ValidationError::NonPositiveAmount(input.trim().to_string()));
    }
    Ok(cents)
}

/// How category labels are written on add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryStyle {
    /// Store exactly what was typed (after trimming).
    #[default]
    Verbatim,
    /// First letter upper case, the rest lower case: "fOOD" -> "Food".
    Capitalize,
}

/// Trim a category label, substitute the default for blanks, and apply `style`.
pub fn normalize_category(input: &str, style: CategoryStyle) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }

    match style {
        CategoryStyle::Verbatim => trimmed.to_string(),
        CategoryStyle::Capitalize => {
            let mut chars = trimmed.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        }
    }
}
