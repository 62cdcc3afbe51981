use std::collections::HashMap;

use super::{Cents, ExpenseRecord};

/// Why an aggregate over the ledger could not be computed.
/// `index` is the 0-based position of the offending record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// The stored amount doesn't parse.
    MalformedAmount { index: usize, value: String },
    /// Adding this record's amount overflowed a running sum.
    Overflow { index: usize },
}

/// Sum of all amounts recorded under one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Cents,
    pub count: usize,
}

fn parsed_amounts(
    records: &[ExpenseRecord],
) -> impl Iterator<Item = Result<(usize, &ExpenseRecord, Cents), AggregateError>> {
    records.iter().enumerate().map(|(index, record)| {
        record
            .amount_cents()
            .map(|cents| (index, record, cents))
            .map_err(|_| AggregateError::MalformedAmount {
                index,
                value: record.amount.clone(),
            })
    })
}

/// Accumulate totals per category, in the order categories first appear.
/// Fails on the first amount that doesn't parse or doesn't fit.
pub fn totals_by_category(records: &[ExpenseRecord]) -> Result<Vec<CategoryTotal>, AggregateError> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for entry in parsed_amounts(records) {
        let (index, record, cents) = entry?;
        let slot = *positions.entry(record.category.as_str()).or_insert_with(|| {
            totals.push(CategoryTotal {
                category: record.category.clone(),
                total: 0,
                count: 0,
            });
            totals.len() - 1
        });
        let entry = &mut totals[slot];
        entry.total = entry
            .total
            .checked_add(cents)
            .ok_or(AggregateError::Overflow { index })?;
        entry.count += 1;
    }

    Ok(totals)
}

/// Sum of every amount in the ledger.
pub fn total_amount(records: &[ExpenseRecord]) -> Result<Cents, AggregateError> {
    parsed_amounts(records).try_fold(0 as Cents, |sum, entry| {
        let (index, _, cents) = entry?;
        sum.checked_add(cents)
            .ok_or(AggregateError::Overflow { index })
    })
}

/// The record with the highest amount, with its 0-based index.
/// Ties go to the record that appears first.
pub fn most_expensive(
    records: &[ExpenseRecord],
) -> Result<Option<(usize, &ExpenseRecord)>, AggregateError> {
    let mut best: Option<(usize, &ExpenseRecord, Cents)> = None;

    for entry in parsed_amounts(records) {
        let (index, record, cents) = entry?;
        match best {
            Some((_, _, top)) if cents <= top => {}
            _ => best = Some((index, record, cents)),
        }
    }

    Ok(best.map(|(index, record, _)| (index, record)))
}

/// Field equality used to select records for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordMatch {
    Date(String),
    Category { name: String, ignore_case: bool },
}

impl RecordMatch {
    pub fn date(date: impl Into<String>) -> Self {
        RecordMatch::Date(date.into())
    }

    pub fn category(name: impl Into<String>) -> Self {
        RecordMatch::Category {
            name: name.into(),
            ignore_case: false,
        }
    }

    pub fn category_ignore_case(name: impl Into<String>) -> Self {
        RecordMatch::Category {
            name: name.into(),
            ignore_case: true,
        }
    }

    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        match self {
            RecordMatch::Date(date) => record.date == *date,
            RecordMatch::Category { name, ignore_case } => {
                if *ignore_case {
                    record.category.to_lowercase() == name.to_lowercase()
                } else {
                    record.category == *name
                }
            }
        }
    }
}
