use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// Category totals in the order categories first appear in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub percentage: f64,
}

impl CategoryReport {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total for one category, if it appears in the ledger.
    pub fn get(&self, category: &str) -> Option<Cents> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.total)
    }
}
