mod backend;
mod repository;

pub use backend::*;
pub use repository::*;

/// Header row of the ledger file.
pub const HEADER: [&str; 3] = ["Date", "Category", "Amount"];
