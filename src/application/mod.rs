// Application layer: the ledger operations a client (CLI, tests, other tools)
// calls, with validation and error reporting on top of storage.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
