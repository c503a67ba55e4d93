//! Storage layer for ledger persistence.

mod file;
mod memory;
mod traits;

pub use file::FileLedgerStore;
pub use memory::MemoryLedgerStore;
pub use traits::LedgerStore;
