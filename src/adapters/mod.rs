// Adapters layer: concrete implementations of the domain ports.

pub mod barcode;
pub mod sqlite;

pub use barcode::Code128Barcodes;
pub use sqlite::SqliteStore;
