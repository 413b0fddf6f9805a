pub mod csv;
pub mod database;
pub mod store;
pub mod table;

pub use csv::CsvFormat;
pub use database::{is_valid_name, validate_name, Database};
pub use store::TableStore;
pub use table::{Header, Record, Row, Table};
