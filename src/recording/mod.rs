//! Export of batch analysis results.

pub mod csv_writer;

pub use csv_writer::{read_rows, write_rows, CsvWriter, ResultRow};
