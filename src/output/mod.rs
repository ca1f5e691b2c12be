//! Output generation for crawl results
//!
//! Records are written as comma-separated UTF-8 text with one header row.

mod csv_output;

pub use csv_output::{write_csv, write_csv_file};
