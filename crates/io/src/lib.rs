//! `pogkit-io`: table and archive I/O for the offering-group tooling.
//!
//! Everything works on in-memory byte buffers; callers own file access.

pub mod archive;
pub mod error;
pub mod table;

pub use archive::{build_archive, list_json_under, read_archive, write_archive, Archive};
pub use error::LoadError;
pub use table::{load_table, CellValue, Table, TableFormat, TableRow};
