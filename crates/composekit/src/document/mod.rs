//! Reading and writing descriptor files.
//!
//! Output is canonical: services and networks sorted by name, fields in a
//! fixed order, two-space indentation, ports always quoted.

pub mod annotate;
pub mod parser;
pub mod writer;

pub use parser::{parse_file, parse_string};
pub use writer::{render, write_file, write_string};
