//! Cell buffers and output translation

pub mod buffer;
pub mod output;

pub use buffer::{diff_range, CellBuffer, CellRange};
pub use output::OutputTable;
