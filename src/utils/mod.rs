//! File I/O and dataset generation glue.

pub mod csv_io;
pub mod dataset;
