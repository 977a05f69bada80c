//! Writing fit outcomes to disk.

pub mod export;

pub use export::{write_export_json, FitExport};
