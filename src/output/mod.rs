//! Output module for command results
//!
//! This module handles:
//! - Rendering captured records as JSON for stdout or a file
//! - Crawl and store statistics (see [`stats`])

pub mod stats;

pub use stats::{
    format_statistics, load_store_statistics, print_statistics, print_store_statistics, CrawlStatistics,
    TableStatistics,
};

use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Renders a value as pretty-printed JSON
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Prints a value as JSON to stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

/// Writes a value as JSON to `path`, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_json(value)?)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}
