//! File outputs: write to a temp file beside the target, then rename over it.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use tempfile::NamedTempFile;

use crate::layer::Layer;

/// Write-then-rename wrapper for atomic outputs.
pub struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Start writing `target`. Without `force` an existing file is never replaced.
pub fn open_for_write(target: &Path, force: bool) -> Result<PendingWrite> {
    if target == Path::new("-") {
        bail!("stdout is not supported; provide a real file path.");
    }
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir_exists(parent)?;
    if !force && target.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", target.display());
    }
    let tmp = NamedTempFile::new_in(parent).context("create temp file")?;
    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.tmp.write(buf) }
    fn flush(&mut self) -> io::Result<()> { self.tmp.flush() }
}

impl PendingWrite {
    /// Flush, then move the temp file onto the target.
    pub fn finalize(mut self) -> Result<()> {
        self.tmp.flush()?;
        self.tmp.as_file().sync_all().ok(); // best-effort
        let target = self.target;
        self.tmp.persist(&target)
            .with_context(|| format!("rename to {}", target.display()))?;
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            let _ = File::open(dir).and_then(|f| f.sync_all());
        }
        Ok(())
    }
}

/// Atomically write `bytes` to `target`.
pub fn write_bytes(target: &Path, bytes: &[u8], force: bool) -> Result<()> {
    let mut pending = open_for_write(target, force)?;
    pending.write_all(bytes)?;
    pending.finalize()
}

/// Atomically write a DataFrame as comma-separated CSV with a header row.
pub fn write_csv(target: &Path, df: &mut DataFrame, force: bool) -> Result<()> {
    let mut pending = open_for_write(target, force)?;
    CsvWriter::new(&mut pending)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write csv {}", target.display()))?;
    pending.finalize()
}

/// Atomically write a layer as a GeoJSON FeatureCollection.
pub fn write_geojson(target: &Path, layer: &Layer, force: bool) -> Result<()> {
    write_bytes(target, &layer.to_geojson_bytes()?, force)
}

/// Read a GeoJSON file into a layer.
pub fn read_geojson(path: &Path) -> Result<Layer> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Layer::from_geojson_bytes(&bytes).with_context(|| format!("parse {}", path.display()))
}
