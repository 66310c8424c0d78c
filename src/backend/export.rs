use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::analysis::AggregationResult;

/// Writes `category,count` rows followed by a `total` row.
pub fn write_csv<W: Write>(writer: W, result: &AggregationResult) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["category", "count"])?;
    for group in &result.groups {
        let count = group.count.to_string();
        wtr.write_record([group.category.as_str(), count.as_str()])?;
    }
    let total = result.total.to_string();
    wtr.write_record(["total", total.as_str()])?;
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(writer: W, result: &AggregationResult) -> Result<()> {
    serde_json::to_writer_pretty(writer, result).context("Failed to serialize aggregation")?;
    Ok(())
}

/// Exports to `path`, choosing JSON for a `.json` extension and CSV otherwise.
pub fn export_aggregation(path: &Path, result: &AggregationResult) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    if is_json_path(path) {
        write_json(&mut writer, result)?;
    } else {
        write_csv(&mut writer, result)?;
    }
    writer.flush().context("Failed to write export")?;
    Ok(())
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
