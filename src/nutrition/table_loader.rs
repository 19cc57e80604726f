use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{info, warn};

use super::manual_table::ManualNutritionRow;

// Expected column headers, per 100 g
const NAME_COL: &str = "name";
const KCAL_COL: &str = "calories";
const PROTEIN_COL: &str = "protein";
const FAT_COL: &str = "fat";
const CARBS_COL: &str = "carbs";

fn parse_optional_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found", name))
}

/// Loads extra manual-table rows from a CSV with `name,calories,protein,fat,carbs`
/// headers (any order, case-insensitive). Rows without a name are skipped; a
/// missing or invalid macro counts as zero; rows whose calories are unreadable
/// are skipped.
pub fn load_manual_table(csv_path: &Path) -> Result<Vec<ManualNutritionRow>> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Nutrition CSV file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open nutrition CSV file at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    let name_idx = column(&headers, NAME_COL)?;
    let kcal_idx = column(&headers, KCAL_COL)?;
    let protein_idx = column(&headers, PROTEIN_COL)?;
    let fat_idx = column(&headers, FAT_COL)?;
    let carbs_idx = column(&headers, CARBS_COL)?;

    let mut rows = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let name = record.get(name_idx).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let Some(calories) = record.get(kcal_idx).and_then(parse_optional_f64) else {
            warn!(row = row_index + 1, name, "skipping nutrition row without calories");
            continue;
        };
        let macro_value = |idx: usize| record.get(idx).and_then(parse_optional_f64).unwrap_or(0.0);

        rows.push(ManualNutritionRow::new(
            name,
            calories,
            macro_value(protein_idx),
            macro_value(fat_idx),
            macro_value(carbs_idx),
        ));
    }

    if rows.is_empty() {
        return Err(anyhow::anyhow!("No valid nutrition rows loaded from {:?}", csv_path));
    }

    info!(path = %csv_path.display(), rows = rows.len(), "loaded manual nutrition rows");
    Ok(rows)
}
