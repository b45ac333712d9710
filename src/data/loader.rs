use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::absorption::{AbsorptionRow, AbsorptionTable};
use super::model::{Material, SystemSnapshot};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an absorption table from a file.  Dispatch by extension.
///
/// Every format carries the same three columns:
/// * `material`  – chemical formula (`C`, `Si`)
/// * `energy_ev` – photon energy [eV]
/// * `mu`        – linear attenuation coefficient [1/m]
///
/// Supported formats:
/// * `.parquet` – one row per tabulated point (recommended)
/// * `.json`    – `[{ "material": "C", "energy_ev": 8000.0, "mu": 1.6e4 }, ...]`
/// * `.csv`     – header row `material,energy_ev,mu`
pub fn load_table(path: &Path) -> Result<AbsorptionTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!("Loaded {} absorption rows from {}", rows.len(), path.display());

    AbsorptionTable::from_rows(rows)
        .with_context(|| format!("building absorption table from {}", path.display()))
}

/// Load a system snapshot (axes and their filters) from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<SystemSnapshot> {
    let text = std::fs::read_to_string(path).context("reading snapshot file")?;
    let snapshot: SystemSnapshot = serde_json::from_str(&text).context("parsing snapshot JSON")?;
    log::info!(
        "Loaded {} axes from {}",
        snapshot.axes.len(),
        path.display()
    );
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// JSON / CSV loaders
// ---------------------------------------------------------------------------

/// Row as written by hand or by other tools: the material is free text so
/// that `si`, `Si` and `silicon` are all accepted.
#[derive(Debug, Deserialize)]
struct RawRow {
    material: String,
    energy_ev: f64,
    mu: f64,
}

impl RawRow {
    fn into_row(self, row_no: usize) -> Result<AbsorptionRow> {
        let material: Material = self
            .material
            .parse()
            .with_context(|| format!("Row {row_no}: bad material"))?;
        Ok(AbsorptionRow {
            material,
            energy_ev: self.energy_ev,
            mu: self.mu,
        })
    }
}

fn load_json(path: &Path) -> Result<Vec<AbsorptionRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<RawRow> = serde_json::from_str(&text).context("parsing JSON")?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| rec.into_row(i))
        .collect()
}

fn load_csv(path: &Path) -> Result<Vec<AbsorptionRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;

    reader
        .deserialize::<RawRow>()
        .enumerate()
        .map(|(row_no, result)| {
            result
                .with_context(|| format!("CSV row {row_no}"))?
                .into_row(row_no)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet absorption table.
///
/// Expected schema:
/// - `material`: Utf8 or LargeUtf8
/// - `energy_ev`: Float64 or Float32
/// - `mu`: Float64 or Float32
///
/// Other columns are ignored.
fn load_parquet(path: &Path) -> Result<Vec<AbsorptionRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| {
            schema
                .index_of(name)
                .map(|idx| batch.column(idx))
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let material_col = column("material")?;
        let energy_col = column("energy_ev")?;
        let mu_col = column("mu")?;

        for row in 0..batch.num_rows() {
            let material: Material = extract_string(material_col, row)
                .with_context(|| format!("Row {row}: failed to read 'material'"))?
                .parse()
                .with_context(|| format!("Row {row}: bad material"))?;
            let energy_ev = extract_f64(energy_col, row)
                .with_context(|| format!("Row {row}: failed to read 'energy_ev'"))?;
            let mu = extract_f64(mu_col, row)
                .with_context(|| format!("Row {row}: failed to read 'mu'"))?;

            rows.push(AbsorptionRow {
                material,
                energy_ev,
                mu,
            });
        }
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!("Expected Float64 or Float32 column, got {:?}", col.data_type())
    }
}
