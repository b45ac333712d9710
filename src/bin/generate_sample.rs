use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use solid_attenuator::{Axis, Filter, FilterGroup, Material, SystemSnapshot};

/// Silicon K edge [eV].
const SI_K_EDGE_EV: f64 = 1839.0;

/// Rough photoabsorption model: `mu` falls as E^-3 from its 8 keV value, on
/// top of a flat scattering floor.  Good enough to exercise the selector;
/// real installations load tabulated data instead.
fn model_mu(material: Material, energy_ev: f64) -> f64 {
    let (mu_8kev, floor) = match material {
        Material::C => (1.6e3, 50.0),
        Material::Si => (1.5e4, 35.0),
    };
    let photo = mu_8kev * (8000.0 / energy_ev).powi(3);
    let photo = if material == Material::Si && energy_ev < SI_K_EDGE_EV {
        photo / 10.0
    } else {
        photo
    };
    photo + floor
}

/// AT2L0-style layout: one blade per axis, diamond first.
fn sample_snapshot() -> SystemSnapshot {
    let diamond = [1280.0, 640.0, 320.0, 160.0, 80.0, 40.0, 20.0, 10.0];
    let silicon = [10240.0, 5120.0, 2560.0, 1280.0, 640.0, 320.0, 160.0, 80.0, 40.0, 20.0];

    let blades = diamond
        .iter()
        .map(|&t| (Material::C, t))
        .chain(silicon.iter().map(|&t| (Material::Si, t)));

    let axes = blades
        .enumerate()
        .map(|(i, (material, thickness))| {
            let id = i as u32 + 2;
            Axis {
                name: format!("FILTER:{id:02}"),
                chain: "AT2L0".to_string(),
                tier: material,
                filters: FilterGroup::new(vec![Filter::new(id, material, thickness)]),
            }
        })
        .collect();

    SystemSnapshot { axes }
}

fn main() -> Result<()> {
    env_logger::init();

    // Energies: 1000 → 30000 eV, step 10
    let energies: Vec<f64> = (0..=2900).map(|i| 1000.0 + i as f64 * 10.0).collect();

    let mut all_material: Vec<String> = Vec::new();
    let mut all_energy: Vec<f64> = Vec::new();
    let mut all_mu: Vec<f64> = Vec::new();

    for material in [Material::C, Material::Si] {
        for &energy in &energies {
            all_material.push(material.to_string());
            all_energy.push(energy);
            all_mu.push(model_mu(material, energy));
        }
    }
    let row_count = all_energy.len();

    let material_array = StringArray::from(
        all_material.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    );
    let energy_array = Float64Array::from(all_energy);
    let mu_array = Float64Array::from(all_mu);

    let schema = Arc::new(Schema::new(vec![
        Field::new("material", DataType::Utf8, false),
        Field::new("energy_ev", DataType::Float64, false),
        Field::new("mu", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(material_array),
            Arc::new(energy_array),
            Arc::new(mu_array),
        ],
    )
    .context("creating record batch")?;

    // Write Parquet
    let table_path = "absorption_table.parquet";
    let file = std::fs::File::create(table_path).context("creating table file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    // Write the matching snapshot
    let snapshot_path = "system.json";
    let file = std::fs::File::create(snapshot_path).context("creating snapshot file")?;
    serde_json::to_writer_pretty(file, &sample_snapshot()).context("writing snapshot")?;

    println!(
        "Wrote {row_count} absorption rows to {table_path} and {} axes to {snapshot_path}",
        sample_snapshot().axes.len()
    );
    Ok(())
}
