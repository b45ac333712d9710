//! Shared fixtures for unit tests.

use crate::data::absorption::{AbsorptionRow, AbsorptionTable};
use crate::data::model::{Filter, FilterGroup, Material};

/// Table with energy-independent `mu` [1/m] for both materials over
/// 1000..=30000 eV.
pub fn flat_table(mu_c: f64, mu_si: f64) -> AbsorptionTable {
    let rows = [1000.0, 30000.0].into_iter().flat_map(|energy_ev| {
        [
            AbsorptionRow {
                material: Material::C,
                energy_ev,
                mu: mu_c,
            },
            AbsorptionRow {
                material: Material::Si,
                energy_ev,
                mu: mu_si,
            },
        ]
    });
    AbsorptionTable::from_rows(rows).unwrap()
}

/// With `mu` = 1e6 /m a filter of `t` micrometres transmits `exp(-t)`, so the
/// thickness for a wanted transmission `x` is `-ln(x)`.
pub const UNIT_MU: f64 = 1e6;

pub fn thickness_for(transmission: f64) -> f64 {
    -transmission.ln()
}

/// Free filters of one material with the given single-filter transmissions
/// (under [`UNIT_MU`]), ids counting up from `first_id`.
pub fn group_of(material: Material, first_id: u32, transmissions: &[f64]) -> FilterGroup {
    FilterGroup::new(
        transmissions
            .iter()
            .enumerate()
            .map(|(i, &t)| Filter::new(first_id + i as u32, material, thickness_for(t)))
            .collect(),
    )
}
