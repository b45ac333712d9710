use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{validate_energy, Filter, Material};
use crate::error::{CalcError, Result};

/// Filter thicknesses are given in micrometres, `mu` in 1/m.
const UM_TO_M: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Raw table rows
// ---------------------------------------------------------------------------

/// One tabulated point: linear attenuation coefficient `mu` [1/m] (mass
/// attenuation already scaled by density) of `material` at `energy_ev`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionRow {
    pub material: Material,
    pub energy_ev: f64,
    pub mu: f64,
}

#[derive(Debug, Clone)]
struct MaterialTable {
    /// Strictly increasing.
    energies: Vec<f64>,
    mu: Vec<f64>,
}

impl MaterialTable {
    fn domain(&self) -> (f64, f64) {
        (self.energies[0], self.energies[self.energies.len() - 1])
    }

    /// Linear interpolation between the bracketing points.  The caller has
    /// already checked that `energy` lies inside the domain.
    fn interpolate(&self, energy: f64) -> f64 {
        let hi = self.energies.partition_point(|&e| e < energy);
        if self.energies[hi] == energy {
            return self.mu[hi];
        }
        let lo = hi - 1;
        let (e0, e1) = (self.energies[lo], self.energies[hi]);
        let frac = (energy - e0) / (e1 - e0);
        self.mu[lo] + frac * (self.mu[hi] - self.mu[lo])
    }
}

// ---------------------------------------------------------------------------
// AbsorptionTable
// ---------------------------------------------------------------------------

/// Read-only absorption data for every material, built once at startup and
/// shared by reference with the selectors.
#[derive(Debug, Clone, Default)]
pub struct AbsorptionTable {
    materials: BTreeMap<Material, MaterialTable>,
}

impl AbsorptionTable {
    /// Build the table from unordered rows.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = AbsorptionRow>,
    {
        let mut by_material: BTreeMap<Material, Vec<(f64, f64)>> = BTreeMap::new();
        for row in rows {
            if !row.energy_ev.is_finite() || row.energy_ev <= 0.0 {
                return Err(CalcError::InvalidTable(format!(
                    "{}: energy {} eV must be positive",
                    row.material, row.energy_ev
                )));
            }
            if !row.mu.is_finite() || row.mu < 0.0 {
                return Err(CalcError::InvalidTable(format!(
                    "{} at {} eV: attenuation {} must be finite and non-negative",
                    row.material, row.energy_ev, row.mu
                )));
            }
            by_material
                .entry(row.material)
                .or_default()
                .push((row.energy_ev, row.mu));
        }

        let mut materials = BTreeMap::new();
        for (material, mut points) in by_material {
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            if let Some(w) = points.windows(2).find(|w| w[0].0 == w[1].0) {
                return Err(CalcError::InvalidTable(format!(
                    "{material}: duplicate energy {} eV",
                    w[0].0
                )));
            }
            let (energies, mu) = points.into_iter().unzip();
            materials.insert(material, MaterialTable { energies, mu });
        }
        log::debug!("Absorption table built for {} material(s)", materials.len());
        Ok(AbsorptionTable { materials })
    }

    /// Materials with tabulated data.
    pub fn materials(&self) -> impl Iterator<Item = Material> + '_ {
        self.materials.keys().copied()
    }

    fn material(&self, material: Material) -> Result<&MaterialTable> {
        self.materials
            .get(&material)
            .ok_or(CalcError::NoAbsorptionData(material))
    }

    /// Lowest and highest tabulated energy [eV] for `material`.
    pub fn domain(&self, material: Material) -> Result<(f64, f64)> {
        Ok(self.material(material)?.domain())
    }

    /// Linear attenuation coefficient `mu` [1/m] at `energy_ev`.
    pub fn attenuation(&self, material: Material, energy_ev: f64) -> Result<f64> {
        validate_energy(energy_ev)?;
        let table = self.material(material)?;
        let (min_ev, max_ev) = table.domain();
        if energy_ev < min_ev || energy_ev > max_ev {
            return Err(CalcError::OutOfRange {
                material,
                energy_ev,
                min_ev,
                max_ev,
            });
        }
        Ok(table.interpolate(energy_ev))
    }

    /// Beer-Lambert transmission of `thickness_um` of `material`.
    pub fn transmission(&self, material: Material, thickness_um: f64, energy_ev: f64) -> Result<f64> {
        let mu = self.attenuation(material, energy_ev)?;
        Ok((-mu * thickness_um * UM_TO_M).exp())
    }

    /// Transmission of a single filter when inserted.
    pub fn filter_transmission(&self, filter: &Filter, energy_ev: f64) -> Result<f64> {
        self.transmission(filter.material, filter.thickness_um, energy_ev)
    }

    /// Closest tabulated energy and its index, clamped to the table ends.
    pub fn closest_energy(&self, material: Material, energy_ev: f64) -> Result<(f64, usize)> {
        validate_energy(energy_ev)?;
        let energies = &self.material(material)?.energies;
        let hi = energies.partition_point(|&e| e < energy_ev);
        let idx = if hi == 0 {
            0
        } else if hi == energies.len() {
            energies.len() - 1
        } else if energy_ev - energies[hi - 1] <= energies[hi] - energy_ev {
            hi - 1
        } else {
            hi
        };
        Ok((energies[idx], idx))
    }
}
