use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::data::absorption::AbsorptionTable;
use crate::data::model::{FilterId, Material, SystemSnapshot};
use crate::error::Result;
use crate::system::{ChainOutcome, SystemConfiguration};

const WIDTH: usize = 80;

// ---------------------------------------------------------------------------
// Report: what gets printed / written after a calculation
// ---------------------------------------------------------------------------

/// Everything the outer layer publishes for one calculation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub energy_ev: f64,
    /// Closest tabulated energy per material, as read back from the table.
    pub tabulated_energy_ev: BTreeMap<Material, f64>,
    pub desired_transmission: f64,
    pub chains: BTreeMap<String, ChainOutcome>,
    /// Transmission of the chosen configuration at 3 × energy, when the
    /// absorption table reaches that far.
    pub third_harmonic: Option<BTreeMap<String, f64>>,
    /// Filters in snapshot order with their chosen state.
    pub filters: Vec<(FilterId, bool)>,
    /// `filters` packed into an integer, first filter most significant.
    pub bitmask: u64,
}

impl Report {
    pub fn new(
        snapshot: &SystemSnapshot,
        outcome: &SystemConfiguration,
        table: &AbsorptionTable,
        third_harmonic: Option<BTreeMap<String, f64>>,
    ) -> Result<Self> {
        let energy_ev = outcome.request.energy_ev;
        let tabulated_energy_ev: BTreeMap<Material, f64> = table
            .materials()
            .map(|material| -> Result<(Material, f64)> {
                Ok((material, table.closest_energy(material, energy_ev)?.0))
            })
            .collect::<Result<_>>()?;

        let order = snapshot.filter_order();
        let filters = order
            .iter()
            .map(|id| (*id, outcome.configuration.is_inserted(*id).unwrap_or(false)))
            .collect();

        Ok(Report {
            energy_ev,
            tabulated_energy_ev,
            desired_transmission: outcome.request.target,
            chains: outcome.chains.clone(),
            third_harmonic,
            filters,
            bitmask: outcome.configuration.bitmask(&order),
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        writeln!(
            f,
            "Desired transmission {:.3e} at {:.1} eV",
            self.desired_transmission, self.energy_ev
        )?;
        for (material, tabulated) in &self.tabulated_energy_ev {
            writeln!(f, "    closest tabulated energy ({material}) {tabulated:.1} eV")?;
        }
        for (chain, outcome) in &self.chains {
            writeln!(
                f,
                "{chain}: calculated transmission value {:.4e} (error {:+.3e})",
                outcome.transmission, outcome.error
            )?;
            for tier in &outcome.tiers {
                writeln!(
                    f,
                    "    {:<3} target {:.4e} -> {:.4e}{}",
                    tier.material.to_string(),
                    tier.target,
                    tier.transmission,
                    if tier.saturated { "  (all in)" } else { "" }
                )?;
            }
            match self.third_harmonic.as_ref().and_then(|t| t.get(chain)) {
                Some(t3) => writeln!(f, "    3omega transmission {t3:.4e}")?,
                None => writeln!(f, "    3omega transmission n/a")?,
            }
        }
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        let states: Vec<&str> = self
            .filters
            .iter()
            .map(|(_, inserted)| if *inserted { "1" } else { "0" })
            .collect();
        writeln!(f, "Filters  {}", states.join(" "))?;
        writeln!(f, "Bitmask  {}", self.bitmask)?;
        write!(f, "{}", "=".repeat(WIDTH))
    }
}
