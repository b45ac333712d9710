use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::data::absorption::AbsorptionTable;
use crate::data::model::{
    validate_energy, Axis, Configuration, DesiredTransmission, FilterGroup, Material,
};
use crate::error::{CalcError, Result};
use crate::select::{BaseSelector, MaterialPrioritySelector, PrioritySelection};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One tier of a chain, labelled with its material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierOutcome {
    pub material: Material,
    pub target: f64,
    pub transmission: f64,
    pub saturated: bool,
}

/// Result for one attenuator chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub transmission: f64,
    /// Achieved minus desired transmission.
    pub error: f64,
    pub tiers: Vec<TierOutcome>,
}

/// System-wide answer handed back to the device layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfiguration {
    pub request: DesiredTransmission,
    pub configuration: Configuration,
    pub chains: BTreeMap<String, ChainOutcome>,
}

/// Tier groups of one chain, in priority order.
type ChainPlan = Vec<(Material, FilterGroup)>;

// ---------------------------------------------------------------------------
// SystemConfigurator
// ---------------------------------------------------------------------------

/// Entry point: turns a snapshot of tagged axes and a request into a
/// per-filter configuration for the whole installation.
#[derive(Debug, Clone)]
pub struct SystemConfigurator {
    settings: Settings,
    selector: MaterialPrioritySelector,
}

impl Default for SystemConfigurator {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SystemConfigurator {
    pub fn new(settings: Settings) -> Self {
        let selector = MaterialPrioritySelector::new(BaseSelector::from_settings(&settings));
        Self { settings, selector }
    }

    /// Select filters for every chain.  Chains are independent and evaluated
    /// in parallel; tiers within a chain run in priority order.
    pub fn configure(
        &self,
        axes: &[Axis],
        table: &AbsorptionTable,
        request: DesiredTransmission,
    ) -> Result<SystemConfiguration> {
        request.validate()?;
        let plans = self.plan(axes)?;

        let selections = plans
            .par_iter()
            .map(|(chain, plan)| -> Result<(String, PrioritySelection)> {
                let groups: Vec<FilterGroup> = plan.iter().map(|(_, g)| g.clone()).collect();
                let selection = self.selector.select_with_priority(
                    &groups,
                    table,
                    request.target,
                    request.energy_ev,
                )?;
                Ok((chain.clone(), selection))
            })
            .collect::<Result<Vec<(String, PrioritySelection)>>>()?;

        let mut configuration = Configuration::default();
        let mut chains = BTreeMap::new();
        for (chain, selection) in selections {
            let plan = &plans[&chain];
            let tiers = selection
                .stages
                .iter()
                .map(|stage| TierOutcome {
                    material: plan[stage.tier].0,
                    target: stage.target,
                    transmission: stage.transmission,
                    saturated: stage.saturated,
                })
                .collect();
            let result = selection.result;

            log::info!(
                "{chain}: energy {} eV with desired transmission {:.2e} estimated {:.2e} \
                 (delta {:.3e}) inserted: {:?}",
                request.energy_ev,
                request.target,
                result.transmission,
                result.error(request.target),
                result.configuration.inserted().map(|id| id.0).collect::<Vec<_>>(),
            );

            configuration = configuration.union(&result.configuration)?;
            chains.insert(
                chain,
                ChainOutcome {
                    transmission: result.transmission,
                    error: result.error(request.target),
                    tiers,
                },
            );
        }

        Ok(SystemConfiguration {
            request,
            configuration,
            chains,
        })
    }

    /// Transmission per chain of an arbitrary configuration (for example the
    /// one currently reported by the motors).  Stuck filters count in their
    /// physical state and inactive ones as removed; filters missing from
    /// `configuration` count as removed.
    pub fn transmission_of(
        &self,
        axes: &[Axis],
        table: &AbsorptionTable,
        configuration: &Configuration,
        energy_ev: f64,
    ) -> Result<BTreeMap<String, f64>> {
        validate_energy(energy_ev)?;
        let mut chains: BTreeMap<String, f64> = BTreeMap::new();
        for axis in axes {
            let transmission = chains.entry(axis.chain.clone()).or_insert(1.0);
            for filter in axis.filters.filters() {
                let inserted = filter
                    .fixed_state()
                    .unwrap_or_else(|| configuration.is_inserted(filter.id).unwrap_or(false));
                if inserted {
                    *transmission *= table.filter_transmission(filter, energy_ev)?;
                }
            }
        }
        Ok(chains)
    }

    /// Transmission of `configuration` at the third harmonic (3 × energy).
    pub fn third_harmonic(
        &self,
        axes: &[Axis],
        table: &AbsorptionTable,
        configuration: &Configuration,
        energy_ev: f64,
    ) -> Result<BTreeMap<String, f64>> {
        self.transmission_of(axes, table, configuration, 3.0 * energy_ev)
    }

    // -- validation and grouping --

    /// Check the input invariants and group axes into chains of tiers.
    fn plan(&self, axes: &[Axis]) -> Result<BTreeMap<String, ChainPlan>> {
        let order = &self.settings.material_order;
        let mut seen = HashSet::new();
        let mut by_chain: BTreeMap<String, BTreeMap<Material, FilterGroup>> = BTreeMap::new();

        for axis in axes {
            if !order.contains(&axis.tier) {
                return Err(CalcError::ConfigurationConflict(format!(
                    "axis {} holds {} which is not in the material order {:?}",
                    axis.name, axis.tier, order
                )));
            }
            for filter in axis.filters.filters() {
                if filter.material != axis.tier {
                    return Err(CalcError::ConfigurationConflict(format!(
                        "filter {} on axis {} is {} but the axis tier is {}",
                        filter.id, axis.name, filter.material, axis.tier
                    )));
                }
                if !seen.insert(filter.id) {
                    return Err(CalcError::ConfigurationConflict(format!(
                        "filter {} appears on more than one axis",
                        filter.id
                    )));
                }
            }
            by_chain
                .entry(axis.chain.clone())
                .or_default()
                .entry(axis.tier)
                .or_default()
                .extend(&axis.filters);
        }

        Ok(by_chain
            .into_iter()
            .map(|(chain, mut tiers)| {
                let plan: ChainPlan = order
                    .iter()
                    .filter_map(|material| {
                        let group = tiers.remove(material);
                        if group.is_none() {
                            log::warn!("{chain}: no {} filters present", material.name());
                        }
                        group.map(|g| (*material, g))
                    })
                    .collect();
                (chain, plan)
            })
            .collect())
    }
}
