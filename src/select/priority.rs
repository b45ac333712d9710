use serde::{Deserialize, Serialize};

use super::base::BaseSelector;
use crate::data::absorption::AbsorptionTable;
use crate::data::model::{validate_target, Configuration, FilterGroup, TransmissionResult};
use crate::error::{CalcError, Result};

/// What one priority tier was asked for and what it delivered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Position in the priority order (0 = highest priority).
    pub tier: usize,
    /// Target handed to this tier's search.
    pub target: f64,
    /// Transmission achieved by this tier alone.
    pub transmission: f64,
    /// Every free filter of the tier ended up inserted.
    pub saturated: bool,
}

/// Combined result of a priority chain plus the per-tier breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritySelection {
    pub result: TransmissionResult,
    pub stages: Vec<Stage>,
}

/// Accumulator threaded through the tiers.
struct Chain {
    transmission: f64,
    configuration: Configuration,
    stages: Vec<Stage>,
    /// Cleared once a tier stops short of saturation; lower tiers then only
    /// receive a target of 1 (nothing optional inserted).
    open: bool,
}

/// Runs a [`BaseSelector`] per tier, highest priority first, so that a lower
/// tier (silicon) is only used once the higher tiers (diamond) are saturated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialPrioritySelector {
    base: BaseSelector,
}

impl MaterialPrioritySelector {
    pub fn new(base: BaseSelector) -> Self {
        Self { base }
    }

    /// Fold the tiers left to right, dividing the desired transmission by the
    /// transmission accumulated so far before each stage.
    pub fn select_with_priority(
        &self,
        tiers: &[FilterGroup],
        table: &AbsorptionTable,
        target: f64,
        energy_ev: f64,
    ) -> Result<PrioritySelection> {
        validate_target(target)?;

        let start = Chain {
            transmission: 1.0,
            configuration: Configuration::default(),
            stages: Vec::with_capacity(tiers.len()),
            open: true,
        };

        let chain = tiers.iter().enumerate().try_fold(start, |mut chain, (tier, group)| {
            let stage_target = if !chain.open {
                1.0
            } else if chain.transmission == 0.0 {
                return Err(CalcError::ConfigurationConflict(format!(
                    "transmission before tier {tier} is zero at {energy_ev} eV; \
                     check the absorption table and forced-in filters"
                )));
            } else {
                (target / chain.transmission).clamp(0.0, 1.0)
            };

            let result = self.base.select(group, table, stage_target, energy_ev)?;

            let saturated = group.is_saturated(&result.configuration);
            log::debug!(
                "Tier {tier}: target {stage_target:.4e} -> {:.4e} ({} inserted, saturated: {saturated})",
                result.transmission,
                result.configuration.inserted_count()
            );

            chain.transmission *= result.transmission;
            chain.configuration = chain.configuration.union(&result.configuration)?;
            chain.open &= saturated;
            chain.stages.push(Stage {
                tier,
                target: stage_target,
                transmission: result.transmission,
                saturated,
            });
            Ok(chain)
        })?;

        Ok(PrioritySelection {
            result: TransmissionResult {
                configuration: chain.configuration,
                transmission: chain.transmission,
            },
            stages: chain.stages,
        })
    }
}
