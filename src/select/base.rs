use std::cmp::Ordering;

use super::SelectionMode;
use crate::config::Settings;
use crate::data::absorption::AbsorptionTable;
use crate::data::model::{
    validate_energy, validate_target, FilterGroup, StateMask, TransmissionResult,
};
use crate::error::{CalcError, Result};

// ---------------------------------------------------------------------------
// Candidate ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Candidate {
    mask: StateMask,
    transmission: f64,
}

impl Candidate {
    fn inserted(&self) -> u32 {
        self.mask.count_ones()
    }
}

/// Total order over candidates, best first:
/// 1. candidates on the permitted side of the target,
/// 2. smaller distance to the target,
/// 3. fewer inserted filters,
/// 4. lower mask.
fn rank(mode: SelectionMode, target: f64, a: &Candidate, b: &Candidate) -> Ordering {
    let a_ok = mode.admits(a.transmission, target);
    let b_ok = mode.admits(b.transmission, target);
    b_ok.cmp(&a_ok)
        .then_with(|| {
            (a.transmission - target)
                .abs()
                .total_cmp(&(b.transmission - target).abs())
        })
        .then_with(|| a.inserted().cmp(&b.inserted()))
        .then_with(|| a.mask.cmp(&b.mask))
}

// ---------------------------------------------------------------------------
// BaseSelector
// ---------------------------------------------------------------------------

/// Exhaustive search over every reachable state of one filter group.
///
/// Every one of the 2^N states of the N free filters is evaluated; nothing is
/// assumed about thicknesses or materials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseSelector {
    mode: SelectionMode,
    max_free_filters: usize,
}

impl Default for BaseSelector {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl BaseSelector {
    pub fn new(mode: SelectionMode, max_free_filters: usize) -> Self {
        Self {
            mode,
            max_free_filters,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.mode, settings.max_free_filters)
    }

    /// Pick the state of `group` whose transmission at `energy_ev` best
    /// matches `target`.
    pub fn select(
        &self,
        group: &FilterGroup,
        table: &AbsorptionTable,
        target: f64,
        energy_ev: f64,
    ) -> Result<TransmissionResult> {
        validate_target(target)?;
        validate_energy(energy_ev)?;
        group.validate()?;

        let free = group.free_indices();
        if free.len() > self.max_free_filters {
            return Err(CalcError::GroupTooLarge {
                free: free.len(),
                max: self.max_free_filters,
            });
        }

        // Forced-in filters multiply into every candidate; forced-out and
        // inactive filters contribute 1.
        let mut fixed_factor = 1.0;
        for filter in group.filters() {
            if filter.fixed_state() == Some(true) {
                fixed_factor *= table.filter_transmission(filter, energy_ev)?;
            }
        }

        let free_transmissions = free
            .iter()
            .map(|&idx| table.filter_transmission(&group.filters()[idx], energy_ev))
            .collect::<Result<Vec<f64>>>()?;

        let evaluate = |mask: StateMask| Candidate {
            mask,
            transmission: free_transmissions
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .fold(fixed_factor, |acc, (_, t)| acc * t),
        };

        let states = group.reachable_states()?;
        let state_count = states.end;
        let best = states.skip(1).map(evaluate).fold(evaluate(0), |best, cand| {
            if rank(self.mode, target, &cand, &best) == Ordering::Less {
                cand
            } else {
                best
            }
        });

        log::debug!(
            "{:?} search over {} states: mask {:#b} gives {:.4e} for target {:.4e}",
            self.mode,
            state_count,
            best.mask,
            best.transmission,
            target
        );

        Ok(TransmissionResult {
            configuration: group.configuration_for(&free, best.mask),
            transmission: best.transmission,
        })
    }
}
