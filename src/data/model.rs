use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// Filter material.  The derive order is irrelevant to selection; priority
/// between materials is configured explicitly (see `Settings::material_order`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Diamond.
    C,
    /// Silicon.
    Si,
}

impl Material {
    /// Human-readable material name.
    pub fn name(&self) -> &'static str {
        match self {
            Material::C => "diamond",
            Material::Si => "silicon",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::C => write!(f, "C"),
            Material::Si => write!(f, "Si"),
        }
    }
}

impl FromStr for Material {
    type Err = CalcError;

    /// Accepts the chemical formula in any case, or the material name.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "diamond" => Ok(Material::C),
            "si" | "silicon" => Ok(Material::Si),
            _ => Err(CalcError::UnknownMaterial(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Identity of a filter blade within one installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(pub u32);

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Whether the actuator of a filter can move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuckState {
    #[default]
    Free,
    ForcedIn,
    ForcedOut,
}

/// Static descriptor of a single filter, as read from the device layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub id: FilterId,
    pub material: Material,
    /// Thickness in micrometres.
    pub thickness_um: f64,
    /// Inactive filters are never inserted.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub stuck: StuckState,
}

fn default_active() -> bool {
    true
}

impl Filter {
    /// An active, free filter.
    pub fn new(id: u32, material: Material, thickness_um: f64) -> Self {
        Filter {
            id: FilterId(id),
            material,
            thickness_um,
            active: true,
            stuck: StuckState::Free,
        }
    }

    pub fn with_stuck(mut self, stuck: StuckState) -> Self {
        self.stuck = stuck;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// The state this filter is pinned to, or `None` when the selector may
    /// choose it.  A stuck filter reports its physical state even when it is
    /// also marked inactive.
    pub fn fixed_state(&self) -> Option<bool> {
        match self.stuck {
            StuckState::ForcedIn => Some(true),
            StuckState::ForcedOut => Some(false),
            StuckState::Free if !self.active => Some(false),
            StuckState::Free => None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.fixed_state().is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.thickness_um.is_finite() || self.thickness_um <= 0.0 {
            return Err(CalcError::InvalidFilter {
                id: self.id,
                reason: format!("thickness {} um must be positive", self.thickness_um),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FilterGroup
// ---------------------------------------------------------------------------

/// Bit pattern over a group's free filters: bit `k` set means the `k`-th
/// free filter (in group order) is inserted.
pub type StateMask = u64;

/// Widest state mask that can be enumerated.
pub const MAX_ENUMERABLE: usize = 63;

/// Ordered filters sharing one motion axis (or one priority tier).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterGroup {
    filters: Vec<Filter>,
}

impl FilterGroup {
    pub fn new(filters: Vec<Filter>) -> Self {
        FilterGroup { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Append another group's filters after this group's.
    pub fn extend(&mut self, other: &FilterGroup) {
        self.filters.extend(other.filters.iter().cloned());
    }

    /// Check the filters that can end up in the beam.  Filters pinned out
    /// never enter a transmission product and are not checked.
    pub fn validate(&self) -> Result<()> {
        self.filters
            .iter()
            .filter(|f| f.fixed_state() != Some(false))
            .try_for_each(Filter::validate)
    }

    /// Indices (into `filters()`) of the filters the selector may move.
    pub fn free_indices(&self) -> Vec<usize> {
        self.filters
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_free())
            .map(|(i, _)| i)
            .collect()
    }

    /// Every reachable insertion state of the free filters.
    pub fn reachable_states(&self) -> Result<Range<StateMask>> {
        let free = self.free_indices().len();
        if free > MAX_ENUMERABLE {
            return Err(CalcError::GroupTooLarge {
                free,
                max: MAX_ENUMERABLE,
            });
        }
        Ok(0..(1u64 << free))
    }

    /// Expand a state mask into a per-filter configuration.  `free` must be
    /// the result of [`FilterGroup::free_indices`].
    pub fn configuration_for(&self, free: &[usize], mask: StateMask) -> Configuration {
        let mut states: BTreeMap<FilterId, bool> = self
            .filters
            .iter()
            .map(|f| (f.id, f.fixed_state().unwrap_or(false)))
            .collect();
        for (bit, &idx) in free.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                states.insert(self.filters[idx].id, true);
            }
        }
        Configuration(states)
    }

    /// True when every free filter is inserted in `config`.
    pub fn is_saturated(&self, config: &Configuration) -> bool {
        self.filters
            .iter()
            .filter(|f| f.is_free())
            .all(|f| config.is_inserted(f.id) == Some(true))
    }
}

// ---------------------------------------------------------------------------
// Configuration / results
// ---------------------------------------------------------------------------

/// Inserted (`true`) or removed (`false`) per filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<FilterId, bool>);

impl Configuration {
    pub fn is_inserted(&self, id: FilterId) -> Option<bool> {
        self.0.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterId, bool)> + '_ {
        self.0.iter().map(|(id, state)| (*id, *state))
    }

    /// Ids of inserted filters, ascending.
    pub fn inserted(&self) -> impl Iterator<Item = FilterId> + '_ {
        self.iter().filter(|(_, state)| *state).map(|(id, _)| id)
    }

    pub fn inserted_count(&self) -> usize {
        self.0.values().filter(|state| **state).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Combine two configurations over disjoint filter sets.
    pub fn union(mut self, other: &Configuration) -> Result<Configuration> {
        for (id, state) in other.iter() {
            if self.0.insert(id, state).is_some() {
                return Err(CalcError::ConfigurationConflict(format!(
                    "filter {id} appears in more than one group"
                )));
            }
        }
        Ok(self)
    }

    /// Pack the states into an integer, `order[0]` being the most significant
    /// bit.  Filters absent from the configuration count as removed.
    pub fn bitmask(&self, order: &[FilterId]) -> u64 {
        order.iter().fold(0u64, |acc, id| {
            (acc << 1) | u64::from(self.is_inserted(*id).unwrap_or(false))
        })
    }
}

impl FromIterator<(FilterId, bool)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (FilterId, bool)>>(iter: I) -> Self {
        Configuration(iter.into_iter().collect())
    }
}

/// A selector's answer: which filters to insert and what that achieves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionResult {
    pub configuration: Configuration,
    pub transmission: f64,
}

impl TransmissionResult {
    /// Achieved minus desired transmission.
    pub fn error(&self, target: f64) -> f64 {
        self.transmission - target
    }
}

/// The operator request driving a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesiredTransmission {
    pub target: f64,
    pub energy_ev: f64,
}

impl DesiredTransmission {
    pub fn new(target: f64, energy_ev: f64) -> Result<Self> {
        let request = DesiredTransmission { target, energy_ev };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        validate_target(self.target)?;
        validate_energy(self.energy_ev)
    }
}

pub(crate) fn validate_target(target: f64) -> Result<()> {
    if (0.0..=1.0).contains(&target) {
        Ok(())
    } else {
        Err(CalcError::InvalidTarget(target))
    }
}

pub(crate) fn validate_energy(energy_ev: f64) -> Result<()> {
    if energy_ev.is_finite() && energy_ev > 0.0 {
        Ok(())
    } else {
        Err(CalcError::InvalidEnergy(energy_ev))
    }
}

// ---------------------------------------------------------------------------
// Axes and system snapshots
// ---------------------------------------------------------------------------

/// One motion axis, tagged with the attenuator chain it belongs to and the
/// priority tier (material) of its filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub chain: String,
    pub tier: Material,
    pub filters: FilterGroup,
}

/// Live snapshot of every axis, as handed over by the device layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub axes: Vec<Axis>,
}

impl SystemSnapshot {
    /// Filter ids in snapshot order (axis order, then filter order).
    pub fn filter_order(&self) -> Vec<FilterId> {
        self.axes
            .iter()
            .flat_map(|axis| axis.filters.filters().iter().map(|f| f.id))
            .collect()
    }
}
