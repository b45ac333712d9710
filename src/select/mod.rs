/// Configuration search.
///
/// ```text
///   tiers (priority order)          running target
///   ┌──────────┐  ┌──────────┐     target / T(so far)
///   │ C group   │→│ Si group  │ ─►  each stage: BaseSelector (2^N search)
///   └──────────┘  └──────────┘
/// ```
///
/// [`BaseSelector`] finds the best state of a single group;
/// [`MaterialPrioritySelector`] folds it over priority tiers.
pub mod base;
pub mod priority;

#[cfg(test)]
mod base_test;

pub use base::BaseSelector;
pub use priority::{MaterialPrioritySelector, PrioritySelection, Stage};

use serde::{Deserialize, Serialize};

/// Which side of the desired transmission a configuration may land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Closest transmission not above the target.
    #[default]
    Floor,
    /// Closest transmission not below the target.
    Ceiling,
}

impl SelectionMode {
    /// Whether `transmission` lands on the permitted side of `target`.
    pub fn admits(&self, transmission: f64, target: f64) -> bool {
        match self {
            SelectionMode::Floor => transmission <= target,
            SelectionMode::Ceiling => transmission >= target,
        }
    }
}
