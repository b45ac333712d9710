//! Filter-configuration calculator for solid X-ray attenuators.
//!
//! Given a requested transmission and photon energy, picks which filter
//! blades to insert.  Diamond tiers are saturated before silicon is touched,
//! since silicon filters must sit behind the diamond that protects them.
//!
//! ```text
//!  SystemConfigurator ── per chain (rayon) ──► MaterialPrioritySelector
//!                                                   │ per tier, in order
//!                                                   ▼
//!                                              BaseSelector ──► AbsorptionTable
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod select;
pub mod system;

#[cfg(test)]
mod test_support;

pub use config::Settings;
pub use data::absorption::{AbsorptionRow, AbsorptionTable};
pub use data::model::{
    Axis, Configuration, DesiredTransmission, Filter, FilterGroup, FilterId, Material,
    StuckState, SystemSnapshot, TransmissionResult,
};
pub use error::{CalcError, Result};
pub use report::Report;
pub use select::{BaseSelector, MaterialPrioritySelector, PrioritySelection, SelectionMode};
pub use system::{SystemConfiguration, SystemConfigurator};
