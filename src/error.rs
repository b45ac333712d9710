//! Error type for the filter-configuration engine.
//!
//! Every variant aborts the calculation that raised it: no selector hands back
//! a partial configuration alongside an error.

use thiserror::Error;

use crate::data::model::{FilterId, Material};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    // -----------------------------------------------------------------------
    // Bad request
    // -----------------------------------------------------------------------
    #[error("Desired transmission {0} is outside [0, 1]")]
    InvalidTarget(f64),

    #[error("Photon energy {0} eV is not a positive, finite value")]
    InvalidEnergy(f64),

    // -----------------------------------------------------------------------
    // Absorption data
    // -----------------------------------------------------------------------
    #[error(
        "Photon energy {energy_ev} eV is outside the tabulated range \
         [{min_ev}, {max_ev}] eV for {material}"
    )]
    OutOfRange {
        material: Material,
        energy_ev: f64,
        min_ev: f64,
        max_ev: f64,
    },

    #[error("Unknown filter material: {0:?}")]
    UnknownMaterial(String),

    #[error("No absorption data loaded for {0}")]
    NoAbsorptionData(Material),

    #[error("Invalid absorption table: {0}")]
    InvalidTable(String),

    // -----------------------------------------------------------------------
    // Broken input model (fatal)
    // -----------------------------------------------------------------------
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    #[error("Filter {id}: {reason}")]
    InvalidFilter { id: FilterId, reason: String },

    #[error("Group has {free} free filters; at most {max} can be enumerated")]
    GroupTooLarge { free: usize, max: usize },
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, CalcError>;
