//! Calculation settings.
//!
//! Loaded from a JSON file; every field has a default so an empty object
//! (or no file at all) yields the AT2L0 behaviour: diamond before silicon,
//! floor selection.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::model::{Material, MAX_ENUMERABLE};
use crate::select::SelectionMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Materials in insertion priority: a later material is only used once
    /// every earlier one is fully inserted.
    #[serde(default = "default_material_order")]
    pub material_order: Vec<Material>,

    /// Floor (closest from below) or ceiling (closest from above).
    #[serde(default)]
    pub mode: SelectionMode,

    /// Upper bound on free filters per tier; the search is 2^N.
    #[serde(default = "default_max_free_filters")]
    pub max_free_filters: usize,
}

fn default_material_order() -> Vec<Material> {
    vec![Material::C, Material::Si]
}

fn default_max_free_filters() -> usize {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            material_order: default_material_order(),
            mode: SelectionMode::default(),
            max_free_filters: default_max_free_filters(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file and validate them.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text).context("parsing settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.material_order.is_empty() {
            bail!("material_order must name at least one material");
        }
        for (i, material) in self.material_order.iter().enumerate() {
            if self.material_order[..i].contains(material) {
                bail!("material_order lists {material} twice");
            }
        }
        if self.max_free_filters == 0 || self.max_free_filters > MAX_ENUMERABLE {
            bail!(
                "max_free_filters must be between 1 and {MAX_ENUMERABLE}, got {}",
                self.max_free_filters
            );
        }
        Ok(())
    }
}
