/// Data layer: filter descriptors, absorption data, and loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv        snapshot .json
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                  ┌──────────┐
///   │  loader   │                  │  loader   │
///   └──────────┘                  └──────────┘
///        │                              │
///        ▼                              ▼
///   ┌─────────────────┐        ┌────────────────┐
///   │ AbsorptionTable  │        │ SystemSnapshot  │  axes → FilterGroup
///   └─────────────────┘        └────────────────┘
///        │   (read-only, shared by reference)   │
///        └──────────────► selectors ◄───────────┘
/// ```

pub mod absorption;
pub mod loader;
pub mod model;

#[cfg(test)]
mod absorption_test;
