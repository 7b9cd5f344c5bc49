//! Vertical Regridding and Height Integration for Ionosphere/Thermosphere Grids
//!
//! Model output on native levels (pressure surfaces) has a geometric height
//! that differs for every column and timestep. This crate:
//!
//! - **Brackets** a target altitude inside an irregular height column
//! - **Regrids** any number of fields onto a uniform altitude grid
//! - **Integrates** fields vertically, then over longitude and latitude, to
//!   get column maps (e.g. W m^-2) or box totals (e.g. W)
//!
//! # Architecture
//!
//! ```text
//! ModelDataProvider (fields + axes)
//!      │
//!      ├─► Regridder::regrid(heights, fields, targets, times)
//!      │         │
//!      │         ├─► index::bracket          per column, per target
//!      │         └─► interpolation           per field
//!      │               │
//!      │               ▼
//!      │         RegriddedDataset  [time][alt][lat][lon] + height record
//!      │
//!      └─► VolumeIntegrator
//!                ├─► vertical stage          ∫ f r² cosφ dz
//!                ├─► zonal stage             ∫ · dλ
//!                └─► meridional stage        ∫ · dφ
//!                      │
//!                      ▼
//!                Integrated { value, units }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use iono_grid::{FieldId, Regridder, TargetAltitudes, EngineConfig};
//!
//! let targets = TargetAltitudes::new(100.0, 400.0, 5.0)?;
//! let regridder = Regridder::new(EngineConfig::from_env())?;
//! let out = regridder.regrid(heights.view(), &[(FieldId::JouleHeating, qj.view())], &targets, &[0])?;
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod integrate;
pub mod interpolation;
pub mod provider;
pub mod regrid;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{EngineConfig, NonFinitePolicy, QuadratureRule, ReductionOrder, EARTH_RADIUS_KM};
pub use error::{GridError, Result};
pub use index::{bracket, bracket_index, bracket_index_linear, Bracket};
pub use integrate::{integrate, GridGeometry, Integrated, VolumeIntegrator};
pub use interpolation::{interpolate, interpolate_column};
pub use provider::{InMemoryProvider, ModelDataProvider};
pub use regrid::{regrid, RegriddedDataset, RegriddedField, Regridder};
pub use types::{
    Axis, AxisKind, FieldId, IntegrationBounds, Measure, SiUnit, TargetAltitudes,
    MAX_TARGET_ALTITUDES,
};
