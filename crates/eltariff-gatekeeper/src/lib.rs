//! Eltariff Gatekeeper
//!
//! Turns raw tariff documents into validated [`TariffModel`]s.
//!
//! The Gatekeeper provides:
//! - Normalization into the canonical wire form (units, currencies, VAT, enum aliases, defaults)
//! - Structural validation driven by the schema descriptor
//! - Semantic validation (VAT arithmetic, units, validity and time windows, references)
//!
//! Every violation is reported; validation never stops at the first one.
//!
//! # Examples
//!
//! ```
//! use eltariff_gatekeeper::Gatekeeper;
//! use serde_json::json;
//!
//! let gatekeeper = Gatekeeper::default_config();
//! let report = gatekeeper
//!     .validate(&json!({"tariffs": [{"name": "Enkeltariff"}]}))
//!     .unwrap_err();
//! assert!(report.len() >= 2);
//! ```
//!
//! [`TariffModel`]: eltariff_domain::TariffModel

#![warn(missing_docs)]

mod config;
mod error;
mod normalize;
mod paths;
mod semantic;
mod structure;
mod validator;
mod windows;

#[cfg(test)]
mod tests;

pub use config::ValidationConfig;
pub use error::ValidationReport;
pub use normalize::{normalize_time, parse_number, Normalizer};
pub use structure::is_iso_duration;
pub use validator::{Gatekeeper, Validated};
