//! Eltariff Domain Layer
//!
//! This crate holds the tariff model and the fixed vocabulary every other
//! crate builds on. It has no infrastructure dependencies: no network, no
//! filesystem, no runtime.
//!
//! ## Key Concepts
//!
//! - **Tariff model**: one operator's tariffs with price elements, components and windows
//! - **Schema descriptor**: versioned description of the wire format
//! - **Source input**: one piece of evidence (structured JSON, web page, PDF text, plain text)
//! - **Violation**: one broken rule, located by path
//! - **Model backend**: trait seam for structured-output model calls
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure types and rules only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calendar;
pub mod schema;
pub mod source;
pub mod tariff;
pub mod traits;
pub mod violation;

// Re-exports for convenience
pub use schema::{SchemaDescriptor, CURRENT_SCHEMA_VERSION};
pub use source::{SourceInput, SourceKind};
pub use tariff::{
    ActivePeriod, CalendarPattern, CalendarPatternReference, ComponentType, Currency, Direction,
    ElementKind, PeakIdentificationSettings, Price, PriceComponent, PriceElement, RecurringPeriod,
    Tariff, TariffModel, Unit, ValidPeriod,
};
pub use traits::{BackendError, ChatMessage, ModelBackend, ModelRequest, Role};
pub use violation::{ErrorKind, Violation, ViolationCode};
