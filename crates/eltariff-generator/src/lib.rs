//! Eltariff Generator
//!
//! Renders a validated tariff model into a deployable grid tariff API: an
//! OpenAPI contract built from the schema descriptor, the tariff document, a
//! small axum server embedding it, and container descriptors.
//!
//! Generation is deterministic; every file carries a SHA-256 digest and the
//! package carries one over all files.
//!
//! # Example
//!
//! ```no_run
//! use eltariff_generator::PackageGenerator;
//! use eltariff_domain::TariffModel;
//!
//! # fn example(model: TariffModel) -> Result<(), Box<dyn std::error::Error>> {
//! let package = PackageGenerator::default().generate(&model)?;
//! for path in package.paths() {
//!     println!("{}  {}", package.digests[path], path);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod generator;
mod openapi;
mod package;
mod service;
mod templates;


pub use error::GeneratorError;
pub use generator::{PackageGenerator, TEMPLATE_VERSIONS};
pub use openapi::{build_openapi, BASE_PATH};
pub use package::GeneratedPackage;
pub use service::{service_name, ServiceInfo, IMPLEMENTATION_VERSION};
