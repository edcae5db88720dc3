#![forbid(unsafe_code)]

pub mod archive;
pub mod classifier;
pub mod config;
pub mod content;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod governing;
pub mod logging;
pub mod reconcile;
pub mod registry;
pub mod resource_number;

pub use classifier::{Classification, Classifier};
pub use config::CatalogConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Report, Severity};
pub use error::CatalogError;
pub use governing::GoverningRules;
pub use reconcile::{diff_master_maps, reconcile, verify_archive, Reconciliation};
pub use registry::{MasterMap, RegistryModel};
pub use resource_number::{ResourceNumber, ResourceType};
