//! YAML-driven test harness for CQL libraries
//!
//! This crate ties the harness together:
//! - `HarnessConfig`, read from a `cqlt.yaml` project file
//! - `TestSuite`, a directory of YAML test-case documents expanded into
//!   patient bundles for one FHIR schema version
//! - `CqlExecutor` and `ValueSetResolver`, the async boundaries to the CQL
//!   engine and terminology service
//! - `TestHarness`, which runs each case and checks its expectations
//!
//! # Example
//!
//! ```ignore
//! use octofhir_cqlt::{HarnessConfig, LogSink, TestHarness};
//!
//! let config = HarnessConfig::from_file("cqlt.yaml")?;
//! let suite = config.load_suite(&LogSink)?;
//! let harness = TestHarness::from_config(&config, executor)?;
//! let report = harness.run(&suite.cases).await;
//! println!("{report}");
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_cqlt_assert as assert;
pub use octofhir_cqlt_diagnostics as diagnostics;
pub use octofhir_cqlt_fixture as fixture;
pub use octofhir_cqlt_schema as schema;

// Convenience re-exports
pub use octofhir_cqlt_assert::{AssertionFailure, CqlValue, check, check_all};
pub use octofhir_cqlt_diagnostics::{CollectingSink, DiagnosticSink, LogSink, NullSink};
pub use octofhir_cqlt_fixture::{Bundle, FixtureExpander, ResourceExpander, TestCase};
pub use octofhir_cqlt_schema::{SchemaRegistry, SchemaVersion};

pub mod config;
pub mod error;
pub mod executor;
pub mod runner;
pub mod suite;

pub use config::*;
pub use error::*;
pub use executor::*;
pub use runner::*;
pub use suite::*;
