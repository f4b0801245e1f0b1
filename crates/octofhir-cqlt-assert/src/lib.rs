//! CQL result values and expectation checking
//!
//! A CQL executor returns one [`CqlValue`] per named expression. Each value
//! is normalized to a canonical JSON form and compared against the
//! expectation authored in the test case's `results` block.
//!
//! ```
//! use octofhir_cqlt_assert::{CqlDate, CqlValue, check};
//! use serde_json::json;
//!
//! let onset = CqlValue::Date(CqlDate::new(2010, 3, 1));
//! assert!(check("Onset", Some(&onset), &json!("2010-03-01")).is_ok());
//! assert!(check("Onset", Some(&onset), &json!("$should exist")).is_ok());
//! ```

pub mod error;
pub mod expectation;
pub mod normalize;
pub mod value;

pub use error::*;
pub use expectation::*;
pub use normalize::{decimal_to_json, json_equals};
pub use value::*;
