//! Headway core crate - error type, settings store, shared domain types.
//!
//! Every other Headway crate depends on this one for the common error
//! taxonomy, the flat JSON settings object, and the small set of domain
//! types that cross crate boundaries.

pub mod error;
pub mod settings;
pub mod types;
