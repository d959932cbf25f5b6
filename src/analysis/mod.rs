//! Analysis result modules
//!
//! Types handed back to the caller:
//! - Notes, key and tempo estimates
//! - Metadata

pub mod metadata;
pub mod result;
