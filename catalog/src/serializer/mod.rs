//! Serializers for the catalog.
//!
//! - [`json`]: the inspection format printed by `fatarch-cpu --catalog`

pub mod json;
