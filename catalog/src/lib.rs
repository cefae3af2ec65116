//! Static processor and compiler data for `fatarch`.
//!
//! The `fatarch-catalog` crate provides every architecture the dispatcher
//! knows about (canonical names, aliases, `cpuid` bit tables, wide-register
//! feature lists) and every supported compiler as static Rust data, along
//! with a JSON serializer used by the inspection tools.
//!
//! # Entry Point
//!
//! ```
//! let catalog = fatarch_catalog::Catalog::full();
//! assert_eq!(catalog.architectures.len(), 4);
//! assert!(catalog.find_architecture("x86_64").is_some());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod architectures;
pub mod compilers;
pub mod model;
#[cfg(feature = "serializers")]
pub mod serializer;

pub use model::{
    normalize_identifier, Architecture, Catalog, Compiler, Family, FeatureTable, Register,
    EXTENDED_LEAF_BASE,
};

impl Catalog {
    /// Returns the complete catalog.
    ///
    /// Architectures are listed ARM first, then x86, each family from the
    /// narrowest word size to the widest.
    #[must_use]
    pub fn full() -> &'static Catalog {
        static CATALOG: std::sync::OnceLock<Catalog> = std::sync::OnceLock::new();
        CATALOG.get_or_init(|| Catalog {
            version: "1.0.0",
            architectures: vec![
                architectures::arm::arm_32(),
                architectures::arm::arm_64(),
                architectures::x86::x86_32(),
                architectures::x86::x86_64(),
            ],
            compilers: compilers::all(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn architecture_count() {
        assert_eq!(Catalog::full().architectures.len(), 4);
    }

    #[test]
    fn compiler_count() {
        assert_eq!(Catalog::full().compilers.len(), 2);
    }

    #[test]
    fn architecture_aliases_unambiguous() {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for (alias, name) in Catalog::full().architecture_aliases() {
            if let Some(previous) = seen.insert(alias.clone(), name) {
                assert_eq!(previous, name, "alias '{}' maps to two architectures", alias);
            }
        }
    }

    #[test]
    fn compiler_aliases_unambiguous() {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for (alias, name) in Catalog::full().compiler_aliases() {
            if let Some(previous) = seen.insert(alias.clone(), name) {
                assert_eq!(previous, name, "alias '{}' maps to two compilers", alias);
            }
        }
    }

    #[test]
    fn x86_entries_share_tables() {
        let catalog = Catalog::full();
        let x32 = catalog.find_architecture("x86_32").map(Architecture::decodable_features);
        let x64 = catalog.find_architecture("x86_64").map(Architecture::decodable_features);
        assert!(x32.is_some());
        assert_eq!(x32, x64);
    }

    #[test]
    fn arm_entries_have_no_tables() {
        for name in ["arm_32", "arm_64"] {
            let arch = Catalog::full().find_architecture(name);
            assert!(arch.is_some_and(|a| a.feature_tables.is_empty() && !a.static_features.is_empty()));
        }
    }
}
