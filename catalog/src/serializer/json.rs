//! JSON serializer for the catalog.
//!
//! Produces one document with an `architectures` and a `compilers` array.
//! Feature tables are emitted as `{leaf, register, bits}` objects where
//! `bits` maps the bit position to the feature name; reserved bits are left
//! out.

use serde_json::{json, Map, Value};

use crate::model::{Architecture, Catalog, FeatureTable};

/// Serializes the complete catalog to a JSON `Value`.
///
/// The returned value can be pretty-printed with [`serde_json::to_string_pretty`].
#[must_use]
pub fn to_json(catalog: &Catalog) -> Value {
    let architectures: Vec<Value> = catalog.architectures.iter().map(architecture).collect();
    let compilers: Vec<Value> = catalog
        .compilers
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "label": c.label,
                "aliases": c.aliases,
            })
        })
        .collect();
    json!({
        "version": catalog.version,
        "architectures": architectures,
        "compilers": compilers,
    })
}

fn architecture(arch: &Architecture) -> Value {
    let tables: Vec<Value> = arch.feature_tables.iter().map(table).collect();
    json!({
        "name": arch.name,
        "label": arch.label,
        "family": arch.family.as_str(),
        "aliases": arch.aliases,
        "feature_tables": tables,
        "static_features": arch.static_features,
        "wide_register_features": arch.wide_register_features,
    })
}

fn table(table: &FeatureTable) -> Value {
    let mut bits = Map::new();
    for (bit, name) in table.named_bits() {
        bits.insert(bit.to_string(), json!(name));
    }
    json!({
        "leaf": format!("{:#x}", table.leaf),
        "register": table.register.as_str(),
        "bits": Value::Object(bits),
    })
}
