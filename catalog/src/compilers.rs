//! Compiler entries and their aliases.
//!
//! Aliases include the `distutils` compiler type names (`unix`, `mingw32`,
//! `cygwin`), which all drive a GCC-compatible command line.

use crate::model::Compiler;

/// Returns every known compiler, in declaration order.
#[must_use]
pub fn all() -> Vec<Compiler> {
    vec![
        Compiler {
            name: "gcc",
            label: "GNU Compiler Collection",
            aliases: &["gcc", "unix", "mingw32", "cygwin"],
        },
        Compiler {
            name: "msvc",
            label: "Microsoft Visual C++",
            aliases: &["msvc"],
        },
    ]
}
