//! Architecture entries.
//!
//! Each sub-module encodes one processor family as Rust static data. See
//! [`crate::Catalog::full`] for the assembly order.

pub mod arm;
pub mod x86;
