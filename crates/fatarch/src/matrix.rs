//! Argument matrix expansion.
//!
//! An [`ArgumentMatrix`] is an ordered list of [`OptionGroup`]s. Each group is
//! one independent axis of compiler choice (instruction set width, vendor
//! tuning, ...) holding mutually exclusive [`CandidateOption`]s. Expanding the
//! matrix picks one candidate per group for every combination and names each
//! combination from the suffixes of the candidates it picked.
//!
//! ```text
//! group 0   [-flto -O3]                        fixed, no suffix
//! group 1   [-mavx2 ...]:avx2  [-mavx ...]:avx  []
//! group 2   [-mtune=intel]:intel               []
//!
//! "avx2-intel"  "avx2"  "avx-intel"  "avx"  "intel"  ""
//! ```
//!
//! The empty name ([`DEFAULT_VARIANT`]) is the generic build.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use log::{debug, trace};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

/// Name of the variant that activates no suffixed candidate.
pub const DEFAULT_VARIANT: &str = "";

/// Separator between suffix fragments in a variant name.
pub const SUFFIX_SEPARATOR: char = '-';

/// One choice within an [`OptionGroup`].
///
/// `import_if` and `build_if` are evaluated once, when the matrix is built
/// for a given processor snapshot and compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOption {
    /// Flags contributed when this candidate is chosen. May be empty.
    pub tokens: Vec<String>,
    /// Fragment contributed to the variant name, if any.
    pub suffix: Option<String>,
    /// Processor/architecture eligibility.
    pub import_if: bool,
    /// Support by the compiler that will actually run.
    pub build_if: bool,
}

static NOOP: CandidateOption = CandidateOption {
    tokens: Vec::new(),
    suffix: None,
    import_if: true,
    build_if: true,
};

impl CandidateOption {
    /// Creates an always-eligible, unsuffixed candidate contributing `tokens`.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            suffix: None,
            import_if: true,
            build_if: true,
        }
    }

    /// Creates the "no special flags" candidate.
    #[must_use]
    pub fn generic() -> Self {
        NOOP.clone()
    }

    /// Sets the variant name fragment.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Sets the eligibility predicate.
    #[must_use]
    pub fn import_if(mut self, eligible: bool) -> Self {
        self.import_if = eligible;
        self
    }

    /// Sets the compiler compatibility predicate.
    #[must_use]
    pub fn build_if(mut self, supported: bool) -> Self {
        self.build_if = supported;
        self
    }
}

/// How a group settles on one candidate for the current machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Candidates are ordered most to least specific; the first usable one
    /// is the machine's choice. Several may be eligible at once.
    Tiered,
    /// Predicates are mutually exclusive: at most one candidate may be
    /// eligible, enforced by [`ArgumentMatrix::new`].
    Exclusive,
}

/// One axis of choice: an ordered list of mutually exclusive candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    label: String,
    selection: Selection,
    candidates: Vec<CandidateOption>,
}

impl OptionGroup {
    /// Creates a group whose candidates are ordered most to least specific.
    pub fn tiered(label: impl Into<String>, candidates: Vec<CandidateOption>) -> Self {
        Self {
            label: label.into(),
            selection: Selection::Tiered,
            candidates,
        }
    }

    /// Creates a group whose candidates have mutually exclusive predicates.
    pub fn exclusive(label: impl Into<String>, candidates: Vec<CandidateOption>) -> Self {
        Self {
            label: label.into(),
            selection: Selection::Exclusive,
            candidates,
        }
    }

    /// Creates a single-candidate group applied to every variant.
    pub fn fixed<I, S>(label: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::exclusive(label, vec![CandidateOption::new(tokens)])
    }

    /// Group label, used in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Selection policy.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Candidates in declaration order.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateOption] {
        &self.candidates
    }

    fn validate(&self) -> Result<()> {
        if self.candidates.iter().any(|c| c.suffix.as_deref() == Some("")) {
            return Err(self.invalid("empty suffix; use `None` for unsuffixed candidates"));
        }
        if let Some(c) = self
            .candidates
            .iter()
            .filter_map(|c| c.suffix.as_deref())
            .find(|s| s.contains(SUFFIX_SEPARATOR))
        {
            return Err(self.invalid(format!("suffix '{c}' contains '{SUFFIX_SEPARATOR}'")));
        }
        if self.selection == Selection::Exclusive {
            let eligible = self.candidates.iter().filter(|c| c.import_if).count();
            if eligible > 1 {
                return Err(self.invalid(format!(
                    "{eligible} candidates are eligible in an exclusive group"
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidMatrix {
            group: self.label.clone(),
            reason: reason.into(),
        }
    }

    fn filter(&self, mode: ExpandMode) -> Result<Vec<&CandidateOption>> {
        let eligible: Vec<&CandidateOption> = self.candidates.iter().filter(|c| c.import_if).collect();
        if eligible.is_empty() {
            return Ok(vec![&NOOP]);
        }
        let mut kept = match mode {
            ExpandMode::All => eligible,
            ExpandMode::CurrentMachine | ExpandMode::CurrentCompiler => {
                eligible.into_iter().filter(|c| c.build_if).collect()
            }
        };
        if mode == ExpandMode::CurrentMachine {
            kept.truncate(1);
        }
        if kept.is_empty() {
            let group = self.label.clone();
            return Err(match mode {
                ExpandMode::CurrentCompiler => Error::IncompatibleCurrentCompiler { group },
                _ => Error::IncompatibleCurrentMachine { group },
            });
        }
        Ok(kept)
    }
}

/// Ordered option groups for one (processor, compiler) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMatrix {
    groups: Vec<OptionGroup>,
}

impl ArgumentMatrix {
    /// Builds a matrix, validating every group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] if a candidate has an empty suffix or
    /// a suffix containing the separator, or if an exclusive group has more
    /// than one eligible candidate.
    pub fn new(groups: Vec<OptionGroup>) -> Result<Self> {
        for group in &groups {
            group.validate()?;
        }
        Ok(Self { groups })
    }

    /// Groups in combination order.
    #[must_use]
    pub fn groups(&self) -> &[OptionGroup] {
        &self.groups
    }
}

/// Which combinations [`expand`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandMode {
    /// Every eligible combination; used for offline multi-variant builds.
    All,
    /// The single combination for the running processor and compiler.
    CurrentMachine,
    /// Every eligible combination the running compiler supports.
    CurrentCompiler,
}

impl fmt::Display for ExpandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::CurrentMachine => write!(f, "current-machine"),
            Self::CurrentCompiler => write!(f, "current-compiler"),
        }
    }
}

/// One named flag combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Suffix fragments joined by [`SUFFIX_SEPARATOR`], or [`DEFAULT_VARIANT`].
    pub name: String,
    /// Flags in group order.
    pub flags: Vec<String>,
}

impl Variant {
    /// Returns true for the generic build.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_VARIANT
    }

    /// Iterates over the suffix fragments of the name.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.name.split(SUFFIX_SEPARATOR).filter(|s| !s.is_empty())
    }
}

/// Variant name → flags, in first-seen traversal order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantMap {
    entries: Vec<Variant>,
    index: HashMap<String, usize>,
}

impl VariantMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a variant.
    ///
    /// Re-inserting an identical variant is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatrixNameCollision`] if `name` is already bound to
    /// different flags. The map is left unchanged.
    pub fn insert(&mut self, name: String, flags: Vec<String>) -> Result<()> {
        if let Some(&i) = self.index.get(&name) {
            let existing = &self.entries[i].flags;
            if *existing == flags {
                return Ok(());
            }
            return Err(Error::MatrixNameCollision {
                name,
                existing: existing.clone(),
                conflicting: flags,
            });
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Variant { name, flags });
        Ok(())
    }

    /// Looks up the flags of a variant.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.index.get(name).map(|&i| self.entries[i].flags.as_slice())
    }

    /// Returns true if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no variants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over variants in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.entries.iter()
    }

    /// Iterates over variant names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|v| v.name.as_str())
    }

    /// Returns the first variant, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Variant> {
        self.entries.first()
    }

    /// Keeps only the variants for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Variant) -> bool) {
        self.entries.retain(|v| keep(v));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name.clone(), i))
            .collect();
    }
}

impl IntoIterator for VariantMap {
    type Item = Variant;
    type IntoIter = std::vec::IntoIter<Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a VariantMap {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for VariantMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for v in &self.entries {
            map.serialize_entry(&v.name, &v.flags)?;
        }
        map.end()
    }
}

/// Expands `matrix` into its named flag combinations.
///
/// Groups whose candidates are all ineligible contribute nothing to any
/// variant. The product is traversed in group order with the last group
/// varying fastest.
///
/// # Errors
///
/// - [`Error::MatrixNameCollision`] if two different combinations share a name.
/// - [`Error::IncompatibleCurrentMachine`] / [`Error::IncompatibleCurrentCompiler`]
///   if a narrowed mode leaves a group with eligible candidates empty.
pub fn expand(matrix: &ArgumentMatrix, mode: ExpandMode) -> Result<VariantMap> {
    let filtered = matrix
        .groups
        .iter()
        .map(|g| g.filter(mode))
        .collect::<Result<Vec<_>>>()?;

    let mut variants = VariantMap::new();
    if filtered.is_empty() {
        variants.insert(DEFAULT_VARIANT.to_owned(), Vec::new())?;
        return Ok(variants);
    }

    for combination in filtered.iter().map(|g| g.iter().copied()).multi_cartesian_product() {
        let flags: Vec<String> = combination
            .iter()
            .flat_map(|c| c.tokens.iter().cloned())
            .collect();
        let name = combination
            .iter()
            .filter_map(|c| c.suffix.as_deref())
            .join(&SUFFIX_SEPARATOR.to_string());
        trace!("variant '{name}': {flags:?}");
        variants.insert(name, flags)?;
    }

    debug!(
        "expanded {} groups into {} variants ({mode})",
        matrix.groups.len(),
        variants.len()
    );
    Ok(variants)
}

/// Returns the one variant the running machine should load.
///
/// # Errors
///
/// Returns [`Error::IncompatibleCurrentMachine`] if narrowing leaves nothing,
/// and propagates every error of [`expand`].
pub fn best_variant(matrix: &ArgumentMatrix) -> Result<Variant> {
    let variants = expand(matrix, ExpandMode::CurrentMachine)?;
    variants
        .into_iter()
        .next()
        .ok_or_else(|| Error::IncompatibleCurrentMachine {
            group: String::from("<product>"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn flags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    /// Three groups: a fixed one, a tier with a generic fallback and a group
    /// whose only candidate is ineligible.
    fn scenario() -> ArgumentMatrix {
        ArgumentMatrix::new(vec![
            OptionGroup::fixed("base", ["-O3"]),
            OptionGroup::tiered(
                "simd",
                vec![
                    CandidateOption::new(["-mavx"]).suffix("avx"),
                    CandidateOption::generic(),
                ],
            ),
            OptionGroup::tiered(
                "tune",
                vec![CandidateOption::new(["-mtune=x"]).suffix("x").import_if(false)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn ineligible_group_collapses_to_identity() {
        let variants = expand(&scenario(), ExpandMode::All).unwrap();
        let names: Vec<_> = variants.names().collect();
        assert_eq!(names, vec!["avx", DEFAULT_VARIANT]);
        assert_eq!(variants.get("avx"), Some(flags(&["-O3", "-mavx"]).as_slice()));
        assert_eq!(variants.get(""), Some(flags(&["-O3"]).as_slice()));
    }

    /// `inst2` is unsupported by the compiler; `arch1`/`arch2` are exclusive
    /// per-architecture candidates evaluated for `arch1`.
    fn arch1_matrix() -> ArgumentMatrix {
        ArgumentMatrix::new(vec![
            OptionGroup::fixed("generic", ["--generic"]),
            OptionGroup::tiered(
                "inst",
                vec![
                    CandidateOption::new(["--inst1"]).suffix("inst1"),
                    CandidateOption::new(["--inst2"]).suffix("inst2").build_if(false),
                    CandidateOption::generic(),
                ],
            ),
            OptionGroup::exclusive(
                "arch",
                vec![
                    CandidateOption::new(["--arch1"]).suffix("arch1"),
                    CandidateOption::new(["--arch2"]).suffix("arch2").import_if(false),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn all_mode_keeps_every_eligible_candidate() {
        let variants = expand(&arch1_matrix(), ExpandMode::All).unwrap();
        let names: Vec<_> = variants.names().collect();
        assert_eq!(names, vec!["inst1-arch1", "inst2-arch1", "arch1"]);
        assert_eq!(
            variants.get("inst2-arch1"),
            Some(flags(&["--generic", "--inst2", "--arch1"]).as_slice())
        );
    }

    #[test]
    fn current_compiler_drops_unsupported_candidates() {
        let variants = expand(&arch1_matrix(), ExpandMode::CurrentCompiler).unwrap();
        let names: Vec<_> = variants.names().collect();
        assert_eq!(names, vec!["inst1-arch1", "arch1"]);
    }

    #[test]
    fn current_machine_takes_first_tier() {
        let best = best_variant(&arch1_matrix()).unwrap();
        assert_eq!(best.name, "inst1-arch1");
        assert_eq!(best.flags, flags(&["--generic", "--inst1", "--arch1"]));
    }

    #[test]
    fn current_machine_skips_unbuildable_tier() {
        let matrix = ArgumentMatrix::new(vec![OptionGroup::tiered(
            "simd",
            vec![
                CandidateOption::new(["-mavx2"]).suffix("avx2").build_if(false),
                CandidateOption::new(["-mavx"]).suffix("avx"),
                CandidateOption::generic(),
            ],
        )])
        .unwrap();
        assert_eq!(best_variant(&matrix).unwrap().name, "avx");
    }

    #[test]
    fn narrowed_modes_fail_when_compiler_supports_nothing() {
        let matrix = ArgumentMatrix::new(vec![OptionGroup::tiered(
            "simd",
            vec![CandidateOption::new(["-mavx"]).suffix("avx").build_if(false)],
        )])
        .unwrap();
        assert_eq!(expand(&matrix, ExpandMode::All).unwrap().len(), 1);
        assert!(matches!(
            expand(&matrix, ExpandMode::CurrentCompiler),
            Err(Error::IncompatibleCurrentCompiler { group }) if group == "simd"
        ));
        assert!(matches!(
            best_variant(&matrix),
            Err(Error::IncompatibleCurrentMachine { .. })
        ));
    }

    #[test]
    fn name_collision_is_fatal() {
        let matrix = ArgumentMatrix::new(vec![OptionGroup::tiered(
            "fpmath",
            vec![CandidateOption::new(["-mfpmath=387"]), CandidateOption::generic()],
        )])
        .unwrap();
        let err = expand(&matrix, ExpandMode::All).unwrap_err();
        assert!(matches!(
            err,
            Error::MatrixNameCollision { name, .. } if name.is_empty()
        ));
    }

    #[test]
    fn identical_duplicates_are_merged() {
        let matrix = ArgumentMatrix::new(vec![OptionGroup::tiered(
            "dup",
            vec![CandidateOption::generic(), CandidateOption::generic()],
        )])
        .unwrap();
        assert_eq!(expand(&matrix, ExpandMode::All).unwrap().len(), 1);
    }

    #[test]
    fn exclusive_group_rejects_overlapping_predicates() {
        let result = ArgumentMatrix::new(vec![OptionGroup::exclusive(
            "vendor",
            vec![
                CandidateOption::new(["-mtune=intel"]).suffix("intel"),
                CandidateOption::generic(),
            ],
        )]);
        assert!(matches!(result, Err(Error::InvalidMatrix { group, .. }) if group == "vendor"));
    }

    #[test]
    fn empty_suffix_rejected() {
        let result = ArgumentMatrix::new(vec![OptionGroup::tiered(
            "bad",
            vec![CandidateOption::new(["-x"]).suffix("")],
        )]);
        assert!(matches!(result, Err(Error::InvalidMatrix { .. })));
    }

    #[test]
    fn separator_in_suffix_rejected() {
        let result = ArgumentMatrix::new(vec![OptionGroup::tiered(
            "bad",
            vec![CandidateOption::new(["-x"]).suffix("a-b")],
        )]);
        assert!(matches!(result, Err(Error::InvalidMatrix { .. })));
    }

    #[test]
    fn empty_matrix_is_the_default_build() {
        let variants = expand(&ArgumentMatrix::default(), ExpandMode::All).unwrap();
        assert_eq!(variants.len(), 1);
        assert!(variants.first().unwrap().is_default());
    }

    #[test]
    fn retain_keeps_lookup_consistent() {
        let mut variants = expand(&arch1_matrix(), ExpandMode::All).unwrap();
        variants.retain(|v| !v.fragments().any(|f| f == "inst2"));
        assert_eq!(variants.len(), 2);
        assert!(!variants.contains("inst2-arch1"));
        assert_eq!(
            variants.get("arch1"),
            Some(flags(&["--generic", "--arch1"]).as_slice())
        );
    }

    #[test]
    fn serializes_in_insertion_order() {
        let variants = expand(&scenario(), ExpandMode::All).unwrap();
        let json = serde_json::to_string(&variants).unwrap();
        assert_eq!(json, r#"{"avx":["-O3","-mavx"],"":["-O3"]}"#);
    }
}
