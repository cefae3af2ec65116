//! Build configuration.
//!
//! Loaded from TOML. Every field is optional; a table present in the file
//! replaces the default table of the same name.
//!
//! ```toml
//! current_machine = false
//! suffixes_excludes = ["avx512"]
//!
//! [option]
//! fast_fpmath = true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::Variant;

/// Source language families scanned for API pragmas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C and C++.
    C,
    /// Fortran, fixed or free form.
    Fortran,
}

/// One string list per [`Language`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerLanguage {
    /// C and C++ entries.
    pub c: Vec<String>,
    /// Fortran entries.
    pub fortran: Vec<String>,
}

impl PerLanguage {
    fn of(c: &[&str], fortran: &[&str]) -> Self {
        Self {
            c: c.iter().map(|s| (*s).to_owned()).collect(),
            fortran: fortran.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Entries for `language`.
    #[must_use]
    pub fn get(&self, language: Language) -> &[String] {
        match language {
            Language::C => &self.c,
            Language::Fortran => &self.fortran,
        }
    }
}

/// Options for planning a multi-variant build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Plan a single build with no added flags.
    pub disabled: bool,
    /// Plan a single build tuned to the running machine.
    pub current_machine: bool,
    /// Code-generation options by name, enabled when `true`.
    pub option: BTreeMap<String, bool>,
    /// Pragma prefixes that auto-enable an API, by API name.
    pub api: BTreeMap<String, PerLanguage>,
    /// Source file extensions, including the leading dot.
    pub extensions: PerLanguage,
    /// When non-empty, only variants made of these suffix fragments are built.
    pub suffixes_includes: Vec<String>,
    /// Variants containing any of these suffix fragments are not built.
    pub suffixes_excludes: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let api = [
            (
                "openmp",
                PerLanguage::of(&["#pragma omp "], &["!$omp ", "c$omp ", "*$omp "]),
            ),
            (
                "openacc",
                PerLanguage::of(&["#pragma acc "], &["!$acc ", "c$acc ", "*$acc "]),
            ),
            ("cilkplus", PerLanguage::of(&["#pragma simd "], &["!dir$ simd "])),
        ];
        Self {
            disabled: false,
            current_machine: false,
            option: BTreeMap::from([("fast_fpmath".to_owned(), false)]),
            api: api.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
            extensions: PerLanguage::of(
                &[".c", ".cpp", ".cxx", ".cc", ".c++", ".cp"],
                &[".f", ".for", ".f90", ".f95", ".f03", ".f08", ".f15"],
            ),
            suffixes_includes: Vec::new(),
            suffixes_excludes: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Names of the options set to `true`.
    pub fn enabled_options(&self) -> impl Iterator<Item = &str> {
        self.option
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }

    /// Language of a source file, from its extension (case-insensitive).
    #[must_use]
    pub fn language_of(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let dotted = format!(".{ext}");
        [Language::C, Language::Fortran]
            .into_iter()
            .find(|&lang| self.extensions.get(lang).iter().any(|e| e.eq_ignore_ascii_case(&dotted)))
    }

    /// Returns true if `variant` passes the suffix filters.
    ///
    /// The default variant always passes.
    #[must_use]
    pub fn keeps_variant(&self, variant: &Variant) -> bool {
        if self.suffixes_includes.is_empty() {
            !variant
                .fragments()
                .any(|f| self.suffixes_excludes.iter().any(|e| e == f))
        } else {
            variant
                .fragments()
                .all(|f| self.suffixes_includes.iter().any(|i| i == f))
        }
    }
}
