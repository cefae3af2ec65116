//! Source scanning for API pragmas.

use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, trace};
use walkdir::WalkDir;

use crate::config::{BuildConfig, Language};
use crate::error::{Error, Result};

/// Returns the APIs whose pragmas appear in any source under `paths`.
///
/// Each path may be a file or a directory (walked recursively). Files whose
/// extension matches no configured language are skipped. A line matches when,
/// after leading whitespace, it starts with a configured prefix, compared
/// case-insensitively.
///
/// # Errors
///
/// Returns [`Error::Io`] if a directory cannot be walked or a source file
/// cannot be read.
pub fn detect_apis<P: AsRef<Path>>(config: &BuildConfig, paths: &[P]) -> Result<BTreeSet<String>> {
    let mut found = BTreeSet::new();
    for root in paths {
        let root = root.as_ref();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(language) = config.language_of(entry.path()) else {
                continue;
            };
            let text = std::fs::read(entry.path()).map_err(|source| Error::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let before = found.len();
            scan(config, language, &String::from_utf8_lossy(&text), &mut found);
            if found.len() > before {
                trace!("{}: {found:?}", entry.path().display());
            }
        }
    }
    debug!("detected APIs {found:?}");
    Ok(found)
}

/// Adds every API whose pragma prefix starts a line of `text`.
pub fn scan(config: &BuildConfig, language: Language, text: &str, found: &mut BTreeSet<String>) {
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.trim_start().to_lowercase())
        .collect();
    for (api, prefixes) in &config.api {
        if found.contains(api) {
            continue;
        }
        let hit = prefixes.get(language).iter().any(|prefix| {
            let prefix = prefix.to_lowercase();
            lines.iter().any(|line| line.starts_with(&prefix))
        });
        if hit {
            found.insert(api.clone());
        }
    }
}
