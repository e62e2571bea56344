//! Output naming: sequential number allocation and rule-based stem edits.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::NamingConfig;
use crate::error::{ConfigError, PipelineError, PipelineResult};

/// Stem prefix of files that are waiting for their sequential number.
pub const STAGING_PREFIX: &str = ".tidyset-";

/// File name a worker writes before the rename pass assigns a number.
///
/// The stem is never numeric, so staged files never block allocation.
pub fn staging_name(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        format!("{STAGING_PREFIX}{stem}")
    } else {
        format!("{STAGING_PREFIX}{stem}.{extension}")
    }
}

pub fn is_staging(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(STAGING_PREFIX))
        .unwrap_or(false)
}

/// The first of `stem`, `stem_2`, `stem_3`, ... that `taken` does not claim.
pub fn free_stem(stem: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    let mut candidate = stem.to_string();
    let mut n = 2;
    while taken(&candidate) {
        candidate = format!("{stem}_{n}");
        n += 1;
    }
    candidate
}

/// Hands out the smallest free number at or above `start`.
///
/// Every call rescans the directory, so numbers taken by earlier renames
/// are always seen. Callers must not rename concurrently.
#[derive(Debug, Clone, Copy)]
pub struct NameAllocator {
    start: u64,
}

impl NameAllocator {
    pub fn new(start: u64) -> Self {
        Self { start }
    }

    /// Numbers currently used as a file stem in `dir`, whatever the extension.
    pub fn used_numbers(dir: &Path) -> PipelineResult<BTreeSet<u64>> {
        let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::DirectoryNotFound(dir.to_path_buf()),
            _ => PipelineError::io(dir, e),
        })?;

        let mut used = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
            let path = entry.path();
            if let Some(n) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                used.insert(n);
            }
        }
        Ok(used)
    }

    pub fn next_available(&self, dir: &Path) -> PipelineResult<u64> {
        let used = Self::used_numbers(dir)?;
        let mut candidate = self.start;
        // BTreeSet iterates in order, so one pass finds the first gap
        for n in used.range(self.start..) {
            if *n != candidate {
                break;
            }
            candidate += 1;
        }
        Ok(candidate)
    }
}

/// Stem edits applied in order: substitution, prefix, suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub replace: Option<(String, String)>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl RuleSet {
    pub fn apply(&self, stem: &str) -> String {
        let mut name = stem.to_string();
        if let Some((from, to)) = &self.replace {
            if !from.is_empty() {
                name = name.replace(from.as_str(), to);
            }
        }
        if let Some(prefix) = &self.prefix {
            name = format!("{prefix}{name}");
        }
        if let Some(suffix) = &self.suffix {
            name.push_str(suffix);
        }
        name
    }

    pub fn is_empty(&self) -> bool {
        self.replace.is_none() && self.prefix.is_none() && self.suffix.is_none()
    }
}

/// How the rename pass names its files. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingPolicy {
    Sequential { start: u64 },
    RuleBased(RuleSet),
}

impl NamingPolicy {
    /// Build the policy, rejecting numbering combined with any rule.
    pub fn from_config(config: &NamingConfig) -> Result<Self, ConfigError> {
        if config.numbering && config.has_rules() {
            return Err(ConfigError::ValidationError(
                "naming.numbering cannot be combined with prefix, suffix or replace".to_string(),
            ));
        }
        if config.numbering {
            return Ok(NamingPolicy::Sequential {
                start: config.start_number,
            });
        }

        let rules = RuleSet {
            replace: config
                .use_replace
                .then(|| (config.replace_from.clone(), config.replace_to.clone())),
            prefix: config.use_prefix.then(|| config.prefix.clone()),
            suffix: config.use_suffix.then(|| config.suffix.clone()),
        };
        Ok(NamingPolicy::RuleBased(rules))
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, NamingPolicy::Sequential { .. })
    }
}
