//! Environment population: copy environment variables into mapped fields.
//!
//! Each mapping pairs a dotted field path with an environment key. Mappings run
//! in the order given. The path is always resolved first, so a typo in a field
//! name is reported even when the variable is unset. An unset variable is
//! skipped and leaves the field as it was.
//!
//! Lookup goes through the [`Environment`] trait so tests and embedders can pass
//! a plain map instead of the process environment.

use std::collections::{BTreeMap, HashMap};
use std::env::VarError;

use crate::assign::assign;
use crate::error::DotfigError;
use crate::field::Record;
use crate::resolve::resolve;

/// Source of environment values.
pub trait Environment {
    /// `Ok(None)` when `key` is unset.
    fn lookup(&self, key: &str) -> Result<Option<String>, DotfigError>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn lookup(&self, key: &str) -> Result<Option<String>, DotfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(DotfigError::NonUnicodeEnv {
                key: key.to_string(),
            }),
        }
    }
}

impl Environment for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Result<Option<String>, DotfigError> {
        Ok(self.get(key).cloned())
    }
}

impl Environment for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Result<Option<String>, DotfigError> {
        Ok(self.get(key).cloned())
    }
}

/// Apply `(field path, env key)` mappings to `root`.
///
/// Returns the number of fields that were assigned.
pub fn populate<I, F, K>(
    root: &mut dyn Record,
    env: &dyn Environment,
    mappings: I,
) -> Result<usize, DotfigError>
where
    I: IntoIterator<Item = (F, K)>,
    F: AsRef<str>,
    K: AsRef<str>,
{
    let mut assigned = 0;
    for (name, key) in mappings {
        let (name, key) = (name.as_ref(), key.as_ref());

        let handle = resolve(root, name).map_err(|source| DotfigError::Resolve {
            name: name.to_string(),
            source,
        })?;

        let Some(value) = env.lookup(key)? else {
            tracing::debug!(field = name, env = key, "environment variable not set, skipping");
            continue;
        };

        assign(handle, &value).map_err(|source| DotfigError::Assign {
            key: key.to_string(),
            name: name.to_string(),
            source,
        })?;
        assigned += 1;
    }
    Ok(assigned)
}
