//! Presence checks: fail when a field still holds its zero value.

use crate::error::DotfigError;
use crate::field::Record;
use crate::resolve::resolve;
use crate::types::Kind;

/// Check that the field at `name` has been populated.
///
/// An `Option` is present when it is `Some`, whatever it holds. A `bool` always
/// counts as present, since `false` is a legitimate setting. Everything else,
/// records included, must differ from its zero value.
///
/// Resolution materializes intermediates exactly as population does.
pub fn require(root: &mut dyn Record, name: &str) -> Result<(), DotfigError> {
    let handle = resolve(root, name).map_err(|source| DotfigError::Resolve {
        name: name.to_string(),
        source,
    })?;

    let field = handle.field();
    match field.kind() {
        Kind::Optional if field.is_zero() => Err(DotfigError::Missing {
            name: name.to_string(),
        }),
        Kind::Optional | Kind::Bool => Ok(()),
        _ if field.is_zero() => Err(DotfigError::Empty {
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Check every name in order, stopping at the first failure.
pub fn require_all<I, S>(root: &mut dyn Record, names: I) -> Result<(), DotfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for name in names {
        require(root, name.as_ref())?;
    }
    Ok(())
}
