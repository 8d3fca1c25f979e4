//! Value assignment: convert a raw string into a resolved field.
//!
//! Conversion runs through a fixed chain of [`Strategy`] variants. The first
//! strategy that applies to the target type decides the outcome; a failure there
//! is final and no later strategy is tried.
//!
//! 1. [`Direct`](Strategy::Direct): string-holding types store the value as-is.
//! 2. [`Binary`](Strategy::Binary): well-known types with a binary decoder
//!    ([`Url`](crate::types::Url)).
//! 3. [`Text`](Strategy::Text): types implementing [`TextDecode`].
//! 4. [`Structured`](Strategy::Structured): parse the value as JSON and merge it
//!    into the target. Numbers, booleans, lists, maps and whole records land here.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{AssignError, BoxError};
use crate::field::Field;
use crate::resolve::FieldHandle;

/// Decode a value from its raw binary form, replacing the current value.
///
/// Reserved for well-known types that predate [`TextDecode`]; prefer that for
/// new types.
pub trait BinaryDecode {
    fn decode_binary(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// Decode a value from text, replacing the current value.
pub trait TextDecode {
    fn decode_text(&mut self, text: &[u8]) -> Result<(), BoxError>;
}

/// One conversion path from a raw string into a typed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Binary,
    Text,
    Structured,
}

impl Strategy {
    /// The chain, in priority order.
    pub const CHAIN: [Strategy; 4] = [
        Strategy::Direct,
        Strategy::Binary,
        Strategy::Text,
        Strategy::Structured,
    ];

    /// Try this strategy on the materialized target. `None` means it doesn't
    /// apply. [`Structured`](Strategy::Structured) always applies and runs
    /// against the declared field instead, see [`assign`].
    fn attempt(self, target: &mut dyn Field, raw: &str) -> Option<Result<(), AssignError>> {
        match self {
            Strategy::Direct => target.assign_direct(raw).then_some(Ok(())),
            Strategy::Binary => target.as_binary_decoder().map(|decoder| {
                decoder
                    .decode_binary(raw.as_bytes())
                    .map_err(|source| AssignError::Binary { source })
            }),
            Strategy::Text => target.as_text_decoder().map(|decoder| {
                decoder
                    .decode_text(raw.as_bytes())
                    .map_err(|source| AssignError::Text { source })
            }),
            Strategy::Structured => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Direct => "direct",
            Strategy::Binary => "binary",
            Strategy::Text => "text",
            Strategy::Structured => "structured",
        };
        f.write_str(name)
    }
}

fn decode_structured(target: &mut dyn Field, raw: &str) -> Result<(), AssignError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|source| AssignError::Structured { source })?;
    let mut unknown = Vec::new();
    target
        .merge_document(document, &mut unknown)
        .map_err(|source| AssignError::Structured { source })?;
    for key in unknown {
        tracing::warn!(%key, "ignored unknown key in structured value");
    }
    Ok(())
}

/// Convert `raw` into the field behind `handle`.
///
/// An empty `Option` at the end of the path is materialized first, so the
/// conversion always has a target. A structured value is merged into the
/// declared field, so `null` clears an `Option` and leaves anything else as it
/// was. Returns the strategy that did the work.
pub fn assign(handle: FieldHandle<'_>, raw: &str) -> Result<Strategy, AssignError> {
    if !handle.is_settable() {
        return Err(AssignError::NotSettable);
    }
    let (field, segment) = handle.into_parts();
    let target = field.materialize(&segment)?;

    let converted = Strategy::CHAIN
        .into_iter()
        .find_map(|strategy| strategy.attempt(target, raw).map(|result| (strategy, result)));
    let strategy = match converted {
        Some((strategy, result)) => {
            result?;
            strategy
        }
        None => {
            decode_structured(field, raw)?;
            Strategy::Structured
        }
    };
    tracing::trace!(field = %segment, %strategy, "assigned value");
    Ok(strategy)
}

macro_rules! text_from_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TextDecode for $ty {
                fn decode_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
                    *self = std::str::from_utf8(text)?.parse()?;
                    Ok(())
                }
            }
        )+
    };
}

text_from_str!(PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

crate::text_field!(PathBuf);
crate::text_field!(IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED));
crate::text_field!(Ipv4Addr = Ipv4Addr::UNSPECIFIED);
crate::text_field!(Ipv6Addr = Ipv6Addr::UNSPECIFIED);
crate::text_field!(SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0));
