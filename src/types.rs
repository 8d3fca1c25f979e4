use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::assign::TextDecode;
#[cfg(feature = "url")]
use crate::assign::BinaryDecode;
use crate::error::BoxError;
#[cfg(feature = "url")]
use crate::field::Field;
#[cfg(feature = "url")]
use crate::merge::merge_into;

/// How a missing configuration file is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileMode {
    /// A missing file is an error.
    #[default]
    Required,
    /// A missing file is skipped without touching the target.
    Optional,
}

/// Coarse shape of a field's declared type, as seen by the resolver and the
/// presence checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A type registered with [`record!`](crate::record).
    Record,
    /// `Option<T>`.
    Optional,
    Bool,
    Integer,
    Float,
    String,
    /// `serde_json::Value`, which accepts any document.
    Any,
    Sequence,
    Map,
    /// Anything else: addresses, paths, URLs, durations, user types.
    Scalar,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Record => "record",
            Kind::Optional => "optional",
            Kind::Bool => "bool",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Any => "any",
            Kind::Sequence => "sequence",
            Kind::Map => "map",
            Kind::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// A span of time written as a sequence of decimal numbers with unit suffixes:
/// `"300ms"`, `"1.5h"`, `"2h45m"`. Units are `ns`, `us` (or `µs`), `ms`, `s`,
/// `m` and `h`. A bare `"0"` is zero. A leading `+` is accepted; negative spans
/// other than zero are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(pub std::time::Duration);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid number in duration '{0}'")]
    InvalidNumber(String),
    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),
    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },
    #[error("duration '{0}' overflows")]
    Overflow(String),
    #[error("negative duration '{0}'")]
    Negative(String),
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

impl Duration {
    pub fn parse(input: &str) -> Result<Self, DurationError> {
        let (negative, unsigned) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };
        if unsigned.is_empty() {
            return Err(DurationError::Empty);
        }
        if unsigned == "0" {
            return Ok(Self::default());
        }

        let mut total: u128 = 0;
        let mut rest = unsigned;
        while !rest.is_empty() {
            let number_end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| DurationError::MissingUnit(input.to_string()))?;
            let (number, tail) = rest.split_at(number_end);
            let unit_end = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, next) = tail.split_at(unit_end);

            let scale = unit_scale(unit).ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;
            let nanos = scaled_nanos(number, scale)
                .ok_or_else(|| DurationError::InvalidNumber(input.to_string()))?;
            total = total
                .checked_add(nanos)
                .ok_or_else(|| DurationError::Overflow(input.to_string()))?;
            rest = next;
        }
        if negative && total != 0 {
            return Err(DurationError::Negative(input.to_string()));
        }

        let secs = u64::try_from(total / NANOS_PER_SEC)
            .map_err(|_| DurationError::Overflow(input.to_string()))?;
        // Always < 1e9, fits in u32.
        let nanos = (total % NANOS_PER_SEC) as u32;
        Ok(Self(std::time::Duration::new(secs, nanos)))
    }
}

fn unit_scale(unit: &str) -> Option<u128> {
    let scale = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(scale)
}

/// `number * scale`, where `number` may carry a fractional part. Digits beyond
/// nanosecond precision are dropped.
fn scaled_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    let mut place = scale;
    for digit in frac.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        nanos = nanos.checked_add(u128::from(digit.to_digit(10)?) * place)?;
    }
    Some(nanos)
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let nanos = self.0.subsec_nanos();
        if nanos == 0 {
            return write!(f, "{secs}s");
        }
        let frac = format!("{nanos:09}");
        write!(f, "{secs}.{}s", frac.trim_end_matches('0'))
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Self(value)
    }
}

impl TextDecode for Duration {
    fn decode_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        *self = std::str::from_utf8(text)?.parse()?;
        Ok(())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

crate::text_field!(Duration);

/// A point in time written in RFC 3339 (`"2024-05-01T12:00:00Z"`). Zero is the
/// Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Default for Timestamp {
    fn default() -> Self {
        Self(OffsetDateTime::UNIX_EPOCH)
    }
}

impl Deref for Timestamp {
    type Target = OffsetDateTime;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Timestamp {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OffsetDateTime::parse(s, &Rfc3339).map(Self)
    }
}

impl TextDecode for Timestamp {
    fn decode_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        *self = std::str::from_utf8(text)?.parse()?;
        Ok(())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.0.format(&Rfc3339).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

crate::text_field!(Timestamp);

/// A URL that keeps the text it was parsed from.
///
/// The text is validated by [`url::Url`] but reported back as given, so
/// `"https://example.com"` stays `"https://example.com"` instead of gaining a
/// trailing slash. Zero is `about:blank`. Everything else derefs to the parsed
/// [`url::Url`].
#[cfg(feature = "url")]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Url {
    text: String,
    parsed: url::Url,
}

#[cfg(feature = "url")]
impl Url {
    const BLANK: &'static str = "about:blank";

    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            parsed: url::Url::parse(input)?,
            text: input.to_string(),
        })
    }

    /// The text this URL was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_url(&self) -> &url::Url {
        &self.parsed
    }
}

#[cfg(feature = "url")]
impl Default for Url {
    fn default() -> Self {
        Self {
            text: Self::BLANK.to_string(),
            parsed: url::Url::parse(Self::BLANK).expect("about:blank is a valid URL"),
        }
    }
}

#[cfg(feature = "url")]
impl Deref for Url {
    type Target = url::Url;

    fn deref(&self) -> &Self::Target {
        &self.parsed
    }
}

#[cfg(feature = "url")]
impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(feature = "url")]
impl FromStr for Url {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "url")]
impl From<url::Url> for Url {
    fn from(parsed: url::Url) -> Self {
        Self {
            text: parsed.as_str().to_string(),
            parsed,
        }
    }
}

#[cfg(feature = "url")]
impl BinaryDecode for Url {
    fn decode_binary(&mut self, data: &[u8]) -> Result<(), BoxError> {
        *self = std::str::from_utf8(data)?.parse()?;
        Ok(())
    }
}

#[cfg(feature = "url")]
impl Serialize for Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(feature = "url")]
impl<'de> Deserialize<'de> for Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(feature = "url")]
impl Field for Url {
    fn shape() -> Kind {
        Kind::Scalar
    }

    fn zeroed() -> Self {
        Self::default()
    }

    fn is_zero(&self) -> bool {
        self.text == Self::BLANK
    }

    fn merge_document(
        &mut self,
        document: serde_json::Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        merge_into(self, document, unknown)
    }

    fn as_binary_decoder(&mut self) -> Option<&mut dyn BinaryDecode> {
        Some(self)
    }
}
