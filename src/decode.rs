//! Format plugins: turn raw bytes into a document that merges into the target.
//!
//! Decoders never see the target type. They produce a `serde_json::Value`, and
//! the merge step (see [`merge`](crate::merge)) lays it over the current value.
//! JSON is the default; TOML and YAML plug in the same way, as does any closure
//! with the right signature.

use serde_json::Value;

use crate::error::DecodeError;

/// Decode raw bytes into a document.
pub trait Decoder {
    fn decode(&self, data: &[u8]) -> Result<Value, DecodeError>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8]) -> Result<Value, DecodeError>,
{
    fn decode(&self, data: &[u8]) -> Result<Value, DecodeError> {
        self(data)
    }
}

/// JSON documents. The default decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Decoder for Json {
    fn decode(&self, data: &[u8]) -> Result<Value, DecodeError> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// TOML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

impl Decoder for Toml {
    fn decode(&self, data: &[u8]) -> Result<Value, DecodeError> {
        let text = std::str::from_utf8(data)?;
        Ok(toml::from_str(text)?)
    }
}

/// YAML documents.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

#[cfg(feature = "yaml")]
impl Decoder for Yaml {
    fn decode(&self, data: &[u8]) -> Result<Value, DecodeError> {
        Ok(serde_yaml::from_slice(data)?)
    }
}
