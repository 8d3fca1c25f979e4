//! Populate typed configuration structs by dotted field path.
//!
//! Dotfig fills a struct you own from environment variables, config files and
//! raw byte buffers. Each source is applied in the order you give it, so the
//! last writer of a field wins and everything it doesn't touch keeps its value.
//!
//! ```ignore
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Settings {
//!     name: String,
//!     database: Option<Database>,
//! }
//! dotfig::record!(Settings { name, database });
//!
//! let mut settings = Settings::default();
//! Dotfig::builder()
//!     .file("/etc/app/config.json", FileMode::Optional)
//!     .environment([("database.url", "APP_DATABASE_URL")])
//!     .require(["database.url"])
//!     .apply(&mut settings)?;
//! ```
//!
//! # Registering types
//!
//! There is no runtime reflection, so a destination type lists its addressable
//! fields with [`record!`]. That generates a [`Record`] impl (look a field up by
//! name) and a [`Field`] impl (kind, zero value, structured merge). Every field
//! type listed must itself implement [`Field`]. The crate covers the std
//! scalars, `String`, `Option<T>`, `Vec<T>`, string-keyed maps,
//! `serde_json::Value`, paths, IP and socket addresses, and its own [`Duration`],
//! [`Timestamp`] and `Url`.
//!
//! Fields listed after `hidden` can be read by presence checks but never
//! assigned:
//!
//! ```ignore
//! dotfig::record!(Settings { name, database } hidden { token });
//! ```
//!
//! # Paths
//!
//! A path like `"database.pool.size"` is split on `.` and matched against
//! registered names exactly. Empty `Option` containers on the way down are
//! filled with their zero value before the walk continues, and stay filled even
//! if a later segment doesn't resolve. An `Option<Option<T>>` on the path is
//! always rejected. Paths never address elements inside sequences or maps.
//!
//! # Converting strings
//!
//! An environment value or [`set`](Config::set) override is a string. It is
//! converted into the target field by the first [`Strategy`] that applies:
//!
//! 1. `String` and `serde_json::Value` take the string as-is.
//! 2. `Url` (behind the default `url` feature) parses it through
//!    [`BinaryDecode`] and keeps the text as given.
//! 3. Types implementing [`TextDecode`] parse themselves.
//! 4. Anything else parses the string as JSON and merges it into the field,
//!    so `APP_PORT=8080`, `APP_TAGS=["a","b"]` and whole sub-records all work.
//!
//! A failure in the strategy that applied is final.
//!
//! # Files and data
//!
//! Files and buffers are decoded into a document and deep-merged over the whole
//! destination: objects merge into records key by key, `null` clears an
//! `Option` and leaves other fields alone, everything else replaces. Keys that
//! name hidden fields are dropped and reported as unknown. JSON is the default format. [`Toml`] and
//! `Yaml` (behind the `yaml` feature) plug in the same way, as does any
//! closure `Fn(&[u8]) -> Result<Value, DecodeError>`.
//!
//! A [`FileMode::Optional`] file that doesn't exist is skipped. A
//! [`FileMode::Required`] one is an error.
//!
//! Unknown document keys are logged and ignored. With
//! [`.strict(true)`](DotfigBuilder::strict) they fail the load instead.
//!
//! # Logging
//!
//! Dotfig emits [`tracing`] events and never installs a subscriber. Skipped
//! env keys and optional files are `debug`, chosen strategies are `trace`,
//! ignored unknown keys are `warn`.
//!
//! # Error handling
//!
//! All fallible operations return [`DotfigError`]. Every variant names the
//! field path, env key or file path involved. With the `rich-errors` feature
//! the error also implements `miette::Diagnostic`. See the [`error`] module for
//! the full set.

pub mod error;
pub mod types;

mod assign;
mod builder;
mod config;
mod decode;
mod env;
mod field;
mod file;
pub(crate) mod merge;
mod require;
mod resolve;

#[cfg(test)]
mod fixtures;

pub use assign::{BinaryDecode, Strategy, TextDecode, assign};
pub use builder::{Dotfig, DotfigBuilder};
pub use config::Config;
#[cfg(feature = "yaml")]
pub use decode::Yaml;
pub use decode::{Decoder, Json, Toml};
pub use env::{Environment, ProcessEnv};
pub use error::{AssignError, BoxError, DecodeError, DotfigError, ResolveError};
pub use field::{AsField, Field, Record};
pub use require::require;
pub use resolve::{FieldHandle, resolve};
#[cfg(feature = "url")]
pub use types::Url;
pub use types::{Duration, DurationError, FileMode, Kind, Timestamp};

#[doc(hidden)]
pub mod __private {
    pub use crate::merge::{drop_hidden, merge_into, prepare_field};
    pub use serde_json::{Error as JsonError, Value};
}
