use std::path::PathBuf;

use crate::config::Config;
use crate::decode::{Decoder, Json};
use crate::env::Environment;
use crate::error::DotfigError;
use crate::field::Field;
use crate::types::FileMode;

/// Entry point for building a dotfig population pass.
pub struct Dotfig;

impl Dotfig {
    pub fn builder() -> DotfigBuilder {
        DotfigBuilder::new()
    }
}

/// One recorded source, applied by [`DotfigBuilder::load`] in insertion order.
enum Step {
    Environment(Vec<(String, String)>),
    Set { name: String, raw: String },
    File {
        path: PathBuf,
        mode: FileMode,
        decoder: Box<dyn Decoder>,
    },
    Data {
        data: Vec<u8>,
        decoder: Box<dyn Decoder>,
    },
    Require(Vec<String>),
}

/// Builder for an ordered list of population steps.
///
/// Steps run in the order they were added, so later steps overwrite fields that
/// earlier ones set:
///
/// ```ignore
/// let mut settings = Settings::default();
/// Dotfig::builder()
///     .file("/etc/app/config.json", FileMode::Optional)
///     .environment([("database.url", "APP_DATABASE_URL")])
///     .require(["database.url"])
///     .apply(&mut settings)?;
/// ```
///
/// Nothing is read until [`load`](Self::load) or [`apply`](Self::apply).
pub struct DotfigBuilder {
    steps: Vec<Step>,
    env: Option<Box<dyn Environment>>,
    strict: bool,
}

impl DotfigBuilder {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            env: None,
            strict: false,
        }
    }

    /// Populate fields from `(field path, env key)` mappings.
    pub fn environment<I, F, K>(mut self, mappings: I) -> Self
    where
        I: IntoIterator<Item = (F, K)>,
        F: Into<String>,
        K: Into<String>,
    {
        let mappings = mappings
            .into_iter()
            .map(|(name, key)| (name.into(), key.into()))
            .collect();
        self.steps.push(Step::Environment(mappings));
        self
    }

    /// Populate one field from one environment key.
    pub fn getenv(self, name: &str, key: &str) -> Self {
        self.environment([(name, key)])
    }

    /// Assign a raw value to one field, converting it like an env value.
    pub fn set(mut self, name: &str, raw: &str) -> Self {
        self.steps.push(Step::Set {
            name: name.to_string(),
            raw: raw.to_string(),
        });
        self
    }

    /// Merge a JSON file over the destination.
    pub fn file(self, path: impl Into<PathBuf>, mode: FileMode) -> Self {
        self.file_with(path, mode, Json)
    }

    /// Merge a file in any format over the destination.
    pub fn file_with(
        mut self,
        path: impl Into<PathBuf>,
        mode: FileMode,
        decoder: impl Decoder + 'static,
    ) -> Self {
        self.steps.push(Step::File {
            path: path.into(),
            mode,
            decoder: Box::new(decoder),
        });
        self
    }

    /// Merge a JSON buffer over the destination.
    pub fn data(self, data: impl Into<Vec<u8>>) -> Self {
        self.data_with(data, Json)
    }

    /// Merge a buffer in any format over the destination.
    pub fn data_with(mut self, data: impl Into<Vec<u8>>, decoder: impl Decoder + 'static) -> Self {
        self.steps.push(Step::Data {
            data: data.into(),
            decoder: Box::new(decoder),
        });
        self
    }

    /// Fail the load unless every named field has been populated by the steps
    /// before this one.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps
            .push(Step::Require(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Look environment keys up in `env` instead of the process environment.
    pub fn env_source(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    /// Enable or disable strict mode (default: `false`).
    /// In strict mode, unknown keys in files and data buffers produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Run every step against `target` and hand back the [`Config`] for further
    /// incremental population.
    ///
    /// The first failing step aborts the load. Fields written by earlier steps
    /// keep their new values.
    pub fn load(self, target: &mut dyn Field) -> Result<Config<'_>, DotfigError> {
        let mut config = Config::new(target)?.strict(self.strict);
        if let Some(env) = self.env {
            config.set_env(env);
        }

        for step in self.steps {
            match step {
                Step::Environment(mappings) => {
                    config.environment(mappings)?;
                }
                Step::Set { name, raw } => {
                    config.set(&name, &raw)?;
                }
                Step::File {
                    path,
                    mode,
                    decoder,
                } => {
                    config.file_with(&path, mode, decoder.as_ref())?;
                }
                Step::Data { data, decoder } => {
                    config.data_with(&data, decoder.as_ref())?;
                }
                Step::Require(names) => {
                    config.require(names)?;
                }
            }
        }
        Ok(config)
    }

    /// Run every step against `target`.
    pub fn apply(self, target: &mut dyn Field) -> Result<(), DotfigError> {
        self.load(target).map(drop)
    }
}
