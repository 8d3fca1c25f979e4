//! Incremental population of one borrowed destination.
//!
//! [`Config`] holds the destination for its whole lifetime. Each source method
//! applies immediately and returns `&mut Self`, so calls chain with `?`:
//!
//! ```ignore
//! let mut settings = Settings::default();
//! let mut config = Config::new(&mut settings)?;
//! config
//!     .file("/etc/app/config.toml", FileMode::Optional)?
//!     .environment([("database.url", "APP_DATABASE_URL")])?
//!     .require(["database.url"])?;
//! ```
//!
//! Sources can be applied any number of times in any order. Later calls
//! overwrite the fields they touch and leave the rest alone.

use std::path::Path;

use serde_json::Value;

use crate::assign::assign;
use crate::decode::{Decoder, Json};
use crate::env::{Environment, ProcessEnv, populate};
use crate::error::{DecodeError, DotfigError};
use crate::field::{Field, Record};
use crate::file::read_source;
use crate::require::require_all;
use crate::resolve::{FieldHandle, resolve};
use crate::types::FileMode;

pub struct Config<'a> {
    root: &'a mut dyn Record,
    env: Box<dyn Environment + 'a>,
    strict: bool,
}

impl<'a> Config<'a> {
    /// Borrow `target` for population. Fails unless `target` is a record.
    pub fn new(target: &'a mut dyn Field) -> Result<Self, DotfigError> {
        let type_name = target.type_name();
        let Some(root) = target.as_record_mut() else {
            return Err(DotfigError::NotARecord { type_name });
        };
        Ok(Self {
            root,
            env: Box::new(ProcessEnv),
            strict: false,
        })
    }

    /// Look environment keys up in `env` instead of the process environment.
    pub fn with_env_source(mut self, env: impl Environment + 'a) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Treat unknown keys in file and data documents as errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub(crate) fn set_env(&mut self, env: Box<dyn Environment + 'a>) {
        self.env = env;
    }

    /// Resolve `path` against the destination.
    pub fn resolve(&mut self, path: &str) -> Result<FieldHandle<'_>, DotfigError> {
        resolve(self.root, path).map_err(|source| DotfigError::Resolve {
            name: path.to_string(),
            source,
        })
    }

    /// Populate fields from `(field path, env key)` mappings, in order.
    pub fn environment<I, F, K>(&mut self, mappings: I) -> Result<&mut Self, DotfigError>
    where
        I: IntoIterator<Item = (F, K)>,
        F: AsRef<str>,
        K: AsRef<str>,
    {
        populate(self.root, &*self.env, mappings)?;
        Ok(self)
    }

    /// Populate one field from one environment key.
    pub fn getenv(&mut self, name: &str, key: &str) -> Result<&mut Self, DotfigError> {
        self.environment([(name, key)])
    }

    /// Assign `raw` to the field at `name`, converting it like an env value.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<&mut Self, DotfigError> {
        let handle = self.resolve(name)?;
        assign(handle, raw).map_err(|source| DotfigError::Override {
            name: name.to_string(),
            source,
        })?;
        Ok(self)
    }

    /// Merge a JSON document over the whole destination.
    pub fn data(&mut self, data: &[u8]) -> Result<&mut Self, DotfigError> {
        self.data_with(data, &Json)
    }

    /// Merge a document in any format over the whole destination.
    #[tracing::instrument(level = "debug", skip_all, fields(len = data.len()))]
    pub fn data_with(
        &mut self,
        data: &[u8],
        decoder: &dyn Decoder,
    ) -> Result<&mut Self, DotfigError> {
        let document = decoder
            .decode(data)
            .map_err(|source| DotfigError::Data { source })?;
        self.merge(document, "configuration data")
            .map_err(|source| match source {
                MergeError::Decode(source) => DotfigError::Data { source },
                MergeError::Config(e) => e,
            })?;
        Ok(self)
    }

    /// Read a JSON file and merge it over the whole destination.
    pub fn file(&mut self, path: impl AsRef<Path>, mode: FileMode) -> Result<&mut Self, DotfigError> {
        self.file_with(path, mode, &Json)
    }

    /// Read a file in any format and merge it over the whole destination.
    ///
    /// A missing [`FileMode::Optional`] file leaves the destination untouched.
    pub fn file_with(
        &mut self,
        path: impl AsRef<Path>,
        mode: FileMode,
        decoder: &dyn Decoder,
    ) -> Result<&mut Self, DotfigError> {
        self.load_file(path.as_ref(), mode, decoder)?;
        Ok(self)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display(), ?mode))]
    fn load_file(
        &mut self,
        path: &Path,
        mode: FileMode,
        decoder: &dyn Decoder,
    ) -> Result<(), DotfigError> {
        let Some(bytes) = read_source(path, mode)? else {
            return Ok(());
        };
        let parse_error = |source| DotfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let document = decoder.decode(&bytes).map_err(parse_error)?;
        self.merge(document, &path.display().to_string())
            .map_err(|source| match source {
                MergeError::Decode(source) => parse_error(source),
                MergeError::Config(e) => e,
            })
    }

    /// Check that every named field has been populated.
    pub fn require<I, S>(&mut self, names: I) -> Result<&mut Self, DotfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        require_all(self.root, names)?;
        Ok(self)
    }

    /// Merge `document` into the root, then deal with the keys it didn't use.
    ///
    /// In strict mode the known keys are already applied when the unknown-key
    /// error is returned.
    fn merge(&mut self, document: Value, origin: &str) -> Result<(), MergeError> {
        let mut unknown = Vec::new();
        self.root
            .merge_document(document, &mut unknown)
            .map_err(|e| MergeError::Decode(DecodeError::Mismatch(e)))?;

        if unknown.is_empty() {
            return Ok(());
        }
        if self.strict {
            return Err(MergeError::Config(DotfigError::UnknownKeys {
                origin: origin.to_string(),
                keys: unknown,
            }));
        }
        for key in &unknown {
            tracing::warn!(%key, origin, "ignored unknown configuration key");
        }
        Ok(())
    }
}

enum MergeError {
    Decode(DecodeError),
    Config(DotfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Toml;
    use crate::error::{AssignError, ResolveError};
    use crate::fixtures::test::{Nest, TestConfig, env, with_defaults};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn rejects_non_record_target() {
        let mut target = String::new();
        assert_matches!(
            Config::new(&mut target).err(),
            Some(DotfigError::NotARecord { type_name }) if type_name.contains("String")
        );
    }

    #[test]
    fn rejects_optional_target() {
        let mut target: Option<TestConfig> = None;
        assert!(Config::new(&mut target).is_err());
    }

    #[test]
    fn unset_env_keeps_default() {
        let mut target = with_defaults();
        Config::new(&mut target)
            .unwrap()
            .with_env_source(env(&[]))
            .environment([("text", "__TEST_MISSING_ENV_VAR")])
            .unwrap();
        assert_eq!(target.text, "default");
    }

    #[test]
    fn getenv_single_mapping() {
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .with_env_source(env(&[("APP_PORT", "3000")]))
            .getenv("port", "APP_PORT")
            .unwrap();
        assert_eq!(target.port, 3000);
    }

    #[test]
    fn data_sets_text() {
        let mut target = with_defaults();
        Config::new(&mut target)
            .unwrap()
            .data(br#"{"text":"hello"}"#)
            .unwrap();
        assert_eq!(target.text, "hello");
        assert_eq!(target.port, 8080);
    }

    #[test]
    fn data_merges_into_existing_nested_values() {
        let mut target = TestConfig {
            birdie: Some(Nest {
                value: 12,
                ..Nest::default()
            }),
            ..TestConfig::default()
        };
        Config::new(&mut target)
            .unwrap()
            .data(br#"{"birdie":{"complex_env":42}}"#)
            .unwrap();
        let birdie = target.birdie.unwrap();
        assert_eq!(birdie.value, 12);
        assert_eq!(birdie.complex_env, 42);
    }

    #[test]
    fn malformed_data_is_data_error_and_leaves_root() {
        let mut target = with_defaults();
        let err = Config::new(&mut target).unwrap().data(b"{text").err().unwrap();
        assert_matches!(err, DotfigError::Data { source: DecodeError::Json(_) });
        assert_eq!(target, with_defaults());
    }

    #[test]
    fn mismatched_data_leaves_root_untouched() {
        let mut target = with_defaults();
        let err = Config::new(&mut target)
            .unwrap()
            .data(br#"{"text":"hello","port":"http"}"#)
            .err()
            .unwrap();
        assert_matches!(err, DotfigError::Data { source: DecodeError::Mismatch(_) });
        assert_eq!(target.text, "default");
    }

    #[test]
    fn unknown_keys_are_ignored_by_default() {
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .data(br#"{"name":"app","typo":1}"#)
            .unwrap();
        assert_eq!(target.name, "app");
    }

    #[test]
    fn unknown_keys_fail_in_strict_mode() {
        let mut target = TestConfig::default();
        let err = Config::new(&mut target)
            .unwrap()
            .strict(true)
            .data(br#"{"name":"app","typo":1}"#)
            .err()
            .unwrap();
        assert_matches!(
            err,
            DotfigError::UnknownKeys { ref keys, .. } if keys == &["typo".to_string()]
        );
    }

    #[test]
    fn data_cannot_write_hidden_fields() {
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .data(br#"{"secret":"leaked","birdie":{"note":"leaked","name":"Heron"}}"#)
            .unwrap();
        assert!(target.secret.is_empty());
        let birdie = target.birdie.unwrap();
        assert!(birdie.note.is_empty());
        assert_eq!(birdie.name, "Heron");
    }

    #[test]
    fn hidden_keys_are_unknown_in_strict_mode() {
        let mut target = TestConfig::default();
        let err = Config::new(&mut target)
            .unwrap()
            .strict(true)
            .data(br#"{"secret":"leaked"}"#)
            .err()
            .unwrap();
        assert_matches!(
            err,
            DotfigError::UnknownKeys { ref keys, .. } if keys == &["secret".to_string()]
        );
        assert!(target.secret.is_empty());
    }

    #[test]
    fn null_in_data_keeps_plain_fields() {
        let mut target = with_defaults();
        Config::new(&mut target)
            .unwrap()
            .data(br#"{"port":null,"text":"x"}"#)
            .unwrap();
        assert_eq!(target.port, 8080);
        assert_eq!(target.text, "x");
    }

    #[test]
    fn null_in_data_clears_options() {
        let mut target = TestConfig {
            birdie: Some(Nest::default()),
            ..TestConfig::default()
        };
        Config::new(&mut target)
            .unwrap()
            .data(br#"{"birdie":null}"#)
            .unwrap();
        assert!(target.birdie.is_none());
    }

    #[test]
    fn set_null_clears_option() {
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .set("birdie.value", "12")
            .unwrap()
            .set("birdie", "null")
            .unwrap();
        assert!(target.birdie.is_none());
    }

    #[cfg(feature = "url")]
    #[test]
    fn set_url_keeps_input_text() {
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .set("url", "https://example.com")
            .unwrap();
        assert_eq!(target.url.unwrap().as_str(), "https://example.com");
    }

    #[test]
    fn optional_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut target = with_defaults();
        Config::new(&mut target)
            .unwrap()
            .file(dir.path().join("absent.json"), FileMode::Optional)
            .unwrap();
        assert_eq!(target, with_defaults());
    }

    #[test]
    fn required_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let mut target = TestConfig::default();
        let err = Config::new(&mut target)
            .unwrap()
            .file(dir.path().join("absent.json"), FileMode::Required)
            .err()
            .unwrap();
        assert_matches!(err, DotfigError::MissingFile { .. });
    }

    #[test]
    fn json_file_populates() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"birdie":{"name":"Heron"},"port":9000}"#);
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .file(&path, FileMode::Required)
            .unwrap();
        assert_eq!(target.birdie.unwrap().name, "Heron");
        assert_eq!(target.port, 9000);
    }

    #[test]
    fn toml_file_populates() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "app.toml",
            "text = \"from toml\"\n\n[nested]\nvalue = \"deep\"\ncount = 3\n",
        );
        let mut target = with_defaults();
        Config::new(&mut target)
            .unwrap()
            .file_with(&path, FileMode::Required, &Toml)
            .unwrap();
        assert_eq!(target.text, "from toml");
        assert_eq!(target.nested.value, "deep");
        assert_eq!(target.nested.count, 3);
        assert_eq!(target.port, 8080);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.json", "{not json");
        let mut target = TestConfig::default();
        let err = Config::new(&mut target)
            .unwrap()
            .file(&path, FileMode::Optional)
            .err()
            .unwrap();
        assert_matches!(err, DotfigError::Parse { path: ref p, .. } if *p == path);
    }

    #[test]
    fn set_overrides_one_field() {
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .set("birdie.inner.level", "4")
            .unwrap();
        assert_eq!(target.birdie.unwrap().inner.unwrap().level, 4);
    }

    #[test]
    fn set_on_hidden_field_fails() {
        let mut target = TestConfig::default();
        let err = Config::new(&mut target)
            .unwrap()
            .set("secret", "hunter2")
            .err()
            .unwrap();
        assert_matches!(
            err,
            DotfigError::Override { ref name, source: AssignError::NotSettable } if name == "secret"
        );
    }

    #[test]
    fn resolve_reports_the_path() {
        let mut target = TestConfig::default();
        let mut config = Config::new(&mut target).unwrap();
        let err = config.resolve("birdie.nope").err().unwrap();
        assert_matches!(
            err,
            DotfigError::Resolve { ref name, source: ResolveError::UnknownField { .. } }
                if name == "birdie.nope"
        );
    }

    #[test]
    fn sources_layer_in_call_order() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"name":"from-file","port":9000}"#);
        let mut target = TestConfig::default();
        Config::new(&mut target)
            .unwrap()
            .with_env_source(env(&[("APP_NAME", "from-env")]))
            .file(&path, FileMode::Required)
            .unwrap()
            .environment([("name", "APP_NAME")])
            .unwrap()
            .data(br#"{"port":9100}"#)
            .unwrap();
        assert_eq!(target.name, "from-env");
        assert_eq!(target.port, 9100);
    }

    #[test]
    fn birdie_walkthrough() {
        let mut target = with_defaults();
        let vars = env(&[
            ("APP_BIRD", "12"),
            ("DUMB_USAGE", r#"{"complex_env":42}"#),
            ("FUBAR", "foo"),
        ]);
        Config::new(&mut target)
            .unwrap()
            .with_env_source(vars)
            .environment([
                ("text", "__TEST_MISSING_ENV_VAR"),
                ("birdie.value", "APP_BIRD"),
                ("birdie", "DUMB_USAGE"),
                ("any", "FUBAR"),
            ])
            .unwrap()
            .require(["text", "birdie", "birdie.value"])
            .unwrap();

        assert_eq!(target.text, "default");
        assert_eq!(target.any, serde_json::json!("foo"));
        let birdie = target.birdie.unwrap();
        assert_eq!(birdie.value, 12);
        assert_eq!(birdie.complex_env, 42);
    }

    #[test]
    fn require_reports_first_missing() {
        let mut target = TestConfig::default();
        let err = Config::new(&mut target)
            .unwrap()
            .require(["nested"])
            .err()
            .unwrap();
        assert_matches!(err, DotfigError::Empty { ref name } if name == "nested");
    }
}
