//! Path resolution: walk a dotted name down the destination graph.
//!
//! `"birdie.inner.level"` is split on `.` and each segment is looked up by exact
//! name in the current record. Every segment except the last is materialized on
//! the way down, so an empty `Option<Nest>` becomes `Some(Nest::default())`
//! before the walk continues into it. That allocation stays in the destination
//! even if a later segment fails to resolve.
//!
//! The terminal field is returned untouched; the assigner materializes it only
//! when it is about to write.

use crate::error::ResolveError;
use crate::field::{Field, Record};
use crate::types::Kind;

/// A mutable reference to one field, produced by [`resolve`].
pub struct FieldHandle<'a> {
    field: &'a mut dyn Field,
    segment: String,
    settable: bool,
}

impl<'a> FieldHandle<'a> {
    pub fn field(&self) -> &dyn Field {
        &*self.field
    }

    pub fn field_mut(&mut self) -> &mut dyn Field {
        &mut *self.field
    }

    pub fn kind(&self) -> Kind {
        self.field.kind()
    }

    /// The last segment of the resolved path.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// `false` when any segment on the path is a hidden field.
    pub fn is_settable(&self) -> bool {
        self.settable
    }

    pub fn into_parts(self) -> (&'a mut dyn Field, String) {
        (self.field, self.segment)
    }
}

/// Resolve `path` against `root`.
pub fn resolve<'a>(root: &'a mut dyn Record, path: &str) -> Result<FieldHandle<'a>, ResolveError> {
    if path.is_empty() {
        return Err(ResolveError::EmptyPath);
    }

    let segments: Vec<&str> = path.split('.').collect();
    let last = segments.len() - 1;

    let mut current: &'a mut dyn Field = root.as_field_mut();
    let mut settable = true;

    for (i, segment) in segments.iter().enumerate() {
        let kind = current.kind();
        let Some(record) = current.as_record_mut() else {
            return Err(ResolveError::NotAStruct {
                segment: segment.to_string(),
                kind,
            });
        };

        let container = record.record_name();
        settable &= record.is_exported(segment);

        let Some(field) = record.field_mut(segment) else {
            return Err(ResolveError::UnknownField {
                container,
                segment: segment.to_string(),
            });
        };

        current = if i < last {
            field.materialize(segment)?
        } else {
            field
        };
    }

    Ok(FieldHandle {
        field: current,
        segment: segments[last].to_string(),
        settable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Inner, Nest, TestConfig};
    use assert_matches::assert_matches;

    #[test]
    fn top_level_field() {
        let mut config = TestConfig::default();
        let handle = resolve(&mut config, "name").unwrap();
        assert_eq!(handle.kind(), Kind::String);
        assert_eq!(handle.segment(), "name");
        assert!(handle.is_settable());
    }

    #[test]
    fn nested_field_in_plain_record() {
        let mut config = TestConfig::default();
        let handle = resolve(&mut config, "nested.value").unwrap();
        assert_eq!(handle.kind(), Kind::String);
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut config = TestConfig::default();
        assert_matches!(resolve(&mut config, "").err(), Some(ResolveError::EmptyPath));
    }

    #[test]
    fn unknown_top_level_field() {
        let mut config = TestConfig::default();
        let err = resolve(&mut config, "nope").err().unwrap();
        assert_matches!(
            err,
            ResolveError::UnknownField { container: "TestConfig", ref segment } if segment == "nope"
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut config = TestConfig::default();
        assert!(resolve(&mut config, "Name").is_err());
    }

    #[test]
    fn unknown_nested_field_names_the_container() {
        let mut config = TestConfig::default();
        let err = resolve(&mut config, "birdie.nope").err().unwrap();
        assert_matches!(
            err,
            ResolveError::UnknownField { container: "Nest", ref segment } if segment == "nope"
        );
    }

    #[test]
    fn intermediate_option_is_materialized() {
        let mut config = TestConfig::default();
        resolve(&mut config, "birdie.value").unwrap();
        assert_eq!(config.birdie, Some(Nest::default()));
    }

    #[test]
    fn materialization_persists_after_later_failure() {
        let mut config = TestConfig::default();
        assert!(resolve(&mut config, "birdie.inner.nope").is_err());
        let birdie = config.birdie.unwrap();
        assert_eq!(birdie.inner, Some(Inner::default()));
    }

    #[test]
    fn existing_intermediate_is_reused() {
        let mut config = TestConfig {
            birdie: Some(Nest {
                name: "Heron".into(),
                ..Nest::default()
            }),
            ..TestConfig::default()
        };
        resolve(&mut config, "birdie.value").unwrap();
        assert_eq!(config.birdie.unwrap().name, "Heron");
    }

    #[test]
    fn terminal_option_is_not_materialized() {
        let mut config = TestConfig::default();
        let handle = resolve(&mut config, "birdie").unwrap();
        assert_eq!(handle.kind(), Kind::Optional);
        drop(handle);
        assert!(config.birdie.is_none());
    }

    #[test]
    fn traversing_a_scalar_is_not_a_struct() {
        let mut config = TestConfig::default();
        let err = resolve(&mut config, "name.first").err().unwrap();
        assert_matches!(
            err,
            ResolveError::NotAStruct { ref segment, kind: Kind::String } if segment == "first"
        );
    }

    #[test]
    fn traversing_a_materialized_scalar_option_is_not_a_struct() {
        let mut config = TestConfig::default();
        let err = resolve(&mut config, "started.year").err().unwrap();
        assert_matches!(err, ResolveError::NotAStruct { kind: Kind::Scalar, .. });
        assert!(config.started.is_some());
    }

    #[test]
    fn double_option_intermediate_always_fails() {
        let mut config = TestConfig::default();
        let err = resolve(&mut config, "double.value").err().unwrap();
        assert_matches!(err, ResolveError::DoubleIndirection { ref segment, .. } if segment == "double");
        assert_eq!(config.double, None);

        config.double = Some(Some("set".into()));
        let err = resolve(&mut config, "double.value").err().unwrap();
        assert_matches!(err, ResolveError::DoubleIndirection { .. });
    }

    #[test]
    fn double_option_terminal_resolves() {
        let mut config = TestConfig::default();
        assert!(resolve(&mut config, "double").is_ok());
    }

    #[test]
    fn hidden_field_is_not_settable() {
        let mut config = TestConfig::default();
        let handle = resolve(&mut config, "secret").unwrap();
        assert!(!handle.is_settable());
    }

    #[test]
    fn empty_segment_is_unknown() {
        let mut config = TestConfig::default();
        let err = resolve(&mut config, "birdie..value").err().unwrap();
        assert_matches!(err, ResolveError::UnknownField { ref segment, .. } if segment.is_empty());
    }

    #[test]
    fn handle_writes_are_visible_in_root() {
        let mut config = TestConfig::default();
        let mut handle = resolve(&mut config, "nested.count").unwrap();
        handle
            .field_mut()
            .merge_document(serde_json::json!(7), &mut Vec::new())
            .unwrap();
        drop(handle);
        assert_eq!(config.nested.count, 7);
    }
}
