//! Field registry: the capability traits that replace runtime reflection.
//!
//! A destination type opts in with [`record!`](crate::record), which lists the
//! fields addressable by name. Every field type implements [`Field`], which
//! tells the resolver and the assigner what they need to know:
//!
//! - its [`Kind`] (is it a record, an `Option`, a bool, ...);
//! - its zero value, used to materialize empty `Option`s and to check presence;
//! - how a structured document merges into it (the JSON fallback);
//! - which optional conversion capabilities it exposes (direct string storage,
//!   binary decoding, text decoding).
//!
//! Impls are provided for the std scalars, `String`, `Option<T>`, `Vec<T>`,
//! string-keyed maps and `serde_json::Value`. Plain serde types opt in with
//! [`scalar_field!`](crate::scalar_field); types with their own text format opt in
//! with [`text_field!`](crate::text_field).

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::assign::{BinaryDecode, TextDecode};
use crate::error::ResolveError;
use crate::merge::merge_into;
use crate::types::Kind;

/// Object-safe accessors derived from [`Field`] for every sized field type.
pub trait AsField {
    /// Shape of the declared type.
    fn kind(&self) -> Kind;
    fn as_field(&self) -> &dyn Field;
    fn as_field_mut(&mut self) -> &mut dyn Field;
}

impl<T: Field> AsField for T {
    fn kind(&self) -> Kind {
        T::shape()
    }

    fn as_field(&self) -> &dyn Field {
        self
    }

    fn as_field_mut(&mut self) -> &mut dyn Field {
        self
    }
}

/// A value that can live at the end of a dotted path.
pub trait Field: AsField {
    /// Shape of the declared type.
    fn shape() -> Kind
    where
        Self: Sized;

    /// Value stored into an empty `Option<Self>` when it is materialized.
    fn zeroed() -> Self
    where
        Self: Sized;

    /// Whether the value equals [`zeroed`](Field::zeroed).
    fn is_zero(&self) -> bool;

    /// Merge a structured document into the value. Keys the type doesn't consume
    /// are pushed onto `unknown`.
    fn merge_document(
        &mut self,
        document: Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error>;

    /// Fit a document to the value before it is merged: keys naming hidden
    /// fields are removed and pushed onto `unknown`, and `null`s aimed at fields
    /// that can't hold one are dropped. `prefix` is the dotted path of the value
    /// inside the document.
    fn prepare_document(&self, _document: &mut Value, _prefix: &str, _unknown: &mut Vec<String>) {}

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// Make the value addressable for traversal or assignment.
    ///
    /// `Option<T>` allocates `T::zeroed()` when empty and returns the pointee.
    /// Everything else returns itself.
    fn materialize(&mut self, _segment: &str) -> Result<&mut dyn Field, ResolveError> {
        Ok(self.as_field_mut())
    }

    /// Store `raw` verbatim. Returns `false` when the type doesn't hold strings.
    fn assign_direct(&mut self, _raw: &str) -> bool {
        false
    }

    fn as_binary_decoder(&mut self) -> Option<&mut dyn BinaryDecode> {
        None
    }

    fn as_text_decoder(&mut self) -> Option<&mut dyn TextDecode> {
        None
    }
}

/// A struct-like value whose fields can be looked up by name.
///
/// Implemented by [`record!`](crate::record).
pub trait Record: Field {
    /// Type name used in resolution errors.
    fn record_name(&self) -> &'static str;

    /// Whether `name` is an exported (settable) field. Hidden fields resolve but
    /// cannot be assigned.
    fn is_exported(&self, name: &str) -> bool;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Field>;
}

/// Register a struct as a [`Record`].
///
/// Lists the fields addressable by dotted path. Fields after `hidden` resolve
/// (so presence checks can read them) but never accept assignment. The struct
/// must implement `Default`, `Serialize` and `Deserialize`, and every listed
/// field type must implement [`Field`]. Mark it `#[serde(default)]` so a
/// partial document can fill an empty `Option` of it.
///
/// Documents merge by serializing the struct, laying the document over it and
/// deserializing the result. A `#[serde(skip)]` field therefore comes back as
/// its `Default` after every file or data load; keep state that must survive
/// out of registered records. Document keys naming hidden fields are dropped
/// and reported as unknown.
///
/// ```ignore
/// #[derive(Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Settings {
///     name: String,
///     database: Option<Database>,
///     token: String,
/// }
///
/// dotfig::record!(Settings { name, database } hidden { token });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident),* $(,)? } $(hidden { $($hidden:ident),* $(,)? })?) => {
        impl $crate::Record for $ty {
            fn record_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn is_exported(&self, name: &str) -> bool {
                [$(stringify!($field)),*].contains(&name)
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn $crate::Field> {
                $(
                    if name == stringify!($field) {
                        return ::core::option::Option::Some(&mut self.$field as &mut dyn $crate::Field);
                    }
                )*
                $($(
                    if name == stringify!($hidden) {
                        return ::core::option::Option::Some(&mut self.$hidden as &mut dyn $crate::Field);
                    }
                )*)?
                ::core::option::Option::None
            }
        }

        impl $crate::Field for $ty {
            fn shape() -> $crate::Kind {
                $crate::Kind::Record
            }

            fn zeroed() -> Self {
                <$ty as ::core::default::Default>::default()
            }

            fn is_zero(&self) -> bool {
                $( $crate::Field::is_zero(&self.$field) && )*
                $($( $crate::Field::is_zero(&self.$hidden) && )*)?
                true
            }

            fn merge_document(
                &mut self,
                mut document: $crate::__private::Value,
                unknown: &mut ::std::vec::Vec<::std::string::String>,
            ) -> ::core::result::Result<(), $crate::__private::JsonError> {
                $crate::Field::prepare_document(self, &mut document, "", unknown);
                $crate::__private::merge_into(self, document, unknown)
            }

            fn prepare_document(
                &self,
                document: &mut $crate::__private::Value,
                prefix: &str,
                unknown: &mut ::std::vec::Vec<::std::string::String>,
            ) {
                let $crate::__private::Value::Object(object) = document else {
                    return;
                };
                $($( $crate::__private::drop_hidden(object, stringify!($hidden), prefix, unknown); )*)?
                $( $crate::__private::prepare_field(object, stringify!($field), &self.$field, prefix, unknown); )*
            }

            fn as_record_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::Record> {
                ::core::option::Option::Some(self as &mut dyn $crate::Record)
            }
        }
    };
}

/// Implement [`Field`] for plain serde types that convert through the JSON
/// fallback.
///
/// The zero value is `Default::default()` unless given explicitly:
///
/// ```ignore
/// dotfig::scalar_field!(Kind::Scalar => Level);
/// dotfig::scalar_field!(Kind::Scalar => Port = Port(80));
/// ```
#[macro_export]
macro_rules! scalar_field {
    (@impl $kind:expr, $ty:ty, $zero:expr) => {
        impl $crate::Field for $ty {
            fn shape() -> $crate::Kind {
                $kind
            }

            fn zeroed() -> Self {
                $zero
            }

            fn is_zero(&self) -> bool {
                *self == $zero
            }

            fn merge_document(
                &mut self,
                document: $crate::__private::Value,
                unknown: &mut ::std::vec::Vec<::std::string::String>,
            ) -> ::core::result::Result<(), $crate::__private::JsonError> {
                $crate::__private::merge_into(self, document, unknown)
            }
        }
    };
    ($kind:expr => $ty:ty = $zero:expr) => {
        $crate::scalar_field!(@impl $kind, $ty, $zero);
    };
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $( $crate::scalar_field!(@impl $kind, $ty, <$ty as ::core::default::Default>::default()); )+
    };
}

/// Implement [`Field`] for types that decode themselves from text through
/// [`TextDecode`].
///
/// ```ignore
/// impl TextDecode for Level { ... }
/// dotfig::text_field!(Level);
/// dotfig::text_field!(Endpoint = Endpoint::localhost());
/// ```
#[macro_export]
macro_rules! text_field {
    (@impl $ty:ty, $zero:expr) => {
        impl $crate::Field for $ty {
            fn shape() -> $crate::Kind {
                $crate::Kind::Scalar
            }

            fn zeroed() -> Self {
                $zero
            }

            fn is_zero(&self) -> bool {
                *self == $zero
            }

            fn merge_document(
                &mut self,
                document: $crate::__private::Value,
                unknown: &mut ::std::vec::Vec<::std::string::String>,
            ) -> ::core::result::Result<(), $crate::__private::JsonError> {
                $crate::__private::merge_into(self, document, unknown)
            }

            fn as_text_decoder(
                &mut self,
            ) -> ::core::option::Option<&mut dyn $crate::TextDecode> {
                ::core::option::Option::Some(self as &mut dyn $crate::TextDecode)
            }
        }
    };
    ($ty:ty = $zero:expr) => {
        $crate::text_field!(@impl $ty, $zero);
    };
    ($($ty:ty),+ $(,)?) => {
        $( $crate::text_field!(@impl $ty, <$ty as ::core::default::Default>::default()); )+
    };
}

crate::scalar_field!(Kind::Bool => bool);
crate::scalar_field!(Kind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
crate::scalar_field!(Kind::Float => f32, f64);
crate::scalar_field!(Kind::Scalar => char);

impl Field for String {
    fn shape() -> Kind {
        Kind::String
    }

    fn zeroed() -> Self {
        String::new()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn merge_document(
        &mut self,
        document: Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        merge_into(self, document, unknown)
    }

    fn assign_direct(&mut self, raw: &str) -> bool {
        raw.clone_into(self);
        true
    }
}

/// `serde_json::Value` accepts any document and stores raw strings as-is.
impl Field for Value {
    fn shape() -> Kind {
        Kind::Any
    }

    fn zeroed() -> Self {
        Value::Null
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn merge_document(
        &mut self,
        document: Value,
        _unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        *self = document;
        Ok(())
    }

    fn assign_direct(&mut self, raw: &str) -> bool {
        *self = Value::String(raw.to_owned());
        true
    }
}

impl<T: Field> Field for Option<T> {
    fn shape() -> Kind {
        Kind::Optional
    }

    fn zeroed() -> Self {
        None
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn merge_document(
        &mut self,
        document: Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        if document.is_null() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.merge_document(document, unknown),
            None => {
                let mut inner = T::zeroed();
                inner.merge_document(document, unknown)?;
                *self = Some(inner);
                Ok(())
            }
        }
    }

    fn prepare_document(&self, document: &mut Value, prefix: &str, unknown: &mut Vec<String>) {
        match self {
            Some(inner) => inner.prepare_document(document, prefix, unknown),
            None => T::zeroed().prepare_document(document, prefix, unknown),
        }
    }

    fn materialize(&mut self, segment: &str) -> Result<&mut dyn Field, ResolveError> {
        if T::shape() == Kind::Optional {
            return Err(ResolveError::DoubleIndirection {
                segment: segment.to_string(),
                type_name: std::any::type_name::<Self>(),
            });
        }
        let inner: &mut dyn Field = self.get_or_insert_with(T::zeroed);
        Ok(inner)
    }
}

impl<T> Field for Vec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn shape() -> Kind {
        Kind::Sequence
    }

    fn zeroed() -> Self {
        Vec::new()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn merge_document(
        &mut self,
        document: Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        merge_into(self, document, unknown)
    }
}

impl<V> Field for HashMap<String, V>
where
    V: Serialize + DeserializeOwned,
{
    fn shape() -> Kind {
        Kind::Map
    }

    fn zeroed() -> Self {
        HashMap::new()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn merge_document(
        &mut self,
        document: Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        merge_into(self, document, unknown)
    }
}

impl<V> Field for BTreeMap<String, V>
where
    V: Serialize + DeserializeOwned,
{
    fn shape() -> Kind {
        Kind::Map
    }

    fn zeroed() -> Self {
        BTreeMap::new()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn merge_document(
        &mut self,
        document: Value,
        unknown: &mut Vec<String>,
    ) -> Result<(), serde_json::Error> {
        merge_into(self, document, unknown)
    }
}
