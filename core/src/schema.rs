//! Validation schemas for admin payloads.
//!
//! # Design
//! A `Schema` is plain data: an ordered list of `FieldSpec`s, each carrying
//! its own rules and error messages. Update schemas are never written by
//! hand. They are derived from the create schema with `partial()` followed by
//! `extend()`, so the identifier added last is required no matter what the
//! base schema declares.
//!
//! Payload structs come from the same field list through `entity_schema!`,
//! which keeps the Rust types and the validation rules from drifting apart.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub const REQUIRED_MESSAGE: &str = "required";
pub const MIN_LENGTH_MESSAGE: &str = "must contain at least 1 character";
pub const SLUG_MESSAGE: &str = "only lowercase letters, digits and hyphens are allowed";
pub const EXPECTED_TEXT_MESSAGE: &str = "expected string";
pub const EXPECTED_LIST_MESSAGE: &str = "expected a list of strings";

/// Key used for errors that do not belong to a single field.
pub const FORM_ERROR_KEY: &str = "_form";

/// Name of the identifier field every update schema requires.
pub const ID_FIELD: &str = "id";

pub(crate) static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is a valid regex"));

/// Shape of the JSON value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
}

/// A single constraint on a text value. List fields apply it to every item.
#[derive(Debug, Clone)]
pub enum Rule {
    MinLength { min: usize, message: &'static str },
    Pattern { regex: Regex, message: &'static str },
}

impl Rule {
    pub fn min_length(min: usize, message: &'static str) -> Self {
        Rule::MinLength { min, message }
    }

    pub fn pattern(regex: Regex, message: &'static str) -> Self {
        Rule::Pattern { regex, message }
    }

    /// Lowercase letters, digits and hyphens only.
    pub fn slug() -> Self {
        Rule::Pattern {
            regex: SLUG_PATTERN.clone(),
            message: SLUG_MESSAGE,
        }
    }

    fn check(&self, text: &str) -> Option<&'static str> {
        match self {
            Rule::MinLength { min, message } => (text.chars().count() < *min).then_some(*message),
            Rule::Pattern { regex, message } => (!regex.is_match(text)).then_some(*message),
        }
    }
}

/// Declaration of one named field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    required: bool,
    rules: Vec<Rule>,
}

impl FieldSpec {
    /// A required field with no rules.
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            rules: Vec::new(),
        }
    }

    /// A field whose kind and optionality follow the Rust type `T`.
    pub fn of<T: FieldType>(name: &'static str) -> Self {
        Self {
            name,
            kind: T::KIND,
            required: T::REQUIRED,
            rules: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn check(&self, value: &Value, errors: &mut ValidationErrors) {
        match (self.kind, value) {
            (FieldKind::Text, Value::String(text)) => self.check_text(text, errors),
            (FieldKind::TextList, Value::Array(items)) => {
                if items.iter().any(|item| !item.is_string()) {
                    errors.add(self.name, EXPECTED_LIST_MESSAGE);
                    return;
                }
                for text in items.iter().filter_map(Value::as_str) {
                    self.check_text(text, errors);
                }
            }
            (FieldKind::Text, _) => errors.add(self.name, EXPECTED_TEXT_MESSAGE),
            (FieldKind::TextList, _) => errors.add(self.name, EXPECTED_LIST_MESSAGE),
        }
    }

    fn check_text(&self, text: &str, errors: &mut ValidationErrors) {
        for message in self.rules.iter().filter_map(|rule| rule.check(text)) {
            errors.add(self.name, message);
        }
    }
}

/// Ordered set of field declarations for one payload.
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Every field becomes optional; rules still apply to present values.
    pub fn partial(mut self) -> Self {
        for field in &mut self.fields {
            field.required = false;
        }
        self
    }

    /// Add `spec`, replacing any field of the same name in place.
    pub fn extend(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|field| field.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// `self.partial()` extended with a required, non-empty `id`.
    pub fn into_update(self) -> Self {
        self.partial().extend(
            FieldSpec::new(ID_FIELD, FieldKind::Text).rule(Rule::min_length(1, MIN_LENGTH_MESSAGE)),
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Check `values` against every field. Absent and `null` values count as
    /// missing. Keys the schema does not declare are ignored.
    pub fn validate(&self, values: &Map<String, Value>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for field in &self.fields {
            match values.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        errors.add(field.name, REQUIRED_MESSAGE);
                    }
                }
                Some(value) => field.check(value, &mut errors),
            }
        }
        errors.into_result()
    }

    /// Validate, then deserialize the declared, non-null fields into `T`.
    pub fn parse<T: DeserializeOwned>(&self, values: &Map<String, Value>) -> Result<T, ValidationErrors> {
        self.validate(values)?;
        let known: Map<String, Value> = values
            .iter()
            .filter(|(key, value)| !value.is_null() && self.get(key).is_some())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(known)).map_err(|e| ValidationErrors::single(FORM_ERROR_KEY, e.to_string()))
    }
}

/// Per-field validation messages, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The message a form shows under `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|messages| messages.first()).map(String::as_str)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Maps a payload field's Rust type to its schema shape and to the type it
/// takes in the derived update payload.
pub trait FieldType {
    type Partial;
    const KIND: FieldKind;
    const REQUIRED: bool;
}

impl FieldType for String {
    type Partial = Option<String>;
    const KIND: FieldKind = FieldKind::Text;
    const REQUIRED: bool = true;
}

impl FieldType for Vec<String> {
    type Partial = Option<Vec<String>>;
    const KIND: FieldKind = FieldKind::TextList;
    const REQUIRED: bool = true;
}

impl<T: FieldType> FieldType for Option<T> {
    type Partial = Option<T>;
    const KIND: FieldKind = T::KIND;
    const REQUIRED: bool = false;
}

/// Declare a create payload once and derive its update payload from it.
///
/// Generates the create struct, the update struct (every field optional,
/// plus a required `id`) and a `schema()` constructor on each.
macro_rules! entity_schema {
    (
        $(#[$create_meta:meta])*
        create $create:ident;
        $(#[$update_meta:meta])*
        update $update:ident;
        {
            $( $field:ident : $ty:ty $( => [ $($rule:expr),+ $(,)? ] )? ),+ $(,)?
        }
    ) => {
        $(#[$create_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $create {
            $( pub $field: $ty, )+
        }

        $(#[$update_meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $update {
            pub id: String,
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: <$ty as $crate::schema::FieldType>::Partial,
            )+
        }

        impl $create {
            pub fn schema() -> $crate::schema::Schema {
                $crate::schema::Schema::new(stringify!($create))
                    $(
                        .field({
                            let spec = $crate::schema::FieldSpec::of::<$ty>(stringify!($field));
                            $( $( let spec = spec.rule($rule); )+ )?
                            spec
                        })
                    )+
            }
        }

        impl $update {
            pub fn schema() -> $crate::schema::Schema {
                $create::schema().named(stringify!($update)).into_update()
            }
        }
    };
}

pub(crate) use entity_schema;
