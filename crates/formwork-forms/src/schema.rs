//! Schema fragments describing the persisted shape of field values.
//!
//! A [`SchemaFragment`] is what a field reports through
//! [`Field::to_schema`](crate::fields::Field::to_schema). Fragments nest:
//! object fragments carry named sub-fragments, array fragments carry an item
//! fragment. Serializing a fragment yields a JSON document suitable for a
//! persistence layer to build its model from.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// The storage type of a schema fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaType {
    /// Any JSON value.
    Mixed,
    /// A string.
    String,
    /// A number (integer or float).
    Number,
    /// A boolean.
    Boolean,
    /// A calendar date.
    Date,
    /// A reference to an object in another collection.
    ObjectId,
    /// An ordered sequence of items.
    Array,
    /// A record with named members.
    Object,
}

/// A description of the persisted shape of one field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaFragment {
    /// The storage type.
    #[serde(rename = "type")]
    pub kind: SchemaType,
    /// Whether a value must be present.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// The value used when none is supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// The allowed values, for enumerations.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// The referenced collection, for references.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Named members, for objects. Declaration order is kept.
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_members"
    )]
    pub fields: Vec<(String, SchemaFragment)>,
    /// The item shape, for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,
}

fn serialize_members<S: Serializer>(
    members: &[(String, SchemaFragment)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(members.iter().map(|(name, fragment)| (name, fragment)))
}

impl SchemaFragment {
    /// Creates a fragment of the given type with no constraints.
    pub const fn new(kind: SchemaType) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            choices: Vec::new(),
            reference: None,
            fields: Vec::new(),
            items: None,
        }
    }

    /// Creates an array fragment with the given item shape.
    pub fn array_of(items: Self) -> Self {
        let mut fragment = Self::new(SchemaType::Array);
        fragment.items = Some(Box::new(items));
        fragment
    }

    /// Sets whether the value is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, default: Option<Value>) -> Self {
        self.default = default;
        self
    }

    /// Sets the allowed values.
    #[must_use]
    pub fn choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }

    /// Sets the referenced collection.
    #[must_use]
    pub fn reference(mut self, target: impl Into<String>) -> Self {
        self.reference = Some(target.into());
        self
    }

    /// Adds a named member.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, fragment: Self) -> Self {
        self.fields.push((name.into(), fragment));
        self
    }

    /// Looks up a direct member by name.
    pub fn member(&self, name: &str) -> Option<&Self> {
        self.fields
            .iter()
            .find_map(|(member, fragment)| (member == name).then_some(fragment))
    }

    /// Inserts `fragment` at a dotted `path`, creating intermediate object
    /// fragments as needed.
    pub fn insert_path(&mut self, path: &str, fragment: Self) {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let position = self.fields.iter().position(|(name, _)| name == head);
        match (rest, position) {
            (None, Some(index)) => self.fields[index].1 = fragment,
            (None, None) => self.fields.push((head.to_string(), fragment)),
            (Some(rest), Some(index)) => {
                let member = &mut self.fields[index].1;
                if member.kind != SchemaType::Object {
                    *member = Self::new(SchemaType::Object);
                }
                member.insert_path(rest, fragment);
            }
            (Some(rest), None) => {
                let mut member = Self::new(SchemaType::Object);
                member.insert_path(rest, fragment);
                self.fields.push((head.to_string(), member));
            }
        }
    }

    /// Converts the fragment to a JSON document.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
