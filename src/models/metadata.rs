//! Campaign/content descriptors entered before files are staged.
//!
//! The set of fields is configuration ([`FormSchema`]); every field is
//! required. Values are kept in schema order so the multipart body lists
//! them in a stable order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One required form field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name of the multipart text part (e.g. `campaign_name`).
    pub name: String,

    /// Human-readable label used in validation messages.
    pub label: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("form schema must declare at least one field")]
    Empty,
    #[error("field `{0}` declared twice")]
    Duplicate(String),
    #[error("field entry `{0}` has an empty name")]
    EmptyName(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("unknown form field `{0}`")]
    UnknownField(String),
}

/// Ordered list of required fields plus the field shown in the staging title.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    title_field: String,
}

pub const DEFAULT_TITLE_FIELD: &str = "campaign_name";

impl Default for FormSchema {
    fn default() -> Self {
        let fields = vec![
            FieldSpec::new("client_name", "Client"),
            FieldSpec::new("campaign_name", "Campaign"),
            FieldSpec::new("influencer_name", "Influencer"),
            FieldSpec::new("platform", "Platform"),
            FieldSpec::new("format", "Format"),
            FieldSpec::new("organic_paid", "Organic / Paid"),
            FieldSpec::new("content_id", "Content ID"),
        ];
        Self {
            fields,
            title_field: DEFAULT_TITLE_FIELD.to_string(),
        }
    }
}

impl FormSchema {
    /// Build a schema, rejecting empty or duplicated field lists.
    ///
    /// The title field is `campaign_name` when declared, otherwise the first field.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }
        for (i, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyName(field.label.clone()));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::Duplicate(field.name.clone()));
            }
        }
        let title_field = if fields.iter().any(|f| f.name == DEFAULT_TITLE_FIELD) {
            DEFAULT_TITLE_FIELD.to_string()
        } else {
            fields[0].name.clone()
        };
        Ok(Self {
            fields,
            title_field,
        })
    }

    /// Parse a comma-separated `name[:Label]` list, e.g.
    /// `campaign_name:Campaign,platform,content_id:Post ID`.
    ///
    /// A missing label defaults to the wire name.
    pub fn parse(list: &str) -> Result<Self, SchemaError> {
        let fields = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((name, label)) => FieldSpec::new(name.trim(), label.trim()),
                None => FieldSpec::new(entry, entry),
            })
            .collect();
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn title_field(&self) -> &str {
        &self.title_field
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Current values of the form, one slot per schema field.
#[derive(Clone, Debug)]
pub struct FormMetadata {
    schema: FormSchema,
    values: Vec<String>,
}

impl FormMetadata {
    pub fn new(schema: FormSchema) -> Self {
        let values = vec![String::new(); schema.fields.len()];
        Self { schema, values }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), MetadataError> {
        let idx = self
            .schema
            .position(name)
            .ok_or_else(|| MetadataError::UnknownField(name.to_string()))?;
        self.values[idx] = value.into();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.schema.position(name).map(|idx| self.values[idx].as_str())
    }

    /// Fields with their current values, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldSpec, &str)> {
        self.schema
            .fields
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Fields whose value is empty or whitespace only.
    pub fn missing(&self) -> Vec<FieldSpec> {
        self.fields()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(spec, _)| spec.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| !v.trim().is_empty())
    }

    /// Value of the schema's title field (the campaign name by default).
    pub fn title_value(&self) -> &str {
        self.get(&self.schema.title_field).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(String::clear);
    }
}
