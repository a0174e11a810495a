//! The content catalog: record store and image-field metadata registry.
//!
//! A catalog is a JSON document of apps → models → records, loaded once per
//! invocation. Each model declares its image-bearing fields (variation specs
//! plus render flag) alongside its records, whose values are nullable
//! storage file names:
//!
//! ```json
//! {
//!   "apps": [{
//!     "name": "gallery",
//!     "models": [{
//!       "name": "photo",
//!       "fields": [{
//!         "name": "image",
//!         "render": true,
//!         "variations": [
//!           {"name": "thumbnail", "width": 100, "height": 75, "crop": true},
//!           {"name": "medium", "width": 400, "height": 300}
//!         ]
//!       }],
//!       "records": [
//!         {"id": 1, "values": {"image": "photos/a.jpg"}},
//!         {"id": 2, "values": {"image": null}}
//!       ]
//!     }]
//!   }]
//! }
//! ```
//!
//! Fields are addressed as `<app>.<model>.<field>` ([`FieldPath`]). Parsing
//! is strict: exactly three non-empty dot-separated segments. Resolution
//! errors ([`RegistryError`]) are distinct from parse errors and propagate
//! unhandled to the command surface.
//!
//! Records where a field is null or empty are excluded from both counting
//! and iteration; [`ResolvedField::source_files`] yields the remaining file
//! names as a lazy, single-pass sequence.

use crate::field::{RenderPolicy, Variation};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifier parse failure, with the corrective format hint.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("cannot parse field path {input:?}: use the format <app>.<model>.<field>")]
pub struct FieldPathError {
    pub input: String,
}

/// Resolution failure for a well-formed field path.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown app {0:?}")]
    UnknownApp(String),
    #[error("unknown model {model:?} in app {app:?}")]
    UnknownModel { app: String, model: String },
    #[error("unknown field {field:?} on model {app:?}.{model:?}")]
    UnknownField {
        app: String,
        model: String,
        field: String,
    },
}

/// A parsed `<app>.<model>.<field>` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub app: String,
    pub model: String,
    pub field: String,
}

impl FieldPath {
    /// Parse an identifier into exactly three non-empty segments.
    pub fn parse(input: &str) -> Result<Self, FieldPathError> {
        let mut segments = input.split('.');
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(app), Some(model), Some(field), None)
                if !app.is_empty() && !model.is_empty() && !field.is_empty() =>
            {
                Ok(Self {
                    app: app.to_string(),
                    model: model.to_string(),
                    field: field.to_string(),
                })
            }
            _ => Err(FieldPathError {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.app, self.model, self.field)
    }
}

/// The loaded catalog document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    pub apps: Vec<AppEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppEntry {
    pub name: String,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// An image-bearing field as declared in the catalog.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldEntry {
    pub name: String,
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default = "render_default")]
    pub render: RenderPolicy,
}

fn render_default() -> RenderPolicy {
    RenderPolicy::Always
}

/// One record: an id and a map of nullable field values.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Record {
    pub id: u64,
    #[serde(default)]
    pub values: BTreeMap<String, Option<String>>,
}

impl Record {
    /// The record's value for a field, if set and non-empty.
    fn file_name(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|value| value.as_deref())
            .filter(|name| !name.is_empty())
    }
}

impl Catalog {
    /// Load a catalog document from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Resolve a field path against the registry.
    pub fn resolve(&self, path: &FieldPath) -> Result<ResolvedField<'_>, RegistryError> {
        let app = self
            .apps
            .iter()
            .find(|a| a.name == path.app)
            .ok_or_else(|| RegistryError::UnknownApp(path.app.clone()))?;
        let model = app
            .models
            .iter()
            .find(|m| m.name == path.model)
            .ok_or_else(|| RegistryError::UnknownModel {
                app: path.app.clone(),
                model: path.model.clone(),
            })?;
        let entry = model
            .fields
            .iter()
            .find(|f| f.name == path.field)
            .ok_or_else(|| RegistryError::UnknownField {
                app: path.app.clone(),
                model: path.model.clone(),
                field: path.field.clone(),
            })?;
        Ok(ResolvedField { entry, model })
    }

    /// Every registered field across the catalog, with its path, in
    /// declaration order. Used by the `fields` listing.
    pub fn fields(&self) -> impl Iterator<Item = (FieldPath, ResolvedField<'_>)> {
        self.apps.iter().flat_map(|app| {
            app.models.iter().flat_map(move |model| {
                model.fields.iter().map(move |entry| {
                    (
                        FieldPath {
                            app: app.name.clone(),
                            model: model.name.clone(),
                            field: entry.name.clone(),
                        },
                        ResolvedField { entry, model },
                    )
                })
            })
        })
    }
}

/// A field entry resolved together with the model that owns its records.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedField<'a> {
    pub entry: &'a FieldEntry,
    model: &'a ModelEntry,
}

impl<'a> ResolvedField<'a> {
    /// Number of records with a non-null, non-empty value for this field.
    pub fn count(&self) -> usize {
        let field = self.entry.name.as_str();
        self.model
            .records
            .iter()
            .filter(|r| r.file_name(field).is_some())
            .count()
    }

    /// Lazy, single-pass sequence of source file names for this field,
    /// in record order. Null and empty values are excluded.
    pub fn source_files(&self) -> SourceFiles<'a> {
        SourceFiles {
            records: self.model.records.iter(),
            field: &self.entry.name,
        }
    }
}

/// Single-pass iterator over a field's populated source file names.
pub struct SourceFiles<'a> {
    records: std::slice::Iter<'a, Record>,
    field: &'a str,
}

impl<'a> Iterator for SourceFiles<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let field = self.field;
        self.records.by_ref().find_map(|r| r.file_name(field))
    }
}
