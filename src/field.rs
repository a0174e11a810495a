//! Image field descriptors and attached field values.
//!
//! A field descriptor bundles everything needed to work with one
//! image-bearing attribute: the ordered [`Variation`] specs, the
//! [`RenderPolicy`] controlling whether variations are generated, and the
//! storage backend the files live on. [`ImageFieldDescriptor::attach`]
//! produces an [`ImageFieldFile`] — the value type for one record's file —
//! which exposes existence, URL, and the per-variation derived files.
//!
//! These types describe *what* exists where; the actual pixel work lives in
//! [`render`](crate::render).

use crate::render::RenditionRequest;
use crate::storage::Storage;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named variation spec: the target box and whether to center-crop.
///
/// With `crop: false` the source is scaled to fit within `width`×`height`
/// preserving aspect ratio (never upscaled). With `crop: true` it is
/// fill-resized and center-cropped to exactly `width`×`height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variation {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub crop: bool,
}

/// Whether variations should be rendered for a field.
///
/// Catalogs declare this as a plain boolean (`Always`/`Never`); library
/// users can install a [`RenderPolicy::Predicate`] that is consulted once
/// per rendition request with that request's parameters.
#[derive(Clone)]
pub enum RenderPolicy {
    Always,
    Never,
    Predicate(Arc<dyn Fn(&RenditionRequest<'_>) -> bool + Send + Sync>),
}

impl RenderPolicy {
    /// Evaluate the policy for one rendition request.
    pub fn should_render(&self, request: &RenditionRequest<'_>) -> bool {
        match self {
            RenderPolicy::Always => true,
            RenderPolicy::Never => false,
            RenderPolicy::Predicate(predicate) => predicate(request),
        }
    }
}

impl fmt::Debug for RenderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderPolicy::Always => f.write_str("Always"),
            RenderPolicy::Never => f.write_str("Never"),
            RenderPolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for RenderPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let render = bool::deserialize(deserializer)?;
        Ok(if render {
            RenderPolicy::Always
        } else {
            RenderPolicy::Never
        })
    }
}

/// Metadata for one image-bearing field: variation specs, render policy,
/// and the storage backend its files live on.
pub struct ImageFieldDescriptor {
    pub variations: Vec<Variation>,
    pub policy: RenderPolicy,
    pub storage: Arc<dyn Storage>,
}

impl ImageFieldDescriptor {
    pub fn new(
        variations: Vec<Variation>,
        policy: RenderPolicy,
        storage: Arc<dyn Storage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            variations,
            policy,
            storage,
        })
    }

    /// Attach a stored file name to this descriptor, producing a field value.
    pub fn attach(self: &Arc<Self>, name: impl Into<String>) -> ImageFieldFile {
        ImageFieldFile {
            name: name.into(),
            field: Arc::clone(self),
        }
    }
}

impl fmt::Debug for ImageFieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFieldDescriptor")
            .field("variations", &self.variations)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// One record's image field value: a stored file name attached to its
/// descriptor.
#[derive(Debug, Clone)]
pub struct ImageFieldFile {
    name: String,
    field: Arc<ImageFieldDescriptor>,
}

impl ImageFieldFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<ImageFieldDescriptor> {
        &self.field
    }

    pub fn exists(&self) -> bool {
        self.field.storage.exists(&self.name)
    }

    pub fn url(&self) -> Option<String> {
        self.field.storage.url(&self.name)
    }

    /// The derived file for one configured variation, by variation name.
    pub fn variation(&self, name: &str) -> Option<VariationFile<'_>> {
        self.field
            .variations
            .iter()
            .find(|v| v.name == name)
            .map(|variation| self.variation_file(variation))
    }

    /// All derived files, in variation declaration order.
    pub fn variations(&self) -> impl Iterator<Item = VariationFile<'_>> {
        self.field
            .variations
            .iter()
            .map(|variation| self.variation_file(variation))
    }

    fn variation_file<'a>(&'a self, variation: &'a Variation) -> VariationFile<'a> {
        VariationFile {
            file_name: variation_file_name(&self.name, &variation.name),
            variation_name: &variation.name,
            storage: self.field.storage.as_ref(),
        }
    }
}

/// A derived variation file of one field value. Existence is optional
/// until rendered.
pub struct VariationFile<'a> {
    file_name: String,
    variation_name: &'a str,
    storage: &'a dyn Storage,
}

impl<'a> VariationFile<'a> {
    /// The variation's configured name (`thumbnail`), not the file name.
    pub fn variation_name(&self) -> &'a str {
        self.variation_name
    }

    /// The derived storage name (`photos/a.thumbnail.jpg`).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn exists(&self) -> bool {
        self.storage.exists(&self.file_name)
    }

    pub fn url(&self) -> Option<String> {
        self.storage.url(&self.file_name)
    }
}

/// Derived storage name for a variation of a source file.
///
/// The variation name slots in before the extension, in the same directory:
/// `photos/a.jpg` + `thumbnail` → `photos/a.thumbnail.jpg`. Sources without
/// an extension get the variation name appended.
pub fn variation_file_name(source: &str, variation: &str) -> String {
    let (dir, file) = match source.rfind('/') {
        Some(i) => (&source[..=i], &source[i + 1..]),
        None => ("", source),
    };
    match file.rfind('.') {
        // i == 0 is a dotfile, not an extension
        Some(i) if i > 0 => format!("{dir}{}.{variation}{}", &file[..i], &file[i..]),
        _ => format!("{dir}{file}.{variation}"),
    }
}
