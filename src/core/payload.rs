//! Typed payloads for each content kind.
//!
//! The `content_items` table stores kind-specific fields as JSON. Each payload
//! type here names its [`ContentKind`] so the generic collection editor can be
//! instantiated once per kind without duplicating any list logic.

use crate::{
    config::app::DefaultContent,
    entities::ContentKind,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// Shape of the kind-specific fields of a content item
pub trait ItemPayload: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Kind stored alongside every item with this payload
    const KIND: ContentKind;

    /// Checks the payload before it is written
    ///
    /// # Errors
    /// Returns `Error::Validation` when a required field is missing or inconsistent
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Configured items shown when the stored list cannot be read
    fn fallback(_defaults: &DefaultContent) -> Vec<Self> {
        Vec::new()
    }
}

fn require_non_empty(value: &str, field: &str, kind: ContentKind) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("{kind} {field} cannot be empty"),
        });
    }
    Ok(())
}

/// Carousel slide
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidePayload {
    /// Headline
    #[serde(default)]
    pub title: String,
    /// Secondary line
    #[serde(default)]
    pub subtitle: String,
    /// Optional call-to-action target
    #[serde(default)]
    pub link: Option<String>,
}

impl ItemPayload for SlidePayload {
    const KIND: ContentKind = ContentKind::Slide;

    fn fallback(defaults: &DefaultContent) -> Vec<Self> {
        defaults.slides.clone()
    }
}

/// Sponsor listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorPayload {
    /// Sponsor name
    pub name: String,
    /// Sponsor website
    #[serde(default)]
    pub website: Option<String>,
    /// Sponsorship level (e.g. "oro", "plata")
    #[serde(default)]
    pub tier: Option<String>,
}

impl ItemPayload for SponsorPayload {
    const KIND: ContentKind = ContentKind::Sponsor;

    fn validate(&self) -> Result<()> {
        require_non_empty(&self.name, "name", Self::KIND)
    }
}

/// Photo gallery header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPayload {
    /// Gallery title
    pub title: String,
    /// Short description
    #[serde(default)]
    pub description: String,
}

impl ItemPayload for GalleryPayload {
    const KIND: ContentKind = ContentKind::Gallery;

    fn validate(&self) -> Result<()> {
        require_non_empty(&self.title, "title", Self::KIND)
    }
}

/// Single photo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoPayload {
    /// Caption shown under the photo
    #[serde(default)]
    pub caption: String,
    /// Gallery this photo is grouped under, if any
    #[serde(default)]
    pub gallery_id: Option<i64>,
}

impl ItemPayload for PhotoPayload {
    const KIND: ContentKind = ContentKind::Photo;
}

/// Input type of a registration form field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text
    #[default]
    Text,
    /// Email address
    Email,
    /// Numeric value
    Number,
    /// Phone number
    Phone,
    /// One of `options`
    Select,
    /// Yes/no
    Checkbox,
    /// Calendar date
    Date,
}

/// Registration form field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFieldPayload {
    /// Label shown to the participant; answers are keyed by it
    pub label: String,
    /// Input type
    #[serde(default)]
    pub field_type: FieldType,
    /// Whether a registration must answer this field
    #[serde(default)]
    pub required: bool,
    /// Choices for `select` fields
    #[serde(default)]
    pub options: Vec<String>,
    /// Placeholder text
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl ItemPayload for FormFieldPayload {
    const KIND: ContentKind = ContentKind::FormField;

    fn validate(&self) -> Result<()> {
        require_non_empty(&self.label, "label", Self::KIND)?;
        if self.field_type == FieldType::Select && self.options.is_empty() {
            return Err(Error::Validation {
                message: format!("Select field '{}' needs at least one option", self.label),
            });
        }
        Ok(())
    }
}
