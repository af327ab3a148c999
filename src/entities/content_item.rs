//! Content item entity - one row per slide, sponsor, gallery, photo or form field.
//!
//! Every item belongs to an edition `year` and carries a dense `position` rank
//! among the items of the same year and kind. Kind-specific fields live in the
//! JSON `payload` column and are typed by `core::payload`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The kind of content a row holds. Stored as a short string.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Home page carousel slide
    #[sea_orm(string_value = "slide")]
    Slide,
    /// Sponsor listing
    #[sea_orm(string_value = "sponsor")]
    Sponsor,
    /// Photo gallery header
    #[sea_orm(string_value = "gallery")]
    Gallery,
    /// Single photo, optionally grouped into a gallery
    #[sea_orm(string_value = "photo")]
    Photo,
    /// Registration form field
    #[sea_orm(string_value = "form_field")]
    FormField,
}

impl ContentKind {
    /// Name used in URLs and stored in the `kind` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slide => "slide",
            Self::Sponsor => "sponsor",
            Self::Gallery => "gallery",
            Self::Photo => "photo",
            Self::FormField => "form_field",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slide" | "slides" => Ok(Self::Slide),
            "sponsor" | "sponsors" => Ok(Self::Sponsor),
            "gallery" | "galleries" => Ok(Self::Gallery),
            "photo" | "photos" => Ok(Self::Photo),
            "form_field" | "form_fields" => Ok(Self::FormField),
            other => Err(crate::errors::Error::Validation {
                message: format!("Unknown content kind '{other}'"),
            }),
        }
    }
}

/// Content item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What this item is
    pub kind: ContentKind,
    /// Edition year this item belongs to
    pub year: i32,
    /// Zero-based rank among items of the same year and kind
    pub position: i32,
    /// Public URL or path of the item's image, if any
    pub image_url: Option<String>,
    /// Storage reference used to delete the image (remote file id or local path)
    pub image_ref: Option<String>,
    /// Kind-specific fields
    pub payload: Json,
    /// When the item was first saved
    pub created_at: DateTimeUtc,
    /// When the item was last saved
    pub updated_at: DateTimeUtc,
}

/// Content items have no relations; galleries are referenced by id inside photo payloads
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_kind_parses_singular_and_plural() {
        assert_eq!("slides".parse::<ContentKind>().unwrap(), ContentKind::Slide);
        assert_eq!(
            "form_field".parse::<ContentKind>().unwrap(),
            ContentKind::FormField
        );
        assert!("banner".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_kind_display_matches_stored_value() {
        for kind in ContentKind::iter() {
            assert_eq!(kind.to_string().parse::<ContentKind>().unwrap(), kind);
        }
    }
}
