//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables. Each entity has a Model
//! struct for data and an Entity struct for operations.

pub mod content_block;
pub mod content_item;
pub mod edition;
pub mod event_settings;
pub mod registration;

// Re-export specific types to avoid conflicts
pub use content_block::{
    BlockKey, Column as ContentBlockColumn, Entity as ContentBlock, Model as ContentBlockModel,
};
pub use content_item::{
    Column as ContentItemColumn, ContentKind, Entity as ContentItem, Model as ContentItemModel,
};
pub use edition::{Column as EditionColumn, Entity as Edition, Model as EditionModel};
pub use event_settings::{
    Column as EventSettingsColumn, Entity as EventSettings, Model as EventSettingsModel,
};
pub use registration::{
    Column as RegistrationColumn, Entity as Registration, Model as RegistrationModel,
};
