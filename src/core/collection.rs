//! Ordered collection editor - the create/reorder/delete/save cycle shared by
//! every list-shaped admin screen (slides, sponsors, galleries, photos, form fields).
//!
//! The editor holds the items of one (year, kind) pair in memory. Appends and
//! swaps are local until [`CollectionEditor::save`]; removals of persisted
//! items hit the database immediately. After every mutation the `order` of
//! each item is re-derived from its list position, so a successful save always
//! leaves the ranks `0..n-1`.

use crate::{
    core::{confirmation::Confirmation, payload::ItemPayload},
    entities::{ContentItem, ContentKind, content_item},
    errors::{Error, Result},
    storage::{ImageStore, ImageUpload},
};
use chrono::Utc;
use sea_orm::{ActiveValue::Set, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// Direction of a swap with a neighbouring item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards index 0
    Up,
    /// Towards the end of the list
    Down,
}

/// One item in the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorItem<P> {
    /// Database id; `None` until the item is first saved
    #[serde(default)]
    pub id: Option<i64>,
    /// Edition year
    #[serde(default)]
    pub year: i32,
    /// Zero-based rank, re-derived from list position
    #[serde(default)]
    pub order: i32,
    /// Kind-specific fields
    pub payload: P,
    /// Public URL or path of the stored image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Storage reference of the stored image
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Not yet written to the database; never stored
    #[serde(default, rename = "isNew")]
    pub is_new: bool,
    /// Replacement image waiting for the next save
    #[serde(skip)]
    pending_image: Option<ImageUpload>,
}

impl<P: ItemPayload> EditorItem<P> {
    /// A placeholder that exists only in the editor
    #[must_use]
    pub const fn placeholder(year: i32, payload: P) -> Self {
        Self {
            id: None,
            year,
            order: 0,
            payload,
            image_url: None,
            image_ref: None,
            is_new: true,
            pending_image: None,
        }
    }

    /// Builds an editor item from a stored row.
    ///
    /// # Errors
    /// Returns an error if the row is of a different kind or its payload does not
    /// match `P`
    pub fn from_model(model: content_item::Model) -> Result<Self> {
        if model.kind != P::KIND {
            return Err(Error::Validation {
                message: format!(
                    "Item {} is a {}, expected a {}",
                    model.id,
                    model.kind,
                    P::KIND
                ),
            });
        }
        Ok(Self {
            id: Some(model.id),
            year: model.year,
            order: model.position,
            payload: serde_json::from_value(model.payload)?,
            image_url: model.image_url,
            image_ref: model.image_ref,
            is_new: false,
            pending_image: None,
        })
    }

    /// Whether a replacement image is queued for the next save
    #[must_use]
    pub const fn has_pending_image(&self) -> bool {
        self.pending_image.is_some()
    }
}

/// Outcome of a successful [`CollectionEditor::save`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    /// Items inserted
    pub created: usize,
    /// Items updated
    pub updated: usize,
    /// Images uploaded before their record was written
    pub uploaded: usize,
}

/// Loads the stored items of one year and kind, sorted by rank.
///
/// Ties (two editors saving the same rank) are broken by id.
pub async fn load_items<C>(db: &C, year: i32, kind: ContentKind) -> Result<Vec<content_item::Model>>
where
    C: ConnectionTrait,
{
    ContentItem::find()
        .filter(content_item::Column::Year.eq(year))
        .filter(content_item::Column::Kind.eq(kind))
        .order_by_asc(content_item::Column::Position)
        .order_by_asc(content_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// In-memory ordered list of one kind of content for one edition year
#[derive(Debug, Clone)]
pub struct CollectionEditor<P: ItemPayload> {
    year: i32,
    items: Vec<EditorItem<P>>,
}

impl<P: ItemPayload> CollectionEditor<P> {
    /// An empty editor for `year`
    #[must_use]
    pub const fn new(year: i32) -> Self {
        Self {
            year,
            items: Vec::new(),
        }
    }

    /// An editor over items submitted by the admin panel, in the given order
    #[must_use]
    pub fn from_items(year: i32, items: Vec<EditorItem<P>>) -> Self {
        let mut editor = Self { year, items };
        editor.renumber();
        editor
    }

    /// Loads all items of `P::KIND` for `year`, sorted by rank.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored payload is malformed
    #[instrument(skip(db), fields(kind = %P::KIND))]
    pub async fn load<C>(db: &C, year: i32) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let items = load_items(db, year, P::KIND)
            .await?
            .into_iter()
            .map(EditorItem::from_model)
            .collect::<Result<Vec<_>>>()?;
        debug!("Loaded {} {} item(s) for {year}", items.len(), P::KIND);
        Ok(Self::from_items(year, items))
    }

    /// Like [`Self::load`], but never fails: on any error it logs a warning and
    /// falls back to `defaults` (possibly empty) so the page stays renderable.
    pub async fn load_or_default<C>(db: &C, year: i32, defaults: Vec<P>) -> Self
    where
        C: ConnectionTrait,
    {
        match Self::load(db, year).await {
            Ok(editor) => editor,
            Err(e) => {
                warn!(
                    "Failed to load {} items for {year}, using {} default(s): {e}",
                    P::KIND,
                    defaults.len()
                );
                let items = defaults
                    .into_iter()
                    .map(|payload| EditorItem::placeholder(year, payload))
                    .collect();
                Self::from_items(year, items)
            }
        }
    }

    /// Edition year this editor is scoped to
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Items in display order
    #[must_use]
    pub fn items(&self) -> &[EditorItem<P>] {
        &self.items
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of the item with database id `id`
    #[must_use]
    pub fn position_of(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id == Some(id))
    }

    /// Mutable access for editing an item's payload in place
    pub fn get_mut(&mut self, index: usize) -> Option<&mut EditorItem<P>> {
        self.items.get_mut(index)
    }

    /// Appends a new placeholder at the end and returns its index.
    /// Nothing is written until [`Self::save`].
    pub fn append(&mut self, payload: P) -> usize {
        let index = self.items.len();
        let mut item = EditorItem::placeholder(self.year, payload);
        item.order = i32::try_from(index).unwrap_or(i32::MAX);
        self.items.push(item);
        index
    }

    /// Swaps the item at `index` with its neighbour in `direction`.
    ///
    /// Returns `false` (and changes nothing) at the list boundaries or when
    /// `index` is out of range.
    pub fn swap(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        let Some(target) = target.filter(|&t| t < self.items.len() && index < self.items.len())
        else {
            return false;
        };
        self.items.swap(index, target);
        self.renumber();
        true
    }

    /// Queues `upload` to replace the image of the item at `index` on the next save.
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfRange` if there is no such item
    pub fn attach_image(&mut self, index: usize, upload: ImageUpload) -> Result<()> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        item.pending_image = Some(upload);
        Ok(())
    }

    /// Removes the item at `index`.
    ///
    /// Persisted items are deleted from the database right away, followed by a
    /// best-effort delete of their stored image; an image-delete failure is
    /// logged and otherwise ignored. The remaining items are renumbered.
    ///
    /// # Errors
    /// Returns an error without changing anything if the action was not
    /// confirmed, `index` is out of range, or the record delete fails
    #[instrument(skip(self, db, store), fields(kind = %P::KIND, year = self.year))]
    pub async fn remove<C>(
        &mut self,
        db: &C,
        store: &dyn ImageStore,
        index: usize,
        confirmation: Confirmation,
    ) -> Result<EditorItem<P>>
    where
        C: ConnectionTrait,
    {
        let len = self.items.len();
        let item = self
            .items
            .get(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        confirmation.require("delete item")?;

        if let (false, Some(id)) = (item.is_new, item.id) {
            ContentItem::delete_by_id(id).exec(db).await.inspect_err(|e| {
                error!("Failed to delete {} {id}: {e}", P::KIND);
            })?;
            info!("Deleted {} {id}", P::KIND);

            if let Some(reference) = &item.image_ref {
                if let Err(e) = store.delete(reference).await {
                    warn!("Could not delete image {reference} of {} {id}: {e}", P::KIND);
                }
            }
        }

        let removed = self.items.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Writes every item to the database in list order.
    ///
    /// For each item a pending image is uploaded first and its reference
    /// substituted; then the record is inserted (new items) or updated. Only
    /// rows of this editor's year and kind can be updated. The
    /// batch is not transactional: the first failure stops it and is returned
    /// as a single `Error::SaveFailed`, leaving earlier items saved.
    ///
    /// # Errors
    /// Returns `Error::SaveFailed` with the number of items written before the failure
    #[instrument(skip(self, db, store), fields(kind = %P::KIND, year = self.year))]
    pub async fn save<C>(&mut self, db: &C, store: &dyn ImageStore) -> Result<SaveSummary>
    where
        C: ConnectionTrait,
    {
        self.renumber();
        let year = self.year;
        let mut summary = SaveSummary::default();

        for (saved, item) in self.items.iter_mut().enumerate() {
            if let Err(e) = save_item(db, store, year, item, &mut summary).await {
                error!("Saving {} items for {year} stopped after {saved}: {e}", P::KIND);
                return Err(Error::SaveFailed {
                    saved,
                    source: Box::new(e),
                });
            }
        }

        info!(
            "Saved {} {} item(s) for {year} ({} new, {} updated)",
            self.items.len(),
            P::KIND,
            summary.created,
            summary.updated
        );
        Ok(summary)
    }

    fn renumber(&mut self) {
        let year = self.year;
        for (position, item) in self.items.iter_mut().enumerate() {
            item.order = i32::try_from(position).unwrap_or(i32::MAX);
            item.year = year;
        }
    }
}

async fn save_item<C, P>(
    db: &C,
    store: &dyn ImageStore,
    year: i32,
    item: &mut EditorItem<P>,
    summary: &mut SaveSummary,
) -> Result<()>
where
    C: ConnectionTrait,
    P: ItemPayload,
{
    item.payload.validate()?;

    let mut uploaded_image = None;
    let mut replaced_image = None;
    if let Some(upload) = item.pending_image.clone() {
        let stored = store.upload(upload).await?;
        uploaded_image = Some(stored.reference.clone());
        replaced_image = item.image_ref.replace(stored.reference);
        item.image_url = Some(stored.url);
        item.pending_image = None;
        summary.uploaded += 1;
    }

    let payload = serde_json::to_value(&item.payload)?;
    let now = Utc::now();

    match item.id.filter(|_| !item.is_new) {
        None => {
            let model = content_item::ActiveModel {
                kind: Set(P::KIND),
                year: Set(year),
                position: Set(item.order),
                image_url: Set(item.image_url.clone()),
                image_ref: Set(item.image_ref.clone()),
                payload: Set(payload),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            item.id = Some(model.id);
            item.is_new = false;
            summary.created += 1;
        }
        Some(id) => {
            // Only rows already in this (year, kind) list may be updated
            let result = ContentItem::update_many()
                .set(content_item::ActiveModel {
                    position: Set(item.order),
                    image_url: Set(item.image_url.clone()),
                    image_ref: Set(item.image_ref.clone()),
                    payload: Set(payload),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .filter(content_item::Column::Id.eq(id))
                .filter(content_item::Column::Year.eq(year))
                .filter(content_item::Column::Kind.eq(P::KIND))
                .exec(db)
                .await?;
            if result.rows_affected == 0 {
                warn!("{} {id} is not part of the {year} list", P::KIND);
                if let Some(orphan) = uploaded_image {
                    if let Err(e) = store.delete(&orphan).await {
                        warn!("Could not delete unused image {orphan}: {e}");
                    }
                }
                return Err(Error::not_found(format!("{} in {year}", P::KIND), id));
            }
            summary.updated += 1;
        }
    }

    if let Some(old) = replaced_image {
        if let Err(e) = store.delete(&old).await {
            warn!("Could not delete replaced image {old}: {e}");
        }
    }

    Ok(())
}
