//! Admin panel routes. Mounted behind the bearer-token guard in `web::build_router`.

use super::{AppState, YearQuery, read_image};
use crate::{
    core::{
        blocks::upsert_block,
        collection::{CollectionEditor, Direction, EditorItem},
        confirmation::{ConfirmFlag, Confirmation},
        edition::{EditionRollover, start_new_edition},
        payload::ItemPayload,
        registration::list_for_year,
        settings::{SettingsUpdate, update_settings},
    },
    entities::{
        BlockKey, ContentBlockModel, ContentItem, ContentKind, EventSettingsModel,
        RegistrationModel,
    },
    errors::{Error, Result},
    storage::ImageUpload,
};
use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post, put},
};
use chrono::Utc;
use sea_orm::EntityTrait;
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/settings", put(save_settings))
        .route("/api/admin/editions", post(new_edition))
        .route("/api/admin/content/{kind}", put(save_content))
        .route("/api/admin/content/{kind}/{id}", delete(delete_content))
        .route("/api/admin/content/{kind}/{id}/move", post(move_content))
        .route("/api/admin/content/{kind}/{id}/image", post(content_image))
        .route("/api/admin/blocks/{key}", put(save_block))
        .route("/api/admin/registrations", get(registrations))
}

/// Settings form plus the revision it was loaded at
#[derive(Debug, Deserialize)]
struct SettingsRequest {
    revision: i32,
    #[serde(flatten)]
    update: SettingsUpdate,
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    direction: Direction,
}

async fn save_settings(
    State(state): State<AppState>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<EventSettingsModel>> {
    let saved = update_settings(&*state.db, request.revision, request.update).await?;
    Ok(Json(saved))
}

async fn new_edition(
    State(state): State<AppState>,
    Json(flag): Json<ConfirmFlag>,
) -> Result<Json<EditionRollover>> {
    let today = Utc::now().date_naive();
    let rollover = start_new_edition(&*state.db, flag.into(), today).await?;
    Ok(Json(rollover))
}

/// Loads the editor holding item `id` together with the item's position.
async fn editor_for<P: ItemPayload>(
    state: &AppState,
    id: i64,
) -> Result<(CollectionEditor<P>, usize)> {
    let model = ContentItem::find_by_id(id)
        .one(&*state.db)
        .await?
        .filter(|model| model.kind == P::KIND)
        .ok_or_else(|| Error::not_found(P::KIND.as_str(), id))?;
    let editor = CollectionEditor::<P>::load(&*state.db, model.year).await?;
    let index = editor
        .position_of(id)
        .ok_or_else(|| Error::not_found(P::KIND.as_str(), id))?;
    Ok((editor, index))
}

async fn save_list<P: ItemPayload>(state: &AppState, year: i32, body: Value) -> Result<Value> {
    let items: Vec<EditorItem<P>> =
        serde_json::from_value(body).map_err(|e| Error::Validation {
            message: format!("Invalid {} list: {e}", P::KIND),
        })?;
    let mut editor = CollectionEditor::from_items(year, items);
    let summary = editor.save(&*state.db, state.images.as_ref()).await?;
    Ok(json!({
        "year": year,
        "kind": P::KIND.as_str(),
        "summary": summary,
        "items": editor.items(),
    }))
}

async fn move_item<P: ItemPayload>(
    state: &AppState,
    id: i64,
    direction: Direction,
) -> Result<Value> {
    let (mut editor, index) = editor_for::<P>(state, id).await?;
    let moved = editor.swap(index, direction);
    if moved {
        editor.save(&*state.db, state.images.as_ref()).await?;
    }
    Ok(json!({ "moved": moved, "items": editor.items() }))
}

async fn remove_item<P: ItemPayload>(
    state: &AppState,
    id: i64,
    confirmation: Confirmation,
) -> Result<Value> {
    let (mut editor, index) = editor_for::<P>(state, id).await?;
    let removed = editor
        .remove(&*state.db, state.images.as_ref(), index, confirmation)
        .await?;
    // Persist the compacted ranks of the remaining items
    editor.save(&*state.db, state.images.as_ref()).await?;
    Ok(json!({ "removed": removed, "items": editor.items() }))
}

async fn replace_image<P: ItemPayload>(
    state: &AppState,
    id: i64,
    upload: ImageUpload,
) -> Result<Value> {
    let (mut editor, index) = editor_for::<P>(state, id).await?;
    editor.attach_image(index, upload)?;
    let summary = editor.save(&*state.db, state.images.as_ref()).await?;
    Ok(json!({ "summary": summary, "item": editor.items().get(index) }))
}

async fn save_content(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<YearQuery>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let kind: ContentKind = kind.parse()?;
    let year = query.resolve(&*state.db).await?;
    Ok(Json(for_kind!(kind, save_list(&state, year, body))?))
}

async fn move_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Value>> {
    let kind: ContentKind = kind.parse()?;
    Ok(Json(for_kind!(kind, move_item(&state, id, request.direction))?))
}

async fn delete_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Query(flag): Query<ConfirmFlag>,
) -> Result<Json<Value>> {
    let kind: ContentKind = kind.parse()?;
    let confirmation = Confirmation::from(flag);
    Ok(Json(for_kind!(kind, remove_item(&state, id, confirmation))?))
}

async fn content_image(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    multipart: Multipart,
) -> Result<Json<Value>> {
    let kind: ContentKind = kind.parse()?;
    let upload = read_image(multipart).await?;
    Ok(Json(for_kind!(kind, replace_image(&state, id, upload))?))
}

async fn save_block(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<YearQuery>,
    Json(body): Json<Value>,
) -> Result<Json<ContentBlockModel>> {
    let key: BlockKey = key.parse()?;
    let year = query.resolve(&*state.db).await?;
    Ok(Json(upsert_block(&*state.db, year, key, body).await?))
}

async fn registrations(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<RegistrationModel>>> {
    let year = query.resolve(&*state.db).await?;
    Ok(Json(list_for_year(&*state.db, year).await?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::settings::get_settings,
        test_utils::*,
        web::build_router,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use chrono::Datelike;
    use tower::ServiceExt;

    fn admin_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, admin_bearer())
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_rollover_requires_confirmation_and_requests_reload() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_test_state(dir.path()).await.unwrap();
        let db = state.db.clone();
        let app = build_router(state);

        let refused = app
            .clone()
            .oneshot(admin_json("POST", "/api/admin/editions", &json!({})))
            .await
            .unwrap();
        assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
        assert_eq!(get_settings(&*db).await.unwrap().current_year, 2026);

        let response = app
            .oneshot(admin_json("POST", "/api/admin/editions", &json!({"confirm": true})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let expected = Utc::now().year() + 1;
        assert_eq!(body["reload"], true);
        assert_eq!(body["previous_year"], 2026);
        assert_eq!(body["settings"]["current_year"], expected);
        assert_eq!(body["edition"]["label"], format!("Edición {expected}"));
    }

    #[tokio::test]
    async fn test_stale_settings_revision_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()).await.unwrap());

        let form = json!({
            "revision": 0,
            "event_name": "Marcha Cicloturista",
            "event_date": "2026-09-12T08:00:00Z",
            "capacity": 250,
            "price": 30.0,
            "payment_method": "Transferencia",
            "payment_details": "ES00 0000 0000",
            "registration_open": true,
        });
        let first = app
            .clone()
            .oneshot(admin_json("PUT", "/api/admin/settings", &form))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(response_json(first).await["revision"], 1);

        let second = app
            .oneshot(admin_json("PUT", "/api/admin/settings", &form))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(response_json(second).await["revision"], 1);
    }

    #[tokio::test]
    async fn test_save_move_and_delete_content() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()).await.unwrap());

        let list = json!([
            {"payload": {"name": "Ayuntamiento"}, "isNew": true},
            {"payload": {"name": "Ciclos Pérez"}, "isNew": true},
        ]);
        let saved = app
            .clone()
            .oneshot(admin_json("PUT", "/api/admin/content/sponsors", &list))
            .await
            .unwrap();
        assert_eq!(saved.status(), StatusCode::OK);
        let saved = response_json(saved).await;
        assert_eq!(saved["summary"]["created"], 2);
        let first_id = saved["items"][0]["id"].as_i64().unwrap();
        let second_id = saved["items"][1]["id"].as_i64().unwrap();

        let moved = app
            .clone()
            .oneshot(admin_json(
                "POST",
                &format!("/api/admin/content/sponsors/{second_id}/move"),
                &json!({"direction": "up"}),
            ))
            .await
            .unwrap();
        let moved = response_json(moved).await;
        assert_eq!(moved["moved"], true);
        assert_eq!(moved["items"][0]["id"], second_id);

        let unconfirmed = app
            .clone()
            .oneshot(admin_json(
                "DELETE",
                &format!("/api/admin/content/sponsors/{second_id}"),
                &json!(null),
            ))
            .await
            .unwrap();
        assert_eq!(unconfirmed.status(), StatusCode::BAD_REQUEST);

        let deleted = app
            .clone()
            .oneshot(admin_json(
                "DELETE",
                &format!("/api/admin/content/sponsors/{second_id}?confirm=true"),
                &json!(null),
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);
        let deleted = response_json(deleted).await;
        assert_eq!(deleted["items"][0]["id"], first_id);
        assert_eq!(deleted["items"][0]["order"], 0);

        let wrong_kind = app
            .oneshot(admin_json(
                "POST",
                &format!("/api/admin/content/slides/{first_id}/move"),
                &json!({"direction": "down"}),
            ))
            .await
            .unwrap();
        assert_eq!(wrong_kind.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_payload_reports_saved_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()).await.unwrap());

        let list = json!([
            {"payload": {"name": "Ayuntamiento"}, "isNew": true},
            {"payload": {"name": ""}, "isNew": true},
        ]);
        let response = app
            .oneshot(admin_json("PUT", "/api/admin/content/sponsors", &list))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["saved"], 1);
    }

    #[tokio::test]
    async fn test_content_image_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()).await.unwrap());

        let saved = app
            .clone()
            .oneshot(admin_json(
                "PUT",
                "/api/admin/content/photos",
                &json!([{"payload": {"caption": "Salida"}, "isNew": true}]),
            ))
            .await
            .unwrap();
        let id = response_json(saved).await["items"][0]["id"].as_i64().unwrap();

        let (content_type, body) = multipart_body("notes.txt", "text/plain", b"hola");
        let response = app
            .oneshot(
                Request::post(format!("/api/admin/content/photos/{id}/image"))
                    .header(AUTHORIZATION, admin_bearer())
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_content_image_is_stored_and_linked() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()).await.unwrap());

        let saved = app
            .clone()
            .oneshot(admin_json(
                "PUT",
                "/api/admin/content/photos",
                &json!([{"payload": {"caption": "Meta"}, "isNew": true}]),
            ))
            .await
            .unwrap();
        let id = response_json(saved).await["items"][0]["id"].as_i64().unwrap();

        let (content_type, body) = multipart_body("meta.png", "image/png", b"\x89PNG");
        let response = app
            .oneshot(
                Request::post(format!("/api/admin/content/photos/{id}/image"))
                    .header(AUTHORIZATION, admin_bearer())
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["summary"]["uploaded"], 1);
        let url = body["item"]["image_url"].as_str().unwrap();
        assert!(url.starts_with("/uploads/") && url.ends_with("meta.png"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_list_save_cannot_claim_items_of_another_list() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_test_state(dir.path()).await.unwrap();
        let db = state.db.clone();
        let app = build_router(state);

        let saved = app
            .clone()
            .oneshot(admin_json(
                "PUT",
                "/api/admin/content/sponsors",
                &json!([{"payload": {"name": "Ayuntamiento"}, "isNew": true}]),
            ))
            .await
            .unwrap();
        let sponsor_id = response_json(saved).await["items"][0]["id"]
            .as_i64()
            .unwrap();

        let response = app
            .oneshot(admin_json(
                "PUT",
                "/api/admin/content/slides?year=2025",
                &json!([{"id": sponsor_id, "isNew": false, "payload": {"title": "Otra"}}]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response_json(response).await["saved"], 0);

        let row = ContentItem::find_by_id(sponsor_id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.kind, ContentKind::Sponsor);
        assert_eq!(row.year, 2026);
        assert_eq!(row.payload["name"], "Ayuntamiento");
    }

    #[tokio::test]
    async fn test_remote_item_image_is_deleted_with_item() {
        let api = FakeFileApi::spawn().await;
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(
            setup_test_state_with_remote(dir.path(), &api.base_url)
                .await
                .unwrap(),
        );

        let saved = app
            .clone()
            .oneshot(admin_json(
                "PUT",
                "/api/admin/content/photos",
                &json!([{"payload": {"caption": "Salida"}, "isNew": true}]),
            ))
            .await
            .unwrap();
        let id = response_json(saved).await["items"][0]["id"].as_i64().unwrap();

        let (content_type, body) = multipart_body("salida.png", "image/png", b"\x89PNG");
        let attached = app
            .clone()
            .oneshot(
                Request::post(format!("/api/admin/content/photos/{id}/image"))
                    .header(AUTHORIZATION, admin_bearer())
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(attached.status(), StatusCode::OK);
        let attached = response_json(attached).await;
        assert_eq!(attached["item"]["image_ref"], "remote:f-123");
        assert_eq!(attached["item"]["image_url"], "https://cdn.test/salida.png");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let deleted = app
            .oneshot(admin_json(
                "DELETE",
                &format!("/api/admin/content/photos/{id}?confirm=true"),
                &json!(null),
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);
        assert_eq!(api.deleted(), vec!["f-123"]);
    }

    #[tokio::test]
    async fn test_block_save_and_registration_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path()).await.unwrap());

        let block = app
            .clone()
            .oneshot(admin_json(
                "PUT",
                "/api/admin/blocks/history?year=2025",
                &json!({"text": "Primera edición"}),
            ))
            .await
            .unwrap();
        assert_eq!(block.status(), StatusCode::OK);
        assert_eq!(response_json(block).await["year"], 2025);

        let listing = app
            .oneshot(
                Request::get("/api/admin/registrations?year=2026")
                    .header(AUTHORIZATION, admin_bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(listing.status(), StatusCode::OK);
        assert!(response_json(listing).await.as_array().unwrap().is_empty());
    }
}
