use super::{AppState, YearQuery};
use crate::{
    core::{
        blocks::get_block,
        collection::{CollectionEditor, EditorItem},
        countdown::{CountdownState, evaluate},
        edition::list_editions,
        payload::ItemPayload,
        registration::{RegistrationConfirmation, RegistrationForm, find_by_code, submit_registration},
        settings::get_settings,
    },
    entities::{BlockKey, ContentBlockModel, ContentKind, EditionModel, EventSettingsModel},
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/settings", get(settings))
        .route("/api/countdown", get(countdown))
        .route("/api/editions", get(editions))
        .route("/api/content/{kind}", get(content))
        .route("/api/blocks/{key}", get(block))
        .route("/api/registrations", post(register))
        .route("/api/registrations/{code}", get(confirmation))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn settings(State(state): State<AppState>) -> Result<Json<EventSettingsModel>> {
    Ok(Json(get_settings(&*state.db).await?))
}

async fn countdown(State(state): State<AppState>) -> Result<Json<CountdownState>> {
    let settings = get_settings(&*state.db).await?;
    Ok(Json(evaluate(settings.event_date, Utc::now())))
}

async fn editions(State(state): State<AppState>) -> Result<Json<Vec<EditionModel>>> {
    Ok(Json(list_editions(&*state.db).await?))
}

async fn list_items<P: ItemPayload>(state: &AppState, year: i32) -> Value {
    let fallback = P::fallback(&state.config.defaults);
    let editor = CollectionEditor::<P>::load_or_default(&*state.db, year, fallback).await;
    let items: &[EditorItem<P>] = editor.items();
    json!({ "year": year, "kind": P::KIND.as_str(), "items": items })
}

async fn content(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Value>> {
    let kind: ContentKind = kind.parse()?;
    let year = query.resolve(&*state.db).await?;
    Ok(Json(for_kind!(kind, list_items(&state, year))))
}

async fn block(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<ContentBlockModel>> {
    let key: BlockKey = key.parse()?;
    let year = query.resolve(&*state.db).await?;
    get_block(&*state.db, year, key)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("{key:?} block"), year))
}

async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegistrationConfirmation>)> {
    let confirmation = submit_registration(&*state.db, form).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

async fn confirmation(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RegistrationConfirmation>> {
    Ok(Json(find_by_code(&*state.db, &code).await?))
}
