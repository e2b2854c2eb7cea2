use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use samved_db::models::GenerationRow;
use samved_llm::prompt::{self, MAX_COUNT, MIN_COUNT, SUPPORTED_LANGUAGES};
use samved_types::api::{Claims, GenerateRequest, GenerationView, LanguageEntry};
use samved_types::models::{GenerationRecord, RatingCounts};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
pub struct SharedQuery {
    pub id: i64,
}

/// POST /generations: validate, prompt the model, persist the result.
///
/// Nothing is stored unless the completion succeeds.
pub async fn create_generation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = req.topic.trim().to_string();
    if topic.is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".into()));
    }
    if !(MIN_COUNT..=MAX_COUNT).contains(&req.count) {
        return Err(ApiError::BadRequest(format!(
            "count must be between {} and {}",
            MIN_COUNT, MAX_COUNT
        )));
    }
    if prompt::language_code(&req.language).is_none() {
        return Err(ApiError::BadRequest(format!("unsupported language: {}", req.language)));
    }

    let request = prompt::build(req.count, &topic, &req.language);
    let text = state.completer.complete(&request).await?;

    let owner = claims.sub.to_string();
    let language = req.language;
    let count = req.count;
    let row = with_db(&state, move |db| {
        let id = db.create_generation(Some(&owner), &topic, &language, count, &text)?;
        db.get_generation(id)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("generation {} vanished after insert", id)))
    })
    .await?;

    info!("User {} created generation {}", claims.username, row.id);
    Ok((
        StatusCode::CREATED,
        Json(to_view(row, RatingCounts::default(), false)),
    ))
}

/// GET /generations: the caller's own history, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let limit = query.limit.min(200);
    let views = with_db(&state, move |db| {
        let rows = db.list_generations_by_owner(&owner, limit)?;
        with_ratings(db, rows, &owner)
    })
    .await?;

    Ok(Json(views))
}

/// GET /generations/all: every user's history, newest first.
pub async fn list_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub.to_string();
    let limit = query.limit.min(200);
    let views = with_db(&state, move |db| {
        let rows = db.list_all_generations(limit)?;
        with_ratings(db, rows, &viewer)
    })
    .await?;

    Ok(Json(views))
}

/// GET /generations/{id}
pub async fn get_generation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load_view(&state, id, claims.sub).await?))
}

/// GET /shared?id=N: the shareable-link form of a record lookup.
pub async fn get_shared(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SharedQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load_view(&state, query.id, claims.sub).await?))
}

/// GET /languages
pub async fn list_languages() -> impl IntoResponse {
    let languages: Vec<LanguageEntry> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(name, code)| LanguageEntry {
            name: name.to_string(),
            code: code.to_string(),
        })
        .collect();
    Json(languages)
}

async fn load_view(state: &AppState, id: i64, viewer: Uuid) -> Result<GenerationView, ApiError> {
    let viewer = viewer.to_string();
    with_db(state, move |db| {
        let row = db.get_generation(id)?.ok_or(ApiError::NotFound("generation"))?;
        let counts = db.rating_counts(id)?;
        let has_voted = db.has_voted(id, &viewer)?;
        Ok(to_view(row, counts, has_voted))
    })
    .await
}

fn with_ratings(
    db: &samved_db::Database,
    rows: Vec<GenerationRow>,
    viewer: &str,
) -> Result<Vec<GenerationView>, ApiError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let counts: HashMap<i64, RatingCounts> = db.rating_counts_for_generations(&ids)?;
    let voted: HashSet<i64> = db.voted_generations(&ids, viewer)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            to_view(
                row,
                counts.get(&id).copied().unwrap_or_default(),
                voted.contains(&id),
            )
        })
        .collect())
}

pub(crate) fn to_record(row: GenerationRow) -> (GenerationRecord, Option<String>) {
    let owner_id = row.owner_id.as_deref().and_then(|id| {
        id.parse::<Uuid>()
            .map_err(|e| warn!("Corrupt owner_id '{}' on generation {}: {}", id, row.id, e))
            .ok()
    });

    let created_at = row
        .created_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            chrono::NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on generation {}: {}", row.created_at, row.id, e);
            chrono::DateTime::default()
        });

    let record = GenerationRecord {
        id: row.id,
        owner_id,
        topic: row.topic,
        language: row.language,
        count: row.count,
        text: row.text,
        created_at,
    };
    (record, row.owner_username)
}

fn to_view(row: GenerationRow, counts: RatingCounts, has_voted: bool) -> GenerationView {
    let (record, owner_username) = to_record(row);
    GenerationView {
        id: record.id,
        owner_id: record.owner_id,
        owner_username,
        topic: record.topic,
        language: record.language,
        count: record.count,
        text: record.text,
        created_at: record.created_at,
        likes: counts.likes,
        dislikes: counts.dislikes,
        has_voted,
    }
}
