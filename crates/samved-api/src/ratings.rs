use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use samved_types::api::{Claims, VoteRequest, VoteResponse};
use samved_types::models::VoteOutcome;

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::generations::to_record;

/// POST /generations/{id}/rating
///
/// 201 when the vote is stored, 409 when the caller already rated this
/// record. Both carry the current counts; an earlier vote is never changed.
pub async fn vote(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rater = claims.sub;
    let value = req.value;

    let (outcome, counts) = with_db(&state, move |db| {
        let row = db.get_generation(id)?.ok_or(ApiError::NotFound("generation"))?;
        let (record, _) = to_record(row);
        if record.owner_id == Some(rater) {
            return Err(ApiError::Forbidden("cannot rate your own generation".into()));
        }

        let outcome = db.vote(id, &rater.to_string(), value)?;
        let counts = db.rating_counts(id)?;
        Ok((outcome, counts))
    })
    .await?;

    let status = match outcome {
        VoteOutcome::Recorded => {
            info!("User {} rated generation {} as {}", claims.username, id, value);
            StatusCode::CREATED
        }
        VoteOutcome::AlreadyVoted => {
            debug!("User {} already rated generation {}", claims.username, id);
            StatusCode::CONFLICT
        }
    };

    Ok((
        status,
        Json(VoteResponse {
            outcome,
            likes: counts.likes,
            dislikes: counts.dislikes,
        }),
    ))
}
