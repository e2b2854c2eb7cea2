use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RatingValue, VoteOutcome};

// -- JWT Claims --

/// JWT claims issued on register/login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Generations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateRequest {
    pub topic: String,
    #[serde(default = "default_count")]
    pub count: u32,
    pub language: String,
}

fn default_count() -> u32 {
    1
}

/// A generation record as shown to one viewer: the record itself plus its
/// aggregate ratings and whether the viewer already voted on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationView {
    pub id: i64,
    pub owner_id: Option<Uuid>,
    pub owner_username: Option<String>,
    pub topic: String,
    pub language: String,
    pub count: u32,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub dislikes: u64,
    pub has_voted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
}

// -- Ratings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub value: RatingValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub likes: u64,
    pub dislikes: u64,
}
