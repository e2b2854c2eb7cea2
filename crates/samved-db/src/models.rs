/// Database row types. These map directly to SQLite rows and stay
/// independent of the samved-types API models.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct GenerationRow {
    pub id: i64,
    pub owner_id: Option<String>,
    pub owner_username: Option<String>,
    pub topic: String,
    pub language: String,
    pub count: u32,
    pub text: String,
    pub created_at: String,
}
