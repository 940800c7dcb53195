use serde::Serialize;
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,                      // assigned by the database, never changes
    pub email: String,                // unique, stored as given
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String,      // Argon2 PHC string, not exposed in JSON
    pub is_active: bool,
}
