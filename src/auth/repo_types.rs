use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                             // unique user ID
    pub email: String,                        // user email
    pub firstname: String,                    // display first name
    pub lastname: String,                     // display last name
    #[serde(skip_serializing)]
    pub password_hash: String,                // Argon2 hash, not exposed in JSON
    pub agreed_to_terms: bool,                // set once at registration
    pub created_at: OffsetDateTime,           // creation timestamp
    pub last_updated_at: OffsetDateTime,      // last update timestamp
    pub deleted_at: Option<OffsetDateTime>,   // soft delete marker
}

/// Fields required to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password_hash: String,
    pub agreed_to_terms: bool,
}
