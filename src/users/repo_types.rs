use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// Row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub image_filename: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub surname: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub home_address: String,
    pub gender: String,
    pub date_of_birth: Date,
    pub facebook_username: Option<String>,
    pub twitter_username: Option<String>,
    pub instagram_username: Option<String>,
    pub created_at: OffsetDateTime, // set by the database on insert
}

/// Everything needed to insert a user; `id` and `created_at` are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub image_filename: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub surname: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub home_address: String,
    pub gender: String,
    pub date_of_birth: Date,
    pub facebook_username: Option<String>,
    pub twitter_username: Option<String>,
    pub instagram_username: Option<String>,
}
