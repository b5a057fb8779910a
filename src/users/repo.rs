use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, image_filename, first_name, middle_name, surname, last_name, \
     email, phone_number, home_address, gender, date_of_birth, \
     facebook_username, twitter_username, instagram_username, created_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Insert a user. A clash on the unique email column is reported as
    /// [`StoreError::DuplicateEmail`].
    async fn create(&self, new_user: &NewUser) -> Result<User, StoreError>;
    /// All users in insertion order.
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create(&self, u: &NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                image_filename, first_name, middle_name, surname, last_name,
                email, phone_number, home_address, gender, date_of_birth,
                facebook_username, twitter_username, instagram_username
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&u.image_filename)
        .bind(&u.first_name)
        .bind(&u.middle_name)
        .bind(&u.surname)
        .bind(&u.last_name)
        .bind(&u.email)
        .bind(&u.phone_number)
        .bind(&u.home_address)
        .bind(&u.gender)
        .bind(u.date_of_birth)
        .bind(&u.facebook_username)
        .bind(&u.twitter_username)
        .bind(&u.instagram_username)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }
}
