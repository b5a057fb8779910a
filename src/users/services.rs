use time::macros::format_description;
use tracing::{info, warn};

use crate::{
    error::AppError,
    images::services::store_image,
    state::AppState,
    users::{
        dto::{RegistrationForm, Submission},
        repo::StoreError,
        repo_types::{NewUser, User},
        validation::{validate_date, validate_email, validate_phone},
    },
};

/// Validates a registration form and stores the user. Steps run in a fixed
/// order and the first failure is returned; the row is only inserted once
/// every check has passed.
pub async fn register_user(state: &AppState, form: RegistrationForm) -> Result<User, AppError> {
    let mut sub = form.require()?;
    validate_email(&sub.email)?;
    validate_phone(&sub.phone_number, state.config.phone_region)?;

    let image_filename = store_image(
        state.content.as_ref(),
        sub.image.take(),
        state.config.image_max_dimension,
    )
    .await?;

    let result = insert_user(state, sub, image_filename.clone()).await;

    // a rejected submission must not leave its image behind
    if let (Err(_), Some(key)) = (&result, &image_filename) {
        if let Err(e) = state.content.delete_object(key).await {
            warn!(error = %e, %key, "failed to remove image of rejected submission");
        }
    }
    result
}

async fn insert_user(
    state: &AppState,
    sub: Submission,
    image_filename: Option<String>,
) -> Result<User, AppError> {
    let date_of_birth =
        validate_date(&sub.date_of_birth, format_description!("[year]-[month]-[day]"))?;

    if state.users.find_by_email(&sub.email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let new_user = NewUser {
        image_filename,
        first_name: sub.first_name,
        middle_name: sub.middle_name,
        surname: sub.surname,
        last_name: sub.last_name,
        email: sub.email,
        phone_number: sub.phone_number,
        home_address: sub.home_address,
        gender: sub.gender,
        date_of_birth,
        facebook_username: sub.facebook_username,
        twitter_username: sub.twitter_username,
        instagram_username: sub.instagram_username,
    };

    // the lookup above can race with a concurrent submission
    let user = state.users.create(&new_user).await.map_err(|e| match e {
        StoreError::DuplicateEmail => AppError::DuplicateEmail,
        StoreError::Other(e) => AppError::Internal(e),
    })?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}
