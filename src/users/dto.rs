use axum::extract::Multipart;
use bytes::Bytes;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{error::AppError, users::repo_types::User};

time::serde::format_description!(ymd, Date, "[year]-[month]-[day]");
time::serde::format_description!(
    timestamp,
    OffsetDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

/// Raw file part of a submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub body: Bytes,
}

/// Form fields of `POST /api/submit`. Values are trimmed and empty ones
/// dropped; unknown fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub surname: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub home_address: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub facebook_username: Option<String>,
    pub twitter_username: Option<String>,
    pub instagram_username: Option<String>,
    pub image: Option<ImageUpload>,
}

/// A form whose required fields are known to be present.
#[derive(Debug, Clone)]
pub struct Submission {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub surname: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub home_address: String,
    pub gender: String,
    pub date_of_birth: String,
    pub facebook_username: Option<String>,
    pub twitter_username: Option<String>,
    pub instagram_username: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Column widths of the `users` table. `home_address` is unbounded.
const FIELD_LIMITS: &[(&str, usize)] = &[
    ("first_name", 100),
    ("middle_name", 100),
    ("surname", 100),
    ("last_name", 100),
    ("email", 120),
    ("phone_number", 20),
    ("gender", 10),
    ("facebook_username", 100),
    ("twitter_username", 100),
    ("instagram_username", 100),
];

fn check_len(field: &'static str, value: Option<&str>) -> Result<(), AppError> {
    let Some(value) = value else {
        return Ok(());
    };
    match FIELD_LIMITS.iter().find(|(name, _)| *name == field) {
        Some(&(_, max)) if value.chars().count() > max => {
            Err(AppError::FieldTooLong { field, max })
        }
        _ => Ok(()),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl RegistrationForm {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = mp.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "image" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let body = field.bytes().await?;
                if !filename.is_empty() || !body.is_empty() {
                    form.image = Some(ImageUpload { filename, body });
                }
                continue;
            }
            let value = non_empty(field.text().await?);
            match name.as_str() {
                "first_name" => form.first_name = value,
                "middle_name" => form.middle_name = value,
                "surname" => form.surname = value,
                "last_name" => form.last_name = value,
                "email" => form.email = value,
                "phone_number" => form.phone_number = value,
                "home_address" => form.home_address = value,
                "gender" => form.gender = value,
                "date_of_birth" => form.date_of_birth = value,
                "facebook_username" => form.facebook_username = value,
                "twitter_username" => form.twitter_username = value,
                "instagram_username" => form.instagram_username = value,
                _ => {}
            }
        }
        Ok(form)
    }

    /// Checks required fields in form order and names the first one missing,
    /// then rejects any value wider than its column.
    pub fn require(self) -> Result<Submission, AppError> {
        fn take(v: Option<String>, name: &'static str) -> Result<String, AppError> {
            v.and_then(non_empty).ok_or(AppError::MissingField(name))
        }
        let sub = Submission {
            first_name: take(self.first_name, "first_name")?,
            surname: take(self.surname, "surname")?,
            email: take(self.email, "email")?.to_lowercase(),
            phone_number: take(self.phone_number, "phone_number")?,
            home_address: take(self.home_address, "home_address")?,
            gender: take(self.gender, "gender")?,
            date_of_birth: take(self.date_of_birth, "date_of_birth")?,
            middle_name: self.middle_name.and_then(non_empty),
            last_name: self.last_name.and_then(non_empty),
            facebook_username: self.facebook_username.and_then(non_empty),
            twitter_username: self.twitter_username.and_then(non_empty),
            instagram_username: self.instagram_username.and_then(non_empty),
            image: self.image,
        };

        check_len("first_name", Some(sub.first_name.as_str()))?;
        check_len("middle_name", sub.middle_name.as_deref())?;
        check_len("surname", Some(sub.surname.as_str()))?;
        check_len("last_name", sub.last_name.as_deref())?;
        check_len("email", Some(sub.email.as_str()))?;
        check_len("phone_number", Some(sub.phone_number.as_str()))?;
        check_len("gender", Some(sub.gender.as_str()))?;
        check_len("facebook_username", sub.facebook_username.as_deref())?;
        check_len("twitter_username", sub.twitter_username.as_deref())?;
        check_len("instagram_username", sub.instagram_username.as_deref())?;
        Ok(sub)
    }
}

/// Public view of a user. The stored image name and home address are not
/// exposed.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub surname: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub gender: String,
    #[serde(with = "ymd")]
    pub date_of_birth: Date,
    pub facebook_username: Option<String>,
    pub twitter_username: Option<String>,
    pub instagram_username: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            middle_name: u.middle_name,
            surname: u.surname,
            last_name: u.last_name,
            email: u.email,
            phone_number: u.phone_number,
            gender: u.gender,
            date_of_birth: u.date_of_birth,
            facebook_username: u.facebook_username,
            twitter_username: u.twitter_username,
            instagram_username: u.instagram_username,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use time::macros::{date, datetime};

    fn full_form() -> RegistrationForm {
        RegistrationForm {
            first_name: Some("Ada".into()),
            surname: Some("Obi".into()),
            email: Some("Ada@Example.com".into()),
            phone_number: Some("08012345678".into()),
            home_address: Some("12 Marina Road, Lagos".into()),
            gender: Some("F".into()),
            date_of_birth: Some("1990-05-17".into()),
            twitter_username: Some("   ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn require_names_first_missing_field() {
        let mut form = full_form();
        form.email = None;
        form.gender = None;
        let err = form.require().unwrap_err();
        assert!(matches!(err, AppError::MissingField("email")));
    }

    #[test]
    fn whitespace_only_required_field_counts_as_missing() {
        let mut form = full_form();
        form.home_address = Some("  \t".into());
        assert!(matches!(
            form.require().unwrap_err(),
            AppError::MissingField("home_address")
        ));
    }

    #[test]
    fn values_wider_than_their_column_are_rejected() {
        let mut form = full_form();
        form.phone_number = Some("0801 234 5678 ext. 1234".into());
        assert!(matches!(
            form.require().unwrap_err(),
            AppError::FieldTooLong {
                field: "phone_number",
                max: 20
            }
        ));

        let mut form = full_form();
        form.gender = Some("nonbinary-x".into());
        assert!(matches!(
            form.require().unwrap_err(),
            AppError::FieldTooLong { field: "gender", .. }
        ));

        let mut form = full_form();
        form.instagram_username = Some("a".repeat(101));
        assert!(matches!(
            form.require().unwrap_err(),
            AppError::FieldTooLong {
                field: "instagram_username",
                ..
            }
        ));
    }

    #[test]
    fn values_at_column_width_are_accepted() {
        let mut form = full_form();
        form.first_name = Some("é".repeat(100));
        form.home_address = Some("x".repeat(5000));
        assert!(form.require().is_ok());
    }

    #[test]
    fn require_normalizes_values() {
        let sub = full_form().require().unwrap();
        assert_eq!(sub.email, "ada@example.com");
        assert_eq!(sub.twitter_username, None);
        assert_eq!(sub.middle_name, None);
    }

    #[test]
    fn public_user_serialization_formats_dates_and_hides_private_fields() {
        let user = User {
            id: 7,
            image_filename: Some("abc.png".into()),
            first_name: "Ada".into(),
            middle_name: None,
            surname: "Obi".into(),
            last_name: Some("Eze".into()),
            email: "ada@example.com".into(),
            phone_number: "08012345678".into(),
            home_address: "12 Marina Road".into(),
            gender: "F".into(),
            date_of_birth: date!(1990 - 05 - 17),
            facebook_username: None,
            twitter_username: Some("ada".into()),
            instagram_username: None,
            created_at: datetime!(2024-06-01 09:30:05 UTC),
        };

        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["date_of_birth"], "1990-05-17");
        assert_eq!(json["created_at"], "2024-06-01 09:30:05");
        assert_eq!(json["middle_name"], serde_json::Value::Null);
        assert_eq!(json["twitter_username"], "ada");
        assert!(json.get("image_filename").is_none());
        assert!(json.get("home_address").is_none());
    }
}
