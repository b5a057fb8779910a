use email_address::{EmailAddress, Options};
use lazy_static::lazy_static;
use phonenumber::country;
use regex::Regex;
use time::{parsing::Parsable, Date};

use crate::error::AppError;

/// Bare `local@domain.tld` only: no display text, no `[ip]` domain, and the
/// domain needs at least one dot.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let options = Options::default()
        .without_display_text()
        .without_domain_literal()
        .with_required_tld();
    EmailAddress::parse_with_options(email, options)
        .map(|_| ())
        .map_err(|_| AppError::InvalidEmail)
}

/// Accepts both the national form (`08012345678`) and the international
/// form (`+2348012345678`) of a number in `region`'s numbering plan.
pub fn validate_phone(phone: &str, region: country::Id) -> Result<(), AppError> {
    let number = phonenumber::parse(Some(region), phone).map_err(|_| AppError::InvalidPhone)?;
    if phonenumber::is_valid(&number) {
        Ok(())
    } else {
        Err(AppError::InvalidPhone)
    }
}

/// Parses a `YYYY-MM-DD` date. Signed years and year zero are rejected even
/// when `format` would accept them.
pub fn validate_date(value: &str, format: &(impl Parsable + ?Sized)) -> Result<Date, AppError> {
    lazy_static! {
        static ref YMD_RE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
    }
    if !YMD_RE.is_match(value) {
        return Err(AppError::InvalidDate);
    }
    let date = Date::parse(value, format).map_err(|_| AppError::InvalidDate)?;
    if date.year() < 1 {
        return Err(AppError::InvalidDate);
    }
    Ok(date)
}

/// Lower-cased suffix after the last dot, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn allowed_extension(filename: &str, whitelist: &[&str]) -> bool {
    file_extension(filename).is_some_and(|ext| whitelist.contains(&ext.as_str()))
}
