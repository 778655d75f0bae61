//! Validation rules for the application form.
//!
//! [`validate`] turns the raw strings typed into the dialog into a
//! [`FormRecord`], or into a [`FieldErrors`] map with one message per
//! offending field. Bad input is a value, never an error or a panic.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;
const EMAIL_MAX_CHARS: usize = 100;

/// Form fields in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Position,
    Github,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Position, Self::Github];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name / nickname",
            Self::Email => "Email",
            Self::Position => "Frontend experience",
            Self::Github => "GitHub link (optional)",
        }
    }
}

/// Experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Junior,
    Senior,
    Lead,
}

impl Position {
    pub const ALL: [Self; 3] = [Self::Junior, Self::Senior, Self::Lead];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Senior => "senior",
            Self::Lead => "lead",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Junior => "0-3 years",
            Self::Senior => "4-7 years",
            Self::Lead => "8+ years",
        }
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|position| position.code() == s)
            .ok_or(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unvalidated field values as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawForm {
    pub name: String,
    pub email: String,
    /// Option code, empty while the placeholder is selected.
    pub position: String,
    pub github: String,
}

/// A validated, normalized submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub name: String,
    pub email: String,
    pub position: Position,
    /// Empty when no link was given.
    pub github: String,
}

/// Per-field error messages, ordered like [`Field::ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn first(&self) -> Option<Field> {
        self.0.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

/// Validate a raw form.
pub fn validate(raw: &RawForm) -> Result<FormRecord, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = check(&mut errors, Field::Name, validate_name(&raw.name));
    let email = check(&mut errors, Field::Email, validate_email(&raw.email));
    let position = check(&mut errors, Field::Position, validate_position(&raw.position));
    let github = check(&mut errors, Field::Github, validate_github(&raw.github));

    match (name, email, position, github) {
        (Some(name), Some(email), Some(position), Some(github)) => {
            Ok(FormRecord {
                name,
                email,
                position,
                github,
            })
        }
        _ => Err(errors),
    }
}

fn check<T>(errors: &mut FieldErrors, field: Field, result: Result<T, &str>) -> Option<T> {
    result.map_err(|message| errors.insert(field, message)).ok()
}

fn validate_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    let length = name.chars().count();
    if length == 0 {
        return Err("Please enter your name.");
    }
    if length < NAME_MIN_CHARS {
        return Err("Name must be at least 2 characters.");
    }
    if length > NAME_MAX_CHARS {
        return Err("Name must be at most 50 characters.");
    }
    Ok(name.to_string())
}

fn validate_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim();
    if email.is_empty() {
        return Err("Please enter your email.");
    }
    if !is_email_shaped(email) {
        return Err("Please enter a valid email address.");
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err("Email must be at most 100 characters.");
    }
    Ok(email.to_lowercase())
}

fn validate_position(raw: &str) -> Result<Position, &'static str> {
    raw.trim()
        .parse()
        .map_err(|()| "Please select your experience level.")
}

fn validate_github(raw: &str) -> Result<String, &'static str> {
    let link = raw.trim();
    if link.is_empty() || has_http_scheme(link) {
        Ok(link.to_string())
    } else {
        Err("Please enter a valid URL.")
    }
}

fn has_http_scheme(link: &str) -> bool {
    static HTTP_LINK_RE: OnceLock<Regex> = OnceLock::new();
    HTTP_LINK_RE
        .get_or_init(|| Regex::new(r"(?i)^https?://.+").expect("valid link regex"))
        .is_match(link)
}

/// One `@`, a dot-separated local part and at least two domain labels, the
/// last of which is alphabetic.
fn is_email_shaped(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            Regex::new(
                r"^[A-Za-z0-9_%+'-]+(?:\.[A-Za-z0-9_%+'-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
            )
            .expect("valid email regex")
        })
        .is_match(email)
}
