//! Author model and related types

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Latin or Cyrillic letters, words separated by a single space
static AUTHOR_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zА-Яа-яЁё]+(?: [A-Za-zА-Яа-яЁё]+)*$").unwrap());

/// Full author model from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

/// Create / update author request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AuthorData {
    #[validate(
        length(min = 4, max = 150, message = "Author name must be 4 to 150 characters"),
        regex(path = *AUTHOR_NAME_RE, message = "Author name may only contain letters and single spaces")
    )]
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 150, message = "Nationality must not exceed 150 characters"))]
    pub nationality: Option<String>,
    #[validate(length(max = 500, message = "Biography must not exceed 500 characters"))]
    pub biography: Option<String>,
}

impl From<AuthorData> for Author {
    fn from(data: AuthorData) -> Self {
        Self {
            id: None,
            name: data.name,
            birth_date: data.birth_date,
            nationality: data.nationality,
            biography: data.biography,
        }
    }
}

impl Author {
    /// Overwrite every editable field, keeping the id
    pub fn apply(&mut self, data: AuthorData) {
        self.name = data.name;
        self.birth_date = data.birth_date;
        self.nationality = data.nationality;
        self.biography = data.biography;
    }
}
