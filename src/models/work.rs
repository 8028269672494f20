//! Work (cataloged title) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A literary work, written by exactly one author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Work {
    pub id: Option<i64>,
    pub title: String,
    pub genre: String,
    pub published_year: i32,
    pub author_id: i64,
}

/// Create / update work request.
/// The upper bound of `published_year` is configurable and checked by the integrity validator.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkData {
    #[validate(length(min = 1, max = 5000, message = "Title must be 1 to 5000 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Genre must be 1 to 5000 characters"))]
    pub genre: String,
    pub published_year: i32,
    pub author_id: i64,
}

impl From<WorkData> for Work {
    fn from(data: WorkData) -> Self {
        Self {
            id: None,
            title: data.title,
            genre: data.genre,
            published_year: data.published_year,
            author_id: data.author_id,
        }
    }
}

impl Work {
    pub fn apply(&mut self, data: WorkData) {
        self.title = data.title;
        self.genre = data.genre;
        self.published_year = data.published_year;
        self.author_id = data.author_id;
    }
}
