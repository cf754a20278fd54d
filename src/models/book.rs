//! Book model, its forms and its read projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::{AuthorRef, EMPTY_SLUG},
    form::{FormData, REQUIRED},
    genre::Genre,
};
use crate::{error::FormErrors, slug::slugify};

pub const BOOK_EXISTS: &str = "Такая книга уже существует";
pub const RATING_OUT_OF_RANGE: &str = "Рейтинг должен быть от 0 до 5.";

/// Number of genre names shown in list projections
pub const DISPLAY_GENRE_LIMIT: usize = 3;

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub author_id: Option<i32>,
    pub about: String,
    pub rating: i16,
    /// Media path of the book file, relative to the media root
    pub link_to_file: Option<String>,
    /// Media path of the cover, relative to the media root
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub author: Option<AuthorRef>,
    /// Attached genres, ordered by name
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Book {
    pub fn absolute_url(&self) -> String {
        format!("/book/{}", self.slug)
    }

    /// First genre names joined for list display
    pub fn display_genre(&self) -> String {
        self.genres
            .iter()
            .take(DISPLAY_GENRE_LIMIT)
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn genre_ids(&self) -> Vec<i32> {
        self.genres.iter().map(|g| g.id).collect()
    }

    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            url: self.absolute_url(),
            author: self.author.as_ref().map(|a| a.to_string()),
            genres: self.display_genre(),
            rating: self.rating,
            image: self.image.clone(),
        }
    }
}

/// Read-only projection handed to list and shelf pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub author: Option<String>,
    pub genres: String,
    pub rating: i16,
    pub image: Option<String>,
}

/// Which media column of a book a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookMediaField {
    Image,
    File,
}

impl BookMediaField {
    pub fn column(&self) -> &'static str {
        match self {
            BookMediaField::Image => "image",
            BookMediaField::File => "link_to_file",
        }
    }

    pub fn current<'a>(&self, book: &'a Book) -> Option<&'a str> {
        match self {
            BookMediaField::Image => book.image.as_deref(),
            BookMediaField::File => book.link_to_file.as_deref(),
        }
    }
}

/// Validated values written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub title: String,
    pub slug: String,
    pub author_id: Option<i32>,
    pub genre_ids: Vec<i32>,
    pub about: String,
    pub rating: i16,
}

/// Book add/edit form
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct BookForm {
    #[validate(length(max = 200, message = "Убедитесь, что это значение содержит не более 200 символов."))]
    pub title: String,
    #[serde(rename = "author")]
    pub author_id: Option<i32>,
    #[serde(rename = "genres")]
    pub genre_ids: Vec<i32>,
    #[validate(length(max = 1000, message = "Убедитесь, что это значение содержит не более 1000 символов."))]
    pub about: String,
    /// Absent on forms that leave the rating alone
    #[validate(range(min = 0, max = 5, message = "Рейтинг должен быть от 0 до 5."))]
    pub rating: Option<i32>,
}

impl BookForm {
    /// Read the form fields, recording parse failures
    pub fn parse(data: &FormData) -> (Self, FormErrors) {
        let mut errors = FormErrors::new();
        let form = Self {
            title: data.text("title"),
            author_id: data.integer("author", &mut errors),
            genre_ids: data.ids("genres", &mut errors),
            about: data.text("about"),
            rating: data.integer("rating", &mut errors),
        };
        (form, errors)
    }

    /// Field checks that need no store access; choice and uniqueness checks happen in the service
    pub fn clean(self, mut errors: FormErrors) -> Result<BookRecord, FormErrors> {
        for (field, value) in [("title", &self.title), ("about", &self.about)] {
            if value.is_empty() {
                errors.add(field, REQUIRED);
            }
        }
        if let Err(e) = self.validate() {
            errors.merge_validation(&e);
        }

        let slug = slugify(&self.title);
        if slug.is_empty() && !errors.has_field("title") {
            errors.add("title", EMPTY_SLUG);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BookRecord {
            title: self.title,
            slug,
            author_id: self.author_id,
            genre_ids: self.genre_ids,
            about: self.about,
            // range-checked above
            rating: self.rating.unwrap_or(0) as i16,
        })
    }

    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author_id: book.author_id,
            genre_ids: book.genre_ids(),
            about: book.about.clone(),
            rating: Some(book.rating as i32),
        }
    }
}

/// Book as exchanged over the REST API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookPayload {
    pub title: String,
    /// Author id, or null
    pub author: Option<i32>,
    /// Genre ids
    #[serde(default)]
    pub genre: Vec<i32>,
    pub about: String,
}

impl BookPayload {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author_id,
            genre: book.genre_ids(),
            about: book.about.clone(),
        }
    }

    /// Form view of the payload; rating is not part of the API and keeps `rating`
    pub fn into_form(self, rating: i16) -> BookForm {
        let mut genre_ids = Vec::with_capacity(self.genre.len());
        for id in self.genre {
            if !genre_ids.contains(&id) {
                genre_ids.push(id);
            }
        }
        BookForm {
            title: self.title.trim().to_string(),
            author_id: self.author,
            genre_ids,
            about: self.about.trim().to_string(),
            rating: Some(rating as i32),
        }
    }
}

/// Partial REST update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub author: Option<Option<i32>>,
    pub genre: Option<Vec<i32>>,
    pub about: Option<String>,
}

impl BookPatch {
    /// Overlay the patch on the current book
    pub fn apply(self, book: &Book) -> BookPayload {
        let current = BookPayload::from_book(book);
        BookPayload {
            title: self.title.unwrap_or(current.title),
            author: self.author.unwrap_or(current.author),
            genre: self.genre.unwrap_or(current.genre),
            about: self.about.unwrap_or(current.about),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
            slug: slugify(name),
        }
    }

    fn book_with_genres(genres: Vec<Genre>) -> Book {
        Book {
            id: 7,
            title: "Книга".into(),
            slug: "kniga".into(),
            author_id: None,
            about: "about".into(),
            rating: 0,
            link_to_file: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            author: None,
            genres,
        }
    }

    #[test]
    fn display_genre_keeps_first_three() {
        let book = book_with_genres(vec![
            genre(1, "Детектив"),
            genre(2, "Драма"),
            genre(3, "Поэзия"),
            genre(4, "Роман"),
            genre(5, "Фантастика"),
        ]);
        assert_eq!(book.display_genre(), "Детектив, Драма, Поэзия");
        assert_eq!(book.display_genre(), book.display_genre());
    }

    #[test]
    fn display_genre_handles_few_genres() {
        assert_eq!(book_with_genres(vec![]).display_genre(), "");
        assert_eq!(book_with_genres(vec![genre(1, "Роман")]).display_genre(), "Роман");
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        for rating in ["6", "-1"] {
            let data = FormData::new()
                .with_field("title", "Title")
                .with_field("about", "About")
                .with_field("rating", rating);
            let (form, errors) = BookForm::parse(&data);
            let errors = form.clean(errors).unwrap_err();
            assert_eq!(errors.fields["rating"], vec![RATING_OUT_OF_RANGE]);
        }
    }

    #[test]
    fn rating_defaults_to_zero() {
        let data = FormData::new()
            .with_field("title", "Мастер и Маргарита")
            .with_field("about", "Роман")
            .with_field("genres", "2")
            .with_field("genres", "1");
        let (form, errors) = BookForm::parse(&data);
        let record = form.clean(errors).unwrap();
        assert_eq!(record.rating, 0);
        assert_eq!(record.slug, "master-i-margarita");
        assert_eq!(record.genre_ids, vec![2, 1]);
        assert_eq!(record.author_id, None);
    }

    #[test]
    fn patch_distinguishes_null_author_from_missing() {
        let mut book = book_with_genres(vec![genre(1, "Роман")]);
        book.author_id = Some(3);

        let keep: BookPatch = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        let payload = keep.apply(&book);
        assert_eq!(payload.author, Some(3));
        assert_eq!(payload.title, "New");
        assert_eq!(payload.genre, vec![1]);

        let clear: BookPatch = serde_json::from_str(r#"{"author": null}"#).unwrap();
        assert_eq!(clear.apply(&book).author, None);
    }
}
