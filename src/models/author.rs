//! Author model and related types

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::form::{FormData, REQUIRED};
use crate::{error::FormErrors, slug::author_slug};

pub const AUTHOR_EXISTS: &str = "Такой автор уже существует";
pub const DEATH_BEFORE_BIRTH: &str = "Дата смерти не может быть раньше даты рождения";
pub const EMPTY_SLUG: &str = "Из этого значения нельзя получить идентификатор";

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub slug: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
    pub about: String,
    /// Media path of the portrait, relative to the media root
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn absolute_url(&self) -> String {
        format!("/author/{}", self.slug)
    }

    pub fn to_ref(&self) -> AuthorRef {
        AuthorRef {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            slug: self.slug.clone(),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.last_name, self.first_name)
    }
}

/// Author as referenced from a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub slug: String,
}

impl fmt::Display for AuthorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.last_name, self.first_name)
    }
}

/// Validated values written to the store; the slug is always derived here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub first_name: String,
    pub last_name: String,
    pub slug: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
    pub about: String,
}

/// Author add/edit form
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct AuthorForm {
    #[validate(length(max = 50, message = "Убедитесь, что это значение содержит не более 50 символов."))]
    pub first_name: String,
    #[validate(length(max = 50, message = "Убедитесь, что это значение содержит не более 50 символов."))]
    pub last_name: String,
    #[validate(required(message = "Обязательное поле."))]
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Убедитесь, что это значение содержит не более 1000 символов."))]
    pub about: String,
}

impl AuthorForm {
    /// Read the form fields, recording parse failures
    pub fn parse(data: &FormData) -> (Self, FormErrors) {
        let mut errors = FormErrors::new();
        let form = Self {
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            date_of_birth: data.date("date_of_birth", &mut errors),
            date_of_death: data.date("date_of_death", &mut errors),
            about: data.text("about"),
        };
        (form, errors)
    }

    /// Run every field and cross-field check and build the store record
    pub fn clean(self, mut errors: FormErrors) -> Result<AuthorRecord, FormErrors> {
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.is_empty() {
                errors.add(field, REQUIRED);
            }
        }
        if let Err(e) = self.validate() {
            errors.merge_validation(&e);
        }

        if let (Some(birth), Some(death)) = (self.date_of_birth, self.date_of_death) {
            if death < birth {
                errors.add("date_of_death", DEATH_BEFORE_BIRTH);
            }
        }

        let slug = author_slug(&self.first_name, &self.last_name);
        if slug.is_empty() && !errors.has_field("first_name") && !errors.has_field("last_name") {
            errors.add("last_name", EMPTY_SLUG);
        }

        let Some(date_of_birth) = self.date_of_birth else {
            if !errors.has_field("date_of_birth") {
                errors.add("date_of_birth", REQUIRED);
            }
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AuthorRecord {
            first_name: self.first_name,
            last_name: self.last_name,
            slug,
            date_of_birth,
            date_of_death: self.date_of_death,
            about: self.about,
        })
    }

    /// Initial values for an edit form
    pub fn from_author(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            date_of_birth: Some(author.date_of_birth),
            date_of_death: author.date_of_death,
            about: author.about.clone(),
        }
    }
}
