//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::EMPTY_SLUG,
    form::{FormData, REQUIRED},
};
use crate::{error::FormErrors, slug::slugify};

pub const GENRE_EXISTS: &str = "Такой жанр уже существует";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreRecord {
    pub name: String,
    pub slug: String,
}

/// Genre add/edit form
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct GenreForm {
    #[validate(length(max = 200, message = "Убедитесь, что это значение содержит не более 200 символов."))]
    pub name: String,
}

impl GenreForm {
    pub fn parse(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
        }
    }

    pub fn clean(self, mut errors: FormErrors) -> Result<GenreRecord, FormErrors> {
        if self.name.is_empty() {
            errors.add("name", REQUIRED);
        }
        if let Err(e) = self.validate() {
            errors.merge_validation(&e);
        }

        let slug = slugify(&self.name);
        if slug.is_empty() && !errors.has_field("name") {
            errors.add("name", EMPTY_SLUG);
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(GenreRecord {
            name: self.name,
            slug,
        })
    }
}
