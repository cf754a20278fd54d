//! Submitted form data, independent of the transport that carried it

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::FormErrors;

pub const REQUIRED: &str = "Обязательное поле.";
pub const INVALID_DATE: &str = "Введите правильную дату.";
pub const INVALID_NUMBER: &str = "Введите целое число.";
pub const INVALID_CHOICE: &str = "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";

/// An uploaded file as received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original file name, used only for its extension
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields (possibly repeated) and uploaded files of one form submission
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Upload>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.push_field(name, value);
        self
    }

    pub fn insert_file(&mut self, name: impl Into<String>, upload: Upload) {
        self.files.insert(name.into(), upload);
    }

    pub fn with_file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.insert_file(
            name,
            Upload {
                file_name: file_name.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        self
    }

    /// First value of a field, trimmed; empty when absent
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// First value of a field, `None` when absent or blank
    pub fn optional_text(&self, name: &str) -> Option<String> {
        Some(self.text(name)).filter(|v| !v.is_empty())
    }

    pub fn date(&self, name: &str, errors: &mut FormErrors) -> Option<NaiveDate> {
        let raw = self.optional_text(name)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(name, INVALID_DATE);
                None
            }
        }
    }

    pub fn integer(&self, name: &str, errors: &mut FormErrors) -> Option<i32> {
        let raw = self.optional_text(name)?;
        match raw.parse::<i32>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.add(name, INVALID_NUMBER);
                None
            }
        }
    }

    /// All non-blank values of a repeated id field
    pub fn ids(&self, name: &str, errors: &mut FormErrors) -> Vec<i32> {
        let mut ids = Vec::new();
        for raw in self.fields.get(name).into_iter().flatten() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<i32>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => {
                    errors.add(name, INVALID_CHOICE);
                    return Vec::new();
                }
            }
        }
        ids
    }

    /// Remove and return an uploaded file; empty uploads count as absent
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name).filter(|f| !f.bytes.is_empty())
    }
}
