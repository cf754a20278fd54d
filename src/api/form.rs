//! Reading form submissions into `FormData`

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};

use crate::{
    error::AppError,
    models::{FormData, Upload},
    AppState,
};

/// A form submission, multipart or urlencoded.
///
/// Never rejects: decoding errors are kept until the handler has checked permissions
/// and calls [`Submission::into_form`].
pub struct Submission(Result<FormData, AppError>);

impl Submission {
    pub fn into_form(self) -> Result<FormData, AppError> {
        self.0
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormData, AppError> {
    let mut data = FormData::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                data.insert_file(
                    name,
                    Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                data.push_field(name, value);
            }
        }
    }
    Ok(data)
}

#[async_trait]
impl FromRequest<AppState> for Submission {
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        let result = if is_multipart {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => read_multipart(multipart).await,
                Err(e) => Err(AppError::BadRequest(e.body_text())),
            }
        } else {
            match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(pairs)) => {
                    let mut data = FormData::new();
                    for (name, value) in pairs {
                        data.push_field(name, value);
                    }
                    Ok(data)
                }
                Err(e) => Err(AppError::BadRequest(e.body_text())),
            }
        };

        Ok(Submission(result))
    }
}
