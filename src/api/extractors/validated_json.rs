//! JSON body extractor that also runs the payload's `validator` rules.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

/// Request body that parsed and passed validation.
///
/// A body that is not JSON is a `BAD_REQUEST`; a well-formed body that
/// breaks a rule is a `VALIDATION_ERROR` listing every failed field.
///
/// ```rust,ignore
/// async fn create_group(ValidatedJson(form): ValidatedJson<CreateGroup>) { .. }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(reject_body)?;

        value
            .validate()
            .map_err(|e| AppError::validation(describe_failures(&e)))?;

        Ok(ValidatedJson(value))
    }
}

fn reject_body(rejection: JsonRejection) -> AppError {
    match rejection {
        // Syntactically fine JSON with wrong field types reads as a rule failure
        JsonRejection::JsonDataError(e) => AppError::validation(e.body_text()),
        other => AppError::bad_request(other.body_text()),
    }
}

/// One message per failed rule, ordered by field name.
fn describe_failures(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}
