//! Request extractors that reject with [`AppError`] so every malformed input
//! becomes a 400 with an `errors` body.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use crate::error::AppError;

/// JSON body. An empty body is read as `{}` so that missing fields are
/// reported by validation rather than as a parse failure.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid(rejection.body_text()))?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(body)
            .map(Self)
            .map_err(|err| AppError::invalid(format!("invalid request body: {err}")))
    }
}

pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `?withRelations=true`; any other value, or none, means no relations.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationsQuery {
    with_relations: Option<String>,
}

impl RelationsQuery {
    pub fn enabled(&self) -> bool {
        flag_enabled(self.with_relations.as_deref())
    }
}

pub fn flag_enabled(raw: Option<&str>) -> bool {
    raw == Some("true")
}

pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid(format!("{field} must be a valid UUID")))
}

/// Parses two path identifiers, reporting both when both are malformed.
pub fn parse_id_pair(
    (first_field, first): (&str, &str),
    (second_field, second): (&str, &str),
) -> Result<(Uuid, Uuid), AppError> {
    match (parse_id(first_field, first), parse_id(second_field, second)) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(AppError::Validation(mut a)), Err(AppError::Validation(b))) => {
            a.extend(b);
            Err(AppError::Validation(a))
        }
        (Err(err), _) | (_, Err(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_uuids() {
        assert!(parse_id("id", "0b7c5f3e-8d1a-4c55-9d43-2f1e7e6b1a10").is_ok());
        let err = parse_id("tripId", "abc").unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(msgs) if msgs == ["tripId must be a valid UUID"]
        ));
    }

    #[test]
    fn both_bad_ids_are_reported() {
        let err = parse_id_pair(("tripId", "x"), ("destinationId", "y")).unwrap_err();
        assert!(matches!(err, AppError::Validation(msgs) if msgs.len() == 2));
    }

    #[test]
    fn only_literal_true_enables_relations() {
        assert!(flag_enabled(Some("true")));
        assert!(!flag_enabled(Some("1")));
        assert!(!flag_enabled(None));
    }
}
