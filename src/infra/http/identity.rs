//! Requesting identity resolved from the authentication collaborator.
//!
//! Session issuance lives outside this service; requests carry a
//! `gazette_author` cookie naming the author, which is resolved against the
//! authors table. Unknown or absent identities are anonymous.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::COOKIE, request::Parts},
};
use tracing::warn;

use crate::domain::entities::AuthorRecord;

use super::public::HttpState;

pub const IDENTITY_COOKIE: &str = "gazette_author";

/// The authenticated author for this request, when one could be resolved.
#[derive(Debug, Clone)]
pub struct CurrentAuthor(pub Option<AuthorRecord>);

impl<S> FromRequestParts<S> for CurrentAuthor
where
    HttpState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(username) = cookie_value(parts, IDENTITY_COOKIE) else {
            return Ok(CurrentAuthor(None));
        };

        let state = HttpState::from_ref(state);
        match state.authors.find_by_username(&username).await {
            Ok(author) => Ok(CurrentAuthor(author)),
            Err(err) => {
                warn!(
                    target = "gazette::http::identity",
                    error = %err,
                    "identity lookup failed; treating request as anonymous"
                );
                Ok(CurrentAuthor(None))
            }
        }
    }
}

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .find(|value| !value.is_empty())
}
