//! Request extractors.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use barrier_core::audit::Actor;

/// The authenticated user, if any.
///
/// Authentication itself happens in the server's middleware, which inserts
/// an [`Actor`] into the request extensions. Requests without one are
/// anonymous.
#[derive(Debug, Clone, Default)]
pub struct CurrentActor(pub Option<Actor>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Self(parts.extensions.get::<Actor>().cloned()))
  }
}
