//! Authentication extractor.
//!
//! `Unauthenticated -> Validating -> {Authenticated | Rejected}`: a request
//! without a Bearer token is rejected before any validation happens.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};
use uuid::Uuid;

use scribe_core::ports::{AuthError, bearer_token};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    /// Reject unless the caller is `user_id`.
    pub fn require_self(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You may only modify your own account.".to_string(),
            ))
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        AppError::Internal("AppState not found in app data".to_string())
    })?;

    let header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::from(AuthError::Malformed("non-ascii header".into())))?,
        ),
        None => None,
    };

    let token = bearer_token(header)?;
    let user_id = state.tokens.validate(token)?;

    Ok(Identity { user_id })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
