//! Anonymous visitor identity carried in the `pdt_visitor` cookie.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use timer_common::id::{PrefixedId, VisitorToken};

use crate::error::ApiError;
use crate::AppState;

pub const VISITOR_COOKIE: &str = "pdt_visitor";

/// Cookie lifetime in seconds.
pub const VISITOR_COOKIE_MAX_AGE: i64 = 60 * 60;

/// The visitor a request belongs to, resolved by [`ensure_visitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    pub token: String,
}

/// Middleware: resolve the visitor from the cookie, minting a token (and
/// setting the cookie on the response) when there is none.
pub async fn ensure_visitor(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(VISITOR_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| VisitorToken::is_well_formed(token));

    let (token, minted) = match existing {
        Some(token) => (token, false),
        None => (VisitorToken::generate(), true),
    };

    request.extensions_mut().insert(Visitor {
        token: token.clone(),
    });

    if !minted {
        return next.run(request).await;
    }

    tracing::debug!(visitor = %token, "new visitor");
    let response = next.run(request).await;
    let jar = jar.add(visitor_cookie(token, state.config.cookie_secure));
    (jar, response).into_response()
}

/// The cookie handed to a freshly minted visitor.
pub fn visitor_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((VISITOR_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(VISITOR_COOKIE_MAX_AGE))
        .secure(secure)
        .build()
}

impl<S: Send + Sync> FromRequestParts<S> for Visitor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Visitor>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Visitor middleware not installed"))
    }
}
