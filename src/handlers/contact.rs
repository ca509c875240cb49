use axum::{
    Form, Json,
    extract::{
        ConnectInfo, FromRequest, FromRequestParts, Request, State,
        rejection::JsonRejection,
    },
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error};

use crate::contact::ContactOutcome;
use crate::error::ErrorBody;
use crate::state::AppState;
use crate::validate::Submission;

// Rate limit key for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl FromRequestParts<Arc<AppState>> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if state.trust_proxy {
            let forwarded = parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return Ok(ClientId(ip.to_string()));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientId(peer))
    }
}

/// Contact form body, read as url-encoded when the client says so and as
/// JSON otherwise.
///
/// A body with no JSON content type, or JSON of the wrong shape, reads as a
/// form with every field absent. A body that cannot be read at all (bad
/// syntax, over the size limit) is rejected before the rate limiter sees it.
#[derive(Debug)]
pub struct ContactPayload(pub Submission);

// Unreadable body, answered like any other unhandled server error
#[derive(Debug)]
pub struct PayloadRejection(String);

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        error!(error = %self.0, "failed to read contact payload");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Internal server error")),
        )
            .into_response()
    }
}

impl<S> FromRequest<S> for ContactPayload
where
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                ct.trim_start()
                    .to_ascii_lowercase()
                    .starts_with("application/x-www-form-urlencoded")
            })
            .unwrap_or(false);

        if is_form {
            return match Form::<Submission>::from_request(req, state).await {
                Ok(Form(submission)) => Ok(ContactPayload(submission)),
                Err(rejection) => Err(PayloadRejection(rejection.body_text())),
            };
        }

        match Json::<Submission>::from_request(req, state).await {
            Ok(Json(submission)) => Ok(ContactPayload(submission)),
            Err(rejection @ (JsonRejection::MissingJsonContentType(_)
            | JsonRejection::JsonDataError(_))) => {
                debug!(error = %rejection, "contact payload has no usable fields");
                Ok(ContactPayload(Submission::default()))
            }
            Err(rejection) => Err(PayloadRejection(rejection.body_text())),
        }
    }
}

// POST /contact
pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    ContactPayload(submission): ContactPayload,
) -> ContactOutcome {
    state.contact.handle(&client, &submission).await
}
