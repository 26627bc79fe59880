//! Upgrade gate: credential verification on the WebSocket handshake.

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use tracing::info;

use roster_auth::{CredentialError, REFRESH_COOKIE};

use crate::server::AppState;

use super::session::run_presence_session;

/// GET /ws — authenticate and upgrade.
///
/// The credential travels as the `refreshToken` cookie shared with the REST
/// session-refresh flow. A request with no cookie is treated identically to
/// one with an invalid token: `401 Unauthorized`, empty body, no registry
/// mutation, no broadcast. There is no anonymous presence.
///
/// Credential verification runs before the upgrade is honored, so an
/// unauthenticated caller never gets a WebSocket at all.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    jar: CookieJar,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let verified = match jar.get(REFRESH_COOKIE) {
        None => Err(CredentialError::Missing),
        Some(cookie) => state.verifier.verify(cookie.value()),
    };

    let identity = match verified {
        Ok(identity) => identity,
        Err(err) => {
            info!(error = %err, "websocket upgrade rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    match ws {
        Ok(upgrade) => upgrade
            .on_upgrade(move |socket| run_presence_session(socket, identity, state)),
        Err(rejection) => rejection.into_response(),
    }
}
