use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::repository::ExternalSystemRepository;
use crate::domain::types::ExternalSystem;
use crate::error::ExternalError;
use crate::state::AppState;

/// Authenticated subscriber, resolved from the `x-system-name` and
/// `x-api-key` headers against the active registry. Used by both the HTTP
/// ingress and the WebSocket upgrade.
#[derive(Debug, Clone)]
pub struct SystemAuth(pub ExternalSystem);

impl FromRequestParts<AppState> for SystemAuth {
    type Rejection = ExternalError;

    // Values are extracted synchronously and moved into a 'static block so
    // the returned future doesn't capture `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let system_name = header_value(parts, "x-system-name");
        let api_key = header_value(parts, "x-api-key");
        let repo = state.systems();

        async move {
            let (Some(system_name), Some(api_key)) = (system_name, api_key) else {
                return Err(ExternalError::Unauthorized);
            };
            repo.find_active_by_auth(&system_name, &api_key)
                .await?
                .map(SystemAuth)
                .ok_or(ExternalError::Unauthorized)
        }
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
