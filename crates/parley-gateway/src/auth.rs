// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin authentication for the HTTP API.
//!
//! Requests identify themselves with an `X-Admin-ID` header carrying a
//! transport user id. The id must be on the admin allow-list. With an empty
//! allow-list every request is rejected (fail-closed).

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub const ADMIN_HEADER: &str = "x-admin-id";

/// The authenticated admin, inserted as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminId(pub i64);

/// Authentication configuration for the gateway.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub admin_ids: Arc<HashSet<i64>>,
}

impl AuthConfig {
    pub fn new(admin_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admin_ids: Arc::new(admin_ids.into_iter().collect()),
        }
    }
}

pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.admin_ids.is_empty() {
        tracing::error!("gateway has no admins configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let Some(admin) = request
        .headers()
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
    else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if !auth.admin_ids.contains(&admin) {
        tracing::debug!(admin_id = admin, "gateway request from non-admin rejected");
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AdminId(admin));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_collects_allow_list() {
        let config = AuthConfig::new([1, 2, 2]);
        assert_eq!(config.admin_ids.len(), 2);
        assert!(config.admin_ids.contains(&1));
    }

    #[test]
    fn default_auth_config_is_empty() {
        assert!(AuthConfig::default().admin_ids.is_empty());
    }
}
