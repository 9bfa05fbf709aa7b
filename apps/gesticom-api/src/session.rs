//! # Operator Session
//!
//! Resolves the acting [`Operator`] once per request.
//!
//! The identity provider in front of the service authenticates the user and
//! forwards their id in the `x-operator-id` header. The id is looked up in
//! the users table; unknown and inactive users are rejected with `401`.
//! Role checks happen later, in the handlers or in the sale engine.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gesticom_core::{Operator, Role};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const OPERATOR_HEADER: &str = "x-operator-id";

/// The operator behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentOperator(pub Operator);

impl CurrentOperator {
    /// Fails with `PermissionDenied` unless the operator holds `role`.
    pub fn require(&self, role: Role, action: &str) -> ApiResult<()> {
        self.0.require_role(role, action).map_err(ApiError::from)
    }
}

impl FromRequestParts<AppState> for CurrentOperator {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let operator_id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized(format!("Missing {OPERATOR_HEADER} header")))?;

        let user = state
            .db
            .users()
            .get_by_id(operator_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Unknown operator"))?;

        let operator = Operator::from_user(&user)
            .ok_or_else(|| ApiError::unauthorized("Operator account is inactive"))?;

        debug!(operator_id = %operator.id, role = %operator.role, "Operator resolved");
        Ok(CurrentOperator(operator))
    }
}
