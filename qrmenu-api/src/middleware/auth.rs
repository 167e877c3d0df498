use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use qrmenu_core::identity::{Role, User};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StaffClaims {
    pub sub: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub vendor_id: Option<i64>,
    pub exp: usize,
}

/// Authenticated identity injected into request extensions. Rebuilt from
/// the token on every request; vendor scoping is never cached across
/// requests.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

pub fn role_from_claim(role: &str) -> Option<Role> {
    match role {
        "admin" => Some(Role::Admin),
        "vendor" => Some(Role::Vendor),
        "staff" => Some(Role::Staff),
        _ => None,
    }
}

// ============================================================================
// Staff/Vendor/Admin Authentication Middleware
// ============================================================================

pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header.strip_prefix("Bearer ").ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Map the role claim; unknown roles are rejected outright
    let claims = token_data.claims;
    let role = role_from_claim(&claims.role).ok_or(StatusCode::UNAUTHORIZED)?;

    // 4. Inject the identity into request extensions
    req.extensions_mut().insert(AuthUser(User {
        id: claims.sub,
        role,
        vendor_id: claims.vendor_id,
        name: claims.name,
        email: claims.email,
    }));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_claims_map_onto_roles() {
        assert_eq!(role_from_claim("admin"), Some(Role::Admin));
        assert_eq!(role_from_claim("vendor"), Some(Role::Vendor));
        assert_eq!(role_from_claim("staff"), Some(Role::Staff));
        assert_eq!(role_from_claim("superuser"), None);
        assert_eq!(role_from_claim(""), None);
    }
}
