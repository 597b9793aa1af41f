// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::user::{Principal, Role},
};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID.
    pub sub: String,
    pub role: Role,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The caller identity the core operations trust.
    pub fn principal(&self) -> Result<Principal, AppError> {
        let id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;
        Ok(Principal {
            id,
            role: self.role,
        })
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: Uuid,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects `Claims`
/// into the request extensions. Missing or invalid tokens yield 401.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;

    let claims = verify_jwt(token, &config.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn require_role(req: &Request<Body>, role: Role) -> Result<(), AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;

    if claims.role != role {
        return Err(AppError::Forbidden("Insufficient role".to_string()));
    }
    Ok(())
}

/// Axum Middleware: Admin Authorization. Must run after `auth_middleware`.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(&req, Role::Admin)?;
    Ok(next.run(req).await)
}

/// Axum Middleware: Student Authorization. Must run after `auth_middleware`.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(&req, Role::Student)?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let id = Uuid::new_v4();
        let token = sign_jwt(id, Role::Student, "secret", 60).unwrap();

        let claims = verify_jwt(&token, "secret").unwrap();
        let principal = claims.principal().unwrap();

        assert_eq!(principal.id, id);
        assert_eq!(principal.role, Role::Student);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign_jwt(Uuid::new_v4(), Role::Admin, "secret", 60).unwrap();
        assert_eq!(
            verify_jwt(&token, "other").unwrap_err(),
            AppError::AuthError("Invalid token".to_string())
        );
    }

    #[test]
    fn test_malformed_subject_rejected() {
        let claims = Claims {
            sub: "42".to_string(),
            role: Role::Student,
            exp: usize::MAX,
        };
        assert!(claims.principal().is_err());
    }
}
