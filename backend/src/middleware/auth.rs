//! Authentication middleware
//!
//! JWT validation and role-based access control. The core authorizes on
//! the stable dealer/service-center IDs carried in the token, never on
//! display names.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorResponse};
use shared::types::Role;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    /// Set for dealer and sub-dealer users
    pub dealer_id: Option<Uuid>,
    /// Set for service-center users
    pub service_center_id: Option<Uuid>,
}

impl AuthUser {
    pub fn is_factory_admin(&self) -> bool {
        self.role == Role::FactoryAdmin
    }

    /// Require the factory-admin role
    pub fn require_factory_admin(&self) -> AppResult<()> {
        if self.is_factory_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Requires factory admin role".to_string(),
            ))
        }
    }

    /// Require a dealer identity and return its stable ID
    pub fn require_dealer(&self) -> AppResult<Uuid> {
        match (self.role, self.dealer_id) {
            (Role::Dealer, Some(id)) => Ok(id),
            _ => Err(AppError::Forbidden("Requires dealer role".to_string())),
        }
    }

    /// Require a service-center identity and return its stable ID
    pub fn require_service_center(&self) -> AppResult<Uuid> {
        match (self.role, self.service_center_id) {
            (Role::ServiceCenter, Some(id)) => Ok(id),
            _ => Err(AppError::Forbidden(
                "Requires service center role".to_string(),
            )),
        }
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    // Decode and validate JWT token
    // Get JWT secret from environment (fallback for middleware without state)
    let jwt_secret = std::env::var("IVT_JWT__SECRET")
        .or_else(|_| std::env::var("IVT_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let role = match Role::from_str(&claims.role) {
        Some(role) => role,
        None => return unauthorized_response("Invalid role in token"),
    };

    let dealer_id = match claims.dealer_id.as_deref().map(Uuid::parse_str) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => return unauthorized_response("Invalid dealer ID in token"),
        None => None,
    };

    let service_center_id = match claims.service_center_id.as_deref().map(Uuid::parse_str) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => return unauthorized_response("Invalid service center ID in token"),
        None => None,
    };

    let auth_user = AuthUser {
        user_id,
        role,
        name: claims.name,
        dealer_id,
        service_center_id,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    role: String,
    name: String,
    dealer_id: Option<String>,
    service_center_id: Option<String>,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
            reference: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                        reference: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
