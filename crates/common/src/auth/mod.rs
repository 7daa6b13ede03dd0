//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Role/permission checks for admin routes
//! - Session context extraction for handlers

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role that implicitly holds every permission
pub const SUPER_ADMIN_ROLE: &str = "SUPER_ADMIN";

/// Capabilities checked by the admin routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewThesis,
    ModifyThesis,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewThesis => "VIEW_THESIS",
            Permission::ModifyThesis => "MODIFY_THESIS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session of the caller, placed in request extensions by the permission middleware
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Acting user ID
    pub user_id: i64,

    /// Role name
    pub role: String,

    /// Granted permissions
    pub permissions: Vec<String>,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// Check if the context holds a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role == SUPER_ADMIN_ROLE
            || self.permissions.iter().any(|p| p == permission.as_str())
    }

    /// Require a specific permission, returning error if not present
    pub fn require_permission(&self, permission: Permission) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required permission: {}", permission),
            })
        }
    }

    /// Build a context from validated claims
    pub fn from_claims(claims: JwtClaims, request_id: String) -> Result<Self> {
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::InvalidToken)?;

        Ok(Self {
            user_id,
            role: claims.role,
            permissions: claims.permissions,
            request_id,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Role name
    pub role: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Permissions
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(
        &self,
        user_id: i64,
        role: &str,
        permissions: Vec<String>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            permissions,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e)
            })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::ExpiredToken
                    }
                    _ => AppError::InvalidToken,
                }
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum extractor for AuthContext; requires the permission middleware to have run
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized {
                message: "No authenticated session".to_string(),
            })
    }
}
