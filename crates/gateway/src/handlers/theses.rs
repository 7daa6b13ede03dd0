//! Thesis administration handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::AppState;
use thesisdesk_common::{
    auth::AuthContext,
    db::models::{NewHistoryEntry, Thesis, ThesisChanges, ThesisStatus},
    errors::{violations_from, AppError, FieldViolation, Result},
    metrics::{self, outcome},
};

/// Audit action label for thesis updates
pub const UPDATE_THESIS_ACTION: &str = "UPDATE_THESIS";

/// Body of `PUT /api/admin/thesis/{id}`; every field is optional
#[derive(Debug, Default, Validate)]
pub struct UpdateThesisRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Author name cannot be empty"))]
    pub author_name: Option<String>,

    pub category: Option<String>,

    pub keywords: Option<Vec<String>>,

    pub abstract_text: Option<String>,

    pub status: Option<ThesisStatus>,
}

impl UpdateThesisRequest {
    /// Parse and validate a raw request body.
    ///
    /// Type mismatches (including `null`) and rule violations are collected
    /// per field; unknown fields are ignored.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::EmptyBody);
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| AppError::InvalidFormat {
            message: format!("Malformed JSON body: {}", e),
        })?;

        let mut fields = match value {
            Value::Object(map) => map,
            Value::Null => return Err(AppError::EmptyBody),
            _ => {
                return Err(AppError::InvalidFormat {
                    message: "Request body must be a JSON object".to_string(),
                })
            }
        };

        let mut violations = Vec::new();
        let request = Self {
            title: take_field(&mut fields, "title", &mut violations),
            author_name: take_field(&mut fields, "author_name", &mut violations),
            category: take_field(&mut fields, "category", &mut violations),
            keywords: take_field(&mut fields, "keywords", &mut violations),
            abstract_text: take_field(&mut fields, "abstract", &mut violations),
            status: take_field(&mut fields, "status", &mut violations),
        };

        if let Err(errors) = request.validate() {
            violations.extend(violations_from(&errors));
        }

        if !violations.is_empty() {
            violations.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(AppError::validation(violations));
        }

        Ok(request)
    }

    /// Turn the request into a merge-patch, with the author already resolved
    fn into_changes(self, author_id: Option<i64>) -> ThesisChanges {
        ThesisChanges {
            title: self.title,
            author_id,
            category: self.category,
            keywords: self.keywords,
            abstract_text: self.abstract_text,
            status: self.status,
        }
    }
}

fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<T> {
    let value = fields.remove(name)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            violations.push(FieldViolation::new(name, e.to_string()));
            None
        }
    }
}

/// Thesis as returned to admin clients
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThesisResponse {
    /// Serialized as a string so 64-bit ids survive JSON number handling
    pub thesis_id: String,
    pub title: String,
    pub author_name: String,
    pub category: String,
    pub keywords: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ThesisResponse {
    pub fn new(thesis: Thesis, author_name: String) -> Self {
        Self {
            thesis_id: thesis.id.to_string(),
            title: thesis.title,
            author_name,
            category: thesis.category,
            keywords: thesis.keywords,
            abstract_text: thesis.abstract_text,
            status: thesis.status,
            created_at: thesis
                .created_at
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: thesis
                .updated_at
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateThesisResponse {
    pub message: String,
    pub thesis: ThesisResponse,
}

#[derive(Debug, Serialize)]
pub struct GetThesisResponse {
    pub thesis: ThesisResponse,
}

fn parse_thesis_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| AppError::InvalidFormat {
        message: format!("Invalid thesis id: {}", raw),
    })
}

/// Get a thesis by ID
pub async fn get_thesis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GetThesisResponse>> {
    let thesis_id = parse_thesis_id(&id)?;

    let record = state
        .store
        .find_thesis(thesis_id)
        .await?
        .ok_or(AppError::ThesisNotFound { id: thesis_id })?;

    Ok(Json(GetThesisResponse {
        thesis: ThesisResponse::new(record.thesis, record.author.username),
    }))
}

/// Merge-patch a thesis and append an audit entry for the acting user
pub async fn update_thesis(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<UpdateThesisResponse>> {
    let result = apply_update(&state, &auth, &id, &body).await;

    metrics::record_thesis_update(update_outcome(&result));

    result.map(Json)
}

/// Metric label for a finished update
fn update_outcome<T>(result: &Result<T>) -> &'static str {
    let Err(e) = result else {
        return outcome::UPDATED;
    };
    match e.status_code() {
        StatusCode::BAD_REQUEST => outcome::INVALID,
        StatusCode::NOT_FOUND => outcome::NOT_FOUND,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => outcome::UNAUTHORIZED,
        _ => outcome::FAILED,
    }
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    raw_id: &str,
    body: &[u8],
) -> Result<UpdateThesisResponse> {
    let thesis_id = parse_thesis_id(raw_id)?;
    let request = UpdateThesisRequest::from_body(body)?;
    let store = &state.store;

    let existing = store
        .find_thesis(thesis_id)
        .await?
        .ok_or(AppError::ThesisNotFound { id: thesis_id })?;

    let new_author = match request.author_name.as_deref() {
        Some(username) => Some(
            store
                .find_user_by_username(username)
                .await?
                .ok_or_else(|| AppError::UserNotFound {
                    username: username.to_string(),
                })?,
        ),
        None => None,
    };

    let actor = store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: format!("Session user {} no longer exists", auth.user_id),
        })?;

    let changes = request.into_changes(new_author.as_ref().map(|author| author.id));
    let title = changes
        .title
        .clone()
        .unwrap_or_else(|| existing.thesis.title.clone());

    let audit = NewHistoryEntry {
        user_id: actor.id,
        action: UPDATE_THESIS_ACTION.to_string(),
        description: format!("Thesis \"{}\" updated by {}", title, actor.email),
    };

    let updated = store.update_thesis(thesis_id, changes, audit).await?;
    metrics::record_audit_entry(UPDATE_THESIS_ACTION);

    tracing::info!(
        thesis_id = thesis_id,
        actor_id = actor.id,
        request_id = %auth.request_id,
        "Thesis updated"
    );

    let author_name = new_author
        .map(|author| author.username)
        .unwrap_or(existing.author.username);

    Ok(UpdateThesisResponse {
        message: "Thesis updated successfully".to_string(),
        thesis: ThesisResponse::new(updated, author_name),
    })
}
