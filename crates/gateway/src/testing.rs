//! In-memory store and request helpers for handler tests

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thesisdesk_common::{
    auth::{JwtManager, Permission},
    config::AppConfig,
    db::{
        models::{History, NewHistoryEntry, Thesis, ThesisChanges, User},
        ThesisRecord, ThesisStore,
    },
    errors::{AppError, Result},
};
use tower::ServiceExt;

use crate::{create_router, AppState};

pub const ALICE_ID: i64 = 1;
pub const CAROL_ID: i64 = 2;
pub const DAVE_ID: i64 = 3;
pub const THESIS_ID: i64 = 100;

const SECRET: &str = "test-secret";

#[derive(Default)]
struct State {
    users: HashMap<i64, User>,
    theses: HashMap<i64, Thesis>,
    history: Vec<History>,
    fail_writes: bool,
    stall_reads: bool,
}

/// `ThesisStore` over a mutex-guarded map; updates are atomic under the lock
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn seeded_at() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap().into()
}

impl MemoryStore {
    /// Users alice, carol (the usual actor) and dave, plus thesis "X" by alice
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            for (id, username) in [(ALICE_ID, "alice"), (CAROL_ID, "carol"), (DAVE_ID, "dave")] {
                state.users.insert(
                    id,
                    User {
                        id,
                        username: username.to_string(),
                        email: format!("{}@example.edu", username),
                        role: "ADMIN".to_string(),
                        created_at: seeded_at(),
                    },
                );
            }
        }
        store.insert_thesis(THESIS_ID, ALICE_ID, "X");
        store
    }

    pub fn insert_thesis(&self, id: i64, author_id: i64, title: &str) {
        self.lock().theses.insert(
            id,
            Thesis {
                id,
                title: title.to_string(),
                category: "Systems".to_string(),
                keywords: vec!["storage".to_string(), "rust".to_string()],
                abstract_text: format!("About {}", title),
                status: "Pending".to_string(),
                author_id,
                created_at: seeded_at(),
                updated_at: seeded_at(),
            },
        );
    }

    /// Make every subsequent `update_thesis` fail as a dropped connection would
    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    /// Make every subsequent `find_thesis` hang forever
    pub fn stall_reads(&self) {
        self.lock().stall_reads = true;
    }

    pub fn thesis(&self, id: i64) -> Option<Thesis> {
        self.lock().theses.get(&id).cloned()
    }

    pub fn history(&self) -> Vec<History> {
        self.lock().history.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ThesisStore for MemoryStore {
    async fn find_thesis(&self, id: i64) -> Result<Option<ThesisRecord>> {
        let stalled = self.lock().stall_reads;
        if stalled {
            std::future::pending::<()>().await;
        }

        let state = self.lock();
        let Some(thesis) = state.theses.get(&id).cloned() else {
            return Ok(None);
        };
        let author = state
            .users
            .get(&thesis.author_id)
            .cloned()
            .ok_or_else(|| AppError::Internal {
                message: format!("Thesis {} has no author", id),
            })?;
        Ok(Some(ThesisRecord { thesis, author }))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn update_thesis(
        &self,
        id: i64,
        changes: ThesisChanges,
        audit: NewHistoryEntry,
    ) -> Result<Thesis> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(AppError::DatabaseConnection {
                message: "connection reset by peer".to_string(),
            });
        }

        let now: DateTime<FixedOffset> = Utc::now().into();
        let mut thesis = state
            .theses
            .get(&id)
            .cloned()
            .ok_or(AppError::ThesisNotFound { id })?;
        changes.apply(&mut thesis, now);
        state.theses.insert(id, thesis.clone());

        let entry_id = state.history.len() as i64 + 1;
        state.history.push(History {
            id: entry_id,
            user_id: audit.user_id,
            action: audit.action,
            description: audit.description,
            created_at: now,
        });

        Ok(thesis)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Router over `store` with rate limiting off, and the JWT manager that signs for it
pub fn app(store: Arc<MemoryStore>) -> (Router, Arc<JwtManager>) {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    app_with_config(store, config)
}

pub fn app_with_config(store: Arc<MemoryStore>, config: AppConfig) -> (Router, Arc<JwtManager>) {
    let jwt = Arc::new(JwtManager::new(SECRET, config.auth.jwt_expiration_secs));
    let state = AppState {
        config: Arc::new(config),
        store,
        jwt: jwt.clone(),
    };

    (create_router(state), jwt)
}

pub fn token(jwt: &JwtManager, user_id: i64, permissions: &[Permission]) -> String {
    let permissions = permissions.iter().map(|p| p.as_str().to_string()).collect();
    jwt.generate_token(user_id, "ADMIN", permissions).unwrap()
}

/// Send one request; a non-JSON response body comes back as `Value::Null`
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}
