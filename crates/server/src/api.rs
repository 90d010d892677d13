//! JSON API consumed by the dashboard front-end.
//!
//! - `POST   /api/auth/login`               exchange email/password for a session token
//! - `GET    /api/settings`                 raw prompt text as `{ promptSystem }`
//! - `PATCH  /api/settings`, `PUT`          store raw prompt text (`promptSystem` or `prompt`)
//! - `GET    /api/settings/prompt`          prompt parsed into its structured form
//! - `PUT    /api/settings/prompt`          render a structured prompt and store it
//! - `GET    /api/contacts`                 contact list
//! - `GET    /api/contacts/{id}`            single contact
//! - `PATCH  /api/contacts/{id}`            partial contact update
//! - `GET    /api/contacts/{id}/messages`   chat history, oldest first
//! - `GET    /api/users`, `POST`            team user list / creation
//! - `PATCH  /api/users/{id}`, `DELETE`     team user update / removal
//!
//! Every route except login requires `Authorization: Bearer <token>`.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chatdesk_core::{
    access::{authorize, Capability, Role},
    domain::{
        chat::ChatMessage,
        contact::{Contact, ContactId, ContactPatch},
        settings::{BotSettings, SettingsPayload},
        team::{NewTeamUser, TeamUser, TeamUserId, TeamUserPatch},
    },
    errors::{ApplicationError, DomainError, InterfaceError},
    prompt::{parse_prompt, PromptData},
    session::{SessionError, SessionSigner},
};
use chatdesk_db::{
    repositories::{
        ChatRepository, ContactRepository, RepositoryError, SettingsRepository,
        SqlChatRepository, SqlContactRepository, SqlSettingsRepository, SqlTeamUserRepository,
        TeamUserRepository,
    },
    DbPool,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 500;

#[derive(Clone)]
pub struct ApiState {
    settings: Arc<dyn SettingsRepository>,
    contacts: Arc<dyn ContactRepository>,
    users: Arc<dyn TeamUserRepository>,
    chats: Arc<dyn ChatRepository>,
    signer: Arc<SessionSigner>,
    session_ttl_secs: u64,
}

impl ApiState {
    pub fn from_pool(pool: DbPool, signer: SessionSigner, session_ttl_secs: u64) -> Self {
        Self {
            settings: Arc::new(SqlSettingsRepository::new(pool.clone())),
            contacts: Arc::new(SqlContactRepository::new(pool.clone())),
            users: Arc::new(SqlTeamUserRepository::new(pool.clone())),
            chats: Arc::new(SqlChatRepository::new(pool)),
            signer: Arc::new(signer),
            session_ttl_secs,
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/settings", get(get_settings).patch(update_settings).put(update_settings))
        .route("/api/settings/prompt", get(get_prompt).put(put_prompt))
        .route("/api/contacts", get(list_contacts))
        .route("/api/contacts/{id}", get(get_contact).patch(patch_contact))
        .route("/api/contacts/{id}/messages", get(contact_messages))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", patch(patch_user).delete(delete_user))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError(InterfaceError);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub detail: String,
    pub correlation_id: String,
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, class) = match &self.0 {
            InterfaceError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            InterfaceError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            InterfaceError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            InterfaceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            InterfaceError::ServiceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            InterfaceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        warn!(
            event_name = "server.api.request_failed",
            correlation_id = self.0.correlation_id(),
            status = status.as_u16(),
            error = %self.0,
            "api request failed"
        );

        let body = ErrorBody {
            error: class.to_string(),
            message: self.0.user_message().to_string(),
            detail: self.0.message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Caller identity resolved from the bearer token and the current user row.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: TeamUserId,
    pub role: Role,
}

impl AuthUser {
    fn require(&self, capability: Capability) -> Result<(), ApiError> {
        authorize(self.role, capability).map_err(|denied| DomainError::from(denied).into())
    }
}

impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::Malformed)?;

        let claims = state.signer.verify(token, Utc::now())?;

        // Role and active flag come from the stored row so changes apply immediately.
        let user = state
            .users
            .find_by_id(&TeamUserId(claims.user_id.clone()))
            .await?
            .filter(|user| user.active)
            .ok_or(ApplicationError::InvalidCredentials)?;

        Ok(Self { id: user.id, role: user.role })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: TeamUser,
}

async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .filter(|user| user.check_password(&request.password))
        .ok_or(ApplicationError::InvalidCredentials)?;

    let session = state.signer.issue(&user.id.0, user.role, session_ttl(state.session_ttl_secs)?)?;
    info!(
        event_name = "server.auth.login",
        user_id = %user.id.0,
        role = %user.role,
        "team user signed in"
    );

    Ok(Json(LoginResponse { token: session.token, expires_at: session.claims.expires_at, user }))
}

fn session_ttl(seconds: u64) -> Result<Duration, SessionError> {
    i64::try_from(seconds).ok().and_then(Duration::try_seconds).ok_or(SessionError::TtlOutOfRange)
}

// ---------------------------------------------------------------------------
// Settings / prompt
// ---------------------------------------------------------------------------

async fn load_prompt_text(state: &ApiState) -> Result<String, ApiError> {
    Ok(state.settings.load().await?.map(|settings| settings.prompt_system).unwrap_or_default())
}

async fn get_settings(
    auth: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<SettingsPayload>, ApiError> {
    auth.require(Capability::ViewPrompt)?;
    Ok(Json(SettingsPayload::new(load_prompt_text(&state).await?)))
}

async fn update_settings(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<SettingsPayload>,
) -> Result<Json<SettingsPayload>, ApiError> {
    auth.require(Capability::EditPrompt)?;

    let settings = BotSettings::new(payload.prompt_system, Some(auth.id.0.clone()));
    let response = SettingsPayload::from(&settings);
    state.settings.save(settings).await?;
    info!(
        event_name = "server.settings.updated",
        user_id = %auth.id.0,
        prompt_len = response.prompt_system.len(),
        "bot prompt text saved"
    );

    Ok(Json(response))
}

async fn get_prompt(
    auth: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<PromptData>, ApiError> {
    auth.require(Capability::ViewPrompt)?;
    Ok(Json(parse_prompt(&load_prompt_text(&state).await?)))
}

async fn put_prompt(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(data): Json<PromptData>,
) -> Result<Json<SettingsPayload>, ApiError> {
    auth.require(Capability::EditPrompt)?;

    let settings = BotSettings::from_prompt(&data, Some(auth.id.0.clone()));
    let response = SettingsPayload::from(&settings);
    state.settings.save(settings).await?;
    info!(
        event_name = "server.settings.prompt_rendered",
        user_id = %auth.id.0,
        branches = data.branches.len(),
        examples = data.examples.len(),
        "structured prompt rendered and saved"
    );

    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Contacts / chats
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

async fn list_contacts(
    auth: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    auth.require(Capability::ViewContacts)?;
    Ok(Json(state.contacts.list().await?))
}

async fn find_contact(state: &ApiState, id: String) -> Result<Contact, ApiError> {
    state
        .contacts
        .find_by_id(&ContactId(id.clone()))
        .await?
        .ok_or_else(|| ApplicationError::NotFound { entity: "contact", id }.into())
}

async fn get_contact(
    auth: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    auth.require(Capability::ViewContacts)?;
    Ok(Json(find_contact(&state, id).await?))
}

async fn patch_contact(
    auth: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, ApiError> {
    auth.require(Capability::EditContacts)?;
    Ok(Json(state.contacts.update(&ContactId(id), patch).await?))
}

async fn contact_messages(
    auth: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    auth.require(Capability::ViewChats)?;

    let contact = find_contact(&state, id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.chats.list_for_contact(&contact.id, limit).await?))
}

// ---------------------------------------------------------------------------
// Team users
// ---------------------------------------------------------------------------

async fn list_users(
    auth: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<TeamUser>>, ApiError> {
    auth.require(Capability::ManageUsers)?;
    Ok(Json(state.users.list().await?))
}

async fn create_user(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(input): Json<NewTeamUser>,
) -> Result<(StatusCode, Json<TeamUser>), ApiError> {
    auth.require(Capability::ManageUsers)?;

    let user = TeamUser::create(input)?;
    state.users.create(user.clone()).await?;
    info!(
        event_name = "server.users.created",
        actor_id = %auth.id.0,
        user_id = %user.id.0,
        role = %user.role,
        "team user created"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

async fn patch_user(
    auth: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(patch): Json<TeamUserPatch>,
) -> Result<Json<TeamUser>, ApiError> {
    auth.require(Capability::ManageUsers)?;

    let id = TeamUserId(id);
    let demotes_self = patch.role.is_some_and(|role| role != Role::Admin)
        || patch.active == Some(false);
    if id == auth.id && demotes_self {
        return Err(DomainError::Validation(
            "administrators cannot demote or deactivate their own account".to_string(),
        )
        .into());
    }

    Ok(Json(state.users.update(&id, patch).await?))
}

async fn delete_user(
    auth: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth.require(Capability::ManageUsers)?;

    let id = TeamUserId(id);
    if id == auth.id {
        return Err(DomainError::Validation(
            "administrators cannot delete their own account".to_string(),
        )
        .into());
    }
    state.users.delete(&id).await?;
    info!(
        event_name = "server.users.deleted",
        actor_id = %auth.id.0,
        user_id = %id.0,
        "team user deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use chatdesk_core::session::{SessionError, SessionSigner};
    use chatdesk_db::{connect_with_settings, migrations, seed_demo};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, session_ttl, ApiState};

    const ADMIN_EMAIL: &str = "admin@example.com";
    const ADMIN_PASSWORD: &str = "admin-password";

    async fn app() -> Router {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        seed_demo(&pool, ADMIN_EMAIL, ADMIN_PASSWORD).await.expect("seed");
        router(ApiState::from_pool(pool, SessionSigner::new(b"api-test-secret-0001"), 3600))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    async fn create_user(app: &Router, admin: &str, email: &str, role: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/users",
            Some(admin),
            Some(json!({
                "email": email,
                "displayName": "Teammate",
                "role": role,
                "password": "teammate-password",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }

    #[test]
    fn session_ttl_rejects_values_chrono_cannot_hold() {
        assert_eq!(session_ttl(3600), Ok(Duration::hours(1)));
        assert_eq!(session_ttl(u64::MAX), Err(SessionError::TtlOutOfRange));
        assert_eq!(session_ttl(i64::MAX as u64), Err(SessionError::TtlOutOfRange));
    }

    #[tokio::test]
    async fn oversized_session_ttl_fails_login_without_panicking() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        seed_demo(&pool, ADMIN_EMAIL, ADMIN_PASSWORD).await.expect("seed");
        let app = router(ApiState::from_pool(
            pool,
            SessionSigner::new(b"api-test-secret-0001"),
            10_000_000_000_000_000,
        ));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_missing_token() {
        let app = app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = send(&app, Method::GET, "/api/settings", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            send(&app, Method::GET, "/api/settings", Some("forged.ADMIN.1.00"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn settings_accept_both_payload_keys() {
        let app = app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/settings",
            Some(&token),
            Some(json!({ "prompt": "<role>Legacy</role>" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["promptSystem"], "<role>Legacy</role>");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/settings",
            Some(&token),
            Some(json!({ "promptSystem": "<role>Current</role>" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/api/settings", Some(&token), None).await;
        assert_eq!(body["promptSystem"], "<role>Current</role>");

        let (_, body) = send(&app, Method::GET, "/api/settings/prompt", Some(&token), None).await;
        assert_eq!(body["role"], "Current");
    }

    #[tokio::test]
    async fn structured_prompt_round_trips_through_the_api() {
        let app = app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/settings/prompt",
            Some(&token),
            Some(json!({
                "role": "Asistente",
                "coreRules": [{ "id": "a", "texto": "Saludá primero" }],
                "branches": [{ "etiqueta": "Centro", "telefonos": ["111"], "direccion": "Calle 1" }],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = body["promptSystem"].as_str().expect("prompt text");
        assert!(text.starts_with("<assistant>"));
        assert!(text.contains("<rule>Saludá primero</rule>"));

        let (_, parsed) = send(&app, Method::GET, "/api/settings/prompt", Some(&token), None).await;
        assert_eq!(parsed["role"], "Asistente");
        assert_eq!(parsed["coreRules"][0]["texto"], "Saludá primero");
        assert_eq!(parsed["branches"][0]["etiqueta"], "Centro");
        assert_eq!(parsed["branches"][0]["telefonos"], json!(["111"]));
    }

    #[tokio::test]
    async fn viewer_can_read_but_not_edit() {
        let app = app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        create_user(&app, &admin, "viewer@example.com", "VIEWER").await;
        let viewer = login(&app, "viewer@example.com", "teammate-password").await;

        let (status, _) = send(&app, Method::GET, "/api/settings/prompt", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/settings",
            Some(&viewer),
            Some(json!({ "promptSystem": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/contacts/contact-demo-001",
            Some(&viewer),
            Some(json!({ "botEnabled": false })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, "/api/users", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn editor_updates_contacts_and_reads_history() {
        let app = app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        create_user(&app, &admin, "editor@example.com", "EDITOR").await;
        let editor = login(&app, "editor@example.com", "teammate-password").await;

        let (status, contacts) = send(&app, Method::GET, "/api/contacts", Some(&editor), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(contacts.as_array().map(Vec::len), Some(2));

        let (status, contact) = send(
            &app,
            Method::PATCH,
            "/api/contacts/contact-demo-001",
            Some(&editor),
            Some(json!({ "botEnabled": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(contact["botEnabled"], false);

        let (status, history) = send(
            &app,
            Method::GET,
            "/api/contacts/contact-demo-002/messages?limit=2",
            Some(&editor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let bodies: Vec<&str> = history
            .as_array()
            .expect("messages")
            .iter()
            .filter_map(|message| message["body"].as_str())
            .collect();
        assert_eq!(bodies, vec!["Sí, enviamos a todo el país en 48 a 72 h.", "Perfecto, gracias."]);

        let (status, body) =
            send(&app, Method::GET, "/api/contacts/missing/messages", Some(&editor), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn admin_manages_users_but_not_own_account() {
        let app = app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let created = create_user(&app, &admin, "ops@example.com", "EDITOR").await;
        let id = created["id"].as_str().expect("id").to_string();
        assert!(created.get("passwordHash").is_none());

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/api/users/{id}"),
            Some(&admin),
            Some(json!({ "role": "VIEWER" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["role"], "VIEWER");

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/users/{id}"), Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, users) = send(&app, Method::GET, "/api/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let admin_id = users[0]["id"].as_str().expect("admin id").to_string();
        assert_eq!(users.as_array().map(Vec::len), Some(1));

        let (status, body) =
            send(&app, Method::DELETE, &format!("/api/users/{admin_id}"), Some(&admin), None)
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn deactivated_user_token_stops_working() {
        let app = app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let created = create_user(&app, &admin, "temp@example.com", "EDITOR").await;
        let id = created["id"].as_str().expect("id").to_string();
        let temp = login(&app, "temp@example.com", "teammate-password").await;

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/users/{id}"),
            Some(&admin),
            Some(json!({ "active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/api/contacts", Some(&temp), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
