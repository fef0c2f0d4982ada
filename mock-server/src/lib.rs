use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sid";
pub const DEMO_ACCOUNT: &str = "reader@example.com";
pub const DEMO_PASSWORD: &str = "123456";
pub const DEMO_USER_ID: &str = "u1";
pub const DEMO_STORY_ID: &str = "0689a05650017f80";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub id: String,
    pub title: String,
    /// Incremented on every fetch, so clients can tell cached reads apart.
    pub views: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub auth_account_id: String,
    pub password: String,
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Store {
    /// Session token to account id.
    pub sessions: HashMap<String, String>,
    pub users: HashMap<String, User>,
    pub stories: HashMap<String, Story>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn seeded_store() -> Store {
    let mut store = Store::default();
    store.users.insert(
        DEMO_USER_ID.to_string(),
        User {
            id: DEMO_USER_ID.to_string(),
            name: "Demo Reader".to_string(),
            email: DEMO_ACCOUNT.to_string(),
        },
    );
    for (id, title) in [(DEMO_STORY_ID, "Tom &amp; Jerry"), ("s2", "Second story")] {
        store.stories.insert(
            id.to_string(),
            Story {
                id: id.to_string(),
                title: title.to_string(),
                views: 0,
            },
        );
    }
    store
}

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(seeded_store())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/acl/auth", post(authenticate))
        .route("/acl/logout", post(logout))
        .route("/core/user/{id}", get(get_user).put(update_user))
        .route("/core/story/{id}", get(get_story))
        .route("/core/stories", get(list_stories))
        .route("/core/ping", get(ping))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock server listening");
    axum::serve(listener, app()).await
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

async fn require_session(db: &Db, headers: &HeaderMap) -> Result<String, StatusCode> {
    let token = session_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    db.read()
        .await
        .sessions
        .get(&token)
        .cloned()
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn authenticate(State(db): State<Db>, Json(input): Json<AuthRequest>) -> Response {
    let mut store = db.write().await;
    let account = store
        .users
        .values()
        .find(|u| u.email == input.auth_account_id)
        .map(|u| u.id.clone());
    let Some(account_id) = account.filter(|_| input.password == DEMO_PASSWORD) else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid credentials"})))
            .into_response();
    };

    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), account_id.clone());
    info!(account = %account_id, auth_type = ?input.auth_type, remember = input.remember, "session opened");
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly");
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({ "accountId": account_id })),
    )
        .into_response()
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        db.write().await.sessions.remove(&token);
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    (AppendHeaders([(header::SET_COOKIE, cookie)]), Json(json!({}))).into_response()
}

async fn get_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<User>, StatusCode> {
    require_session(&db, &headers).await?;
    let store = db.read().await;
    store.users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, StatusCode> {
    require_session(&db, &headers).await?;
    let mut store = db.write().await;
    let user = store.users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    Ok(Json(user.clone()))
}

async fn get_story(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Story>, StatusCode> {
    let mut store = db.write().await;
    let story = store.stories.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    story.views += 1;
    Ok(Json(story.clone()))
}

async fn list_stories(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<Story>> {
    const PAGE_SIZE: usize = 10;
    let store = db.read().await;
    let mut stories: Vec<Story> = store.stories.values().cloned().collect();
    stories.sort_by(|a, b| a.id.cmp(&b.id));
    let page = query.page.unwrap_or(1).max(1);
    Json(
        stories
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect(),
    )
}

async fn ping() -> StatusCode {
    StatusCode::OK
}
