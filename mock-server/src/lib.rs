//! In-memory E-sheetbook backend for local development and tests.
//!
//! Serves the same routes as the real API with the same JSON envelopes.
//! Sessions are opaque bearer tokens; the OTP is always `MOCK_OTP`. The
//! `/__mock/*` routes exist only here, for exercising timeouts and retries.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const MOCK_OTP: &str = "123456";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub email_verified: bool,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiBinding {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub method: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub url: String,
    pub file_id: String,
    pub user_id: String,
    pub api: Vec<ApiBinding>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    #[serde(rename = "_id")]
    pub id: String,
    pub google_sheet_name: String,
    pub google_sheet_api_url: String,
    pub google_sheet_id: String,
    pub google_sheet_start_row: u32,
    pub google_sheet_fields: Vec<Value>,
    pub website_status: String,
    pub website_need_password: bool,
    pub user: String,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    otps: HashMap<String, String>,
    sessions: HashMap<String, String>,
    files: HashMap<String, File>,
    sheets: HashMap<String, Sheet>,
    websites: HashMap<String, Website>,
}

impl Store {
    /// Resolve the bearer token in `headers` to a user id.
    fn authorize(&self, headers: &HeaderMap) -> Result<String, Failure> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(Failure(StatusCode::UNAUTHORIZED, "Authentication Invalid"))?;
        self.sessions
            .get(token)
            .cloned()
            .ok_or(Failure(StatusCode::UNAUTHORIZED, "Authentication Invalid"))
    }

    fn owned_file(&self, user_id: &str, file_id: &str) -> Result<&File, Failure> {
        self.files
            .get(file_id)
            .filter(|f| f.user_id == user_id)
            .ok_or(Failure(StatusCode::NOT_FOUND, "No file with this id"))
    }

    fn sheets_of(&self, file_id: &str) -> Vec<Sheet> {
        let mut sheets: Vec<Sheet> = self
            .sheets
            .values()
            .filter(|s| s.file_id == file_id)
            .cloned()
            .collect();
        sheets.sort_by(|a, b| a.name.cmp(&b.name));
        sheets
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    /// Requests served by `/__mock/status/{code}`.
    pub probe_hits: Arc<AtomicU64>,
}

/// An error answered as `{ "msg": ... }`.
#[derive(Debug)]
pub struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "msg": self.1 }))).into_response()
    }
}

type Reply = Result<(StatusCode, Json<Value>), Failure>;

fn ok(body: Value) -> Reply {
    Ok((StatusCode::OK, Json(body)))
}

fn created(body: Value) -> Reply {
    Ok((StatusCode::CREATED, Json(body)))
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/auth/sendOTP", post(send_otp))
        .route("/auth/userRegister", post(register))
        .route("/auth/login", post(login))
        .route("/auth/checkValidToken", get(check_valid_token))
        .route("/auth/logout", post(logout))
        .route("/users/showMe", get(show_me))
        .route(
            "/file",
            get(list_files).post(create_file).put(edit_file).delete(delete_file),
        )
        .route(
            "/sheet",
            get(list_sheets).post(create_sheet).put(edit_sheet).delete(delete_sheet),
        )
        .route("/sheet/file", get(sheets_in_file))
        .route(
            "/website",
            get(list_websites).post(create_website).delete(delete_website),
        )
        .route("/website/sheet", put(edit_website_sheet))
        .route("/website/detail", put(edit_website_detail))
        .route("/__mock/delay/{ms}", get(delayed))
        .route("/__mock/status/{code}", get(fixed_status))
        .route("/__mock/hits", get(probe_hits))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- auth ---

#[derive(Deserialize)]
pub struct SendOtp {
    pub email: String,
}

async fn send_otp(State(state): State<AppState>, Json(input): Json<SendOtp>) -> Reply {
    if input.email.trim().is_empty() {
        return Err(Failure(StatusCode::BAD_REQUEST, "Please provide email"));
    }
    let mut store = state.store.write().await;
    if store.users.contains_key(&input.email) {
        return Err(Failure(StatusCode::BAD_REQUEST, "Email already exists"));
    }
    store.otps.insert(input.email.clone(), MOCK_OTP.to_string());
    info!(email = %input.email, "issued otp");
    ok(json!({ "msg": "OTP sent to email" }))
}

#[derive(Deserialize)]
pub struct Register {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "OTP")]
    pub otp: String,
}

async fn register(State(state): State<AppState>, Json(input): Json<Register>) -> Reply {
    let mut store = state.store.write().await;
    if store.users.contains_key(&input.email) {
        return Err(Failure(StatusCode::BAD_REQUEST, "Email already exists"));
    }
    match store.otps.get(&input.email) {
        Some(otp) if *otp == input.otp => {}
        _ => return Err(Failure(StatusCode::BAD_REQUEST, "Invalid OTP")),
    }
    if input.password.len() < 6 {
        return Err(Failure(StatusCode::BAD_REQUEST, "Password too short"));
    }
    store.otps.remove(&input.email);
    // The first account is the admin, as on the real backend.
    let role = if store.users.is_empty() { "admin" } else { "user" };
    let user = User {
        id: new_id(),
        name: input.name,
        email: input.email.clone(),
        password: input.password,
        email_verified: true,
        role: role.to_string(),
    };
    store.users.insert(input.email, user);
    created(json!({ "msg": "Success! Account registered" }))
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

async fn login(State(state): State<AppState>, Json(input): Json<Login>) -> Reply {
    let mut store = state.store.write().await;
    let user = store
        .users
        .get(&input.email)
        .filter(|u| u.password == input.password)
        .cloned()
        .ok_or(Failure(StatusCode::UNAUTHORIZED, "Invalid Credentials"))?;
    let access = new_id();
    let refresh = new_id();
    store.sessions.insert(access.clone(), user.id.clone());
    info!(user_id = %user.id, "login");
    ok(json!({
        "user": {
            "name": user.name,
            "userId": user.id,
            "role": user.role,
            "emailVerified": user.email_verified,
        },
        "token": { "accessTokenJWT": access, "refreshTokenJWT": refresh },
    }))
}

async fn check_valid_token(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    state.store.read().await.authorize(&headers)?;
    ok(json!({ "status": "success" }))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    let mut store = state.store.write().await;
    store.authorize(&headers)?;
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    store.sessions.remove(&token);
    ok(json!({ "msg": "user logged out!" }))
}

// --- users ---

async fn show_me(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    let store = state.store.read().await;
    let user_id = store.authorize(&headers)?;
    let user = store
        .users
        .values()
        .find(|u| u.id == user_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No user"))?;
    ok(json!({ "msg": "Current user", "user": user }))
}

// --- files ---

async fn list_files(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    let store = state.store.read().await;
    let user_id = store.authorize(&headers)?;
    let mut files: Vec<&File> = store.files.values().filter(|f| f.user_id == user_id).collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    ok(json!({ "msg": "Files", "file": files }))
}

#[derive(Deserialize)]
pub struct CreateFile {
    pub name: String,
}

async fn create_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateFile>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    if input.name.trim().is_empty() {
        return Err(Failure(StatusCode::BAD_REQUEST, "Please provide file name"));
    }
    let file = File {
        id: new_id(),
        name: input.name,
        user_id,
    };
    store.files.insert(file.id.clone(), file.clone());
    created(json!({ "msg": "File created", "name": file.name, "file": file }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFile {
    pub name: String,
    pub file_id: String,
}

async fn edit_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EditFile>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    store.owned_file(&user_id, &input.file_id)?;
    let file = store
        .files
        .get_mut(&input.file_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No file with this id"))?;
    file.name = input.name;
    let file = file.clone();
    ok(json!({ "msg": "File updated", "file": file }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFile {
    pub file_id: String,
}

async fn delete_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<DeleteFile>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    store.owned_file(&user_id, &input.file_id)?;
    let file = store
        .files
        .remove(&input.file_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No file with this id"))?;
    store.sheets.retain(|_, s| s.file_id != file.id);
    ok(json!({ "msg": "File deleted", "deletedFile": file }))
}

// --- sheets ---

async fn list_sheets(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    let store = state.store.read().await;
    let user_id = store.authorize(&headers)?;
    let mut files: Vec<&File> = store.files.values().filter(|f| f.user_id == user_id).collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    let files: Vec<Value> = files
        .into_iter()
        .map(|f| {
            json!({
                "_id": f.id,
                "name": f.name,
                "userId": f.user_id,
                "sheets": store.sheets_of(&f.id),
            })
        })
        .collect();
    ok(json!({ "msg": "Sheets", "files": files }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetsInFile {
    pub file_id: String,
}

async fn sheets_in_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SheetsInFile>,
) -> Reply {
    let store = state.store.read().await;
    let user_id = store.authorize(&headers)?;
    store.owned_file(&user_id, &query.file_id)?;
    ok(json!({ "msg": "Sheets", "sheets": store.sheets_of(&query.file_id) }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheet {
    pub name: String,
    pub url: String,
    pub file_id: String,
}

async fn create_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateSheet>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    store.owned_file(&user_id, &input.file_id)?;
    let sheet = Sheet {
        id: new_id(),
        name: input.name,
        url: input.url,
        file_id: input.file_id,
        user_id,
        api: Vec::new(),
    };
    store.sheets.insert(sheet.id.clone(), sheet.clone());
    created(json!({ "msg": "Sheet created", "sheet": sheet }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSheet {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub api: Vec<ApiBinding>,
    pub file_id: String,
    pub sheet_id: String,
}

async fn edit_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EditSheet>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    store.owned_file(&user_id, &input.file_id)?;
    let sheet = store
        .sheets
        .get_mut(&input.sheet_id)
        .filter(|s| s.user_id == user_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No sheet with this id"))?;
    sheet.name = input.name;
    sheet.url = input.url;
    sheet.file_id = input.file_id;
    sheet.api = input
        .api
        .into_iter()
        .map(|mut b| {
            if b.id.is_empty() {
                b.id = new_id();
            }
            b
        })
        .collect();
    let sheet = sheet.clone();
    // The real backend returns `api` JSON-encoded on this route.
    let mut body = serde_json::to_value(&sheet).unwrap_or_default();
    body["api"] = Value::String(serde_json::to_string(&sheet.api).unwrap_or_default());
    ok(json!({ "msg": "Sheet updated", "sheetUpdated": body }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheet {
    pub sheet_id: String,
}

async fn delete_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<DeleteSheet>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    let owned = store
        .sheets
        .get(&input.sheet_id)
        .is_some_and(|s| s.user_id == user_id);
    if !owned {
        return Err(Failure(StatusCode::NOT_FOUND, "No sheet with this id"));
    }
    let sheet = store
        .sheets
        .remove(&input.sheet_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No sheet with this id"))?;
    ok(json!({ "msg": "Sheet deleted", "sheetDeleted": sheet }))
}

// --- websites ---

async fn list_websites(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    let store = state.store.read().await;
    let user_id = store.authorize(&headers)?;
    let mut websites: Vec<&Website> = store.websites.values().filter(|w| w.user == user_id).collect();
    websites.sort_by(|a, b| a.google_sheet_name.cmp(&b.google_sheet_name));
    ok(json!({ "message": "Websites", "websites": websites }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebsite {
    pub google_sheet_name: String,
    pub google_sheet_api_url: String,
    pub google_sheet_id: String,
}

async fn create_website(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateWebsite>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    let website = Website {
        id: new_id(),
        google_sheet_name: input.google_sheet_name,
        google_sheet_api_url: input.google_sheet_api_url,
        google_sheet_id: input.google_sheet_id,
        google_sheet_start_row: 1,
        google_sheet_fields: Vec::new(),
        website_status: "draft".to_string(),
        website_need_password: false,
        user: user_id,
    };
    store.websites.insert(website.id.clone(), website.clone());
    created(json!({ "message": "Website created", "website": website }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteWebsite {
    pub website_id: String,
}

async fn delete_website(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<DeleteWebsite>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    let owned = store
        .websites
        .get(&input.website_id)
        .is_some_and(|w| w.user == user_id);
    if !owned {
        return Err(Failure(StatusCode::NOT_FOUND, "No website with this id"));
    }
    store.websites.remove(&input.website_id);
    ok(json!({ "message": "Website deleted" }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWebsiteSheet {
    pub website_id: String,
    pub google_sheet_name: String,
    pub google_sheet_api_url: String,
    pub google_sheet_id: String,
    pub google_sheet_start_row: u32,
    #[serde(default)]
    pub google_sheet_fields: Vec<Value>,
}

async fn edit_website_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EditWebsiteSheet>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    let website = store
        .websites
        .get_mut(&input.website_id)
        .filter(|w| w.user == user_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No website with this id"))?;
    website.google_sheet_name = input.google_sheet_name;
    website.google_sheet_api_url = input.google_sheet_api_url;
    website.google_sheet_id = input.google_sheet_id;
    website.google_sheet_start_row = input.google_sheet_start_row;
    website.google_sheet_fields = input.google_sheet_fields;
    let website = website.clone();
    ok(json!({ "message": "Website sheet updated", "website": website }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWebsiteDetail {
    pub website_id: String,
    pub website_status: Option<String>,
    pub website_need_password: Option<bool>,
}

async fn edit_website_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EditWebsiteDetail>,
) -> Reply {
    let mut store = state.store.write().await;
    let user_id = store.authorize(&headers)?;
    let website = store
        .websites
        .get_mut(&input.website_id)
        .filter(|w| w.user == user_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "No website with this id"))?;
    if let Some(status) = input.website_status {
        website.website_status = status;
    }
    if let Some(need_password) = input.website_need_password {
        website.website_need_password = need_password;
    }
    let website = website.clone();
    ok(json!({ "message": "Website detail updated", "website": website }))
}

// --- probes ---

async fn delayed(Path(ms): Path<u64>) -> Reply {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    ok(json!({ "msg": "slow" }))
}

async fn fixed_status(State(state): State<AppState>, Path(code): Path<u16>) -> Response {
    state.probe_hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(json!({ "msg": format!("status {code}") }))).into_response()
}

async fn probe_hits(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "hits": state.probe_hits.load(Ordering::SeqCst) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serialization_hides_password() {
        let user = User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            email_verified: true,
            role: "user".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["emailVerified"], true);
        assert!(json.get("password").is_none());
    }

    #[test]
    fn register_reads_uppercase_otp() {
        let input: Register = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","password":"secret1","OTP":"123456"}"#,
        )
        .unwrap();
        assert_eq!(input.otp, MOCK_OTP);
    }

    #[test]
    fn register_rejects_missing_otp() {
        let result: Result<Register, _> =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com","password":"secret1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn edit_sheet_api_defaults_to_empty() {
        let input: EditSheet = serde_json::from_str(
            r#"{"name":"Q1","url":"https://docs/q1","fileId":"f1","sheetId":"s1"}"#,
        )
        .unwrap();
        assert!(input.api.is_empty());
    }

    #[test]
    fn authorize_requires_known_bearer_token() {
        let mut store = Store::default();
        store.sessions.insert("tok".to_string(), "u1".to_string());

        let mut headers = HeaderMap::new();
        assert!(store.authorize(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert!(store.authorize(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer tok".parse().unwrap());
        assert_eq!(store.authorize(&headers).unwrap(), "u1");
    }
}
