//! Domain DTOs for the E-sheetbook API.
//!
//! # Design
//! These mirror the backend's JSON (camelCase, Mongo-style `_id`) but are
//! defined independently of the mock-server crate; the integration tests
//! catch drift. Unknown fields are ignored, missing required fields fail
//! decoding so a malformed response never reaches the caller half-filled.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::http::HttpMethod;

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Body of routes that only acknowledge. Website routes say `message`
/// instead of `msg`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(alias = "message")]
    pub msg: String,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub token: LoginToken,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub name: String,
    pub user_id: String,
    pub role: String,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginToken {
    #[serde(rename = "accessTokenJWT")]
    pub access: String,
    #[serde(rename = "refreshTokenJWT")]
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "OTP")]
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendOtpPayload {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCheckResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl TokenCheckResponse {
    pub fn is_valid(&self) -> bool {
        self.status == "success"
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListFilesResponse {
    pub msg: String,
    #[serde(rename = "file", default)]
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateFilePayload {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateFileResponse {
    pub msg: String,
    pub file: FileRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditFilePayload {
    pub name: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditFileResponse {
    pub msg: String,
    pub file: FileRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFilePayload {
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub msg: String,
    pub deleted_file: FileRecord,
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// An API endpoint bound to a sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetApiBinding {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
}

/// An embedded spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub url: String,
    /// Absent when the sheet is nested under its file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_bindings")]
    pub api: Vec<SheetApiBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Edit and delete responses carry `api` as a JSON-encoded string instead of
/// an array. Accept both; `null` means no bindings.
fn lenient_bindings<'de, D>(deserializer: D) -> Result<Vec<SheetApiBinding>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, Unexpected};

    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(raw).map_err(D::Error::custom),
        Value::String(s) => serde_json::from_str(&s).map_err(D::Error::custom),
        Value::Bool(b) => Err(D::Error::invalid_type(Unexpected::Bool(b), &"an array of api bindings")),
        Value::Number(_) => Err(D::Error::invalid_type(Unexpected::Other("number"), &"an array of api bindings")),
        Value::Object(_) => Err(D::Error::invalid_type(Unexpected::Map, &"an array of api bindings")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileWithSheets {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub user_id: String,
    #[serde(default)]
    pub sheets: Vec<SheetRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListSheetsResponse {
    pub msg: String,
    #[serde(default)]
    pub files: Vec<FileWithSheets>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetsInFileResponse {
    pub msg: String,
    #[serde(default)]
    pub sheets: Vec<SheetRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetPayload {
    pub name: String,
    pub url: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSheetResponse {
    pub msg: String,
    pub sheet: SheetRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditSheetPayload {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub api: Vec<SheetApiBinding>,
    pub file_id: String,
    pub sheet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditSheetResponse {
    pub msg: String,
    pub sheet_updated: SheetRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetPayload {
    pub sheet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetResponse {
    pub msg: String,
    pub sheet_deleted: SheetRecord,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUserResponse {
    pub msg: String,
    pub user: CurrentUser,
}

// ---------------------------------------------------------------------------
// Website
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SheetFieldType {
    Text,
    Number,
    Date,
    Boolean,
    Blank,
}

/// One column of a published sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetField {
    pub index: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: SheetFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub google_sheet_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_start_row: Option<u32>,
    #[serde(default)]
    pub google_sheet_fields: Vec<SheetField>,
    pub website_status: String,
    #[serde(default)]
    pub website_need_password: bool,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebsitePayload {
    pub google_sheet_name: String,
    pub google_sheet_api_url: String,
    pub google_sheet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateWebsiteResponse {
    pub message: String,
    pub website: WebsiteRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListWebsitesResponse {
    pub message: String,
    #[serde(default)]
    pub websites: Vec<WebsiteRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteWebsitePayload {
    pub website_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditWebsiteSheetPayload {
    pub website_id: String,
    pub google_sheet_name: String,
    pub google_sheet_api_url: String,
    pub google_sheet_id: String,
    pub google_sheet_start_row: u32,
    #[serde(default)]
    pub google_sheet_fields: Vec<SheetField>,
}

/// Only the fields present are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditWebsiteDetailPayload {
    pub website_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_need_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditWebsiteResponse {
    pub message: String,
    pub website: WebsiteRecord,
}
