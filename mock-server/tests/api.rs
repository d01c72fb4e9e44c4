use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mock_server::{app, MOCK_OTP};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

/// Register `email` through the OTP flow and return an access token.
async fn signed_in(app: &Router, email: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/sendOTP", None, json!({ "email": email })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/userRegister",
            None,
            json!({ "name": "Ada", "email": email, "password": "secret1", "OTP": MOCK_OTP }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": email, "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["token"]["accessTokenJWT"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn register_with_wrong_otp_returns_400() {
    let app = app();
    app.clone()
        .oneshot(json_request("POST", "/auth/sendOTP", None, json!({ "email": "a@x.io" })))
        .await
        .unwrap();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/userRegister",
            None,
            json!({ "name": "A", "email": "a@x.io", "password": "secret1", "OTP": "000000" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["msg"], "Invalid OTP");
}

#[tokio::test]
async fn login_with_bad_password_returns_401() {
    let app = app();
    signed_in(&app, "ada@x.io").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "ada@x.io", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn check_valid_token_and_logout() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;

    let resp = app
        .clone()
        .oneshot(get_request("/auth/checkValidToken", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "success");

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/logout", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(get_request("/auth/checkValidToken", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_without_token_returns_401() {
    let resp = app().oneshot(get_request("/users/showMe", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["msg"], "Authentication Invalid");
}

#[tokio::test]
async fn show_me_returns_current_user() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;
    let resp = app.oneshot(get_request("/users/showMe", Some(&token))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@x.io");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password").is_none());
}

// --- files ---

#[tokio::test]
async fn create_file_returns_201_and_lists_it() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/file", Some(&token), json!({ "name": "Budget" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["file"]["name"], "Budget");

    let resp = app.oneshot(get_request("/file", Some(&token))).await.unwrap();
    let list = body_json(resp).await;
    assert_eq!(list["file"].as_array().unwrap().len(), 1);
    assert_eq!(list["file"][0]["_id"], created["file"]["_id"]);
}

#[tokio::test]
async fn files_are_scoped_to_their_owner() {
    let app = app();
    let ada = signed_in(&app, "ada@x.io").await;
    let bob = signed_in(&app, "bob@x.io").await;

    app.clone()
        .oneshot(json_request("POST", "/file", Some(&ada), json!({ "name": "Budget" })))
        .await
        .unwrap();
    let resp = app.oneshot(get_request("/file", Some(&bob))).await.unwrap();

    assert!(body_json(resp).await["file"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_file_with_body_cascades_to_sheets() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/file", Some(&token), json!({ "name": "Budget" })))
        .await
        .unwrap();
    let file_id = body_json(resp).await["file"]["_id"].as_str().unwrap().to_string();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/sheet",
            Some(&token),
            json!({ "name": "Q1", "url": "https://docs/q1", "fileId": file_id }),
        ))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", "/file", Some(&token), json!({ "fileId": file_id })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["deletedFile"]["_id"], file_id.as_str());

    let resp = app.oneshot(get_request("/sheet", Some(&token))).await.unwrap();
    assert!(body_json(resp).await["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn edit_missing_file_returns_404() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;
    let resp = app
        .oneshot(json_request(
            "PUT",
            "/file",
            Some(&token),
            json!({ "name": "Nope", "fileId": "missing" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- sheets ---

#[tokio::test]
async fn sheets_in_file_by_query() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/file", Some(&token), json!({ "name": "Budget" })))
        .await
        .unwrap();
    let file_id = body_json(resp).await["file"]["_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/sheet",
            Some(&token),
            json!({ "name": "Q1", "url": "https://docs/q1", "fileId": file_id }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(get_request(&format!("/sheet/file?fileId={file_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["sheets"][0]["name"], "Q1");
    assert_eq!(body["sheets"][0]["fileId"], file_id.as_str());
}

#[tokio::test]
async fn edit_sheet_returns_encoded_api() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/file", Some(&token), json!({ "name": "Budget" })))
        .await
        .unwrap();
    let file_id = body_json(resp).await["file"]["_id"].as_str().unwrap().to_string();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/sheet",
            Some(&token),
            json!({ "name": "Q1", "url": "https://docs/q1", "fileId": file_id }),
        ))
        .await
        .unwrap();
    let sheet_id = body_json(resp).await["sheet"]["_id"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(json_request(
            "PUT",
            "/sheet",
            Some(&token),
            json!({
                "name": "Q1 final",
                "url": "https://docs/q1",
                "fileId": file_id,
                "sheetId": sheet_id,
                "api": [{ "name": "rows", "method": "GET", "url": "https://script/rows" }],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["sheetUpdated"]["name"], "Q1 final");
    assert!(body["sheetUpdated"]["api"].is_string());
}

#[tokio::test]
async fn sheet_for_unknown_file_returns_404() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;
    let resp = app
        .oneshot(get_request("/sheet/file?fileId=missing", Some(&token)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- websites ---

#[tokio::test]
async fn website_lifecycle() {
    let app = app();
    let token = signed_in(&app, "ada@x.io").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/website",
            Some(&token),
            json!({ "googleSheetName": "Menu", "googleSheetApiUrl": "https://script/menu", "googleSheetId": "g1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let website_id = body_json(resp).await["website"]["_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/website/detail",
            Some(&token),
            json!({ "websiteId": website_id, "websiteNeedPassword": true }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["website"]["websiteNeedPassword"], true);

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", "/website", Some(&token), json!({ "websiteId": website_id })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get_request("/website", Some(&token))).await.unwrap();
    assert!(body_json(resp).await["websites"].as_array().unwrap().is_empty());
}

// --- probes ---

#[tokio::test]
async fn status_probe_counts_hits() {
    let app = app();
    let resp = app.clone().oneshot(get_request("/__mock/status/503", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = app.oneshot(get_request("/__mock/hits", None)).await.unwrap();
    assert_eq!(body_json(resp).await["hits"], 1);
}
