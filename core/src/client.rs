//! Typed endpoint wrappers for the E-sheetbook API.
//!
//! # Design
//! `SheetbookClient` owns nothing but a shared `Pipeline`. Each wrapper maps
//! one domain action to exactly one pipeline call with a fixed method and an
//! `ApiRoute`; retries, dedup, auth headers and error shaping all happen in
//! the pipeline, never here.

use std::sync::Arc;

use crate::error::ApiError;
use crate::pipeline::Pipeline;
use crate::routes::ApiRoute;
use crate::types::*;

/// Cheap to clone; all clones share one pipeline and in-flight registry.
#[derive(Clone)]
pub struct SheetbookClient {
    pipeline: Arc<Pipeline>,
}

impl SheetbookClient {
    pub fn new(pipeline: Pipeline) -> Self {
        Self::from_shared(Arc::new(pipeline))
    }

    pub fn from_shared(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { pipeline: &self.pipeline }
    }

    pub fn files(&self) -> FileApi<'_> {
        FileApi { pipeline: &self.pipeline }
    }

    pub fn sheets(&self) -> SheetApi<'_> {
        SheetApi { pipeline: &self.pipeline }
    }

    pub fn users(&self) -> UserApi<'_> {
        UserApi { pipeline: &self.pipeline }
    }

    pub fn websites(&self) -> WebsiteApi<'_> {
        WebsiteApi { pipeline: &self.pipeline }
    }
}

pub struct AuthApi<'a> {
    pipeline: &'a Pipeline,
}

impl AuthApi<'_> {
    pub async fn login(&self, payload: &LoginPayload) -> Result<LoginResponse, ApiError> {
        self.pipeline.post(ApiRoute::AuthLogin, payload).await
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<MessageResponse, ApiError> {
        self.pipeline.post(ApiRoute::AuthRegister, payload).await
    }

    /// Mail a one-time password used by `register`.
    pub async fn send_otp(&self, payload: &SendOtpPayload) -> Result<MessageResponse, ApiError> {
        self.pipeline.post(ApiRoute::AuthSendOtp, payload).await
    }

    pub async fn check_valid_token(&self) -> Result<TokenCheckResponse, ApiError> {
        self.pipeline.get(ApiRoute::AuthCheckValidToken).await
    }

    pub async fn logout(&self) -> Result<MessageResponse, ApiError> {
        self.pipeline
            .post(ApiRoute::AuthLogout, &serde_json::Value::Object(Default::default()))
            .await
    }
}

pub struct FileApi<'a> {
    pipeline: &'a Pipeline,
}

impl FileApi<'_> {
    pub async fn list(&self) -> Result<ListFilesResponse, ApiError> {
        self.pipeline.get(ApiRoute::File).await
    }

    pub async fn create(&self, payload: &CreateFilePayload) -> Result<CreateFileResponse, ApiError> {
        self.pipeline.post(ApiRoute::File, payload).await
    }

    pub async fn edit(&self, payload: &EditFilePayload) -> Result<EditFileResponse, ApiError> {
        self.pipeline.put(ApiRoute::File, payload).await
    }

    pub async fn delete(&self, payload: &DeleteFilePayload) -> Result<DeleteFileResponse, ApiError> {
        self.pipeline.delete_with(ApiRoute::File, payload).await
    }
}

pub struct SheetApi<'a> {
    pipeline: &'a Pipeline,
}

impl SheetApi<'_> {
    /// Every file of the current user with its sheets nested.
    pub async fn list(&self) -> Result<ListSheetsResponse, ApiError> {
        self.pipeline.get(ApiRoute::Sheet).await
    }

    pub async fn list_in_file(&self, file_id: &str) -> Result<SheetsInFileResponse, ApiError> {
        self.pipeline
            .get(ApiRoute::SheetFromFile.with_query(&[("fileId", file_id)]))
            .await
    }

    pub async fn create(&self, payload: &CreateSheetPayload) -> Result<CreateSheetResponse, ApiError> {
        self.pipeline.post(ApiRoute::Sheet, payload).await
    }

    pub async fn edit(&self, payload: &EditSheetPayload) -> Result<EditSheetResponse, ApiError> {
        self.pipeline.put(ApiRoute::Sheet, payload).await
    }

    pub async fn delete(&self, payload: &DeleteSheetPayload) -> Result<DeleteSheetResponse, ApiError> {
        self.pipeline.delete_with(ApiRoute::Sheet, payload).await
    }
}

pub struct UserApi<'a> {
    pipeline: &'a Pipeline,
}

impl UserApi<'_> {
    pub async fn show_me(&self) -> Result<CurrentUserResponse, ApiError> {
        self.pipeline.get(ApiRoute::UserShowMe).await
    }
}

pub struct WebsiteApi<'a> {
    pipeline: &'a Pipeline,
}

impl WebsiteApi<'_> {
    pub async fn create(&self, payload: &CreateWebsitePayload) -> Result<CreateWebsiteResponse, ApiError> {
        self.pipeline.post(ApiRoute::Website, payload).await
    }

    pub async fn list(&self) -> Result<ListWebsitesResponse, ApiError> {
        self.pipeline.get(ApiRoute::Website).await
    }

    pub async fn delete(&self, payload: &DeleteWebsitePayload) -> Result<MessageResponse, ApiError> {
        self.pipeline.delete_with(ApiRoute::Website, payload).await
    }

    pub async fn edit_sheet(&self, payload: &EditWebsiteSheetPayload) -> Result<EditWebsiteResponse, ApiError> {
        self.pipeline.put(ApiRoute::WebsiteEditSheet, payload).await
    }

    pub async fn edit_detail(
        &self,
        payload: &EditWebsiteDetailPayload,
    ) -> Result<EditWebsiteResponse, ApiError> {
        self.pipeline.put(ApiRoute::WebsiteEditDetail, payload).await
    }
}
