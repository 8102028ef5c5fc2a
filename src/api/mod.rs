//! Typed client for the backend's business endpoints.
//!
//! Every call goes through the session guard, which owns authentication
//! and 401 handling. This layer only shapes requests and interprets
//! payloads; the guard never looks inside them.

pub mod types;

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::session::{Session, SessionGuard};

use types::{
    ActionResponse, CaseCreate, CaseDetail, CaseDetailResponse, CaseListResponse, CaseSummary,
    CaseUpdate, ConsultationRequest, ConsultationResponse, DocumentInfo, DocumentListResponse,
    ErrorBody, FullDocumentResponse, JurisprudenceRequest, JurisprudenceResponse, LoginRequest,
    LoginResponse, PleadingRequest, PleadingResponse, QueryAnswer, QueryRequest, QueryResponse,
    UploadResponse,
};

/// File extensions the ingestion pipeline accepts.
pub const SUPPORTED_UPLOAD_EXTENSIONS: &[&str] = &["txt", "docx", "xlsx"];

/// Consultations need an actual description to work with.
const MIN_SITUATION_CHARS: usize = 10;

#[derive(Clone)]
pub struct ApiClient {
    guard: SessionGuard,
}

impl ApiClient {
    pub fn new(guard: SessionGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Decode a success body, or map the failure: 401 becomes
    /// [`ApiError::Unauthorized`] (the guard already tore the session
    /// down), everything else carries the backend's `{detail}` message.
    async fn expect_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| format!("request failed ({status})"));
            return Err(ApiError::Api { status, detail });
        }
        Ok(response.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.guard.request(Method::GET, path)?;
        let response = self.guard.send(request).await?;
        self.expect_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let request = self.guard.request(Method::POST, path)?.json(body);
        let response = self.guard.send(request).await?;
        self.expect_json(response).await
    }

    // --- Auth ---

    /// Sign in and persist the session: both storage keys are written
    /// together so the both-or-neither invariant holds from the start.
    ///
    /// Sent outside the 401 hook — rejected credentials must not trigger
    /// the "session ended" boundary for a user who was never signed in.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = self.guard.request(Method::POST, "login")?.json(&body);
        let response = self.guard.send_unguarded(request).await?;
        let login: LoginResponse = self.expect_json(response).await?;

        Session::persist(self.guard.store(), &login.token, &login.user)?;
        tracing::info!(user = %login.user.display_name(), "signed in");

        Ok(Session {
            credential: SecretString::from(login.token),
            identity: login.user,
        })
    }

    /// Clear the stored session. Safe when not signed in.
    pub fn logout(&self) {
        self.guard.teardown();
    }

    // --- Documents ---

    /// Upload documents for ingestion. Files with unsupported extensions
    /// are rejected client-side before anything is sent.
    pub async fn upload_documents(
        &self,
        paths: &[std::path::PathBuf],
        doc_type: &str,
    ) -> Result<UploadResponse, ApiError> {
        let valid: Vec<&Path> = paths
            .iter()
            .map(|p| p.as_path())
            .filter(|p| has_supported_extension(p))
            .collect();
        if valid.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "no supported files selected (supported: .{})",
                SUPPORTED_UPLOAD_EXTENSIONS.join(", .")
            )));
        }

        let mut form = Form::new().text("doc_type", doc_type.to_string());
        for path in valid {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                ApiError::InvalidInput(format!("cannot read {}: {e}", path.display()))
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            form = form.part("files", Part::bytes(bytes).file_name(name));
        }

        let request = self.guard.request(Method::POST, "upload")?.multipart(form);
        let response = self.guard.send(request).await?;
        self.expect_json(response).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>, ApiError> {
        let list: DocumentListResponse = self.get_json("documents").await?;
        Ok(list.documents)
    }

    /// Full document with ordered chunks, optionally highlighting one.
    pub async fn full_document(
        &self,
        document_id: &str,
        highlight_chunk: Option<u32>,
    ) -> Result<FullDocumentResponse, ApiError> {
        let mut url = self.guard.endpoint(&format!("documents/{document_id}/full"))?;
        if let Some(chunk) = highlight_chunk {
            url.query_pairs_mut()
                .append_pair("highlight_chunk", &chunk.to_string());
        }
        let request = self.guard.request_url(Method::GET, url);
        let response = self.guard.send(request).await?;
        self.expect_json(response).await
    }

    // --- Query ---

    /// Ask the research assistant. A success response without an answer is
    /// an error: the caller has nothing to render.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryAnswer, ApiError> {
        let data: QueryResponse = self.post_json("query", &request).await?;
        let answer = data
            .answer
            .ok_or_else(|| ApiError::InvalidResponse("no answer in response".to_string()))?;
        Ok(QueryAnswer {
            answer,
            sources: data.sources,
        })
    }

    // --- Cases ---

    pub async fn list_cases(&self) -> Result<Vec<CaseSummary>, ApiError> {
        let list: CaseListResponse = self.get_json("cases").await?;
        Ok(list.cases)
    }

    pub async fn get_case(&self, case_id: &str) -> Result<CaseDetail, ApiError> {
        let detail: CaseDetailResponse = self.get_json(&format!("cases/{case_id}")).await?;
        Ok(detail.case)
    }

    pub async fn create_case(&self, case: &CaseCreate) -> Result<String, ApiError> {
        let response: ActionResponse = self.post_json("cases", case).await?;
        Ok(response.message.unwrap_or_else(|| "Case saved".to_string()))
    }

    pub async fn update_case(&self, case_id: &str, update: &CaseUpdate) -> Result<String, ApiError> {
        let request = self
            .guard
            .request(Method::PUT, &format!("cases/{case_id}"))?
            .json(update);
        let response = self.guard.send(request).await?;
        let action: ActionResponse = self.expect_json(response).await?;
        Ok(action.message.unwrap_or_else(|| "Case updated".to_string()))
    }

    pub async fn delete_case(&self, case_id: &str) -> Result<String, ApiError> {
        let request = self
            .guard
            .request(Method::DELETE, &format!("cases/{case_id}"))?;
        let response = self.guard.send(request).await?;
        let action: ActionResponse = self.expect_json(response).await?;
        Ok(action.message.unwrap_or_else(|| "Case deleted".to_string()))
    }

    // --- Legal modes ---

    pub async fn generate_pleading(
        &self,
        request: &PleadingRequest,
    ) -> Result<PleadingResponse, ApiError> {
        self.post_json("legal/pleading", request).await
    }

    pub async fn search_jurisprudence(
        &self,
        request: &JurisprudenceRequest,
    ) -> Result<JurisprudenceResponse, ApiError> {
        self.post_json("legal/jurisprudence", request).await
    }

    /// Legal consultant mode. The situation description must be long
    /// enough to analyze; short input is refused without a request.
    pub async fn consult(&self, situation: &str) -> Result<ConsultationResponse, ApiError> {
        let situation = situation.trim();
        if situation.chars().count() < MIN_SITUATION_CHARS {
            return Err(ApiError::InvalidInput(format!(
                "please describe the situation in more detail (at least {MIN_SITUATION_CHARS} characters)"
            )));
        }

        let body = ConsultationRequest {
            situation: situation.to_string(),
        };
        let data: ConsultationResponse = self.post_json("legal-consultant", &body).await?;

        // The consultant reports some failures in-band with a 200.
        if data.status.as_deref() == Some("error") {
            return Err(ApiError::InvalidResponse(data.consultation));
        }
        Ok(data)
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_UPLOAD_EXTENSIONS
                .iter()
                .any(|s| ext.eq_ignore_ascii_case(s))
        })
}
