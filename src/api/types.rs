//! Request and response DTOs for the backend API.
//!
//! Response shapes are tolerant where the backend is loose (optional
//! fields, defaulted lists) and strict where a missing field means the
//! call failed (`answer`, `pleading`, `analysis`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Identity;

// --- Auth ---

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

// --- Documents ---

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub total_chunks: Option<u32>,
    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentListResponse {
    #[serde(default)]
    pub documents: Vec<DocumentInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkInfo {
    pub index: u32,
    pub content: String,
    #[serde(default)]
    pub highlighted: bool,
}

/// Full document with ordered chunks, optionally one highlighted.
#[derive(Debug, Deserialize)]
pub struct FullDocumentResponse {
    pub document: DocumentInfo,
    pub full_content: String,
    #[serde(default)]
    pub chunks: Vec<ChunkInfo>,
    #[serde(default)]
    pub highlight_chunk: Option<u32>,
}

/// Per-file outcome of an upload batch.
#[derive(Debug, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<UploadResult>,
}

impl UploadResponse {
    /// Files the backend reported as failed.
    pub fn error_count(&self) -> usize {
        self.data
            .iter()
            .filter(|r| matches!(r.status.as_deref(), Some("error") | Some("خطأ")))
            .count()
    }
}

// --- Query ---

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_generation: bool,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: None,
            skip_generation: false,
        }
    }
}

/// A cited source. The backend varies the fields per endpoint: queries
/// carry chunk references and previews, jurisprudence carries relevance
/// scores and snippets.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub filename: String,
    #[serde(default)]
    pub chunk_index: Option<u32>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub content_preview: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl Source {
    /// Whether the source can be opened in the document viewer. Chunk 0 is
    /// usually the document header, so it is not viewable.
    pub fn viewable(&self) -> bool {
        self.document_id.is_some() && self.chunk_index.is_some_and(|i| i > 0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// A validated answer: present, with its citations.
#[derive(Debug)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

// --- Cases ---

#[derive(Debug, Default, Serialize)]
pub struct CaseCreate {
    pub case_number: String,
    pub case_type: String,
    pub court: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defendant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintiff_name: Option<String>,
    pub charges: Vec<String>,
    pub facts: String,
    pub notes: String,
}

#[derive(Debug, Default, Serialize)]
pub struct CaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defendant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintiff_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseSummary {
    pub id: String,
    pub case_number: String,
    #[serde(default)]
    pub case_type: Option<String>,
    #[serde(default)]
    pub court: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaseListResponse {
    #[serde(default)]
    pub cases: Vec<CaseSummary>,
}

/// Case facts come back either as flat text or as a structured record,
/// depending on how the case was ingested.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CaseFacts {
    Text(String),
    Structured(StructuredFacts),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredFacts {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub defendant_version: Option<String>,
    #[serde(default)]
    pub victim_version: Option<String>,
    #[serde(default)]
    pub contradictions: Vec<String>,
}

impl CaseFacts {
    /// Flatten to display text, labelling the structured sections.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(facts) => {
                let mut parts = Vec::new();
                if let Some(summary) = &facts.summary {
                    parts.push(format!("Summary of facts:\n{summary}"));
                }
                if let Some(version) = &facts.defendant_version {
                    parts.push(format!("Defendant's account:\n{version}"));
                }
                if let Some(version) = &facts.victim_version {
                    parts.push(format!("Victim's account:\n{version}"));
                }
                if !facts.contradictions.is_empty() {
                    parts.push(format!(
                        "Contradictions:\n- {}",
                        facts.contradictions.join("\n- ")
                    ));
                }
                parts.join("\n\n")
            }
        }
    }
}

/// A charge is either a bare string or a record with a `charge` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChargeEntry {
    Text(String),
    Detailed { charge: String },
}

impl ChargeEntry {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(t) => t,
            Self::Detailed { charge } => charge,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CaseDetail {
    pub case_number: String,
    #[serde(default)]
    pub case_type: Option<String>,
    #[serde(default)]
    pub court: Option<String>,
    #[serde(default)]
    pub defendant_name: Option<String>,
    #[serde(default)]
    pub plaintiff_name: Option<String>,
    #[serde(default)]
    pub charges: Vec<ChargeEntry>,
    #[serde(default)]
    pub facts: Option<CaseFacts>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaseDetailResponse {
    pub case: CaseDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// --- Legal modes ---

/// Case facts sent to the pleading generator.
#[derive(Debug, Default, Serialize)]
pub struct PleadingCaseData {
    pub case_number: String,
    pub facts: String,
    pub case_type: String,
    pub court: String,
    pub defendant_name: String,
    pub charges: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PleadingRequest {
    pub case_data: PleadingCaseData,
    pub pleading_type: String,
    pub style: String,
    pub top_k: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub total_sources: u32,
}

#[derive(Debug, Deserialize)]
pub struct PleadingResponse {
    pub pleading: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct JurisprudenceRequest {
    pub legal_issue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chamber: Option<String>,
    pub top_k: u32,
}

#[derive(Debug, Deserialize)]
pub struct JurisprudenceResponse {
    pub analysis: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ConsultationRequest {
    pub situation: String,
}

#[derive(Debug, Deserialize)]
pub struct ConsultationResponse {
    pub consultation: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub status: Option<String>,
}

// --- Errors ---

/// FastAPI-style failure body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn facts_parse_both_shapes() {
        let flat: CaseFacts = serde_json::from_str(r#""simple facts""#).unwrap();
        assert_eq!(flat.to_text(), "simple facts");

        let structured: CaseFacts = serde_json::from_str(
            r#"{"summary":"S","defendant_version":"D","contradictions":["a","b"]}"#,
        )
        .unwrap();
        let text = structured.to_text();
        assert!(text.contains("Summary of facts:\nS"));
        assert!(text.contains("Defendant's account:\nD"));
        assert!(text.contains("- a\n- b"));
    }

    #[test]
    fn charges_parse_both_shapes() {
        let charges: Vec<ChargeEntry> =
            serde_json::from_str(r#"["theft", {"charge": "fraud"}]"#).unwrap();
        let texts: Vec<&str> = charges.iter().map(ChargeEntry::text).collect();
        assert_eq!(texts, vec!["theft", "fraud"]);
    }

    #[test]
    fn query_request_omits_unset_fields() {
        let body = serde_json::to_value(QueryRequest::new("q")).unwrap();
        assert_eq!(body, serde_json::json!({"query": "q"}));
    }

    #[test]
    fn source_viewable_requires_nonzero_chunk_and_document_id() {
        let viewable: Source = serde_json::from_str(
            r#"{"filename":"law.txt","chunk_index":2,"document_id":"d1"}"#,
        )
        .unwrap();
        assert!(viewable.viewable());

        let header_chunk: Source =
            serde_json::from_str(r#"{"filename":"law.txt","chunk_index":0,"document_id":"d1"}"#)
                .unwrap();
        assert!(!header_chunk.viewable());

        let no_doc: Source = serde_json::from_str(r#"{"filename":"law.txt"}"#).unwrap();
        assert!(!no_doc.viewable());
    }

    #[test]
    fn upload_response_counts_failed_files() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"message":"ok","data":[{"filename":"a.txt","status":"success"},{"filename":"b.txt","status":"error"}]}"#,
        )
        .unwrap();
        assert_eq!(response.error_count(), 1);
    }
}
