//! HTTP API over one long-lived document library and conversation store.
//!
//! Every upload and delete goes through [`DocumentLibrary`], so the search
//! snapshot is reinstalled after each change.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/api/documents` | Document summaries, newest first |
//! | `GET`    | `/api/documents/{id}` | One document with content and chunks |
//! | `POST`   | `/api/documents/upload?name=<file>` | Upload raw bytes; MIME from `Content-Type` |
//! | `DELETE` | `/api/documents/{id}` | Delete a document and reindex |
//! | `GET`    | `/api/search?q=<query>&limit=<n>` | Ranked chunks |
//! | `GET`    | `/api/conversations` | Conversations, most recently updated first |
//! | `POST`   | `/api/conversations` | Create `{ "title": ... }` |
//! | `DELETE` | `/api/conversations/{id}` | Delete with its messages |
//! | `GET`    | `/api/conversations/{id}/messages` | Messages, oldest first |
//! | `POST`   | `/api/conversations/{id}/messages` | Ask `{ "content": ... }` |
//! | `GET`    | `/api/status` | Counts and storage usage |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Document not found: 7" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unsupported_format` (400),
//! `not_found` (404), `extraction_failed` (422), `generation_failed` (500),
//! `internal` (500).

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use docchat_core::store::memory::InMemoryStore;
use docchat_core::store::DocumentStore;
use docchat_core::{Document, DocumentId, DocumentLibrary};

use crate::chat::{self, ChatContext, Exchange};
use crate::config::Config;
use crate::conversation::{Conversation, ConversationId, ConversationStore, Message};
use crate::extract::{self, ExtractError};
use crate::generate::{self, Generator};
use crate::ingest::{self, UploadError};
use crate::status::{self, Status};

/// Shared state behind every handler.
pub struct AppState {
    config: Config,
    library: DocumentLibrary<InMemoryStore>,
    conversations: ConversationStore,
    generator: Box<dyn Generator>,
}

impl AppState {
    /// Wrap an already populated library. The generator is chosen by
    /// `config.generation.provider`.
    pub fn new(config: Config, library: DocumentLibrary<InMemoryStore>) -> anyhow::Result<Self> {
        let generator = generate::create_generator(&config.generation)?;
        Ok(Self {
            config,
            library,
            conversations: ConversationStore::new(),
            generator,
        })
    }

    fn chat_context(&self) -> ChatContext<'_, InMemoryStore> {
        ChatContext {
            library: &self.library,
            conversations: &self.conversations,
            generator: self.generator.as_ref(),
            config: &self.config,
        }
    }
}

type SharedState = Arc<AppState>;

/// Serve the API on `config.server.bind` until the process is terminated.
pub async fn run_server(config: &Config, library: DocumentLibrary<InMemoryStore>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = Arc::new(AppState::new(config.clone(), library)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "docchat server listening");
    println!("docchat server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // One byte over the upload limit so oversized bodies reach the ingest
    // size check and get its error message.
    let body_limit = usize::try_from(state.config.upload.max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/documents", get(handle_list_documents))
        .route(
            "/api/documents/{id}",
            get(handle_get_document).delete(handle_delete_document),
        )
        .route("/api/documents/upload", post(handle_upload))
        .route("/api/search", get(handle_search))
        .route(
            "/api/conversations",
            get(handle_list_conversations).post(handle_create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            axum::routing::delete(handle_delete_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(handle_list_messages).post(handle_send_message),
        )
        .route("/api/status", get(handle_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: format!("{:#}", err),
    }
}

/// Map ingestion failures: rejected uploads are client errors, a document
/// that could not be read is 422.
fn classify_upload_error(err: anyhow::Error) -> AppError {
    if let Some(e) = err.downcast_ref::<UploadError>() {
        return bad_request(e.to_string());
    }
    match err.downcast_ref::<ExtractError>() {
        Some(ExtractError::UnsupportedFormat(_)) => AppError {
            status: StatusCode::BAD_REQUEST,
            code: "unsupported_format",
            message: format!("{:#}", err),
        },
        Some(ExtractError::ExtractionFailed(_)) => AppError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: "extraction_failed",
            message: format!("{:#}", err),
        },
        None => internal(err),
    }
}

/// `send_message` validates before touching anything, so its messages tell
/// client errors apart from generation failures.
fn classify_chat_error(err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);
    if msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("is required") {
        bad_request(msg)
    } else {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "generation_failed",
            message: msg,
        }
    }
}

// ============ Response bodies ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct DocumentSummary {
    id: DocumentId,
    name: String,
    original_name: String,
    mime_type: String,
    size: u64,
    chunk_count: usize,
    uploaded_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name.clone(),
            original_name: doc.original_name.clone(),
            mime_type: doc.mime_type.clone(),
            size: doc.size,
            chunk_count: doc.chunks.len(),
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[derive(Serialize)]
struct DocumentDetail {
    #[serde(flatten)]
    summary: DocumentSummary,
    content: String,
    chunks: Vec<String>,
}

#[derive(Serialize)]
struct SearchHit {
    document_id: DocumentId,
    document: String,
    chunk_index: usize,
    score: f64,
    chunk: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

// ============ Handlers ============

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_list_documents(
    State(state): State<SharedState>,
) -> Result<Json<Vec<DocumentSummary>>, AppError> {
    let docs = state.library.documents().await.map_err(internal)?;
    Ok(Json(docs.iter().map(|d| DocumentSummary::from(d.as_ref())).collect()))
}

async fn handle_get_document(
    State(state): State<SharedState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentDetail>, AppError> {
    let doc = state
        .library
        .store()
        .get_document(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(format!("Document not found: {}", id)))?;

    Ok(Json(DocumentDetail {
        summary: DocumentSummary::from(doc.as_ref()),
        content: doc.content.clone(),
        chunks: doc.chunks.clone(),
    }))
}

#[derive(Deserialize)]
struct UploadParams {
    name: Option<String>,
}

/// Declared MIME type of an upload: the `Content-Type` header without
/// parameters, or a guess from the file name for generic binary bodies.
fn upload_mime_type(headers: &HeaderMap, name: &str) -> Option<String> {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty() && v != "application/octet-stream");

    declared.or_else(|| extract::mime_type_for_path(FsPath::new(name)).map(str::to_string))
}

async fn handle_upload(
    State(state): State<SharedState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<DocumentSummary>), AppError> {
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| bad_request("name query parameter is required"))?;
    if body.is_empty() {
        return Err(bad_request("No file uploaded"));
    }
    let mime_type = upload_mime_type(&headers, &name)
        .ok_or_else(|| bad_request(format!("Cannot tell the file type of {}", name)))?;

    let doc = ingest::ingest_bytes(&state.library, &name, &mime_type, &body, &state.config)
        .await
        .map_err(classify_upload_error)?;

    Ok((StatusCode::CREATED, Json(DocumentSummary::from(doc.as_ref()))))
}

async fn handle_delete_document(
    State(state): State<SharedState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = state.library.remove_document(id).await.map_err(internal)?;
    if !deleted {
        return Err(not_found(format!("Document not found: {}", id)));
    }
    info!(id, "deleted document");
    Ok(Json(MessageResponse {
        message: "Document deleted successfully".to_string(),
    }))
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<usize>,
}

async fn handle_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchHit>> {
    let limit = params.limit.unwrap_or(state.config.retrieval.limit);
    let hits = state
        .library
        .search(&params.q, limit)
        .into_iter()
        .map(|r| SearchHit {
            document_id: r.document.id,
            document: r.document.name.clone(),
            chunk_index: r.chunk_index,
            score: r.score,
            chunk: r.chunk().to_string(),
        })
        .collect();
    Json(hits)
}

async fn handle_list_conversations(State(state): State<SharedState>) -> Json<Vec<Conversation>> {
    Json(state.conversations.list())
}

#[derive(Deserialize)]
struct CreateConversation {
    title: String,
}

async fn handle_create_conversation(
    State(state): State<SharedState>,
    Json(body): Json<CreateConversation>,
) -> Result<(StatusCode, Json<Conversation>), AppError> {
    if body.title.trim().is_empty() {
        return Err(bad_request("title must not be empty"));
    }
    Ok((StatusCode::CREATED, Json(state.conversations.create(&body.title))))
}

async fn handle_delete_conversation(
    State(state): State<SharedState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.conversations.delete(id) {
        return Err(not_found(format!("Conversation not found: {}", id)));
    }
    Ok(Json(MessageResponse {
        message: "Conversation deleted successfully".to_string(),
    }))
}

async fn handle_list_messages(
    State(state): State<SharedState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<Message>>, AppError> {
    if state.conversations.get(id).is_none() {
        return Err(not_found(format!("Conversation not found: {}", id)));
    }
    Ok(Json(state.conversations.messages(id)))
}

#[derive(Deserialize)]
struct SendMessage {
    #[serde(default)]
    content: String,
}

async fn handle_send_message(
    State(state): State<SharedState>,
    Path(id): Path<ConversationId>,
    Json(body): Json<SendMessage>,
) -> Result<Json<Exchange>, AppError> {
    let ctx = state.chat_context();
    let exchange = chat::send_message(&ctx, id, &body.content)
        .await
        .map_err(classify_chat_error)?;
    Ok(Json(exchange))
}

async fn handle_status(State(state): State<SharedState>) -> Result<Json<Status>, AppError> {
    let report = status::collect_status(&state.library, &state.conversations, &state.config)
        .await
        .map_err(internal)?;
    Ok(Json(report))
}
