//! HTTP request handlers for the Tally API.
//!
//! Every response uses the same JSON envelope: an optional `message`, an
//! optional `error` and a `data` payload.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tally_domain::traits::{LedgerStore, LlmProvider};
use tally_domain::{
    parse_date, Asset, AssetHistoryEntry, AssetId, AssetValue, CandidateAsset,
    CandidateTransaction, CategorySpend, DailySpend, DateRange, DomainError, Transaction,
    TransactionFilter, TransactionId,
};
use tally_extractor::{ExtractionError, Extractor};
use tally_ingest::{IngestError, IngestionResult, Orchestrator, ReconcileOutcome, ReconciledAsset};
use tally_store::{SqliteStore, StoreError};
use tower_http::trace::TraceLayer;
use tracing::error;

/// Number of categories in the top expense categories report
pub const TOP_CATEGORIES_LIMIT: usize = 5;

/// Shared application state
pub struct AppState<L: LlmProvider> {
    /// Extraction and persistence pipeline
    pub orchestrator: Arc<Orchestrator<L, SqliteStore>>,
    /// The store behind the pipeline, for reads and deletes
    pub store: Arc<Mutex<SqliteStore>>,
}

impl<L: LlmProvider> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            store: Arc::clone(&self.store),
        }
    }
}

impl<L: LlmProvider> AppState<L> {
    /// Wire an extractor and a store into application state
    pub fn new(extractor: Extractor<L>, store: SqliteStore) -> Self {
        let store = Arc::new(Mutex::new(store));
        Self {
            orchestrator: Arc::new(Orchestrator::new(extractor, Arc::clone(&store))),
            store,
        }
    }
}

/// Response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Human-readable note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description, set on failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn data(data: T) -> Json<Self> {
        Json(Self {
            message: None,
            error: None,
            data,
        })
    }

    fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            message: Some(message.into()),
            error: None,
            data,
        })
    }
}

/// Free-text ingestion request
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// The sentence to parse
    pub line: String,
}

/// Filters for listing transactions
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// `true` or `false`
    pub confirm: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end_date: Option<String>,
}

/// Filter for listing assets
#[derive(Debug, Default, Deserialize)]
pub struct ListAssetsQuery {
    /// `true` or `false`
    pub confirm: Option<String>,
}

/// Required date range for reports
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end_date: Option<String>,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Ingestion pipeline error
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Invalid date, range or identifier
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Unknown record
    #[error("{0}")]
    NotFound(String),
    /// Malformed request
    #[error("{0}")]
    BadRequest(String),
    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ingest(e) => match e {
                IngestError::Extraction(e) => match e {
                    ExtractionError::EmptyInput
                    | ExtractionError::InputTooLong { .. }
                    | ExtractionError::NoFinancialData { .. } => StatusCode::BAD_REQUEST,
                    ExtractionError::Transport(_)
                    | ExtractionError::Decode(_)
                    | ExtractionError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
                },
                IngestError::NoFinancialData
                | IngestError::InvalidDate { .. }
                | IngestError::Validation(_) => StatusCode::BAD_REQUEST,
                IngestError::NotFound(_) => StatusCode::NOT_FOUND,
                IngestError::Reconcile(_) | IngestError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Domain(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the model said when it found nothing to record
    fn model_reply(&self) -> Option<String> {
        match self {
            AppError::Ingest(IngestError::Extraction(ExtractionError::NoFinancialData {
                reply,
            })) => reply.clone(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(ApiResponse {
            message: self.model_reply(),
            error: Some(self.to_string()),
            data: Value::Null,
        });
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn with_store<L, T, F>(state: &AppState<L>, op: F) -> Result<T, AppError>
where
    L: LlmProvider,
    F: FnOnce(&mut SqliteStore) -> Result<T, StoreError>,
{
    let mut store = state
        .store
        .lock()
        .map_err(|e| AppError::Internal(format!("Store lock error: {}", e)))?;
    Ok(op(&mut *store)?)
}

fn parse_confirm(value: Option<&str>) -> Result<Option<bool>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(AppError::BadRequest(format!(
            "Invalid confirm value '{}': expected true or false",
            other
        ))),
    }
}

fn optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(parse_date(value)?)),
    }
}

fn report_range(query: &ReportQuery) -> Result<DateRange, AppError> {
    let start = optional_date(query.start_date.as_deref())?;
    let end = optional_date(query.end_date.as_deref())?;
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)?),
        _ => Err(AppError::BadRequest(
            "Missing required parameters: start_date, end_date".to_string(),
        )),
    }
}

/// GET / - Welcome message
async fn index() -> Json<ApiResponse<Value>> {
    ApiResponse::with_message("Welcome to Tally. POST a sentence to /api/transactions.", Value::Null)
}

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Configured model
    pub model: String,
}

/// GET /health - Liveness check
async fn health_check<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        model: state.orchestrator.extractor().provider().model_name().to_string(),
    })
}

/// POST /api/transactions - Parse a sentence and store what it describes
async fn create_from_text<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Json(request): Json<CreateTransactionRequest>,
) -> ApiResult<IngestionResult> {
    let result = state.orchestrator.process(&request.line).await?;

    let message = format!(
        "Recorded {} transaction(s) and {} asset(s)",
        result.transactions.len(),
        result.assets.len()
    );
    Ok(ApiResponse::with_message(message, result))
}

/// GET /api/transactions - List transactions
async fn list_transactions<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Vec<Transaction>> {
    let filter = TransactionFilter::new(
        parse_confirm(query.confirm.as_deref())?,
        optional_date(query.start_date.as_deref())?,
        optional_date(query.end_date.as_deref())?,
    )?;
    let transactions = with_store(&state, |store| store.list_transactions(&filter))?;
    Ok(ApiResponse::data(transactions))
}

/// GET /api/transactions/:id
async fn get_transaction<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<Transaction> {
    let id: TransactionId = id.parse()?;
    with_store(&state, |store| store.get_transaction(id))?
        .map(ApiResponse::data)
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
}

/// PUT /api/transactions/:id - Replace every field
async fn update_transaction<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
    Json(candidate): Json<CandidateTransaction>,
) -> ApiResult<Transaction> {
    let id: TransactionId = id.parse()?;
    let updated = state.orchestrator.ingestor().replace(id, &candidate)?;
    Ok(ApiResponse::with_message("Transaction updated", updated))
}

/// DELETE /api/transactions/:id
async fn delete_transaction<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id: TransactionId = id.parse()?;
    if !with_store(&state, |store| store.delete_transaction(id))? {
        return Err(AppError::NotFound(format!("Transaction {} not found", id)));
    }
    Ok(ApiResponse::with_message("Transaction deleted", Value::Null))
}

/// GET /api/reports/top-expense-categories
async fn top_expense_categories<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<CategorySpend>> {
    let range = report_range(&query)?;
    let categories = with_store(&state, |store| {
        store.spending_by_category(&range, TOP_CATEGORIES_LIMIT)
    })?;
    Ok(ApiResponse::data(categories))
}

/// GET /api/reports/daily-spending
async fn daily_spending<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<DailySpend>> {
    let range = report_range(&query)?;
    let days = with_store(&state, |store| store.spending_by_day(&range))?;
    Ok(ApiResponse::data(days))
}

/// POST /api/assets - Create or revalue an asset by its key
///
/// 201 when a new asset was inserted, 200 when an existing one was revalued.
async fn create_asset<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Json(candidate): Json<CandidateAsset>,
) -> Result<(StatusCode, Json<ApiResponse<ReconciledAsset>>), AppError> {
    let reconciled = state.orchestrator.reconciler().reconcile(&candidate)?;
    let (status, message) = match reconciled.outcome {
        ReconcileOutcome::Created => (StatusCode::CREATED, "Asset created"),
        ReconcileOutcome::Updated => (StatusCode::OK, "Asset updated"),
    };
    Ok((status, ApiResponse::with_message(message, reconciled)))
}

/// GET /api/assets - List assets
async fn list_assets<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Query(query): Query<ListAssetsQuery>,
) -> ApiResult<Vec<Asset>> {
    let confirm = parse_confirm(query.confirm.as_deref())?;
    let assets = with_store(&state, |store| store.list_assets(confirm))?;
    Ok(ApiResponse::data(assets))
}

/// GET /api/assets/:id
async fn get_asset<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<Asset> {
    let id: AssetId = id.parse()?;
    with_store(&state, |store| store.get_asset(id))?
        .map(ApiResponse::data)
        .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
}

/// PUT /api/assets/:id/value - Revalue an asset, appending history
async fn update_asset_value<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
    Json(value): Json<AssetValue>,
) -> ApiResult<Asset> {
    let id: AssetId = id.parse()?;
    let asset = state.orchestrator.reconciler().revalue(id, value)?;
    Ok(ApiResponse::with_message("Asset value updated", asset))
}

/// DELETE /api/assets/:id - Delete an asset and its history
async fn delete_asset<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id: AssetId = id.parse()?;
    if !with_store(&state, |store| store.delete_asset(id))? {
        return Err(AppError::NotFound(format!("Asset {} not found", id)));
    }
    Ok(ApiResponse::with_message("Asset deleted", Value::Null))
}

/// GET /api/assets/:id/history - Value history, oldest first
async fn asset_history<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<AssetHistoryEntry>> {
    let id: AssetId = id.parse()?;
    let history = with_store(&state, |store| {
        if store.get_asset(id)?.is_none() {
            return Ok(None);
        }
        store.asset_history(id).map(Some)
    })?;
    history
        .map(ApiResponse::data)
        .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
}

/// Create the axum router with all routes
pub fn create_router<L: LlmProvider + 'static>(state: AppState<L>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check::<L>))
        .route(
            "/api/transactions",
            get(list_transactions::<L>).post(create_from_text::<L>),
        )
        .route(
            "/api/transactions/:id",
            get(get_transaction::<L>)
                .put(update_transaction::<L>)
                .delete(delete_transaction::<L>),
        )
        .route(
            "/api/reports/top-expense-categories",
            get(top_expense_categories::<L>),
        )
        .route("/api/reports/daily-spending", get(daily_spending::<L>))
        .route("/api/assets", get(list_assets::<L>).post(create_asset::<L>))
        .route(
            "/api/assets/:id",
            get(get_asset::<L>).delete(delete_asset::<L>),
        )
        .route("/api/assets/:id/value", put(update_asset_value::<L>))
        .route("/api/assets/:id/history", get(asset_history::<L>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
