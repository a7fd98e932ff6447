//! # API REST
//!
//! REST API for the front desk.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Caller role and API key checks
//! - REST-specific concerns (JSON serialization, CORS, PDF responses)
//!
//! Uses `api-shared` for request/response types and `frontdesk-core` for storage.

#![warn(rust_2018_idioms)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use url::Url;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::{self, API_KEY_HEADER, ROLE_HEADER};
use api_shared::convert::parse_patient_id;
use api_shared::{
    AuthError, DischargeReq, DischargeSummary, ErrorRes, HealthRes, HealthService,
    ListDischargesRes, ListPatientsRes, NextPatientIdRes, Patient, PatientDetailsRes, PatientReq,
    PatientSummaryRes, Role, SearchHit, SearchRes, Visit, VisitHistoryItem, VisitHistoryRes,
    VisitReq,
};
use frontdesk_core::{
    asset_paths_from_env_values, constants::DEFAULT_DATA_DIR, constants::DEFAULT_PUBLIC_URL,
    font_file_from_env_value,
    CoreConfig, DischargeService, PatientId, PatientService, RecordError, VisitService,
};

/// Application state shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub patients: PatientService,
    pub visits: VisitService,
    pub discharges: DischargeService,
    /// When set, every request except the public ones must present this key.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, api_key: Option<String>) -> Self {
        Self {
            patients: PatientService::new(cfg.clone()),
            visits: VisitService::new(cfg.clone()),
            discharges: DischargeService::new(cfg.clone()),
            cfg,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        next_patient_id,
        create_patient,
        search_patients,
        patient_summary,
        patient_details,
        update_patient,
        visit_history,
        create_visit,
        list_discharges,
        create_discharge,
        get_discharge,
        discharge_pdf,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        Patient,
        ListPatientsRes,
        PatientReq,
        NextPatientIdRes,
        SearchHit,
        SearchRes,
        PatientSummaryRes,
        PatientDetailsRes,
        Visit,
        VisitReq,
        VisitHistoryItem,
        VisitHistoryRes,
        DischargeSummary,
        ListDischargesRes,
        DischargeReq,
    ))
)]
pub struct ApiDoc;

type ApiError = (StatusCode, Json<ErrorRes>);

/// Builds the core configuration from `FRONTDESK_*` environment variables.
///
/// The data directory is created if it does not exist yet.
pub fn config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = PathBuf::from(
        std::env::var("FRONTDESK_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into()),
    );
    std::fs::create_dir_all(&data_dir)?;

    let mut assets = asset_paths_from_env_values(
        std::env::var("FRONTDESK_BASE_DIR").ok(),
        std::env::var("FRONTDESK_STATIC_URL").ok(),
        std::env::var("FRONTDESK_STATIC_ROOT").ok(),
        std::env::var("FRONTDESK_MEDIA_URL").ok(),
        std::env::var("FRONTDESK_MEDIA_ROOT").ok(),
    );
    assets.font_file = font_file_from_env_value(std::env::var("FRONTDESK_FONT_FILE").ok());
    let public_url =
        std::env::var("FRONTDESK_PUBLIC_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_URL.into());

    Ok(CoreConfig::new(data_dir, assets, &public_url)?)
}

/// Builds the application router with all routes, Swagger UI and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/next-id", get(next_patient_id))
        .route("/patients/search", get(search_patients))
        .route(
            "/patients/:patient_id",
            get(patient_summary).put(update_patient),
        )
        .route("/patients/:patient_id/details", get(patient_details))
        .route("/visits", get(visit_history).post(create_visit))
        .route("/discharges", get(list_discharges).post(create_discharge))
        .route("/discharges/:id", get(get_discharge))
        .route("/discharges/:id/pdf", get(discharge_pdf))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn is_public_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/swagger-ui") || path.starts_with("/api-docs")
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_public_path(request.uri().path()) {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        auth::validate_api_key(state.api_key.as_deref(), provided).map_err(auth_error)?;
    }
    Ok(next.run(request).await)
}

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

fn auth_error(err: AuthError) -> ApiError {
    let status = if err.is_unauthenticated() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::FORBIDDEN
    };
    tracing::warn!("Rejected request: {}", err);
    error_body(status, err.to_string())
}

fn record_error(context: &str, err: RecordError) -> ApiError {
    match &err {
        RecordError::InvalidInput(_) => {
            tracing::warn!("{}: {}", context, err);
            error_body(StatusCode::BAD_REQUEST, err.to_string())
        }
        RecordError::NotFound { .. } => error_body(StatusCode::NOT_FOUND, err.to_string()),
        RecordError::DuplicatePatientId(_)
        | RecordError::UnfinishedRegistration { .. }
        | RecordError::KeyConflict { .. } => {
            tracing::warn!("{}: {}", context, err);
            error_body(StatusCode::CONFLICT, err.to_string())
        }
        RecordError::Render(render) => {
            tracing::error!("{}: {:?}", context, err);
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("We had some errors generating PDF: {render}"),
            )
        }
        _ => {
            tracing::error!("{}: {:?}", context, err);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn caller_role(headers: &HeaderMap) -> Result<Role, ApiError> {
    let value = headers
        .get(ROLE_HEADER)
        .and_then(|value| value.to_str().ok());
    auth::role_from_header(value).map_err(auth_error)
}

fn require_admin(headers: &HeaderMap) -> Result<Role, ApiError> {
    let role = caller_role(headers)?;
    auth::require_admin(role).map_err(auth_error)?;
    Ok(role)
}

/// Identifiers in the path that are not canonical cannot name a stored patient.
fn path_patient_id(raw: &str) -> Result<PatientId, ApiError> {
    parse_patient_id(raw)
        .map_err(|_| error_body(StatusCode::NOT_FOUND, format!("patient {raw} not found")))
}

/// Base URL of the current request, used when a document resource is not on disk.
fn request_base_url(headers: &HeaderMap) -> Option<Url> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|scheme| matches!(*scheme, "http" | "https"))
        .unwrap_or("http");
    Url::parse(&format!("{scheme}://{host}/")).ok()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, open to every caller.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patients in registration order", body = ListPatientsRes),
        (status = 401, description = "Missing or unknown role", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListPatientsRes>, ApiError> {
    caller_role(&headers)?;
    let records = state
        .patients
        .list()
        .map_err(|e| record_error("Failed to list patients", e))?;
    Ok(Json(ListPatientsRes {
        patients: records.iter().map(Patient::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/next-id",
    responses(
        (status = 200, description = "Identifier the next registration will receive", body = NextPatientIdRes),
        (status = 403, description = "Caller is not an administrator", body = ErrorRes),
        (status = 500, description = "Stored identifiers are corrupt", body = ErrorRes)
    )
)]
/// Previews the next patient identifier without reserving it.
#[axum::debug_handler]
async fn next_patient_id(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NextPatientIdRes>, ApiError> {
    require_admin(&headers)?;
    let patient_id = state
        .patients
        .next_patient_id()
        .map_err(|e| record_error("Failed to allocate patient identifier", e))?;
    Ok(Json(NextPatientIdRes {
        patient_id: patient_id.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientReq,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Invalid patient details", body = ErrorRes),
        (status = 403, description = "Caller is not an administrator", body = ErrorRes),
        (status = 409, description = "Identifier already taken", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PatientReq>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    require_admin(&headers)?;
    let new = req
        .into_new_patient()
        .map_err(|e| record_error("Invalid patient request", e))?;
    let record = state
        .patients
        .create(new)
        .map_err(|e| record_error("Failed to create patient", e))?;
    Ok((StatusCode::CREATED, Json(Patient::from(&record))))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct SearchParams {
    /// Case-insensitive name fragment; empty matches every patient.
    #[serde(default)]
    term: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching patients ordered by name", body = SearchRes)
    )
)]
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchRes>, ApiError> {
    caller_role(&headers)?;
    let term = params.term.unwrap_or_default();
    let records = state
        .patients
        .search(&term)
        .map_err(|e| record_error("Failed to search patients", e))?;
    Ok(Json(SearchRes {
        results: records
            .iter()
            .map(|record| SearchHit {
                id: record.patient_id.to_string(),
                text: record.search_label(),
            })
            .collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient identifier, e.g. PO00001")),
    responses(
        (status = 200, description = "Patient summary", body = PatientSummaryRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn patient_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientSummaryRes>, ApiError> {
    caller_role(&headers)?;
    let patient_id = path_patient_id(&patient_id)?;
    let record = state
        .patients
        .get(&patient_id)
        .map_err(|e| record_error("Failed to read patient", e))?;
    let last_visit = state
        .visits
        .last_visit_date(&patient_id)
        .map_err(|e| record_error("Failed to read visits", e))?;

    Ok(Json(PatientSummaryRes {
        name: record.name.to_string(),
        patient_id: record.patient_id.to_string(),
        age: record.age,
        status: record.status.to_string(),
        last_visit: last_visit.map(|date| date.format("%Y-%m-%d").to_string()),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/details",
    params(("patient_id" = String, Path, description = "Patient identifier, e.g. PO00001")),
    responses(
        (status = 200, description = "Fields used to auto-fill forms", body = PatientDetailsRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn patient_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientDetailsRes>, ApiError> {
    caller_role(&headers)?;
    let patient_id = path_patient_id(&patient_id)?;
    let record = state
        .patients
        .get(&patient_id)
        .map_err(|e| record_error("Failed to read patient", e))?;
    Ok(Json(PatientDetailsRes {
        name: record.name.to_string(),
        age: record.age,
        gender: record.gender.to_string(),
        contact_number: record.contact_number.to_string(),
    }))
}

#[utoipa::path(
    put,
    path = "/patients/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient identifier, e.g. PO00001")),
    request_body = PatientReq,
    responses(
        (status = 200, description = "Updated patient", body = Patient),
        (status = 400, description = "Invalid patient details", body = ErrorRes),
        (status = 403, description = "Caller is not an administrator", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Edits a patient. The identifier itself never changes.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(patient_id): Path<String>,
    Json(req): Json<PatientReq>,
) -> Result<Json<Patient>, ApiError> {
    require_admin(&headers)?;
    let patient_id = path_patient_id(&patient_id)?;
    let changes = req
        .into_new_patient()
        .map_err(|e| record_error("Invalid patient request", e))?;
    let record = state
        .patients
        .update(&patient_id, changes)
        .map_err(|e| record_error("Failed to update patient", e))?;
    Ok(Json(Patient::from(&record)))
}

#[utoipa::path(
    get,
    path = "/visits",
    responses(
        (status = 200, description = "Visits of the most recently registered patients, newest first", body = VisitHistoryRes)
    )
)]
#[axum::debug_handler]
async fn visit_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VisitHistoryRes>, ApiError> {
    caller_role(&headers)?;
    let entries = state
        .visits
        .recent_history()
        .map_err(|e| record_error("Failed to read visit history", e))?;
    Ok(Json(VisitHistoryRes {
        visits: entries
            .iter()
            .map(|entry| VisitHistoryItem {
                patient_name: entry.patient.name.to_string(),
                visit: Visit::from(&entry.visit),
            })
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/visits",
    request_body = VisitReq,
    responses(
        (status = 201, description = "Visit logged", body = Visit),
        (status = 400, description = "Invalid visit details", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn create_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VisitReq>,
) -> Result<(StatusCode, Json<Visit>), ApiError> {
    caller_role(&headers)?;
    let new = req
        .into_new_visit()
        .map_err(|e| record_error("Invalid visit request", e))?;
    let record = state
        .visits
        .create(new)
        .map_err(|e| record_error("Failed to log visit", e))?;
    Ok((StatusCode::CREATED, Json(Visit::from(&record))))
}

#[utoipa::path(
    get,
    path = "/discharges",
    responses(
        (status = 200, description = "Discharge summaries, newest discharge first", body = ListDischargesRes)
    )
)]
#[axum::debug_handler]
async fn list_discharges(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListDischargesRes>, ApiError> {
    caller_role(&headers)?;
    let records = state
        .discharges
        .list()
        .map_err(|e| record_error("Failed to list discharge summaries", e))?;
    Ok(Json(ListDischargesRes {
        summaries: records.iter().map(DischargeSummary::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/discharges",
    request_body = DischargeReq,
    responses(
        (status = 201, description = "Discharge summary created", body = DischargeSummary),
        (status = 400, description = "Invalid discharge summary", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn create_discharge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DischargeReq>,
) -> Result<(StatusCode, Json<DischargeSummary>), ApiError> {
    caller_role(&headers)?;
    let new = req
        .into_new_discharge()
        .map_err(|e| record_error("Invalid discharge request", e))?;
    let record = state
        .discharges
        .create(new)
        .map_err(|e| record_error("Failed to create discharge summary", e))?;
    Ok((StatusCode::CREATED, Json(DischargeSummary::from(&record))))
}

#[utoipa::path(
    get,
    path = "/discharges/{id}",
    params(("id" = u64, Path, description = "Discharge summary key")),
    responses(
        (status = 200, description = "Discharge summary", body = DischargeSummary),
        (status = 404, description = "Discharge summary not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_discharge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<DischargeSummary>, ApiError> {
    caller_role(&headers)?;
    let record = state
        .discharges
        .get(id)
        .map_err(|e| record_error("Failed to read discharge summary", e))?;
    Ok(Json(DischargeSummary::from(&record)))
}

#[utoipa::path(
    get,
    path = "/discharges/{id}/pdf",
    params(("id" = u64, Path, description = "Discharge summary key")),
    responses(
        (status = 200, description = "Discharge summary as an inline application/pdf document"),
        (status = 404, description = "Discharge summary not found", body = ErrorRes),
        (status = 500, description = "PDF generation failed", body = ErrorRes)
    )
)]
/// Renders a discharge summary to PDF, served inline.
#[axum::debug_handler]
async fn discharge_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    caller_role(&headers)?;
    let document = state
        .discharges
        .render_pdf(id, request_base_url(&headers))
        .map_err(|e| record_error("Failed to render discharge summary", e))?;

    let disposition = document.inline_disposition();
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use frontdesk_core::AssetPaths;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(temp_dir: &TempDir, api_key: Option<&str>) -> AppState {
        let assets = AssetPaths::under_base(temp_dir.path().to_path_buf());
        let cfg = CoreConfig::new(temp_dir.path().join("data"), assets, DEFAULT_PUBLIC_URL)
            .expect("test config should be valid");
        AppState::new(Arc::new(cfg), api_key.map(str::to_string))
    }

    fn get_as(uri: &str, role: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri(uri)
            .header(ROLE_HEADER, role)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, role: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header(ROLE_HEADER, role)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn patient_body(name: &str) -> Value {
        json!({
            "name": name,
            "age": 42,
            "gender": "Female",
            "contact_number": "9876543210"
        })
    }

    #[tokio::test]
    async fn test_health_needs_no_role() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        let response = app
            .oneshot(HttpRequest::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], json!(true));
    }

    #[tokio::test]
    async fn test_missing_role_is_unauthorised() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        let response = app
            .oneshot(HttpRequest::builder().uri("/patients").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_next_id_is_admin_only() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        let response = app
            .clone()
            .oneshot(get_as("/patients/next-id", "nurse"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["error"],
            json!("You are not authorized to access this page.")
        );

        let response = app.oneshot(get_as("/patients/next-id", "admin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["patient_id"], json!("PO00001"));
    }

    #[tokio::test]
    async fn test_create_then_search_and_summarise_patient() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        let response = app
            .clone()
            .oneshot(post_json("/patients", "admin", patient_body("Asha Rao")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["patient_id"], json!("PO00001"));

        let response = app
            .clone()
            .oneshot(get_as("/patients/search?term=asha", "doctor"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let results = body_json(response).await;
        assert_eq!(results["results"][0]["id"], json!("PO00001"));
        assert_eq!(
            results["results"][0]["text"],
            json!("Asha Rao (42 yrs, Female)")
        );

        let response = app
            .clone()
            .oneshot(get_as("/patients/PO00001", "nurse"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["status"], json!("Active"));
        assert_eq!(summary["last_visit"], Value::Null);

        let response = app.oneshot(get_as("/patients/PO00009", "nurse")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unfinished_registration_is_a_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, None);
        let stale = state.cfg.patients_dir().join("PO00002");
        let app = router(state);

        app.clone()
            .oneshot(post_json("/patients", "admin", patient_body("Asha Rao")))
            .await
            .unwrap();
        std::fs::create_dir_all(&stale).unwrap();

        let response = app
            .oneshot(post_json("/patients", "admin", patient_body("Ravi Kumar")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains(&stale.display().to_string()), "{error}");
    }

    #[tokio::test]
    async fn test_invalid_patient_is_bad_request() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        let mut body = patient_body("Asha Rao");
        body["age"] = json!(151);
        let response = app
            .oneshot(post_json("/patients", "admin", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_discharge_pdf_is_served_inline() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        app.clone()
            .oneshot(post_json("/patients", "admin", patient_body("Asha Rao")))
            .await
            .unwrap();

        let discharge = json!({
            "patient_id": "PO00001",
            "uhid": "UH-1001",
            "consultant_name": "Dr. Iyer",
            "admission_date": "2026-03-01",
            "discharge_date": "2026-03-05",
            "final_diagnosis": "Community acquired pneumonia"
        });
        let response = app
            .clone()
            .oneshot(post_json("/discharges", "doctor", discharge))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_u64().unwrap();

        let request = HttpRequest::builder()
            .uri(format!("/discharges/{id}/pdf"))
            .header(ROLE_HEADER, "doctor")
            .header(header::HOST, "frontdesk.local:8080")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("inline; filename=discharge_summary_{id}.pdf").as_str()
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_missing_discharge_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, None));

        let response = app.oneshot(get_as("/discharges/3/pdf", "doctor")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_key_guards_everything_but_health() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir, Some("s3cret")));

        let response = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_as("/patients", "admin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = HttpRequest::builder()
            .uri("/patients")
            .header(ROLE_HEADER, "admin")
            .header(API_KEY_HEADER, "s3cret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_request_base_url_honours_forwarded_proto() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_base_url(&headers), None);

        headers.insert(header::HOST, "clinic.example:8443".parse().unwrap());
        headers.insert("x-forwarded-proto", "https".parse().unwrap());

        assert_eq!(
            request_base_url(&headers).unwrap().as_str(),
            "https://clinic.example:8443/"
        );
    }
}
