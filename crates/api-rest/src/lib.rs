//! # API REST
//!
//! REST API implementation for TransTrack.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, API-key auth)
//!
//! Uses `api-shared` for request/response bodies and the auth helper. The router is
//! exposed so the combined `transtrack-run` binary and the integration tests can serve
//! the same application the standalone binary does.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth;
use api_shared::dto;
use api_shared::HealthService;
use transtrack_core::matching::MatchingService;
use transtrack_core::model::{self, AuditAction};
use transtrack_core::repositories;
use transtrack_core::scoring::{self, ScoringService};
use transtrack_core::{CoreConfig, TrackError};
use transtrack_types::EntityId;

/// Application state shared across REST API handlers.
///
/// Everything in here is resolved once at startup; request handlers never read the
/// environment. `api_key: None` means the instance is open and requests are not
/// authenticated.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, api_key: Option<String>) -> Self {
        Self { cfg, api_key }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_patient,
        list_patients,
        update_patient,
        calculate_priority,
        recalculate_priority,
        run_donor_matching,
        create_donor,
        list_donor_matches,
        create_weights,
        active_weights,
        list_notifications,
        mark_notification_read,
        create_user,
    ),
    components(schemas(
        dto::ErrorBody,
        dto::HealthRes,
        dto::CreatePatientRequest,
        dto::UpdatePatientRequest,
        dto::PatientResponse,
        dto::PatientSummary,
        dto::CalculatePriorityRequest,
        dto::CalculatePriorityResponse,
        dto::RecalculatePriorityResponse,
        dto::DonorMatchingRequest,
        dto::DonorMatchingResponse,
        dto::CreateDonorRequest,
        dto::DonorResponse,
        dto::MatchResponse,
        dto::CreateWeightsRequest,
        dto::WeightsResponse,
        dto::NotificationResponse,
        dto::CreateUserRequest,
        dto::UserResponse,
        model::BloodType,
        model::OrganType,
        model::WaitlistStatus,
        model::MedicalUrgency,
        model::FunctionalStatus,
        model::PrognosisRating,
        model::MatchStatus,
        model::NotificationKind,
        model::PriorityLevel,
        model::StaffRole,
        scoring::ScoreBreakdown,
        scoring::FactorScore,
        scoring::ScoreAdjustments,
        scoring::ScoringWeights,
    ))
)]
struct ApiDoc;

/// Builds the full application router.
///
/// `/health` and the Swagger UI are reachable without a key; every other route goes
/// through the API-key middleware.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/patients/:id", put(update_patient))
        .route("/functions/calculate-priority", post(calculate_priority))
        .route("/functions/recalculate-priority", post(recalculate_priority))
        .route("/functions/donor-matching", post(run_donor_matching))
        .route("/donors", post(create_donor))
        .route("/donors/:id/matches", get(list_donor_matches))
        .route("/weights", post(create_weights))
        .route("/weights/active", get(active_weights))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/users", post(create_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the API until the process stops.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Rejects requests that do not carry the configured `x-api-key` header.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<dto::ErrorBody>)> {
    match auth::validate_api_key(state.api_key.as_deref(), request.headers()) {
        Ok(()) => Ok(next.run(request).await),
        Err(err) => Err((
            StatusCode::UNAUTHORIZED,
            Json(dto::ErrorBody {
                error: err.to_string(),
            }),
        )),
    }
}

/// Maps a core error onto the uniform `{"error": ...}` body and its status code.
///
/// Absent records map to 404, rejected input to 400, everything else to 500.
fn error_response(err: TrackError) -> (StatusCode, Json<dto::ErrorBody>) {
    let status = match &err {
        TrackError::NotFound { .. } => StatusCode::NOT_FOUND,
        TrackError::InvalidInput(_) | TrackError::Text(_) | TrackError::Id(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => {
            tracing::error!("request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(dto::ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn parse_id(raw: &str) -> Result<EntityId, (StatusCode, Json<dto::ErrorBody>)> {
    EntityId::parse(raw).map_err(|err| error_response(TrackError::Id(err)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks; reachable without an API key.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<dto::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = dto::CreatePatientRequest,
    responses(
        (status = 201, description = "Patient added to the waitlist", body = dto::PatientResponse),
        (status = 400, description = "Rejected intake payload", body = dto::ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = dto::ErrorBody),
        (status = 500, description = "Internal server error", body = dto::ErrorBody)
    )
)]
/// Add a patient to the transplant waitlist
///
/// The priority scoring engine runs on the intake payload before the first persist, so
/// a stored patient is never without a score.
///
/// # Errors
/// Returns `400 Bad Request` if the payload carries a blank record number or name.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::CreatePatientRequest>,
) -> Result<(StatusCode, Json<dto::PatientResponse>), (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let mut patient = req.into_patient().map_err(error_response)?;
    let weights = repositories::weights::active_weights(&state.cfg);
    scoring::apply_priority(&mut patient, &weights, Utc::now());

    let record =
        repositories::patients::create_patient(&state.cfg, patient).map_err(error_response)?;
    repositories::audit::record_action(
        &state.cfg,
        AuditAction::PatientCreated,
        "patient",
        &record.id.to_string(),
        format!(
            "patient {} added to the {} waitlist",
            record.data.medical_record_number, record.data.organ_needed
        ),
        &actor,
    )
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "Waitlist summaries, oldest first", body = [dto::PatientSummary]),
        (status = 401, description = "Missing or invalid API key", body = dto::ErrorBody)
    )
)]
/// List every patient on the waitlist
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> Json<Vec<dto::PatientSummary>> {
    let patients = repositories::patients::list_patients(&state.cfg);
    Json(patients.into_iter().map(dto::PatientSummary::from).collect())
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    request_body = dto::UpdatePatientRequest,
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient updated and rescored", body = dto::PatientResponse),
        (status = 400, description = "Malformed id or rejected field", body = dto::ErrorBody),
        (status = 404, description = "No such patient", body = dto::ErrorBody)
    )
)]
/// Update a patient's clinical details
///
/// Every edit reruns the scoring engine, so the stored score always reflects the stored
/// clinical picture.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<dto::UpdatePatientRequest>,
) -> Result<Json<dto::PatientResponse>, (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let patient_id = parse_id(&id)?;

    let record =
        repositories::patients::get_patient(&state.cfg, &patient_id).map_err(error_response)?;
    let mut patient = record.data;
    req.apply_to(&mut patient).map_err(error_response)?;

    let weights = repositories::weights::active_weights(&state.cfg);
    scoring::apply_priority(&mut patient, &weights, Utc::now());

    let updated = repositories::patients::update_patient(&state.cfg, &patient_id, patient)
        .map_err(error_response)?;
    repositories::audit::record_action(
        &state.cfg,
        AuditAction::PatientUpdated,
        "patient",
        &patient_id.to_string(),
        "clinical details updated and priority rescored".to_string(),
        &actor,
    )
    .map_err(error_response)?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    post,
    path = "/functions/calculate-priority",
    request_body = dto::CalculatePriorityRequest,
    responses(
        (status = 200, description = "Score computed and persisted", body = dto::CalculatePriorityResponse),
        (status = 400, description = "Malformed patient id", body = dto::ErrorBody),
        (status = 404, description = "No such patient", body = dto::ErrorBody)
    )
)]
/// Run the priority scoring engine for one patient
#[axum::debug_handler]
async fn calculate_priority(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::CalculatePriorityRequest>,
) -> Result<Json<dto::CalculatePriorityResponse>, (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let patient_id = parse_id(&req.patient_id)?;

    let service = ScoringService::new(state.cfg.clone());
    let (_record, result) = service
        .score_patient(&patient_id, &actor)
        .map_err(error_response)?;

    Ok(Json(dto::CalculatePriorityResponse {
        success: true,
        patient_id: patient_id.to_string(),
        priority_score: result.score,
        breakdown: result.breakdown,
    }))
}

#[utoipa::path(
    post,
    path = "/functions/recalculate-priority",
    request_body = dto::CalculatePriorityRequest,
    responses(
        (status = 200, description = "Legacy score computed and persisted", body = dto::RecalculatePriorityResponse),
        (status = 400, description = "Malformed patient id", body = dto::ErrorBody),
        (status = 404, description = "No such patient", body = dto::ErrorBody)
    )
)]
/// Run the first-generation scoring formula for one patient
///
/// Kept for coordinators comparing against historical scores; the advanced breakdown is
/// cleared because it does not describe the legacy score.
#[axum::debug_handler]
async fn recalculate_priority(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::CalculatePriorityRequest>,
) -> Result<Json<dto::RecalculatePriorityResponse>, (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let patient_id = parse_id(&req.patient_id)?;

    let service = ScoringService::new(state.cfg.clone());
    let (_record, score) = service
        .score_patient_legacy(&patient_id, &actor)
        .map_err(error_response)?;

    Ok(Json(dto::RecalculatePriorityResponse {
        success: true,
        patient_id: patient_id.to_string(),
        priority_score: score,
    }))
}

#[utoipa::path(
    post,
    path = "/functions/donor-matching",
    request_body = dto::DonorMatchingRequest,
    responses(
        (status = 200, description = "Matching run completed", body = dto::DonorMatchingResponse),
        (status = 400, description = "Malformed donor organ id", body = dto::ErrorBody),
        (status = 404, description = "No such donor organ", body = dto::ErrorBody)
    )
)]
/// Run the donor matching engine for one donor organ
///
/// Ranks blood-compatible active candidates waiting for the offered organ, persists the
/// top of the list for review and notifies administrators.
#[axum::debug_handler]
async fn run_donor_matching(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::DonorMatchingRequest>,
) -> Result<Json<dto::DonorMatchingResponse>, (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let donor_organ_id = parse_id(&req.donor_organ_id)?;

    let service = MatchingService::new(state.cfg.clone());
    let outcome = service
        .match_donor(&donor_organ_id, &actor)
        .map_err(error_response)?;

    let matches_created = outcome.matches.len();
    Ok(Json(dto::DonorMatchingResponse {
        success: true,
        donor: outcome.donor.into(),
        matches: outcome
            .matches
            .into_iter()
            .map(dto::MatchResponse::from)
            .collect(),
        total_matches: outcome.total_compatible,
        matches_created,
    }))
}

#[utoipa::path(
    post,
    path = "/donors",
    request_body = dto::CreateDonorRequest,
    responses(
        (status = 201, description = "Donor organ registered", body = dto::DonorResponse),
        (status = 400, description = "Rejected registration payload", body = dto::ErrorBody)
    )
)]
/// Register a donor organ
#[axum::debug_handler]
async fn create_donor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::CreateDonorRequest>,
) -> Result<(StatusCode, Json<dto::DonorResponse>), (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let donor = req.into_donor().map_err(error_response)?;
    let record =
        repositories::donors::create_donor_organ(&state.cfg, donor).map_err(error_response)?;
    repositories::audit::record_action(
        &state.cfg,
        AuditAction::DonorRegistered,
        "donor_organ",
        &record.id.to_string(),
        format!(
            "donor organ {} ({}, {}) registered",
            record.data.donor_identifier, record.data.organ_type, record.data.blood_type
        ),
        &actor,
    )
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/donors/{id}/matches",
    params(("id" = String, Path, description = "Donor organ id")),
    responses(
        (status = 200, description = "Persisted matches, best rank first", body = [dto::MatchResponse]),
        (status = 404, description = "No such donor organ", body = dto::ErrorBody)
    )
)]
/// List the persisted matches for one donor organ
#[axum::debug_handler]
async fn list_donor_matches(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Vec<dto::MatchResponse>>, (StatusCode, Json<dto::ErrorBody>)> {
    let donor_organ_id = parse_id(&id)?;
    repositories::donors::get_donor_organ(&state.cfg, &donor_organ_id).map_err(error_response)?;

    let matches = repositories::matches::list_matches_for_donor(&state.cfg, &donor_organ_id);
    Ok(Json(
        matches.into_iter().map(dto::MatchResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/weights",
    request_body = dto::CreateWeightsRequest,
    responses(
        (status = 201, description = "Configuration stored and activated", body = dto::WeightsResponse),
        (status = 400, description = "Weights violate the sum or decay invariants", body = dto::ErrorBody)
    )
)]
/// Create a weight configuration and make it the active one
#[axum::debug_handler]
async fn create_weights(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::CreateWeightsRequest>,
) -> Result<(StatusCode, Json<dto::WeightsResponse>), (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let config = req.into_config().map_err(error_response)?;
    let record =
        repositories::weights::activate_config(&state.cfg, config).map_err(error_response)?;
    repositories::audit::record_action(
        &state.cfg,
        AuditAction::WeightsActivated,
        "priority_weights",
        &record.id.to_string(),
        format!("weights configuration '{}' activated", record.data.name),
        &actor,
    )
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/weights/active",
    responses(
        (status = 200, description = "The weights currently in effect", body = dto::WeightsResponse)
    )
)]
/// Show the active weight configuration
///
/// Falls back to the built-in defaults (reported as inactive, named `default`) when no
/// stored configuration is active.
#[axum::debug_handler]
async fn active_weights(State(state): State<AppState>) -> Json<dto::WeightsResponse> {
    let weights = repositories::weights::active_config(&state.cfg)
        .map(dto::WeightsResponse::from)
        .unwrap_or_else(dto::WeightsResponse::built_in_defaults);
    Json(weights)
}

/// Query parameters of `GET /notifications`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct NotificationQuery {
    /// Email address whose notifications to list.
    pub recipient: String,
    /// When true, only unread notifications are returned.
    #[serde(default)]
    pub unread_only: bool,
}

#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications for the recipient, newest first", body = [dto::NotificationResponse])
    )
)]
/// List notifications for one recipient
#[axum::debug_handler]
async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Json<Vec<dto::NotificationResponse>> {
    let notifications = repositories::notifications::list_for_recipient(
        &state.cfg,
        &query.recipient,
        query.unread_only,
    );
    Json(
        notifications
            .into_iter()
            .map(dto::NotificationResponse::from)
            .collect(),
    )
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = dto::NotificationResponse),
        (status = 404, description = "No such notification", body = dto::ErrorBody)
    )
)]
/// Mark a notification as read
#[axum::debug_handler]
async fn mark_notification_read(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<dto::NotificationResponse>, (StatusCode, Json<dto::ErrorBody>)> {
    let notification_id = parse_id(&id)?;
    let record = repositories::notifications::mark_read(&state.cfg, &notification_id)
        .map_err(error_response)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = dto::CreateUserRequest,
    responses(
        (status = 201, description = "Staff member registered", body = dto::UserResponse),
        (status = 400, description = "Blank fields or duplicate email", body = dto::ErrorBody)
    )
)]
/// Register a staff member
///
/// Administrators registered here form the notification pool for donor matching runs.
#[axum::debug_handler]
async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<dto::CreateUserRequest>,
) -> Result<(StatusCode, Json<dto::UserResponse>), (StatusCode, Json<dto::ErrorBody>)> {
    let actor = auth::caller_email(&headers);
    let user = req.into_user().map_err(error_response)?;
    let record = repositories::users::create_user(&state.cfg, user).map_err(error_response)?;
    repositories::audit::record_action(
        &state.cfg,
        AuditAction::UserRegistered,
        "user",
        &record.id.to_string(),
        format!(
            "{} registered as {}",
            record.data.email, record.data.role
        ),
        &actor,
    )
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(record.into())))
}
