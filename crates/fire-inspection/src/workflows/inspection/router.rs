use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ActorId, EvidenceRef, FindingsInput, InspectionSubmission, ReportId, ReportStatus,
    ViolationId, ViolationSeverity, ViolationStatus,
};
use super::query::{EstablishmentFilter, ReportFilter, ViolationFilter};
use super::repository::{InspectionRepository, RepositoryError};
use super::scheduling::ScheduleStatus;
use super::service::{InspectionError, InspectionService};
use super::violations::ViolationStatusUpdate;

impl InspectionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InspectionError::Validation(_) | InspectionError::Evidence(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            InspectionError::Conflict(_)
            | InspectionError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            InspectionError::NotFound(_)
            | InspectionError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            InspectionError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for InspectionError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
        });
        (self.status_code(), Json(payload)).into_response()
    }
}

/// Router exposing the inspection lifecycle over HTTP.
pub fn inspection_router<R>(service: Arc<InspectionService<R>>) -> Router
where
    R: InspectionRepository + 'static,
{
    Router::new()
        .route("/api/v1/checklist", get(checklist_handler::<R>))
        .route(
            "/api/v1/inspections",
            post(create_handler::<R>).get(list_reports_handler::<R>),
        )
        .route(
            "/api/v1/inspections/statistics",
            get(report_statistics_handler::<R>),
        )
        .route(
            "/api/v1/inspections/:report_id",
            get(details_handler::<R>).put(revise_handler::<R>),
        )
        .route(
            "/api/v1/inspections/:report_id/submit",
            post(submit_handler::<R>),
        )
        .route(
            "/api/v1/establishments/due",
            get(establishments_due_handler::<R>),
        )
        .route("/api/v1/violations", get(list_violations_handler::<R>))
        .route(
            "/api/v1/violations/statistics",
            get(violation_statistics_handler::<R>),
        )
        .route(
            "/api/v1/violations/:violation_id/status",
            post(violation_status_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct CreateInspectionRequest {
    pub inspector_id: ActorId,
    pub submission: InspectionSubmission,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor_id: ActorId,
}

#[derive(Debug, Deserialize)]
pub struct ReviseReportRequest {
    pub actor_id: ActorId,
    #[serde(default)]
    pub findings: FindingsInput,
}

#[derive(Debug, Deserialize)]
pub struct ViolationStatusRequest {
    pub actor_id: ActorId,
    pub status: ViolationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub evidence_ref: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChecklistQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EstablishmentQuery {
    pub search: Option<String>,
    pub barangay: Option<String>,
    pub category: Option<String>,
    pub status: Option<ScheduleStatus>,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub inspector_id: Option<u64>,
    /// Comma-separated report statuses.
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViolationQuery {
    pub status: Option<ViolationStatus>,
    pub severity: Option<ViolationSeverity>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub inspector_id: Option<u64>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    pub inspector_id: Option<u64>,
    pub as_of: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, InspectionError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn checklist_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<ChecklistQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    respond(StatusCode::OK, service.checklist(query.category.as_deref()))
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Json(request): Json<CreateInspectionRequest>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_inspection(request.inspector_id, request.submission, Utc::now()),
    )
}

pub(crate) async fn list_reports_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let mut statuses = Vec::new();
    for raw in query.status.iter().flat_map(|value| value.split(',')) {
        if raw.trim().is_empty() {
            continue;
        }
        match ReportStatus::parse(raw) {
            Some(status) => statuses.push(status),
            None => {
                let payload = json!({ "error": format!("unknown report status '{}'", raw.trim()) });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        }
    }

    let filter = ReportFilter {
        inspector: query.inspector_id.map(ActorId),
        statuses,
        from: query.from,
        to: query.to,
        search: query.search,
    };
    respond(StatusCode::OK, service.reports(&filter))
}

pub(crate) async fn details_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(report_id): Path<u64>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    respond(StatusCode::OK, service.report_details(ReportId(report_id)))
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(report_id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.submit_report(ReportId(report_id), request.actor_id, Utc::now()),
    )
}

pub(crate) async fn revise_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(report_id): Path<u64>,
    Json(request): Json<ReviseReportRequest>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.revise_report(
            ReportId(report_id),
            request.actor_id,
            request.findings,
            Utc::now(),
        ),
    )
}

pub(crate) async fn establishments_due_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<EstablishmentQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let today = query.today.unwrap_or_else(today);
    let filter = EstablishmentFilter {
        search: query.search,
        barangay: query.barangay,
        category: query.category,
        status: query.status,
    };
    respond(StatusCode::OK, service.establishments_due(&filter, today))
}

pub(crate) async fn list_violations_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<ViolationQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let as_of = query.as_of.unwrap_or_else(today);
    let filter = ViolationFilter {
        status: query.status,
        severity: query.severity,
        from: query.from,
        to: query.to,
        search: query.search,
        inspector: query.inspector_id.map(ActorId),
    };
    respond(StatusCode::OK, service.violations(&filter, as_of))
}

pub(crate) async fn violation_statistics_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<StatisticsQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let as_of = query.as_of.unwrap_or_else(today);
    respond(
        StatusCode::OK,
        service.violation_statistics(query.inspector_id.map(ActorId), as_of),
    )
}

pub(crate) async fn report_statistics_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Query(query): Query<StatisticsQuery>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.report_statistics(query.inspector_id.map(ActorId)),
    )
}

pub(crate) async fn violation_status_handler<R>(
    State(service): State<Arc<InspectionService<R>>>,
    Path(violation_id): Path<u64>,
    Json(request): Json<ViolationStatusRequest>,
) -> Response
where
    R: InspectionRepository + 'static,
{
    let update = ViolationStatusUpdate {
        violation_id: ViolationId(violation_id),
        status: request.status,
        actor: request.actor_id,
        notes: request.notes,
        evidence: request
            .evidence_ref
            .filter(|reference| !reference.trim().is_empty())
            .map(EvidenceRef),
    };
    respond(
        StatusCode::OK,
        service.update_violation_status(update, Utc::now()),
    )
}
