use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::config::InspectionConfig;
use crate::workflows::inspection::inspection_router;
use crate::workflows::inspection::router::{self, ActorRequest};
use crate::workflows::inspection::service::InspectionService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn create_payload() -> Value {
    json!({
        "inspector_id": INSPECTOR,
        "submission": submission(),
    })
}

#[tokio::test]
async fn create_route_returns_created_report() {
    let (service, _) = build_service();
    let app = inspection_router(Arc::new(service));

    let response = app
        .oneshot(json_request("POST", "/api/v1/inspections", create_payload()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["overall_compliance_score"], 50);
    assert_eq!(payload["risk_assessment"], "high");
    assert!(payload["report_number"]
        .as_str()
        .is_some_and(|number| number.starts_with("INSP-")));
}

#[tokio::test]
async fn create_route_rejects_invalid_scores() {
    let (service, _) = build_service();
    let app = inspection_router(Arc::new(service));

    let mut payload = create_payload();
    payload["submission"]["findings"]["checklist_responses"]["1"]["score"] = json!(140);
    let response = app
        .oneshot(json_request("POST", "/api/v1/inspections", payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn submit_handler_maps_state_conflicts() {
    let (service, _) = build_service();
    let created = service
        .create_inspection(INSPECTOR, submission(), at(2024, 5, 10))
        .expect("created");
    let service = Arc::new(service);

    let response = router::submit_handler(
        State(service.clone()),
        Path(created.report_id.0),
        axum::Json(ActorRequest {
            actor_id: OTHER_INSPECTOR,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router::submit_handler(
        State(service.clone()),
        Path(created.report_id.0),
        axum::Json(ActorRequest {
            actor_id: INSPECTOR,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "submitted");
}

#[tokio::test]
async fn details_route_returns_not_found_for_unknown_reports() {
    let (service, _) = build_service();
    let app = inspection_router(Arc::new(service));

    let response = app
        .oneshot(get("/api/v1/inspections/41"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revise_route_returns_report_to_draft() {
    let (service, _) = build_service();
    let created = service
        .create_inspection(INSPECTOR, submission(), at(2024, 5, 10))
        .expect("created");
    let app = inspection_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/inspections/{}", created.report_id),
            json!({
                "actor_id": INSPECTOR,
                "findings": {
                    "checklist_responses": { "2": { "status": "compliant", "score": 100 } },
                    "violations": []
                }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "draft");
    assert_eq!(payload["overall_compliance_score"], 100);
}

#[tokio::test]
async fn violation_status_route_rectifies() {
    let (service, store) = build_service();
    service
        .create_inspection(INSPECTOR, submission(), at(2024, 5, 10))
        .expect("created");
    let violation_id = {
        use crate::workflows::inspection::repository::InspectionRepository;
        store.violations().expect("violations")[0].id
    };
    let app = inspection_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/violations/{violation_id}/status"),
            json!({
                "actor_id": INSPECTOR,
                "status": "rectified",
                "notes": "Fixed on site",
                "evidence_ref": "violation_evidence/evidence_1_1.jpg"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "rectified");
    assert_eq!(payload["evidence"], "violation_evidence/evidence_1_1.jpg");
    assert_eq!(payload["notes"][0]["text"], "Fixed on site");
}

#[tokio::test]
async fn listing_routes_apply_query_filters() {
    let (service, _) = build_service();
    service
        .create_inspection(INSPECTOR, submission(), at(2024, 5, 10))
        .expect("created");
    let app = inspection_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(get("/api/v1/inspections?status=draft,submitted&search=harbor"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));

    let response = app
        .clone()
        .oneshot(get("/api/v1/inspections?status=archived"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/v1/violations?severity=critical&as_of=2024-05-21"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["deadline_class"]["class"], "due_soon");
    assert_eq!(payload[0]["deadline_class"]["days"], 3);

    let response = app
        .clone()
        .oneshot(get("/api/v1/violations/statistics?as_of=2024-06-01"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], 1);
    assert_eq!(payload["past_deadline"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/v1/inspections/statistics?inspector_id=7"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["draft"], 1);
    assert_eq!(payload["high_risk"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/v1/establishments/due?status=upcoming&today=2025-05-05"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["establishment"]["name"], "Harbor Bakery");
    assert_eq!(payload[0]["days_until_due"], 5);

    let response = app
        .oneshot(get("/api/v1/checklist?category=exits"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn unavailable_store_maps_to_service_unavailable() {
    let service = InspectionService::new(
        Arc::new(UnavailableRepository),
        InspectionConfig::default(),
    );
    let app = inspection_router(Arc::new(service));

    let response = app
        .oneshot(json_request("POST", "/api/v1/inspections", create_payload()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = read_json_body(response).await;
    assert_eq!(payload["retryable"], true);
}
