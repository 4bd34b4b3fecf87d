// HTTP 통합 테스트
//
// 라우터를 서버 없이 tower::ServiceExt::oneshot으로 직접 호출합니다.
// 참조 문서는 저장소의 data/notes를 그대로 쓰거나, tempfile 디렉토리에 복사해서 조작합니다.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hair_report::{
    create_router,
    models::{AnalysisRequest, Reading},
    reference::{self, DirectorySource, DocumentName, ReferenceSource},
    routes::AppState,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for oneshot

const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

fn bundled_notes() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/notes")
}

/// 참조 문서를 임시 디렉토리에 복사합니다. `skip`에 해당하는 문서는 빼고 복사합니다.
fn copy_notes(skip: Option<DocumentName>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in DocumentName::ALL {
        if Some(name) != skip {
            std::fs::copy(
                bundled_notes().join(name.file_name()),
                dir.path().join(name.file_name()),
            )
            .unwrap();
        }
    }
    dir
}

async fn app_for(dir: &Path) -> Router {
    let source: Arc<dyn ReferenceSource> = Arc::new(DirectorySource::new(dir));
    let initial = reference::load_with_timeout(Arc::clone(&source), LOAD_TIMEOUT).await;
    create_router(AppState::new(initial, source, LOAD_TIMEOUT))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

// =========================================================================
// 헬스체크
// =========================================================================

#[tokio::test]
async fn health_is_always_ok() {
    let dir = tempfile::tempdir().unwrap(); // 문서 없음
    let app = app_for(dir.path()).await;

    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "ok");
    }
}

#[tokio::test]
async fn ready_when_documents_load() {
    let app = app_for(&bundled_notes()).await;

    let (status, body) = send(&app, get("/api/v1/health/ready")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["documents"], 5);
}

// =========================================================================
// 리포트 생성
// =========================================================================

#[tokio::test]
async fn sample_request_produces_four_ordered_sections() {
    let app = app_for(&bundled_notes()).await;

    let sample = post_json("/api/v1/analysis", &AnalysisRequest::sample());
    let (status, body) = send(&app, sample).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // 키 순서는 응답 원문에서 확인합니다 (serde_json::Value는 순서를 보장하지 않음).
    let keys = [
        "\"first_paragraph\"",
        "\"heavy_metals_analysis\"",
        "\"minerals_analysis\"",
        "\"health_indicators_analysis\"",
    ];
    let positions: Vec<usize> = keys.iter().map(|k| body.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{body}");

    let report = json(&body);
    let object = report.as_object().unwrap();
    assert_eq!(object.len(), 4);
    for value in object.values() {
        assert!(!value.as_str().unwrap().trim().is_empty());
    }
    assert!(report["first_paragraph"].as_str().unwrap().starts_with("홍길동님의 모발검사결과,"));
    assert!(report["heavy_metals_analysis"].as_str().unwrap().contains("수은"));
}

#[tokio::test]
async fn sample_endpoint_round_trips_into_analysis() {
    let app = app_for(&bundled_notes()).await;

    let (status, body) = send(&app, get("/api/v1/analysis/sample")).await;
    assert_eq!(status, StatusCode::OK);
    let sample: AnalysisRequest = serde_json::from_str(&body).unwrap();

    let (status, _) = send(&app, post_json("/api/v1/analysis", &sample)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_analyte_is_rejected() {
    let app = app_for(&bundled_notes()).await;
    let mut request = AnalysisRequest::sample();
    request.measurements.remove("zinc");

    let (status, body) = send(&app, post_json("/api/v1/analysis", &request)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(&body);
    assert_eq!(body["error"]["code"], "invalid_measurement");
    assert!(body["error"]["message"].as_str().unwrap().contains("zinc"));
}

#[tokio::test]
async fn negative_value_and_bad_profile_are_rejected() {
    let app = app_for(&bundled_notes()).await;

    let mut negative = AnalysisRequest::sample();
    negative.measurements.insert("lead".into(), Reading::Value(-0.1));
    let (status, body) = send(&app, post_json("/api/v1/analysis", &negative)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&body)["error"]["code"], "invalid_measurement");

    let mut nameless = AnalysisRequest::sample();
    nameless.personal_info.name = " ".into();
    let (status, body) = send(&app, post_json("/api/v1/analysis", &nameless)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&body)["error"]["code"], "invalid_profile");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app_for(&bundled_notes()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/analysis")
        .header("content-type", "application/json")
        .body(Body::from("{\"personal_info\": "))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"]["code"], "bad_request");
}

#[tokio::test]
async fn summary_recommends_five_foods() {
    let app = app_for(&bundled_notes()).await;

    let request = post_json("/api/v1/analysis/summary", &AnalysisRequest::sample());
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = json(&body);
    assert_eq!(summary["recommended_foods"].as_array().unwrap().len(), 5);
    assert!(summary["title"].as_str().unwrap().contains("홍길동"));
    assert!(summary["recheck_period"].as_str().unwrap().contains("재검사"));
}

// =========================================================================
// 참조 데이터 없음 / 새로고침
// =========================================================================

#[tokio::test]
async fn missing_document_makes_service_unavailable_until_reload() {
    let dir = copy_notes(Some(DocumentName::Summary));
    let app = app_for(dir.path()).await;

    let (status, body) = send(&app, get("/api/v1/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body = json(&body);
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["error"]["code"], "missing_reference_data");
    assert!(body["error"]["message"].as_str().unwrap().contains("note5_summary.md"));

    let sample = post_json("/api/v1/analysis", &AnalysisRequest::sample());
    let (status, body) = send(&app, sample).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["error"]["code"], "missing_reference_data");

    // 문서를 채우고 새로고침하면 회복됩니다.
    std::fs::copy(
        bundled_notes().join("note5_summary.md"),
        dir.path().join("note5_summary.md"),
    )
    .unwrap();
    let (status, body) = send(&app, post_empty("/api/v1/reference/reload")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = send(&app, get("/api/v1/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, post_json("/api/v1/analysis", &AnalysisRequest::sample())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_document_is_reported() {
    let dir = copy_notes(None);
    std::fs::write(
        dir.path().join("note3_minerals.md"),
        "## 칼슘\n### 기준 범위\n- 연령 무관: 750 ~ 200\n",
    )
    .unwrap();
    let app = app_for(dir.path()).await;

    let sample = post_json("/api/v1/analysis", &AnalysisRequest::sample());
    let (status, body) = send(&app, sample).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body = json(&body);
    assert_eq!(body["error"]["code"], "malformed_reference_data");
    assert!(body["error"]["message"].as_str().unwrap().contains("note3_minerals.md"));
}

#[tokio::test]
async fn failed_reload_keeps_previous_documents() {
    let dir = copy_notes(None);
    let app = app_for(dir.path()).await;

    std::fs::remove_file(dir.path().join("note1_basic.md")).unwrap();
    let (status, body) = send(&app, post_empty("/api/v1/reference/reload")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["error"]["code"], "missing_reference_data");

    let (status, _) = send(&app, get("/api/v1/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, post_json("/api/v1/analysis", &AnalysisRequest::sample())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reference_listing_shows_versions() {
    let app = app_for(&bundled_notes()).await;

    let (status, body) = send(&app, get("/api/v1/reference")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let documents = body["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 5);
    assert_eq!(documents[0]["name"], "note1_basic.md");
    assert_eq!(documents[0]["version"].as_str().unwrap().len(), 64);
    assert!(documents[0]["characters"].as_u64().unwrap() > 0);
    assert!(body["source"].as_str().unwrap().starts_with("local:"));
}
