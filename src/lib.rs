//! # 모발검사 종합멘트 생성 서버
//!
//! 모발 미네랄 검사 결과(검사자 정보 + 항목별 측정값)를 받아,
//! 참조 문서의 멘트로 네 개의 분석 섹션을 만들고 하나의 리포트로 돌려줍니다.
//!
//! ## 모듈 구조
//! - `config`: 환경변수 설정
//! - `error`: `AppError`와 HTTP 에러 응답
//! - `models`: 요청/리포트 데이터 구조
//! - `reference`: 참조 문서 로딩/검증 (`ReferenceStore`)
//! - `services`: 분석, 리포트 조립, 요약 설명
//! - `routes`: HTTP 핸들러와 공유 상태
//! - `client`: 이 서버를 호출하는 HTTP 클라이언트
//!
//! 바이너리(`main.rs`)와 통합 테스트(`tests/`)가 모두 `create_router()`로 같은 라우터를 만듭니다.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod reference;
pub mod routes;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use routes::AppState;
use tower_http::trace::TraceLayer;

/// API 라우터를 만듭니다.
///
/// CORS와 요청 시간 제한은 설정에 따라 달라지므로 `main.rs`에서 덧붙입니다.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // 리포트 생성 API
        .route("/analysis", post(routes::analyze_report))
        .route("/analysis/summary", post(routes::summarize_report))
        .route("/analysis/sample", get(routes::sample_request))
        // 참조 문서 API
        .route("/reference", get(routes::list_reference))
        .route("/reference/reload", post(routes::reload_reference))
        // 헬스체크 API
        .route("/health", get(routes::health_check))
        .route("/health/ready", get(routes::readiness))
        .with_state(state);

    Router::new()
        // 로드밸런서용 루트 헬스체크
        .route("/health", get(routes::health_check))
        // .nest(): API 라우트를 /api/v1 경로 아래에 중첩시킵니다.
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
