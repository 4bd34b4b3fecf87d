//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /health`, `GET /api/v1/health` → `{ "status": "ok" }` (프로세스가 살아 있는지)
//! - `GET /api/v1/health/ready` → 참조 데이터가 준비되었는지
//!
//! 로드밸런서나 컨테이너 오케스트레이터는 `ready`를 보고 트래픽을 보낼지 결정합니다.

use crate::error::AppError;
use crate::routes::analysis::{AppState, ReferenceSlot};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// `GET /health`: 서버 상태를 확인합니다.
///
/// State 없이 고정된 JSON만 반환하므로 실패하지 않습니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// `GET /health/ready`: 참조 데이터 준비 상태를 확인합니다.
///
/// - 200 `{ "status": "ready", "source": "...", "documents": 5 }`
/// - 503 `{ "status": "not_ready", "error": { "code", "message" } }`
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.slot().await {
        ReferenceSlot::Ready(store) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "source": state.source().describe(),
                "documents": store.documents().len(),
            })),
        ),
        ReferenceSlot::Unavailable(e) => {
            let error = AppError::from(e.as_ref());
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "error": {
                        "code": error.code(),
                        "message": error.to_string(),
                    }
                })),
            )
        }
    }
}
