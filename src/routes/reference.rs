//! # 참조 문서(Reference) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET  /api/v1/reference`        → 불러온 문서 목록 (이름, 버전, 수정 시각, 문자 수)
//! - `POST /api/v1/reference/reload` → 저장소에서 문서를 다시 읽어 교체
//!
//! 새로고침이 실패하면 이전 문서를 계속 사용하고, 실패 원인을 에러로 돌려줍니다.

use crate::error::AppError;
use crate::reference::ReferenceStore;
use crate::routes::analysis::AppState;
use crate::services::text::count_chars;
use axum::{extract::State, Json};
use serde_json::{json, Value};

fn describe_store(state: &AppState, store: &ReferenceStore) -> Value {
    let documents: Vec<Value> = store
        .documents()
        .iter()
        .map(|doc| {
            json!({
                "name": doc.name.file_name(),
                "version": doc.version,
                "last_modified": doc.last_modified,
                "characters": count_chars(&doc.content),
            })
        })
        .collect();

    json!({
        "source": state.source().describe(),
        "documents": documents,
    })
}

/// `GET /reference`: 현재 사용 중인 참조 문서 목록
pub async fn list_reference(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let store = state.reference().await?;
    Ok(Json(describe_store(&state, &store)))
}

/// `POST /reference/reload`: 참조 문서를 다시 읽습니다.
///
/// 성공하면 새 문서 목록을, 실패하면 참조 데이터 에러(503)를 반환합니다.
pub async fn reload_reference(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let store = state.reload().await?;
    Ok(Json(describe_store(&state, &store)))
}
