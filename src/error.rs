//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 HTTP 응답으로 변환합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 계층별 에러(`ReferenceError`, `AnalysisError`, `AssemblyError`)는 각 모듈에 있고,
//! 이 모듈의 `From` 구현이 그것들을 하나의 `AppError`로 모읍니다.
//! 핸들러에서는 `?` 한 번으로 변환됩니다.
//!
//! 응답 본문 형식 (모든 에러 공통):
//! ```json
//! { "error": { "code": "invalid_measurement", "message": "..." } }
//! ```

use crate::reference::ReferenceError;
use crate::services::analyzer::AnalysisError;
use crate::services::assembler::AssemblyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 에러 variant는 적절한 HTTP 상태 코드와 코드 문자열로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 참조 문서가 없거나 읽을 수 없음 (HTTP 503)
    #[error("Reference data unavailable: {0}")]
    MissingReferenceData(String),

    /// 참조 문서 형식 오류 (HTTP 503)
    #[error("Reference data malformed: {0}")]
    MalformedReferenceData(String),

    /// 측정값 오류 (HTTP 422)
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// 검사자 정보 오류 (HTTP 422)
    #[error("Invalid personal info: {0}")]
    InvalidProfile(String),

    /// JSON 형식이 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 네 섹션을 모두 채우지 못함 (HTTP 500). 부분 리포트는 절대 반환하지 않습니다.
    #[error("Incomplete report: {0}")]
    IncompleteReport(String),

    /// 참조 문서 로딩 시간 초과 등 외부 의존성 문제 (HTTP 503)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 응답의 `error.code` 값
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingReferenceData(_) => "missing_reference_data",
            AppError::MalformedReferenceData(_) => "malformed_reference_data",
            AppError::InvalidMeasurement(_) => "invalid_measurement",
            AppError::InvalidProfile(_) => "invalid_profile",
            AppError::BadRequest(_) => "bad_request",
            AppError::IncompleteReport(_) => "incomplete_report",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingReferenceData(_)
            | AppError::MalformedReferenceData(_)
            | AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidMeasurement(_) | AppError::InvalidProfile(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::IncompleteReport(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::InvalidProfile(_) => AppError::InvalidProfile(e.to_string()),
            // 빠진 항목도 측정값 오류로 취급합니다.
            AnalysisError::InvalidMeasurement { .. } | AnalysisError::MissingMeasurements(_) => {
                AppError::InvalidMeasurement(e.to_string())
            }
        }
    }
}

impl From<AssemblyError> for AppError {
    fn from(e: AssemblyError) -> Self {
        AppError::IncompleteReport(e.to_string())
    }
}

/// 참조 데이터 슬롯에 보관된 에러를 요청마다 변환하기 위해 참조를 받습니다.
impl From<&ReferenceError> for AppError {
    fn from(e: &ReferenceError) -> Self {
        match e {
            ReferenceError::Malformed { .. } | ReferenceError::Decode { .. } => {
                AppError::MalformedReferenceData(e.to_string())
            }
            ReferenceError::Timeout(_) => AppError::UpstreamUnavailable(e.to_string()),
            ReferenceError::Missing(_) | ReferenceError::Io { .. } | ReferenceError::Task(_) => {
                AppError::MissingReferenceData(e.to_string())
            }
        }
    }
}

impl From<ReferenceError> for AppError {
    fn from(e: ReferenceError) -> Self {
        AppError::from(&e)
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Internal, IncompleteReport)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::IncompleteReport(ref msg) => {
                tracing::error!("Incomplete report: {}", msg);
                "The report could not be completed".to_string()
            }
            AppError::MissingReferenceData(ref msg)
            | AppError::MalformedReferenceData(ref msg)
            | AppError::UpstreamUnavailable(ref msg) => {
                tracing::warn!(code, "{}", msg);
                msg.clone()
            }
            AppError::InvalidMeasurement(ref msg)
            | AppError::InvalidProfile(ref msg)
            | AppError::BadRequest(ref msg) => msg.clone(),
        };

        // 결과: { "error": { "code": "invalid_measurement", "message": "..." } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionKind;
    use crate::reference::DocumentName;
    use std::time::Duration;

    #[test]
    fn maps_layer_errors_to_codes_and_statuses() {
        let cases: Vec<(AppError, &str, StatusCode)> = vec![
            (
                ReferenceError::Missing(vec![DocumentName::Summary]).into(),
                "missing_reference_data",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ReferenceError::Malformed {
                    document: DocumentName::Minerals,
                    reason: "x".into(),
                }
                .into(),
                "malformed_reference_data",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ReferenceError::Timeout(Duration::from_secs(1)).into(),
                "upstream_unavailable",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AnalysisError::MissingMeasurements(vec!["zinc".into()]).into(),
                "invalid_measurement",
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AnalysisError::InvalidProfile("age".into()).into(),
                "invalid_profile",
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AssemblyError::Empty(SectionKind::MineralsAnalysis).into(),
                "incomplete_report",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status(), status);
        }
    }

    #[test]
    fn missing_documents_are_named_in_the_message() {
        let error = AppError::from(ReferenceError::Missing(vec![DocumentName::Summary]));
        assert!(error.to_string().contains("note5_summary.md"));
    }
}
