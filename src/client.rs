//! # 리포트 클라이언트
//!
//! 이 서버의 `POST /api/v1/analysis`를 호출하는 HTTP 클라이언트입니다.
//! 다른 서비스(상담 화면, 배치 작업 등)가 리포트를 받아갈 때 사용합니다.
//!
//! 서버가 응답하지 않거나, 에러를 돌려주거나, 네 섹션 중 하나라도 빠진 응답을 주면
//! 리포트 대신 `ClientError`를 반환합니다. 부분 리포트는 호출자에게 넘기지 않습니다.

use crate::models::{AnalysisRequest, Report};
use crate::services::assembler;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 연결 실패 또는 시간 초과
    #[error("report service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// 서버가 에러 응답을 돌려줌
    #[error("report service returned {status} ({code}): {message}")]
    Service {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// 200이지만 리포트가 온전하지 않음
    #[error("incomplete report: {0}")]
    IncompleteReport(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// 서버의 에러 응답 본문 `{ "error": { "code", "message" } }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Clone)]
pub struct ReportClient {
    http: Client,
    base_url: String,
}

impl ReportClient {
    /// `base_url` 예: "http://localhost:8000" (끝의 "/"는 무시)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// 서버가 요청을 받을 준비가 되었는지 (`GET /api/v1/health/ready`가 200인지)
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http
            .get(self.url("/health/ready"))
            .send()
            .await
            .map_err(map_send_error)?;
        Ok(response.status().is_success())
    }

    /// 리포트를 요청합니다.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Report, ClientError> {
        let response = self
            .http
            .post(self.url("/analysis"))
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_send_error)?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => ClientError::Service {
                    status,
                    code: error.code,
                    message: error.message,
                },
                // 프록시 등 우리 서버가 아닌 곳의 응답
                Err(_) => ClientError::Service {
                    status,
                    code: "unknown".to_string(),
                    message: body,
                },
            });
        }

        let report: Report = serde_json::from_str(&body)
            .map_err(|e| ClientError::IncompleteReport(e.to_string()))?;

        // 빈 섹션도 받아들이지 않도록 서버와 같은 조립 규칙으로 다시 확인합니다.
        assembler::assemble(report.into_sections())
            .map_err(|e| ClientError::IncompleteReport(e.to_string()))
    }
}

fn map_send_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() || e.is_connect() {
        ClientError::UpstreamUnavailable(e.to_string())
    } else {
        ClientError::Transport(e)
    }
}
