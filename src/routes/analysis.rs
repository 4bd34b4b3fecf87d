//! # 분석(Analysis) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/analysis`         → 네 섹션으로 된 리포트
//! - `POST /api/v1/analysis/summary` → 요약 설명 (관리 포인트, 추천 식품 등)
//! - `GET  /api/v1/analysis/sample`  → 예시 요청 본문
//!
//! 이 파일에는 모든 핸들러가 공유하는 `AppState`도 정의되어 있습니다.
//!
//! ## 응답 규칙
//! 리포트는 네 섹션이 모두 채워졌을 때만 200으로 반환됩니다.
//! 그 외에는 항상 `{ "error": { "code", "message" } }`와 2xx가 아닌 상태 코드입니다.

use crate::{
    error::AppError,
    models::{AnalysisRequest, Report, SummaryExplanation},
    reference::{self, ReferenceError, ReferenceSource, ReferenceStore},
    services::{analyzer, assembler, summary},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// 현재 사용 중인 참조 데이터
///
/// 로딩에 실패한 상태도 값으로 보관합니다.
/// 요청이 올 때마다 같은 에러(503)를 돌려주고, 새로고침으로 회복할 수 있습니다.
#[derive(Debug, Clone)]
pub enum ReferenceSlot {
    Ready(Arc<ReferenceStore>),
    Unavailable(Arc<ReferenceError>),
}

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 모든 필드가 `Arc`이므로 clone해도 실제 데이터는 복제되지 않습니다.
#[derive(Clone)]
pub struct AppState {
    /// 참조 데이터 슬롯. 새로고침 시 쓰기 잠금을 잡고 통째로 교체합니다.
    reference: Arc<RwLock<ReferenceSlot>>,
    /// 참조 문서 저장소 (새로고침 때 다시 읽음)
    source: Arc<dyn ReferenceSource>,
    /// 참조 문서 로딩 제한 시간
    load_timeout: Duration,
}

impl AppState {
    /// 서버 시작 시 로딩 결과(성공 또는 실패)로 상태를 만듭니다.
    ///
    /// 로딩이 실패해도 서버는 뜹니다. 준비 상태 확인(`/health/ready`)이 503을 돌려주고,
    /// 분석 요청은 참조 데이터 에러로 응답합니다.
    pub fn new(
        initial: Result<ReferenceStore, ReferenceError>,
        source: Arc<dyn ReferenceSource>,
        load_timeout: Duration,
    ) -> Self {
        let slot = match initial {
            Ok(store) => ReferenceSlot::Ready(Arc::new(store)),
            Err(e) => ReferenceSlot::Unavailable(Arc::new(e)),
        };
        Self {
            reference: Arc::new(RwLock::new(slot)),
            source,
            load_timeout,
        }
    }

    pub fn source(&self) -> &dyn ReferenceSource {
        self.source.as_ref()
    }

    /// 현재 슬롯의 복사본 (Arc clone이라 가볍습니다)
    pub async fn slot(&self) -> ReferenceSlot {
        self.reference.read().await.clone()
    }

    /// 사용 가능한 참조 데이터
    ///
    /// 요청 처리 도중 새로고침이 일어나도, 이 요청은 여기서 받은 store를 끝까지 사용합니다.
    pub async fn reference(&self) -> Result<Arc<ReferenceStore>, AppError> {
        match &*self.reference.read().await {
            ReferenceSlot::Ready(store) => Ok(Arc::clone(store)),
            ReferenceSlot::Unavailable(e) => Err(AppError::from(e.as_ref())),
        }
    }

    /// 참조 문서를 다시 읽습니다.
    ///
    /// 성공하면 새 store로 교체합니다. 실패하면:
    /// - 이전에 사용 가능한 store가 있었다면 그대로 유지하고 에러만 반환
    /// - 없었다면 슬롯의 에러를 새 에러로 갱신
    pub async fn reload(&self) -> Result<Arc<ReferenceStore>, ReferenceError> {
        let loaded =
            reference::load_with_timeout(Arc::clone(&self.source), self.load_timeout).await;

        let mut slot = self.reference.write().await;
        match loaded {
            Ok(store) => {
                let store = Arc::new(store);
                *slot = ReferenceSlot::Ready(Arc::clone(&store));
                tracing::info!(source = %self.source.describe(), "Reference documents reloaded");
                Ok(store)
            }
            Err(e) => {
                tracing::warn!(source = %self.source.describe(), "Reference reload failed: {}", e);
                if let ReferenceSlot::Unavailable(_) = *slot {
                    *slot = ReferenceSlot::Unavailable(Arc::new(clone_error(&e)));
                }
                Err(e)
            }
        }
    }
}

/// 슬롯에 보관된 에러를 호출자에게 돌려줄 값으로 다시 만듭니다.
///
/// `io::Error`가 `Clone`이 아니므로 같은 종류의 에러를 새로 구성합니다.
fn clone_error(e: &ReferenceError) -> ReferenceError {
    match e {
        ReferenceError::Missing(names) => ReferenceError::Missing(names.clone()),
        ReferenceError::Malformed { document, reason } => ReferenceError::Malformed {
            document: *document,
            reason: reason.clone(),
        },
        ReferenceError::Io { document, source } => ReferenceError::Io {
            document: *document,
            source: std::io::Error::new(source.kind(), source.to_string()),
        },
        ReferenceError::Decode { document, reason } => ReferenceError::Decode {
            document: *document,
            reason: reason.clone(),
        },
        ReferenceError::Timeout(d) => ReferenceError::Timeout(*d),
        ReferenceError::Task(msg) => ReferenceError::Task(msg.clone()),
    }
}

/// JSON 파싱 실패를 400 에러로 바꿉니다.
///
/// `Json<T>` 대신 `Result<Json<T>, JsonRejection>`을 받으면
/// axum 기본 에러 본문(텍스트) 대신 우리 형식의 에러를 돌려줄 수 있습니다.
fn parse_body(
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<AnalysisRequest, AppError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// 요청 하나를 분석해 리포트를 만듭니다. 분석/요약 핸들러가 공유합니다.
fn build_report(
    store: &ReferenceStore,
    request: &AnalysisRequest,
) -> Result<(analyzer::Assessment, Report), AppError> {
    let assessment = analyzer::assess(store, request)?;
    let sections = analyzer::render_sections(store, &assessment);
    let report = assembler::assemble(sections)?;
    Ok((assessment, report))
}

/// `POST /analysis`: 리포트를 생성합니다.
///
/// # 반환값
/// `{ "first_paragraph", "heavy_metals_analysis", "minerals_analysis", "health_indicators_analysis" }`
/// (항상 이 순서, 이 네 개의 키만)
pub async fn analyze_report(
    State(state): State<AppState>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<Report>, AppError> {
    // UUIDv7: 시간 순으로 정렬되는 ID. 로그에서 한 요청의 흐름을 추적하는 데 씁니다.
    let report_id = uuid::Uuid::now_v7();
    let request = parse_body(body)?;
    let store = state.reference().await?;

    tracing::debug!(%report_id, age = request.personal_info.age, "Analysis requested");

    let (_, report) = build_report(&store, &request).map_err(|e| {
        tracing::info!(%report_id, code = e.code(), "Analysis rejected: {}", e);
        e
    })?;

    tracing::info!(%report_id, "Report generated");
    Ok(Json(report))
}

/// `POST /analysis/summary`: 요약 설명을 생성합니다.
///
/// 리포트 응답이 정확히 네 개의 키를 갖도록, 요약은 별도 엔드포인트로 제공합니다.
pub async fn summarize_report(
    State(state): State<AppState>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<SummaryExplanation>, AppError> {
    let report_id = uuid::Uuid::now_v7();
    let request = parse_body(body)?;
    let store = state.reference().await?;

    let (assessment, report) = build_report(&store, &request)?;
    let explanation = summary::summarize(&store, &assessment, &report);

    tracing::info!(%report_id, foods = explanation.recommended_foods.len(), "Summary generated");
    Ok(Json(explanation))
}

/// `GET /analysis/sample`: 예시 요청 본문을 반환합니다.
///
/// 참조 데이터가 없어도 동작합니다.
pub async fn sample_request() -> Json<AnalysisRequest> {
    Json(AnalysisRequest::sample())
}
