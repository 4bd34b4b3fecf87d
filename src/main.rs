//! # 모발검사 종합멘트 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 설정 로딩
//! 4. 참조 문서 저장소 선택 및 최초 로딩
//! 5. 라우터와 미들웨어(CORS, 요청 시간 제한) 설정
//! 6. HTTP 서버 시작

use anyhow::Result; // anyhow::Result: 어떤 에러 타입이든 담을 수 있는 범용 Result 타입
use axum::http::HeaderValue;
use hair_report::{
    config::{Config, ReferenceSourceKind},
    create_router, reference,
    reference::{DirectorySource, EnvSource, ReferenceSource},
    routes::AppState,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .ok(): .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 이 크레이트와 tower_http, axum을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hair_report=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting hair-report server on {}:{}", config.host, config.port);

    // ── 4단계: 참조 문서 저장소 선택 및 최초 로딩 ──
    // Arc<dyn ReferenceSource>: 어떤 저장소든 같은 타입으로 다룹니다 (트레이트 객체).
    let source: Arc<dyn ReferenceSource> = match config.reference_source {
        ReferenceSourceKind::Local => Arc::new(DirectorySource::new(&config.notes_path)),
        ReferenceSourceKind::Env => Arc::new(EnvSource::from_env()),
    };
    tracing::info!("Loading reference documents from {}", source.describe());

    let initial =
        reference::load_with_timeout(Arc::clone(&source), config.reference_load_timeout).await;
    match &initial {
        Ok(store) => tracing::info!(
            "Loaded {} reference documents ({} analytes)",
            store.documents().len(),
            store.required_analytes().len()
        ),
        // 로딩에 실패해도 서버는 시작합니다. /api/v1/health/ready가 503을 반환하고,
        // POST /api/v1/reference/reload로 회복할 수 있습니다.
        Err(e) => tracing::error!("Reference documents unavailable: {}", e),
    }

    let state = AppState::new(initial, source, config.reference_load_timeout);

    // ── 5단계: CORS / 요청 시간 제한 미들웨어 ──
    let cors = if config.allows_any_origin() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
    .allow_methods(Any)
    .allow_headers(Any);

    let app = create_router(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors);

    // ── 6단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
