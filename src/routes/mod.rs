//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `analysis`: 리포트/요약 생성, 예시 요청, 공유 상태(`AppState`)
//! - `health`: 서버 상태와 참조 데이터 준비 상태 확인
//! - `reference`: 참조 문서 목록 조회와 새로고침

pub mod analysis;
pub mod health;
pub mod reference;

// lib.rs에서 `routes::analyze_report`처럼 바로 접근 가능하게 합니다.
pub use analysis::*;
pub use health::*;
pub use reference::*;
