//! # 서비스 모듈
//!
//! HTTP와 무관한 리포트 생성 로직을 모아둔 모듈입니다.
//!
//! - `analyzer`: 요청 검증, 항목 판정, 섹션별 멘트 생성
//! - `assembler`: 네 섹션 → 고정 순서의 `Report`
//! - `summary`: 요약 설명 (관리 포인트, 추천 식품, 영양제, 재검사 기간)
//! - `text`: 자리표시자 치환, 조사 처리, 문자 수 계산

pub mod analyzer;
pub mod assembler;
pub mod summary;
pub mod text;
