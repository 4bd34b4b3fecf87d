//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `measurement`: 분석 요청 (검사자 정보, 측정값, 검사 항목, 연령대)
//! - `report`: 분석 섹션, 리포트, 요약 설명
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Report`처럼 짧게 접근합니다.

pub mod measurement;
pub mod report;

pub use measurement::*;
pub use report::*;
