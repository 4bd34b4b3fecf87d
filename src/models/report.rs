//! # 리포트 모델
//!
//! 분석 결과로 만들어지는 네 개의 섹션과, 그 섹션들을 고정된 순서로 묶은 `Report`,
//! 그리고 요약 설명(`SummaryExplanation`)을 정의합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 분석 섹션의 종류
///
/// `ORDER`가 리포트의 고정 순서입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    FirstParagraph,
    HeavyMetalsAnalysis,
    MineralsAnalysis,
    HealthIndicatorsAnalysis,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 4] = [
        SectionKind::FirstParagraph,
        SectionKind::HeavyMetalsAnalysis,
        SectionKind::MineralsAnalysis,
        SectionKind::HealthIndicatorsAnalysis,
    ];

    /// 응답 JSON의 키
    pub fn key(self) -> &'static str {
        match self {
            SectionKind::FirstParagraph => "first_paragraph",
            SectionKind::HeavyMetalsAnalysis => "heavy_metals_analysis",
            SectionKind::MineralsAnalysis => "minerals_analysis",
            SectionKind::HealthIndicatorsAnalysis => "health_indicators_analysis",
        }
    }

    /// `ORDER` 안에서의 위치
    pub fn position(self) -> usize {
        match self {
            SectionKind::FirstParagraph => 0,
            SectionKind::HeavyMetalsAnalysis => 1,
            SectionKind::MineralsAnalysis => 2,
            SectionKind::HealthIndicatorsAnalysis => 3,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 이름이 붙은 분석 텍스트 한 덩어리
///
/// 한 번 만들어지면 바뀌지 않습니다 (필드가 비공개이고 setter가 없음).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSection {
    kind: SectionKind,
    body: String,
}

impl AnalysisSection {
    pub fn new(kind: SectionKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// 완성된 리포트
///
/// 서버에서는 `services::assembler::assemble()`로만 만들어집니다.
/// 필드 선언 순서가 JSON 직렬화 순서이므로, 응답 본문은 항상
/// `first_paragraph` → `heavy_metals_analysis` → `minerals_analysis` →
/// `health_indicators_analysis` 순서입니다.
///
/// `deny_unknown_fields`: 클라이언트가 응답을 읽을 때 네 개 외의 키를 거부합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Report {
    first_paragraph: String,
    heavy_metals_analysis: String,
    minerals_analysis: String,
    health_indicators_analysis: String,
}

impl Report {
    /// assembler 전용 생성자. 네 섹션이 모두 검증된 뒤에만 호출됩니다.
    pub(crate) fn from_parts(
        first_paragraph: String,
        heavy_metals_analysis: String,
        minerals_analysis: String,
        health_indicators_analysis: String,
    ) -> Self {
        Self {
            first_paragraph,
            heavy_metals_analysis,
            minerals_analysis,
            health_indicators_analysis,
        }
    }

    pub fn first_paragraph(&self) -> &str {
        &self.first_paragraph
    }

    pub fn heavy_metals_analysis(&self) -> &str {
        &self.heavy_metals_analysis
    }

    pub fn minerals_analysis(&self) -> &str {
        &self.minerals_analysis
    }

    pub fn health_indicators_analysis(&self) -> &str {
        &self.health_indicators_analysis
    }

    /// 고정 순서대로 섹션 본문을 이어 붙인 전체 텍스트
    pub fn full_text(&self) -> String {
        [
            self.first_paragraph.as_str(),
            self.heavy_metals_analysis.as_str(),
            self.minerals_analysis.as_str(),
            self.health_indicators_analysis.as_str(),
        ]
        .join("\n\n")
    }

    /// 리포트를 다시 섹션 목록으로 풀어냅니다 (고정 순서).
    pub fn into_sections(self) -> Vec<AnalysisSection> {
        vec![
            AnalysisSection::new(SectionKind::FirstParagraph, self.first_paragraph),
            AnalysisSection::new(SectionKind::HeavyMetalsAnalysis, self.heavy_metals_analysis),
            AnalysisSection::new(SectionKind::MineralsAnalysis, self.minerals_analysis),
            AnalysisSection::new(
                SectionKind::HealthIndicatorsAnalysis,
                self.health_indicators_analysis,
            ),
        ]
    }
}

/// 요약 설명: `POST /api/v1/analysis/summary`의 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryExplanation {
    /// 핵심 관리 포인트 (예: "홍길동님께서는 전체적으로 중금속 배출 관리가 요구됩니다.")
    pub title: String,
    /// 추천 식품 (정확히 5개)
    pub recommended_foods: Vec<String>,
    /// 추천 영양제 문장
    pub recommended_supplements: String,
    /// 재검사 권장 기간 문장
    pub recheck_period: String,
}
