//! # 분석 서비스
//!
//! 분석 요청을 검증하고, 항목별 수준(정상/높음/낮음)을 판정한 뒤,
//! 참조 문서의 멘트를 골라 네 개의 분석 섹션을 만듭니다.
//!
//! ```text
//! AnalysisRequest
//!     │ assess()          ← 검사자 정보 검증 + 측정값 판정
//!     ▼
//! Assessment (Classification)
//!     │ render_sections() ← 섹션별 멘트 선택/치환
//!     ▼
//! Vec<AnalysisSection> ──► assembler::assemble() ──► Report
//! ```
//!
//! 이 모듈은 HTTP를 모릅니다. 핸들러(`routes::analysis`)가 에러를 `AppError`로 변환합니다.

use crate::models::{
    AgeBracket, AnalysisRequest, AnalysisSection, Analyte, AnalyteGroup, Level, PersonalInfo,
    Reading, SectionKind,
};
use crate::reference::tables::ConditionDocument;
use crate::reference::ReferenceStore;
use crate::services::text::{self, AGE_BRACKET, ITEMS, NAME};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// 허용하는 최대 나이
const MAX_AGE: u32 = 120;
/// 건강 상태 지표가 "일부" 불안정하다고 보는 최대 개수
const SOME_INDICATORS: usize = 3;

/// 분석 요청 검증 에러
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// 알 수 없는 항목, 음수/비정상 숫자, 허용되지 않는 수준 등
    #[error("invalid measurement '{analyte}': {reason}")]
    InvalidMeasurement { analyte: String, reason: String },

    /// 필수 항목이 빠짐
    #[error("missing measurements: {}", .0.join(", "))]
    MissingMeasurements(Vec<String>),

    /// 검사자 정보 오류 (빈 이름, 나이 범위)
    #[error("invalid personal info: {0}")]
    InvalidProfile(String),
}

/// 항목별 판정 결과
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    levels: BTreeMap<Analyte, Level>,
}

impl Classification {
    pub fn from_levels(levels: BTreeMap<Analyte, Level>) -> Self {
        Self { levels }
    }

    /// 판정되지 않은 항목은 정상으로 봅니다.
    pub fn level(&self, analyte: Analyte) -> Level {
        self.levels.get(&analyte).copied().unwrap_or(Level::Normal)
    }

    pub fn is(&self, analyte: Analyte, level: Level) -> bool {
        self.level(analyte) == level
    }

    /// 그룹 안에서 정상이 아닌 항목들 (선언 순서)
    pub fn abnormal(&self, group: AnalyteGroup) -> Vec<(Analyte, Level)> {
        self.levels
            .iter()
            .filter(|(analyte, level)| analyte.group() == group && **level != Level::Normal)
            .map(|(analyte, level)| (*analyte, *level))
            .collect()
    }

    pub fn all_normal(&self) -> bool {
        self.levels.values().all(|level| *level == Level::Normal)
    }
}

/// 검증을 마친 분석 입력
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub profile: PersonalInfo,
    pub bracket: AgeBracket,
    pub classification: Classification,
}

impl Assessment {
    /// 멘트 템플릿에 공통으로 들어가는 자리표시자 값
    fn bindings<'a>(&'a self, items: &'a str) -> [(&'static str, &'a str); 3] {
        [
            (NAME, self.profile.name.as_str()),
            (AGE_BRACKET, self.bracket.label()),
            (ITEMS, items),
        ]
    }
}

/// 요청을 검증하고 항목별 수준을 판정합니다.
pub fn assess(
    store: &ReferenceStore,
    request: &AnalysisRequest,
) -> Result<Assessment, AnalysisError> {
    let profile = validate_profile(&request.personal_info)?;
    let bracket = profile.bracket();

    let mut levels = BTreeMap::new();
    for (key, reading) in &request.measurements {
        let analyte: Analyte = key.parse().map_err(|reason| AnalysisError::InvalidMeasurement {
            analyte: key.clone(),
            reason,
        })?;
        levels.insert(analyte, classify_reading(store, analyte, *reading, bracket)?);
    }

    let missing: Vec<String> = store
        .required_analytes()
        .into_iter()
        .filter(|analyte| !levels.contains_key(analyte))
        .map(|analyte| analyte.key().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::MissingMeasurements(missing));
    }

    Ok(Assessment {
        profile,
        bracket,
        classification: Classification::from_levels(levels),
    })
}

fn validate_profile(info: &PersonalInfo) -> Result<PersonalInfo, AnalysisError> {
    let name = info.name.trim();
    if name.is_empty() {
        return Err(AnalysisError::InvalidProfile("name must not be blank".into()));
    }
    if info.age == 0 || info.age > MAX_AGE {
        return Err(AnalysisError::InvalidProfile(format!(
            "age must be between 1 and {}, got {}",
            MAX_AGE, info.age
        )));
    }

    let special_notes = match info.special_notes.trim() {
        "" => "없음".to_string(),
        notes => notes.to_string(),
    };

    Ok(PersonalInfo {
        name: name.to_string(),
        age: info.age,
        special_notes,
    })
}

/// 측정값 하나를 판정합니다.
///
/// - 숫자: 연령대에 맞는 기준 범위로 판정 (양 끝 포함)
/// - 수준: 그대로 사용
/// - 유해 중금속은 "낮음"이 없습니다. 숫자가 하한보다 낮으면 정상입니다.
fn classify_reading(
    store: &ReferenceStore,
    analyte: Analyte,
    reading: Reading,
    bracket: AgeBracket,
) -> Result<Level, AnalysisError> {
    let invalid = |reason: String| AnalysisError::InvalidMeasurement {
        analyte: analyte.key().to_string(),
        reason,
    };
    let is_metal = analyte.group() == AnalyteGroup::HeavyMetal;

    // 기준 범위가 없는 항목은 멘트도 없으므로, 수준으로 보내더라도 받지 않습니다.
    let (_, range) = store
        .range_for(analyte, bracket)
        .ok_or_else(|| invalid(format!("no reference range for {}", bracket.label())))?;

    match reading {
        Reading::Value(value) => {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{} is not a valid measurement", value)));
            }
            match range.classify(value) {
                Level::Low if is_metal => Ok(Level::Normal),
                level => Ok(level),
            }
        }
        Reading::Level(Level::Low) if is_metal => {
            Err(invalid("heavy metals can only be 정상 or 높음".into()))
        }
        Reading::Level(level) => Ok(level),
    }
}

/// 요청 → 네 개의 분석 섹션
pub fn analyze(
    store: &ReferenceStore,
    request: &AnalysisRequest,
) -> Result<Vec<AnalysisSection>, AnalysisError> {
    let assessment = assess(store, request)?;
    Ok(render_sections(store, &assessment))
}

/// 판정 결과로부터 섹션 텍스트를 만듭니다.
///
/// 반환 순서는 `SectionKind::ORDER`를 따르지만, 순서를 보장하는 곳은
/// `assembler::assemble()`입니다.
pub fn render_sections(store: &ReferenceStore, assessment: &Assessment) -> Vec<AnalysisSection> {
    vec![
        AnalysisSection::new(SectionKind::FirstParagraph, first_paragraph(store, assessment)),
        AnalysisSection::new(SectionKind::HeavyMetalsAnalysis, heavy_metals(store, assessment)),
        AnalysisSection::new(
            SectionKind::MineralsAnalysis,
            conditions(&store.minerals, assessment),
        ),
        AnalysisSection::new(
            SectionKind::HealthIndicatorsAnalysis,
            conditions(&store.health_indicators, assessment),
        ),
    ]
}

fn korean_names(analytes: impl IntoIterator<Item = Analyte>) -> Vec<&'static str> {
    analytes.into_iter().map(Analyte::korean_name).collect()
}

// ============================================================================
// 첫 번째 단락
// ============================================================================

fn first_paragraph(store: &ReferenceStore, assessment: &Assessment) -> String {
    let greeting = &store.greeting;
    let classification = &assessment.classification;

    if classification.all_normal() {
        return text::render(&greeting.all_normal, &assessment.bindings(""));
    }

    let metals = korean_names(
        classification
            .abnormal(AnalyteGroup::HeavyMetal)
            .into_iter()
            .map(|(analyte, _)| analyte),
    );
    let minerals = korean_names(
        classification
            .abnormal(AnalyteGroup::Mineral)
            .into_iter()
            .map(|(analyte, _)| analyte),
    );
    let indicators = korean_names(
        classification
            .abnormal(AnalyteGroup::HealthIndicator)
            .into_iter()
            .map(|(analyte, _)| analyte),
    );

    let mut sentences = vec![text::render(&greeting.intro, &assessment.bindings(""))];

    if metals.is_empty() && minerals.is_empty() {
        sentences.push(text::render(
            &greeting.metals_and_minerals_normal,
            &assessment.bindings(""),
        ));
    } else {
        let metal_items = text::join_items(&metals);
        sentences.push(if metals.is_empty() {
            text::render(&greeting.metals_normal, &assessment.bindings(""))
        } else {
            text::render(&greeting.metals_accumulated, &assessment.bindings(&metal_items))
        });

        let mineral_items = text::join_items(&minerals);
        sentences.push(if minerals.is_empty() {
            text::render(&greeting.minerals_normal, &assessment.bindings(""))
        } else {
            text::render(&greeting.minerals_imbalanced, &assessment.bindings(&mineral_items))
        });
    }

    let indicator_items = text::join_items(&indicators);
    let indicator_template = match indicators.len() {
        0 => &greeting.indicators_balanced,
        1..=SOME_INDICATORS => &greeting.indicators_some_unstable,
        _ => &greeting.indicators_many_unstable,
    };
    sentences.push(text::render(indicator_template, &assessment.bindings(&indicator_items)));

    sentences.join(" ")
}

// ============================================================================
// 유해 중금속
// ============================================================================

fn heavy_metals(store: &ReferenceStore, assessment: &Assessment) -> String {
    let doc = &store.heavy_metals;
    let classification = &assessment.classification;

    let high: Vec<Analyte> = classification
        .abnormal(AnalyteGroup::HeavyMetal)
        .into_iter()
        .filter(|(_, level)| *level == Level::High)
        .map(|(analyte, _)| analyte)
        .collect();

    if high.is_empty() {
        return doc
            .normal
            .resolve(assessment.bracket)
            .map(|(_, template)| text::render(template, &assessment.bindings("")))
            .unwrap_or_default();
    }

    let mut parts = Vec::new();
    for analyte in &high {
        if let Some((_, template)) = doc.high_text(*analyte, assessment.bracket) {
            parts.push(text::render(template, &assessment.bindings(analyte.korean_name())));
        }

        // 펌·염색 직후에는 바륨(및 칼슘·마그네슘)이 일시적으로 높게 나올 수 있습니다.
        // 안내는 바륨 멘트 바로 뒤에 붙습니다.
        if *analyte == Analyte::Barium && assessment.profile.has_perm_or_dye() {
            if let Some(notice) = &doc.perm_dye_notice {
                parts.push(perm_dye_notice(notice, assessment));
            }
        }
    }

    parts.join("\n\n")
}

fn perm_dye_notice(notice: &str, assessment: &Assessment) -> String {
    let mut affected = vec![Analyte::Barium];
    affected.extend(
        [Analyte::Calcium, Analyte::Magnesium]
            .into_iter()
            .filter(|a| assessment.classification.is(*a, Level::High)),
    );
    let items = text::join_with_and(&korean_names(affected));
    text::render(notice, &assessment.bindings(&items))
}

// ============================================================================
// 영양 미네랄 / 건강 상태 지표
// ============================================================================

/// 복합조건을 먼저 적용하고, 남은 비정상 항목의 개별 멘트를 붙입니다.
///
/// 복합조건이 적용되면 그 조건에 포함된 같은 그룹 항목은 개별 멘트에서 빠집니다.
/// 한 항목은 복합조건 하나에만 쓰입니다 (문서에 먼저 나온 규칙 우선).
fn conditions(doc: &ConditionDocument, assessment: &Assessment) -> String {
    let classification = &assessment.classification;
    let group = doc.group();
    let mut consumed: BTreeSet<Analyte> = BTreeSet::new();
    let mut parts = Vec::new();

    for combo in doc.combos() {
        let own: Vec<Analyte> = combo
            .conditions
            .iter()
            .filter(|c| c.analyte.group() == group)
            .map(|c| c.analyte)
            .collect();

        let matches = combo
            .conditions
            .iter()
            .all(|c| classification.is(c.analyte, c.level));
        if !matches || own.iter().any(|a| consumed.contains(a)) {
            continue;
        }

        // 이 연령대에 해당하는 복합 멘트가 없으면 개별 멘트로 처리합니다.
        if let Some((_, template)) = combo.texts.resolve(assessment.bracket) {
            let items = text::join_with_and(&korean_names(own.iter().copied()));
            parts.push(text::render(template, &assessment.bindings(&items)));
            consumed.extend(own);
        }
    }

    let abnormal = classification.abnormal(group);
    for (analyte, level) in &abnormal {
        if consumed.contains(analyte) {
            continue;
        }
        if let Some((_, template)) = doc.text(*analyte, *level, assessment.bracket) {
            parts.push(text::render(template, &assessment.bindings(analyte.korean_name())));
        }
    }

    if abnormal.is_empty() && parts.is_empty() {
        return doc
            .normal
            .resolve(assessment.bracket)
            .map(|(_, template)| text::render(template, &assessment.bindings("")))
            .unwrap_or_default();
    }

    parts.join("\n\n")
}
