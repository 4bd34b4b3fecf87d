//! # 참조 문서별 타입 테이블
//!
//! `outline::Outline`을 문서 종류에 맞는 구조체로 변환하고 검증합니다.
//! 검증은 서버가 요청을 받기 전(로딩 시점)에 모두 끝나므로,
//! 분석 단계에서 "멘트를 못 찾는" 상황을 미리 막습니다.
//!
//! | 문서 | 구조체 |
//! |---|---|
//! | note1_basic.md | `GreetingDocument` |
//! | note2_heavy_metals.md | `HeavyMetalDocument` |
//! | note3_minerals.md | `ConditionDocument` (영양 미네랄) |
//! | note4_health_indicators.md | `ConditionDocument` (건강 상태 지표) |
//! | note5_summary.md | `SummaryDocument` |

use super::outline::{Block, Outline, Section};
use super::{DocumentName, ReferenceError};
use crate::models::{AgeBracket, Analyte, AnalyteGroup, Level, ANY_AGE, BRACKET_LABELS};
use std::collections::{BTreeMap, BTreeSet};

/// 기준 범위 블록 제목
const RANGE_BLOCK: &str = "기준 범위";
/// 정상일 때 쓰는 섹션 제목
const NORMAL_SECTION: &str = "정상";
/// 복합조건 섹션 제목 접두사
const COMBO_PREFIX: &str = "복합:";
/// 목록 블록 제목 (note5)
const LIST_BLOCK: &str = "목록";
/// 추천 식품 개수
pub const FOOD_COUNT: usize = 5;

fn malformed(document: DocumentName, reason: impl Into<String>) -> ReferenceError {
    ReferenceError::Malformed {
        document,
        reason: reason.into(),
    }
}

// ============================================================================
// 공통 구성 요소
// ============================================================================

/// 기준 범위 (양 끝 포함)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    /// 측정값을 판정합니다. `low <= value <= high`이면 정상입니다.
    pub fn classify(&self, value: f64) -> Level {
        if value < self.low {
            Level::Low
        } else if value > self.high {
            Level::High
        } else {
            Level::Normal
        }
    }
}

/// 연령대 제목 → 값 매핑
///
/// 문서에 적힌 순서를 유지합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for BracketMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> BracketMap<T> {
    /// 연령대에 맞는 값을 찾습니다. 실제로 일치한 블록 제목도 함께 돌려줍니다.
    pub fn resolve(&self, bracket: AgeBracket) -> Option<(&str, &T)> {
        bracket.lookup_order().into_iter().find_map(|label| {
            self.entries
                .iter()
                .find(|(key, _)| key == label)
                .map(|(key, value)| (key.as_str(), value))
        })
    }

    /// 세 연령대 모두 값을 찾을 수 있는지 여부
    pub fn covers_all_ages(&self) -> bool {
        AgeBracket::ALL.iter().all(|b| self.resolve(*b).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, label: &str, value: T) -> Result<(), String> {
        if !BRACKET_LABELS.contains(&label) {
            return Err(format!("unknown age bracket '{}'", label));
        }
        if self.entries.iter().any(|(key, _)| key == label) {
            return Err(format!("age bracket '{}' appears twice", label));
        }
        self.entries.push((label.to_string(), value));
        Ok(())
    }
}

/// 항목별 기준 범위 표
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeTable {
    ranges: BTreeMap<Analyte, BracketMap<Range>>,
}

impl RangeTable {
    /// 표에 기준 범위가 있는 항목들 (선언 순서)
    pub fn analytes(&self) -> impl Iterator<Item = Analyte> + '_ {
        self.ranges.keys().copied()
    }

    pub fn range_for(&self, analyte: Analyte, bracket: AgeBracket) -> Option<(&str, &Range)> {
        self.ranges.get(&analyte)?.resolve(bracket)
    }
}

/// 블록 본문을 비어 있지 않은 텍스트로 가져옵니다.
fn block_text(
    document: DocumentName,
    context: &str,
    block: &Block,
) -> Result<String, ReferenceError> {
    let text = block.text();
    if text.trim().is_empty() {
        return Err(malformed(
            document,
            format!("{} / {}: block has no text", context, block.title),
        ));
    }
    Ok(text)
}

/// 섹션에서 필수 블록의 텍스트를 가져옵니다.
fn required_text(
    document: DocumentName,
    section: &Section,
    title: &str,
) -> Result<String, ReferenceError> {
    let block = section.block(title).ok_or_else(|| {
        malformed(
            document,
            format!("section '{}' is missing block '{}'", section.title, title),
        )
    })?;
    block_text(document, &section.title, block)
}

/// 모든 블록 제목이 연령대인 섹션을 `BracketMap<String>`으로 변환합니다.
fn bracket_texts(
    document: DocumentName,
    section: &Section,
) -> Result<BracketMap<String>, ReferenceError> {
    let mut texts = BracketMap::default();
    for block in &section.blocks {
        let text = block_text(document, &section.title, block)?;
        texts
            .insert(&block.title, text)
            .map_err(|reason| malformed(document, format!("{}: {}", section.title, reason)))?;
    }
    Ok(texts)
}

/// `### 기준 범위` 블록을 파싱합니다.
///
/// 형식: `- 20세 이상: 0.00 ~ 0.80`
fn parse_ranges(
    document: DocumentName,
    context: &str,
    block: &Block,
) -> Result<BracketMap<Range>, ReferenceError> {
    let mut ranges = BracketMap::default();

    for item in block.items() {
        let bad = |reason: &str| {
            malformed(
                document,
                format!("{} / {}: '{}' {}", context, RANGE_BLOCK, item, reason),
            )
        };

        let (label, bounds) = item.split_once(':').ok_or_else(|| bad("has no ':'"))?;
        let (low, high) = bounds.split_once('~').ok_or_else(|| bad("has no '~'"))?;
        let low: f64 = low.trim().parse().map_err(|_| bad("has a non-numeric lower bound"))?;
        let high: f64 = high.trim().parse().map_err(|_| bad("has a non-numeric upper bound"))?;

        if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
            return Err(bad("is not a valid range"));
        }

        ranges
            .insert(label.trim(), Range { low, high })
            .map_err(|reason| malformed(document, format!("{}: {}", context, reason)))?;
    }

    if !ranges.covers_all_ages() {
        return Err(malformed(
            document,
            format!("{}: reference ranges do not cover every age bracket", context),
        ));
    }
    Ok(ranges)
}

/// 섹션 제목을 해당 그룹의 검사 항목으로 해석합니다.
fn analyte_in_group(
    document: DocumentName,
    title: &str,
    group: AnalyteGroup,
) -> Result<Analyte, ReferenceError> {
    match Analyte::from_korean(title) {
        Some(analyte) if analyte.group() == group => Ok(analyte),
        Some(analyte) => Err(malformed(
            document,
            format!("section '{}' belongs to {}", title, analyte.group().korean_name()),
        )),
        None => Err(malformed(document, format!("unknown section '{}'", title))),
    }
}

/// 블록 제목 → 키 매핑을 가진 섹션을 읽습니다. 모든 키가 있어야 하고, 모르는 블록은 거부합니다.
fn keyed_texts<K: Copy + Ord>(
    document: DocumentName,
    section: &Section,
    keys: &[K],
    label: fn(K) -> &'static str,
) -> Result<BTreeMap<K, String>, ReferenceError> {
    let mut texts = BTreeMap::new();
    for block in &section.blocks {
        let key = keys
            .iter()
            .copied()
            .find(|k| label(*k) == block.title)
            .ok_or_else(|| {
                malformed(
                    document,
                    format!("section '{}' has unknown block '{}'", section.title, block.title),
                )
            })?;
        texts.insert(key, block_text(document, &section.title, block)?);
    }
    for key in keys {
        if !texts.contains_key(key) {
            return Err(malformed(
                document,
                format!("section '{}' is missing block '{}'", section.title, label(*key)),
            ));
        }
    }
    Ok(texts)
}

fn required_section<'a>(
    document: DocumentName,
    outline: &'a Outline,
    title: &str,
) -> Result<&'a Section, ReferenceError> {
    outline
        .section(title)
        .ok_or_else(|| malformed(document, format!("missing section '{}'", title)))
}

fn reject_duplicate_sections(
    document: DocumentName,
    outline: &Outline,
) -> Result<(), ReferenceError> {
    let mut seen = BTreeSet::new();
    for section in &outline.sections {
        if !seen.insert(section.title.as_str()) {
            return Err(malformed(document, format!("section '{}' appears twice", section.title)));
        }
    }
    Ok(())
}

// ============================================================================
// note1: 첫 번째 단락
// ============================================================================

/// 첫 번째 단락 문장 템플릿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingDocument {
    /// 모든 항목이 정상일 때의 완성 문장
    pub all_normal: String,
    /// "[이름]님의 모발검사결과,"
    pub intro: String,
    pub metals_accumulated: String,
    pub metals_normal: String,
    pub minerals_imbalanced: String,
    pub minerals_normal: String,
    pub metals_and_minerals_normal: String,
    pub indicators_balanced: String,
    pub indicators_some_unstable: String,
    pub indicators_many_unstable: String,
}

impl GreetingDocument {
    pub fn from_outline(outline: &Outline) -> Result<Self, ReferenceError> {
        let doc = DocumentName::Basic;
        reject_duplicate_sections(doc, outline)?;

        let all_normal = required_text(doc, required_section(doc, outline, "완전 정상")?, "최종 멘트")?;
        let phrases = required_section(doc, outline, "문장 구성")?;

        Ok(Self {
            all_normal,
            intro: required_text(doc, phrases, "도입")?,
            metals_accumulated: required_text(doc, phrases, "중금속 축적")?,
            metals_normal: required_text(doc, phrases, "중금속 정상")?,
            minerals_imbalanced: required_text(doc, phrases, "미네랄 불균형")?,
            minerals_normal: required_text(doc, phrases, "미네랄 정상")?,
            metals_and_minerals_normal: required_text(doc, phrases, "중금속 미네랄 정상")?,
            indicators_balanced: required_text(doc, phrases, "지표 균형")?,
            indicators_some_unstable: required_text(doc, phrases, "지표 일부 불안정")?,
            indicators_many_unstable: required_text(doc, phrases, "지표 다수 불안정")?,
        })
    }
}

// ============================================================================
// note2: 유해 중금속
// ============================================================================

const PERM_DYE_SECTION: &str = "펌·염색 안내";

#[derive(Debug, Clone, PartialEq)]
pub struct HeavyMetalDocument {
    /// 높은 중금속이 없을 때의 멘트
    pub normal: BracketMap<String>,
    pub ranges: RangeTable,
    /// 중금속별 "높음" 멘트
    high_texts: BTreeMap<Analyte, BracketMap<String>>,
    /// 펌·염색으로 인한 일시적 상승 안내 (선택)
    pub perm_dye_notice: Option<String>,
}

impl HeavyMetalDocument {
    pub fn from_outline(outline: &Outline) -> Result<Self, ReferenceError> {
        let doc = DocumentName::HeavyMetals;
        reject_duplicate_sections(doc, outline)?;

        let mut normal = None;
        let mut perm_dye_notice = None;
        let mut ranges = RangeTable::default();
        let mut high_texts = BTreeMap::new();

        for section in &outline.sections {
            match section.title.as_str() {
                NORMAL_SECTION => normal = Some(bracket_texts(doc, section)?),
                PERM_DYE_SECTION => perm_dye_notice = Some(required_text(doc, section, "안내")?),
                title => {
                    let analyte = analyte_in_group(doc, title, AnalyteGroup::HeavyMetal)?;
                    let range_block = section.block(RANGE_BLOCK).ok_or_else(|| {
                        malformed(
                            doc,
                            format!("section '{}' is missing block '{}'", title, RANGE_BLOCK),
                        )
                    })?;
                    ranges.ranges.insert(analyte, parse_ranges(doc, title, range_block)?);

                    let mut texts = BracketMap::default();
                    for block in section.blocks.iter().filter(|b| b.title != RANGE_BLOCK) {
                        texts
                            .insert(&block.title, block_text(doc, title, block)?)
                            .map_err(|reason| malformed(doc, format!("{}: {}", title, reason)))?;
                    }
                    if !texts.covers_all_ages() {
                        return Err(malformed(
                            doc,
                            format!("{}: high-level texts do not cover every age bracket", title),
                        ));
                    }
                    high_texts.insert(analyte, texts);
                }
            }
        }

        let normal = normal
            .ok_or_else(|| malformed(doc, format!("missing section '{}'", NORMAL_SECTION)))?;
        if !normal.covers_all_ages() {
            return Err(malformed(doc, "normal texts do not cover every age bracket"));
        }
        if high_texts.is_empty() {
            return Err(malformed(doc, "no heavy metal sections"));
        }

        Ok(Self {
            normal,
            ranges,
            high_texts,
            perm_dye_notice,
        })
    }

    pub fn high_text(&self, analyte: Analyte, bracket: AgeBracket) -> Option<(&str, &String)> {
        self.high_texts.get(&analyte)?.resolve(bracket)
    }
}

// ============================================================================
// note3 / note4: 조건별 멘트 (영양 미네랄, 건강 상태 지표)
// ============================================================================

/// 복합조건의 한 항목 (예: "칼슘 높음")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub analyte: Analyte,
    pub level: Level,
}

/// 복합조건 규칙
///
/// 모든 조건이 맞으면 개별 멘트 대신 이 규칙의 멘트를 쓰고,
/// 같은 그룹의 항목들은 개별 멘트에서 제외됩니다.
/// 조건에는 다른 그룹 항목(예: 건강 지표 규칙 안의 "수은 높음")도 올 수 있습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboRule {
    pub conditions: Vec<Condition>,
    pub texts: BracketMap<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDocument {
    group: AnalyteGroup,
    pub normal: BracketMap<String>,
    pub ranges: RangeTable,
    texts: BTreeMap<(Analyte, Level), BracketMap<String>>,
    combos: Vec<ComboRule>,
}

impl ConditionDocument {
    pub fn from_outline(
        document: DocumentName,
        group: AnalyteGroup,
        outline: &Outline,
    ) -> Result<Self, ReferenceError> {
        reject_duplicate_sections(document, outline)?;

        let mut normal = None;
        let mut ranges = RangeTable::default();
        let mut texts: BTreeMap<(Analyte, Level), BracketMap<String>> = BTreeMap::new();
        let mut combos = Vec::new();

        for section in &outline.sections {
            let title = section.title.as_str();

            if title == NORMAL_SECTION {
                normal = Some(bracket_texts(document, section)?);
                continue;
            }
            if let Some(rule) = title.strip_prefix(COMBO_PREFIX) {
                combos.push(parse_combo(document, group, section, rule)?);
                continue;
            }

            let analyte = analyte_in_group(document, title, group)?;
            let range_block = section.block(RANGE_BLOCK).ok_or_else(|| {
                malformed(
                    document,
                    format!("section '{}' is missing block '{}'", title, RANGE_BLOCK),
                )
            })?;
            ranges.ranges.insert(analyte, parse_ranges(document, title, range_block)?);

            for block in section.blocks.iter().filter(|b| b.title != RANGE_BLOCK) {
                let (level, label) = parse_level_title(&block.title).ok_or_else(|| {
                    malformed(document, format!("{}: unknown block '{}'", title, block.title))
                })?;
                texts
                    .entry((analyte, level))
                    .or_default()
                    .insert(label, block_text(document, title, block)?)
                    .map_err(|reason| malformed(document, format!("{}: {}", title, reason)))?;
            }

            for level in [Level::High, Level::Low] {
                let covered = texts
                    .get(&(analyte, level))
                    .map(BracketMap::covers_all_ages)
                    .unwrap_or(false);
                if !covered {
                    return Err(malformed(
                        document,
                        format!(
                            "{}: '{}' texts do not cover every age bracket",
                            title,
                            level.label()
                        ),
                    ));
                }
            }
        }

        let normal = normal.ok_or_else(|| {
            malformed(document, format!("missing section '{}'", NORMAL_SECTION))
        })?;
        if !normal.covers_all_ages() {
            return Err(malformed(document, "normal texts do not cover every age bracket"));
        }
        if ranges.ranges.is_empty() {
            return Err(malformed(document, "no analyte sections"));
        }

        Ok(Self {
            group,
            normal,
            ranges,
            texts,
            combos,
        })
    }

    pub fn group(&self) -> AnalyteGroup {
        self.group
    }

    pub fn combos(&self) -> &[ComboRule] {
        &self.combos
    }

    pub fn text(
        &self,
        analyte: Analyte,
        level: Level,
        bracket: AgeBracket,
    ) -> Option<(&str, &String)> {
        self.texts.get(&(analyte, level))?.resolve(bracket)
    }
}

/// 블록 제목 `"높음 (20세 이상)"` 또는 `"낮음"`을 (수준, 연령대)로 해석합니다.
fn parse_level_title(title: &str) -> Option<(Level, &str)> {
    let (level, bracket) = match title.split_once(" (") {
        Some((level, rest)) => (level, rest.strip_suffix(')')?),
        None => (title, ANY_AGE),
    };
    match Level::from_label(level.trim())? {
        Level::Normal => None,
        level => Some((level, bracket.trim())),
    }
}

/// `## 복합: 칼슘 높음 + 마그네슘 높음` 섹션을 파싱합니다.
fn parse_combo(
    document: DocumentName,
    group: AnalyteGroup,
    section: &Section,
    rule: &str,
) -> Result<ComboRule, ReferenceError> {
    let mut conditions = Vec::new();

    for part in rule.split('+').map(str::trim) {
        let bad = || {
            malformed(
                document,
                format!("{}: cannot read condition '{}'", section.title, part),
            )
        };
        let (name, level) = part.rsplit_once(' ').ok_or_else(bad)?;
        let analyte = Analyte::from_korean(name.trim()).ok_or_else(bad)?;
        let level = Level::from_label(level.trim()).ok_or_else(bad)?;
        conditions.push(Condition { analyte, level });
    }

    if !conditions.iter().any(|c| c.analyte.group() == group) {
        return Err(malformed(
            document,
            format!("{}: no condition on {}", section.title, group.korean_name()),
        ));
    }

    let texts = bracket_texts(document, section)?;
    if texts.is_empty() {
        return Err(malformed(document, format!("{}: no texts", section.title)));
    }

    Ok(ComboRule { conditions, texts })
}

// ============================================================================
// note5: 요약 설명
// ============================================================================

/// 핵심 관리 포인트
///
/// 우선순위는 `services::summary::management_focus()`가 정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagementFocus {
    HeavyMetalFatigue,
    HeavyMetalAntioxidant,
    HeavyMetal,
    AdrenalFatigue,
    Stress,
    BloodSugar,
    Immunity,
    Balance,
}

impl ManagementFocus {
    pub const ALL: [ManagementFocus; 8] = [
        ManagementFocus::HeavyMetalFatigue,
        ManagementFocus::HeavyMetalAntioxidant,
        ManagementFocus::HeavyMetal,
        ManagementFocus::AdrenalFatigue,
        ManagementFocus::Stress,
        ManagementFocus::BloodSugar,
        ManagementFocus::Immunity,
        ManagementFocus::Balance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ManagementFocus::HeavyMetalFatigue => "중금속 피로도",
            ManagementFocus::HeavyMetalAntioxidant => "중금속 항산화",
            ManagementFocus::HeavyMetal => "중금속",
            ManagementFocus::AdrenalFatigue => "부신 피로",
            ManagementFocus::Stress => "스트레스",
            ManagementFocus::BloodSugar => "혈당",
            ManagementFocus::Immunity => "면역",
            ManagementFocus::Balance => "영양 균형",
        }
    }
}

/// 보충 식품 목록의 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FoodBasis {
    HeavyMetal,
    Adrenal,
    Stress,
    BloodSugar,
    Default,
}

impl FoodBasis {
    pub const ALL: [FoodBasis; 5] = [
        FoodBasis::HeavyMetal,
        FoodBasis::Adrenal,
        FoodBasis::Stress,
        FoodBasis::BloodSugar,
        FoodBasis::Default,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FoodBasis::HeavyMetal => "중금속",
            FoodBasis::Adrenal => "부신 피로",
            FoodBasis::Stress => "스트레스",
            FoodBasis::BloodSugar => "혈당",
            FoodBasis::Default => "기본",
        }
    }
}

impl From<ManagementFocus> for FoodBasis {
    fn from(focus: ManagementFocus) -> Self {
        match focus {
            ManagementFocus::HeavyMetalFatigue
            | ManagementFocus::HeavyMetalAntioxidant
            | ManagementFocus::HeavyMetal => FoodBasis::HeavyMetal,
            ManagementFocus::AdrenalFatigue => FoodBasis::Adrenal,
            ManagementFocus::Stress => FoodBasis::Stress,
            ManagementFocus::BloodSugar => FoodBasis::BloodSugar,
            ManagementFocus::Immunity | ManagementFocus::Balance => FoodBasis::Default,
        }
    }
}

/// 재검사 권장 기간을 고르는 경우
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecheckCase {
    MetalsOnly,
    MetalsAndMinerals,
    MineralsStress,
    MineralsAdrenal,
    Minerals,
    NormalAdrenal,
    NormalBloodSugar,
    Normal,
}

impl RecheckCase {
    pub const ALL: [RecheckCase; 8] = [
        RecheckCase::MetalsOnly,
        RecheckCase::MetalsAndMinerals,
        RecheckCase::MineralsStress,
        RecheckCase::MineralsAdrenal,
        RecheckCase::Minerals,
        RecheckCase::NormalAdrenal,
        RecheckCase::NormalBloodSugar,
        RecheckCase::Normal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RecheckCase::MetalsOnly => "중금속",
            RecheckCase::MetalsAndMinerals => "중금속 미네랄",
            RecheckCase::MineralsStress => "미네랄 스트레스",
            RecheckCase::MineralsAdrenal => "미네랄 부신",
            RecheckCase::Minerals => "미네랄",
            RecheckCase::NormalAdrenal => "정상 부신",
            RecheckCase::NormalBloodSugar => "정상 혈당",
            RecheckCase::Normal => "정상",
        }
    }
}

/// 영양제 분류 (`영양제 키워드` 목록의 이름)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Supplement {
    Antioxidant,
    VitaminB,
    VitaminD,
    CalMagD,
    Multivitamin,
}

impl Supplement {
    pub const ALL: [Supplement; 5] = [
        Supplement::Antioxidant,
        Supplement::VitaminB,
        Supplement::VitaminD,
        Supplement::CalMagD,
        Supplement::Multivitamin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Supplement::Antioxidant => "항산화 영양제",
            Supplement::VitaminB => "비타민B",
            Supplement::VitaminD => "비타민D",
            Supplement::CalMagD => "칼마디",
            Supplement::Multivitamin => "종합 영양제",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

/// 리포트에 언급된 영양제와 관리 포인트의 조합 (`언급 영양제` 섹션의 블록)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupplementRule {
    MetalsVitaminB,
    MetalsCalMagD,
    MetalsAntioxidant,
    AdrenalVitaminB,
    StressVitaminD,
    BloodSugarVitaminB,
    /// 맞는 조합이 없으면 처음 언급된 영양제 (`[항목]`)
    FirstMentioned,
}

impl SupplementRule {
    pub const ALL: [SupplementRule; 7] = [
        SupplementRule::MetalsVitaminB,
        SupplementRule::MetalsCalMagD,
        SupplementRule::MetalsAntioxidant,
        SupplementRule::AdrenalVitaminB,
        SupplementRule::StressVitaminD,
        SupplementRule::BloodSugarVitaminB,
        SupplementRule::FirstMentioned,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SupplementRule::MetalsVitaminB => "중금속 비타민B",
            SupplementRule::MetalsCalMagD => "중금속 칼마디",
            SupplementRule::MetalsAntioxidant => "중금속 항산화",
            SupplementRule::AdrenalVitaminB => "부신 비타민B",
            SupplementRule::StressVitaminD => "스트레스 비타민D",
            SupplementRule::BloodSugarVitaminB => "혈당 비타민B",
            SupplementRule::FirstMentioned => "기타",
        }
    }
}

/// 식품 이름과, 리포트 본문에서 그 식품을 가리키는 키워드들
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodKeywords {
    pub food: String,
    pub keywords: Vec<String>,
}

/// 영양제 분류와, 리포트 본문에서 그 영양제를 가리키는 키워드들
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementKeywords {
    pub supplement: Supplement,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDocument {
    titles: BTreeMap<ManagementFocus, String>,
    supplements: BTreeMap<ManagementFocus, String>,
    supplement_rules: BTreeMap<SupplementRule, String>,
    /// 목록 순서가 "처음 언급된 영양제"의 순서입니다.
    pub supplement_keywords: Vec<SupplementKeywords>,
    rechecks: BTreeMap<RecheckCase, String>,
    pub food_keywords: Vec<FoodKeywords>,
    pub priority_foods: Vec<String>,
    supplementary_foods: BTreeMap<FoodBasis, Vec<String>>,
}

impl SummaryDocument {
    pub fn from_outline(outline: &Outline) -> Result<Self, ReferenceError> {
        let doc = DocumentName::Summary;
        reject_duplicate_sections(doc, outline)?;

        let titles = keyed_texts(
            doc,
            required_section(doc, outline, "관리 포인트")?,
            &ManagementFocus::ALL,
            ManagementFocus::label,
        )?;
        let supplements = keyed_texts(
            doc,
            required_section(doc, outline, "추천 영양제")?,
            &ManagementFocus::ALL,
            ManagementFocus::label,
        )?;
        let supplement_rules = keyed_texts(
            doc,
            required_section(doc, outline, "언급 영양제")?,
            &SupplementRule::ALL,
            SupplementRule::label,
        )?;
        let rechecks = keyed_texts(
            doc,
            required_section(doc, outline, "재검사")?,
            &RecheckCase::ALL,
            RecheckCase::label,
        )?;

        let food_keywords = keyword_items(doc, required_section(doc, outline, "식품 키워드")?)?
            .into_iter()
            .map(|(food, keywords)| FoodKeywords { food, keywords })
            .collect();

        let mut supplement_keywords = Vec::new();
        for (name, keywords) in keyword_items(doc, required_section(doc, outline, "영양제 키워드")?)? {
            let supplement = Supplement::from_label(&name)
                .ok_or_else(|| malformed(doc, format!("영양제 키워드: unknown supplement '{}'", name)))?;
            supplement_keywords.push(SupplementKeywords { supplement, keywords });
        }

        let mut priority_foods: Vec<String> = Vec::new();
        for food in list_block(doc, required_section(doc, outline, "우선 식품")?)?.items() {
            if !priority_foods.iter().any(|f| f == food) {
                priority_foods.push(food.to_string());
            }
        }
        if priority_foods.len() < FOOD_COUNT {
            return Err(malformed(
                doc,
                format!("우선 식품 must list at least {} distinct foods", FOOD_COUNT),
            ));
        }

        let extra = required_section(doc, outline, "보충 식품")?;
        let lists = keyed_texts(doc, extra, &FoodBasis::ALL, FoodBasis::label)?;
        let supplementary_foods = lists
            .keys()
            .map(|basis| {
                let foods = extra
                    .block(basis.label())
                    .map(|block| block.items().map(str::to_string).collect())
                    .unwrap_or_default();
                (*basis, foods)
            })
            .collect();

        Ok(Self {
            titles,
            supplements,
            supplement_rules,
            supplement_keywords,
            rechecks,
            food_keywords,
            priority_foods,
            supplementary_foods,
        })
    }

    // 아래 조회들은 from_outline()에서 모든 키가 검증되었으므로 항상 값이 있습니다.

    pub fn title(&self, focus: ManagementFocus) -> &str {
        self.titles.get(&focus).map(String::as_str).unwrap_or_default()
    }

    pub fn supplement(&self, focus: ManagementFocus) -> &str {
        self.supplements.get(&focus).map(String::as_str).unwrap_or_default()
    }

    pub fn supplement_rule(&self, rule: SupplementRule) -> &str {
        self.supplement_rules.get(&rule).map(String::as_str).unwrap_or_default()
    }

    pub fn recheck(&self, case: RecheckCase) -> &str {
        self.rechecks.get(&case).map(String::as_str).unwrap_or_default()
    }

    pub fn supplementary_foods(&self, basis: FoodBasis) -> &[String] {
        self.supplementary_foods
            .get(&basis)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn list_block<'a>(
    document: DocumentName,
    section: &'a Section,
) -> Result<&'a Block, ReferenceError> {
    let block = section.block(LIST_BLOCK).ok_or_else(|| {
        malformed(
            document,
            format!("section '{}' is missing block '{}'", section.title, LIST_BLOCK),
        )
    })?;
    if block.items().next().is_none() {
        return Err(malformed(document, format!("{}: list is empty", section.title)));
    }
    Ok(block)
}

/// `- 이름: 키워드, 키워드` 형식의 목록을 (이름, 키워드들)로 읽습니다.
fn keyword_items(
    document: DocumentName,
    section: &Section,
) -> Result<Vec<(String, Vec<String>)>, ReferenceError> {
    let mut entries = Vec::new();
    for item in list_block(document, section)?.items() {
        let (name, keywords) = item.split_once(':').ok_or_else(|| {
            malformed(document, format!("{}: '{}' has no ':'", section.title, item))
        })?;
        let keywords = split_list(keywords);
        if keywords.is_empty() {
            return Err(malformed(
                document,
                format!("{}: '{}' has no keywords", section.title, name.trim()),
            ));
        }
        entries.push((name.trim().to_string(), keywords));
    }
    Ok(entries)
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::outline::parse;

    fn metal_doc(body: &str) -> Result<HeavyMetalDocument, ReferenceError> {
        HeavyMetalDocument::from_outline(&parse(body))
    }

    const METALS: &str = "\
## 정상
### 19세 이하
[이름]님 [연령대] 정상
### 20세 이상
[이름]님 [연령대] 정상

## 수은
### 기준 범위
- 19세 이하: 0.00 ~ 0.40
- 20세 이상: 0.00 ~ 0.80
### 19세 이하
미성년 수은 높음
### 20세 이상
성인 수은 높음
";

    #[test]
    fn range_classification_is_inclusive() {
        let range = Range { low: 1.0, high: 2.0 };
        assert_eq!(range.classify(1.0), Level::Normal);
        assert_eq!(range.classify(2.0), Level::Normal);
        assert_eq!(range.classify(0.99), Level::Low);
        assert_eq!(range.classify(2.01), Level::High);
    }

    #[test]
    fn bracket_map_falls_back_to_minor_then_any_age() {
        let mut texts = BracketMap::default();
        texts.insert("19세 이하", "minor").unwrap();
        texts.insert("연령 무관", "any").unwrap();

        assert_eq!(texts.resolve(AgeBracket::Child), Some(("19세 이하", &"minor")));
        assert_eq!(texts.resolve(AgeBracket::Teen), Some(("19세 이하", &"minor")));
        assert_eq!(texts.resolve(AgeBracket::Adult), Some(("연령 무관", &"any")));
    }

    #[test]
    fn parses_heavy_metal_document() {
        let doc = metal_doc(METALS).unwrap();

        let (label, range) = doc.ranges.range_for(Analyte::Mercury, AgeBracket::Adult).unwrap();
        assert_eq!(label, "20세 이상");
        assert_eq!(range.high, 0.80);
        assert_eq!(
            doc.high_text(Analyte::Mercury, AgeBracket::Teen).map(|(_, t)| t.as_str()),
            Some("미성년 수은 높음")
        );
        assert!(doc.perm_dye_notice.is_none());
    }

    #[test]
    fn rejects_inverted_range() {
        let body = METALS.replace("0.00 ~ 0.80", "0.90 ~ 0.80");
        let err = metal_doc(&body).unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::Malformed { document: DocumentName::HeavyMetals, .. }
        ));
    }

    #[test]
    fn rejects_ranges_that_miss_an_age_bracket() {
        let body = METALS.replace("- 19세 이하: 0.00 ~ 0.40\n", "");
        assert!(metal_doc(&body).is_err());
    }

    #[test]
    fn rejects_unknown_sections_and_misplaced_analytes() {
        assert!(metal_doc(&format!("{}\n## 플루토늄\n### 연령 무관\n텍스트\n", METALS)).is_err());
        assert!(metal_doc(&format!("{}\n## 칼슘\n### 연령 무관\n텍스트\n", METALS)).is_err());
    }

    #[test]
    fn rejects_unknown_age_bracket() {
        let body = METALS.replace("### 20세 이상\n성인", "### 30세 이상\n성인");
        assert!(metal_doc(&body).is_err());
    }

    #[test]
    fn level_titles() {
        assert_eq!(parse_level_title("높음 (20세 이상)"), Some((Level::High, "20세 이상")));
        assert_eq!(parse_level_title("낮음"), Some((Level::Low, ANY_AGE)));
        assert_eq!(parse_level_title("정상"), None);
        assert_eq!(parse_level_title("아주 높음"), None);
    }

    #[test]
    fn parses_combo_rules_with_cross_group_conditions() {
        let body = "\
## 정상
### 연령 무관
정상

## 부신 활성도
### 기준 범위
- 연령 무관: 0.8 ~ 1.2
### 높음
부신 높음
### 낮음
부신 낮음

## 복합: 부신 활성도 높음 + 수은 높음
### 연령 무관
복합 멘트
";
        let doc = ConditionDocument::from_outline(
            DocumentName::HealthIndicators,
            AnalyteGroup::HealthIndicator,
            &parse(body),
        )
        .unwrap();

        assert_eq!(doc.combos().len(), 1);
        assert_eq!(
            doc.combos()[0].conditions,
            vec![
                Condition { analyte: Analyte::AdrenalActivity, level: Level::High },
                Condition { analyte: Analyte::Mercury, level: Level::High },
            ]
        );
    }

    #[test]
    fn rejects_condition_documents_missing_low_texts() {
        let body = "\
## 정상
### 연령 무관
정상

## 아연
### 기준 범위
- 연령 무관: 140 ~ 220
### 높음
아연 높음
";
        let err = ConditionDocument::from_outline(
            DocumentName::Minerals,
            AnalyteGroup::Mineral,
            &parse(body),
        )
        .unwrap_err();
        assert!(err.to_string().contains("낮음"));
    }
}
