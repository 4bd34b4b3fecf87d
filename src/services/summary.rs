//! # 요약 설명 생성
//!
//! 완성된 리포트와 판정 결과로부터 요약 설명(`SummaryExplanation`)을 만듭니다.
//!
//! - 핵심 관리 포인트: 우선순위에 따라 하나를 고릅니다.
//! - 추천 식품: 리포트 본문에 언급된 식품을 우선으로 정확히 5개.
//! - 추천 영양제: 리포트 본문에 언급된 영양제와 관리 포인트의 조합으로 고릅니다.
//!   언급이 없으면 관리 포인트별 문장을 씁니다.
//! - 재검사 권장 기간: 판정 결과와 관리 포인트로 note5의 문장을 고릅니다.

use crate::models::{Analyte, AnalyteGroup, Level, Report, SummaryExplanation};
use crate::reference::tables::{
    FoodBasis, ManagementFocus, RecheckCase, Supplement, SupplementRule, SummaryDocument,
    FOOD_COUNT,
};
use crate::reference::ReferenceStore;
use crate::services::analyzer::Assessment;
use crate::services::text::{self, AGE_BRACKET, ITEMS, NAME};

/// 요약 설명을 만듭니다.
pub fn summarize(
    store: &ReferenceStore,
    assessment: &Assessment,
    report: &Report,
) -> SummaryExplanation {
    let doc = &store.summary;
    let focus = management_focus(assessment);
    let metals = metals_of_concern(assessment);
    let metal_names: Vec<&str> = metals.iter().map(|a| a.korean_name()).collect();

    let items = text::join_items(&metal_names);
    let bindings = [
        (NAME, assessment.profile.name.as_str()),
        (AGE_BRACKET, assessment.bracket.label()),
        (ITEMS, items.as_str()),
    ];

    // 재검사 문장의 [항목]은 "수은과 납"처럼 이어 씁니다.
    let recheck_items = text::join_with_and(&metal_names);
    let recheck_bindings = [
        (NAME, assessment.profile.name.as_str()),
        (AGE_BRACKET, assessment.bracket.label()),
        (ITEMS, recheck_items.as_str()),
    ];

    let report_text = report.full_text();

    SummaryExplanation {
        title: text::render(doc.title(focus), &bindings),
        recommended_foods: recommended_foods(doc, &report_text, FoodBasis::from(focus)),
        recommended_supplements: recommended_supplements(doc, &report_text, focus),
        recheck_period: text::render(doc.recheck(recheck_case(assessment)), &recheck_bindings),
    }
}

/// 관리가 필요한 유해 중금속 (펌·염색 직후의 바륨은 제외)
fn metals_of_concern(assessment: &Assessment) -> Vec<Analyte> {
    let perm_or_dye = assessment.profile.has_perm_or_dye();
    assessment
        .classification
        .abnormal(AnalyteGroup::HeavyMetal)
        .into_iter()
        .filter(|(analyte, level)| {
            *level == Level::High && !(perm_or_dye && *analyte == Analyte::Barium)
        })
        .map(|(analyte, _)| analyte)
        .collect()
}

/// 핵심 관리 포인트를 고릅니다.
///
/// 1. 유해 중금속 + 부신 저하 → 중금속 피로도
/// 2. 유해 중금속 + 항산화 미네랄(셀레늄·망간·구리) 부족 → 중금속 항산화
/// 3. 유해 중금속 → 중금속
/// 4. 부신 저하 → 스트레스 상승 → 혈당(인슐린) → 면역 저하 순
/// 5. 그 외 → 영양 균형
pub fn management_focus(assessment: &Assessment) -> ManagementFocus {
    let c = &assessment.classification;
    let adrenal_low = c.is(Analyte::AdrenalActivity, Level::Low);

    if !metals_of_concern(assessment).is_empty() {
        let antioxidant_low = [Analyte::Selenium, Analyte::Manganese, Analyte::Copper]
            .into_iter()
            .any(|a| c.is(a, Level::Low));
        return if adrenal_low {
            ManagementFocus::HeavyMetalFatigue
        } else if antioxidant_low {
            ManagementFocus::HeavyMetalAntioxidant
        } else {
            ManagementFocus::HeavyMetal
        };
    }

    if adrenal_low {
        ManagementFocus::AdrenalFatigue
    } else if c.is(Analyte::StressState, Level::High) {
        ManagementFocus::Stress
    } else if c.is(Analyte::InsulinSensitivity, Level::High) {
        ManagementFocus::BloodSugar
    } else if c.is(Analyte::ImmuneSkinHealth, Level::Low) {
        ManagementFocus::Immunity
    } else {
        ManagementFocus::Balance
    }
}

/// 재검사 권장 기간의 경우를 고릅니다.
///
/// 중금속·미네랄 판정으로 큰 경우를 나누고, 세부 문장은 관리 포인트를 따릅니다.
/// 부신이 스트레스보다, 스트레스가 혈당보다 앞섭니다.
pub fn recheck_case(assessment: &Assessment) -> RecheckCase {
    let c = &assessment.classification;
    let perm_or_dye = assessment.profile.has_perm_or_dye();
    let child = assessment.profile.age <= 10;

    let metals_off = !metals_of_concern(assessment).is_empty();
    // 펌·염색 직후의 칼슘·마그네슘 상승, 10세 이하의 나트륨·칼륨 상승은 일시적인 것으로 봅니다.
    let minerals_off = c
        .abnormal(AnalyteGroup::Mineral)
        .into_iter()
        .any(|(analyte, level)| {
            let temporary = level == Level::High
                && ((perm_or_dye && matches!(analyte, Analyte::Calcium | Analyte::Magnesium))
                    || (child && matches!(analyte, Analyte::Sodium | Analyte::Potassium)));
            !temporary
        });

    match (metals_off, minerals_off) {
        (true, false) => RecheckCase::MetalsOnly,
        (true, true) => RecheckCase::MetalsAndMinerals,
        (false, true) => match management_focus(assessment) {
            ManagementFocus::Stress => RecheckCase::MineralsStress,
            ManagementFocus::AdrenalFatigue => RecheckCase::MineralsAdrenal,
            _ => RecheckCase::Minerals,
        },
        (false, false) => match management_focus(assessment) {
            ManagementFocus::AdrenalFatigue => RecheckCase::NormalAdrenal,
            ManagementFocus::BloodSugar => RecheckCase::NormalBloodSugar,
            _ => RecheckCase::Normal,
        },
    }
}

/// 리포트 본문에 언급된 영양제 (`영양제 키워드` 목록 순서)
fn mentioned_supplements(doc: &SummaryDocument, report_text: &str) -> Vec<Supplement> {
    doc.supplement_keywords
        .iter()
        .filter(|entry| entry.keywords.iter().any(|kw| report_text.contains(kw.as_str())))
        .map(|entry| entry.supplement)
        .collect()
}

/// 관리 포인트와 언급된 영양제로 조합 문장을 고릅니다. 언급이 없으면 None.
pub fn supplement_rule(focus: ManagementFocus, mentioned: &[Supplement]) -> Option<SupplementRule> {
    if mentioned.is_empty() {
        return None;
    }
    let has = |supplement: Supplement| mentioned.contains(&supplement);

    let rule = match focus {
        ManagementFocus::HeavyMetalFatigue
        | ManagementFocus::HeavyMetalAntioxidant
        | ManagementFocus::HeavyMetal
            if has(Supplement::Antioxidant) =>
        {
            if has(Supplement::VitaminB) {
                SupplementRule::MetalsVitaminB
            } else if has(Supplement::CalMagD) {
                SupplementRule::MetalsCalMagD
            } else {
                SupplementRule::MetalsAntioxidant
            }
        }
        ManagementFocus::AdrenalFatigue if has(Supplement::VitaminB) => {
            SupplementRule::AdrenalVitaminB
        }
        ManagementFocus::Stress if has(Supplement::VitaminD) => SupplementRule::StressVitaminD,
        ManagementFocus::BloodSugar if has(Supplement::VitaminB) => {
            SupplementRule::BloodSugarVitaminB
        }
        _ => SupplementRule::FirstMentioned,
    };
    Some(rule)
}

/// 추천 영양제 문장
pub fn recommended_supplements(
    doc: &SummaryDocument,
    report_text: &str,
    focus: ManagementFocus,
) -> String {
    let mentioned = mentioned_supplements(doc, report_text);

    match supplement_rule(focus, &mentioned) {
        Some(rule) => {
            let first = mentioned.first().map(|s| s.label()).unwrap_or_default();
            text::render(doc.supplement_rule(rule), &[(ITEMS, first)])
        }
        None => text::render(doc.supplement(focus), &[]),
    }
}

/// 추천 식품 정확히 5개
///
/// 1. 리포트에 언급된 우선 식품 (우선 식품 목록 순서)
/// 2. 리포트에 언급된 나머지 식품 (키워드 목록 순서)
/// 3. 관리 포인트별 보충 식품
/// 4. 우선 식품 목록
///
/// 우선 식품 목록이 5개 이상임은 로딩 시점에 검증되므로 항상 5개가 채워집니다.
pub fn recommended_foods(
    doc: &SummaryDocument,
    report_text: &str,
    basis: FoodBasis,
) -> Vec<String> {
    let mentioned: Vec<&str> = doc
        .food_keywords
        .iter()
        .filter(|entry| entry.keywords.iter().any(|kw| report_text.contains(kw.as_str())))
        .map(|entry| entry.food.as_str())
        .collect();

    let priority_mentioned = doc
        .priority_foods
        .iter()
        .map(String::as_str)
        .filter(|food| mentioned.contains(food));
    let other_mentioned = mentioned
        .iter()
        .copied()
        .filter(|food| !doc.priority_foods.iter().any(|p| p.as_str() == *food));
    let supplementary = doc.supplementary_foods(basis).iter().map(String::as_str);
    let fallback = doc.priority_foods.iter().map(String::as_str);

    let mut foods: Vec<String> = Vec::with_capacity(FOOD_COUNT);
    for food in priority_mentioned
        .chain(other_mentioned)
        .chain(supplementary)
        .chain(fallback)
    {
        if foods.len() == FOOD_COUNT {
            break;
        }
        if !foods.iter().any(|f| f == food) {
            foods.push(food.to_string());
        }
    }
    foods
}
