//! # 리포트 조립
//!
//! 네 개의 분석 섹션을 받아 고정된 순서의 `Report`로 묶습니다.
//!
//! - 섹션이 어떤 순서로 도착해도 결과 순서는 같습니다.
//! - 하나라도 빠지거나 비어 있거나 중복되면 전체가 실패합니다 (부분 리포트 없음).

use crate::models::{AnalysisSection, Report, SectionKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("report is missing sections: {}", join_kinds(.0))]
    Missing(Vec<SectionKind>),

    #[error("section {0} is empty")]
    Empty(SectionKind),

    #[error("section {0} was produced twice")]
    Duplicate(SectionKind),
}

fn join_kinds(kinds: &[SectionKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 섹션들을 `Report`로 조립합니다.
pub fn assemble<I>(sections: I) -> Result<Report, AssemblyError>
where
    I: IntoIterator<Item = AnalysisSection>,
{
    // 슬롯 인덱스 = SectionKind::position()
    let mut slots: [Option<String>; 4] = Default::default();

    for section in sections {
        let kind = section.kind();
        if section.body().trim().is_empty() {
            return Err(AssemblyError::Empty(kind));
        }
        let slot = &mut slots[kind.position()];
        if slot.is_some() {
            return Err(AssemblyError::Duplicate(kind));
        }
        *slot = Some(section.into_body());
    }

    let missing: Vec<SectionKind> = SectionKind::ORDER
        .into_iter()
        .filter(|kind| slots[kind.position()].is_none())
        .collect();
    if !missing.is_empty() {
        return Err(AssemblyError::Missing(missing));
    }

    // 위에서 네 슬롯이 모두 채워졌음을 확인했습니다.
    let [first, metals, minerals, indicators] = slots.map(Option::unwrap_or_default);
    Ok(Report::from_parts(first, metals, minerals, indicators))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn full_set() -> Vec<AnalysisSection> {
        SectionKind::ORDER
            .into_iter()
            .map(|kind| AnalysisSection::new(kind, format!("{} 본문", kind.key())))
            .collect()
    }

    #[test]
    fn assembles_in_fixed_order() {
        let mut sections = full_set();
        sections.reverse();

        let report = assemble(sections).unwrap();
        let json = serde_json::to_string(&report).unwrap();

        let positions: Vec<usize> = SectionKind::ORDER
            .iter()
            .map(|kind| json.find(&format!("\"{}\"", kind.key())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn reports_all_missing_sections() {
        let sections: Vec<_> = full_set()
            .into_iter()
            .filter(|s| s.kind() == SectionKind::FirstParagraph)
            .collect();

        assert_eq!(
            assemble(sections),
            Err(AssemblyError::Missing(vec![
                SectionKind::HeavyMetalsAnalysis,
                SectionKind::MineralsAnalysis,
                SectionKind::HealthIndicatorsAnalysis,
            ]))
        );
    }

    #[test]
    fn rejects_blank_and_duplicate_sections() {
        let mut blank = full_set();
        blank[2] = AnalysisSection::new(SectionKind::MineralsAnalysis, "  \n ");
        assert_eq!(assemble(blank), Err(AssemblyError::Empty(SectionKind::MineralsAnalysis)));

        let mut twice = full_set();
        twice.push(AnalysisSection::new(SectionKind::FirstParagraph, "다시"));
        assert_eq!(assemble(twice), Err(AssemblyError::Duplicate(SectionKind::FirstParagraph)));
    }

    proptest! {
        #[test]
        fn arrival_order_does_not_change_the_report(
            bodies in proptest::array::uniform4("[가-힣a-z ]{0,12}[가-힣a-z]"),
            order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        ) {
            let sections: Vec<_> = order
                .iter()
                .map(|&i| AnalysisSection::new(SectionKind::ORDER[i], bodies[i].clone()))
                .collect();

            let report = assemble(sections).unwrap();

            prop_assert_eq!(report.first_paragraph(), bodies[0].as_str());
            prop_assert_eq!(report.heavy_metals_analysis(), bodies[1].as_str());
            prop_assert_eq!(report.minerals_analysis(), bodies[2].as_str());
            prop_assert_eq!(report.health_indicators_analysis(), bodies[3].as_str());
        }
    }
}
