//! # 참조 문서 모듈
//!
//! 리포트 멘트와 기준 범위가 담긴 다섯 개의 마크다운 문서를 읽고 검증합니다.
//!
//! ```text
//! ReferenceSource (source.rs)          ← 디렉토리 / 환경 변수
//!     │ Vec<ReferenceDocument>
//!     ▼
//! outline::parse()                     ← ## 섹션 / ### 블록 구조
//!     ▼
//! tables::*Document::from_outline()    ← 문서별 타입 + 검증
//!     ▼
//! ReferenceStore                       ← 불변. Arc로 공유
//! ```
//!
//! `ReferenceStore`는 한 번 만들어지면 바뀌지 않습니다.
//! 새로고침은 새 store를 만들어 통째로 교체하는 방식입니다 (`routes::analysis::AppState::reload`).

pub mod outline;
pub mod source;
pub mod tables;

pub use source::{DirectorySource, EnvSource, ReferenceSource};

use crate::models::{AgeBracket, Analyte, AnalyteGroup};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tables::{ConditionDocument, GreetingDocument, HeavyMetalDocument, Range, SummaryDocument};
use thiserror::Error;

/// 참조 문서 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentName {
    Basic,
    HeavyMetals,
    Minerals,
    HealthIndicators,
    Summary,
}

impl DocumentName {
    pub const ALL: [DocumentName; 5] = [
        DocumentName::Basic,
        DocumentName::HeavyMetals,
        DocumentName::Minerals,
        DocumentName::HealthIndicators,
        DocumentName::Summary,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            DocumentName::Basic => "note1_basic.md",
            DocumentName::HeavyMetals => "note2_heavy_metals.md",
            DocumentName::Minerals => "note3_minerals.md",
            DocumentName::HealthIndicators => "note4_health_indicators.md",
            DocumentName::Summary => "note5_summary.md",
        }
    }

    /// `EnvSource`가 읽는 환경 변수 이름
    pub fn env_key(self) -> &'static str {
        match self {
            DocumentName::Basic => "NOTE1_CONTENT",
            DocumentName::HeavyMetals => "NOTE2_CONTENT",
            DocumentName::Minerals => "NOTE3_CONTENT",
            DocumentName::HealthIndicators => "NOTE4_CONTENT",
            DocumentName::Summary => "NOTE5_CONTENT",
        }
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// 읽어온 참조 문서 원문
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    pub name: DocumentName,
    pub content: String,
    /// 본문의 SHA-256 (16진수). 내용이 바뀌었는지 확인하는 용도입니다.
    pub version: String,
    pub last_modified: DateTime<Utc>,
}

impl ReferenceDocument {
    pub fn new(name: DocumentName, content: String, last_modified: DateTime<Utc>) -> Self {
        let version = format!("{:x}", Sha256::digest(content.as_bytes()));
        Self {
            name,
            content,
            version,
            last_modified,
        }
    }
}

/// 참조 문서 로딩 에러
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("missing reference documents: {}", join_names(.0))]
    Missing(Vec<DocumentName>),

    #[error("{document} is malformed: {reason}")]
    Malformed {
        document: DocumentName,
        reason: String,
    },

    #[error("failed to read {document}: {source}")]
    Io {
        document: DocumentName,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {document}: {reason}")]
    Decode {
        document: DocumentName,
        reason: String,
    },

    #[error("loading reference documents timed out after {0:?}")]
    Timeout(Duration),

    #[error("reference loading task failed: {0}")]
    Task(String),
}

fn join_names(names: &[DocumentName]) -> String {
    names
        .iter()
        .map(|n| n.file_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 검증을 마친 참조 데이터
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    documents: Vec<ReferenceDocument>,
    pub greeting: GreetingDocument,
    pub heavy_metals: HeavyMetalDocument,
    pub minerals: ConditionDocument,
    pub health_indicators: ConditionDocument,
    pub summary: SummaryDocument,
}

impl ReferenceStore {
    /// 저장소에서 문서를 읽어 store를 만듭니다 (blocking).
    pub fn load(source: &dyn ReferenceSource) -> Result<Self, ReferenceError> {
        Self::from_documents(source.load()?)
    }

    /// 문서 목록으로부터 store를 만듭니다.
    ///
    /// 다섯 문서가 모두 있어야 하며, 하나라도 검증에 실패하면 전체가 실패합니다.
    pub fn from_documents(documents: Vec<ReferenceDocument>) -> Result<Self, ReferenceError> {
        let missing: Vec<DocumentName> = DocumentName::ALL
            .into_iter()
            .filter(|name| !documents.iter().any(|d| d.name == *name))
            .collect();
        if !missing.is_empty() {
            return Err(ReferenceError::Missing(missing));
        }

        let outline_of = |name: DocumentName| {
            documents
                .iter()
                .find(|d| d.name == name)
                .map(|d| outline::parse(&d.content))
                .unwrap_or_default()
        };

        let greeting = GreetingDocument::from_outline(&outline_of(DocumentName::Basic))?;
        let heavy_metals =
            HeavyMetalDocument::from_outline(&outline_of(DocumentName::HeavyMetals))?;
        let minerals = ConditionDocument::from_outline(
            DocumentName::Minerals,
            AnalyteGroup::Mineral,
            &outline_of(DocumentName::Minerals),
        )?;
        let health_indicators = ConditionDocument::from_outline(
            DocumentName::HealthIndicators,
            AnalyteGroup::HealthIndicator,
            &outline_of(DocumentName::HealthIndicators),
        )?;
        let summary = SummaryDocument::from_outline(&outline_of(DocumentName::Summary))?;

        let mut documents = documents;
        documents.sort_by_key(|d| d.name);

        Ok(Self {
            documents,
            greeting,
            heavy_metals,
            minerals,
            health_indicators,
            summary,
        })
    }

    /// 원문 문서 목록 (이름 순)
    pub fn documents(&self) -> &[ReferenceDocument] {
        &self.documents
    }

    /// 항목 그룹에 맞는 기준 범위 표에서 범위를 찾습니다.
    pub fn range_for(&self, analyte: Analyte, bracket: AgeBracket) -> Option<(&str, &Range)> {
        match analyte.group() {
            AnalyteGroup::HeavyMetal => self.heavy_metals.ranges.range_for(analyte, bracket),
            AnalyteGroup::Mineral => self.minerals.ranges.range_for(analyte, bracket),
            AnalyteGroup::HealthIndicator => {
                self.health_indicators.ranges.range_for(analyte, bracket)
            }
        }
    }

    /// 요청에 반드시 있어야 하는 항목들 (참조 문서에 기준 범위가 있는 항목, 선언 순서)
    pub fn required_analytes(&self) -> Vec<Analyte> {
        let mut analytes: Vec<Analyte> = self
            .heavy_metals
            .ranges
            .analytes()
            .chain(self.minerals.ranges.analytes())
            .chain(self.health_indicators.ranges.analytes())
            .collect();
        analytes.sort();
        analytes.dedup();
        analytes
    }
}

/// blocking 로딩을 별도 스레드에서 실행하고 제한 시간을 둡니다.
///
/// 원격 마운트된 디렉토리가 응답하지 않아도 서버 시작이나 새로고침 요청이
/// 무한정 멈추지 않도록 합니다.
pub async fn load_with_timeout(
    source: Arc<dyn ReferenceSource>,
    timeout: Duration,
) -> Result<ReferenceStore, ReferenceError> {
    let task = tokio::task::spawn_blocking(move || ReferenceStore::load(source.as_ref()));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ReferenceError::Task(join_error.to_string())),
        Err(_) => Err(ReferenceError::Timeout(timeout)),
    }
}

/// 저장소에 포함된 참조 문서 (테스트 전용)
#[cfg(test)]
pub(crate) fn fixture_documents() -> Vec<ReferenceDocument> {
    let contents = [
        (DocumentName::Basic, include_str!("../../data/notes/note1_basic.md")),
        (DocumentName::HeavyMetals, include_str!("../../data/notes/note2_heavy_metals.md")),
        (DocumentName::Minerals, include_str!("../../data/notes/note3_minerals.md")),
        (
            DocumentName::HealthIndicators,
            include_str!("../../data/notes/note4_health_indicators.md"),
        ),
        (DocumentName::Summary, include_str!("../../data/notes/note5_summary.md")),
    ];
    contents
        .into_iter()
        .map(|(name, content)| ReferenceDocument::new(name, content.to_string(), Utc::now()))
        .collect()
}

#[cfg(test)]
pub(crate) fn fixture_store() -> ReferenceStore {
    ReferenceStore::from_documents(fixture_documents()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_documents_load() {
        let store = fixture_store();

        assert_eq!(store.documents().len(), 5);
        assert_eq!(store.required_analytes(), Analyte::ALL.to_vec());
        assert!(!store.minerals.combos().is_empty());
        assert!(store.heavy_metals.perm_dye_notice.is_some());
    }

    #[test]
    fn every_analyte_has_a_range_for_every_bracket() {
        let store = fixture_store();
        for analyte in Analyte::ALL {
            for bracket in AgeBracket::ALL {
                assert!(store.range_for(analyte, bracket).is_some(), "{analyte} / {bracket:?}");
            }
        }
    }

    #[test]
    fn mercury_range_depends_on_age() {
        let store = fixture_store();

        let (_, minor) = store.range_for(Analyte::Mercury, AgeBracket::Teen).unwrap();
        let (label, adult) = store.range_for(Analyte::Mercury, AgeBracket::Adult).unwrap();

        assert!(minor.high < adult.high);
        assert_eq!(label, "20세 이상");
    }

    #[test]
    fn reports_every_missing_document() {
        let documents: Vec<_> = fixture_documents()
            .into_iter()
            .filter(|d| d.name != DocumentName::Summary && d.name != DocumentName::Basic)
            .collect();

        match ReferenceStore::from_documents(documents) {
            Err(ReferenceError::Missing(names)) => {
                assert_eq!(names, vec![DocumentName::Basic, DocumentName::Summary])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn version_is_content_hash() {
        let a = ReferenceDocument::new(DocumentName::Basic, "a".into(), Utc::now());
        let b = ReferenceDocument::new(DocumentName::Basic, "a".into(), Utc::now());
        let c = ReferenceDocument::new(DocumentName::Basic, "b".into(), Utc::now());

        assert_eq!(a.version, b.version);
        assert_ne!(a.version, c.version);
    }

    struct SlowSource;

    impl ReferenceSource for SlowSource {
        fn describe(&self) -> String {
            "slow".into()
        }

        fn load(&self) -> Result<Vec<ReferenceDocument>, ReferenceError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(fixture_documents())
        }
    }

    #[tokio::test]
    async fn load_times_out() {
        let err = load_with_timeout(Arc::new(SlowSource), Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(err, ReferenceError::Timeout(_)));
    }
}
