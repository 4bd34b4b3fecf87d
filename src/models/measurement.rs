//! # 검사 입력 모델
//!
//! 분석 요청(`POST /api/v1/analysis`)의 본문을 구성하는 타입들입니다.
//!
//! - `Analyte`: 검사 항목 26종 (유해 중금속 9종, 영양 미네랄 11종, 건강 상태 지표 6종)
//! - `Level`: 항목별 판정 결과 (정상/높음/낮음)
//! - `Reading`: 요청으로 들어오는 측정값. 숫자이거나 이미 판정된 `Level`
//! - `PersonalInfo`: 검사자 정보 (이름, 나이, 특이사항)
//! - `AgeBracket`: 나이로부터 결정되는 연령대

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 검사 항목이 속한 그룹
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalyteGroup {
    HeavyMetal,
    Mineral,
    HealthIndicator,
}

impl AnalyteGroup {
    /// 참조 문서와 로그에 쓰는 한국어 그룹 이름
    pub fn korean_name(self) -> &'static str {
        match self {
            AnalyteGroup::HeavyMetal => "유해 중금속",
            AnalyteGroup::Mineral => "영양 미네랄",
            AnalyteGroup::HealthIndicator => "건강 상태 지표",
        }
    }
}

/// 검사 항목
///
/// 선언 순서가 곧 리포트에 나열되는 순서입니다.
/// `derive(Ord)`는 선언 순서를 따르므로 `BTreeMap<Analyte, _>`을 순회하면
/// 항상 같은 순서로 멘트가 만들어집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyte {
    // 유해 중금속
    Mercury,
    Arsenic,
    Cadmium,
    Lead,
    Aluminum,
    Barium,
    Nickel,
    Uranium,
    Bismuth,
    // 영양 미네랄
    Calcium,
    Magnesium,
    Sodium,
    Potassium,
    Copper,
    Zinc,
    Phosphorus,
    Iron,
    Manganese,
    Chromium,
    Selenium,
    // 건강 상태 지표
    InsulinSensitivity,
    AutonomicNervousSystem,
    StressState,
    ImmuneSkinHealth,
    AdrenalActivity,
    ThyroidActivity,
}

impl Analyte {
    pub const ALL: [Analyte; 26] = [
        Analyte::Mercury,
        Analyte::Arsenic,
        Analyte::Cadmium,
        Analyte::Lead,
        Analyte::Aluminum,
        Analyte::Barium,
        Analyte::Nickel,
        Analyte::Uranium,
        Analyte::Bismuth,
        Analyte::Calcium,
        Analyte::Magnesium,
        Analyte::Sodium,
        Analyte::Potassium,
        Analyte::Copper,
        Analyte::Zinc,
        Analyte::Phosphorus,
        Analyte::Iron,
        Analyte::Manganese,
        Analyte::Chromium,
        Analyte::Selenium,
        Analyte::InsulinSensitivity,
        Analyte::AutonomicNervousSystem,
        Analyte::StressState,
        Analyte::ImmuneSkinHealth,
        Analyte::AdrenalActivity,
        Analyte::ThyroidActivity,
    ];

    /// 요청 JSON에서 쓰는 키 (예: `"mercury"`)
    pub fn key(self) -> &'static str {
        match self {
            Analyte::Mercury => "mercury",
            Analyte::Arsenic => "arsenic",
            Analyte::Cadmium => "cadmium",
            Analyte::Lead => "lead",
            Analyte::Aluminum => "aluminum",
            Analyte::Barium => "barium",
            Analyte::Nickel => "nickel",
            Analyte::Uranium => "uranium",
            Analyte::Bismuth => "bismuth",
            Analyte::Calcium => "calcium",
            Analyte::Magnesium => "magnesium",
            Analyte::Sodium => "sodium",
            Analyte::Potassium => "potassium",
            Analyte::Copper => "copper",
            Analyte::Zinc => "zinc",
            Analyte::Phosphorus => "phosphorus",
            Analyte::Iron => "iron",
            Analyte::Manganese => "manganese",
            Analyte::Chromium => "chromium",
            Analyte::Selenium => "selenium",
            Analyte::InsulinSensitivity => "insulin_sensitivity",
            Analyte::AutonomicNervousSystem => "autonomic_nervous_system",
            Analyte::StressState => "stress_state",
            Analyte::ImmuneSkinHealth => "immune_skin_health",
            Analyte::AdrenalActivity => "adrenal_activity",
            Analyte::ThyroidActivity => "thyroid_activity",
        }
    }

    /// 참조 문서의 `## ` 제목과 멘트에 쓰는 한국어 이름
    pub fn korean_name(self) -> &'static str {
        match self {
            Analyte::Mercury => "수은",
            Analyte::Arsenic => "비소",
            Analyte::Cadmium => "카드뮴",
            Analyte::Lead => "납",
            Analyte::Aluminum => "알루미늄",
            Analyte::Barium => "바륨",
            Analyte::Nickel => "니켈",
            Analyte::Uranium => "우라늄",
            Analyte::Bismuth => "비스무트",
            Analyte::Calcium => "칼슘",
            Analyte::Magnesium => "마그네슘",
            Analyte::Sodium => "나트륨",
            Analyte::Potassium => "칼륨",
            Analyte::Copper => "구리",
            Analyte::Zinc => "아연",
            Analyte::Phosphorus => "인",
            Analyte::Iron => "철분",
            Analyte::Manganese => "망간",
            Analyte::Chromium => "크롬",
            Analyte::Selenium => "셀레늄",
            Analyte::InsulinSensitivity => "인슐린 민감도",
            Analyte::AutonomicNervousSystem => "자율신경계",
            Analyte::StressState => "스트레스 상태",
            Analyte::ImmuneSkinHealth => "면역 및 피부 건강",
            Analyte::AdrenalActivity => "부신 활성도",
            Analyte::ThyroidActivity => "갑상선 활성도",
        }
    }

    pub fn group(self) -> AnalyteGroup {
        use Analyte::*;
        match self {
            Mercury | Arsenic | Cadmium | Lead | Aluminum | Barium | Nickel | Uranium
            | Bismuth => AnalyteGroup::HeavyMetal,
            Calcium | Magnesium | Sodium | Potassium | Copper | Zinc | Phosphorus | Iron
            | Manganese | Chromium | Selenium => AnalyteGroup::Mineral,
            InsulinSensitivity | AutonomicNervousSystem | StressState | ImmuneSkinHealth
            | AdrenalActivity | ThyroidActivity => AnalyteGroup::HealthIndicator,
        }
    }

    /// 한국어 이름으로 항목을 찾습니다. 참조 문서 파싱에 사용됩니다.
    pub fn from_korean(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.korean_name() == name)
    }
}

impl fmt::Display for Analyte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Analyte {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.key() == s)
            .ok_or_else(|| format!("unknown analyte '{}'", s))
    }
}

/// 항목별 판정 결과
///
/// JSON에서는 원래 서비스와 같이 한국어 값(`"정상"`, `"높음"`, `"낮음"`)을 사용하고,
/// 영문 별칭(`"normal"`, `"high"`, `"low"`)도 받아들입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "정상", alias = "normal")]
    Normal,
    #[serde(rename = "높음", alias = "high")]
    High,
    #[serde(rename = "낮음", alias = "low")]
    Low,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Normal => "정상",
            Level::High => "높음",
            Level::Low => "낮음",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "정상" => Some(Level::Normal),
            "높음" => Some(Level::High),
            "낮음" => Some(Level::Low),
            _ => None,
        }
    }
}

/// 요청으로 들어오는 측정값
///
/// `#[serde(untagged)]`: JSON 값의 모양으로 variant를 고릅니다.
/// - `0.5` → `Reading::Value(0.5)` (참조 문서의 기준 범위로 판정)
/// - `"높음"` → `Reading::Level(Level::High)` (이미 판정된 값)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Value(f64),
    Level(Level),
}

/// 연령대
///
/// 참조 문서의 블록 제목(`### 20세 이상` 등)과 대응합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBracket {
    /// 10세 이하
    Child,
    /// 11세 이상 19세 이하
    Teen,
    /// 20세 이상
    Adult,
}

/// 연령과 무관한 블록 제목
pub const ANY_AGE: &str = "연령 무관";
/// 미성년(10세 이하 + 11~19세)을 함께 다루는 블록 제목
pub const MINOR: &str = "19세 이하";

/// 참조 문서에서 허용하는 연령대 블록 제목 전체
pub const BRACKET_LABELS: [&str; 5] = ["10세 이하", "11세 이상 19세 이하", MINOR, "20세 이상", ANY_AGE];

impl AgeBracket {
    pub const ALL: [AgeBracket; 3] = [AgeBracket::Child, AgeBracket::Teen, AgeBracket::Adult];

    pub fn from_age(age: u32) -> Self {
        match age {
            0..=10 => AgeBracket::Child,
            11..=19 => AgeBracket::Teen,
            _ => AgeBracket::Adult,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBracket::Child => "10세 이하",
            AgeBracket::Teen => "11세 이상 19세 이하",
            AgeBracket::Adult => "20세 이상",
        }
    }

    /// 참조 문서에서 블록을 찾을 때 시도할 제목 순서
    ///
    /// 자기 연령대 → (미성년이면) "19세 이하" → "연령 무관"
    pub fn lookup_order(self) -> [&'static str; 3] {
        match self {
            AgeBracket::Child => [self.label(), MINOR, ANY_AGE],
            AgeBracket::Teen => [self.label(), MINOR, ANY_AGE],
            // 성인은 두 단계뿐이므로 마지막 칸을 반복합니다.
            AgeBracket::Adult => [self.label(), ANY_AGE, ANY_AGE],
        }
    }
}

fn default_special_notes() -> String {
    "없음".to_string()
}

/// 검사자 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// 검사자 이름 (공백만 있으면 안 됨)
    pub name: String,
    /// 만 나이 (1~120)
    pub age: u32,
    /// 특이사항 (염색/펌/질환/직업 등). 생략하면 "없음"
    #[serde(default = "default_special_notes")]
    pub special_notes: String,
}

/// 특이사항에서 펌·염색 여부를 판단하는 키워드
const PERM_DYE_KEYWORDS: [&str; 4] = ["파마", "펌", "염색", "탈색"];

impl PersonalInfo {
    pub fn bracket(&self) -> AgeBracket {
        AgeBracket::from_age(self.age)
    }

    /// 최근 펌·염색·탈색을 했는지 여부
    ///
    /// 바륨·칼슘·마그네슘 수치가 일시적으로 높아질 수 있어 멘트가 달라집니다.
    pub fn has_perm_or_dye(&self) -> bool {
        PERM_DYE_KEYWORDS
            .iter()
            .any(|keyword| self.special_notes.contains(keyword))
    }
}

/// 분석 요청 본문
///
/// ```json
/// {
///   "personal_info": { "name": "홍길동", "age": 30, "special_notes": "없음" },
///   "measurements": { "mercury": 0.5, "lead": "높음", ... }
/// }
/// ```
///
/// `measurements`의 키를 `String`으로 받는 이유: 알 수 없는 항목 이름을
/// serde 에러가 아니라 `invalid_measurement` 에러로 돌려주기 위해서입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub personal_info: PersonalInfo,
    pub measurements: BTreeMap<String, Reading>,
}

impl AnalysisRequest {
    /// `GET /api/v1/analysis/sample`이 돌려주는 예시 요청
    pub fn sample() -> Self {
        let levels: [(Analyte, Reading); 26] = [
            (Analyte::Mercury, Reading::Value(1.2)),
            (Analyte::Arsenic, Reading::Value(0.03)),
            (Analyte::Cadmium, Reading::Value(0.01)),
            (Analyte::Lead, Reading::Value(0.4)),
            (Analyte::Aluminum, Reading::Value(3.1)),
            (Analyte::Barium, Reading::Value(0.5)),
            (Analyte::Nickel, Reading::Value(0.1)),
            (Analyte::Uranium, Reading::Value(0.01)),
            (Analyte::Bismuth, Reading::Value(0.02)),
            (Analyte::Calcium, Reading::Value(150.0)),
            (Analyte::Magnesium, Reading::Value(45.0)),
            (Analyte::Sodium, Reading::Value(60.0)),
            (Analyte::Potassium, Reading::Value(30.0)),
            (Analyte::Copper, Reading::Value(18.0)),
            (Analyte::Zinc, Reading::Value(120.0)),
            (Analyte::Phosphorus, Reading::Value(150.0)),
            (Analyte::Iron, Reading::Value(10.0)),
            (Analyte::Manganese, Reading::Value(0.2)),
            (Analyte::Chromium, Reading::Value(0.5)),
            (Analyte::Selenium, Reading::Value(0.9)),
            (Analyte::InsulinSensitivity, Reading::Level(Level::Normal)),
            (Analyte::AutonomicNervousSystem, Reading::Level(Level::Normal)),
            (Analyte::StressState, Reading::Level(Level::High)),
            (Analyte::ImmuneSkinHealth, Reading::Level(Level::Normal)),
            (Analyte::AdrenalActivity, Reading::Level(Level::Low)),
            (Analyte::ThyroidActivity, Reading::Level(Level::Normal)),
        ];

        Self {
            personal_info: PersonalInfo {
                name: "홍길동".to_string(),
                age: 35,
                special_notes: default_special_notes(),
            },
            measurements: levels
                .into_iter()
                .map(|(analyte, reading)| (analyte.key().to_string(), reading))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyte_keys_and_korean_names_round_trip() {
        for analyte in Analyte::ALL {
            assert_eq!(analyte.key().parse::<Analyte>(), Ok(analyte));
            assert_eq!(Analyte::from_korean(analyte.korean_name()), Some(analyte));
        }
        assert!("plutonium".parse::<Analyte>().is_err());
    }

    #[test]
    fn readings_accept_numbers_and_levels() {
        let json = r#"{"mercury": 0.5, "lead": "높음", "zinc": "low"}"#;
        let readings: BTreeMap<String, Reading> = serde_json::from_str(json).unwrap();

        assert_eq!(readings["mercury"], Reading::Value(0.5));
        assert_eq!(readings["lead"], Reading::Level(Level::High));
        assert_eq!(readings["zinc"], Reading::Level(Level::Low));
    }

    #[test]
    fn age_brackets_follow_boundaries() {
        assert_eq!(AgeBracket::from_age(10), AgeBracket::Child);
        assert_eq!(AgeBracket::from_age(11), AgeBracket::Teen);
        assert_eq!(AgeBracket::from_age(19), AgeBracket::Teen);
        assert_eq!(AgeBracket::from_age(20), AgeBracket::Adult);
        assert_eq!(AgeBracket::Teen.lookup_order(), ["11세 이상 19세 이하", "19세 이하", "연령 무관"]);
    }

    #[test]
    fn special_notes_default_and_perm_detection() {
        let info: PersonalInfo = serde_json::from_str(r#"{"name": "김철수", "age": 42}"#).unwrap();
        assert_eq!(info.special_notes, "없음");
        assert!(!info.has_perm_or_dye());

        let dyed = PersonalInfo {
            special_notes: "2주 전 염색".to_string(),
            ..info
        };
        assert!(dyed.has_perm_or_dye());
    }

    #[test]
    fn sample_request_covers_every_analyte() {
        let sample = AnalysisRequest::sample();
        for analyte in Analyte::ALL {
            assert!(sample.measurements.contains_key(analyte.key()), "{analyte} missing");
        }
    }
}
