//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `HOST`: 서버 바인딩 주소 (기본값 "0.0.0.0")
//! - `PORT`: 서버 포트 번호 (기본값 8000)
//! - `REFERENCE_SOURCE`: 참조 문서 저장소 종류, `local` 또는 `env` (기본값 `local`)
//! - `NOTES_PATH`: `local`일 때 참조 문서 디렉토리 (기본값 "data/notes")
//! - `REFERENCE_LOAD_TIMEOUT_SECS`: 참조 문서 로딩 제한 시간 (기본값 10초)
//! - `REQUEST_TIMEOUT_SECS`: 요청 처리 제한 시간 (기본값 30초)
//! - `CORS_ORIGINS`: 허용할 출처 목록 (쉼표 구분, 기본값 "*")

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// 참조 문서를 읽어올 곳
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSourceKind {
    /// 로컬 디렉토리 (`NOTES_PATH`)
    Local,
    /// 환경변수 `NOTE1_CONTENT` ~ `NOTE5_CONTENT`
    Env,
}

impl FromStr for ReferenceSourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ReferenceSourceKind::Local),
            "env" => Ok(ReferenceSourceKind::Env),
            other => Err(ConfigError::Invalid {
                key: "REFERENCE_SOURCE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// 서버가 바인딩할 호스트 주소
    pub host: String,
    /// 서버 포트 번호
    /// u16: 0~65535 범위의 부호 없는 16비트 정수. 포트 번호에 딱 맞는 타입입니다.
    pub port: u16,
    pub reference_source: ReferenceSourceKind,
    pub notes_path: String,
    pub reference_load_timeout: Duration,
    pub request_timeout: Duration,
    /// "*" 하나면 모든 출처 허용
    pub cors_origins: Vec<String>,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// 모든 항목에 기본값이 있습니다. 숫자 항목은 파싱에 실패하면 기본값을 쓰고,
    /// `REFERENCE_SOURCE`만은 잘못된 값이면 에러를 반환합니다
    /// (엉뚱한 저장소로 조용히 떨어지는 것을 막기 위해).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정을 만듭니다. 테스트에서 프로세스 환경을 건드리지 않기 위해 사용합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reference_source = match lookup("REFERENCE_SOURCE") {
            Some(value) => value.parse()?,
            None => ReferenceSourceKind::Local,
        };

        let secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(8000),
            reference_source,
            notes_path: lookup("NOTES_PATH").unwrap_or_else(|| "data/notes".to_string()),
            reference_load_timeout: Duration::from_secs(secs("REFERENCE_LOAD_TIMEOUT_SECS", 10)),
            request_timeout: Duration::from_secs(secs("REQUEST_TIMEOUT_SECS", 30)),
            cors_origins: if cors_origins.is_empty() {
                vec!["*".to_string()]
            } else {
                cors_origins
            },
        })
    }

    /// 모든 출처를 허용하는지 여부
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.reference_source, ReferenceSourceKind::Local);
        assert_eq!(config.notes_path, "data/notes");
        assert_eq!(config.reference_load_timeout, Duration::from_secs(10));
        assert!(config.allows_any_origin());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "9100"),
            ("REFERENCE_SOURCE", "ENV"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.reference_source, ReferenceSourceKind::Env);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn bad_numbers_fall_back_but_bad_source_fails() {
        let config = config(&[("PORT", "eighty"), ("REFERENCE_LOAD_TIMEOUT_SECS", "0")]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.reference_load_timeout, Duration::from_secs(10));

        assert!(matches!(
            super::Config::from_lookup(|k| (k == "REFERENCE_SOURCE").then(|| "s3".to_string())),
            Err(ConfigError::Invalid { key: "REFERENCE_SOURCE", .. })
        ));
    }
}
