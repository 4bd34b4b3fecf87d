//! # 참조 문서 저장소(source)
//!
//! 다섯 개의 참조 문서를 어디서 읽어올지 추상화합니다.
//!
//! - `DirectorySource`: 로컬 디렉토리 (`NOTES_PATH`, 기본값 `data/notes`)
//! - `EnvSource`: 환경 변수 `NOTE1_CONTENT` ~ `NOTE5_CONTENT` (base64 인코딩된 UTF-8 본문)
//!
//! 두 구현 모두 blocking I/O를 사용합니다.
//! 비동기 컨텍스트에서는 `reference::load_with_timeout()`이
//! `spawn_blocking`으로 감싸서 호출합니다.

use super::{DocumentName, ReferenceDocument, ReferenceError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// 참조 문서 저장소
///
/// `Send + Sync`: `Arc<dyn ReferenceSource>`로 여러 요청/태스크가 공유합니다.
pub trait ReferenceSource: Send + Sync {
    /// 로그와 `GET /api/v1/reference`에 표시할 설명 (예: "local:data/notes")
    fn describe(&self) -> String;

    /// 다섯 문서를 모두 읽어옵니다.
    ///
    /// 없는 문서가 있으면 하나만이 아니라 없는 문서 전부를 `ReferenceError::Missing`에 담습니다.
    fn load(&self) -> Result<Vec<ReferenceDocument>, ReferenceError>;
}

// ============================================================================
// 로컬 디렉토리
// ============================================================================

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ReferenceSource for DirectorySource {
    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }

    fn load(&self) -> Result<Vec<ReferenceDocument>, ReferenceError> {
        let mut documents = Vec::new();
        let mut missing = Vec::new();

        for name in DocumentName::ALL {
            let path = self.root.join(name.file_name());

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    missing.push(name);
                    continue;
                }
                // 파일은 있지만 UTF-8이 아닌 경우
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(ReferenceError::Decode {
                        document: name,
                        reason: e.to_string(),
                    })
                }
                Err(source) => {
                    return Err(ReferenceError::Io {
                        document: name,
                        source,
                    })
                }
            };

            // 수정 시각을 못 읽는 파일시스템도 있으므로 읽은 시각으로 대신합니다.
            let last_modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            documents.push(ReferenceDocument::new(name, content, last_modified));
        }

        if !missing.is_empty() {
            return Err(ReferenceError::Missing(missing));
        }
        Ok(documents)
    }
}

// ============================================================================
// 환경 변수
// ============================================================================

/// 환경 변수에 base64로 담긴 참조 문서
///
/// 배포 환경에서 파일을 마운트하기 어려울 때 사용합니다.
/// 생성 시점의 변수 값을 복사해 두므로, 테스트에서는 `from_vars()`로
/// 프로세스 환경을 건드리지 않고 만들 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// 현재 프로세스의 `NOTE{n}_CONTENT` 변수들을 읽습니다.
    pub fn from_env() -> Self {
        Self::from_vars(
            DocumentName::ALL
                .iter()
                .filter_map(|name| {
                    std::env::var(name.env_key())
                        .ok()
                        .map(|value| (name.env_key().to_string(), value))
                }),
        )
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ReferenceSource for EnvSource {
    fn describe(&self) -> String {
        "env:NOTE{1..5}_CONTENT".to_string()
    }

    fn load(&self) -> Result<Vec<ReferenceDocument>, ReferenceError> {
        let mut documents = Vec::new();
        let mut missing = Vec::new();
        let loaded_at = Utc::now();

        for name in DocumentName::ALL {
            let encoded = match self.vars.get(name.env_key()) {
                Some(value) if !value.trim().is_empty() => value.trim(),
                _ => {
                    missing.push(name);
                    continue;
                }
            };

            let bytes = STANDARD.decode(encoded).map_err(|e| ReferenceError::Decode {
                document: name,
                reason: format!("invalid base64 in {}: {}", name.env_key(), e),
            })?;
            let content = String::from_utf8(bytes).map_err(|e| ReferenceError::Decode {
                document: name,
                reason: format!("{} is not UTF-8: {}", name.env_key(), e),
            })?;

            documents.push(ReferenceDocument::new(name, content, loaded_at));
        }

        if !missing.is_empty() {
            return Err(ReferenceError::Missing(missing));
        }
        Ok(documents)
    }
}
