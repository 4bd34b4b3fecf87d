//! # 참조 문서 개요(outline) 파서
//!
//! 참조 문서는 마크다운으로 작성되며, 이 모듈은 그 구조만 뽑아냅니다.
//! 마크다운 문법 처리는 `pulldown-cmark`의 이벤트 스트림에 맡깁니다.
//!
//! ```text
//! # 문서 제목            ← 무시
//! ## 섹션 제목           ← Section
//! ### 블록 제목          ← Block
//! > 인용문 본문           ← 단락 (인용 여부는 구분하지 않음)
//! - 목록 항목            ← Block::items()
//! ---                    ← 무시 (구분선)
//! <!-- 주석 -->          ← 무시
//! ```
//!
//! 의미 해석(연령대, 기준 범위 등)은 `tables` 모듈이 담당합니다.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// 문서 전체
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub sections: Vec<Section>,
}

/// `## ` 제목으로 시작하는 섹션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

/// `### ` 제목으로 시작하는 블록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub title: String,
    /// 단락 본문 (줄바꿈은 공백 하나로 이어짐)
    paragraphs: Vec<String>,
    /// 목록 항목
    items: Vec<String>,
}

impl Outline {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

impl Section {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn block(&self, title: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.title == title)
    }
}

impl Block {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            paragraphs: Vec::new(),
            items: Vec::new(),
        }
    }

    /// 본문 텍스트
    ///
    /// 한 단락 안의 줄은 공백 하나로, 단락끼리는 "\n\n"으로 잇습니다.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    /// `- `로 시작하는 목록 항목들
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

/// 지금 글자를 모으고 있는 곳
///
/// 제목 안의 글자는 제목으로, 목록 항목 안의 글자는 항목으로, 나머지는 단락으로 갑니다.
#[derive(Default)]
struct Cursor {
    heading: Option<(HeadingLevel, String)>,
    item: Option<String>,
    paragraph: Option<String>,
}

impl Cursor {
    fn buffer(&mut self) -> Option<&mut String> {
        self.heading
            .as_mut()
            .map(|(_, title)| title)
            .or(self.item.as_mut())
            .or(self.paragraph.as_mut())
    }
}

/// 마크다운 텍스트를 `Outline`으로 파싱합니다.
///
/// 실패하지 않습니다. 첫 `## ` 이전의 내용과 `### ` 이전의 섹션 본문은 버려집니다.
pub fn parse(text: &str) -> Outline {
    let mut sections: Vec<Section> = Vec::new();
    let mut cursor = Cursor::default();

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                cursor.heading = Some((level, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = cursor.heading.take() {
                    open_heading(&mut sections, level, title.trim());
                }
            }
            Event::Start(Tag::Item) => cursor.item = Some(String::new()),
            Event::End(TagEnd::Item) => {
                if let Some(item) = cursor.item.take() {
                    push_to_block(&mut sections, |block| &mut block.items, item);
                }
            }
            // 느슨한 목록(항목 사이에 빈 줄)은 항목 안에 단락이 생기므로 항목 쪽에 둡니다.
            Event::Start(Tag::Paragraph) if cursor.item.is_none() => {
                cursor.paragraph = Some(String::new());
            }
            Event::End(TagEnd::Paragraph) if cursor.item.is_none() => {
                if let Some(paragraph) = cursor.paragraph.take() {
                    push_to_block(&mut sections, |block| &mut block.paragraphs, paragraph);
                }
            }
            Event::Text(fragment) | Event::Code(fragment) => {
                if let Some(buffer) = cursor.buffer() {
                    buffer.push_str(&fragment);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(buffer) = cursor.buffer() {
                    buffer.push(' ');
                }
            }
            // 주석(Html), 구분선(Rule), 인용 시작/끝 등은 구조에 영향이 없습니다.
            _ => {}
        }
    }

    Outline { sections }
}

/// `##`는 새 섹션, `###`는 마지막 섹션의 새 블록. 나머지 제목은 무시합니다.
fn open_heading(sections: &mut Vec<Section>, level: HeadingLevel, title: &str) {
    match level {
        HeadingLevel::H2 => sections.push(Section::new(title)),
        HeadingLevel::H3 => {
            if let Some(section) = sections.last_mut() {
                section.blocks.push(Block::new(title));
            }
        }
        _ => {}
    }
}

fn push_to_block(
    sections: &mut [Section],
    field: impl FnOnce(&mut Block) -> &mut Vec<String>,
    text: String,
) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if let Some(block) = sections.last_mut().and_then(|s| s.blocks.last_mut()) {
        field(block).push(text.to_string());
    }
}
