//! # 텍스트 유틸리티
//!
//! 참조 문서의 멘트 템플릿을 실제 문장으로 바꾸는 함수들입니다.
//!
//! - `render()`: `[이름]`, `[연령대]`, `[항목]` 자리표시자 치환 + 조사 처리
//! - `resolve_particles()`: `이(가)`, `을(를)` 같은 조사 표기를 앞 글자의 받침에 맞게 정리
//! - `join_items()` / `join_with_and()`: 항목 이름 나열
//! - `count_chars()`: 텍스트의 문자 수 계산

/// 이름 자리표시자
pub const NAME: &str = "[이름]";
/// 연령대 자리표시자
pub const AGE_BRACKET: &str = "[연령대]";
/// 항목 목록 자리표시자
pub const ITEMS: &str = "[항목]";

/// (표기, 받침 있을 때, 받침 없을 때)
const PARTICLES: [(&str, &str, &str); 5] = [
    ("이(가)", "이", "가"),
    ("을(를)", "을", "를"),
    ("은(는)", "은", "는"),
    ("과(와)", "과", "와"),
    ("(으)로", "으로", "로"),
];

/// 한글 음절의 시작 코드 ('가')
const HANGUL_START: u32 = 0xAC00;
/// 한글 음절의 끝 코드 ('힣')
const HANGUL_END: u32 = 0xD7A3;
/// 종성(받침)의 개수 (받침 없음 포함)
const FINAL_COUNT: u32 = 28;
/// 종성 'ㄹ'의 인덱스
const FINAL_RIEUL: u32 = 8;

/// 템플릿의 자리표시자를 치환하고 조사를 정리합니다.
///
/// # 예시
/// ```text
/// render("[이름]님은(는) [항목]이(가) 높습니다.", &[("[이름]", "김민수"), ("[항목]", "수은")])
///   → "김민수님은 수은이 높습니다."
/// ```
pub fn render(template: &str, bindings: &[(&str, &str)]) -> String {
    // 자리표시자를 먼저 모두 치환한 뒤에 조사를 정리해야
    // "[항목]이(가)"처럼 자리표시자 바로 뒤에 붙은 조사도 올바르게 처리됩니다.
    let replaced = bindings
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        });
    resolve_particles(&replaced)
}

/// `이(가)` 같은 조사 표기를 바로 앞 글자에 맞는 조사 하나로 바꿉니다.
pub fn resolve_particles(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    // 'outer: 루프 레이블. 안쪽 for에서 바깥 while을 바로 continue 하기 위해 사용합니다.
    'outer: while let Some(c) = rest.chars().next() {
        for (marker, with_final, without_final) in PARTICLES {
            if let Some(after) = rest.strip_prefix(marker) {
                let prev = out.chars().last();
                let particle = if marker == "(으)로" {
                    if takes_euro(prev) { with_final } else { without_final }
                } else if has_final_consonant(prev) {
                    with_final
                } else {
                    without_final
                };
                out.push_str(particle);
                rest = after;
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// 앞 글자에 받침이 있는지 여부
///
/// 한글이 아닌 글자(숫자, 영문, 괄호 등)나 앞 글자가 없는 경우에는
/// 받침이 있는 것으로 봅니다.
fn has_final_consonant(prev: Option<char>) -> bool {
    match prev.and_then(hangul_final) {
        Some(jong) => jong != 0,
        None => true,
    }
}

/// "(으)로"에서 "으로"를 써야 하는지 여부 (받침이 있고 'ㄹ'이 아닐 때)
fn takes_euro(prev: Option<char>) -> bool {
    match prev.and_then(hangul_final) {
        Some(jong) => jong != 0 && jong != FINAL_RIEUL,
        None => true,
    }
}

/// 한글 음절이면 종성 인덱스를, 아니면 None을 돌려줍니다.
fn hangul_final(c: char) -> Option<u32> {
    let code = c as u32;
    if (HANGUL_START..=HANGUL_END).contains(&code) {
        Some((code - HANGUL_START) % FINAL_COUNT)
    } else {
        None
    }
}

/// 항목 이름들을 ", "로 잇습니다. 예: "수은, 납"
pub fn join_items<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 항목 이름들을 "과(와)"로 잇습니다. 예: "수은과 납" (조사는 `render()`가 정리)
pub fn join_with_and<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("과(와) ")
}

/// 텍스트의 문자 수를 계산합니다.
///
/// 참고: `text.len()`은 바이트 수를 반환합니다 (한글 1자 = 3바이트).
pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particles_follow_final_consonant() {
        assert_eq!(resolve_particles("수은이(가) 높고"), "수은이 높고");
        assert_eq!(resolve_particles("바륨과(와) 칼슘"), "바륨과 칼슘");
        assert_eq!(resolve_particles("아연이(가)"), "아연이");
        assert_eq!(resolve_particles("구리이(가) 낮고"), "구리가 낮고");
        assert_eq!(resolve_particles("마그네슘을(를)"), "마그네슘을");
        assert_eq!(resolve_particles("나트륨은(는)"), "나트륨은");
        assert_eq!(resolve_particles("크롬과(와) 셀레늄"), "크롬과 셀레늄");
        assert_eq!(resolve_particles("니켈(으)로"), "니켈로");
        assert_eq!(resolve_particles("수은(으)로"), "수은으로");
        assert_eq!(resolve_particles("비스무트(으)로"), "비스무트로");
    }

    #[test]
    fn non_hangul_counts_as_final_consonant() {
        assert_eq!(resolve_particles("B12이(가)"), "B12이");
        assert_eq!(resolve_particles("이(가) 맨 앞"), "이 맨 앞");
    }

    #[test]
    fn render_substitutes_then_resolves() {
        let text = render(
            "[이름]님은(는) [연령대] 기준으로 [항목]이(가) 높습니다.",
            &[(NAME, "김민지"), (AGE_BRACKET, "20세 이상"), (ITEMS, "납")],
        );
        assert_eq!(text, "김민지님은 20세 이상 기준으로 납이 높습니다.");
    }

    #[test]
    fn joins_items() {
        assert_eq!(join_items(&["수은", "납"]), "수은, 납");
        assert_eq!(resolve_particles(&join_with_and(&["수은", "카드뮴", "바륨"])), "수은과 카드뮴과 바륨");
        assert_eq!(resolve_particles(&join_with_and(&["비소", "납"])), "비소와 납");
        assert_eq!(join_with_and::<&str>(&[]), "");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(count_chars("모발검사"), 4);
        assert_eq!("모발검사".len(), 12);
    }
}
