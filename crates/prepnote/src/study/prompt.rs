//! Prompt construction for summaries and presentation scripts.
//!
//! Prompts are written in Korean; the model is asked to answer with a single
//! JSON object that `response` then picks apart.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::study::{Audience, SummaryLength, Tone};

/// Maximum number of in-document source candidates passed to the model.
pub const MAX_INTERNAL_SOURCES: usize = 12;

/// Maximum number of search query suggestions passed to the model.
pub const MAX_SEARCH_QUERIES: usize = 6;

const KEYWORD_WINDOW_CHARS: usize = 1200;
const MAX_KEYWORDS: usize = 8;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s)]+").unwrap());

static SOURCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:참고문헌|참고 자료|출처|References|Bibliography|Source)[:：].*").unwrap()
});

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{4,}|[가-힣]{2,}").unwrap());

const STOP_WORDS: &[&str] = &[
    "그리고", "하지만", "따라서", "또한", "이것", "저것", "대한", "관련", "있다", "한다",
];

/// A system/user message pair for one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn audience_profile(audience: Audience) -> &'static str {
    match audience {
        Audience::Elementary => {
            "초등학생: 아주 쉬운 말, 짧은 문장. 어려운 용어 금지.\n\
             영어(뜻) 형식으로 괄호 해석 필수. 예: apple(사과)\n\
             예시는 1~2개만."
        }
        Audience::Middle => {
            "중학생: 쉬운 말 + 핵심 개념 중심.\n\
             영어(뜻) 괄호 해석을 자주 붙이되 과도하게 길게 설명하지 말 것."
        }
        Audience::High => {
            "고등학생: 개념+원리까지. 필요한 용어는 짧게 정의.\n\
             영어는 등장 시 1회 정도만 (뜻) 병기."
        }
        Audience::College => "대학생: 구조적/논리적 정리. 핵심 주장-근거-결론 흐름.",
        Audience::Office => {
            "직장인: 결론/의사결정 중심. 핵심 요지 먼저.\n\
             실무 적용, 리스크/한계, 액션 아이템을 명확히.\n\
             회의/보고서 형태(불릿, 짧은 문장)."
        }
    }
}

fn length_profile(length: SummaryLength) -> &'static str {
    match length {
        SummaryLength::Short => "짧게: 핵심만.",
        SummaryLength::Medium => "보통: 공부/발표에 바로 쓸 수 있을 정도.",
        SummaryLength::Long => "길게: 이해를 돕는 설명까지 포함.",
    }
}

fn tone_description(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "존댓말/발표체/깔끔하게",
        Tone::Friendly => "부드럽고 친근한 존댓말",
        Tone::Energetic => "또렷하고 자신감 있게(과장 금지)",
    }
}

/// URLs and citation lines already present in the document, in order of
/// first appearance, deduplicated.
pub fn extract_internal_sources(text: &str) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        if !sources.iter().any(|s| s == candidate) {
            sources.push(candidate.to_string());
        }
    };

    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim();
        if url.chars().count() > 10 {
            push(url);
        }
    }

    for m in SOURCE_LINE_RE.find_iter(text) {
        let line = m.as_str().trim();
        let len = line.chars().count();
        if len > 5 && len < 300 {
            push(line);
        }
    }

    sources.truncate(MAX_INTERNAL_SOURCES);
    sources
}

/// Frequent keywords from the start of the document, most frequent first;
/// ties keep first-occurrence order.
fn top_keywords(text: &str) -> Vec<String> {
    let head = truncate_chars(text, KEYWORD_WINDOW_CHARS);

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for m in KEYWORD_RE.find_iter(head) {
        let token = m.as_str().to_lowercase();
        if STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        let count = counts.entry(token.clone()).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    // Stable sort keeps first-occurrence order among equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(MAX_KEYWORDS);
    order
}

/// Search queries the model can suggest when the document cites nothing.
pub fn build_search_queries(title: &str, text: &str, audience: Audience) -> Vec<String> {
    let base = match title.trim() {
        "" => "주제",
        t => t,
    };
    let keywords = top_keywords(text);

    let mut queries = Vec::new();
    if let Some(first) = keywords.first() {
        queries.push(format!("{} {} 개념 정리", base, first));
        if let Some(second) = keywords.get(1) {
            queries.push(format!("{} {} {} 비교", base, first, second));
        }
        if let Some(third) = keywords.get(2) {
            queries.push(format!("{} {} 정의", base, third));
        }
        queries.push(format!("{} 발표 자료 요약", base));
        queries.push(format!("{} 참고문헌", base));
    } else {
        queries.push(format!("{} 개념 정리", base));
        queries.push(format!("{} 발표 자료", base));
        queries.push(format!("{} 참고문헌", base));
    }

    if matches!(audience, Audience::Elementary | Audience::Middle) {
        queries.insert(0, format!("{} 쉬운 설명", base));
    }

    queries.truncate(MAX_SEARCH_QUERIES);
    queries
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

const SUMMARY_SYSTEM_HEADER: &str = "너는 '공부/발표/회의에 바로 쓰는 자료 정리' 전문가다.
반드시 아래 규칙을 지켜 출력한다.";

const SUMMARY_SYSTEM_RULES: &str = "[공통 규칙]
- 한국어로 작성
- 자료에 없는 내용은 만들지 말 것(추측 금지)
- 문장을 짧고 명확하게
- \"대본\"처럼 말하지 말고, '정리본' 문체로 작성
- 초/중학생 대상이면 영어 단어는 apple(사과) 형태로 병기
- 표는 마크다운 표로 작성
- 출력은 반드시 JSON만(그 외 텍스트 금지)

[출처 처리]
- 문서 내부에 URL/참고문헌/출처 표기가 있으면 마지막에 '문서 내 출처'로 모아서 정리
- 문서 내부 출처가 없다면 '출처 찾기용 검색어' 제안(링크 지어내지 말 것)

[중요]
- 직장인(office) 대상일 때만 One-pager 섹션을 추가한다.";

const SUMMARY_SECTIONS: &str = "[summary 섹션 구조(이 순서/제목 그대로)]
1) 한눈에 요약(핵심 5~8줄)

2) 내용 정리 표(마크다운 표)
| 개념 | 정의 | 예시 | 주의점 |
|---|---|---|---|
- 핵심 개념 4~7개

3) 핵심 용어/키워드(정의 1줄씩, 5~10개)

4) 예상 질문(난이도별)
- 쉬움 2~3개
- 보통 2~3개
- 어려움 2~3개
(각각 질문 + 한 줄 답)

5) (있으면) 문서 내 출처 모음
   (없으면) 출처 찾기용 검색어(3~6개)";

const ONE_PAGER_SECTION: &str = "6) 회의용 1페이지 요약(One-pager)
- 목적
- 핵심 결론(1~3줄)
- 주요 근거(3~5개 bullet)
- 리스크/주의사항(2~4개 bullet)
- 다음 액션 아이템(To-do)(3~5개, 주어+동사)";

const OUTLINE_RULES: &str = "[outline 규칙]
- 7~10개 권장
- 서론-본론-결론 흐름
- 표(내용 정리)와 대응되게 중간 파트 구성";

pub fn summary_prompt(
    title: &str,
    text: &str,
    length: SummaryLength,
    audience: Audience,
    max_input_chars: usize,
) -> Prompt {
    let system = format!(
        "{}\n\n[대상/난이도]\n{}\n\n{}",
        SUMMARY_SYSTEM_HEADER,
        audience_profile(audience),
        SUMMARY_SYSTEM_RULES
    );

    let sources = extract_internal_sources(text);
    let queries = build_search_queries(title, text, audience);
    let one_pager = if audience == Audience::Office {
        ONE_PAGER_SECTION
    } else {
        ""
    };

    let user = format!(
        r#"[제목]
{title}

[분량]
{length}

[원문]
{body}

[문서 내에서 발견한 출처 후보(있을 때만 참고)]
{sources}

[출처 찾기용 검색어 후보(출처가 없을 때 활용)]
{queries}

[반드시 지켜야 할 출력 JSON 형식]
{{
  "summary": "아래 섹션 구조를 그대로 포함한 정리본 텍스트(줄바꿈 포함 가능)",
  "outline": ["슬라이드 제목 1", "슬라이드 제목 2", "..."]
}}

{sections}

{one_pager}

{outline_rules}"#,
        title = title,
        length = length_profile(length),
        body = truncate_chars(text, max_input_chars),
        sources = json_list(&sources),
        queries = json_list(&queries),
        sections = SUMMARY_SECTIONS,
        one_pager = one_pager,
        outline_rules = OUTLINE_RULES,
    );

    Prompt { system, user }
}

pub fn script_prompt(
    title: &str,
    summary_text: &str,
    outline: &[String],
    tone: Tone,
    speaker_count: u8,
    minutes: u8,
    max_input_chars: usize,
) -> Prompt {
    let system = format!(
        r#"너는 '실제로 발표 가능한 대본'을 만드는 조교다.
반드시 아래 규칙을 지켜라.

[공통]
- 한국어
- 톤: {tone}
- 목표 시간: {minutes}분 (시간에 맞게 분량 조절)
- 발표자 {speakers}명 → 발표자별로 자연스럽게 역할 분담
- 각 대본은 반드시 "발표자 N:"으로 시작
- 발표 흐름: 도입(관심 끌기) → 목차 안내 → 핵심 내용(정리) → 요약/결론 → 마무리 멘트
- 슬라이드/목차가 있으면 슬라이드 단위로 전환 멘트 포함(예: "다음은 ~입니다")
- 과장/환각 금지: 요약 텍스트 밖의 사실을 만들어내지 말 것
- 출력은 JSON만"#,
        tone = tone_description(tone),
        minutes = minutes,
        speakers = speaker_count,
    );

    let outline_text = if outline.is_empty() {
        "(없음: 요약 텍스트 구조를 기준으로 자연스럽게 목차를 만들어도 됨)".to_string()
    } else {
        outline
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = format!(
        r#"[발표 제목]
{title}

[권장 목차/슬라이드]
{outline}

[요약/원문 기반 텍스트]
{body}

[출력 JSON 형식]
{{
  "content": [
    "발표자 1: ...",
    "발표자 2: ..."
  ]
}}

[추가 요구]
- {minutes}분에 맞게 핵심만 남기되, 뜬금없는 생략 없이 '설명 → 예시 한 번 → 정리' 리듬 유지
- 발표자가 여러 명이면: 중복 설명 금지, 각자 구간이 명확해야 함"#,
        title = title,
        outline = outline_text,
        body = truncate_chars(summary_text, max_input_chars),
        minutes = minutes,
    );

    Prompt { system, user }
}
