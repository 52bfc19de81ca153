use serde_json::{Map, Value};

/// Maximum outline entries kept from a summary response.
pub const MAX_OUTLINE_ITEMS: usize = 12;

/// Placeholder script line when the model returns nothing usable.
pub const EMPTY_SCRIPT_PLACEHOLDER: &str = "(대본 생성 결과가 비어있습니다)";

/// Recovers the JSON object in a model reply, tolerating prose or code
/// fences around it: everything from the first `{` to the last `}`. An
/// empty object counts as no JSON.
pub fn extract_json_object(output: &str) -> Option<Map<String, Value>> {
    let output = output.trim();
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(output[start..=end].trim()) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Model output is not valid JSON: {}", e);
            None
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Non-empty trimmed strings of a JSON array; anything else yields nothing.
fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_text)
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSummary {
    pub summary: String,
    pub outline: Vec<String>,
}

pub fn parse_summary(output: &str) -> ParsedSummary {
    let output = output.trim();

    let Some(data) = extract_json_object(output) else {
        return ParsedSummary {
            summary: output.to_string(),
            outline: Vec::new(),
        };
    };

    let summary = data.get("summary").map(value_text).unwrap_or_default();
    let mut outline = string_items(data.get("outline"));
    outline.truncate(MAX_OUTLINE_ITEMS);

    ParsedSummary { summary, outline }
}

pub fn parse_script(output: &str) -> Vec<String> {
    let output = output.trim();

    let content = match extract_json_object(output) {
        Some(data) => string_items(data.get("content")),
        None if !output.is_empty() => return vec![output.to_string()],
        None => Vec::new(),
    };

    if content.is_empty() {
        vec![EMPTY_SCRIPT_PLACEHOLDER.to_string()]
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_embedded_in_prose() {
        let output = "Here you go:\n```json\n{\"summary\": \"요약\", \"outline\": [\"a\"]}\n```";
        let parsed = parse_summary(output);
        assert_eq!(parsed.summary, "요약");
        assert_eq!(parsed.outline, vec!["a".to_string()]);
    }

    #[test]
    fn test_non_json_summary_falls_back_to_raw() {
        let parsed = parse_summary("  just prose  ");
        assert_eq!(parsed.summary, "just prose");
        assert!(parsed.outline.is_empty());
    }

    #[test]
    fn test_broken_json_falls_back_to_raw() {
        let parsed = parse_summary("{\"summary\": oops}");
        assert_eq!(parsed.summary, "{\"summary\": oops}");
    }

    #[test]
    fn test_empty_object_counts_as_no_json() {
        assert!(extract_json_object("{}").is_none());

        let parsed = parse_summary("{}");
        assert_eq!(parsed.summary, "{}");
        assert!(parsed.outline.is_empty());

        assert_eq!(parse_script(" {} "), vec!["{}"]);
    }

    #[test]
    fn test_outline_cleaned_and_capped() {
        let items: Vec<String> = (0..15).map(|i| format!("\"  item {}  \"", i)).collect();
        let output = format!(
            "{{\"summary\": \"s\", \"outline\": [\"\", \"   \", 7, {}]}}",
            items.join(",")
        );

        let parsed = parse_summary(&output);
        assert_eq!(parsed.outline.len(), MAX_OUTLINE_ITEMS);
        assert_eq!(parsed.outline[0], "7");
        assert_eq!(parsed.outline[1], "item 0");
    }

    #[test]
    fn test_outline_not_a_list() {
        let parsed = parse_summary("{\"summary\": \"s\", \"outline\": \"one\"}");
        assert!(parsed.outline.is_empty());
    }

    #[test]
    fn test_script_content() {
        let content = parse_script("{\"content\": [\"발표자 1: 안녕하세요\", \" \", \"발표자 2: 네\"]}");
        assert_eq!(content, vec!["발표자 1: 안녕하세요", "발표자 2: 네"]);
    }

    #[test]
    fn test_script_raw_fallback() {
        assert_eq!(parse_script("발표자 1: 그냥 텍스트"), vec!["발표자 1: 그냥 텍스트"]);
    }

    #[test]
    fn test_script_empty_placeholders() {
        assert_eq!(parse_script(""), vec![EMPTY_SCRIPT_PLACEHOLDER]);
        assert_eq!(parse_script("{\"content\": []}"), vec![EMPTY_SCRIPT_PLACEHOLDER]);
        assert_eq!(parse_script("{\"content\": \"x\"}"), vec![EMPTY_SCRIPT_PLACEHOLDER]);
    }
}
