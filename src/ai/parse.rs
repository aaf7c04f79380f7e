use serde::de::DeserializeOwned;

/// Parse a model response as JSON, tolerating a Markdown code fence
/// around the payload.
pub fn parse_json_response<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    serde_json::from_str(strip_code_fence(raw))
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") with the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        summary: String,
    }

    #[test]
    fn parses_bare_json() {
        let parsed: Payload = parse_json_response(r#"{"summary": "hi"}"#).unwrap();
        assert_eq!(parsed.summary, "hi");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"summary\": \"hi\"}\n```";
        let parsed: Payload = parse_json_response(raw).unwrap();
        assert_eq!(parsed.summary, "hi");
    }

    #[test]
    fn parses_fence_without_info_string() {
        let raw = "```\n{\"summary\": \"hi\"}\n```";
        let parsed: Payload = parse_json_response(raw).unwrap();
        assert_eq!(parsed.summary, "hi");
    }

    #[test]
    fn parses_with_surrounding_whitespace() {
        let raw = "\n\n  ```json\n{\"summary\": \"hi\"}\n```  \n";
        let parsed: Payload = parse_json_response(raw).unwrap();
        assert_eq!(parsed.summary, "hi");
    }

    #[test]
    fn rejects_non_json() {
        let result: serde_json::Result<Payload> = parse_json_response("Sure! Here you go.");
        assert!(result.is_err());
    }
}
