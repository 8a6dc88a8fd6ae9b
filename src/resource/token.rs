// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred reference tokens
//!
//! Values that only exist once the deployment engine has created a resource
//! (identifiers, generated addresses) are written as `${<logical-name>.<attribute>}`
//! tokens. Tokens may be embedded in longer strings. The assembler verifies that
//! every token names a registered handle exposing that output.

use serde_json::Value;

/// One `${resource.attribute}` occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenRef {
    pub resource: String,
    pub attribute: String,
}

/// Render a token for `resource.attribute`
pub fn reference(resource: impl AsRef<str>, attribute: &str) -> String {
    format!("${{{}.{}}}", resource.as_ref(), attribute)
}

/// Every token embedded in `text`, in order of appearance
///
/// Malformed fragments (no closing brace, no dot) are not tokens and are skipped.
pub fn scan(text: &str) -> Vec<TokenRef> {
    let mut found = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        if let Some((resource, attribute)) = after[..end].split_once('.') {
            if !resource.is_empty() && !attribute.is_empty() {
                found.push(TokenRef {
                    resource: resource.to_string(),
                    attribute: attribute.to_string(),
                });
            }
        }
        rest = &after[end + 1..];
    }

    found
}

/// Every token embedded anywhere in a JSON document (keys and string values)
pub fn scan_value(value: &Value) -> Vec<TokenRef> {
    let mut found = Vec::new();
    collect(value, &mut found);
    found
}

fn collect(value: &Value, found: &mut Vec<TokenRef>) {
    match value {
        Value::String(s) => found.extend(scan(s)),
        Value::Array(items) => items.iter().for_each(|item| collect(item, found)),
        Value::Object(map) => {
            for (key, item) in map {
                found.extend(scan(key));
                collect(item, found);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_format() {
        assert_eq!(reference("network-vpc", "id"), "${network-vpc.id}");
    }

    #[test]
    fn test_scan_embedded_tokens() {
        let url = format!(
            "https://{}.execute-api.eu-west-1.amazonaws.com/{}/",
            reference("gateway-api", "id"),
            reference("gateway-api", "stage")
        );
        assert_eq!(
            scan(&url),
            vec![
                TokenRef {
                    resource: "gateway-api".into(),
                    attribute: "id".into()
                },
                TokenRef {
                    resource: "gateway-api".into(),
                    attribute: "stage".into()
                },
            ]
        );
    }

    #[test]
    fn test_scan_skips_malformed() {
        assert!(scan("${no-dot} ${unterminated.x").is_empty());
        assert!(scan("$plain {text}").is_empty());
        assert!(scan("${.x} ${y.}").is_empty());
    }

    #[test]
    fn test_scan_value_walks_document() {
        let doc = json!({
            "SubnetIds": [reference("a", "id"), reference("b", "id")],
            "Nested": { "Target": reference("c", "arn"), "Port": 80 }
        });
        let mut names: Vec<_> = scan_value(&doc).into_iter().map(|t| t.resource).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
