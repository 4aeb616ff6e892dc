//! URI templates for parameterised resources.
//!
//! A template such as `greeting://{name}` is compiled into an anchored
//! pattern where every `{placeholder}` captures one or more characters other
//! than `/` and the surrounding text must match literally.

use crate::mcp::errors::{McpError, McpResult};
use fancy_regex::Regex;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug)]
pub struct UriTemplate {
    raw: String,
    pattern: Regex,
    params: Vec<String>,
}

impl UriTemplate {
    /// Compile a URI template
    #[inline]
    pub fn parse(template: &str) -> McpResult<Self> {
        let invalid = |message: String| McpError::InvalidTemplate {
            template: template.to_string(),
            message,
        };

        let mut pattern = String::from("^");
        let mut params: Vec<String> = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find(['{', '}']) {
            let (literal, tail) = rest.split_at(open);
            if tail.starts_with('}') {
                return Err(invalid("unmatched '}'".to_string()));
            }
            pattern.push_str(&fancy_regex::escape(literal));

            let close = tail
                .find('}')
                .ok_or_else(|| invalid("unclosed '{'".to_string()))?;
            let name = tail.get(1..close).unwrap_or_default();
            if name.is_empty() {
                return Err(invalid("empty placeholder".to_string()));
            }
            if !is_identifier(name) {
                return Err(invalid(format!("placeholder '{}' is not an identifier", name)));
            }
            if params.iter().any(|p| p == name) {
                return Err(invalid(format!("duplicate placeholder '{}'", name)));
            }

            pattern.push_str("(?P<");
            pattern.push_str(name);
            pattern.push_str(">[^/]+)");
            params.push(name.to_string());
            rest = tail.get(close + 1..).unwrap_or_default();
        }
        pattern.push_str(&fancy_regex::escape(rest));
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            raw: template.to_string(),
            pattern,
            params,
        })
    }

    /// Match a concrete URI, returning the placeholder values on success
    #[inline]
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let captures = self.pattern.captures(uri).ok().flatten()?;

        let mut values = HashMap::with_capacity(self.params.len());
        for name in &self.params {
            let value = captures.name(name)?;
            values.insert(name.clone(), value.as_str().to_string());
        }
        Some(values)
    }

    /// Placeholder names in template order
    #[inline]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for UriTemplate {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_template_extracts_name() {
        let template = UriTemplate::parse("greeting://{name}").expect("template parses");

        let values = template.matches("greeting://World").expect("uri matches");
        assert_eq!(values.get("name").map(String::as_str), Some("World"));
        assert_eq!(template.params(), ["name".to_string()]);
    }

    #[test]
    fn placeholder_does_not_cross_segments() {
        let template = UriTemplate::parse("greeting://{name}").expect("template parses");

        assert!(template.matches("greeting://a/b").is_none());
        assert!(template.matches("greeting://").is_none());
        assert!(template.matches("farewell://World").is_none());
    }

    #[test]
    fn literal_text_is_escaped() {
        let template = UriTemplate::parse("file://docs.v1/{page}").expect("template parses");

        assert!(template.matches("file://docs.v1/intro").is_some());
        assert!(template.matches("file://docsXv1/intro").is_none());
    }

    #[test]
    fn multiple_placeholders() {
        let template =
            UriTemplate::parse("users://{org}/members/{user_id}").expect("template parses");

        let values = template
            .matches("users://acme/members/42")
            .expect("uri matches");
        assert_eq!(values.len(), 2);
        assert_eq!(values["org"], "acme");
        assert_eq!(values["user_id"], "42");
    }

    #[test]
    fn values_are_not_percent_decoded() {
        let template = UriTemplate::parse("greeting://{name}").expect("template parses");

        let values = template
            .matches("greeting://Jane%20Doe")
            .expect("uri matches");
        assert_eq!(values["name"], "Jane%20Doe");
    }

    #[test]
    fn template_without_placeholders_matches_exactly() {
        let template = UriTemplate::parse("config://app").expect("template parses");

        assert!(template.matches("config://app").is_some_and(|v| v.is_empty()));
        assert!(template.matches("config://app2").is_none());
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in [
            "greeting://{name",
            "greeting://name}",
            "greeting://{}",
            "greeting://{first name}",
            "greeting://{9lives}",
            "pair://{a}/{a}",
        ] {
            let result = UriTemplate::parse(bad);
            assert!(
                matches!(result, Err(McpError::InvalidTemplate { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn display_round_trips_source() {
        let template = UriTemplate::parse("greeting://{name}").expect("template parses");
        assert_eq!(template.to_string(), "greeting://{name}");
        assert_eq!(template.as_str(), "greeting://{name}");
    }
}
