//! `{{name}}` placeholder substitution for step text.
//!
//! # Syntax
//!
//! - `{{name}}` or `{{ name }}` - replaced with the variable value
//! - `{{{name}}}` - same as `{{name}}`
//! - unresolved names render as the empty string
//! - a `{{` without a closing `}}` is kept literally

/// A segment of a step text template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder: {{name}}
    Variable(String),
}

/// Parse a string containing `{{name}}` placeholders.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current_literal = String::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };

        current_literal.push_str(&rest[..start]);

        let mut name = &after_open[..end];
        let mut consumed = start + 2 + end + 2;
        // Triple braces: {{{name}}}
        if let Some(stripped) = name.strip_prefix('{') {
            name = stripped;
            if rest[consumed..].starts_with('}') {
                consumed += 1;
            }
        }

        if !current_literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
        }
        segments.push(Segment::Variable(name.trim().to_string()));

        rest = &rest[consumed..];
    }

    current_literal.push_str(rest);
    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Render a template, resolving each placeholder through `lookup`.
pub fn render(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());

    for segment in parse_template(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable(name) => {
                if let Some(value) = lookup(&name) {
                    result.push_str(&value);
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_literal_only() {
        let result = parse_template("deploy to prod");
        assert_eq!(result, vec![Segment::Literal("deploy to prod".to_string())]);
    }

    #[test]
    fn parse_variable_with_surrounding_text() {
        let result = parse_template("deploy to {{ENV}}!");
        assert_eq!(
            result,
            vec![
                Segment::Literal("deploy to ".to_string()),
                Segment::Variable("ENV".to_string()),
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn parse_trims_whitespace_in_names() {
        let result = parse_template("{{ ENV }}");
        assert_eq!(result, vec![Segment::Variable("ENV".to_string())]);
    }

    #[test]
    fn parse_triple_braces() {
        let result = parse_template("a{{{ENV}}}b");
        assert_eq!(
            result,
            vec![
                Segment::Literal("a".to_string()),
                Segment::Variable("ENV".to_string()),
                Segment::Literal("b".to_string()),
            ]
        );
    }

    #[test]
    fn parse_unclosed_placeholder_is_literal() {
        let result = parse_template("value {{ENV");
        assert_eq!(result, vec![Segment::Literal("value {{ENV".to_string())]);
    }

    #[test]
    fn parse_adjacent_variables() {
        let result = parse_template("{{a}}{{b}}");
        assert_eq!(
            result,
            vec![
                Segment::Variable("a".to_string()),
                Segment::Variable("b".to_string()),
            ]
        );
    }

    #[test]
    fn parse_empty_string() {
        assert!(parse_template("").is_empty());
    }

    #[test]
    fn render_substitutes_known_names() {
        let vars = vars(&[("ENV", "prod")]);
        let out = render("deploy to {{ENV}}", |k| vars.get(k).cloned());
        assert_eq!(out, "deploy to prod");
    }

    #[test]
    fn render_unknown_names_as_empty() {
        let vars = vars(&[]);
        let out = render("deploy to {{ENV}} now", |k| vars.get(k).cloned());
        assert_eq!(out, "deploy to  now");
    }

    #[test]
    fn render_leaves_single_braces_alone() {
        let vars = vars(&[("x", "1")]);
        let out = render("{x} and {{x}}", |k| vars.get(k).cloned());
        assert_eq!(out, "{x} and 1");
    }
}
