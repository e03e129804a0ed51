use serde_json::Value;

use super::literal::parse_literal;

/// One element of a list-shaped raw value
#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    Leaf(String),
    Row(Vec<String>),
}

/// Shape of a raw cell, resolved once before any field transform runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RawShape {
    /// Single-line string
    Text(String),
    /// String spanning several lines (tab/newline delimited table)
    Table(String),
    /// List whose elements are all scalars
    List(Vec<String>),
    /// List with at least one inner list
    NestedList(Vec<RawItem>),
    Unsupported(&'static str),
}

impl RawShape {
    /// Pre-parse `value` and classify it
    pub fn of(value: &Value) -> Self {
        match preparse(value) {
            Some(parsed) => Self::detect(&parsed),
            None => Self::detect(value),
        }
    }

    pub fn detect(value: &Value) -> Self {
        match value {
            Value::String(text) => {
                let text = text.replace("\r\n", "\n");
                if text.contains('\n') {
                    RawShape::Table(text)
                } else {
                    RawShape::Text(text)
                }
            }
            Value::Array(items) if items.iter().any(Value::is_array) => RawShape::NestedList(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Array(row) => RawItem::Row(row.iter().map(leaf_text).collect()),
                        other => RawItem::Leaf(leaf_text(other)),
                    })
                    .collect(),
            ),
            Value::Array(items) => RawShape::List(items.iter().map(leaf_text).collect()),
            Value::Object(_) => RawShape::Unsupported("mapping"),
            Value::Number(_) => RawShape::Unsupported("number"),
            Value::Bool(_) => RawShape::Unsupported("boolean"),
            Value::Null => RawShape::Unsupported("null"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RawShape::Text(_) => "text",
            RawShape::Table(_) => "table",
            RawShape::List(_) => "list",
            RawShape::NestedList(_) => "nested list",
            RawShape::Unsupported(name) => name,
        }
    }

    /// The first string reachable at depth two or less: the text itself, the
    /// first list element, or the first cell of the first nested row
    pub fn first_leaf(&self) -> Option<&str> {
        match self {
            RawShape::Text(text) | RawShape::Table(text) => Some(text),
            RawShape::List(items) => items.first().map(String::as_str),
            RawShape::NestedList(items) => match items.first()? {
                RawItem::Leaf(leaf) => Some(leaf),
                RawItem::Row(row) => row.first().map(String::as_str),
            },
            RawShape::Unsupported(_) => None,
        }
    }
}

/// Recover structure from a string that holds a printed literal.
///
/// `[`-prefixed strings are parsed as list literals; `'[`-prefixed strings
/// are a quoted literal wrapping one and yield the inner text. Returns `None`
/// when the value is not such a string or does not parse.
pub fn preparse(value: &Value) -> Option<Value> {
    let text = value.as_str()?.trim_start();
    if text.starts_with('[') {
        return parse_literal(text);
    }
    if text.starts_with("'[") {
        return match parse_literal(text)? {
            inner @ Value::String(_) => Some(inner),
            _ => None,
        };
    }
    None
}

/// String form of a scalar list element
pub fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_shapes() {
        assert_eq!(RawShape::detect(&json!("a")), RawShape::Text("a".into()));
        assert_eq!(RawShape::detect(&json!("a\r\nb")), RawShape::Table("a\nb".into()));
        assert_eq!(RawShape::detect(&json!(["a", 1])), RawShape::List(vec!["a".into(), "1".into()]));
        assert_eq!(
            RawShape::detect(&json!([["a", "b"], "c"])),
            RawShape::NestedList(vec![
                RawItem::Row(vec!["a".into(), "b".into()]),
                RawItem::Leaf("c".into()),
            ])
        );
        assert_eq!(RawShape::detect(&json!({"k": 1})).name(), "mapping");
    }

    #[test]
    fn test_preparse_recovers_printed_lists() {
        let shape = RawShape::of(&json!("[['最早上架时间：2025-09-08']]"));
        assert_eq!(shape.first_leaf(), Some("最早上架时间：2025-09-08"));
        assert!(matches!(shape, RawShape::NestedList(_)));
    }

    #[test]
    fn test_preparse_keeps_unparseable_strings() {
        assert_eq!(preparse(&json!("[not a literal")), None);
        assert_eq!(RawShape::of(&json!("[broken")), RawShape::Text("[broken".into()));
        assert_eq!(preparse(&json!("plain")), None);
    }

    #[test]
    fn test_quoted_literal_yields_inner_text() {
        assert_eq!(preparse(&json!("'[a]'")), Some(json!("[a]")));
    }

    #[test]
    fn test_leaf_text_formats_scalars() {
        assert_eq!(leaf_text(&json!(3)), "3");
        assert_eq!(leaf_text(&json!(true)), "True");
        assert_eq!(leaf_text(&json!(null)), "None");
    }
}
