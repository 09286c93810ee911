//! Untyped OpenStep plist values.

use std::collections::BTreeMap;

use indexmap::IndexMap;

/// A dictionary as it appears in the text, in source order.
pub type Dict = IndexMap<String, Value>;

/// Unmodelled keys of a typed record. Sorted, which is also the order Xcode
/// writes object keys in.
pub type Fields = BTreeMap<String, Value>;

/// A plist value. The pbxproj dialect has no numbers or booleans: `1`, `YES`
/// and `<group>` are all strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dictionary",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Characters the parser accepts in an unquoted string.
pub(crate) fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-')
}

/// `true` if `s` is written without quotes. Narrower than what the parser
/// accepts: Xcode quotes anything containing `-`.
pub(crate) fn is_bare(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.'))
        && !s.contains("//")
        && !s.contains("/*")
}

/// Render `s` as a plist string token, quoting and escaping when needed.
pub(crate) fn quote(s: &str) -> String {
    if is_bare(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
