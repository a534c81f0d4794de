//! # Document Paths
//!
//! Dot/bracket addressing into a document tree: field names are joined by
//! `.`, sequence positions are written `[i]`, and the empty path renders
//! as `root`. For example `steps[3].retry_policy.max_attempts`.
//!
//! Both the Safety Guard (which builds paths while walking) and the
//! structural normalizer (which converts JSON pointers reported by the
//! schema matcher) render through [`DocPath`], so the two error sources
//! address nodes identically.

use std::fmt;

use serde_json::Value;

/// One step from a container to a child value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence position.
    Index(usize),
}

/// A path from the document root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath(Vec<PathSegment>);

impl DocPath {
    /// The empty path, addressing the document itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this path addresses the document itself.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Append a mapping key.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(PathSegment::Key(key.into()));
    }

    /// Append a sequence position.
    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    /// Remove the innermost segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Return a new path extended by one mapping key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push_key(key);
        next
    }

    /// Convert an RFC 6901 JSON pointer into a document path.
    ///
    /// A pointer token is ambiguous on its own (`"0"` may be a key or a
    /// position), so the document is walked alongside: a token that lands
    /// on a sequence and parses as an integer becomes an index, everything
    /// else stays a key. Once the walk leaves the document (the pointer
    /// addresses something absent), remaining tokens are treated as keys.
    pub fn from_pointer(pointer: &str, document: &Value) -> Self {
        let mut path = Self::root();
        if pointer.is_empty() {
            return path;
        }

        let mut cursor = Some(document);
        for raw in pointer.trim_start_matches('/').split('/') {
            let token = raw.replace("~1", "/").replace("~0", "~");
            match cursor {
                Some(Value::Array(items)) => match token.parse::<usize>() {
                    Ok(index) => {
                        cursor = items.get(index);
                        path.push_index(index);
                    }
                    Err(_) => {
                        cursor = None;
                        path.push_key(token);
                    }
                },
                Some(Value::Object(map)) => {
                    cursor = map.get(&token);
                    path.push_key(token);
                }
                _ => {
                    cursor = None;
                    path.push_key(token);
                }
            }
        }
        path
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// JSON type name of a value, as used in human-readable messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
