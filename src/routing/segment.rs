//! Compiled pattern representation.
//!
//! # Responsibilities
//! - Classify pattern tokens into literals, variables and wildcards
//! - Hold the compiled form of one concrete (already expanded) pattern
//! - Serialize back to a canonical pattern string
//!
//! # Design Decisions
//! - Segments are built once at registration and never mutated
//! - Only a trailing `*` is a wildcard; a `*` anywhere else is a literal
//! - Empty tokens (leading, trailing or doubled slashes) are dropped

use std::fmt;

/// Marker that ends a variable whose bound value must not be percent-decoded.
pub const RAW_VARIABLE_MARKER: char = '#';

/// One element of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches one path component exactly (case-sensitive).
    Literal(String),
    /// Binds one path component under `name`.
    Variable { name: String, decode: bool },
    /// Captures zero or more trailing path components.
    Wildcard,
}

impl Segment {
    /// Classify a single non-empty token. `last` tells whether the token ends the pattern.
    pub fn from_token(token: &str, last: bool) -> Self {
        if let Some(rest) = token.strip_prefix(':') {
            match rest.strip_suffix(RAW_VARIABLE_MARKER) {
                Some(name) => Segment::Variable {
                    name: name.to_string(),
                    decode: false,
                },
                None => Segment::Variable {
                    name: rest.to_string(),
                    decode: true,
                },
            }
        } else if token == "*" && last {
            Segment::Wildcard
        } else {
            Segment::Literal(token.to_string())
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Variable { name, decode: true } => write!(f, ":{}", name),
            Segment::Variable { name, decode: false } => {
                write!(f, ":{}{}", name, RAW_VARIABLE_MARKER)
            }
            Segment::Wildcard => f.write_str("*"),
        }
    }
}

/// A concrete pattern: no optional groups left, wildcard (if any) in last position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledPattern {
    pattern: String,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// Tokenize `pattern` on `/` and classify every token.
    ///
    /// This is a pure function of the input: compiling the same string twice
    /// yields identical segments.
    pub fn compile(pattern: &str) -> Self {
        let tokens: Vec<&str> = pattern.split('/').filter(|t| !t.is_empty()).collect();
        let count = tokens.len();
        let segments: Vec<Segment> = tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| Segment::from_token(token, idx + 1 == count))
            .collect();
        let pattern = render(&segments);
        Self { pattern, segments }
    }

    /// Canonical pattern string, e.g. `/user/:id`.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of components, used for specificity ordering.
    pub fn component_count(&self) -> usize {
        self.segments.len()
    }

    /// True when the last segment captures trailing components.
    pub fn has_wildcard(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_wildcard)
    }

    /// Segments that must line up one-to-one with request components.
    pub fn fixed_segments(&self) -> &[Segment] {
        if self.has_wildcard() {
            &self.segments[..self.segments.len() - 1]
        } else {
            &self.segments
        }
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn render(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments.iter().fold(String::new(), |mut out, segment| {
        out.push('/');
        out.push_str(&segment.to_string());
        out
    })
}
