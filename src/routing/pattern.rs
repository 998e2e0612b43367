//! Pattern compilation and optional-group expansion.
//!
//! # Responsibilities
//! - Split a raw pattern into its fixed prefix and optional groups
//! - Expand optional groups into concrete candidate patterns
//! - Compile every candidate and order them most specific first
//!
//! # Design Decisions
//! - Every subset of the groups is tried, and every ordering of each subset,
//!   so `/a(/b)(/c)` also yields `/a/c/b`
//! - Candidates are deduplicated on their canonical string
//! - Malformed groups fail at registration, never at match time
//! - The group count is bounded because the expansion is factorial

use std::collections::HashSet;
use thiserror::Error;

use crate::routing::segment::CompiledPattern;

/// Upper bound on optional groups in one pattern (6 groups = 1957 orderings).
pub const MAX_OPTIONAL_GROUPS: usize = 6;

/// Errors raised while compiling a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// An optional group was opened and never closed, or closed without being opened.
    #[error("unbalanced optional group in pattern `{pattern}` at byte {position}")]
    UnbalancedGroup { pattern: String, position: usize },

    /// An optional group was opened inside another one.
    #[error("nested optional group in pattern `{pattern}` at byte {position}")]
    NestedGroup { pattern: String, position: usize },

    /// Text outside of a group followed the first optional group.
    #[error("unexpected text after optional group in pattern `{pattern}` at byte {position}")]
    TextAfterGroup { pattern: String, position: usize },

    /// Too many optional groups to expand.
    #[error("pattern `{pattern}` has {count} optional groups, maximum is {max}")]
    TooManyGroups {
        pattern: String,
        count: usize,
        max: usize,
    },

    /// Expansion produced no well-formed candidate.
    #[error("pattern `{pattern}` expands to no usable route")]
    NoCandidates { pattern: String },
}

/// Fixed prefix plus the bodies of the optional groups, in declaration order.
#[derive(Debug, PartialEq, Eq)]
struct OptionalLayout<'a> {
    prefix: &'a str,
    groups: Vec<&'a str>,
}

/// Compile a raw pattern into its concrete patterns, most specific first.
pub fn compile_pattern(pattern: &str) -> Result<Vec<CompiledPattern>, PatternError> {
    let layout = split_optionals(pattern)?;
    if layout.groups.is_empty() {
        return Ok(vec![CompiledPattern::compile(pattern)]);
    }
    if layout.groups.len() > MAX_OPTIONAL_GROUPS {
        return Err(PatternError::TooManyGroups {
            pattern: pattern.to_string(),
            count: layout.groups.len(),
            max: MAX_OPTIONAL_GROUPS,
        });
    }

    let mut seen = HashSet::new();
    let mut compiled = Vec::new();
    for order in orderings(layout.groups.len()) {
        let mut candidate = layout.prefix.to_string();
        for idx in order {
            candidate.push_str(layout.groups[idx]);
        }
        if candidate.trim().is_empty() {
            continue;
        }
        let candidate = CompiledPattern::compile(&candidate);
        if seen.insert(candidate.as_str().to_string()) {
            compiled.push(candidate);
        }
    }

    if compiled.is_empty() {
        return Err(PatternError::NoCandidates {
            pattern: pattern.to_string(),
        });
    }

    // Stable: equal lengths keep discovery order.
    compiled.sort_by(|a, b| b.component_count().cmp(&a.component_count()));
    Ok(compiled)
}

/// Expanded candidate strings for `pattern`, in the order they are attempted.
pub fn expand_optional_patterns(pattern: &str) -> Result<Vec<String>, PatternError> {
    Ok(compile_pattern(pattern)?
        .into_iter()
        .map(|compiled| compiled.as_str().to_string())
        .collect())
}

fn split_optionals(pattern: &str) -> Result<OptionalLayout<'_>, PatternError> {
    let mut prefix_end = None;
    let mut open: Option<usize> = None;
    let mut groups = Vec::new();

    for (position, ch) in pattern.char_indices() {
        match (ch, open) {
            ('(', Some(_)) => {
                return Err(PatternError::NestedGroup {
                    pattern: pattern.to_string(),
                    position,
                });
            }
            ('(', None) => {
                prefix_end.get_or_insert(position);
                open = Some(position);
            }
            (')', Some(start)) => {
                groups.push(&pattern[start + 1..position]);
                open = None;
            }
            (')', None) => {
                return Err(PatternError::UnbalancedGroup {
                    pattern: pattern.to_string(),
                    position,
                });
            }
            (_, Some(_)) => {}
            (ch, None) => {
                if prefix_end.is_some() && ch != '/' {
                    return Err(PatternError::TextAfterGroup {
                        pattern: pattern.to_string(),
                        position,
                    });
                }
            }
        }
    }

    if let Some(position) = open {
        return Err(PatternError::UnbalancedGroup {
            pattern: pattern.to_string(),
            position,
        });
    }

    Ok(OptionalLayout {
        prefix: &pattern[..prefix_end.unwrap_or(pattern.len())],
        groups,
    })
}

/// Every ordering of every subset of `0..count`: larger subsets first,
/// subsets in lexicographic order, permutations in lexicographic order.
fn orderings(count: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for size in (0..=count).rev() {
        let mut combos = Vec::new();
        combinations(0, count, size, &mut Vec::with_capacity(size), &mut combos);
        for combo in combos {
            permutations(
                &combo,
                &mut Vec::with_capacity(size),
                &mut vec![false; size],
                &mut out,
            );
        }
    }
    out
}

fn combinations(
    start: usize,
    count: usize,
    size: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    for idx in start..count {
        current.push(idx);
        combinations(idx + 1, count, size, current, out);
        current.pop();
    }
}

fn permutations(
    items: &[usize],
    current: &mut Vec<usize>,
    used: &mut [bool],
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == items.len() {
        out.push(current.clone());
        return;
    }
    for i in 0..items.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(items[i]);
        permutations(items, current, used, out);
        current.pop();
        used[i] = false;
    }
}
