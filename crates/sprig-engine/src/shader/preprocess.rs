//! Conditional-compilation pass for WGSL sources.
//!
//! WGSL has no preprocessor, so defines are applied here before the source
//! reaches the compiler. Supported directives, one per line:
//! `#ifdef NAME`, `#ifndef NAME`, `#else`, `#endif`.
//!
//! Lines in inactive branches (and the directive lines themselves) are
//! replaced with empty lines so compiler diagnostics keep their line numbers.

use crate::error::PreprocessError;

struct Branch {
    /// Enclosing block is active.
    parent_active: bool,
    /// Condition of the `#if*` line.
    condition: bool,
    in_else: bool,
}

impl Branch {
    fn active(&self) -> bool {
        self.parent_active && (self.condition != self.in_else)
    }
}

/// Applies `defines` to `source`.
pub fn preprocess(source: &str, defines: &[&str]) -> Result<String, PreprocessError> {
    let mut out = String::with_capacity(source.len());
    let mut stack: Vec<Branch> = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let active = stack.last().is_none_or(Branch::active);
        let trimmed = line.trim_start();

        if let Some(directive) = trimmed.strip_prefix('#') {
            let mut words = directive.split_whitespace();
            match words.next() {
                Some(kind @ ("ifdef" | "ifndef")) => {
                    let directive = if kind == "ifdef" { "#ifdef" } else { "#ifndef" };
                    let name = words
                        .next()
                        .ok_or(PreprocessError::MissingName { line: line_no, directive })?;
                    let defined = defines.contains(&name);
                    stack.push(Branch {
                        parent_active: active,
                        condition: if kind == "ifdef" { defined } else { !defined },
                        in_else: false,
                    });
                }
                Some("else") => {
                    let top = stack
                        .last_mut()
                        .ok_or(PreprocessError::Unmatched { line: line_no, directive: "#else" })?;
                    if top.in_else {
                        return Err(PreprocessError::DuplicateElse { line: line_no });
                    }
                    top.in_else = true;
                }
                Some("endif") => {
                    stack
                        .pop()
                        .ok_or(PreprocessError::Unmatched { line: line_no, directive: "#endif" })?;
                }
                _ => {
                    return Err(PreprocessError::UnknownDirective {
                        line: line_no,
                        text: trimmed.to_string(),
                    });
                }
            }
            out.push('\n');
            continue;
        }

        if active {
            out.push_str(line);
        }
        out.push('\n');
    }

    if !stack.is_empty() {
        return Err(PreprocessError::Unterminated { open: stack.len() });
    }

    Ok(out)
}
