// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constraint expressions and the AND-combining builder.
//!
//! Constraints are opaque boolean expression text, validated
//! syntactically on construction and evaluated by the server. A query
//! with no constraint behaves identically to one constrained by the
//! literal `true`; the wire layer always transmits a constraint.

use crate::error::{Error, Result};

const LITERAL_TRUE: &str = "true";

/// An opaque, syntactically validated boolean filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    text: String,
}

impl Constraint {
    /// The literal-true expression (matches every ad).
    pub fn always_true() -> Self {
        Constraint {
            text: LITERAL_TRUE.to_string(),
        }
    }

    /// Parse constraint text.
    ///
    /// Validation is syntactic only: non-blank, balanced parentheses
    /// and brackets, terminated string literals. Semantic rejection is
    /// the server's job and surfaces as [`Error::MalformedConstraint`]
    /// from the query itself.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::MalformedConstraint(
                "constraint expression is empty".into(),
            ));
        }
        validate_syntax(trimmed)?;
        Ok(Constraint {
            text: trimmed.to_string(),
        })
    }

    /// Exact string-match fragment `name == "value"`.
    ///
    /// The value is quoted and escaped; the attribute name must be a
    /// plain identifier.
    pub fn attr_eq(name: &str, value: &str) -> Result<Self> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::MalformedConstraint(format!(
                "not an attribute name: {:?}",
                name
            )));
        }
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        Ok(Constraint {
            text: format!("{} == \"{}\"", name, escaped),
        })
    }

    /// True if this is the literal-true expression.
    pub fn is_always_true(&self) -> bool {
        self.text == LITERAL_TRUE
    }

    /// The expression text as transmitted on the wire.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// AND-combine an ordered sequence of optional constraint fragments.
///
/// Absent fragments are skipped; present fragments keep their input
/// order (expression evaluation order is preserved, never rearranged).
/// An entirely empty sequence yields the literal-true expression, and
/// a single fragment is returned unchanged.
pub fn and_all<'a, I>(fragments: I) -> Constraint
where
    I: IntoIterator<Item = Option<&'a Constraint>>,
{
    let present: Vec<&Constraint> = fragments.into_iter().flatten().collect();
    match present.as_slice() {
        [] => Constraint::always_true(),
        [single] => (*single).clone(),
        many => Constraint {
            text: many
                .iter()
                .map(|c| format!("({})", c.text))
                .collect::<Vec<_>>()
                .join(" && "),
        },
    }
}

fn validate_syntax(text: &str) -> Result<()> {
    let mut depth_paren: i64 = 0;
    let mut depth_bracket: i64 = 0;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '(' => depth_paren += 1,
            ')' => {
                depth_paren -= 1;
                if depth_paren < 0 {
                    return Err(Error::MalformedConstraint(format!(
                        "unbalanced ')' in {:?}",
                        text
                    )));
                }
            }
            '[' => depth_bracket += 1,
            ']' => {
                depth_bracket -= 1;
                if depth_bracket < 0 {
                    return Err(Error::MalformedConstraint(format!(
                        "unbalanced ']' in {:?}",
                        text
                    )));
                }
            }
            '"' => {
                // Consume the string literal, honoring backslash escapes.
                let mut terminated = false;
                while let Some(s) = chars.next() {
                    match s {
                        '\\' => {
                            chars.next();
                        }
                        '"' => {
                            terminated = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !terminated {
                    return Err(Error::MalformedConstraint(format!(
                        "unterminated string literal in {:?}",
                        text
                    )));
                }
            }
            _ => {}
        }
    }

    if depth_paren != 0 || depth_bracket != 0 {
        return Err(Error::MalformedConstraint(format!(
            "unbalanced grouping in {:?}",
            text
        )));
    }
    Ok(())
}
