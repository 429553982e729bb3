//! Command template rendering.
//!
//! Templates are shell-like command lines with `{name}` placeholders, e.g.
//! `psql -U '{username}' -h '{host}'`. `{{` and `}}` stand for literal braces.
//!
//! Values are escaped for the quoting context their placeholder sits in, so
//! a password containing `'` or a space cannot break out of its argument.
//! The rendered line is then split with POSIX shell-token rules.

use std::borrow::Cow;

use crate::error::{DbHooksError, Result};

/// Quoting state of the template text at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Unquoted,
    Single,
    Double,
}

/// Renders a template by substituting placeholders from `values`.
///
/// A placeholder whose name is absent from `values` is an error. A name
/// present with a `None` value renders as the empty string.
///
/// # Errors
/// Returns `TemplateRender` for unknown, empty or unterminated placeholders,
/// a lone `}`, or a value that cannot be shell-quoted
///
/// # Example
/// ```rust
/// use dbhooks_core::template::render;
///
/// let line = render("psql -U '{username}'", &[("username", Some("o'neil"))])?;
/// assert_eq!(line, r"psql -U 'o'\''neil'");
/// # Ok::<(), dbhooks_core::DbHooksError>(())
/// ```
pub fn render(template: &str, values: &[(&str, Option<&str>)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut state = QuoteState::Unquoted;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    match n {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => break,
                        _ => name.push(n),
                    }
                }
                if !closed {
                    return Err(DbHooksError::template("unterminated placeholder"));
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(DbHooksError::template("empty placeholder '{}'"));
                }
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.unwrap_or_default())
                    .ok_or_else(|| {
                        DbHooksError::template(format!("unknown placeholder '{{{}}}'", name))
                    })?;
                out.push_str(&escape(value, state)?);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(DbHooksError::template("single '}' encountered in template"));
            }
            '\\' if state != QuoteState::Single => {
                out.push(c);
                // The escaped character never changes quoting state
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => {
                state = match (state, c) {
                    (QuoteState::Unquoted, '\'') => QuoteState::Single,
                    (QuoteState::Unquoted, '"') => QuoteState::Double,
                    (QuoteState::Single, '\'') | (QuoteState::Double, '"') => QuoteState::Unquoted,
                    (state, _) => state,
                };
                out.push(c);
            }
        }
    }

    Ok(out)
}

/// Splits a rendered command line into argv tokens.
///
/// # Errors
/// Returns `TemplateRender` if quotes are unbalanced or the line ends in a
/// dangling escape
pub fn split(line: &str) -> Result<Vec<String>> {
    shlex::split(line)
        .ok_or_else(|| DbHooksError::template("unbalanced quotes or trailing escape in command"))
}

/// Renders a template and splits it into a non-empty argv.
///
/// # Errors
/// Any error from [`render`] or [`split`], or `TemplateRender` if the
/// command is empty
pub fn render_argv(template: &str, values: &[(&str, Option<&str>)]) -> Result<Vec<String>> {
    let argv = split(&render(template, values)?)?;
    if argv.is_empty() {
        return Err(DbHooksError::template("command is empty"));
    }
    Ok(argv)
}

fn escape(value: &str, state: QuoteState) -> Result<Cow<'_, str>> {
    match state {
        QuoteState::Single => Ok(if value.contains('\'') {
            Cow::Owned(value.replace('\'', r"'\''"))
        } else {
            Cow::Borrowed(value)
        }),
        QuoteState::Double => {
            let mut escaped = String::with_capacity(value.len());
            for c in value.chars() {
                if matches!(c, '\\' | '"' | '$' | '`') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            Ok(Cow::Owned(escaped))
        }
        QuoteState::Unquoted => shlex::try_quote(value)
            .map_err(|_| DbHooksError::template("value contains a NUL byte")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(template: &str, values: &[(&str, Option<&str>)]) -> Vec<String> {
        render_argv(template, values).unwrap()
    }

    #[test]
    fn test_single_quoted_placeholders() {
        assert_eq!(
            argv(
                "psql -U '{username}' -h '{host}'",
                &[("username", Some("alice")), ("host", Some("db1"))]
            ),
            vec!["psql", "-U", "alice", "-h", "db1"]
        );
    }

    #[test]
    fn test_values_cannot_escape_quotes() {
        let tricky = r#"it's a "quote" $HOME `x` \ end"#;
        for template in ["cmd '{v}'", "cmd \"{v}\"", "cmd {v}", "cmd pre-{v}-post"] {
            let tokens = argv(template, &[("v", Some(tricky))]);
            assert_eq!(tokens.len(), 2, "template {}", template);
            assert!(tokens[1].contains(tricky), "template {}", template);
        }
    }

    #[test]
    fn test_value_with_spaces_is_one_token() {
        assert_eq!(
            argv("sqlite3 {database}", &[("database", Some("/tmp/my db.sqlite"))]),
            vec!["sqlite3", "/tmp/my db.sqlite"]
        );
    }

    #[test]
    fn test_none_renders_empty() {
        assert_eq!(
            argv("mysql --password '{password}'", &[("password", None)]),
            vec!["mysql", "--password", ""]
        );
        assert_eq!(
            render("x {password}", &[("password", None)]).unwrap(),
            "x ''"
        );
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = render("psql -h '{hostname}'", &[("host", Some("db1"))]).unwrap_err();
        assert!(matches!(err, DbHooksError::TemplateRender { .. }));
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn test_brace_escapes() {
        assert_eq!(
            render("echo {{literal}} {v}", &[("v", Some("x"))]).unwrap(),
            "echo {literal} x"
        );
    }

    #[test]
    fn test_malformed_placeholders() {
        assert!(render("echo {v", &[("v", Some("x"))]).is_err());
        assert!(render("echo {}", &[]).is_err());
        assert!(render("echo }", &[]).is_err());
    }

    #[test]
    fn test_unbalanced_quotes_fail_to_split() {
        // The historical MySQL template lacked its final closing quote
        let err = render_argv("mysql '{database}", &[("database", Some("sales"))]).unwrap_err();
        assert!(matches!(err, DbHooksError::TemplateRender { .. }));
    }

    #[test]
    fn test_empty_command() {
        assert!(render_argv("   ", &[]).is_err());
    }

    #[test]
    fn test_escaped_quote_in_template_keeps_state() {
        assert_eq!(
            argv(r"echo \'{v}", &[("v", Some("a b"))]),
            vec!["echo", "'a b"]
        );
    }
}
