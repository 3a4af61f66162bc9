//! `{{placeholder}}` rendering for agent instructions
//!
//! Two passes exist. Spawn-time rendering fills task placeholders and
//! leaves the deferred run-time namespaces (`previous_output`,
//! `outputs.<template_id>`) untouched. Run-time rendering fills those
//! from the outputs produced so far.

use crate::core::error::DomainError;
use std::collections::BTreeMap;

/// Placeholder replaced with the immediately preceding stage's output
pub const PREVIOUS_OUTPUT: &str = "previous_output";
/// Namespace for a named earlier stage's output: `outputs.<template_id>`
pub const OUTPUTS_PREFIX: &str = "outputs.";

fn is_deferred(name: &str) -> bool {
    name == PREVIOUS_OUTPUT || name.starts_with(OUTPUTS_PREFIX)
}

/// Walk `{{ name }}` markers, asking `resolve` for each name.
///
/// `resolve` returns `Ok(Some(value))` to substitute, `Ok(None)` to keep
/// the marker verbatim, or an error to abort.
fn substitute<F>(template: &str, mut resolve: F) -> Result<String, DomainError>
where
    F: FnMut(&str) -> Result<Option<String>, DomainError>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated marker: keep the remainder as literal text
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let raw = &after[..end];
        match resolve(raw.trim())? {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("{{");
                out.push_str(raw);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Spawn-time rendering.
///
/// Fails with [`DomainError::MissingPlaceholder`] when a non-deferred
/// placeholder has no value.
pub fn render_task(template: &str, vars: &BTreeMap<String, String>) -> Result<String, DomainError> {
    substitute(template, |name| {
        if is_deferred(name) {
            return Ok(None);
        }
        vars.get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| DomainError::MissingPlaceholder(name.to_string()))
    })
}

/// Run-time rendering of deferred output placeholders.
///
/// Outputs not produced yet render as a short notice rather than failing.
pub fn render_outputs(
    text: &str,
    outputs: &BTreeMap<String, String>,
    previous: Option<&str>,
) -> String {
    let rendered = substitute(text, |name| {
        if name == PREVIOUS_OUTPUT {
            return Ok(Some(
                previous.unwrap_or("(no previous stage output)").to_string(),
            ));
        }
        if let Some(stage) = name.strip_prefix(OUTPUTS_PREFIX) {
            return Ok(Some(
                outputs
                    .get(stage)
                    .cloned()
                    .unwrap_or_else(|| format!("(no output from {})", stage)),
            ));
        }
        Ok(None)
    });
    rendered.unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_task_fills_known_placeholders() {
        let out = render_task("Task: {{ task }} in {{domain}}", &vars(&[("task", "fix"), ("domain", "security")]));
        assert_eq!(out.unwrap(), "Task: fix in security");
    }

    #[test]
    fn test_render_task_missing_placeholder_fails() {
        let err = render_task("{{repo}}", &vars(&[])).unwrap_err();
        assert_eq!(err, DomainError::MissingPlaceholder("repo".into()));
    }

    #[test]
    fn test_render_task_keeps_deferred() {
        let out = render_task("Use {{outputs.drafter}} and {{ previous_output }}", &vars(&[])).unwrap();
        assert_eq!(out, "Use {{outputs.drafter}} and {{ previous_output }}");
    }

    #[test]
    fn test_render_outputs() {
        let outputs = vars(&[("drafter", "DRAFT-TEXT")]);
        let out = render_outputs("A={{outputs.drafter}} B={{outputs.missing}} P={{previous_output}}", &outputs, Some("PREV"));
        assert_eq!(out, "A=DRAFT-TEXT B=(no output from missing) P=PREV");
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        assert_eq!(render_task("oops {{task", &vars(&[])).unwrap(), "oops {{task");
    }
}
