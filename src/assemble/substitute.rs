//! Fixed-point variable substitution.
use std::collections::BTreeMap;

/// Bytes a rendered file may grow by before substitution is abandoned.
pub const MAX_GROWTH_BYTES: usize = 16 * 1024 * 1024;

/// Substitution failed to reach a fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotConverged {
    /// Passes run before giving up.
    pub passes: usize,
}

/// Replace every variable token in `content` with its value, repeating whole
/// passes until one changes nothing.
///
/// At most `variables.len() + 2` passes run; a value chain longer than the
/// map (only possible with a cycle such as `{{A}} -> x{{A}}`) never settles.
/// A pass that leaves the text more than [`MAX_GROWTH_BYTES`] longer than
/// `content` also stops, so a self-multiplying value fails fast instead of
/// doubling until the cap. Empty tokens are ignored.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use config_rocket::assemble::substitute::substitute;
///
/// let mut vars = BTreeMap::new();
/// vars.insert("{{GREETING}}".to_string(), "Hi {{NAME}}".to_string());
/// vars.insert("{{NAME}}".to_string(), "Ada".to_string());
/// assert_eq!(substitute("{{GREETING}}!", &vars).unwrap(), "Hi Ada!");
/// ```
///
/// # Errors
///
/// Returns [`NotConverged`] when the pass cap or the growth limit is reached.
pub fn substitute(content: &str, variables: &BTreeMap<String, String>) -> Result<String, NotConverged> {
    substitute_within(content, variables, content.len().saturating_add(MAX_GROWTH_BYTES))
}

fn substitute_within(
    content: &str,
    variables: &BTreeMap<String, String>,
    max_len: usize,
) -> Result<String, NotConverged> {
    let cap = variables.len() + 2;
    let mut current = content.to_string();

    for pass in 1..=cap {
        let next = variables
            .iter()
            .filter(|(token, _)| !token.is_empty())
            .try_fold(current.clone(), |text, (token, value)| {
                if !text.contains(token.as_str()) {
                    return Ok(text);
                }
                let replaced = text.replace(token.as_str(), value);
                if replaced.len() > max_len {
                    Err(NotConverged { passes: pass })
                } else {
                    Ok(replaced)
                }
            })?;
        if next == current {
            return Ok(next);
        }
        if pass == cap {
            break;
        }
        current = next;
    }

    Err(NotConverged { passes: cap })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn no_variables_is_identity() {
        assert_eq!(substitute("plain {{X}}", &BTreeMap::new()).unwrap(), "plain {{X}}");
    }

    #[test]
    fn replaces_every_occurrence() {
        let v = vars(&[("{{X}}", "1")]);
        assert_eq!(substitute("{{X}}+{{X}}", &v).unwrap(), "1+1");
    }

    #[test]
    fn chained_values_reach_fixed_point() {
        // Token order is alphabetical, so {{A}} expands before {{B}} exists in
        // the text and a second pass is needed.
        let v = vars(&[("{{A}}", "a"), ("{{B}}", "{{C}}"), ("{{C}}", "{{A}}")]);
        let out = substitute("[{{B}}]", &v).unwrap();
        assert_eq!(out, "[a]");
        assert!(!out.contains("{{"));
    }

    #[test]
    fn self_reference_does_not_converge() {
        let v = vars(&[("{{A}}", "x{{A}}")]);
        assert_eq!(substitute("{{A}}", &v).unwrap_err(), NotConverged { passes: 3 });
    }

    #[test]
    fn self_multiplying_value_stops_at_growth_limit() {
        let mut v = vars(&[("{{A}}", "{{A}}{{A}}")]);
        for i in 0..40 {
            v.insert(format!("{{{{UNUSED_{i}}}}}"), "x".to_string());
        }
        let err = substitute_within("{{A}}", &v, 4096).unwrap_err();
        // 5 * 2^10 bytes passes 4 KiB on the tenth pass, far below the cap of 43.
        assert_eq!(err, NotConverged { passes: 10 });
    }

    #[test]
    fn growth_within_limit_converges() {
        let v = vars(&[("{{A}}", "{{B}}{{B}}"), ("{{B}}", "{{C}}{{C}}"), ("{{C}}", "cc")]);
        assert_eq!(substitute_within("{{A}}", &v, 64).unwrap(), "cccccccc");
    }

    #[test]
    fn empty_token_is_ignored() {
        let v = vars(&[("", "boom"), ("{{X}}", "ok")]);
        assert_eq!(substitute("{{X}}", &v).unwrap(), "ok");
    }

    #[test]
    fn value_equal_to_token_is_stable() {
        let v = vars(&[("{{X}}", "{{X}}")]);
        assert_eq!(substitute("{{X}}", &v).unwrap(), "{{X}}");
    }
}
