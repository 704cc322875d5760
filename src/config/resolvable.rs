//! The conditional expression language used by parameters, variables,
//! excludes and file-builder entries.
//!
//! A [`Resolvable`] is a small recursive tree. Leaves are literal strings or
//! booleans; a literal string that names a resolved parameter is replaced by
//! that parameter's value before comparison. Evaluation is pure: the same node
//! and environment always produce the same [`ParamValue`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// Resolved parameters keyed by id.
pub type ParameterEnv = BTreeMap<String, ParamValue>;

/// A resolved value: parameters, operands and expression results are all
/// either text or a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A string value.
    Text(String),
    /// A boolean value.
    Bool(bool),
}

impl ParamValue {
    /// Non-empty text and `true` are truthy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Bool(b) => *b,
        }
    }

    /// Return the text, if this is a string value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One side (`a` or `b`) of a resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A literal, or a parameter id when the text names a resolved parameter.
    Literal(ParamValue),
    /// A nested expression.
    Nested(Box<Resolvable>),
}

impl Operand {
    fn resolve(&self, env: &ParameterEnv, fallback: &ParamValue) -> Result<ParamValue, ConfigError> {
        match self {
            Self::Literal(ParamValue::Text(s)) => Ok(env
                .get(s)
                .cloned()
                .unwrap_or_else(|| ParamValue::Text(s.clone()))),
            Self::Literal(value) => Ok(value.clone()),
            Self::Nested(node) => node.evaluate(env, &nested_fallback(fallback)),
        }
    }
}

/// Value returned by a satisfied condition that declares a `result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionResult {
    /// Return this string.
    Text(String),
    /// Return `true`.
    True,
}

impl ConditionResult {
    fn to_value(&self) -> ParamValue {
        match self {
            Self::Text(s) => ParamValue::Text(s.clone()),
            Self::True => ParamValue::Bool(true),
        }
    }
}

/// Operands and optional result of a `match`, `contain` or `not` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Left operand.
    pub a: Operand,
    /// Right operand.
    pub b: Operand,
    /// Value returned when the condition holds; the caller's fallback otherwise.
    pub result: Option<ConditionResult>,
}

/// A conditional expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolvable {
    /// `a == b`.
    Match(Condition),
    /// `a` contains `b`; both must be strings.
    Contain(Condition),
    /// `a != b`.
    Not(Condition),
    /// Render `template`, replacing `{a}` and `{b}` with the operand values.
    Format {
        /// Left operand.
        a: Operand,
        /// Right operand.
        b: Operand,
        /// Template containing `{a}` / `{b}` placeholders.
        template: String,
    },
    /// `a` if truthy, else `b`.
    Or {
        /// Preferred operand.
        a: Operand,
        /// Fallback operand.
        b: Operand,
    },
}

impl Resolvable {
    /// Name of the node type as written in manifests.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Match(_) => "match",
            Self::Contain(_) => "contain",
            Self::Not(_) => "not",
            Self::Format { .. } => "format",
            Self::Or { .. } => "$or",
        }
    }

    /// Evaluate this node against resolved parameters.
    ///
    /// `fallback` is returned by a satisfied `match`/`contain`/`not` that has
    /// no `result`. Nested operands receive the same fallback when it is
    /// truthy and `true` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] when `contain` sees a boolean operand.
    pub fn evaluate(&self, env: &ParameterEnv, fallback: &ParamValue) -> Result<ParamValue, ConfigError> {
        match self {
            Self::Match(c) => {
                let holds = c.a.resolve(env, fallback)? == c.b.resolve(env, fallback)?;
                Ok(gate(holds, c.result.as_ref(), fallback))
            }
            Self::Not(c) => {
                let holds = c.a.resolve(env, fallback)? != c.b.resolve(env, fallback)?;
                Ok(gate(holds, c.result.as_ref(), fallback))
            }
            Self::Contain(c) => {
                let a = c.a.resolve(env, fallback)?;
                let b = c.b.resolve(env, fallback)?;
                let (ParamValue::Text(haystack), ParamValue::Text(needle)) = (&a, &b) else {
                    return Err(ConfigError::TypeMismatch {
                        operation: "contain",
                        message: format!("both operands must be strings, got {a:?} and {b:?}"),
                    });
                };
                Ok(gate(haystack.contains(needle.as_str()), c.result.as_ref(), fallback))
            }
            Self::Format { a, b, template } => {
                let a = a.resolve(env, fallback)?;
                let b = b.resolve(env, fallback)?;
                Ok(ParamValue::Text(
                    template
                        .replace("{a}", &a.to_string())
                        .replace("{b}", &b.to_string()),
                ))
            }
            Self::Or { a, b } => {
                let a = a.resolve(env, fallback)?;
                if a.is_truthy() {
                    Ok(a)
                } else {
                    b.resolve(env, fallback)
                }
            }
        }
    }

    /// Every literal string operand in this tree, depth first.
    ///
    /// Used to detect references to parameters that are declared but not yet
    /// resolved.
    #[must_use]
    pub fn literal_texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        let (a, b) = self.operands();
        for operand in [a, b] {
            match operand {
                Operand::Literal(ParamValue::Text(s)) => out.push(s),
                Operand::Literal(ParamValue::Bool(_)) => {}
                Operand::Nested(node) => node.collect_texts(out),
            }
        }
    }

    const fn operands(&self) -> (&Operand, &Operand) {
        match self {
            Self::Match(c) | Self::Contain(c) | Self::Not(c) => (&c.a, &c.b),
            Self::Format { a, b, .. } | Self::Or { a, b } => (a, b),
        }
    }
}

fn gate(holds: bool, result: Option<&ConditionResult>, fallback: &ParamValue) -> ParamValue {
    if holds {
        result.map_or_else(|| fallback.clone(), ConditionResult::to_value)
    } else {
        ParamValue::Bool(false)
    }
}

fn nested_fallback(fallback: &ParamValue) -> ParamValue {
    if fallback.is_truthy() {
        fallback.clone()
    } else {
        ParamValue::Bool(true)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Operand {
        Operand::Literal(ParamValue::from(s))
    }

    fn cond(a: Operand, b: Operand, result: Option<&str>) -> Condition {
        Condition {
            a,
            b,
            result: result.map(|r| ConditionResult::Text(r.to_string())),
        }
    }

    fn env(pairs: &[(&str, ParamValue)]) -> ParameterEnv {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn truthy() -> ParamValue {
        ParamValue::Bool(true)
    }

    #[test]
    fn match_returns_result_when_equal() {
        let node = Resolvable::Match(cond(lit("$name"), lit("Ada"), Some("Hi Ada")));
        let e = env(&[("$name", "Ada".into())]);
        assert_eq!(node.evaluate(&e, &truthy()).unwrap(), "Hi Ada".into());
    }

    #[test]
    fn match_returns_false_when_different() {
        let node = Resolvable::Match(cond(lit("$name"), lit("Ada"), Some("Hi Ada")));
        let e = env(&[("$name", "Bob".into())]);
        assert_eq!(node.evaluate(&e, &truthy()).unwrap(), ParamValue::Bool(false));
    }

    #[test]
    fn bare_condition_returns_fallback() {
        let node = Resolvable::Match(cond(lit("x"), lit("x"), None));
        assert_eq!(
            node.evaluate(&ParameterEnv::new(), &truthy()).unwrap(),
            ParamValue::Bool(true)
        );
        assert_eq!(
            node.evaluate(&ParameterEnv::new(), &"picked".into()).unwrap(),
            "picked".into()
        );
    }

    #[test]
    fn match_is_strict_between_text_and_bool() {
        let node = Resolvable::Match(cond(lit("true"), Operand::Literal(true.into()), None));
        assert_eq!(
            node.evaluate(&ParameterEnv::new(), &truthy()).unwrap(),
            ParamValue::Bool(false)
        );
    }

    #[test]
    fn match_and_not_are_complementary() {
        let e = env(&[("$os", "linux".into()), ("$flag", true.into())]);
        for (a, b) in [("$os", "linux"), ("$os", "mac"), ("$flag", "true"), ("x", "x")] {
            let m = Resolvable::Match(cond(lit(a), lit(b), None))
                .evaluate(&e, &truthy())
                .unwrap();
            let n = Resolvable::Not(cond(lit(a), lit(b), None))
                .evaluate(&e, &truthy())
                .unwrap();
            assert_ne!(m.is_truthy(), n.is_truthy(), "a={a} b={b}");
        }
    }

    #[test]
    fn contain_checks_substring() {
        let node = Resolvable::Contain(cond(lit("$tools"), lit("git"), Some("yes")));
        let e = env(&[("$tools", "git,rg,fd".into())]);
        assert_eq!(node.evaluate(&e, &truthy()).unwrap(), "yes".into());
    }

    #[test]
    fn contain_rejects_boolean_operand() {
        let node = Resolvable::Contain(cond(lit("$flag"), lit("x"), None));
        let e = env(&[("$flag", true.into())]);
        let err = node.evaluate(&e, &truthy()).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { operation: "contain", .. }));
    }

    #[test]
    fn format_renders_operands() {
        let node = Resolvable::Format {
            a: lit("$user"),
            b: Operand::Literal(false.into()),
            template: "{a}/{b}/{a}".to_string(),
        };
        let e = env(&[("$user", "ada".into())]);
        assert_eq!(node.evaluate(&e, &truthy()).unwrap(), "ada/false/ada".into());
    }

    #[test]
    fn or_prefers_truthy_a() {
        let node = Resolvable::Or {
            a: lit("$custom"),
            b: lit("default"),
        };
        let set = env(&[("$custom", "mine".into())]);
        let empty = env(&[("$custom", "".into())]);
        assert_eq!(node.evaluate(&set, &truthy()).unwrap(), "mine".into());
        assert_eq!(node.evaluate(&empty, &truthy()).unwrap(), "default".into());
    }

    #[test]
    fn nested_or_chain_falls_through() {
        let node = Resolvable::Or {
            a: Operand::Nested(Box::new(Resolvable::Match(cond(lit("$os"), lit("mac"), Some("brew"))))),
            b: Operand::Nested(Box::new(Resolvable::Or {
                a: Operand::Nested(Box::new(Resolvable::Match(cond(
                    lit("$os"),
                    lit("linux"),
                    Some("apt"),
                )))),
                b: lit("none"),
            })),
        };
        let linux = env(&[("$os", "linux".into())]);
        let windows = env(&[("$os", "windows".into())]);
        assert_eq!(node.evaluate(&linux, &truthy()).unwrap(), "apt".into());
        assert_eq!(node.evaluate(&windows, &truthy()).unwrap(), "none".into());
    }

    #[test]
    fn nested_operand_gets_true_when_fallback_is_falsy() {
        let inner = Resolvable::Match(cond(lit("x"), lit("x"), None));
        let node = Resolvable::Match(cond(
            Operand::Nested(Box::new(inner)),
            Operand::Literal(true.into()),
            Some("inner held"),
        ));
        assert_eq!(
            node.evaluate(&ParameterEnv::new(), &ParamValue::Bool(false))
                .unwrap(),
            "inner held".into()
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let node = Resolvable::Format {
            a: lit("$a"),
            b: Operand::Nested(Box::new(Resolvable::Or {
                a: lit("$b"),
                b: lit("z"),
            })),
            template: "{a}-{b}".to_string(),
        };
        let e = env(&[("$a", "1".into()), ("$b", "".into())]);
        let first = node.evaluate(&e, &truthy()).unwrap();
        let second = node.evaluate(&e, &truthy()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "1-z".into());
    }

    #[test]
    fn literal_texts_walks_nested_operands() {
        let node = Resolvable::Or {
            a: Operand::Nested(Box::new(Resolvable::Match(cond(lit("$a"), lit("b"), None)))),
            b: Operand::Literal(true.into()),
        };
        assert_eq!(node.literal_texts(), vec!["$a", "b"]);
    }
}
