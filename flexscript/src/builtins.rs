//! The fixed set of functions scripts may call.

use crate::prelude::*;
use crate::{EvalError, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Lower,
    Upper,
    Trim,
    Includes,
    StartsWith,
    EndsWith,
    Split,
    Join,
    Keys,
    Abs,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Number,
    String,
    Type,
}

impl Builtin {
    /// Resolves a function name, including the JavaScript-style aliases
    /// users tend to reach for.
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "len" | "length" => Self::Len,
            "lower" | "toLowerCase" => Self::Lower,
            "upper" | "toUpperCase" => Self::Upper,
            "trim" => Self::Trim,
            "includes" | "contains" => Self::Includes,
            "startsWith" | "starts_with" => Self::StartsWith,
            "endsWith" | "ends_with" => Self::EndsWith,
            "split" => Self::Split,
            "join" => Self::Join,
            "keys" => Self::Keys,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "min" => Self::Min,
            "max" => Self::Max,
            "number" => Self::Number,
            "string" | "toString" => Self::String,
            "type" => Self::Type,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Trim => "trim",
            Self::Includes => "includes",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Split => "split",
            Self::Join => "join",
            Self::Keys => "keys",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Min => "min",
            Self::Max => "max",
            Self::Number => "number",
            Self::String => "string",
            Self::Type => "type",
        }
    }

    /// Minimum and maximum number of arguments, counting the receiver of a
    /// method-style call.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Self::Includes | Self::StartsWith | Self::EndsWith | Self::Split => (2, 2),
            Self::Join => (1, 2),
            Self::Min | Self::Max => (1, usize::MAX),
            _ => (1, 1),
        }
    }

    /// Invokes the builtin. The parser guarantees `args` satisfies
    /// [`Builtin::arity`].
    pub fn call(&self, mut args: Vec<Value>) -> Result<Value, EvalError> {
        let first = if args.is_empty() {
            Value::Null
        } else {
            args.remove(0)
        };
        match self {
            Self::Len => match &first {
                Value::String(s) => Ok(Value::from(s.chars().count())),
                Value::Array(arr) => Ok(Value::from(arr.len())),
                Value::Object(obj) => Ok(Value::from(obj.len())),
                other => Err(self.invalid("a string, array or object", other)),
            },
            Self::Lower => self.map_str(&first, |s| s.to_lowercase()),
            Self::Upper => self.map_str(&first, |s| s.to_uppercase()),
            Self::Trim => self.map_str(&first, |s| s.trim().to_string()),
            Self::Includes => {
                let needle = second(&args);
                match (&first, needle) {
                    // Items without tags or metadata simply don't match.
                    (Value::Null, _) => Ok(Value::Boolean(false)),
                    (Value::Array(arr), needle) => Ok(Value::Boolean(arr.contains(needle))),
                    (Value::String(s), Value::String(n)) => Ok(Value::Boolean(s.contains(n.as_str()))),
                    (Value::String(_), other) => Err(self.invalid("a string to search for", other)),
                    (other, _) => Err(self.invalid("a string or array", other)),
                }
            }
            Self::StartsWith | Self::EndsWith => {
                let (s, affix) = (self.str_arg(&first)?, self.str_arg(second(&args))?);
                Ok(Value::Boolean(if *self == Self::StartsWith {
                    s.starts_with(affix)
                } else {
                    s.ends_with(affix)
                }))
            }
            Self::Split => {
                let (s, sep) = (self.str_arg(&first)?, self.str_arg(second(&args))?);
                Ok(Value::Array(
                    s.split(sep).map(Value::from).collect(),
                ))
            }
            Self::Join => {
                let sep = match args.first() {
                    Some(sep) => self.str_arg(sep)?,
                    None => ",",
                };
                match &first {
                    Value::Array(arr) => Ok(Value::String(
                        arr.iter()
                            .map(|v| v.to_string())
                            .collect::<Vec<String>>()
                            .join(sep),
                    )),
                    other => Err(self.invalid("an array", other)),
                }
            }
            Self::Keys => match first {
                Value::Object(obj) => Ok(Value::Array(obj.into_keys().map(Value::String).collect())),
                other => Err(self.invalid("an object", &other)),
            },
            Self::Abs => self.map_num(&first, Number::abs),
            Self::Floor => self.map_num(&first, Number::floor),
            Self::Ceil => self.map_num(&first, Number::ceil),
            Self::Round => self.map_num(&first, Number::round),
            Self::Min | Self::Max => {
                let mut candidates = match (first, args.is_empty()) {
                    (Value::Array(arr), true) => arr,
                    (first, _) => {
                        args.insert(0, first);
                        args
                    }
                };
                let mut best: Option<Number> = None;
                for candidate in candidates.drain(..) {
                    let n = match candidate {
                        Value::Number(n) => n,
                        other => return Err(self.invalid("numbers", &other)),
                    };
                    best = Some(match best {
                        Some(b) if (*self == Self::Min) == (b <= n) => b,
                        _ => n,
                    });
                }
                Ok(Value::from(best))
            }
            Self::Number => Ok(match first {
                Value::Number(n) => Value::Number(n),
                Value::Boolean(b) => Value::from(b as u64),
                Value::String(s) => parse_number(s.trim()).map(Value::Number).unwrap_or_default(),
                _ => Value::Null,
            }),
            Self::String => Ok(match first {
                Value::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            }),
            Self::Type => Ok(Value::from(first.type_name())),
        }
    }

    fn invalid(&self, expected: &'static str, got: &Value) -> EvalError {
        EvalError::InvalidArgument {
            function: self.name(),
            expected,
            got: got.type_name(),
        }
    }

    fn str_arg<'v>(&self, v: &'v Value) -> Result<&'v str, EvalError> {
        v.as_str().ok_or_else(|| self.invalid("a string", v))
    }

    fn map_str(&self, v: &Value, f: impl Fn(&str) -> String) -> Result<Value, EvalError> {
        Ok(Value::String(f(self.str_arg(v)?)))
    }

    fn map_num(
        &self,
        v: &Value,
        f: impl Fn(Number) -> Result<Number, EvalError>,
    ) -> Result<Value, EvalError> {
        match v {
            Value::Number(n) => Ok(Value::Number(f(*n)?)),
            other => Err(self.invalid("a number", other)),
        }
    }
}

fn second(rest: &[Value]) -> &Value {
    const NULL: &Value = &Value::Null;
    rest.first().unwrap_or(NULL)
}

// Lenient string to number conversion: surrounding whitespace is ignored and
// anything that isn't a plain decimal number yields `None`.
fn parse_number(s: &str) -> Option<Number> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        return None;
    }
    let n = digits.parse::<Number>().ok()?;
    if negative {
        n.checked_neg().ok()
    } else {
        Some(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        Builtin::lookup(name).unwrap().call(args)
    }

    fn strs(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn string_functions() {
        assert_eq!(call("toLowerCase", vec![Value::from("MiXeD")]), Ok(Value::from("mixed")));
        assert_eq!(call("upper", vec![Value::from("abc")]), Ok(Value::from("ABC")));
        assert_eq!(call("trim", vec![Value::from("  x ")]), Ok(Value::from("x")));
        assert_eq!(call("len", vec![Value::from("héllo")]), Ok(Value::from(5_u64)));
        assert_eq!(
            call("startsWith", vec![Value::from("IMG_001"), Value::from("IMG")]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            call("split", vec![Value::from("a,b"), Value::from(",")]),
            Ok(strs(&["a", "b"]))
        );
        assert_eq!(call("join", vec![strs(&["a", "b"])]), Ok(Value::from("a,b")));
        assert_eq!(
            call("join", vec![strs(&["a", "b"]), Value::from(" | ")]),
            Ok(Value::from("a | b"))
        );
    }

    #[test]
    fn includes() {
        let tags = strs(&["cat", "outdoor"]);
        assert_eq!(
            call("includes", vec![tags.clone(), Value::from("cat")]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            call("includes", vec![tags, Value::from("dog")]),
            Ok(Value::Boolean(false))
        );
        assert_eq!(
            call("includes", vec![Value::from("concatenate"), Value::from("cat")]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            call("includes", vec![Value::Null, Value::from("cat")]),
            Ok(Value::Boolean(false))
        );
        assert_eq!(
            call("includes", vec![Value::from(1_u64), Value::from("cat")]),
            Err(EvalError::InvalidArgument {
                function: "includes",
                expected: "a string or array",
                got: "number",
            })
        );
    }

    #[test]
    fn numeric_functions() {
        assert_eq!(
            call("min", vec![Value::from(3_u64), Value::from(-2_i64), Value::from(7_u64)]),
            Ok(Value::from(-2_i64))
        );
        assert_eq!(
            call("max", vec![Value::from(vec![1_u64, 9, 4])]),
            Ok(Value::from(9_u64))
        );
        assert_eq!(call("max", vec![Value::Array(Vec::new())]), Ok(Value::Null));
        assert!(call("min", vec![Value::from(1_u64), Value::from("2")]).is_err());
        assert_eq!(call("abs", vec![Value::from(-4_i64)]), Ok(Value::from(4_u64)));
    }

    #[test]
    fn conversions() {
        assert_eq!(call("number", vec![Value::from(" 42 ")]), Ok(Value::from(42_u64)));
        assert_eq!(call("number", vec![Value::from("-7")]), Ok(Value::from(-7_i64)));
        assert_eq!(call("number", vec![Value::from("abc")]), Ok(Value::Null));
        assert_eq!(call("number", vec![Value::from(true)]), Ok(Value::from(1_u64)));
        assert_eq!(call("string", vec![Value::from(12_u64)]), Ok(Value::from("12")));
        assert_eq!(call("type", vec![strs(&[])]), Ok(Value::from("array")));
        let mut obj = BTreeMap::new();
        obj.insert("b".to_string(), Value::Null);
        obj.insert("a".to_string(), Value::Null);
        assert_eq!(call("keys", vec![Value::Object(obj)]), Ok(strs(&["a", "b"])));
    }
}
