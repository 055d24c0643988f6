//! Values produced and consumed by FlexScript.

use core::cmp::Ordering;
use core::fmt;

use crate::prelude::*;
use crate::Number;

/// A value of a particular type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl Value {
    /// The name of this value's type, as reported by the `type()` builtin and
    /// in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// `null`, `false`, zero and the empty string are falsy. Everything else,
    /// including empty arrays and objects, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => !n.is_zero(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(arr) => Some(arr.as_ref()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Looks up a property by name. Missing properties, and properties of
    /// values that have none, are `null`.
    pub fn property(&self, name: &str) -> Value {
        match self {
            Self::Object(obj) => obj.get(name).cloned().unwrap_or_default(),
            Self::Array(arr) if name == "length" => Value::from(arr.len()),
            Self::String(s) if name == "length" => Value::from(s.chars().count()),
            _ => Value::Null,
        }
    }

    /// A total order over all values, used to sort items by computed keys.
    ///
    /// Values of different types order as null < boolean < number < string <
    /// array < object. Arrays and objects compare element-wise.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let o = x.total_cmp(y);
                    if o != Ordering::Equal {
                        return o;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Self::Object(a), Self::Object(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let o = ka.cmp(kb).then_with(|| va.total_cmp(vb));
                    if o != Ordering::Equal {
                        return o;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Number(_) => 2,
            Self::String(_) => 3,
            Self::Array(_) => 4,
            Self::Object(_) => 5,
        }
    }
}

/// Renders values the way string concatenation sees them: strings without
/// quotes, arrays joined with commas.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Self::Object(_) => write!(f, "[object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::Number(Number::Unsigned(u))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Number(Number::from(i))
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Self::Number(Number::Unsigned(u as u64))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}

impl<T> From<BTreeMap<String, T>> for Value
where
    T: Into<Value>,
{
    fn from(m: BTreeMap<String, T>) -> Self {
        Self::Object(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0_u64).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Array(Vec::new()).is_truthy());
        assert!(Value::Object(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn ordering_across_types() {
        let mut values = vec![
            Value::from("b"),
            Value::from(3_u64),
            Value::Null,
            Value::from(vec![1_u64]),
            Value::from(true),
            Value::from("a"),
            Value::from(-1_i64),
        ];
        values.sort_by(Value::total_cmp);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::from(true),
                Value::from(-1_i64),
                Value::from(3_u64),
                Value::from("a"),
                Value::from("b"),
                Value::from(vec![1_u64]),
            ]
        );
    }

    #[test]
    fn properties() {
        let mut obj = BTreeMap::new();
        obj.insert("width".to_string(), Value::from(640_u64));
        let obj = Value::Object(obj);
        assert_eq!(obj.property("width"), Value::from(640_u64));
        assert_eq!(obj.property("height"), Value::Null);
        assert_eq!(Value::from("héllo").property("length"), Value::from(5_u64));
        assert_eq!(Value::from(1_u64).property("anything"), Value::Null);
    }

    #[test]
    fn display() {
        let arr = Value::from(vec![Value::from(1_u64), Value::from("x"), Value::Null]);
        assert_eq!(arr.to_string(), "1,x,null");
    }
}
