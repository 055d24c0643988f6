//! Evaluation of parsed programs against a single item's inputs.

use core::cmp::Ordering;

use crate::parser::{BinaryOp, Expr, Input, LogicalOp, Program, UnaryOp};
use crate::prelude::*;
use crate::{EvalError, Value};

/// The values a script can see while being evaluated for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    id: Value,
    value: Value,
    metadata: Value,
    tags: Value,
}

impl Inputs {
    /// Inputs for the item with the given ID, without a value, metadata or
    /// tags.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: Value::String(id.into()),
            value: Value::Null,
            metadata: Value::Null,
            tags: Value::Array(Vec::new()),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_tags(mut self, tags: Value) -> Self {
        self.tags = tags;
        self
    }

    /// The ID of the item these inputs belong to.
    pub fn id(&self) -> &Value {
        &self.id
    }

    fn get(&self, input: Input) -> &Value {
        match input {
            Input::Id => &self.id,
            Input::Value => &self.value,
            Input::Metadata => &self.metadata,
            Input::Tags => &self.tags,
        }
    }
}

pub(crate) fn eval_program(program: &Program, inputs: &Inputs) -> Result<Value, EvalError> {
    let mut locals = Vec::with_capacity(program.locals.len());
    for expr in &program.locals {
        let value = Evaluator {
            inputs,
            locals: &locals,
        }
        .eval(expr)?;
        locals.push(value);
    }
    match &program.result {
        Some(expr) => Evaluator {
            inputs,
            locals: &locals,
        }
        .eval(expr),
        None => Ok(Value::Null),
    }
}

struct Evaluator<'a> {
    inputs: &'a Inputs,
    locals: &'a [Value],
}

impl<'a> Evaluator<'a> {
    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Input(input) => Ok(self.inputs.get(*input).clone()),
            // The parser only produces slots for locals defined earlier.
            Expr::Local(slot) => Ok(self.locals.get(*slot).cloned().unwrap_or_default()),
            Expr::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<Value>, EvalError>>()?,
            )),
            Expr::Object(props) => {
                let mut obj = BTreeMap::new();
                for (key, expr) in props {
                    obj.insert(key.clone(), self.eval(expr)?);
                }
                Ok(Value::Object(obj))
            }
            Expr::Member { .. }
            | Expr::Index { .. }
            | Expr::Call { .. }
            | Expr::OptionalChain(_) => Ok(self.eval_link(expr)?.unwrap_or_default()),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
                    UnaryOp::Neg => match operand {
                        Value::Number(n) => Ok(Value::Number(n.checked_neg()?)),
                        other => Err(EvalError::InvalidOperand {
                            op: "-",
                            operand: other.type_name(),
                        }),
                    },
                }
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                eval_binary(*op, left, right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Coalesce => !left.is_null(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    // Evaluates one link of a member/index/call chain. `None` means an
    // optional link found a `null` receiver, which skips the rest of the
    // chain up to its enclosing `OptionalChain`.
    fn eval_link(&self, expr: &Expr) -> Result<Option<Value>, EvalError> {
        match expr {
            Expr::Member {
                target,
                name,
                optional,
            } => match self.eval_link(target)? {
                None => Ok(None),
                Some(Value::Null) if *optional => Ok(None),
                Some(Value::Null) => Err(EvalError::NullAccess(name.clone())),
                Some(target) => Ok(Some(target.property(name))),
            },
            Expr::Index { target, index } => {
                let target = match self.eval_link(target)? {
                    Some(target) => target,
                    None => return Ok(None),
                };
                let index = self.eval(index)?;
                eval_index(target, index).map(Some)
            }
            Expr::Call {
                builtin,
                args,
                optional,
            } => {
                let mut values = Vec::with_capacity(args.len());
                if let Some((receiver, rest)) = args.split_first() {
                    // The receiver is checked before any other argument is
                    // evaluated.
                    let receiver = match self.eval_link(receiver)? {
                        Some(Value::Null) if *optional => return Ok(None),
                        Some(receiver) => receiver,
                        None => return Ok(None),
                    };
                    values.push(receiver);
                    for arg in rest {
                        values.push(self.eval(arg)?);
                    }
                }
                builtin.call(values).map(Some)
            }
            Expr::OptionalChain(chain) => Ok(Some(self.eval_link(chain)?.unwrap_or_default())),
            _ => self.eval(expr).map(Some),
        }
    }
}

fn eval_index(target: Value, index: Value) -> Result<Value, EvalError> {
    match (&target, &index) {
        (Value::Array(arr), Value::Number(n)) => Ok(n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| arr.get(i))
            .cloned()
            .unwrap_or_default()),
        (Value::String(s), Value::Number(n)) => Ok(n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| s.chars().nth(i))
            .map(|ch| Value::String(ch.to_string()))
            .unwrap_or_default()),
        (Value::Object(_), Value::String(key)) => Ok(target.property(key)),
        (Value::Null, _) => Err(EvalError::NullAccess(index.to_string())),
        _ => Err(EvalError::InvalidIndex {
            target: target.type_name(),
            index: index.type_name(),
        }),
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let invalid = |left: &Value, right: &Value| EvalError::InvalidOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    };
    match op {
        BinaryOp::Eq => Ok(Value::Boolean(left == right)),
        BinaryOp::NotEq => Ok(Value::Boolean(left != right)),
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.checked_add(b)?)),
            (Value::String(mut a), b) => {
                a.push_str(&b.to_string());
                Ok(Value::String(a))
            }
            (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (a, b) => Err(invalid(&a, &b)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => {
                let (a, b) = (*a, *b);
                Ok(Value::Number(match op {
                    BinaryOp::Sub => a.checked_sub(b)?,
                    BinaryOp::Mul => a.checked_mul(b)?,
                    BinaryOp::Div => a.checked_div(b)?,
                    _ => a.checked_rem(b)?,
                }))
            }
            _ => Err(invalid(&left, &right)),
        },
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&left, &right) {
                // Comparisons against missing data are simply false.
                (Value::Null, _) | (_, Value::Null) => return Ok(Value::Boolean(false)),
                (Value::Number(a), Value::Number(b)) => a.cmp(b),
                (Value::String(a), Value::String(b)) => a.cmp(b),
                (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
                _ => return Err(invalid(&left, &right)),
            };
            Ok(Value::Boolean(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
    }
}
