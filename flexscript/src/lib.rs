//! FlexScript is a small expression language for computing one value per item
//! of a dataset, e.g. filter predicates and sort keys.
//!
//! Scripts have no ambient access: the only names in scope are the item's
//! inputs (`id`, `value`, `metadata` and `tags`), `let`-bound locals and a
//! fixed set of builtin functions. There are no loops or user-defined
//! functions, so evaluation always terminates.
//!
//! ```
//! use flexscript::{Inputs, Script, Value};
//!
//! let script = Script::compile("return tags.includes(\"cat\")").unwrap();
//! let tags = Value::from(vec![Value::from("cat")]);
//! let inputs = Inputs::new("img-1").with_tags(tags);
//! assert_eq!(script.eval(&inputs).unwrap(), Value::Boolean(true));
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod builtins;
pub mod encoding;
mod error;
mod eval;
mod number;
pub mod parser;
mod prelude;
mod script;
mod value;

pub use error::{Error, EvalError, ParseError};
pub use eval::Inputs;
pub use number::{Fixed, Number};
pub use script::Script;
pub use value::Value;
