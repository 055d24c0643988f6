//! Compiled scripts.

use core::str::FromStr;

use crate::eval::eval_program;
use crate::parser::{Program, Utf8Parser};
use crate::prelude::*;
use crate::{Error, Inputs, Value};

/// A compiled script, ready to be evaluated against any number of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    source: String,
    program: Program,
}

impl Script {
    /// Parses and resolves the given source. All syntax errors, references to
    /// unknown names and wrong builtin argument counts are reported here
    /// rather than during evaluation.
    pub fn compile(source: &str) -> Result<Self, Error> {
        let program = Utf8Parser::new(source)?.parse_program()?;
        Ok(Self {
            source: source.to_string(),
            program,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the script for one item.
    pub fn eval(&self, inputs: &Inputs) -> Result<Value, Error> {
        Ok(eval_program(&self.program, inputs)?)
    }
}

impl FromStr for Script {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use super::*;
    use crate::parser::MAX_DEPTH;
    use crate::{EvalError, Number, ParseError};
    use fixed_macro::fixed;

    fn item() -> Inputs {
        let mut exif = BTreeMap::new();
        exif.insert("width".to_string(), Value::from(640_u64));
        exif.insert("height".to_string(), Value::from(480_u64));
        let mut metadata = BTreeMap::new();
        metadata.insert("exif".to_string(), Value::Object(exif));
        metadata.insert("title".to_string(), Value::from("Sunset Over Water"));
        metadata.insert("rating".to_string(), Value::from(4_u64));
        Inputs::new("img-007")
            .with_value(Value::from(640_u64))
            .with_metadata(Value::Object(metadata))
            .with_tags(Value::from(vec!["beach", "sunset"]))
    }

    fn eval(src: &str) -> Result<Value, Error> {
        Script::compile(src)?.eval(&item())
    }

    #[test]
    fn default_bindings() {
        assert_eq!(eval("return true").unwrap(), Value::Boolean(true));
        assert_eq!(eval("return 0").unwrap(), Value::from(0_u64));
        assert_eq!(eval("").unwrap(), Value::Null);
    }

    #[test]
    fn reads_inputs() {
        assert_eq!(eval("id").unwrap(), Value::from("img-007"));
        assert_eq!(eval("return value / 2").unwrap(), Value::from(320_u64));
        assert_eq!(
            eval("metadata.exif.width / metadata.exif.height").unwrap(),
            Value::Number(Number::Unsigned(4).checked_div(Number::Unsigned(3)).unwrap())
        );
        assert_eq!(eval("meta['title'].length").unwrap(), Value::from(17_u64));
        assert_eq!(eval("tags[1]").unwrap(), Value::from("sunset"));
        assert_eq!(eval("tags[5]").unwrap(), Value::Null);
    }

    #[test]
    fn filters() {
        let filter = "let t = lower(meta.title); return tags.includes('beach') && t.includes('sunset')";
        assert_eq!(eval(filter).unwrap(), Value::Boolean(true));
        assert_eq!(
            eval("meta.rating >= 4 ? 'good' : 'meh'").unwrap(),
            Value::from("good")
        );
        assert_eq!(eval("meta.missing > 3").unwrap(), Value::Boolean(false));
        assert_eq!(eval("meta.missing ?? 'n/a'").unwrap(), Value::from("n/a"));
        assert_eq!(eval("meta.missing || meta.rating").unwrap(), Value::from(4_u64));
        assert!(eval("meta.missing && boom.x").is_err());
    }

    #[test]
    fn sort_keys() {
        assert_eq!(eval("-meta.rating").unwrap(), Value::from(-4_i64));
        assert_eq!(
            eval("[meta.rating, id]").unwrap(),
            Value::from(vec![Value::from(4_u64), Value::from("img-007")])
        );
        assert_eq!(
            eval("meta.rating * 0.5").unwrap(),
            Value::Number(Number::Fixed(fixed!(2: I64F64)))
        );
    }

    #[test]
    fn strings_concatenate() {
        assert_eq!(eval("id + ':' + meta.rating").unwrap(), Value::from("img-007:4"));
        assert_eq!(eval("1 + '1'").unwrap(), Value::from("11"));
    }

    #[test]
    fn objects() {
        let result = eval("{ w: meta.exif.width, 'tag count': len(tags) }").unwrap();
        let obj = result.as_object().unwrap();
        assert_eq!(obj.get("w"), Some(&Value::from(640_u64)));
        assert_eq!(obj.get("tag count"), Some(&Value::from(2_u64)));
    }

    #[test]
    fn null_access() {
        assert_eq!(
            eval("meta.missing.deeper"),
            Err(Error::Eval(EvalError::NullAccess("deeper".to_string())))
        );
        assert_eq!(eval("meta.missing?.deeper").unwrap(), Value::Null);
        assert_eq!(eval("meta.missing?.includes('x')").unwrap(), Value::Null);
    }

    #[test]
    fn optional_chains_short_circuit() {
        let no_metadata = Inputs::new("img-008");
        let eval_bare = |src: &str| -> Result<Value, Error> {
            Script::compile(src)?.eval(&no_metadata)
        };
        // Everything after a `?.` on null is skipped.
        assert_eq!(eval_bare("metadata?.exif.width").unwrap(), Value::Null);
        assert_eq!(eval_bare("metadata?.exif[0].length").unwrap(), Value::Null);
        assert_eq!(eval_bare("metadata?.title.lower()").unwrap(), Value::Null);
        // Arguments are not evaluated when the receiver is null.
        assert_eq!(
            eval_bare("metadata?.includes(metadata.x)").unwrap(),
            Value::Null
        );
        // Parentheses end the chain.
        assert_eq!(
            eval_bare("(metadata?.exif).width"),
            Err(Error::Eval(EvalError::NullAccess("width".to_string())))
        );
        assert_eq!(eval("metadata?.exif.width").unwrap(), Value::from(640_u64));
    }

    #[test]
    fn nesting_up_to_the_limit_fits_on_a_thread() {
        fn nested(open: &str, inner: &str, close: &str, levels: usize) -> String {
            open.repeat(levels) + inner + &close.repeat(levels)
        }

        // The outermost expression counts as the first level, and so does
        // every operator below it.
        let levels = MAX_DEPTH - 1;
        let handle = std::thread::spawn(move || {
            let parens = eval(&nested("(", "value", ")", levels)).unwrap();
            assert_eq!(parens, Value::from(640_u64));

            let calls = eval(&nested("abs(", "2", ")", levels)).unwrap();
            assert_eq!(calls, Value::from(2_u64));

            let mut arrays = eval(&nested("[", "id", "]", levels)).unwrap();
            for _ in 0..levels {
                arrays = arrays.as_array().unwrap()[0].clone();
            }
            assert_eq!(arrays, Value::from("img-007"));

            let ternaries = nested("true ? ", "1", " : 0", levels);
            assert_eq!(eval(&ternaries).unwrap(), Value::from(1_u64));

            assert!(matches!(
                eval(&nested("(", "1", ")", MAX_DEPTH)),
                Err(Error::Parse {
                    err: ParseError::TooDeeplyNested { .. },
                    ..
                })
            ));
        });
        handle.join().unwrap();
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(
            eval("meta.rating / 0"),
            Err(Error::Eval(EvalError::DivisionByZero))
        );
        assert_eq!(
            eval("tags - 1"),
            Err(Error::Eval(EvalError::InvalidOperands {
                op: "-",
                left: "array",
                right: "number",
            }))
        );
        assert_eq!(
            eval("-id"),
            Err(Error::Eval(EvalError::InvalidOperand {
                op: "-",
                operand: "string",
            }))
        );
        assert!(matches!(eval("id < 3"), Err(Error::Eval(EvalError::InvalidOperands { .. }))));
    }

    #[test]
    fn compile_errors_are_located() {
        match Script::compile("let a = 1;\nreturn a +") {
            Err(Error::Parse { location, .. }) => assert_eq!(location.line, 2),
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert!("return".parse::<Script>().is_ok());
    }
}
