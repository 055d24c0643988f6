//! Compiling and running binding scripts.

use std::collections::hash_map::{Entry, HashMap};

use flexscript::{Inputs, Script, Value};
use log::{debug, trace};
use sha2::{Digest, Sha256};
use subtle_encoding::hex;

use crate::Error;

/// Compiled scripts, keyed by a hash of their source, so an unchanged
/// definition is only compiled once no matter how often it is re-evaluated
/// or how many views share it.
#[derive(Debug, Default)]
pub struct ScriptCache {
    scripts: HashMap<String, Script>,
}

impl ScriptCache {
    /// Returns the compiled script for the given binding definition,
    /// compiling it first if we haven't seen it before.
    pub fn compile(&mut self, def: &str) -> Result<&Script, flexscript::Error> {
        let hash = sha256(def);
        match self.scripts.entry(hash) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let script = Script::compile(def)?;
                debug!("Compiled script with hash {}", entry.key());
                Ok(entry.insert(script))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Evaluates a binding's script for every item. Fails on the first item for
/// which evaluation fails, producing no partial results.
pub fn evaluate(name: &str, script: &Script, inputs: &[Inputs]) -> Result<Vec<Value>, Error> {
    inputs
        .iter()
        .map(|item| {
            let result = script.eval(item).map_err(|err| Error::Eval {
                name: name.to_string(),
                id: item.id().to_string(),
                err,
            })?;
            trace!("{} = {:?}", name, result);
            Ok(result)
        })
        .collect()
}

/// Compute the SHA256 hash of the given string and return its lowercase
/// hexadecimal representation.
fn sha256<S: AsRef<str>>(s: S) -> String {
    let digest = Sha256::digest(s.as_ref());
    hex::encode(digest).into_iter().map(char::from).collect()
}
