//! # Function Signature Table
//!
//! Every callable the parser can resolve is described by a [`FunctionSignature`]:
//! one set of accepted particles per formal argument, in declaration order.
//! Call sites are matched against these sets rather than against argument position,
//! so `AにBを足す` and `BをAに足す` resolve to the same call.
//!
//! The table is seeded by the host (built-in and plugin functions), extended by the
//! lexer's pre-declaration pass, and only read by the parser.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Accepted particles, one set per argument.
    pub josi: Vec<Vec<String>>,
    #[serde(default)]
    pub varnames: Vec<String>,
    /// Marks arguments that must receive a callable reference.
    #[serde(default)]
    pub func_pointers: Vec<bool>,
}

impl FunctionSignature {
    pub fn new(josi: Vec<Vec<String>>) -> Self {
        Self {
            josi,
            varnames: Vec::new(),
            func_pointers: Vec::new(),
        }
    }

    /// Builds a signature from particle literals, e.g. `&[&["に", "と"], &["を"]]`.
    pub fn from_josi(sets: &[&[&str]]) -> Self {
        Self::new(
            sets.iter()
                .map(|set| set.iter().map(|j| j.to_string()).collect())
                .collect(),
        )
    }

    pub fn arity(&self) -> usize {
        self.josi.len()
    }

    pub fn is_func_pointer(&self, index: usize) -> bool {
        self.func_pointers.get(index).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuncList {
    entries: HashMap<String, FunctionSignature>,
}

impl FuncList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later definitions replace earlier ones under the same name.
    pub fn insert<S: Into<String>>(&mut self, name: S, signature: FunctionSignature) {
        self.entries.insert(name.into(), signature);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn extend(&mut self, other: &FuncList) {
        for (name, sig) in &other.entries {
            self.entries.insert(name.clone(), sig.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
