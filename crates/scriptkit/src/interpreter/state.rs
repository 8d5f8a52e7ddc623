//! Interpreter state types

use std::collections::HashMap;

/// Keys rebound whenever positional arguments change (besides `1..N`).
const ARG_COUNT: &str = "#";
const ARG_LIST: &str = "@";
const SCRIPT_NAME: &str = "0";
const LAST_STATUS: &str = "?";

/// Variables of one script run.
///
/// A single store is shared by the top-level script and every nested block,
/// so ordinary assignments made inside an `if` or loop body stay visible
/// afterwards. Positional parameters are the exception: nested blocks see an
/// empty argument list, and the caller's arguments come back when the block
/// finishes (see [`VariableStore::enter_block`]).
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: HashMap<String, String>,
    arg_count: usize,
}

/// Positional bindings saved by [`VariableStore::enter_block`].
#[derive(Debug)]
#[must_use = "pass the frame back to VariableStore::leave_block"]
pub(crate) struct PositionalFrame {
    saved: Vec<(String, Option<String>)>,
    arg_count: usize,
}

impl VariableStore {
    /// Create the store for a run of `script_name` with `args`.
    pub fn new(script_name: &str, args: &[String]) -> Self {
        let mut store = Self::default();
        store.set(SCRIPT_NAME, script_name);
        store.set(LAST_STATUS, "0");
        store.bind_args(args);
        store
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Set a variable. Reserved names are not protected; last write wins.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), value.into());
    }

    /// Record the exit code of the most recent command as `$?`.
    pub fn set_last_status(&mut self, code: i32) {
        self.set(LAST_STATUS, code.to_string());
    }

    /// Iterate over every bound variable, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Switch to a nested block's empty argument list.
    pub(crate) fn enter_block(&mut self) -> PositionalFrame {
        let mut keys: Vec<String> = (1..=self.arg_count).map(|i| i.to_string()).collect();
        keys.push(ARG_COUNT.to_string());
        keys.push(ARG_LIST.to_string());

        let saved = keys
            .into_iter()
            .map(|key| {
                let value = self.vars.get(&key).cloned();
                (key, value)
            })
            .collect();
        let frame = PositionalFrame {
            saved,
            arg_count: self.arg_count,
        };

        self.bind_args(&[]);
        frame
    }

    /// Restore the positional bindings saved by `enter_block`.
    pub(crate) fn leave_block(&mut self, frame: PositionalFrame) {
        self.clear_args();
        for (key, value) in frame.saved {
            match value {
                Some(value) => {
                    self.vars.insert(key, value);
                }
                None => {
                    self.vars.remove(&key);
                }
            }
        }
        self.arg_count = frame.arg_count;
    }

    fn bind_args(&mut self, args: &[String]) {
        self.clear_args();
        for (index, arg) in args.iter().enumerate() {
            self.set(&(index + 1).to_string(), arg.as_str());
        }
        self.set(ARG_COUNT, args.len().to_string());
        self.set(ARG_LIST, args.join(" "));
        self.arg_count = args.len();
    }

    fn clear_args(&mut self) {
        for index in 1..=self.arg_count {
            self.vars.remove(&index.to_string());
        }
    }
}
