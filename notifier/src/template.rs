//! Build environment and placeholder expansion
//!
//! Supports `${NAME}` and `%NAME%` placeholders. Unknown variables stay in the
//! output verbatim, and substituted values are not expanded again.

use std::collections::HashMap;
use std::ffi::OsString;

use tracing::warn;

/// Build-time environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Build from raw OS pairs. Names that are not UTF-8 are skipped, values
    /// that are not UTF-8 are converted lossily.
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = Self::new();
        for (name, value) in vars {
            let name = match name.into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(
                        "Skipping environment variable with a non-UTF-8 name: {}",
                        raw.to_string_lossy()
                    );
                    continue;
                }
            };
            let value = match value.into_string() {
                Ok(value) => value,
                Err(raw) => {
                    // the value may be a secret, log the name only
                    warn!("Environment variable {} is not valid UTF-8", name);
                    raw.to_string_lossy().into_owned()
                }
            };
            env.vars.insert(name, value);
        }
        env
    }

    /// Set a variable, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Substitute every resolvable placeholder in `input`
    pub fn expand(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find(['$', '%']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match self.placeholder(tail) {
                Some((value, consumed)) => {
                    out.push_str(value);
                    rest = &tail[consumed..];
                }
                None => {
                    // delimiters are ASCII, so slicing one byte is safe
                    out.push_str(&tail[..1]);
                    rest = &tail[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Resolve a placeholder at the start of `tail`, returning the value and the
    /// number of bytes it spans.
    fn placeholder(&self, tail: &str) -> Option<(&str, usize)> {
        let (name, consumed) = if let Some(body) = tail.strip_prefix("${") {
            let end = body.find('}')?;
            (&body[..end], end + 3)
        } else if let Some(body) = tail.strip_prefix('%') {
            let end = body.find('%')?;
            (&body[..end], end + 2)
        } else {
            return None;
        };

        if !is_variable_name(name) {
            return None;
        }

        self.get(name).map(|value| (value, consumed))
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl From<HashMap<String, String>> for Environment {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
