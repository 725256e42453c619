//! The environment map consulted when expanding argument files.
//!
//! `-D NAME=VALUE` registrations land here so `${NAME}` and `$NAME` inside
//! `-f` files resolve; names not registered fall back to the process
//! environment.

use std::collections::HashMap;

/// Internal environment variables, layered over the process environment.
#[derive(Debug, Default)]
pub struct EnvMap {
    vars: HashMap<String, String>,
}

impl EnvMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overwrites) a variable.
    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Looks up a variable, falling back to the process environment.
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    /// Expands `${VAR}` and `$VAR` occurrences in `text`.
    ///
    /// Unknown variables expand to nothing, as a shell would with an unset
    /// variable.
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(dollar) = rest.find('$') {
            out.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];
            if let Some(brace_rest) = after.strip_prefix('{') {
                match brace_rest.find('}') {
                    Some(close) => {
                        let name = &brace_rest[..close];
                        if let Some(value) = self.get(name) {
                            out.push_str(&value);
                        }
                        rest = &brace_rest[close + 1..];
                    }
                    None => {
                        out.push('$');
                        rest = after;
                    }
                }
            } else {
                let len = after
                    .char_indices()
                    .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
                    .count();
                if len == 0 {
                    out.push('$');
                    rest = after;
                } else {
                    let name = &after[..len];
                    if let Some(value) = self.get(name) {
                        out.push_str(&value);
                    }
                    rest = &after[len..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}
