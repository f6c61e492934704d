//! Startup configuration from the process environment.
//!
//! Every required key is checked once, up front. A missing key is reported
//! as [`Error::MissingConfig`] naming all of them, instead of surfacing deep
//! inside a request.

use std::collections::HashMap;

use crate::error::Error;

/// Validated configuration values.
#[derive(Clone, Debug, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Reads `keys` from the environment. Fails if any of them is unset or
    /// not valid Unicode.
    pub fn from_env(keys: &[&str]) -> Result<Self, Error> {
        Self::from_lookup(keys, |key| std::env::var(key).ok())
    }

    /// Reads `keys` through `lookup`.
    pub fn from_lookup(
        keys: &[&str],
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let mut values = HashMap::with_capacity(keys.len());
        let mut missing = Vec::new();
        for &key in keys {
            match lookup(key) {
                Some(value) => {
                    values.insert(key.to_owned(), value);
                }
                None => missing.push(key.to_owned()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingConfig(missing));
        }
        Ok(Self { values })
    }

    /// A value validated at load time. `None` only for keys that were not
    /// requested.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Single-key form of [`Config::from_env`].
pub fn config_value(key: &str) -> Result<String, Error> {
    std::env::var(key).map_err(|_| Error::MissingConfig(vec![key.to_owned()]))
}
