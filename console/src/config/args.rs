//! Command line arguments
//!
//! Arguments are `--key=value` pairs or bare `--flag`s; anything else is
//! ignored.

use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::ConsoleError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    values: HashMap<String, String>,
}

impl CliArgs {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = HashMap::new();
        for arg in args {
            let arg = arg.as_ref();
            if let Some((key, value)) = arg.split_once('=') {
                let clean_key = key.trim_start_matches('-');
                values.insert(clean_key.to_string(), value.to_string());
            } else if arg.starts_with("--") {
                let clean_key = arg.trim_start_matches('-');
                values.insert(clean_key.to_string(), "true".to_string());
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Parse a value, naming the argument on failure
    pub fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConsoleError> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    ConsoleError::ConfigError(format!("invalid value for --{}: {:?}", key, raw))
                })
            })
            .transpose()
    }

    /// A value that must be present and non-empty
    pub fn required(&self, key: &str) -> Result<&str, ConsoleError> {
        match self.get(key) {
            Some(value) if !value.is_empty() && value != "true" => Ok(value),
            _ => Err(ConsoleError::ConfigError(format!("--{}=<value> is required", key))),
        }
    }
}
