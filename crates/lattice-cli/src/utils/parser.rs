use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid override format: '{0}'. Expected KEY=VALUE (e.g., 'solver.num-cores=8').")]
    MissingSeparator(String),

    #[error("Override '{0}' has an empty key.")]
    EmptyKey(String),

    #[error("Invalid {expected} value for '{key}': '{value}'")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Splits a `KEY=VALUE` override at the first `=`; surrounding whitespace is dropped.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value.trim()))
}

pub fn parse_value<T: FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}
