//! Centralized environment-variable parsing helpers.
//!
//! Every tuning knob read from the environment goes through these helpers so
//! the trimming and error reporting live in one place. The lookup is passed in
//! so callers (and tests) can substitute something other than the process
//! environment.

use crate::error::{SatError, SatResult};
use std::fmt::Display;
use std::str::FromStr;

/// Reads `var_name` from the process environment, treating unset and blank alike.
pub(crate) fn process_env(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Parses `var_name` when it is set. A value that does not parse is an error,
/// never silently ignored.
pub(crate) fn env_var_parse<T, F>(lookup: &F, var_name: &str) -> SatResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| SatError::InvalidConfig(format!("{var_name}={raw}: {err}"))),
    }
}

/// Parses a box size written as `HxW`, or a single number used for both sides.
pub(crate) fn parse_size(raw: &str) -> SatResult<(usize, usize)> {
    let invalid = |reason: &str| SatError::InvalidConfig(format!("size `{raw}`: {reason}"));
    let mut parts = raw.trim().split(['x', 'X']);
    let height: usize = parts
        .next()
        .ok_or_else(|| invalid("empty"))?
        .trim()
        .parse()
        .map_err(|_| invalid("height is not a number"))?;
    let width: usize = match parts.next() {
        Some(width) => width.trim().parse().map_err(|_| invalid("width is not a number"))?,
        None => height,
    };
    if parts.next().is_some() {
        return Err(invalid("expected HxW"));
    }
    Ok((height, width))
}
