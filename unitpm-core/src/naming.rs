//! Unit naming scheme: `{prefix}{id}-{name}`.
//!
//! Decoding is deliberately lenient after the prefix check. Units created
//! before ids existed are named `{prefix}{name}`; they decode as id `0` with
//! the whole remainder as the name. Names may contain `-`: only the first
//! separator splits id from name.

use std::fmt;

use crate::error::CoreError;

/// Prefix that marks units owned by unitpm.
pub const DEFAULT_PREFIX: &str = "pm2-";

/// Suffix of every unit file and unit name handled here.
pub const UNIT_SUFFIX: &str = ".service";

const SEPARATOR: char = '-';

/// Encoder/decoder for unit identifiers under one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNaming {
    prefix: String,
}

impl Default for UnitNaming {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl UnitNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `{prefix}{id}-{name}`
    pub fn encode(&self, id: u32, name: &str) -> String {
        format!("{}{}{}{}", self.prefix, id, SEPARATOR, name)
    }

    /// `{prefix}{id}-{name}.service`
    pub fn file_name(&self, id: u32, name: &str) -> String {
        format!("{}{}", self.encode(id, name), UNIT_SUFFIX)
    }

    /// Split a unit name (with or without `.service`) into `(id, name)`.
    ///
    /// Fails only when the prefix is missing.
    pub fn decode(&self, unit: &str) -> Result<(u32, String), CoreError> {
        let remainder = unit
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| CoreError::InvalidFormat {
                unit: unit.to_string(),
            })?;
        let remainder = remainder.strip_suffix(UNIT_SUFFIX).unwrap_or(remainder);

        let Some((id_part, name)) = remainder.split_once(SEPARATOR) else {
            return Ok((0, remainder.to_string()));
        };
        if id_part.is_empty() || !id_part.bytes().all(|b| b.is_ascii_digit()) {
            return Ok((0, remainder.to_string()));
        }
        match id_part.parse::<u32>() {
            Ok(id) => Ok((id, name.to_string())),
            Err(_) => Ok((0, remainder.to_string())),
        }
    }

    /// True for file names this scheme owns: prefixed and `.service`-suffixed.
    pub fn owns_file(&self, file_name: &str) -> bool {
        file_name.starts_with(self.prefix.as_str())
            && file_name.ends_with(UNIT_SUFFIX)
            && file_name.len() > self.prefix.len() + UNIT_SUFFIX.len()
    }
}

/// Caller-supplied reference to an app: decimal strings are ids, anything else a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Id(u32),
    Name(String),
}

impl Identifier {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u32>() {
            Ok(id) if raw.bytes().all(|b| b.is_ascii_digit()) => Identifier::Id(id),
            _ => Identifier::Name(raw.to_string()),
        }
    }

    pub fn matches(&self, id: u32, name: &str) -> bool {
        match self {
            Identifier::Id(want) => *want == id,
            Identifier::Name(want) => want == name,
        }
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Id(id) => write!(f, "{id}"),
            Identifier::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let naming = UnitNaming::default();
        assert_eq!(naming.encode(7, "api"), "pm2-7-api");
        assert_eq!(naming.file_name(7, "api"), "pm2-7-api.service");
    }

    #[test]
    fn decode_strips_service_suffix() {
        let naming = UnitNaming::default();
        assert_eq!(naming.decode("pm2-2-web.service").unwrap(), (2, "web".to_string()));
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let naming = UnitNaming::default();
        let err = naming.decode("nginx.service").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }

    #[test]
    fn owns_file_requires_prefix_and_suffix() {
        let naming = UnitNaming::default();
        assert!(naming.owns_file("pm2-0-a.service"));
        assert!(!naming.owns_file("pm2-0-a.service.tmp"));
        assert!(!naming.owns_file("sshd.service"));
        assert!(!naming.owns_file("pm2-.service"));
    }

    #[test]
    fn identifier_precedence() {
        assert_eq!(Identifier::parse("12"), Identifier::Id(12));
        assert_eq!(Identifier::parse("web"), Identifier::Name("web".into()));
        assert_eq!(Identifier::parse("+3"), Identifier::Name("+3".into()));
        assert_eq!(Identifier::parse("-1"), Identifier::Name("-1".into()));
    }
}
