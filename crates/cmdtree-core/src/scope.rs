//! Synchronization scopes
//!
//! A [`Scope`] is either the singleton global command tree or the tree of a
//! single guild. Scopes are independent of each other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Opaque 64-bit guild identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GuildId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(GuildId)
            .map_err(|_| Error::InvalidScope {
                input: s.to_string(),
            })
    }
}

/// A synchronization target.
///
/// Textual form is `global` or `guild:<id>`, parsed without regard to case.
/// A bare integer also parses as a guild scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scope {
    Global,
    Guild(GuildId),
}

impl Scope {
    pub fn guild(id: u64) -> Self {
        Scope::Guild(GuildId(id))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        match self {
            Scope::Global => None,
            Scope::Guild(id) => Some(*id),
        }
    }
}

impl From<GuildId> for Scope {
    fn from(id: GuildId) -> Self {
        Scope::Guild(id)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Guild(id) => write!(f, "guild:{}", id),
        }
    }
}

const GUILD_PREFIX: &str = "guild:";

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("global") {
            return Ok(Scope::Global);
        }
        let id = match trimmed.get(..GUILD_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(GUILD_PREFIX) => {
                &trimmed[GUILD_PREFIX.len()..]
            }
            _ => trimmed,
        };
        id.parse::<GuildId>()
            .map(Scope::Guild)
            .map_err(|_| Error::InvalidScope {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for Scope {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("global", Scope::Global)]
    #[case("GLOBAL", Scope::Global)]
    #[case("guild:123", Scope::guild(123))]
    #[case("826138485743288330", Scope::guild(826138485743288330))]
    #[case(" guild:5 ", Scope::guild(5))]
    #[case("GUILD:5", Scope::guild(5))]
    #[case("Guild:77", Scope::guild(77))]
    fn parses_scope_strings(#[case] input: &str, #[case] expected: Scope) {
        assert_eq!(input.parse::<Scope>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("guild:")]
    #[case("guild:abc")]
    #[case("-1")]
    #[case("GUILD:")]
    fn rejects_malformed_scopes(#[case] input: &str) {
        let err = input.parse::<Scope>().unwrap_err();
        assert!(matches!(err, Error::InvalidScope { .. }));
    }

    #[test]
    fn display_matches_parse() {
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::guild(42).to_string(), "guild:42");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Scope::guild(9)).unwrap();
        assert_eq!(json, "\"guild:9\"");
        let back: Scope = serde_json::from_str("\"global\"").unwrap();
        assert_eq!(back, Scope::Global);
    }

    #[test]
    fn guild_and_global_are_distinct() {
        assert_ne!(Scope::Global, Scope::guild(0));
        assert_eq!(Scope::guild(1).guild_id(), Some(GuildId(1)));
        assert!(Scope::Global.guild_id().is_none());
    }
}
