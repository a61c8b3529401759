//! Registry token newtypes (`CandidateId`, `PositionId`) with strict charset.
//!
//! Tokens are 1..=64 chars from `[A-Za-z0-9_: .-]` minus space; the lexical
//! `Ord` on the inner string is the canonical tie-break / iteration order for
//! the whole engine, so these types deliberately derive `Ord`.

use crate::errors::CoreError;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn is_token(s: &str) -> bool {
    let len = s.len();
    if !(1..=64).contains(&len) {
        return false;
    }
    s.bytes().all(|b| {
        matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'-' | b':' | b'.'
        )
    })
}

macro_rules! def_token {
    ($name:ident) => {
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_token(s) {
                    Ok(Self(s.to_string()))
                } else {
                    Err(CoreError::InvalidId)
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(t: $name) -> String {
                t.0
            }
        }
    };
}

def_token!(CandidateId);
def_token!(PositionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_charset_enforced() {
        assert!("S0001".parse::<CandidateId>().is_ok());
        assert!("INT-42.a:b".parse::<PositionId>().is_ok());
        assert!("".parse::<CandidateId>().is_err());
        assert!("has space".parse::<CandidateId>().is_err());
        assert!("x".repeat(65).parse::<PositionId>().is_err());
    }

    #[test]
    fn ordering_is_lexical() {
        let a: CandidateId = "S0001".parse().unwrap();
        let b: CandidateId = "S0002".parse().unwrap();
        assert!(a < b);
    }
}
