// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const ID_MAX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ProductId(String);

impl ProductId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("product_id"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("product_id"));
        }
        if input.len() > ID_MAX_LEN {
            return Err(ParseError::TooLong("product_id", ID_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct TransactionId(String);

impl TransactionId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("transaction_id"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("transaction_id"));
        }
        if input.len() > ID_MAX_LEN {
            return Err(ParseError::TooLong("transaction_id", ID_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_accepts_generated_shape() {
        let id = ProductId::parse("SHI-M-LX2V9K-A3F7Q").expect("parse");
        assert_eq!(id.as_str(), "SHI-M-LX2V9K-A3F7Q");
    }

    #[test]
    fn product_id_rejects_empty_and_padded() {
        assert_eq!(ProductId::parse(""), Err(ParseError::Empty("product_id")));
        assert_eq!(
            ProductId::parse(" SHI-M-X "),
            Err(ParseError::Trimmed("product_id"))
        );
    }

    #[test]
    fn transaction_id_rejects_oversized() {
        let long = "T".repeat(ID_MAX_LEN + 1);
        assert_eq!(
            TransactionId::parse(&long),
            Err(ParseError::TooLong("transaction_id", ID_MAX_LEN))
        );
    }
}
