use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("phone number is empty")]
    Empty,
    #[error("phone number contains invalid characters: {0}")]
    InvalidCharacters(String),
    #[error("phone number has invalid length: {0} digits")]
    InvalidLength(usize),
}

/// E.164-style digit string accepted by the messaging gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes user input: strips the leading `+`, spaces, dashes and
    /// parentheses, then requires 10 to 15 digits.
    pub fn parse(input: &str) -> Result<Self, PhoneNumberError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let stripped = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let mut digits = String::with_capacity(stripped.len());
        for ch in stripped.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '(' | ')' | '.' => {}
                _ => return Err(PhoneNumberError::InvalidCharacters(trimmed.to_string())),
            }
        }

        if !(10..=15).contains(&digits.len()) {
            return Err(PhoneNumberError::InvalidLength(digits.len()));
        }

        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
