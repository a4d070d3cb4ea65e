//! Installer host argument stack

use crate::error::{Result, UtilsError};

/// Value pushed in place of results when a call fails
pub const ERROR_SENTINEL: &str = "error";

/// Parse an integer argument as an unsigned value
///
/// Accepts decimal or `0x`-prefixed hexadecimal with surrounding whitespace.
/// A leading `-` is dropped, so negative arguments are taken by magnitude.
pub fn parse_uint(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let magnitude = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let parsed = match magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => magnitude.parse(),
    };
    parsed.map_err(|_| UtilsError::InvalidArgument(raw.to_string()))
}

/// The string stack shared between the installer script and its plugins
///
/// The last value pushed is the first one popped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostStack {
    items: Vec<String>,
}

impl HostStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a string
    pub fn push_str(&mut self, value: impl Into<String>) {
        self.items.push(value.into());
    }

    /// Push an unsigned integer in decimal
    pub fn push_uint(&mut self, value: u32) {
        self.items.push(value.to_string());
    }

    /// Push a boolean as `"1"` / `"0"`
    pub fn push_bool(&mut self, value: bool) {
        self.push_str(if value { "1" } else { "0" });
    }

    /// Pop a string
    pub fn pop_str(&mut self) -> Result<String> {
        self.items.pop().ok_or(UtilsError::StackUnderflow)
    }

    /// Pop an unsigned integer, see [`parse_uint`]
    pub fn pop_uint(&mut self) -> Result<u32> {
        parse_uint(&self.pop_str()?)
    }

    /// Pop `count` values, first popped first
    ///
    /// Everything available up to `count` is consumed even when the stack
    /// holds fewer values, so a short stack never leaves arguments behind.
    pub fn pop_many(&mut self, count: usize) -> Result<Vec<String>> {
        let available = count.min(self.items.len());
        let mut values = self.items.split_off(self.items.len() - available);
        values.reverse();
        if available < count {
            return Err(UtilsError::StackUnderflow);
        }
        Ok(values)
    }

    /// Peek at the top of the stack
    pub fn top(&self) -> Option<&str> {
        self.items.last().map(String::as_str)
    }

    /// Number of values on the stack
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pop everything, top first
    pub fn drain(&mut self) -> Vec<String> {
        let mut items = std::mem::take(&mut self.items);
        items.reverse();
        items
    }
}
