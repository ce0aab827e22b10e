//! Palette colors.

use std::fmt;
use std::str::FromStr;

/// An opaque RGB color parsed from `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Upper-case `#RRGGBB` form.
    pub fn hex(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#RRGGBB` or `RRGGBB`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid hex color '{}'", s));
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("#FF8000".parse::<Color>(), Ok(Color::new(255, 128, 0)));
        assert_eq!("00ff7f".parse::<Color>(), Ok(Color::new(0, 255, 127)));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!("#FFF".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let color: Color = "#a1b2c3".parse().unwrap();
        assert_eq!(color.hex(), "#A1B2C3");
    }
}
