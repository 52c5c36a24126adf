//! printf-style value formats used by the sensor configuration.
//!
//! A format holds exactly one conversion, optionally surrounded by literal
//! text: `"%.1f"`, `"%2.2f"`, `"%d"`, `"%.3f v"`.
//! Supported flags are `-` (left align), `+` (always sign), ` ` (space for
//! positive) and `0` (zero pad); conversions are `f`/`F` and `d`/`i`.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Largest accepted field width or precision.
pub const MAX_FIELD: usize = 64;

/// Error raised for a malformed format string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid format '{spec}': {reason}")]
pub struct FormatError {
    pub spec: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Fixed,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
}

/// A parsed value format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    raw: String,
    prefix: String,
    suffix: String,
    flags: Flags,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

impl FormatSpec {
    /// Parse a printf-style format.
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let fail = |reason| FormatError {
            spec: spec.to_string(),
            reason,
        };

        let (prefix, rest) = spec.split_once('%').ok_or_else(|| fail("missing '%' conversion"))?;
        let mut chars = rest.char_indices().peekable();

        let mut flags = Flags::default();
        while let Some(&(_, c)) = chars.peek() {
            match c {
                '-' => flags.left = true,
                '+' => flags.plus = true,
                ' ' => flags.space = true,
                '0' => flags.zero = true,
                _ => break,
            }
            chars.next();
        }

        let width = parse_field(&mut chars).ok_or_else(|| fail("width too large"))?;

        let mut precision = None;
        if let Some(&(_, '.')) = chars.peek() {
            chars.next();
            precision = Some(parse_field(&mut chars).ok_or_else(|| fail("precision too large"))?);
        }

        let (idx, conv) = chars.next().ok_or_else(|| fail("missing conversion character"))?;
        let conversion = match conv {
            'f' | 'F' => Conversion::Fixed,
            'd' | 'i' => Conversion::Integer,
            _ => return Err(fail("unsupported conversion (expected f or d)")),
        };

        let suffix = &rest[idx + conv.len_utf8()..];
        if suffix.contains('%') {
            return Err(fail("more than one conversion"));
        }

        Ok(Self {
            raw: spec.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            flags,
            width,
            precision,
            conversion,
        })
    }

    /// Render a value with this format.
    pub fn format(&self, value: f64) -> String {
        let body = match self.conversion {
            Conversion::Fixed => format!("{:.*}", self.precision.unwrap_or(6), value.abs()),
            Conversion::Integer => (value.trunc() as i64).unsigned_abs().to_string(),
        };

        let negative = match self.conversion {
            Conversion::Fixed => value.is_sign_negative(),
            Conversion::Integer => value.trunc() < 0.0,
        };
        let sign = if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        };

        let len = sign.len() + body.len();
        let padded = if self.width <= len {
            format!("{sign}{body}")
        } else {
            let fill = self.width - len;
            if self.flags.left {
                format!("{sign}{body}{}", " ".repeat(fill))
            } else if self.flags.zero {
                format!("{sign}{}{body}", "0".repeat(fill))
            } else {
                format!("{}{sign}{body}", " ".repeat(fill))
            }
        };

        format!("{}{}{}", self.prefix, padded, self.suffix)
    }

    /// The format string as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Read a run of digits, `None` once it exceeds [`MAX_FIELD`].
fn parse_field(chars: &mut Peekable<CharIndices<'_>>) -> Option<usize> {
    let mut value = 0usize;
    while let Some(&(_, c)) = chars.peek() {
        let Some(d) = c.to_digit(10) else { break };
        value = value.checked_mul(10)?.checked_add(d as usize)?;
        if value > MAX_FIELD {
            return None;
        }
        chars.next();
    }
    Some(value)
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            raw: "%.2f".to_string(),
            prefix: String::new(),
            suffix: String::new(),
            flags: Flags::default(),
            width: 0,
            precision: Some(2),
            conversion: Conversion::Fixed,
        }
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for FormatSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, v: f64) -> String {
        FormatSpec::parse(spec).unwrap().format(v)
    }

    #[test]
    fn test_fixed_precision() {
        assert_eq!(fmt("%.1f", 48.31), "48.3");
        assert_eq!(fmt("%.3f", 1.0), "1.000");
        assert_eq!(fmt("%f", 0.5), "0.500000");
    }

    #[test]
    fn test_width_and_padding() {
        assert_eq!(fmt("%2.2f", 0.5), "0.50");
        assert_eq!(fmt("%6.2f", 1.5), "  1.50");
        assert_eq!(fmt("%-6.1f|", 1.5), "1.5   |");
        assert_eq!(fmt("%06.1f", -1.5), "-001.5");
    }

    #[test]
    fn test_signs() {
        assert_eq!(fmt("%+.2f", 3.0), "+3.00");
        assert_eq!(fmt("%+.2f", -3.0), "-3.00");
        assert_eq!(fmt("% d", 7.0), " 7");
    }

    #[test]
    fn test_integer_truncates() {
        assert_eq!(fmt("%d", 21045.9), "21045");
        assert_eq!(fmt("%d", -2.7), "-2");
    }

    #[test]
    fn test_literal_text() {
        assert_eq!(fmt("%.1f C", 41.86), "41.9 C");
        assert_eq!(fmt("v=%.4fv", 0.25), "v=0.2500v");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(FormatSpec::parse("plain").is_err());
        assert!(FormatSpec::parse("%").is_err());
        assert!(FormatSpec::parse("%.2x").is_err());
        assert!(FormatSpec::parse("%d/%d").is_err());
    }

    #[test]
    fn test_rejects_oversized_fields() {
        let err = FormatSpec::parse("%99999999999999999999999.1f").unwrap_err();
        assert_eq!(err.reason, "width too large");
        let err = FormatSpec::parse("%.99999999999999999999999f").unwrap_err();
        assert_eq!(err.reason, "precision too large");
        assert!(FormatSpec::parse("%65.1f").is_err());
        assert_eq!(fmt("%64.1f", 1.0).len(), 64);
    }

    #[test]
    fn test_negative_values_that_round_to_zero_keep_sign() {
        assert_eq!(fmt("%.2f", -0.001), "-0.00");
        assert_eq!(fmt("%.1f", 0.0), "0.0");
        assert_eq!(fmt("%d", -0.5), "0");
    }

    #[test]
    fn test_default_and_display() {
        let spec = FormatSpec::default();
        assert_eq!(spec.format(1.234), "1.23");
        assert_eq!(spec.to_string(), "%.2f");
        assert_eq!(FormatSpec::parse("%.1f C").unwrap().as_str(), "%.1f C");
    }
}
