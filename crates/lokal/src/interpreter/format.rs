//! Number formatting for `{expr:format}` dynamic values.
//!
//! A [`FormatRegistry`] asks its handlers in registration order; the first
//! one that accepts the spec wins. Specs no handler accepts are tried as
//! standard numeric formats (`F2`, `N0`, `D3`, `P1`, `E2`), and anything else
//! falls back to the plain rendering of the number.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::types::Value;

/// Formats a number for a spec it recognizes.
pub trait FormatHandler: Send + Sync {
    /// Returns `None` if this handler does not recognize `spec`. `formats` is
    /// the registry the handler is part of, for specs that wrap other specs.
    fn format(&self, value: f64, spec: &str, formats: &FormatRegistry) -> Option<String>;
}

impl<F> FormatHandler for F
where
    F: Fn(f64, &str) -> Option<String> + Send + Sync,
{
    fn format(&self, value: f64, spec: &str, _formats: &FormatRegistry) -> Option<String> {
        self(value, spec)
    }
}

/// Ordered set of format handlers.
#[derive(Default)]
pub struct FormatRegistry {
    handlers: Vec<Box<dyn FormatHandler>>,
}

impl Debug for FormatRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FormatRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl FormatRegistry {
    /// A registry with no handlers; only standard formats apply.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the signed, permille and byte-size handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SignedFormat);
        registry.register(PermilleFormat);
        registry.register(ByteSizeFormat);
        registry
    }

    /// Adds a handler after the existing ones.
    pub fn register(&mut self, handler: impl FormatHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Formats `value` according to `spec`.
    ///
    /// ```
    /// use lokal::FormatRegistry;
    ///
    /// let formats = FormatRegistry::with_defaults();
    /// assert_eq!(formats.format(12.34, "F1"), "12.3");
    /// assert_eq!(formats.format(5.0, "+F0"), "+5");
    /// assert_eq!(formats.format(1536.0, "bytes"), "1.5 KB");
    /// ```
    pub fn format(&self, value: f64, spec: &str) -> String {
        if spec.is_empty() {
            return Value::Float(value).to_string();
        }
        self.handlers
            .iter()
            .find_map(|handler| handler.format(value, spec, self))
            .or_else(|| standard_format(value, spec))
            .unwrap_or_else(|| Value::Float(value).to_string())
    }

    /// Formats a value: numbers through [`format`](Self::format), strings
    /// unchanged. Integers without a spec keep their integer rendering.
    pub fn format_value(&self, value: &Value, spec: Option<&str>) -> String {
        match (value, spec) {
            (Value::String(s), _) => s.clone(),
            (_, None) => value.to_string(),
            (_, Some(spec)) => self.format(value.as_f64().unwrap_or_default(), spec),
        }
    }
}

/// `+<spec>`: always shows the sign.
#[derive(Debug, Clone, Copy)]
pub struct SignedFormat;

impl FormatHandler for SignedFormat {
    fn format(&self, value: f64, spec: &str, formats: &FormatRegistry) -> Option<String> {
        let rest = spec.strip_prefix('+')?;
        let body = formats.format(value, rest);
        if body.starts_with('-') {
            Some(body)
        } else {
            Some(format!("+{body}"))
        }
    }
}

/// `‰` or `‰N`: the value in thousandths with N decimals (default 0).
#[derive(Debug, Clone, Copy)]
pub struct PermilleFormat;

impl FormatHandler for PermilleFormat {
    fn format(&self, value: f64, spec: &str, _formats: &FormatRegistry) -> Option<String> {
        let digits = spec.strip_prefix('‰')?;
        let precision = precision(digits, 0)?;
        Some(format!("{:.precision$}‰", value * 1000.0))
    }
}

/// `bytes` or `bytesN`: a binary byte size with N decimals (default 1).
#[derive(Debug, Clone, Copy)]
pub struct ByteSizeFormat;

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

impl FormatHandler for ByteSizeFormat {
    fn format(&self, value: f64, spec: &str, _formats: &FormatRegistry) -> Option<String> {
        let digits = spec.strip_prefix("bytes")?;
        let precision = precision(digits, 1)?;

        let mut scaled = value;
        let mut unit = 0;
        while scaled.abs() >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
            scaled /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            Some(format!("{scaled:.0} B"))
        } else {
            Some(format!("{scaled:.precision$} {}", BYTE_UNITS[unit]))
        }
    }
}

/// Parses a precision suffix; empty means `default`.
fn precision(digits: &str, default: usize) -> Option<usize> {
    if digits.is_empty() {
        return Some(default);
    }
    digits.parse::<usize>().ok().filter(|p| *p <= 20)
}

/// Standard numeric format strings: a letter and an optional precision.
fn standard_format(value: f64, spec: &str) -> Option<String> {
    let mut chars = spec.chars();
    let letter = chars.next()?;
    let digits = chars.as_str();

    match letter {
        'F' | 'f' => {
            let precision = precision(digits, 2)?;
            Some(format!("{value:.precision$}"))
        }
        'N' | 'n' => {
            let precision = precision(digits, 2)?;
            Some(group_thousands(&format!("{value:.precision$}")))
        }
        'D' | 'd' => {
            if value.fract() != 0.0 {
                return None;
            }
            let width = precision(digits, 0)?;
            let magnitude = format!("{:0width$.0}", value.abs());
            Some(if value < 0.0 {
                format!("-{magnitude}")
            } else {
                magnitude
            })
        }
        'P' | 'p' => {
            let precision = precision(digits, 2)?;
            Some(format!("{:.precision$} %", value * 100.0))
        }
        'E' | 'e' => {
            let precision = precision(digits, 6)?;
            Some(scientific(value, precision, letter))
        }
        _ => None,
    }
}

/// Inserts `,` between groups of three integer digits.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len());
    grouped.push_str(sign);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(frac_part);
    grouped
}

/// `1.234560E+003` style scientific notation.
fn scientific(value: f64, precision: usize, letter: char) -> String {
    let formatted = format!("{value:.precision$e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}{letter}{sign}{digits:0>3}")
}
