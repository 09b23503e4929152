//! Textual rendering of values. The format is part of the embedding
//! contract: identifiers like `undefined` and `null` render bare, arrays
//! render comma-joined without brackets, JSON renders as its raw bytes,
//! and numbers follow the reference language's notation rules on top of
//! shortest round-trip digits.

use std::fmt::{self, Write};

use crate::value::Value;

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(t) => f.write_str(if t { "true" } else { "false" }),
            Value::Float(x) => write_f64(f, x),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Str(s) => f.write_str(s),
            Value::Func(_) => f.write_str("[Function]"),
            Value::Json(raw) => f.write_str(raw),
            Value::Object(_) => f.write_str("[Object]"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                Ok(())
            }
            Value::Error(err) => fmt::Display::fmt(&err, f),
        }
    }
}

impl<'a> fmt::Debug for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Json(raw) => write!(f, "Json({:?})", raw),
            Value::Func(_) => f.write_str("Func"),
            Value::Object(obj) => write!(f, "Object(tag: {})", obj.tag()),
            Value::Error(err) => write!(f, "Error({})", err),
            ref other => fmt::Display::fmt(other, f),
        }
    }
}

/// Write a double the way the reference language stringifies numbers:
/// `NaN` / `Infinity` spelled out, fixed notation while the decimal
/// exponent stays in (-7, 21], scientific with an explicit sign beyond.
pub(crate) fn write_f64<W: Write>(out: &mut W, value: f64) -> fmt::Result {
    if value.is_nan() {
        return out.write_str("NaN");
    }
    if value.is_infinite() {
        return out.write_str(if value < 0.0 { "-Infinity" } else { "Infinity" });
    }
    if value == 0.0 {
        return out.write_str("0");
    }
    if value < 0.0 {
        out.write_char('-')?;
    }

    // Shortest digits from ryu, normalized to 0.D1..Dk * 10^n.
    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format_finite(if value < 0.0 { -value } else { value });
    let (mantissa, exp) = match formatted.find('e') {
        Some(at) => (&formatted[..at], formatted[at + 1..].parse::<i32>().unwrap_or(0)),
        None => (formatted, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(at) => (&mantissa[..at], &mantissa[at + 1..]),
        None => (mantissa, ""),
    };
    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part);
    digits.push_str(frac_part);
    let mut n = int_part.len() as i32 + exp;
    let lead = digits.bytes().take_while(|&b| b == b'0').count();
    n -= lead as i32;
    let mut digits = &digits[lead..];
    while digits.ends_with('0') {
        digits = &digits[..digits.len() - 1];
    }
    let k = digits.len() as i32;

    if n >= k && n <= 21 {
        // All digits are left of the point.
        out.write_str(digits)?;
        for _ in 0..n - k {
            out.write_char('0')?;
        }
        Ok(())
    } else if n > 0 && n <= 21 {
        out.write_str(&digits[..n as usize])?;
        out.write_char('.')?;
        out.write_str(&digits[n as usize..])
    } else if n > -6 && n <= 0 {
        out.write_str("0.")?;
        for _ in 0..-n {
            out.write_char('0')?;
        }
        out.write_str(digits)
    } else {
        out.write_str(&digits[..1])?;
        if k > 1 {
            out.write_char('.')?;
            out.write_str(&digits[1..])?;
        }
        let e = n - 1;
        if e < 0 {
            write!(out, "e-{}", -e)
        } else {
            write!(out, "e+{}", e)
        }
    }
}

// Counts bytes a rendering would occupy without keeping them.
pub(crate) struct Counter(pub usize);

impl Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: f64) -> String {
        let mut out = String::new();
        write_f64(&mut out, value).unwrap();
        out
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(fmt(0.0), "0");
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(1.0), "1");
        assert_eq!(fmt(-1.0), "-1");
        assert_eq!(fmt(10.0), "10");
        assert_eq!(fmt(0.1), "0.1");
        assert_eq!(fmt(0.01), "0.01");
        assert_eq!(fmt(5.01), "5.01");
        assert_eq!(fmt(3.14), "3.14");
        assert_eq!(fmt(1038294.0), "1038294");
        assert_eq!(fmt(-0.1), "-0.1");
    }

    #[test]
    fn notation_boundaries() {
        assert_eq!(fmt(1e20), "100000000000000000000");
        assert_eq!(fmt(1e21), "1e+21");
        assert_eq!(fmt(1e-6), "0.000001");
        assert_eq!(fmt(1e-7), "1e-7");
        assert_eq!(fmt(1.5e22), "1.5e+22");
        assert_eq!(fmt(18446744073709551615.0), "18446744073709552000");
        assert_eq!(fmt(8.8888889e24), "8.8888889e+24");
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(fmt(std::f64::NAN), "NaN");
        assert_eq!(fmt(std::f64::INFINITY), "Infinity");
        assert_eq!(fmt(std::f64::NEG_INFINITY), "-Infinity");
    }
}
