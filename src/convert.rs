//! Scalar conversions between the numeric kinds and strings, matching
//! the reference language's coercion rules.

// Largest doubles that still fit the 64-bit integer kinds. Anything past
// the safe-integer envelope gets rounded toward zero first, then clamped
// against these before the cast.
const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;
const UINT64_MAX_FLOAT: f64 = 18446744073709549568.0;
const INT64_MAX_FLOAT: f64 = 9223372036854774784.0;
const INT64_MIN_FLOAT: f64 = -9223372036854774784.0;

pub(crate) fn f64_to_i64(f: f64) -> i64 {
    if f.is_nan() {
        return 0;
    }
    let mut f = f;
    if f < -MAX_SAFE_INTEGER || f > MAX_SAFE_INTEGER {
        if f < 0.0 {
            f = f.ceil();
            if f < INT64_MIN_FLOAT {
                return i64::min_value();
            }
        } else {
            f = f.floor();
            if f > INT64_MAX_FLOAT {
                return i64::max_value();
            }
        }
    }
    f as i64
}

pub(crate) fn f64_to_u64(f: f64) -> u64 {
    if f.is_nan() || f < 0.0 {
        return 0;
    }
    let mut f = f;
    if f > MAX_SAFE_INTEGER {
        f = f.floor();
        if f > UINT64_MAX_FLOAT {
            return u64::max_value();
        }
    }
    f as u64
}

pub(crate) fn u64_to_i64(u: u64) -> i64 {
    if u > i64::max_value() as u64 {
        return i64::max_value();
    }
    u as i64
}

pub(crate) fn i64_to_u64(i: i64) -> u64 {
    if i < 0 {
        return 0;
    }
    i as u64
}

fn is_num_byte(c: u8) -> bool {
    c.is_ascii_digit() || c == b'.'
}

/// String to double. Accepts decimal syntax with an optional leading
/// sign, plus the exact tokens `Infinity`, `+Infinity` and `-Infinity`.
/// Anything else, the empty string included, is NaN.
pub(crate) fn str_to_f64(s: &str) -> f64 {
    let b = s.as_bytes();
    if b.is_empty() {
        return std::f64::NAN;
    }
    if b.len() == 1
        || is_num_byte(b[0])
        || ((b[0] == b'-' || b[0] == b'+') && is_num_byte(b[1]))
    {
        return s.parse().unwrap_or(std::f64::NAN);
    }
    match s {
        "Infinity" | "+Infinity" => std::f64::INFINITY,
        "-Infinity" => std::f64::NEG_INFINITY,
        _ => std::f64::NAN,
    }
}

/// String to int64: decimal integer syntax first, double syntax as the
/// fallback. Invalid input ends up as 0 by way of NaN.
pub(crate) fn str_to_i64(s: &str) -> i64 {
    if s.is_empty() {
        return 0;
    }
    match s.parse() {
        Ok(i) => i,
        Err(_) => f64_to_i64(str_to_f64(s)),
    }
}

pub(crate) fn str_to_u64(s: &str) -> u64 {
    if s.is_empty() {
        return 0;
    }
    match s.parse() {
        Ok(u) => u,
        Err(_) => f64_to_u64(str_to_f64(s)),
    }
}
