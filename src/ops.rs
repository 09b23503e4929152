//! The operator kernel. Every binary operator takes a same-kind fast
//! path when one exists and otherwise coerces both sides, exactly the
//! way the reference language would. Operands are never errors here;
//! the evaluator short-circuits those before dispatching.

use crate::arena::Arena;
use crate::error::Error;
use crate::value::Value;

fn is_numberish(v: Value) -> bool {
    match v {
        Value::Float(_)
        | Value::Int(_)
        | Value::Uint(_)
        | Value::Bool(_)
        | Value::Null
        | Value::Undefined => true,
        _ => false,
    }
}

/// Rendered form of a value, borrowing strings as-is and pushing
/// everything else through the arena.
pub(crate) fn to_str<'a>(arena: &'a Arena, v: Value<'a>) -> Option<&'a str> {
    match v {
        Value::Str(s) => Some(s),
        other => arena.alloc_str(&other.to_string()),
    }
}

pub(crate) fn add<'a>(arena: &'a Arena, a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x + y),
        (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_add(y)),
        (Value::Uint(x), Value::Uint(y)) => Value::Uint(x.wrapping_add(y)),
        (Value::Str(x), Value::Str(y)) => match arena.concat(x, y) {
            Some(s) => Value::Str(s),
            None => Value::Error(Error::oom()),
        },
        _ if is_numberish(a) && is_numberish(b) => Value::Float(a.to_f64() + b.to_f64()),
        _ => {
            let x = match to_str(arena, a) {
                Some(s) => s,
                None => return Value::Error(Error::oom()),
            };
            let y = match to_str(arena, b) {
                Some(s) => s,
                None => return Value::Error(Error::oom()),
            };
            match arena.concat(x, y) {
                Some(s) => Value::Str(s),
                None => Value::Error(Error::oom()),
            }
        }
    }
}

pub(crate) fn sub<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x - y),
        (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_sub(y)),
        (Value::Uint(x), Value::Uint(y)) => Value::Uint(x.wrapping_sub(y)),
        _ => Value::Float(a.to_f64() - b.to_f64()),
    }
}

pub(crate) fn mul<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x * y),
        (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_mul(y)),
        (Value::Uint(x), Value::Uint(y)) => Value::Uint(x.wrapping_mul(y)),
        _ => Value::Float(a.to_f64() * b.to_f64()),
    }
}

pub(crate) fn div<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(x / y),
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                Value::Float(std::f64::NAN)
            } else {
                Value::Int(x.wrapping_div(y))
            }
        }
        (Value::Uint(x), Value::Uint(y)) => {
            if y == 0 {
                Value::Float(std::f64::NAN)
            } else {
                Value::Uint(x / y)
            }
        }
        _ => Value::Float(a.to_f64() / b.to_f64()),
    }
}

pub(crate) fn rem<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                Value::Float(std::f64::NAN)
            } else {
                Value::Int(x.wrapping_rem(y))
            }
        }
        (Value::Uint(x), Value::Uint(y)) => {
            if y == 0 {
                Value::Float(std::f64::NAN)
            } else {
                Value::Uint(x % y)
            }
        }
        _ => Value::Float(a.to_f64() % b.to_f64()),
    }
}

// Bitwise operators keep same-kind integers in kind; any mix coerces
// through int64 and comes back as a number, i.e. a float.
pub(crate) fn bit_and<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x & y),
        (Value::Uint(x), Value::Uint(y)) => Value::Uint(x & y),
        _ => Value::Float((a.to_i64() & b.to_i64()) as f64),
    }
}

pub(crate) fn bit_xor<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x ^ y),
        (Value::Uint(x), Value::Uint(y)) => Value::Uint(x ^ y),
        _ => Value::Float((a.to_i64() ^ b.to_i64()) as f64),
    }
}

pub(crate) fn bit_or<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x | y),
        (Value::Uint(x), Value::Uint(y)) => Value::Uint(x | y),
        _ => Value::Float((a.to_i64() | b.to_i64()) as f64),
    }
}

fn str_less_no_case(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let n = a.len().min(b.len());
    for i in 0..n {
        let x = a[i].to_ascii_lowercase();
        let y = b[i].to_ascii_lowercase();
        if x != y {
            return x < y;
        }
    }
    a.len() < b.len()
}

fn same_kind<'a>(a: Value<'a>, b: Value<'a>) -> bool {
    std::mem::discriminant(&a) == std::mem::discriminant(&b)
}

fn less<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x < y,
        (Value::Int(x), Value::Int(y)) => x < y,
        (Value::Uint(x), Value::Uint(y)) => x < y,
        (Value::Str(x), Value::Str(y)) => {
            if no_case {
                str_less_no_case(x, y)
            } else {
                x.as_bytes() < y.as_bytes()
            }
        }
        _ => a.to_f64() < b.to_f64(),
    }
}

pub(crate) fn lt<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(less(a, b, no_case))
}

pub(crate) fn lte<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(less(a, b, no_case) || !less(b, a, no_case))
}

pub(crate) fn gt<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(less(b, a, no_case))
}

pub(crate) fn gte<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(less(b, a, no_case) || !less(a, b, no_case))
}

fn equal<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> bool {
    if !same_kind(a, b) {
        return a.to_f64() == b.to_f64();
    }
    !less(a, b, no_case) && !less(b, a, no_case)
}

pub(crate) fn eq<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(equal(a, b, no_case))
}

pub(crate) fn neq<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(!equal(a, b, no_case))
}

pub(crate) fn strict_eq<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(same_kind(a, b) && equal(a, b, no_case))
}

pub(crate) fn strict_neq<'a>(a: Value<'a>, b: Value<'a>, no_case: bool) -> Value<'a> {
    Value::Bool(!(same_kind(a, b) && equal(a, b, no_case)))
}

pub(crate) fn or<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    Value::Bool(a.truthy() || b.truthy())
}

pub(crate) fn and<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    Value::Bool(a.truthy() && b.truthy())
}

pub(crate) fn coalesce<'a>(a: Value<'a>, b: Value<'a>) -> Value<'a> {
    match a {
        Value::Undefined | Value::Null => b,
        _ => a,
    }
}
