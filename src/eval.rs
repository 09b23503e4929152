//! The evaluation engine: a family of scanners, one per precedence
//! level, each splitting its byte range on the operators of that level
//! and recursing into the next. There is no AST - parsing and
//! computation are interleaved over the same input slice.

use crate::arena::Arena;
use crate::convert;
use crate::error::Error;
use crate::json;
use crate::ops;
use crate::scan::{self, read_group, read_ident, trim};
use crate::value::Value;

/// Hard ceiling on nested evaluation depth. Exceeding it yields the
/// `MaxDepthError` message error instead of a runaway stack.
pub const MAX_DEPTH: usize = 100;

/// Evaluation environment supplied by the embedder.
///
/// `reference` resolves identifiers: it receives the receiver (the
/// global marker for top-level lookups, the current value for chained
/// access) and the identifier text. `no_case` switches string
/// comparisons to ASCII case-insensitive.
pub struct Env<'a> {
    pub no_case: bool,
    pub reference: Option<&'a dyn Fn(Value<'a>, &'a str) -> Value<'a>>,
}

impl<'a> Default for Env<'a> {
    fn default() -> Self {
        Env {
            no_case: false,
            reference: None,
        }
    }
}

// Precedence levels, lowest binding first. The pre-scan ORs the bits of
// every byte in the input so levels with no candidate operator at all
// are skipped wholesale.
const COMMA: u16 = 1 << 1;
const TERNS: u16 = 1 << 2;
const LOGICAL_OR: u16 = 1 << 3;
const LOGICAL_AND: u16 = 1 << 4;
const BITWISE_OR: u16 = 1 << 5;
const BITWISE_XOR: u16 = 1 << 6;
const BITWISE_AND: u16 = 1 << 7;
const EQUALITY: u16 = 1 << 8;
const COMPS: u16 = 1 << 9;
const SUMS: u16 = 1 << 10;
const FACTS: u16 = 1 << 11;

fn step_bits(byte: u8) -> u16 {
    match byte {
        b',' => COMMA,
        b'?' => TERNS | LOGICAL_OR,
        b':' => TERNS,
        b'|' => LOGICAL_OR | BITWISE_OR,
        b'&' => LOGICAL_AND | BITWISE_AND,
        b'^' => BITWISE_XOR,
        b'=' => COMPS | EQUALITY,
        b'!' => EQUALITY,
        b'<' | b'>' => COMPS,
        b'+' | b'-' => SUMS,
        b'*' | b'/' | b'%' => FACTS,
        _ => 0,
    }
}

struct Ctx<'a, 'e> {
    steps: u16,
    arena: &'a Arena,
    env: &'e Env<'a>,
}

/// Evaluate `expr` against `env`, allocating out of `arena`. Empty and
/// whitespace-only input yields `undefined`; every failure comes back as
/// an error-kind value, never a panic.
pub fn eval<'a>(arena: &'a Arena, expr: &'a str, env: &Env<'a>) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Undefined;
    }
    let mut steps = 0;
    for &byte in expr.as_bytes() {
        steps |= step_bits(byte);
    }
    let ctx = Ctx { steps, arena, env };
    eval_expr(expr, &ctx, 0)
}

// The only place depth grows: entering the level stack from the top.
fn eval_expr<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    eval_level(COMMA, expr, ctx, depth + 1)
}

fn eval_level<'a>(step: u16, expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    if depth > MAX_DEPTH + 1 {
        return Value::Error(Error::message("MaxDepthError"));
    }
    let steps = ctx.steps;
    if step <= COMMA && steps & COMMA != 0 {
        return eval_comma(expr, ctx, depth);
    }
    if step <= TERNS && steps & TERNS != 0 {
        return eval_ternary(expr, ctx, depth);
    }
    if step <= LOGICAL_OR && steps & LOGICAL_OR != 0 {
        return eval_logical_or(expr, ctx, depth);
    }
    if step <= LOGICAL_AND && steps & LOGICAL_AND != 0 {
        return eval_logical_and(expr, ctx, depth);
    }
    if step <= BITWISE_OR && steps & BITWISE_OR != 0 {
        return eval_bitwise(BITWISE_OR, b'|', expr, ctx, depth);
    }
    if step <= BITWISE_XOR && steps & BITWISE_XOR != 0 {
        return eval_bitwise(BITWISE_XOR, b'^', expr, ctx, depth);
    }
    if step <= BITWISE_AND && steps & BITWISE_AND != 0 {
        return eval_bitwise(BITWISE_AND, b'&', expr, ctx, depth);
    }
    if step <= EQUALITY && steps & EQUALITY != 0 {
        return eval_equality(expr, ctx, depth);
    }
    if step <= COMPS && steps & COMPS != 0 {
        return eval_comps(expr, ctx, depth);
    }
    if step <= SUMS && steps & SUMS != 0 {
        return eval_sums(expr, ctx, depth);
    }
    if step <= FACTS && steps & FACTS != 0 {
        return eval_facts(expr, ctx, depth);
    }
    eval_atom(expr, ctx, depth)
}

fn eval_comma<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b',' => {
                let res = eval_level(COMMA << 1, &expr[s..i], ctx, depth);
                if res.is_error() {
                    return res;
                }
                s = i + 1;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    eval_level(COMMA << 1, &expr[s..], ctx, depth)
}

fn eval_ternary<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut cond = "";
    let mut s = 0;
    let mut tdepth = 0usize;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'?' => {
                // Part of '??' or '?.', not a ternary.
                if i + 1 < b.len() && (b[i + 1] == b'?' || b[i + 1] == b'.') {
                    i += 2;
                    continue;
                }
                if tdepth == 0 {
                    cond = &expr[..i];
                    s = i + 1;
                }
                tdepth += 1;
            }
            b':' => {
                if tdepth == 0 {
                    return Value::Error(Error::syntax());
                }
                tdepth -= 1;
                if tdepth == 0 {
                    let res = eval_expr(cond, ctx, depth);
                    if res.is_error() {
                        return res;
                    }
                    return if res.truthy() {
                        eval_expr(&expr[s..i], ctx, depth)
                    } else {
                        eval_expr(&expr[i + 1..], ctx, depth)
                    };
                }
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    if tdepth == 0 {
        eval_level(TERNS << 1, expr, ctx, depth)
    } else {
        Value::Error(Error::syntax())
    }
}

fn logical_or_step<'a>(
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let right = eval_level(LOGICAL_OR << 1, expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    match op {
        b'|' => ops::or(left, right),
        b'?' => ops::coalesce(left, right),
        _ => right,
    }
}

// Handles both '||' and '??'. Both sides always evaluate; truthiness
// only picks the result. Reference callbacks may be side-effectful, so
// this is observable and deliberate.
fn eval_logical_or<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'?' if i + 1 < b.len() && b[i + 1] == b'.' => {
                i += 2;
                continue;
            }
            b'?' | b'|' => {
                if i + 1 == b.len() {
                    return Value::Error(Error::syntax());
                }
                if b[i + 1] != b[i] {
                    // Lone '|' belongs to bitwise OR, lone '?' to the
                    // ternary level.
                    i += 2;
                    continue;
                }
                left = logical_or_step(left, op, &expr[s..i], ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = b[i];
                i += 2;
                s = i;
                continue;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    logical_or_step(left, op, &expr[s..], ctx, depth)
}

fn logical_and_step<'a>(
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let right = eval_level(LOGICAL_AND << 1, expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    match op {
        b'&' => ops::and(left, right),
        _ => right,
    }
}

fn eval_logical_and<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'&' => {
                if i + 1 == b.len() {
                    return Value::Error(Error::syntax());
                }
                if b[i + 1] != b'&' {
                    // Bitwise AND.
                    i += 2;
                    continue;
                }
                left = logical_and_step(left, op, &expr[s..i], ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = b[i];
                i += 2;
                s = i;
                continue;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    logical_and_step(left, op, &expr[s..], ctx, depth)
}

fn bitwise_step<'a>(
    level: u16,
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let right = eval_level(level << 1, expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    match op {
        b'|' => ops::bit_or(left, right),
        b'^' => ops::bit_xor(left, right),
        b'&' => ops::bit_and(left, right),
        _ => right,
    }
}

// One scanner serves '|', '^' and '&': by the time a bitwise level runs,
// the doubled logical forms have already been split off.
fn eval_bitwise<'a>(
    level: u16,
    opch: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            c if c == opch => {
                left = bitwise_step(level, left, op, &expr[s..i], ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = c;
                s = i + 1;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    bitwise_step(level, left, op, &expr[s..], ctx, depth)
}

fn equality_step<'a>(
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let mut expr = trim(expr);
    let mut neg = false;
    let mut boolit = false;
    // Fold a run of leading '!' into the right operand.
    loop {
        if expr.is_empty() {
            return Value::Error(Error::syntax());
        }
        if expr.as_bytes()[0] != b'!' {
            break;
        }
        neg = !neg;
        boolit = true;
        expr = trim(&expr[1..]);
    }
    let mut right = eval_level(EQUALITY << 1, expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    if boolit {
        let mut t = right.truthy();
        if neg {
            t = !t;
        }
        right = Value::Bool(t);
    }
    let no_case = ctx.env.no_case;
    match op {
        b'=' => ops::eq(left, right, no_case),
        b'!' => ops::neq(left, right, no_case),
        0x5D => ops::strict_eq(left, right, no_case), // '=' + 32
        0x41 => ops::strict_neq(left, right, no_case), // '!' + 32
        _ => right,
    }
}

fn eval_equality<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'=' | b'!' => {
                let opch = b[i];
                let mut opsz = 1;
                if opch == b'=' {
                    // A '=' after '<' or '>' belongs to that comparator.
                    if i > 0 && (b[i - 1] == b'>' || b[i - 1] == b'<') {
                        i += 1;
                        continue;
                    }
                    if i == b.len() - 1 || b[i + 1] != b'=' {
                        return Value::Error(Error::syntax());
                    }
                    opsz += 1;
                } else {
                    // Bare '!' is the unary form, handled by the step.
                    if i == b.len() - 1 || b[i + 1] != b'=' {
                        i += 1;
                        continue;
                    }
                    opsz += 1;
                }
                let mut opch = opch;
                if i + 2 < b.len() && b[i + 2] == b'=' {
                    // Strict variant.
                    opch += 32;
                    opsz += 1;
                }
                left = equality_step(left, op, &expr[s..i], ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = opch;
                i += opsz;
                s = i;
                continue;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    equality_step(left, op, &expr[s..], ctx, depth)
}

fn comp_step<'a>(
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let right = eval_level(COMPS << 1, expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    let no_case = ctx.env.no_case;
    match op {
        b'<' => ops::lt(left, right, no_case),
        b'>' => ops::gt(left, right, no_case),
        0x5C => ops::lte(left, right, no_case), // '<' + 32
        0x5E => ops::gte(left, right, no_case), // '>' + 32
        _ => right,
    }
}

fn eval_comps<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'<' | b'>' => {
                let mut opch = b[i];
                let mut opsz = 1;
                if i < b.len() - 1 && b[i + 1] == b'=' {
                    opch += 32;
                    opsz += 1;
                }
                left = comp_step(left, op, &expr[s..i], ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = opch;
                i += opsz;
                s = i;
                continue;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    comp_step(left, op, &expr[s..], ctx, depth)
}

fn sum_step<'a>(
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    neg: bool,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let mut right = eval_level(SUMS << 1, expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    if neg {
        right = ops::mul(right, Value::Float(-1.0));
        if right.is_error() {
            return right;
        }
    }
    match op {
        b'+' => ops::add(ctx.arena, left, right),
        b'-' => ops::sub(left, right),
        _ => right,
    }
}

// A folded negative sign directly before a numeric literal is handed
// back to the literal, so the int64 minimum parses without overflow.
fn reattach_sign(b: &[u8], s: usize, neg: bool) -> (usize, bool) {
    if neg && s > 0 && s < b.len() && b[s - 1] == b'-' && b[s].is_ascii_digit() {
        (s - 1, false)
    } else {
        (s, neg)
    }
}

// The sum level also owns unary signs: a run of leading '+'/'-' on the
// right operand folds into a single sign, and an 'e' directly before a
// sign marks scientific notation rather than an operator.
fn eval_sums<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    let mut fill = false;
    let mut neg = false;
    while i < b.len() {
        match b[i] {
            b'-' | b'+' => {
                if !fill {
                    if i > 0 && b[i - 1] == b[i] {
                        // '--' and '++' are not supported.
                        return Value::Error(Error::syntax());
                    }
                    if b[i] == b'-' {
                        neg = !neg;
                    }
                    s = i + 1;
                    i += 1;
                    continue;
                }
                if i > 0 && (b[i - 1] == b'e' || b[i - 1] == b'E') {
                    i += 1;
                    continue;
                }
                let (s2, neg2) = reattach_sign(b, s, neg);
                left = sum_step(left, op, &expr[s2..i], neg2, ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = b[i];
                s = i + 1;
                fill = false;
                neg = false;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => {
                match read_group(&expr[i..]) {
                    Some(glen) => i += glen - 1,
                    None => return Value::Error(Error::syntax()),
                }
                fill = true;
            }
            c => {
                if !fill && !scan::is_ws(c) {
                    fill = true;
                }
            }
        }
        i += 1;
    }
    let (s2, neg2) = reattach_sign(b, s, neg);
    sum_step(left, op, &expr[s2..], neg2, ctx, depth)
}

fn fact_step<'a>(
    left: Value<'a>,
    op: u8,
    expr: &'a str,
    ctx: &Ctx<'a, '_>,
    depth: usize,
) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let right = eval_atom(expr, ctx, depth);
    if right.is_error() {
        return right;
    }
    match op {
        b'*' => ops::mul(left, right),
        b'/' => ops::div(left, right),
        b'%' => ops::rem(left, right),
        _ => right,
    }
}

fn eval_facts<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let b = expr.as_bytes();
    let mut left = Value::Undefined;
    let mut op = 0u8;
    let mut s = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'*' | b'/' | b'%' => {
                left = fact_step(left, op, &expr[s..i], ctx, depth);
                if left.is_error() {
                    return left;
                }
                op = b[i];
                s = i + 1;
            }
            b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                Some(glen) => i += glen - 1,
                None => return Value::Error(Error::syntax()),
            },
            _ => {}
        }
        i += 1;
    }
    fact_step(left, op, &expr[s..], ctx, depth)
}

// Numeric literal: optional 'i64'/'u64' suffix on integer forms, plain
// double syntax otherwise. The sign, when present, was re-attached by
// the sum level.
fn parse_number<'a>(expr: &str) -> Value<'a> {
    let b = expr.as_bytes();
    if b.len() > 3 && expr.ends_with("64") {
        if b[b.len() - 3] == b'u' {
            return match expr[..b.len() - 3].parse() {
                Ok(x) => Value::Uint(x),
                Err(_) => Value::Error(Error::syntax()),
            };
        }
        if b[b.len() - 3] == b'i' {
            return match expr[..b.len() - 3].parse() {
                Ok(x) => Value::Int(x),
                Err(_) => Value::Error(Error::syntax()),
            };
        }
    }
    match expr.parse() {
        Ok(x) => Value::Float(x),
        Err(_) => Value::Error(Error::syntax()),
    }
}

// Resolve one identifier against the current receiver. JSON receivers
// are walked in place; everything else goes through the host callback.
fn resolve<'a>(
    left: Value<'a>,
    ident: &'a str,
    chain: bool,
    opt: bool,
    ctx: &Ctx<'a, '_>,
) -> Value<'a> {
    if let Value::Json(raw) = left {
        let sub = if raw.trim_start().starts_with('{') {
            json::member(raw, ident)
        } else {
            let index = convert::str_to_i64(ident);
            if index >= 0 {
                json::element(raw, index as u64)
            } else {
                None
            }
        };
        return match sub {
            Some(sub) => Value::json(ctx.arena, sub),
            None => Value::Undefined,
        };
    }
    let reference = match ctx.env.reference {
        Some(f) => f,
        None => return Value::Error(Error::undefined(ident, chain)),
    };
    let receiver = if chain { left } else { Value::global() };
    let val = reference(receiver, ident);
    if val.is_error() {
        // Optional chaining swallows exactly this step's failure.
        return if opt { Value::Undefined } else { val };
    }
    if val.is_undefined() && left.is_undefined() {
        if opt {
            return Value::Undefined;
        }
        return Value::Error(Error::undefined(ident, chain));
    }
    val
}

// Array literals and argument lists: split the range on top-level
// commas and evaluate each piece. An empty range is an empty array; an
// empty piece between commas is a syntax error.
fn eval_array<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let expr = trim(expr);
    let mut items: Vec<Value<'a>> = Vec::new();
    if !expr.is_empty() {
        let b = expr.as_bytes();
        let mut s = 0;
        let mut i = 0;
        while i < b.len() {
            match b[i] {
                b',' => {
                    let item = eval_item(&expr[s..i], ctx, depth);
                    if item.is_error() {
                        return item;
                    }
                    items.push(item);
                    s = i + 1;
                }
                b'(' | b'[' | b'{' | b'"' | b'\'' => match read_group(&expr[i..]) {
                    Some(glen) => i += glen - 1,
                    None => return Value::Error(Error::syntax()),
                },
                _ => {}
            }
            i += 1;
        }
        let item = eval_item(&expr[s..], ctx, depth);
        if item.is_error() {
            return item;
        }
        items.push(item);
    }
    match ctx.arena.alloc_slice(&items) {
        Some(slice) => Value::Array(slice),
        None => Value::Error(Error::oom()),
    }
}

fn eval_item<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    eval_level(COMMA << 1, expr, ctx, depth + 1)
}

fn eval_atom<'a>(expr: &'a str, ctx: &Ctx<'a, '_>, depth: usize) -> Value<'a> {
    let mut expr = trim(expr);
    if expr.is_empty() {
        return Value::Error(Error::syntax());
    }
    let b = expr.as_bytes();

    let mut left = Value::Undefined;
    let mut left_ready = false;
    let mut left_ident: &'a str = "";

    // Leading literal or group.
    match b[0] {
        b'0'..=b'9' | b'-' | b'.' => {
            if b[0] == b'0' && b.len() > 1 && (b[1] == b'x' || b[1] == b'X') {
                return match u64::from_str_radix(&expr[2..], 16) {
                    Ok(x) => Value::Float(x as f64),
                    Err(_) => Value::Error(Error::syntax()),
                };
            }
            return parse_number(expr);
        }
        b'"' | b'\'' => match scan::string_literal(expr) {
            Some(lit) => {
                let s = if lit.escaped {
                    match scan::unescape(ctx.arena, lit.content) {
                        Some(s) => s,
                        None => return Value::Error(Error::oom()),
                    }
                } else {
                    lit.content
                };
                left = Value::Str(s);
                left_ready = true;
                expr = &expr[lit.raw_len..];
            }
            None => return Value::Error(Error::syntax()),
        },
        b'(' | b'{' | b'[' => {
            let glen = match read_group(expr) {
                Some(glen) => glen,
                None => return Value::Error(Error::syntax()),
            };
            left = match b[0] {
                b'(' => eval_expr(&expr[1..glen - 1], ctx, depth),
                b'[' => eval_array(&expr[1..glen - 1], ctx, depth),
                // Object literals are not part of the grammar.
                _ => return Value::Error(Error::syntax()),
            };
            if left.is_error() {
                return left;
            }
            left_ready = true;
            expr = &expr[glen..];
        }
        _ => {}
    }

    if !left_ready {
        let ident = match read_ident(expr) {
            Some(ident) => ident,
            None => return Value::Error(Error::syntax()),
        };
        left = match ident {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            "undefined" => Value::Undefined,
            "NaN" => Value::Float(std::f64::NAN),
            "Infinity" => Value::Float(std::f64::INFINITY),
            "new" | "typeof" | "void" | "await" | "function" | "in" | "instanceof" | "yield" => {
                return Value::Error(Error::unsupported_keyword(ident));
            }
            _ => {
                let val = resolve(Value::Undefined, ident, false, false, ctx);
                if val.is_error() {
                    return val;
                }
                val
            }
        };
        left_ident = ident;
        expr = &expr[ident.len()..];
    }

    // Postfix chain: member access, optional chaining, computed member
    // access and calls, applied left to right.
    let mut prev = Value::Undefined;
    loop {
        expr = trim(expr);
        if expr.is_empty() {
            break;
        }
        let b = expr.as_bytes();
        let mut opt = false;
        if b[0] == b'?' {
            if b.len() == 1 || b[1] != b'.' {
                return Value::Error(Error::syntax());
            }
            opt = true;
            expr = trim(&expr[2..]);
            if expr.is_empty() {
                return Value::Error(Error::syntax());
            }
        }
        let b = expr.as_bytes();
        match b[0] {
            b'[' => {
                let glen = match read_group(expr) {
                    Some(glen) => glen,
                    None => return Value::Error(Error::syntax()),
                };
                let key = eval_expr(&expr[1..glen - 1], ctx, depth);
                if key.is_error() {
                    return key;
                }
                let ident = match ops::to_str(ctx.arena, key) {
                    Some(s) => s,
                    None => return Value::Error(Error::oom()),
                };
                let val = resolve(left, ident, true, opt, ctx);
                if val.is_error() {
                    return val;
                }
                prev = left;
                left = val;
                expr = &expr[glen..];
            }
            b'(' => {
                let glen = match read_group(expr) {
                    Some(glen) => glen,
                    None => return Value::Error(Error::syntax()),
                };
                let val = match left {
                    Value::Func(f) => {
                        let args = eval_array(&expr[1..glen - 1], ctx, depth);
                        if args.is_error() {
                            return args;
                        }
                        let out = f(prev, args);
                        if out.is_error() {
                            if opt {
                                Value::Undefined
                            } else {
                                return out;
                            }
                        } else {
                            out
                        }
                    }
                    _ if opt => Value::Undefined,
                    _ => return Value::Error(Error::not_a_function(left_ident)),
                };
                prev = left;
                left = val;
                expr = &expr[glen..];
            }
            first => {
                if !opt {
                    if first != b'.' {
                        return Value::Error(Error::syntax());
                    }
                    expr = trim(&expr[1..]);
                }
                let ident = match read_ident(expr) {
                    Some(ident) => ident,
                    None => return Value::Error(Error::syntax()),
                };
                let val = resolve(left, ident, true, opt, ctx);
                if val.is_error() {
                    return val;
                }
                prev = left;
                left = val;
                left_ident = ident;
                expr = &expr[ident.len()..];
            }
        }
    }
    left
}
