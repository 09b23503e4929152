//! # xval
//!
//! Evaluate expressions with ease.
//!
//! An embeddable, single-pass evaluator for the expression subset of a
//! C-like scripting language: arithmetic, bitwise and logical operators,
//! comparisons, ternaries, optional chaining, member access and calls -
//! no statements, no assignment, no loops. Parsing and computation are
//! interleaved over the input bytes; there is no AST.
//!
//! Every evaluation allocates out of an [`Arena`] whose lifetime bounds
//! the returned [`Value`], so cleanup is a single drop and a value can
//! never dangle:
//!
//! ```
//! use xval::{eval, Arena, Env};
//!
//! let arena = Arena::new();
//! let value = eval(&arena, "999 + 777 * (888 + (0.5 + 1.5)) * (0.5 + true)", &Env::default());
//!
//! assert_eq!(value.to_string(), "1038294");
//! ```
//!
//! Failures are values too - the engine never panics, and an error
//! renders in the same stable format the embedder sees for any result:
//!
//! ```
//! use xval::{eval, Arena, Env};
//!
//! let arena = Arena::new();
//! assert_eq!(eval(&arena, "1 +", &Env::default()).to_string(), "SyntaxError");
//! assert_eq!(
//!     eval(&arena, "new == true", &Env::default()).to_string(),
//!     "SyntaxError: Unsupported keyword 'new'"
//! );
//! ```
//!
//! ## Host references
//!
//! Unknown identifiers resolve through the environment's `reference`
//! callback. The first argument is the receiver: the global marker for a
//! top-level lookup, or the current value for chained access like
//! `user.name`:
//!
//! ```
//! use xval::{eval, Arena, Env, Value};
//!
//! let arena = Arena::new();
//! let resolve = |this: Value, ident: &str| {
//!     if this.is_global() && ident == "answer" {
//!         Value::Float(42.0)
//!     } else {
//!         Value::Undefined
//!     }
//! };
//! let env = Env { reference: Some(&resolve), ..Env::default() };
//!
//! assert_eq!(eval(&arena, "answer / 2", &env).to_string(), "21");
//! assert_eq!(
//!     eval(&arena, "nope", &env).to_string(),
//!     "ReferenceError: Can't find variable: 'nope'"
//! );
//! ```
//!
//! Hosts can also hand back raw JSON, which is walked lazily - member
//! and index access re-scan the underlying bytes instead of building a
//! tree:
//!
//! ```
//! use xval::{eval, Arena, Env, Value};
//!
//! let arena = Arena::new();
//! let resolve = |this: Value, ident: &str| {
//!     if this.is_global() && ident == "json" {
//!         Value::json(&arena, r#"{"data":[1,true,false,null,{"a":1}]}"#)
//!     } else {
//!         Value::Undefined
//!     }
//! };
//! let env = Env { reference: Some(&resolve), ..Env::default() };
//!
//! assert_eq!(eval(&arena, "json.data[4].a", &env).to_string(), "1");
//! assert_eq!(eval(&arena, "json.data[4].b ?? 7", &env).to_string(), "7");
//! ```

mod arena;
mod codegen;
mod convert;
mod error;
mod eval;
mod json;
mod ops;
mod scan;
mod value;

pub use arena::{Arena, MemStats, ARENA_REGION};
pub use error::{Error, ErrorKind};
pub use eval::{eval, Env, MAX_DEPTH};
pub use value::{Function, Object, Type, Value};
