use std::fmt;

/// Discriminates the failure carried by an error value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    OutOfMemory,
    Undefined,
    NotAFunction,
    UnsupportedKeyword,
    Message,
}

/// An evaluation error. Errors are ordinary values: they are produced
/// in-band, short-circuit every operator, and render through `Display`
/// in the same stable format the embedder sees for any other value.
#[derive(Clone, Copy, Debug)]
pub struct Error<'a> {
    kind: ErrorKind,
    chain: bool,
    text: &'a str,
}

impl<'a> Error<'a> {
    pub(crate) fn syntax() -> Self {
        Error {
            kind: ErrorKind::Syntax,
            chain: false,
            text: "",
        }
    }

    pub(crate) fn oom() -> Self {
        Error {
            kind: ErrorKind::OutOfMemory,
            chain: false,
            text: "",
        }
    }

    pub(crate) fn undefined(ident: &'a str, chain: bool) -> Self {
        Error {
            kind: ErrorKind::Undefined,
            chain,
            text: ident,
        }
    }

    pub(crate) fn not_a_function(ident: &'a str) -> Self {
        Error {
            kind: ErrorKind::NotAFunction,
            chain: false,
            text: ident,
        }
    }

    pub(crate) fn unsupported_keyword(keyword: &'a str) -> Self {
        Error {
            kind: ErrorKind::UnsupportedKeyword,
            chain: false,
            text: keyword,
        }
    }

    /// An error carrying a verbatim message, the form host callbacks use
    /// to surface their own failures.
    pub fn message(msg: &'a str) -> Self {
        Error {
            kind: ErrorKind::Message,
            chain: false,
            text: msg,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The identifier or message bytes attached to the error, if any.
    pub fn text(&self) -> &'a str {
        self.text
    }
}

impl<'a> fmt::Display for Error<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::NotAFunction => {
                write!(f, "TypeError: {} is not a function", self.text)
            }
            ErrorKind::Syntax => f.write_str("SyntaxError"),
            ErrorKind::UnsupportedKeyword => {
                write!(f, "SyntaxError: Unsupported keyword '{}'", self.text)
            }
            ErrorKind::Undefined => {
                if self.chain {
                    write!(
                        f,
                        "TypeError: Cannot read properties of undefined (reading '{}')",
                        self.text
                    )
                } else {
                    write!(f, "ReferenceError: Can't find variable: '{}'", self.text)
                }
            }
            ErrorKind::OutOfMemory => f.write_str("MemoryError: Out of memory"),
            ErrorKind::Message => f.write_str(self.text),
        }
    }
}
