//! Errors raised while reading declaration models and rendering fragments.

use crate::fragment::Local;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error("failed to parse {origin}")]
    Parse {
        origin: String,
        #[source]
        source: syn::Error,
    },

    #[error("`{name}` is declared more than once")]
    DuplicateDeclaration { name: String },

    #[error("unknown type `{name}` in `{declaration}`")]
    UnknownType { declaration: String, name: String },

    #[error("unsupported type in `{declaration}`: {detail}")]
    UnsupportedType { declaration: String, detail: String },

    #[error("`{declaration}` extends `{name}`, which is not a class")]
    NotAClass { declaration: String, name: String },

    #[error("`{declaration}` satisfies `{name}`, which is not an interface")]
    NotAnInterface { declaration: String, name: String },

    #[error("invalid attribute on `{declaration}`: {detail}")]
    InvalidAttribute { declaration: String, detail: String },

    #[error("`{declaration}` is its own supertype")]
    CyclicInheritance { declaration: String },

    #[error("`{declaration}` is nested in itself")]
    CyclicNesting { declaration: String },

    #[error("fragment uses {local:?} outside of a method body")]
    UnboundLocal { local: Local },
}
