//! Example crate demonstrating serial-codegen usage.
//!
//! The classes under `model/` are read by build.rs, which writes their
//! serializers to `OUT_DIR/serializers.js`.

/// Generated serializers for the classes in `model/`.
pub const SERIALIZERS: &str = include_str!(concat!(env!("OUT_DIR"), "/serializers.js"));
