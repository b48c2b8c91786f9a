//! # serial-codegen
//!
//! Serializer and deserializer generator for classes compiled to JavaScript.
//! For every serializable class it emits a pair of operations that let the
//! runtime metamodel persist an instance and rebuild it later, reified type
//! arguments included.
//!
//! ## Usage
//!
//! ### 1. Describe your classes in a model file
//!
//! ```rust,ignore
//! // model/shapes.rs
//! #![package = "shapes"]
//!
//! #[serializable]
//! struct Point { x: Integer, y: Integer }
//! ```
//!
//! ### 2. Generate the operations in build.rs
//!
//! ```rust,ignore
//! // build.rs
//! use serial_codegen::{CodeGenerator, ModelExtractor};
//!
//! fn main() {
//!     let graph = ModelExtractor::new()
//!         .add_source_dir("model").unwrap()
//!         .build().unwrap();
//!     CodeGenerator::new(&graph)
//!         .set_current_module("shapes")
//!         .write_to_file("generated/serializers.js").unwrap();
//!
//!     println!("cargo:rerun-if-changed=model");
//! }
//! ```
//!
//! The emitters themselves ([`serializer_fragments`], [`deserializer_fragments`])
//! produce [`Fragment`] streams and can be driven against any [`OutputSink`].

mod deserializer;
mod error;
mod extractor;
mod fragment;
mod generator;
pub mod model;
mod names;
mod options;
mod render;
mod resolver;
mod selector;
mod serializer;
mod sink;

pub use deserializer::deserializer_fragments;
pub use error::{Error, Result};
pub use extractor::ModelExtractor;
pub use fragment::{
    Deconstructor, Fragment, Local, PackageRef, PackageToken, Storage, TypeArgument, ValueKey,
    Witness,
};
pub use generator::{ClassFragments, CodeGenerator};
pub use model::{DeclId, DeclarationGraph, Type, TypeDeclaration};
pub use options::{DEFAULT_LANGUAGE_ALIAS, GeneratorOptions};
pub use render::{LANGUAGE_PACKAGE_TOKEN, Renderer};
pub use resolver::{resolve_type_arguments, type_argument_fragment};
pub use selector::serializable_values;
pub use serializer::serializer_fragments;
pub use sink::{JsWriter, OutputSink};
