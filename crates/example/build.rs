use serial_codegen::{CodeGenerator, ModelExtractor};
use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let model_dir = manifest_dir.join("model");

    let graph = ModelExtractor::new()
        .add_source_dir(&model_dir)
        .expect("Failed to read model files")
        .build()
        .expect("Invalid declaration model");

    CodeGenerator::new(&graph)
        .set_header(
            "Generated serializers for serial-codegen-example\n\
             These operations match the classes in model/",
        )
        .set_current_module("zoo")
        .write_to_file(out_dir.join("serializers.js"))
        .expect("Failed to write serializers");

    println!("cargo:rerun-if-changed=model");
    println!("cargo:rerun-if-changed=build.rs");
}
