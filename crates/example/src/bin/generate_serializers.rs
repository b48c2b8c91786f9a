//! Generates serializers for a directory of model files.
//!
//! Usage: `generate-serializers <model-dir> <out-file> [module]`

use log::error;
use serial_codegen::{CodeGenerator, ModelExtractor};
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let (Some(model_dir), Some(out_file)) = (args.next(), args.next()) else {
        return Err("usage: generate-serializers <model-dir> <out-file> [module]".into());
    };
    let model_dir = PathBuf::from(model_dir);
    let out_file = PathBuf::from(out_file);

    let graph = ModelExtractor::new().add_source_dir(&model_dir)?.build()?;

    let mut codegen = CodeGenerator::new(&graph);
    if let Some(module) = args.next() {
        codegen.set_current_module(module);
    }
    if let Some(parent) = out_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    codegen.write_to_file(&out_file)?;

    println!(
        "Generated serializers for {} classes in {}",
        graph.serializable_classes().count(),
        out_file.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
