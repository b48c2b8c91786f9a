//! JavaScript code generator for serializable classes.

use crate::deserializer::deserializer_fragments;
use crate::fragment::Fragment;
use crate::model::{DeclId, DeclarationGraph};
use crate::options::GeneratorOptions;
use crate::render::Renderer;
use crate::serializer::serializer_fragments;
use crate::sink::{JsWriter, OutputSink};
use log::{debug, error, info};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Both operations of one serializable class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFragments {
    pub serializer: Vec<Fragment>,
    pub deserializer: Vec<Fragment>,
}

/// Code generator that emits the serializer and deserializer of every
/// serializable class in a declaration graph.
#[derive(Debug)]
pub struct CodeGenerator<'g> {
    graph: &'g DeclarationGraph,
    options: GeneratorOptions,
}

impl<'g> CodeGenerator<'g> {
    /// Create a new code generator.
    pub fn new(graph: &'g DeclarationGraph) -> Self {
        Self {
            graph,
            options: GeneratorOptions::default(),
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Set a custom header comment for the generated file.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.options.header = Some(header.into());
        self
    }

    /// Set the module being compiled. Declarations of other modules are
    /// referenced through import aliases.
    pub fn set_current_module(&mut self, module: impl Into<String>) -> &mut Self {
        self.options.current_module = module.into();
        self
    }

    /// Set the identifier the language module is imported under.
    pub fn set_language_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.options.language_alias = alias.into();
        self
    }

    /// Generate code for the language module itself, referencing its helpers
    /// unqualified.
    pub fn compiling_language_module(&mut self, enabled: bool) -> &mut Self {
        self.options.compiling_language_module = enabled;
        self
    }

    /// Attach serializers to the class prototype (the default) or to each
    /// instance.
    pub fn prototype_style(&mut self, enabled: bool) -> &mut Self {
        self.options.prototype_style = enabled;
        self
    }

    /// Emit a comment before each generated operation (on by default).
    pub fn emit_comments(&mut self, enabled: bool) -> &mut Self {
        self.options.emit_comments = enabled;
        self
    }

    /// Emit the operations without newlines or indentation.
    pub fn minify(&mut self, enabled: bool) -> &mut Self {
        self.options.minify = enabled;
        self
    }

    /// Fragment streams of both operations of `class`.
    pub fn class_fragments(&self, class: DeclId) -> ClassFragments {
        ClassFragments {
            serializer: serializer_fragments(self.graph, class),
            deserializer: deserializer_fragments(self.graph, class),
        }
    }

    /// Serializable classes of the module being compiled, in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.graph
            .serializable_classes()
            .filter(|class| self.graph[*class].module == self.options.current_module)
    }

    /// Generate the JavaScript code as a string.
    ///
    /// Only classes of the current module get operations; classes of other
    /// modules are referenced through their module's import alias. The code
    /// is meant to run inside the module wrapper, which binds the module's
    /// exports to `ex$`.
    pub fn generate(&self) -> String {
        let mut writer = JsWriter::new(self.graph, self.options.clone());
        let mut classes = 0;
        for class in self.classes() {
            let name = &self.graph[class].name;
            debug!("generating serializers for `{name}`");
            let fragments = self.class_fragments(class);
            let mut renderer = Renderer::new(self.graph, &self.options, &mut writer);
            let rendered = renderer
                .render(&fragments.serializer)
                .and_then(|()| renderer.render(&fragments.deserializer));
            if let Err(err) = rendered {
                error!("failed to render serializers for `{name}`: {err}");
                continue;
            }
            if !self.options.minify {
                writer.end_line();
            }
            classes += 1;
        }
        debug!("generated serializers for {classes} classes");

        let mut output = String::new();

        // Header
        output.push_str("/**\n");
        match &self.options.header {
            Some(header) => {
                for line in header.lines() {
                    output.push_str(" * ");
                    output.push_str(line);
                    output.push('\n');
                }
            }
            None => {
                output.push_str(" * Auto-generated by serial-codegen\n");
                output.push_str(" * DO NOT EDIT MANUALLY\n");
            }
        }
        output.push_str(" */\n\n");

        // Imports
        if !self.options.compiling_language_module {
            output.push_str(&format!(
                "var {}=require('{}');\n",
                self.options.language_alias,
                crate::model::LANGUAGE_MODULE
            ));
        }
        for (module, alias) in writer.module_aliases() {
            output.push_str(&format!("var {alias}=require('{module}');\n"));
        }
        output.push('\n');

        output.push_str(writer.as_str());
        output.trim_end().to_string() + "\n"
    }

    /// Write the generated code to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let code = self.generate();
        fs::write(path, code)?;
        info!("wrote serializers to {}", path.display());
        Ok(())
    }

    /// Write the generated code to a writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let code = self.generate();
        writer.write_all(code.as_bytes())
    }
}
