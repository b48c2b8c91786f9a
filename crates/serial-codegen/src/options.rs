//! Generator configuration.

/// Identifier the language module is imported under by default.
pub const DEFAULT_LANGUAGE_ALIAS: &str = "m$1";

/// Settings shared by the renderer and the JavaScript sink.
///
/// Usually configured through the chained setters on
/// [`CodeGenerator`](crate::CodeGenerator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Custom header comment for the generated file.
    pub header: Option<String>,

    /// Module being compiled. Declarations from this module are referenced
    /// unqualified.
    pub current_module: String,

    /// Identifier the language module is imported under.
    pub language_alias: String,

    /// Whether the language module itself is being compiled. Runtime helpers
    /// are then referenced directly instead of through
    /// [`language_alias`](Self::language_alias).
    pub compiling_language_module: bool,

    /// Attach serializers to the class prototype (`true`, the default) or to
    /// the instance being constructed.
    pub prototype_style: bool,

    /// Emit a comment line before each generated operation.
    pub emit_comments: bool,

    /// Emit everything on one line without indentation.
    pub minify: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            header: None,
            current_module: "default".to_string(),
            language_alias: DEFAULT_LANGUAGE_ALIAS.to_string(),
            compiling_language_module: false,
            prototype_style: true,
            emit_comments: true,
            minify: false,
        }
    }
}

impl GeneratorOptions {
    /// Prefix for runtime helpers of the language module: `m$1.` or nothing.
    pub fn language_prefix(&self) -> String {
        if self.compiling_language_module {
            String::new()
        } else {
            format!("{}.", self.language_alias)
        }
    }
}
