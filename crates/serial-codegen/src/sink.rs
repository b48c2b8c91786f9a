//! Text emission for the generated operations.
//!
//! [`OutputSink`] is everything the [`Renderer`](crate::render::Renderer)
//! needs from a backend: temporary names, statement formatting, declaration
//! qualification and type witnesses. [`JsWriter`] implements it for the
//! JavaScript runtime metamodel.

use crate::model::{DeclId, DeclarationGraph, LANGUAGE_MODULE, Type};
use crate::names;
use crate::options::GeneratorOptions;
use indexmap::IndexMap;

pub trait OutputSink {
    /// A name not yet used in the generated code.
    fn temp_name(&mut self) -> String;

    /// Append raw code to the current line.
    fn out(&mut self, code: &str);

    /// Terminate the current line.
    fn end_line(&mut self);

    /// Open a block on the current line.
    fn begin_block(&mut self);

    /// Close the innermost block, leaving the line open for a terminator.
    fn end_block(&mut self);

    /// A comment on its own line.
    fn comment(&mut self, text: &str);

    /// Reference to a declaration from the module being compiled.
    fn qualified(&mut self, decl: DeclId) -> String;

    /// Runtime witness of `ty`. Type parameters are read from `holder`.
    fn type_witness(&mut self, ty: &Type, holder: &str) -> String;
}

/// JavaScript [`OutputSink`].
///
/// The temporary-name counter and the module alias cache live as long as the
/// writer, so one writer should serve a whole compilation unit.
#[derive(Debug)]
pub struct JsWriter<'g> {
    graph: &'g DeclarationGraph,
    options: GeneratorOptions,
    output: String,
    indent: usize,
    line_start: bool,
    next_temp: usize,
    /// Module name -> import alias, in order of first use.
    module_aliases: IndexMap<String, String>,
}

impl<'g> JsWriter<'g> {
    pub fn new(graph: &'g DeclarationGraph, options: GeneratorOptions) -> Self {
        Self {
            graph,
            options,
            output: String::new(),
            indent: 0,
            line_start: true,
            next_temp: 0,
            module_aliases: IndexMap::new(),
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Modules other than the current and the language module that generated
    /// code referred to, with their aliases.
    pub fn module_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.module_aliases
            .iter()
            .map(|(module, alias)| (module.as_str(), alias.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn into_string(self) -> String {
        self.output
    }

    fn module_prefix(&mut self, module: &str) -> String {
        if module == self.options.current_module {
            return String::new();
        }
        if module == LANGUAGE_MODULE {
            return self.options.language_prefix();
        }
        // m$1 is the language module
        let next = format!("m${}", self.module_aliases.len() + 2);
        let alias = self
            .module_aliases
            .entry(module.to_string())
            .or_insert(next);
        format!("{alias}.")
    }

    fn witness_list(&mut self, tag: &str, types: &[Type], holder: &str) -> String {
        let list: Vec<String> = types
            .iter()
            .map(|ty| self.type_witness(ty, holder))
            .collect();
        format!("{{t:'{tag}',l:[{}]}}", list.join(","))
    }
}

impl OutputSink for JsWriter<'_> {
    fn temp_name(&mut self) -> String {
        let name = format!("${}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn out(&mut self, code: &str) {
        if self.line_start && !self.options.minify {
            for _ in 0..self.indent {
                self.output.push_str("  ");
            }
        }
        self.line_start = false;
        self.output.push_str(code);
    }

    fn end_line(&mut self) {
        if !self.options.minify {
            self.output.push('\n');
        }
        self.line_start = true;
    }

    fn begin_block(&mut self) {
        self.out("{");
        self.indent += 1;
        self.end_line();
    }

    fn end_block(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.out("}");
    }

    fn comment(&mut self, text: &str) {
        if self.options.minify {
            self.out(&format!("/*{text}*/"));
        } else {
            self.out(&format!("//{text}"));
            self.end_line();
        }
    }

    fn qualified(&mut self, decl: DeclId) -> String {
        let graph = self.graph;
        let prefix = self.module_prefix(&graph[decl].module);
        format!("{prefix}{}", names::name(graph, decl))
    }

    fn type_witness(&mut self, ty: &Type, holder: &str) -> String {
        match ty {
            Type::Declared { decl, arguments } => {
                let mut witness = format!("{{t:{}", self.qualified(*decl));
                if !arguments.is_empty() {
                    let bindings: Vec<String> = arguments
                        .iter()
                        .enumerate()
                        .map(|(index, argument)| {
                            format!(
                                "{}:{}",
                                self.graph.type_parameter_key(*decl, index),
                                self.type_witness(argument, holder)
                            )
                        })
                        .collect();
                    witness.push_str(&format!(",a:{{{}}}", bindings.join(",")));
                }
                witness.push('}');
                witness
            }
            Type::Parameter { owner, index } => format!(
                "{holder}.$$targs$$.{}",
                self.graph.type_parameter_key(*owner, *index)
            ),
            Type::Union(cases) => self.witness_list("u", cases, holder),
            Type::Intersection(parts) => self.witness_list("i", parts, holder),
            Type::Nothing => format!("{{t:{}Nothing}}", self.options.language_prefix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, TypeDeclaration};

    fn options(module: &str) -> GeneratorOptions {
        GeneratorOptions {
            current_module: module.to_string(),
            ..GeneratorOptions::default()
        }
    }

    #[test]
    fn test_qualification() {
        let mut graph = DeclarationGraph::new();
        let local = graph.declare(TypeDeclaration::class("Point", "shapes", "shapes"));
        let other = graph.declare(TypeDeclaration::class("Color", "paint", "paint"));
        let third = graph.declare(TypeDeclaration::class("Pen", "tools", "tools"));
        let integer = graph.lookup("Integer").unwrap();

        let mut writer = JsWriter::new(&graph, options("shapes"));
        assert_eq!(writer.qualified(local), "Point");
        assert_eq!(writer.qualified(integer), "m$1.Integer");
        assert_eq!(writer.qualified(other), "m$2.Color");
        assert_eq!(writer.qualified(third), "m$3.Pen");
        assert_eq!(writer.qualified(other), "m$2.Color");
        assert_eq!(
            writer.module_aliases().collect::<Vec<_>>(),
            vec![("paint", "m$2"), ("tools", "m$3")]
        );
    }

    #[test]
    fn test_compiling_language_module() {
        let graph = DeclarationGraph::new();
        let integer = graph.lookup("Integer").unwrap();
        let mut options = options("language");
        options.compiling_language_module = true;
        let mut writer = JsWriter::new(&graph, options);
        assert_eq!(writer.qualified(integer), "Integer");
        assert_eq!(writer.type_witness(&Type::Nothing, "$$x"), "{t:Nothing}");
    }

    #[test]
    fn test_type_witnesses() {
        let mut graph = DeclarationGraph::new();
        let string = Type::declared(graph.lookup("String").unwrap());
        let entry = graph.declare(
            TypeDeclaration::class("Entry", "app", "app").with_type_parameters(["K", "V"]),
        );
        let entry_type = Type::generic(entry, vec![string.clone(), Type::parameter(entry, 1)]);

        let mut writer = JsWriter::new(&graph, options("app"));
        assert_eq!(writer.type_witness(&string, "$$e"), "{t:m$1.String}");
        assert_eq!(
            writer.type_witness(&entry_type, "$$e"),
            "{t:Entry,a:{K$Entry:{t:m$1.String},V$Entry:$$e.$$targs$$.V$Entry}}"
        );
        assert_eq!(
            writer.type_witness(&Type::Union(vec![string.clone(), Type::Nothing]), "$$e"),
            "{t:'u',l:[{t:m$1.String},{t:m$1.Nothing}]}"
        );
        assert_eq!(
            writer.type_witness(&Type::Intersection(vec![string]), "$$e"),
            "{t:'i',l:[{t:m$1.String}]}"
        );
    }

    #[test]
    fn test_member_class_reference() {
        let mut graph = DeclarationGraph::new();
        let outer = graph.declare(TypeDeclaration::class("Outer", "app", "app"));
        let inner = graph.declare(TypeDeclaration::class("Inner", "app", "app"));
        graph.add_member(outer, Member::NestedType(inner));
        let mut writer = JsWriter::new(&graph, options("app"));
        assert_eq!(writer.qualified(inner), "Inner$Outer");
    }

    #[test]
    fn test_blocks_and_indentation() {
        let graph = DeclarationGraph::new();
        let mut writer = JsWriter::new(&graph, options("app"));
        writer.out("f=function()");
        writer.begin_block();
        writer.out("return 1;");
        writer.end_line();
        writer.end_block();
        writer.out(";");
        writer.end_line();
        assert_eq!(writer.as_str(), "f=function(){\n  return 1;\n};\n");
    }

    #[test]
    fn test_minify() {
        let graph = DeclarationGraph::new();
        let mut options = options("app");
        options.minify = true;
        let mut writer = JsWriter::new(&graph, options);
        writer.comment("note");
        writer.out("f=function()");
        writer.begin_block();
        writer.out("return 1;");
        writer.end_line();
        writer.end_block();
        writer.out(";");
        writer.end_line();
        assert_eq!(writer.into_string(), "/*note*/f=function(){return 1;};");
    }

    #[test]
    fn test_temp_names_are_unique() {
        let graph = DeclarationGraph::new();
        let mut writer = JsWriter::new(&graph, options("app"));
        let names: Vec<_> = (0..3).map(|_| writer.temp_name()).collect();
        assert_eq!(names, vec!["$0", "$1", "$2"]);
    }
}
