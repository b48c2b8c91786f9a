//! Turns fragment streams into code through an [`OutputSink`].

use crate::error::{Error, Result};
use crate::fragment::{
    Deconstructor, Fragment, Local, PackageRef, PackageToken, Storage, ValueKey, Witness,
};
use crate::model::{DeclId, DeclarationGraph};
use crate::names;
use crate::options::GeneratorOptions;
use crate::sink::OutputSink;
use std::collections::HashMap;

/// Canonical persisted token of the language package.
pub const LANGUAGE_PACKAGE_TOKEN: &str = "$";

/// Renders the fragments of one method at a time.
///
/// Method-local slots get fresh temporary names each time a method body
/// opens, so a renderer may be reused for any number of methods.
pub struct Renderer<'a, S> {
    graph: &'a DeclarationGraph,
    options: &'a GeneratorOptions,
    sink: &'a mut S,
    locals: HashMap<Local, String>,
}

impl<'a, S: OutputSink> Renderer<'a, S> {
    pub fn new(
        graph: &'a DeclarationGraph,
        options: &'a GeneratorOptions,
        sink: &'a mut S,
    ) -> Self {
        Self {
            graph,
            options,
            sink,
            locals: HashMap::new(),
        }
    }

    /// Render a fragment stream.
    ///
    /// Fragments that use a method-local slot must follow the fragment that
    /// opens their method; otherwise rendering stops with
    /// [`Error::UnboundLocal`] and the sink keeps what was written so far.
    pub fn render(&mut self, fragments: &[Fragment]) -> Result<()> {
        for fragment in fragments {
            self.fragment(fragment)?;
        }
        Ok(())
    }

    fn fragment(&mut self, fragment: &Fragment) -> Result<()> {
        let lang = self.options.language_prefix();
        match fragment {
            Fragment::BeginSerializer { class } => {
                self.locals.clear();
                let dc = self.bind(Local::Destination);
                self.bind(Local::Deconstructor);
                let this = names::self_name(self.graph, *class);
                self.locals.insert(Local::Instance, this.clone());

                self.describe("Serializer", *class);
                let target = if self.options.prototype_style {
                    format!("{}.$$.prototype", names::name(self.graph, *class))
                } else {
                    this.clone()
                };
                self.sink.out(&format!("{target}.ser$$=function({dc})"));
                self.sink.begin_block();
                self.statement(format!("var {this}=this;"));
            }
            Fragment::BeginDeserializer { class } => {
                self.locals.clear();
                let dc = self.bind(Local::Source);
                let cmodel = self.bind(Local::TypeModel);
                let ni = names::self_name(self.graph, *class);
                self.locals.insert(Local::Instance, ni.clone());

                self.describe("Deserializer", *class);
                self.sink.out(&format!(
                    "{}.deser$$=function({dc},{cmodel},{ni})",
                    names::name(self.graph, *class)
                ));
                self.sink.begin_block();
            }
            Fragment::SerializeSuper { ancestor } => {
                let ancestor = self.sink.qualified(*ancestor);
                let dc = self.local(Local::Destination)?;
                let this = self.local(Local::Instance)?;
                self.statement(format!("{ancestor}.$$.prototype.ser$$.call({this},{dc});"));
            }
            Fragment::DeserializeSuper { ancestor } => {
                let ancestor = self.sink.qualified(*ancestor);
                let dc = self.local(Local::Source)?;
                let cmodel = self.local(Local::TypeModel)?;
                let ni = self.local(Local::Instance)?;
                self.statement(format!("{ancestor}.deser$$({dc},{cmodel},{ni});"));
            }
            Fragment::Deconstruct(deconstructor) => {
                let code = self.deconstruct(deconstructor, &lang)?;
                self.statement(code);
            }
            Fragment::PutOuterInstance { container } => {
                let container = self.sink.qualified(*container);
                let ac = self.local(Local::Deconstructor)?;
                let this = self.local(Local::Instance)?;
                self.statement(format!(
                    "{ac}.putOuterInstance({this}.outer$,{{Instance$putOuterInstance:{container}}});"
                ));
            }
            Fragment::PutTypeArgument { class, key } => {
                let ac = self.local(Local::Deconstructor)?;
                let this = self.local(Local::Instance)?;
                let name = names::name(self.graph, *class);
                self.statement(format!(
                    "{ac}.putTypeArgument({lang}OpenTypeParam$jsint({name},'{key}'),\
                     {lang}typeLiteral$meta({{Type$typeLiteral:{this}.$$targs$$.{key}}}));"
                ));
            }
            Fragment::BindPackage(token) => {
                let package = self.bind(Local::Package);
                let reference = package_lookup(token, &lang);
                self.statement(format!("var {package}={reference};"));
            }
            Fragment::PutValue { key, witness } => {
                let ac = self.local(Local::Deconstructor)?;
                let this = self.local(Local::Instance)?;
                let open = self.open_value(key, &this, &lang)?;
                let witness = self.witness(witness)?;
                self.statement(format!(
                    "{ac}.putValue({open},{this}.{},{{Instance$putValue:{witness}}});",
                    key.attribute
                ));
            }
            Fragment::OuterInstancePending { class } => {
                let name = names::name(self.graph, *class);
                self.sink
                    .comment(&format!("TODO outer instance of {name} is not recovered"));
            }
            Fragment::BeginAllocation => {
                let ni = self.local(Local::Instance)?;
                self.sink.out(&format!("if({ni}===undefined)"));
                self.sink.begin_block();
            }
            Fragment::Allocate { class } => {
                let ni = self.local(Local::Instance)?;
                let class = self.sink.qualified(*class);
                self.statement(format!("{ni}=new {class}.$$;"));
            }
            Fragment::SetTypeArguments(arguments) => {
                let ni = self.local(Local::Instance)?;
                let bindings = arguments
                    .iter()
                    .map(|argument| -> Result<String> {
                        let witness = self.witness(&argument.witness)?;
                        Ok(format!("{}:{witness}", argument.key))
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.statement(format!(
                    "{lang}set_type_args({ni},{{{}}});",
                    bindings.join(",")
                ));
            }
            Fragment::EndAllocation => {
                self.sink.end_block();
                self.sink.end_line();
            }
            Fragment::GetValue {
                key,
                storage,
                witness,
            } => {
                let dc = self.local(Local::Source)?;
                let ni = self.local(Local::Instance)?;
                let prototype = format!("{}.$$.prototype", self.sink.qualified(key.class));
                let open = self.open_value(key, &prototype, &lang)?;
                let witness = self.witness(witness)?;
                let field = match storage {
                    Storage::State => names::private_name(self.graph, key.class, &key.attribute),
                    Storage::Captured => names::captured_name(&key.attribute),
                };
                self.statement(format!(
                    "{ni}.{field}={dc}.getValue({open},{{Instance$getValue:{witness}}});"
                ));
            }
            Fragment::ReturnInstance => {
                let ni = self.local(Local::Instance)?;
                self.statement(format!("return {ni};"));
            }
            Fragment::EndMethod => {
                self.sink.end_block();
                self.sink.out(";");
                self.sink.end_line();
            }
        }
        Ok(())
    }

    fn deconstruct(&mut self, deconstructor: &Deconstructor, lang: &str) -> Result<String> {
        let dc = self.local(Local::Destination)?;
        let ac = self.local(Local::Deconstructor)?;
        let this = self.local(Local::Instance)?;
        let kind = if deconstructor.container.is_some() {
            "MemberClass"
        } else {
            "Class"
        };
        let applied = if self.options.compiling_language_module {
            format!("Applied{kind}$jsint")
        } else {
            format!("{lang}$init$Applied{kind}$jsint()")
        };
        let name = names::name(self.graph, deconstructor.class);

        let mut code = format!("var {ac}={dc}({applied}({name},{{Type$Applied{kind}:{{t:{name}");
        if !deconstructor.type_arguments.is_empty() {
            let arguments: Vec<String> = deconstructor
                .type_arguments
                .iter()
                .map(|key| format!("{key}:{this}.$$targs$$.{key}"))
                .collect();
            code.push_str(&format!(",a:{{{}}}", arguments.join(",")));
        }
        code.push_str(&format!("}},Arguments$Applied{kind}:{{t:"));
        if deconstructor.parameters.is_empty() {
            code.push_str(&format!("{lang}Empty"));
        } else {
            let witnesses: Vec<String> = deconstructor
                .parameters
                .iter()
                .map(|ty| self.sink.type_witness(ty, &this))
                .collect();
            code.push_str(&format!("'T',l:[{}]", witnesses.join(",")));
        }
        code.push('}');
        if let Some(container) = deconstructor.container {
            code.push_str(&format!(
                ",Container$MemberClass:{{t:{}",
                self.sink.qualified(container)
            ));
            if !self.graph[container].type_parameters.is_empty() {
                code.push_str(&format!(",a:{this}.outer$.$$targs$$"));
            }
            code.push('}');
        }
        code.push_str("}));");
        Ok(code)
    }

    fn open_value(&mut self, key: &ValueKey, getter_owner: &str, lang: &str) -> Result<String> {
        let package = match &key.package {
            PackageRef::Bound => self.local(Local::Package)?,
            PackageRef::Inline(token) => package_lookup(token, lang),
        };
        Ok(format!(
            "{lang}OpenValue$jsint({package},{getter_owner}.{})",
            names::getter(&key.attribute)
        ))
    }

    fn witness(&mut self, witness: &Witness) -> Result<String> {
        Ok(match witness {
            Witness::Stored { holder, key } => {
                format!("{}.$$targs$$.{key}", self.local(*holder)?)
            }
            Witness::Described { key } => format!(
                "{}.$$targs$$.Type$Class.a.{key}",
                self.local(Local::TypeModel)?
            ),
            Witness::Of(ty) => {
                let holder = self.local(Local::Instance)?;
                self.sink.type_witness(ty, &holder)
            }
        })
    }

    fn describe(&mut self, operation: &str, class: DeclId) {
        if self.options.emit_comments {
            let name = &self.graph[class].name;
            self.sink.comment(&format!("{operation} for {name}"));
        }
    }

    fn bind(&mut self, local: Local) -> String {
        let name = self.sink.temp_name();
        self.locals.insert(local, name.clone());
        name
    }

    fn local(&self, local: Local) -> Result<String> {
        self.locals
            .get(&local)
            .cloned()
            .ok_or(Error::UnboundLocal { local })
    }

    fn statement(&mut self, code: String) {
        self.sink.out(&code);
        self.sink.end_line();
    }
}

fn package_lookup(token: &PackageToken, lang: &str) -> String {
    let package = match token {
        PackageToken::Language => LANGUAGE_PACKAGE_TOKEN,
        PackageToken::Named(name) => name.as_str(),
    };
    format!("{lang}lmp$(ex$,'{package}')")
}
