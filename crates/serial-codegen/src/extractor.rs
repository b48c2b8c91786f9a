//! Reader for declaration models written in Rust item syntax.
//!
//! A model file is an ordinary Rust source file. Structs declare classes,
//! traits declare interfaces and inherent `impl` blocks contribute methods:
//!
//! ```text
//! #![package = "shapes"]
//!
//! #[serializable]
//! #[abstract_class]
//! #[satisfies(Named)]
//! struct Shape<T> { name: String, tag: T, #[transient] area: Float }
//!
//! #[serializable]
//! #[extends(Shape<Integer>)]
//! struct Circle { #[param] radius: Float }
//!
//! trait Named {}
//! ```
//!
//! `Union<..>`, `Intersection<..>` and `Nothing` stand for the corresponding
//! type forms. Declarations may refer to each other in any order and across
//! files. A plain name resolves in the referring file's package first, then in
//! the language package, then in any other package; `maps::Point` names the
//! `Point` of package `maps` (`a::b::Point` is package `a.b`).

use crate::error::{Error, Result};
use crate::model::{
    Attribute, DeclId, DeclarationGraph, LANGUAGE_PACKAGE, Member, Method, Parameter, Type,
    TypeDeclaration,
};
use log::{debug, trace};
use std::fs;
use std::path::Path;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, Fields, GenericArgument, Item, Lit, Meta, PathArguments, Token};
use walkdir::WalkDir;

const DEFAULT_PACKAGE: &str = "default";

/// One parsed model file.
#[derive(Debug)]
struct ModelFile {
    origin: String,
    package: String,
    module: String,
    items: Vec<Item>,
}

/// Collects model files and builds a [`DeclarationGraph`] from them.
#[derive(Debug, Default)]
pub struct ModelExtractor {
    files: Vec<ModelFile>,
}

impl ModelExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a model from a string.
    pub fn add_source_str(&mut self, source: &str) -> Result<&mut Self> {
        self.parse("<string>", source)?;
        Ok(self)
    }

    /// Parse a single model file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let graph = ModelExtractor::new()
    ///     .add_source_file("model/shapes.rs")?
    ///     .build()?;
    /// ```
    pub fn add_source_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&path.display().to_string(), &source)?;
        Ok(self)
    }

    /// Recursively scan a directory for `.rs` model files, in file name order.
    pub fn add_source_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "rs") {
                self.add_source_file(path)?;
            }
        }
        Ok(self)
    }

    fn parse(&mut self, origin: &str, source: &str) -> Result<()> {
        let file = syn::parse_file(source).map_err(|source| Error::Parse {
            origin: origin.to_string(),
            source,
        })?;

        let package = file_attribute(&file.attrs, "package");
        let module = file_attribute(&file.attrs, "module");
        let package = package.unwrap_or_else(|| DEFAULT_PACKAGE.to_string());
        // a package lives in the module of the same name unless told otherwise
        let module = module.unwrap_or_else(|| package.clone());

        trace!("parsed {origin}: package `{package}` in module `{module}`");
        self.files.push(ModelFile {
            origin: origin.to_string(),
            package,
            module,
            items: file.items,
        });
        Ok(())
    }

    /// Build the declaration graph of every model added so far.
    ///
    /// Declarations are registered first and resolved afterwards, so forward
    /// references and references across files are allowed.
    pub fn build(&self) -> Result<DeclarationGraph> {
        let mut graph = DeclarationGraph::new();
        let mut structs = Vec::new();
        let mut traits = Vec::new();
        let mut impls = Vec::new();

        for file in &self.files {
            for item in &file.items {
                match item {
                    Item::Struct(item) => {
                        let decl = TypeDeclaration::class(
                            item.ident.to_string(),
                            &file.package,
                            &file.module,
                        );
                        let decl = class_flags(decl, &item.attrs);
                        let id = register(&mut graph, file, decl, &item.generics)?;
                        structs.push((id, item));
                    }
                    Item::Trait(item) => {
                        let decl = TypeDeclaration::interface(
                            item.ident.to_string(),
                            &file.package,
                            &file.module,
                        );
                        let id = register(&mut graph, file, decl, &item.generics)?;
                        traits.push((id, item));
                    }
                    Item::Impl(item) => impls.push((file, item)),
                    _ => trace!("{}: ignoring item", file.origin),
                }
            }
        }

        // containers first: member classes see their container's type parameters
        for (id, item) in &structs {
            for attr in &item.attrs {
                if attr.path().is_ident("member_of") {
                    let outer: syn::Path = attr
                        .parse_args()
                        .map_err(|e| invalid_attribute(&graph, *id, &e))?;
                    let Some(segment) = outer.segments.last() else {
                        return Err(unsupported(&graph, *id, "empty container path"));
                    };
                    let name = segment.ident.to_string();
                    let outer = lookup(&graph, *id, qualifier(&outer).as_deref(), &name)?;
                    graph.add_member(outer, Member::NestedType(*id));
                }
            }
        }
        check_containers(&graph)?;

        for (id, item) in &structs {
            resolve_class(&mut graph, *id, item)?;
        }
        for (id, item) in &traits {
            resolve_interface(&mut graph, *id, item)?;
        }
        for (file, item) in impls {
            resolve_impl(&mut graph, &file.package, item)?;
        }
        check_supertypes(&graph)?;

        debug!(
            "built {} declarations from {} model files",
            graph.len(),
            self.files.len()
        );
        Ok(graph)
    }
}

/// Value of a file-level `#![name = "value"]` attribute.
fn file_attribute(attrs: &[syn::Attribute], name: &str) -> Option<String> {
    attrs.iter().find_map(|attr| match &attr.meta {
        Meta::NameValue(meta) if meta.path.is_ident(name) => match &meta.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(value),
                ..
            }) => Some(value.value()),
            _ => None,
        },
        _ => None,
    })
}

fn has_flag(attrs: &[syn::Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn class_flags(mut decl: TypeDeclaration, attrs: &[syn::Attribute]) -> TypeDeclaration {
    if has_flag(attrs, "abstract_class") {
        decl = decl.abstract_class();
    }
    if has_flag(attrs, "serializable") {
        decl = decl.serializable();
    }
    decl
}

fn register(
    graph: &mut DeclarationGraph,
    file: &ModelFile,
    decl: TypeDeclaration,
    generics: &syn::Generics,
) -> Result<DeclId> {
    // two packages compiled into one module share the module's export names
    let taken = graph.ids().any(|other| {
        let other = &graph[other];
        other.name == decl.name && (other.package == decl.package || other.module == decl.module)
    });
    if taken {
        return Err(Error::DuplicateDeclaration { name: decl.name });
    }
    let params: Vec<String> = generics
        .type_params()
        .map(|param| param.ident.to_string())
        .collect();
    trace!("registered `{}` from {}", decl.name, file.origin);
    Ok(graph.declare(decl.with_type_parameters(params)))
}

fn resolve_class(graph: &mut DeclarationGraph, id: DeclId, item: &syn::ItemStruct) -> Result<()> {
    let mut extended = None;
    let mut satisfied = Vec::new();

    for attr in &item.attrs {
        if attr.path().is_ident("extends") {
            let ty: syn::Type = attr
                .parse_args()
                .map_err(|e| invalid_attribute(graph, id, &e))?;
            let ty = resolve_type(graph, id, &ty)?;
            expect_kind(graph, id, &ty, true)?;
            extended = Some(ty);
        } else if attr.path().is_ident("satisfies") {
            let types = attr
                .parse_args_with(Punctuated::<syn::Type, Token![,]>::parse_terminated)
                .map_err(|e| invalid_attribute(graph, id, &e))?;
            for ty in &types {
                let ty = resolve_type(graph, id, ty)?;
                expect_kind(graph, id, &ty, false)?;
                satisfied.push(ty);
            }
        }
    }

    let mut parameters = Vec::new();
    let mut members = Vec::new();
    let fields: Vec<&syn::Field> = match &item.fields {
        Fields::Named(fields) => fields.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(Error::UnsupportedType {
                declaration: graph[id].name.clone(),
                detail: "tuple structs have no attribute names".to_string(),
            });
        }
    };
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let name = ident.to_string();
        let ty = resolve_type(graph, id, &field.ty)?;
        let mut attr = Attribute::new(&name, ty.clone());
        if has_flag(&field.attrs, "formal") {
            attr = attr.formal();
        }
        if has_flag(&field.attrs, "transient") {
            attr = attr.transient();
        }
        if has_flag(&field.attrs, "late") {
            attr = attr.late();
        }
        if has_flag(&field.attrs, "param") {
            attr = attr.parameter();
            parameters.push(Parameter { name, ty });
        }
        if has_flag(&field.attrs, "setter") {
            members.push(Member::Setter(attr));
        } else {
            members.push(Member::Value(attr));
        }
    }

    let basic = graph.basic();
    let decl = graph.declaration_mut(id);
    decl.extended_type = Some(extended.unwrap_or_else(|| Type::declared(basic)));
    decl.satisfied_types = satisfied;
    decl.parameters = parameters;
    for member in members {
        graph.add_member(id, member);
    }
    Ok(())
}

fn resolve_interface(
    graph: &mut DeclarationGraph,
    id: DeclId,
    item: &syn::ItemTrait,
) -> Result<()> {
    let mut satisfied = Vec::new();
    for bound in &item.supertraits {
        let syn::TypeParamBound::Trait(bound) = bound else {
            continue;
        };
        let ty = syn::Type::Path(syn::TypePath {
            qself: None,
            path: bound.path.clone(),
        });
        let ty = resolve_type(graph, id, &ty)?;
        expect_kind(graph, id, &ty, false)?;
        satisfied.push(ty);
    }
    graph.declaration_mut(id).satisfied_types = satisfied;

    for trait_item in &item.items {
        if let syn::TraitItem::Fn(method) = trait_item {
            graph.add_member(
                id,
                Member::Method(Method {
                    name: method.sig.ident.to_string(),
                    formal: method.default.is_none(),
                }),
            );
        }
    }
    Ok(())
}

/// Methods of an inherent `impl`; a trait `impl` also makes the class satisfy
/// the trait.
fn resolve_impl(graph: &mut DeclarationGraph, package: &str, item: &syn::ItemImpl) -> Result<()> {
    let syn::Type::Path(self_ty) = item.self_ty.as_ref() else {
        return Ok(());
    };
    let Some(segment) = self_ty.path.segments.last() else {
        return Ok(());
    };
    let name = segment.ident.to_string();
    let qualifier = qualifier(&self_ty.path);
    let id = find(graph, package, qualifier.as_deref(), &name).ok_or_else(|| {
        Error::UnknownType {
            declaration: format!("impl {name}"),
            name: name.clone(),
        }
    })?;

    if let Some((_, path, _)) = &item.trait_ {
        let ty = syn::Type::Path(syn::TypePath {
            qself: None,
            path: path.clone(),
        });
        let ty = resolve_type(graph, id, &ty)?;
        expect_kind(graph, id, &ty, false)?;
        graph.declaration_mut(id).satisfied_types.push(ty);
    }

    for impl_item in &item.items {
        if let syn::ImplItem::Fn(method) = impl_item {
            graph.add_member(
                id,
                Member::Method(Method {
                    name: method.sig.ident.to_string(),
                    formal: has_flag(&method.attrs, "formal"),
                }),
            );
        }
    }
    Ok(())
}

fn resolve_type(graph: &DeclarationGraph, scope: DeclId, ty: &syn::Type) -> Result<Type> {
    let path = match ty {
        syn::Type::Paren(inner) => return resolve_type(graph, scope, &inner.elem),
        syn::Type::Group(inner) => return resolve_type(graph, scope, &inner.elem),
        syn::Type::Path(path) if path.qself.is_none() => &path.path,
        _ => return Err(unsupported(graph, scope, "only named types are supported")),
    };
    let Some(segment) = path.segments.last() else {
        return Err(unsupported(graph, scope, "empty type path"));
    };
    let name = segment.ident.to_string();

    let mut arguments = Vec::new();
    match &segment.arguments {
        PathArguments::None => {}
        PathArguments::AngleBracketed(generic) => {
            for argument in &generic.args {
                let GenericArgument::Type(argument) = argument else {
                    return Err(unsupported(
                        graph,
                        scope,
                        &format!("`{name}` takes only type arguments"),
                    ));
                };
                arguments.push(resolve_type(graph, scope, argument)?);
            }
        }
        PathArguments::Parenthesized(_) => {
            return Err(unsupported(
                graph,
                scope,
                &format!("`{name}` cannot take parenthesized arguments"),
            ));
        }
    }

    let qualifier = qualifier(path);
    if qualifier.is_none() {
        match name.as_str() {
            "Nothing" if arguments.is_empty() => return Ok(Type::Nothing),
            "Union" => return Ok(Type::Union(arguments)),
            "Intersection" => return Ok(Type::Intersection(arguments)),
            _ => {}
        }
    }

    if let Some(parameter) = qualifier
        .is_none()
        .then(|| type_parameter(graph, scope, &name))
        .flatten()
    {
        if !arguments.is_empty() {
            return Err(unsupported(
                graph,
                scope,
                &format!("type parameter `{name}` takes no arguments"),
            ));
        }
        return Ok(parameter);
    }

    let decl = lookup(graph, scope, qualifier.as_deref(), &name)?;
    let expected = graph[decl].type_parameters.len();
    if expected != arguments.len() {
        return Err(unsupported(
            graph,
            scope,
            &format!(
                "`{name}` expects {expected} type arguments, found {}",
                arguments.len()
            ),
        ));
    }
    Ok(Type::generic(decl, arguments))
}

/// A type parameter named `name` of `scope` or of one of its containers.
fn type_parameter(graph: &DeclarationGraph, scope: DeclId, name: &str) -> Option<Type> {
    let mut current = Some(scope);
    while let Some(owner) = current {
        let decl = &graph[owner];
        if let Some(index) = decl.type_parameters.iter().position(|p| p.name == name) {
            return Some(Type::parameter(owner, index));
        }
        current = decl.container;
    }
    None
}

/// Package named by the leading segments of `path`, if any.
fn qualifier(path: &syn::Path) -> Option<String> {
    let count = path.segments.len();
    (count > 1).then(|| {
        path.segments
            .iter()
            .take(count - 1)
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>()
            .join(".")
    })
}

/// Resolve `name` as seen from `package`.
fn find(
    graph: &DeclarationGraph,
    package: &str,
    qualifier: Option<&str>,
    name: &str,
) -> Option<DeclId> {
    match qualifier {
        Some(qualifier) => graph.lookup_in(qualifier, name),
        None => graph
            .lookup_in(package, name)
            .or_else(|| graph.lookup_in(LANGUAGE_PACKAGE, name))
            .or_else(|| graph.lookup(name)),
    }
}

fn lookup(
    graph: &DeclarationGraph,
    scope: DeclId,
    qualifier: Option<&str>,
    name: &str,
) -> Result<DeclId> {
    find(graph, &graph[scope].package, qualifier, name).ok_or_else(|| Error::UnknownType {
        declaration: graph[scope].name.clone(),
        name: match qualifier {
            Some(qualifier) => format!("{}::{name}", qualifier.replace('.', "::")),
            None => name.to_string(),
        },
    })
}

/// Reject classes nested, directly or not, in themselves.
fn check_containers(graph: &DeclarationGraph) -> Result<()> {
    for id in graph.ids() {
        let mut container = graph[id].container;
        let mut depth = 0;
        while let Some(outer) = container {
            depth += 1;
            if outer == id || depth > graph.len() {
                return Err(Error::CyclicNesting {
                    declaration: graph[id].name.clone(),
                });
            }
            container = graph[outer].container;
        }
    }
    Ok(())
}

/// Reject declarations that extend or satisfy themselves through any chain of
/// supertypes.
fn check_supertypes(graph: &DeclarationGraph) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(graph: &DeclarationGraph, id: DeclId, marks: &mut [Mark]) -> Result<()> {
        match marks[id.index()] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                return Err(Error::CyclicInheritance {
                    declaration: graph[id].name.clone(),
                });
            }
            Mark::Unvisited => {}
        }
        marks[id.index()] = Mark::Visiting;
        let decl = &graph[id];
        let supertypes = decl.extended_type.iter().chain(&decl.satisfied_types);
        for supertype in supertypes.filter_map(Type::declaration) {
            visit(graph, supertype, marks)?;
        }
        marks[id.index()] = Mark::Done;
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; graph.len()];
    for id in graph.ids() {
        visit(graph, id, &mut marks)?;
    }
    trace!("supertype graph is acyclic");
    Ok(())
}

fn unsupported(graph: &DeclarationGraph, scope: DeclId, detail: &str) -> Error {
    Error::UnsupportedType {
        declaration: graph[scope].name.clone(),
        detail: detail.to_string(),
    }
}

fn invalid_attribute(graph: &DeclarationGraph, scope: DeclId, error: &syn::Error) -> Error {
    Error::InvalidAttribute {
        declaration: graph[scope].name.clone(),
        detail: error.to_string(),
    }
}
