//! The declaration graph the emitters read from.
//!
//! Declarations live in an arena owned by [`DeclarationGraph`] and are
//! addressed by a copyable [`DeclId`]. The graph is assembled once (by hand or
//! through [`ModelExtractor`](crate::ModelExtractor)) and is only read while
//! code is generated.
//!
//! Every graph is seeded with the *language package*, which holds the two
//! universal roots of the class hierarchy (`Object` and `Basic`) and a handful
//! of value classes that model files can refer to.

use indexmap::IndexMap;
use std::ops::Index;

/// Name of the package holding the universal roots and the built-in value classes.
pub const LANGUAGE_PACKAGE: &str = "language";

/// Name of the module the language package belongs to.
pub const LANGUAGE_MODULE: &str = "language";

/// Value classes registered in every graph, all extending `Object`.
const LANGUAGE_VALUE_CLASSES: &[&str] = &["Integer", "Float", "Boolean", "String", "Character"];

/// Handle to a type declaration stored in a [`DeclarationGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(usize);

impl DeclId {
    /// Position of the declaration in the graph, in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A type expression.
///
/// `Declared` is an instantiated (produced) type: a declaration plus concrete
/// arguments for its type parameters, positionally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Declared { decl: DeclId, arguments: Vec<Type> },
    Parameter { owner: DeclId, index: usize },
    Union(Vec<Type>),
    Intersection(Vec<Type>),
    Nothing,
}

impl Type {
    /// A non-generic reference to `decl`.
    pub fn declared(decl: DeclId) -> Self {
        Type::Declared {
            decl,
            arguments: Vec::new(),
        }
    }

    /// An instantiation of `decl` with the given arguments.
    pub fn generic(decl: DeclId, arguments: Vec<Type>) -> Self {
        Type::Declared { decl, arguments }
    }

    /// The `index`-th type parameter declared by `owner`.
    pub fn parameter(owner: DeclId, index: usize) -> Self {
        Type::Parameter { owner, index }
    }

    /// The declaration an instantiated type refers to.
    pub fn declaration(&self) -> Option<DeclId> {
        match self {
            Type::Declared { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// Concrete arguments of an instantiated type, empty for every other kind.
    pub fn arguments(&self) -> &[Type] {
        match self {
            Type::Declared { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// Replace every type parameter of `owner` with the matching entry of `arguments`.
    ///
    /// Parameters without a matching argument are left untouched.
    pub fn substitute(&self, owner: DeclId, arguments: &[Type]) -> Type {
        match self {
            Type::Parameter { owner: o, index } if *o == owner => arguments
                .get(*index)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Type::Parameter { .. } | Type::Nothing => self.clone(),
            Type::Declared { decl, arguments: args } => Type::Declared {
                decl: *decl,
                arguments: args
                    .iter()
                    .map(|a| a.substitute(owner, arguments))
                    .collect(),
            },
            Type::Union(cases) => Type::Union(
                cases
                    .iter()
                    .map(|c| c.substitute(owner, arguments))
                    .collect(),
            ),
            Type::Intersection(cases) => Type::Intersection(
                cases
                    .iter()
                    .map(|c| c.substitute(owner, arguments))
                    .collect(),
            ),
        }
    }
}

/// A type parameter declared by a class or an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
}

impl TypeParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One entry of a class's constructor parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

/// A value-bearing attribute (or a setter definition, see [`Member::Setter`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: Type,
    pub formal: bool,
    pub transient: bool,
    /// Captured constructor parameter.
    pub parameter: bool,
    /// Late-initialized attribute.
    pub late: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            formal: false,
            transient: false,
            parameter: false,
            late: false,
        }
    }

    pub fn formal(mut self) -> Self {
        self.formal = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn parameter(mut self) -> Self {
        self.parameter = true;
        self
    }

    pub fn late(mut self) -> Self {
        self.late = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub formal: bool,
}

/// A member of a class or interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// An attribute holding a value.
    Value(Attribute),
    /// A setter definition for an attribute; it holds no value of its own.
    Setter(Attribute),
    Method(Method),
    /// A member class or interface declared inside this one.
    NestedType(DeclId),
}

/// Whether a declaration is a class or an interface, with the class-only flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class { is_abstract: bool, serializable: bool },
    Interface,
}

/// A class or interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    pub package: String,
    pub module: String,
    pub kind: DeclKind,
    pub type_parameters: Vec<TypeParameter>,
    /// Always `None` for interfaces and for `Object`.
    pub extended_type: Option<Type>,
    pub satisfied_types: Vec<Type>,
    pub parameters: Vec<Parameter>,
    pub members: Vec<Member>,
    /// Enclosing class or interface of a member class.
    pub container: Option<DeclId>,
}

impl TypeDeclaration {
    fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        module: impl Into<String>,
        kind: DeclKind,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            module: module.into(),
            kind,
            type_parameters: Vec::new(),
            extended_type: None,
            satisfied_types: Vec::new(),
            parameters: Vec::new(),
            members: Vec::new(),
            container: None,
        }
    }

    /// A concrete, non-serializable class with no supertypes.
    pub fn class(
        name: impl Into<String>,
        package: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            package,
            module,
            DeclKind::Class {
                is_abstract: false,
                serializable: false,
            },
        )
    }

    pub fn interface(
        name: impl Into<String>,
        package: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self::new(name, package, module, DeclKind::Interface)
    }

    pub fn with_type_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_parameters = names.into_iter().map(TypeParameter::new).collect();
        self
    }

    pub fn abstract_class(mut self) -> Self {
        if let DeclKind::Class { is_abstract, .. } = &mut self.kind {
            *is_abstract = true;
        }
        self
    }

    pub fn serializable(mut self) -> Self {
        if let DeclKind::Class { serializable, .. } = &mut self.kind {
            *serializable = true;
        }
        self
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class { .. })
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, DeclKind::Interface)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Class {
                is_abstract: true,
                ..
            }
        )
    }

    pub fn is_serializable(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Class {
                serializable: true,
                ..
            }
        )
    }

    /// Whether this is a member class, which needs an enclosing instance.
    pub fn is_member(&self) -> bool {
        self.container.is_some()
    }
}

/// Arena of every class and interface visible to one compilation unit.
#[derive(Debug, Clone)]
pub struct DeclarationGraph {
    declarations: Vec<TypeDeclaration>,
    names: IndexMap<(String, String), DeclId>,
    object: DeclId,
    basic: DeclId,
}

impl Default for DeclarationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationGraph {
    /// Create a graph holding only the language package.
    pub fn new() -> Self {
        let mut graph = Self {
            declarations: Vec::new(),
            names: IndexMap::new(),
            object: DeclId(0),
            basic: DeclId(0),
        };

        let object = graph.declare(
            TypeDeclaration::class("Object", LANGUAGE_PACKAGE, LANGUAGE_MODULE).abstract_class(),
        );
        let mut basic =
            TypeDeclaration::class("Basic", LANGUAGE_PACKAGE, LANGUAGE_MODULE).abstract_class();
        basic.extended_type = Some(Type::declared(object));
        let basic = graph.declare(basic);
        graph.object = object;
        graph.basic = basic;

        for name in LANGUAGE_VALUE_CLASSES {
            let mut class = TypeDeclaration::class(*name, LANGUAGE_PACKAGE, LANGUAGE_MODULE);
            class.extended_type = Some(Type::declared(object));
            graph.declare(class);
        }
        graph
    }

    /// Add a declaration and return its handle.
    ///
    /// Declarations are indexed by package and simple name; declaring the
    /// same name twice in one package makes [`lookup_in`](Self::lookup_in)
    /// resolve to the newer declaration.
    pub fn declare(&mut self, declaration: TypeDeclaration) -> DeclId {
        let id = DeclId(self.declarations.len());
        let key = (declaration.package.clone(), declaration.name.clone());
        self.names.insert(key, id);
        self.declarations.push(declaration);
        id
    }

    pub fn get(&self, id: DeclId) -> &TypeDeclaration {
        &self.declarations[id.0]
    }

    pub fn declaration_mut(&mut self, id: DeclId) -> &mut TypeDeclaration {
        &mut self.declarations[id.0]
    }

    /// The first declaration named `name` in any package.
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.names
            .iter()
            .find(|((_, simple), _)| simple == name)
            .map(|(_, id)| *id)
    }

    /// The declaration named `name` in `package`.
    pub fn lookup_in(&self, package: &str, name: &str) -> Option<DeclId> {
        self.names
            .get(&(package.to_string(), name.to_string()))
            .copied()
    }

    /// All declarations, in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.declarations.len()).map(DeclId)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn object(&self) -> DeclId {
        self.object
    }

    pub fn basic(&self) -> DeclId {
        self.basic
    }

    /// Whether `id` is one of the two universal roots of the class hierarchy.
    pub fn is_root(&self, id: DeclId) -> bool {
        id == self.object || id == self.basic
    }

    pub fn is_language(&self, id: DeclId) -> bool {
        self.get(id).package == LANGUAGE_PACKAGE
    }

    /// Append a member to a declaration, linking nested types to their container.
    pub fn add_member(&mut self, owner: DeclId, member: Member) {
        if let Member::NestedType(nested) = &member {
            self.declarations[nested.0].container = Some(owner);
        }
        self.declarations[owner.0].members.push(member);
    }

    /// Classes that get a serializer, in declaration order.
    pub fn serializable_classes(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.ids()
            .filter(|id| !self.is_root(*id) && self.get(*id).is_serializable())
    }

    /// `id` instantiated with its own type parameters, `D<T, U>` inside `D`.
    pub fn self_type(&self, id: DeclId) -> Type {
        let arguments = (0..self.get(id).type_parameters.len())
            .map(|index| Type::parameter(id, index))
            .collect();
        Type::generic(id, arguments)
    }

    /// The class directly extended by `id`.
    pub fn extended_declaration(&self, id: DeclId) -> Option<DeclId> {
        self.get(id)
            .extended_type
            .as_ref()
            .and_then(Type::declaration)
    }

    /// The extended type of an instantiated type, in terms of that instantiation.
    pub fn extended_type_of(&self, ty: &Type) -> Option<Type> {
        let Type::Declared { decl, arguments } = ty else {
            return None;
        };
        self.get(*decl)
            .extended_type
            .as_ref()
            .map(|ext| ext.substitute(*decl, arguments))
    }

    /// The satisfied types of an instantiated type, in declaration order.
    pub fn satisfied_types_of(&self, ty: &Type) -> Vec<Type> {
        let Type::Declared { decl, arguments } = ty else {
            return Vec::new();
        };
        self.get(*decl)
            .satisfied_types
            .iter()
            .map(|sat| sat.substitute(*decl, arguments))
            .collect()
    }

    /// The instantiation of `ancestor` that `ty` inherits, if any.
    ///
    /// The extended class is searched before the satisfied interfaces.
    pub fn supertype(&self, ty: &Type, ancestor: DeclId) -> Option<Type> {
        if ty.declaration()? == ancestor {
            return Some(ty.clone());
        }
        self.extended_type_of(ty)
            .into_iter()
            .chain(self.satisfied_types_of(ty))
            .find_map(|sup| self.supertype(&sup, ancestor))
    }

    pub fn type_parameter_name(&self, owner: DeclId, index: usize) -> &str {
        &self.get(owner).type_parameters[index].name
    }

    /// Runtime key of a type parameter: `<Param>$<Owner>`.
    pub fn type_parameter_key(&self, owner: DeclId, index: usize) -> String {
        format!(
            "{}${}",
            self.type_parameter_name(owner, index),
            self.get(owner).name
        )
    }
}

impl Index<DeclId> for DeclarationGraph {
    type Output = TypeDeclaration;

    fn index(&self, id: DeclId) -> &TypeDeclaration {
        self.get(id)
    }
}
