//! Code-fragment tokens produced by the emitters.
//!
//! The serializer and deserializer emitters are pure: they turn a class into
//! an ordered `Vec<Fragment>` and never touch text. A
//! [`Renderer`](crate::render::Renderer) later feeds the tokens to an
//! [`OutputSink`](crate::sink::OutputSink).

use crate::model::{DeclId, Type};

/// Method-local slots, named by the renderer when a method body opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Local {
    /// Write destination passed to a serializer.
    Destination,
    /// Accumulator returned by the write destination.
    Deconstructor,
    /// Read source passed to a deserializer.
    Source,
    /// Instantiated-type descriptor passed to a deserializer.
    TypeModel,
    /// The instance being written or populated.
    Instance,
    /// Package reference shared by the value keys of one method.
    Package,
}

/// Package identity of a class as it appears in persisted keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageToken {
    /// The language package, persisted under a short canonical token.
    Language,
    Named(String),
}

/// How a value key refers to its package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageRef {
    /// Through [`Local::Package`], bound by a preceding [`Fragment::BindPackage`].
    Bound,
    Inline(PackageToken),
}

/// Key a persisted value is stored under: (package, getter identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueKey {
    pub package: PackageRef,
    /// Class declaring the attribute; the getter lives on its prototype.
    pub class: DeclId,
    pub attribute: String,
}

/// Source of the runtime type witness paired with a value or type argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Witness {
    /// A type argument stored on an instance under `key`.
    Stored { holder: Local, key: String },
    /// A type argument carried by the deserializer's type descriptor.
    Described { key: String },
    /// Delegated to the sink's type-witness emitter.
    Of(Type),
}

/// One type-parameter binding, keyed `<Param>$<Owner>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeArgument {
    pub key: String,
    pub witness: Witness,
}

/// Backing storage an attribute is restored into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Ordinary state, stored under the attribute's private name.
    State,
    /// Constructor parameters and late attributes.
    Captured,
}

/// Write-side accumulator requested from the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deconstructor {
    pub class: DeclId,
    /// Keys of the class's own type parameters, read from the instance.
    pub type_arguments: Vec<String>,
    /// Witness types of the constructor parameters. Empty selects the shared
    /// empty witness.
    pub parameters: Vec<Type>,
    /// Enclosing declaration of a member class.
    pub container: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    BeginSerializer { class: DeclId },
    BeginDeserializer { class: DeclId },
    SerializeSuper { ancestor: DeclId },
    DeserializeSuper { ancestor: DeclId },
    Deconstruct(Deconstructor),
    PutOuterInstance { container: DeclId },
    PutTypeArgument { class: DeclId, key: String },
    BindPackage(PackageToken),
    PutValue { key: ValueKey, witness: Witness },
    /// Marker: the enclosing instance of a member class is not recovered.
    OuterInstancePending { class: DeclId },
    /// Opens the block that only runs when no instance was supplied.
    BeginAllocation,
    Allocate { class: DeclId },
    SetTypeArguments(Vec<TypeArgument>),
    EndAllocation,
    GetValue {
        key: ValueKey,
        storage: Storage,
        witness: Witness,
    },
    ReturnInstance,
    EndMethod,
}

impl Fragment {
    /// The persisted key written or read by this fragment.
    pub fn value_key(&self) -> Option<&ValueKey> {
        match self {
            Fragment::PutValue { key, .. } | Fragment::GetValue { key, .. } => Some(key),
            _ => None,
        }
    }
}
