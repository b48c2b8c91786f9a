//! Read-side factory of a serializable class.
//!
//! Mirrors the [serializer](crate::serializer): the same ancestor is delegated
//! to before any own value is read, and values are read in the order and
//! under the keys they were written with.

use crate::fragment::{Fragment, Storage, TypeArgument, ValueKey, Witness};
use crate::model::{DeclId, DeclarationGraph};
use crate::resolver::type_argument_fragment;
use crate::selector::serializable_values;
use crate::serializer::{attribute_witness, package_reference, serializable_ancestor};

/// Fragments of the deserializer of `class`.
///
/// A concrete class allocates the instance when the caller supplied none and
/// binds every type argument on it; an abstract class only fills in its own
/// attributes on the instance handed down by a concrete subclass and returns
/// nothing.
pub fn deserializer_fragments(graph: &DeclarationGraph, class: DeclId) -> Vec<Fragment> {
    let decl = &graph[class];
    let mut out = vec![Fragment::BeginDeserializer { class }];

    if decl.is_member() {
        out.push(Fragment::OuterInstancePending { class });
    }

    if !decl.is_abstract() {
        out.push(Fragment::BeginAllocation);
        out.push(Fragment::Allocate { class });
        if !decl.type_parameters.is_empty() {
            let own = (0..decl.type_parameters.len())
                .map(|index| {
                    let key = graph.type_parameter_key(class, index);
                    TypeArgument {
                        key: key.clone(),
                        witness: Witness::Described { key },
                    }
                })
                .collect();
            out.push(Fragment::SetTypeArguments(own));
        }
        out.extend(type_argument_fragment(graph, class));
        out.push(Fragment::EndAllocation);
    }

    if let Some(ancestor) = serializable_ancestor(graph, class) {
        out.push(Fragment::DeserializeSuper { ancestor });
    }

    let values = serializable_values(decl);
    let package = package_reference(graph, class, values.len(), &mut out);
    for attr in values {
        let storage = if attr.parameter || attr.late {
            Storage::Captured
        } else {
            Storage::State
        };
        out.push(Fragment::GetValue {
            key: ValueKey {
                package: package.clone(),
                class,
                attribute: attr.name.clone(),
            },
            storage,
            witness: attribute_witness(graph, class, &attr.ty),
        });
    }

    if !decl.is_abstract() {
        out.push(Fragment::ReturnInstance);
    }
    out.push(Fragment::EndMethod);
    out
}
