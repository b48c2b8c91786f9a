//! Propagation of type arguments across a class's ancestor DAG.
//!
//! A freshly allocated instance only knows its own type arguments. Every
//! ancestor class and every interface reachable from it also needs its type
//! parameters bound, exactly once, even when an interface is reachable along
//! several satisfaction paths.

use crate::fragment::{Fragment, TypeArgument, Witness};
use crate::model::{DeclId, DeclarationGraph, Type};
use log::trace;
use std::collections::HashSet;

/// Bindings for every type parameter of every ancestor of `class`.
///
/// The extended-class chain is walked upward up to (excluding) the universal
/// roots; each class contributes its bindings followed by those of the
/// interfaces it satisfies. The interfaces satisfied by `class` itself come
/// last. An already visited declaration is skipped along with everything
/// reachable only through it, so the first path to reach a declaration wins.
pub fn resolve_type_arguments(graph: &DeclarationGraph, class: DeclId) -> Vec<TypeArgument> {
    let mut visited = HashSet::from([class]);
    let mut bindings = Vec::new();
    let root = graph.self_type(class);

    let mut current = graph.extended_type_of(&root);
    while let Some(ty) = current {
        let Some(decl) = ty.declaration() else {
            break;
        };
        if graph.is_root(decl) {
            break;
        }
        if visited.insert(decl) {
            push_bindings(graph, &ty, &mut bindings);
            for sat in graph.satisfied_types_of(&ty) {
                visit_interface(graph, &sat, &mut visited, &mut bindings);
            }
        }
        current = graph.extended_type_of(&ty);
    }

    for sat in graph.satisfied_types_of(&root) {
        visit_interface(graph, &sat, &mut visited, &mut bindings);
    }
    bindings
}

/// The batched type-argument assignment for `class`, or `None` when there is
/// nothing to bind.
pub fn type_argument_fragment(graph: &DeclarationGraph, class: DeclId) -> Option<Fragment> {
    let bindings = resolve_type_arguments(graph, class);
    (!bindings.is_empty()).then_some(Fragment::SetTypeArguments(bindings))
}

fn visit_interface(
    graph: &DeclarationGraph,
    ty: &Type,
    visited: &mut HashSet<DeclId>,
    bindings: &mut Vec<TypeArgument>,
) {
    let Some(decl) = ty.declaration() else {
        return;
    };
    if !visited.insert(decl) {
        trace!("skipping already visited `{}`", graph[decl].name);
        return;
    }
    push_bindings(graph, ty, bindings);
    for sat in graph.satisfied_types_of(ty) {
        visit_interface(graph, &sat, visited, bindings);
    }
}

/// Pair each type parameter of `ty`'s declaration with its argument in `ty`.
fn push_bindings(graph: &DeclarationGraph, ty: &Type, bindings: &mut Vec<TypeArgument>) {
    let Type::Declared { decl, arguments } = ty else {
        return;
    };
    trace!("binding type arguments of `{}`", graph[*decl].name);
    for (index, argument) in arguments.iter().enumerate() {
        bindings.push(TypeArgument {
            key: graph.type_parameter_key(*decl, index),
            witness: Witness::Of(argument.clone()),
        });
    }
}
