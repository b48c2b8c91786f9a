//! Write-side operation of a serializable class.
//!
//! The helpers shared with the [deserializer](crate::deserializer) live here
//! too: both sides must agree on the ancestor they delegate to, on the package
//! part of every value key and on the witness paired with every value.

use crate::fragment::{
    Deconstructor, Fragment, Local, PackageRef, PackageToken, ValueKey, Witness,
};
use crate::model::{DeclId, DeclarationGraph, Type};
use crate::selector::serializable_values;

/// Fragments of the serializer of `class`.
///
/// A serializable ancestor is written first, then the class's own type
/// arguments, then each persisted attribute in declaration order.
pub fn serializer_fragments(graph: &DeclarationGraph, class: DeclId) -> Vec<Fragment> {
    let decl = &graph[class];
    let mut out = vec![Fragment::BeginSerializer { class }];

    if let Some(ancestor) = serializable_ancestor(graph, class) {
        out.push(Fragment::SerializeSuper { ancestor });
    }

    let own_keys: Vec<String> = (0..decl.type_parameters.len())
        .map(|index| graph.type_parameter_key(class, index))
        .collect();

    out.push(Fragment::Deconstruct(Deconstructor {
        class,
        type_arguments: own_keys.clone(),
        parameters: decl.parameters.iter().map(|p| p.ty.clone()).collect(),
        container: decl.container,
    }));

    if let Some(container) = decl.container {
        out.push(Fragment::PutOuterInstance { container });
    }

    for key in own_keys {
        out.push(Fragment::PutTypeArgument { class, key });
    }

    let values = serializable_values(decl);
    let package = package_reference(graph, class, values.len(), &mut out);
    for attr in values {
        out.push(Fragment::PutValue {
            key: ValueKey {
                package: package.clone(),
                class,
                attribute: attr.name.clone(),
            },
            witness: attribute_witness(graph, class, &attr.ty),
        });
    }

    out.push(Fragment::EndMethod);
    out
}

/// Nearest serializable class above `class`, skipping non-serializable ones.
///
/// Returns `None` once a universal root is reached.
pub(crate) fn serializable_ancestor(graph: &DeclarationGraph, class: DeclId) -> Option<DeclId> {
    let mut current = graph.extended_declaration(class);
    while let Some(ancestor) = current {
        if graph.is_root(ancestor) {
            return None;
        }
        if graph[ancestor].is_serializable() {
            return Some(ancestor);
        }
        current = graph.extended_declaration(ancestor);
    }
    None
}

pub(crate) fn package_token(graph: &DeclarationGraph, class: DeclId) -> PackageToken {
    if graph.is_language(class) {
        PackageToken::Language
    } else {
        PackageToken::Named(graph[class].package.clone())
    }
}

/// Package part of the value keys of `class`.
///
/// With more than one value the package is bound once to a local; a single
/// value refers to it inline.
pub(crate) fn package_reference(
    graph: &DeclarationGraph,
    class: DeclId,
    values: usize,
    out: &mut Vec<Fragment>,
) -> PackageRef {
    let token = package_token(graph, class);
    if values > 1 {
        out.push(Fragment::BindPackage(token));
        PackageRef::Bound
    } else {
        PackageRef::Inline(token)
    }
}

/// Witness paired with an attribute value.
///
/// An attribute typed exactly by one of the class's own type parameters uses
/// the argument stored on the instance.
pub(crate) fn attribute_witness(graph: &DeclarationGraph, class: DeclId, ty: &Type) -> Witness {
    match ty {
        Type::Parameter { owner, index } if *owner == class => Witness::Stored {
            holder: Local::Instance,
            key: graph.type_parameter_key(class, *index),
        },
        _ => Witness::Of(ty.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelExtractor;
    use crate::model::DeclKind;
    use pretty_assertions::assert_eq;

    fn graph(source: &str) -> DeclarationGraph {
        ModelExtractor::new()
            .add_source_str(source)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_point_writes_two_values_in_order() {
        let graph = graph(
            r#"
            #![package = "shapes"]
            #[serializable]
            struct Point { x: Integer, y: Integer }
        "#,
        );
        let point = graph.lookup("Point").unwrap();
        let integer = Type::declared(graph.lookup("Integer").unwrap());
        let key = |attribute: &str| ValueKey {
            package: PackageRef::Bound,
            class: point,
            attribute: attribute.to_string(),
        };

        assert_eq!(
            serializer_fragments(&graph, point),
            vec![
                Fragment::BeginSerializer { class: point },
                Fragment::Deconstruct(Deconstructor {
                    class: point,
                    type_arguments: vec![],
                    parameters: vec![],
                    container: None,
                }),
                Fragment::BindPackage(PackageToken::Named("shapes".to_string())),
                Fragment::PutValue {
                    key: key("x"),
                    witness: Witness::Of(integer.clone()),
                },
                Fragment::PutValue {
                    key: key("y"),
                    witness: Witness::Of(integer),
                },
                Fragment::EndMethod,
            ]
        );
    }

    #[test]
    fn test_delegates_to_nearest_serializable_ancestor() {
        let graph = graph(
            r#"
            #[serializable]
            struct Top { a: Integer }
            #[extends(Top)]
            struct Plain { b: Integer }
            #[serializable]
            #[extends(Plain)]
            struct Bottom { d: Integer }
        "#,
        );
        let top = graph.lookup("Top").unwrap();
        let bottom = graph.lookup("Bottom").unwrap();
        assert_eq!(serializable_ancestor(&graph, top), None);
        assert_eq!(serializable_ancestor(&graph, bottom), Some(top));

        let fragments = serializer_fragments(&graph, bottom);
        assert_eq!(fragments[1], Fragment::SerializeSuper { ancestor: top });
        assert_eq!(
            fragments
                .iter()
                .filter(|f| matches!(f, Fragment::SerializeSuper { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_class_extending_object_directly() {
        let mut graph = graph(
            r#"
            #[serializable]
            #[extends(Object)]
            struct Raw { value: Integer }
        "#,
        );
        let raw = graph.lookup("Raw").unwrap();
        let object = graph.object();
        assert_eq!(graph.extended_declaration(raw), Some(object));
        // the root is never delegated to, even when flagged serializable
        graph.declaration_mut(object).kind = DeclKind::Class {
            is_abstract: true,
            serializable: true,
        };

        assert_eq!(serializable_ancestor(&graph, raw), None);
        let fragments = serializer_fragments(&graph, raw);
        assert!(!fragments
            .iter()
            .any(|f| matches!(f, Fragment::SerializeSuper { .. })));
        assert!(matches!(fragments[1], Fragment::Deconstruct(_)));
    }

    #[test]
    fn test_no_delegation_below_plain_ancestors() {
        let graph = graph(
            r#"
            struct Plain { b: Integer }
            #[extends(Plain)]
            struct Middle { c: Integer }
            #[serializable]
            #[extends(Middle)]
            struct Bottom { d: Integer }
        "#,
        );
        let bottom = graph.lookup("Bottom").unwrap();
        assert_eq!(serializable_ancestor(&graph, bottom), None);
        assert!(matches!(
            serializer_fragments(&graph, bottom)[1],
            Fragment::Deconstruct(_)
        ));
    }

    #[test]
    fn test_single_value_uses_inline_package() {
        let graph = graph(
            r#"
            #![package = "app.model"]
            #[serializable]
            struct Id { value: Integer }
        "#,
        );
        let id = graph.lookup("Id").unwrap();
        let fragments = serializer_fragments(&graph, id);
        assert!(!fragments
            .iter()
            .any(|f| matches!(f, Fragment::BindPackage(_))));
        let keys: Vec<_> = fragments.iter().filter_map(Fragment::value_key).collect();
        assert_eq!(
            keys,
            vec![&ValueKey {
                package: PackageRef::Inline(PackageToken::Named("app.model".to_string())),
                class: id,
                attribute: "value".to_string(),
            }]
        );
    }

    #[test]
    fn test_generic_class_registers_own_type_arguments() {
        let graph = graph(
            r#"
            #[serializable]
            struct Entry<K, V> { key: K, value: V, label: String, #[param] size: Integer }
        "#,
        );
        let entry = graph.lookup("Entry").unwrap();
        let integer = Type::declared(graph.lookup("Integer").unwrap());
        let string = Type::declared(graph.lookup("String").unwrap());
        let fragments = serializer_fragments(&graph, entry);

        assert_eq!(
            fragments[1],
            Fragment::Deconstruct(Deconstructor {
                class: entry,
                type_arguments: vec!["K$Entry".to_string(), "V$Entry".to_string()],
                parameters: vec![integer.clone()],
                container: None,
            })
        );
        assert_eq!(
            fragments[2],
            Fragment::PutTypeArgument {
                class: entry,
                key: "K$Entry".to_string(),
            }
        );
        assert_eq!(
            fragments[3],
            Fragment::PutTypeArgument {
                class: entry,
                key: "V$Entry".to_string(),
            }
        );

        let witnesses: Vec<_> = fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::PutValue { witness, .. } => Some(witness.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            witnesses,
            vec![
                Witness::Stored {
                    holder: Local::Instance,
                    key: "K$Entry".to_string(),
                },
                Witness::Stored {
                    holder: Local::Instance,
                    key: "V$Entry".to_string(),
                },
                Witness::Of(string),
                Witness::Of(integer),
            ]
        );
    }

    #[test]
    fn test_member_class_attaches_outer_instance() {
        let graph = graph(
            r#"
            #[serializable]
            struct Outer<T> { item: T }
            #[serializable]
            #[member_of(Outer)]
            struct Inner { count: Integer }
        "#,
        );
        let outer = graph.lookup("Outer").unwrap();
        let inner = graph.lookup("Inner").unwrap();
        let fragments = serializer_fragments(&graph, inner);
        assert!(matches!(
            &fragments[1],
            Fragment::Deconstruct(d) if d.container == Some(outer)
        ));
        assert_eq!(
            fragments[2],
            Fragment::PutOuterInstance { container: outer }
        );
    }

    #[test]
    fn test_wrapped_type_parameter_is_delegated() {
        let graph = graph(
            r#"
            #[serializable]
            struct Maybe<T> { value: Union<T, Nothing> }
        "#,
        );
        let maybe = graph.lookup("Maybe").unwrap();
        let fragments = serializer_fragments(&graph, maybe);
        let witness = fragments.iter().find_map(|f| match f {
            Fragment::PutValue { witness, .. } => Some(witness),
            _ => None,
        });
        assert_eq!(
            witness,
            Some(&Witness::Of(Type::Union(vec![
                Type::parameter(maybe, 0),
                Type::Nothing,
            ])))
        );
    }

    #[test]
    fn test_language_package_token() {
        let mut graph = DeclarationGraph::new();
        let integer = graph.lookup("Integer").unwrap();
        assert_eq!(package_token(&graph, integer), PackageToken::Language);
        let id = graph.declare(crate::model::TypeDeclaration::class("Local", "app", "app"));
        assert_eq!(
            package_token(&graph, id),
            PackageToken::Named("app".to_string())
        );
    }
}
