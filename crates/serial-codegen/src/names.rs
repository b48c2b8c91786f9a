//! Naming conventions of the generated JavaScript.

use crate::model::{DeclId, DeclarationGraph};

/// Runtime name of a declaration. Member classes carry their container's
/// name: `Inner$Outer`.
pub fn name(graph: &DeclarationGraph, id: DeclId) -> String {
    let decl = &graph[id];
    match decl.container {
        Some(container) => format!("{}${}", decl.name, name(graph, container)),
        None => decl.name.clone(),
    }
}

/// Name of the local holding the instance inside a class's operations.
pub fn self_name(graph: &DeclarationGraph, id: DeclId) -> String {
    let name = name(graph, id);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("$${}{}", first.to_lowercase(), chars.as_str()),
        None => "$$".to_string(),
    }
}

/// Getter identity of an attribute, the symbol its persisted key is built from.
pub fn getter(attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("$prop$get{}{}", first.to_uppercase(), chars.as_str()),
        None => "$prop$get".to_string(),
    }
}

/// Backing storage of an ordinary attribute.
pub fn private_name(graph: &DeclarationGraph, class: DeclId, attribute: &str) -> String {
    format!("{attribute}${}", name(graph, class))
}

/// Backing storage of a constructor parameter or a late attribute.
pub fn captured_name(attribute: &str) -> String {
    format!("{attribute}_")
}
