//! Selection of the attributes that take part in persistence.

use crate::model::{Attribute, Member, TypeDeclaration};

/// The persisted attributes of a class, in declaration order.
///
/// An attribute is kept when it holds a value (setter definitions don't), is
/// not formal and is not transient. Methods and nested types never qualify.
pub fn serializable_values(class: &TypeDeclaration) -> Vec<&Attribute> {
    class
        .members
        .iter()
        .filter_map(|member| match member {
            Member::Value(attr) if !attr.formal && !attr.transient => Some(attr),
            Member::Value(_) | Member::Setter(_) | Member::Method(_) | Member::NestedType(_) => {
                None
            }
        })
        .collect()
}
