#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{AssociationId, TypeId};
use crate::model::{AssociationEnd, Model, StructuredKind};
use crate::placeholder::{Checkable, Resolved};

impl Model {
    /// Index (0 or 1) of the end playing `role`.
    pub fn find_end(&self, id: AssociationId, role: &str) -> Option<usize> {
        self.association(id)
            .ends
            .iter()
            .position(|e| e.bad.is_none() && e.role == role)
    }

    pub fn end(&self, id: AssociationId, index: usize) -> &AssociationEnd {
        &self.association(id).ends[index]
    }

    /// Entity type of an end; synthesized ends resolve to their bad
    /// placeholder.
    pub fn end_type(&self, id: AssociationId, index: usize) -> Resolved<TypeId> {
        let a = self.association(id);
        let end = &a.ends[index];
        end.entity_type.get(|| {
            if let Some(bad) = &end.bad {
                return Resolved::Placeholder(Rc::clone(bad));
            }
            match &end.entity_type_name {
                Some(name) => self.resolve_structured(a.schema, name, StructuredKind::Entity),
                None => unreachable!("declared association end without a type name"),
            }
        })
    }

    pub fn association_errors(&self, id: AssociationId) -> Rc<[EdmError]> {
        let a = self.association(id);
        a.errors.get(|| {
            let mut errors = Vec::new();
            if a.declared_end_count > 2 {
                errors.push(EdmError::new(
                    EdmErrorCode::InvalidAssociationEndCount,
                    a.common.span,
                    format!(
                        "association '{}' must declare exactly two ends, found {}",
                        a.common.name, a.declared_end_count
                    ),
                ));
            }
            // Both synthesized ends carry the same count error; report it once.
            let mut reported_bad = false;
            for index in 0..2 {
                let ty = self.end_type(id, index);
                if ty.is_bad_element() {
                    if reported_bad {
                        continue;
                    }
                    reported_bad = true;
                }
                errors.extend_from_slice(ty.errors());
            }

            let mut roles = HashSet::new();
            for end in a.ends.iter().filter(|e| e.bad.is_none()) {
                if !roles.insert(end.role.as_str()) {
                    errors.push(EdmError::new(
                        EdmErrorCode::DuplicateEndName,
                        end.span,
                        format!(
                            "association '{}' declares role '{}' twice",
                            a.common.name, end.role
                        ),
                    ));
                }
            }

            if let Some(outcome) = self.constraint_outcome(id) {
                // An unresolved end invalidates the constraint with the error
                // already reported for the end.
                for e in outcome.errors.iter().chain(&outcome.compatibility_errors) {
                    if !errors.contains(e) {
                        errors.push(e.clone());
                    }
                }
            }
            errors.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_ast::{AssociationDecl, Document, EntityTypeDecl, Multiplicity, SchemaDecl};

    #[test]
    fn missing_ends_are_normalized_to_bad_ends() {
        let doc = Document::new().with_schema(
            SchemaDecl::new("Ns")
                .with_item(EntityTypeDecl::new("A"))
                .with_item(AssociationDecl::new("Lonely").with_end("Only", "A", Multiplicity::One)),
        );
        let m = Model::new(doc);
        let id = m.find_association("Ns.Lonely").unwrap();
        assert_eq!(m.find_end(id, "Only"), Some(0));
        assert!(m.end_type(id, 1).is_bad_element());
        let errors = m.association_errors(id);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, EdmErrorCode::InvalidAssociationEndCount);
    }

    #[test]
    fn duplicate_roles_and_unknown_types_are_reported() {
        let doc = Document::new().with_schema(
            SchemaDecl::new("Ns").with_item(
                AssociationDecl::new("Twice")
                    .with_end("R", "Missing", Multiplicity::One)
                    .with_end("R", "Missing", Multiplicity::Many),
            ),
        );
        let m = Model::new(doc);
        let id = m.find_association("Ns.Twice").unwrap();
        let codes: Vec<_> = m.association_errors(id).iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            [
                EdmErrorCode::UnresolvedType,
                EdmErrorCode::UnresolvedType,
                EdmErrorCode::DuplicateEndName
            ]
        );
    }
}
