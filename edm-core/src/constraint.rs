#![forbid(unsafe_code)]

//! Referential constraint validation.
//!
//! The first three checks (distinct roles, dependent role known, principal
//! role known) accumulate; the property checks only run when all of them
//! passed. A valid constraint yields the dependent properties permuted into
//! the order of the principal type's key.

use std::collections::HashSet;
use std::rc::Rc;

use edm_ast::{Ident, Multiplicity};
use tracing::debug;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{AssociationId, ElementRef, PropertyId, TypeId};
use crate::model::{ConstraintOutcome, Model};
use crate::placeholder::{Checkable, ElementKind, Placeholder, Resolved};

impl Model {
    /// Validation result of the association's referential constraint, `None`
    /// when it declares none.
    pub fn constraint_outcome(&self, id: AssociationId) -> Option<Rc<ConstraintOutcome>> {
        let a = self.association(id);
        a.constraint_outcome
            .get(|| a.constraint.as_ref().map(|_| Rc::new(self.validate_constraint(id))))
    }

    /// Dependent-end properties in principal key order. When the constraint
    /// is invalid every entry is a bad placeholder, so the list keeps its
    /// declared length.
    pub fn compute_dependent_properties(
        &self,
        id: AssociationId,
    ) -> Option<Vec<Resolved<PropertyId>>> {
        self.constraint_outcome(id)
            .map(|outcome| outcome.dependent_properties.clone())
    }

    /// Index of the principal end, when the constraint names a known role.
    pub fn principal_end(&self, id: AssociationId) -> Option<usize> {
        let c = self.association(id).constraint.as_ref()?;
        self.find_end(id, &c.principal.role.node)
    }

    fn validate_constraint(&self, id: AssociationId) -> ConstraintOutcome {
        let a = self.association(id);
        let Some(c) = a.constraint.as_ref() else {
            unreachable!("validate_constraint without a constraint")
        };
        let assoc_name = self.full_name(ElementRef::Association(id));
        let mut errors = Vec::new();
        let mut compatibility_errors = Vec::new();

        if c.principal.role.node == c.dependent.role.node {
            errors.push(EdmError::new(
                EdmErrorCode::SameRoleReferredTwice,
                c.span,
                format!(
                    "referential constraint of '{assoc_name}' uses role '{}' as both principal and dependent",
                    c.principal.role.node
                ),
            ));
        }
        let dependent_end = self.constraint_role(id, &c.dependent.role, &mut errors);
        let principal_end = self.constraint_role(id, &c.principal.role, &mut errors);

        // Errors the bad dependents carry when an end type failed to resolve.
        let mut end_errors = Vec::new();
        let mut ends = None;
        if let (true, Some(p_end), Some(d_end)) =
            (errors.is_empty(), principal_end, dependent_end)
        {
            match (self.end_type(id, p_end), self.end_type(id, d_end)) {
                (Resolved::Element(principal), Resolved::Element(dependent)) => {
                    self.check_constraint_properties(
                        id,
                        (principal, p_end),
                        dependent,
                        &mut errors,
                        &mut compatibility_errors,
                    );
                    ends = Some((principal, dependent));
                }
                (principal, dependent) => {
                    end_errors.extend(
                        principal.errors().iter().chain(dependent.errors()).cloned(),
                    );
                    errors.extend(end_errors.iter().cloned());
                }
            }
        }

        if !errors.is_empty() {
            debug!(
                association = %assoc_name,
                errors = errors.len(),
                "invalid referential constraint"
            );
            let dependent_properties = c
                .dependent
                .properties
                .iter()
                .map(|p| {
                    let carried = if end_errors.is_empty() {
                        vec![EdmError::new(
                            EdmErrorCode::TypeMismatchRelationshipConstraint,
                            p.span,
                            format!(
                                "dependent property '{}' of '{assoc_name}' cannot be matched to the principal key",
                                p.node
                            ),
                        )]
                    } else {
                        end_errors.clone()
                    };
                    Resolved::Placeholder(Placeholder::bad(
                        ElementKind::Property,
                        p.node.clone(),
                        carried,
                        p.span,
                    ))
                })
                .collect();
            return ConstraintOutcome {
                errors,
                compatibility_errors,
                dependent_properties,
            };
        }

        let Some((principal, dependent)) = ends else {
            unreachable!("roles and end types checked above")
        };
        ConstraintOutcome {
            errors,
            compatibility_errors,
            dependent_properties: self.order_dependents(id, principal, dependent),
        }
    }

    fn constraint_role(
        &self,
        id: AssociationId,
        role: &Ident,
        errors: &mut Vec<EdmError>,
    ) -> Option<usize> {
        let end = self.find_end(id, &role.node);
        if end.is_none() {
            errors.push(EdmError::new(
                EdmErrorCode::InvalidRoleInConstraint,
                role.span,
                format!(
                    "role '{}' is not an end of association '{}'",
                    role.node,
                    self.full_name(ElementRef::Association(id))
                ),
            ));
        }
        end
    }

    /// Steps that decide validity go to `errors`; key/dependent kind
    /// mismatches and a `*` principal go to `compatibility`.
    fn check_constraint_properties(
        &self,
        id: AssociationId,
        (principal, p_end): (TypeId, usize),
        dependent: TypeId,
        errors: &mut Vec<EdmError>,
        compatibility: &mut Vec<EdmError>,
    ) {
        let a = self.association(id);
        let Some(c) = a.constraint.as_ref() else {
            return;
        };
        let key = self.key(principal);
        let principal_count = c.principal.properties.len();
        let dependent_count = c.dependent.properties.len();
        if key.len() != principal_count || principal_count != dependent_count {
            errors.push(EdmError::new(
                EdmErrorCode::MismatchedConstraintPropertyCount,
                c.span,
                format!(
                    "the principal key of '{}' has {} properties, the constraint lists {} principal and {} dependent properties",
                    self.full_name(ElementRef::Type(principal)),
                    key.len(),
                    principal_count,
                    dependent_count
                ),
            ));
            return;
        }

        let principal_name = self.full_name(ElementRef::Type(principal));
        let mut seen = HashSet::new();
        let mut key_types = Vec::with_capacity(principal_count);
        for p in &c.principal.properties {
            if !seen.insert(p.node.as_str()) {
                key_types.push(None);
                errors.push(EdmError::new(
                    EdmErrorCode::PrincipalPropertyNotInKey,
                    p.span,
                    format!("principal property '{}' is listed more than once", p.node),
                ));
                continue;
            }
            match key.iter().find(|k| self.property_name(k) == p.node) {
                Some(k) => key_types.push(k.element().map(|pid| self.property_type(pid))),
                None => {
                    key_types.push(None);
                    errors.push(EdmError::new(
                        EdmErrorCode::PrincipalPropertyNotInKey,
                        p.span,
                        format!(
                            "principal property '{}' is not part of the key of '{principal_name}'",
                            p.node
                        ),
                    ));
                }
            }
        }

        let mut seen = HashSet::new();
        for (d, key_type) in c.dependent.properties.iter().zip(&key_types) {
            if !seen.insert(d.node.as_str()) {
                errors.push(EdmError::new(
                    EdmErrorCode::TypeMismatchRelationshipConstraint,
                    d.span,
                    format!("dependent property '{}' is listed more than once", d.node),
                ));
                continue;
            }
            let Some(pid) = self.find_property(dependent, &d.node) else {
                errors.push(EdmError::new(
                    EdmErrorCode::DependentPropertyNotFound,
                    d.span,
                    format!(
                        "dependent property '{}' is not declared on '{}'",
                        d.node,
                        self.full_name(ElementRef::Type(dependent))
                    ),
                ));
                continue;
            };
            let (Some(key_kind), Some(dep_kind)) = (
                key_type.as_ref().and_then(|t| t.primitive_kind()),
                self.property_type(pid).primitive_kind(),
            ) else {
                continue;
            };
            if key_kind != dep_kind {
                compatibility.push(EdmError::new(
                    EdmErrorCode::TypeMismatchRelationshipConstraint,
                    d.span,
                    format!(
                        "dependent property '{}' has type '{}' but the principal key property has type '{}'",
                        d.node,
                        dep_kind.qualified_name(),
                        key_kind.qualified_name()
                    ),
                ));
            }
        }

        let principal_multiplicity = a.ends[p_end].multiplicity;
        if principal_multiplicity == Multiplicity::Many {
            compatibility.push(EdmError::new(
                EdmErrorCode::InvalidPrincipalMultiplicity,
                c.principal.span,
                format!(
                    "principal role '{}' must have multiplicity '1' or '0..1', not '{}'",
                    c.principal.role.node,
                    principal_multiplicity.display()
                ),
            ));
        }
    }

    /// Pairs each principal key property with its dependent counterpart and
    /// returns the dependents in key order. Only called on a valid
    /// constraint, where the principal list is a permutation of the key.
    fn order_dependents(
        &self,
        id: AssociationId,
        principal: TypeId,
        dependent: TypeId,
    ) -> Vec<Resolved<PropertyId>> {
        let Some(c) = self.association(id).constraint.as_ref() else {
            return Vec::new();
        };
        self.key(principal)
            .iter()
            .filter_map(|k| {
                let name = self.property_name(k);
                let position = c.principal.properties.iter().position(|p| p.node == name)?;
                Some(self.dependent_property(dependent, &c.dependent.properties[position]))
            })
            .collect()
    }

    fn dependent_property(&self, dependent: TypeId, name: &Ident) -> Resolved<PropertyId> {
        match self.find_property(dependent, &name.node) {
            Some(pid) => Resolved::Element(pid),
            None => Resolved::Placeholder(Placeholder::unresolved(
                ElementKind::Property,
                &name.node,
                name.span,
            )),
        }
    }
}
