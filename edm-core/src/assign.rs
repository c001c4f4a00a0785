#![forbid(unsafe_code)]

//! Equivalence, assignability and common base types.
//!
//! Assignability looks at definitions only; nullability never makes one
//! type unassignable to another. Structured types are assignable only along
//! the base-type chain, while collections compare their element types
//! covariantly.

use std::rc::Rc;

use crate::ids::TypeId;
use crate::model::Model;
use crate::placeholder::Resolved;
use crate::types::{PrimitiveFacets, PrimitiveKind, TypeDefinition, TypeRef};

fn same_resolved(a: &Resolved<TypeId>, b: &Resolved<TypeId>) -> bool {
    match (a, b) {
        (Resolved::Element(x), Resolved::Element(y)) => x == y,
        (Resolved::Placeholder(x), Resolved::Placeholder(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// Same kind, same referenced element, same facets. Placeholders are only
/// equivalent to themselves.
pub fn definitions_equivalent(a: &TypeDefinition, b: &TypeDefinition) -> bool {
    match (a, b) {
        (
            TypeDefinition::Primitive { kind: ka, facets: fa },
            TypeDefinition::Primitive { kind: kb, facets: fb },
        ) => ka == kb && fa == fb,
        (TypeDefinition::Entity(x), TypeDefinition::Entity(y))
        | (TypeDefinition::Complex(x), TypeDefinition::Complex(y))
        | (TypeDefinition::Enum(x), TypeDefinition::Enum(y))
        | (TypeDefinition::EntityReference(x), TypeDefinition::EntityReference(y)) => {
            same_resolved(x, y)
        }
        (
            TypeDefinition::Collection { element: x, .. },
            TypeDefinition::Collection { element: y, .. },
        ) => is_equivalent_to(x, y),
        (TypeDefinition::Row(x), TypeDefinition::Row(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y)
                    .all(|(cx, cy)| cx.name == cy.name && is_equivalent_to(&cx.ty, &cy.ty))
        }
        (TypeDefinition::None(x), TypeDefinition::None(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

pub fn is_equivalent_to(a: &TypeRef, b: &TypeRef) -> bool {
    a.nullable == b.nullable && definitions_equivalent(&a.definition, &b.definition)
}

impl Model {
    /// True if `sub` is `base` or derives from it.
    pub fn is_structured_assignable_from(&self, base: TypeId, sub: TypeId) -> bool {
        self.self_and_ancestors(sub).any(|t| t == base)
    }

    fn resolved_assignable_from(&self, base: &Resolved<TypeId>, sub: &Resolved<TypeId>) -> bool {
        match (base, sub) {
            (Resolved::Element(b), Resolved::Element(s)) => {
                self.is_structured_assignable_from(*b, *s)
            }
            _ => same_resolved(base, sub),
        }
    }

    /// Whether a value of `sub` may be used where `base` is expected.
    pub fn is_assignable_from(&self, base: &TypeRef, sub: &TypeRef) -> bool {
        self.definition_assignable_from(&base.definition, &sub.definition)
    }

    pub fn definition_assignable_from(&self, base: &TypeDefinition, sub: &TypeDefinition) -> bool {
        match (base, sub) {
            (
                TypeDefinition::Primitive { kind: b, .. },
                TypeDefinition::Primitive { kind: s, .. },
            ) => b.is_assignable_from(*s),
            (TypeDefinition::Entity(b), TypeDefinition::Entity(s))
            | (TypeDefinition::Complex(b), TypeDefinition::Complex(s))
            | (TypeDefinition::EntityReference(b), TypeDefinition::EntityReference(s)) => {
                self.resolved_assignable_from(b, s)
            }
            (
                TypeDefinition::Collection { element: b, .. },
                TypeDefinition::Collection { element: s, .. },
            ) => self.definition_assignable_from(&b.definition, &s.definition),
            _ => definitions_equivalent(base, sub),
        }
    }

    /// Nearest structured type both `a` and `b` derive from.
    pub fn common_structured_base(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        self.self_and_ancestors(a)
            .find(|candidate| self.is_structured_assignable_from(*candidate, b))
            .or_else(|| {
                self.self_and_ancestors(b)
                    .find(|candidate| self.is_structured_assignable_from(*candidate, a))
            })
    }

    /// Most specific type both `a` and `b` are assignable to, if any. The
    /// result is nullable when either input is; facets reset to defaults
    /// unless the inputs are equivalent.
    pub fn common_base_type(&self, a: &TypeRef, b: &TypeRef) -> Option<TypeRef> {
        if is_equivalent_to(a, b) {
            return Some(a.clone());
        }
        let nullable = a.nullable || b.nullable;
        let definition = match (&a.definition, &b.definition) {
            (
                TypeDefinition::Primitive { kind: ka, .. },
                TypeDefinition::Primitive { kind: kb, .. },
            ) => {
                let kind = common_primitive(*ka, *kb)?;
                TypeDefinition::Primitive {
                    kind,
                    facets: PrimitiveFacets::default_for(kind),
                }
            }
            (
                TypeDefinition::Entity(Resolved::Element(x)),
                TypeDefinition::Entity(Resolved::Element(y)),
            ) => TypeDefinition::Entity(Resolved::Element(self.common_structured_base(*x, *y)?)),
            (
                TypeDefinition::Complex(Resolved::Element(x)),
                TypeDefinition::Complex(Resolved::Element(y)),
            ) => TypeDefinition::Complex(Resolved::Element(self.common_structured_base(*x, *y)?)),
            (
                TypeDefinition::Collection { element: x, .. },
                TypeDefinition::Collection { element: y, .. },
            ) => return self.common_base_type(x, y).map(|e| TypeRef::collection(e, nullable)),
            (x, y) if definitions_equivalent(x, y) => x.clone(),
            _ => return None,
        };
        Some(TypeRef {
            definition,
            nullable,
        })
    }
}

/// Walks the spatial lattice upward from `a`, then from `b`.
fn common_primitive(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    let chain = |start: PrimitiveKind| std::iter::successors(Some(start), |k| k.spatial_parent());
    chain(a)
        .find(|k| k.is_assignable_from(b))
        .or_else(|| chain(b).find(|k| k.is_assignable_from(a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{ElementKind, Placeholder};
    use edm_ast::{Document, EntityTypeDecl, PropertyDecl, SchemaDecl, TypeExpr, no_span};

    fn people() -> (Model, TypeId, TypeId, TypeId) {
        let doc = Document::new().with_schema(
            SchemaDecl::new("Ns")
                .with_item(
                    EntityTypeDecl::new("Person")
                        .with_key(&["Id"])
                        .with_property(PropertyDecl::new(
                            "Id",
                            TypeExpr::named("Edm.Int32").not_null(),
                        )),
                )
                .with_item(EntityTypeDecl::new("Employee").with_base("Person"))
                .with_item(EntityTypeDecl::new("Customer").with_base("Person")),
        );
        let m = Model::new(doc);
        let t = |n: &str| m.find_type(&format!("Ns.{n}")).unwrap();
        let (p, e, c) = (t("Person"), t("Employee"), t("Customer"));
        (m, p, e, c)
    }

    #[test]
    fn structured_assignability_walks_the_chain() {
        let (m, person, employee, customer) = people();
        let (p, e) = (TypeRef::entity(person, true), TypeRef::entity(employee, true));
        assert!(m.is_assignable_from(&p, &e));
        assert!(!m.is_assignable_from(&e, &p));
        assert!(m.is_assignable_from(&p, &p));
        assert_eq!(m.common_structured_base(employee, customer), Some(person));
    }

    #[test]
    fn kinds_never_mix() {
        let (m, person, _, _) = people();
        let entity = TypeRef::entity(person, true);
        let complex = TypeRef::complex(person, true);
        assert!(!m.is_assignable_from(&entity, &complex));
        assert!(!m.is_assignable_from(&TypeRef::primitive(PrimitiveKind::Int32, true), &entity));
    }

    #[test]
    fn collections_are_covariant() {
        let (m, person, employee, _) = people();
        let people = TypeRef::collection(TypeRef::entity(person, false), true);
        let staff = TypeRef::collection(TypeRef::entity(employee, false), true);
        assert!(m.is_assignable_from(&people, &staff));
        assert!(!m.is_assignable_from(&staff, &people));
    }

    #[test]
    fn common_base_merges_nullability() {
        let (m, person, employee, _) = people();
        let a = TypeRef::entity(person, false);
        let b = TypeRef::entity(employee, true);
        let common = m.common_base_type(&a, &b).unwrap();
        assert_eq!(common, TypeRef::entity(person, true));
        assert_eq!(m.common_base_type(&b, &a), Some(common));
    }

    #[test]
    fn spatial_common_base_is_the_lattice_join() {
        let m = Model::new(Document::new());
        let point = TypeRef::primitive(PrimitiveKind::GeographyPoint, false);
        let line = TypeRef::primitive(PrimitiveKind::GeographyLineString, false);
        let multi = TypeRef::primitive(PrimitiveKind::GeographyMultiPoint, false);
        let coll = TypeRef::primitive(PrimitiveKind::GeographyCollection, false);
        assert_eq!(
            m.common_base_type(&point, &line).and_then(|t| t.primitive_kind()),
            Some(PrimitiveKind::Geography)
        );
        assert_eq!(
            m.common_base_type(&multi, &coll).and_then(|t| t.primitive_kind()),
            Some(PrimitiveKind::GeographyCollection)
        );
        let geometry = TypeRef::primitive(PrimitiveKind::GeometryPoint, false);
        assert_eq!(m.common_base_type(&point, &geometry), None);
    }

    #[test]
    fn placeholders_are_only_equivalent_to_themselves() {
        let p = Placeholder::unresolved(ElementKind::Type, "X", no_span());
        let q = Placeholder::unresolved(ElementKind::Type, "X", no_span());
        let a = TypeRef { definition: TypeDefinition::None(Rc::clone(&p)), nullable: true };
        let b = TypeRef { definition: TypeDefinition::None(p), nullable: true };
        let c = TypeRef { definition: TypeDefinition::None(q), nullable: true };
        assert!(is_equivalent_to(&a, &b));
        assert!(!is_equivalent_to(&a, &c));
    }
}
