#![forbid(unsafe_code)]

//! Structured types, enum types and their properties.

use std::collections::HashSet;
use std::rc::Rc;

use edm_ast::Multiplicity;
use tracing::debug;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{AssociationId, ElementRef, PropertyId, TypeId};
use crate::model::{Model, PropertyKind, StructuredKind, StructuredType};
use crate::placeholder::{Checkable, ElementKind, Placeholder, PlaceholderKind, Resolved};
use crate::resolve::facet_errors;
use crate::types::{PrimitiveKind, TypeDefinition, TypeKind, TypeRef};

fn element_kind(kind: StructuredKind) -> ElementKind {
    match kind {
        StructuredKind::Entity => ElementKind::EntityType,
        StructuredKind::Complex => ElementKind::ComplexType,
    }
}

/// Base-type chain of a structured type, nearest ancestor first.
pub struct Ancestors<'m> {
    model: &'m Model,
    next: Option<TypeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        let current = self.next?;
        self.next = self.model.base_type(current).and_then(|b| b.element());
        Some(current)
    }
}

impl Model {
    /// # Panics
    ///
    /// Panics if `id` is an enum type.
    pub fn structured_type(&self, id: TypeId) -> &StructuredType {
        self.schema_type(id).structured()
    }

    /// Resolved base type, `None` when none is declared.
    ///
    /// Resolving forces the whole chain above the type, so a chain that loops
    /// back is reported as `Cyclic` on every type that lies on the loop.
    pub fn base_type(&self, id: TypeId) -> Option<Resolved<TypeId>> {
        let ty = self.structured_type(id);
        ty.base.get_or_cycle(
            || self.compute_base_type(id),
            || {
                debug!(ty = %self.full_name(ElementRef::Type(id)), "base type cycle");
                Some(Resolved::Placeholder(Placeholder::cyclic(
                    element_kind(ty.kind),
                    self.full_name(ElementRef::Type(id)),
                    self.base_span(id),
                    ElementRef::Type(id),
                )))
            },
        )
    }

    fn base_span(&self, id: TypeId) -> edm_ast::Span {
        let t = self.schema_type(id);
        t.structured()
            .base_type_name
            .as_ref()
            .map_or(t.common.span, |n| n.span)
    }

    fn compute_base_type(&self, id: TypeId) -> Option<Resolved<TypeId>> {
        let t = self.schema_type(id);
        let s = t.structured();
        let name = s.base_type_name.as_ref()?;
        let base = match self.resolve_structured(t.schema, name, s.kind) {
            Resolved::Element(base) => base,
            unresolved => return Some(unresolved),
        };

        // A cyclic result whose origin is still being computed means this
        // type sits on the loop too.
        if let Some(Resolved::Placeholder(p)) = self.base_type(base) {
            if p.kind() == PlaceholderKind::Cyclic {
                if let Some(ElementRef::Type(origin)) = p.cycle_origin() {
                    if self.structured_type(origin).base.is_in_progress() {
                        return Some(Resolved::Placeholder(Placeholder::cyclic(
                            element_kind(s.kind),
                            self.full_name(ElementRef::Type(id)),
                            name.span,
                            ElementRef::Type(origin),
                        )));
                    }
                }
            }
        }
        Some(Resolved::Element(base))
    }

    /// Resolved ancestors, nearest first. Stops at the first base type that
    /// failed to resolve.
    pub fn ancestors(&self, id: TypeId) -> Ancestors<'_> {
        Ancestors {
            model: self,
            next: self.base_type(id).and_then(|b| b.element()),
        }
    }

    /// The type followed by its ancestors.
    pub fn self_and_ancestors(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    pub fn declared_properties(&self, id: TypeId) -> &[PropertyId] {
        &self.structured_type(id).declared_properties
    }

    /// Declared and inherited properties, root type first.
    pub fn properties(&self, id: TypeId) -> Vec<PropertyId> {
        let chain: Vec<TypeId> = self.self_and_ancestors(id).collect();
        chain
            .into_iter()
            .rev()
            .flat_map(|t| self.declared_properties(t).iter().copied())
            .collect()
    }

    /// Looks a property up by name on the type, then on its ancestors.
    pub fn find_property(&self, id: TypeId, name: &str) -> Option<PropertyId> {
        self.self_and_ancestors(id).find_map(|t| {
            self.declared_properties(t)
                .iter()
                .copied()
                .find(|p| self.property(*p).common.name == name)
        })
    }

    /// Effective key of an entity type: the declared key, or the key
    /// inherited from the base type.
    pub fn key(&self, id: TypeId) -> Rc<[Resolved<PropertyId>]> {
        let s = self.structured_type(id);
        s.key.get(|| {
            if s.declared_key.is_empty() {
                return match self.base_type(id) {
                    Some(Resolved::Element(base)) => self.key(base),
                    _ => Rc::from([]),
                };
            }
            s.declared_key
                .iter()
                .map(|k| match self.find_property(id, &k.node) {
                    Some(p) => Resolved::Element(p),
                    None => Resolved::Placeholder(Placeholder::bad(
                        ElementKind::Property,
                        k.node.clone(),
                        vec![EdmError::new(
                            EdmErrorCode::KeyPropertyNotFound,
                            k.span,
                            format!(
                                "key property '{}' is not declared on '{}'",
                                k.node,
                                self.full_name(ElementRef::Type(id))
                            ),
                        )],
                        k.span,
                    )),
                })
                .collect()
        })
    }

    pub fn property_name(&self, property: &Resolved<PropertyId>) -> String {
        match property {
            Resolved::Element(id) => self.property(*id).common.name.clone(),
            Resolved::Placeholder(p) => p.name().to_owned(),
        }
    }

    /// Diagnostics of a structured or enum type itself; property diagnostics
    /// are reported on the properties.
    pub fn type_errors(&self, id: TypeId) -> Rc<[EdmError]> {
        let t = self.schema_type(id);
        match t.as_structured() {
            Some(s) => s.errors.get(|| self.compute_structured_errors(id).into()),
            None => t
                .enum_type()
                .errors
                .get(|| self.compute_enum_errors(id).into()),
        }
    }

    fn compute_structured_errors(&self, id: TypeId) -> Vec<EdmError> {
        let t = self.schema_type(id);
        let s = t.structured();
        let mut errors = Vec::new();

        let base = self.base_type(id);
        if let Some(b) = &base {
            errors.extend_from_slice(b.errors());
        }

        // Property names must be unique across the whole chain.
        let mut seen: HashSet<&str> = self
            .ancestors(id)
            .flat_map(|a| self.declared_properties(a).iter())
            .map(|p| self.property(*p).common.name.as_str())
            .collect();
        for p in &s.declared_properties {
            let prop = self.property(*p);
            if !seen.insert(prop.common.name.as_str()) {
                errors.push(EdmError::new(
                    EdmErrorCode::DuplicateProperty,
                    prop.common.span,
                    format!(
                        "property '{}' is already defined on '{}' or one of its base types",
                        prop.common.name,
                        self.full_name(ElementRef::Type(id))
                    ),
                ));
            }
        }

        if s.kind == StructuredKind::Entity {
            self.collect_key_errors(id, s, base.as_ref(), &mut errors);
        }
        errors
    }

    fn collect_key_errors(
        &self,
        id: TypeId,
        s: &StructuredType,
        base: Option<&Resolved<TypeId>>,
        errors: &mut Vec<EdmError>,
    ) {
        let full_name = self.full_name(ElementRef::Type(id));
        let key = self.key(id);

        if let (false, Some(Resolved::Element(b))) = (s.declared_key.is_empty(), base) {
            if !self.key(*b).is_empty() {
                errors.push(EdmError::new(
                    EdmErrorCode::KeyRedefinedInDerivedType,
                    s.declared_key[0].span,
                    format!(
                        "'{full_name}' derives from a type with a key and cannot declare its own"
                    ),
                ));
            }
        }

        if s.declared_key.is_empty() {
            let base_failed = matches!(base, Some(Resolved::Placeholder(_)));
            if key.is_empty()
                && !s.is_abstract
                && !base_failed
                && self.config().validation.require_entity_keys
            {
                errors.push(EdmError::new(
                    EdmErrorCode::KeyMissing,
                    self.schema_type(id).common.span,
                    format!("entity type '{full_name}' has no key"),
                ));
            }
            return;
        }

        for k in key.iter() {
            let pid = match k {
                Resolved::Element(pid) => *pid,
                Resolved::Placeholder(p) => {
                    errors.extend_from_slice(p.errors());
                    continue;
                }
            };
            let prop = self.property(pid);
            if prop.is_navigation() {
                errors.push(EdmError::new(
                    EdmErrorCode::KeyPropertyMustBePrimitive,
                    prop.common.span,
                    format!("navigation property '{}' cannot be part of a key", prop.common.name),
                ));
                continue;
            }
            let ty = self.property_type(pid);
            match ty.kind() {
                TypeKind::Primitive | TypeKind::None => {}
                _ => errors.push(EdmError::new(
                    EdmErrorCode::KeyPropertyMustBePrimitive,
                    prop.common.span,
                    format!("key property '{}' must have a primitive type", prop.common.name),
                )),
            }
            if ty.nullable {
                errors.push(EdmError::new(
                    EdmErrorCode::KeyPropertyMustBeNonNullable,
                    prop.common.span,
                    format!("key property '{}' must not be nullable", prop.common.name),
                ));
            }
        }
    }

    /// Integral type backing an enum; `Edm.Int32` when absent or invalid.
    pub fn enum_underlying_type(&self, id: TypeId) -> PrimitiveKind {
        let t = self.schema_type(id);
        t.enum_type()
            .underlying_type_name
            .as_ref()
            .and_then(|n| self.resolve_primitive_name(t.schema, &n.node))
            .filter(PrimitiveKind::is_integral)
            .unwrap_or(PrimitiveKind::Int32)
    }

    fn compute_enum_errors(&self, id: TypeId) -> Vec<EdmError> {
        let t = self.schema_type(id);
        let e = t.enum_type();
        let mut errors = Vec::new();

        if let Some(name) = &e.underlying_type_name {
            let integral = self
                .resolve_primitive_name(t.schema, &name.node)
                .is_some_and(|k| k.is_integral());
            if !integral {
                errors.push(EdmError::new(
                    EdmErrorCode::EnumUnderlyingTypeNotIntegral,
                    name.span,
                    format!("enum underlying type '{}' is not an integral type", name.node),
                ));
            }
        }

        let underlying = self.enum_underlying_type(id);
        let (min, max) = underlying
            .integral_range()
            .unwrap_or((i64::MIN, i64::MAX));
        let mut seen = HashSet::new();
        for m in &e.members {
            if !seen.insert(m.name.as_str()) {
                errors.push(EdmError::new(
                    EdmErrorCode::DuplicateEnumMember,
                    m.span,
                    format!("enum member '{}' is already defined", m.name),
                ));
            }
            if m.value < min || m.value > max {
                errors.push(EdmError::new(
                    EdmErrorCode::EnumMemberValueOutOfRange,
                    m.span,
                    format!(
                        "value {} of member '{}' is out of range for '{}'",
                        m.value,
                        m.name,
                        underlying.qualified_name()
                    ),
                ));
            }
        }
        errors
    }

    /// Declared type of a structural property, or the target end type of a
    /// navigation property.
    pub fn property_type(&self, id: PropertyId) -> TypeRef {
        let p = self.property(id);
        p.ty.get(|| match &p.kind {
            PropertyKind::Structural(s) => {
                let schema = self.schema_type(p.declaring_type).schema;
                self.resolve_type_expr(schema, &s.type_expr)
            }
            PropertyKind::Navigation(_) => self.navigation_target_type(id),
        })
    }

    /// Association named by a navigation property.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a structural property.
    pub fn navigation_association(&self, id: PropertyId) -> Resolved<AssociationId> {
        let p = self.property(id);
        let nav = p
            .as_navigation()
            .unwrap_or_else(|| panic!("'{}' is not a navigation property", p.common.name));
        nav.association.get(|| {
            let schema = self.schema_type(p.declaring_type).schema;
            match self.resolve_association_name(schema, &nav.relationship.node) {
                Some(a) => Resolved::Element(a),
                None => Resolved::Placeholder(Placeholder::unresolved(
                    ElementKind::Association,
                    &nav.relationship.node,
                    nav.relationship.span,
                )),
            }
        })
    }

    fn navigation_target_type(&self, id: PropertyId) -> TypeRef {
        let p = self.property(id);
        let Some(nav) = p.as_navigation() else {
            unreachable!("navigation_target_type on a structural property")
        };
        let association = match self.navigation_association(id) {
            Resolved::Element(a) => a,
            Resolved::Placeholder(ph) => {
                return TypeRef {
                    definition: TypeDefinition::None(ph),
                    nullable: true,
                };
            }
        };
        let Some(end) = self.find_end(association, &nav.to_role.node) else {
            let error = EdmError::new(
                EdmErrorCode::NavigationRoleMismatch,
                nav.to_role.span,
                format!(
                    "role '{}' is not an end of association '{}'",
                    nav.to_role.node,
                    self.full_name(ElementRef::Association(association))
                ),
            );
            return TypeRef {
                definition: TypeDefinition::None(Placeholder::bad(
                    ElementKind::AssociationEnd,
                    nav.to_role.node.clone(),
                    vec![error],
                    nav.to_role.span,
                )),
                nullable: true,
            };
        };
        let entity = TypeDefinition::Entity(self.end_type(association, end));
        match self.association(association).ends[end].multiplicity {
            Multiplicity::Many => TypeRef::collection(
                TypeRef {
                    definition: entity,
                    nullable: false,
                },
                false,
            ),
            Multiplicity::ZeroOrOne => TypeRef {
                definition: entity,
                nullable: true,
            },
            Multiplicity::One => TypeRef {
                definition: entity,
                nullable: false,
            },
        }
    }

    pub fn property_errors(&self, id: PropertyId) -> Rc<[EdmError]> {
        let p = self.property(id);
        p.errors.get(|| {
            let ty = self.property_type(id);
            let mut errors = ty.errors();
            match &p.kind {
                PropertyKind::Structural(s) => errors.extend(facet_errors(&ty, &s.type_expr)),
                PropertyKind::Navigation(nav) => {
                    if let Resolved::Element(association) = self.navigation_association(id) {
                        self.collect_from_role_errors(id, association, &mut errors);
                    }
                    if nav.from_role.node == nav.to_role.node {
                        errors.push(EdmError::new(
                            EdmErrorCode::NavigationRoleMismatch,
                            nav.to_role.span,
                            format!(
                                "navigation property '{}' uses role '{}' at both ends",
                                p.common.name, nav.to_role.node
                            ),
                        ));
                    }
                }
            }
            errors.into()
        })
    }

    /// The from-role must name an end whose type the declaring type can play.
    fn collect_from_role_errors(
        &self,
        id: PropertyId,
        association: AssociationId,
        errors: &mut Vec<EdmError>,
    ) {
        let p = self.property(id);
        let Some(nav) = p.as_navigation() else {
            return;
        };
        let Some(end) = self.find_end(association, &nav.from_role.node) else {
            errors.push(EdmError::new(
                EdmErrorCode::NavigationRoleMismatch,
                nav.from_role.span,
                format!(
                    "role '{}' is not an end of association '{}'",
                    nav.from_role.node,
                    self.full_name(ElementRef::Association(association))
                ),
            ));
            return;
        };
        if let Resolved::Element(end_type) = self.end_type(association, end) {
            if !self.is_structured_assignable_from(end_type, p.declaring_type) {
                errors.push(EdmError::new(
                    EdmErrorCode::NavigationRoleMismatch,
                    nav.from_role.span,
                    format!(
                        "'{}' cannot play role '{}', whose type is '{}'",
                        self.full_name(ElementRef::Type(p.declaring_type)),
                        nav.from_role.node,
                        self.full_name(ElementRef::Type(end_type))
                    ),
                ));
            }
        }
    }
}
