#![forbid(unsafe_code)]

//! Entity containers and the sets and function imports they declare.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{
    AssociationId, AssociationSetId, ContainerElement, ContainerId, ElementRef, EntitySetId,
    FunctionImportId, TypeId,
};
use crate::model::Model;
use crate::placeholder::{Checkable, ElementKind, Placeholder, PlaceholderKind, Resolved};
use crate::types::{TypeDefinition, TypeRef};

impl Model {
    /// Container named by `Extends`, with the same loop handling as base
    /// types.
    pub fn container_extends(&self, id: ContainerId) -> Option<Resolved<ContainerId>> {
        let c = self.container(id);
        c.extends.get_or_cycle(
            || self.compute_extends(id),
            || {
                debug!(container = %self.full_name(ElementRef::Container(id)), "extends cycle");
                Some(Resolved::Placeholder(Placeholder::cyclic(
                    ElementKind::EntityContainer,
                    self.full_name(ElementRef::Container(id)),
                    c.extends_name.as_ref().map_or(c.common.span, |n| n.span),
                    ElementRef::Container(id),
                )))
            },
        )
    }

    fn compute_extends(&self, id: ContainerId) -> Option<Resolved<ContainerId>> {
        let c = self.container(id);
        let name = c.extends_name.as_ref()?;
        let Some(base) = self.resolve_container_name(c.schema, &name.node) else {
            return Some(Resolved::Placeholder(Placeholder::unresolved(
                ElementKind::EntityContainer,
                &name.node,
                name.span,
            )));
        };
        if let Some(Resolved::Placeholder(p)) = self.container_extends(base) {
            if let (PlaceholderKind::Cyclic, Some(ElementRef::Container(origin))) =
                (p.kind(), p.cycle_origin())
            {
                if self.container(origin).extends.is_in_progress() {
                    return Some(Resolved::Placeholder(Placeholder::cyclic(
                        ElementKind::EntityContainer,
                        self.full_name(ElementRef::Container(id)),
                        name.span,
                        ElementRef::Container(origin),
                    )));
                }
            }
        }
        Some(Resolved::Element(base))
    }

    /// The container followed by the containers it extends.
    pub fn container_chain(&self, id: ContainerId) -> impl Iterator<Item = ContainerId> + '_ {
        std::iter::successors(Some(id), |c| {
            self.container_extends(*c).and_then(|r| r.element())
        })
    }

    /// Entity set declared by the container or one it extends.
    pub fn find_entity_set(&self, id: ContainerId, name: &str) -> Option<EntitySetId> {
        self.container_chain(id).find_map(|c| {
            self.container(c)
                .entity_sets
                .iter()
                .copied()
                .find(|s| self.entity_set(*s).common.name == name)
        })
    }

    /// Entity type of the set's elements.
    pub fn entity_set_type(&self, id: EntitySetId) -> Resolved<TypeId> {
        let set = self.entity_set(id);
        set.element_type.get(|| {
            let name = &set.entity_type_name;
            match self.resolve_type_name(set.schema, &name.node) {
                Some(t) if self.schema_type(t).is_entity() => Resolved::Element(t),
                Some(_) => Resolved::Placeholder(Placeholder::bad(
                    ElementKind::EntityType,
                    name.node.clone(),
                    vec![EdmError::new(
                        EdmErrorCode::EntitySetTypeNotEntity,
                        name.span,
                        format!(
                            "entity set '{}' must contain an entity type, '{}' is not one",
                            set.common.name, name.node
                        ),
                    )],
                    name.span,
                )),
                None => Resolved::Placeholder(Placeholder::unresolved(
                    ElementKind::EntityType,
                    &name.node,
                    name.span,
                )),
            }
        })
    }

    pub fn association_set_association(&self, id: AssociationSetId) -> Resolved<AssociationId> {
        let set = self.association_set(id);
        set.association.get(|| {
            let name = &set.association_name;
            match self.resolve_association_name(set.schema, &name.node) {
                Some(a) => Resolved::Element(a),
                None => Resolved::Placeholder(Placeholder::unresolved(
                    ElementKind::Association,
                    &name.node,
                    name.span,
                )),
            }
        })
    }

    /// Entity set bound to `role` by the association set.
    pub fn association_set_end(&self, id: AssociationSetId, role: &str) -> Option<EntitySetId> {
        let set = self.association_set(id);
        let end = set.ends.iter().find(|e| e.role.node == role)?;
        let container = self.container_of(ContainerElement::AssociationSet(id));
        self.find_entity_set(container, &end.entity_set.node)
    }

    pub fn association_set_errors(&self, id: AssociationSetId) -> Rc<[EdmError]> {
        let set = self.association_set(id);
        set.errors.get(|| {
            let association = self.association_set_association(id);
            let mut errors = association.errors().to_vec();
            let Resolved::Element(association) = association else {
                return errors.into();
            };
            if set.ends.len() > 2 {
                errors.push(EdmError::new(
                    EdmErrorCode::AssociationSetEndMismatch,
                    set.common.span,
                    format!("association set '{}' binds more than two ends", set.common.name),
                ));
            }
            let container = self.container_of(ContainerElement::AssociationSet(id));
            let mut roles = HashSet::new();
            for end in &set.ends {
                if !roles.insert(end.role.node.as_str()) {
                    errors.push(EdmError::new(
                        EdmErrorCode::AssociationSetEndMismatch,
                        end.span,
                        format!("role '{}' is bound twice", end.role.node),
                    ));
                    continue;
                }
                let Some(index) = self.find_end(association, &end.role.node) else {
                    errors.push(EdmError::new(
                        EdmErrorCode::AssociationSetEndMismatch,
                        end.role.span,
                        format!(
                            "role '{}' is not an end of association '{}'",
                            end.role.node,
                            self.full_name(ElementRef::Association(association))
                        ),
                    ));
                    continue;
                };
                let Some(entity_set) = self.find_entity_set(container, &end.entity_set.node) else {
                    errors.extend_from_slice(
                        Placeholder::unresolved(
                            ElementKind::EntitySet,
                            &end.entity_set.node,
                            end.entity_set.span,
                        )
                        .errors(),
                    );
                    continue;
                };
                if let (Resolved::Element(end_type), Resolved::Element(set_type)) =
                    (self.end_type(association, index), self.entity_set_type(entity_set))
                {
                    if !self.is_structured_assignable_from(end_type, set_type) {
                        errors.push(EdmError::new(
                            EdmErrorCode::AssociationSetEndMismatch,
                            end.span,
                            format!(
                                "entity set '{}' holds '{}', which cannot play role '{}' of type '{}'",
                                end.entity_set.node,
                                self.full_name(ElementRef::Type(set_type)),
                                end.role.node,
                                self.full_name(ElementRef::Type(end_type))
                            ),
                        ));
                    }
                }
            }
            errors.into()
        })
    }

    pub fn function_import_return_type(&self, id: FunctionImportId) -> Option<TypeRef> {
        let f = self.function_import(id);
        f.return_type.get(|| {
            f.return_type_expr
                .as_ref()
                .map(|t| self.resolve_type_expr(f.schema, t))
        })
    }

    /// Entity set the import returns entities from, when declared.
    pub fn function_import_entity_set(
        &self,
        id: FunctionImportId,
    ) -> Option<Resolved<EntitySetId>> {
        let f = self.function_import(id);
        f.entity_set.get(|| {
            let name = f.entity_set_name.as_ref()?;
            let container = self.container_of(ContainerElement::FunctionImport(id));
            Some(match self.find_entity_set(container, &name.node) {
                Some(set) => Resolved::Element(set),
                None => Resolved::Placeholder(Placeholder::unresolved(
                    ElementKind::EntitySet,
                    &name.node,
                    name.span,
                )),
            })
        })
    }

    pub fn function_import_errors(&self, id: FunctionImportId) -> Vec<EdmError> {
        let f = self.function_import(id);
        let mut errors = Vec::new();
        for p in &f.parameters {
            errors.extend(self.resolve_type_expr(f.schema, &p.type_expr).errors());
        }
        let return_type = self.function_import_return_type(id);
        if let Some(ty) = &return_type {
            errors.extend(ty.errors());
        }
        let returned_entity = return_type.as_ref().and_then(|t| {
            let element = t.collection_element().unwrap_or(t);
            match &element.definition {
                TypeDefinition::Entity(r) => Some(r.clone()),
                _ => None,
            }
        });

        match (self.function_import_entity_set(id), returned_entity) {
            (None, None) => {}
            (None, Some(_)) => errors.push(EdmError::new(
                EdmErrorCode::FunctionImportEntitySetMismatch,
                f.common.span,
                format!(
                    "function import '{}' returns entities but names no entity set",
                    f.common.name
                ),
            )),
            (Some(set), None) => {
                errors.extend_from_slice(set.errors());
                errors.push(EdmError::new(
                    EdmErrorCode::FunctionImportEntitySetMismatch,
                    f.common.span,
                    format!(
                        "function import '{}' names an entity set but does not return entities",
                        f.common.name
                    ),
                ));
            }
            (Some(Resolved::Placeholder(p)), Some(_)) => errors.extend_from_slice(p.errors()),
            (Some(Resolved::Element(set)), Some(returned)) => {
                if let (Resolved::Element(set_type), Resolved::Element(returned)) =
                    (self.entity_set_type(set), returned)
                {
                    if !self.is_structured_assignable_from(set_type, returned) {
                        errors.push(EdmError::new(
                            EdmErrorCode::FunctionImportEntitySetMismatch,
                            f.common.span,
                            format!(
                                "function import '{}' returns '{}', which entity set '{}' cannot hold",
                                f.common.name,
                                self.full_name(ElementRef::Type(returned)),
                                self.entity_set(set).common.name
                            ),
                        ));
                    }
                }
            }
        }
        errors
    }

    pub fn container_errors(&self, id: ContainerId) -> Rc<[EdmError]> {
        let c = self.container(id);
        c.errors.get(|| {
            let mut errors = Vec::new();
            if let Some(extends) = self.container_extends(id) {
                errors.extend_from_slice(extends.errors());
            }
            let members = c
                .entity_sets
                .iter()
                .map(|s| &self.entity_set(*s).common)
                .chain(c.association_sets.iter().map(|s| &self.association_set(*s).common))
                .chain(c.function_imports.iter().map(|f| &self.function_import(*f).common));
            let mut seen = HashSet::new();
            for member in members {
                if !seen.insert(member.name.as_str()) {
                    errors.push(EdmError::new(
                        EdmErrorCode::DuplicateElement,
                        member.span,
                        format!(
                            "'{}' is already defined in entity container '{}'",
                            member.name, c.common.name
                        ),
                    ));
                }
            }
            errors.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_ast::{
        AssociationDecl, ComplexTypeDecl, Document, EntityContainerDecl, EntityTypeDecl,
        FunctionImportDecl, Multiplicity, PropertyDecl, SchemaDecl, TypeExpr,
    };

    fn schema() -> SchemaDecl {
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
            .with_item(ComplexTypeDecl::new("Address"))
            .with_item(
                AssociationDecl::new("Manages")
                    .with_end("Boss", "Employee", Multiplicity::ZeroOrOne)
                    .with_end("Report", "Person", Multiplicity::Many),
            )
    }

    #[test]
    fn container_elements_have_qualified_full_names() {
        let m = Model::new(Document::new().with_schema(
            schema().with_item(EntityContainerDecl::new("Db").with_entity_set("People", "Person")),
        ));
        let set = m.entity_set_ids().next().unwrap();
        assert_eq!(m.full_name(ElementRef::EntitySet(set)), "Ns.Db/People");
        assert_eq!(m.entity_set_type(set), Resolved::Element(m.find_type("Ns.Person").unwrap()));
    }

    #[test]
    fn default_container_falls_back_to_the_first() {
        let m = Model::new(Document::new().with_schema(
            schema()
                .with_item(EntityContainerDecl::new("First"))
                .with_item(EntityContainerDecl::new("Main").as_default()),
        ));
        assert_eq!(m.default_container(), m.find_entity_container("Ns.Main"));

        let m = Model::new(Document::new().with_schema(
            schema()
                .with_item(EntityContainerDecl::new("First"))
                .with_item(EntityContainerDecl::new("Second")),
        ));
        assert_eq!(m.default_container(), m.find_entity_container("Ns.First"));

        let m = Model::new(Document::new().with_schema(schema()));
        assert_eq!(m.default_container(), None);
    }

    #[test]
    fn extends_cycle_and_inherited_sets() {
        let m = Model::new(Document::new().with_schema(
            schema()
                .with_item(EntityContainerDecl::new("A").extending("B"))
                .with_item(EntityContainerDecl::new("B").extending("A"))
                .with_item(EntityContainerDecl::new("Base").with_entity_set("People", "Person"))
                .with_item(EntityContainerDecl::new("Derived").extending("Base")),
        ));
        let a = m.find_entity_container("Ns.A").unwrap();
        let b = m.find_entity_container("Ns.B").unwrap();
        assert!(m.container_extends(a).unwrap().is_cyclic());
        assert!(m.container_extends(b).unwrap().is_cyclic());
        assert_eq!(
            m.container_errors(a)[0].code,
            EdmErrorCode::CyclicEntityContainer
        );
        let derived = m.find_entity_container("Ns.Derived").unwrap();
        assert!(m.find_entity_set(derived, "People").is_some());
        assert!(m.container_errors(derived).is_empty());
    }

    #[test]
    fn set_types_and_association_set_ends_are_checked() {
        let m = Model::new(Document::new().with_schema(
            schema().with_item(
                EntityContainerDecl::new("Db")
                    .with_entity_set("People", "Person")
                    .with_entity_set("Staff", "Employee")
                    .with_entity_set("Places", "Address")
                    .with_association_set(
                        "Good",
                        "Manages",
                        &[("Boss", "Staff"), ("Report", "People")],
                    )
                    .with_association_set(
                        "Bad",
                        "Manages",
                        &[("Boss", "People"), ("Nobody", "Staff")],
                    ),
            ),
        ));
        let places = m
            .entity_set_ids()
            .find(|s| m.entity_set(*s).common.name == "Places")
            .unwrap();
        assert_eq!(
            m.entity_set_type(places).errors()[0].code,
            EdmErrorCode::EntitySetTypeNotEntity
        );
        let mut sets = m.association_set_ids();
        let (good, bad) = (sets.next().unwrap(), sets.next().unwrap());
        assert!(m.association_set_errors(good).is_empty());
        let staff = m.association_set_end(good, "Boss").unwrap();
        assert_eq!(m.entity_set(staff).common.name, "Staff");
        let codes: Vec<_> = m.association_set_errors(bad).iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            [
                EdmErrorCode::AssociationSetEndMismatch,
                EdmErrorCode::AssociationSetEndMismatch
            ]
        );
    }

    #[test]
    fn function_import_entity_set_must_fit_the_return_type() {
        let m = Model::new(Document::new().with_schema(
            schema().with_item(
                EntityContainerDecl::new("Db")
                    .with_entity_set("People", "Person")
                    .with_entity_set("Staff", "Employee")
                    .with_function_import(
                        FunctionImportDecl::new("Managers")
                            .returning(TypeExpr::collection(TypeExpr::named("Employee")))
                            .with_entity_set("People"),
                    )
                    .with_function_import(
                        FunctionImportDecl::new("Everyone")
                            .returning(TypeExpr::collection(TypeExpr::named("Person")))
                            .with_entity_set("Staff"),
                    )
                    .with_function_import(
                        FunctionImportDecl::new("Loose").returning(TypeExpr::named("Person")),
                    ),
            ),
        ));
        let imports: Vec<_> = m.function_import_ids().collect();
        assert!(m.function_import_errors(imports[0]).is_empty());
        assert_eq!(
            m.function_import_errors(imports[1])[0].code,
            EdmErrorCode::FunctionImportEntitySetMismatch
        );
        assert_eq!(
            m.function_import_errors(imports[2])[0].code,
            EdmErrorCode::FunctionImportEntitySetMismatch
        );
        assert_eq!(
            m.full_name(ElementRef::FunctionImport(imports[0])),
            "Ns.Db/Managers"
        );
    }
}
