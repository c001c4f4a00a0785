#![forbid(unsafe_code)]

//! Arena-backed semantic model.
//!
//! [`Model::new`] walks a [`Document`] once, allocating every schema element
//! into flat arenas and registering its full name. Nothing is resolved at
//! construction time: cross references are computed on first access and
//! cached in [`Memo`] cells owned by the elements.

mod elements;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use edm_ast::{
    AnnotationDecl, AssociationDecl, ComplexTypeDecl, Document, EntityContainerDecl,
    EntityTypeDecl, EnumTypeDecl, FunctionDecl, ParameterDecl, PropertyDecl, SchemaDecl,
    SchemaItem, Span, ValueTermDecl,
};
use tracing::{debug, trace};

pub use elements::{
    Annotation, AnnotationTarget, Association, AssociationEnd, AssociationSet, ConstraintOutcome,
    ElementCommon, EntityContainer, EntitySet, EnumMember, EnumType, Function, FunctionImport,
    NamespaceUsing, NavigationProperty, Parameter, Property, PropertyKind, Schema, SchemaType,
    SchemaTypeKind, StructuralProperty, StructuredKind, StructuredType, ValueTerm,
};

use crate::config::EdmConfig;
use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{
    AnnotationId, AssociationId, AssociationSetId, ContainerElement, ContainerId, ElementRef,
    EntitySetId, FunctionId, FunctionImportId, PropertyId, SchemaId, TermId, TypeId,
};
use crate::memo::Memo;
use crate::placeholder::{ElementKind, Placeholder};

/// Full-name lookup tables filled while schemas are added.
#[derive(Debug, Default)]
struct Registry {
    /// First element registered under each full name; functions may share one.
    names: HashMap<String, ElementRef>,
    types: HashMap<String, TypeId>,
    associations: HashMap<String, AssociationId>,
    functions: HashMap<String, Vec<FunctionId>>,
    terms: HashMap<String, TermId>,
    containers: HashMap<String, ContainerId>,
    container_of: HashMap<ContainerElement, ContainerId>,
    out_of_line: HashMap<String, Vec<AnnotationId>>,
}

#[derive(Debug)]
pub struct Model {
    config: EdmConfig,
    schemas: Vec<Schema>,
    types: Vec<SchemaType>,
    properties: Vec<Property>,
    associations: Vec<Association>,
    functions: Vec<Function>,
    terms: Vec<ValueTerm>,
    containers: Vec<EntityContainer>,
    entity_sets: Vec<EntitySet>,
    association_sets: Vec<AssociationSet>,
    function_imports: Vec<FunctionImport>,
    annotations: Vec<Annotation>,
    registry: Registry,
}

pub(crate) fn qualify(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

macro_rules! arena_access {
    ($($get:ident, $ids:ident, $field:ident: $id:ty => $elem:ty;)*) => {
        impl Model {
            $(
                /// # Panics
                ///
                /// Panics if the id belongs to another model.
                pub fn $get(&self, id: $id) -> &$elem {
                    &self.$field[id.index()]
                }

                pub fn $ids(&self) -> impl Iterator<Item = $id> + '_ {
                    (0..self.$field.len()).map(<$id>::from_index)
                }
            )*
        }
    };
}

arena_access! {
    schema, schema_ids, schemas: SchemaId => Schema;
    schema_type, type_ids, types: TypeId => SchemaType;
    property, property_ids, properties: PropertyId => Property;
    association, association_ids, associations: AssociationId => Association;
    function, function_ids, functions: FunctionId => Function;
    term, term_ids, terms: TermId => ValueTerm;
    container, container_ids, containers: ContainerId => EntityContainer;
    entity_set, entity_set_ids, entity_sets: EntitySetId => EntitySet;
    association_set, association_set_ids, association_sets: AssociationSetId => AssociationSet;
    function_import, function_import_ids, function_imports: FunctionImportId => FunctionImport;
    annotation, annotation_ids, annotations: AnnotationId => Annotation;
}

impl Model {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EdmConfig::default())
    }

    pub fn with_config(document: Document, config: EdmConfig) -> Self {
        let mut model = Self {
            config,
            schemas: Vec::new(),
            types: Vec::new(),
            properties: Vec::new(),
            associations: Vec::new(),
            functions: Vec::new(),
            terms: Vec::new(),
            containers: Vec::new(),
            entity_sets: Vec::new(),
            association_sets: Vec::new(),
            function_imports: Vec::new(),
            annotations: Vec::new(),
            registry: Registry::default(),
        };
        for schema in document.schemas {
            model.add_schema(schema);
        }
        debug!(
            schemas = model.schemas.len(),
            types = model.types.len(),
            associations = model.associations.len(),
            containers = model.containers.len(),
            "model constructed"
        );
        model
    }

    pub fn config(&self) -> &EdmConfig {
        &self.config
    }

    pub fn find_type(&self, full_name: &str) -> Option<TypeId> {
        self.registry.types.get(full_name).copied()
    }

    pub fn find_association(&self, full_name: &str) -> Option<AssociationId> {
        self.registry.associations.get(full_name).copied()
    }

    pub fn find_value_term(&self, full_name: &str) -> Option<TermId> {
        self.registry.terms.get(full_name).copied()
    }

    pub fn find_entity_container(&self, full_name: &str) -> Option<ContainerId> {
        self.registry.containers.get(full_name).copied()
    }

    /// All overloads registered under `full_name`.
    pub fn find_functions(&self, full_name: &str) -> &[FunctionId] {
        self.registry
            .functions
            .get(full_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The default container, or the first one declared.
    pub fn default_container(&self) -> Option<ContainerId> {
        self.container_ids()
            .find(|id| self.container(*id).is_default)
            .or_else(|| self.container_ids().next())
    }

    /// Container that declares a set or function import.
    ///
    /// # Panics
    ///
    /// Panics if the element was not built by this model.
    pub fn container_of(&self, element: ContainerElement) -> ContainerId {
        *self
            .registry
            .container_of
            .get(&element)
            .unwrap_or_else(|| panic!("{element:?} is not registered with a container"))
    }

    pub(crate) fn out_of_line_annotations(&self, full_name: &str) -> &[AnnotationId] {
        self.registry
            .out_of_line
            .get(full_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Namespace-qualified name used for lookups and out-of-line annotation
    /// targets.
    pub fn full_name(&self, element: ElementRef) -> String {
        match element {
            ElementRef::Schema(id) => self.schema(id).namespace.clone(),
            ElementRef::Type(id) => {
                let t = self.schema_type(id);
                qualify(&t.namespace, &t.common.name)
            }
            ElementRef::Property(id) => {
                let p = self.property(id);
                format!(
                    "{}/{}",
                    self.full_name(ElementRef::Type(p.declaring_type)),
                    p.common.name
                )
            }
            ElementRef::Association(id) => {
                let a = self.association(id);
                qualify(&a.namespace, &a.common.name)
            }
            ElementRef::Function(id) => {
                let f = self.function(id);
                qualify(&f.namespace, &f.common.name)
            }
            ElementRef::Term(id) => {
                let t = self.term(id);
                qualify(&t.namespace, &t.common.name)
            }
            ElementRef::Container(id) => {
                let c = self.container(id);
                qualify(&c.namespace, &c.common.name)
            }
            ElementRef::EntitySet(id) => self.container_member_name(
                ContainerElement::EntitySet(id),
                &self.entity_set(id).common,
            ),
            ElementRef::AssociationSet(id) => self.container_member_name(
                ContainerElement::AssociationSet(id),
                &self.association_set(id).common,
            ),
            ElementRef::FunctionImport(id) => self.container_member_name(
                ContainerElement::FunctionImport(id),
                &self.function_import(id).common,
            ),
        }
    }

    fn container_member_name(&self, element: ContainerElement, common: &ElementCommon) -> String {
        let container = self.container_of(element);
        format!(
            "{}/{}",
            self.full_name(ElementRef::Container(container)),
            common.name
        )
    }

    /// Shared fields of a named element; schemas have none.
    pub fn common(&self, element: ElementRef) -> Option<&ElementCommon> {
        Some(match element {
            ElementRef::Schema(_) => return None,
            ElementRef::Type(id) => &self.schema_type(id).common,
            ElementRef::Property(id) => &self.property(id).common,
            ElementRef::Association(id) => &self.association(id).common,
            ElementRef::Function(id) => &self.function(id).common,
            ElementRef::Term(id) => &self.term(id).common,
            ElementRef::Container(id) => &self.container(id).common,
            ElementRef::EntitySet(id) => &self.entity_set(id).common,
            ElementRef::AssociationSet(id) => &self.association_set(id).common,
            ElementRef::FunctionImport(id) => &self.function_import(id).common,
        })
    }

    pub fn span_of(&self, element: ElementRef) -> Span {
        match element {
            ElementRef::Schema(id) => self.schema(id).span,
            other => self
                .common(other)
                .map(|c| c.span)
                .unwrap_or_else(edm_ast::no_span),
        }
    }

    /// Schema whose aliases and namespace apply to names written inside
    /// `element`.
    pub fn schema_of(&self, element: ElementRef) -> SchemaId {
        match element {
            ElementRef::Schema(id) => id,
            ElementRef::Type(id) => self.schema_type(id).schema,
            ElementRef::Property(id) => self.schema_type(self.property(id).declaring_type).schema,
            ElementRef::Association(id) => self.association(id).schema,
            ElementRef::Function(id) => self.function(id).schema,
            ElementRef::Term(id) => self.term(id).schema,
            ElementRef::Container(id) => self.container(id).schema,
            ElementRef::EntitySet(id) => self.entity_set(id).schema,
            ElementRef::AssociationSet(id) => self.association_set(id).schema,
            ElementRef::FunctionImport(id) => self.function_import(id).schema,
        }
    }

    fn add_schema(&mut self, decl: SchemaDecl) {
        let schema_id = SchemaId::from_index(self.schemas.len());
        let namespace = decl.namespace.node.clone();
        debug!(namespace = %namespace, items = decl.items.len(), "adding schema");
        self.schemas.push(Schema {
            namespace,
            alias: decl.alias.map(|a| a.node),
            usings: decl
                .usings
                .into_iter()
                .map(|u| NamespaceUsing {
                    namespace: u.namespace.node,
                    alias: u.alias.map(|a| a.node),
                })
                .collect(),
            span: decl.span,
            types: Vec::new(),
            associations: Vec::new(),
            functions: Vec::new(),
            terms: Vec::new(),
            containers: Vec::new(),
            errors: Vec::new(),
        });

        for item in decl.items {
            match item {
                SchemaItem::EntityType(d) => self.add_entity_type(schema_id, d),
                SchemaItem::ComplexType(d) => self.add_complex_type(schema_id, d),
                SchemaItem::EnumType(d) => self.add_enum_type(schema_id, d),
                SchemaItem::Association(d) => self.add_association(schema_id, d),
                SchemaItem::Function(d) => self.add_function(schema_id, d),
                SchemaItem::ValueTerm(d) => self.add_term(schema_id, d),
                SchemaItem::EntityContainer(d) => self.add_container(schema_id, d),
                SchemaItem::Annotations(d) => {
                    let target = self.canonical_target(schema_id, &d.target.node);
                    trace!(
                        target = %target,
                        count = d.annotations.len(),
                        "out-of-line annotations"
                    );
                    let qualifier = d.qualifier.map(|q| q.node);
                    let ids = self.alloc_annotations(
                        schema_id,
                        AnnotationTarget::OutOfLine(target.clone()),
                        d.annotations,
                        qualifier.as_deref(),
                    );
                    self.registry.out_of_line.entry(target).or_default().extend(ids);
                }
            }
        }
    }

    /// Records `full_name`; a clash adds a duplicate error to the schema and
    /// returns false. Function overloads do not clash with each other.
    fn register_name(
        &mut self,
        schema: SchemaId,
        full_name: &str,
        element: ElementRef,
        span: Span,
    ) -> bool {
        match self.registry.names.entry(full_name.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(element);
                true
            }
            Entry::Occupied(slot) => {
                if matches!(
                    (slot.get(), element),
                    (ElementRef::Function(_), ElementRef::Function(_))
                ) {
                    return true;
                }
                debug!(name = %full_name, "duplicate schema element");
                self.schemas[schema.index()].errors.push(EdmError::new(
                    EdmErrorCode::DuplicateElement,
                    span,
                    format!("an element named '{full_name}' is already defined"),
                ));
                false
            }
        }
    }

    fn alloc_annotations(
        &mut self,
        schema: SchemaId,
        target: AnnotationTarget,
        decls: Vec<AnnotationDecl>,
        default_qualifier: Option<&str>,
    ) -> Vec<AnnotationId> {
        let mut ids = Vec::with_capacity(decls.len());
        for decl in decls {
            ids.push(AnnotationId::from_index(self.annotations.len()));
            self.annotations.push(Annotation {
                span: decl.span,
                schema,
                term_name: decl.term,
                qualifier: decl
                    .qualifier
                    .map(|q| q.node)
                    .or_else(|| default_qualifier.map(str::to_owned)),
                value: decl.value,
                target: target.clone(),
                term: Memo::new(),
                errors: Memo::new(),
            });
        }
        ids
    }

    fn add_property(
        &mut self,
        schema: SchemaId,
        declaring_type: TypeId,
        decl: PropertyDecl,
    ) -> PropertyId {
        let id = PropertyId::from_index(self.properties.len());
        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Property(id)),
            decl.annotations,
            None,
        );
        self.properties.push(Property {
            common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
            declaring_type,
            kind: PropertyKind::Structural(StructuralProperty {
                type_expr: decl.ty,
                default_value: decl.default_value,
                concurrency_fixed: decl.concurrency_fixed,
                feed_mapping: decl.feed_mapping,
            }),
            ty: Memo::new(),
            errors: Memo::new(),
        });
        id
    }

    fn push_type(&mut self, schema: SchemaId, ty: SchemaType) {
        let id = TypeId::from_index(self.types.len());
        let full_name = qualify(&ty.namespace, &ty.common.name);
        let span = ty.common.span;
        self.types.push(ty);
        self.schemas[schema.index()].types.push(id);
        if self.register_name(schema, &full_name, ElementRef::Type(id), span) {
            self.registry.types.insert(full_name, id);
        }
    }

    fn add_entity_type(&mut self, schema: SchemaId, decl: EntityTypeDecl) {
        let id = TypeId::from_index(self.types.len());
        let mut properties =
            Vec::with_capacity(decl.properties.len() + decl.navigation_properties.len());
        for p in decl.properties {
            properties.push(self.add_property(schema, id, p));
        }
        for nav in decl.navigation_properties {
            let pid = PropertyId::from_index(self.properties.len());
            let inline = self.alloc_annotations(
                schema,
                AnnotationTarget::Inline(ElementRef::Property(pid)),
                nav.annotations,
                None,
            );
            self.properties.push(Property {
                common: ElementCommon::new(&nav.name, nav.span, nav.documentation, inline),
                declaring_type: id,
                kind: PropertyKind::Navigation(NavigationProperty {
                    relationship: nav.relationship,
                    from_role: nav.from_role,
                    to_role: nav.to_role,
                    association: Memo::new(),
                }),
                ty: Memo::new(),
                errors: Memo::new(),
            });
            properties.push(pid);
        }
        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Type(id)),
            decl.annotations,
            None,
        );
        let namespace = self.schemas[schema.index()].namespace.clone();
        self.push_type(
            schema,
            SchemaType {
                common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
                schema,
                namespace,
                kind: SchemaTypeKind::Structured(StructuredType {
                    kind: StructuredKind::Entity,
                    base_type_name: decl.base_type,
                    is_abstract: decl.is_abstract,
                    is_open: decl.is_open,
                    declared_key: decl.key,
                    declared_properties: properties,
                    feed_mappings: decl.feed_mappings,
                    base: Memo::new(),
                    key: Memo::new(),
                    errors: Memo::new(),
                }),
            },
        );
    }

    fn add_complex_type(&mut self, schema: SchemaId, decl: ComplexTypeDecl) {
        let id = TypeId::from_index(self.types.len());
        let properties = decl
            .properties
            .into_iter()
            .map(|p| self.add_property(schema, id, p))
            .collect();
        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Type(id)),
            decl.annotations,
            None,
        );
        let namespace = self.schemas[schema.index()].namespace.clone();
        self.push_type(
            schema,
            SchemaType {
                common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
                schema,
                namespace,
                kind: SchemaTypeKind::Structured(StructuredType {
                    kind: StructuredKind::Complex,
                    base_type_name: decl.base_type,
                    is_abstract: decl.is_abstract,
                    is_open: false,
                    declared_key: Vec::new(),
                    declared_properties: properties,
                    feed_mappings: Vec::new(),
                    base: Memo::new(),
                    key: Memo::new(),
                    errors: Memo::new(),
                }),
            },
        );
    }

    fn add_enum_type(&mut self, schema: SchemaId, decl: EnumTypeDecl) {
        let id = TypeId::from_index(self.types.len());
        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Type(id)),
            decl.annotations,
            None,
        );
        // Members without an explicit value continue from the previous one.
        let mut next = 0i64;
        let members = decl
            .members
            .into_iter()
            .map(|m| {
                let value = m.value.unwrap_or(next);
                next = value.saturating_add(1);
                EnumMember {
                    name: m.name.node,
                    span: m.span,
                    value,
                }
            })
            .collect();
        let namespace = self.schemas[schema.index()].namespace.clone();
        self.push_type(
            schema,
            SchemaType {
                common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
                schema,
                namespace,
                kind: SchemaTypeKind::Enum(EnumType {
                    underlying_type_name: decl.underlying_type,
                    is_flags: decl.is_flags,
                    members,
                    errors: Memo::new(),
                }),
            },
        );
    }

    fn add_association(&mut self, schema: SchemaId, decl: AssociationDecl) {
        let id = AssociationId::from_index(self.associations.len());
        let namespace = self.schemas[schema.index()].namespace.clone();
        let full_name = qualify(&namespace, &decl.name.node);
        let declared_end_count = decl.ends.len();

        let mut ends = decl.ends.into_iter().map(|end| AssociationEnd {
            role: end.role.node,
            span: end.span,
            entity_type_name: Some(end.entity_type),
            multiplicity: end.multiplicity,
            on_delete: end.on_delete,
            entity_type: Memo::new(),
            bad: None,
        });
        let mut next_end = |index: usize| {
            ends.next().unwrap_or_else(|| {
                let role = format!("End{}", index + 1);
                let error = EdmError::new(
                    EdmErrorCode::InvalidAssociationEndCount,
                    decl.span,
                    format!(
                        "association '{full_name}' must declare exactly two ends, found {declared_end_count}"
                    ),
                );
                AssociationEnd {
                    bad: Some(Placeholder::bad(
                        ElementKind::AssociationEnd,
                        role.clone(),
                        vec![error],
                        decl.span,
                    )),
                    role,
                    span: decl.span,
                    entity_type_name: None,
                    multiplicity: edm_ast::Multiplicity::One,
                    on_delete: edm_ast::OnDeleteAction::None,
                    entity_type: Memo::new(),
                }
            })
        };
        let normalized = [next_end(0), next_end(1)];

        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Association(id)),
            decl.annotations,
            None,
        );
        let span = decl.span;
        self.associations.push(Association {
            common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
            schema,
            namespace,
            ends: normalized,
            constraint: decl.referential_constraint,
            declared_end_count,
            constraint_outcome: Memo::new(),
            errors: Memo::new(),
        });
        self.schemas[schema.index()].associations.push(id);
        if self.register_name(schema, &full_name, ElementRef::Association(id), span) {
            self.registry.associations.insert(full_name, id);
        }
    }

    fn parameters(decls: Vec<ParameterDecl>) -> Vec<Parameter> {
        decls
            .into_iter()
            .map(|p| Parameter {
                name: p.name.node,
                span: p.span,
                type_expr: p.ty,
                ty: Memo::new(),
            })
            .collect()
    }

    fn add_function(&mut self, schema: SchemaId, decl: FunctionDecl) {
        let id = FunctionId::from_index(self.functions.len());
        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Function(id)),
            decl.annotations,
            None,
        );
        let namespace = self.schemas[schema.index()].namespace.clone();
        let full_name = qualify(&namespace, &decl.name.node);
        let span = decl.span;
        self.functions.push(Function {
            common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
            schema,
            namespace,
            parameters: Self::parameters(decl.parameters),
            return_type_expr: decl.return_type,
            defining_expression: decl.defining_expression,
            return_type: Memo::new(),
        });
        self.schemas[schema.index()].functions.push(id);
        if self.register_name(schema, &full_name, ElementRef::Function(id), span) {
            self.registry.functions.entry(full_name).or_default().push(id);
        }
    }

    fn add_term(&mut self, schema: SchemaId, decl: ValueTermDecl) {
        let id = TermId::from_index(self.terms.len());
        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Term(id)),
            decl.annotations,
            None,
        );
        let namespace = self.schemas[schema.index()].namespace.clone();
        let full_name = qualify(&namespace, &decl.name.node);
        let span = decl.span;
        self.terms.push(ValueTerm {
            common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
            schema,
            namespace,
            type_expr: decl.ty,
            ty: Memo::new(),
        });
        self.schemas[schema.index()].terms.push(id);
        if self.register_name(schema, &full_name, ElementRef::Term(id), span) {
            self.registry.terms.insert(full_name, id);
        }
    }

    fn add_container(&mut self, schema: SchemaId, decl: EntityContainerDecl) {
        let id = ContainerId::from_index(self.containers.len());

        let mut entity_sets = Vec::with_capacity(decl.entity_sets.len());
        for set in decl.entity_sets {
            let set_id = EntitySetId::from_index(self.entity_sets.len());
            let inline = self.alloc_annotations(
                schema,
                AnnotationTarget::Inline(ElementRef::EntitySet(set_id)),
                set.annotations,
                None,
            );
            self.entity_sets.push(EntitySet {
                common: ElementCommon::new(&set.name, set.span, set.documentation, inline),
                schema,
                entity_type_name: set.entity_type,
                element_type: Memo::new(),
            });
            self.registry
                .container_of
                .insert(ContainerElement::EntitySet(set_id), id);
            entity_sets.push(set_id);
        }

        let mut association_sets = Vec::with_capacity(decl.association_sets.len());
        for set in decl.association_sets {
            let set_id = AssociationSetId::from_index(self.association_sets.len());
            let inline = self.alloc_annotations(
                schema,
                AnnotationTarget::Inline(ElementRef::AssociationSet(set_id)),
                set.annotations,
                None,
            );
            self.association_sets.push(AssociationSet {
                common: ElementCommon::new(&set.name, set.span, set.documentation, inline),
                schema,
                association_name: set.association,
                ends: set.ends,
                association: Memo::new(),
                errors: Memo::new(),
            });
            self.registry
                .container_of
                .insert(ContainerElement::AssociationSet(set_id), id);
            association_sets.push(set_id);
        }

        let mut function_imports = Vec::with_capacity(decl.function_imports.len());
        for import in decl.function_imports {
            let import_id = FunctionImportId::from_index(self.function_imports.len());
            let inline = self.alloc_annotations(
                schema,
                AnnotationTarget::Inline(ElementRef::FunctionImport(import_id)),
                import.annotations,
                None,
            );
            self.function_imports.push(FunctionImport {
                common: ElementCommon::new(&import.name, import.span, import.documentation, inline),
                schema,
                return_type_expr: import.return_type,
                entity_set_name: import.entity_set,
                parameters: Self::parameters(import.parameters),
                is_side_effecting: import.is_side_effecting,
                return_type: Memo::new(),
                entity_set: Memo::new(),
            });
            self.registry
                .container_of
                .insert(ContainerElement::FunctionImport(import_id), id);
            function_imports.push(import_id);
        }

        let inline = self.alloc_annotations(
            schema,
            AnnotationTarget::Inline(ElementRef::Container(id)),
            decl.annotations,
            None,
        );
        let namespace = self.schemas[schema.index()].namespace.clone();
        let full_name = qualify(&namespace, &decl.name.node);
        let span = decl.span;
        self.containers.push(EntityContainer {
            common: ElementCommon::new(&decl.name, decl.span, decl.documentation, inline),
            schema,
            namespace,
            extends_name: decl.extends,
            is_default: decl.is_default,
            entity_sets,
            association_sets,
            function_imports,
            extends: Memo::new(),
            errors: Memo::new(),
        });
        self.schemas[schema.index()].containers.push(id);
        if self.register_name(schema, &full_name, ElementRef::Container(id), span) {
            self.registry.containers.insert(full_name, id);
        }
    }
}
