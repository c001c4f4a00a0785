#![forbid(unsafe_code)]

use std::rc::Rc;

use edm_ast::{
    AssociationSetEndDecl, Documentation, Expr, FeedMappingDecl, Ident, Multiplicity,
    OnDeleteAction, QualifiedName, ReferentialConstraintDecl, Span, TypeExpr,
};

use crate::error::EdmError;
use crate::ids::{
    AnnotationId, AssociationId, AssociationSetId, ContainerId, ElementRef, EntitySetId,
    FunctionId, FunctionImportId, PropertyId, SchemaId, TermId, TypeId,
};
use crate::memo::Memo;
use crate::placeholder::{Placeholder, Resolved};
use crate::types::TypeRef;

/// Fields shared by every named element.
#[derive(Debug)]
pub struct ElementCommon {
    pub name: String,
    pub span: Span,
    pub documentation: Option<Documentation>,
    pub(crate) inline_annotations: Vec<AnnotationId>,
    pub(crate) annotations: Memo<Rc<[AnnotationId]>>,
}

impl ElementCommon {
    pub(crate) fn new(
        name: &Ident,
        span: Span,
        documentation: Option<Documentation>,
        inline_annotations: Vec<AnnotationId>,
    ) -> Self {
        Self {
            name: name.node.clone(),
            span,
            documentation,
            inline_annotations,
            annotations: Memo::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceUsing {
    pub namespace: String,
    pub alias: Option<String>,
}

#[derive(Debug)]
pub struct Schema {
    pub namespace: String,
    pub alias: Option<String>,
    pub usings: Vec<NamespaceUsing>,
    pub span: Span,
    pub types: Vec<TypeId>,
    pub associations: Vec<AssociationId>,
    pub functions: Vec<FunctionId>,
    pub terms: Vec<TermId>,
    pub containers: Vec<ContainerId>,
    /// Errors found while registering the schema's elements.
    pub(crate) errors: Vec<EdmError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructuredKind {
    Entity,
    Complex,
}

#[derive(Debug)]
pub struct SchemaType {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub namespace: String,
    pub kind: SchemaTypeKind,
}

#[derive(Debug)]
pub enum SchemaTypeKind {
    Structured(StructuredType),
    Enum(EnumType),
}

impl SchemaType {
    pub fn as_structured(&self) -> Option<&StructuredType> {
        match &self.kind {
            SchemaTypeKind::Structured(s) => Some(s),
            SchemaTypeKind::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.kind {
            SchemaTypeKind::Enum(e) => Some(e),
            SchemaTypeKind::Structured(_) => None,
        }
    }

    /// # Panics
    ///
    /// Panics if this is an enum type.
    pub fn structured(&self) -> &StructuredType {
        self.as_structured()
            .unwrap_or_else(|| panic!("'{}' is not a structured type", self.common.name))
    }

    /// # Panics
    ///
    /// Panics if this is not an enum type.
    pub fn enum_type(&self) -> &EnumType {
        self.as_enum()
            .unwrap_or_else(|| panic!("'{}' is not an enum type", self.common.name))
    }

    pub fn is_entity(&self) -> bool {
        matches!(&self.kind, SchemaTypeKind::Structured(s) if s.kind == StructuredKind::Entity)
    }

    pub fn is_complex(&self) -> bool {
        matches!(&self.kind, SchemaTypeKind::Structured(s) if s.kind == StructuredKind::Complex)
    }
}

#[derive(Debug)]
pub struct StructuredType {
    pub kind: StructuredKind,
    pub base_type_name: Option<QualifiedName>,
    pub is_abstract: bool,
    pub is_open: bool,
    /// Key property names as declared on this type (empty for complex types).
    pub declared_key: Vec<Ident>,
    pub declared_properties: Vec<PropertyId>,
    pub feed_mappings: Vec<FeedMappingDecl>,
    pub(crate) base: Memo<Option<Resolved<TypeId>>>,
    pub(crate) key: Memo<Rc<[Resolved<PropertyId>]>>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub span: Span,
    pub value: i64,
}

#[derive(Debug)]
pub struct EnumType {
    pub underlying_type_name: Option<QualifiedName>,
    pub is_flags: bool,
    pub members: Vec<EnumMember>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}

#[derive(Debug)]
pub struct Property {
    pub common: ElementCommon,
    pub declaring_type: TypeId,
    pub kind: PropertyKind,
    pub(crate) ty: Memo<TypeRef>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}

#[derive(Debug)]
pub enum PropertyKind {
    Structural(StructuralProperty),
    Navigation(NavigationProperty),
}

impl Property {
    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation(_))
    }

    pub fn as_structural(&self) -> Option<&StructuralProperty> {
        match &self.kind {
            PropertyKind::Structural(s) => Some(s),
            PropertyKind::Navigation(_) => None,
        }
    }

    pub fn as_navigation(&self) -> Option<&NavigationProperty> {
        match &self.kind {
            PropertyKind::Navigation(n) => Some(n),
            PropertyKind::Structural(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct StructuralProperty {
    pub type_expr: TypeExpr,
    pub default_value: Option<String>,
    pub concurrency_fixed: bool,
    pub feed_mapping: Option<FeedMappingDecl>,
}

#[derive(Debug)]
pub struct NavigationProperty {
    pub relationship: QualifiedName,
    pub from_role: Ident,
    pub to_role: Ident,
    pub(crate) association: Memo<Resolved<AssociationId>>,
}

#[derive(Debug)]
pub struct AssociationEnd {
    pub role: String,
    pub span: Span,
    pub entity_type_name: Option<QualifiedName>,
    pub multiplicity: Multiplicity,
    pub on_delete: OnDeleteAction,
    pub(crate) entity_type: Memo<Resolved<TypeId>>,
    /// Set on ends synthesized for an association that declares fewer than two.
    pub(crate) bad: Option<Rc<Placeholder>>,
}

/// Result of validating a referential constraint.
#[derive(Debug, PartialEq, Eq)]
pub struct ConstraintOutcome {
    /// Errors that make the constraint invalid.
    pub errors: Vec<EdmError>,
    /// Type and multiplicity problems of an otherwise well-formed constraint.
    /// Reported on the association; the dependents are still resolved.
    pub compatibility_errors: Vec<EdmError>,
    /// Dependent properties in principal key order, or bad placeholders when
    /// the constraint is invalid.
    pub dependent_properties: Vec<Resolved<PropertyId>>,
}

#[derive(Debug)]
pub struct Association {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub namespace: String,
    pub ends: [AssociationEnd; 2],
    pub constraint: Option<ReferentialConstraintDecl>,
    pub(crate) declared_end_count: usize,
    pub(crate) constraint_outcome: Memo<Option<Rc<ConstraintOutcome>>>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}

#[derive(Debug)]
pub struct Parameter {
    pub name: String,
    pub span: Span,
    pub type_expr: TypeExpr,
    pub(crate) ty: Memo<TypeRef>,
}

#[derive(Debug)]
pub struct Function {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub namespace: String,
    pub parameters: Vec<Parameter>,
    pub return_type_expr: Option<TypeExpr>,
    pub defining_expression: Option<String>,
    pub(crate) return_type: Memo<Option<TypeRef>>,
}

#[derive(Debug)]
pub struct ValueTerm {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub namespace: String,
    pub type_expr: TypeExpr,
    pub(crate) ty: Memo<TypeRef>,
}

#[derive(Debug)]
pub struct EntityContainer {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub namespace: String,
    pub extends_name: Option<QualifiedName>,
    pub is_default: bool,
    pub entity_sets: Vec<EntitySetId>,
    pub association_sets: Vec<AssociationSetId>,
    pub function_imports: Vec<FunctionImportId>,
    pub(crate) extends: Memo<Option<Resolved<ContainerId>>>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}

#[derive(Debug)]
pub struct EntitySet {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub entity_type_name: QualifiedName,
    pub(crate) element_type: Memo<Resolved<TypeId>>,
}

#[derive(Debug)]
pub struct AssociationSet {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub association_name: QualifiedName,
    pub ends: Vec<AssociationSetEndDecl>,
    pub(crate) association: Memo<Resolved<AssociationId>>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}

#[derive(Debug)]
pub struct FunctionImport {
    pub common: ElementCommon,
    pub schema: SchemaId,
    pub return_type_expr: Option<TypeExpr>,
    pub entity_set_name: Option<Ident>,
    pub parameters: Vec<Parameter>,
    pub is_side_effecting: bool,
    pub(crate) return_type: Memo<Option<TypeRef>>,
    pub(crate) entity_set: Memo<Option<Resolved<EntitySetId>>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationTarget {
    Inline(ElementRef),
    /// Canonical full name the out-of-line annotation was attached to.
    OutOfLine(String),
}

#[derive(Debug)]
pub struct Annotation {
    pub span: Span,
    pub schema: SchemaId,
    pub term_name: QualifiedName,
    pub qualifier: Option<String>,
    pub value: Expr,
    pub target: AnnotationTarget,
    pub(crate) term: Memo<Resolved<TermId>>,
    pub(crate) errors: Memo<Rc<[EdmError]>>,
}
