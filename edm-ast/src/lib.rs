#![forbid(unsafe_code)]

//! Syntax tree of a schema description document.
//!
//! The tree is produced by an external reader (CSDL/XML or otherwise) and is
//! treated as read-only input by `edm-core`. Every node carries the span it
//! was read from so diagnostics can point back at the source.

mod builder;

use miette::SourceSpan;

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

/// Span used by nodes that were built in code rather than read from a file.
pub fn no_span() -> Span {
    span(0, 0)
}

pub type Ident = Spanned<String>;

/// A possibly namespace-qualified name as written (`Person`, `Self.Person`,
/// `Org.Data.Person`).
pub type QualifiedName = Spanned<String>;

pub fn ident(name: impl Into<String>) -> Ident {
    Spanned::new(no_span(), name.into())
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub schemas: Vec<SchemaDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDecl {
    pub span: Span,
    pub namespace: Ident,
    pub alias: Option<Ident>,
    pub usings: Vec<UsingDecl>,
    pub items: Vec<SchemaItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UsingDecl {
    pub span: Span,
    pub namespace: Ident,
    pub alias: Option<Ident>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchemaItem {
    EntityType(EntityTypeDecl),
    ComplexType(ComplexTypeDecl),
    EnumType(EnumTypeDecl),
    Association(AssociationDecl),
    Function(FunctionDecl),
    ValueTerm(ValueTermDecl),
    EntityContainer(EntityContainerDecl),
    Annotations(AnnotationsDecl),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Documentation {
    pub summary: Option<String>,
    pub long_description: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntityTypeDecl {
    pub span: Span,
    pub name: Ident,
    pub base_type: Option<QualifiedName>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub key: Vec<Ident>,
    pub properties: Vec<PropertyDecl>,
    pub navigation_properties: Vec<NavigationPropertyDecl>,
    /// Type-level feed mappings (source path given explicitly).
    pub feed_mappings: Vec<FeedMappingDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexTypeDecl {
    pub span: Span,
    pub name: Ident,
    pub base_type: Option<QualifiedName>,
    pub is_abstract: bool,
    pub properties: Vec<PropertyDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
    pub default_value: Option<String>,
    pub concurrency_fixed: bool,
    /// Property-level feed mapping; its source path is the property itself.
    pub feed_mapping: Option<FeedMappingDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavigationPropertyDecl {
    pub span: Span,
    pub name: Ident,
    pub relationship: QualifiedName,
    pub from_role: Ident,
    pub to_role: Ident,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeExpr {
    pub span: Span,
    pub nullable: bool,
    pub kind: TypeExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeExprKind {
    /// A primitive, entity, complex or enum type by name, with facets.
    Named { name: QualifiedName, facets: FacetDecls },
    Collection(Box<TypeExpr>),
    EntityReference(QualifiedName),
    Row(Vec<RowColumnDecl>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FacetDecls {
    pub max_length: Option<MaxLength>,
    pub unicode: Option<bool>,
    pub fixed_length: Option<bool>,
    pub collation: Option<String>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub srid: Option<Srid>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaxLength {
    Max,
    Value(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Srid {
    Variable,
    Value(i32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowColumnDecl {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumTypeDecl {
    pub span: Span,
    pub name: Ident,
    pub underlying_type: Option<QualifiedName>,
    pub is_flags: bool,
    pub members: Vec<EnumMemberDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMemberDecl {
    pub span: Span,
    pub name: Ident,
    pub value: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssociationDecl {
    pub span: Span,
    pub name: Ident,
    pub ends: Vec<AssociationEndDecl>,
    pub referential_constraint: Option<ReferentialConstraintDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssociationEndDecl {
    pub span: Span,
    pub role: Ident,
    pub entity_type: QualifiedName,
    pub multiplicity: Multiplicity,
    pub on_delete: OnDeleteAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    ZeroOrOne,
    One,
    Many,
}

impl Multiplicity {
    pub fn display(&self) -> &'static str {
        match self {
            Multiplicity::ZeroOrOne => "0..1",
            Multiplicity::One => "1",
            Multiplicity::Many => "*",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OnDeleteAction {
    #[default]
    None,
    Cascade,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferentialConstraintDecl {
    pub span: Span,
    pub principal: ConstraintRoleDecl,
    pub dependent: ConstraintRoleDecl,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintRoleDecl {
    pub span: Span,
    pub role: Ident,
    pub properties: Vec<Ident>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub span: Span,
    pub name: Ident,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: Option<TypeExpr>,
    pub defining_expression: Option<String>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDecl {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueTermDecl {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntityContainerDecl {
    pub span: Span,
    pub name: Ident,
    pub extends: Option<QualifiedName>,
    pub is_default: bool,
    pub entity_sets: Vec<EntitySetDecl>,
    pub association_sets: Vec<AssociationSetDecl>,
    pub function_imports: Vec<FunctionImportDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntitySetDecl {
    pub span: Span,
    pub name: Ident,
    pub entity_type: QualifiedName,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssociationSetDecl {
    pub span: Span,
    pub name: Ident,
    pub association: QualifiedName,
    pub ends: Vec<AssociationSetEndDecl>,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssociationSetEndDecl {
    pub span: Span,
    pub role: Ident,
    pub entity_set: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionImportDecl {
    pub span: Span,
    pub name: Ident,
    pub return_type: Option<TypeExpr>,
    pub entity_set: Option<Ident>,
    pub parameters: Vec<ParameterDecl>,
    pub is_side_effecting: bool,
    pub annotations: Vec<AnnotationDecl>,
    pub documentation: Option<Documentation>,
}

/// Out-of-line annotations, attached to an element by its full name.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationsDecl {
    pub span: Span,
    pub target: QualifiedName,
    pub qualifier: Option<Ident>,
    pub annotations: Vec<AnnotationDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationDecl {
    pub span: Span,
    pub term: QualifiedName,
    pub qualifier: Option<Ident>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decimal literal kept as text to avoid precision loss.
    Decimal(String),
    String(String),
    Guid(String),
    Path(String),
    Collection(Vec<Expr>),
    Record {
        ty: Option<QualifiedName>,
        fields: Vec<(Ident, Expr)>,
    },
}

/// Feed customization declared on an entity type or property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedMappingDecl {
    pub span: Span,
    /// `None` on property-level mappings: the property itself is the source.
    pub source_path: Option<String>,
    /// Either a syndication item name (`SyndicationTitle`) or a custom path.
    pub target_path: String,
    pub content_kind: Option<String>,
    pub keep_in_content: bool,
    pub ns_prefix: Option<String>,
    pub ns_uri: Option<String>,
}
