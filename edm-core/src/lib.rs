#![forbid(unsafe_code)]

//! Lazy, cycle-tolerant semantic model over an `edm-ast` document.

mod annotation;
mod assign;
mod association;
mod config;
mod constraint;
mod container;
mod error;
mod function;
mod ids;
mod memo;
mod model;
mod placeholder;
mod report;
mod resolve;
mod structured;
mod types;
mod validate;

pub use assign::{definitions_equivalent, is_equivalent_to};
pub use config::{ConfigError, EdmConfig, EpmConfig, ValidationConfig};
pub use error::{EdmError, EdmErrorCode};
pub use ids::{
    AnnotationId, AssociationId, AssociationSetId, ContainerElement, ContainerId, ElementRef,
    EntitySetId, FunctionId, FunctionImportId, PropertyId, SchemaId, TermId, TypeId,
};
pub use memo::Memo;
pub use model::{
    Annotation, AnnotationTarget, Association, AssociationEnd, AssociationSet, ConstraintOutcome,
    ElementCommon, EntityContainer, EntitySet, EnumMember, EnumType, Function, FunctionImport,
    Model, NamespaceUsing, NavigationProperty, Parameter, Property, PropertyKind, Schema,
    SchemaType, SchemaTypeKind, StructuralProperty, StructuredKind, StructuredType, ValueTerm,
};
pub use placeholder::{Checkable, ElementKind, Placeholder, PlaceholderKind, Resolved};
pub use report::{DiagnosticEntry, ModelReport, SpanRange};
pub use structured::Ancestors;
pub use types::{
    BinaryFacets, DecimalFacets, FacetFamily, PrimitiveFacets, PrimitiveKind, RowColumn,
    SpatialFacets, StringFacets, TemporalFacets, TypeDefinition, TypeKind, TypeRef,
};
