#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fmt;

use edm_ast::Span;
use miette::Diagnostic;
use thiserror::Error;

/// Stable identifier of every data-dependent diagnostic the model can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdmErrorCode {
    UnresolvedType,
    UnresolvedAssociation,
    UnresolvedTerm,
    UnresolvedEntityContainer,
    UnresolvedEntitySet,
    UnresolvedProperty,
    UnresolvedRole,
    CyclicBaseType,
    CyclicEntityContainer,
    DuplicateElement,
    DuplicateProperty,
    DuplicateEnumMember,
    DuplicateEndName,
    InvalidAssociationEndCount,
    InvalidFacet,
    KeyMissing,
    KeyPropertyNotFound,
    KeyPropertyMustBeNonNullable,
    KeyPropertyMustBePrimitive,
    KeyRedefinedInDerivedType,
    NavigationRoleMismatch,
    SameRoleReferredTwice,
    InvalidRoleInConstraint,
    MismatchedConstraintPropertyCount,
    PrincipalPropertyNotInKey,
    DependentPropertyNotFound,
    TypeMismatchRelationshipConstraint,
    InvalidPrincipalMultiplicity,
    EntitySetTypeNotEntity,
    AssociationSetEndMismatch,
    FunctionImportEntitySetMismatch,
    EnumUnderlyingTypeNotIntegral,
    EnumMemberValueOutOfRange,
    AnnotationValueMismatch,
}

impl EdmErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdmErrorCode::UnresolvedType => "unresolved_type",
            EdmErrorCode::UnresolvedAssociation => "unresolved_association",
            EdmErrorCode::UnresolvedTerm => "unresolved_term",
            EdmErrorCode::UnresolvedEntityContainer => "unresolved_entity_container",
            EdmErrorCode::UnresolvedEntitySet => "unresolved_entity_set",
            EdmErrorCode::UnresolvedProperty => "unresolved_property",
            EdmErrorCode::UnresolvedRole => "unresolved_role",
            EdmErrorCode::CyclicBaseType => "cyclic_base_type",
            EdmErrorCode::CyclicEntityContainer => "cyclic_entity_container",
            EdmErrorCode::DuplicateElement => "duplicate_element",
            EdmErrorCode::DuplicateProperty => "duplicate_property",
            EdmErrorCode::DuplicateEnumMember => "duplicate_enum_member",
            EdmErrorCode::DuplicateEndName => "duplicate_end_name",
            EdmErrorCode::InvalidAssociationEndCount => "invalid_association_end_count",
            EdmErrorCode::InvalidFacet => "invalid_facet",
            EdmErrorCode::KeyMissing => "key_missing",
            EdmErrorCode::KeyPropertyNotFound => "key_property_not_found",
            EdmErrorCode::KeyPropertyMustBeNonNullable => "key_property_must_be_non_nullable",
            EdmErrorCode::KeyPropertyMustBePrimitive => "key_property_must_be_primitive",
            EdmErrorCode::KeyRedefinedInDerivedType => "key_redefined_in_derived_type",
            EdmErrorCode::NavigationRoleMismatch => "navigation_role_mismatch",
            EdmErrorCode::SameRoleReferredTwice => "same_role_referred_twice",
            EdmErrorCode::InvalidRoleInConstraint => "invalid_role_in_constraint",
            EdmErrorCode::MismatchedConstraintPropertyCount => {
                "mismatched_constraint_property_count"
            }
            EdmErrorCode::PrincipalPropertyNotInKey => "principal_property_not_in_key",
            EdmErrorCode::DependentPropertyNotFound => "dependent_property_not_found",
            EdmErrorCode::TypeMismatchRelationshipConstraint => {
                "type_mismatch_relationship_constraint"
            }
            EdmErrorCode::InvalidPrincipalMultiplicity => "invalid_principal_multiplicity",
            EdmErrorCode::EntitySetTypeNotEntity => "entity_set_type_not_entity",
            EdmErrorCode::AssociationSetEndMismatch => "association_set_end_mismatch",
            EdmErrorCode::FunctionImportEntitySetMismatch => "function_import_entity_set_mismatch",
            EdmErrorCode::EnumUnderlyingTypeNotIntegral => "enum_underlying_type_not_integral",
            EdmErrorCode::EnumMemberValueOutOfRange => "enum_member_value_out_of_range",
            EdmErrorCode::AnnotationValueMismatch => "annotation_value_mismatch",
        }
    }
}

impl fmt::Display for EdmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolution-time diagnostic. Never thrown; carried by placeholders and
/// accumulated on the element that owns it.
#[derive(Clone, Debug, Error, Diagnostic, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code(edm::semantic))]
#[allow(unused_assignments)]
pub struct EdmError {
    pub code: EdmErrorCode,
    pub message: String,
    #[label]
    pub span: Span,
}

impl EdmError {
    pub fn new(code: EdmErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }
}
