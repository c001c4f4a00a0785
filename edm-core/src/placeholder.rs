#![forbid(unsafe_code)]

//! Stand-ins for elements that could not be resolved.
//!
//! Every lookup that can fail returns a [`Resolved`] value. The failure arm
//! is a shared [`Placeholder`] that keeps the name and location of the
//! reference together with the diagnostics explaining the failure, so a
//! caller always receives a same-shaped value and can decide later whether
//! to surface the errors.

use std::fmt;
use std::rc::Rc;

use edm_ast::Span;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::ElementRef;

/// What the placeholder stands in for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A type reference whose kind could not be determined.
    Type,
    EntityType,
    ComplexType,
    EnumType,
    PrimitiveType,
    Association,
    AssociationEnd,
    EntitySet,
    Property,
    EntityContainer,
    ValueTerm,
}

impl ElementKind {
    pub fn display(&self) -> &'static str {
        match self {
            ElementKind::Type => "type",
            ElementKind::EntityType => "entity type",
            ElementKind::ComplexType => "complex type",
            ElementKind::EnumType => "enum type",
            ElementKind::PrimitiveType => "primitive type",
            ElementKind::Association => "association",
            ElementKind::AssociationEnd => "association end",
            ElementKind::EntitySet => "entity set",
            ElementKind::Property => "property",
            ElementKind::EntityContainer => "entity container",
            ElementKind::ValueTerm => "value term",
        }
    }

    fn unresolved_code(&self) -> EdmErrorCode {
        match self {
            ElementKind::Type
            | ElementKind::EntityType
            | ElementKind::ComplexType
            | ElementKind::EnumType
            | ElementKind::PrimitiveType => EdmErrorCode::UnresolvedType,
            ElementKind::Association => EdmErrorCode::UnresolvedAssociation,
            ElementKind::AssociationEnd => EdmErrorCode::UnresolvedRole,
            ElementKind::EntitySet => EdmErrorCode::UnresolvedEntitySet,
            ElementKind::Property => EdmErrorCode::UnresolvedProperty,
            ElementKind::EntityContainer => EdmErrorCode::UnresolvedEntityContainer,
            ElementKind::ValueTerm => EdmErrorCode::UnresolvedTerm,
        }
    }

    fn cyclic_code(&self) -> EdmErrorCode {
        match self {
            ElementKind::EntityContainer => EdmErrorCode::CyclicEntityContainer,
            _ => EdmErrorCode::CyclicBaseType,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// The referenced name was not found in any reachable schema.
    Unresolved,
    /// Resolving the element required resolving itself.
    Cyclic,
    /// The element was found but is structurally broken.
    Bad,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Placeholder {
    kind: PlaceholderKind,
    element: ElementKind,
    name: String,
    span: Span,
    errors: Vec<EdmError>,
    cycle_origin: Option<ElementRef>,
}

impl Placeholder {
    pub fn unresolved(element: ElementKind, name: impl Into<String>, span: Span) -> Rc<Self> {
        let name = name.into();
        let error = EdmError::new(
            element.unresolved_code(),
            span,
            format!("cannot resolve {} '{}'", element.display(), name),
        );
        Rc::new(Self {
            kind: PlaceholderKind::Unresolved,
            element,
            name,
            span,
            errors: vec![error],
            cycle_origin: None,
        })
    }

    /// `origin` is the element whose cell was re-entered; every element on
    /// the cycle shares it.
    pub fn cyclic(
        element: ElementKind,
        name: impl Into<String>,
        span: Span,
        origin: ElementRef,
    ) -> Rc<Self> {
        let name = name.into();
        let message = match element {
            ElementKind::EntityContainer => {
                format!("the extends chain of entity container '{name}' forms a cycle")
            }
            _ => format!("the base type chain of {} '{}' forms a cycle", element.display(), name),
        };
        let error = EdmError::new(element.cyclic_code(), span, message);
        Rc::new(Self {
            kind: PlaceholderKind::Cyclic,
            element,
            name,
            span,
            errors: vec![error],
            cycle_origin: Some(origin),
        })
    }

    pub fn bad(
        element: ElementKind,
        name: impl Into<String>,
        errors: Vec<EdmError>,
        span: Span,
    ) -> Rc<Self> {
        debug_assert!(!errors.is_empty(), "a bad placeholder must carry errors");
        Rc::new(Self {
            kind: PlaceholderKind::Bad,
            element,
            name: name.into(),
            span,
            errors,
            cycle_origin: None,
        })
    }

    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    pub fn element(&self) -> ElementKind {
        self.element
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn cycle_origin(&self) -> Option<ElementRef> {
        self.cycle_origin
    }
}

/// Uniform access to the diagnostics a value carries.
pub trait Checkable {
    fn errors(&self) -> &[EdmError];

    fn is_bad(&self) -> bool {
        !self.errors().is_empty()
    }
}

impl Checkable for Placeholder {
    fn errors(&self) -> &[EdmError] {
        &self.errors
    }
}

/// Outcome of resolving a reference to an element of the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved<Id> {
    Element(Id),
    Placeholder(Rc<Placeholder>),
}

impl<Id: Copy> Resolved<Id> {
    pub fn element(&self) -> Option<Id> {
        match self {
            Resolved::Element(id) => Some(*id),
            Resolved::Placeholder(_) => None,
        }
    }

    pub fn placeholder(&self) -> Option<&Rc<Placeholder>> {
        match self {
            Resolved::Element(_) => None,
            Resolved::Placeholder(p) => Some(p),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.placeholder_kind() == Some(PlaceholderKind::Unresolved)
    }

    pub fn is_cyclic(&self) -> bool {
        self.placeholder_kind() == Some(PlaceholderKind::Cyclic)
    }

    pub fn is_bad_element(&self) -> bool {
        self.placeholder_kind() == Some(PlaceholderKind::Bad)
    }

    fn placeholder_kind(&self) -> Option<PlaceholderKind> {
        self.placeholder().map(|p| p.kind())
    }
}

impl<Id> Checkable for Resolved<Id> {
    fn errors(&self) -> &[EdmError] {
        match self {
            Resolved::Element(_) => &[],
            Resolved::Placeholder(p) => p.errors(),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            PlaceholderKind::Unresolved => "unresolved",
            PlaceholderKind::Cyclic => "cyclic",
            PlaceholderKind::Bad => "bad",
        };
        write!(f, "<{tag} {} '{}'>", self.element.display(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TypeId;
    use edm_ast::no_span;

    #[test]
    fn unresolved_carries_one_error() {
        let p = Placeholder::unresolved(ElementKind::EntityType, "Ns.Missing", no_span());
        assert_eq!(p.errors().len(), 1);
        assert_eq!(p.errors()[0].code, EdmErrorCode::UnresolvedType);
        assert!(p.errors()[0].message.contains("Ns.Missing"));
    }

    #[test]
    fn ordinary_values_have_no_errors() {
        let r: Resolved<TypeId> = Resolved::Element(TypeId(3));
        assert!(!r.is_bad());
        assert!(!r.is_cyclic());
        assert_eq!(r.element(), Some(TypeId(3)));
    }

    #[test]
    fn cyclic_container_uses_container_code() {
        let p = Placeholder::cyclic(
            ElementKind::EntityContainer,
            "Ns.C",
            no_span(),
            ElementRef::Container(crate::ids::ContainerId(0)),
        );
        let r: Resolved<TypeId> = Resolved::Placeholder(p);
        assert!(r.is_cyclic());
        assert_eq!(r.errors()[0].code, EdmErrorCode::CyclicEntityContainer);
    }
}
