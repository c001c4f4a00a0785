#![forbid(unsafe_code)]

//! Mapping declarations and their resolution against the model.

use edm_ast::{FeedMappingDecl, Span};
use edm_core::{ElementRef, Model, PropertyId, TypeDefinition, TypeId, TypeKind};

use crate::error::{EpmError, EpmErrorKind};
use crate::syndication::{SyndicationItemProperty, TextContentKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingTarget {
    Syndication {
        item: SyndicationItemProperty,
        content_kind: TextContentKind,
    },
    Custom {
        target_path: String,
        ns_prefix: Option<String>,
        ns_uri: String,
    },
}

/// A validated mapping declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityPropertyMappingAttribute {
    /// Slash-separated property path, relative to the entity type.
    pub source_path: String,
    pub target: MappingTarget,
    pub keep_in_content: bool,
    pub span: Span,
}

impl EntityPropertyMappingAttribute {
    pub fn new(
        source_path: impl Into<String>,
        target: MappingTarget,
        keep_in_content: bool,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target,
            keep_in_content,
            span: edm_ast::no_span(),
        }
    }

    /// Validates a declaration. `property` is the declaring property of a
    /// property-level mapping; its name prefixes the declared source path.
    pub fn from_decl(decl: &FeedMappingDecl, property: Option<&str>) -> Result<Self, EpmError> {
        let source_path = match (property, decl.source_path.as_deref()) {
            (Some(p), Some(rest)) => format!("{p}/{rest}"),
            (Some(p), None) => p.to_owned(),
            (None, Some(path)) => path.to_owned(),
            (None, None) => {
                return Err(EpmError::new(
                    EpmErrorKind::MissingSourcePath,
                    decl.span,
                    format!("type-level mapping to '{}' needs a source path", decl.target_path),
                ));
            }
        };

        let target = match &decl.ns_uri {
            Some(uri) => {
                if decl.content_kind.is_some() {
                    return Err(EpmError::new(
                        EpmErrorKind::InvalidContentKind,
                        decl.span,
                        format!(
                            "custom mapping to '{}' cannot set a content kind",
                            decl.target_path
                        ),
                    ));
                }
                MappingTarget::Custom {
                    target_path: decl.target_path.clone(),
                    ns_prefix: decl.ns_prefix.clone(),
                    ns_uri: uri.clone(),
                }
            }
            None => {
                let item = SyndicationItemProperty::from_name(&decl.target_path).ok_or_else(|| {
                    let kind = if decl.ns_prefix.is_some() {
                        EpmErrorKind::MissingNamespaceUri
                    } else {
                        EpmErrorKind::UnknownSyndicationItem
                    };
                    EpmError::new(
                        kind,
                        decl.span,
                        format!(
                            "'{}' is not a syndication item and no namespace URI is given",
                            decl.target_path
                        ),
                    )
                })?;
                let content_kind = match decl.content_kind.as_deref() {
                    None => TextContentKind::default(),
                    Some(name) => TextContentKind::from_name(name)
                        .filter(|_| item.is_text_construct())
                        .ok_or_else(|| {
                            EpmError::new(
                                EpmErrorKind::InvalidContentKind,
                                decl.span,
                                format!("content kind '{name}' is not valid for '{}'", item.name()),
                            )
                        })?,
                };
                MappingTarget::Syndication { item, content_kind }
            }
        };

        Ok(Self {
            source_path,
            target,
            keep_in_content: decl.keep_in_content,
            span: decl.span,
        })
    }

    pub fn is_syndication(&self) -> bool {
        matches!(self.target, MappingTarget::Syndication { .. })
    }

    /// Slash-separated path in the target tree; `@` marks an attribute.
    pub fn target_path(&self) -> &str {
        match &self.target {
            MappingTarget::Syndication { item, .. } => item.target_path(),
            MappingTarget::Custom { target_path, .. } => target_path,
        }
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        match &self.target {
            MappingTarget::Syndication { .. } => None,
            MappingTarget::Custom { ns_uri, .. } => Some(ns_uri),
        }
    }

    pub fn namespace_prefix(&self) -> Option<&str> {
        match &self.target {
            MappingTarget::Syndication { .. } => None,
            MappingTarget::Custom { ns_prefix, .. } => ns_prefix.as_deref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcePathSegment {
    pub name: String,
    pub property: PropertyId,
}

/// A mapping together with where it was declared and which type it reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityPropertyMappingInfo {
    attribute: EntityPropertyMappingAttribute,
    defining_type: TypeId,
    actual_type: TypeId,
    source_path: Option<Vec<SourcePathSegment>>,
}

impl EntityPropertyMappingInfo {
    pub fn new(
        attribute: EntityPropertyMappingAttribute,
        defining_type: TypeId,
        actual_type: TypeId,
    ) -> Self {
        Self {
            attribute,
            defining_type,
            actual_type,
            source_path: None,
        }
    }

    pub fn attribute(&self) -> &EntityPropertyMappingAttribute {
        &self.attribute
    }

    /// Type whose declaration carries the mapping.
    pub fn defining_type(&self) -> TypeId {
        self.defining_type
    }

    /// Type whose instances the value is read from; a descendant of the
    /// defining type when the mapping is inherited.
    pub fn actual_type(&self) -> TypeId {
        self.actual_type
    }

    pub fn is_syndication_mapping(&self) -> bool {
        self.attribute.is_syndication()
    }

    /// # Panics
    ///
    /// Panics if [`resolve_source_path`](Self::resolve_source_path) has not
    /// succeeded yet.
    pub fn source_path(&self) -> &[SourcePathSegment] {
        self.source_path.as_deref().unwrap_or_else(|| {
            panic!("source path '{}' is not resolved", self.attribute.source_path)
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.source_path.is_some()
    }

    /// Resolves the source path against the actual type: every segment but
    /// the last names a complex property, the last a primitive one, and no
    /// segment may be a collection.
    pub fn resolve_source_path(&mut self, model: &Model) -> Result<(), EpmError> {
        let path = self.attribute.source_path.clone();
        let fail = |reason: String| {
            Err(EpmError::new(
                EpmErrorKind::InvalidSourcePath,
                self.attribute.span,
                format!("source path '{path}': {reason}"),
            ))
        };
        let names: Vec<&str> = path.split('/').collect();
        if names.iter().any(|n| n.is_empty()) {
            return fail("empty segment".to_owned());
        }

        let mut current = self.actual_type;
        let mut segments = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            let last = index + 1 == names.len();
            let Some(property) = model.find_property(current, name) else {
                return fail(format!(
                    "'{}' has no property '{name}'",
                    model.full_name(ElementRef::Type(current))
                ));
            };
            if model.property(property).is_navigation() {
                return fail(format!("'{name}' is a navigation property"));
            }
            let ty = model.property_type(property);
            match (ty.kind(), &ty.definition, last) {
                (TypeKind::Primitive, _, true) => {}
                (TypeKind::Complex, TypeDefinition::Complex(r), false) => match r.element() {
                    Some(next) => current = next,
                    None => return fail(format!("type of '{name}' is unresolved")),
                },
                (TypeKind::Collection, _, _) => {
                    return fail(format!("'{name}' is a collection"));
                }
                (_, _, true) => return fail(format!("'{name}' is not a primitive property")),
                (_, _, false) => return fail(format!("'{name}' is not a complex property")),
            }
            segments.push(SourcePathSegment {
                name: (*name).to_owned(),
                property,
            });
        }
        self.source_path = Some(segments);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_ast::{
        ComplexTypeDecl, Document, EntityTypeDecl, PropertyDecl, SchemaDecl, TypeExpr,
    };

    fn model() -> Model {
        Model::new(
            Document::new().with_schema(
                SchemaDecl::new("Ns")
                    .with_item(
                        ComplexTypeDecl::new("Address")
                            .with_property(PropertyDecl::new(
                                "City",
                                TypeExpr::named("Edm.String"),
                            )),
                    )
                    .with_item(
                        EntityTypeDecl::new("Person")
                            .with_key(&["Id"])
                            .with_property(PropertyDecl::new(
                                "Id",
                                TypeExpr::named("Edm.Int32").not_null(),
                            ))
                            .with_property(PropertyDecl::new("Home", TypeExpr::named("Address")))
                            .with_property(PropertyDecl::new(
                                "Tags",
                                TypeExpr::collection(TypeExpr::named("Edm.String")),
                            )),
                    ),
            ),
        )
    }

    fn info(m: &Model, source: &str) -> EntityPropertyMappingInfo {
        let person = m.find_type("Ns.Person").unwrap();
        let attribute = EntityPropertyMappingAttribute::new(
            source,
            MappingTarget::Syndication {
                item: SyndicationItemProperty::Title,
                content_kind: TextContentKind::Plaintext,
            },
            true,
        );
        EntityPropertyMappingInfo::new(attribute, person, person)
    }

    #[test]
    fn source_path_walks_complex_properties() {
        let m = model();
        let mut i = info(&m, "Home/City");
        i.resolve_source_path(&m).unwrap();
        let names: Vec<_> = i.source_path().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Home", "City"]);
    }

    #[test]
    fn source_path_rejects_collections_and_non_leaf_ends() {
        let m = model();
        for bad in ["Tags", "Home", "Id/City", "Nope", "Home//City"] {
            let err = info(&m, bad).resolve_source_path(&m).unwrap_err();
            assert_eq!(err.kind, EpmErrorKind::InvalidSourcePath, "{bad}");
        }
    }

    #[test]
    fn declarations_are_validated() {
        let title =
            FeedMappingDecl::syndication("SyndicationTitle", false).with_content_kind("html");
        let attr = EntityPropertyMappingAttribute::from_decl(&title, Some("Name")).unwrap();
        assert_eq!(attr.source_path, "Name");
        assert_eq!(attr.target_path(), "title");
        assert!(!attr.keep_in_content);

        let bad_kind =
            FeedMappingDecl::syndication("SyndicationUpdated", true).with_content_kind("html");
        assert_eq!(
            EntityPropertyMappingAttribute::from_decl(&bad_kind, Some("When")).unwrap_err().kind,
            EpmErrorKind::InvalidContentKind
        );

        let unknown = FeedMappingDecl::syndication("SyndicationNope", true);
        assert_eq!(
            EntityPropertyMappingAttribute::from_decl(&unknown, Some("X")).unwrap_err().kind,
            EpmErrorKind::UnknownSyndicationItem
        );

        let custom = FeedMappingDecl::custom("item/@id", "c", "urn:c", true);
        assert_eq!(
            EntityPropertyMappingAttribute::from_decl(&custom, None).unwrap_err().kind,
            EpmErrorKind::MissingSourcePath
        );
        let custom = custom.with_source("Id");
        let attr = EntityPropertyMappingAttribute::from_decl(&custom, None).unwrap();
        assert_eq!(attr.namespace_uri(), Some("urn:c"));
        assert_eq!(attr.namespace_prefix(), Some("c"));
    }
}
