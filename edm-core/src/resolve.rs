#![forbid(unsafe_code)]

//! Name resolution and type expression lowering.

use std::collections::HashMap;

use edm_ast::{FacetDecls, QualifiedName, TypeExpr, TypeExprKind};
use tracing::trace;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{SchemaId, TypeId};
use crate::model::{Model, Schema, SchemaTypeKind, StructuredKind, qualify};
use crate::placeholder::{ElementKind, Placeholder, Resolved};
use crate::types::{FacetFamily, PrimitiveFacets, PrimitiveKind, RowColumn, TypeDefinition, TypeRef};

impl Schema {
    /// Namespaces bound to `alias` in this schema, own alias first.
    pub fn namespaces_for_alias<'a>(
        &'a self,
        alias: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let own = (self.alias.as_deref() == Some(alias)).then_some(self.namespace.as_str());
        own.into_iter().chain(
            self.usings
                .iter()
                .filter(move |u| u.alias.as_deref() == Some(alias))
                .map(|u| u.namespace.as_str()),
        )
    }
}

impl Model {
    /// Full names `name` may stand for when written inside `schema`, in the
    /// order they are tried: verbatim, then namespace-prefixed for simple
    /// names or alias-expanded for qualified ones.
    pub fn candidate_names(&self, schema: SchemaId, name: &str) -> Vec<String> {
        let s = self.schema(schema);
        let mut out = vec![name.to_owned()];
        match name.split_once('.') {
            None => out.push(qualify(&s.namespace, name)),
            Some((head, rest)) => {
                out.extend(s.namespaces_for_alias(head).map(|ns| qualify(ns, rest)));
            }
        }
        out
    }

    fn lookup<Id: Copy>(
        &self,
        table: impl Fn(&str) -> Option<Id>,
        schema: SchemaId,
        name: &str,
    ) -> Option<Id> {
        let found = self
            .candidate_names(schema, name)
            .iter()
            .find_map(|candidate| table(candidate));
        if found.is_none() {
            trace!(name, "name did not resolve");
        }
        found
    }

    pub fn resolve_type_name(&self, schema: SchemaId, name: &str) -> Option<TypeId> {
        self.lookup(|n| self.find_type(n), schema, name)
    }

    pub fn resolve_association_name(
        &self,
        schema: SchemaId,
        name: &str,
    ) -> Option<crate::ids::AssociationId> {
        self.lookup(|n| self.find_association(n), schema, name)
    }

    pub fn resolve_term_name(&self, schema: SchemaId, name: &str) -> Option<crate::ids::TermId> {
        self.lookup(|n| self.find_value_term(n), schema, name)
    }

    pub fn resolve_container_name(
        &self,
        schema: SchemaId,
        name: &str,
    ) -> Option<crate::ids::ContainerId> {
        self.lookup(|n| self.find_entity_container(n), schema, name)
    }

    pub fn resolve_primitive_name(&self, schema: SchemaId, name: &str) -> Option<PrimitiveKind> {
        self.lookup(PrimitiveKind::from_qualified_name, schema, name)
    }

    /// Resolves `name` to a structured type of the requested kind; a type of
    /// any other kind counts as unresolved.
    pub(crate) fn resolve_structured(
        &self,
        schema: SchemaId,
        name: &QualifiedName,
        kind: StructuredKind,
    ) -> Resolved<TypeId> {
        match self.resolve_type_name(schema, &name.node) {
            Some(id)
                if self
                    .schema_type(id)
                    .as_structured()
                    .is_some_and(|s| s.kind == kind) =>
            {
                Resolved::Element(id)
            }
            _ => {
                let element = match kind {
                    StructuredKind::Entity => ElementKind::EntityType,
                    StructuredKind::Complex => ElementKind::ComplexType,
                };
                Resolved::Placeholder(Placeholder::unresolved(element, &name.node, name.span))
            }
        }
    }

    /// Lowers a type expression written inside `schema` to a [`TypeRef`].
    pub fn resolve_type_expr(&self, schema: SchemaId, expr: &TypeExpr) -> TypeRef {
        let definition = match &expr.kind {
            TypeExprKind::Named { name, facets } => self.resolve_named(schema, name, facets),
            TypeExprKind::Collection(element) => {
                return TypeRef::collection(self.resolve_type_expr(schema, element), expr.nullable);
            }
            TypeExprKind::EntityReference(name) => TypeDefinition::EntityReference(
                self.resolve_structured(schema, name, StructuredKind::Entity),
            ),
            TypeExprKind::Row(columns) => TypeDefinition::Row(
                columns
                    .iter()
                    .map(|c| RowColumn {
                        name: c.name.node.clone(),
                        ty: self.resolve_type_expr(schema, &c.ty),
                    })
                    .collect(),
            ),
        };
        TypeRef {
            definition,
            nullable: expr.nullable,
        }
    }

    fn resolve_named(
        &self,
        schema: SchemaId,
        name: &QualifiedName,
        facets: &FacetDecls,
    ) -> TypeDefinition {
        if let Some(kind) = self.resolve_primitive_name(schema, &name.node) {
            return TypeDefinition::Primitive {
                kind,
                facets: PrimitiveFacets::from_decls(kind, facets),
            };
        }
        match self.resolve_type_name(schema, &name.node) {
            Some(id) => match &self.schema_type(id).kind {
                SchemaTypeKind::Structured(s) => match s.kind {
                    StructuredKind::Entity => TypeDefinition::Entity(Resolved::Element(id)),
                    StructuredKind::Complex => TypeDefinition::Complex(Resolved::Element(id)),
                },
                SchemaTypeKind::Enum(_) => TypeDefinition::Enum(Resolved::Element(id)),
            },
            None => TypeDefinition::None(Placeholder::unresolved(
                ElementKind::Type,
                &name.node,
                name.span,
            )),
        }
    }

    /// Canonical full name of an out-of-line annotation target written
    /// inside `schema` (`Person/Name` becomes `Ns.Person/Name`).
    pub(crate) fn canonical_target(&self, schema: SchemaId, target: &str) -> String {
        let (head, tail) = match target.split_once('/') {
            Some((head, tail)) => (head, Some(tail)),
            None => (target, None),
        };
        let s = self.schema(schema);
        let head = match head.split_once('.') {
            None if head == s.namespace => head.to_owned(),
            None => qualify(&s.namespace, head),
            Some((alias, rest)) => match s.namespaces_for_alias(alias).next() {
                Some(ns) => qualify(ns, rest),
                None => head.to_owned(),
            },
        };
        match tail {
            Some(tail) => format!("{head}/{tail}"),
            None => head,
        }
    }
}

/// Facet errors of a resolved type against the facets written for it.
pub(crate) fn facet_errors(ty: &TypeRef, expr: &TypeExpr) -> Vec<EdmError> {
    let mut out = Vec::new();
    collect_facet_errors(ty, expr, &mut out);
    out
}

fn collect_facet_errors(ty: &TypeRef, expr: &TypeExpr, out: &mut Vec<EdmError>) {
    match (&expr.kind, &ty.definition) {
        (TypeExprKind::Collection(inner), TypeDefinition::Collection { element, .. }) => {
            collect_facet_errors(element, inner, out);
        }
        (TypeExprKind::Row(decls), TypeDefinition::Row(columns)) => {
            for (decl, column) in decls.iter().zip(columns) {
                collect_facet_errors(&column.ty, &decl.ty, out);
            }
        }
        (TypeExprKind::Named { name, facets }, definition) => {
            let family = match definition {
                TypeDefinition::Primitive { kind, .. } => kind.facet_family(),
                TypeDefinition::None(_) => return,
                _ => FacetFamily::None,
            };
            for facet in misplaced_facets(facets, family) {
                out.push(EdmError::new(
                    EdmErrorCode::InvalidFacet,
                    expr.span,
                    format!("facet '{facet}' does not apply to type '{}'", name.node),
                ));
            }
            if let (Some(precision), Some(scale)) = (facets.precision, facets.scale) {
                if scale > precision {
                    out.push(EdmError::new(
                        EdmErrorCode::InvalidFacet,
                        expr.span,
                        format!("scale {scale} exceeds precision {precision}"),
                    ));
                }
            }
        }
        _ => {}
    }
}

fn misplaced_facets(facets: &FacetDecls, family: FacetFamily) -> Vec<&'static str> {
    let allowed: HashMap<&'static str, bool> = HashMap::from([
        ("MaxLength", matches!(family, FacetFamily::String | FacetFamily::Binary)),
        ("FixedLength", matches!(family, FacetFamily::String | FacetFamily::Binary)),
        ("Unicode", family == FacetFamily::String),
        ("Collation", family == FacetFamily::String),
        ("Precision", matches!(family, FacetFamily::Decimal | FacetFamily::Temporal)),
        ("Scale", family == FacetFamily::Decimal),
        ("SRID", family == FacetFamily::Spatial),
    ]);
    let present = [
        ("MaxLength", facets.max_length.is_some()),
        ("FixedLength", facets.fixed_length.is_some()),
        ("Unicode", facets.unicode.is_some()),
        ("Collation", facets.collation.is_some()),
        ("Precision", facets.precision.is_some()),
        ("Scale", facets.scale.is_some()),
        ("SRID", facets.srid.is_some()),
    ];
    present
        .into_iter()
        .filter(|(name, set)| *set && !allowed[name])
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_ast::{Document, EntityTypeDecl, PropertyDecl, SchemaDecl};

    fn model() -> Model {
        let doc = Document::new()
            .with_schema(
                SchemaDecl::new("Org.Data")
                    .with_alias("Self")
                    .with_item(EntityTypeDecl::new("Person").with_key(&["Id"]).with_property(
                        PropertyDecl::new("Id", TypeExpr::named("Edm.Int32").not_null()),
                    )),
            )
            .with_schema(
                SchemaDecl::new("Org.Other")
                    .with_using("Org.Data", Some("D"))
                    .with_item(EntityTypeDecl::new("Thing")),
            );
        Model::new(doc)
    }

    #[test]
    fn resolves_simple_aliased_and_full_names() {
        let m = model();
        let data = SchemaId(0);
        let other = SchemaId(1);
        let person = m.find_type("Org.Data.Person").unwrap();
        assert_eq!(m.resolve_type_name(data, "Person"), Some(person));
        assert_eq!(m.resolve_type_name(data, "Self.Person"), Some(person));
        assert_eq!(m.resolve_type_name(other, "D.Person"), Some(person));
        assert_eq!(m.resolve_type_name(other, "Org.Data.Person"), Some(person));
        assert_eq!(m.resolve_type_name(other, "Person"), None);
    }

    #[test]
    fn unknown_named_type_has_no_kind() {
        let m = model();
        let ty = m.resolve_type_expr(SchemaId(0), &TypeExpr::named("Missing"));
        assert!(matches!(ty.definition, TypeDefinition::None(_)));
        assert_eq!(ty.errors()[0].code, EdmErrorCode::UnresolvedType);
    }

    #[test]
    fn canonical_targets_expand_namespace_and_alias() {
        let m = model();
        assert_eq!(m.canonical_target(SchemaId(0), "Person/Id"), "Org.Data.Person/Id");
        assert_eq!(m.canonical_target(SchemaId(0), "Self.Person"), "Org.Data.Person");
        assert_eq!(m.canonical_target(SchemaId(1), "D.Person"), "Org.Data.Person");
        assert_eq!(m.canonical_target(SchemaId(1), "X.Y"), "X.Y");
    }

    #[test]
    fn facets_must_match_the_primitive_family() {
        let m = model();
        let expr = TypeExpr::named("Edm.Int32").with_facets(FacetDecls {
            max_length: Some(edm_ast::MaxLength::Value(10)),
            ..FacetDecls::default()
        });
        let ty = m.resolve_type_expr(SchemaId(0), &expr);
        let errors = facet_errors(&ty, &expr);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, EdmErrorCode::InvalidFacet);

        let expr = TypeExpr::named("Edm.Decimal").with_facets(FacetDecls {
            precision: Some(4),
            scale: Some(6),
            ..FacetDecls::default()
        });
        let ty = m.resolve_type_expr(SchemaId(0), &expr);
        assert_eq!(facet_errors(&ty, &expr).len(), 1);
    }
}
