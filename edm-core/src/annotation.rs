#![forbid(unsafe_code)]

//! Vocabulary annotations.
//!
//! An element's annotations are its inline ones followed by those declared
//! out of line against its full name. The value of an annotation is checked
//! against the type of the term it applies.

use std::rc::Rc;

use edm_ast::{Expr, ExprKind};

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{AnnotationId, ElementRef, SchemaId, TermId, TypeId};
use crate::model::Model;
use crate::placeholder::{Checkable, ElementKind, Placeholder, Resolved};
use crate::types::{PrimitiveKind, TypeDefinition, TypeRef};

impl Model {
    pub fn annotations_of(&self, element: ElementRef) -> Rc<[AnnotationId]> {
        let Some(common) = self.common(element) else {
            return Rc::from(self.out_of_line_annotations(&self.full_name(element)));
        };
        common.annotations.get(|| {
            let full_name = self.full_name(element);
            common
                .inline_annotations
                .iter()
                .chain(self.out_of_line_annotations(&full_name))
                .copied()
                .collect()
        })
    }

    pub fn annotation_term(&self, id: AnnotationId) -> Resolved<TermId> {
        let a = self.annotation(id);
        a.term.get(|| match self.resolve_term_name(a.schema, &a.term_name.node) {
            Some(t) => Resolved::Element(t),
            None => Resolved::Placeholder(Placeholder::unresolved(
                ElementKind::ValueTerm,
                &a.term_name.node,
                a.term_name.span,
            )),
        })
    }

    /// The annotation applying `term` with `qualifier` to `element`.
    pub fn find_annotation(
        &self,
        element: ElementRef,
        term: TermId,
        qualifier: Option<&str>,
    ) -> Option<AnnotationId> {
        self.annotations_of(element).iter().copied().find(|a| {
            self.annotation_term(*a).element() == Some(term)
                && self.annotation(*a).qualifier.as_deref() == qualifier
        })
    }

    pub fn annotation_errors(&self, id: AnnotationId) -> Rc<[EdmError]> {
        let a = self.annotation(id);
        a.errors.get(|| {
            let term = self.annotation_term(id);
            let mut errors = term.errors().to_vec();
            if let Resolved::Element(term) = term {
                self.check_value(a.schema, &a.value, &self.term_type(term), &mut errors);
            }
            errors.into()
        })
    }

    /// Readable name of a type reference for diagnostics.
    pub fn display_type(&self, ty: &TypeRef) -> String {
        let resolved = |r: &Resolved<TypeId>| match r {
            Resolved::Element(id) => self.full_name(ElementRef::Type(*id)),
            Resolved::Placeholder(p) => p.name().to_owned(),
        };
        match &ty.definition {
            TypeDefinition::Primitive { kind, .. } => kind.qualified_name(),
            TypeDefinition::Entity(r) | TypeDefinition::Complex(r) | TypeDefinition::Enum(r) => {
                resolved(r)
            }
            TypeDefinition::EntityReference(r) => format!("Ref({})", resolved(r)),
            TypeDefinition::Collection { element, .. } => {
                format!("Collection({})", self.display_type(element))
            }
            TypeDefinition::Row(_) => "Row".to_owned(),
            TypeDefinition::None(p) => p.name().to_owned(),
        }
    }

    fn check_value(
        &self,
        schema: SchemaId,
        expr: &Expr,
        expected: &TypeRef,
        out: &mut Vec<EdmError>,
    ) {
        let mismatch = |out: &mut Vec<EdmError>, detail: String| {
            out.push(EdmError::new(
                EdmErrorCode::AnnotationValueMismatch,
                expr.span,
                detail,
            ));
        };
        match (&expr.kind, &expected.definition) {
            // Unknown types were reported where they were written; paths are
            // evaluated against instances.
            (_, TypeDefinition::None(_))
            | (
                _,
                TypeDefinition::Entity(Resolved::Placeholder(_))
                | TypeDefinition::Complex(Resolved::Placeholder(_))
                | TypeDefinition::Enum(Resolved::Placeholder(_)),
            )
            | (ExprKind::Path(_), _) => {}
            (ExprKind::Null, _) => {
                if !expected.nullable {
                    mismatch(
                        out,
                        format!(
                            "null is not a value of non-nullable '{}'",
                            self.display_type(expected)
                        ),
                    );
                }
            }
            (ExprKind::Collection(items), TypeDefinition::Collection { element, .. }) => {
                for item in items {
                    self.check_value(schema, item, element, out);
                }
            }
            (
                ExprKind::Record { ty, fields },
                TypeDefinition::Entity(Resolved::Element(expected_id))
                | TypeDefinition::Complex(Resolved::Element(expected_id)),
            ) => {
                let record_type = match ty {
                    None => *expected_id,
                    Some(name) => match self.resolve_type_name(schema, &name.node) {
                        Some(t)
                            if self.schema_type(t).as_structured().is_some()
                                && self.is_structured_assignable_from(*expected_id, t) =>
                        {
                            t
                        }
                        _ => {
                            mismatch(
                                out,
                                format!(
                                    "record type '{}' is not assignable to '{}'",
                                    name.node,
                                    self.display_type(expected)
                                ),
                            );
                            return;
                        }
                    },
                };
                for (field, value) in fields {
                    match self.find_property(record_type, &field.node) {
                        Some(p) => self.check_value(schema, value, &self.property_type(p), out),
                        None => mismatch(
                            out,
                            format!(
                                "'{}' has no property '{}'",
                                self.full_name(ElementRef::Type(record_type)),
                                field.node
                            ),
                        ),
                    }
                }
            }
            (_, TypeDefinition::Entity(_) | TypeDefinition::Complex(_))
                if !matches!(expr.kind, ExprKind::Record { .. }) =>
            {
                mismatch(
                    out,
                    format!("expected a record of type '{}'", self.display_type(expected)),
                );
            }
            (ExprKind::Int(v), TypeDefinition::Enum(Resolved::Element(e))) => {
                let (min, max) = self
                    .enum_underlying_type(*e)
                    .integral_range()
                    .unwrap_or((i64::MIN, i64::MAX));
                if *v < min || *v > max {
                    mismatch(
                        out,
                        format!("{v} is out of range for '{}'", self.display_type(expected)),
                    );
                }
            }
            (ExprKind::String(s), TypeDefinition::Enum(Resolved::Element(e))) => {
                let enum_type = self.schema_type(*e).enum_type();
                let names: Vec<&str> = if enum_type.is_flags {
                    s.split([' ', ',']).filter(|n| !n.is_empty()).collect()
                } else {
                    vec![s.as_str()]
                };
                for name in names {
                    if !enum_type.members.iter().any(|m| m.name == name) {
                        mismatch(
                            out,
                            format!(
                                "'{name}' is not a member of '{}'",
                                self.display_type(expected)
                            ),
                        );
                    }
                }
            }
            (kind, TypeDefinition::Primitive { kind: primitive, .. }) => {
                if !literal_fits(kind, *primitive) {
                    mismatch(
                        out,
                        format!("value does not match type '{}'", primitive.qualified_name()),
                    );
                }
            }
            _ => mismatch(
                out,
                format!("value does not match type '{}'", self.display_type(expected)),
            ),
        }
    }
}

fn literal_fits(expr: &ExprKind, kind: PrimitiveKind) -> bool {
    use PrimitiveKind as P;
    match expr {
        ExprKind::Bool(_) => kind == P::Boolean,
        ExprKind::Int(v) => match kind.integral_range() {
            Some((min, max)) => (min..=max).contains(v),
            None => matches!(kind, P::Decimal | P::Double | P::Single),
        },
        ExprKind::Float(_) | ExprKind::Decimal(_) => {
            matches!(kind, P::Decimal | P::Double | P::Single)
        }
        ExprKind::String(_) => matches!(
            kind,
            P::String | P::DateTime | P::DateTimeOffset | P::Time
        ),
        ExprKind::Guid(_) => kind == P::Guid,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_ast::{
        AnnotationDecl, AnnotationsDecl, ComplexTypeDecl, Document, EntityTypeDecl, EnumTypeDecl,
        PropertyDecl, SchemaDecl, TypeExpr, ValueTermDecl, ident,
    };

    fn lit(kind: ExprKind) -> Expr {
        Expr::new(kind)
    }

    fn model(annotations: Vec<AnnotationDecl>) -> Model {
        let mut person = EntityTypeDecl::new("Person").with_key(&["Id"]).with_property(
            PropertyDecl::new("Id", TypeExpr::named("Edm.Int32").not_null()),
        );
        for a in annotations {
            person = person.with_annotation(a);
        }
        let vocabulary = SchemaDecl::new("Vocab")
            .with_item(ValueTermDecl::new("Title", TypeExpr::named("Edm.String").not_null()))
            .with_item(ValueTermDecl::new("Rank", TypeExpr::named("Edm.Byte")))
            .with_item(ValueTermDecl::new(
                "Tags",
                TypeExpr::collection(TypeExpr::named("Edm.String")),
            ))
            .with_item(ValueTermDecl::new("Mood", TypeExpr::named("Vocab.MoodKind")))
            .with_item(ValueTermDecl::new("Origin", TypeExpr::named("Vocab.Place")))
            .with_item(
                EnumTypeDecl::new("MoodKind")
                    .with_member("Happy", None)
                    .with_member("Sad", None),
            )
            .with_item(
                ComplexTypeDecl::new("Place")
                    .with_property(PropertyDecl::new("City", TypeExpr::named("Edm.String"))),
            );
        let data = SchemaDecl::new("Ns")
            .with_using("Vocab", Some("V"))
            .with_item(person)
            .with_item(
                AnnotationsDecl::new("Person").with_annotation(AnnotationDecl::new(
                    "V.Title",
                    lit(ExprKind::String("people".into())),
                )),
            );
        Model::new(Document::new().with_schema(vocabulary).with_schema(data))
    }

    fn person_annotation_codes(m: &Model) -> Vec<EdmErrorCode> {
        let person = m.find_type("Ns.Person").unwrap();
        m.annotations_of(ElementRef::Type(person))
            .iter()
            .flat_map(|a| m.annotation_errors(*a).to_vec())
            .map(|e| e.code)
            .collect()
    }

    #[test]
    fn inline_and_out_of_line_annotations_are_merged() {
        let m = model(vec![AnnotationDecl::new("V.Rank", lit(ExprKind::Int(3)))]);
        let person = ElementRef::Type(m.find_type("Ns.Person").unwrap());
        let annotations = m.annotations_of(person);
        assert_eq!(annotations.len(), 2);
        let title = m.find_value_term("Vocab.Title").unwrap();
        let found = m.find_annotation(person, title, None).unwrap();
        assert_eq!(found, annotations[1]);
        assert!(person_annotation_codes(&m).is_empty());
    }

    #[test]
    fn values_are_checked_against_term_types() {
        let m = model(vec![
            AnnotationDecl::new("V.Rank", lit(ExprKind::Int(512))),
            AnnotationDecl::new("V.Title", lit(ExprKind::Null)).with_qualifier("Short"),
            AnnotationDecl::new("V.Mood", lit(ExprKind::String("Angry".into()))),
            AnnotationDecl::new(
                "V.Tags",
                lit(ExprKind::Collection(vec![
                    lit(ExprKind::String("a".into())),
                    lit(ExprKind::Bool(true)),
                ])),
            ),
            AnnotationDecl::new(
                "V.Origin",
                lit(ExprKind::Record {
                    ty: None,
                    fields: vec![(ident("Country"), lit(ExprKind::String("NL".into())))],
                }),
            ),
            AnnotationDecl::new("V.Missing", lit(ExprKind::Bool(true))),
        ]);
        // Only the annotations are wrong; the declarations themselves are clean.
        for element in m.elements() {
            assert!(m.errors_of(element).is_empty(), "{element:?}");
        }
        assert_eq!(
            person_annotation_codes(&m),
            [
                EdmErrorCode::AnnotationValueMismatch,
                EdmErrorCode::AnnotationValueMismatch,
                EdmErrorCode::AnnotationValueMismatch,
                EdmErrorCode::AnnotationValueMismatch,
                EdmErrorCode::AnnotationValueMismatch,
                EdmErrorCode::UnresolvedTerm,
            ]
        );
    }
}
