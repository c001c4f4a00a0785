#![forbid(unsafe_code)]

//! Model-wide diagnostics walk.

use tracing::debug;

use crate::error::EdmError;
use crate::ids::ElementRef;
use crate::model::Model;
use crate::placeholder::Checkable;

impl Model {
    /// Diagnostics owned by one element, not including those of the elements
    /// it contains or its annotations.
    pub fn errors_of(&self, element: ElementRef) -> Vec<EdmError> {
        match element {
            ElementRef::Schema(id) => self.schema(id).errors.clone(),
            ElementRef::Type(id) => self.type_errors(id).to_vec(),
            ElementRef::Property(id) => self.property_errors(id).to_vec(),
            ElementRef::Association(id) => self.association_errors(id).to_vec(),
            ElementRef::Function(id) => self.function_errors(id),
            ElementRef::Term(id) => self.term_errors(id),
            ElementRef::Container(id) => self.container_errors(id).to_vec(),
            ElementRef::EntitySet(id) => self.entity_set_type(id).errors().to_vec(),
            ElementRef::AssociationSet(id) => self.association_set_errors(id).to_vec(),
            ElementRef::FunctionImport(id) => self.function_import_errors(id),
        }
    }

    /// Every element in declaration order: each schema, then its types with
    /// their properties, associations, functions, terms and containers with
    /// their members.
    pub fn elements(&self) -> Vec<ElementRef> {
        let mut out = Vec::new();
        for schema_id in self.schema_ids() {
            out.push(ElementRef::Schema(schema_id));
            let schema = self.schema(schema_id);
            for t in &schema.types {
                out.push(ElementRef::Type(*t));
                if let Some(s) = self.schema_type(*t).as_structured() {
                    out.extend(s.declared_properties.iter().map(|p| ElementRef::Property(*p)));
                }
            }
            out.extend(schema.associations.iter().map(|a| ElementRef::Association(*a)));
            out.extend(schema.functions.iter().map(|f| ElementRef::Function(*f)));
            out.extend(schema.terms.iter().map(|t| ElementRef::Term(*t)));
            for c in &schema.containers {
                out.push(ElementRef::Container(*c));
                let container = self.container(*c);
                out.extend(container.entity_sets.iter().map(|s| ElementRef::EntitySet(*s)));
                out.extend(
                    container
                        .association_sets
                        .iter()
                        .map(|s| ElementRef::AssociationSet(*s)),
                );
                out.extend(
                    container
                        .function_imports
                        .iter()
                        .map(|f| ElementRef::FunctionImport(*f)),
                );
            }
        }
        out
    }

    /// Every diagnostic in the model: elements first, then annotations.
    /// Truncated to `validation.max_errors` when that is non-zero.
    pub fn errors(&self) -> Vec<EdmError> {
        let limit = match self.config().validation.max_errors {
            0 => usize::MAX,
            n => n,
        };
        let mut out = Vec::new();
        let element_errors = self.elements().into_iter().flat_map(|e| self.errors_of(e));
        let annotation_errors = self
            .annotation_ids()
            .flat_map(|a| self.annotation_errors(a).to_vec());
        for error in element_errors.chain(annotation_errors) {
            if out.len() == limit {
                debug!(limit, "diagnostic limit reached");
                break;
            }
            out.push(error);
        }
        out
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdmConfig;
    use crate::error::EdmErrorCode;
    use edm_ast::{Document, EntityTypeDecl, SchemaDecl};

    fn doc() -> Document {
        Document::new().with_schema(
            SchemaDecl::new("Ns")
                .with_item(EntityTypeDecl::new("A"))
                .with_item(EntityTypeDecl::new("A"))
                .with_item(EntityTypeDecl::new("B").with_base("Missing")),
        )
    }

    #[test]
    fn walk_collects_schema_and_type_errors() {
        let m = Model::new(doc());
        let codes: Vec<_> = m.errors().iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            [
                EdmErrorCode::DuplicateElement,
                EdmErrorCode::KeyMissing,
                EdmErrorCode::KeyMissing,
                EdmErrorCode::UnresolvedType,
            ]
        );
        assert!(!m.is_valid());
    }

    #[test]
    fn walk_honours_the_error_cap() {
        let mut config = EdmConfig::default();
        config.validation.max_errors = 2;
        config.validation.require_entity_keys = false;
        let m = Model::with_config(doc(), config);
        let codes: Vec<_> = m.errors().iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            [EdmErrorCode::DuplicateElement, EdmErrorCode::UnresolvedType]
        );
    }
}
