#![forbid(unsafe_code)]

use std::collections::HashSet;

use crate::error::{EdmError, EdmErrorCode};
use crate::ids::{FunctionId, TermId};
use crate::model::Model;
use crate::resolve::facet_errors;
use crate::types::TypeRef;

impl Model {
    pub fn function_return_type(&self, id: FunctionId) -> Option<TypeRef> {
        let f = self.function(id);
        f.return_type.get(|| {
            f.return_type_expr
                .as_ref()
                .map(|t| self.resolve_type_expr(f.schema, t))
        })
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn function_parameter_type(&self, id: FunctionId, index: usize) -> TypeRef {
        let f = self.function(id);
        let p = &f.parameters[index];
        p.ty.get(|| self.resolve_type_expr(f.schema, &p.type_expr))
    }

    pub fn function_errors(&self, id: FunctionId) -> Vec<EdmError> {
        let f = self.function(id);
        let mut errors = Vec::new();
        let mut names = HashSet::new();
        for (index, p) in f.parameters.iter().enumerate() {
            if !names.insert(p.name.as_str()) {
                errors.push(EdmError::new(
                    EdmErrorCode::DuplicateElement,
                    p.span,
                    format!("parameter '{}' is already defined on '{}'", p.name, f.common.name),
                ));
            }
            let ty = self.function_parameter_type(id, index);
            errors.extend(ty.errors());
            errors.extend(facet_errors(&ty, &p.type_expr));
        }
        if let (Some(ty), Some(expr)) = (self.function_return_type(id), &f.return_type_expr) {
            errors.extend(ty.errors());
            errors.extend(facet_errors(&ty, expr));
        }
        errors
    }

    pub fn term_type(&self, id: TermId) -> TypeRef {
        let t = self.term(id);
        t.ty.get(|| self.resolve_type_expr(t.schema, &t.type_expr))
    }

    pub fn term_errors(&self, id: TermId) -> Vec<EdmError> {
        let ty = self.term_type(id);
        let mut errors = ty.errors();
        errors.extend(facet_errors(&ty, &self.term(id).type_expr));
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeKind};
    use edm_ast::{Document, FunctionDecl, SchemaDecl, TypeExpr, ValueTermDecl};

    #[test]
    fn parameters_and_return_types_resolve() {
        let m = Model::new(Document::new().with_schema(
            SchemaDecl::new("Ns")
                .with_item(
                    FunctionDecl::new("Scale")
                        .with_parameter("x", TypeExpr::named("Edm.Double"))
                        .with_parameter("x", TypeExpr::named("Missing"))
                        .returning(TypeExpr::collection(TypeExpr::named("Edm.Double"))),
                )
                .with_item(FunctionDecl::new("Scale"))
                .with_item(ValueTermDecl::new("Title", TypeExpr::named("Edm.String"))),
        ));
        let overloads = m.find_functions("Ns.Scale");
        assert_eq!(overloads.len(), 2);
        let f = overloads[0];
        assert_eq!(
            m.function_parameter_type(f, 0).primitive_kind(),
            Some(PrimitiveKind::Double)
        );
        assert_eq!(m.function_return_type(f).map(|t| t.kind()), Some(TypeKind::Collection));
        let codes: Vec<_> = m.function_errors(f).iter().map(|e| e.code).collect();
        assert_eq!(codes, [EdmErrorCode::DuplicateElement, EdmErrorCode::UnresolvedType]);

        let term = m.find_value_term("Ns.Title").unwrap();
        assert_eq!(m.term_type(term).primitive_kind(), Some(PrimitiveKind::String));
        assert!(m.term_errors(term).is_empty());
    }
}
