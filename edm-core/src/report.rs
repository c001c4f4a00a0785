#![forbid(unsafe_code)]

use edm_ast::Span;
use serde::Serialize;

use crate::error::EdmError;
use crate::model::Model;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanRange {
    pub offset: usize,
    pub len: usize,
}

impl From<Span> for SpanRange {
    fn from(s: Span) -> Self {
        Self {
            offset: s.offset(),
            len: s.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub code: &'static str,
    pub message: String,
    pub span: SpanRange,
}

impl From<&EdmError> for DiagnosticEntry {
    fn from(e: &EdmError) -> Self {
        Self {
            code: e.code.as_str(),
            message: e.message.clone(),
            span: e.span.into(),
        }
    }
}

/// Machine-readable summary of a model's diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub schema: &'static str,
    pub ok: bool,
    pub namespaces: Vec<String>,
    pub error_count: usize,
    pub diagnostics: Vec<DiagnosticEntry>,
}

impl ModelReport {
    pub fn from_model(model: &Model) -> Self {
        let errors = model.errors();
        Self {
            schema: "edm-model-report/v1",
            ok: errors.is_empty(),
            namespaces: model
                .schema_ids()
                .map(|s| model.schema(s).namespace.clone())
                .collect(),
            error_count: errors.len(),
            diagnostics: errors.iter().map(DiagnosticEntry::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_ast::{Document, EntityTypeDecl, SchemaDecl, span};

    #[test]
    fn report_lists_codes_and_spans() {
        let doc = Document::new().with_schema(
            SchemaDecl::new("Ns").with_item(EntityTypeDecl::new("Lonely").at(span(12, 6))),
        );
        let report = ModelReport::from_model(&Model::new(doc));
        assert!(!report.ok);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.diagnostics[0].code, "key_missing");
        assert_eq!(report.diagnostics[0].span, SpanRange { offset: 12, len: 6 });

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["ok"], serde_json::Value::Bool(false));
        assert_eq!(json["namespaces"][0], "Ns");
        assert_eq!(json["diagnostics"][0]["span"]["offset"], 12);
    }
}
