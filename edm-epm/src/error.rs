#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fmt;

use edm_ast::Span;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EpmErrorKind {
    EmptySegment,
    AttributeInMiddle,
    DuplicateTarget,
    MixedContent,
    UnknownSyndicationItem,
    MissingNamespaceUri,
    InvalidContentKind,
    MissingSourcePath,
    InvalidSourcePath,
}

impl EpmErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpmErrorKind::EmptySegment => "empty_segment",
            EpmErrorKind::AttributeInMiddle => "attribute_in_middle",
            EpmErrorKind::DuplicateTarget => "duplicate_target",
            EpmErrorKind::MixedContent => "mixed_content",
            EpmErrorKind::UnknownSyndicationItem => "unknown_syndication_item",
            EpmErrorKind::MissingNamespaceUri => "missing_namespace_uri",
            EpmErrorKind::InvalidContentKind => "invalid_content_kind",
            EpmErrorKind::MissingSourcePath => "missing_source_path",
            EpmErrorKind::InvalidSourcePath => "invalid_source_path",
        }
    }
}

impl fmt::Display for EpmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed mapping declaration or a mapping the target tree rejects.
#[derive(Clone, Debug, Error, Diagnostic, PartialEq, Eq)]
#[error("mapping error: {message}")]
#[diagnostic(code(edm::epm))]
#[allow(unused_assignments)]
pub struct EpmError {
    pub kind: EpmErrorKind,
    pub message: String,
    #[label]
    pub span: Span,
}

impl EpmError {
    pub fn new(kind: EpmErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}
