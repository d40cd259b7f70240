use data::tokens::Span;
use thiserror::Error;

use crate::types::BaseKind;

/// The five error kinds from spec.md §7, each carrying the evidence needed
/// to print a useful message.
#[derive(Clone, Debug, Error)]
pub enum ParsingMessage {
    #[error("no \"main\" function found")]
    MissingEntryPoint,
    #[error("unresolved reference to \"{0}\"")]
    UnresolvedReference(String),
    #[error("could not infer a concrete type for \"{0}\"; evidence considered: {1}")]
    TypeInferenceFailure(String, String),
    #[error("conflicting type evidence for \"{0}\": first seen as {1}, then as {2}")]
    ConflictingTypeEvidence(String, BaseKind, BaseKind),
    #[error("method \"{0}\" was called on a non-struct value of type {1}")]
    MethodOnNonStruct(String, BaseKind),
    #[error("field access on a non-struct value of type {0}")]
    FieldAccessOnNonStruct(BaseKind),
    #[error("static method \"{0}\" invoked as an instance method")]
    StaticCalledAsInstance(String),
    #[error("unknown field \"{0}\" on struct \"{1}\"")]
    UnknownField(String, String),
    #[error("duplicate definition of \"{0}\"")]
    DuplicateDefinition(String),
    #[error("no function \"{0}\" reachable with argument types ({1})")]
    UnknownFunction(String, String),
}

/// An error somewhere in a source file, with exact location.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ParsingError {
    pub span: Span,
    pub message: ParsingMessage,
}

pub trait ErrorSource {
    fn make_error(&self, message: ParsingMessage) -> ParsingError;
}

impl ErrorSource for Span {
    fn make_error(&self, message: ParsingMessage) -> ParsingError {
        return ParsingError::new(*self, message);
    }
}

impl ParsingError {
    pub fn new(span: Span, message: ParsingMessage) -> Self {
        return Self { span, message };
    }
}
