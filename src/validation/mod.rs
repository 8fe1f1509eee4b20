//! Validação de documentos brasileiros

pub mod cpf;

pub use cpf::{mask, Cpf, CpfError, CpfValidator, DiagnosticSink, NoopSink, TracingSink};
