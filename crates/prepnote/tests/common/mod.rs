//! Shared test utilities for prepnote integration tests.
//!
//! - Builders that produce PDF, DOCX, PPTX and PNG uploads in memory
//! - Fake OCR engines and page renderers that record how they were called

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::*;
