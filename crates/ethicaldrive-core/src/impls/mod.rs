//! Impls - port implementations.
//!
//! - **HttpNarrator**: generative text endpoint over HTTP
//! - **TemplateNarrator**: offline sentence templates

pub mod http_narrator;
pub mod prompt;
pub mod template_narrator;

pub use self::http_narrator::HttpNarrator;
pub use self::template_narrator::TemplateNarrator;
