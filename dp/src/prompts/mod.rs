//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the day plan request.
//!
//! Template loading chain:
//! 1. `<prompt-dir>/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
