//! LaTeX generation: escaping, the rule-based Markdown renderer, and the
//! preambles/templates the strategy selector wraps bodies in.

pub mod escape;
pub mod render;
pub mod template;

pub use escape::{escape, render_inline};
pub use render::{render, render_body};
