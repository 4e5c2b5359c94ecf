mod bound;
mod pipeline;

pub use bound::{escaped_len, truncate_to_escaped};
pub use pipeline::{QueryPipeline, RESPONSE_PREVIEW_CHARS};
