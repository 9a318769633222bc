//! Parameter layer: the job record, override sources, and the resolver.
//!
//! Kept apart from rendering and launching. Nothing in here touches the
//! filesystem except `load_config_file`.

pub mod job;
pub mod overrides;
pub mod resolve;

pub use job::{JobSpec, JobVariant};
pub use overrides::{Overrides, load_config_file, parse_cli_tokens};
pub use resolve::resolve;
