//! Text rendering of a resolved job into a Slurm submission script.

pub mod script;

pub use script::render_script;
