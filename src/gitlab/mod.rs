mod serializer;
pub mod types;
mod writer;

pub use serializer::build_job_graph;
pub use types::JobGraph;
pub use writer::write_job_graph;
