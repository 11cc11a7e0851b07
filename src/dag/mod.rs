mod stages;
mod token;
mod tree;

pub use stages::{assign_stages, StagedTree};
pub use token::TokenGenerator;
pub use tree::{expected_id_bytes, expected_job_count, DagTree, NodeId};
