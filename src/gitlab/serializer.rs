use indexmap::IndexMap;
use log::debug;

use super::types::{stage_name, JobDefinition, JobGraph};
use crate::config::JobTemplate;
use crate::dag::{DagTree, NodeId, StagedTree};

/// Flattens a staged tree into a GitLab job graph.
///
/// Every non-root node is emitted in depth-first post-order, so a job always
/// follows the jobs it needs. The root is inserted last as a separate step:
/// nothing needs it, it is the sink of the graph. `stages` lists every stage
/// from `stage-0` up to the root's stage.
pub fn build_job_graph(staged: &StagedTree, template: &JobTemplate) -> JobGraph {
    let tree = staged.tree();
    let mut jobs = IndexMap::with_capacity(tree.len());

    for id in tree.post_order() {
        if id == DagTree::ROOT {
            continue;
        }
        jobs.insert(tree.node(id).job_name(), job_definition(staged, id, template));
    }

    jobs.insert(
        tree.root().job_name(),
        job_definition(staged, DagTree::ROOT, template),
    );

    let stages = (0..=staged.root_stage()).map(stage_name).collect();

    debug!("Serialized {} jobs", jobs.len());

    JobGraph { jobs, stages }
}

fn job_definition(staged: &StagedTree, id: NodeId, template: &JobTemplate) -> JobDefinition {
    let node = staged.node(id);
    let job_name = node.job_name();

    let mut variables = IndexMap::with_capacity(template.variables.len() + 2);
    variables.insert(template.name_variable.clone(), job_name);
    variables.insert(template.token_variable.clone(), node.token().to_string());
    for (key, value) in &template.variables {
        variables.insert(key.clone(), value.clone());
    }

    JobDefinition {
        stage: stage_name(staged.stage(id)),
        variables,
        script: template.script.clone(),
        tags: template.tags.clone(),
        image: template.image.clone(),
        needs: node
            .children()
            .iter()
            .map(|&child| staged.node(child).job_name())
            .collect(),
        retry: template.retry.clone(),
        interruptible: template.interruptible,
    }
}
