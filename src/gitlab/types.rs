use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Container image a job runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    #[serde(default)]
    pub entrypoint: Vec<String>,
}

/// GitLab `retry` keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max: u8,
    pub when: String,
}

/// One entry of the generated `.gitlab-ci.yml`.
///
/// Field order matches the emitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Stage name, e.g. `stage-2`
    pub stage: String,
    /// Simulated environment, including the job name and its random token
    pub variables: IndexMap<String, String>,
    pub script: Vec<String>,
    pub tags: Vec<String>,
    pub image: Image,
    /// Names of the jobs this one depends on (its children in the tree)
    pub needs: Vec<String>,
    pub retry: RetryPolicy,
    pub interruptible: bool,
}

/// Flattened job graph: one entry per job plus the ordered `stages` list.
///
/// Serializes as a single mapping where every job is a top-level key and
/// `stages` comes last, which is the shape GitLab expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobGraph {
    pub jobs: IndexMap<String, JobDefinition>,
    pub stages: Vec<String>,
}

impl JobGraph {
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// `needs` entries that do not name a job in this graph.
    pub fn dangling_needs(&self) -> Vec<(&str, &str)> {
        self.jobs
            .iter()
            .flat_map(|(name, job)| job.needs.iter().map(move |need| (name.as_str(), need.as_str())))
            .filter(|(_, need)| !self.jobs.contains_key(*need))
            .collect()
    }
}

impl Serialize for JobGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.jobs.len() + 1))?;
        for (name, job) in &self.jobs {
            map.serialize_entry(name, job)?;
        }
        map.serialize_entry("stages", &self.stages)?;
        map.end()
    }
}

pub fn stage_name(stage: u32) -> String {
    format!("stage-{stage}")
}
