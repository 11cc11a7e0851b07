use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GendagError;
use crate::gitlab::types::{Image, RetryPolicy};

/// Largest integer setting every config format can hold (TOML integers are `i64`).
pub const MAX_INTEGER: u64 = i64::MAX as u64;

/// Configuration file structure for gendag.
///
/// Holds defaults for the generator and the template every synthetic job is
/// stamped from. Command-line flags take precedence over these values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Tree shape and output defaults
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Template applied to every generated job
    #[serde(default)]
    pub job: JobTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneratorConfig {
    /// Steps from root to leaf
    #[serde(default = "default_depth")]
    pub depth: u32,

    /// Children per internal node
    #[serde(default = "default_children")]
    pub children: u32,

    /// Length of the random token stamped on each job
    #[serde(default = "default_strlen")]
    pub strlen: usize,

    /// Destination of the generated job graph
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Seed for token generation; entropy when unset
    pub seed: Option<u64>,

    #[serde(default)]
    pub format: OutputFormat,

    /// Refuse to generate graphs with more jobs than this
    #[serde(default = "default_max_jobs")]
    pub max_jobs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

/// Job fields shared by every generated job.
///
/// Each job additionally receives `name-variable` set to its own job name and
/// `token-variable` set to its random token, ahead of `variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobTemplate {
    #[serde(default = "default_name_variable")]
    pub name_variable: String,

    #[serde(default = "default_token_variable")]
    pub token_variable: String,

    #[serde(default = "default_variables")]
    pub variables: IndexMap<String, String>,

    #[serde(default = "default_script")]
    pub script: Vec<String>,

    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    #[serde(default = "default_image")]
    pub image: Image,

    #[serde(default = "default_retry")]
    pub retry: RetryPolicy,

    #[serde(default = "default_interruptible")]
    pub interruptible: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            children: default_children(),
            strlen: default_strlen(),
            output: default_output(),
            seed: None,
            format: OutputFormat::Yaml,
            max_jobs: default_max_jobs(),
        }
    }
}

impl Default for JobTemplate {
    fn default() -> Self {
        Self {
            name_variable: default_name_variable(),
            token_variable: default_token_variable(),
            variables: default_variables(),
            script: default_script(),
            tags: default_tags(),
            image: default_image(),
            retry: default_retry(),
            interruptible: default_interruptible(),
        }
    }
}

fn default_depth() -> u32 {
    2
}

fn default_children() -> u32 {
    2
}

fn default_strlen() -> usize {
    16
}

fn default_output() -> PathBuf {
    PathBuf::from(".gitlab-ci.yml")
}

fn default_max_jobs() -> u64 {
    1_000_000
}

fn default_name_variable() -> String {
    "SPACK_JOB_NAME".to_string()
}

fn default_token_variable() -> String {
    "SPACK_JOB_SPECIAL_STRING".to_string()
}

fn default_variables() -> IndexMap<String, String> {
    [
        ("SPACK_ARTIFACTS_ROOT", "/this/is/something/fake"),
        ("SPACK_CONCRETE_ENV_DIR", "/this/is/another/fake/thing"),
        ("SPACK_VERSION", "v0.19.1"),
        ("SPACK_CHECKOUT_VERSION", "deadbeef"),
        ("SPACK_REMOTE_MIRROR_URL", "s3://spack-binaries-prs/notreal/stacky"),
        ("SPACK_JOB_LOG_DIR", "jobs_scratch_dir/logs"),
        ("SPACK_JOB_REPRO_DIR", "jobs_scratch_dir/reproduction"),
        ("SPACK_JOB_TEST_DIR", "jobs_scratch_dir/test"),
        ("SPACK_LOCAL_MIRROR_DIR", "what_the_heck_is_this"),
        ("SPACK_PIPELINE_TYPE", "arbitrary and random"),
        ("SPACK_CI_STACK_NAME", "Noneoftheabove"),
        (
            "SPACK_CI_SHARED_PR_MIRROR_URL",
            "s3://spack-binaries-prs/shared-pr-mirror",
        ),
        ("SPACK_REBUILD_CHECK_UP_TO_DATE", "surewhynot"),
        ("SPACK_REBUILD_EVERYTHING", "askmeificare"),
        ("KUBERNETES_CPU_REQUEST", "500m"),
        ("KUBERNETES_MEMORY_REQUEST", "500M"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

fn default_script() -> Vec<String> {
    vec![
        "echo Hello! My job name is ${SPACK_JOB_NAME}".to_string(),
        "echo     special string: ${SPACK_JOB_SPECIAL_STRING}".to_string(),
    ]
}

fn default_tags() -> Vec<String> {
    ["spack", "aws", "public", "aarch64"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_image() -> Image {
    Image {
        name: "ghcr.io/spack/e4s-amazonlinux-2:v2023-03-09".to_string(),
        entrypoint: vec![String::new()],
    }
}

fn default_retry() -> RetryPolicy {
    RetryPolicy {
        max: 2,
        when: "always".to_string(),
    }
}

fn default_interruptible() -> bool {
    true
}

impl JobTemplate {
    /// Rejects templates whose fixed variables would shadow the per-job ones.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.name_variable == self.token_variable {
            return Err(GendagError::InvalidArgument(format!(
                "name-variable and token-variable are both {}",
                self.name_variable
            )));
        }

        for key in [&self.name_variable, &self.token_variable] {
            if self.variables.contains_key(key) {
                return Err(GendagError::InvalidArgument(format!(
                    "job variables must not redefine {key}, it is set per job"
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path (must exist)
    /// 2. ./gendag.toml
    /// 3. ./gendag.json
    /// 4. ./gendag.yaml
    /// 5. ./gendag.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["gendag.toml", "gendag.json", "gendag.yaml", "gendag.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
