use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use crate::config::{Config, GeneratorConfig, JobTemplate, OutputFormat, MAX_INTEGER};
use crate::dag::{
    assign_stages, expected_id_bytes, expected_job_count, DagTree, TokenGenerator,
};
use crate::error::GendagError;
use crate::gitlab::{build_job_graph, write_job_graph};
use crate::output::{print_summary, print_tree, PhaseProgress, RunReport};

#[derive(Parser, Debug)]
#[command(name = "gendag")]
#[command(
    author,
    version,
    about = "Generate an arbitrarily large perfect k-ary tree and turn it into a .gitlab-ci.yml file",
    long_about = None
)]
pub struct Cli {
    /// How many steps to get from root to leaf [default: 2]
    #[arg(long)]
    depth: Option<u32>,

    /// How many children each node has [default: 2]
    #[arg(long)]
    children: Option<u32>,

    /// Length of the random string variable stamped on each job [default: 16]
    #[arg(long)]
    strlen: Option<usize>,

    /// Path to the output file [default: .gitlab-ci.yml]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for the random strings, for reproducible output
    #[arg(
        short,
        long,
        env = "GENDAG_SEED",
        value_parser = clap::value_parser!(u64).range(..=MAX_INTEGER)
    )]
    seed: Option<u64>,

    /// Output document format [default: yaml]
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (defaults to ./gendag.{toml,json,yaml,yml} when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refuse to generate more jobs than this [default: 1000000]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_INTEGER))]
    max_jobs: Option<u64>,

    /// Print the staged tree to stdout
    #[arg(long, default_value_t = false)]
    print_tree: bool,

    /// Write the effective configuration to this file before generating
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// Cap on the combined length of all job ids, checked before building.
pub const MAX_ID_BYTES: u64 = 1 << 30;

/// Fully resolved settings for one generator run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub depth: u32,
    pub children: u32,
    pub strlen: usize,
    pub output: PathBuf,
    pub seed: Option<u64>,
    pub format: OutputFormat,
    pub max_jobs: u64,
    pub print_tree: bool,
    pub template: JobTemplate,
}

impl GenerateOptions {
    /// Checks the options and returns the number of jobs they will produce.
    pub fn validate(&self) -> crate::error::Result<u64> {
        if self.max_jobs == 0 {
            return Err(GendagError::InvalidArgument(
                "max-jobs must be at least 1".to_string(),
            ));
        }
        if self.max_jobs > MAX_INTEGER {
            return Err(GendagError::InvalidArgument(format!(
                "max-jobs must be at most {MAX_INTEGER}"
            )));
        }
        if self.seed.is_some_and(|seed| seed > MAX_INTEGER) {
            return Err(GendagError::InvalidArgument(format!(
                "seed must be at most {MAX_INTEGER}"
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(GendagError::InvalidArgument(
                "output path must not be empty".to_string(),
            ));
        }
        self.template.validate()?;

        let total = expected_job_count(self.depth, self.children)
            .filter(|&total| total <= self.max_jobs)
            .ok_or(GendagError::GraphTooLarge {
                depth: self.depth,
                children: self.children,
                limit: self.max_jobs,
            })?;

        expected_id_bytes(self.depth, self.children)
            .filter(|&bytes| bytes <= MAX_ID_BYTES)
            .ok_or(GendagError::IdsTooLarge {
                depth: self.depth,
                children: self.children,
                limit: MAX_ID_BYTES,
            })?;

        Ok(total)
    }

    /// Configuration that reproduces these options when loaded again.
    pub fn to_config(&self) -> Config {
        Config {
            generator: GeneratorConfig {
                depth: self.depth,
                children: self.children,
                strlen: self.strlen,
                output: self.output.clone(),
                seed: self.seed,
                format: self.format,
                max_jobs: self.max_jobs,
            },
            job: self.template.clone(),
        }
    }
}

impl Cli {
    /// Merges command-line flags over the loaded configuration.
    fn resolve(&self, config: Config) -> GenerateOptions {
        let generator = config.generator;

        GenerateOptions {
            depth: self.depth.unwrap_or(generator.depth),
            children: self.children.unwrap_or(generator.children),
            strlen: self.strlen.unwrap_or(generator.strlen),
            output: self.output.clone().unwrap_or(generator.output),
            seed: self.seed.or(generator.seed),
            format: self.format.unwrap_or(generator.format),
            max_jobs: self.max_jobs.unwrap_or(generator.max_jobs),
            print_tree: self.print_tree,
            template: config.job,
        }
    }

    pub fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let options = self.resolve(config);
        debug!("Resolved options: {options:?}");
        options.validate()?;

        if let Some(path) = &self.save_config {
            options.to_config().save(path)?;
            info!("Configuration written to: {}", path.display());
        }

        generate(&options)
    }
}

/// Builds the tree, assigns stages, and writes the job graph.
pub fn generate(options: &GenerateOptions) -> Result<()> {
    let expected_jobs = options.validate()?;
    info!(
        "Generating {expected_jobs} jobs (depth {}, {} children per node)",
        options.depth, options.children
    );

    let progress = PhaseProgress::start_phase_1(options.depth, options.children);
    let mut tokens = TokenGenerator::new(options.seed, options.strlen);
    let tree = DagTree::build(options.depth, options.children, &mut tokens);

    let node_count = tree.count(DagTree::ROOT);
    debug_assert_eq!(node_count as u64, expected_jobs);

    let progress = progress.finish_phase_1_start_phase_2(node_count);
    let staged = assign_stages(tree);
    debug!("Root job placed in stage {}", staged.root_stage());

    let progress = progress.finish_phase_2_start_phase_3(staged.max_stage() + 1);
    let graph = build_job_graph(&staged, &options.template);
    debug_assert!(graph.dangling_needs().is_empty());

    let bytes = write_job_graph(&graph, options.format, &options.output).with_context(|| {
        format!(
            "Failed to write job graph to {}",
            options.output.display()
        )
    })?;
    progress.finish_phase_3();

    if options.print_tree {
        print_tree(&staged);
    }

    print_summary(&RunReport {
        graph: &graph,
        output: &options.output,
        format: options.format,
        bytes,
        seed: options.seed,
    });

    Ok(())
}
