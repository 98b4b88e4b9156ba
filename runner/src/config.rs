use crate::seeds::{Seed, SeedSpec};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read job file")]
    ReadFailed(#[from] std::io::Error),
    #[error("Failed to parse job file")]
    ParseFailed(#[from] serde_yaml::Error),
    #[error("Job file failed preflight checks")]
    PreflightFailed,
    #[error("Seed list holds {found} values but the job has {expected} replicates")]
    SeedCountMismatch { expected: usize, found: usize },
}

/// full description of one submission run
/// built once from the job file, validated, then never mutated
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// account used for every node session
    pub username: String,
    /// node identifiers, each doubles as its hostname suffix
    pub nodes: Vec<u32>,
    /// replicate directories are named `<folder_prefix>_<seed>`
    #[serde(default = "default_folder_prefix")]
    pub folder_prefix: String,
    pub replicates_per_node: u32,
    /// name of the executable inside each replicate directory
    pub executable: String,
    /// argument line for the executable, `%s` is replaced by the seed
    #[serde(default)]
    pub exec_args: String,
    pub seeds: SeedSpec,
    /// directory tree duplicated into every replicate workspace
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let file = File::open(path)?;

        Ok(serde_yaml::from_reader(file)?)
    }

    /// resolve the seed directive against the configured job shape
    pub fn resolve_seeds(&self) -> Result<Vec<Seed>, ConfigErrors> {
        self.seeds
            .resolve(self.nodes.len(), self.replicates_per_node as usize)
    }

    /// returns true when the config contains an error
    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make
        // debugging easier for users
        let mut contains_error = false;

        if self.username.is_empty() {
            error!("username must not be empty");
            contains_error = true;
        }

        if self.executable.is_empty() {
            error!("executable must not be empty");
            contains_error = true;
        }

        if self.nodes.is_empty() {
            error!("nodes must name at least one node");
            contains_error = true;
        }

        for id in self.nodes.iter() {
            if !(1..=10).contains(id) {
                error!("Node id {id} is outside the cluster range 1-10");
                contains_error = true;
            }
        }

        if self.exec_args.matches("%s").count() > 1 {
            error!("exec_args may hold at most one %s placeholder");
            contains_error = true;
        }

        // a repeated seed inside one node's block would sanitize to the same
        // replicate directory and silently collide
        if self.replicates_per_node > 0 {
            if let SeedSpec::Explicit(seeds) = &self.seeds {
                for (block, chunk) in
                    seeds.chunks(self.replicates_per_node as usize).enumerate()
                {
                    let unique =
                        chunk.iter().map(|seed| seed.path_token()).unique().count();

                    if unique != chunk.len() {
                        error!("Seed block {block} repeats a seed, replicate directories would collide");
                        contains_error = true;
                    }
                }
            }
        }

        contains_error
    }
}

fn default_folder_prefix() -> String {
    String::from("experiment")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("template")
}
