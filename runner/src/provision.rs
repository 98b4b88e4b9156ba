use crate::{config::JobConfig, layout, seeds::Seed};
use fs_extra::dir::{copy, CopyOptions};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Template directory {0:?} does not exist")]
    TemplateMissing(PathBuf),
    #[error("Replicate directory {0:?} already exists, refusing to overwrite")]
    ReplicateExists(PathBuf),
    #[error("Failed to create node directory")]
    CreateFailed(#[from] std::io::Error),
    #[error("Failed to duplicate the template")]
    CopyFailed(#[from] fs_extra::error::Error),
}

/// duplicate the template into one working directory per replicate
///
/// an existing destination aborts the run, previously launched jobs may
/// still be using it. Directories created before a failure stay in place.
pub fn provision(config: &JobConfig, seeds: &[Seed], base: &Path) -> Result<(), ProvisionError> {
    if !config.template_dir.is_dir() {
        return Err(ProvisionError::TemplateMissing(config.template_dir.clone()));
    }

    let replicates = config.replicates_per_node as usize;
    let mut options = CopyOptions::new();
    options.copy_inside = true;

    for slot in layout::slots(&config.nodes, replicates) {
        let seed = &seeds[slot.flat_index(replicates)];
        let path = layout::replicate_path(base, slot.node_id, &config.folder_prefix, seed);

        if path.exists() {
            return Err(ProvisionError::ReplicateExists(path));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!(path = ?path, "Duplicating template");
        copy(&config.template_dir, &path, &options)?;
    }

    info!(
        "Provisioned {} replicate directories",
        config.nodes.len() * replicates
    );

    Ok(())
}
