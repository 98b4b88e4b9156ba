use crate::seeds::Seed;
use std::path::{Path, PathBuf};

/// one (node, replicate) pair in the row-major ordering of the whole job
/// derived on the fly, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicateSlot {
    /// 0-based position of the node in the configured node list
    pub node_index: usize,
    /// the node's integer identifier
    pub node_id: u32,
    /// 0-based position within the node's replicate block
    pub replicate_index: usize,
}

impl ReplicateSlot {
    /// position of this slot in the resolved seed sequence
    /// this is the only key into that sequence
    pub fn flat_index(&self, replicates_per_node: usize) -> usize {
        self.node_index * replicates_per_node + self.replicate_index
    }
}

/// enumerate every slot of the job in flat order
pub fn slots(
    nodes: &[u32],
    replicates_per_node: usize,
) -> impl Iterator<Item = ReplicateSlot> + '_ {
    nodes
        .iter()
        .enumerate()
        .flat_map(move |(node_index, &node_id)| {
            (0..replicates_per_node).map(move |replicate_index| ReplicateSlot {
                node_index,
                node_id,
                replicate_index,
            })
        })
}

/// working directory for one replicate
///
/// shared between the provisioning pass and the launch pass, so a directory
/// created locally is exactly the one the remote command changes into
pub fn replicate_path(base: &Path, node_id: u32, folder_prefix: &str, seed: &Seed) -> PathBuf {
    base.join(format!("robo{node_id}"))
        .join(format!("{folder_prefix}_{}", seed.path_token()))
}
