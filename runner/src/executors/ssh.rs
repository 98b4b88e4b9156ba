use crate::{
    config::JobConfig,
    layout::{self, ReplicateSlot},
    remote::{self, Mode},
    seeds::Seed,
};
use ssh2::Session;
use std::{env, io::Read, net::TcpStream, path::Path};
use thiserror::Error;
use tracing::{debug, info};

/// every node resolves as robo<id> under this domain
pub const NODE_DOMAIN: &str = "robolab.net";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to reach {host}")]
    Connect {
        host: String,
        source: std::io::Error,
    },
    #[error("Session setup failed for {host}")]
    Session { host: String, source: ssh2::Error },
    #[error("Command issuance failed on {host}")]
    Channel { host: String, source: ssh2::Error },
    #[error("Failed to determine the working directory")]
    WorkingDir(#[from] std::io::Error),
}

/// hostname a node identifier maps to
pub fn node_host(node_id: u32) -> String {
    format!("robo{node_id}.{NODE_DOMAIN}")
}

/// everything issued against one node, derived before any session is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePlan {
    pub node_id: u32,
    pub host: String,
    pub commands: Vec<String>,
}

/// Executor that walks the nodes one at a time over SSH
///
/// the remote server key is trusted exactly as presented. This tool
/// deliberately skips host key pinning so a freshly imaged node can be
/// targeted without operator intervention.
pub struct SshExecutor {
    config: JobConfig,
    seeds: Vec<Seed>,
    secret: String,
}

impl SshExecutor {
    pub fn new(config: JobConfig, seeds: Vec<Seed>, secret: String) -> Self {
        Self {
            config,
            seeds,
            secret,
        }
    }

    /// per-node command sequences, in configuration order
    ///
    /// pure with respect to the filesystem and the network, the session loop
    /// below only walks the result
    pub fn plan(&self, base: &Path, mode: Mode) -> Vec<NodePlan> {
        let replicates = self.config.replicates_per_node as usize;

        self.config
            .nodes
            .iter()
            .enumerate()
            .map(|(node_index, &node_id)| {
                let commands = (0..replicates)
                    .map(|replicate_index| {
                        let slot = ReplicateSlot {
                            node_index,
                            node_id,
                            replicate_index,
                        };
                        let seed = &self.seeds[slot.flat_index(replicates)];
                        let path = layout::replicate_path(
                            base,
                            node_id,
                            &self.config.folder_prefix,
                            seed,
                        );

                        remote::build_command(
                            &path,
                            &self.config.executable,
                            &self.config.exec_args,
                            seed,
                            mode,
                        )
                    })
                    .collect();

                NodePlan {
                    node_id,
                    host: node_host(node_id),
                    commands,
                }
            })
            .collect()
    }

    /// issue the whole job, one session per node, fail-fast on any error
    pub fn execute(&self, mode: Mode) -> Result<(), TransportError> {
        let base = env::current_dir()?;

        for plan in self.plan(&base, mode) {
            info!(host = %plan.host, "Opening session");
            let session = self.connect(&plan.host)?;

            for command in plan.commands.iter() {
                debug!(host = %plan.host, command = %command, "Issuing");

                let mut channel = session.channel_session().map_err(|source| {
                    TransportError::Channel {
                        host: plan.host.clone(),
                        source,
                    }
                })?;
                channel.exec(command).map_err(|source| {
                    TransportError::Channel {
                        host: plan.host.clone(),
                        source,
                    }
                })?;

                // drained for diagnostics only, a launch detaches and
                // returns without waiting for the run
                let mut output = String::new();
                let _ = channel.read_to_string(&mut output);
                if !output.trim().is_empty() {
                    debug!(host = %plan.host, output = %output.trim_end(), "Remote output");
                }

                let _ = channel.wait_close();
            }

            session
                .disconnect(None, "job issued", None)
                .map_err(|source| TransportError::Session {
                    host: plan.host.clone(),
                    source,
                })?;
            info!(host = %plan.host, "Closed session");
        }

        Ok(())
    }

    /// open and authenticate one session, password auth only
    fn connect(&self, host: &str) -> Result<Session, TransportError> {
        let tcp = TcpStream::connect((host, 22)).map_err(|source| TransportError::Connect {
            host: host.to_owned(),
            source,
        })?;

        let session_err = |source| TransportError::Session {
            host: host.to_owned(),
            source,
        };

        let mut session = Session::new().map_err(session_err)?;
        session.set_tcp_stream(tcp);
        // no known-hosts check before or after the handshake, see the type
        // level docs
        session.handshake().map_err(session_err)?;
        session
            .userauth_password(&self.config.username, &self.secret)
            .map_err(session_err)?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::{SeedKind, SeedSpec};
    use std::path::PathBuf;

    fn executor(nodes: Vec<u32>, replicates_per_node: u32) -> SshExecutor {
        let config = JobConfig {
            username: String::from("operator"),
            nodes,
            folder_prefix: String::from("experiment"),
            replicates_per_node,
            executable: String::from("sim"),
            exec_args: String::from("-s %s"),
            seeds: SeedSpec::Generated(SeedKind::Integer),
            template_dir: PathBuf::from("template"),
        };
        let seeds = config.resolve_seeds().unwrap();

        SshExecutor::new(config, seeds, String::from("secret"))
    }

    #[test]
    fn hostnames_follow_the_naming_convention() {
        assert_eq!(node_host(7), "robo7.robolab.net");
        assert_eq!(node_host(10), "robo10.robolab.net");
    }

    #[test]
    fn single_replicate_launch_plan() {
        let executor = executor(vec![1], 1);
        let plan = executor.plan(Path::new("/work"), Mode::Launch);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].host, "robo1.robolab.net");
        assert_eq!(
            plan[0].commands,
            vec!["cd /work/robo1/experiment_1; nohup ./sim -s 1 > run.log 2>&1 &"]
        );
    }

    #[test]
    fn seeds_are_consumed_row_major_by_node() {
        let executor = executor(vec![4, 2], 2);
        let plan = executor.plan(Path::new("/work"), Mode::Launch);

        assert_eq!(plan.len(), 2);
        // first node takes seeds 1 and 2, second node 3 and 4
        assert_eq!(plan[0].node_id, 4);
        assert_eq!(
            plan[0].commands,
            vec![
                "cd /work/robo4/experiment_1; nohup ./sim -s 1 > run.log 2>&1 &",
                "cd /work/robo4/experiment_2; nohup ./sim -s 2 > run.log 2>&1 &",
            ]
        );
        assert_eq!(plan[1].node_id, 2);
        assert_eq!(
            plan[1].commands,
            vec![
                "cd /work/robo2/experiment_3; nohup ./sim -s 3 > run.log 2>&1 &",
                "cd /work/robo2/experiment_4; nohup ./sim -s 4 > run.log 2>&1 &",
            ]
        );
    }

    #[test]
    fn kill_plan_targets_the_same_paths() {
        let executor = executor(vec![7], 1);
        let plan = executor.plan(Path::new("/x"), Mode::Kill);

        assert_eq!(plan[0].commands, vec!["cd /x/robo7/experiment_1; killall sim"]);
    }

    #[test]
    fn plan_is_empty_per_node_without_replicates() {
        let executor = executor(vec![1, 2], 0);
        let plan = executor.plan(Path::new("/work"), Mode::Launch);

        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|node| node.commands.is_empty()));
    }
}
