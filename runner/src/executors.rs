mod ssh;

use crate::{config::JobConfig, remote::Mode, seeds::Seed};
use thiserror::Error;

pub use ssh::TransportError;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// All executor variants
/// (this is deliberately not made with dynamic dispatch to avoid the headache)
pub enum Executors {
    Ssh(ssh::SshExecutor),
}

impl Executors {
    pub fn load(config: JobConfig, seeds: Vec<Seed>, secret: String) -> Self {
        Self::Ssh(ssh::SshExecutor::new(config, seeds, secret))
    }

    pub fn execute(&self, mode: Mode) -> Result<(), ExecutorError> {
        match self {
            Self::Ssh(executor) => Ok(executor.execute(mode)?),
        }
    }
}
