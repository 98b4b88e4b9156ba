use crate::config::ConfigErrors;
use serde::{Deserialize, Serialize};
use std::fmt;

/// scalar seed value handed to one replicate
/// integers and reals are kept apart so seeds render exactly as written
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum Seed {
    Int(i64),
    Real(f64),
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
        }
    }
}

impl Seed {
    /// seed rendered as a path segment, the decimal point becomes a `p`
    pub fn path_token(&self) -> String {
        self.to_string().replace('.', "p")
    }
}

/// generated seed sequences selectable by keyword in the job file
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    Integer,
    Uniform,
}

/// seed directive from the job file
/// either a generator keyword or the full list written out
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum SeedSpec {
    Generated(SeedKind),
    Explicit(Vec<Seed>),
}

impl SeedSpec {
    /// resolve the directive into one seed per (node, replicate) pair
    ///
    /// index `i` of the result is the flat replicate index `i`, consumed
    /// row-major by node then by replicate within the node
    pub fn resolve(
        &self,
        node_count: usize,
        replicates_per_node: usize,
    ) -> Result<Vec<Seed>, ConfigErrors> {
        let total = node_count * replicates_per_node;

        match self {
            Self::Explicit(seeds) => {
                if seeds.len() != total {
                    return Err(ConfigErrors::SeedCountMismatch {
                        expected: total,
                        found: seeds.len(),
                    });
                }

                Ok(seeds.clone())
            }
            Self::Generated(SeedKind::Integer) => Ok((1..=total as i64).map(Seed::Int).collect()),
            Self::Generated(SeedKind::Uniform) => Ok((1..=total)
                .map(|i| {
                    // historical spacing: the divisor is N+1 rather than N, which
                    // keeps every seed strictly inside (0, 1). Downstream runs
                    // depend on these exact values, do not "fix" this.
                    let raw = i as f64 / (total as f64 + 1.0);
                    Seed::Real((raw * 1000.0).round() / 1000.0)
                })
                .collect()),
        }
    }
}
