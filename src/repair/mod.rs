//! Game file verification and repair.

pub mod manifest;

use anyhow::Result;
use async_trait::async_trait;

use crate::distribution::{Artifact, ServerProfile};
use crate::progress::ProgressReporter;

pub use manifest::ManifestRepairer;

/// Files found missing or corrupt by a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairPlan {
    pub invalid: Vec<Artifact>,
}

impl RepairPlan {
    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Verifies and downloads a server's files.
/// Real implementation: [`ManifestRepairer`].
#[async_trait]
pub trait IntegrityRepairer: Send + Sync {
    async fn verify(&self, server: &ServerProfile, progress: &ProgressReporter)
    -> Result<RepairPlan>;

    async fn download(&self, plan: &RepairPlan, progress: &ProgressReporter) -> Result<()>;
}
