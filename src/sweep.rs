//! Deletion of resources created by earlier runs.
//!
//! The sweeper runs the matching delete scenario for each identifier in
//! turn. A failed deletion is recorded and the sweep moves on, so one stuck
//! resource does not leave the rest behind.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::executor::Transport;
use crate::scenario::{ScenarioRunner, catalog};

/// Kind of resource to delete.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceKind {
    /// VPCs.
    Vpc,
    /// Subnets.
    Subnet,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vpc => "VPC",
            Self::Subnet => "subnet",
        })
    }
}

/// A deletion that did not pass.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SweepFailure {
    /// Identifier that could not be deleted.
    pub identifier: String,
    /// Failure diagnostic.
    pub diagnostic: String,
}

/// Summary of sweeper work.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SweepSummary {
    /// Identifiers deleted.
    pub deleted: Vec<String>,
    /// Identifiers that could not be deleted.
    pub failed: Vec<SweepFailure>,
}

impl SweepSummary {
    /// Whether every deletion passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes resources by identifier through a [`ScenarioRunner`].
#[derive(Debug)]
pub struct Sweeper<'a, T> {
    runner: &'a ScenarioRunner<T>,
}

impl<'a, T: Transport> Sweeper<'a, T> {
    /// Creates a sweeper.
    #[must_use]
    pub const fn new(runner: &'a ScenarioRunner<T>) -> Self {
        Self { runner }
    }

    /// Deletes each identifier in order and reports what remains.
    pub async fn sweep<I, S>(&self, kind: ResourceKind, identifiers: I) -> SweepSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = SweepSummary::default();
        for raw in identifiers {
            let id = raw.as_ref().trim();
            if id.is_empty() {
                continue;
            }
            let scenario = match kind {
                ResourceKind::Vpc => catalog::delete_vpc(id, self.runner.config()),
                ResourceKind::Subnet => catalog::delete_subnet(id, self.runner.config()),
            };
            match self.runner.run(&scenario, None).await {
                Ok(_) => {
                    info!(%kind, id, "deleted");
                    summary.deleted.push(id.to_owned());
                }
                Err(err) => {
                    warn!(%kind, id, failure = %err.kind(), "deletion failed");
                    summary.failed.push(SweepFailure {
                        identifier: id.to_owned(),
                        diagnostic: err.to_string(),
                    });
                }
            }
        }
        info!(
            %kind,
            deleted = summary.deleted.len(),
            failed = summary.failed.len(),
            "sweep complete"
        );
        summary
    }
}
