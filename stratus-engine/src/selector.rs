//! Replica target selection
//!
//! Picks which providers receive each chunk. Selection is unweighted
//! sampling without replacement over the whole pool: the first R
//! candidates are the primary targets, the rest the failover tail.

use rand::seq::SliceRandom;
use std::sync::Arc;
use stratus_core::error::{Result, StratusError};
use stratus_provider::ProviderClient;

/// Chooses upload targets from the provider pool
pub struct ReplicaSelector {
    pool: Vec<Arc<dyn ProviderClient>>,
    replicas: usize,
}

impl ReplicaSelector {
    /// Create a selector over `pool`
    ///
    /// Fails with `InsufficientProviders` when the pool cannot satisfy
    /// the replica count. Checked once, before any upload I/O; never a
    /// per-chunk retry.
    pub fn new(pool: Vec<Arc<dyn ProviderClient>>, replicas: usize) -> Result<Self> {
        if pool.len() < replicas {
            return Err(StratusError::InsufficientProviders {
                available: pool.len(),
                required: replicas,
            });
        }
        Ok(Self { pool, replicas })
    }

    /// Configured replica count
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Size of the provider pool
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// The whole pool in fresh random order
    ///
    /// Each call shuffles independently; replica placement carries no
    /// ordering guarantee.
    pub fn candidates(&self) -> Vec<Arc<dyn ProviderClient>> {
        let mut candidates = self.pool.clone();
        candidates.shuffle(&mut rand::thread_rng());
        candidates
    }
}
