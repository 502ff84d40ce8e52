//! Replication and failover behavior of the engine.

mod common;

use common::Harness;
use std::collections::HashSet;
use stratus_core::error::StratusError;
use stratus_core::path::VirtualPath;
use stratus_engine::{FsConfig, ReplicationPolicy};
use stratus_provider::ProviderClient;

fn p(s: &str) -> VirtualPath {
    VirtualPath::parse(s).unwrap()
}

fn config() -> FsConfig {
    FsConfig::default().with_chunk_size(4).with_replicas(2)
}

#[tokio::test]
async fn test_healthy_upload_hits_exactly_r_providers() {
    let h = Harness::new(4, config());

    let record = h.fs.upload_bytes(&p("/f"), b"twelve bytes").await.unwrap();

    for chunk in &record.chunks {
        let targets: HashSet<_> = chunk.providers().collect();
        assert_eq!(targets.len(), 2, "bindings must name distinct providers");
    }
    assert_eq!(h.total_uploads(), record.chunk_count() as u64 * 2);
}

#[tokio::test]
async fn test_insufficient_pool_fails_before_any_io() {
    let h = Harness::new(1, config());

    let result = h.fs.upload_bytes(&p("/f"), b"payload").await;
    assert!(matches!(
        result,
        Err(StratusError::InsufficientProviders {
            available: 1,
            required: 2
        })
    ));

    assert_eq!(h.total_uploads(), 0);
    assert!(!h.fs.exists(&p("/f")).await.unwrap());
}

#[tokio::test]
async fn test_write_failover_skips_broken_provider() {
    let h = Harness::new(4, config());
    h.providers[1].set_fail_uploads(true);
    let broken = h.providers[1].id();

    let record = h.fs.upload_bytes(&p("/f"), b"still replicated").await.unwrap();

    for chunk in &record.chunks {
        assert_eq!(chunk.replicas.len(), 2);
        assert!(chunk.providers().all(|id| id != broken));
    }
    assert_eq!(&h.fs.read_file(&p("/f")).await.unwrap()[..], b"still replicated");
}

#[tokio::test]
async fn test_strict_policy_rejects_shortfall() {
    let h = Harness::new(2, config());
    h.providers[0].set_fail_uploads(true);

    let result = h.fs.upload_bytes(&p("/f"), b"payload").await;
    assert!(matches!(
        result,
        Err(StratusError::UnderReplicated {
            achieved: 1,
            required: 2
        })
    ));
    // Nothing committed
    assert!(!h.fs.exists(&p("/f")).await.unwrap());
}

#[tokio::test]
async fn test_best_effort_policy_accepts_shortfall() {
    let h = Harness::new(2, config().with_policy(ReplicationPolicy::BestEffort));
    h.providers[0].set_fail_uploads(true);

    let record = h.fs.upload_bytes(&p("/f"), b"degraded").await.unwrap();

    for chunk in &record.chunks {
        assert_eq!(chunk.replicas.len(), 1);
    }
    assert_eq!(&h.fs.read_file(&p("/f")).await.unwrap()[..], b"degraded");
}

#[tokio::test]
async fn test_total_outage_fails_either_policy() {
    for policy in [ReplicationPolicy::Strict, ReplicationPolicy::BestEffort] {
        let h = Harness::new(3, config().with_policy(policy));
        for provider in &h.providers {
            provider.set_fail_uploads(true);
        }

        let result = h.fs.upload_bytes(&p("/f"), b"payload").await;
        assert!(matches!(
            result,
            Err(StratusError::UnderReplicated {
                achieved: 0,
                required: 2
            })
        ));
    }
}

#[tokio::test]
async fn test_read_failover_needs_one_live_replica() {
    let h = Harness::new(3, config());
    let record = h.fs.upload_bytes(&p("/f"), b"survives").await.unwrap();

    let bound: Vec<_> = record.chunks[0].providers().collect();

    // One bound replica down: still readable
    h.provider_by_id(bound[0]).set_fail_downloads(true);
    assert_eq!(&h.fs.read_file(&p("/f")).await.unwrap()[..], b"survives");

    // Every bound replica down: unavailable
    h.provider_by_id(bound[1]).set_fail_downloads(true);
    let result = h.fs.read_file(&p("/f")).await;
    assert!(matches!(result, Err(StratusError::ChunkUnavailable { .. })));
}

#[tokio::test]
async fn test_hung_upload_times_out_and_fails_over() {
    let h = Harness::new(3, config().with_provider_timeout(1));
    h.providers[0].set_stall_uploads(true);
    let hung = h.providers[0].id();

    let record = h.fs.upload_bytes(&p("/f"), b"bytes land").await.unwrap();

    for chunk in &record.chunks {
        assert_eq!(chunk.replicas.len(), 2);
        assert!(chunk.providers().all(|id| id != hung));
    }
    assert_eq!(&h.fs.read_file(&p("/f")).await.unwrap()[..], b"bytes land");
}

#[tokio::test]
async fn test_hung_provider_counts_as_shortfall() {
    let h = Harness::new(2, config().with_provider_timeout(1));
    h.providers[0].set_stall_uploads(true);

    let result = h.fs.upload_bytes(&p("/f"), b"payload").await;
    assert!(matches!(
        result,
        Err(StratusError::UnderReplicated {
            achieved: 1,
            required: 2
        })
    ));
    assert!(!h.fs.exists(&p("/f")).await.unwrap());
}

#[tokio::test]
async fn test_hung_download_times_out_and_fails_over() {
    let h = Harness::new(3, config().with_provider_timeout(1));
    let record = h.fs.upload_bytes(&p("/f"), b"still here").await.unwrap();

    let bound: Vec<_> = record.chunks[0].providers().collect();

    // A replica that never answers is abandoned at the timeout
    h.provider_by_id(bound[0]).set_stall_downloads(true);
    assert_eq!(&h.fs.read_file(&p("/f")).await.unwrap()[..], b"still here");

    h.provider_by_id(bound[1]).set_stall_downloads(true);
    let result = h.fs.read_file(&p("/f")).await;
    assert!(matches!(result, Err(StratusError::ChunkUnavailable { .. })));
}

#[tokio::test]
async fn test_delete_tolerates_provider_outage() {
    let h = Harness::new(3, config());
    h.fs.upload_bytes(&p("/f"), b"doomed payload").await.unwrap();

    // A provider that cannot be reached never blocks the deletion
    for provider in &h.providers {
        provider.set_fail_deletes(true);
    }
    h.fs.delete(&p("/f")).await.unwrap();
    assert!(!h.fs.exists(&p("/f")).await.unwrap());
}
