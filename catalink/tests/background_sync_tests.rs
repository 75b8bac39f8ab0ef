//! Background sync task tests
//!
//! Exercise the spawned loop: initial cycle, interval pickup, backoff after
//! fetch failures, trigger coalescing and recovery from crashing collaborators.

#[path = "testutils/mod.rs"]
mod testutils;

use catalink::SyncConfig;
use std::time::Duration;
use testutils::test_fixture::{hive, wait_until, within, SyncFixture};

#[tokio::test]
async fn test_added_catalog_becomes_active_within_one_interval() {
    let fixture = SyncFixture::new(vec![]);
    let task = fixture.engine.start();

    assert!(wait_until(Duration::from_secs(1), || fixture.engine.stats().cycles > 0).await);

    fixture.source.upsert(hive("sales", 1, "thrift://a:9083"));
    // interval (50ms) plus one build, with slack for slow machines
    let active = wait_until(Duration::from_secs(2), || {
        fixture.registry.get_catalog("sales").is_some()
    })
    .await;
    assert!(active);

    within(Duration::from_secs(2), task.shutdown()).await;
}

#[tokio::test]
async fn test_fetch_failures_back_off_then_recover() {
    let config = SyncConfig {
        backoff_initial: Duration::from_millis(20),
        backoff_max: Duration::from_millis(80),
        ..SyncConfig::fast()
    };
    let fixture = SyncFixture::with_config(vec![hive("sales", 1, "thrift://a:9083")], config);
    fixture.source.set_failing(true);

    let task = fixture.engine.start();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 0 + 20 + 40 + 80 + 80 ... ms: a handful of attempts, not a busy loop
    let fetches = fixture.source.fetch_count();
    assert!(fetches >= 3, "expected retries, got {}", fetches);
    assert!(fetches <= 8, "expected backoff, got {}", fetches);
    assert!(fixture.engine.stats().consecutive_failures >= 3);
    assert!(fixture.registry.is_empty());

    fixture.source.set_failing(false);
    let recovered = wait_until(Duration::from_secs(2), || {
        fixture.registry.get_catalog("sales").is_some()
    })
    .await;
    assert!(recovered);
    assert_eq!(fixture.engine.stats().consecutive_failures, 0);

    task.shutdown().await;
}

#[tokio::test]
async fn test_triggers_during_a_cycle_coalesce() {
    let config = SyncConfig::fast().with_interval(Duration::from_secs(3600));
    let fixture = SyncFixture::with_config(vec![], config);

    let task = fixture.engine.start();
    assert!(wait_until(Duration::from_secs(1), || fixture.engine.stats().cycles == 1).await);

    fixture.source.set_delay(Some(Duration::from_millis(100)));
    task.trigger();
    assert!(wait_until(Duration::from_secs(1), || fixture.source.fetch_count() == 2).await);

    // the second cycle is still fetching
    for _ in 0..5 {
        task.trigger();
    }

    assert!(wait_until(Duration::from_secs(2), || fixture.engine.stats().cycles == 3).await);
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(fixture.source.fetch_count(), 3);

    task.shutdown().await;
}

#[tokio::test]
async fn test_removal_during_load_is_retired_by_follow_up_cycle() {
    let config = SyncConfig::fast().with_interval(Duration::from_secs(3600));
    let fixture = SyncFixture::with_config(vec![hive("slow", 1, "thrift://a:9083")], config);
    fixture.factory.delay("slow", Duration::from_millis(100));

    let task = fixture.engine.start();
    assert!(wait_until(Duration::from_secs(1), || fixture.registry.lookup("slow").is_some()).await);

    // removed upstream while the build is still running
    fixture.source.remove("slow");

    let retired = wait_until(Duration::from_secs(2), || {
        fixture.registry.lookup("slow").is_none() && fixture.factory.live_connectors() == 0
    })
    .await;
    assert!(retired);
    assert_eq!(fixture.factory.built(), vec![("slow".to_string(), 1)]);
    assert_eq!(fixture.factory.released(), vec![("slow".to_string(), 1)]);

    task.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let fixture = SyncFixture::new(vec![]);
    let task = fixture.engine.start();
    assert!(wait_until(Duration::from_secs(1), || fixture.engine.stats().cycles > 0).await);

    within(Duration::from_secs(1), task.shutdown()).await;
    let cycles = fixture.engine.stats().cycles;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(fixture.engine.stats().cycles, cycles);
}

#[tokio::test]
async fn test_release_panic_does_not_stop_background_sync() {
    let config = SyncConfig::fast().with_interval(Duration::from_secs(3600));
    let fixture = SyncFixture::with_config(
        vec![
            hive("bad", 1, "thrift://a:9083"),
            hive("good", 1, "thrift://b:9083"),
        ],
        config,
    );
    fixture.factory.panic_on_release("bad");

    let task = fixture.engine.start();
    let loaded = wait_until(Duration::from_secs(1), || {
        fixture.registry.get_catalog("bad").is_some()
            && fixture.registry.get_catalog("good").is_some()
    })
    .await;
    assert!(loaded);

    fixture.source.remove("bad");
    task.trigger();
    assert!(wait_until(Duration::from_secs(2), || fixture.registry.lookup("bad").is_none()).await);

    fixture.source.upsert(hive("good2", 1, "thrift://c:9083"));
    task.trigger();
    let added = wait_until(Duration::from_secs(2), || {
        fixture.registry.get_catalog("good2").is_some()
    })
    .await;
    assert!(added);
    assert!(!task.is_finished());
    assert_eq!(fixture.engine.stats().release_failures, 1);

    within(Duration::from_secs(2), task.shutdown()).await;
}

#[tokio::test]
async fn test_loop_survives_aborted_cycles() {
    let fixture = SyncFixture::new(vec![hive("sales", 1, "thrift://a:9083")]);
    fixture.source.set_panicking(true);

    let task = fixture.engine.start();
    assert!(wait_until(Duration::from_secs(1), || fixture.engine.stats().failed_cycles >= 2).await);
    assert!(!task.is_finished());

    fixture.source.set_panicking(false);
    let recovered = wait_until(Duration::from_secs(2), || {
        fixture.registry.get_catalog("sales").is_some()
    })
    .await;
    assert!(recovered);

    within(Duration::from_secs(2), task.shutdown()).await;
}
