/// Benchmark for catalog registry read paths
///
/// Measures `get_catalog()` and `system.catalogs` scan throughput, first on a
/// quiet registry and then while a writer keeps running reconciliation
/// cycles that replace every catalog.
use catalink::{
    CatalogDescriptor, CatalogService, ConnectorFactoryRegistry, StaticMetadataSource, SyncConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const CATALOGS: usize = 50;
const ITERATIONS: usize = 200_000;

fn catalogs(revision: u64) -> Vec<CatalogDescriptor> {
    (0..CATALOGS)
        .map(|i| {
            CatalogDescriptor::new(format!("catalog_{}", i), "memory")
                .with_property("tables", "public.orders,public.customers")
                .with_revision(revision)
        })
        .collect()
}

fn lookup_throughput(service: &CatalogService) -> f64 {
    let start = Instant::now();
    for i in 0..ITERATIONS {
        let name = format!("catalog_{}", i % CATALOGS);
        let _ = service.get_catalog(&name);
    }
    ITERATIONS as f64 / start.elapsed().as_secs_f64()
}

fn scan_throughput(service: &CatalogService, iterations: usize) -> f64 {
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = service.scan("catalogs");
    }
    iterations as f64 / start.elapsed().as_secs_f64()
}

fn main() {
    println!("=== Catalog Registry Read Throughput Benchmark ===\n");

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let source = Arc::new(StaticMetadataSource::new(catalogs(1)));
    let service = Arc::new(
        CatalogService::new(
            source.clone(),
            ConnectorFactoryRegistry::with_builtins(),
            SyncConfig::default(),
        )
        .expect("Failed to create service"),
    );
    runtime
        .block_on(service.refresh())
        .expect("Initial sync failed");
    println!("📋 Setup: {} memory catalogs registered\n", CATALOGS);

    println!("📊 Benchmark: get_catalog() on a quiet registry");
    let quiet_lookups = lookup_throughput(&service);
    println!("  Throughput: {:.0} lookups/sec\n", quiet_lookups);

    println!("📊 Benchmark: system.catalogs scan on a quiet registry");
    let quiet_scans = scan_throughput(&service, 5_000);
    println!("  Throughput: {:.0} scans/sec\n", quiet_scans);

    // Writer: replace every catalog in a loop while readers run
    let done = Arc::new(AtomicBool::new(false));
    let writer = {
        let service = service.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut revision = 1;
            let mut cycles = 0;
            while !done.load(Ordering::Acquire) {
                revision += 1;
                source.set_catalogs(catalogs(revision));
                if runtime.block_on(service.refresh()).is_ok() {
                    cycles += 1;
                }
            }
            cycles
        })
    };

    println!("📊 Benchmark: get_catalog() during reconciliation");
    let busy_lookups = lookup_throughput(&service);
    println!("  Throughput: {:.0} lookups/sec\n", busy_lookups);

    println!("📊 Benchmark: system.catalogs scan during reconciliation");
    let busy_scans = scan_throughput(&service, 5_000);
    println!("  Throughput: {:.0} scans/sec\n", busy_scans);

    done.store(true, Ordering::Release);
    let cycles = writer.join().expect("Writer thread panicked");

    println!("=== Summary ===");
    println!("  Reconciliation cycles completed by writer: {}", cycles);
    println!("  Registry version: {}", service.registry().version());
    println!(
        "  Lookup slowdown under writes: {:.1}%",
        (1.0 - busy_lookups / quiet_lookups) * 100.0
    );
    println!(
        "  Scan slowdown under writes:   {:.1}%",
        (1.0 - busy_scans / quiet_scans) * 100.0
    );
}
