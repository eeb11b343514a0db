//! Benchmarks for the admission path.
//!
//! Benchmarks cover:
//! - Sequential admits until an offering fills
//! - Waitlist joins under one offering lock
//! - Roster auto-enrollment batches

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::num::NonZeroU32;
use std::sync::Arc;

use enrollment_admission::core::{
    AutoEnrollmentBatcher, CourseOffering, EnrollmentLedger, InMemoryEventSink, Section,
    StaticRoster, WaitlistQueue,
};
use enrollment_admission::infra::InMemoryStore;
use enrollment_admission::util::{OfferingId, SectionId, StudentId};

// ============================================================================
// Helper Functions
// ============================================================================

fn build_ledger(capacity: u32) -> EnrollmentLedger<InMemoryStore, InMemoryEventSink> {
    let ledger = EnrollmentLedger::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryEventSink::new(1_024)),
    );
    ledger
        .register_offering(CourseOffering::new(
            OfferingId(1),
            Section {
                id: SectionId(1),
                default_capacity: NonZeroU32::new(capacity).unwrap(),
            },
        ))
        .unwrap();
    ledger
}

// ============================================================================
// Ledger Benchmarks
// ============================================================================

fn bench_admit_until_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("admit_until_full");

    for size in [10_u64, 100, 500] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let ledger = build_ledger(u32::try_from(size).unwrap());
                for s in 0..size {
                    black_box(ledger.admit(StudentId(s), OfferingId(1)).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_waitlist_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("waitlist_join");

    for size in [10_u64, 100, 500] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let waitlist = WaitlistQueue::new(build_ledger(1));
                for s in 0..size {
                    black_box(waitlist.join(StudentId(s), OfferingId(1)).unwrap());
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// Batch Benchmarks
// ============================================================================

fn bench_roster_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_batch");

    for size in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let batcher = AutoEnrollmentBatcher::new(
                    build_ledger(u32::try_from(size / 2).unwrap()),
                    Arc::new(StaticRoster::new()),
                );
                let report = batcher
                    .enroll_roster(OfferingId(1), (0..size).rev().map(StudentId))
                    .unwrap();
                black_box(report);
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(ledger_benches, bench_admit_until_full, bench_waitlist_join);

criterion_group!(batch_benches, bench_roster_batch);

criterion_main!(ledger_benches, batch_benches);
