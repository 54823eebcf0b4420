//! Contract tests over the built-in registry
//!
//! Every property here is checked through the public API the way a harness
//! sees kernels: by name, through their descriptors.

use memprobe_core::engine::config::{sentinel_bytes, LINK_BYTES, UNROLL_FACTOR};
use memprobe_core::{
    registry, Direction, ElementWidth, KernelConfig, KernelDescriptor, KernelError, KernelFilter, MappedRegion,
    PermutationRegion, Unroll,
};
use proptest::prelude::*;

fn region(len: usize) -> MappedRegion {
    MappedRegion::new(len).expect("anonymous mapping")
}

fn filled_with(bytes: &[u8], width: ElementWidth) -> bool {
    let pattern = sentinel_bytes(width);
    bytes.chunks(pattern.len()).all(|c| c == pattern)
}

/// Same kernel shape with the other unroll setting
fn sibling(descriptor: &KernelDescriptor, unroll: Unroll) -> String {
    let from = match descriptor.unroll() {
        Unroll::Simple => "SimpleLoop",
        Unroll::Unrolled => "UnrollLoop",
    };
    let to = match unroll {
        Unroll::Simple => "SimpleLoop",
        Unroll::Unrolled => "UnrollLoop",
    };
    descriptor.name().replace(from, to)
}

/// Link `slots` slots into one cycle 0 -> stride -> 2*stride ... (mod slots)
fn link_cycle(region: &mut MappedRegion, slots: usize, stride: usize) {
    let base = region.as_mut_ptr();
    for slot in 0..slots {
        let next = (slot + stride) % slots;
        unsafe {
            std::ptr::write(
                base.add(slot * LINK_BYTES).cast::<*const u8>(),
                base.add(next * LINK_BYTES) as *const u8,
            );
        }
    }
}

#[test]
fn write_scan_1024_bytes_width_4() {
    let entry = registry().lookup("ScanWrite32PtrSimpleLoop").unwrap();
    let mut mem = region(1024);
    entry.run(mem.as_mut_slice(), 1).unwrap();
    assert!(filled_with(mem.as_slice(), ElementWidth::W32));
    assert_eq!(entry.visited_offsets(mem.as_mut_slice()).unwrap().len(), 256);

    let mut again = region(1024);
    entry.run(again.as_mut_slice(), 3).unwrap();
    assert_eq!(again.as_slice(), mem.as_slice());
}

#[test]
fn unrolled_read_256_and_200_bytes_width_8() {
    let entry = registry().lookup("ScanRead64PtrUnrollLoop").unwrap();
    assert_eq!(entry.descriptor().stride_unit(), 128);

    let mut full = region(256);
    let offsets = entry.visited_offsets(full.as_mut_slice()).unwrap();
    assert_eq!(offsets, (0..32).map(|i| i * 8).collect::<Vec<_>>());

    // the 200-byte region only gets its first 16 elements; that is intended
    let mut short = region(200);
    let offsets = entry.visited_offsets(short.as_mut_slice()).unwrap();
    assert_eq!(offsets, (0..16).map(|i| i * 8).collect::<Vec<_>>());
    entry.run(short.as_mut_slice(), 1).unwrap();
}

#[test]
fn every_write_scan_fills_its_region() {
    for descriptor in registry().list(KernelFilter::any().direction(Direction::Write)) {
        let entry = registry().lookup(descriptor.name()).unwrap();
        let size = descriptor.stride_unit() * 5;
        let mut mem = region(size);
        entry.run(mem.as_mut_slice(), 1).unwrap();
        assert!(filled_with(mem.as_slice(), descriptor.element_width()), "{descriptor}");
    }
}

#[test]
fn every_read_scan_leaves_memory_alone() {
    for descriptor in registry().list(KernelFilter::any().direction(Direction::Read)) {
        let entry = registry().lookup(descriptor.name()).unwrap();
        let mut mem = region(4096);
        mem.as_mut_slice().fill(0x5A);
        entry.run(mem.as_mut_slice(), 2).unwrap();
        assert!(mem.as_slice().iter().all(|&b| b == 0x5A), "{descriptor}");
    }
}

#[test]
fn zero_repeats_is_a_no_op_for_every_kernel() {
    for entry in registry().entries() {
        let mut mem = region(2048);
        if entry.descriptor().is_permutation() {
            link_cycle(&mut mem, 2048 / LINK_BYTES, 1);
        }
        let before = mem.as_slice().to_vec();
        entry.run(mem.as_mut_slice(), 0).unwrap();
        assert_eq!(mem.as_slice(), &before[..], "{}", entry.name());
    }
}

#[test]
fn empty_region_is_a_no_op_for_every_scan() {
    for descriptor in registry().list(KernelFilter::any().scans()) {
        let entry = registry().lookup(descriptor.name()).unwrap();
        let mut mem = region(0);
        entry.run(mem.as_mut_slice(), 5).unwrap();
        assert!(entry.visited_offsets(mem.as_mut_slice()).unwrap().is_empty());
    }
}

#[test]
fn strict_mode_is_opt_in() {
    let entry = registry().lookup("ScanWrite16IndexUnrollLoop").unwrap();
    let mut mem = region(40);
    assert!(matches!(
        entry.run_with(mem.as_mut_slice(), 1, &KernelConfig::strict()),
        Err(KernelError::InvalidRegionSize { size: 40, stride_unit: 32, .. })
    ));
    entry.run(mem.as_mut_slice(), 1).unwrap();
    assert!(filled_with(&mem.as_slice()[..32], ElementWidth::W16));
    assert!(mem.as_slice()[32..].iter().all(|&b| b == 0));
}

#[test]
fn walk_follows_the_whole_cycle() {
    let simple = registry()
        .list(KernelFilter::any().permutations().unroll(Unroll::Simple))
        .next()
        .unwrap();
    let entry = registry().lookup(simple.name()).unwrap();
    let slots = 160;
    let mut mem = region(slots * LINK_BYTES);
    // 7 is coprime with 160, so this is a single cycle
    link_cycle(&mut mem, slots, 7);

    let offsets = entry.visited_offsets(mem.as_mut_slice()).unwrap();
    assert_eq!(offsets.len(), slots);
    assert_eq!(offsets[0], 0);
    assert_eq!(offsets[1], 7 * LINK_BYTES);

    let mut walk = PermutationRegion::new(mem.as_mut_slice()).unwrap();
    assert_eq!(walk.cycle_len(), slots);
    entry.run_walk(&mut walk, 3).unwrap();

    let unrolled = registry().lookup(&sibling(simple, Unroll::Unrolled)).unwrap();
    assert_eq!(unrolled.visited_offsets(mem.as_mut_slice()).unwrap(), offsets);
}

#[test]
fn walk_rejects_two_cycles() {
    let entry = registry()
        .entries()
        .find(|e| e.descriptor().is_permutation())
        .unwrap();
    let slots = 64;
    let mut mem = region(slots * LINK_BYTES);
    // stride 2 over an even count splits into two cycles
    link_cycle(&mut mem, slots, 2);
    assert!(matches!(
        entry.run(mem.as_mut_slice(), 1),
        Err(KernelError::MalformedPermutation { .. })
    ));
}

#[test]
fn list_with_unmatched_filter_is_empty() {
    let filter = KernelFilter::any().permutations().direction(Direction::Write);
    assert_eq!(registry().list(filter).count(), 0);
}

#[test]
fn raw_invocation_matches_safe_run() {
    let entry = registry().lookup("ScanWrite128IndexSimpleLoop").unwrap();
    let mut raw = region(512);
    let mut safe = region(512);
    unsafe { entry.invoke(raw.as_mut_ptr(), 512, 1) };
    entry.run(safe.as_mut_slice(), 1).unwrap();
    assert_eq!(raw.as_slice(), safe.as_slice());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn simple_and_unrolled_visit_identical_addresses(blocks in 0usize..24, extra in 0usize..UNROLL_FACTOR) {
        for descriptor in registry().list(KernelFilter::any().scans().unroll(Unroll::Simple)) {
            let simple = registry().lookup(descriptor.name()).unwrap();
            let unrolled = registry().lookup(&sibling(descriptor, Unroll::Unrolled)).unwrap();
            let width = descriptor.element_width().bytes();

            let mut mem = region((blocks * UNROLL_FACTOR + extra) * width);
            let all = simple.visited_offsets(mem.as_mut_slice()).unwrap();
            let prefix = unrolled.visited_offsets(mem.as_mut_slice()).unwrap();
            prop_assert_eq!(all.len(), blocks * UNROLL_FACTOR + extra);
            prop_assert_eq!(&prefix[..], &all[..blocks * UNROLL_FACTOR]);
        }
    }

    #[test]
    fn repeats_match_repeated_single_passes(elems in 0usize..160, repeats in 1usize..5) {
        for descriptor in registry().list(KernelFilter::any().direction(Direction::Write)) {
            let entry = registry().lookup(descriptor.name()).unwrap();
            let size = elems * descriptor.element_width().bytes();
            let mut once = region(size);
            let mut many = region(size);
            for _ in 0..repeats {
                entry.run(once.as_mut_slice(), 1).unwrap();
            }
            entry.run(many.as_mut_slice(), repeats).unwrap();
            prop_assert_eq!(once.as_slice(), many.as_slice(), "{}", descriptor);
        }
    }
}
