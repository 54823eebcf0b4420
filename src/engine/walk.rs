// Permutation Walking
// Latency-bound pointer chase over a region whose slots link into one cycle.
use std::ptr;

use bitvec::prelude::*;
use tracing::warn;

use crate::engine::config::LINK_BYTES;
use crate::engine::error::{KernelError, Result};

/// A slot holds the address of the next slot
type Link = *const u8;

trait Observer {
    fn visit(&mut self, slot: *const u8);
}

impl Observer for () {
    #[inline(always)]
    fn visit(&mut self, _slot: *const u8) {}
}

struct Record<'a> {
    base: usize,
    log: &'a mut Vec<usize>,
}

impl Observer for Record<'_> {
    #[inline(always)]
    fn visit(&mut self, slot: *const u8) {
        self.log.push(slot as usize - self.base);
    }
}

#[inline(always)]
unsafe fn step<O: Observer>(p: *const u8, observer: &mut O) -> *const u8 {
    observer.visit(p);
    unsafe { ptr::read_volatile(p.cast::<Link>()) }
}

/// Follow links from `begin` until a check lands back on `begin`.
///
/// The unrolled form only checks after every sixteenth dereference. On a
/// cycle of length `L` it therefore performs `lcm(L, 16)` dereferences per
/// pass; that count is part of the kernel's identity.
#[inline(always)]
unsafe fn walk_pass<O: Observer, const UNROLL: bool>(begin: *const u8, observer: &mut O) {
    let mut p = begin;
    if UNROLL {
        loop {
            unroll16!(_k => p = unsafe { step(p, observer) });
            if p == begin {
                break;
            }
        }
    } else {
        loop {
            p = unsafe { step(p, observer) };
            if p == begin {
                break;
            }
        }
    }
}

/// Walk the cycle starting at `region` once per repeat. `size` is accepted
/// for ABI uniformity with the scans and is not used as a bound.
///
/// # Safety
/// `region` must be aligned to `LINK_BYTES` and hold a chain of links that
/// returns to `region` while staying inside readable memory. A region with
/// more than one cycle never terminates. `PermutationRegion::new` checks all
/// of this.
pub unsafe fn walk_kernel<const UNROLL: bool>(region: *mut u8, _size: usize, repeats: usize) {
    unsafe { walk_repeat::<_, UNROLL>(region as *const u8, repeats, &mut ()) };
}

#[inline(always)]
unsafe fn walk_repeat<O: Observer, const UNROLL: bool>(begin: *const u8, repeats: usize, observer: &mut O) {
    let mut remaining = repeats;
    while remaining != 0 {
        unsafe { walk_pass::<_, UNROLL>(begin, observer) };
        remaining -= 1;
    }
}

/// One pass of `walk_kernel`, recording the offset of every dereferenced slot.
///
/// # Safety
/// Same contract as `walk_kernel`.
pub unsafe fn walk_trace<const UNROLL: bool>(region: *mut u8, _size: usize, log: &mut Vec<usize>) {
    let mut observer = Record {
        base: region as usize,
        log,
    };
    unsafe { walk_pass::<_, UNROLL>(region as *const u8, &mut observer) };
}

/// A region whose links were checked to form one cycle over every slot.
///
/// Holding the exclusive borrow keeps the links from changing after the check.
#[derive(Debug)]
pub struct PermutationRegion<'a> {
    region: &'a mut [u8],
    cycle_len: usize,
}

impl<'a> PermutationRegion<'a> {
    pub fn new(region: &'a mut [u8]) -> Result<Self> {
        let cycle_len = validate_cycle(region).inspect_err(|e| warn!("rejected permutation region: {e}"))?;
        Ok(Self { region, cycle_len })
    }

    /// Number of slots in the cycle (every slot of the region)
    pub fn cycle_len(&self) -> usize {
        self.cycle_len
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.region.as_mut_ptr()
    }
}

fn malformed(reason: String) -> KernelError {
    KernelError::MalformedPermutation { reason }
}

/// Check that following links from slot 0 visits every slot exactly once and
/// comes back to slot 0. Returns the cycle length.
pub fn validate_cycle(region: &[u8]) -> Result<usize> {
    let base = region.as_ptr() as usize;
    if base % LINK_BYTES != 0 {
        return Err(malformed(format!("base {base:#x} is not {LINK_BYTES}-byte aligned")));
    }
    let slots = region.len() / LINK_BYTES;
    if slots == 0 {
        return Err(malformed(format!("{} bytes hold no {LINK_BYTES}-byte slot", region.len())));
    }

    let mut visited = bitvec![0; slots];
    let mut slot = 0;
    for step in 1..=slots {
        visited.set(slot, true);
        let at = slot * LINK_BYTES;
        let mut raw = [0u8; LINK_BYTES];
        raw.copy_from_slice(&region[at..at + LINK_BYTES]);
        let offset = usize::from_ne_bytes(raw).wrapping_sub(base);
        if offset >= slots * LINK_BYTES || offset % LINK_BYTES != 0 {
            return Err(malformed(format!("slot {slot} links outside the slot grid")));
        }
        let next = offset / LINK_BYTES;
        if next == 0 {
            if step == slots {
                return Ok(slots);
            }
            return Err(malformed(format!(
                "cycle through slot 0 closes after {step} of {slots} slots"
            )));
        }
        if visited[next] {
            return Err(malformed(format!("slot {next} is entered twice")));
        }
        slot = next;
    }
    // `slots` steps visited every slot without closing
    Err(malformed(format!("slot {slot} does not link back to slot 0")))
}
