// Built-in Kernel Catalog
// Explicit table of every shipped variant. Names follow
// Scan{Read|Write}{bits}{Ptr|Index}{Simple|Unroll}Loop and
// PermRead{bits}{Simple|Unroll}Loop so result files stay comparable.
use crate::engine::config::LINK_BYTES;
use crate::engine::descriptor::{AccessMode, Direction, ElementWidth, KernelDescriptor, Unroll};
use crate::engine::element::{Element, Wide128};
use crate::engine::kernels::{scan_kernel, scan_trace};
use crate::engine::registry::KernelEntry;
use crate::engine::walk::{walk_kernel, walk_trace};

fn unroll_of(unrolled: bool) -> Unroll {
    if unrolled {
        Unroll::Unrolled
    } else {
        Unroll::Simple
    }
}

fn loop_suffix(unroll: Unroll) -> &'static str {
    match unroll {
        Unroll::Simple => "SimpleLoop",
        Unroll::Unrolled => "UnrollLoop",
    }
}

pub fn scan_name(direction: Direction, width: ElementWidth, access: AccessMode, unroll: Unroll) -> String {
    let access = match access {
        AccessMode::Pointer => "Ptr",
        AccessMode::Index => "Index",
    };
    format!("Scan{:?}{}{}{}", direction, width.bits(), access, loop_suffix(unroll))
}

pub fn walk_name(width: ElementWidth, unroll: Unroll) -> String {
    format!("PermRead{}{}", width.bits(), loop_suffix(unroll))
}

fn scan_entry<E: Element, const WRITE: bool, const INDEX: bool, const UNROLL: bool>() -> KernelEntry {
    let direction = if WRITE { Direction::Write } else { Direction::Read };
    let access = if INDEX { AccessMode::Index } else { AccessMode::Pointer };
    let unroll = unroll_of(UNROLL);
    let descriptor = KernelDescriptor::scan(
        scan_name(direction, E::WIDTH, access, unroll),
        E::WIDTH,
        unroll,
        direction,
        access,
    );
    KernelEntry::new(
        descriptor,
        scan_kernel::<E, WRITE, INDEX, UNROLL>,
        Some(scan_trace::<E, INDEX, UNROLL>),
    )
}

/// All eight scans of one width
fn scan_family<E: Element>() -> [KernelEntry; 8] {
    [
        scan_entry::<E, true, false, false>(),
        scan_entry::<E, true, false, true>(),
        scan_entry::<E, false, false, false>(),
        scan_entry::<E, false, false, true>(),
        scan_entry::<E, true, true, false>(),
        scan_entry::<E, true, true, true>(),
        scan_entry::<E, false, true, false>(),
        scan_entry::<E, false, true, true>(),
    ]
}

fn walk_entry<const UNROLL: bool>(width: ElementWidth) -> KernelEntry {
    let unroll = unroll_of(UNROLL);
    KernelEntry::new(
        KernelDescriptor::permutation(walk_name(width, unroll), width, unroll),
        walk_kernel::<UNROLL>,
        Some(walk_trace::<UNROLL>),
    )
}

/// Every built-in kernel, widest scans first, walks last
pub fn builtin_entries() -> Vec<KernelEntry> {
    let mut entries = Vec::with_capacity(34);
    entries.extend(scan_family::<Wide128>());
    entries.extend(scan_family::<u64>());
    entries.extend(scan_family::<u32>());
    entries.extend(scan_family::<u16>());
    if let Some(width) = ElementWidth::from_bytes(LINK_BYTES) {
        entries.push(walk_entry::<false>(width));
        entries.push(walk_entry::<true>(width));
    }
    entries
}
