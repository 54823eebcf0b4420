// Scan Kernels
// Direct memory traffic over a caller-owned region.
//
// Every scan variant is one instantiation of `scan_kernel`. The four loop
// shapes (pointer/index × simple/unrolled) are shared with the trace path, so
// the addresses a trace reports are exactly the addresses the timed kernel
// touches.
use std::ptr;

use crate::engine::config::UNROLL_FACTOR;
use crate::engine::element::Element;

/// Kernel ABI: `(region, size_in_bytes, repeats)`
pub type KernelFn = unsafe fn(region: *mut u8, size: usize, repeats: usize);

/// Records the byte offsets (relative to `region`) that one pass visits,
/// in visiting order.
pub type TraceFn = unsafe fn(region: *mut u8, size: usize, log: &mut Vec<usize>);

/// What a scan does at each slot
trait Access<E> {
    unsafe fn touch(&mut self, slot: *mut E);
}

struct Store<E>(E);

impl<E: Element> Access<E> for Store<E> {
    #[inline(always)]
    unsafe fn touch(&mut self, slot: *mut E) {
        unsafe { ptr::write_volatile(slot, self.0) }
    }
}

struct Load;

impl<E: Element> Access<E> for Load {
    #[inline(always)]
    unsafe fn touch(&mut self, slot: *mut E) {
        // volatile: the value is dropped but the load stays
        let _ = unsafe { ptr::read_volatile(slot) };
    }
}

struct Record<'a> {
    base: usize,
    log: &'a mut Vec<usize>,
}

impl<E> Access<E> for Record<'_> {
    #[inline(always)]
    unsafe fn touch(&mut self, slot: *mut E) {
        self.log.push(slot as usize - self.base);
    }
}

#[inline(always)]
unsafe fn ptr_simple<E: Element, A: Access<E>>(begin: *mut E, count: usize, access: &mut A) {
    unsafe {
        let end = begin.add(count);
        let mut p = begin;
        while p < end {
            access.touch(p);
            p = p.add(1);
        }
    }
}

#[inline(always)]
unsafe fn ptr_unroll<E: Element, A: Access<E>>(begin: *mut E, count: usize, access: &mut A) {
    unsafe {
        // only whole blocks; the tail is never visited
        let end = begin.add(count - count % UNROLL_FACTOR);
        let mut p = begin;
        while p < end {
            unroll16!(k => access.touch(p.add(k)));
            p = p.add(UNROLL_FACTOR);
        }
    }
}

#[inline(always)]
unsafe fn index_simple<E: Element, A: Access<E>>(base: *mut E, count: usize, access: &mut A) {
    let mut i = 0;
    while i < count {
        unsafe { access.touch(base.add(i)) };
        i += 1;
    }
}

#[inline(always)]
unsafe fn index_unroll<E: Element, A: Access<E>>(base: *mut E, count: usize, access: &mut A) {
    let blocks = count - count % UNROLL_FACTOR;
    let mut i = 0;
    while i < blocks {
        unroll16!(k => unsafe { access.touch(base.add(i + k)) });
        i += UNROLL_FACTOR;
    }
}

#[inline(always)]
unsafe fn scan_pass<E, A, const INDEX: bool, const UNROLL: bool>(base: *mut E, count: usize, access: &mut A)
where
    E: Element,
    A: Access<E>,
{
    unsafe {
        match (INDEX, UNROLL) {
            (false, false) => ptr_simple(base, count, access),
            (false, true) => ptr_unroll(base, count, access),
            (true, false) => index_simple(base, count, access),
            (true, true) => index_unroll(base, count, access),
        }
    }
}

/// `repeats` passes, counted down to zero
#[inline(always)]
unsafe fn scan_repeat<E, A, const INDEX: bool, const UNROLL: bool>(
    base: *mut E,
    count: usize,
    repeats: usize,
    access: &mut A,
) where
    E: Element,
    A: Access<E>,
{
    let mut remaining = repeats;
    while remaining != 0 {
        unsafe { scan_pass::<E, _, INDEX, UNROLL>(base, count, access) };
        remaining -= 1;
    }
}

/// Scans `size / size_of::<E>()` elements `repeats` times, storing the
/// sentinel (`WRITE`) or loading and discarding each element.
///
/// `size` is floored to whole elements, and for `UNROLL` to whole blocks of
/// sixteen elements; the remainder is left untouched. `repeats == 0` and an
/// empty region do nothing.
///
/// # Safety
/// `region` must be aligned to `align_of::<E>()` and valid for reads (and
/// writes when `WRITE`) of `size` bytes, with no other thread accessing it
/// for the duration of the call.
pub unsafe fn scan_kernel<E: Element, const WRITE: bool, const INDEX: bool, const UNROLL: bool>(
    region: *mut u8,
    size: usize,
    repeats: usize,
) {
    let base = region.cast::<E>();
    let count = size / E::WIDTH.bytes();
    unsafe {
        if WRITE {
            scan_repeat::<E, _, INDEX, UNROLL>(base, count, repeats, &mut Store(E::sentinel()));
        } else {
            scan_repeat::<E, _, INDEX, UNROLL>(base, count, repeats, &mut Load);
        }
    }
}

/// One pass of the `scan_kernel` loop shape, recording offsets instead of
/// touching memory.
///
/// # Safety
/// `region` must be valid for `size` bytes (pointer arithmetic stays inside it).
pub unsafe fn scan_trace<E: Element, const INDEX: bool, const UNROLL: bool>(
    region: *mut u8,
    size: usize,
    log: &mut Vec<usize>,
) {
    let mut access = Record {
        base: region as usize,
        log,
    };
    unsafe { scan_pass::<E, _, INDEX, UNROLL>(region.cast::<E>(), size / E::WIDTH.bytes(), &mut access) };
}
