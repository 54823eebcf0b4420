// Access Elements
// One type per element width. Loads and stores of these types are single
// accesses; the 128-bit type is a native vector register where the target
// has one so the volatile access is not split into two 64-bit halves.
use crate::engine::config::{SENTINEL_16, SENTINEL_32, SENTINEL_64};
use crate::engine::descriptor::ElementWidth;

pub trait Element: Copy + 'static {
    const WIDTH: ElementWidth;

    /// The value write kernels store
    fn sentinel() -> Self;
}

impl Element for u16 {
    const WIDTH: ElementWidth = ElementWidth::W16;

    #[inline(always)]
    fn sentinel() -> Self {
        SENTINEL_16
    }
}

impl Element for u32 {
    const WIDTH: ElementWidth = ElementWidth::W32;

    #[inline(always)]
    fn sentinel() -> Self {
        SENTINEL_32
    }
}

impl Element for u64 {
    const WIDTH: ElementWidth = ElementWidth::W64;

    #[inline(always)]
    fn sentinel() -> Self {
        SENTINEL_64
    }
}

#[cfg(target_arch = "x86_64")]
mod wide {
    use std::arch::x86_64::{__m128i, _mm_set1_epi64x};

    /// SSE2 register (movdqa on aligned volatile access)
    #[derive(Clone, Copy)]
    #[repr(transparent)]
    pub struct Wide128(__m128i);

    impl Wide128 {
        #[inline(always)]
        #[allow(unused_unsafe)]
        pub fn splat(lane: u64) -> Self {
            // SSE2 is part of the x86_64 baseline
            Self(unsafe { _mm_set1_epi64x(lane as i64) })
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod wide {
    use std::arch::aarch64::{uint64x2_t, vdupq_n_u64};

    /// NEON q register (ldr/str q on aligned volatile access)
    #[derive(Clone, Copy)]
    #[repr(transparent)]
    pub struct Wide128(uint64x2_t);

    impl Wide128 {
        #[inline(always)]
        #[allow(unused_unsafe)]
        pub fn splat(lane: u64) -> Self {
            // NEON is mandatory on aarch64
            Self(unsafe { vdupq_n_u64(lane) })
        }
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod wide {
    /// Portable fallback; the backend may split accesses to this type.
    #[derive(Clone, Copy)]
    #[repr(C, align(16))]
    pub struct Wide128([u64; 2]);

    impl Wide128 {
        #[inline(always)]
        pub fn splat(lane: u64) -> Self {
            Self([lane, lane])
        }
    }
}

pub use wide::Wide128;

impl Element for Wide128 {
    const WIDTH: ElementWidth = ElementWidth::W128;

    #[inline(always)]
    fn sentinel() -> Self {
        Wide128::splat(SENTINEL_64)
    }
}
