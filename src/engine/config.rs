// Kernel Configuration
// Named constants shared by every kernel of a given width, plus the
// invocation policy knobs used by the safe entry points.
use crate::engine::descriptor::ElementWidth;

/// Accesses per loop body in the unrolled variants
pub const UNROLL_FACTOR: usize = 16;

/// Bytes per "next" link in a permutation region (native pointer width)
pub const LINK_BYTES: usize = std::mem::size_of::<usize>();

/// Values stored by the write kernels. The bits carry no meaning; they only
/// have to be fixed and non-zero so stores are never redundant.
pub const SENTINEL_16: u16 = 0xCFFE;
pub const SENTINEL_32: u32 = 0xC0FF_EEEE;
pub const SENTINEL_64: u64 = 0xC0FF_EEEE_BABE_0000;
/// Both 64-bit lanes carry `SENTINEL_64`
pub const SENTINEL_128: [u64; 2] = [SENTINEL_64, SENTINEL_64];

/// Byte image of one sentinel element as it lands in memory.
pub fn sentinel_bytes(width: ElementWidth) -> Vec<u8> {
    match width {
        ElementWidth::W16 => SENTINEL_16.to_ne_bytes().to_vec(),
        ElementWidth::W32 => SENTINEL_32.to_ne_bytes().to_vec(),
        ElementWidth::W64 => SENTINEL_64.to_ne_bytes().to_vec(),
        ElementWidth::W128 => SENTINEL_128
            .iter()
            .flat_map(|lane| lane.to_ne_bytes())
            .collect(),
    }
}

/// What the safe entry points do with a region whose size is not a multiple
/// of the kernel's stride unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizePolicy {
    /// Run anyway; the tail past the last full stride unit is never visited.
    /// This is the historical behaviour and the default.
    #[default]
    Truncate,
    /// Refuse with `KernelError::InvalidRegionSize`.
    Strict,
}

/// Invocation settings for `KernelEntry::run_with`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelConfig {
    pub size_policy: SizePolicy,
}

impl KernelConfig {
    pub fn strict() -> Self {
        Self::default().with_size_policy(SizePolicy::Strict)
    }

    pub fn with_size_policy(mut self, policy: SizePolicy) -> Self {
        self.size_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_patterns_fill_their_width() {
        for width in ElementWidth::ALL {
            let bytes = sentinel_bytes(width);
            assert_eq!(bytes.len(), width.bytes());
            assert!(bytes.iter().any(|&b| b != 0));
        }
    }

    #[test]
    fn wide_sentinel_repeats_the_64_bit_lanes() {
        let wide = sentinel_bytes(ElementWidth::W128);
        let narrow = sentinel_bytes(ElementWidth::W64);
        assert_eq!(&wide[..8], &narrow[..]);
        assert_eq!(&wide[8..], &narrow[..]);
    }

    #[test]
    fn default_config_truncates() {
        let config = KernelConfig::default();
        assert_eq!(config.size_policy, SizePolicy::Truncate);
        assert_eq!(KernelConfig::strict().size_policy, SizePolicy::Strict);
    }
}
