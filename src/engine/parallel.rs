// Disjoint-Region Invocation
// One kernel on several threads at once, each over its own slice of a region.
use rayon::prelude::*;
use tracing::debug;

use crate::engine::error::{KernelError, Result};
use crate::engine::registry::KernelEntry;

/// Split `region` into `parts` equal, stride-aligned chunks and run `entry`
/// over each chunk concurrently. Bytes past `parts` whole chunks are not
/// visited.
///
/// Walks are refused: a single cycle cannot be divided between threads.
pub fn run_disjoint(entry: &KernelEntry, region: &mut [u8], parts: usize, repeats: usize) -> Result<()> {
    let descriptor = entry.descriptor();
    if descriptor.is_permutation() {
        return Err(KernelError::InvalidDescriptor(format!(
            "{} walks one cycle and cannot be split",
            entry.name()
        )));
    }

    let chunk = chunk_len(region.len(), parts, descriptor.stride_unit());
    if chunk == 0 {
        return Err(KernelError::InvalidPartition {
            parts,
            len: region.len(),
        });
    }
    debug!(kernel = entry.name(), parts, chunk, repeats, "running on disjoint chunks");

    // Each chunk is a whole number of stride units, so an aligned base keeps
    // every chunk aligned.
    region[..chunk * parts]
        .par_chunks_mut(chunk)
        .try_for_each(|part| entry.run(part, repeats))
}

/// Largest stride-aligned length such that `parts` chunks fit in `len`
fn chunk_len(len: usize, parts: usize, stride_unit: usize) -> usize {
    if parts == 0 {
        return 0;
    }
    len / parts / stride_unit * stride_unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::sentinel_bytes;
    use crate::engine::descriptor::ElementWidth;
    use crate::engine::memory::MappedRegion;
    use crate::engine::registry::registry;

    #[test]
    fn chunks_are_stride_aligned() {
        assert_eq!(chunk_len(1000, 3, 128), 256);
        assert_eq!(chunk_len(1024, 4, 4), 256);
        assert_eq!(chunk_len(100, 0, 4), 0);
        assert_eq!(chunk_len(100, 8, 128), 0);
    }

    #[test]
    fn parallel_write_fills_every_chunk() {
        let entry = registry().lookup("ScanWrite32PtrUnrollLoop").unwrap();
        let mut region = MappedRegion::new(64 * 1024).unwrap();
        run_disjoint(entry, region.as_mut_slice(), 4, 2).unwrap();
        let pattern = sentinel_bytes(ElementWidth::W32);
        assert!(region.as_slice().chunks(4).all(|c| c == pattern));
    }

    #[test]
    fn leftover_bytes_are_not_visited() {
        let entry = registry().lookup("ScanWrite64IndexUnrollLoop").unwrap();
        let mut region = MappedRegion::new(1000).unwrap();
        run_disjoint(entry, region.as_mut_slice(), 3, 1).unwrap();
        let pattern = sentinel_bytes(ElementWidth::W64);
        assert!(region.as_slice()[..768].chunks(8).all(|c| c == pattern));
        assert!(region.as_slice()[768..].iter().all(|&b| b == 0));
    }

    #[test]
    fn too_many_parts_is_an_error() {
        let entry = registry().lookup("ScanRead128PtrUnrollLoop").unwrap();
        let mut region = MappedRegion::new(512).unwrap();
        let err = run_disjoint(entry, region.as_mut_slice(), 4, 1).unwrap_err();
        assert_eq!(err, KernelError::InvalidPartition { parts: 4, len: 512 });
    }

    #[test]
    fn walks_cannot_be_split() {
        let walk = registry()
            .entries()
            .find(|e| e.descriptor().is_permutation())
            .unwrap();
        let mut region = MappedRegion::new(4096).unwrap();
        assert!(matches!(
            run_disjoint(walk, region.as_mut_slice(), 2, 1),
            Err(KernelError::InvalidDescriptor(_))
        ));
    }
}
