//! Fixed-size fragment partitioning
//!
//! The input is split into `worker_count` contiguous half-open ranges of
//! `input_size / worker_count` bytes each. The last fragment also takes the
//! `input_size % worker_count` remainder, so it may be larger than the rest.
//! When there are more workers than bytes, every fragment but the last is
//! empty.

use xorcrypt_core::{TransformError, TransformResult, WorkerCount};

/// Half-open byte range `[start, end)` assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A fragment together with exclusive access to its bytes
#[derive(Debug)]
pub struct FragmentSlice<'a> {
    pub fragment: Fragment,
    pub data: &'a mut [u8],
}

/// Empty vector with room for exactly `count` per-worker entries.
///
/// Worker counts come straight from the caller, so a failed reservation
/// is reported instead of aborting the process.
pub(crate) fn per_worker_vec<T>(count: usize) -> TransformResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|_| TransformError::WorkerAllocation { workers: count })?;
    Ok(v)
}

/// Compute one fragment per worker covering `[0, input_size)`.
pub fn partition(input_size: usize, workers: WorkerCount) -> TransformResult<Vec<Fragment>> {
    let count = workers.get();
    let base = input_size / count;

    let mut fragments = per_worker_vec(count)?;
    fragments.extend((0..count).map(|index| {
        let start = index * base;
        let end = if index == count - 1 {
            input_size
        } else {
            (index + 1) * base
        };
        Fragment { index, start, end }
    }));
    Ok(fragments)
}

/// Split `buf` into disjoint mutable slices, one per fragment.
///
/// Fragments must be in order, contiguous, and end exactly at `buf.len()`.
pub fn split_fragments<'a>(
    buf: &'a mut [u8],
    fragments: &[Fragment],
) -> TransformResult<Vec<FragmentSlice<'a>>> {
    let total = buf.len();
    let mut rest = buf;
    let mut offset = 0;
    let mut slices = per_worker_vec(fragments.len())?;

    for fragment in fragments {
        if fragment.start != offset || fragment.end < fragment.start || fragment.end > total {
            return Err(TransformError::InvalidArgument(format!(
                "fragment {} [{}, {}) does not continue at offset {offset} of {total}",
                fragment.index, fragment.start, fragment.end
            )));
        }
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(fragment.len());
        slices.push(FragmentSlice {
            fragment: *fragment,
            data: head,
        });
        rest = tail;
        offset = fragment.end;
    }

    if offset != total {
        return Err(TransformError::InvalidArgument(format!(
            "fragments cover {offset} of {total} bytes"
        )));
    }
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn workers(n: i64) -> WorkerCount {
        WorkerCount::new(n).unwrap()
    }

    fn ranges(fragments: &[Fragment]) -> Vec<(usize, usize)> {
        fragments.iter().map(|f| (f.start, f.end)).collect()
    }

    #[test]
    fn remainder_goes_to_last_fragment() {
        let fragments = partition(7, workers(3)).unwrap();
        assert_eq!(ranges(&fragments), vec![(0, 2), (2, 4), (4, 7)]);
    }

    #[test]
    fn even_split() {
        let fragments = partition(12, workers(4)).unwrap();
        assert!(fragments.iter().all(|f| f.len() == 3));
    }

    #[test]
    fn more_workers_than_bytes() {
        let fragments = partition(3, workers(5)).unwrap();
        assert_eq!(
            ranges(&fragments),
            vec![(0, 0), (0, 0), (0, 0), (0, 0), (0, 3)]
        );
        assert!(fragments[..4].iter().all(Fragment::is_empty));
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(ranges(&partition(10, workers(1)).unwrap()), vec![(0, 10)]);
    }

    #[test]
    fn unreservable_worker_table_is_an_error() {
        let err = per_worker_vec::<Fragment>(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            TransformError::WorkerAllocation { workers: usize::MAX }
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn huge_worker_count_fails_without_aborting() {
        // 2^31 fragments of 24 bytes each cannot be reserved in one block
        let err = partition(10, workers(i64::from(i32::MAX))).unwrap_err();
        assert!(matches!(err, TransformError::WorkerAllocation { .. }));
    }

    #[test]
    fn split_hands_out_matching_slices() {
        let mut buf: Vec<u8> = (0..7).collect();
        let fragments = partition(7, workers(3)).unwrap();
        let slices = split_fragments(&mut buf, &fragments).unwrap();

        let lens: Vec<usize> = slices.iter().map(|s| s.data.len()).collect();
        assert_eq!(lens, vec![2, 2, 3]);
        assert_eq!(slices[2].data, &[4, 5, 6]);
    }

    #[test]
    fn split_rejects_gaps_and_overlap() {
        let mut buf = vec![0u8; 6];
        let gap = [
            Fragment { index: 0, start: 0, end: 2 },
            Fragment { index: 1, start: 3, end: 6 },
        ];
        assert!(split_fragments(&mut buf, &gap).is_err());

        let overlap = [
            Fragment { index: 0, start: 0, end: 4 },
            Fragment { index: 1, start: 2, end: 6 },
        ];
        assert!(split_fragments(&mut buf, &overlap).is_err());

        let short = [Fragment { index: 0, start: 0, end: 5 }];
        assert!(split_fragments(&mut buf, &short).is_err());
    }

    proptest! {
        /// Fragments are disjoint and their union is exactly [0, N)
        #[test]
        fn fragments_cover_input_exactly(n in 1usize..=4096, w in 1i64..=64) {
            let fragments = partition(n, workers(w)).unwrap();
            prop_assert_eq!(fragments.len(), w as usize);

            let mut expected = 0;
            for (i, f) in fragments.iter().enumerate() {
                prop_assert_eq!(f.index, i);
                prop_assert_eq!(f.start, expected, "fragments must be contiguous");
                prop_assert!(f.end >= f.start);
                prop_assert!(f.end <= n, "fragment out of bounds");
                expected = f.end;
            }
            prop_assert_eq!(expected, n);
        }

        /// All fragments but the last are exactly `base` bytes
        #[test]
        fn only_last_fragment_absorbs_remainder(n in 1usize..=4096, w in 1i64..=64) {
            let fragments = partition(n, workers(w)).unwrap();
            let base = n / w as usize;
            let (last, rest) = fragments.split_last().unwrap();
            prop_assert!(rest.iter().all(|f| f.len() == base));
            prop_assert_eq!(last.len(), base + n % w as usize);
        }
    }
}
