use crate::error::{StoreError, StoreResult};

/// Resolve optional bounds against a blob of `len` bytes.
///
/// Both bounds clamp to `len`, so a start past the end yields an empty range.
pub(crate) fn resolve_bounds(
    path: &str,
    len: u64,
    start: Option<u64>,
    end: Option<u64>,
) -> StoreResult<(u64, u64)> {
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(len);
    if start > end {
        return Err(StoreError::InvalidRange {
            path: path.to_string(),
            start,
            end,
        });
    }
    Ok((start.min(len), end.min(len)))
}

/// Apply a half-open range to an in-memory blob.
pub fn slice_range<'a>(
    path: &str,
    data: &'a [u8],
    start: Option<u64>,
    end: Option<u64>,
) -> StoreResult<&'a [u8]> {
    let (start, end) = resolve_bounds(path, data.len() as u64, start, end)?;
    Ok(&data[start as usize..end as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_blob_without_bounds() {
        assert_eq!(slice_range("b", b"abcdef", None, None).unwrap(), b"abcdef");
    }

    #[test]
    fn open_end_reads_to_end() {
        assert_eq!(slice_range("b", b"abcdef", Some(2), None).unwrap(), b"cdef");
    }

    #[test]
    fn open_start_reads_from_zero() {
        assert_eq!(slice_range("b", b"abcdef", None, Some(3)).unwrap(), b"abc");
    }

    #[test]
    fn end_past_blob_is_clamped() {
        assert_eq!(slice_range("b", b"abc", Some(1), Some(50)).unwrap(), b"bc");
        assert!(slice_range("b", b"abc", Some(10), Some(50)).unwrap().is_empty());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = slice_range("b", b"abcdef", Some(4), Some(1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange { start: 4, end: 1, .. }));
    }

    proptest! {
        #[test]
        fn in_bounds_range_has_exact_length(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            a in 0usize..512,
            b in 0usize..512,
        ) {
            let n = data.len();
            let (a, b) = (a.min(n), b.min(n));
            let (a, b) = (a.min(b), a.max(b));
            let out = slice_range("p", &data, Some(a as u64), Some(b as u64)).unwrap();
            prop_assert_eq!(out.len(), b - a);
            prop_assert_eq!(out, &data[a..b]);

            let tail = slice_range("p", &data, Some(a as u64), None).unwrap();
            prop_assert_eq!(tail, &data[a..]);
        }
    }
}
