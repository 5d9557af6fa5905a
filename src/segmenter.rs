// src/segmenter.rs

use crate::models::Segment;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("segment size must be at least 1 byte")]
    ZeroSegmentSize,
}

/// Splits `content_length` bytes into ordered segments of `segment_size`.
///
/// The last segment is clamped to the end of the resource. An empty resource
/// still yields one zero-length segment so that an (empty) file is written.
pub fn compute_segments(content_length: u64, segment_size: u64) -> Result<Vec<Segment>, SegmentError> {
    if segment_size == 0 {
        return Err(SegmentError::ZeroSegmentSize);
    }
    if content_length == 0 {
        return Ok(vec![Segment { index: 0, start_byte: 0, len: 0 }]);
    }

    let count = content_length.div_ceil(segment_size);
    let segments = (0..count)
        .map(|i| {
            let start_byte = i * segment_size;
            let len = segment_size.min(content_length - start_byte);
            Segment { index: i as usize, start_byte, len }
        })
        .collect();
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(segments: &[Segment], total: u64) {
        let mut next = 0;
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(seg.start_byte, next, "gap or overlap before segment {i}");
            next = seg.start_byte + seg.len;
        }
        assert_eq!(next, total);
    }

    #[test]
    fn test_three_segments_last_clamped() {
        let segments = compute_segments(10_000, 4_000).unwrap();
        let ranges: Vec<_> = segments
            .iter()
            .map(|s| (s.start_byte, s.end_byte().unwrap()))
            .collect();
        assert_eq!(ranges, vec![(0, 3999), (4000, 7999), (8000, 9999)]);
    }

    #[test]
    fn test_exact_multiple() {
        let segments = compute_segments(4096, 1024).unwrap();
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|s| s.len == 1024));
        assert_covers(&segments, 4096);
    }

    #[test]
    fn test_count_and_coverage_over_many_sizes() {
        for total in [1u64, 2, 7, 1023, 1024, 1025, 65_537] {
            for size in [1u64, 3, 512, 1024, 100_000] {
                let segments = compute_segments(total, size).unwrap();
                assert_eq!(segments.len() as u64, total.div_ceil(size));
                assert_covers(&segments, total);
            }
        }
    }

    #[test]
    fn test_empty_resource_single_empty_segment() {
        let segments = compute_segments(0, 1024).unwrap();
        assert_eq!(segments, vec![Segment { index: 0, start_byte: 0, len: 0 }]);
    }

    #[test]
    fn test_zero_segment_size_rejected() {
        assert_eq!(compute_segments(100, 0), Err(SegmentError::ZeroSegmentSize));
    }
}
