//! Byte ranges for partial reads.

use super::error::StorageError;

/// An inclusive byte range `[start, end]` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range, never zero.
    #[must_use]
    pub const fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Parse a `Range` header value against a file of `size` bytes.
    ///
    /// Accepts `bytes=<start>-<end>`, `bytes=<start>-` and `bytes=-<suffix>`.
    /// Everything else, including multiple ranges and ranges that do not fit
    /// inside the file, is rejected instead of clamped.
    pub fn parse(header: &str, size: u64) -> Result<Self, StorageError> {
        let unsatisfiable = || StorageError::RangeNotSatisfiable { size };

        if size == 0 {
            return Err(unsatisfiable());
        }
        let ranges = header
            .trim()
            .strip_prefix("bytes=")
            .ok_or_else(unsatisfiable)?;
        if ranges.contains(',') {
            return Err(unsatisfiable());
        }
        let (start_part, end_part) = ranges.split_once('-').ok_or_else(unsatisfiable)?;
        let (start_part, end_part) = (start_part.trim(), end_part.trim());

        let (start, end) = if start_part.is_empty() {
            let suffix: u64 = end_part.parse().map_err(|_| unsatisfiable())?;
            if suffix == 0 {
                return Err(unsatisfiable());
            }
            (size.saturating_sub(suffix), size - 1)
        } else {
            let start: u64 = start_part.parse().map_err(|_| unsatisfiable())?;
            let end: u64 = if end_part.is_empty() {
                size - 1
            } else {
                end_part.parse().map_err(|_| unsatisfiable())?
            };
            (start, end)
        };

        if start > end || end >= size {
            return Err(unsatisfiable());
        }

        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bytes=0-99", 1000, 0, 99)]
    #[case("bytes=900-999", 1000, 900, 999)]
    #[case("bytes=500-", 1000, 500, 999)]
    #[case("bytes=-100", 1000, 900, 999)]
    #[case("bytes=-5000", 1000, 0, 999)]
    #[case("bytes=0-0", 1, 0, 0)]
    fn test_parse_valid(
        #[case] header: &str,
        #[case] size: u64,
        #[case] start: u64,
        #[case] end: u64,
    ) {
        let range = ByteRange::parse(header, size).expect("valid range");
        assert_eq!(range, ByteRange { start, end });
        assert_eq!(range.byte_count(), end - start + 1);
    }

    #[rstest]
    #[case("bytes=900-999", 500)]
    #[case("bytes=100-50", 1000)]
    #[case("bytes=0-1000", 1000)]
    #[case("bytes=1000-", 1000)]
    #[case("bytes=0-99", 0)]
    #[case("bytes=-0", 1000)]
    #[case("bytes=0-9,20-29", 1000)]
    #[case("items=0-9", 1000)]
    #[case("bytes=abc-def", 1000)]
    #[case("bytes=10", 1000)]
    fn test_parse_unsatisfiable(#[case] header: &str, #[case] size: u64) {
        let err = ByteRange::parse(header, size).unwrap_err();
        assert!(matches!(err, StorageError::RangeNotSatisfiable { size: s } if s == size));
    }
}
