use std::fmt;

/// Length of a WAL segment filename: timeline, log id and segment number as
/// three 8-digit hex fields.
pub const SEGMENT_NAME_LEN: usize = 24;

/// A validated WAL segment filename.
///
/// Segment names are fixed-width uppercase hex counters, so byte-wise ordering
/// of the names is the order in which the receiver wrote them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentName(String);

impl SegmentName {
    /// Returns `None` for anything that is not a segment filename (partial files,
    /// `.history` files, temp files and so on).
    pub fn parse(name: &str) -> Option<Self> {
        is_segment_name(name).then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SegmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True iff `name` is exactly 24 characters of `0-9A-F`.
pub fn is_segment_name(name: &str) -> bool {
    name.len() == SEGMENT_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

/// Keeps the entries that are segment filenames. Input order is preserved; no sorting
/// happens here.
pub fn filter_segments<I, S>(names: I) -> Vec<SegmentName>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| SegmentName::parse(name.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_segments, is_segment_name, SegmentName};

    #[test]
    fn accepts_uppercase_hex_of_exact_length() {
        assert!(is_segment_name("000000010000000A000000FF"));
        assert!(is_segment_name("0123456789ABCDEF01234567"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_segment_name(""));
        assert!(!is_segment_name("00000001000000000000001"));
        assert!(!is_segment_name("0000000100000000000000010"));
        assert!(!is_segment_name("000000010000000000000001.partial"));
    }

    #[test]
    fn rejects_non_hex_and_lowercase() {
        assert!(!is_segment_name("000000010000000a000000ff"));
        assert!(!is_segment_name("00000001000000000000000G"));
        assert!(!is_segment_name("0000000100000000-0000001"));
        // 24 bytes but not 24 hex characters
        assert!(!is_segment_name("0000000100000000000000é"));
    }

    #[test]
    fn filter_drops_noise_and_keeps_input_order() {
        let names = [
            "000000010000000000000003",
            "00000002.history",
            "000000010000000000000001",
            "000000010000000000000002.partial",
            "archive_status",
            "000000010000000000000002",
        ];

        let kept: Vec<String> = filter_segments(names)
            .into_iter()
            .map(|segment| segment.to_string())
            .collect();

        assert_eq!(
            kept,
            vec![
                "000000010000000000000003",
                "000000010000000000000001",
                "000000010000000000000002",
            ]
        );
    }

    #[test]
    fn parse_returns_none_for_invalid_names() {
        assert!(SegmentName::parse("not-a-segment").is_none());
        assert_eq!(
            SegmentName::parse("00000001000000000000000A")
                .expect("valid segment")
                .as_str(),
            "00000001000000000000000A"
        );
    }
}
