use thiserror::Error;

use super::filter::SegmentName;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// The listing contained the same segment twice. A directory cannot hold two
    /// entries with one name, so the scan itself is broken.
    #[error("segment {0} appears more than once in the directory listing")]
    Duplicate(SegmentName),
}

/// Segments that are safe to process, plus the one that is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    /// Every segment except the frontier, ascending.
    pub eligible: Vec<SegmentName>,
    /// The newest segment. The receiver may still be writing it, and it needs it
    /// on disk to know where to resume streaming, so it is never processed.
    pub frontier: SegmentName,
}

/// Sorts the scanned segments and splits off the frontier.
///
/// Returns `Ok(None)` when fewer than two segments exist: the only candidate is
/// the frontier, so there is nothing to do.
pub fn plan_segments(mut segments: Vec<SegmentName>) -> Result<Option<SegmentPlan>, OrderingError> {
    segments.sort_unstable();

    if let Some(pair) = segments.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(OrderingError::Duplicate(pair[0].clone()));
    }

    let frontier = match segments.pop() {
        Some(frontier) if !segments.is_empty() => frontier,
        _ => return Ok(None),
    };

    Ok(Some(SegmentPlan {
        eligible: segments,
        frontier,
    }))
}
