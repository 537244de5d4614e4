//! Segment selection: which files in an xlog directory are WAL segments, in what
//! order they were written, and which one is still owned by the receiver.

mod filter;
mod order;

pub use filter::{filter_segments, is_segment_name, SegmentName, SEGMENT_NAME_LEN};
pub use order::{plan_segments, OrderingError, SegmentPlan};
