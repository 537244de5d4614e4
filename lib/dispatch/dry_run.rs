use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::segments::SegmentPlan;
use crate::template::CommandTemplate;

use super::{DispatchError, DispatchSummary, WorkItem};

/// Writes the command each eligible segment would get, ascending, followed by the
/// frontier that would be left alone. Nothing is executed.
///
/// Paths and commands are written as raw bytes, so the output can be replayed
/// even when the directory name is not valid UTF-8.
pub fn print_plan<W: Write>(
    directory: &Path,
    plan: &SegmentPlan,
    template: &CommandTemplate,
    out: &mut W,
) -> Result<DispatchSummary, DispatchError> {
    for segment in &plan.eligible {
        let item = WorkItem::new(directory, segment, template);
        write!(out, "would process {} in ", item.segment)?;
        out.write_all(directory.as_os_str().as_bytes())?;
        out.write_all(b" by running `")?;
        out.write_all(item.command.as_bytes())?;
        out.write_all(b"`\n")?;
    }
    writeln!(out, "would not process {}", plan.frontier)?;
    out.flush()?;

    Ok(DispatchSummary {
        eligible: plan.eligible.len(),
        dispatched: plan.eligible.len(),
        completed: 0,
        frontier: plan.frontier.clone(),
        dry_run: true,
    })
}

#[cfg(test)]
mod tests {
    use super::print_plan;
    use crate::segments::{filter_segments, plan_segments};
    use crate::template::CommandTemplate;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    #[test]
    fn prints_eligible_in_order_then_frontier() {
        let plan = plan_segments(filter_segments([
            "000000000000000000000003",
            "000000000000000000000001",
            "000000000000000000000002",
        ]))
        .expect("no duplicates")
        .expect("work to do");
        let template = CommandTemplate::parse("gzip -c %p > /backup/%f.gz").expect("template");

        let mut out = Vec::new();
        let summary =
            print_plan(Path::new("/srv/xlog"), &plan, &template, &mut out).expect("dry run");

        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "would process 000000000000000000000001 in /srv/xlog by running \
             `gzip -c /srv/xlog/000000000000000000000001 > /backup/000000000000000000000001.gz`\n\
             would process 000000000000000000000002 in /srv/xlog by running \
             `gzip -c /srv/xlog/000000000000000000000002 > /backup/000000000000000000000002.gz`\n\
             would not process 000000000000000000000003\n"
        );
        assert!(summary.dry_run);
        assert_eq!(summary.eligible, 2);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.frontier.as_str(), "000000000000000000000003");
    }

    #[test]
    fn non_utf8_directory_is_printed_verbatim() {
        let plan = plan_segments(filter_segments([
            "000000000000000000000001",
            "000000000000000000000002",
        ]))
        .expect("no duplicates")
        .expect("work to do");
        let template = CommandTemplate::parse("test -e %p").expect("template");
        let directory = Path::new(OsStr::from_bytes(b"/srv/xlog\xff"));

        let mut out = Vec::new();
        print_plan(directory, &plan, &template, &mut out).expect("dry run");

        let mut expected = b"would process 000000000000000000000001 in /srv/xlog\xff by running \
              `test -e /srv/xlog\xff/000000000000000000000001`\n"
            .to_vec();
        expected.extend_from_slice(b"would not process 000000000000000000000002\n");
        assert_eq!(out, expected);
    }
}
