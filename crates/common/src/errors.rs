//! Rendering of error chains.

use std::error::Error;

/// Renders `report` and its causes on one line, separated by `; `.
pub fn display_chain(report: &eyre::Report) -> String {
    let root: &(dyn Error + 'static) = report.as_ref();
    dedup_chain(root).join("; ")
}

/// The messages of `error` and all its sources.
///
/// A cause whose message is already part of the previous one is dropped, so `rpc failed: eof`
/// caused by `eof` yields a single entry.
pub fn dedup_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut messages: Vec<String> = std::iter::successors(Some(error), |&err| err.source())
        .map(|err| err.to_string().trim().to_string())
        .collect();
    messages.dedup_by(|cause, outer| outer.contains(cause.as_str()));
    messages
}
