//! Best-effort bounding-box extraction through `ogrinfo`.
//!
//! The report `ogrinfo -json` emits has no schema we rely on. It is treated
//! as an untyped tree and searched depth-first for the first `extent` key
//! holding four values. Every failure collapses to `None`: bounds are a
//! display convenience and must never abort a run.

use camino::Utf8Path;
use log::{debug, warn};
use serde_json::Value;
use tilebundle_core::{BoundingBox, ToolInvocation, ToolRunner};

use crate::ToolPaths;

/// Key searched for in the introspection report.
pub const EXTENT_KEY: &str = "extent";

/// Command that asks `ogrinfo` for a JSON summary of every layer.
#[must_use]
pub fn extent_invocation(tools: &ToolPaths, dataset: &Utf8Path) -> ToolInvocation {
    ToolInvocation::new(tools.ogrinfo.as_str())
        .args(["-so", "-al", "-json"])
        .arg(dataset.as_str())
}

/// Probe `dataset` for its extent.
///
/// Returns `None` when the tool cannot run, exits unsuccessfully, prints
/// something other than JSON, or reports no usable extent.
pub fn probe_extent<R>(runner: &R, tools: &ToolPaths, dataset: &Utf8Path) -> Option<BoundingBox>
where
    R: ToolRunner + ?Sized,
{
    let invocation = extent_invocation(tools, dataset);
    let output = match runner.run(&invocation) {
        Ok(output) => output,
        Err(err) => {
            warn!("extent probe for {dataset} could not run: {err}");
            return None;
        }
    };
    if !output.success() {
        warn!(
            "extent probe for {dataset} exited with {:?}: {}",
            output.status,
            output.stderr.trim()
        );
        return None;
    }
    let report: Value = match serde_json::from_str(&output.stdout) {
        Ok(report) => report,
        Err(err) => {
            warn!("extent probe for {dataset} printed malformed JSON: {err}");
            return None;
        }
    };
    let bounds = find_extent(&report);
    if bounds.is_none() {
        debug!("extent probe for {dataset} reported no usable extent");
    }
    bounds
}

/// Depth-first search for the first four-element `extent` in `report`.
///
/// An object's own `extent` is checked before its values, which are visited
/// in document order. The first match decides: if its elements cannot be
/// read as numbers the search yields `None` rather than looking further.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tilebundle_pipeline::extent::find_extent;
///
/// let report = json!({
///     "layers": [{ "geometryFields": [{ "extent": [-1.5, 50.0, 2.0, 52.5] }] }]
/// });
/// let bbox = find_extent(&report).expect("extent present");
/// assert_eq!(bbox.to_array(), [-1.5, 50.0, 2.0, 52.5]);
/// ```
#[must_use]
pub fn find_extent(report: &Value) -> Option<BoundingBox> {
    first_extent(report).and_then(coerce_extent)
}

fn first_extent(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Object(fields) => {
            if let Some(Value::Array(items)) = fields.get(EXTENT_KEY)
                && items.len() == 4
            {
                return Some(items);
            }
            fields.values().find_map(first_extent)
        }
        Value::Array(items) => items.iter().find_map(first_extent),
        _ => None,
    }
}

fn coerce_extent(items: &[Value]) -> Option<BoundingBox> {
    let [min_lon, min_lat, max_lon, max_lat] = items else {
        return None;
    };
    Some(BoundingBox::new(
        coerce(min_lon)?,
        coerce(min_lat)?,
        coerce(max_lon)?,
        coerce(max_lat)?,
    ))
}

fn coerce(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
