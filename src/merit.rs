use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::frame::DispatchFrame;
use std::collections::HashMap;

/// Reorders the columns of a zone's dispatch frame in merit order.
///
/// Labels missing from the merit order are summed into the "Other"
/// bucket so that no energy is lost; the bucket is placed at its own
/// merit position, or last if the merit order does not list it.
/// Identically zero columns are dropped.
pub fn arrange_by_merit_order(frame: &DispatchFrame, config: &AnalysisConfig) -> Result<DispatchFrame> {
    let mut columns: HashMap<&str, Vec<f64>> = HashMap::with_capacity(frame.width());
    let mut unknown = Vec::default();

    for column in frame.columns() {
        let label = match config.merit_position(&column.label) {
            Some(_) => column.label.as_str(),
            None => {
                unknown.push(column.label.as_str());
                config.other_label.as_str()
            }
        };
        let sum = columns
            .entry(label)
            .or_insert_with(|| vec![0.0; frame.len()]);
        sum.iter_mut().zip(&column.values).for_each(|(s, v)| *s += v);
    }
    if !unknown.is_empty() {
        log::debug!(
            "technologies without merit order position moved to {}: {}",
            config.other_label,
            unknown.join(", ")
        );
    }

    let mut order = config
        .merit_order
        .iter()
        .map(String::as_str)
        .collect::<Vec<&str>>();
    if config.merit_position(&config.other_label).is_none() {
        order.push(&config.other_label);
    }

    let mut arranged = DispatchFrame::new(frame.index().clone());
    for label in order {
        if let Some(values) = columns.remove(label) {
            if values.iter().all(|&v| v == 0.0) {
                continue;
            }
            arranged.push_values(label, values)?;
        }
    }
    Ok(arranged)
}
