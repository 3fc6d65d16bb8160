//! Chart payload validation
//!
//! Pure checks over the interactive charts of an iteration draft. Runs
//! before any store write, so a rejected draft leaves no partial state.

use crate::entity::InteractiveChart;
use crate::{Error, Result};
use std::collections::HashSet;

/// Validate the interactive charts of one iteration.
///
/// Checks, per chart list:
/// - chart names are distinct;
/// - every chart has equally long `x_data` and `y_data` series.
///
/// # Errors
///
/// Returns [`Error::DuplicateChartNames`] or
/// [`Error::ChartDataLengthMismatch`], each carrying its stable message.
pub fn validate_interactive_charts(charts: &[InteractiveChart]) -> Result<()> {
    let mut seen = HashSet::with_capacity(charts.len());
    for chart in charts {
        if !seen.insert(chart.chart_name.as_str()) {
            return Err(Error::DuplicateChartNames);
        }
        if chart.x_data.len() != chart.y_data.len() {
            return Err(Error::ChartDataLengthMismatch);
        }
    }
    Ok(())
}
