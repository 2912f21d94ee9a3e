use crate::config::AnalysisConfig;
use crate::debug::format_f64_vec;
use crate::frame::DispatchFrame;

/// Nets the interconnection flows of a zone.
///
/// When both the flow-in and flow-out columns are present they are
/// replaced, in place, by
///
/// ```txt
///     FlowOut = min(0, FlowIn + FlowOut)
///     FlowIn  = max(0, FlowIn + FlowOut)
/// ```
///
/// so that at every timestep at most one of them is non-zero. A frame
/// holding only one of the two columns is returned unchanged. Netting is
/// idempotent.
pub fn net_flows(frame: &DispatchFrame, config: &AnalysisConfig) -> DispatchFrame {
    let mut netted = frame.clone();

    let (flow_in, flow_out) = match (
        frame.column(&config.flow_in_label),
        frame.column(&config.flow_out_label),
    ) {
        (Some(flow_in), Some(flow_out)) => (flow_in, flow_out),
        _ => return netted,
    };

    let net = flow_in
        .iter()
        .zip(flow_out)
        .map(|(i, o)| i + o)
        .collect::<Vec<f64>>();

    let new_out = net.iter().map(|&n| n.min(0.0)).collect::<Vec<f64>>();
    let new_in = net.iter().map(|&n| n.max(0.0)).collect::<Vec<f64>>();

    log::trace!("net interconnection flow: {}", format_f64_vec(&net));

    for (label, values) in [
        (&config.flow_out_label, new_out),
        (&config.flow_in_label, new_in),
    ] {
        if let Some(column) = netted.column_mut(label) {
            *column = values;
        }
    }
    netted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{frame, hourly};
    use anyhow::Result;

    #[test]
    fn test_net_flows() -> Result<()> {
        let config = AnalysisConfig::default();
        let index = hourly(3);
        let raw = frame(
            &index,
            &[
                ("FlowOut", &[-5.0, -2.0, -3.0]),
                ("GAS", &[10.0, 10.0, 10.0]),
                ("FlowIn", &[3.0, 4.0, 3.0]),
            ],
        );
        let netted = net_flows(&raw, &config);
        assert_eq!(netted.labels().collect::<Vec<_>>(), ["FlowOut", "GAS", "FlowIn"]);
        assert_eq!(netted.column("FlowOut"), Some([-2.0, 0.0, 0.0].as_slice()));
        assert_eq!(netted.column("FlowIn"), Some([0.0, 2.0, 0.0].as_slice()));
        assert_eq!(netted.column("GAS"), raw.column("GAS"));
        Ok(())
    }

    #[test]
    fn test_net_flows_idempotent() {
        let config = AnalysisConfig::default();
        let index = hourly(4);
        let raw = frame(
            &index,
            &[
                ("FlowOut", &[-5.0, 2.0, -3.0, 0.0]),
                ("FlowIn", &[3.0, -4.0, 3.0, 7.0]),
            ],
        );
        let once = net_flows(&raw, &config);
        let twice = net_flows(&once, &config);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_single_flow_column_unchanged() {
        let config = AnalysisConfig::default();
        let index = hourly(2);
        let raw = frame(&index, &[("FlowIn", &[3.0, 4.0]), ("GAS", &[1.0, 1.0])]);
        assert_eq!(net_flows(&raw, &config), raw);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let config = AnalysisConfig::default();
        let index = hourly(1);
        let raw = frame(&index, &[("FlowOut", &[-5.0]), ("FlowIn", &[3.0])]);
        let copy = raw.clone();
        let _ = net_flows(&raw, &config);
        assert_eq!(raw, copy);
    }
}
