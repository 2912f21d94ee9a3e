use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

pub fn format_f64(f: f64) -> String {
    dtoa(f, FLOAT_CONFIG)
}

pub fn format_f64_vec(v: &[f64]) -> String {
    let a: Vec<String> = v.iter().map(|f| dtoa(*f, FLOAT_CONFIG)).collect();
    format!("[{}]", a.join(", "))
}

/// Formats a percentage with at most four significant digits, e.g. "2%".
pub fn format_percent(p: f64) -> String {
    let config = FLOAT_CONFIG.max_significant_digits(4);
    format!("{}%", dtoa(p, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_f64_vec(&[1.0, -2.5]), "[1, -2.5]");
        assert_eq!(format_percent(2.0), "2%");
        assert_eq!(format_percent(12.5), "12.5%");
    }
}
