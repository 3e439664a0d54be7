/// Unit labels for successive powers of 1024
const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Format a byte count with a 1024-based unit and two decimals.
///
/// `0` is rendered as the literal `"0 B"`; anything beyond petabytes stays in PB.
pub fn bytes_to_human_readable(bytes: u64) -> String {
    scaled_bytes_to_human_readable(bytes as f64)
}

/// Same as [`bytes_to_human_readable`] for fractional values such as averages
pub fn scaled_bytes_to_human_readable(value: f64) -> String {
    if value == 0.0 {
        return "0 B".to_string();
    }

    let mut scaled = value;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", scaled, UNITS[unit])
}
