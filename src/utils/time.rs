//! Time formatting for encoder arguments and file names

/// Seconds with millisecond precision, as passed to the encoder (`10.000`)
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Time of day style stamp safe for file names (`HH.MM.SS.mmm`)
pub fn format_filename_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}.{:02}.{:02}.{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(10.0), "10.000");
        assert_eq!(format_seconds(0.2399), "0.240");
        assert_eq!(format_seconds(-0.25), "-0.250");
    }

    #[test]
    fn test_format_filename_time() {
        assert_eq!(format_filename_time(0.0), "00.00.00.000");
        assert_eq!(format_filename_time(3723.5), "01.02.03.500");
    }
}
