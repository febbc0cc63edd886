/// Format a byte count with binary units, one decimal place.
///
/// `2000398934016` → `"1.8T"`, `512` → `"512B"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "K", "M", "G", "T", "P"];

    if bytes < 1024 {
        return format!("{bytes}B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_bytes() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
    }

    #[test]
    fn format_size_binary_units() {
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(512 * 1024 * 1024), "512.0M");
        assert_eq!(format_size(20 * 1024 * 1024 * 1024), "20.0G");
    }

    #[test]
    fn format_size_real_disk() {
        assert_eq!(format_size(2_000_398_934_016), "1.8T");
    }
}
