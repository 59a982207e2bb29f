//! Utility functions

const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Payload size in human-readable form, e.g. `256.00 KB`
pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    format!("{:.2} {}", size, unit)
}
