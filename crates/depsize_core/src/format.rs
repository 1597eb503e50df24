//! Size and download-time formatting.
//!
//! Kept consistent with the bundlephobia web UI: unit boundaries are decimal
//! orders of magnitude, conversions divide by 1024.

use crate::constants::{EMERGING_4G_KBITS, SLOW_3G_KBITS};

/// Estimated download time in seconds over each bandwidth profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadTime {
    pub three_g: f64,
    pub four_g: f64,
}

pub fn time_from_size(size_in_bytes: u64) -> DownloadTime {
    let kb = size_in_bytes as f64 / 1024.0;
    DownloadTime { three_g: kb / (SLOW_3G_KBITS / 8.0), four_g: kb / (EMERGING_4G_KBITS / 8.0) }
}

pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;
    if value < 1e3 {
        format!("{:.2}B", value)
    } else if value < 1e6 {
        format!("{:.2}kB", value / 1024.0)
    } else {
        format!("{:.2}MB", value / 1024.0 / 1024.0)
    }
}

pub fn format_time(seconds: f64) -> String {
    if seconds < 0.0005 {
        format!("{}µs", (seconds * 1_000_000.0).round())
    } else if seconds < 0.5 {
        format!("{}ms", (seconds * 1000.0).round())
    } else {
        format!("{}s", seconds)
    }
}
