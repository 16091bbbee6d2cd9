//! Formatting and arithmetic helpers for progress display.
//!
//! All math is guarded: unknown totals yield 0 percent, zero elapsed yields
//! zero speed, zero speed yields unknown ETA. Never NaN, never a divide by
//! zero.

const BAR_LENGTH: usize = 20;

/// Percent complete in `[0, 100]`; 0 when the total is unknown.
pub fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((done as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}

/// Units per second; 0 when no time has elapsed.
pub fn speed(done: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    done as f64 / elapsed_secs
}

/// Estimated seconds remaining; `None` when the speed or total is unknown.
pub fn eta_secs(done: u64, total: u64, speed: f64) -> Option<u64> {
    if total == 0 || speed <= 0.0 {
        return None;
    }
    let remaining = total.saturating_sub(done);
    Some((remaining as f64 / speed).round() as u64)
}

/// Block progress bar, e.g. `████████▒▒▒▒▒▒▒▒▒▒▒▒ 40.00%`.
pub fn progress_bar(pct: f64) -> String {
    let pct = pct.clamp(0.0, 100.0);
    let filled = ((BAR_LENGTH as f64) * pct / 100.0) as usize;
    let filled = filled.min(BAR_LENGTH);
    format!(
        "{}{} {:.2}%",
        "█".repeat(filled),
        "▒".repeat(BAR_LENGTH - filled),
        pct
    )
}

/// Byte count in megabytes, e.g. `120.00MB`.
pub fn format_bytes(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Seconds as `H:MM:SS`.
pub fn format_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_unknown_total_is_zero() {
        assert_eq!(percent(1234, 0), 0.0);
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(percent(200, 100), 100.0);
        assert_eq!(percent(50, 100), 50.0);
    }

    #[test]
    fn test_speed_zero_elapsed() {
        assert_eq!(speed(1000, 0.0), 0.0);
        assert_eq!(speed(1000, -1.0), 0.0);
        assert_eq!(speed(1000, 2.0), 500.0);
    }

    #[test]
    fn test_eta_unknown_when_speed_zero() {
        assert_eq!(eta_secs(0, 100, 0.0), None);
        assert_eq!(eta_secs(0, 0, 10.0), None);
        assert_eq!(eta_secs(50, 100, 10.0), Some(5));
    }

    #[test]
    fn test_eta_never_negative() {
        // Done past total (content-length lied).
        assert_eq!(eta_secs(150, 100, 10.0), Some(0));
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert!(progress_bar(0.0).starts_with("▒"));
        assert!(progress_bar(100.0).starts_with("████████████████████"));
        assert!(progress_bar(100.0).ends_with("100.00%"));
        // Out-of-range input is clamped, not propagated.
        assert!(progress_bar(250.0).ends_with("100.00%"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00MB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(75), "0:01:15");
        assert_eq!(format_duration(3_725), "1:02:05");
    }
}
