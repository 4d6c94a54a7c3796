//! Time formatting and threshold arithmetic shared by the tracker and the CLI.

/// Convert a "required minutes" setting to seconds.
///
/// Fractional minutes are allowed (`0.1` -> `6.0`).
pub fn required_seconds(required_minutes: f64) -> f64 {
    required_minutes * 60.0
}

/// 0.0 ..= 100.0 progress towards `required_secs`.
pub fn progress_percent(elapsed_secs: u64, required_secs: f64) -> f64 {
    if required_secs <= 0.0 {
        return 100.0;
    }
    (elapsed_secs as f64 / required_secs * 100.0).min(100.0)
}

/// Whole minutes still needed, rounded up. Zero once the threshold is met.
pub fn remaining_minutes(elapsed_secs: u64, required_secs: f64) -> u64 {
    let remaining = (required_secs - elapsed_secs as f64).max(0.0);
    (remaining / 60.0).ceil() as u64
}

/// Stopwatch rendering: `MM:SS`, or `H:MM:SS` once an hour has passed.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Compact human rendering used in status lines (`45s`, `3m 05s`, `1h 02m`).
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, m) => format!("{m}m {seconds:02}s"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}
