/// Countdown display, `MM:SS` with floor semantics
pub fn format_remaining(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Live zone time, e.g. `4.25 s`
pub fn format_zone_seconds(secs: f64) -> String {
    format!("{secs:.2} s")
}
