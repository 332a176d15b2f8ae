//! Axis tick helpers for the delay plot.

/// Choose a "nice" step (1/2/5 ladder) for an axis covering `range` with
/// roughly `target_ticks` divisions.
pub fn nice_step(range: f64, target_ticks: f64) -> f64 {
    if !range.is_finite() || range <= 0.0 || target_ticks <= 0.0 {
        return 0.0;
    }

    let raw = range / target_ticks;
    let base = 10.0f64.powf(raw.log10().floor());
    let ratio = raw / base;
    if ratio <= 1.0 {
        base
    } else if ratio <= 2.0 {
        base * 2.0
    } else if ratio <= 5.0 {
        base * 5.0
    } else {
        base * 10.0
    }
}

/// Format a seconds label, using the step magnitude to pick the unit and
/// precision.
pub fn format_secs_label(secs: f64, step: f64) -> String {
    if step >= 1.0 {
        format!("{secs:.0} s")
    } else if step >= 0.1 {
        format!("{secs:.1} s")
    } else {
        format!("{:.0} ms", secs * 1000.0)
    }
}

/// Stride between labelled slots so slot labels keep at least `min_px`
/// of horizontal room.
pub fn slot_stride(count: usize, inner_width: f32, min_px: f32) -> usize {
    if count <= 1 || inner_width <= 0.0 {
        return 1;
    }

    let per_slot = inner_width / (count - 1) as f32;
    (min_px / per_slot).ceil().max(1.0) as usize
}
