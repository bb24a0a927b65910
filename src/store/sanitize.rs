/// Clamp a possibly-missing metric reading into `[min, max]`.
///
/// Missing, NaN, and infinite readings collapse to zero before clamping,
/// so a bad sample renders as zero instead of breaking a chart. When zero
/// lies outside the range, the nearest bound wins. Swapped or NaN bounds
/// are repaired rather than rejected; this function never panics.
pub fn sanitize(value: Option<f64>, min: f64, max: f64) -> f64 {
    let lo = if min.is_nan() { f64::NEG_INFINITY } else { min };
    let hi = if max.is_nan() { f64::INFINITY } else { max };
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };

    let v = match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    };

    v.clamp(lo, hi)
}
