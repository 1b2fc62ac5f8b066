// Random draws used by the sampler.
//
// Two draws are derived from a `RandomSource`:
// - `uniform_index`: `next_raw() % bound`. Modulo reduction is slightly
//   biased toward small values whenever `bound` does not divide the source's
//   range. With a 64-bit source and bounds the size of a patch or a patch
//   list the bias is below 2^-40 and is accepted; swapping in rejection
//   sampling would change how many raw values each update consumes.
// - `uniform_unit`: `next_raw() / max_raw()`, in `[0, 1]`, kept in f64. The
//   top end is reachable (raw == max, or raw within one f64 ulp of it);
//   `select_categorical` clamps it. The cumulative walk also runs in f64, so
//   a category whose probability underflowed to zero is only picked by the
//   clamp on that vanishing top edge.
//
// The categorical draw is a softmax in the log domain (subtract the max
// before exponentiating) followed by an inverse-CDF walk.

use item_field_prng::RandomSource;

/// Uniform integer in `[0, bound)` by modulo reduction. `bound` must be non-zero.
pub fn uniform_index<R: RandomSource + ?Sized>(rng: &mut R, bound: u64) -> u64 {
    rng.next_raw() % bound
}

/// Uniform float in `[0, 1]`. The source's `max_raw()` must be non-zero.
pub fn uniform_unit<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    rng.next_raw() as f64 / rng.max_raw() as f64
}

/// Turn log-potentials into probabilities in place.
///
/// Returns `false` if no distribution can be formed: the slice is empty, the
/// largest entry is NaN or infinite, or the exponentials do not sum to a
/// finite positive value. The slice contents are unspecified in that case.
pub fn normalize_exp(values: &mut [f32]) -> bool {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return false;
    }

    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if !(sum.is_finite() && sum > 0.0) {
        return false;
    }

    for v in values.iter_mut() {
        *v /= sum;
    }
    true
}

/// Smallest index whose cumulative probability exceeds `u`.
///
/// If rounding leaves the total at or below `u`, returns the last index.
pub fn select_categorical(probabilities: &[f32], u: f64) -> usize {
    let mut cumulative = 0.0f64;
    for (i, &p) in probabilities.iter().enumerate() {
        cumulative += f64::from(p);
        if cumulative > u {
            return i;
        }
    }
    probabilities.len().saturating_sub(1)
}

/// Draw a category from log-potentials, normalizing `log_probabilities` in place.
///
/// Always consumes exactly one raw value, even when the distribution is
/// degenerate and `None` is returned.
pub fn sample_log_categorical<R: RandomSource + ?Sized>(
    log_probabilities: &mut [f32],
    rng: &mut R,
) -> Option<usize> {
    let u = uniform_unit(rng);
    if !normalize_exp(log_probabilities) {
        return None;
    }
    Some(select_categorical(log_probabilities, u))
}
