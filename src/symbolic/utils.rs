// numeric helpers shared by the integrators and the sampler

/// Rounds `value` to `digits` significant decimal digits. Zero and non-finite values pass through.
pub fn round_to_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    // format/parse rounds in decimal, so 0.1 + 0.2 gives back 0.3
    let formatted = format!("{:.*e}", (digits - 1) as usize, value);
    formatted.parse::<f64>().unwrap_or(value)
}

/// `num_values` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    match num_values {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num_values as f64 - 1.0);
            (0..num_values)
                .map(|i| {
                    if i == num_values - 1 {
                        end
                    } else {
                        start + i as f64 * step
                    }
                })
                .collect()
        }
    }
}
