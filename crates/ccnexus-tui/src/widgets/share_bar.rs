//! Horizontal share bar drawn with eighth-block characters.

const PARTIALS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// `fraction` of `width` cells filled, padded with spaces to `width`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::as_conversions
)]
pub fn share_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let eighths = (fraction * (width * 8) as f64).round() as usize;
    let full = eighths / 8;
    let rest = eighths % 8;

    let mut bar = "█".repeat(full);
    if rest > 0 && full < width {
        bar.push(PARTIALS[rest]);
    }
    let used = bar.chars().count();
    bar.push_str(&" ".repeat(width.saturating_sub(used)));
    bar
}

/// `part / total` as a fraction, zero when there is no total.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn fraction(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
