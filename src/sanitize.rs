//! Cleanup of captured console output for display.

/// Panel and box glyphs drawn by the pretty-printer.
pub const BOX_GLYPHS: &[char] = &[
    '╭', '╮', '╯', '╰', '│', '─', '┏', '┓', '┗', '┛', '━', '┃',
];

/// Lines containing any of these are console noise.
pub const NOISE_MARKERS: &[&str] = &["WARNING", "Response Running"];

/// Turn captured console output into display text.
///
/// Removes the box glyphs, drops noise lines, trims every remaining line and
/// the result as a whole. Total and idempotent.
pub fn clean(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !BOX_GLYPHS.contains(c)).collect();

    stripped
        .split('\n')
        .filter(|line| !NOISE_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
