//! Colors and number formatting for the summary image.

use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

/// Microsoft Office (2013+) chart series palette.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
    RGBColor(38, 68, 120),   // dark blue (#264478)
    RGBColor(158, 72, 14),   // dark org. (#9E480E)
    RGBColor(99, 99, 99),    // dark gray (#636363)
    RGBColor(153, 115, 0),   // brownish  (#997300)
];

/// Title color used for headings.
pub const HEADING: RGBColor = RGBColor(0, 100, 200);

/// Light background behind the whole canvas.
pub const BACKGROUND: RGBColor = RGBColor(240, 240, 240);

#[inline]
pub fn office_color(idx: usize) -> RGBAColor {
    OFFICE10[idx % OFFICE10.len()].to_rgba()
}

/// Whole-dollar amount with thousands separators, e.g. `$1,234,567`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() || value < 0.0 {
        return "n/a".to_string();
    }
    format!("${}", (value.round() as u64).to_formatted_string(&Locale::en))
}
