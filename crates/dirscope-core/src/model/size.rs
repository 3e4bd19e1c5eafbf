/// Size formatting utilities: human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.
///
/// The unit tier is picked from the number of decimal digits in the byte
/// count, not from its magnitude in powers of 1024. That keeps displayed
/// values identical to earlier releases, at the price of labels such as
/// `0.95 MB` for one million bytes.
use std::fmt;

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

/// A formatted byte count split into its numeric text and unit label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanSize {
    pub value: String,
    pub unit: &'static str,
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Convert a byte count into a value/unit pair.
///
/// | digits | unit | value            |
/// |--------|------|------------------|
/// | 1–3    | B    | raw integer      |
/// | 4–6    | KB   | bytes / 1024     |
/// | 7–9    | MB   | bytes / 1024²    |
/// | 10–12  | GB   | bytes / 1024³    |
/// | 13+    | TB   | bytes / 1024⁴    |
///
/// Every tier above bytes is rendered with two decimals.
pub fn humanize(bytes: u64) -> HumanSize {
    let digits = bytes.to_string().len();
    let b = bytes as f64;
    let (scaled, unit) = match digits {
        1..=3 => {
            return HumanSize {
                value: bytes.to_string(),
                unit: "B",
            }
        }
        4..=6 => (b / KB, "KB"),
        7..=9 => (b / MB, "MB"),
        10..=12 => (b / GB, "GB"),
        _ => (b / TB, "TB"),
    };
    HumanSize {
        value: format!("{scaled:.2}"),
        unit,
    }
}

/// Format a byte count as a single display string, e.g. `"1.00 KB"`.
pub fn format_size(bytes: u64) -> String {
    humanize(bytes).to_string()
}
