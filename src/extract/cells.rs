use calamine::{Data, Range};
use regex::Regex;
use std::sync::OnceLock;

/// Tokens historical tables use for "no data"
const MISSING_TOKENS: &[&str] = &[
    "na", "n.a.", "n.a", "..", "...", "-", "\u{2013}", "\u{2014}", "", "nec", "np", "n/a",
];

/// Cell at an absolute (row, column) position, A1 being (0, 0)
pub fn cell(range: &Range<Data>, row: usize, col: usize) -> Option<&Data> {
    let row = u32::try_from(row).ok()?;
    let col = u32::try_from(col).ok()?;
    range.get_value((row, col))
}

/// Last absolute (row, column) covered by the range, if it has any cells
pub fn last_position(range: &Range<Data>) -> Option<(usize, usize)> {
    range.end().map(|(row, col)| (row as usize, col as usize))
}

/// Clean a cell to a finite number
///
/// Empty cells, missing-data markers, footnote text and anything that fails to
/// parse become `None`. Never fails.
pub fn clean_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::String(s) => clean_text(s),
        _ => None,
    }
}

fn clean_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}'))
        .collect();
    let lowered = cleaned.to_lowercase();
    if MISSING_TOKENS.contains(&lowered.as_str()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn financial_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("^(\\d{4})\\s*[\u{2013}-]\\s*\\d{2,4}").expect("financial year pattern is valid")
    })
}

fn plain_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})$").expect("plain year pattern is valid"))
}

/// Start year of a "1973-74" / "1973–74" label or a plain 4-digit year
pub fn parse_fy_year(cell: &Data) -> Option<i32> {
    match cell {
        Data::Int(i) if (1000..=9999).contains(i) => i32::try_from(*i).ok(),
        Data::Float(f) if f.fract() == 0.0 && (1000.0..=9999.0).contains(f) => Some(*f as i32),
        Data::String(s) => {
            let s = s.trim();
            let caps = financial_year_regex()
                .captures(s)
                .or_else(|| plain_year_regex().captures(s))?;
            caps.get(1)?.as_str().parse().ok()
        }
        _ => None,
    }
}

/// Integer year from a header cell such as `1860`, `1860.0` or `"1860"`
pub fn parse_integer_year(cell: &Data) -> Option<i32> {
    let value = match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !value.is_finite() || value.abs() > i32::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i32)
}

/// Trimmed text of a non-empty cell
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string().trim().to_string()),
    }
}
