//! Number and date scanning over loosely formatted text.

use chrono::NaiveDate;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// A magnitude found in text, with its byte span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberMatch {
    pub start: usize,
    pub end: usize,
    pub magnitude: f64,
}

fn sign_of(c: char) -> Option<f64> {
    match c {
        '+' | '▲' => Some(1.0),
        '-' | '−' | '–' | '▼' => Some(-1.0),
        _ => None,
    }
}

/// Finds the first maximal decimal-or-integer substring. Commas followed by
/// exactly three digits are thousands separators.
pub fn find_number(text: &str) -> Option<NumberMatch> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    let mut seen_dot = false;

    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() {
            end += 1;
        } else if b == b',' && !seen_dot && is_thousands_group(&bytes[end + 1..]) {
            end += 1;
        } else if b == b'.' && !seen_dot && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }

    let digits: String = text[start..end].chars().filter(|c| *c != ',').collect();
    digits.parse::<f64>().ok().map(|magnitude| NumberMatch {
        start,
        end,
        magnitude,
    })
}

fn is_thousands_group(rest: &[u8]) -> bool {
    rest.len() >= 3
        && rest[..3].iter().all(u8::is_ascii_digit)
        && !rest.get(3).is_some_and(u8::is_ascii_digit)
}

pub fn parse_magnitude(text: &str) -> Option<f64> {
    find_number(text).map(|m| m.magnitude)
}

/// Parses a change cell: the magnitude with any sign directly in front of it.
pub fn parse_signed(text: &str) -> Option<f64> {
    let m = find_number(text)?;
    let sign = text[..m.start]
        .trim_end()
        .chars()
        .next_back()
        .and_then(sign_of)
        .unwrap_or(1.0);
    Some(sign * m.magnitude)
}

/// Finds the first number written with an explicit sign, skipping
/// percentages.
pub fn find_signed_number(text: &str) -> Option<f64> {
    let mut offset = 0;
    while let Some(m) = find_number(&text[offset..]) {
        let start = offset + m.start;
        let end = offset + m.end;
        let mut before = text[..start].chars().rev();
        // A dash glued to a preceding word or digit is a range, not a sign.
        let sign = before
            .next()
            .and_then(sign_of)
            .filter(|_| !before.next().is_some_and(char::is_alphanumeric));
        let is_percentage = text[end..].trim_start().starts_with('%');
        if let Some(sign) = sign
            && !is_percentage
        {
            return Some(sign * m.magnitude);
        }
        offset = end;
    }
    None
}

/// A cell holding nothing but an unsigned number, e.g. `1,030` or `977.26`.
pub fn is_pure_numeric(cell: &str) -> bool {
    let cell = cell.trim();
    find_number(cell).is_some_and(|m| m.start == 0 && m.end == cell.len())
}

/// A cell with a currency marker and a number, e.g. `$1,234` or `USD 980`.
pub fn is_currency_marked(cell: &str) -> bool {
    (cell.contains('$') || cell.to_uppercase().contains("USD")) && find_number(cell).is_some()
}

/// Finds date tokens and blanks them out so their digits are not read as
/// index values. Returns the masked text and the dates in order of
/// appearance.
pub fn extract_dates(text: &str) -> (String, Vec<NaiveDate>) {
    let mut masked = String::with_capacity(text.len());
    let mut dates = Vec::new();
    let mut last = 0;

    for (start, end) in token_spans(text) {
        let token = &text[start..end];
        let trimmed = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        let Some(date) = parse_date(trimmed) else {
            continue;
        };
        // `trimmed` is ASCII, so its offset inside `token` is a char boundary.
        let inner_start = start + token.find(trimmed).unwrap_or(0);
        let inner_end = inner_start + trimmed.len();
        masked.push_str(&text[last..inner_start]);
        masked.push_str(&" ".repeat(trimmed.len()));
        last = inner_end;
        dates.push(date);
    }
    masked.push_str(&text[last..]);
    (masked, dates)
}

fn parse_date(token: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
}

fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_number_with_thousands() {
        let m = find_number("USD 1,234.50/FEU").unwrap();
        assert_eq!(m.magnitude, 1234.5);
        assert_eq!(&"USD 1,234.50/FEU"[m.start..m.end], "1,234.50");
        assert_eq!(parse_magnitude("1,030"), Some(1030.0));
        assert_eq!(parse_magnitude("1,2"), Some(1.0));
        assert_eq!(parse_magnitude("no digits"), None);
    }

    #[test]
    fn test_parse_signed() {
        assert_eq!(parse_signed("-20"), Some(-20.0));
        assert_eq!(parse_signed("+ 15.5"), Some(15.5));
        assert_eq!(parse_signed("▼ 3"), Some(-3.0));
        assert_eq!(parse_signed("−1,200"), Some(-1200.0));
        assert_eq!(parse_signed("42"), Some(42.0));
        assert_eq!(parse_signed("n/a"), None);
    }

    #[test]
    fn test_find_signed_number_skips_percentages() {
        assert_eq!(find_signed_number("up +2.5% or +31.4 points"), Some(31.4));
        assert_eq!(find_signed_number("steady at 12 points"), None);
        assert_eq!(find_signed_number("a change of -22.74"), Some(-22.74));
    }

    #[test]
    fn test_hyphenated_ranges_are_not_signs() {
        assert_eq!(find_signed_number(" for the week of May 9-16."), None);
        assert_eq!(find_signed_number("season 2023-24 outlook"), None);
        assert_eq!(find_signed_number("week 9-16, then -35"), Some(-35.0));
        assert_eq!(find_signed_number("-7 on the week"), Some(-7.0));
        assert_eq!(find_signed_number("(▼12)"), Some(-12.0));
    }

    #[test]
    fn test_cell_classification() {
        assert!(is_pure_numeric(" 1,030 "));
        assert!(is_pure_numeric("977.26"));
        assert!(!is_pure_numeric("-20"));
        assert!(!is_pure_numeric("20%"));
        assert!(is_currency_marked("$1,234"));
        assert!(is_currency_marked("usd 980"));
        assert!(!is_currency_marked("980"));
    }

    #[test]
    fn test_extract_dates_masks_tokens() {
        let (masked, dates) = extract_dates("SCFI on 2024-05-10 (vs 2024/05/03): 1,234");
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert_eq!(masked.len(), "SCFI on 2024-05-10 (vs 2024/05/03): 1,234".len());
        assert_eq!(parse_magnitude(&masked), Some(1234.0));
    }
}
