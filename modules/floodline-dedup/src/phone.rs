//! Contact phone normalization.

/// Shortest digit string allowed to count as a truncated form of another.
const MIN_PARTIAL_DIGITS: usize = 7;
/// Subscriber digits that must follow a country code before it is rewritten.
const MIN_NATIONAL_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhoneMatch {
    /// One number contains the other (truncation or a dropped digit at an end).
    Partial,
    Exact,
}

/// Digits only, with an international prefix folded into the national
/// trunk `0`: `"+84 912-345-678"` → `"0912345678"`.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.strip_prefix("00").unwrap_or(&digits);

    if !country_code.is_empty() {
        if let Some(national) = digits.strip_prefix(country_code) {
            if national.len() >= MIN_NATIONAL_DIGITS && !national.starts_with('0') {
                return format!("0{national}");
            }
        }
    }
    digits.to_string()
}

/// Compare two already-normalized numbers.
pub fn compare_normalized(a: &str, b: &str) -> Option<PhoneMatch> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(PhoneMatch::Exact);
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    (short.len() >= MIN_PARTIAL_DIGITS && long.contains(short)).then_some(PhoneMatch::Partial)
}

/// Strongest match across every pair of numbers from the two lists.
pub fn best_match(a: &[String], b: &[String], country_code: &str) -> Option<PhoneMatch> {
    let left: Vec<String> = a.iter().map(|p| normalize_phone(p, country_code)).collect();
    let right: Vec<String> = b.iter().map(|p| normalize_phone(p, country_code)).collect();

    left.iter()
        .flat_map(|l| right.iter().filter_map(move |r| compare_normalized(l, r)))
        .max()
}
