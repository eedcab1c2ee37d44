use chrono::NaiveDate;

/// Parses a date from the formats the upstream data actually contains:
/// ISO `YYYY-MM-DD`, an ISO datetime (date prefix is taken, time discarded),
/// or Brazilian `DD/MM/YYYY`. Anything else yields `None`: malformed dates
/// are treated as absent, never as an error.
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Datetime strings like "2025-01-10T00:00:00Z" compare at day granularity
    if trimmed.len() > 10 && trimmed.as_bytes()[10] == b'T' {
        if let Ok(date) = NaiveDate::parse_from_str(&trimmed[..10], "%Y-%m-%d") {
            return Some(date);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return Some(date);
    }

    None
}

/// Signed whole days from `from` to `to`. Both operands are calendar dates,
/// so the difference is already exact, with no sub-day remainder to round.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Days that `reference` sits past `due`, floored at zero.
pub fn days_overdue(due: NaiveDate, reference: NaiveDate) -> u32 {
    days_between(due, reference).max(0) as u32
}

/// Days remaining from `reference` until `due`, floored at zero.
pub fn days_until(reference: NaiveDate, due: NaiveDate) -> u32 {
    days_between(reference, due).max(0) as u32
}

/// Reduces a CNPJ (or any identifier) to its digits for matching.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}


/// Parses a Brazilian-formatted decimal: dot as thousands separator, comma as
/// decimal separator, optional `R$` prefix. Plain machine decimals still
/// parse; without a comma, dots are stripped only when the digits form
/// thousands groups of three, so `1.234` reads as 1234 but `1.2345` keeps
/// its decimal point.
pub fn parse_brl_number(raw: &str) -> Option<f64> {
    let mut cleaned = raw.trim();
    if let Some(stripped) = cleaned.strip_prefix("R$") {
        cleaned = stripped.trim();
    }
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if is_dot_grouped(cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned.to_string()
    };

    normalized.parse::<f64>().ok()
}

/// True for dot-grouped integers like `1.234.567`: an optional sign, a first
/// group of one to three digits, then at least one group of exactly three.
fn is_dot_grouped(value: &str) -> bool {
    let unsigned = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);

    let mut groups = unsigned.split('.');
    match groups.next() {
        Some(first)
            if !first.is_empty()
                && first.len() <= 3
                && first.bytes().all(|b| b.is_ascii_digit()) => {}
        _ => return false,
    }

    let mut saw_group = false;
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        saw_group = true;
    }
    saw_group
}

/// Lowercased, accent-folded key approximating pt-BR collation for sorting.
/// Covers the Latin-1 range that clinic and patient names actually use.
pub fn collation_key(raw: &str) -> String {
    raw.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
