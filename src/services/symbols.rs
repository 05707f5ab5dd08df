/// Exchange suffixes whose codes are zero-padded numbers.
const NUMERIC_EXCHANGE_SUFFIXES: &[&str] = &[".HK", ".SS", ".SZ", ".T", ".TW"];

/// Bare numeric codes are assumed to be Hong Kong listings.
const DEFAULT_SUFFIX: &str = ".HK";

const PAD_WIDTH: usize = 4;

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Canonical storage key for a ticker: `5.hk` and `0005.HK` and `5` all become `0005.HK`.
/// Total and idempotent.
pub fn normalize_symbol(raw: &str) -> String {
    let sym = raw.trim().to_uppercase();

    for suffix in NUMERIC_EXCHANGE_SUFFIXES {
        if let Some(code) = sym.strip_suffix(suffix) {
            if is_numeric(code) {
                return format!("{code:0>PAD_WIDTH$}{suffix}");
            }
            return sym;
        }
    }

    if is_numeric(&sym) && sym.len() <= PAD_WIDTH {
        return format!("{sym:0>PAD_WIDTH$}{DEFAULT_SUFFIX}");
    }

    sym
}
