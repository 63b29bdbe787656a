//! Price display helpers. Amounts are carried as integer cents everywhere;
//! this is the only place they become human-readable strings.

/// Render integer cents as a USD display string, e.g. `12999` -> `"$129.99"`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = abs / 100;
    let remainder = abs % 100;
    format!("{sign}${}.{remainder:02}", group_thousands(dollars))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::format_price;

    #[test]
    fn formats_cents_as_usd() {
        assert_eq!(format_price(12999), "$129.99");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_price(1_299_999), "$12,999.99");
        assert_eq!(format_price(100_000_000), "$1,000,000.00");
    }

    #[test]
    fn handles_zero_and_negative() {
        assert_eq!(format_price(0), "$0.00");
        assert_eq!(format_price(-12999), "-$129.99");
        assert_eq!(format_price(5), "$0.05");
    }
}
