use chrono::{NaiveDate, Utc};
use rand::Rng;

/// How many times the creation path regenerates the invoice number when the
/// storage layer reports a uniqueness violation before giving up.
pub const INVOICE_RETRY_LIMIT: u32 = 5;

/// Invoice number for a given date: `INV-YYYYMMDD-NNNNN`.
///
/// The 5-digit suffix is random, so uniqueness is probabilistic; the store
/// enforces it with a unique index and callers retry on collision.
pub fn invoice_number_for(date: NaiveDate) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("INV-{}-{:05}", date.format("%Y%m%d"), suffix)
}

/// Invoice number for today (UTC).
pub fn generate_invoice_number() -> String {
    invoice_number_for(Utc::now().date_naive())
}

/// 6-digit human-readable confirmation code in [100000, 999999], used for
/// delivery confirmation flows.
///
/// Drawn from a non-cryptographic RNG. This is a usability code, not a
/// security boundary; do not use it as a secret.
pub fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000u32..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invoice_shape(invoice: &str) {
        // INV- + 8 date digits + - + 5 suffix digits
        assert_eq!(invoice.len(), 18, "unexpected length: {invoice}");
        assert!(invoice.starts_with("INV-"));
        assert!(invoice[4..12].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(&invoice[12..13], "-");
        assert!(invoice[13..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn invoice_number_matches_format_for_any_date() {
        let dates = [
            NaiveDate::from_ymd_opt(2026, 8, 23).unwrap(),
            NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
        ];
        for date in dates {
            let invoice = invoice_number_for(date);
            assert_invoice_shape(&invoice);
        }
        assert!(invoice_number_for(dates[0]).starts_with("INV-20260823-"));
    }

    #[test]
    fn generated_invoice_number_matches_format() {
        for _ in 0..50 {
            assert_invoice_shape(&generate_invoice_number());
        }
    }

    #[test]
    fn verification_code_is_six_digits_in_range() {
        for _ in 0..200 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }
}
