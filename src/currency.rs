//! Formatting money for display.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, prelude::ToPrimitive};

const CURRENCY_SYMBOL: &str = "฿";

/// Format `amount` as Thai baht with two decimal places, e.g. "฿1,234.50".
///
/// Negative amounts are written as "-฿12.00".
pub fn format_currency(amount: Decimal) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency(CURRENCY_SYMBOL)
            .ok()
            .map(|fmt| fmt.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency(&format!("-{CURRENCY_SYMBOL}"))
            .ok()
            .map(|fmt| fmt.precision(Precision::Decimals(2)))
    });

    let amount = amount.round_dp(2);

    if amount.is_zero() {
        // numfmt renders zero as "0", so zero gets a fixed string
        return format!("{CURRENCY_SYMBOL}0.00");
    }

    let (formatter, sign) = if amount.is_sign_negative() {
        (negative_fmt, "-")
    } else {
        (positive_fmt, "")
    };

    let formatted_string = match (formatter, amount.abs().to_f64()) {
        (Some(formatter), Some(number)) => formatter.fmt_string(number),
        _ => format!("{sign}{CURRENCY_SYMBOL}{:.2}", amount.abs()),
    };

    pad_decimals(formatted_string)
}

/// numfmt drops trailing zeros, e.g. "12.30" is rendered as "12.3" and "5.00"
/// as "5", so the missing digits are added back.
fn pad_decimals(formatted_string: String) -> String {
    match formatted_string.rsplit_once('.') {
        Some((_, decimals)) if decimals.len() >= 2 => formatted_string,
        Some((_, decimals)) => format!("{formatted_string}{}", "0".repeat(2 - decimals.len())),
        None => format!("{formatted_string}.00"),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{format_currency, pad_decimals};

    #[test]
    fn zero_has_two_decimals() {
        assert_eq!(format_currency(dec!(0)), "฿0.00");
        assert_eq!(format_currency(dec!(-0.001)), "฿0.00");
    }

    #[test]
    fn trailing_zero_is_restored() {
        assert_eq!(format_currency(dec!(12.3)), "฿12.30");
    }

    #[test]
    fn whole_numbers_get_decimals() {
        assert_eq!(format_currency(dec!(5)), "฿5.00");
    }

    #[test]
    fn negative_amounts_are_prefixed_with_minus() {
        assert_eq!(format_currency(dec!(-40)), "-฿40.00");
    }

    #[test]
    fn pad_decimals_leaves_complete_strings_alone() {
        assert_eq!(pad_decimals("฿1,234.56".to_owned()), "฿1,234.56");
        assert_eq!(pad_decimals("฿1,234.5".to_owned()), "฿1,234.50");
        assert_eq!(pad_decimals("฿1,234".to_owned()), "฿1,234.00");
    }
}
