//! User-facing text in the supported languages.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Month;

/// The language used for messages, labels and month names.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English, months labelled with the Gregorian year.
    #[default]
    English,
    /// Thai, months labelled with the Buddhist-era year.
    Thai,
}

/// The action a user was trying to perform, used to pick a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Adding a new transaction.
    Add,
    /// Editing an existing transaction.
    Update,
    /// Deleting a transaction.
    Delete,
    /// Creating an account.
    Register,
    /// Signing in with an email and password or a federated identity.
    LogIn,
}

/// The difference between the Buddhist-era and Gregorian year numbers.
const BUDDHIST_ERA_OFFSET: i32 = 543;

impl Locale {
    /// The full name of `month`.
    pub fn month_name(self, month: Month) -> &'static str {
        match self {
            Locale::English => match month {
                Month::January => "January",
                Month::February => "February",
                Month::March => "March",
                Month::April => "April",
                Month::May => "May",
                Month::June => "June",
                Month::July => "July",
                Month::August => "August",
                Month::September => "September",
                Month::October => "October",
                Month::November => "November",
                Month::December => "December",
            },
            Locale::Thai => match month {
                Month::January => "มกราคม",
                Month::February => "กุมภาพันธ์",
                Month::March => "มีนาคม",
                Month::April => "เมษายน",
                Month::May => "พฤษภาคม",
                Month::June => "มิถุนายน",
                Month::July => "กรกฎาคม",
                Month::August => "สิงหาคม",
                Month::September => "กันยายน",
                Month::October => "ตุลาคม",
                Month::November => "พฤศจิกายน",
                Month::December => "ธันวาคม",
            },
        }
    }

    /// The year number as written in this locale's calendar.
    pub fn display_year(self, year: i32) -> i32 {
        match self {
            Locale::English => year,
            Locale::Thai => year + BUDDHIST_ERA_OFFSET,
        }
    }

    /// Label for the "all months" filter option.
    pub fn all_months(self) -> &'static str {
        match self {
            Locale::English => "All",
            Locale::Thai => "ทั้งหมด",
        }
    }

    /// Label for income totals and the income bar.
    pub fn income(self) -> &'static str {
        match self {
            Locale::English => "Income",
            Locale::Thai => "รายรับ",
        }
    }

    /// Label for expense totals and the expense bar.
    pub fn expense(self) -> &'static str {
        match self {
            Locale::English => "Expenses",
            Locale::Thai => "รายจ่าย",
        }
    }

    /// Label for the summary cards, in display order: income, expense, balance.
    pub fn summary_titles(self) -> [&'static str; 3] {
        match self {
            Locale::English => ["Total income", "Total expenses", "Balance"],
            Locale::Thai => ["รายรับทั้งหมด", "รายจ่ายทั้งหมด", "ยอดคงเหลือ"],
        }
    }

    /// Title of the income/expense chart.
    pub fn chart_title(self) -> &'static str {
        match self {
            Locale::English => "Income and expenses",
            Locale::Thai => "สรุปรายรับ-รายจ่าย",
        }
    }

    /// Name of the chart's only series.
    pub fn chart_series_name(self) -> &'static str {
        match self {
            Locale::English => "Amount",
            Locale::Thai => "จำนวนเงิน",
        }
    }

    /// Shown in place of a missing display name.
    pub fn anonymous_user(self) -> &'static str {
        match self {
            Locale::English => "User",
            Locale::Thai => "ผู้ใช้",
        }
    }

    /// Shown when the selected month has no transactions.
    pub fn no_transactions(self) -> &'static str {
        match self {
            Locale::English => "No transactions yet",
            Locale::Thai => "ยังไม่มีรายการ",
        }
    }

    /// Asks the user to confirm a deletion.
    pub fn confirm_delete(self) -> &'static str {
        match self {
            Locale::English => "Are you sure you want to delete this transaction?",
            Locale::Thai => "คุณแน่ใจหรือไม่ว่าต้องการลบรายการนี้",
        }
    }

    /// The generic message for a failed `operation`.
    pub fn operation_failed(self, operation: Operation) -> &'static str {
        match (self, operation) {
            (Locale::English, Operation::Add) => "Could not add the transaction. Please try again.",
            (Locale::English, Operation::Update) => {
                "Could not update the transaction. Please try again."
            }
            (Locale::English, Operation::Delete) => {
                "Could not delete the transaction. Please try again."
            }
            (Locale::English, Operation::Register | Operation::LogIn) => {
                "Something went wrong. Please try again."
            }
            (Locale::Thai, Operation::Add) => "ไม่สามารถเพิ่มรายการได้ กรุณาลองใหม่อีกครั้ง",
            (Locale::Thai, Operation::Update) => "ไม่สามารถอัปเดตรายการได้ กรุณาลองใหม่อีกครั้ง",
            (Locale::Thai, Operation::Delete) => "ไม่สามารถลบรายการได้ กรุณาลองใหม่อีกครั้ง",
            (Locale::Thai, Operation::Register | Operation::LogIn) => {
                "เกิดข้อผิดพลาด กรุณาลองใหม่อีกครั้ง"
            }
        }
    }

    pub(crate) fn missing_fields(self) -> &'static str {
        match self {
            Locale::English => "Please fill in every field.",
            Locale::Thai => "กรุณากรอกข้อมูลให้ครบทุกช่อง",
        }
    }

    pub(crate) fn invalid_amount(self) -> &'static str {
        match self {
            Locale::English => "The amount must be a number.",
            Locale::Thai => "จำนวนเงินต้องเป็นตัวเลข",
        }
    }

    pub(crate) fn negative_amount(self) -> &'static str {
        match self {
            Locale::English => "The amount cannot be negative.",
            Locale::Thai => "จำนวนเงินต้องไม่ติดลบ",
        }
    }

    pub(crate) fn amount_too_large(self) -> &'static str {
        match self {
            Locale::English => "The amount cannot be more than 999,999,999,999.99.",
            Locale::Thai => "จำนวนเงินต้องไม่เกิน 999,999,999,999.99",
        }
    }

    pub(crate) fn invalid_date(self) -> &'static str {
        match self {
            Locale::English => "The date must be in the format YYYY-MM-DD.",
            Locale::Thai => "รูปแบบวันที่ไม่ถูกต้อง",
        }
    }

    pub(crate) fn invalid_credentials(self) -> &'static str {
        match self {
            Locale::English => "Incorrect email or password. Please try again.",
            Locale::Thai => "อีเมลหรือรหัสผ่านไม่ถูกต้อง กรุณาลองใหม่อีกครั้ง",
        }
    }

    pub(crate) fn password_too_short(self) -> &'static str {
        match self {
            Locale::English => "The password must be at least 6 characters long.",
            Locale::Thai => "รหัสผ่านต้องมีความยาวอย่างน้อย 6 ตัวอักษร",
        }
    }

    pub(crate) fn password_mismatch(self) -> &'static str {
        match self {
            Locale::English => "The passwords do not match. Please check them again.",
            Locale::Thai => "รหัสผ่านไม่ตรงกัน กรุณาตรวจสอบอีกครั้ง",
        }
    }

    pub(crate) fn invalid_email(self) -> &'static str {
        match self {
            Locale::English => "The email address is not valid.",
            Locale::Thai => "รูปแบบอีเมลไม่ถูกต้อง",
        }
    }

    pub(crate) fn duplicate_email(self) -> &'static str {
        match self {
            Locale::English => "This email is already in use. Please use another email.",
            Locale::Thai => "อีเมลนี้ถูกใช้งานแล้ว กรุณาใช้อีเมลอื่น",
        }
    }

    pub(crate) fn missing_transaction(self) -> &'static str {
        match self {
            Locale::English => {
                "The transaction could not be found. It may have already been deleted."
            }
            Locale::Thai => "ไม่พบรายการนี้ อาจถูกลบไปแล้ว",
        }
    }

    pub(crate) fn invalid_month(self, key: &str) -> String {
        match self {
            Locale::English => format!("\"{key}\" is not a month, use YYYY-MM or \"all\"."),
            Locale::Thai => {
                format!("\"{key}\" ไม่ใช่เดือนที่ถูกต้อง ใช้รูปแบบ YYYY-MM หรือ \"all\"")
            }
        }
    }

    /// The label for a password strength score between 0 and 5.
    pub fn password_strength_label(self, score: u8) -> &'static str {
        match (self, score) {
            (Locale::English, 0..=2) => "Weak",
            (Locale::English, 3) => "Fair",
            (Locale::English, 4) => "Good",
            (Locale::English, _) => "Strong",
            (Locale::Thai, 0..=2) => "อ่อน",
            (Locale::Thai, 3) => "ปานกลาง",
            (Locale::Thai, 4) => "ดี",
            (Locale::Thai, _) => "แข็งแรง",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "th" | "thai" => Ok(Locale::Thai),
            other => Err(format!("unsupported locale \"{other}\", expected \"en\" or \"th\"")),
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::English => write!(f, "en"),
            Locale::Thai => write!(f, "th"),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::{Locale, Operation};

    #[test]
    fn parses_locale_codes() {
        assert_eq!("th".parse::<Locale>(), Ok(Locale::Thai));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::English));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn thai_years_use_buddhist_era() {
        assert_eq!(Locale::Thai.display_year(2024), 2567);
        assert_eq!(Locale::English.display_year(2024), 2024);
    }

    #[test]
    fn month_names_are_localized() {
        assert_eq!(Locale::English.month_name(Month::October), "October");
        assert_eq!(Locale::Thai.month_name(Month::October), "ตุลาคม");
    }

    #[test]
    fn strength_labels_follow_score_bands() {
        assert_eq!(Locale::Thai.password_strength_label(2), "อ่อน");
        assert_eq!(Locale::Thai.password_strength_label(3), "ปานกลาง");
        assert_eq!(Locale::Thai.password_strength_label(4), "ดี");
        assert_eq!(Locale::Thai.password_strength_label(5), "แข็งแรง");
    }

    #[test]
    fn failure_messages_differ_per_operation() {
        let add = Locale::Thai.operation_failed(Operation::Add);
        let delete = Locale::Thai.operation_failed(Operation::Delete);

        assert_eq!(add, "ไม่สามารถเพิ่มรายการได้ กรุณาลองใหม่อีกครั้ง");
        assert_ne!(add, delete);
    }
}
