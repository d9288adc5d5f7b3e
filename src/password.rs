//! Passwords: the length rule, bcrypt hashing and the sign-up strength meter.

use std::fmt::Display;

use bcrypt::BcryptError;
use serde::{Deserialize, Serialize};
use zxcvbn::zxcvbn;

use crate::{Error, locale::Locale};

/// The minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A plain-text password that passed the length rule.
///
/// The only thing to do with one is hash it into a [PasswordHash].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check `raw_password` against the length rule.
    ///
    /// Length is counted in characters, so Thai passwords are not penalised
    /// for their multi-byte encoding.
    ///
    /// # Errors
    /// Returns [Error::PasswordTooShort] for fewer than [MIN_PASSWORD_LENGTH] characters.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if raw_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::PasswordTooShort);
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Check a password and the confirmation typed in a second field.
    ///
    /// # Errors
    /// Returns [Error::PasswordTooShort] first, then [Error::PasswordMismatch]
    /// if the two strings differ.
    pub fn new_confirmed(raw_password: &str, confirmation: &str) -> Result<Self, Error> {
        let password = Self::new(raw_password)?;

        if raw_password != confirmation {
            return Err(Error::PasswordMismatch);
        }

        Ok(password)
    }

    /// Wrap `raw_password` without checking its length.
    ///
    /// Meant for fixtures such as the test database, where the password is known.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A bcrypt hash of a password, including its salt and cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used by the command-line tools.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds.
    ///
    /// Tests use a cost of 4, the lowest bcrypt accepts, to stay fast.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if bcrypt fails, e.g. for a cost outside 4 to 31.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash loaded from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check the length of `raw_password` and hash it.
    ///
    /// # Errors
    /// Returns the errors of [ValidatedPassword::new] and [PasswordHash::new].
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        Self::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Whether `raw_password` hashes to this hash.
    ///
    /// # Errors
    /// Returns an error if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Characters that count towards the "special character" check.
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// How strong a password is, as shown on the sign-up form.
///
/// The score counts how many of five simple checks pass. The feedback comes
/// from zxcvbn and suggests how to make the password harder to guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// At least eight characters.
    pub long_enough: bool,
    /// Contains an ASCII uppercase letter.
    pub has_uppercase: bool,
    /// Contains an ASCII lowercase letter.
    pub has_lowercase: bool,
    /// Contains a digit.
    pub has_digit: bool,
    /// Contains one of `!@#$%^&*(),.?":{}|<>`.
    pub has_special: bool,
    /// Suggestions for a stronger password, empty if there are none.
    pub feedback: String,
}

impl PasswordStrength {
    /// Rate `password`.
    pub fn analyse(password: &str) -> Self {
        if password.is_empty() {
            return Self {
                long_enough: false,
                has_uppercase: false,
                has_lowercase: false,
                has_digit: false,
                has_special: false,
                feedback: String::new(),
            };
        }

        let feedback = zxcvbn(password, &[])
            .feedback()
            .map(|feedback| feedback.to_string())
            .unwrap_or_default();

        Self {
            long_enough: password.chars().count() >= 8,
            has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            has_digit: password.chars().any(|c| c.is_ascii_digit()),
            has_special: password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
            feedback,
        }
    }

    /// The number of passing checks, from 0 to 5.
    pub fn score(&self) -> u8 {
        [
            self.long_enough,
            self.has_uppercase,
            self.has_lowercase,
            self.has_digit,
            self.has_special,
        ]
        .into_iter()
        .filter(|&passed| passed)
        .count() as u8
    }

    /// The localized label for the score, e.g. "Weak" or "Strong".
    pub fn label(&self, locale: Locale) -> &'static str {
        locale.password_strength_label(self.score())
    }
}
