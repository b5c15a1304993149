//! Agent corrections to an order's contact and delivery details.

use super::OrderDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest customer name kept from an edit.
pub const MAX_NAME_CHARS: usize = 200;
/// Longest address kept from an edit.
pub const MAX_ADDRESS_CHARS: usize = 500;
/// Longest postal code kept from an edit.
pub const MAX_POSTAL_CODE_CHARS: usize = 10;

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Phone number validated by digit count.
///
/// Formatting characters are kept as entered; only the count of ASCII digits
/// is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a validated phone number.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::InvalidPhone`] unless the value holds 10 to
    /// 15 digits.
    pub fn new(value: impl Into<String>) -> Result<Self, OrderDomainError> {
        let raw = value.into();
        let digits = raw.chars().filter(char::is_ascii_digit).count();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
            return Err(OrderDomainError::InvalidPhone(raw));
        }
        Ok(Self(raw.trim().to_owned()))
    }

    /// Returns the phone number as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns only the digits of the number.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated contact correction held in an order's edited shadow fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEdit {
    customer_name: String,
    phone: PhoneNumber,
    address: String,
    postal_code: String,
}

impl ContactEdit {
    /// Validates and normalizes an agent's correction.
    ///
    /// All four fields are required. Over-long free text is truncated rather
    /// than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`OrderDomainError::MissingField`] for a blank field, checked
    /// in argument order, and [`OrderDomainError::InvalidPhone`] when the
    /// phone fails the digit-count check.
    pub fn new(
        customer_name: &str,
        phone: &str,
        address: &str,
        postal_code: &str,
    ) -> Result<Self, OrderDomainError> {
        let name = required("customer_name", customer_name)?;
        let phone_text = required("phone", phone)?;
        let address_text = required("address", address)?;
        let postal = required("postal_code", postal_code)?;

        Ok(Self {
            customer_name: truncate_chars(name, MAX_NAME_CHARS),
            phone: PhoneNumber::new(phone_text)?,
            address: truncate_chars(address_text, MAX_ADDRESS_CHARS),
            postal_code: truncate_chars(postal, MAX_POSTAL_CODE_CHARS),
        })
    }

    /// Reconstructs a correction that was validated before it was stored.
    #[must_use]
    pub fn from_persisted(
        customer_name: String,
        phone: String,
        address: String,
        postal_code: String,
    ) -> Self {
        Self {
            customer_name,
            phone: PhoneNumber(phone),
            address,
            postal_code,
        }
    }

    /// Returns the corrected customer name.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Returns the corrected phone number.
    #[must_use]
    pub const fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    /// Returns the corrected address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the corrected postal code.
    #[must_use]
    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, OrderDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrderDomainError::MissingField(field));
    }
    Ok(trimmed)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
