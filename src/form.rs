use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::MarkupError;
use crate::markup::ConversionRequest;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Raw values as the user typed them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionForm {
    pub paid: String,
    pub received: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fx_volume: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
}

/// Fields collected alongside a conversion. They are checked for shape and
/// echoed back, but play no part in the markup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub email: Option<String>,
    pub fx_volume: Option<Decimal>,
    pub datetime: Option<NaiveDateTime>,
}

impl ConversionForm {
    pub fn into_request(self) -> Result<(ConversionRequest, ContactDetails), MarkupError> {
        let paid = parse_amount("amount paid", &self.paid)?;
        let received = parse_amount("amount received", &self.received)?;
        let from = Currency::from_str(&self.from)?;
        let to = Currency::from_str(&self.to)?;
        let request = ConversionRequest::new(paid, received, from, to)?;

        let details = ContactDetails {
            email: non_empty(self.email).map(parse_email).transpose()?,
            fx_volume: non_empty(self.fx_volume)
                .map(|v| parse_amount("annual FX volume", &v))
                .transpose()?,
            datetime: non_empty(self.datetime)
                .map(|v| parse_datetime(&v))
                .transpose()?,
        };

        Ok((request, details))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Decimal or exponent notation (`1e5`); `NaN` and `inf` are refused.
fn parse_amount(field: &str, raw: &str) -> Result<Decimal, MarkupError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(MarkupError::validation(format!("{} is required", field)));
    }
    let amount = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| {
            MarkupError::validation(format!("{} must be a number, got '{}'", field, value))
        })?;
    if amount <= Decimal::ZERO {
        return Err(MarkupError::validation(format!(
            "{} must be positive, got {}",
            field, amount
        )));
    }

    Ok(amount)
}

fn parse_email(value: String) -> Result<String, MarkupError> {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(value)
        }
        _ => Err(MarkupError::validation(format!("'{}' is not an email address", value))),
    }
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, MarkupError> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            MarkupError::validation(format!(
                "'{}' is not a date and time (expected YYYY-MM-DDTHH:MM)",
                value
            ))
        })
}
