use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::currency::Currency;
use crate::form::ContactDetails;
use crate::markup::{ConversionRequest, MarkupResult};

/// A markup result ready to show to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupReport {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub amount_paid: Decimal,
    pub amount_received: Decimal,
    #[serde(flatten)]
    pub result: MarkupResult,
    #[serde(skip_serializing_if = "is_empty")]
    pub details: ContactDetails,
}

fn is_empty(details: &ContactDetails) -> bool {
    *details == ContactDetails::default()
}

impl MarkupReport {
    pub fn new(request: &ConversionRequest, result: MarkupResult, details: ContactDetails) -> Self {
        Self {
            from_currency: request.from_currency(),
            to_currency: request.to_currency(),
            amount_paid: request.amount_paid(),
            amount_received: request.amount_received(),
            result,
            details,
        }
    }
}

/// Half away from zero, then padded, like `Number.prototype.toFixed`.
fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

impl fmt::Display for MarkupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Interbank Rate: {}", fixed(self.result.interbank_rate, 4))?;
        writeln!(f, "Your Rate: {}", fixed(self.result.user_rate, 4))?;
        writeln!(f, "Markup: {}%", fixed(self.result.markup_percent, 2))?;
        write!(
            f,
            "Hidden Cost: {} {}",
            fixed(self.result.hidden_cost, 2),
            self.from_currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report(details: ContactDetails) -> MarkupReport {
        let request =
            ConversionRequest::new(dec!(1000), dec!(1250), Currency::GBP, Currency::USD).unwrap();
        let result = MarkupResult {
            interbank_rate: dec!(1.3),
            user_rate: dec!(1.25),
            markup_percent: dec!(3.8461538461538461538461538500),
            hidden_cost: dec!(50.000),
        };
        MarkupReport::new(&request, result, details)
    }

    #[test]
    fn formats_fixed_decimal_lines() {
        assert_eq!(
            report(ContactDetails::default()).to_string(),
            "Interbank Rate: 1.3000\nYour Rate: 1.2500\nMarkup: 3.85%\nHidden Cost: 50.00 GBP"
        );
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(fixed(dec!(0.125), 2), "0.13");
        assert_eq!(fixed(dec!(1.23455), 4), "1.2346");
        assert_eq!(fixed(dec!(-5.5555555), 2), "-5.56");
        assert_eq!(fixed(dec!(-0.125), 2), "-0.13");
        assert_eq!(fixed(dec!(1.3), 4), "1.3000");
        assert_eq!(fixed(Decimal::ZERO, 2), "0.00");
    }

    #[test]
    fn json_keeps_full_precision() {
        let json = serde_json::to_value(report(ContactDetails::default())).unwrap();

        assert_eq!(json["fromCurrency"], "GBP");
        assert_eq!(json["toCurrency"], "USD");
        assert_eq!(json["amountPaid"], "1000");
        assert_eq!(json["markupPercent"], "3.8461538461538461538461538500");
        assert_eq!(json["userRate"], "1.25");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn json_echoes_contact_details_when_present() {
        let json = serde_json::to_value(report(ContactDetails {
            email: Some("a@b.co".to_string()),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(json["details"]["email"], "a@b.co");
    }
}
