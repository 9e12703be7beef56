use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::Currency;
use crate::error::MarkupError;
use crate::exchange_rate::InterbankQuote;

/// A validated conversion the user actually made: `amount_paid` of `from`
/// turned into `amount_received` of `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    amount_paid: Decimal,
    amount_received: Decimal,
    from_currency: Currency,
    to_currency: Currency,
}

impl ConversionRequest {
    /// Both amounts must be strictly positive. Identical currencies are allowed.
    pub fn new(
        amount_paid: Decimal,
        amount_received: Decimal,
        from_currency: Currency,
        to_currency: Currency,
    ) -> Result<Self, MarkupError> {
        if amount_paid <= Decimal::ZERO {
            return Err(MarkupError::validation(format!(
                "amount paid must be positive, got {}",
                amount_paid
            )));
        }
        if amount_received <= Decimal::ZERO {
            return Err(MarkupError::validation(format!(
                "amount received must be positive, got {}",
                amount_received
            )));
        }
        if from_currency == to_currency {
            log::warn!("conversion request uses {} on both sides", from_currency);
        }

        Ok(Self {
            amount_paid,
            amount_received,
            from_currency,
            to_currency,
        })
    }

    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    pub fn amount_received(&self) -> Decimal {
        self.amount_received
    }

    pub fn from_currency(&self) -> Currency {
        self.from_currency
    }

    pub fn to_currency(&self) -> Currency {
        self.to_currency
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupResult {
    pub interbank_rate: Decimal,
    /// `to` units received per `from` unit paid.
    pub user_rate: Decimal,
    /// Positive when the user got less than interbank.
    pub markup_percent: Decimal,
    /// In `from` currency units.
    pub hidden_cost: Decimal,
}

/// Compares the rate the user got against the interbank quote.
///
/// Nothing is rounded here; see `report` for display precision.
pub fn compute(
    request: &ConversionRequest,
    quote: &InterbankQuote,
) -> Result<MarkupResult, MarkupError> {
    if request.amount_paid <= Decimal::ZERO || request.amount_received <= Decimal::ZERO {
        return Err(MarkupError::validation("amounts must be positive"));
    }
    if quote.rate <= Decimal::ZERO {
        return Err(MarkupError::quote_unavailable(format!(
            "{}/{} rate is not positive: {}",
            quote.from_currency, quote.to_currency, quote.rate
        )));
    }
    if quote.from_currency != request.from_currency || quote.to_currency != request.to_currency {
        return Err(MarkupError::quote_unavailable(format!(
            "quote is for {}/{} but the conversion is {}/{}",
            quote.from_currency, quote.to_currency, request.from_currency, request.to_currency
        )));
    }

    let interbank_rate = quote.rate;
    let user_rate = request
        .amount_received
        .checked_div(request.amount_paid)
        .ok_or_else(|| MarkupError::computation("user rate overflowed"))?;
    if user_rate.is_zero() {
        return Err(MarkupError::computation(format!(
            "user rate for {} / {} is below decimal precision",
            request.amount_received, request.amount_paid
        )));
    }
    let spread = interbank_rate
        .checked_sub(user_rate)
        .ok_or_else(|| MarkupError::computation("rate spread overflowed"))?;
    let markup_percent = spread
        .checked_div(interbank_rate)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| MarkupError::computation("markup percentage overflowed"))?;
    let hidden_cost = request
        .amount_paid
        .checked_mul(spread)
        .ok_or_else(|| MarkupError::computation("hidden cost overflowed"))?;
    // A non-zero spread must show up in both figures with its own sign.
    if !spread.is_zero() && (markup_percent.is_zero() || hidden_cost.is_zero()) {
        return Err(MarkupError::computation(format!(
            "spread {} vanished below decimal precision (markup {}, cost {})",
            spread, markup_percent, hidden_cost
        )));
    }

    log::debug!(
        "{}/{}: interbank {} (quoted {}) user {} markup {}% cost {}",
        request.from_currency,
        request.to_currency,
        interbank_rate,
        quote.fetched_at,
        user_rate,
        markup_percent,
        hidden_cost
    );

    Ok(MarkupResult {
        interbank_rate,
        user_rate,
        markup_percent,
        hidden_cost,
    })
}
