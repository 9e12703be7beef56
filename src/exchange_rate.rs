use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;

use crate::currency::Currency;
use crate::error::MarkupError;
use crate::latest_rates::LatestRates;

/// One unit of `from_currency` buys `rate` units of `to_currency` at mid market.
#[derive(Debug, Clone, PartialEq)]
pub struct InterbankQuote {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl InterbankQuote {
    /// Accepts a raw provider number; missing, non-finite and non-positive
    /// rates are all unusable.
    pub fn from_f64(
        from_currency: Currency,
        to_currency: Currency,
        rate: Option<f64>,
    ) -> Result<Self, MarkupError> {
        let raw = rate.ok_or_else(|| {
            MarkupError::quote_unavailable(format!(
                "no {}/{} rate in response",
                from_currency, to_currency
            ))
        })?;
        if !raw.is_finite() || raw <= 0.0 {
            return Err(MarkupError::quote_unavailable(format!(
                "unusable {}/{} rate: {}",
                from_currency, to_currency, raw
            )));
        }
        let rate = Decimal::try_from(raw).map_err(|e| {
            MarkupError::quote_unavailable(format!(
                "{}/{} rate {} is not representable: {}",
                from_currency, to_currency, raw, e
            ))
        })?;
        // Tiny positive floats can round to zero.
        Self::new(from_currency, to_currency, rate)
    }

    pub fn new(
        from_currency: Currency,
        to_currency: Currency,
        rate: Decimal,
    ) -> Result<Self, MarkupError> {
        if rate <= Decimal::ZERO {
            return Err(MarkupError::quote_unavailable(format!(
                "unusable {}/{} rate: {}",
                from_currency, to_currency, rate
            )));
        }

        Ok(Self {
            from_currency,
            to_currency,
            rate,
            fetched_at: Utc::now(),
        })
    }
}

/// Anything that can price an ordered currency pair.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest_rate(&self, from: Currency, to: Currency) -> Result<InterbankQuote, MarkupError>;
}

/// A rate that is known up front, e.g. supplied on the command line.
pub struct FixedRate(pub Decimal);

#[async_trait]
impl RateSource for FixedRate {
    async fn latest_rate(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<InterbankQuote, MarkupError> {
        InterbankQuote::new(from, to, self.0)
    }
}

/// Client for exchangerate.host compatible `latest` endpoints.
pub struct ExchangeRateHost {
    client: Client,
    base_url: String,
    access_key: Option<String>,
}

impl ExchangeRateHost {
    pub fn new(
        base_url: impl Into<String>,
        access_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MarkupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarkupError::quote_unavailable(format!("can't build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_key,
        })
    }

    fn get_url(&self, from: Currency, to: Currency) -> String {
        let mut url = format!("{}/latest?base={}&symbols={}", self.base_url, from, to);
        if let Some(key) = &self.access_key {
            url.push_str("&access_key=");
            url.push_str(key);
        }
        url
    }

    async fn load_json(&self, url: &str) -> Result<String, MarkupError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarkupError::quote_unavailable(format!("request failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(MarkupError::quote_unavailable(format!(
                "rate source answered {}",
                resp.status()
            )));
        }

        resp.text()
            .await
            .map_err(|e| MarkupError::quote_unavailable(format!("can't read response: {}", e)))
    }
}

#[async_trait]
impl RateSource for ExchangeRateHost {
    async fn latest_rate(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<InterbankQuote, MarkupError> {
        log::debug!("fetching {}/{} from {}", from, to, self.base_url);
        let body = self.load_json(&self.get_url(from, to)).await?;
        let quote = quote_from_body(&body, from, to);
        if let Err(e) = &quote {
            log::warn!("no usable {}/{} rate: {}", from, to, e);
        }
        quote
    }
}

pub fn quote_from_body(
    body: &str,
    from: Currency,
    to: Currency,
) -> Result<InterbankQuote, MarkupError> {
    let latest: LatestRates = serde_json::from_str(body)
        .map_err(|e| MarkupError::quote_unavailable(format!("malformed response: {}", e)))?;
    if !latest.success {
        return Err(MarkupError::quote_unavailable("rate source reported failure"));
    }
    log::debug!("{}/{} rates dated {:?}", from, to, latest.date);
    if let Some(base) = latest.base.as_deref() {
        if !base.eq_ignore_ascii_case(from.code()) {
            return Err(MarkupError::quote_unavailable(format!(
                "asked for base {} but got {}",
                from, base
            )));
        }
    }

    InterbankQuote::from_f64(from, to, latest.rates.get(to.code()).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_unavailable(result: Result<InterbankQuote, MarkupError>) {
        assert!(
            matches!(result, Err(MarkupError::QuoteUnavailable(_))),
            "{result:?}"
        );
    }

    #[test]
    fn reads_rate_for_the_requested_symbol() {
        let body = r#"{"success":true,"base":"GBP","date":"2024-05-01","rates":{"USD":1.2534}}"#;
        let quote = quote_from_body(body, Currency::GBP, Currency::USD).unwrap();

        assert_eq!(quote.from_currency, Currency::GBP);
        assert_eq!(quote.to_currency, Currency::USD);
        assert_eq!(quote.rate, dec!(1.2534));
    }

    #[test]
    fn success_flag_is_optional() {
        let body = r#"{"rates":{"JPY":161.2}}"#;
        let quote = quote_from_body(body, Currency::EUR, Currency::JPY).unwrap();
        assert_eq!(quote.rate, dec!(161.2));
    }

    #[test]
    fn missing_symbol_is_unavailable() {
        assert_unavailable(quote_from_body(
            r#"{"success":true,"rates":{"EUR":1.1}}"#,
            Currency::GBP,
            Currency::USD,
        ));
        assert_unavailable(quote_from_body(
            r#"{"success":true}"#,
            Currency::GBP,
            Currency::USD,
        ));
    }

    #[test]
    fn failed_or_malformed_responses_are_unavailable() {
        assert_unavailable(quote_from_body(
            r#"{"success":false,"error":{"code":101}}"#,
            Currency::GBP,
            Currency::USD,
        ));
        assert_unavailable(quote_from_body("<html>", Currency::GBP, Currency::USD));
        assert_unavailable(quote_from_body(
            r#"{"rates":{"USD":"1.25"}}"#,
            Currency::GBP,
            Currency::USD,
        ));
    }

    #[test]
    fn mismatched_base_is_unavailable() {
        assert_unavailable(quote_from_body(
            r#"{"base":"EUR","rates":{"USD":1.08}}"#,
            Currency::GBP,
            Currency::USD,
        ));
    }

    #[test]
    fn zero_negative_and_non_finite_rates_are_unavailable() {
        for raw in [Some(0.0), Some(-1.2), Some(f64::NAN), Some(f64::INFINITY), None] {
            assert_unavailable(InterbankQuote::from_f64(Currency::GBP, Currency::USD, raw));
        }
        assert_unavailable(quote_from_body(
            r#"{"rates":{"USD":0}}"#,
            Currency::GBP,
            Currency::USD,
        ));
    }

    #[test]
    fn url_carries_pair_and_optional_key() {
        let source = ExchangeRateHost::new(
            "https://rates.example/",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            source.get_url(Currency::GBP, Currency::USD),
            "https://rates.example/latest?base=GBP&symbols=USD"
        );

        let keyed = ExchangeRateHost::new(
            "https://rates.example",
            Some("k3y".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            keyed.get_url(Currency::EUR, Currency::SEK),
            "https://rates.example/latest?base=EUR&symbols=SEK&access_key=k3y"
        );
    }

    #[tokio::test]
    async fn fixed_rate_prices_any_pair() {
        let quote = FixedRate(dec!(0.9))
            .latest_rate(Currency::USD, Currency::EUR)
            .await
            .unwrap();
        assert_eq!(quote.rate, dec!(0.9));
        assert_unavailable(FixedRate(Decimal::ZERO).latest_rate(Currency::USD, Currency::EUR).await);
    }
}
