use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use config::Config;
use exchange_rate::{ExchangeRateHost, FixedRate, RateSource};
use form::ConversionForm;
use report::MarkupReport;
use session::CalculationSession;

mod config;
mod currency;
mod error;
mod exchange_rate;
mod form;
mod latest_rates;
mod markup;
mod report;
mod server;
mod session;

/// Compare a currency conversion against the interbank rate.
#[derive(Parser, Debug)]
#[command(name = "fxmarkup", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Work out the markup on a single conversion
    Calc {
        /// Amount handed over, in the `from` currency
        #[arg(long)]
        paid: String,
        /// Amount that arrived, in the `to` currency
        #[arg(long)]
        received: String,
        #[arg(long, default_value = "GBP")]
        from: String,
        #[arg(long, default_value = "USD")]
        to: String,
        #[arg(long)]
        email: Option<String>,
        /// Annual FX volume, e.g. 500000
        #[arg(long)]
        fx_volume: Option<String>,
        /// When the conversion happened (YYYY-MM-DDTHH:MM, London time)
        #[arg(long)]
        datetime: Option<String>,
        /// Use this interbank rate instead of fetching one
        #[arg(long)]
        rate: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the calculator over HTTP
    Serve,
    /// List supported currency codes
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Calc {
            paid,
            received,
            from,
            to,
            email,
            fx_volume,
            datetime,
            rate,
            json,
        } => {
            let form = ConversionForm {
                paid,
                received,
                from,
                to,
                email,
                fx_volume,
                datetime,
            };
            match rate {
                Some(rate) => {
                    let rate = Decimal::from_str(rate.trim())
                        .map_err(|e| anyhow::anyhow!("Invalid --rate '{}': {}", rate, e))?;
                    calc(FixedRate(rate), form, json).await
                }
                None => calc(rate_source(&config)?, form, json).await,
            }
        }
        Command::Serve => {
            server::run(rate_source(&config)?, config.listen_addr).await?;
            Ok(())
        }
        Command::Currencies => {
            for currency in currency::Currency::ALL {
                println!("{}", currency);
            }
            Ok(())
        }
    }
}

fn rate_source(config: &Config) -> Result<ExchangeRateHost> {
    Ok(ExchangeRateHost::new(
        config.rates_url.clone(),
        config.rates_access_key.clone(),
        config.request_timeout,
    )?)
}

async fn calc<S: RateSource + 'static>(source: S, form: ConversionForm, json: bool) -> Result<()> {
    let (request, details) = form.into_request()?;
    let session = CalculationSession::new(source);
    let result = session.calculate(&request).await?;
    let report = MarkupReport::new(&request, result, details);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calc_defaults_to_gbp_usd() {
        let cli = Cli::try_parse_from(["fxmarkup", "calc", "--paid", "1000", "--received", "1250"])
            .unwrap();
        match cli.command {
            Command::Calc { from, to, rate, json, .. } => {
                assert_eq!(from, "GBP");
                assert_eq!(to, "USD");
                assert_eq!(rate, None);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn calc_with_fixed_rate_succeeds() {
        let form = ConversionForm {
            paid: "200".to_string(),
            received: "190".to_string(),
            from: "EUR".to_string(),
            to: "CHF".to_string(),
            ..Default::default()
        };
        assert!(calc(FixedRate(Decimal::from_str("0.90").unwrap()), form, true).await.is_ok());
    }

    #[tokio::test]
    async fn calc_surfaces_validation_errors() {
        let form = ConversionForm {
            paid: "-1".to_string(),
            received: "190".to_string(),
            from: "EUR".to_string(),
            to: "CHF".to_string(),
            ..Default::default()
        };
        let err = calc(FixedRate(Decimal::ONE), form, false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<error::MarkupError>(),
            Some(error::MarkupError::Validation(_))
        ));
    }
}
