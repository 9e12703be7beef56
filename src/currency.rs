use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MarkupError;

macro_rules! currencies {
    ($($variant:ident),+ $(,)?) => {
        /// Currencies accepted on either side of a conversion.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Currency {
            $($variant),+
        }

        impl Currency {
            pub const ALL: &'static [Currency] = &[$(Currency::$variant),+];

            pub fn code(self) -> &'static str {
                match self {
                    $(Currency::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

currencies!(
    GBP, USD, EUR, JPY, CHF, CNY, NZD, SGD, INR, AUD, CAD, HKD, MYR, NOK, ZAR, SEK, AED, CZK, DKK,
    HRK, HUF, KES, MXN, PLN, RON, SAR, TRY,
);

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|currency| currency.code() == code)
            .ok_or_else(|| MarkupError::validation(format!("unsupported currency code '{}'", s.trim())))
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("gbp".parse::<Currency>().unwrap(), Currency::GBP);
        assert_eq!(" Usd ".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("TRY".parse::<Currency>().unwrap(), Currency::TRY);
    }

    #[test]
    fn rejects_codes_outside_the_supported_set() {
        for code in ["XAU", "BTC", "", "US", "EURO"] {
            let err = code.parse::<Currency>().unwrap_err();
            assert!(matches!(err, MarkupError::Validation(_)), "{code} should be rejected");
        }
    }

    #[test]
    fn lists_all_supported_codes_in_order() {
        assert_eq!(Currency::ALL.len(), 27);
        assert_eq!(Currency::ALL[0], Currency::GBP);
        assert_eq!(Currency::ALL[26], Currency::TRY);
        assert_eq!(Currency::JPY.to_string(), "JPY");
    }

    #[test]
    fn serializes_as_the_plain_code() {
        let json = serde_json::to_string(&Currency::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: Currency = serde_json::from_str("\"chf\"").unwrap();
        assert_eq!(back, Currency::CHF);
        assert!(serde_json::from_str::<Currency>("\"ABC\"").is_err());
    }
}
