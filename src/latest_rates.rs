use std::collections::HashMap;

use serde::Deserialize;

/// Body of a `latest` rates response.
#[derive(Debug, Deserialize, PartialEq)]
pub struct LatestRates {
    /// Absent on providers that only signal failure through the status code.
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

fn default_success() -> bool {
    true
}
