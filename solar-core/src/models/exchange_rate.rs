use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Units of local currency per US dollar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub current_rate: Decimal,
    #[serde(default = "default_currency_pair")]
    pub currency_pair: String,
}

fn default_currency_pair() -> String {
    "USD/ARS".to_string()
}

impl ExchangeRate {
    pub fn to_local(
        &self,
        usd: Decimal,
    ) -> Decimal {
        usd * self.current_rate
    }

    /// `None` while the rate is not positive.
    pub fn to_usd(
        &self,
        local: Decimal,
    ) -> Option<Decimal> {
        (self.current_rate > Decimal::ZERO).then(|| local / self.current_rate)
    }
}
