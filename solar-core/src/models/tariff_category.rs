use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A utility rate class. Charges are in local currency per kWh; the fixed
/// charge is per month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffCategory {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub energy_charge_peak: Decimal,
    pub energy_charge_valley: Decimal,
    pub fixed_charge_monthly: Decimal,
    /// Share of consumption that falls in peak hours, in percent.
    #[serde(default = "default_peak_percentage")]
    pub peak_percentage: Decimal,
}

fn default_peak_percentage() -> Decimal {
    Decimal::from(30)
}

impl TariffCategory {
    /// Average price of one kWh given the peak/valley split.
    pub fn blended_energy_charge(&self) -> Decimal {
        let peak_share = self.peak_percentage / Decimal::ONE_HUNDRED;
        let valley_share = Decimal::ONE - peak_share;
        peak_share * self.energy_charge_peak + valley_share * self.energy_charge_valley
    }

    /// Monthly bill for the given consumption, fixed charge included.
    pub fn monthly_cost(
        &self,
        monthly_kwh: Decimal,
    ) -> Decimal {
        monthly_kwh * self.blended_energy_charge() + self.fixed_charge_monthly
    }

    /// Consumption that produces `monthly_bill` under this tariff.
    ///
    /// Returns `None` when the tariff has no energy charge, because every
    /// consumption would then cost the same, or when the consumption does
    /// not fit in a `Decimal`.
    pub fn consumption_for_bill(
        &self,
        monthly_bill: Decimal,
    ) -> Option<Decimal> {
        let rate = self.blended_energy_charge();
        if rate <= Decimal::ZERO {
            return None;
        }
        let energy_part = (monthly_bill - self.fixed_charge_monthly).max(Decimal::ZERO);
        energy_part.checked_div(rate)
    }
}
