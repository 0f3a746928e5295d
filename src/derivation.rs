//! Derived-metric computation for granite blocks.
//!
//! Raw measurements are taken in millimeters at the quarry face. Billing and
//! statutory reporting both work in cubic meters and tonnes, derived here and
//! never stored; every read path recomputes from the raw measurement so the
//! formula has exactly one home.
//!
//! Two presets exist. `Standard` is the authoritative gate-pass formula
//! (density 2.85, net-CBM divisor 6.5). `BillingSummaryEstimate` reproduces
//! the 2.7/0.95 variant used by the legacy billing summary report; the two
//! disagree by design and must not be merged without a product decision.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Quarry volume to tonnage, tonnes per cubic meter of granite.
pub const DENSITY_FACTOR: Decimal = dec!(2.85);

/// Customer tonnage to net billable CBM.
pub const NET_CBM_DIVISOR: Decimal = dec!(6.5);

const ESTIMATE_DENSITY_FACTOR: Decimal = dec!(2.7);
const ESTIMATE_NET_FACTOR: Decimal = dec!(0.95);

const MM3_PER_M3: Decimal = dec!(1000000000);

/// Block dimensions in millimeters. Negative inputs are coerced to zero at
/// construction; the deriver is total and never rejects a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub length_mm: Decimal,
    pub width_mm: Decimal,
    pub height_mm: Decimal,
}

impl Measurement {
    pub fn new(length_mm: Decimal, width_mm: Decimal, height_mm: Decimal) -> Self {
        Self {
            length_mm: length_mm.max(Decimal::ZERO),
            width_mm: width_mm.max(Decimal::ZERO),
            height_mm: height_mm.max(Decimal::ZERO),
        }
    }

    /// Unrounded volume in cubic meters. Zero if any dimension is
    /// non-positive.
    fn volume_cbm(&self) -> Decimal {
        volume_cbm(self.length_mm, self.width_mm, self.height_mm)
    }
}

fn volume_cbm(length_mm: Decimal, width_mm: Decimal, height_mm: Decimal) -> Decimal {
    if length_mm <= Decimal::ZERO || width_mm <= Decimal::ZERO || height_mm <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    length_mm * width_mm * height_mm / MM3_PER_M3
}

/// Allowance deduction policy. The two branches are mutually exclusive per
/// block: selecting one clears the other's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "allowance_type", rename_all = "snake_case")]
pub enum AllowancePolicy {
    #[default]
    None,
    /// Deduct `pre_allowance_mm` from every dimension before computing the
    /// customer-facing volume.
    Volume { pre_allowance_mm: Decimal },
    /// Deduct a flat tonnage from the government-basis tonnage; the
    /// customer-facing volume is reverse-derived.
    Tonnage { tonnage_allowance: Decimal },
}

/// Formula preset selector, passed explicitly by callers instead of each call
/// site carrying its own copy of the constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaPreset {
    Standard(AllowancePolicy),
    /// Legacy reporting variant (`tonnage = volume * 2.7`,
    /// `net_cbm = volume * 0.95`). Known to disagree with `Standard`.
    BillingSummaryEstimate,
}

/// The five derived quantities, each rounded to 4 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Raw volume before any deduction, the government/statutory basis.
    pub quarry_cbm: Decimal,
    /// Tonnage on the quarry volume.
    pub dmg_tonnage: Decimal,
    /// Volume after allowance deduction, the customer billing basis.
    pub gross_volume: Decimal,
    pub customer_tonnage: Decimal,
    /// Final billable volume metric.
    pub net_cbm: Decimal,
}

/// Round to 4 decimal places, half away from zero.
pub fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute all derived metrics for a measurement under the given preset.
///
/// Total over the numeric domain: out-of-range inputs clamp to zero, no
/// branch can fail. Stage-by-stage rounding order is load-bearing for
/// compatibility with historical gate passes.
pub fn derive_metrics(measurement: &Measurement, preset: &FormulaPreset) -> DerivedMetrics {
    let raw_volume = measurement.volume_cbm();
    match preset {
        FormulaPreset::Standard(policy) => standard_metrics(measurement, raw_volume, policy),
        FormulaPreset::BillingSummaryEstimate => {
            let quarry_cbm = round4(raw_volume);
            let dmg_tonnage = round4(raw_volume * ESTIMATE_DENSITY_FACTOR);
            DerivedMetrics {
                quarry_cbm,
                dmg_tonnage,
                gross_volume: quarry_cbm,
                customer_tonnage: dmg_tonnage,
                net_cbm: round4(raw_volume * ESTIMATE_NET_FACTOR),
            }
        }
    }
}

fn standard_metrics(
    measurement: &Measurement,
    raw_volume: Decimal,
    policy: &AllowancePolicy,
) -> DerivedMetrics {
    let quarry_cbm = round4(raw_volume);
    let dmg_tonnage = round4(quarry_cbm * DENSITY_FACTOR);

    let (gross_volume, customer_tonnage) = match policy {
        AllowancePolicy::None => (quarry_cbm, dmg_tonnage),
        AllowancePolicy::Volume { pre_allowance_mm } => {
            let pre = (*pre_allowance_mm).max(Decimal::ZERO);
            let gross = round4(volume_cbm(
                measurement.length_mm - pre,
                measurement.width_mm - pre,
                measurement.height_mm - pre,
            ));
            (gross, round4(gross * DENSITY_FACTOR))
        }
        AllowancePolicy::Tonnage { tonnage_allowance } => {
            let allowance = (*tonnage_allowance).max(Decimal::ZERO);
            let customer = round4((dmg_tonnage - allowance).max(Decimal::ZERO));
            (round4(customer / DENSITY_FACTOR), customer)
        }
    };

    DerivedMetrics {
        quarry_cbm,
        dmg_tonnage,
        gross_volume,
        customer_tonnage,
        net_cbm: round4(customer_tonnage / NET_CBM_DIVISOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(l: i64, w: i64, h: i64) -> Measurement {
        Measurement::new(Decimal::from(l), Decimal::from(w), Decimal::from(h))
    }

    #[test]
    fn quarry_basis_has_no_deduction() {
        let metrics = derive_metrics(
            &m(1000, 500, 300),
            &FormulaPreset::Standard(AllowancePolicy::Volume {
                pre_allowance_mm: dec!(10),
            }),
        );
        assert_eq!(metrics.quarry_cbm, dec!(0.15));
        assert_eq!(metrics.dmg_tonnage, dec!(0.4275));
    }

    #[test]
    fn volume_allowance_worked_example() {
        let metrics = derive_metrics(
            &m(1000, 500, 300),
            &FormulaPreset::Standard(AllowancePolicy::Volume {
                pre_allowance_mm: dec!(10),
            }),
        );
        // 990 * 490 * 290 / 1e9 = 0.1406799
        assert_eq!(metrics.gross_volume, dec!(0.1407));
        assert_eq!(metrics.customer_tonnage, round4(dec!(0.1407) * DENSITY_FACTOR));
        assert_eq!(
            metrics.net_cbm,
            round4(metrics.customer_tonnage / NET_CBM_DIVISOR)
        );
    }

    #[test]
    fn oversized_volume_allowance_clamps_gross_to_zero() {
        let metrics = derive_metrics(
            &m(100, 100, 100),
            &FormulaPreset::Standard(AllowancePolicy::Volume {
                pre_allowance_mm: dec!(150),
            }),
        );
        assert_eq!(metrics.gross_volume, Decimal::ZERO);
        assert_eq!(metrics.customer_tonnage, Decimal::ZERO);
        assert_eq!(metrics.net_cbm, Decimal::ZERO);
        // Statutory figures are untouched by the allowance.
        assert_eq!(metrics.quarry_cbm, dec!(0.001));
    }

    #[test]
    fn oversized_tonnage_allowance_clamps_customer_to_zero() {
        let metrics = derive_metrics(
            &m(1000, 500, 300),
            &FormulaPreset::Standard(AllowancePolicy::Tonnage {
                tonnage_allowance: dec!(99),
            }),
        );
        assert_eq!(metrics.customer_tonnage, Decimal::ZERO);
        assert_eq!(metrics.gross_volume, Decimal::ZERO);
        assert_eq!(metrics.net_cbm, Decimal::ZERO);
    }

    #[test]
    fn tonnage_allowance_reverse_derives_gross() {
        let metrics = derive_metrics(
            &m(1000, 500, 300),
            &FormulaPreset::Standard(AllowancePolicy::Tonnage {
                tonnage_allowance: dec!(0.1),
            }),
        );
        let expected_customer = round4(dec!(0.4275) - dec!(0.1));
        assert_eq!(metrics.customer_tonnage, expected_customer);
        assert_eq!(
            metrics.gross_volume,
            round4(expected_customer / DENSITY_FACTOR)
        );
        assert_eq!(
            metrics.net_cbm,
            round4(expected_customer / NET_CBM_DIVISOR)
        );
    }

    #[test]
    fn negative_dimensions_coerce_to_zero() {
        let measurement = Measurement::new(dec!(-100), dec!(500), dec!(300));
        assert_eq!(measurement.length_mm, Decimal::ZERO);
        let metrics = derive_metrics(
            &measurement,
            &FormulaPreset::Standard(AllowancePolicy::None),
        );
        assert_eq!(metrics.quarry_cbm, Decimal::ZERO);
        assert_eq!(metrics.net_cbm, Decimal::ZERO);
    }

    #[test]
    fn derivation_is_idempotent() {
        let preset = FormulaPreset::Standard(AllowancePolicy::Volume {
            pre_allowance_mm: dec!(25),
        });
        let first = derive_metrics(&m(2700, 1600, 1400), &preset);
        let second = derive_metrics(&m(2700, 1600, 1400), &preset);
        assert_eq!(first, second);
    }

    #[test]
    fn no_allowance_bills_the_quarry_figures() {
        let metrics = derive_metrics(&m(2000, 1000, 1000), &FormulaPreset::Standard(AllowancePolicy::None));
        assert_eq!(metrics.gross_volume, metrics.quarry_cbm);
        assert_eq!(metrics.customer_tonnage, metrics.dmg_tonnage);
        assert_eq!(metrics.net_cbm, round4(metrics.dmg_tonnage / NET_CBM_DIVISOR));
    }

    #[test]
    fn estimate_preset_uses_its_own_constants() {
        let metrics = derive_metrics(&m(1000, 1000, 1000), &FormulaPreset::BillingSummaryEstimate);
        assert_eq!(metrics.quarry_cbm, dec!(1));
        assert_eq!(metrics.dmg_tonnage, dec!(2.7));
        assert_eq!(metrics.net_cbm, dec!(0.95));

        // The divergence from the standard preset is intentional.
        let standard = derive_metrics(
            &m(1000, 1000, 1000),
            &FormulaPreset::Standard(AllowancePolicy::None),
        );
        assert_ne!(metrics.dmg_tonnage, standard.dmg_tonnage);
    }
}
