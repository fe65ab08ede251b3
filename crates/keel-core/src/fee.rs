//! Fee representation shared across chain families.
//!
//! UTXO chains price a transaction per virtual byte, account chains use a
//! dual-rate fee market (maximum total rate plus a priority tip rate), and
//! both accept a caller-fixed total. A [`FeeQuote`] is a four-grade
//! snapshot fetched fresh for every transaction preparation.

use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::error::AmountError;

/// Preset fee service levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeGrade {
    Low,
    Normal,
    High,
    Maximum,
}

impl FeeGrade {
    /// All grades, in ascending price order.
    pub const ALL: [FeeGrade; 4] = [
        FeeGrade::Low,
        FeeGrade::Normal,
        FeeGrade::High,
        FeeGrade::Maximum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeGrade::Low => "low",
            FeeGrade::Normal => "normal",
            FeeGrade::High => "high",
            FeeGrade::Maximum => "maximum",
        }
    }
}

impl fmt::Display for FeeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeGrade {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(FeeGrade::Low),
            "normal" => Ok(FeeGrade::Normal),
            "high" => Ok(FeeGrade::High),
            "maximum" => Ok(FeeGrade::Maximum),
            other => Err(AmountError::CannotParse(other.to_string())),
        }
    }
}

/// A transaction fee.
#[derive(Debug, Clone, PartialEq)]
pub enum Fee {
    /// Rate per virtual byte; the total follows from the signed size.
    PerVbyte(Amount),
    /// Caller-fixed total fee.
    Total(Amount),
    /// Fee-market dual rate per gas unit.
    FeeMarket {
        max_fee_per_unit: Amount,
        max_priority_fee_per_unit: Amount,
    },
}

/// Grade→fee snapshot for one transaction preparation.
///
/// Quotes are never reused across preparations; each `prepare_transfer`
/// fetches a fresh one so the fee reflects current network conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeQuote {
    low: Fee,
    normal: Fee,
    high: Fee,
    maximum: Fee,
}

impl FeeQuote {
    pub fn new(low: Fee, normal: Fee, high: Fee, maximum: Fee) -> Self {
        Self {
            low,
            normal,
            high,
            maximum,
        }
    }

    pub fn get(&self, grade: FeeGrade) -> &Fee {
        match grade {
            FeeGrade::Low => &self.low,
            FeeGrade::Normal => &self.normal,
            FeeGrade::High => &self.high,
            FeeGrade::Maximum => &self.maximum,
        }
    }
}

/// What the caller passes to `confirm`: a quoted grade or a custom fee.
#[derive(Debug, Clone, PartialEq)]
pub enum FeeSelection {
    Grade(FeeGrade),
    Custom(Fee),
}

impl FeeSelection {
    /// Resolve against a quote: grades look up their quoted fee, custom
    /// fees pass through unchanged.
    pub fn resolve(&self, quote: &FeeQuote) -> Fee {
        match self {
            FeeSelection::Grade(grade) => quote.get(*grade).clone(),
            FeeSelection::Custom(fee) => fee.clone(),
        }
    }
}

impl From<FeeGrade> for FeeSelection {
    fn from(grade: FeeGrade) -> Self {
        FeeSelection::Grade(grade)
    }
}

impl From<Fee> for FeeSelection {
    fn from(fee: Fee) -> Self {
        FeeSelection::Custom(fee)
    }
}
