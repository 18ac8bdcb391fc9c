/*
[INPUT]:  Decimal amount strings and denomination names
[OUTPUT]: Exact-integer converted amount strings
[POS]:    Data layer - native currency denomination table
[UPDATE]: When adding denominations or changing formatting rules
*/

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use alloy_primitives::utils::{ParseUnits, parse_units};
use serde::{Deserialize, Serialize};

use crate::error::{MagicError, Result};

/// Named denominations of the chain's native currency.
///
/// Several names are historical synonyms mapping to the same decimal count
/// (kwei/babbage, mwei/lovelace, gwei/shannon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthUnit {
    Wei,
    Kwei,
    Babbage,
    Mwei,
    Lovelace,
    Gwei,
    Shannon,
    Szabo,
    Finney,
    Ether,
}

impl EthUnit {
    /// Decimal places relative to the base unit (wei)
    pub fn decimals(&self) -> u8 {
        match self {
            EthUnit::Wei => 0,
            EthUnit::Kwei | EthUnit::Babbage => 3,
            EthUnit::Mwei | EthUnit::Lovelace => 6,
            EthUnit::Gwei | EthUnit::Shannon => 9,
            EthUnit::Szabo => 12,
            EthUnit::Finney => 15,
            EthUnit::Ether => 18,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EthUnit::Wei => "wei",
            EthUnit::Kwei => "kwei",
            EthUnit::Babbage => "babbage",
            EthUnit::Mwei => "mwei",
            EthUnit::Lovelace => "lovelace",
            EthUnit::Gwei => "gwei",
            EthUnit::Shannon => "shannon",
            EthUnit::Szabo => "szabo",
            EthUnit::Finney => "finney",
            EthUnit::Ether => "ether",
        }
    }
}

impl FromStr for EthUnit {
    type Err = MagicError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "wei" => Ok(EthUnit::Wei),
            "kwei" => Ok(EthUnit::Kwei),
            "babbage" => Ok(EthUnit::Babbage),
            "mwei" => Ok(EthUnit::Mwei),
            "lovelace" => Ok(EthUnit::Lovelace),
            "gwei" => Ok(EthUnit::Gwei),
            "shannon" => Ok(EthUnit::Shannon),
            "szabo" => Ok(EthUnit::Szabo),
            "finney" => Ok(EthUnit::Finney),
            "ether" => Ok(EthUnit::Ether),
            _ => Err(MagicError::WrongUnit),
        }
    }
}

impl fmt::Display for EthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a decimal amount between two denominations.
///
/// The value is first scaled into an integer base-unit (wei) amount at
/// `from`'s decimals, then formatted back out at `to`'s decimals. Integer
/// arithmetic throughout; amounts with more fractional digits than `from`
/// allows are rejected rather than rounded.
pub fn convert_balance(value: &str, from: EthUnit, to: EthUnit) -> Result<String> {
    let trimmed = value.trim();

    // parse_units rounds excess fractional digits; rule them out first
    if let Some((_, frac)) = trimmed.split_once('.') {
        if frac.len() > from.decimals() as usize {
            return Err(MagicError::InvalidAmount(format!(
                "{trimmed}: more than {} fractional digits for {}",
                from.decimals(),
                from
            )));
        }
    }

    let parsed = parse_units(trimmed, from.decimals())
        .map_err(|e| MagicError::InvalidAmount(e.to_string()))?;

    let (base, negative) = match parsed {
        ParseUnits::U256(v) => (v, false),
        ParseUnits::I256(v) => (v.unsigned_abs(), v.is_negative()),
    };

    let formatted = format_base_units(base, to.decimals());
    if negative && formatted != "0" {
        Ok(format!("-{formatted}"))
    } else {
        Ok(formatted)
    }
}

/// Format an integer base-unit amount at the given decimal count, trimming
/// trailing fractional zeros ("1", not "1.000000000").
pub fn format_base_units(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let frac = amount % divisor;

    if frac.is_zero() {
        return whole.to_string();
    }

    let mut frac_str = frac.to_string();
    while frac_str.len() < decimals as usize {
        frac_str.insert(0, '0');
    }
    let trimmed = frac_str.trim_end_matches('0');
    format!("{whole}.{trimmed}")
}
