//! Container classes and the cargo-weight rate adjustment.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContainerClass {
    #[serde(rename = "20GP")]
    Gp20,
    #[default]
    #[serde(rename = "40GP")]
    Gp40,
    #[serde(rename = "40HC")]
    Hc40,
    #[serde(rename = "45HC")]
    Hc45,
    #[serde(rename = "20RF")]
    Rf20,
    #[serde(rename = "40RF")]
    Rf40,
}

impl ContainerClass {
    pub const ALL: [ContainerClass; 6] = [
        ContainerClass::Gp20,
        ContainerClass::Gp40,
        ContainerClass::Hc40,
        ContainerClass::Hc45,
        ContainerClass::Rf20,
        ContainerClass::Rf40,
    ];

    /// Typical cargo load in metric tons the base rate is quoted for.
    pub fn standard_tonnage(&self) -> f64 {
        match self {
            ContainerClass::Gp20 => 14.0,
            ContainerClass::Gp40 => 20.0,
            ContainerClass::Hc40 => 22.0,
            ContainerClass::Hc45 => 24.0,
            ContainerClass::Rf20 => 12.0,
            ContainerClass::Rf40 => 18.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerClass::Gp20 => "20GP",
            ContainerClass::Gp40 => "40GP",
            ContainerClass::Hc40 => "40HC",
            ContainerClass::Hc45 => "45HC",
            ContainerClass::Rf20 => "20RF",
            ContainerClass::Rf40 => "40RF",
        }
    }
}

impl Display for ContainerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContainerClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ContainerClass::ALL
            .into_iter()
            .find(|class| class.as_str() == wanted)
            .ok_or_else(|| anyhow!("Invalid container class: {}", s))
    }
}

/// Scales a rate by how far the cargo weight is from the container's
/// standard tonnage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CargoAdjustment {
    /// Discount reached at zero cargo weight.
    pub underweight_discount: f64,
    /// Premium reached at `max_excess_ratio` over the standard tonnage.
    pub overweight_premium: f64,
    pub max_excess_ratio: f64,
}

impl Default for CargoAdjustment {
    fn default() -> Self {
        Self {
            underweight_discount: 0.10,
            overweight_premium: 0.30,
            max_excess_ratio: 1.0,
        }
    }
}

impl CargoAdjustment {
    pub fn new(underweight_discount: f64, overweight_premium: f64) -> Self {
        Self {
            underweight_discount,
            overweight_premium,
            ..Self::default()
        }
    }

    /// Multiplicative factor for a cargo of `weight_tons`. Missing or
    /// nonsensical weights leave the rate unchanged.
    pub fn factor(&self, class: ContainerClass, weight_tons: Option<f64>) -> f64 {
        let standard = class.standard_tonnage();
        let Some(weight) = weight_tons.filter(|w| w.is_finite() && *w >= 0.0) else {
            return 1.0;
        };

        if weight < standard {
            let shortfall = (standard - weight) / standard;
            1.0 - self.underweight_discount * shortfall
        } else if weight > standard {
            let excess = ((weight - standard) / standard).min(self.max_excess_ratio);
            1.0 + self.overweight_premium * (excess / self.max_excess_ratio)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_container_class() {
        assert_eq!("40hc".parse::<ContainerClass>().unwrap(), ContainerClass::Hc40);
        assert_eq!(" 20GP ".parse::<ContainerClass>().unwrap(), ContainerClass::Gp20);
        assert!("53FT".parse::<ContainerClass>().is_err());
        assert_eq!(ContainerClass::default().to_string(), "40GP");
    }

    #[test]
    fn test_standard_weight_is_neutral() {
        let adjustment = CargoAdjustment::default();
        assert_eq!(adjustment.factor(ContainerClass::Gp40, Some(20.0)), 1.0);
        assert_eq!(adjustment.factor(ContainerClass::Gp40, None), 1.0);
        assert_eq!(adjustment.factor(ContainerClass::Gp40, Some(f64::NAN)), 1.0);
    }

    #[test]
    fn test_underweight_discount_is_linear_and_capped() {
        let adjustment = CargoAdjustment::default();
        assert!(close(adjustment.factor(ContainerClass::Gp40, Some(10.0)), 0.95));
        assert!(close(adjustment.factor(ContainerClass::Gp40, Some(0.0)), 0.90));
    }

    #[test]
    fn test_overweight_premium_is_capped() {
        let adjustment = CargoAdjustment::default();
        assert!(close(adjustment.factor(ContainerClass::Gp20, Some(21.0)), 1.15));
        assert!(close(adjustment.factor(ContainerClass::Gp20, Some(28.0)), 1.30));
        assert!(close(adjustment.factor(ContainerClass::Gp20, Some(100.0)), 1.30));
    }
}
