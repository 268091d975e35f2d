//! Static weight tables: route weights inside a family and family weights
//! for fusion.

use crate::composite::is_composite_route;
use crate::core::record::IndexUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weighting carried by a family's composite entry.
pub const COMPOSITE_WEIGHTING: f64 = 100.0;

/// Fusion weight for families missing from the table.
pub const DEFAULT_FAMILY_WEIGHT: f64 = 1.0;

/// Built-in knowledge about an index family.
pub struct KnownFamily {
    pub name: &'static str,
    pub default_unit: IndexUnit,
    pub fusion_weight: f64,
    pub route_weights: &'static [(&'static str, f64)],
}

pub const KNOWN_FAMILIES: &[KnownFamily] = &[
    KnownFamily {
        name: "scfi",
        default_unit: IndexUnit::PerTeu,
        fusion_weight: 1.0,
        route_weights: &[
            ("Europe", 20.0),
            ("Mediterranean", 10.0),
            ("USWC", 20.0),
            ("US West Coast", 20.0),
            ("USEC", 7.5),
            ("US East Coast", 7.5),
            ("Persian Gulf", 7.5),
            ("Australia", 5.0),
            ("Africa", 2.5),
            ("South Africa", 2.5),
            ("South America", 2.5),
            ("West Japan", 5.0),
            ("East Japan", 5.0),
            ("Southeast Asia", 7.5),
            ("Korea", 5.0),
        ],
    },
    KnownFamily {
        name: "ccfi",
        default_unit: IndexUnit::Points,
        fusion_weight: 0.8,
        route_weights: &[
            ("Europe", 20.0),
            ("Mediterranean", 10.0),
            ("West America", 20.0),
            ("East America", 7.5),
            ("Persian Gulf", 7.5),
            ("Australia", 5.0),
            ("South Africa", 2.5),
            ("South America", 2.5),
            ("West Africa", 2.5),
            ("Japan", 10.0),
            ("Southeast Asia", 7.5),
            ("Korea", 5.0),
        ],
    },
    KnownFamily {
        name: "wci",
        default_unit: IndexUnit::PerFeu,
        fusion_weight: 1.0,
        route_weights: &[
            ("Rotterdam", 25.0),
            ("Genoa", 15.0),
            ("Los Angeles", 25.0),
            ("New York", 15.0),
        ],
    },
    KnownFamily {
        name: "fbx",
        default_unit: IndexUnit::PerFeu,
        fusion_weight: 1.0,
        route_weights: &[
            ("FBX01", 25.0),
            ("FBX03", 15.0),
            ("FBX11", 25.0),
            ("FBX13", 15.0),
        ],
    },
    KnownFamily {
        name: "kcci",
        default_unit: IndexUnit::PerFeu,
        fusion_weight: 0.9,
        route_weights: &[
            ("USWC", 20.0),
            ("USEC", 15.0),
            ("North Europe", 20.0),
            ("Mediterranean", 15.0),
            ("Middle East", 10.0),
            ("Australia", 5.0),
            ("Latin America", 5.0),
            ("Southeast Asia", 5.0),
            ("Japan", 5.0),
        ],
    },
];

pub fn known_family(name: &str) -> Option<&'static KnownFamily> {
    KNOWN_FAMILIES
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Keyword to weight (0-100) mapping for the routes of one family.
///
/// A route takes the weight of the longest keyword it contains, compared
/// case-insensitively. Unknown routes weigh nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteWeightTable {
    weights: BTreeMap<String, f64>,
}

impl RouteWeightTable {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn for_family(name: &str) -> Self {
        known_family(name)
            .map(|family| {
                family
                    .route_weights
                    .iter()
                    .map(|(keyword, weight)| (keyword.to_string(), *weight))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn weight_for(&self, route: &str) -> f64 {
        let route = route.to_lowercase();
        self.weights
            .iter()
            .filter(|(keyword, _)| route.contains(&keyword.to_lowercase()))
            .max_by_key(|(keyword, _)| keyword.len())
            .map_or(0.0, |(_, weight)| weight.clamp(0.0, 100.0))
    }

    /// Weighting stamped on a freshly extracted record.
    pub fn weighting_of(&self, route: &str) -> f64 {
        if is_composite_route(route) {
            COMPOSITE_WEIGHTING
        } else {
            self.weight_for(route)
        }
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl FromIterator<(String, f64)> for RouteWeightTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// Per-family weights used by the fusion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyWeights {
    weights: BTreeMap<String, f64>,
}

impl FamilyWeights {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self {
            weights: weights
                .into_iter()
                .map(|(family, weight)| (family.to_lowercase(), weight))
                .collect(),
        }
    }

    /// Every family weighs the same.
    pub fn uniform() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    pub fn weight_of(&self, family: &str) -> f64 {
        self.weights
            .get(&family.to_lowercase())
            .copied()
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(DEFAULT_FAMILY_WEIGHT)
    }
}

impl Default for FamilyWeights {
    fn default() -> Self {
        Self {
            weights: KNOWN_FAMILIES
                .iter()
                .map(|f| (f.name.to_string(), f.fusion_weight))
                .collect(),
        }
    }
}
