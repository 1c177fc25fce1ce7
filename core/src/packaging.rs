//! Packaging reference data and the weight admission rule.
//!
//! Each packaging kind carries a fixed surcharge, and bag and box carry a
//! maximum admissible weight. Film has no weight limit. This is immutable
//! reference data; storage only records an opaque foreign key per order.

use crate::error::OrderError;
use serde::{Deserialize, Serialize};

/// Surcharge for a bag, in currency units.
pub const BAG_SURCHARGE: f64 = 5.0;
/// Surcharge for a box.
pub const BOX_SURCHARGE: f64 = 20.0;
/// Surcharge for film wrap.
pub const FILM_SURCHARGE: f64 = 1.0;

/// Maximum admissible weight for a bag; `weight >= limit` is rejected.
pub const BAG_WEIGHT_LIMIT: f64 = 10.0;
/// Maximum admissible weight for a box.
pub const BOX_WEIGHT_LIMIT: f64 = 30.0;

/// The packaging applied to a parcel at acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    /// Plastic bag, up to 10 weight units.
    Bag,
    /// Cardboard box, up to 30 weight units.
    Box,
    /// Film wrap, any weight.
    Film,
}

impl Packaging {
    /// The fixed cost added to the order when this packaging is used.
    #[must_use]
    pub const fn surcharge(self) -> f64 {
        match self {
            Self::Bag => BAG_SURCHARGE,
            Self::Box => BOX_SURCHARGE,
            Self::Film => FILM_SURCHARGE,
        }
    }

    /// Maximum admissible weight, if this packaging has one.
    #[must_use]
    pub const fn weight_limit(self) -> Option<f64> {
        match self {
            Self::Bag => Some(BAG_WEIGHT_LIMIT),
            Self::Box => Some(BOX_WEIGHT_LIMIT),
            Self::Film => None,
        }
    }

    /// Stable lowercase name, matching the persisted foreign-key label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bag => "bag",
            Self::Box => "box",
            Self::Film => "film",
        }
    }

    /// Validate the parcel weight against this packaging and return the
    /// surcharge to add to the order cost.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Validation`] when the weight reaches or
    /// exceeds the packaging limit.
    pub fn admit(self, weight: f64) -> Result<f64, OrderError> {
        if let Some(limit) = self.weight_limit() {
            if weight >= limit {
                return Err(OrderError::Validation(format!(
                    "weight {weight} exceeds the {} limit of {limit}",
                    self.as_str()
                )));
            }
        }
        Ok(self.surcharge())
    }
}

impl std::fmt::Display for Packaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Packaging {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bag" => Ok(Self::Bag),
            "box" => Ok(Self::Box),
            "film" => Ok(Self::Film),
            other => Err(OrderError::Validation(format!(
                "unknown packaging type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bag_limit_is_exclusive() {
        assert!(Packaging::Bag.admit(9.99).is_ok());
        assert!(Packaging::Bag.admit(10.0).is_err());
    }

    #[test]
    fn box_limit_is_exclusive() {
        assert!(Packaging::Box.admit(29.99).is_ok());
        assert!(Packaging::Box.admit(30.0).is_err());
    }

    #[test]
    fn film_takes_anything() {
        assert!((Packaging::Film.admit(10_000.0).ok() == Some(FILM_SURCHARGE)));
    }

    #[test]
    fn surcharges_match_reference_data() {
        assert!((Packaging::Bag.surcharge() - 5.0).abs() < f64::EPSILON);
        assert!((Packaging::Box.surcharge() - 20.0).abs() < f64::EPSILON);
        assert!((Packaging::Film.surcharge() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn name_round_trip() {
        for p in [Packaging::Bag, Packaging::Box, Packaging::Film] {
            assert_eq!(p.as_str().parse::<Packaging>().ok(), Some(p));
        }
        assert!("crate".parse::<Packaging>().is_err());
    }

    proptest! {
        #[test]
        fn film_admits_any_non_negative_weight(weight in 0.0f64..1e9) {
            prop_assert!(Packaging::Film.admit(weight).is_ok());
        }

        #[test]
        fn bag_admission_tracks_the_limit(weight in 0.0f64..100.0) {
            let admitted = Packaging::Bag.admit(weight).is_ok();
            prop_assert_eq!(admitted, weight < BAG_WEIGHT_LIMIT);
        }

        #[test]
        fn box_admission_tracks_the_limit(weight in 0.0f64..100.0) {
            let admitted = Packaging::Box.admit(weight).is_ok();
            prop_assert_eq!(admitted, weight < BOX_WEIGHT_LIMIT);
        }
    }
}
