//! Pincode service-area lookup.
//!
//! The gate only informs: an unknown or non-serviceable pincode produces a
//! warning, never a blocked submission.

use cyclecare_api::{City, CityId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// City details filled in when a pincode resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityInfo {
    /// City identifier
    pub id: CityId,
    /// Display name
    pub name: String,
    /// State / province
    pub state: String,
    /// Country
    pub country: String,
}

impl From<&City> for CityInfo {
    fn from(city: &City) -> Self {
        Self {
            id: city.id,
            name: city.name.clone(),
            state: city.state.clone(),
            country: city.country.clone(),
        }
    }
}

/// Outcome of a pincode check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaCheck {
    /// Doorstep service is offered here.
    Serviceable(CityInfo),
    /// The pincode belongs to a city without service.
    NotServiceable(CityInfo),
    /// No loaded city lists this pincode.
    Unknown,
}

impl AreaCheck {
    /// Resolved city, if any.
    #[must_use]
    pub fn city(&self) -> Option<&CityInfo> {
        match self {
            Self::Serviceable(city) | Self::NotServiceable(city) => Some(city),
            Self::Unknown => None,
        }
    }

    /// Non-blocking warning to show next to the pincode field.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Serviceable(_) => None,
            Self::NotServiceable(city) => Some(format!(
                "We don't service {} yet. You can still place the request.",
                city.name
            )),
            Self::Unknown => {
                Some("We couldn't match this pincode to a city we serve.".to_string())
            },
        }
    }
}

/// Service area built from the loaded city list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceArea {
    cities: BTreeMap<CityId, City>,
    by_pincode: HashMap<String, CityId>,
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl ServiceArea {
    /// Index `cities` by id and pincode.
    ///
    /// A pincode listed by several cities resolves to the first one.
    #[must_use]
    pub fn from_cities(cities: &[City]) -> Self {
        let mut area = Self::default();
        for city in cities {
            for pincode in &city.pincodes {
                let pincode = pincode.trim().to_string();
                area.by_pincode.entry(pincode.clone()).or_insert(city.id);
                if city.serviceable {
                    area.allow.insert(pincode);
                } else {
                    area.deny.insert(pincode);
                }
            }
            area.cities.entry(city.id).or_insert_with(|| city.clone());
        }
        area
    }

    /// Whether no cities are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// City by id.
    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(&id)
    }

    /// Whether `id` names a loaded city.
    #[must_use]
    pub fn contains(&self, id: CityId) -> bool {
        self.cities.contains_key(&id)
    }

    /// Loaded cities in id order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// City details for a pincode.
    #[must_use]
    pub fn resolve_pincode(&self, pincode: &str) -> Option<CityInfo> {
        self.by_pincode
            .get(pincode.trim())
            .and_then(|id| self.cities.get(id))
            .map(CityInfo::from)
    }

    /// Classify a pincode.
    #[must_use]
    pub fn check(&self, pincode: &str) -> AreaCheck {
        let pincode = pincode.trim();
        match self.resolve_pincode(pincode) {
            Some(info) if self.allow.contains(pincode) => AreaCheck::Serviceable(info),
            Some(info) if self.deny.contains(pincode) => AreaCheck::NotServiceable(info),
            Some(_) | None => AreaCheck::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(id: u32, name: &str, pincodes: &[&str], serviceable: bool) -> City {
        City {
            id: CityId::new(id),
            name: name.to_string(),
            state: "Maharashtra".to_string(),
            country: "India".to_string(),
            pincodes: pincodes.iter().map(|p| (*p).to_string()).collect(),
            serviceable,
        }
    }

    fn area() -> ServiceArea {
        ServiceArea::from_cities(&[
            city(1, "Mumbai", &["400001"], true),
            city(3, "Pune", &["411057", "411001"], true),
            city(7, "Nagpur", &["440001"], false),
        ])
    }

    #[test]
    fn pincode_resolves_city_details() {
        let info = area().resolve_pincode("411057");
        assert_eq!(
            info,
            Some(CityInfo {
                id: CityId::new(3),
                name: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                country: "India".to_string(),
            })
        );
    }

    #[test]
    fn check_classifies_pincodes() {
        let area = area();
        assert!(matches!(area.check("411001"), AreaCheck::Serviceable(c) if c.id == CityId::new(3)));
        assert!(matches!(area.check("440001"), AreaCheck::NotServiceable(c) if c.name == "Nagpur"));
        assert_eq!(area.check("560001"), AreaCheck::Unknown);
    }

    #[test]
    fn only_gaps_produce_warnings() {
        let area = area();
        assert_eq!(area.check("400001").warning(), None);
        assert!(area.check("440001").warning().is_some_and(|w| w.contains("Nagpur")));
        assert!(area.check("000000").warning().is_some());
    }

    #[test]
    fn lookup_by_id() {
        let area = area();
        assert!(area.contains(CityId::new(7)));
        assert!(!area.contains(CityId::new(9)));
        assert_eq!(area.cities().count(), 3);
        assert!(ServiceArea::default().is_empty());
    }
}
