//! Wire types for the CycleCare backend
//!
//! Field names follow the backend's camelCase JSON. Identifiers are newtypes
//! so a city id can never be passed where an order id is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the inner string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for an order
    OrderId
);
string_id!(
    /// Unique identifier for a user account
    UserId
);
string_id!(
    /// Unique identifier for a catalog service
    ServiceId
);
string_id!(
    /// Unique identifier for a registered cycle
    CycleId
);

/// Numeric city identifier (as stored under the `cityId` storage key)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(u32);

impl CityId {
    /// Creates a new city id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

const fn default_true() -> bool {
    true
}

/// A city the business operates in (or has been asked about)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    /// City identifier
    pub id: CityId,
    /// Display name
    pub name: String,
    /// State / province
    #[serde(default)]
    pub state: String,
    /// Country
    #[serde(default)]
    pub country: String,
    /// Postal codes belonging to this city
    #[serde(default)]
    pub pincodes: Vec<String>,
    /// Whether doorstep service is currently offered here
    #[serde(default = "default_true", alias = "isServiceable")]
    pub serviceable: bool,
}

/// Bike category, which determines the service price
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CycleType {
    /// Geared bicycle
    Gear,
    /// Single-speed bicycle
    NonGear,
}

impl CycleType {
    /// Wire name of the type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gear => "gear",
            Self::NonGear => "nonGear",
        }
    }
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-bike-type prices, in whole rupees
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrices {
    /// Price for geared cycles
    pub gear: u32,
    /// Price for single-speed cycles
    pub non_gear: u32,
}

/// A maintenance package from the catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service identifier
    #[serde(alias = "_id")]
    pub id: ServiceId,
    /// Display name
    pub name: String,
    /// One-line description
    #[serde(default)]
    pub short_description: String,
    /// Display order (ascending)
    #[serde(default)]
    pub rank: u32,
    /// Inactive services are hidden from the catalog
    #[serde(default = "default_true")]
    pub active: bool,
    /// What the package covers, as named boolean flags
    #[serde(default)]
    pub checklist: BTreeMap<String, bool>,
    /// Prices per bike type
    #[serde(default)]
    pub prices: ServicePrices,
}

impl Service {
    /// Price for the given bike type
    #[must_use]
    pub const fn price_for(&self, cycle_type: CycleType) -> u32 {
        match cycle_type {
            CycleType::Gear => self.prices.gear,
            CycleType::NonGear => self.prices.non_gear,
        }
    }

    /// Human-readable lines for every checklist flag that is set
    ///
    /// `brakeAdjustment` and `brake_adjustment` both become `Brake adjustment`.
    #[must_use]
    pub fn checklist_descriptions(&self) -> Vec<String> {
        self.checklist
            .iter()
            .filter(|(_, included)| **included)
            .map(|(key, _)| humanize_flag(key))
            .collect()
    }
}

fn humanize_flag(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.extend(ch.to_lowercase());
        } else {
            current.extend(ch.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Customer contact and address details
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// 10-digit mobile number
    #[serde(default)]
    pub phone: String,
    /// Street address
    #[serde(default)]
    pub address_line1: String,
    /// Apartment, floor, etc.
    #[serde(default)]
    pub address_line2: String,
    /// Nearby landmark for the mechanic
    #[serde(default)]
    pub landmark: String,
    /// Selected city
    #[serde(default)]
    pub city: Option<CityId>,
    /// 6-digit postal code
    #[serde(default)]
    pub pincode: String,
    /// Latitude of the pickup address
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude of the pickup address
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A customer's bicycle registered within an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    /// Server-assigned id, absent before the order is created
    #[serde(default)]
    pub id: Option<CycleId>,
    /// Brand or model name
    #[serde(alias = "name")]
    pub brand: String,
    /// Bike category
    #[serde(rename = "type")]
    pub cycle_type: CycleType,
    /// Uploaded image reference
    #[serde(default)]
    pub image: Option<String>,
    /// Service booked for this cycle
    #[serde(default)]
    pub service: Option<ServiceId>,
    /// Whether this cycle is part of the booking
    #[serde(default)]
    pub order: bool,
}

/// One state change recorded against an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Event kind, e.g. `order_accepted`
    #[serde(rename = "type", alias = "event")]
    pub kind: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// Who triggered it (mechanic, admin, customer)
    #[serde(default)]
    pub actor: Option<String>,
}

/// A booking as returned by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier
    #[serde(alias = "_id")]
    pub id: OrderId,
    /// Customer snapshot taken at booking time
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Cycles in the order
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    /// Selected service
    #[serde(default)]
    pub service: Option<Service>,
    /// Explicit status, when the backend sets one
    #[serde(default)]
    pub status: Option<String>,
    /// Activity timeline
    #[serde(default, alias = "activities")]
    pub activity: Vec<ActivityEvent>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial order update
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// New explicit status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form note for the mechanic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A signed-in account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account identifier
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Verified phone number
    pub phone: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Saved customer profile
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Backend session token issued at registration
    #[serde(default)]
    pub token: Option<String>,
}

/// Registration payload sent after OTP verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    /// Verified phone number
    pub phone: String,
    /// Token issued by the identity provider
    pub identity_token: String,
}

/// A block of landing-page copy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    /// Stable key, e.g. `hero`
    pub key: String,
    /// Heading
    #[serde(default)]
    pub title: String,
    /// Body text
    #[serde(default)]
    pub body: String,
}

/// Landing page content
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingContent {
    /// Content blocks in display order
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl LandingContent {
    /// Find a block by key
    #[must_use]
    pub fn block(&self, key: &str) -> Option<&ContentBlock> {
        self.blocks.iter().find(|b| b.key == key)
    }
}

/// Business contact details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    /// Support phone
    #[serde(default)]
    pub phone: String,
    /// Support email
    #[serde(default)]
    pub email: String,
    /// Office address
    #[serde(default)]
    pub address: String,
    /// WhatsApp number
    #[serde(default)]
    pub whatsapp: Option<String>,
}

/// A file attached to a multipart submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFile {
    /// Form field name
    pub field: String,
    /// File name sent to the backend
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Transport-neutral multipart form for order creation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderForm {
    /// Text fields in insertion order
    pub fields: Vec<(String, String)>,
    /// Attached files
    pub files: Vec<FormFile>,
}

impl OrderForm {
    /// Append a text field
    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Value of the first field with this name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_descriptions_only_include_set_flags() {
        let mut checklist = BTreeMap::new();
        checklist.insert("brakeAdjustment".to_string(), true);
        checklist.insert("chain_lubrication".to_string(), true);
        checklist.insert("wheelTruing".to_string(), false);

        let service = Service {
            id: ServiceId::new("svc-1"),
            name: "Basic".to_string(),
            short_description: String::new(),
            rank: 1,
            active: true,
            checklist,
            prices: ServicePrices { gear: 499, non_gear: 399 },
        };

        assert_eq!(
            service.checklist_descriptions(),
            vec!["Brake adjustment".to_string(), "Chain lubrication".to_string()]
        );
        assert_eq!(service.price_for(CycleType::NonGear), 399);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn order_accepts_mongo_style_id_and_activity_alias() {
        let order: Order = serde_json::from_str(
            r#"{
                "_id": "ord-9",
                "activities": [
                    {"type": "order_accepted", "timestamp": "2025-01-01T10:00:00Z", "actor": "admin"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(order.id, OrderId::new("ord-9"));
        assert_eq!(order.activity.len(), 1);
        assert_eq!(order.activity[0].actor.as_deref(), Some("admin"));
        assert!(order.status.is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn cycle_type_uses_camel_case_wire_names() {
        let cycle: Cycle =
            serde_json::from_str(r#"{"name": "Hercules", "type": "nonGear", "order": true}"#)
                .unwrap();
        assert_eq!(cycle.brand, "Hercules");
        assert_eq!(cycle.cycle_type, CycleType::NonGear);
        assert!(cycle.order);
    }

    #[test]
    fn city_id_parses_stored_value() {
        assert_eq!("3".parse::<CityId>(), Ok(CityId::new(3)));
        assert!("pune".parse::<CityId>().is_err());
    }
}
