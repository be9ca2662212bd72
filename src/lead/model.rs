//! The validated [`Lead`] record and its closed-set enumerations.
//!
//! Every enumeration carries three spellings:
//!
//! | Spelling | Used by | Example (`Timeline`) |
//! |----------|---------|----------------------|
//! | label    | forms, CSV files, JSON records | `0-3m` |
//! | wire     | backend store payloads | `ZERO_TO_THREE_MONTHS` |
//! | display  | human-facing text | `0-3 months` |
//!
//! The three mappings are generated from one table per enum, so each `match`
//! is exhaustive and a variant cannot be added without all of its spellings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string that names no variant of a closed set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} value {value:?}")]
pub struct UnknownVariant {
    /// Enumeration name.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal, $wire:literal, $display:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Form and CSV spelling.
            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// Backend store spelling.
            pub fn wire(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }

            /// Human-facing spelling.
            pub fn display_name(&self) -> &'static str {
                match self {
                    $( Self::$variant => $display, )+
                }
            }

            /// Looks up a variant by its label.
            pub fn from_label(s: &str) -> Option<Self> {
                match s {
                    $( $label => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Looks up a variant by its wire spelling.
            #[allow(unreachable_patterns)]
            pub fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $( $wire => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Accepts either the label or the wire spelling.
            pub fn parse(s: &str) -> Option<Self> {
                Self::from_label(s).or_else(|| Self::from_wire(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| UnknownVariant {
                    kind: $kind,
                    value: s.to_owned(),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_set! {
    /// Service area.
    pub enum City as "city" {
        Chandigarh => "Chandigarh", "Chandigarh", "Chandigarh";
        Mohali => "Mohali", "Mohali", "Mohali";
        Zirakpur => "Zirakpur", "Zirakpur", "Zirakpur";
        Panchkula => "Panchkula", "Panchkula", "Panchkula";
        Other => "Other", "Other", "Other";
    }
}

closed_set! {
    /// Kind of property the lead is after.
    pub enum PropertyType as "property type" {
        Apartment => "Apartment", "Apartment", "Apartment";
        Villa => "Villa", "Villa", "Villa";
        Plot => "Plot", "Plot", "Plot";
        Office => "Office", "Office", "Office";
        Retail => "Retail", "Retail", "Retail";
    }
}

impl PropertyType {
    /// Residential types that need a bedroom count.
    pub fn requires_bhk(&self) -> bool {
        matches!(self, Self::Apartment | Self::Villa)
    }
}

closed_set! {
    /// Bedroom-count category.
    pub enum Bhk as "BHK" {
        One => "1", "1", "1 BHK";
        Two => "2", "2", "2 BHK";
        Three => "3", "3", "3 BHK";
        Four => "4", "4", "4 BHK";
        Studio => "Studio", "Studio", "Studio";
    }
}

closed_set! {
    /// Buy or rent.
    pub enum Purpose as "purpose" {
        Buy => "Buy", "Buy", "Buy";
        Rent => "Rent", "Rent", "Rent";
    }
}

closed_set! {
    /// How soon the lead intends to act.
    pub enum Timeline as "timeline" {
        ZeroToThreeMonths => "0-3m", "ZERO_TO_THREE_MONTHS", "0-3 months";
        ThreeToSixMonths => "3-6m", "THREE_TO_SIX_MONTHS", "3-6 months";
        MoreThanSixMonths => ">6m", "MORE_THAN_SIX_MONTHS", "6+ months";
        Exploring => "Exploring", "Exploring", "Exploring";
    }
}

closed_set! {
    /// Acquisition channel.
    pub enum Source as "source" {
        Website => "Website", "Website", "Website";
        Referral => "Referral", "Referral", "Referral";
        WalkIn => "Walk-in", "Walk_in", "Walk-in";
        Call => "Call", "Call", "Call";
        Other => "Other", "Other", "Other";
    }
}

closed_set! {
    /// Pipeline stage.
    pub enum Status as "status" {
        New => "New", "NEW", "New";
        Qualified => "Qualified", "Qualified", "Qualified";
        Contacted => "Contacted", "Contacted", "Contacted";
        Visited => "Visited", "Visited", "Visited";
        Negotiation => "Negotiation", "Negotiation", "Negotiation";
        Converted => "Converted", "Converted", "Converted";
        Dropped => "Dropped", "Dropped", "Dropped";
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::New
    }
}

/// A validated buyer lead.
///
/// Only [`validate`](crate::validate) and
/// [`validate_row`](crate::validate_row) produce a `Lead` from raw input. The
/// fields are public for reading and for building fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// 2 to 80 characters.
    pub full_name: String,
    /// Syntactically valid address, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 10 to 15 digits.
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    /// Present when `property_type` is Apartment or Villa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<u64>,
    /// Not below `budget_min` when both are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<u64>,
    pub timeline: Timeline,
    pub source: Source,
    /// Up to 1000 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Trimmed, non-empty, in input order.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Status,
}

impl Lead {
    /// Field names in CSV column order.
    pub const FIELDS: [&'static str; 14] = [
        "fullName",
        "email",
        "phone",
        "city",
        "propertyType",
        "bhk",
        "purpose",
        "budgetMin",
        "budgetMax",
        "timeline",
        "source",
        "notes",
        "tags",
        "status",
    ];

    /// JSON body for the backend store, using wire spellings for enums.
    ///
    /// ```rust
    /// use leadgate::{validate, Timeline};
    /// use serde_json::json;
    ///
    /// let raw = json!({
    ///     "fullName": "Asha Rao", "phone": "9876543210", "city": "Mohali",
    ///     "propertyType": "Plot", "purpose": "Buy", "timeline": "0-3m",
    ///     "source": "Walk-in"
    /// });
    /// let lead = validate(raw.as_object().unwrap()).unwrap();
    /// let body = lead.to_wire_json();
    /// assert_eq!(body["timeline"], "ZERO_TO_THREE_MONTHS");
    /// assert_eq!(body["source"], "Walk_in");
    /// assert_eq!(body["status"], "NEW");
    /// ```
    pub fn to_wire_json(&self) -> Value {
        json!({
            "fullName": self.full_name,
            "email": self.email,
            "phone": self.phone,
            "city": self.city.wire(),
            "propertyType": self.property_type.wire(),
            "bhk": self.bhk.map(|b| b.wire()),
            "purpose": self.purpose.wire(),
            "budgetMin": self.budget_min,
            "budgetMax": self.budget_max,
            "timeline": self.timeline.wire(),
            "source": self.source.wire(),
            "notes": self.notes,
            "tags": self.tags,
            "status": self.status.wire(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_wire_round_trip() {
        fn check<T: Copy + PartialEq + fmt::Debug>(
            all: &[T],
            label: fn(&T) -> &'static str,
            wire: fn(&T) -> &'static str,
            from_label: fn(&str) -> Option<T>,
            from_wire: fn(&str) -> Option<T>,
        ) {
            for v in all {
                assert_eq!(from_label(label(v)), Some(*v));
                assert_eq!(from_wire(wire(v)), Some(*v));
            }
        }
        check(City::ALL, City::label, City::wire, City::from_label, City::from_wire);
        check(
            PropertyType::ALL,
            PropertyType::label,
            PropertyType::wire,
            PropertyType::from_label,
            PropertyType::from_wire,
        );
        check(Bhk::ALL, Bhk::label, Bhk::wire, Bhk::from_label, Bhk::from_wire);
        check(
            Purpose::ALL,
            Purpose::label,
            Purpose::wire,
            Purpose::from_label,
            Purpose::from_wire,
        );
        check(
            Timeline::ALL,
            Timeline::label,
            Timeline::wire,
            Timeline::from_label,
            Timeline::from_wire,
        );
        check(Source::ALL, Source::label, Source::wire, Source::from_label, Source::from_wire);
        check(Status::ALL, Status::label, Status::wire, Status::from_label, Status::from_wire);
    }

    #[test]
    fn test_closed_set_sizes() {
        assert_eq!(City::ALL.len(), 5);
        assert_eq!(PropertyType::ALL.len(), 5);
        assert_eq!(Bhk::ALL.len(), 5);
        assert_eq!(Purpose::ALL.len(), 2);
        assert_eq!(Timeline::ALL.len(), 4);
        assert_eq!(Source::ALL.len(), 5);
        assert_eq!(Status::ALL.len(), 7);
    }

    #[test]
    fn test_timeline_spellings() {
        let t = Timeline::MoreThanSixMonths;
        assert_eq!(t.label(), ">6m");
        assert_eq!(t.wire(), "MORE_THAN_SIX_MONTHS");
        assert_eq!(t.display_name(), "6+ months");
        assert_eq!(">6m".parse::<Timeline>(), Ok(t));
        assert_eq!("MORE_THAN_SIX_MONTHS".parse::<Timeline>(), Ok(t));
    }

    #[test]
    fn test_unknown_variant() {
        let err = "Delhi".parse::<City>().unwrap_err();
        assert_eq!(err.kind, "city");
        assert_eq!(err.to_string(), "unknown city value \"Delhi\"");
        // Labels are case-sensitive.
        assert!("apartment".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_requires_bhk() {
        let requiring: Vec<_> = PropertyType::ALL
            .iter()
            .filter(|p| p.requires_bhk())
            .collect();
        assert_eq!(requiring, vec![&PropertyType::Apartment, &PropertyType::Villa]);
    }

    #[test]
    fn test_status_default() {
        assert_eq!(Status::default(), Status::New);
        assert_eq!(Status::New.wire(), "NEW");
    }

    #[test]
    fn test_lead_serde_uses_labels() {
        let lead = Lead {
            full_name: "John Doe".into(),
            email: None,
            phone: "9876543210".into(),
            city: City::Chandigarh,
            property_type: PropertyType::Apartment,
            bhk: Some(Bhk::Two),
            purpose: Purpose::Buy,
            budget_min: Some(5_000_000),
            budget_max: None,
            timeline: Timeline::ZeroToThreeMonths,
            source: Source::WalkIn,
            notes: None,
            tags: vec!["urgent".into()],
            status: Status::New,
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["source"], "Walk-in");
        assert_eq!(value["bhk"], "2");
        assert!(value.get("email").is_none());

        let back: Lead = serde_json::from_value(value).unwrap();
        assert_eq!(back, lead);

        let wire = lead.to_wire_json();
        assert_eq!(wire["source"], "Walk_in");
        assert_eq!(wire["email"], Value::Null);
    }
}
