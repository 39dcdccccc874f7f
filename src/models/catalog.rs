//! Fixed vocabularies: depots, vehicles and the onboarding checklist.

use serde::{Deserialize, Serialize};

/// Site a trainee is assigned to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Depot {
    Horsens,
    Skanderbord,
    #[serde(rename = "Viby J")]
    VibyJ,
    #[serde(rename = "Aarhus C")]
    AarhusC,
    Riskov,
    Randers,
    Folle,
    Ebeltoft,
    Grena,
}

impl Depot {
    pub const ALL: [Depot; 9] = [
        Depot::Horsens,
        Depot::Skanderbord,
        Depot::VibyJ,
        Depot::AarhusC,
        Depot::Riskov,
        Depot::Randers,
        Depot::Folle,
        Depot::Ebeltoft,
        Depot::Grena,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Depot::Horsens => "Horsens",
            Depot::Skanderbord => "Skanderbord",
            Depot::VibyJ => "Viby J",
            Depot::AarhusC => "Aarhus C",
            Depot::Riskov => "Riskov",
            Depot::Randers => "Randers",
            Depot::Folle => "Folle",
            Depot::Ebeltoft => "Ebeltoft",
            Depot::Grena => "Grena",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|depot| depot.as_str() == s)
    }
}

/// Vehicle a trainee is trained on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    Bike,
    Scooter30,
    Scooter45,
    Kyburz,
    Car,
}

impl Vehicle {
    pub const ALL: [Vehicle; 5] = [
        Vehicle::Bike,
        Vehicle::Scooter30,
        Vehicle::Scooter45,
        Vehicle::Kyburz,
        Vehicle::Car,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Bike => "bike",
            Vehicle::Scooter30 => "scooter30",
            Vehicle::Scooter45 => "scooter45",
            Vehicle::Kyburz => "kyburz",
            Vehicle::Car => "car",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|vehicle| vehicle.as_str() == s)
    }
}

/// Canonical onboarding tasks, in the order the checklist screen shows them.
pub const CHECKLIST_ITEMS: [&str; 17] = [
    "Introducing in company",
    "How to log into eliga",
    "How to count products",
    "How to scan packages",
    "Magazines - to count and check",
    "Clean, trashes plastic and paper",
    "Understand AFLO",
    "How to find/use key",
    "How to deliver to shops",
    "How to take pictures on packages",
    "How to register parcel when code is not readable",
    "How to undo swipe",
    "How to mark a problem",
    "How to report issues",
    "Is the distribution start time clear",
    "Pick up packages",
    "What detail to send to manager in case of accident",
];

pub fn is_checklist_item(item: &str) -> bool {
    CHECKLIST_ITEMS.contains(&item)
}

/// Everything a client needs to render the pickers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub depots: Vec<&'static str>,
    pub vehicles: Vec<&'static str>,
    pub checklist_items: Vec<&'static str>,
    pub training_days: u32,
}

impl Catalog {
    pub fn current() -> Self {
        Self {
            depots: Depot::ALL.iter().map(Depot::as_str).collect(),
            vehicles: Vehicle::ALL.iter().map(Vehicle::as_str).collect(),
            checklist_items: CHECKLIST_ITEMS.to_vec(),
            training_days: crate::codec::TRAINING_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depot_names_match_serde() {
        for depot in Depot::ALL {
            let json = serde_json::to_string(&depot).unwrap();
            assert_eq!(json, format!("\"{}\"", depot.as_str()));
            assert_eq!(Depot::from_name(depot.as_str()), Some(depot));
        }
    }

    #[test]
    fn test_vehicle_names_match_serde() {
        for vehicle in Vehicle::ALL {
            let json = serde_json::to_string(&vehicle).unwrap();
            assert_eq!(json, format!("\"{}\"", vehicle.as_str()));
            assert_eq!(Vehicle::from_name(vehicle.as_str()), Some(vehicle));
        }
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(Depot::from_name("aarhus c"), None);
        assert_eq!(Vehicle::from_name("Bike"), None);
        assert!(serde_json::from_str::<Vehicle>("\"truck\"").is_err());
    }

    #[test]
    fn test_checklist_membership() {
        assert!(is_checklist_item("How to scan packages"));
        assert!(!is_checklist_item("how to scan packages"));
    }
}
