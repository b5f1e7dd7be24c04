// src/models/fare.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DispatchError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingType {
    Local,      // City ride, metered after the first 3 km
    DayRent,    // Full day hire with a km allowance
    Outstation, // Per-km intercity trip with batta and halts
    Package,    // Declared by the booking form, no tariff rule yet
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleClass {
    Mini,
    Sedan,
    #[serde(alias = "SUV")]
    SuvMuv,
}

impl VehicleClass {
    /// SUV and SUV/MUV share the higher tariff column.
    pub fn is_suv_class(&self) -> bool {
        matches!(self, VehicleClass::SuvMuv)
    }
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Local => "LOCAL",
            BookingType::DayRent => "DAY_RENT",
            BookingType::Outstation => "OUTSTATION",
            BookingType::Package => "PACKAGE",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(BookingType::Local),
            "DAY_RENT" => Ok(BookingType::DayRent),
            "OUTSTATION" => Ok(BookingType::Outstation),
            "PACKAGE" => Ok(BookingType::Package),
            _ => Err(DispatchError::InvalidBookingType(s.to_string())),
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleClass::Mini => "MINI",
            VehicleClass::Sedan => "SEDAN",
            VehicleClass::SuvMuv => "SUV_MUV",
        };
        f.write_str(s)
    }
}

/// Itemized fare. Components a booking type does not charge stay `None`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FareBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fare: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_batta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_halt_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_halt_charge: Option<f64>,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FareRequest {
    pub booking_type: BookingType,
    pub vehicle_class: VehicleClass,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default = "default_ac_required")]
    pub ac_required: bool,
    #[serde(default)]
    pub day_halt_count: u32,
    #[serde(default)]
    pub night_halt_count: u32,
}

pub(crate) fn default_ac_required() -> bool {
    true
}

/// Rate pair for the SUV-class and regular columns of the tariff.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ClassRates {
    pub suv: f64,
    pub regular: f64,
}

impl ClassRates {
    pub const fn new(suv: f64, regular: f64) -> Self {
        Self { suv, regular }
    }

    pub fn pick(&self, vehicle_class: VehicleClass) -> f64 {
        if vehicle_class.is_suv_class() {
            self.suv
        } else {
            self.regular
        }
    }
}

/// Rates that additionally depend on the AC flag.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct AcRates {
    pub ac: ClassRates,
    pub non_ac: ClassRates,
}

impl AcRates {
    pub fn pick(&self, vehicle_class: VehicleClass, ac_required: bool) -> f64 {
        if ac_required {
            self.ac.pick(vehicle_class)
        } else {
            self.non_ac.pick(vehicle_class)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LocalTariff {
    pub minimum_fare: ClassRates,
    pub included_km: f64,
    pub per_km: ClassRates,
    pub waiting_per_minute: ClassRates,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DayRentTariff {
    pub base_rate: AcRates,
    pub included_km: f64,
    pub extra_km: AcRates,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutstationTariff {
    pub per_km: AcRates,
    pub driver_batta: f64,
    pub day_halt: f64,
    pub night_halt: f64,
}

/// Complete rate card. `Default` is the standard fleet tariff.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Tariff {
    pub local: LocalTariff,
    pub day_rent: DayRentTariff,
    pub outstation: OutstationTariff,
}

impl Default for LocalTariff {
    fn default() -> Self {
        Self {
            minimum_fare: ClassRates::new(300.0, 200.0),
            included_km: 3.0,
            per_km: ClassRates::new(30.0, 25.0),
            waiting_per_minute: ClassRates::new(6.0, 4.0),
        }
    }
}

impl Default for DayRentTariff {
    fn default() -> Self {
        Self {
            base_rate: AcRates {
                ac: ClassRates::new(4600.0, 3400.0),
                non_ac: ClassRates::new(4400.0, 3200.0),
            },
            included_km: 200.0,
            extra_km: AcRates {
                ac: ClassRates::new(17.0, 14.0),
                non_ac: ClassRates::new(16.0, 13.0),
            },
        }
    }
}

impl Default for OutstationTariff {
    fn default() -> Self {
        Self {
            per_km: AcRates {
                ac: ClassRates::new(17.0, 14.0),
                non_ac: ClassRates::new(16.0, 13.0),
            },
            driver_batta: 500.0,
            day_halt: 1200.0,
            night_halt: 700.0,
        }
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            local: LocalTariff::default(),
            day_rent: DayRentTariff::default(),
            outstation: OutstationTariff::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_type_parsing() {
        assert_eq!("day_rent".parse::<BookingType>().unwrap(), BookingType::DayRent);
        assert_eq!(" LOCAL ".parse::<BookingType>().unwrap(), BookingType::Local);
        assert!(matches!(
            "AIRPORT".parse::<BookingType>(),
            Err(DispatchError::InvalidBookingType(t)) if t == "AIRPORT"
        ));
    }

    #[test]
    fn test_suv_alias_deserializes_to_suv_class() {
        let class: VehicleClass = serde_json::from_str("\"SUV\"").unwrap();
        assert_eq!(class, VehicleClass::SuvMuv);
        assert!(class.is_suv_class());

        let class: VehicleClass = serde_json::from_str("\"SEDAN\"").unwrap();
        assert!(!class.is_suv_class());
    }

    #[test]
    fn test_breakdown_omits_unused_components() {
        let breakdown = FareBreakdown {
            base_fare: Some(200.0),
            total: 200.0,
            ..Default::default()
        };
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json, serde_json::json!({ "base_fare": 200.0, "total": 200.0 }));
    }

    #[test]
    fn test_partial_tariff_config_keeps_defaults() {
        let tariff: Tariff = serde_json::from_value(serde_json::json!({
            "outstation": {
                "per_km": { "ac": { "suv": 18.0, "regular": 15.0 }, "non_ac": { "suv": 17.0, "regular": 14.0 } },
                "driver_batta": 600.0,
                "day_halt": 1200.0,
                "night_halt": 700.0
            }
        }))
        .unwrap();
        assert_eq!(tariff.outstation.driver_batta, 600.0);
        assert_eq!(tariff.local, LocalTariff::default());
    }
}
