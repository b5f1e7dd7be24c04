// src/services/fare_service.rs
use crate::{
    errors::{DispatchError, DispatchResult, Validator},
    models::fare::{BookingType, FareBreakdown, FareRequest, Tariff},
};

/// Pure fare engine over a rate card.
#[derive(Debug, Clone, Default)]
pub struct FareCalculator {
    tariff: Tariff,
}

impl FareCalculator {
    pub fn new(tariff: Tariff) -> Self {
        Self { tariff }
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    pub fn calculate(&self, request: &FareRequest) -> DispatchResult<FareBreakdown> {
        let mut v = Validator::new();
        v.non_negative("distance_km", request.distance_km);
        v.non_negative("duration_minutes", request.duration_minutes);
        v.finish()?;

        let breakdown = match request.booking_type {
            BookingType::Local => self.local_fare(request),
            BookingType::DayRent => self.day_rent_fare(request),
            BookingType::Outstation => self.outstation_fare(request),
            BookingType::Package => {
                return Err(DispatchError::InvalidBookingType(
                    BookingType::Package.to_string(),
                ));
            }
        };

        tracing::debug!(
            "Fare for {} {} over {} km: {}",
            request.booking_type,
            request.vehicle_class,
            request.distance_km,
            breakdown.total
        );

        Ok(breakdown)
    }

    fn local_fare(&self, request: &FareRequest) -> FareBreakdown {
        let rates = &self.tariff.local;
        let class = request.vehicle_class;

        let base_fare = rates.minimum_fare.pick(class);
        let extra_km = (request.distance_km - rates.included_km).max(0.0);
        let distance_charge = extra_km * rates.per_km.pick(class);
        let waiting_charge = request.duration_minutes.ceil() * rates.waiting_per_minute.pick(class);

        FareBreakdown {
            base_fare: Some(base_fare),
            distance_charge: Some(distance_charge),
            waiting_charge: Some(waiting_charge),
            total: base_fare + distance_charge + waiting_charge,
            ..Default::default()
        }
    }

    fn day_rent_fare(&self, request: &FareRequest) -> FareBreakdown {
        let rates = &self.tariff.day_rent;
        let (class, ac) = (request.vehicle_class, request.ac_required);

        let base_fare = rates.base_rate.pick(class, ac);
        let extra_km = (request.distance_km - rates.included_km).max(0.0);
        let distance_charge = extra_km * rates.extra_km.pick(class, ac);

        FareBreakdown {
            base_fare: Some(base_fare),
            distance_charge: Some(distance_charge),
            total: base_fare + distance_charge,
            ..Default::default()
        }
    }

    fn outstation_fare(&self, request: &FareRequest) -> FareBreakdown {
        let rates = &self.tariff.outstation;

        let distance_charge =
            request.distance_km * rates.per_km.pick(request.vehicle_class, request.ac_required);
        let day_halt_charge = f64::from(request.day_halt_count) * rates.day_halt;
        let night_halt_charge = f64::from(request.night_halt_count) * rates.night_halt;

        FareBreakdown {
            distance_charge: Some(distance_charge),
            driver_batta: Some(rates.driver_batta),
            day_halt_charge: Some(day_halt_charge),
            night_halt_charge: Some(night_halt_charge),
            total: distance_charge + rates.driver_batta + day_halt_charge + night_halt_charge,
            ..Default::default()
        }
    }
}
