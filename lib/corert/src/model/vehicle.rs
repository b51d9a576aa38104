//! Vehicle entity record (§3.2). A thin record compared to `Player`:
//! the distilled spec and `original_source/`'s vehicle component both
//! treat per-vehicle handling (damage model, component slots, trailer
//! hitching) as out of scope for this runtime, leaving position,
//! rotation, model, and passenger slots.

use crate::ids::{PlayerId, VehicleId, VEHICLE_PASSENGER_SLOTS};
use crate::model::player::Quat;
use crate::motion::Vec3;

pub struct Vehicle {
    pub id: VehicleId,
    pub pos: Vec3,
    pub rot: Quat,
    pub model_id: i32,
    pub passengers: [Option<PlayerId>; VEHICLE_PASSENGER_SLOTS],
    pub driver: Option<PlayerId>,
}

impl Vehicle {
    pub fn new(id: VehicleId, model_id: i32, pos: Vec3, rot: Quat) -> Self {
        Vehicle {
            id,
            pos,
            rot,
            model_id,
            passengers: [None; VEHICLE_PASSENGER_SLOTS],
            driver: None,
        }
    }

    pub fn seat_count(&self) -> usize {
        self.passengers.iter().filter(|p| p.is_some()).count() + self.driver.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.driver.is_none() && self.passengers.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicle_has_no_occupants() {
        let v = Vehicle::new(VehicleId(0), 400, Vec3::default(), Quat::default());
        assert!(v.is_empty());
        assert_eq!(v.seat_count(), 0);
    }

    #[test]
    fn seat_count_includes_driver_and_passengers() {
        let mut v = Vehicle::new(VehicleId(0), 400, Vec3::default(), Quat::default());
        v.driver = Some(PlayerId(1));
        v.passengers[0] = Some(PlayerId(2));
        assert_eq!(v.seat_count(), 2);
        assert!(!v.is_empty());
    }
}
