/// Tolerance for float comparisons on power bookkeeping (kW).
pub const POWER_EPS_KW: f32 = 1e-4;

/// A charging point with a fixed rating shared across its sockets.
///
/// The charger only does bookkeeping: vehicles decide where to connect and
/// how much to take, the charger tracks what is reserved and by how many.
///
/// # Examples
///
/// ```
/// use ev_station_sim::devices::Charger;
///
/// let mut charger = Charger::new(0, 350.0, 4);
/// charger.reserve(200.0);
/// assert_eq!(charger.accessible_power_kw(), 150.0);
/// assert!(charger.is_available());
///
/// charger.release(200.0);
/// assert_eq!(charger.occupant_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Charger {
    id: usize,
    rated_power_kw: f32,
    socket_count: usize,
    reserved_power_kw: f32,
    occupant_count: usize,
}

impl Charger {
    /// Creates an idle charger.
    ///
    /// # Arguments
    ///
    /// * `id` - Index of the charger within the station
    /// * `rated_power_kw` - Power shared by all sockets in kW (must be > 0)
    /// * `socket_count` - Vehicles that can connect at once (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if `rated_power_kw` is not positive or `socket_count` is zero.
    pub fn new(id: usize, rated_power_kw: f32, socket_count: usize) -> Self {
        assert!(rated_power_kw > 0.0, "charger rated power must be > 0");
        assert!(socket_count > 0, "charger needs at least one socket");
        Self {
            id,
            rated_power_kw,
            socket_count,
            reserved_power_kw: 0.0,
            occupant_count: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn rated_power_kw(&self) -> f32 {
        self.rated_power_kw
    }

    pub fn socket_count(&self) -> usize {
        self.socket_count
    }

    /// Power currently allocated to connected vehicles (kW).
    pub fn reserved_power_kw(&self) -> f32 {
        self.reserved_power_kw
    }

    pub fn occupant_count(&self) -> usize {
        self.occupant_count
    }

    /// Headroom offered to the next vehicle (kW).
    pub fn accessible_power_kw(&self) -> f32 {
        self.rated_power_kw - self.reserved_power_kw
    }

    /// A free socket and unreserved power are both required.
    pub fn is_available(&self) -> bool {
        self.occupant_count < self.socket_count && self.accessible_power_kw() > POWER_EPS_KW
    }

    /// Connects a vehicle and reserves `power_kw` for it.
    ///
    /// # Panics
    ///
    /// Panics if `power_kw` is negative, exceeds the headroom, or no socket is free.
    pub fn reserve(&mut self, power_kw: f32) {
        assert!(power_kw >= 0.0, "cannot reserve negative power");
        assert!(
            power_kw <= self.accessible_power_kw() + POWER_EPS_KW,
            "charger {} over-reserved: requested {power_kw} kW, headroom {} kW",
            self.id,
            self.accessible_power_kw()
        );
        assert!(
            self.occupant_count < self.socket_count,
            "charger {} has no free socket",
            self.id
        );
        self.reserved_power_kw = (self.reserved_power_kw + power_kw).min(self.rated_power_kw);
        self.occupant_count += 1;
    }

    /// Raises the reservation of an already connected vehicle by `extra_kw`.
    ///
    /// # Panics
    ///
    /// Panics if nothing is connected or `extra_kw` exceeds the headroom.
    pub fn extend(&mut self, extra_kw: f32) {
        assert!(extra_kw >= 0.0, "cannot extend by negative power");
        assert!(self.occupant_count > 0, "charger {} has no occupant", self.id);
        assert!(
            extra_kw <= self.accessible_power_kw() + POWER_EPS_KW,
            "charger {} over-reserved: extension {extra_kw} kW, headroom {} kW",
            self.id,
            self.accessible_power_kw()
        );
        self.reserved_power_kw = (self.reserved_power_kw + extra_kw).min(self.rated_power_kw);
    }

    /// Disconnects a vehicle and returns `power_kw` to the headroom.
    ///
    /// # Panics
    ///
    /// Panics if `power_kw` is negative or no vehicle is connected.
    pub fn release(&mut self, power_kw: f32) {
        assert!(power_kw >= 0.0, "cannot release negative power");
        assert!(
            self.occupant_count > 0,
            "charger {} released with no occupant",
            self.id
        );
        self.reserved_power_kw = (self.reserved_power_kw - power_kw).max(0.0);
        self.occupant_count -= 1;
        if self.occupant_count == 0 {
            // Drop float residue so an empty charger offers its full rating.
            self.reserved_power_kw = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_charger_is_idle() {
        let charger = Charger::new(3, 350.0, 4);
        assert_eq!(charger.id(), 3);
        assert_eq!(charger.reserved_power_kw(), 0.0);
        assert_eq!(charger.accessible_power_kw(), 350.0);
        assert!(charger.is_available());
    }

    #[test]
    fn full_reservation_makes_charger_unavailable() {
        let mut charger = Charger::new(0, 100.0, 4);
        charger.reserve(100.0);
        assert_eq!(charger.accessible_power_kw(), 0.0);
        assert!(!charger.is_available());
    }

    #[test]
    fn all_sockets_taken_makes_charger_unavailable() {
        let mut charger = Charger::new(0, 350.0, 2);
        charger.reserve(50.0);
        charger.reserve(50.0);
        assert_eq!(charger.accessible_power_kw(), 250.0);
        assert!(!charger.is_available());
    }

    #[test]
    fn extend_raises_reservation_without_new_occupant() {
        let mut charger = Charger::new(0, 350.0, 4);
        charger.reserve(100.0);
        charger.extend(50.0);
        assert_eq!(charger.reserved_power_kw(), 150.0);
        assert_eq!(charger.occupant_count(), 1);
    }

    #[test]
    fn release_clamps_at_zero() {
        let mut charger = Charger::new(0, 350.0, 4);
        charger.reserve(10.0);
        charger.reserve(10.0);
        charger.release(50.0);
        assert_eq!(charger.reserved_power_kw(), 0.0);
        assert_eq!(charger.occupant_count(), 1);
    }

    #[test]
    fn conservation_over_mixed_sequence() {
        let mut charger = Charger::new(0, 300.0, 3);
        let mut held: Vec<f32> = Vec::new();
        let requests: [f32; 7] = [120.0, 80.0, 60.0, 40.0, 200.0, 10.0, 90.0];
        for (i, &want) in requests.iter().enumerate() {
            if i % 3 == 2 {
                if let Some(p) = held.pop() {
                    charger.release(p);
                }
            } else if charger.is_available() {
                let grant = want.min(charger.accessible_power_kw());
                charger.reserve(grant);
                held.push(grant);
            }
            assert!(charger.reserved_power_kw() >= 0.0);
            assert!(charger.reserved_power_kw() <= charger.rated_power_kw());
            assert!(charger.occupant_count() <= charger.socket_count());
            assert_eq!(charger.occupant_count(), held.len());
        }
    }

    #[test]
    #[should_panic]
    fn over_reservation_panics() {
        let mut charger = Charger::new(0, 100.0, 4);
        charger.reserve(60.0);
        charger.reserve(60.0);
    }

    #[test]
    #[should_panic]
    fn release_without_occupant_panics() {
        let mut charger = Charger::new(0, 100.0, 4);
        charger.release(0.0);
    }

    #[test]
    #[should_panic]
    fn reserve_without_free_socket_panics() {
        let mut charger = Charger::new(0, 100.0, 1);
        charger.reserve(10.0);
        charger.reserve(10.0);
    }

    #[test]
    #[should_panic]
    fn zero_rating_panics() {
        Charger::new(0, 0.0, 1);
    }
}
