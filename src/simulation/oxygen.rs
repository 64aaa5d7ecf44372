use serde::{Deserialize, Serialize};

/// Longest frame time the oxygen timer will consume in one step.
pub const MAX_FRAME_SECONDS: f64 = 0.05;

/// What happened to the supply during one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OxygenEvent {
    /// Within range of the command center; topped up.
    InRange,
    Draining,
    /// Ran out this frame. The tank is refilled after reporting.
    Depleted,
}

/// Oxygen carried by the avatar when away from the command center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OxygenSupply {
    remaining: f64,
    capacity: f64,
    range: i32,
    away: bool,
}

impl OxygenSupply {
    pub fn new(capacity: f64, range: i32) -> Self {
        OxygenSupply {
            remaining: capacity,
            capacity,
            range,
            away: false,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn is_away(&self) -> bool {
        self.away
    }

    /// Remaining supply as a fraction of a full tank.
    pub fn fraction(&self) -> f64 {
        (self.remaining / self.capacity).max(0.0)
    }

    /// Advance by `dt` seconds given the avatar's wrapped distance from the
    /// command center.
    pub fn update(&mut self, distance: i32, dt: f64) -> OxygenEvent {
        self.away = distance > self.range;
        if !self.away {
            self.remaining = self.capacity;
            return OxygenEvent::InRange;
        }
        self.remaining -= dt.clamp(0.0, MAX_FRAME_SECONDS);
        if self.remaining <= 0.0 {
            self.remaining = self.capacity;
            OxygenEvent::Depleted
        } else {
            OxygenEvent::Draining
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refills_instantly_in_range() {
        let mut o2 = OxygenSupply::new(16.0, 16);
        assert_eq!(o2.update(17, 0.05), OxygenEvent::Draining);
        assert!(o2.remaining() < 16.0);
        assert!(o2.is_away());
        assert_eq!(o2.update(16, 0.05), OxygenEvent::InRange);
        assert_eq!(o2.remaining(), 16.0);
        assert!(!o2.is_away());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut o2 = OxygenSupply::new(16.0, 16);
        o2.update(40, 5.0);
        assert!((o2.remaining() - 15.95).abs() < 1e-9);
    }

    #[test]
    fn depletes_after_capacity_seconds_away() {
        let mut o2 = OxygenSupply::new(1.0, 2);
        let mut frames = 0;
        loop {
            frames += 1;
            if o2.update(3, 0.05) == OxygenEvent::Depleted {
                break;
            }
            assert!(frames < 100, "oxygen never ran out");
        }
        // 1 s of oxygen at 50 ms per frame
        assert!((19..=21).contains(&frames), "frames = {}", frames);
        assert_eq!(o2.remaining(), 1.0);
        assert_eq!(o2.fraction(), 1.0);
    }
}
