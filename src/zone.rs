use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

/// Arena region tracked during a test
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Zone {
    Corner,
    Lateral,
    Center,
}

impl Zone {
    /// Fixed reporting order
    pub const ALL: [Zone; 3] = [Zone::Corner, Zone::Lateral, Zone::Center];

    fn index(self) -> usize {
        match self {
            Zone::Corner => 0,
            Zone::Lateral => 1,
            Zone::Center => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ZoneState {
    cumulative_secs: f64,
    pressed_at: Option<Timestamp>,
}

/// Per-zone seconds at one instant, in `Zone::ALL` order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneSnapshot {
    secs: [f64; 3],
}

impl ZoneSnapshot {
    pub fn get(&self, zone: Zone) -> f64 {
        self.secs[zone.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zone, f64)> + '_ {
        Zone::ALL.into_iter().map(move |z| (z, self.get(z)))
    }

    pub fn total(&self) -> f64 {
        self.secs.iter().sum()
    }
}

/// Mutually exclusive press/release accounting for the three zones.
///
/// At most one zone is active at any time. Pressing a zone while another is
/// active closes the other zone's interval at the same timestamp before
/// opening the new one, so switching never double counts or leaves a gap.
#[derive(Debug, Clone, Default)]
pub struct ZoneTimer {
    zones: [ZoneState; 3],
}

impl ZoneTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Zone> {
        Zone::ALL
            .into_iter()
            .find(|z| self.zones[z.index()].pressed_at.is_some())
    }

    pub fn is_active(&self, zone: Zone) -> bool {
        self.zones[zone.index()].pressed_at.is_some()
    }

    /// Opening timestamp of the zone's current interval, if active
    pub fn pressed_at(&self, zone: Zone) -> Option<Timestamp> {
        self.zones[zone.index()].pressed_at
    }

    /// Confirmed (released) seconds, excluding any open interval
    pub fn cumulative(&self, zone: Zone) -> f64 {
        self.zones[zone.index()].cumulative_secs
    }

    pub fn press(&mut self, zone: Zone, now: Timestamp) {
        match self.active() {
            Some(current) if current == zone => return,
            Some(current) => {
                debug!("zone switch {current} -> {zone}");
                self.release(current, now);
            }
            None => debug!("zone press {zone}"),
        }
        self.zones[zone.index()].pressed_at = Some(now);
    }

    pub fn release(&mut self, zone: Zone, now: Timestamp) {
        let state = &mut self.zones[zone.index()];
        let Some(pressed_at) = state.pressed_at.take() else {
            return;
        };
        if now < pressed_at {
            warn!("clock went backwards while releasing {zone}; counting 0s");
        }
        state.cumulative_secs += now.seconds_since(pressed_at);
    }

    pub fn release_all(&mut self, now: Timestamp) {
        for zone in Zone::ALL {
            self.release(zone, now);
        }
    }

    /// Cumulative seconds plus the open interval, without mutating state
    pub fn snapshot(&self, now: Timestamp) -> ZoneSnapshot {
        let mut secs = [0.0; 3];
        for zone in Zone::ALL {
            let state = &self.zones[zone.index()];
            let open = state
                .pressed_at
                .map(|at| now.seconds_since(at))
                .unwrap_or(0.0);
            secs[zone.index()] = state.cumulative_secs + open;
        }
        ZoneSnapshot { secs }
    }

    pub fn reset(&mut self) {
        self.zones = Default::default();
    }
}
