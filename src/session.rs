use log::{info, warn};

use crate::clock::Timestamp;
use crate::error::{OpenFieldError, Result};
use crate::zone::{Zone, ZoneSnapshot, ZoneTimer};

/// Validated parameters for one test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub animal_id: String,
    pub duration_secs: u32,
}

impl TestConfig {
    pub fn new(animal_id: &str, duration_secs: i64) -> Result<Self> {
        let animal_id = animal_id.trim();
        if animal_id.is_empty() {
            return Err(OpenFieldError::Validation(
                "animal id must not be empty".to_string(),
            ));
        }
        let duration_secs = match u32::try_from(duration_secs) {
            Ok(secs) if secs > 0 => secs,
            _ => {
                return Err(OpenFieldError::Validation(format!(
                    "test duration must be a positive whole number of seconds, got {duration_secs}"
                )))
            }
        };
        Ok(Self {
            animal_id: animal_id.to_string(),
            duration_secs,
        })
    }

    /// Build from raw form input, as typed by the operator
    pub fn parse(animal_id: &str, duration: &str) -> Result<Self> {
        let secs = duration.trim().parse::<i64>().map_err(|_| {
            OpenFieldError::Validation(format!(
                "test duration must be a positive whole number of seconds, got {:?}",
                duration.trim()
            ))
        })?;
        Self::new(animal_id, secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotStarted,
    Running,
    Stopped,
}

/// Why a session stopped; accounting is identical, only the UI reacts differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// Operator pressed stop; the UI confirms
    Manual,
    /// Countdown reached zero; no confirmation
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub animal_id: String,
    pub configured_secs: u32,
    pub started_at: Timestamp,
    pub stopped_at: Option<Timestamp>,
    pub stop_kind: Option<StopKind>,
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        if self.stopped_at.is_some() {
            SessionStatus::Stopped
        } else {
            SessionStatus::Running
        }
    }

    fn deadline(&self) -> Timestamp {
        self.started_at.add_secs(self.configured_secs)
    }

    /// Running: elapsed since start. Stopped: the span the test actually ran.
    pub fn effective_secs(&self, now: Timestamp) -> f64 {
        let end = self.stopped_at.unwrap_or(now);
        end.seconds_since(self.started_at)
    }

    pub fn remaining_secs(&self, now: Timestamp) -> f64 {
        (f64::from(self.configured_secs) - self.effective_secs(now)).max(0.0)
    }
}

/// Live values for display on each poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStatus {
    pub remaining_secs: f64,
    pub zones: ZoneSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No test is running
    Idle,
    Running(LiveStatus),
    /// This tick stopped the test; reported exactly once per session
    Expired(LiveStatus),
}

/// Owns the test lifecycle and drives the zone timer.
///
/// One actor feeds it events strictly in sequence, each with a monotonic
/// `now`. Expiry is found by polling `tick`; there is no timer of its own.
#[derive(Debug, Clone, Default)]
pub struct SessionController {
    session: Option<Session>,
    zones: ZoneTimer,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(Session::status)
            .unwrap_or(SessionStatus::NotStarted)
    }

    pub fn is_running(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn zones(&self) -> &ZoneTimer {
        &self.zones
    }

    /// Begin a fresh test, discarding everything from the previous one.
    /// Returns false (and changes nothing) if a test is already running.
    pub fn start(&mut self, config: TestConfig, now: Timestamp) -> bool {
        if self.is_running() {
            warn!("start ignored: a test is already running");
            return false;
        }
        info!(
            "starting test for {} ({}s)",
            config.animal_id, config.duration_secs
        );
        self.zones.reset();
        self.session = Some(Session {
            animal_id: config.animal_id,
            configured_secs: config.duration_secs,
            started_at: now,
            stopped_at: None,
            stop_kind: None,
        });
        true
    }

    /// Mark the animal as being in `zone`; ignored unless a test is running
    pub fn press(&mut self, zone: Zone, now: Timestamp) {
        if self.is_running() {
            self.zones.press(zone, now);
        }
    }

    pub fn tick(&mut self, now: Timestamp) -> TickOutcome {
        let Some(session) = self.session.as_ref().filter(|s| s.stopped_at.is_none()) else {
            return TickOutcome::Idle;
        };
        let remaining = f64::from(session.configured_secs) - now.seconds_since(session.started_at);
        if remaining <= 0.0 {
            // Close the books at the deadline so the effective duration equals
            // the configured one and late ticks don't inflate the open zone.
            let at = now.min(session.deadline());
            self.stop(at, StopKind::Expired);
            info!("test expired");
            return TickOutcome::Expired(LiveStatus {
                remaining_secs: 0.0,
                zones: self.zones.snapshot(at),
            });
        }
        TickOutcome::Running(LiveStatus {
            remaining_secs: remaining,
            zones: self.zones.snapshot(now),
        })
    }

    /// Returns true if this call stopped a running test
    pub fn stop(&mut self, now: Timestamp, kind: StopKind) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.stopped_at.is_none()) else {
            return false;
        };
        let at = now.max(session.started_at);
        session.stopped_at = Some(at);
        session.stop_kind = Some(kind);
        self.zones.release_all(at);
        info!("test for {} stopped ({kind:?})", session.animal_id);
        true
    }

    pub fn effective_duration(&self, now: Timestamp) -> Result<f64> {
        self.session
            .as_ref()
            .map(|s| s.effective_secs(now))
            .ok_or(OpenFieldError::NotStarted)
    }

    /// Seconds left on the countdown; 0 when not running
    pub fn remaining(&self, now: Timestamp) -> f64 {
        match &self.session {
            Some(s) if s.stopped_at.is_none() => s.remaining_secs(now),
            _ => 0.0,
        }
    }

    /// Per-zone seconds as of `now`, open interval included
    pub fn snapshot(&self, now: Timestamp) -> ZoneSnapshot {
        self.zones.snapshot(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn t(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    fn started(id: &str, secs: i64) -> SessionController {
        let mut ctl = SessionController::new();
        assert!(ctl.start(TestConfig::new(id, secs).unwrap(), t(0.0)));
        ctl
    }

    #[test]
    fn config_rejects_blank_id() {
        assert_matches!(TestConfig::new("   ", 10), Err(OpenFieldError::Validation(_)));
        assert_matches!(TestConfig::parse("", "10"), Err(OpenFieldError::Validation(_)));
    }

    #[test]
    fn config_rejects_bad_durations() {
        for raw in ["-5", "0", "abc", "1.5", ""] {
            assert_matches!(
                TestConfig::parse("A1", raw),
                Err(OpenFieldError::Validation(_)),
                "{raw} should be rejected"
            );
        }
        assert_matches!(TestConfig::new("A1", i64::MAX), Err(OpenFieldError::Validation(_)));
    }

    #[test]
    fn config_trims_input() {
        let cfg = TestConfig::parse("  A1 ", " 300 ").unwrap();
        assert_eq!(cfg.animal_id, "A1");
        assert_eq!(cfg.duration_secs, 300);
    }

    #[test]
    fn new_controller_is_not_started() {
        let mut ctl = SessionController::new();
        assert_eq!(ctl.status(), SessionStatus::NotStarted);
        assert_eq!(ctl.tick(t(1.0)), TickOutcome::Idle);
        assert!(!ctl.stop(t(1.0), StopKind::Manual));
        assert_matches!(ctl.effective_duration(t(1.0)), Err(OpenFieldError::NotStarted));
    }

    #[test]
    fn press_ignored_unless_running() {
        let mut ctl = SessionController::new();
        ctl.press(Zone::Corner, t(0.0));
        assert_eq!(ctl.zones().active(), None);

        let mut ctl = started("A1", 10);
        ctl.stop(t(2.0), StopKind::Manual);
        ctl.press(Zone::Corner, t(3.0));
        assert_eq!(ctl.zones().active(), None);
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut ctl = started("A1", 10);
        ctl.press(Zone::Corner, t(0.0));
        assert!(!ctl.start(TestConfig::new("B2", 20).unwrap(), t(3.0)));

        let session = ctl.session().unwrap();
        assert_eq!(session.animal_id, "A1");
        assert_eq!(session.started_at, t(0.0));
        assert_eq!(ctl.zones().active(), Some(Zone::Corner));
    }

    #[test]
    fn tick_reports_remaining_and_live_zones() {
        let mut ctl = started("A1", 10);
        ctl.press(Zone::Lateral, t(1.0));
        match ctl.tick(t(3.0)) {
            TickOutcome::Running(live) => {
                assert_eq!(live.remaining_secs, 7.0);
                assert_eq!(live.zones.get(Zone::Lateral), 2.0);
            }
            other => panic!("expected Running, got {other:?}"),
        }
        assert_eq!(ctl.remaining(t(3.0)), 7.0);
        assert_eq!(ctl.effective_duration(t(3.0)).unwrap(), 3.0);
    }

    #[test]
    fn expiry_stops_exactly_once_and_releases_zone() {
        let mut ctl = started("A1", 5);
        ctl.press(Zone::Center, t(1.0));

        match ctl.tick(t(5.0)) {
            TickOutcome::Expired(live) => {
                assert_eq!(live.remaining_secs, 0.0);
                assert_eq!(live.zones.get(Zone::Center), 4.0);
            }
            other => panic!("expected Expired, got {other:?}"),
        }
        assert_eq!(ctl.status(), SessionStatus::Stopped);
        assert_eq!(ctl.zones().active(), None);
        assert_eq!(ctl.session().unwrap().stop_kind, Some(StopKind::Expired));

        assert_eq!(ctl.tick(t(6.0)), TickOutcome::Idle);
        assert!(!ctl.stop(t(6.0), StopKind::Manual));
    }

    #[test]
    fn late_tick_closes_at_deadline() {
        let mut ctl = started("A1", 5);
        ctl.press(Zone::Corner, t(0.0));
        assert_matches!(ctl.tick(t(5.3)), TickOutcome::Expired(_));

        assert_eq!(ctl.zones().cumulative(Zone::Corner), 5.0);
        assert_eq!(ctl.effective_duration(t(9.0)).unwrap(), 5.0);
    }

    #[test]
    fn manual_stop_records_stop_time() {
        let mut ctl = started("A1", 60);
        ctl.press(Zone::Corner, t(0.0));
        assert!(ctl.stop(t(12.5), StopKind::Manual));

        assert_eq!(ctl.status(), SessionStatus::Stopped);
        assert_eq!(ctl.zones().cumulative(Zone::Corner), 12.5);
        assert_eq!(ctl.effective_duration(t(40.0)).unwrap(), 12.5);
        assert_eq!(ctl.remaining(t(40.0)), 0.0);
        assert_eq!(ctl.session().unwrap().stop_kind, Some(StopKind::Manual));
    }

    #[test]
    fn restart_resets_zones_and_session() {
        let mut ctl = started("A1", 10);
        ctl.press(Zone::Corner, t(0.0));
        ctl.press(Zone::Center, t(4.0));
        ctl.stop(t(6.0), StopKind::Manual);

        assert!(ctl.start(TestConfig::new("B2", 30).unwrap(), t(20.0)));
        assert_eq!(ctl.status(), SessionStatus::Running);
        assert_eq!(ctl.zones().active(), None);
        for zone in Zone::ALL {
            assert_eq!(ctl.zones().cumulative(zone), 0.0);
        }
        let session = ctl.session().unwrap();
        assert_eq!(session.animal_id, "B2");
        assert_eq!(session.configured_secs, 30);
        assert_eq!(session.stopped_at, None);
    }

    #[test]
    fn zone_time_never_exceeds_effective_duration() {
        let mut ctl = started("A1", 20);
        let presses = [
            (0.5, Zone::Corner),
            (2.0, Zone::Lateral),
            (2.0, Zone::Center),
            (7.25, Zone::Corner),
            (9.0, Zone::Corner),
            (11.0, Zone::Lateral),
        ];
        for (at, zone) in presses {
            ctl.press(zone, t(at));
            let snap = ctl.snapshot(t(at));
            assert!(snap.total() <= ctl.effective_duration(t(at)).unwrap() + 1e-9);
        }
        ctl.stop(t(15.0), StopKind::Manual);
        let snap = ctl.snapshot(t(15.0));
        assert!((snap.total() - 14.5).abs() < 1e-9);
        assert!(snap.total() <= ctl.effective_duration(t(15.0)).unwrap());
    }
}
