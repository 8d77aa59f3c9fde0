//! Points, missions and achievements.

use std::str::FromStr;

use thiserror::Error;
use tracing::info;

/// Bonus for unlocking any achievement
pub const ACHIEVEMENT_BONUS: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MissionKind {
    Detection,
    Optimization,
    Alerts,
}

impl MissionKind {
    pub const ALL: [MissionKind; 3] = [
        MissionKind::Detection,
        MissionKind::Optimization,
        MissionKind::Alerts,
    ];

    pub fn cap(self) -> u32 {
        match self {
            MissionKind::Optimization => 3,
            _ => 5,
        }
    }

    pub fn bonus(self) -> u32 {
        match self {
            MissionKind::Detection => 50,
            MissionKind::Optimization => 75,
            MissionKind::Alerts => 100,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MissionKind::Detection => "Early Detection",
            MissionKind::Optimization => "Resource Optimizer",
            MissionKind::Alerts => "Community Guardian",
        }
    }

    fn index(self) -> usize {
        match self {
            MissionKind::Detection => 0,
            MissionKind::Optimization => 1,
            MissionKind::Alerts => 2,
        }
    }
}

impl FromStr for MissionKind {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detection" => Ok(MissionKind::Detection),
            "optimization" => Ok(MissionKind::Optimization),
            "alerts" => Ok(MissionKind::Alerts),
            other => Err(UnknownId(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Achievement {
    FireWatcher,
    FirstResponder,
    MasterStrategist,
    GlobalGuardian,
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::FireWatcher,
        Achievement::FirstResponder,
        Achievement::MasterStrategist,
        Achievement::GlobalGuardian,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FireWatcher => "Fire Watcher",
            Achievement::FirstResponder => "First Responder",
            Achievement::MasterStrategist => "Master Strategist",
            Achievement::GlobalGuardian => "Global Guardian",
        }
    }

    fn index(self) -> usize {
        match self {
            Achievement::FireWatcher => 0,
            Achievement::FirstResponder => 1,
            Achievement::MasterStrategist => 2,
            Achievement::GlobalGuardian => 3,
        }
    }
}

impl FromStr for Achievement {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fireWatcher" => Ok(Achievement::FireWatcher),
            "firstResponder" => Ok(Achievement::FirstResponder),
            "masterStrategist" => Ok(Achievement::MasterStrategist),
            "globalGuardian" => Ok(Achievement::GlobalGuardian),
            other => Err(UnknownId(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown id `{0}`")]
pub struct UnknownId(pub String);

/// Result of advancing a mission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissionUpdate {
    pub kind: MissionKind,
    pub progress: u32,
    pub cap: u32,
    /// True only on the call that reached the cap
    pub completed: bool,
    pub points_awarded: u32,
}

/// Gamification state owned by the dashboard
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tracker {
    points: u32,
    progress: [u32; 3],
    unlocked: [bool; 4],
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// Fresh tracker with nothing earned
    pub fn new() -> Self {
        Self {
            points: 0,
            progress: [0; 3],
            unlocked: [false; 4],
        }
    }

    /// Starting state of the demo profile
    pub fn demo() -> Self {
        Self {
            points: 125,
            progress: [3, 1, 0],
            unlocked: [true, true, false, false],
        }
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn add_points(&mut self, points: u32) -> u32 {
        self.points = self.points.saturating_add(points);
        self.points
    }

    pub fn progress(&self, kind: MissionKind) -> u32 {
        self.progress[kind.index()]
    }

    pub fn is_complete(&self, kind: MissionKind) -> bool {
        self.progress(kind) >= kind.cap()
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked[achievement.index()]
    }

    pub fn level(&self) -> &'static str {
        match self.points {
            p if p >= 300 => "Level 4 Guardian",
            p if p >= 200 => "Level 3 Guardian",
            p if p >= 100 => "Level 2 Guardian",
            _ => "Level 1 Guardian",
        }
    }

    /// Advance a mission, clamped to its cap. The bonus is paid once,
    /// on the step that moves progress from below the cap to the cap.
    pub fn advance_mission(&mut self, kind: MissionKind, amount: u32) -> MissionUpdate {
        let cap = kind.cap();
        let old = self.progress[kind.index()];
        let new = old.saturating_add(amount).min(cap);
        self.progress[kind.index()] = new;

        let completed = old < cap && new >= cap;
        let points_awarded = if completed { kind.bonus() } else { 0 };
        if completed {
            self.add_points(points_awarded);
            info!(mission = kind.title(), points = points_awarded, "mission completed");
        }

        MissionUpdate {
            kind,
            progress: new,
            cap,
            completed,
            points_awarded,
        }
    }

    /// Unlock an achievement. Returns false if it was already unlocked.
    pub fn award_achievement(&mut self, achievement: Achievement) -> bool {
        let slot = &mut self.unlocked[achievement.index()];
        if *slot {
            return false;
        }
        *slot = true;
        self.add_points(ACHIEVEMENT_BONUS);
        info!(achievement = achievement.title(), "achievement unlocked");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimization_completes_once() {
        let mut tracker = Tracker::new();
        let update = tracker.advance_mission(MissionKind::Optimization, 3);
        assert!(update.completed);
        assert_eq!(update.progress, 3);
        assert_eq!(update.points_awarded, 75);
        assert_eq!(tracker.points(), 75);

        let again = tracker.advance_mission(MissionKind::Optimization, 2);
        assert!(!again.completed);
        assert_eq!(again.progress, 3);
        assert_eq!(tracker.points(), 75);
    }

    #[test]
    fn test_progress_clamps_to_cap() {
        let mut tracker = Tracker::new();
        let update = tracker.advance_mission(MissionKind::Detection, 40);
        assert_eq!(update.progress, 5);
        assert_eq!(update.cap, 5);
        assert_eq!(tracker.points(), 50);
    }

    #[test]
    fn test_incremental_completion_pays_on_last_step() {
        let mut tracker = Tracker::demo();
        assert_eq!(tracker.progress(MissionKind::Alerts), 0);
        for _ in 0..4 {
            assert!(!tracker.advance_mission(MissionKind::Alerts, 1).completed);
        }
        assert_eq!(tracker.points(), 125);
        assert!(tracker.advance_mission(MissionKind::Alerts, 1).completed);
        assert_eq!(tracker.points(), 225);
        assert!(tracker.is_complete(MissionKind::Alerts));
    }

    #[test]
    fn test_achievement_is_idempotent() {
        let mut tracker = Tracker::new();
        let id: Achievement = "masterStrategist".parse().unwrap();
        assert!(tracker.award_achievement(id));
        assert_eq!(tracker.points(), 50);
        assert!(!tracker.award_achievement(id));
        assert_eq!(tracker.points(), 50);
    }

    #[test]
    fn test_demo_profile_already_has_first_badges() {
        let mut tracker = Tracker::demo();
        assert!(!tracker.award_achievement(Achievement::FireWatcher));
        assert_eq!(tracker.points(), 125);
        assert!(!tracker.is_unlocked(Achievement::GlobalGuardian));
    }

    #[test]
    fn test_levels() {
        let mut tracker = Tracker::new();
        assert_eq!(tracker.level(), "Level 1 Guardian");
        tracker.add_points(100);
        assert_eq!(tracker.level(), "Level 2 Guardian");
        tracker.add_points(100);
        assert_eq!(tracker.level(), "Level 3 Guardian");
        tracker.add_points(100);
        assert_eq!(tracker.level(), "Level 4 Guardian");
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!("alerts".parse::<MissionKind>(), Ok(MissionKind::Alerts));
        assert!("patrol".parse::<MissionKind>().is_err());
        assert!("speedRunner".parse::<Achievement>().is_err());
    }
}
