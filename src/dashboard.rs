//! Non-map dashboard state: guardian profile, activity feed, toasts and the
//! simulated field events that drive them.

use chrono::{DateTime, Local};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::feed::{Activity, ActivityFeed, ActivityKind};
use crate::gamification::{Achievement, MissionKind, MissionUpdate, Tracker};
use crate::toast::{ToastKind, Toasts};

/// Regions named in simulated detections and deployments
pub const DEMO_REGIONS: [&str; 4] = [
    "Northern Forest Region",
    "Eastern Woodland",
    "Southern Valley",
    "Western Hills",
];

/// Chance that a risk-data refresh turns up a new fire
const DETECTION_CHANCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResponseTeam {
    pub name: &'static str,
    /// Estimated response time in minutes
    pub minutes: f64,
}

pub const RESPONSE_TEAMS: [ResponseTeam; 5] = [
    ResponseTeam { name: "Team Alpha", minutes: 4.2 },
    ResponseTeam { name: "Team Bravo", minutes: 3.8 },
    ResponseTeam { name: "Team Charlie", minutes: 5.1 },
    ResponseTeam { name: "Team Delta", minutes: 7.3 },
    ResponseTeam { name: "Team Echo", minutes: 2.9 },
];

/// Status-card counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub active_fires: u32,
    pub deployed_resources: u32,
}

pub struct Dashboard {
    pub tracker: Tracker,
    pub feed: ActivityFeed,
    pub toasts: Toasts,
    pub counters: Counters,
    pub last_updated: Option<DateTime<Local>>,
    rng: SmallRng,
}

impl Dashboard {
    pub fn new(tracker: Tracker, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            tracker,
            feed: ActivityFeed::new(),
            toasts: Toasts::default(),
            counters: Counters::default(),
            last_updated: None,
            rng,
        }
    }

    /// Reset the counters to a freshly loaded snapshot
    pub fn sync_counts(&mut self, active_fires: usize, resources: usize) {
        self.counters.active_fires = active_fires as u32;
        self.counters.deployed_resources = resources as u32;
    }

    pub fn mark_updated(&mut self) {
        self.last_updated = Some(Local::now());
    }

    /// One step on a mission, with completion toasts and follow-up awards
    pub fn advance(&mut self, kind: MissionKind) -> MissionUpdate {
        let update = self.tracker.advance_mission(kind, 1);
        if update.completed {
            self.toasts.push(
                "Mission Completed!",
                format!(
                    "You've completed the {} mission and earned {} points!",
                    kind.title(),
                    update.points_awarded
                ),
                ToastKind::Success,
            );
        }
        if kind == MissionKind::Optimization && update.progress >= 3 {
            self.unlock(Achievement::MasterStrategist);
        }
        update
    }

    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        let unlocked = self.tracker.award_achievement(achievement);
        if unlocked {
            self.toasts.push(
                "Achievement Unlocked!",
                format!(
                    "You've unlocked the {} achievement and earned 50 points!",
                    achievement.title()
                ),
                ToastKind::Primary,
            );
        }
        unlocked
    }

    /// Mission card "continue" action
    pub fn work_on_mission(&mut self, kind: MissionKind) -> MissionUpdate {
        let update = self.advance(kind);
        if !update.completed {
            self.toasts.push(
                "Progress Updated",
                format!("You've made progress on the {} mission!", kind.title()),
                ToastKind::Success,
            );
        }
        update
    }

    /// Simulated risk-data refresh; returns the region of a newly detected fire
    pub fn refresh_risk_data(&mut self) -> Option<&'static str> {
        self.mark_updated();
        self.toasts.push(
            "Data Updated",
            "Risk data has been refreshed successfully!",
            ToastKind::Success,
        );

        if !self.rng.gen_bool(DETECTION_CHANCE) {
            return None;
        }

        let region = DEMO_REGIONS.choose(&mut self.rng).copied()?;
        info!(region, "simulated fire detection");
        self.feed.push(Activity::new(
            ActivityKind::Fire,
            "New Fire Detected",
            format!("A new fire has been detected in {region}."),
        ));
        self.counters.active_fires += 1;
        self.advance(MissionKind::Detection);
        Some(region)
    }

    /// Send the fastest team to a random demo region
    pub fn deploy_resources(&mut self) -> ResponseTeam {
        let fastest = RESPONSE_TEAMS
            .iter()
            .copied()
            .min_by(|a, b| a.minutes.total_cmp(&b.minutes))
            .unwrap_or(RESPONSE_TEAMS[0]);
        let region = DEMO_REGIONS.choose(&mut self.rng).copied().unwrap_or(DEMO_REGIONS[0]);

        info!(team = fastest.name, region, "resources deployed");
        self.feed.push(Activity::new(
            ActivityKind::Resource,
            "Resources Deployed",
            format!(
                "{} deployed to {region} with estimated response time of {} minutes.",
                fastest.name, fastest.minutes
            ),
        ));
        self.counters.deployed_resources += 1;
        self.advance(MissionKind::Optimization);
        fastest
    }

    /// Acknowledge the newest fire alert in the feed
    pub fn view_alert(&mut self) -> bool {
        if self.feed.newest_of(ActivityKind::Fire).is_none() {
            return false;
        }
        self.toasts.push(
            "Alert Viewed",
            "You have reviewed the fire alert information.",
            ToastKind::Danger,
        );
        self.advance(MissionKind::Alerts);
        true
    }
}
