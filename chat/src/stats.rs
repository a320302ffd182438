//! Gamification counters shown in the chat header.

/// Points needed per level.
pub const POINTS_PER_LEVEL: u32 = 100;

/// Level implied by a points total.
#[must_use]
pub fn level_for_points(points: u32) -> u32 {
    points / POINTS_PER_LEVEL
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WellnessStats {
    pub streak_days: u32,
    pub wellness_points: u32,
    pub level: u32,
    /// Server-reported progress value, only known after a history load.
    pub level_progress: f64,
}

impl WellnessStats {
    /// Overwrite the points total. Returns `true` when the implied level rose,
    /// in which case `level` is raised to match.
    pub fn set_points(&mut self, points: u32) -> bool {
        let old_level = level_for_points(self.wellness_points);
        let new_level = level_for_points(points);
        self.wellness_points = points;
        if new_level > old_level {
            self.level = new_level;
            true
        } else {
            false
        }
    }

    /// Add to the points total; see [`WellnessStats::set_points`].
    pub fn add_points(&mut self, delta: u32) -> bool {
        self.set_points(self.wellness_points.saturating_add(delta))
    }

    /// Points earned inside the current level, for the `(n/100)` label.
    #[must_use]
    pub fn points_into_level(&self) -> u32 {
        self.wellness_points % POINTS_PER_LEVEL
    }

    /// `"1 day"` / `"4 days"`.
    #[must_use]
    pub fn streak_label(&self) -> String {
        if self.streak_days == 1 {
            "1 day".to_owned()
        } else {
            format!("{} days", self.streak_days)
        }
    }
}
