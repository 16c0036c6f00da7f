//! Counter Entity
//!
//! A named running count with an optional goal. Membership in a collection is
//! held on the counter itself as a foreign key; collections never store
//! their member list.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::{CollectionId, CounterId};

/// Default theme assigned to new counters
pub const DEFAULT_THEME: &str = "Sunset";

/// Which way a goal is approached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalDirection {
    /// Counting up towards `target_value`
    #[default]
    Increasing,
    /// Counting down towards zero
    Decreasing,
}

impl GoalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalDirection::Increasing => "increasing",
            GoalDirection::Decreasing => "decreasing",
        }
    }

    /// Stored name back to a direction; unknown names read as `Increasing`
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "decreasing" => GoalDirection::Decreasing,
            _ => GoalDirection::Increasing,
        }
    }
}

/// Numeric goal with an optional target date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub target_value: i64,
    pub target_date: Option<NaiveDate>,
    pub direction: GoalDirection,
}

impl Goal {
    pub fn increasing(target_value: i64) -> Self {
        Self {
            target_value,
            target_date: None,
            direction: GoalDirection::Increasing,
        }
    }

    pub fn decreasing(target_value: i64) -> Self {
        Self {
            target_value,
            target_date: None,
            direction: GoalDirection::Decreasing,
        }
    }
}

/// A counter tracked by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    /// Unique identifier (assigned by the store)
    pub id: CounterId,
    /// Display name, never empty
    pub name: String,
    /// Current count
    pub value: i64,
    /// Magnitude of a single increment/decrement
    pub step: u32,
    pub daily_increment: u32,
    pub goal: Option<Goal>,
    /// Position inside the owning container
    pub order: i32,
    /// Owning collection (None = unassigned pool)
    pub collection: Option<CollectionId>,
    pub icon_name: Option<String>,
    pub notes: Option<String>,
    pub theme_name: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Counter {
    /// Create an unassigned counter with default values
    pub fn new(id: CounterId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            value: 0,
            step: 1,
            daily_increment: 1,
            goal: None,
            order: 0,
            collection: None,
            icon_name: None,
            notes: None,
            theme_name: DEFAULT_THEME.to_string(),
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    /// Whether the counter has met its goal.
    ///
    /// Decreasing goals are met once the value reaches the zero floor,
    /// whatever their `target_value` says.
    pub fn has_reached_goal(&self) -> bool {
        match &self.goal {
            None => false,
            Some(goal) => match goal.direction {
                GoalDirection::Increasing => self.value >= goal.target_value,
                GoalDirection::Decreasing => self.value <= 0,
            },
        }
    }

    /// Fill ratio of the progress bar in `[.., 1.0]`
    pub fn progress(&self) -> f64 {
        match &self.goal {
            Some(goal) if goal.target_value > 0 => {
                (self.value as f64 / goal.target_value as f64).min(1.0)
            }
            _ => 1.0,
        }
    }

    /// Case-insensitive name match; a blank query matches everything
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn is_unassigned(&self) -> bool {
        self.collection.is_none()
    }
}

impl Entity for Counter {
    type Id = CounterId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }
}

/// User edits coming from the edit form; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterEdit {
    pub name: Option<String>,
    pub step: Option<u32>,
    pub daily_increment: Option<u32>,
    /// `Some(None)` clears the goal
    pub goal: Option<Option<Goal>>,
    pub notes: Option<Option<String>>,
    pub icon_name: Option<Option<String>>,
    pub theme_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_creation() {
        let counter = Counter::new(CounterId(1), "Push-ups");
        assert_eq!(counter.id(), CounterId(1));
        assert_eq!(counter.step, 1);
        assert_eq!(counter.theme_name, "Sunset");
        assert!(counter.is_unassigned());
    }

    #[test]
    fn test_goal_increasing() {
        let counter = Counter::new(CounterId(1), "Books").with_goal(Goal::increasing(10));
        assert!(!counter.clone().with_value(5).has_reached_goal());
        assert!(counter.clone().with_value(10).has_reached_goal());
        assert!(counter.with_value(11).has_reached_goal());
    }

    #[test]
    fn test_goal_decreasing_uses_zero_floor() {
        let counter = Counter::new(CounterId(1), "Days left").with_goal(Goal::decreasing(30));
        assert!(counter.clone().with_value(0).has_reached_goal());
        assert!(counter.clone().with_value(-2).has_reached_goal());
        // reaching target_value is not enough on a decreasing goal
        assert!(!counter.with_value(30).has_reached_goal());
    }

    #[test]
    fn test_no_goal_never_reached() {
        let counter = Counter::new(CounterId(1), "Free").with_value(1_000);
        assert!(!counter.has_reached_goal());
        assert_eq!(counter.progress(), 1.0);
    }

    #[test]
    fn test_progress_is_capped() {
        let counter = Counter::new(CounterId(1), "Steps").with_goal(Goal::increasing(4));
        assert_eq!(counter.clone().with_value(1).progress(), 0.25);
        assert_eq!(counter.with_value(9).progress(), 1.0);
    }

    #[test]
    fn test_matches_search() {
        let counter = Counter::new(CounterId(1), "Glasses of Water");
        assert!(counter.matches_search(""));
        assert!(counter.matches_search("  "));
        assert!(counter.matches_search("water"));
        assert!(!counter.matches_search("coffee"));
    }

    #[test]
    fn test_goal_direction_serialization() {
        assert_eq!(GoalDirection::Decreasing.as_str(), "decreasing");
        assert_eq!(GoalDirection::parse_lossy("increasing"), GoalDirection::Increasing);
        assert_eq!(GoalDirection::parse_lossy("decreasing"), GoalDirection::Decreasing);
        assert_eq!(GoalDirection::parse_lossy("sideways"), GoalDirection::Increasing);
        let json = serde_json::to_string(&Goal::decreasing(3)).unwrap();
        assert!(json.contains("\"decreasing\""));
    }
}
