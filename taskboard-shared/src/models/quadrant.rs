//! Eisenhower quadrant classification
//!
//! The quadrant a task occupies is a pure function of its `(importance,
//! urgency)` flags. It is never stored; moving a task between quadrants is an
//! update of the two flags.
//!
//! | importance | urgency | quadrant | title |
//! |---|---|---|---|
//! | true | true | `urgent-important` | Do First |
//! | true | false | `important-not-urgent` | Schedule |
//! | false | true | `urgent-not-important` | Delegate |
//! | false | false | `neither` | Eliminate |

use super::Task;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Eisenhower matrix quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    /// Urgent and important
    UrgentImportant,

    /// Important, not urgent
    ImportantNotUrgent,

    /// Urgent, not important
    UrgentNotImportant,

    /// Neither urgent nor important
    Neither,
}

impl Quadrant {
    /// All quadrants in matrix reading order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::ImportantNotUrgent,
        Quadrant::UrgentNotImportant,
        Quadrant::Neither,
    ];

    /// Classifies a pair of flags
    pub fn classify(importance: bool, urgency: bool) -> Self {
        match (importance, urgency) {
            (true, true) => Quadrant::UrgentImportant,
            (true, false) => Quadrant::ImportantNotUrgent,
            (false, true) => Quadrant::UrgentNotImportant,
            (false, false) => Quadrant::Neither,
        }
    }

    /// Classifies a task
    pub fn of(task: &Task) -> Self {
        Quadrant::classify(task.importance, task.urgency)
    }

    /// The `(importance, urgency)` pair a task gets when dropped here
    pub fn flags(&self) -> (bool, bool) {
        match self {
            Quadrant::UrgentImportant => (true, true),
            Quadrant::ImportantNotUrgent => (true, false),
            Quadrant::UrgentNotImportant => (false, true),
            Quadrant::Neither => (false, false),
        }
    }

    /// Stable identifier, also used as the drop-target id in the matrix view
    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "urgent-important",
            Quadrant::ImportantNotUrgent => "important-not-urgent",
            Quadrant::UrgentNotImportant => "urgent-not-important",
            Quadrant::Neither => "neither",
        }
    }

    /// Parses a drop-target id
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "urgent-important" => Some(Quadrant::UrgentImportant),
            "important-not-urgent" => Some(Quadrant::ImportantNotUrgent),
            "urgent-not-important" => Some(Quadrant::UrgentNotImportant),
            "neither" => Some(Quadrant::Neither),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "Do First",
            Quadrant::ImportantNotUrgent => "Schedule",
            Quadrant::UrgentNotImportant => "Delegate",
            Quadrant::Neither => "Eliminate",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "Urgent & Important",
            Quadrant::ImportantNotUrgent => "Important, Not Urgent",
            Quadrant::UrgentNotImportant => "Urgent, Not Important",
            Quadrant::Neither => "Neither Urgent nor Important",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quadrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quadrant::parse(s).ok_or_else(|| format!("unknown quadrant: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_total() {
        assert_eq!(Quadrant::classify(true, true), Quadrant::UrgentImportant);
        assert_eq!(Quadrant::classify(true, false), Quadrant::ImportantNotUrgent);
        assert_eq!(Quadrant::classify(false, true), Quadrant::UrgentNotImportant);
        assert_eq!(Quadrant::classify(false, false), Quadrant::Neither);
    }

    #[test]
    fn test_flags_inverse_of_classify() {
        for quadrant in Quadrant::ALL {
            let (importance, urgency) = quadrant.flags();
            assert_eq!(Quadrant::classify(importance, urgency), quadrant);
        }
    }

    #[test]
    fn test_parse_matches_as_str() {
        for quadrant in Quadrant::ALL {
            assert_eq!(Quadrant::parse(quadrant.as_str()), Some(quadrant));
            assert_eq!(quadrant.as_str().parse::<Quadrant>(), Ok(quadrant));
        }
        assert_eq!(Quadrant::parse("urgent"), None);
    }

    #[test]
    fn test_titles() {
        assert_eq!(Quadrant::UrgentImportant.title(), "Do First");
        assert_eq!(Quadrant::ImportantNotUrgent.title(), "Schedule");
        assert_eq!(Quadrant::UrgentNotImportant.title(), "Delegate");
        assert_eq!(Quadrant::Neither.title(), "Eliminate");
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&Quadrant::ImportantNotUrgent).unwrap();
        assert_eq!(json, "\"important-not-urgent\"");
    }
}
