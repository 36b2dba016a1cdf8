//! Trip preferences collected by the single-shot planner form

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StateError;

/// Shortest trip the planner accepts
pub const MIN_DAYS: u8 = 1;
/// Longest trip the planner accepts
pub const MAX_DAYS: u8 = 14;

/// Spending level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    /// Free sights, street food
    Low,
    /// Mid-range dining and paid entries
    Medium,
    /// Premium experiences
    High,
}

/// Who is travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelType {
    /// One traveller
    Solo,
    /// Two travelling together
    Couple,
    /// With children
    Family,
    /// Group of friends
    Friends,
}

/// Duration, budget and party shape for a day-wise itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    days: u8,
    budget: Budget,
    travel_type: TravelType,
}

impl TripPreferences {
    /// Validated preferences; days must be within `MIN_DAYS..=MAX_DAYS`
    pub fn new(days: u8, budget: Budget, travel_type: TravelType) -> Result<Self, StateError> {
        if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
            return Err(StateError::InvalidPreferences(format!(
                "trip duration must be between {} and {} days, got {}",
                MIN_DAYS, MAX_DAYS, days
            )));
        }
        Ok(Self {
            days,
            budget,
            travel_type,
        })
    }

    /// Trip length in days
    pub fn days(&self) -> u8 {
        self.days
    }

    /// Spending level
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Party shape
    pub fn travel_type(&self) -> TravelType {
        self.travel_type
    }
}

impl Default for TripPreferences {
    fn default() -> Self {
        Self {
            days: 3,
            budget: Budget::Medium,
            travel_type: TravelType::Solo,
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Budget::Low => "Low",
            Budget::Medium => "Medium",
            Budget::High => "High",
        };
        f.write_str(label)
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TravelType::Solo => "Solo",
            TravelType::Couple => "Couple",
            TravelType::Family => "Family",
            TravelType::Friends => "Friends",
        };
        f.write_str(label)
    }
}

impl FromStr for Budget {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Budget::Low),
            "medium" => Ok(Budget::Medium),
            "high" => Ok(Budget::High),
            other => Err(StateError::InvalidPreferences(format!("unknown budget: {}", other))),
        }
    }
}

impl FromStr for TravelType {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(TravelType::Solo),
            "couple" => Ok(TravelType::Couple),
            "family" => Ok(TravelType::Family),
            "friends" => Ok(TravelType::Friends),
            other => Err(StateError::InvalidPreferences(format!(
                "unknown travel type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_are_bounded() {
        assert!(TripPreferences::new(1, Budget::Low, TravelType::Solo).is_ok());
        assert!(TripPreferences::new(14, Budget::High, TravelType::Family).is_ok());
        assert!(matches!(
            TripPreferences::new(0, Budget::Low, TravelType::Solo),
            Err(StateError::InvalidPreferences(_))
        ));
        assert!(TripPreferences::new(15, Budget::Low, TravelType::Solo).is_err());
    }

    #[test]
    fn test_parse_form_values() {
        assert_eq!("Medium".parse::<Budget>().unwrap(), Budget::Medium);
        assert_eq!(" friends ".parse::<TravelType>().unwrap(), TravelType::Friends);
        assert!("luxury".parse::<Budget>().is_err());
    }
}
