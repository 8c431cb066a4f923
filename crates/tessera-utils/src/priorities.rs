//! Listener priorities.

/// Priority of an event listener or keystroke callback.
///
/// Listeners fire in descending priority order. The named tiers map onto
/// fixed numeric values so they can be mixed with custom numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
    Custom(i32),
}

impl Priority {
    /// Numeric value used for ordering.
    pub fn get(self) -> i32 {
        match self {
            Self::Highest => 100_000,
            Self::High => 1000,
            Self::Normal => 0,
            Self::Low => -1000,
            Self::Lowest => -100_000,
            Self::Custom(value) => value,
        }
    }

    /// Parse a named tier (`"highest"`, `"high"`, `"normal"`, `"low"`, `"lowest"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "highest" => Some(Self::Highest),
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            "lowest" => Some(Self::Lowest),
            _ => None,
        }
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self::Custom(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_tiers_are_ordered() {
        assert!(Priority::Highest.get() > Priority::High.get());
        assert!(Priority::High.get() > Priority::Normal.get());
        assert!(Priority::Normal.get() > Priority::Low.get());
        assert!(Priority::Low.get() > Priority::Lowest.get());
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn custom_values_sit_between_tiers() {
        let p = Priority::from(10);
        assert!(p.get() > Priority::Normal.get() && p.get() < Priority::High.get());
        assert_eq!(Priority::from_name("low"), Some(Priority::Low));
        assert_eq!(Priority::from_name("urgent"), None);
    }
}
