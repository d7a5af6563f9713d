//! Fragmentation index: how finely a parent was divided.

use serde::{Deserialize, Serialize};

use crate::insights::InsightStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentationLevel {
    None,
    Minor,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragmentation {
    pub status: InsightStatus,
    pub child_count: usize,
    /// `1 / child_count` (0 without children).
    pub index: f64,
    pub level: FragmentationLevel,
    pub interpretation: String,
}

pub fn fragmentation_index(child_count: usize) -> Fragmentation {
    if child_count == 0 {
        return Fragmentation {
            status: InsightStatus::NoChildren,
            child_count,
            index: 0.0,
            level: FragmentationLevel::None,
            interpretation: "No child regions; fragmentation is undefined.".to_string(),
        };
    }

    let (level, interpretation) = match child_count {
        1 => (FragmentationLevel::None, "No fragmentation (boundary change without division)."),
        2 => (FragmentationLevel::Minor, "Minor fragmentation (split into two)."),
        3 | 4 => (FragmentationLevel::Moderate, "Moderate fragmentation."),
        _ => (FragmentationLevel::High, "High fragmentation."),
    };

    Fragmentation {
        status: InsightStatus::Ok,
        child_count,
        index: 1.0 / child_count as f64,
        level,
        interpretation: format!("{interpretation} {child_count} successor region(s)."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_bands() {
        let f = fragmentation_index(3);
        assert!((f.index - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(f.level, FragmentationLevel::Moderate);

        assert_eq!(fragmentation_index(1).level, FragmentationLevel::None);
        assert_eq!(fragmentation_index(2).level, FragmentationLevel::Minor);
        assert_eq!(fragmentation_index(4).level, FragmentationLevel::Moderate);
        assert_eq!(fragmentation_index(5).level, FragmentationLevel::High);
    }

    #[test]
    fn zero_children_is_marked() {
        let f = fragmentation_index(0);
        assert_eq!(f.status, InsightStatus::NoChildren);
        assert_eq!(f.index, 0.0);
    }
}
