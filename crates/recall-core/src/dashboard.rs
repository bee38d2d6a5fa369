//! Aggregated dashboard statistics for one owner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::LearningProgress;

/// Notes per difficulty level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyCount {
  pub difficulty: crate::note::Difficulty,
  pub count:      u32,
}

/// Notes per category, carrying the category color for chart rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
  pub category_id:   Uuid,
  pub category_name: String,
  pub color:         String,
  pub count:         u32,
}

/// One-shot snapshot backing the dashboard view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
  pub total_notes:             u32,
  pub total_categories:        u32,
  pub total_tags:              u32,
  pub favorite_notes:          u32,
  /// Notes created in the trailing seven days (inclusive window).
  pub recent_notes:            u32,
  pub difficulty_distribution: Vec<DifficultyCount>,
  pub category_distribution:   Vec<CategoryCount>,
  pub learning_progress:       LearningProgress,
}
