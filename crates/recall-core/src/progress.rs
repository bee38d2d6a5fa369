//! Learning-progress counters and the daily streak algorithm.
//!
//! One row per user, created lazily on first access. The streak is the
//! number of consecutive calendar days with at least one recorded review;
//! [`LearningProgress::record_review`] is the only thing that advances it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningProgress {
  pub owner_id:             Uuid,
  pub total_notes:          u32,
  pub notes_reviewed_today: u32,
  pub current_streak:       u32,
  pub longest_streak:       u32,
  pub last_activity_date:   Option<NaiveDate>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl LearningProgress {
  /// A zeroed row for a user with no recorded activity yet.
  pub fn new(owner_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      owner_id,
      total_notes: 0,
      notes_reviewed_today: 0,
      current_streak: 0,
      longest_streak: 0,
      last_activity_date: None,
      created_at: now,
      updated_at: now,
    }
  }

  /// Apply one review on `today`.
  ///
  /// The streak advances at most once per calendar day, no matter how many
  /// reviews happen that day. A gap of more than one day resets the streak
  /// to 1 — the triggering review's day counts as day one of the new
  /// streak. `longest_streak` is a running high-water mark.
  pub fn record_review(&mut self, today: NaiveDate) {
    if self.last_activity_date != Some(today) {
      // First review of a new day.
      self.notes_reviewed_today = 0;

      if self.last_activity_date == today.pred_opt() {
        self.current_streak += 1;
      } else {
        self.current_streak = 1;
      }
      self.longest_streak = self.longest_streak.max(self.current_streak);
      self.last_activity_date = Some(today);
    }
    self.notes_reviewed_today += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Days;

  fn progress_on(
    last: Option<NaiveDate>,
    current: u32,
    longest: u32,
    reviewed_today: u32,
  ) -> LearningProgress {
    let mut p = LearningProgress::new(Uuid::new_v4(), Utc::now());
    p.last_activity_date = last;
    p.current_streak = current;
    p.longest_streak = longest;
    p.notes_reviewed_today = reviewed_today;
    p
  }

  fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
  }

  #[test]
  fn consecutive_day_extends_streak() {
    let today = date("2026-03-10");
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
    let mut p = progress_on(Some(yesterday), 3, 3, 5);

    p.record_review(today);

    assert_eq!(p.current_streak, 4);
    assert_eq!(p.longest_streak, 4);
    assert_eq!(p.notes_reviewed_today, 1);
    assert_eq!(p.last_activity_date, Some(today));
  }

  #[test]
  fn gap_resets_streak_to_one_keeping_high_water_mark() {
    let today = date("2026-03-10");
    let five_days_ago = today.checked_sub_days(Days::new(5)).unwrap();
    let mut p = progress_on(Some(five_days_ago), 10, 10, 2);

    p.record_review(today);

    assert_eq!(p.current_streak, 1);
    assert_eq!(p.longest_streak, 10);
    assert_eq!(p.notes_reviewed_today, 1);
  }

  #[test]
  fn same_day_review_only_bumps_daily_count() {
    let today = date("2026-03-10");
    let mut p = progress_on(Some(today), 4, 7, 2);

    p.record_review(today);

    assert_eq!(p.notes_reviewed_today, 3);
    assert_eq!(p.current_streak, 4);
    assert_eq!(p.longest_streak, 7);
  }

  #[test]
  fn first_ever_review_starts_a_streak_of_one() {
    let today = date("2026-03-10");
    let mut p = progress_on(None, 0, 0, 0);

    p.record_review(today);

    assert_eq!(p.current_streak, 1);
    assert_eq!(p.longest_streak, 1);
    assert_eq!(p.notes_reviewed_today, 1);
  }
}
