//! The per-user gamification record and the "learned a fact" transition.
//!
//! A record is a fact log plus streak counters. The transition is pure: the
//! storage backend loads a record, calls [`GamificationRecord::learn`], and
//! writes every field back in one update.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Upper bound for page sizes accepted by fact listings.
pub const MAX_PAGE_LIMIT: usize = 500;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

// ─── Fact log ────────────────────────────────────────────────────────────────

/// One entry of a user's fact log. `id` is 1-based and equals the entry's
/// position in the log plus one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedFact {
  pub id:           u32,
  pub fact:         String,
  pub learned_date: NaiveDate,
}

// ─── Streaks ─────────────────────────────────────────────────────────────────

/// How a new activity date relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakStep {
  /// No prior activity.
  Start,
  /// Activity on the day after the previous one.
  Extend,
  /// Another activity on the same day; no streak credit.
  SameDay,
  /// A gap of two or more days, or a date before the previous activity.
  Reset,
}

impl StreakStep {
  pub fn classify(last: Option<NaiveDate>, today: NaiveDate) -> Self {
    let Some(last) = last else { return Self::Start };
    if today == last {
      Self::SameDay
    } else if last.checked_add_days(Days::new(1)) == Some(today) {
      Self::Extend
    } else {
      Self::Reset
    }
  }

  /// The streak after this step, given the streak before it.
  pub fn apply(self, current: u32) -> u32 {
    match self {
      Self::Start | Self::Extend => current.saturating_add(1),
      Self::SameDay => current,
      Self::Reset => 1,
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The gamification state of one user, as stored on their `users` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationRecord {
  pub username:           String,
  pub facts_learned:      Vec<LearnedFact>,
  pub current_streak:     u32,
  pub longest_streak:     u32,
  pub last_activity_date: Option<NaiveDate>,
  pub total_facts_count:  u32,
}

impl GamificationRecord {
  /// The state of a user who has not learned anything yet.
  pub fn empty(username: impl Into<String>) -> Self {
    Self {
      username:           username.into(),
      facts_learned:      Vec::new(),
      current_streak:     0,
      longest_streak:     0,
      last_activity_date: None,
      total_facts_count:  0,
    }
  }

  /// Apply one "learned a fact" event dated `today`.
  pub fn learn(&mut self, fact: impl Into<String>, today: NaiveDate) -> StreakStep {
    let step = StreakStep::classify(self.last_activity_date, today);

    let id = self.facts_learned.len() as u32 + 1;
    self.facts_learned.push(LearnedFact { id, fact: fact.into(), learned_date: today });

    self.current_streak     = step.apply(self.current_streak);
    self.longest_streak     = self.longest_streak.max(self.current_streak);
    self.total_facts_count += 1;
    self.last_activity_date = Some(today);

    step
  }

  /// Check the invariants every stored record must satisfy. A violation means
  /// the row was written by something other than [`Self::learn`].
  pub fn validate(&self) -> Result<()> {
    let corrupt = |reason: String| Err(Error::corrupt(&self.username, reason));

    if self.total_facts_count as usize != self.facts_learned.len() {
      return corrupt(format!(
        "total_facts_count is {} but the fact log holds {} entries",
        self.total_facts_count,
        self.facts_learned.len()
      ));
    }
    if let Some((i, f)) = self
      .facts_learned
      .iter()
      .enumerate()
      .find(|(i, f)| f.id as usize != i + 1)
    {
      return corrupt(format!("fact at position {i} has id {}", f.id));
    }
    if self.longest_streak < self.current_streak {
      return corrupt(format!(
        "longest_streak {} is below current_streak {}",
        self.longest_streak, self.current_streak
      ));
    }
    if (self.current_streak == 0) != self.last_activity_date.is_none() {
      return corrupt(format!(
        "current_streak {} disagrees with last_activity_date {:?}",
        self.current_streak, self.last_activity_date
      ));
    }
    Ok(())
  }

  /// The newest `limit` facts, newest first.
  pub fn page(&self, limit: usize) -> Result<FactsPage> {
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
      return Err(Error::InvalidLimit { got: limit, max: MAX_PAGE_LIMIT });
    }
    Ok(FactsPage {
      items: self.facts_learned.iter().rev().take(limit).cloned().collect(),
      total: self.facts_learned.len(),
    })
  }

  /// Streak summary as seen on `today`.
  pub fn stats(&self, today: NaiveDate) -> StreakStats {
    let week_start = today.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
    let facts_this_week = self
      .facts_learned
      .iter()
      .filter(|f| (week_start..=today).contains(&f.learned_date))
      .count();

    StreakStats {
      current_streak: self.current_streak,
      longest_streak: self.longest_streak,
      total_facts_count: self.total_facts_count,
      facts_this_week,
      last_activity_date: self.last_activity_date,
    }
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A slice of a user's fact log, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsPage {
  pub items: Vec<LearnedFact>,
  /// Number of facts in the whole log.
  pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
  pub current_streak:     u32,
  pub longest_streak:     u32,
  pub total_facts_count:  u32,
  /// Facts learned in the seven days ending on the day the stats were taken.
  pub facts_this_week:    usize,
  pub last_activity_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn record_at(last: &str, streak: u32) -> GamificationRecord {
    GamificationRecord {
      username:           "alice".into(),
      facts_learned:      Vec::new(),
      current_streak:     streak,
      longest_streak:     streak,
      last_activity_date: Some(d(last)),
      total_facts_count:  0,
    }
  }

  #[test]
  fn classify_steps() {
    let today = d("2024-01-10");
    assert_eq!(StreakStep::classify(None, today), StreakStep::Start);
    assert_eq!(StreakStep::classify(Some(d("2024-01-10")), today), StreakStep::SameDay);
    assert_eq!(StreakStep::classify(Some(d("2024-01-09")), today), StreakStep::Extend);
    assert_eq!(StreakStep::classify(Some(d("2024-01-08")), today), StreakStep::Reset);
    assert_eq!(StreakStep::classify(Some(d("2024-01-11")), today), StreakStep::Reset);
  }

  #[test]
  fn extend_across_month_boundary() {
    assert_eq!(
      StreakStep::classify(Some(d("2024-02-29")), d("2024-03-01")),
      StreakStep::Extend
    );
  }

  #[test]
  fn first_fact_starts_streak() {
    let mut r = GamificationRecord::empty("alice");
    assert_eq!(r.learn("water boils at 100C", d("2024-01-10")), StreakStep::Start);
    assert_eq!(r.current_streak, 1);
    assert_eq!(r.longest_streak, 1);
    assert_eq!(r.total_facts_count, 1);
    assert_eq!(r.last_activity_date, Some(d("2024-01-10")));
    assert_eq!(r.facts_learned[0].id, 1);
    r.validate().unwrap();
  }

  #[test]
  fn next_day_extends_streak() {
    let mut r = record_at("2024-01-10", 5);
    r.learn("f", d("2024-01-11"));
    assert_eq!(r.current_streak, 6);
    assert_eq!(r.longest_streak, 6);
  }

  #[test]
  fn gap_resets_streak_but_keeps_longest() {
    let mut r = record_at("2024-01-10", 5);
    r.learn("f", d("2024-01-13"));
    assert_eq!(r.current_streak, 1);
    assert_eq!(r.longest_streak, 5);
  }

  #[test]
  fn backdated_activity_resets_streak() {
    let mut r = record_at("2024-01-10", 3);
    assert_eq!(r.learn("f", d("2024-01-09")), StreakStep::Reset);
    assert_eq!(r.current_streak, 1);
    assert_eq!(r.last_activity_date, Some(d("2024-01-09")));
  }

  #[test]
  fn same_day_counts_fact_without_credit() {
    let mut r = record_at("2024-01-10", 5);
    r.learn("a", d("2024-01-10"));
    r.learn("b", d("2024-01-10"));
    assert_eq!(r.current_streak, 5);
    assert_eq!(r.total_facts_count, 2);
    assert_eq!(r.facts_learned.iter().map(|f| f.id).collect::<Vec<_>>(), [1, 2]);
  }

  #[test]
  fn invariants_hold_over_a_mixed_sequence() {
    let mut r = GamificationRecord::empty("alice");
    let mut last_longest = 0;
    let days = [
      "2024-01-01", "2024-01-02", "2024-01-02", "2024-01-03", "2024-01-07",
      "2024-01-08", "2024-01-05", "2024-01-06", "2024-01-07", "2024-01-08",
    ];
    for (n, day) in days.iter().enumerate() {
      r.learn(format!("fact {n}"), d(day));
      r.validate().unwrap();
      assert!(r.longest_streak >= last_longest);
      last_longest = r.longest_streak;
    }
    assert_eq!(r.total_facts_count, 10);
    assert_eq!(r.current_streak, 4);
    assert_eq!(r.longest_streak, 4);
  }

  #[test]
  fn validate_rejects_count_mismatch() {
    let mut r = GamificationRecord::empty("alice");
    r.learn("a", d("2024-01-10"));
    r.total_facts_count = 3;
    assert!(matches!(r.validate(), Err(Error::CorruptState { .. })));
  }

  #[test]
  fn validate_rejects_gapped_ids() {
    let mut r = GamificationRecord::empty("alice");
    r.learn("a", d("2024-01-10"));
    r.learn("b", d("2024-01-10"));
    r.facts_learned[1].id = 7;
    assert!(matches!(r.validate(), Err(Error::CorruptState { .. })));
  }

  #[test]
  fn validate_rejects_streak_without_date() {
    let mut r = GamificationRecord::empty("alice");
    r.current_streak = 2;
    r.longest_streak = 2;
    assert!(matches!(r.validate(), Err(Error::CorruptState { .. })));
  }

  #[test]
  fn page_is_newest_first_and_bounded() {
    let mut r = GamificationRecord::empty("alice");
    for n in 0..5 {
      r.learn(format!("fact {n}"), d("2024-01-10"));
    }
    let page = r.page(2).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.iter().map(|f| f.id).collect::<Vec<_>>(), [5, 4]);

    assert_eq!(r.page(0), Err(Error::InvalidLimit { got: 0, max: MAX_PAGE_LIMIT }));
    assert!(r.page(MAX_PAGE_LIMIT + 1).is_err());
  }

  #[test]
  fn stats_count_the_last_seven_days() {
    let mut r = GamificationRecord::empty("alice");
    for day in ["2024-01-01", "2024-01-04", "2024-01-05", "2024-01-10"] {
      r.learn("f", d(day));
    }
    let stats = r.stats(d("2024-01-10"));
    assert_eq!(stats.facts_this_week, 3);
    assert_eq!(stats.total_facts_count, 4);
    assert_eq!(stats.last_activity_date, Some(d("2024-01-10")));
  }

  #[test]
  fn fact_log_serialises_with_iso_dates() {
    let fact = LearnedFact { id: 1, fact: "x".into(), learned_date: d("2024-01-10") };
    let json = serde_json::to_string(&fact).unwrap();
    assert_eq!(json, r#"{"id":1,"fact":"x","learned_date":"2024-01-10"}"#);
  }
}
