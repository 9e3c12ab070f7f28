//! Reminders for upcoming mold changes, kept in client-local storage.

pub mod slots;

use crate::errors::{AppError, AppResult};
use crate::models::schedule::ScheduledChange;
use chrono::{DateTime, Duration, Utc};
use slots::{SCHEDULE_SLOT, SlotStore, load_slot, save_slot};
use std::fmt;

/// Entries this far past their date are dropped on load.
const PRUNE_AFTER_HOURS: i64 = 24;

/// Time left until a scheduled change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining {
        hours: i64,
        minutes: i64,
        seconds: i64,
        total_seconds: i64,
    },
    /// The date has passed: the change should start now.
    Expired,
}

/// How close a change is, for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Scheduled,
    /// 15 minutes or less.
    Soon,
    /// 5 minutes or less.
    Imminent,
    Expired,
}

impl Countdown {
    pub fn until(date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total = (date - now).num_seconds();
        if total <= 0 {
            return Countdown::Expired;
        }
        Countdown::Remaining {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
            total_seconds: total,
        }
    }

    pub fn urgency(&self) -> Urgency {
        match *self {
            Countdown::Expired => Urgency::Expired,
            Countdown::Remaining { total_seconds, .. } if total_seconds <= 5 * 60 => {
                Urgency::Imminent
            }
            Countdown::Remaining { total_seconds, .. } if total_seconds <= 15 * 60 => {
                Urgency::Soon
            }
            Countdown::Remaining { .. } => Urgency::Scheduled,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Remaining {
                hours,
                minutes,
                seconds,
                ..
            } => write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds),
            Countdown::Expired => f.write_str("TIME IS UP, start the change now"),
        }
    }
}

/// Sorted (date ascending) reminder list, persisted after every change.
pub struct ScheduleBook<S: SlotStore> {
    store: S,
    entries: Vec<ScheduledChange>,
}

impl<S: SlotStore> ScheduleBook<S> {
    /// Read the slot, dropping entries older than 24 h past their date.
    pub fn load(store: S, now: DateTime<Utc>) -> AppResult<Self> {
        let mut entries: Vec<ScheduledChange> =
            load_slot(&store, SCHEDULE_SLOT)?.unwrap_or_default();

        let before = entries.len();
        let cutoff = now - Duration::hours(PRUNE_AFTER_HOURS);
        entries.retain(|e| e.date > cutoff);
        sort(&mut entries);

        let book = Self { store, entries };
        if book.entries.len() != before {
            tracing::debug!(pruned = before - book.entries.len(), "old reminders pruned");
            book.save()?;
        }
        Ok(book)
    }

    pub fn entries(&self) -> &[ScheduledChange] {
        &self.entries
    }

    pub fn add(
        &mut self,
        date: DateTime<Utc>,
        mold_id: &str,
        description: &str,
        line: &str,
    ) -> AppResult<ScheduledChange> {
        let entry = ScheduledChange {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            mold_id: mold_id.trim().to_string(),
            description: description.trim().to_string(),
            line: line.trim().to_string(),
        };
        self.entries.push(entry.clone());
        sort(&mut self.entries);
        self.save()?;
        Ok(entry)
    }

    pub fn remove(&mut self, id: &str) -> AppResult<ScheduledChange> {
        let pos = self.position(id)?;
        let removed = self.entries.remove(pos);
        self.save()?;
        Ok(removed)
    }

    pub fn update_date(&mut self, id: &str, date: DateTime<Utc>) -> AppResult<()> {
        let pos = self.position(id)?;
        self.entries[pos].date = date;
        sort(&mut self.entries);
        self.save()
    }

    /// Earliest entry still in the future.
    pub fn next(&self, now: DateTime<Utc>) -> Option<&ScheduledChange> {
        self.entries.iter().find(|e| e.date > now)
    }

    /// Entries from `now` up to `days` ahead.
    pub fn upcoming(&self, now: DateTime<Utc>, days: i64) -> Vec<&ScheduledChange> {
        let horizon = now + Duration::days(days);
        self.entries
            .iter()
            .filter(|e| e.date > now && e.date <= horizon)
            .collect()
    }

    /// Accepts a unique id prefix, like short git hashes.
    fn position(&self, id: &str) -> AppResult<usize> {
        let matches: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.id == id || (!id.is_empty() && e.id.starts_with(id)))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [one] => Ok(*one),
            [] => Err(AppError::ScheduleNotFound(id.to_string())),
            _ => Err(AppError::BadRequest(format!("ambiguous reminder id '{id}'"))),
        }
    }

    fn save(&self) -> AppResult<()> {
        save_slot(&self.store, SCHEDULE_SLOT, &self.entries)
    }
}

fn sort(entries: &mut [ScheduledChange]) {
    entries.sort_by(|a, b| a.date.cmp(&b.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::slots::MemorySlotStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    fn entry(id: &str, date: DateTime<Utc>) -> ScheduledChange {
        ScheduledChange {
            id: id.into(),
            date,
            mold_id: format!("M-{id}"),
            description: String::new(),
            line: "TB1".into(),
        }
    }

    #[test]
    fn add_keeps_entries_sorted_with_unique_ids() {
        let mut book = ScheduleBook::load(MemorySlotStore::default(), now()).unwrap();
        let late = book.add(now() + Duration::hours(5), "B", "", "TB2").unwrap();
        let early = book.add(now() + Duration::hours(1), "A", "", "TB1").unwrap();

        assert_ne!(late.id, early.id);
        let order: Vec<&str> = book.entries().iter().map(|e| e.mold_id.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn load_prunes_entries_older_than_a_day() {
        let store = MemorySlotStore::default();
        let stored = vec![
            entry("old", now() - Duration::hours(25)),
            entry("recent", now() - Duration::hours(2)),
            entry("future", now() + Duration::hours(2)),
        ];
        save_slot(&store, SCHEDULE_SLOT, &stored).unwrap();

        let book = ScheduleBook::load(store, now()).unwrap();
        let ids: Vec<&str> = book.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["recent", "future"]);
    }

    #[test]
    fn next_is_earliest_future_entry() {
        let store = MemorySlotStore::default();
        let stored = vec![
            entry("past", now() - Duration::minutes(10)),
            entry("b", now() + Duration::hours(3)),
            entry("a", now() + Duration::hours(1)),
        ];
        save_slot(&store, SCHEDULE_SLOT, &stored).unwrap();
        let book = ScheduleBook::load(store, now()).unwrap();

        assert_eq!(book.next(now()).map(|e| e.id.as_str()), Some("a"));
        assert_eq!(book.upcoming(now(), 7).len(), 2);
    }

    #[test]
    fn update_date_resorts_and_remove_reports_missing() {
        let mut book = ScheduleBook::load(MemorySlotStore::default(), now()).unwrap();
        let a = book.add(now() + Duration::hours(1), "A", "", "TB1").unwrap();
        book.add(now() + Duration::hours(2), "B", "", "TB1").unwrap();

        book.update_date(&a.id, now() + Duration::hours(4)).unwrap();
        assert_eq!(book.entries()[1].id, a.id);

        book.remove(&a.id).unwrap();
        let err = book.remove(&a.id).unwrap_err();
        assert!(matches!(err, AppError::ScheduleNotFound(_)));
    }

    #[test]
    fn countdown_flips_to_expired_instead_of_negative() {
        let date = now() + Duration::seconds(3 * 3600 + 25 * 60 + 7);
        let cd = Countdown::until(date, now());
        assert_eq!(cd.to_string(), "03:25:07");
        assert_eq!(cd.urgency(), Urgency::Scheduled);

        assert_eq!(
            Countdown::until(now() + Duration::minutes(4), now()).urgency(),
            Urgency::Imminent
        );
        assert_eq!(
            Countdown::until(now() + Duration::minutes(12), now()).urgency(),
            Urgency::Soon
        );
        assert_eq!(Countdown::until(now(), now()), Countdown::Expired);
        assert_eq!(
            Countdown::until(now() - Duration::seconds(1), now()),
            Countdown::Expired
        );
    }
}
