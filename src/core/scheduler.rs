//! Registry of user-requested refreshes.
//!
//! Updates are keyed by label and fire at a wall-clock time of day. Nothing
//! runs in the background: the dashboard calls [`UpdateScheduler::run_pending`]
//! whenever a page request arrives, so a due update fires on the first request
//! after its time.

use crate::core::models::UpdateTargets;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no update time given for '{label}'")]
    MissingTime { label: String },
    #[error("invalid update time '{value}', expected HH:MM")]
    InvalidTime { value: String },
    #[error("no update target selected for '{label}'")]
    NoTarget { label: String },
}

/// A validated request to schedule an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub label: String,
    pub at: NaiveTime,
    pub targets: UpdateTargets,
    pub repeating: bool,
}

impl ScheduleRequest {
    pub fn parse(
        label: &str,
        time: Option<&str>,
        targets: UpdateTargets,
        repeating: bool,
    ) -> Result<Self, ScheduleError> {
        let value = time
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ScheduleError::MissingTime {
                label: label.to_string(),
            })?;

        let at = parse_time_of_day(value)?;

        if !targets.any() {
            return Err(ScheduleError::NoTarget {
                label: label.to_string(),
            });
        }

        Ok(Self {
            label: label.to_string(),
            at,
            targets,
            repeating,
        })
    }

    /// Text shown in the pending-updates list, e.g.
    /// `09:30 ~ Covid Data and News Updates (repeating)`.
    pub fn description(&self) -> String {
        let mut content = format!(
            "{} ~ {} Updates",
            self.at.format("%H:%M"),
            self.targets.describe().unwrap_or("No")
        );
        if self.repeating {
            content.push_str(" (repeating)");
        }
        content
    }

    /// Converts the request into a registry entry whose first run is the next
    /// occurrence of its time of day in the timezone of `now`.
    pub fn into_update<Tz: TimeZone>(self, now: &DateTime<Tz>) -> ScheduledUpdate {
        let next_run = next_occurrence(self.at, now).with_timezone(&Utc);
        let description = self.description();

        ScheduledUpdate {
            label: self.label,
            at: self.at,
            targets: self.targets,
            repeating: self.repeating,
            next_run,
            description,
        }
    }
}

pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ScheduleError::InvalidTime {
        value: value.to_string(),
    })
}

/// The first instant strictly after `now` whose local time is `at`.
pub fn next_occurrence<Tz: TimeZone>(at: NaiveTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    let date = if at > now.time() {
        today
    } else {
        today.succ_opt().unwrap_or(today)
    };

    let naive = date.and_time(at);
    // A time that falls in a DST gap runs an hour later.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| now.clone() + Duration::days(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledUpdate {
    pub label: String,
    pub at: NaiveTime,
    pub targets: UpdateTargets,
    pub repeating: bool,
    pub next_run: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DueUpdates {
    pub targets: UpdateTargets,
    pub fired: Vec<String>,
    pub completed: Vec<String>,
}

impl DueUpdates {
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct UpdateScheduler {
    updates: Vec<ScheduledUpdate>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an update, replacing any update with the same label.
    pub fn schedule(&mut self, update: ScheduledUpdate) -> Option<ScheduledUpdate> {
        match self.updates.iter_mut().find(|u| u.label == update.label) {
            Some(existing) => Some(std::mem::replace(existing, update)),
            None => {
                self.updates.push(update);
                None
            }
        }
    }

    pub fn cancel(&mut self, label: &str) -> Option<ScheduledUpdate> {
        let index = self.updates.iter().position(|u| u.label == label)?;
        Some(self.updates.remove(index))
    }

    pub fn pending(&self) -> &[ScheduledUpdate] {
        &self.updates
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&ScheduledUpdate> {
        self.updates.iter().find(|u| u.label == label)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Fires every update due at `now`. Repeating updates move forward by whole
    /// days; one-shot updates are dropped from the registry.
    pub fn run_pending(&mut self, now: DateTime<Utc>) -> DueUpdates {
        let mut due = DueUpdates::default();

        self.updates.retain_mut(|update| {
            if update.next_run > now {
                return true;
            }

            due.targets.covid_data |= update.targets.covid_data;
            due.targets.news |= update.targets.news;
            due.fired.push(update.label.clone());

            if update.repeating {
                while update.next_run <= now {
                    update.next_run += Duration::days(1);
                }
                true
            } else {
                due.completed.push(update.label.clone());
                false
            }
        });

        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, h, m, s).unwrap()
    }

    fn both() -> UpdateTargets {
        UpdateTargets {
            covid_data: true,
            news: true,
        }
    }

    fn news_only() -> UpdateTargets {
        UpdateTargets {
            covid_data: false,
            news: true,
        }
    }

    fn request(label: &str, time: &str, targets: UpdateTargets, repeating: bool) -> ScheduleRequest {
        ScheduleRequest::parse(label, Some(time), targets, repeating).unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let now = utc(9, 15, 0);
        assert_eq!(next_occurrence(at(10, 30), &now), utc(10, 30, 0));
    }

    #[test]
    fn test_next_occurrence_rolls_to_tomorrow() {
        let now = utc(9, 15, 0);
        let expected = Utc.with_ymd_and_hms(2026, 6, 16, 8, 0, 0).unwrap();
        assert_eq!(next_occurrence(at(8, 0), &now), expected);
    }

    #[test]
    fn test_next_occurrence_same_minute_is_tomorrow() {
        let now = utc(9, 15, 30);
        let expected = Utc.with_ymd_and_hms(2026, 6, 16, 9, 15, 0).unwrap();
        assert_eq!(next_occurrence(at(9, 15), &now), expected);
    }

    #[test]
    fn test_next_occurrence_respects_offset() {
        let tz = chrono::FixedOffset::east_opt(3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 23, 30, 0).unwrap();
        let next = next_occurrence(at(0, 15), &now);
        assert_eq!(next, tz.with_ymd_and_hms(2026, 6, 16, 0, 15, 0).unwrap());
        assert_eq!(next.with_timezone(&Utc), utc(23, 15, 0));
    }

    #[test]
    fn test_parse_request_validation() {
        assert_eq!(
            ScheduleRequest::parse("daily", None, both(), false),
            Err(ScheduleError::MissingTime {
                label: "daily".to_string()
            })
        );
        assert_eq!(
            ScheduleRequest::parse("daily", Some("25:00"), both(), false),
            Err(ScheduleError::InvalidTime {
                value: "25:00".to_string()
            })
        );
        assert_eq!(
            ScheduleRequest::parse("daily", Some("noon"), both(), false),
            Err(ScheduleError::InvalidTime {
                value: "noon".to_string()
            })
        );
        assert_eq!(
            ScheduleRequest::parse("daily", Some("09:30"), UpdateTargets::default(), false),
            Err(ScheduleError::NoTarget {
                label: "daily".to_string()
            })
        );

        let req = request("daily", "09:30", both(), true);
        assert_eq!(req.at, at(9, 30));
        assert!(req.repeating);
    }

    #[test]
    fn test_description_format() {
        assert_eq!(
            request("a", "09:30", both(), true).description(),
            "09:30 ~ Covid Data and News Updates (repeating)"
        );
        assert_eq!(
            request("b", "18:05", news_only(), false).description(),
            "18:05 ~ News Updates"
        );
    }

    #[test]
    fn test_one_shot_update_fires_once_and_is_pruned() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.schedule(request("evening", "18:00", news_only(), false).into_update(&utc(12, 0, 0)));

        let due = scheduler.run_pending(utc(17, 59, 59));
        assert!(due.is_empty());
        assert_eq!(scheduler.pending().len(), 1);

        let due = scheduler.run_pending(utc(18, 0, 0));
        assert_eq!(due.fired, vec!["evening"]);
        assert_eq!(due.completed, vec!["evening"]);
        assert!(due.targets.news);
        assert!(!due.targets.covid_data);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_repeating_update_moves_to_next_day() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.schedule(request("morning", "08:00", both(), true).into_update(&utc(7, 0, 0)));

        let due = scheduler.run_pending(utc(8, 30, 0));
        assert_eq!(due.fired, vec!["morning"]);
        assert!(due.completed.is_empty());

        let update = scheduler.get("morning").unwrap();
        assert_eq!(
            update.next_run,
            Utc.with_ymd_and_hms(2026, 6, 16, 8, 0, 0).unwrap()
        );

        // no second run on the same day
        assert!(scheduler.run_pending(utc(23, 0, 0)).is_empty());
    }

    #[test]
    fn test_repeating_update_skips_missed_days() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.schedule(request("morning", "08:00", both(), true).into_update(&utc(7, 0, 0)));

        let three_days_later = Utc.with_ymd_and_hms(2026, 6, 18, 9, 0, 0).unwrap();
        let due = scheduler.run_pending(three_days_later);
        assert_eq!(due.fired.len(), 1);
        assert_eq!(
            scheduler.get("morning").unwrap().next_run,
            Utc.with_ymd_and_hms(2026, 6, 19, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_schedule_replaces_same_label() {
        let mut scheduler = UpdateScheduler::new();
        let now = utc(7, 0, 0);

        assert!(scheduler
            .schedule(request("x", "08:00", both(), false).into_update(&now))
            .is_none());
        let replaced = scheduler.schedule(request("x", "09:00", news_only(), true).into_update(&now));

        assert_eq!(replaced.unwrap().at, at(8, 0));
        assert_eq!(scheduler.pending().len(), 1);
        assert_eq!(scheduler.get("x").unwrap().at, at(9, 0));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = UpdateScheduler::new();
        let now = utc(7, 0, 0);
        scheduler.schedule(request("a", "08:00", both(), false).into_update(&now));
        scheduler.schedule(request("b", "09:00", both(), false).into_update(&now));

        assert!(scheduler.cancel("missing").is_none());
        assert_eq!(scheduler.cancel("a").unwrap().label, "a");
        assert_eq!(scheduler.pending().len(), 1);
        assert_eq!(scheduler.pending()[0].label, "b");

        // a cancelled update never fires
        let due = scheduler.run_pending(utc(8, 30, 0));
        assert!(due.is_empty());
    }

    #[test]
    fn test_due_targets_are_merged() {
        let mut scheduler = UpdateScheduler::new();
        let now = utc(7, 0, 0);
        scheduler.schedule(
            request(
                "stats",
                "08:00",
                UpdateTargets {
                    covid_data: true,
                    news: false,
                },
                false,
            )
            .into_update(&now),
        );
        scheduler.schedule(request("news", "08:05", news_only(), false).into_update(&now));

        let due = scheduler.run_pending(utc(8, 10, 0));
        assert_eq!(due.targets, both());
        assert_eq!(due.completed, vec!["stats", "news"]);
    }
}
