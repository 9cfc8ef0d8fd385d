//! Builds, for each service identifier declared by the feed, a compact set
//! of calendar days on which it operates (§4.1).

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use gtfs::data_model::calendar::CalendarRow;
use gtfs::data_model::calendar_dates::ExceptionType;
use gtfs::Feed;

use crate::dayset::DaySet;
use crate::model::{Service, ServiceId};
use crate::warnings::{Warning, Warnings};

/// One more day than the highest shift the pipeline introduces (continuation
/// candidates may cross midnight by exactly one day).
const SHIFT_SLACK_DAYS: i64 = 1;

pub struct ServiceDayIndex {
    pub epoch: NaiveDate,
    pub capacity: usize,
    by_service: HashMap<ServiceId, DaySet>,
    reverse: HashMap<DaySet, ServiceId>,
}

impl ServiceDayIndex {
    pub fn get(&self, service_id: &str) -> Option<&DaySet> {
        self.by_service.get(service_id)
    }

    /// An existing service identifier whose day-set equals `days`, if any.
    pub fn find_existing(&self, days: &DaySet) -> Option<&ServiceId> {
        self.reverse.get(days)
    }

    pub fn day_to_date(&self, day_offset: usize) -> NaiveDate {
        self.epoch + chrono::Duration::days(day_offset as i64)
    }

    pub fn date_to_day(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.epoch).num_days();
        if offset < 0 || offset as usize >= self.capacity {
            None
        } else {
            Some(offset as usize)
        }
    }

    pub fn insert_synthetic(&mut self, id: ServiceId, days: DaySet) {
        self.reverse.insert(days.clone(), id.clone());
        self.by_service.insert(id, days);
    }

    fn weekday_enabled(row: &CalendarRow, weekday: Weekday) -> bool {
        use gtfs::data_model::calendar::ServiceAvailability;
        let enabled = |avail: &ServiceAvailability| avail.is_available();
        match weekday {
            Weekday::Mon => enabled(&row.monday),
            Weekday::Tue => enabled(&row.tuesday),
            Weekday::Wed => enabled(&row.wednesday),
            Weekday::Thu => enabled(&row.thursday),
            Weekday::Fri => enabled(&row.friday),
            Weekday::Sat => enabled(&row.saturday),
            Weekday::Sun => enabled(&row.sunday),
        }
    }
}

/// Builds the service-day index from the feed's `calendar` and
/// `calendar_dates` tables. Epoch is the earliest day appearing in any
/// `calendar.start_date` or any calendar_dates "add" exception.
pub fn build_service_day_index(feed: &Feed, warnings: &mut Warnings) -> ServiceDayIndex {
    let earliest_start = feed.calendar.iter().map(|row| row.start_date).min();
    let earliest_add = feed
        .calendar_dates
        .iter()
        .filter(|exc| matches!(exc.exception_type, ExceptionType::ServiceAdded))
        .map(|exc| exc.date)
        .min();
    let epoch = match (earliest_start, earliest_add) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => chrono::Utc::now().date_naive(),
    };

    let latest_end = feed.calendar.iter().map(|row| row.end_date).max();
    let latest_date = feed
        .calendar_dates
        .iter()
        .map(|exc| exc.date)
        .max()
        .into_iter()
        .chain(latest_end)
        .max()
        .unwrap_or(epoch);
    let span_days = (latest_date - epoch).num_days().max(0) as usize;
    let capacity = span_days + 1 + SHIFT_SLACK_DAYS as usize;

    let mut by_service: HashMap<ServiceId, DaySet> = HashMap::new();

    for row in &feed.calendar {
        let mut days = DaySet::empty(capacity);
        let mut date = row.start_date;
        while date <= row.end_date {
            if ServiceDayIndex::weekday_enabled(row, date.weekday()) {
                let offset = (date - epoch).num_days() as usize;
                days.set(offset);
            }
            date += chrono::Duration::days(1);
        }
        by_service.insert(row.service_id.raw(), days);
    }

    for exception in &feed.calendar_dates {
        let service_id = exception.service_id.raw();
        let days = by_service
            .entry(service_id.clone())
            .or_insert_with(|| DaySet::empty(capacity));
        let offset = (exception.date - epoch).num_days() as usize;
        match exception.exception_type {
            ExceptionType::ServiceAdded => {
                if days.contains(offset) {
                    warnings.push(Warning::CalendarExceptionRedundant {
                        service_id,
                        date: exception.date,
                        adding: true,
                    });
                }
                days.set(offset);
            }
            ExceptionType::ServiceRemoved => {
                if !days.contains(offset) {
                    warnings.push(Warning::CalendarExceptionRedundant {
                        service_id,
                        date: exception.date,
                        adding: false,
                    });
                }
                days.clear(offset);
            }
        }
    }

    let mut reverse = HashMap::new();
    for (id, days) in &by_service {
        reverse.entry(days.clone()).or_insert_with(|| id.clone());
    }

    ServiceDayIndex {
        epoch,
        capacity,
        by_service,
        reverse,
    }
}

pub fn services(index: &ServiceDayIndex) -> Vec<Service> {
    index
        .by_service
        .iter()
        .map(|(id, days)| Service {
            id: id.clone(),
            days: days.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs::data_model::calendar::ServiceAvailability;
    use utility::id::Id;

    fn row(service_id: &str, start: &str, end: &str, weekdays_on: bool) -> CalendarRow {
        let avail = if weekdays_on {
            ServiceAvailability::Available
        } else {
            ServiceAvailability::Unavailable
        };
        CalendarRow {
            service_id: Id::new(service_id.to_owned()),
            monday: avail,
            tuesday: avail,
            wednesday: avail,
            thursday: avail,
            friday: avail,
            saturday: ServiceAvailability::Unavailable,
            sunday: ServiceAvailability::Unavailable,
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn builds_weekday_service() {
        let mut feed = Feed {
            agencies: vec![],
            stops: Default::default(),
            routes: Default::default(),
            trips: Default::default(),
            stop_times: vec![],
            calendar: vec![row("WD", "2024-01-01", "2024-01-07", true)],
            calendar_dates: vec![],
            transfers: vec![],
            shapes: vec![],
        };
        feed.calendar[0].saturday = ServiceAvailability::Unavailable;
        feed.calendar[0].sunday = ServiceAvailability::Unavailable;
        let mut warnings = Warnings::new();
        let index = build_service_day_index(&feed, &mut warnings);
        // 2024-01-01 is a Monday; Mon-Fri of that week should be set (5 days).
        let days = index.get("WD").unwrap();
        assert_eq!(days.count(), 5);
        assert!(!warnings.any_fired());
    }

    #[test]
    fn redundant_exception_warns() {
        let mut feed = Feed {
            agencies: vec![],
            stops: Default::default(),
            routes: Default::default(),
            trips: Default::default(),
            stop_times: vec![],
            calendar: vec![row("WD", "2024-01-01", "2024-01-07", true)],
            calendar_dates: vec![gtfs::data_model::calendar_dates::CalendarDate {
                service_id: Id::new("WD".to_owned()),
                date: NaiveDate::parse_from_str("2024-01-01", "%Y-%m-%d").unwrap(),
                exception_type: ExceptionType::ServiceAdded,
            }],
            transfers: vec![],
            shapes: vec![],
        };
        feed.calendar[0].saturday = ServiceAvailability::Unavailable;
        feed.calendar[0].sunday = ServiceAvailability::Unavailable;
        let mut warnings = Warnings::new();
        build_service_day_index(&feed, &mut warnings);
        assert!(warnings.any_fired());
    }
}
