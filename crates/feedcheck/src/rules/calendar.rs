//! Service calendar presence and active-date expansion.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::{CALENDAR, CALENDAR_DATES};
use crate::table::Feed;

use super::{Rule, RuleError};

const CODE_MISSING_CALENDAR: &str = "missing_calendar_and_calendar_date_files";

/// Ranges longer than this are not expanded.
const MAX_SERVICE_DAYS: i64 = 3660;

/// A feed must define service with calendar, calendar_dates or both.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingCalendarRule;

impl Rule for MissingCalendarRule {
    fn name(&self) -> &str {
        "missing_calendar"
    }

    fn required_tables(&self) -> Vec<&str> {
        Vec::new()
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        if !feed.has_table(CALENDAR) && !feed.has_table(CALENDAR_DATES) {
            notices.push(Notice::new(CODE_MISSING_CALENDAR, Severity::Error));
        }
        Ok(())
    }
}

/// Active dates of every service, merged from calendar and calendar_dates.
#[derive(Debug, Clone, Default)]
pub struct ServiceCalendar {
    services: HashMap<String, BTreeSet<NaiveDate>>,
}

impl ServiceCalendar {
    /// Expand the feed's calendars; `None` if it has neither file.
    pub fn from_feed(feed: &Feed) -> Result<Option<Self>, RuleError> {
        let calendar = feed.table(CALENDAR);
        let calendar_dates = feed.table(CALENDAR_DATES);
        if calendar.is_none() && calendar_dates.is_none() {
            return Ok(None);
        }

        let mut services: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();

        if let Some(table) = calendar {
            let service_id = table.column("service_id")?;
            let start_date = table.column("start_date")?;
            let end_date = table.column("end_date")?;
            let days = [
                (Weekday::Mon, table.column("monday")?),
                (Weekday::Tue, table.column("tuesday")?),
                (Weekday::Wed, table.column("wednesday")?),
                (Weekday::Thu, table.column("thursday")?),
                (Weekday::Fri, table.column("friday")?),
                (Weekday::Sat, table.column("saturday")?),
                (Weekday::Sun, table.column("sunday")?),
            ];

            for row in table.all() {
                let (Some(id), Some(start), Some(end)) =
                    (row.text(service_id), row.date(start_date), row.date(end_date))
                else {
                    continue;
                };
                if (end - start).num_days() > MAX_SERVICE_DAYS {
                    debug!(service_id = id, %start, %end, "Service range too long to expand");
                    continue;
                }
                let active: Vec<Weekday> = days
                    .iter()
                    .filter(|(_, column)| row.integer(*column) == Some(1))
                    .map(|(day, _)| *day)
                    .collect();

                let dates = services.entry(id.to_string()).or_default();
                let mut date = start;
                while date <= end {
                    if active.contains(&date.weekday()) {
                        dates.insert(date);
                    }
                    date += Duration::days(1);
                }
            }
        }

        if let Some(table) = calendar_dates {
            let service_id = table.column("service_id")?;
            let date_column = table.column("date")?;
            let exception_type = table.column("exception_type")?;

            for row in table.all() {
                let (Some(id), Some(date)) = (row.text(service_id), row.date(date_column)) else {
                    continue;
                };
                let dates = services.entry(id.to_string()).or_default();
                match row.integer(exception_type) {
                    Some(1) => {
                        dates.insert(date);
                    }
                    Some(2) => {
                        dates.remove(&date);
                    }
                    _ => {}
                }
            }
        }

        Ok(Some(Self { services }))
    }

    pub fn dates(&self, service_id: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.services.get(service_id)
    }

    pub fn is_active(&self, service_id: &str, date: NaiveDate) -> bool {
        self.dates(service_id).is_some_and(|d| d.contains(&date))
    }

    /// First date on which both services run.
    pub fn first_common_date(&self, a: &str, b: &str) -> Option<NaiveDate> {
        let (a, b) = (self.dates(a)?, self.dates(b)?);
        a.intersection(b).next().copied()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
