//! Per-day aggregation of movements (dashboard figures).

use chrono::{Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::movement::{MovementType, StockMovement};

/// Quantities moved in and out over some period.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    pub stock_in: i64,
    pub stock_out: i64,
}

impl DailyTotals {
    fn add(&mut self, movement: &StockMovement) {
        match movement.kind {
            MovementType::In => self.stock_in += movement.quantity,
            MovementType::Out => self.stock_out += movement.quantity,
        }
    }
}

/// Totals for one calendar day.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub day: NaiveDate,
    #[serde(flatten)]
    pub totals: DailyTotals,
}

/// Sum quantities of the movements whose `created_at` falls on `day` as seen in `tz`.
pub fn daily_totals<'a, Tz>(
    movements: impl IntoIterator<Item = &'a StockMovement>,
    day: NaiveDate,
    tz: &Tz,
) -> DailyTotals
where
    Tz: TimeZone,
{
    let mut totals = DailyTotals::default();
    for movement in movements {
        if movement.created_at.with_timezone(tz).date_naive() == day {
            totals.add(movement);
        }
    }
    totals
}

/// Seven consecutive days ending at `end_day`, oldest first.
pub fn weekly_totals<'a, Tz>(
    movements: impl IntoIterator<Item = &'a StockMovement>,
    end_day: NaiveDate,
    tz: &Tz,
) -> Vec<DayTotals>
where
    Tz: TimeZone,
{
    const DAYS: u64 = 7;

    let start = end_day.checked_sub_days(Days::new(DAYS - 1)).unwrap_or(end_day);
    let mut week: Vec<DayTotals> = start
        .iter_days()
        .take_while(|d| *d <= end_day)
        .map(|day| DayTotals {
            day,
            totals: DailyTotals::default(),
        })
        .collect();

    for movement in movements {
        let day = movement.created_at.with_timezone(tz).date_naive();
        if day < start || day > end_day {
            continue;
        }
        let offset = (day - start).num_days() as usize;
        if let Some(bucket) = week.get_mut(offset) {
            bucket.totals.add(movement);
        }
    }
    week
}
