use crate::error::{EngineError, EngineResult};
use crate::models::{ComparisonKind, DateWindow};
use chrono::{Days, Months, NaiveDate};

/// Prior window for the given comparison mode.
///
/// `PreviousPeriod` ends the day before `start` and spans the same number of
/// days. `PreviousYear` shifts both bounds back twelve months; February 29
/// clamps to February 28.
pub fn previous_window(window: &DateWindow, kind: ComparisonKind) -> EngineResult<DateWindow> {
    window.ensure_valid()?;

    match kind {
        ComparisonKind::PreviousPeriod => {
            let span = Days::new((window.end - window.start).num_days() as u64);
            let end = shift_back(window.start, Days::new(1))?;
            let start = shift_back(end, span)?;
            Ok(DateWindow::new(start, end))
        }
        ComparisonKind::PreviousYear => {
            let year = Months::new(12);
            let start = window.start.checked_sub_months(year);
            let end = window.end.checked_sub_months(year);
            match (start, end) {
                (Some(start), Some(end)) => Ok(DateWindow::new(start, end)),
                _ => Err(out_of_range(window)),
            }
        }
    }
}

fn shift_back(date: NaiveDate, days: Days) -> EngineResult<NaiveDate> {
    date.checked_sub_days(days)
        .ok_or_else(|| EngineError::invalid_spec(format!("date {date} out of range")))
}

fn out_of_range(window: &DateWindow) -> EngineError {
    EngineError::invalid_spec(format!("comparison window for {window} out of range"))
}
