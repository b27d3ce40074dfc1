use crate::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window without checking ordering. See [`DateWindow::is_valid`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse `YYYY-MM-DD` bounds, rejecting malformed dates and `end < start`
    pub fn parse(start: &str, end: &str) -> EngineResult<Self> {
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
                EngineError::invalid_spec(format!("unparseable date '{value}': {e}"))
            })
        };
        let window = Self::new(parse(start)?, parse(end)?);
        window.ensure_valid()?;
        Ok(window)
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn ensure_valid(&self) -> EngineResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(EngineError::invalid_spec(format!(
                "window end {} precedes start {}",
                self.end, self.start
            )))
        }
    }

    /// Number of calendar days covered, zero for an inverted window
    pub fn day_count(&self) -> usize {
        if self.is_valid() {
            (self.end - self.start).num_days() as usize + 1
        } else {
            0
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day <= self.end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// What a block is resolved against: account, campaign restriction and window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Opaque provider account handle; empty means no live source
    #[serde(default)]
    pub account_id: String,
    /// Empty means no campaign restriction
    #[serde(default)]
    pub campaign_ids: BTreeSet<String>,
    pub window: DateWindow,
}

impl Scope {
    pub fn new(account_id: impl Into<String>, window: DateWindow) -> Self {
        Self {
            account_id: account_id.into(),
            campaign_ids: BTreeSet::new(),
            window,
        }
    }

    pub fn with_campaigns<I, S>(mut self, campaign_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.campaign_ids = campaign_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_live_source(&self) -> bool {
        !self.account_id.trim().is_empty()
    }
}
