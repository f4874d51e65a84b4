// src/filters.rs
//! Result-list filters: platform, budget, location and date window.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::OpportunityItem;
use crate::feed::parser::feed_date_to_rfc3339;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    Today,
    Week,
    Month,
}

impl std::str::FromStr for DateWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DateWindow::Today),
            "week" => Ok(DateWindow::Week),
            "month" => Ok(DateWindow::Month),
            other => Err(anyhow::anyhow!("unknown date window '{other}'")),
        }
    }
}

/// Budget presets offered by the UI.
pub const BUDGET_RANGES: [&str; 4] = ["0-30€/h", "30-50€/h", "50-70€/h", "70€+/h"];
/// Location presets offered by the UI.
pub const LOCATIONS: [&str; 5] = ["Remote", "Paris", "Lyon", "Bordeaux", "Other"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpportunityFilter {
    #[serde(default)]
    pub platform: Vec<String>,
    #[serde(default)]
    pub budget: Vec<String>,
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub date: Option<DateWindow>,
}

fn parse_item_date(raw: &str) -> Option<DateTime<Utc>> {
    let rfc3339 = feed_date_to_rfc3339(raw)?;
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn any_substring(selected: &[String], value: Option<&str>) -> bool {
    let Some(v) = value else {
        return false;
    };
    selected.iter().any(|s| v.contains(s.as_str()))
}

impl OpportunityFilter {
    pub fn is_empty(&self) -> bool {
        self.platform.is_empty()
            && self.budget.is_empty()
            && self.location.is_empty()
            && self.date.is_none()
    }

    pub fn matches(&self, item: &OpportunityItem, now: DateTime<Utc>) -> bool {
        if !self.platform.is_empty() && !self.platform.iter().any(|p| p == &item.platform) {
            return false;
        }
        if !self.budget.is_empty() && !any_substring(&self.budget, item.budget.as_deref()) {
            return false;
        }
        if !self.location.is_empty() && !any_substring(&self.location, item.location.as_deref())
        {
            return false;
        }
        let Some(window) = self.date else {
            return true;
        };
        let parsed = parse_item_date(&item.date);
        match window {
            DateWindow::Today => parsed.is_some_and(|d| d.date_naive() == now.date_naive()),
            // An unreadable date never compares as older.
            DateWindow::Week => parsed.map_or(true, |d| d >= now - Duration::days(7)),
            DateWindow::Month => {
                let cutoff = now.checked_sub_months(Months::new(1)).unwrap_or(now);
                parsed.map_or(true, |d| d >= cutoff)
            }
        }
    }

    pub fn apply(&self, items: &[OpportunityItem], now: DateTime<Utc>) -> Vec<OpportunityItem> {
        items
            .iter()
            .filter(|i| self.matches(i, now))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(platform: &str, date: &str, budget: Option<&str>, location: Option<&str>) -> OpportunityItem {
        OpportunityItem {
            id: format!("{platform}-{date}"),
            title: "t".into(),
            description: String::new(),
            platform: platform.into(),
            date: date.into(),
            url: "https://x.test".into(),
            keywords: vec![],
            location: location.map(str::to_string),
            budget: budget.map(str::to_string),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let items = vec![item("Malt", "garbage", None, None)];
        let f = OpportunityFilter::default();
        assert!(f.is_empty());
        assert_eq!(f.apply(&items, now()).len(), 1);
    }

    #[test]
    fn budget_and_location_are_substring_any_of() {
        let items = vec![
            item("Malt", "2025-06-15T08:00:00Z", Some("50-70€/h"), Some("Paris 11e")),
            item("Apec", "2025-06-15T08:00:00Z", None, Some("Lyon")),
        ];
        let f = OpportunityFilter {
            budget: vec!["50-70€/h".into(), "70€+/h".into()],
            ..Default::default()
        };
        assert_eq!(f.apply(&items, now()).len(), 1);

        let f = OpportunityFilter {
            location: vec!["Paris".into(), "Lyon".into()],
            platform: vec!["Apec".into()],
            ..Default::default()
        };
        let out = f.apply(&items, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].platform, "Apec");
    }

    #[test]
    fn date_windows() {
        let items = vec![
            item("A", "2025-06-15T01:00:00Z", None, None),
            item("B", "Mon, 09 Jun 2025 10:00:00 +0000", None, None),
            item("C", "2025-05-20T00:00:00Z", None, None),
            item("D", "2025-04-01T00:00:00Z", None, None),
            item("E", "not a date", None, None),
        ];
        let ids = |w| {
            OpportunityFilter {
                date: Some(w),
                ..Default::default()
            }
            .apply(&items, now())
            .into_iter()
            .map(|i| i.platform)
            .collect::<Vec<_>>()
        };
        assert_eq!(ids(DateWindow::Today), vec!["A"]);
        assert_eq!(ids(DateWindow::Week), vec!["A", "B", "E"]);
        assert_eq!(ids(DateWindow::Month), vec!["A", "B", "C", "E"]);
    }

    #[test]
    fn date_window_parses_known_names() {
        assert_eq!(" Today ".parse::<DateWindow>().unwrap(), DateWindow::Today);
        assert!("week".parse::<DateWindow>().is_ok());
        assert!("year".parse::<DateWindow>().is_err());
    }
}
