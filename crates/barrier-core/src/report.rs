//! Status counts, elapsed-day metrics and report listings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  case::{Case, Milestone, Milestones},
  query::{CaseListing, QueryError},
  status::{CaseStatus, derive_status},
};

// ─── Status counts ───────────────────────────────────────────────────────────

/// One count per status. Every case lands in exactly one bucket, so the
/// counts always sum to the number of cases tallied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
  pub received:               usize,
  pub awaiting_qc:            usize,
  pub awaiting_final_letter:  usize,
  #[serde(rename = "final")]
  pub finalized:              usize,
  pub closed_no_final_letter: usize,
}

impl StatusCounts {
  pub fn tally<'a>(cases: impl IntoIterator<Item = &'a Case>) -> Self {
    let mut counts = Self::default();
    for case in cases {
      counts.add(case.status());
    }
    counts
  }

  fn add(&mut self, status: CaseStatus) {
    let slot = match status {
      CaseStatus::Received => &mut self.received,
      CaseStatus::AwaitingQc => &mut self.awaiting_qc,
      CaseStatus::AwaitingFinalLetter => &mut self.awaiting_final_letter,
      CaseStatus::Final => &mut self.finalized,
      CaseStatus::ClosedNoFinalLetter => &mut self.closed_no_final_letter,
    };
    *slot += 1;
  }

  pub fn total(&self) -> usize {
    self.received
      + self.awaiting_qc
      + self.awaiting_final_letter
      + self.finalized
      + self.closed_no_final_letter
  }
}

// ─── Elapsed days ────────────────────────────────────────────────────────────

/// Days from the request date to each later milestone. A metric is `None`
/// whenever either end is missing; it is never zero-filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedDays {
  pub analyst_days:      Option<i64>,
  pub qc_reviewer_days:  Option<i64>,
  pub final_letter_days: Option<i64>,
  pub close_days:        Option<i64>,
}

impl ElapsedDays {
  pub fn of(case: &Case) -> Self { Self::from_dates(&case.dates) }

  pub fn from_dates(dates: &Milestones) -> Self {
    let since = |end: Option<NaiveDate>| {
      dates
        .request_date
        .zip(end)
        .map(|(start, end)| (end - start).num_days())
    };
    Self {
      analyst_days:      since(dates.analyst_signoff_date),
      qc_reviewer_days:  since(dates.qc_reviewer_signoff_date),
      final_letter_days: since(dates.final_letter_date),
      close_days:        since(dates.close_date),
    }
  }
}

// ─── Report listings ─────────────────────────────────────────────────────────

/// Which report was asked for. Only `DaysToEachStatus` changes the filtering,
/// by enabling the milestone date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
  DaysToResolution,
  CasesByUnit,
  DaysToEachStatus,
  CasesForUser,
}

impl ReportKind {
  fn from_name(name: &str) -> Option<Self> {
    match name {
      "daystoresolution" => Some(Self::DaysToResolution),
      "casesbyunit" => Some(Self::CasesByUnit),
      "daystoeachstatus" => Some(Self::DaysToEachStatus),
      "allcasesforuser" => Some(Self::CasesForUser),
      _ => None,
    }
  }
}

/// Cases whose `field` milestone falls strictly between the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  pub field: Milestone,
  pub from:  Option<NaiveDate>,
  pub to:    Option<NaiveDate>,
}

impl DateRange {
  fn contains(&self, dates: &Milestones) -> bool {
    if self.from.is_none() && self.to.is_none() {
      return true;
    }
    let Some(date) = dates.get(self.field) else { return false };
    self.from.is_none_or(|lo| date > lo) && self.to.is_none_or(|hi| date < hi)
  }
}

/// Report parameters. The unit and user filters apply to every report,
/// including when no `report` is named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
  pub kind:  Option<ReportKind>,
  /// System unit ids; a case matches when its unit is one of them.
  pub units: Option<Vec<i64>>,
  /// Analyst or QC reviewer username, case-insensitive.
  pub user:  Option<String>,
  pub range: Option<DateRange>,
}

fn invalid(key: &str, value: &str, reason: &'static str) -> QueryError {
  QueryError { key: key.to_owned(), value: value.to_owned(), reason }
}

fn param<'a>(params: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
  params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn date_param(
  params: &BTreeMap<String, String>,
  key: &str,
) -> Result<Option<NaiveDate>, QueryError> {
  param(params, key)
    .map(|v| {
      NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .map_err(|_| invalid(key, v, "expected a YYYY-MM-DD date"))
    })
    .transpose()
}

impl ReportQuery {
  /// Parse `report`, `cbrs_unit`, `user` and, for `daystoeachstatus`, the
  /// `date_field` range. The range is ignored without a `date_field`.
  pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, QueryError> {
    let kind = param(params, "report")
      .map(|v| ReportKind::from_name(v).ok_or_else(|| invalid("report", v, "unknown report")))
      .transpose()?;

    let units = param(params, "cbrs_unit")
      .map(|v| {
        v.split(',')
          .map(str::trim)
          .filter(|s| !s.is_empty())
          .map(|s| s.parse().map_err(|_| invalid("cbrs_unit", s, "expected an integer id")))
          .collect::<Result<Vec<i64>, _>>()
      })
      .transpose()?;

    let user = param(params, "user").map(str::to_owned);

    let range = match (kind, param(params, "date_field")) {
      (Some(ReportKind::DaysToEachStatus), Some(field)) => Some(DateRange {
        field: Milestone::from_field_name(field)
          .ok_or_else(|| invalid("date_field", field, "unknown date field"))?,
        from:  date_param(params, "from_date")?,
        to:    date_param(params, "to_date")?,
      }),
      _ => None,
    };

    Ok(Self { kind, units, user, range })
  }

  pub fn matches(&self, listing: &CaseListing) -> bool {
    let case = &listing.case;
    if let Some(units) = &self.units
      && !case.cbrs_unit.is_some_and(|u| units.contains(&u))
    {
      return false;
    }
    if let Some(user) = &self.user {
      let assigned = [&listing.analyst, &listing.qc_reviewer]
        .into_iter()
        .flatten()
        .any(|u| u.data.username.eq_ignore_ascii_case(user));
      if !assigned {
        return false;
      }
    }
    self.range.is_none_or(|r| r.contains(&case.dates))
  }

  /// Matching rows, ordered by case id.
  pub fn run(&self, listings: Vec<CaseListing>) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = listings
      .into_iter()
      .filter(|l| self.matches(l))
      .map(ReportRow::from)
      .collect();
    rows.sort_by_key(|r| r.case.id);
    rows
  }
}

/// One line of a report listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
  #[serde(flatten)]
  pub case:        Case,
  pub status:      CaseStatus,
  #[serde(flatten)]
  pub elapsed:     ElapsedDays,
  pub unit_name:   Option<String>,
  pub analyst:     Option<String>,
  pub qc_reviewer: Option<String>,
}

impl From<CaseListing> for ReportRow {
  fn from(listing: CaseListing) -> Self {
    Self {
      status:      derive_status(&listing.case.dates),
      elapsed:     ElapsedDays::of(&listing.case),
      unit_name:   listing.unit_name,
      analyst:     listing.analyst.map(|u| u.data.username),
      qc_reviewer: listing.qc_reviewer.map(|u| u.data.username),
      case:        listing.case,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(m: u32, day: u32) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(2024, m, day) }

  #[test]
  fn elapsed_days_for_analyst_only_case() {
    let dates = Milestones {
      request_date: d(1, 1),
      analyst_signoff_date: d(2, 1),
      ..Default::default()
    };
    let e = ElapsedDays::from_dates(&dates);
    assert_eq!(derive_status(&dates), CaseStatus::AwaitingQc);
    assert_eq!(e.analyst_days, Some(31));
    assert_eq!(e.qc_reviewer_days, None);
    assert_eq!(e.close_days, None);
  }

  #[test]
  fn elapsed_days_need_a_request_date() {
    let dates = Milestones { close_date: d(3, 1), ..Default::default() };
    assert_eq!(ElapsedDays::from_dates(&dates), ElapsedDays::default());
  }

  #[test]
  fn same_day_is_zero_not_absent() {
    let dates = Milestones {
      request_date: d(1, 1),
      close_date: d(1, 1),
      ..Default::default()
    };
    assert_eq!(ElapsedDays::from_dates(&dates).close_days, Some(0));
  }

  fn p(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn report_params() {
    assert_eq!(ReportQuery::from_params(&p(&[])).unwrap(), ReportQuery::default());

    let q = ReportQuery::from_params(&p(&[("report", "casesbyunit"), ("cbrs_unit", "1,2")]))
      .unwrap();
    assert_eq!(q.kind, Some(ReportKind::CasesByUnit));
    assert_eq!(q.units, Some(vec![1, 2]));

    let q = ReportQuery::from_params(&p(&[
      ("report", "daystoeachstatus"),
      ("date_field", "close_date"),
      ("from_date", "2024-01-01"),
    ]))
    .unwrap();
    assert_eq!(
      q.range,
      Some(DateRange { field: Milestone::Close, from: d(1, 1), to: None })
    );

    assert!(ReportQuery::from_params(&p(&[("report", "allcasesforuser")])).is_ok());
    assert!(ReportQuery::from_params(&p(&[("report", "bogus")])).is_err());
    assert!(ReportQuery::from_params(&p(&[("cbrs_unit", "x")])).is_err());
  }

  #[test]
  fn unit_and_user_filters_apply_to_every_report() {
    let q = ReportQuery::from_params(&p(&[("report", "daystoresolution"), ("cbrs_unit", "999")]))
      .unwrap();
    assert_eq!(q.units, Some(vec![999]));

    let q = ReportQuery::from_params(&p(&[("user", "nobody")])).unwrap();
    assert_eq!(q.kind, None);
    assert_eq!(q.user.as_deref(), Some("nobody"));
  }

  #[test]
  fn date_range_needs_a_date_field_and_the_status_report() {
    let q = ReportQuery::from_params(&p(&[
      ("report", "daystoeachstatus"),
      ("from_date", "2024-01-01"),
    ]))
    .unwrap();
    assert_eq!(q.range, None);

    let q = ReportQuery::from_params(&p(&[
      ("report", "casesbyunit"),
      ("date_field", "close_date"),
      ("from_date", "2024-01-01"),
    ]))
    .unwrap();
    assert_eq!(q.range, None);
  }

  #[test]
  fn date_range_bounds_are_exclusive() {
    let range = DateRange { field: Milestone::Close, from: d(1, 1), to: d(1, 31) };
    let closed = |day| Milestones { close_date: d(1, day), ..Default::default() };
    assert!(!range.contains(&closed(1)));
    assert!(range.contains(&closed(15)));
    assert!(!range.contains(&closed(31)));
    assert!(!range.contains(&Milestones::default()));
  }
}
