//! Multi-criteria case filtering.
//!
//! A [`CaseQuery`] is parsed from named string parameters and evaluated
//! against [`CaseListing`]s. Criteria combine with AND; values within one
//! comma-separated list combine with OR. A criterion that is absent (or
//! blank) contributes no term at all.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  case::Case,
  party::{Property, User},
  status::{CaseStatus, StatusFilter},
};

// ─── Listing ─────────────────────────────────────────────────────────────────

/// A case joined with the related rows its filters and listings read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseListing {
  pub case:        Case,
  pub property:    Property,
  pub analyst:     Option<User>,
  pub qc_reviewer: Option<User>,
  /// Name of the case's system unit, when it has one.
  pub unit_name:   Option<String>,
  /// Ids of the tags linked to the case.
  pub tags:        Vec<i64>,
}

impl CaseListing {
  pub fn status(&self) -> CaseStatus { self.case.status() }
}

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateFilter {
  /// Cases that are not marked as a duplicate of anything.
  None,
  /// The case itself and every case marked as its duplicate.
  Of(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct QueryError {
  pub key:    String,
  pub value:  String,
  pub reason: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseQuery {
  pub case_reference:         Vec<String>,
  pub property:               Vec<i64>,
  pub requester:              Vec<i64>,
  pub case_number:            Vec<i64>,
  pub analyst:                Vec<i64>,
  pub qc_reviewer:            Vec<i64>,
  pub cbrs_unit:              Vec<i64>,
  pub tags:                   Vec<i64>,
  pub priority:               Option<bool>,
  pub on_hold:                Option<bool>,
  pub invalid:                Option<bool>,
  pub hard_copy_map_reviewed: Option<bool>,
  pub policy_number:          Vec<String>,
  /// Exclusive lower bound on the request date.
  pub request_date_after:     Option<NaiveDate>,
  /// Exclusive upper bound on the request date.
  pub request_date_before:    Option<NaiveDate>,
  pub distance_from:          Option<f64>,
  pub distance_to:            Option<f64>,
  pub street:                 Option<String>,
  pub city:                   Option<String>,
  pub freetext:               Option<String>,
  pub fiscal_year:            Option<i32>,
  pub duplicate:              Option<DuplicateFilter>,
  pub status:                 Vec<StatusFilter>,
}

// ── Parsing helpers ──────────────────────────────────────────────────────

struct Params<'a>(&'a BTreeMap<String, String>);

impl<'a> Params<'a> {
  /// The trimmed value for `key`, or `None` when absent or blank.
  fn get(&self, key: &str) -> Option<&'a str> {
    self
      .0
      .get(key)
      .map(|v| v.trim())
      .filter(|v| !v.is_empty())
  }

  fn invalid(key: &str, value: &str, reason: &'static str) -> QueryError {
    QueryError { key: key.to_owned(), value: value.to_owned(), reason }
  }

  fn strings(&self, key: &str) -> Vec<String> {
    self
      .get(key)
      .map(|v| {
        v.split(',')
          .map(str::trim)
          .filter(|s| !s.is_empty())
          .map(String::from)
          .collect()
      })
      .unwrap_or_default()
  }

  fn ids(&self, key: &str) -> Result<Vec<i64>, QueryError> {
    self
      .strings(key)
      .iter()
      .map(|s| s.parse().map_err(|_| Self::invalid(key, s, "expected an integer id")))
      .collect()
  }

  fn flag(&self, key: &str) -> Result<Option<bool>, QueryError> {
    self
      .get(key)
      .map(|v| match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Self::invalid(key, v, "expected a boolean")),
      })
      .transpose()
  }

  fn date(&self, key: &str) -> Result<Option<NaiveDate>, QueryError> {
    self
      .get(key)
      .map(|v| {
        NaiveDate::parse_from_str(v, "%Y-%m-%d")
          .map_err(|_| Self::invalid(key, v, "expected a YYYY-MM-DD date"))
      })
      .transpose()
  }

  fn number(&self, key: &str) -> Result<Option<f64>, QueryError> {
    self
      .get(key)
      .map(|v| match v.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(Self::invalid(key, v, "expected a number")),
      })
      .transpose()
  }

  fn text(&self, key: &str) -> Option<String> { self.get(key).map(str::to_lowercase) }
}

/// First and last day of fiscal year `year`: October 1 of the prior year
/// through September 30.
pub fn fiscal_year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
  Some((
    NaiveDate::from_ymd_opt(year.checked_sub(1)?, 10, 1)?,
    NaiveDate::from_ymd_opt(year, 9, 30)?,
  ))
}

impl CaseQuery {
  /// Build a query from request parameters. Unknown keys are ignored.
  pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, QueryError> {
    let p = Params(params);

    let fiscal_year = match p.get("fiscal_year") {
      Some(v) => {
        let year = v
          .parse::<i32>()
          .ok()
          .filter(|y| fiscal_year_bounds(*y).is_some())
          .ok_or_else(|| Params::invalid("fiscal_year", v, "expected a year"))?;
        Some(year)
      }
      None => None,
    };

    let duplicate = match p.get("duplicate") {
      Some(v) if v.eq_ignore_ascii_case("none") => Some(DuplicateFilter::None),
      Some(v) => Some(DuplicateFilter::Of(v.parse().map_err(|_| {
        Params::invalid("duplicate", v, "expected a case id or \"none\"")
      })?)),
      None => None,
    };

    let status = p
      .strings("status")
      .iter()
      .map(|s| {
        s.parse::<StatusFilter>()
          .map_err(|_| Params::invalid("status", s, "unknown status"))
      })
      .collect::<Result<_, _>>()?;

    Ok(Self {
      case_reference: p.strings("case_reference"),
      property: p.ids("property")?,
      requester: p.ids("requester")?,
      case_number: p.ids("case_number")?,
      analyst: p.ids("analyst")?,
      qc_reviewer: p.ids("qc_reviewer")?,
      cbrs_unit: p.ids("cbrs_unit")?,
      tags: p.ids("tags")?,
      priority: p.flag("priority")?,
      on_hold: p.flag("on_hold")?,
      invalid: p.flag("invalid")?,
      hard_copy_map_reviewed: p.flag("hard_copy_map_reviewed")?,
      policy_number: p.strings("policy_number"),
      request_date_after: p.date("request_date_after")?,
      request_date_before: p.date("request_date_before")?,
      distance_from: p.number("distance_from")?,
      distance_to: p.number("distance_to")?,
      street: p.text("street"),
      city: p.text("city"),
      freetext: p.text("freetext"),
      fiscal_year,
      duplicate,
      status,
    })
  }

  /// Whether `listing` satisfies every criterion present.
  pub fn matches(&self, listing: &CaseListing) -> bool {
    let case = &listing.case;
    let prop = &listing.property.data;

    let reference_ok = self.case_reference.is_empty()
      || case.case_reference.as_deref().is_some_and(|r| {
        self.case_reference.iter().any(|want| want.as_str() == r)
      });

    reference_ok
      && any_id(&self.property, Some(case.property))
      && any_id(&self.requester, Some(case.requester))
      && any_id(&self.case_number, Some(case.id))
      && any_id(&self.analyst, case.reviewers.analyst)
      && any_id(&self.qc_reviewer, case.reviewers.qc_reviewer)
      && any_id(&self.cbrs_unit, case.cbrs_unit)
      && (self.tags.is_empty() || listing.tags.iter().any(|t| self.tags.contains(t)))
      && flag_ok(self.priority, case.flags.priority)
      && flag_ok(self.on_hold, case.flags.on_hold)
      && flag_ok(self.invalid, case.flags.invalid)
      && flag_ok(self.hard_copy_map_reviewed, case.flags.hard_copy_map_reviewed)
      && (self.policy_number.is_empty() || self.policy_number.contains(&prop.policy_number))
      && self.request_date_ok(case.dates.request_date)
      && self.distance_ok(case.distance)
      && contains_ok(self.street.as_deref(), &prop.address.street)
      && contains_ok(self.city.as_deref(), &prop.address.city)
      && self.freetext_ok(listing)
      && self.duplicate_ok(case)
      && (self.status.is_empty() || self.status.iter().any(|s| s.matches(&case.dates)))
  }

  /// Apply the query to a collection, keeping its order.
  pub fn filter(&self, listings: Vec<CaseListing>) -> Vec<CaseListing> {
    listings.into_iter().filter(|l| self.matches(l)).collect()
  }

  fn request_date_ok(&self, date: Option<NaiveDate>) -> bool {
    let bounded = self.request_date_after.is_some()
      || self.request_date_before.is_some()
      || self.fiscal_year.is_some();
    let Some(date) = date else { return !bounded };

    let after = self.request_date_after.is_none_or(|lo| date > lo);
    let before = self.request_date_before.is_none_or(|hi| date < hi);
    let fiscal = self
      .fiscal_year
      .and_then(fiscal_year_bounds)
      .is_none_or(|(start, end)| start <= date && date <= end);
    after && before && fiscal
  }

  fn distance_ok(&self, distance: Option<f64>) -> bool {
    if self.distance_from.is_none() && self.distance_to.is_none() {
      return true;
    }
    let Some(d) = distance else { return false };
    self.distance_from.is_none_or(|lo| d > lo) && self.distance_to.is_none_or(|hi| d < hi)
  }

  fn freetext_ok(&self, listing: &CaseListing) -> bool {
    let Some(needle) = self.freetext.as_deref() else { return true };
    let prop = &listing.property.data;
    let hit = |s: &str| s.to_lowercase().contains(needle);

    listing.analyst.as_ref().is_some_and(|u| {
      hit(&u.data.username) || hit(&u.data.first_name) || hit(&u.data.last_name)
    }) || listing.case.case_reference.as_deref().is_some_and(hit)
      || listing.unit_name.as_deref().is_some_and(hit)
      || hit(&prop.address.street)
      || hit(&prop.address.unit)
      || hit(&prop.address.city)
      || hit(&prop.policy_number)
  }

  fn duplicate_ok(&self, case: &Case) -> bool {
    match self.duplicate {
      None => true,
      Some(DuplicateFilter::None) => case.duplicate_of.is_none(),
      Some(DuplicateFilter::Of(id)) => case.id == id || case.duplicate_of == Some(id),
    }
  }
}

fn any_id(wanted: &[i64], actual: Option<i64>) -> bool {
  wanted.is_empty() || actual.is_some_and(|a| wanted.contains(&a))
}

fn flag_ok(wanted: Option<bool>, actual: bool) -> bool { wanted.is_none_or(|w| w == actual) }

/// `needle` is already lower-cased.
fn contains_ok(needle: Option<&str>, haystack: &str) -> bool {
  needle.is_none_or(|n| haystack.to_lowercase().contains(n))
}
