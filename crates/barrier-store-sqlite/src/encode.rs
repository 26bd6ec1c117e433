//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Decoding happens inside row closures, so parse failures are
//! reported as [`rusqlite::Error::FromSqlConversionFailure`].

use barrier_core::{
  audit::AuditInfo,
  case::{Case, CaseFlags, Milestones, Reviewers},
  case_file::{CaseFile, NewCaseFile},
  lookup::{
    Determination, FieldOffice, NewDetermination, NewFieldOffice, NewSystemMap, NewSystemUnit,
    NewSystemUnitMap, NewSystemUnitType, Outcome, SystemMap, SystemUnit, SystemUnitMap,
    SystemUnitType,
  },
  party::{Address, NewProperty, NewRequester, NewUser, Property, Requester, User},
  tag::{CaseTag, Comment, NewCaseTag, NewComment, NewTag, Tag},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, types::Type};
use serde::Serialize;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: Option<NaiveDate>) -> Option<String> {
  d.map(|d| d.format(DATE_FORMAT).to_string())
}

fn conversion(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
  let raw: Option<String> = row.get(idx)?;
  raw
    .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion(idx, e)))
    .transpose()
}

pub fn dt_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  let raw: String = row.get(idx)?;
  DateTime::parse_from_rfc3339(&raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| conversion(idx, e))
}

fn outcome_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Outcome> {
  let raw: String = row.get(idx)?;
  raw.parse().map_err(|e| conversion(idx, e))
}

/// The four audit columns, starting at `start`.
fn audit_cols(row: &Row<'_>, start: usize) -> rusqlite::Result<AuditInfo> {
  Ok(AuditInfo {
    created_at:  dt_col(row, start)?,
    created_by:  row.get(start + 1)?,
    modified_at: dt_col(row, start + 2)?,
    modified_by: row.get(start + 3)?,
  })
}

/// Serialise inside a connection closure.
pub fn to_json<T: Serialize>(value: &T) -> tokio_rusqlite::Result<String> {
  serde_json::to_string(value).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A table row that decodes into a domain entity.
///
/// `COLUMNS` always begins with `id` and ends with the four audit columns.
pub trait Record: Serialize + Sized + Send + 'static {
  const TABLE: &'static str;
  /// Entity name written to the audit log.
  const ENTITY: &'static str;
  const COLUMNS: &'static str;

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

  fn id(&self) -> i64;
}

macro_rules! columns {
  ($($col:literal),* $(,)?) => {
    concat!("id, ", $($col, ", ",)* "created_at, created_by, modified_at, modified_by")
  };
}

impl Record for User {
  const COLUMNS: &'static str =
    columns!("username", "first_name", "last_name", "email", "is_active");
  const ENTITY: &'static str = "user";
  const TABLE: &'static str = "users";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewUser {
        username:   row.get(1)?,
        first_name: row.get(2)?,
        last_name:  row.get(3)?,
        email:      row.get(4)?,
        is_active:  row.get(5)?,
      },
      audit: audit_cols(row, 6)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for Requester {
  const COLUMNS: &'static str = columns!(
    "salutation",
    "first_name",
    "last_name",
    "organization",
    "email",
    "street",
    "unit",
    "city",
    "state",
    "zipcode",
  );
  const ENTITY: &'static str = "requester";
  const TABLE: &'static str = "requesters";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewRequester {
        salutation:   row.get(1)?,
        first_name:   row.get(2)?,
        last_name:    row.get(3)?,
        organization: row.get(4)?,
        email:        row.get(5)?,
        address:      Address {
          street:  row.get(6)?,
          unit:    row.get(7)?,
          city:    row.get(8)?,
          state:   row.get(9)?,
          zipcode: row.get(10)?,
        },
      },
      audit: audit_cols(row, 11)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for Property {
  const COLUMNS: &'static str = columns!(
    "street",
    "unit",
    "city",
    "state",
    "zipcode",
    "legal_description",
    "subdivision",
    "policy_number",
  );
  const ENTITY: &'static str = "property";
  const TABLE: &'static str = "properties";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewProperty {
        address:           Address {
          street:  row.get(1)?,
          unit:    row.get(2)?,
          city:    row.get(3)?,
          state:   row.get(4)?,
          zipcode: row.get(5)?,
        },
        legal_description: row.get(6)?,
        subdivision:       row.get(7)?,
        policy_number:     row.get(8)?,
      },
      audit: audit_cols(row, 9)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for Determination {
  const COLUMNS: &'static str = columns!("outcome", "description");
  const ENTITY: &'static str = "determination";
  const TABLE: &'static str = "determinations";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewDetermination {
        outcome:     outcome_col(row, 1)?,
        description: row.get(2)?,
      },
      audit: audit_cols(row, 3)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for FieldOffice {
  const COLUMNS: &'static str =
    columns!("field_office_number", "field_office_name", "city", "state");
  const ENTITY: &'static str = "fieldoffice";
  const TABLE: &'static str = "field_offices";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewFieldOffice {
        field_office_number: row.get(1)?,
        field_office_name:   row.get(2)?,
        city:                row.get(3)?,
        state:               row.get(4)?,
      },
      audit: audit_cols(row, 5)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for SystemUnitType {
  const COLUMNS: &'static str = columns!("unit_type");
  const ENTITY: &'static str = "systemunittype";
  const TABLE: &'static str = "system_unit_types";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewSystemUnitType { unit_type: row.get(1)? },
      audit: audit_cols(row, 2)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for SystemUnit {
  const COLUMNS: &'static str = columns!(
    "system_unit_number",
    "system_unit_name",
    "field_office",
    "system_unit_type",
  );
  const ENTITY: &'static str = "systemunit";
  const TABLE: &'static str = "system_units";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewSystemUnit {
        system_unit_number: row.get(1)?,
        system_unit_name:   row.get(2)?,
        field_office:       row.get(3)?,
        system_unit_type:   row.get(4)?,
      },
      audit: audit_cols(row, 5)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for SystemMap {
  const COLUMNS: &'static str = columns!("map_number", "map_title", "map_date", "effective");
  const ENTITY: &'static str = "systemmap";
  const TABLE: &'static str = "system_maps";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      data:      NewSystemMap {
        map_number: row.get(1)?,
        map_title:  row.get(2)?,
        map_date:   date_col(row, 3)?,
      },
      effective: row.get(4)?,
      audit:     audit_cols(row, 5)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for SystemUnitMap {
  const COLUMNS: &'static str = columns!("system_unit", "system_map");
  const ENTITY: &'static str = "systemunitmap";
  const TABLE: &'static str = "system_unit_maps";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewSystemUnitMap {
        system_unit: row.get(1)?,
        system_map:  row.get(2)?,
      },
      audit: audit_cols(row, 3)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for Case {
  const COLUMNS: &'static str = columns!(
    "case_reference",
    "duplicate_of",
    "requester",
    "property",
    "cbrs_unit",
    "map_number",
    "cbrs_map_date",
    "determination",
    "prohibition_date",
    "distance",
    "final_letter_recipient",
    "request_date",
    "fws_fo_received_date",
    "fws_hq_received_date",
    "analyst_signoff_date",
    "qc_reviewer_signoff_date",
    "fws_reviewer_signoff_date",
    "final_letter_date",
    "close_date",
    "analyst",
    "qc_reviewer",
    "fws_reviewer",
    "priority",
    "on_hold",
    "invalid",
    "hard_copy_map_reviewed",
  );
  const ENTITY: &'static str = "case";
  const TABLE: &'static str = "cases";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                     row.get(0)?,
      case_reference:         row.get(1)?,
      duplicate_of:           row.get(2)?,
      requester:              row.get(3)?,
      property:               row.get(4)?,
      cbrs_unit:              row.get(5)?,
      map_number:             row.get(6)?,
      cbrs_map_date:          date_col(row, 7)?,
      determination:          row.get(8)?,
      prohibition_date:       date_col(row, 9)?,
      distance:               row.get(10)?,
      final_letter_recipient: row.get(11)?,
      dates:                  Milestones {
        request_date:              date_col(row, 12)?,
        fws_fo_received_date:      date_col(row, 13)?,
        fws_hq_received_date:      date_col(row, 14)?,
        analyst_signoff_date:      date_col(row, 15)?,
        qc_reviewer_signoff_date:  date_col(row, 16)?,
        fws_reviewer_signoff_date: date_col(row, 17)?,
        final_letter_date:         date_col(row, 18)?,
        close_date:                date_col(row, 19)?,
      },
      reviewers:              Reviewers {
        analyst:      row.get(20)?,
        qc_reviewer:  row.get(21)?,
        fws_reviewer: row.get(22)?,
      },
      flags:                  CaseFlags {
        priority:               row.get(23)?,
        on_hold:                row.get(24)?,
        invalid:                row.get(25)?,
        hard_copy_map_reviewed: row.get(26)?,
      },
      audit:                  audit_cols(row, 27)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for CaseFile {
  const COLUMNS: &'static str = columns!(
    "case_id",
    "name",
    "path",
    "from_requester",
    "final_letter",
    "uploader",
    "uploaded_at",
  );
  const ENTITY: &'static str = "casefile";
  const TABLE: &'static str = "case_files";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      data:        NewCaseFile {
        case:           row.get(1)?,
        name:           row.get(2)?,
        path:           row.get(3)?,
        from_requester: row.get(4)?,
        final_letter:   row.get(5)?,
        uploader:       row.get(6)?,
      },
      uploaded_at: dt_col(row, 7)?,
      audit:       audit_cols(row, 8)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for Tag {
  const COLUMNS: &'static str = columns!("name", "description");
  const ENTITY: &'static str = "tag";
  const TABLE: &'static str = "tags";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewTag { name: row.get(1)?, description: row.get(2)? },
      audit: audit_cols(row, 3)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for CaseTag {
  const COLUMNS: &'static str = columns!("case_id", "tag");
  const ENTITY: &'static str = "casetag";
  const TABLE: &'static str = "case_tags";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewCaseTag { case: row.get(1)?, tag: row.get(2)? },
      audit: audit_cols(row, 3)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

impl Record for Comment {
  const COLUMNS: &'static str = columns!("case_id", "comment");
  const ENTITY: &'static str = "comment";
  const TABLE: &'static str = "comments";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      data:  NewComment { case: row.get(1)?, comment: row.get(2)? },
      audit: audit_cols(row, 3)?,
    })
  }

  fn id(&self) -> i64 { self.id }
}

#[cfg(test)]
mod tests {
  use super::*;

  const AUDIT: &str = "created_at, created_by, modified_at, modified_by";

  #[test]
  fn column_lists_share_the_audit_suffix() {
    assert!(User::COLUMNS.starts_with("id, username"));
    assert!(Case::COLUMNS.ends_with(AUDIT));
    assert_eq!(Case::COLUMNS.split(", ").count(), 31);
    assert_eq!(CaseFile::COLUMNS.split(", ").count(), 12);
  }

  #[test]
  fn dates_encode_as_iso() {
    assert_eq!(
      encode_date(NaiveDate::from_ymd_opt(2024, 2, 1)).as_deref(),
      Some("2024-02-01")
    );
    assert_eq!(encode_date(None), None);
  }
}
