//! Lookup tables: determinations, field offices, system units and maps.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::audit::AuditInfo;

// ─── Determination ───────────────────────────────────────────────────────────

/// The categorical result of comparing a property to a system unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  /// The property lies entirely inside the unit.
  In,
  /// The property lies entirely outside the unit.
  Out,
  PartiallyInStructureIn,
  PartiallyInStructureOut,
  PartiallyInNoStructure,
}

impl Outcome {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::In => "in",
      Self::Out => "out",
      Self::PartiallyInStructureIn => "partially_in_structure_in",
      Self::PartiallyInStructureOut => "partially_in_structure_out",
      Self::PartiallyInNoStructure => "partially_in_no_structure",
    }
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown determination outcome: {0:?}")]
pub struct UnknownOutcome(pub String);

impl FromStr for Outcome {
  type Err = UnknownOutcome;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "in" => Ok(Self::In),
      "out" => Ok(Self::Out),
      "partially_in_structure_in" => Ok(Self::PartiallyInStructureIn),
      "partially_in_structure_out" => Ok(Self::PartiallyInStructureOut),
      "partially_in_no_structure" => Ok(Self::PartiallyInNoStructure),
      other => Err(UnknownOutcome(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDetermination {
  pub outcome:     Outcome,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Determination {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewDetermination,
  pub audit: AuditInfo,
}

// ─── Field offices and unit types ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFieldOffice {
  pub field_office_number: String,
  pub field_office_name:   String,
  #[serde(default)]
  pub city:                String,
  #[serde(default)]
  pub state:               String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOffice {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewFieldOffice,
  pub audit: AuditInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSystemUnitType {
  pub unit_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUnitType {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewSystemUnitType,
  pub audit: AuditInfo,
}

// ─── System units and maps ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSystemUnit {
  pub system_unit_number: String,
  #[serde(default)]
  pub system_unit_name:   String,
  #[serde(default)]
  pub field_office:       Option<i64>,
  #[serde(default)]
  pub system_unit_type:   Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUnit {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewSystemUnit,
  pub audit: AuditInfo,
}

/// A published boundary map. Among maps sharing a `map_number`, at most one
/// is effective: saving a map retires the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSystemMap {
  pub map_number: String,
  #[serde(default)]
  pub map_title:  String,
  #[serde(default)]
  pub map_date:   Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMap {
  pub id:        i64,
  #[serde(flatten)]
  pub data:      NewSystemMap,
  pub effective: bool,
  pub audit:     AuditInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSystemUnitMap {
  pub system_unit: i64,
  pub system_map:  i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUnitMap {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewSystemUnitMap,
  pub audit: AuditInfo,
}

// ─── Lookup search ───────────────────────────────────────────────────────────

/// A system unit with the names of the records it references, for free-text
/// search over the unit lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUnitListing {
  #[serde(flatten)]
  pub unit:         SystemUnit,
  pub field_office: Option<NewFieldOffice>,
  pub unit_type:    Option<String>,
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(needle)
}

impl SystemUnitListing {
  /// Case-insensitive match on unit number and name, field office number and
  /// name, and unit type.
  pub fn matches_text(&self, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
      return true;
    }
    let data = &self.unit.data;
    contains_folded(&data.system_unit_number, &needle)
      || contains_folded(&data.system_unit_name, &needle)
      || self.field_office.as_ref().is_some_and(|fo| {
        contains_folded(&fo.field_office_number, &needle)
          || contains_folded(&fo.field_office_name, &needle)
      })
      || self
        .unit_type
        .as_deref()
        .is_some_and(|t| contains_folded(t, &needle))
  }
}

impl SystemMap {
  /// Case-insensitive match on map number and title.
  pub fn matches_text(&self, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    needle.is_empty()
      || contains_folded(&self.data.map_number, &needle)
      || contains_folded(&self.data.map_title, &needle)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn outcome_parses_its_own_names() {
    for o in [
      Outcome::In,
      Outcome::Out,
      Outcome::PartiallyInStructureIn,
      Outcome::PartiallyInStructureOut,
      Outcome::PartiallyInNoStructure,
    ] {
      assert_eq!(o.as_str().parse::<Outcome>(), Ok(o));
    }
    assert!("inside".parse::<Outcome>().is_err());
  }

  #[test]
  fn unit_text_search_reaches_field_office() {
    let now = Utc::now();
    let listing = SystemUnitListing {
      unit:         SystemUnit {
        id:    1,
        data:  NewSystemUnit {
          system_unit_number: "NC-01".into(),
          system_unit_name:   "Currituck Banks".into(),
          field_office:       Some(2),
          system_unit_type:   None,
        },
        audit: AuditInfo::created(now, None),
      },
      field_office: Some(NewFieldOffice {
        field_office_number: "41420".into(),
        field_office_name:   "Raleigh".into(),
        city:                String::new(),
        state:               "NC".into(),
      }),
      unit_type:    None,
    };

    assert!(listing.matches_text("currituck"));
    assert!(listing.matches_text("RALEIGH"));
    assert!(!listing.matches_text("otherwise"));
  }
}
