//! People and places: requesters, properties and staff users.

use serde::{Deserialize, Serialize};

use crate::audit::AuditInfo;

// ─── Address ─────────────────────────────────────────────────────────────────

/// A postal address shared by properties and requesters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  #[serde(default)]
  pub street:  String,
  #[serde(default)]
  pub unit:    String,
  #[serde(default)]
  pub city:    String,
  #[serde(default)]
  pub state:   String,
  #[serde(default)]
  pub zipcode: String,
}

impl Address {
  fn key_parts(&self) -> [&str; 5] {
    [
      self.street.as_str(),
      self.unit.as_str(),
      self.city.as_str(),
      self.state.as_str(),
      self.zipcode.as_str(),
    ]
  }
}

/// Trim and case-fold one component of a uniqueness tuple.
pub fn normalize(value: &str) -> String {
  value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Join normalised components into a single comparable key.
fn natural_key<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
  parts
    .into_iter()
    .map(normalize)
    .collect::<Vec<_>>()
    .join("\u{1f}")
}

// ─── Property ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProperty {
  #[serde(flatten)]
  pub address:           Address,
  #[serde(default)]
  pub legal_description: String,
  #[serde(default)]
  pub subdivision:       String,
  #[serde(default)]
  pub policy_number:     String,
}

impl NewProperty {
  /// Two properties with the same key are the same property.
  pub fn natural_key(&self) -> String {
    let [street, unit, city, state, zipcode] = self.address.key_parts();
    natural_key([
      street,
      unit,
      city,
      state,
      zipcode,
      self.legal_description.as_str(),
    ])
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewProperty,
  pub audit: AuditInfo,
}

// ─── Requester ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequester {
  #[serde(default)]
  pub salutation:   String,
  #[serde(default)]
  pub first_name:   String,
  #[serde(default)]
  pub last_name:    String,
  #[serde(default)]
  pub organization: String,
  #[serde(default)]
  pub email:        String,
  #[serde(flatten)]
  pub address:      Address,
}

impl NewRequester {
  pub fn natural_key(&self) -> String {
    let [street, unit, city, state, zipcode] = self.address.key_parts();
    natural_key([
      self.salutation.as_str(),
      self.first_name.as_str(),
      self.last_name.as_str(),
      self.organization.as_str(),
      self.email.as_str(),
      street,
      unit,
      city,
      state,
      zipcode,
    ])
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewRequester,
  pub audit: AuditInfo,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A staff account that can hold one of the reviewer roles on a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
  pub username:   String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default)]
  pub email:      String,
  #[serde(default = "default_active")]
  pub is_active:  bool,
}

fn default_active() -> bool { true }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewUser,
  pub audit: AuditInfo,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn property(street: &str, legal: &str) -> NewProperty {
    NewProperty {
      address:           Address {
        street:  street.into(),
        unit:    String::new(),
        city:    "Duck".into(),
        state:   "NC".into(),
        zipcode: "27949".into(),
      },
      legal_description: legal.into(),
      subdivision:       "Sanderling".into(),
      policy_number:     "P-1".into(),
    }
  }

  #[test]
  fn property_key_ignores_case_and_spacing() {
    let a = property("12 Ocean  Trail ", "Lot 4");
    let b = property("12 ocean trail", "LOT 4");
    assert_eq!(a.natural_key(), b.natural_key());
  }

  #[test]
  fn property_key_includes_legal_description() {
    let a = property("12 Ocean Trail", "Lot 4");
    let b = property("12 Ocean Trail", "Lot 5");
    assert_ne!(a.natural_key(), b.natural_key());
  }

  #[test]
  fn property_key_excludes_policy_number() {
    let a = property("12 Ocean Trail", "Lot 4");
    let mut b = a.clone();
    b.policy_number = "P-2".into();
    assert_eq!(a.natural_key(), b.natural_key());
  }

  #[test]
  fn requester_key_distinguishes_email() {
    let a = NewRequester {
      salutation:   "Ms.".into(),
      first_name:   "Ada".into(),
      last_name:    "Lee".into(),
      organization: String::new(),
      email:        "ada@example.com".into(),
      address:      Address::default(),
    };
    let mut b = a.clone();
    b.email = "ADA@example.com ".into();
    assert_eq!(a.natural_key(), b.natural_key());
    b.email = "lee@example.com".into();
    assert_ne!(a.natural_key(), b.natural_key());
  }
}
