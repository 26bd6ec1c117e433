//! [`SqliteStore`], the SQLite implementation of [`CaseStore`].

use std::{collections::HashMap, path::Path};

use barrier_core::{
  audit::{Actor, AuditAction},
  case::{Case, CaseDraft},
  case_file::{CaseFile, NewCaseFile},
  lifecycle::{Cascade, DeleteTarget},
  lookup::{
    Determination, FieldOffice, NewDetermination, NewFieldOffice, NewSystemMap, NewSystemUnit,
    NewSystemUnitMap, NewSystemUnitType, SystemMap, SystemUnit, SystemUnitListing, SystemUnitMap,
    SystemUnitType,
  },
  party::{NewProperty, NewRequester, NewUser, Property, Requester, User},
  query::CaseListing,
  store::CaseStore,
  tag::{CaseTag, Comment, NewCaseTag, NewComment, NewTag, Tag},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, Transaction, params};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  encode::{Record, decode_dt, encode_date, encode_dt, to_json},
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn fetch<T: Record>(conn: &Connection, id: i64) -> rusqlite::Result<Option<T>> {
  let sql = format!("SELECT {} FROM {} WHERE id = ?1", T::COLUMNS, T::TABLE);
  conn.query_row(&sql, [id], T::from_row).optional()
}

/// Rows of `T` matching `clause` (a `WHERE`/`ORDER BY` tail).
fn fetch_where<T: Record>(
  conn: &Connection,
  clause: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<T>> {
  let sql = format!("SELECT {} FROM {} {clause}", T::COLUMNS, T::TABLE);
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params, T::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn fetch_all<T: Record>(conn: &Connection) -> rusqlite::Result<Vec<T>> {
  fetch_where(conn, "ORDER BY id", [])
}

fn record_audit<T: Record>(
  conn: &Connection,
  row: &T,
  action: AuditAction,
  actor: Option<&str>,
  at: &str,
) -> tokio_rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO audit_log (entity, entity_id, action, actor, recorded_at, snapshot)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![T::ENTITY, row.id(), action.as_str(), actor, at, to_json(row)?],
  )?;
  Ok(())
}

/// Run an `INSERT`, read the new row back and log it.
fn insert<T: Record>(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
  actor: Option<&str>,
  at: &str,
) -> tokio_rusqlite::Result<T> {
  conn.execute(sql, params)?;
  let saved = fetch::<T>(conn, conn.last_insert_rowid())?
    .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
  record_audit(conn, &saved, AuditAction::Create, actor, at)?;
  Ok(saved)
}

/// Run an `UPDATE` against row `id`. Returns the updated row, or `None` if
/// the statement touched nothing.
fn update<T: Record>(
  conn: &Connection,
  id: i64,
  sql: &str,
  params: impl rusqlite::Params,
  actor: Option<&str>,
  at: &str,
) -> tokio_rusqlite::Result<Option<T>> {
  if conn.execute(sql, params)? == 0 {
    return Ok(None);
  }
  let saved = fetch::<T>(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
  record_audit(conn, &saved, AuditAction::Update, actor, at)?;
  Ok(Some(saved))
}

/// Delete row `id` of `T`, logging its last state.
fn delete_row<T: Record>(
  conn: &Connection,
  id: i64,
  actor: Option<&str>,
  at: &str,
) -> tokio_rusqlite::Result<bool> {
  let Some(row) = fetch::<T>(conn, id)? else {
    return Ok(false);
  };
  conn.execute(&format!("DELETE FROM {} WHERE id = ?1", T::TABLE), [id])?;
  record_audit(conn, &row, AuditAction::Delete, actor, at)?;
  Ok(true)
}

/// Delete every row of `T` whose `column` equals `value`.
fn delete_matching<T: Record>(
  conn: &Connection,
  column: &str,
  value: i64,
  actor: Option<&str>,
  at: &str,
) -> tokio_rusqlite::Result<usize> {
  let rows: Vec<T> = fetch_where(conn, &format!("WHERE {column} = ?1"), [value])?;
  for row in &rows {
    delete_row::<T>(conn, row.id(), actor, at)?;
  }
  Ok(rows.len())
}

/// Execute one cascade. `subject` is the id of the row that triggered it.
fn apply_cascade(
  tx: &Transaction<'_>,
  cascade: &Cascade,
  subject: i64,
  actor: Option<&str>,
  at: &str,
) -> tokio_rusqlite::Result<()> {
  match cascade {
    Cascade::CaseTagsOfTag { tag } => {
      delete_matching::<CaseTag>(tx, "tag", *tag, actor, at)?;
    }
    Cascade::UnitMapsOfUnit { system_unit } => {
      delete_matching::<SystemUnitMap>(tx, "system_unit", *system_unit, actor, at)?;
    }
    Cascade::UnitMapsOfMap { system_map } => {
      delete_matching::<SystemUnitMap>(tx, "system_map", *system_map, actor, at)?;
    }
    Cascade::RetireSiblingMaps { map_number } => {
      let siblings: Vec<SystemMap> = fetch_where(
        tx,
        "WHERE map_number = ?1 AND id != ?2 AND effective = 1",
        params![map_number, subject],
      )?;
      for sibling in siblings {
        update::<SystemMap>(
          tx,
          sibling.id,
          "UPDATE system_maps SET effective = 0, modified_at = ?2, modified_by = ?3
           WHERE id = ?1",
          params![sibling.id, at, actor],
          actor,
          at,
        )?;
      }
    }
  }
  Ok(())
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

/// One row of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub entity:      String,
  pub entity_id:   i64,
  pub action:      String,
  pub actor:       Option<String>,
  pub recorded_at: DateTime<Utc>,
  pub snapshot:    serde_json::Value,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A case store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and all
/// access is serialised through its worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read-only access on the worker thread.
  async fn read<R, F>(&self, f: F) -> Result<R>
  where
    R: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<R> + Send + 'static,
  {
    Ok(self.conn.call(move |conn| Ok(f(conn)?)).await?)
  }

  /// Run `f` inside one transaction, passing the actor name and a shared
  /// timestamp for every row it touches.
  async fn write<R, F>(&self, actor: Option<Actor>, f: F) -> Result<R>
  where
    R: Send + 'static,
    F: FnOnce(&Transaction<'_>, Option<&str>, &str) -> tokio_rusqlite::Result<R>
      + Send
      + 'static,
  {
    let at = encode_dt(Utc::now());
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx, actor.as_ref().map(Actor::as_str), &at)?;
        tx.commit()?;
        Ok(out)
      })
      .await?;
    Ok(out)
  }

  async fn get<T: Record>(&self, id: i64) -> Result<Option<T>> {
    self.read(move |conn| fetch::<T>(conn, id)).await
  }

  async fn all<T: Record>(&self) -> Result<Vec<T>> { self.read(fetch_all::<T>).await }

  /// The audit history of one row, oldest first.
  pub async fn audit_trail(&self, entity: &str, id: i64) -> Result<Vec<AuditEntry>> {
    let entity = entity.to_owned();
    let raws: Vec<(String, i64, String, Option<String>, String, String)> = self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entity, entity_id, action, actor, recorded_at, snapshot
           FROM audit_log WHERE entity = ?1 AND entity_id = ?2 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(params![entity, id], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(entity, entity_id, action, actor, at, snapshot)| {
        Ok(AuditEntry {
          entity,
          entity_id,
          action,
          actor,
          recorded_at: decode_dt(&at)?,
          snapshot: serde_json::from_str(&snapshot)?,
        })
      })
      .collect()
  }
}

/// Case columns written on insert and update, in `?1..?26` order.
const CASE_WRITE_COLUMNS: [&str; 25] = [
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
];

/// Bind values for [`CASE_WRITE_COLUMNS`].
fn case_values(d: &CaseDraft) -> Vec<Box<dyn rusqlite::ToSql + Send>> {
  let m = &d.dates;
  vec![
    Box::new(d.duplicate_of),
    Box::new(d.requester),
    Box::new(d.property),
    Box::new(d.cbrs_unit),
    Box::new(d.map_number),
    Box::new(encode_date(d.cbrs_map_date)),
    Box::new(d.determination),
    Box::new(encode_date(d.prohibition_date)),
    Box::new(d.distance),
    Box::new(d.final_letter_recipient.clone()),
    Box::new(encode_date(m.request_date)),
    Box::new(encode_date(m.fws_fo_received_date)),
    Box::new(encode_date(m.fws_hq_received_date)),
    Box::new(encode_date(m.analyst_signoff_date)),
    Box::new(encode_date(m.qc_reviewer_signoff_date)),
    Box::new(encode_date(m.fws_reviewer_signoff_date)),
    Box::new(encode_date(m.final_letter_date)),
    Box::new(encode_date(m.close_date)),
    Box::new(d.reviewers.analyst),
    Box::new(d.reviewers.qc_reviewer),
    Box::new(d.reviewers.fws_reviewer),
    Box::new(d.flags.priority),
    Box::new(d.flags.on_hold),
    Box::new(d.flags.invalid),
    Box::new(d.flags.hard_copy_map_reviewed),
  ]
}

fn bind(values: &[Box<dyn rusqlite::ToSql + Send>]) -> Vec<&dyn rusqlite::ToSql> {
  values.iter().map(|v| v.as_ref() as &dyn rusqlite::ToSql).collect()
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = crate::Error;

  // ── People and places ─────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser, actor: Option<Actor>) -> Result<User> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO users (username, first_name, last_name, email, is_active,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?6, ?7)",
          params![
            input.username.trim(),
            input.first_name,
            input.last_name,
            input.email,
            input.is_active,
            at,
            actor
          ],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> { self.get(id).await }

  async fn list_users(&self) -> Result<Vec<User>> { self.all().await }

  async fn create_requester(
    &self,
    input: NewRequester,
    actor: Option<Actor>,
  ) -> Result<Requester> {
    let key = input.natural_key();
    self
      .write(actor, move |tx, actor, at| {
        let a = &input.address;
        insert(
          tx,
          "INSERT INTO requesters (salutation, first_name, last_name, organization, email,
             street, unit, city, state, zipcode, natural_key,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?12, ?13)",
          params![
            input.salutation,
            input.first_name,
            input.last_name,
            input.organization,
            input.email,
            a.street,
            a.unit,
            a.city,
            a.state,
            a.zipcode,
            key,
            at,
            actor
          ],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_requester(&self, id: i64) -> Result<Option<Requester>> { self.get(id).await }

  async fn create_property(&self, input: NewProperty, actor: Option<Actor>) -> Result<Property> {
    let key = input.natural_key();
    self
      .write(actor, move |tx, actor, at| {
        let a = &input.address;
        insert(
          tx,
          "INSERT INTO properties (street, unit, city, state, zipcode,
             legal_description, subdivision, policy_number, natural_key,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?10, ?11)",
          params![
            a.street,
            a.unit,
            a.city,
            a.state,
            a.zipcode,
            input.legal_description,
            input.subdivision,
            input.policy_number,
            key,
            at,
            actor
          ],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_property(&self, id: i64) -> Result<Option<Property>> { self.get(id).await }

  // ── Lookup tables ─────────────────────────────────────────────────────────

  async fn create_determination(
    &self,
    input: NewDetermination,
    actor: Option<Actor>,
  ) -> Result<Determination> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO determinations (outcome, description,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
          params![input.outcome.as_str(), input.description, at, actor],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_determination(&self, id: i64) -> Result<Option<Determination>> {
    self.get(id).await
  }

  async fn list_determinations(&self) -> Result<Vec<Determination>> { self.all().await }

  async fn create_field_office(
    &self,
    input: NewFieldOffice,
    actor: Option<Actor>,
  ) -> Result<FieldOffice> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO field_offices (field_office_number, field_office_name, city, state,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, ?6)",
          params![
            input.field_office_number,
            input.field_office_name,
            input.city,
            input.state,
            at,
            actor
          ],
          actor,
          at,
        )
      })
      .await
  }

  async fn list_field_offices(&self) -> Result<Vec<FieldOffice>> { self.all().await }

  async fn create_system_unit_type(
    &self,
    input: NewSystemUnitType,
    actor: Option<Actor>,
  ) -> Result<SystemUnitType> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO system_unit_types (unit_type,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?2, ?3)",
          params![input.unit_type, at, actor],
          actor,
          at,
        )
      })
      .await
  }

  async fn list_system_unit_types(&self) -> Result<Vec<SystemUnitType>> { self.all().await }

  async fn create_system_unit(
    &self,
    input: NewSystemUnit,
    actor: Option<Actor>,
  ) -> Result<SystemUnit> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO system_units (system_unit_number, system_unit_name, field_office,
             system_unit_type, created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, ?6)",
          params![
            input.system_unit_number,
            input.system_unit_name,
            input.field_office,
            input.system_unit_type,
            at,
            actor
          ],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_system_unit(&self, id: i64) -> Result<Option<SystemUnit>> { self.get(id).await }

  async fn list_system_units(&self) -> Result<Vec<SystemUnitListing>> {
    self
      .read(|conn| {
        let offices: HashMap<i64, FieldOffice> = fetch_all::<FieldOffice>(conn)?
          .into_iter()
          .map(|fo| (fo.id, fo))
          .collect();
        let types: HashMap<i64, SystemUnitType> = fetch_all::<SystemUnitType>(conn)?
          .into_iter()
          .map(|t| (t.id, t))
          .collect();

        let units = fetch_all::<SystemUnit>(conn)?
          .into_iter()
          .map(|unit| SystemUnitListing {
            field_office: unit
              .data
              .field_office
              .and_then(|id| offices.get(&id))
              .map(|fo| fo.data.clone()),
            unit_type: unit
              .data
              .system_unit_type
              .and_then(|id| types.get(&id))
              .map(|t| t.data.unit_type.clone()),
            unit,
          })
          .collect();
        Ok(units)
      })
      .await
  }

  async fn save_system_map(
    &self,
    id: Option<i64>,
    input: NewSystemMap,
    cascades: Vec<Cascade>,
    actor: Option<Actor>,
  ) -> Result<Option<SystemMap>> {
    self
      .write(actor, move |tx, actor, at| {
        let map_date = encode_date(input.map_date);
        let saved = match id {
          None => Some(insert::<SystemMap>(
            tx,
            "INSERT INTO system_maps (map_number, map_title, map_date, effective,
               created_at, created_by, modified_at, modified_by)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?4, ?5)",
            params![input.map_number, input.map_title, map_date, at, actor],
            actor,
            at,
          )?),
          Some(id) => update::<SystemMap>(
            tx,
            id,
            "UPDATE system_maps
             SET map_number = ?2, map_title = ?3, map_date = ?4, effective = 1,
                 modified_at = ?5, modified_by = ?6
             WHERE id = ?1",
            params![id, input.map_number, input.map_title, map_date, at, actor],
            actor,
            at,
          )?,
        };
        let Some(saved) = saved else { return Ok(None) };
        for cascade in &cascades {
          apply_cascade(tx, cascade, saved.id, actor, at)?;
        }
        Ok(Some(saved))
      })
      .await
  }

  async fn get_system_map(&self, id: i64) -> Result<Option<SystemMap>> { self.get(id).await }

  async fn list_system_maps(&self) -> Result<Vec<SystemMap>> { self.all().await }

  async fn create_system_unit_map(
    &self,
    input: NewSystemUnitMap,
    actor: Option<Actor>,
  ) -> Result<SystemUnitMap> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO system_unit_maps (system_unit, system_map,
             created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
          params![input.system_unit, input.system_map, at, actor],
          actor,
          at,
        )
      })
      .await
  }

  async fn list_system_unit_maps(&self) -> Result<Vec<SystemUnitMap>> { self.all().await }

  // ── Cases ─────────────────────────────────────────────────────────────────

  async fn create_case(&self, input: CaseDraft, actor: Option<Actor>) -> Result<Case> {
    self
      .write(actor, move |tx, actor, at| {
        let placeholders: Vec<String> =
          (1..=CASE_WRITE_COLUMNS.len()).map(|i| format!("?{i}")).collect();
        let n = CASE_WRITE_COLUMNS.len();
        let sql = format!(
          "INSERT INTO cases ({}, created_at, created_by, modified_at, modified_by)
           VALUES ({}, ?{a}, ?{b}, ?{a}, ?{b})",
          CASE_WRITE_COLUMNS.join(", "),
          placeholders.join(", "),
          a = n + 1,
          b = n + 2,
        );
        let mut values = case_values(&input);
        values.push(Box::new(at.to_owned()));
        values.push(Box::new(actor.map(str::to_owned)));
        insert(tx, &sql, bind(&values).as_slice(), actor, at)
      })
      .await
  }

  async fn assign_reference(
    &self,
    id: i64,
    reference: String,
    actor: Option<Actor>,
  ) -> Result<bool> {
    self
      .write(actor, move |tx, actor, at| {
        let updated = update::<Case>(
          tx,
          id,
          "UPDATE cases SET case_reference = ?2, modified_at = ?3, modified_by = ?4
           WHERE id = ?1 AND case_reference IS NULL",
          params![id, reference, at, actor],
          actor,
          at,
        )?;
        Ok(updated.is_some())
      })
      .await
  }

  async fn get_case(&self, id: i64) -> Result<Option<Case>> { self.get(id).await }

  async fn update_case(
    &self,
    id: i64,
    input: CaseDraft,
    actor: Option<Actor>,
  ) -> Result<Option<Case>> {
    self
      .write(actor, move |tx, actor, at| {
        let n = CASE_WRITE_COLUMNS.len();
        let assignments: Vec<String> = CASE_WRITE_COLUMNS
          .iter()
          .enumerate()
          .map(|(i, col)| format!("{col} = ?{}", i + 1))
          .collect();
        let sql = format!(
          "UPDATE cases SET {}, modified_at = ?{}, modified_by = ?{} WHERE id = ?{}",
          assignments.join(", "),
          n + 1,
          n + 2,
          n + 3,
        );
        let mut values = case_values(&input);
        values.push(Box::new(at.to_owned()));
        values.push(Box::new(actor.map(str::to_owned)));
        values.push(Box::new(id));
        update(tx, id, &sql, bind(&values).as_slice(), actor, at)
      })
      .await
  }

  async fn list_cases(&self) -> Result<Vec<CaseListing>> {
    self
      .read(|conn| {
        let properties: HashMap<i64, Property> =
          fetch_all::<Property>(conn)?.into_iter().map(|p| (p.id, p)).collect();
        let users: HashMap<i64, User> =
          fetch_all::<User>(conn)?.into_iter().map(|u| (u.id, u)).collect();
        let units: HashMap<i64, String> = fetch_all::<SystemUnit>(conn)?
          .into_iter()
          .map(|u| (u.id, u.data.system_unit_name))
          .collect();
        let mut tags: HashMap<i64, Vec<i64>> = HashMap::new();
        for link in fetch_all::<CaseTag>(conn)? {
          tags.entry(link.data.case).or_default().push(link.data.tag);
        }

        let mut listings = Vec::new();
        for case in fetch_all::<Case>(conn)? {
          // `property` is NOT NULL with a foreign key, so the lookup holds.
          let Some(property) = properties.get(&case.property).cloned() else {
            continue;
          };
          let user = |id: Option<i64>| id.and_then(|id| users.get(&id)).cloned();
          listings.push(CaseListing {
            analyst: user(case.reviewers.analyst),
            qc_reviewer: user(case.reviewers.qc_reviewer),
            unit_name: case.cbrs_unit.and_then(|id| units.get(&id)).cloned(),
            tags: tags.remove(&case.id).unwrap_or_default(),
            property,
            case,
          });
        }
        Ok(listings)
      })
      .await
  }

  // ── Case files ────────────────────────────────────────────────────────────

  async fn create_case_file(&self, input: NewCaseFile, actor: Option<Actor>) -> Result<CaseFile> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO case_files (case_id, name, path, from_requester, final_letter,
             uploader, uploaded_at, created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?7, ?8)",
          params![
            input.case,
            input.name,
            input.path,
            input.from_requester,
            input.final_letter,
            input.uploader,
            at,
            actor
          ],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_case_file(&self, id: i64) -> Result<Option<CaseFile>> { self.get(id).await }

  async fn list_case_files(&self, case: Option<i64>) -> Result<Vec<CaseFile>> {
    self
      .read(move |conn| match case {
        Some(case) => fetch_where(conn, "WHERE case_id = ?1 ORDER BY id", [case]),
        None => fetch_all(conn),
      })
      .await
  }

  // ── Tags and comments ─────────────────────────────────────────────────────

  async fn create_tag(&self, input: NewTag, actor: Option<Actor>) -> Result<Tag> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO tags (name, description, created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
          params![input.name.trim(), input.description, at, actor],
          actor,
          at,
        )
      })
      .await
  }

  async fn get_tag(&self, id: i64) -> Result<Option<Tag>> { self.get(id).await }

  async fn list_tags(&self) -> Result<Vec<Tag>> { self.all().await }

  async fn create_case_tag(&self, input: NewCaseTag, actor: Option<Actor>) -> Result<CaseTag> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO case_tags (case_id, tag, created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
          params![input.case, input.tag, at, actor],
          actor,
          at,
        )
      })
      .await
  }

  async fn list_case_tags(&self, case: Option<i64>) -> Result<Vec<CaseTag>> {
    self
      .read(move |conn| match case {
        Some(case) => fetch_where(conn, "WHERE case_id = ?1 ORDER BY id", [case]),
        None => fetch_all(conn),
      })
      .await
  }

  async fn create_comment(&self, input: NewComment, actor: Option<Actor>) -> Result<Comment> {
    self
      .write(actor, move |tx, actor, at| {
        insert(
          tx,
          "INSERT INTO comments (case_id, comment, created_at, created_by, modified_at, modified_by)
           VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
          params![input.case, input.comment, at, actor],
          actor,
          at,
        )
      })
      .await
  }

  async fn list_comments(&self, case: Option<i64>) -> Result<Vec<Comment>> {
    self
      .read(move |conn| match case {
        Some(case) => fetch_where(
          conn,
          "WHERE case_id = ?1 ORDER BY created_at DESC, id DESC",
          [case],
        ),
        None => fetch_where(conn, "ORDER BY created_at DESC, id DESC", []),
      })
      .await
  }

  // ── Deletes ───────────────────────────────────────────────────────────────

  async fn delete(
    &self,
    target: DeleteTarget,
    cascades: Vec<Cascade>,
    actor: Option<Actor>,
  ) -> Result<bool> {
    self
      .write(actor, move |tx, actor, at| {
        let id = target.id();
        let exists: bool = {
          let table = match target {
            DeleteTarget::CaseFile(_) => CaseFile::TABLE,
            DeleteTarget::Tag(_) => Tag::TABLE,
            DeleteTarget::CaseTag(_) => CaseTag::TABLE,
            DeleteTarget::Comment(_) => Comment::TABLE,
            DeleteTarget::SystemUnit(_) => SystemUnit::TABLE,
            DeleteTarget::SystemMap(_) => SystemMap::TABLE,
            DeleteTarget::SystemUnitMap(_) => SystemUnitMap::TABLE,
          };
          tx.query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1"), [id], |_| Ok(()))
            .optional()?
            .is_some()
        };
        if !exists {
          return Ok(false);
        }

        for cascade in &cascades {
          apply_cascade(tx, cascade, id, actor, at)?;
        }

        match target {
          DeleteTarget::CaseFile(id) => delete_row::<CaseFile>(tx, id, actor, at),
          DeleteTarget::Tag(id) => delete_row::<Tag>(tx, id, actor, at),
          DeleteTarget::CaseTag(id) => delete_row::<CaseTag>(tx, id, actor, at),
          DeleteTarget::Comment(id) => delete_row::<Comment>(tx, id, actor, at),
          DeleteTarget::SystemUnit(id) => delete_row::<SystemUnit>(tx, id, actor, at),
          DeleteTarget::SystemMap(id) => delete_row::<SystemMap>(tx, id, actor, at),
          DeleteTarget::SystemUnitMap(id) => delete_row::<SystemUnitMap>(tx, id, actor, at),
        }
      })
      .await
  }
}
