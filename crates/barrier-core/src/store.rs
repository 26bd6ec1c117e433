//! The `CaseStore` trait.
//!
//! The trait is implemented by storage backends (`barrier-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.
//!
//! Every write takes the acting user and stamps the row's
//! [`AuditInfo`](crate::audit::AuditInfo); backends also append an audit-log
//! entry in the same transaction as the write itself.

use std::future::Future;

use crate::{
  audit::Actor,
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
  tag::{CaseTag, Comment, NewCaseTag, NewComment, NewTag, Tag},
};

/// Backend errors must say whether they were caused by a uniqueness or
/// delete-protect violation, which callers report as a conflict.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_conflict(&self) -> bool;
}

/// Abstraction over a case store backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait CaseStore: Send + Sync {
  type Error: StoreError;

  // ── People and places ─────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(&self, id: i64) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Fails with a conflict when an equal requester (after normalisation)
  /// already exists.
  fn create_requester(
    &self,
    input: NewRequester,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Requester, Self::Error>> + Send + '_;

  fn get_requester(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Requester>, Self::Error>> + Send + '_;

  /// Fails with a conflict when an equal property (after normalisation)
  /// already exists.
  fn create_property(
    &self,
    input: NewProperty,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + '_;

  fn get_property(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  // ── Lookup tables ─────────────────────────────────────────────────────

  fn create_determination(
    &self,
    input: NewDetermination,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Determination, Self::Error>> + Send + '_;

  fn get_determination(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Determination>, Self::Error>> + Send + '_;

  fn list_determinations(
    &self,
  ) -> impl Future<Output = Result<Vec<Determination>, Self::Error>> + Send + '_;

  fn create_field_office(
    &self,
    input: NewFieldOffice,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<FieldOffice, Self::Error>> + Send + '_;

  fn list_field_offices(
    &self,
  ) -> impl Future<Output = Result<Vec<FieldOffice>, Self::Error>> + Send + '_;

  fn create_system_unit_type(
    &self,
    input: NewSystemUnitType,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<SystemUnitType, Self::Error>> + Send + '_;

  fn list_system_unit_types(
    &self,
  ) -> impl Future<Output = Result<Vec<SystemUnitType>, Self::Error>> + Send + '_;

  fn create_system_unit(
    &self,
    input: NewSystemUnit,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<SystemUnit, Self::Error>> + Send + '_;

  fn get_system_unit(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<SystemUnit>, Self::Error>> + Send + '_;

  /// Units joined with their field office and unit type, ordered by id.
  fn list_system_units(
    &self,
  ) -> impl Future<Output = Result<Vec<SystemUnitListing>, Self::Error>> + Send + '_;

  /// Insert (`id == None`) or replace a map, then run `cascades` in the same
  /// transaction. The saved map is always effective. Returns `None` when
  /// `id` names no map.
  fn save_system_map(
    &self,
    id: Option<i64>,
    input: NewSystemMap,
    cascades: Vec<Cascade>,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Option<SystemMap>, Self::Error>> + Send + '_;

  fn get_system_map(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<SystemMap>, Self::Error>> + Send + '_;

  fn list_system_maps(&self)
  -> impl Future<Output = Result<Vec<SystemMap>, Self::Error>> + Send + '_;

  fn create_system_unit_map(
    &self,
    input: NewSystemUnitMap,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<SystemUnitMap, Self::Error>> + Send + '_;

  fn list_system_unit_maps(
    &self,
  ) -> impl Future<Output = Result<Vec<SystemUnitMap>, Self::Error>> + Send + '_;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// Insert a case. The reference is left unset; see
  /// [`assign_reference`](Self::assign_reference).
  fn create_case(
    &self,
    input: CaseDraft,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  /// Set the reference of a case that has none. Returns `false` when the
  /// case already had one (or does not exist); the existing value is kept.
  fn assign_reference(
    &self,
    id: i64,
    reference: String,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_case(&self, id: i64) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + '_;

  /// Replace the writable fields of a case. The reference is never touched.
  fn update_case(
    &self,
    id: i64,
    input: CaseDraft,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + '_;

  /// Every case joined with its related rows, ordered by id.
  fn list_cases(&self) -> impl Future<Output = Result<Vec<CaseListing>, Self::Error>> + Send + '_;

  // ── Case files ────────────────────────────────────────────────────────

  fn create_case_file(
    &self,
    input: NewCaseFile,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<CaseFile, Self::Error>> + Send + '_;

  fn get_case_file(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<CaseFile>, Self::Error>> + Send + '_;

  fn list_case_files(
    &self,
    case: Option<i64>,
  ) -> impl Future<Output = Result<Vec<CaseFile>, Self::Error>> + Send + '_;

  // ── Tags and comments ─────────────────────────────────────────────────

  fn create_tag(
    &self,
    input: NewTag,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  fn get_tag(&self, id: i64) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  fn list_tags(&self) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  fn create_case_tag(
    &self,
    input: NewCaseTag,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<CaseTag, Self::Error>> + Send + '_;

  fn list_case_tags(
    &self,
    case: Option<i64>,
  ) -> impl Future<Output = Result<Vec<CaseTag>, Self::Error>> + Send + '_;

  fn create_comment(
    &self,
    input: NewComment,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments newest first.
  fn list_comments(
    &self,
    case: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Deletes ───────────────────────────────────────────────────────────

  /// Run `cascades`, then delete `target`, in one transaction. Returns
  /// `false` (and changes nothing) when the target does not exist.
  fn delete(
    &self,
    target: DeleteTarget,
    cascades: Vec<Cascade>,
    actor: Option<Actor>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
