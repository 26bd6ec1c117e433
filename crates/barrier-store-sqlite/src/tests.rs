//! Integration tests for `SqliteStore` against an in-memory database.

use barrier_core::{
  audit::Actor,
  case::CaseDraft,
  case_file::NewCaseFile,
  lifecycle::{DeleteTarget, deletion_cascades, system_map_saved},
  lookup::{
    NewDetermination, NewFieldOffice, NewSystemMap, NewSystemUnit, NewSystemUnitMap,
    NewSystemUnitType, Outcome,
  },
  party::{Address, NewProperty, NewRequester, NewUser},
  status::CaseStatus,
  store::{CaseStore, StoreError},
  tag::{NewCaseTag, NewComment, NewTag},
};
use chrono::NaiveDate;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn analyst() -> Option<Actor> { Some(Actor::new("analyst1")) }

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn requester(last_name: &str) -> NewRequester {
  NewRequester {
    salutation:   "Ms.".into(),
    first_name:   "Dana".into(),
    last_name:    last_name.into(),
    organization: String::new(),
    email:        "dana@example.com".into(),
    address:      Address {
      street:  "1 Shore Rd".into(),
      city:    "Nags Head".into(),
      state:   "NC".into(),
      zipcode: "27959".into(),
      ..Default::default()
    },
  }
}

fn property(street: &str) -> NewProperty {
  NewProperty {
    address:           Address {
      street: street.into(),
      city: "Kill Devil Hills".into(),
      state: "NC".into(),
      ..Default::default()
    },
    legal_description: "Lot 4".into(),
    subdivision:       String::new(),
    policy_number:     "POL-1".into(),
  }
}

fn user(username: &str) -> NewUser {
  NewUser {
    username:   username.into(),
    first_name: String::new(),
    last_name:  String::new(),
    email:      format!("{username}@example.com"),
    is_active:  true,
  }
}

/// A requester, a property and a case linking them.
async fn seed_case(s: &SqliteStore) -> barrier_core::case::Case {
  let r = s.create_requester(requester("Hale"), None).await.unwrap();
  let p = s.create_property(property("9 Dune St"), None).await.unwrap();
  let mut draft = CaseDraft::new(r.id, p.id);
  draft.dates.request_date = Some(date(2024, 3, 1));
  s.create_case(draft, analyst()).await.unwrap()
}

// ─── People and places ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_requester() {
  let s = store().await;
  let created = s.create_requester(requester("Hale"), analyst()).await.unwrap();
  assert_eq!(created.audit.created_by.as_deref(), Some("analyst1"));
  assert_eq!(created.audit.created_at, created.audit.modified_at);

  let fetched = s.get_requester(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.data.address.city, "Nags Head");
}

#[tokio::test]
async fn get_missing_row_returns_none() {
  let s = store().await;
  assert!(s.get_requester(99).await.unwrap().is_none());
  assert!(s.get_case(99).await.unwrap().is_none());
  assert!(s.get_tag(99).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_requester_is_conflict() {
  let s = store().await;
  s.create_requester(requester("Hale"), None).await.unwrap();

  let mut again = requester("  HALE ");
  again.first_name = "dana".into();
  let err = s.create_requester(again, None).await.unwrap_err();
  assert!(err.is_conflict());

  s.create_requester(requester("Other"), None).await.unwrap();
}

#[tokio::test]
async fn duplicate_property_is_conflict() {
  let s = store().await;
  s.create_property(property("9 Dune St"), None).await.unwrap();
  let err = s.create_property(property("9  dune st"), None).await.unwrap_err();
  assert!(err.is_conflict());
}

#[tokio::test]
async fn users_are_listed_in_id_order() {
  let s = store().await;
  s.create_user(user("bravo"), None).await.unwrap();
  s.create_user(user("alpha"), None).await.unwrap();
  let names: Vec<_> = s
    .list_users()
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.data.username)
    .collect();
  assert_eq!(names, ["bravo", "alpha"]);
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn determination_outcome_roundtrip() {
  let s = store().await;
  let d = s
    .create_determination(
      NewDetermination {
        outcome:     Outcome::PartiallyInStructureOut,
        description: "Partially in, structure out".into(),
      },
      None,
    )
    .await
    .unwrap();
  let fetched = s.get_determination(d.id).await.unwrap().unwrap();
  assert_eq!(fetched.data.outcome, Outcome::PartiallyInStructureOut);
}

#[tokio::test]
async fn system_unit_listing_joins_office_and_type() {
  let s = store().await;
  let fo = s
    .create_field_office(
      NewFieldOffice {
        field_office_number: "FO-12".into(),
        field_office_name:   "Raleigh".into(),
        city:                "Raleigh".into(),
        state:               "NC".into(),
      },
      None,
    )
    .await
    .unwrap();
  let ty = s
    .create_system_unit_type(NewSystemUnitType { unit_type: "OPA".into() }, None)
    .await
    .unwrap();
  s.create_system_unit(
    NewSystemUnit {
      system_unit_number: "NC-01P".into(),
      system_unit_name:   "Roanoke Island".into(),
      field_office:       Some(fo.id),
      system_unit_type:   Some(ty.id),
    },
    None,
  )
  .await
  .unwrap();

  let units = s.list_system_units().await.unwrap();
  assert_eq!(units.len(), 1);
  assert_eq!(units[0].unit_type.as_deref(), Some("OPA"));
  assert_eq!(
    units[0].field_office.as_ref().map(|f| f.field_office_name.as_str()),
    Some("Raleigh")
  );
}

// ─── Maps ────────────────────────────────────────────────────────────────────

fn map(number: &str, day: u32) -> NewSystemMap {
  NewSystemMap {
    map_number: number.into(),
    map_title:  format!("Map {number}"),
    map_date:   Some(date(2020, 1, day)),
  }
}

#[tokio::test]
async fn saving_map_retires_same_numbered_siblings() {
  let s = store().await;
  let first = map("NC-01", 1);
  let cascades = system_map_saved(&first);
  let old = s.save_system_map(None, first, cascades, None).await.unwrap().unwrap();
  assert!(old.effective);

  let other = map("NC-02", 1);
  let cascades = system_map_saved(&other);
  let unrelated = s.save_system_map(None, other, cascades, None).await.unwrap().unwrap();

  let second = map("NC-01", 2);
  let cascades = system_map_saved(&second);
  let new = s.save_system_map(None, second, cascades, None).await.unwrap().unwrap();
  assert!(new.effective);

  assert!(!s.get_system_map(old.id).await.unwrap().unwrap().effective);
  assert!(s.get_system_map(unrelated.id).await.unwrap().unwrap().effective);

  // Re-saving the old map makes it effective again and retires the newer one.
  let resave = map("NC-01", 1);
  let cascades = system_map_saved(&resave);
  let old = s.save_system_map(Some(old.id), resave, cascades, None).await.unwrap().unwrap();
  assert!(old.effective);
  assert!(!s.get_system_map(new.id).await.unwrap().unwrap().effective);
}

#[tokio::test]
async fn updating_missing_map_returns_none() {
  let s = store().await;
  let m = map("NC-09", 1);
  let cascades = system_map_saved(&m);
  assert!(s.save_system_map(Some(404), m, cascades, None).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_unit_removes_its_unit_maps() {
  let s = store().await;
  let unit = s
    .create_system_unit(
      NewSystemUnit {
        system_unit_number: "NC-03".into(),
        system_unit_name:   "Hatteras".into(),
        field_office:       None,
        system_unit_type:   None,
      },
      None,
    )
    .await
    .unwrap();
  let m = s.save_system_map(None, map("NC-03", 1), Vec::new(), None).await.unwrap().unwrap();
  s.create_system_unit_map(NewSystemUnitMap { system_unit: unit.id, system_map: m.id }, None)
    .await
    .unwrap();

  let target = DeleteTarget::SystemUnit(unit.id);
  assert!(s.delete(target, deletion_cascades(target), None).await.unwrap());
  assert!(s.list_system_unit_maps().await.unwrap().is_empty());
  assert!(s.get_system_unit(unit.id).await.unwrap().is_none());
  assert!(s.get_system_map(m.id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_unit_in_use_by_case_is_refused() {
  let s = store().await;
  let unit = s
    .create_system_unit(
      NewSystemUnit {
        system_unit_number: "NC-04".into(),
        system_unit_name:   "Ocracoke".into(),
        field_office:       None,
        system_unit_type:   None,
      },
      None,
    )
    .await
    .unwrap();
  let m = s.save_system_map(None, map("NC-04", 1), Vec::new(), None).await.unwrap().unwrap();
  s.create_system_unit_map(NewSystemUnitMap { system_unit: unit.id, system_map: m.id }, None)
    .await
    .unwrap();

  let case = seed_case(&s).await;
  let mut draft = CaseDraft::from(&case);
  draft.cbrs_unit = Some(unit.id);
  s.update_case(case.id, draft, None).await.unwrap().unwrap();

  let target = DeleteTarget::SystemUnit(unit.id);
  let err = s.delete(target, deletion_cascades(target), None).await.unwrap_err();
  assert!(err.is_conflict());

  // The whole delete rolled back, cascade included.
  assert!(s.get_system_unit(unit.id).await.unwrap().is_some());
  assert_eq!(s.list_system_unit_maps().await.unwrap().len(), 1);
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_case_roundtrip() {
  let s = store().await;
  let case = seed_case(&s).await;
  assert!(case.case_reference.is_none());
  assert_eq!(case.dates.request_date, Some(date(2024, 3, 1)));
  assert_eq!(case.status(), CaseStatus::Received);
  assert_eq!(case.audit.created_by.as_deref(), Some("analyst1"));

  let fetched = s.get_case(case.id).await.unwrap().unwrap();
  assert_eq!(fetched, case);
}

#[tokio::test]
async fn reference_is_assigned_once() {
  let s = store().await;
  let case = seed_case(&s).await;

  assert!(s.assign_reference(case.id, "3900F86C".into(), None).await.unwrap());
  assert!(!s.assign_reference(case.id, "FFFFFFFF".into(), None).await.unwrap());

  let fetched = s.get_case(case.id).await.unwrap().unwrap();
  assert_eq!(fetched.case_reference.as_deref(), Some("3900F86C"));
}

#[tokio::test]
async fn update_case_writes_every_field() {
  let s = store().await;
  let case = seed_case(&s).await;
  let qc = s.create_user(user("qc1"), None).await.unwrap();

  let mut draft = CaseDraft::from(&case);
  draft.distance = Some(12.5);
  draft.final_letter_recipient = "Owner".into();
  draft.reviewers.qc_reviewer = Some(qc.id);
  draft.flags.priority = true;
  draft.dates.analyst_signoff_date = Some(date(2024, 3, 5));

  let updated = s
    .update_case(case.id, draft, Some(Actor::new("qc1")))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.distance, Some(12.5));
  assert_eq!(updated.final_letter_recipient, "Owner");
  assert_eq!(updated.reviewers.qc_reviewer, Some(qc.id));
  assert!(updated.flags.priority);
  assert_eq!(updated.status(), CaseStatus::AwaitingQc);
  assert_eq!(updated.audit.created_by.as_deref(), Some("analyst1"));
  assert_eq!(updated.audit.modified_by.as_deref(), Some("qc1"));
}

#[tokio::test]
async fn update_missing_case_returns_none() {
  let s = store().await;
  let case = seed_case(&s).await;
  let draft = CaseDraft::from(&case);
  assert!(s.update_case(case.id + 100, draft, None).await.unwrap().is_none());
}

#[tokio::test]
async fn case_with_unknown_requester_is_conflict() {
  let s = store().await;
  let err = s.create_case(CaseDraft::new(7, 8), None).await.unwrap_err();
  assert!(err.is_conflict());
}

#[tokio::test]
async fn list_cases_joins_related_rows() {
  let s = store().await;
  let case = seed_case(&s).await;
  let a = s.create_user(user("analyst1"), None).await.unwrap();
  let unit = s
    .create_system_unit(
      NewSystemUnit {
        system_unit_number: "NC-05".into(),
        system_unit_name:   "Bodie Island".into(),
        field_office:       None,
        system_unit_type:   None,
      },
      None,
    )
    .await
    .unwrap();
  let mut draft = CaseDraft::from(&case);
  draft.reviewers.analyst = Some(a.id);
  draft.cbrs_unit = Some(unit.id);
  s.update_case(case.id, draft, None).await.unwrap();

  let tag = s
    .create_tag(NewTag { name: "flood".into(), description: String::new() }, None)
    .await
    .unwrap();
  s.create_case_tag(NewCaseTag { case: case.id, tag: tag.id }, None)
    .await
    .unwrap();

  let listings = s.list_cases().await.unwrap();
  assert_eq!(listings.len(), 1);
  let l = &listings[0];
  assert_eq!(l.property.data.address.street, "9 Dune St");
  assert_eq!(l.analyst.as_ref().map(|u| u.data.username.as_str()), Some("analyst1"));
  assert!(l.qc_reviewer.is_none());
  assert_eq!(l.unit_name.as_deref(), Some("Bodie Island"));
  assert_eq!(l.tags, vec![tag.id]);
}

// ─── Files, tags and comments ────────────────────────────────────────────────

#[tokio::test]
async fn case_files_are_listed_per_case() {
  let s = store().await;
  let case = seed_case(&s).await;
  let file = s
    .create_case_file(
      NewCaseFile {
        case:           case.id,
        name:           "letter.pdf".into(),
        path:           format!("casefiles/{}/letter.pdf", case.id),
        from_requester: false,
        final_letter:   true,
        uploader:       Some("analyst1".into()),
      },
      analyst(),
    )
    .await
    .unwrap();
  assert_eq!(file.uploaded_at, file.audit.created_at);

  assert_eq!(s.list_case_files(Some(case.id)).await.unwrap(), vec![file.clone()]);
  assert!(s.list_case_files(Some(case.id + 1)).await.unwrap().is_empty());

  let target = DeleteTarget::CaseFile(file.id);
  assert!(s.delete(target, deletion_cascades(target), None).await.unwrap());
  assert!(s.get_case_file(file.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_tag_removes_its_case_tags() {
  let s = store().await;
  let first = seed_case(&s).await;
  let second = s.create_case(CaseDraft::from(&first), analyst()).await.unwrap();
  let third = s.create_case(CaseDraft::from(&first), analyst()).await.unwrap();
  let tag = s
    .create_tag(NewTag { name: "erosion".into(), description: String::new() }, None)
    .await
    .unwrap();
  let keep = s
    .create_tag(NewTag { name: "keep".into(), description: String::new() }, None)
    .await
    .unwrap();
  for case in [&first, &second, &third] {
    s.create_case_tag(NewCaseTag { case: case.id, tag: tag.id }, None).await.unwrap();
  }
  s.create_case_tag(NewCaseTag { case: first.id, tag: keep.id }, None).await.unwrap();
  assert_eq!(s.list_case_tags(None).await.unwrap().len(), 4);

  let target = DeleteTarget::Tag(tag.id);
  assert!(s.delete(target, deletion_cascades(target), None).await.unwrap());

  let remaining = s.list_case_tags(None).await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].data.tag, keep.id);
  assert_eq!(remaining[0].data.case, first.id);
  assert!(s.get_tag(tag.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_missing_target_returns_false() {
  let s = store().await;
  let target = DeleteTarget::Comment(5);
  assert!(!s.delete(target, deletion_cascades(target), None).await.unwrap());
}

#[tokio::test]
async fn comments_list_newest_first() {
  let s = store().await;
  let case = seed_case(&s).await;
  for text in ["first", "second", "third"] {
    s.create_comment(NewComment { case: case.id, comment: text.into() }, analyst())
      .await
      .unwrap();
  }
  let texts: Vec<_> = s
    .list_comments(Some(case.id))
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.data.comment)
    .collect();
  assert_eq!(texts, ["third", "second", "first"]);
}

// ─── Audit log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn mutations_are_audited() {
  let s = store().await;
  let case = seed_case(&s).await;
  s.assign_reference(case.id, "3900F86C".into(), Some(Actor::new("system")))
    .await
    .unwrap();

  let trail = s.audit_trail("case", case.id).await.unwrap();
  let actions: Vec<_> = trail.iter().map(|e| e.action.as_str()).collect();
  assert_eq!(actions, ["create", "update"]);
  assert_eq!(trail[0].actor.as_deref(), Some("analyst1"));
  assert_eq!(trail[1].actor.as_deref(), Some("system"));
  assert_eq!(trail[1].snapshot["case_reference"], "3900F86C");
}

#[tokio::test]
async fn deletes_are_audited_with_last_state() {
  let s = store().await;
  let tag = s
    .create_tag(NewTag { name: "dunes".into(), description: "x".into() }, None)
    .await
    .unwrap();
  let target = DeleteTarget::Tag(tag.id);
  s.delete(target, deletion_cascades(target), analyst()).await.unwrap();

  let trail = s.audit_trail("tag", tag.id).await.unwrap();
  assert_eq!(trail.len(), 2);
  assert_eq!(trail[1].action, "delete");
  assert_eq!(trail[1].snapshot["name"], "dunes");
}
