//! SQL schema for the barrier SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Every table carries the same four audit columns. References from
/// `cases` use the default `NO ACTION` delete rule, so a referenced row
/// cannot be removed while a case still points at it. Join rows are removed
/// by explicit cascades in the store, never by `ON DELETE CASCADE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    first_name  TEXT NOT NULL DEFAULT '',
    last_name   TEXT NOT NULL DEFAULT '',
    email       TEXT NOT NULL DEFAULT '',
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT
);

-- natural_key: normalised salutation/name/organization/email/address tuple.
CREATE TABLE IF NOT EXISTS requesters (
    id           INTEGER PRIMARY KEY,
    salutation   TEXT NOT NULL DEFAULT '',
    first_name   TEXT NOT NULL DEFAULT '',
    last_name    TEXT NOT NULL DEFAULT '',
    organization TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',
    street       TEXT NOT NULL DEFAULT '',
    unit         TEXT NOT NULL DEFAULT '',
    city         TEXT NOT NULL DEFAULT '',
    state        TEXT NOT NULL DEFAULT '',
    zipcode      TEXT NOT NULL DEFAULT '',
    natural_key  TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL,
    created_by   TEXT,
    modified_at  TEXT NOT NULL,
    modified_by  TEXT
);

-- natural_key: normalised address tuple plus legal description.
CREATE TABLE IF NOT EXISTS properties (
    id                INTEGER PRIMARY KEY,
    street            TEXT NOT NULL DEFAULT '',
    unit              TEXT NOT NULL DEFAULT '',
    city              TEXT NOT NULL DEFAULT '',
    state             TEXT NOT NULL DEFAULT '',
    zipcode           TEXT NOT NULL DEFAULT '',
    legal_description TEXT NOT NULL DEFAULT '',
    subdivision       TEXT NOT NULL DEFAULT '',
    policy_number     TEXT NOT NULL DEFAULT '',
    natural_key       TEXT NOT NULL UNIQUE,
    created_at        TEXT NOT NULL,
    created_by        TEXT,
    modified_at       TEXT NOT NULL,
    modified_by       TEXT
);

CREATE TABLE IF NOT EXISTS determinations (
    id          INTEGER PRIMARY KEY,
    outcome     TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT
);

CREATE TABLE IF NOT EXISTS field_offices (
    id                  INTEGER PRIMARY KEY,
    field_office_number TEXT NOT NULL,
    field_office_name   TEXT NOT NULL,
    city                TEXT NOT NULL DEFAULT '',
    state               TEXT NOT NULL DEFAULT '',
    created_at          TEXT NOT NULL,
    created_by          TEXT,
    modified_at         TEXT NOT NULL,
    modified_by         TEXT
);

CREATE TABLE IF NOT EXISTS system_unit_types (
    id          INTEGER PRIMARY KEY,
    unit_type   TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT
);

CREATE TABLE IF NOT EXISTS system_units (
    id                 INTEGER PRIMARY KEY,
    system_unit_number TEXT NOT NULL UNIQUE,
    system_unit_name   TEXT NOT NULL DEFAULT '',
    field_office       INTEGER REFERENCES field_offices(id),
    system_unit_type   INTEGER REFERENCES system_unit_types(id),
    created_at         TEXT NOT NULL,
    created_by         TEXT,
    modified_at        TEXT NOT NULL,
    modified_by        TEXT
);

CREATE TABLE IF NOT EXISTS system_maps (
    id          INTEGER PRIMARY KEY,
    map_number  TEXT NOT NULL,
    map_title   TEXT NOT NULL DEFAULT '',
    map_date    TEXT,
    effective   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT,
    UNIQUE (map_number, map_date)
);

CREATE TABLE IF NOT EXISTS system_unit_maps (
    id          INTEGER PRIMARY KEY,
    system_unit INTEGER NOT NULL REFERENCES system_units(id),
    system_map  INTEGER NOT NULL REFERENCES system_maps(id),
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT,
    UNIQUE (system_unit, system_map)
);

-- Status is never stored; it is derived from the milestone dates on read.
CREATE TABLE IF NOT EXISTS cases (
    id                        INTEGER PRIMARY KEY,
    case_reference            TEXT,
    duplicate_of              INTEGER REFERENCES cases(id),
    requester                 INTEGER NOT NULL REFERENCES requesters(id),
    property                  INTEGER NOT NULL REFERENCES properties(id),
    cbrs_unit                 INTEGER REFERENCES system_units(id),
    map_number                INTEGER REFERENCES system_maps(id),
    cbrs_map_date             TEXT,
    determination             INTEGER REFERENCES determinations(id),
    prohibition_date          TEXT,
    distance                  REAL,
    final_letter_recipient    TEXT NOT NULL DEFAULT '',
    request_date              TEXT,
    fws_fo_received_date      TEXT,
    fws_hq_received_date      TEXT,
    analyst_signoff_date      TEXT,
    qc_reviewer_signoff_date  TEXT,
    fws_reviewer_signoff_date TEXT,
    final_letter_date         TEXT,
    close_date                TEXT,
    analyst                   INTEGER REFERENCES users(id),
    qc_reviewer               INTEGER REFERENCES users(id),
    fws_reviewer              INTEGER REFERENCES users(id),
    priority                  INTEGER NOT NULL DEFAULT 0,
    on_hold                   INTEGER NOT NULL DEFAULT 0,
    invalid                   INTEGER NOT NULL DEFAULT 0,
    hard_copy_map_reviewed    INTEGER NOT NULL DEFAULT 0,
    created_at                TEXT NOT NULL,
    created_by                TEXT,
    modified_at               TEXT NOT NULL,
    modified_by               TEXT
);

CREATE TABLE IF NOT EXISTS case_files (
    id             INTEGER PRIMARY KEY,
    case_id        INTEGER NOT NULL REFERENCES cases(id),
    name           TEXT NOT NULL,
    path           TEXT NOT NULL,
    from_requester INTEGER NOT NULL DEFAULT 0,
    final_letter   INTEGER NOT NULL DEFAULT 0,
    uploader       TEXT,
    uploaded_at    TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    created_by     TEXT,
    modified_at    TEXT NOT NULL,
    modified_by    TEXT,
    UNIQUE (case_id, path)
);

CREATE TABLE IF NOT EXISTS tags (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT
);

CREATE TABLE IF NOT EXISTS case_tags (
    id          INTEGER PRIMARY KEY,
    case_id     INTEGER NOT NULL REFERENCES cases(id),
    tag         INTEGER NOT NULL REFERENCES tags(id),
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT,
    UNIQUE (case_id, tag)
);

CREATE TABLE IF NOT EXISTS comments (
    id          INTEGER PRIMARY KEY,
    case_id     INTEGER NOT NULL REFERENCES cases(id),
    comment     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    created_by  TEXT,
    modified_at TEXT NOT NULL,
    modified_by TEXT
);

-- Append-only history: one row per mutation, written in the same
-- transaction as the mutation itself.
CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY,
    entity      TEXT NOT NULL,
    entity_id   INTEGER NOT NULL,
    action      TEXT NOT NULL,   -- 'create' | 'update' | 'delete'
    actor       TEXT,
    recorded_at TEXT NOT NULL,
    snapshot    TEXT NOT NULL    -- JSON of the row after the change (before, for deletes)
);

CREATE INDEX IF NOT EXISTS cases_requester_idx   ON cases(requester);
CREATE INDEX IF NOT EXISTS cases_property_idx    ON cases(property);
CREATE INDEX IF NOT EXISTS cases_duplicate_idx   ON cases(duplicate_of);
CREATE INDEX IF NOT EXISTS case_files_case_idx   ON case_files(case_id);
CREATE INDEX IF NOT EXISTS case_tags_tag_idx     ON case_tags(tag);
CREATE INDEX IF NOT EXISTS comments_case_idx     ON comments(case_id);
CREATE INDEX IF NOT EXISTS system_maps_number_idx ON system_maps(map_number);
CREATE INDEX IF NOT EXISTS audit_entity_idx      ON audit_log(entity, entity_id);

PRAGMA user_version = 1;
";
