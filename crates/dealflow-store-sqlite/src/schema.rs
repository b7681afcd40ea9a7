//! SQL schema for the dealflow SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    company_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    stage       TEXT NOT NULL DEFAULT 'prospect',
    one_liner   TEXT,
    description TEXT,
    tags        TEXT NOT NULL DEFAULT '[]',
    logo_path   TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS people (
    person_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT,
    created_at TEXT NOT NULL
);

-- Soft removal only: a link gets an ended_at, never a DELETE.
CREATE TABLE IF NOT EXISTS company_people (
    company_id   TEXT NOT NULL REFERENCES companies(company_id),
    person_id    TEXT NOT NULL REFERENCES people(person_id),
    relationship TEXT NOT NULL,
    started_at   TEXT NOT NULL,
    ended_at     TEXT,
    PRIMARY KEY (company_id, person_id)
);

-- Applications move through stages; rows are never hard-deleted.
CREATE TABLE IF NOT EXISTS applications (
    application_id  TEXT PRIMARY KEY,
    company_id      TEXT REFERENCES companies(company_id),
    company_name    TEXT NOT NULL,
    contact_email   TEXT,
    founder_info    TEXT,
    stage           TEXT NOT NULL DEFAULT 'new',
    previous_stage  TEXT,
    votes_revealed  INTEGER NOT NULL DEFAULT 0,
    email_sender_id TEXT,
    email_sent      INTEGER NOT NULL DEFAULT 0,
    email_sent_at   TEXT,
    rejection_draft TEXT,
    submitted_at    TEXT NOT NULL
);

-- One vote per (application, voter, round); re-votes update in place.
CREATE TABLE IF NOT EXISTS votes (
    vote_id        TEXT PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES applications(application_id),
    voter_id       TEXT NOT NULL,
    round          TEXT NOT NULL DEFAULT 'initial',
    value          TEXT NOT NULL,
    notes          TEXT,
    recorded_at    TEXT NOT NULL,
    UNIQUE (application_id, voter_id, round)
);

-- At most one deliberation per application.
CREATE TABLE IF NOT EXISTS deliberations (
    deliberation_id TEXT PRIMARY KEY,
    application_id  TEXT NOT NULL UNIQUE REFERENCES applications(application_id),
    meeting_date    TEXT,
    idea_summary    TEXT,
    thoughts        TEXT,
    decision        TEXT NOT NULL DEFAULT 'pending',
    status          TEXT,
    tags            TEXT NOT NULL DEFAULT '[]',
    updated_at      TEXT NOT NULL
);

-- Append-only from the pipeline's perspective.
CREATE TABLE IF NOT EXISTS investments (
    investment_id   TEXT PRIMARY KEY,
    company_id      TEXT NOT NULL REFERENCES companies(company_id),
    application_id  TEXT REFERENCES applications(application_id),
    amount_cents    INTEGER NOT NULL,
    terms           TEXT NOT NULL,
    round           TEXT,
    valuation_cents INTEGER,
    invested_at     TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'active',
    recorded_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id      TEXT PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES applications(application_id),
    assignee_id    TEXT NOT NULL,
    kind           TEXT NOT NULL,
    note           TEXT,
    created_at     TEXT NOT NULL,
    closed_at      TEXT
);

CREATE INDEX IF NOT EXISTS applications_stage_idx   ON applications(stage);
CREATE INDEX IF NOT EXISTS applications_company_idx ON applications(company_id);
CREATE INDEX IF NOT EXISTS votes_application_idx    ON votes(application_id);
CREATE INDEX IF NOT EXISTS investments_company_idx  ON investments(company_id);
CREATE INDEX IF NOT EXISTS tickets_assignee_idx     ON tickets(assignee_id);

PRAGMA user_version = 1;
";
