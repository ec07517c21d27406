//! [`SqliteStore`], the SQLite implementation of [`CoachStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use coach_core::{
  community::{Community, Membership},
  course::{Course, CourseEnrollment, Enrolled, Lesson, NewCourse, NewLesson},
  error::{Decision, Rejection},
  event::{Cancellation, Event, NewEvent, Registration, RegistrationStatus},
  notification::{NewNotification, Notification},
  registration,
  store::{CoachStore, CourseQuery, EventQuery},
};

use crate::{
  encode::{
    COURSE_COLUMNS, ENROLLMENT_COLUMNS, EVENT_COLUMNS, LESSON_COLUMNS, NOTIFICATION_COLUMNS,
    REGISTRATION_COLUMNS, RawCommunity, RawCourse, RawEnrollment, RawEvent, RawLesson,
    RawMembership, RawNotification, RawRegistration, encode_dt, encode_uuid, stored_dt,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A coaching platform store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
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

  /// Open an in-memory store, for tests.
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
}

// ─── In-call helpers ─────────────────────────────────────────────────────────
//
// These run on the connection thread, usually inside a transaction, so they
// take a plain `&Connection` and report decode failures through
// `tokio_rusqlite::Error::Other`.

fn in_call(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

fn query_event(conn: &Connection, event_id: &str) -> tokio_rusqlite::Result<Option<Event>> {
  let raw = conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
      rusqlite::params![event_id],
      RawEvent::from_row,
    )
    .optional()?;
  raw.map(RawEvent::into_event).transpose().map_err(in_call)
}

fn query_registration(
  conn: &Connection,
  event_id: &str,
  user_id: &str,
) -> tokio_rusqlite::Result<Option<Registration>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {REGISTRATION_COLUMNS} FROM event_registrations
         WHERE event_id = ?1 AND user_id = ?2"
      ),
      rusqlite::params![event_id, user_id],
      RawRegistration::from_row,
    )
    .optional()?;
  raw.map(RawRegistration::into_registration).transpose().map_err(in_call)
}

/// Number of confirmed (seat-holding) registrations for an event.
fn count_confirmed(conn: &Connection, event_id: &str) -> tokio_rusqlite::Result<u32> {
  let n: i64 = conn.query_row(
    "SELECT COUNT(*) FROM event_registrations WHERE event_id = ?1 AND status = ?2",
    rusqlite::params![event_id, RegistrationStatus::Confirmed.as_ref()],
    |r| r.get(0),
  )?;
  Ok(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Waitlisted registrations in insertion order.
fn query_waitlist(conn: &Connection, event_id: &str) -> tokio_rusqlite::Result<Vec<Registration>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {REGISTRATION_COLUMNS} FROM event_registrations
     WHERE event_id = ?1 AND status = ?2
     ORDER BY rowid"
  ))?;
  let raws = stmt
    .query_map(
      rusqlite::params![event_id, RegistrationStatus::Waitlisted.as_ref()],
      RawRegistration::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws
    .into_iter()
    .map(RawRegistration::into_registration)
    .collect::<Result<_>>()
    .map_err(in_call)
}

fn query_enrollment(
  conn: &Connection,
  course_id: &str,
  user_id: &str,
) -> tokio_rusqlite::Result<Option<CourseEnrollment>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments
         WHERE course_id = ?1 AND user_id = ?2"
      ),
      rusqlite::params![course_id, user_id],
      RawEnrollment::from_row,
    )
    .optional()?;
  raw.map(RawEnrollment::into_enrollment).transpose().map_err(in_call)
}

fn query_lesson(conn: &Connection, lesson_id: &str) -> tokio_rusqlite::Result<Option<Lesson>> {
  let raw = conn
    .query_row(
      &format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE lesson_id = ?1"),
      rusqlite::params![lesson_id],
      RawLesson::from_row,
    )
    .optional()?;
  raw.map(RawLesson::into_lesson).transpose().map_err(in_call)
}

fn query_membership(
  conn: &Connection,
  community_id: &str,
  user_id: &str,
) -> tokio_rusqlite::Result<Option<RawMembership>> {
  Ok(
    conn
      .query_row(
        "SELECT community_id, user_id, joined_at FROM community_members
         WHERE community_id = ?1 AND user_id = ?2",
        rusqlite::params![community_id, user_id],
        RawMembership::from_row,
      )
      .optional()?,
  )
}

// ─── CoachStore impl ─────────────────────────────────────────────────────────

impl CoachStore for SqliteStore {
  type Error = Error;

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn create_course(&self, creator_id: Uuid, input: NewCourse) -> Result<Course> {
    let course = Course {
      course_id: Uuid::new_v4(),
      title: input.title,
      description: input.description,
      access_type: input.access_type,
      prerequisite_id: input.prerequisite_id,
      community_id: input.community_id,
      creator_id,
      is_published: input.is_published,
      is_archived: false,
      created_at: stored_dt(Utc::now()),
    };

    let id_str       = encode_uuid(course.course_id);
    let title        = course.title.clone();
    let description  = course.description.clone();
    let access_str   = course.access_type.as_ref().to_owned();
    let prereq_str   = course.prerequisite_id.map(encode_uuid);
    let community    = course.community_id.map(encode_uuid);
    let creator_str  = encode_uuid(creator_id);
    let is_published = course.is_published;
    let at_str       = encode_dt(course.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (
             course_id, title, description, access_type, prerequisite_id,
             community_id, creator_id, is_published, is_archived, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
          rusqlite::params![
            id_str,
            title,
            description,
            access_str,
            prereq_str,
            community,
            creator_str,
            is_published,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
            rusqlite::params![id_str],
            RawCourse::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn list_courses(&self, query: CourseQuery) -> Result<Vec<Course>> {
    let creator_str = query.creator_id.map(encode_uuid);
    let include_all = query.include_unpublished;

    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COURSE_COLUMNS} FROM courses
           WHERE (?1 IS NULL OR creator_id = ?1)
             AND (?2 OR (is_published = 1 AND is_archived = 0))
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![creator_str, include_all], RawCourse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn update_course(&self, course: Course) -> Result<Course> {
    let id_str       = encode_uuid(course.course_id);
    let title        = course.title.clone();
    let description  = course.description.clone();
    let access_str   = course.access_type.as_ref().to_owned();
    let prereq_str   = course.prerequisite_id.map(encode_uuid);
    let community    = course.community_id.map(encode_uuid);
    let is_published = course.is_published;
    let is_archived  = course.is_archived;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE courses SET
             title = ?2, description = ?3, access_type = ?4, prerequisite_id = ?5,
             community_id = ?6, is_published = ?7, is_archived = ?8
           WHERE course_id = ?1",
          rusqlite::params![
            id_str,
            title,
            description,
            access_str,
            prereq_str,
            community,
            is_published,
            is_archived,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::CourseNotFound(course.course_id));
    }
    Ok(course)
  }

  async fn delete_course(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    // Lessons, enrollments and progress go with it via ON DELETE CASCADE.
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM courses WHERE course_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Lessons ───────────────────────────────────────────────────────────────

  async fn add_lesson(&self, course_id: Uuid, input: NewLesson) -> Result<Lesson> {
    let lesson = Lesson {
      lesson_id:    Uuid::new_v4(),
      course_id,
      title:        input.title,
      position:     input.position,
      is_published: input.is_published,
      created_at:   stored_dt(Utc::now()),
    };

    let id_str       = encode_uuid(lesson.lesson_id);
    let course_str   = encode_uuid(course_id);
    let title        = lesson.title.clone();
    let position     = lesson.position;
    let is_published = lesson.is_published;
    let at_str       = encode_dt(lesson.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO lessons (lesson_id, course_id, title, position, is_published, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, course_str, title, position, is_published, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(lesson)
  }

  async fn get_lesson(&self, id: Uuid) -> Result<Option<Lesson>> {
    let id_str = encode_uuid(id);
    Ok(self.conn.call(move |conn| query_lesson(conn, &id_str)).await?)
  }

  async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>> {
    let course_str = encode_uuid(course_id);

    let raws: Vec<RawLesson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ?1
           ORDER BY position, created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![course_str], RawLesson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLesson::into_lesson).collect()
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn get_enrollment(&self, course_id: Uuid, user_id: Uuid) -> Result<Option<CourseEnrollment>> {
    let course_str = encode_uuid(course_id);
    let user_str   = encode_uuid(user_id);
    Ok(
      self
        .conn
        .call(move |conn| query_enrollment(conn, &course_str, &user_str))
        .await?,
    )
  }

  async fn enroll(&self, course_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Result<Enrolled> {
    let course_str = encode_uuid(course_id);
    let user_str   = encode_uuid(user_id);
    let at_str     = encode_dt(now);

    let (inserted, enrollment) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO course_enrollments (course_id, user_id, enrolled_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![course_str, user_str, at_str],
        )?;
        let enrollment = query_enrollment(conn, &course_str, &user_str)?;
        Ok((inserted > 0, enrollment))
      })
      .await?;

    let enrollment = enrollment.ok_or(Error::CourseNotFound(course_id))?;
    Ok(Enrolled { enrollment, created: inserted })
  }

  async fn unenroll(&self, course_id: Uuid, user_id: Uuid) -> Result<bool> {
    let course_str = encode_uuid(course_id);
    let user_str   = encode_uuid(user_id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM lesson_progress
           WHERE user_id = ?2
             AND lesson_id IN (SELECT lesson_id FROM lessons WHERE course_id = ?1)",
          rusqlite::params![course_str, user_str],
        )?;
        let deleted = tx.execute(
          "DELETE FROM course_enrollments WHERE course_id = ?1 AND user_id = ?2",
          rusqlite::params![course_str, user_str],
        )?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn complete_lesson(
    &self,
    lesson_id: Uuid,
    user_id:   Uuid,
    now:       DateTime<Utc>,
  ) -> Result<Decision<CourseEnrollment>> {
    let lesson_str = encode_uuid(lesson_id);
    let user_str   = encode_uuid(user_id);
    let now        = stored_dt(now);
    let at_str     = encode_dt(now);

    let decision = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(lesson) = query_lesson(&tx, &lesson_str)? else {
          return Ok(Err(Rejection::not_found("lesson")));
        };
        let course_str = encode_uuid(lesson.course_id);
        let Some(mut enrollment) = query_enrollment(&tx, &course_str, &user_str)? else {
          return Ok(Err(Rejection::denied("not enrolled in this course")));
        };

        tx.execute(
          "INSERT OR IGNORE INTO lesson_progress (lesson_id, user_id, completed_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![lesson_str, user_str, at_str],
        )?;

        if enrollment.completed_at.is_none() {
          let (total, done): (i64, i64) = tx.query_row(
            "SELECT
               COUNT(*),
               COUNT(p.lesson_id)
             FROM lessons l
             LEFT JOIN lesson_progress p
               ON p.lesson_id = l.lesson_id AND p.user_id = ?2
             WHERE l.course_id = ?1 AND l.is_published = 1",
            rusqlite::params![course_str, user_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )?;

          if total > 0 && done == total {
            tx.execute(
              "UPDATE course_enrollments SET completed_at = ?3
               WHERE course_id = ?1 AND user_id = ?2",
              rusqlite::params![course_str, user_str, at_str],
            )?;
            enrollment.completed_at = Some(now);
          }
        }

        tx.commit()?;
        Ok(Ok(enrollment))
      })
      .await?;

    Ok(decision)
  }

  // ── Communities ───────────────────────────────────────────────────────────

  async fn create_community(&self, owner_id: Uuid, name: String) -> Result<Community> {
    let community = Community {
      community_id: Uuid::new_v4(),
      name,
      owner_id,
      created_at: stored_dt(Utc::now()),
    };

    let id_str    = encode_uuid(community.community_id);
    let name      = community.name.clone();
    let owner_str = encode_uuid(owner_id);
    let at_str    = encode_dt(community.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO communities (community_id, name, owner_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, owner_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(community)
  }

  async fn get_community(&self, id: Uuid) -> Result<Option<Community>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCommunity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT community_id, name, owner_id, created_at FROM communities
             WHERE community_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawCommunity {
                community_id: row.get(0)?,
                name:         row.get(1)?,
                owner_id:     row.get(2)?,
                created_at:   row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCommunity::into_community).transpose()
  }

  async fn add_member(&self, community_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Result<Membership> {
    let community_str = encode_uuid(community_id);
    let user_str      = encode_uuid(user_id);
    let at_str        = encode_dt(now);

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO community_members (community_id, user_id, joined_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![community_str, user_str, at_str],
        )?;
        Ok(conn.query_row(
          "SELECT community_id, user_id, joined_at FROM community_members
           WHERE community_id = ?1 AND user_id = ?2",
          rusqlite::params![community_str, user_str],
          RawMembership::from_row,
        )?)
      })
      .await?;

    raw.into_membership()
  }

  async fn is_member(&self, community_id: Uuid, user_id: Uuid) -> Result<bool> {
    let community_str = encode_uuid(community_id);
    let user_str      = encode_uuid(user_id);

    let raw = self
      .conn
      .call(move |conn| query_membership(conn, &community_str, &user_str))
      .await?;

    Ok(raw.is_some())
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn create_event(&self, creator_id: Uuid, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id: Uuid::new_v4(),
      title: input.title,
      starts_at: stored_dt(input.starts_at),
      ends_at: stored_dt(input.ends_at),
      max_attendees: input.max_attendees,
      requires_registration: input.requires_registration,
      registration_deadline_hours: input.registration_deadline_hours,
      allow_waitlist: input.allow_waitlist,
      creator_id,
      created_at: stored_dt(Utc::now()),
    };

    let id_str        = encode_uuid(event.event_id);
    let title         = event.title.clone();
    let starts_str    = encode_dt(event.starts_at);
    let ends_str      = encode_dt(event.ends_at);
    let max_attendees = event.max_attendees;
    let requires      = event.requires_registration;
    let hours         = event.registration_deadline_hours;
    let waitlist      = event.allow_waitlist;
    let creator_str   = encode_uuid(creator_id);
    let at_str        = encode_dt(event.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
          rusqlite::params![
            id_str,
            title,
            starts_str,
            ends_str,
            max_attendees,
            requires,
            hours,
            waitlist,
            creator_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);
    Ok(self.conn.call(move |conn| query_event(conn, &id_str)).await?)
  }

  async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>> {
    let after_str   = query.ends_after.map(encode_dt);
    let creator_str = query.creator_id.map(encode_uuid);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val   = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events
           WHERE (?1 IS NULL OR ends_at >= ?1)
             AND (?2 IS NULL OR creator_id = ?2)
           ORDER BY starts_at, rowid
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![after_str, creator_str, limit_val], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event(&self, event: Event) -> Result<Event> {
    let event = Event {
      starts_at: stored_dt(event.starts_at),
      ends_at: stored_dt(event.ends_at),
      ..event
    };

    let id_str        = encode_uuid(event.event_id);
    let title         = event.title.clone();
    let starts_str    = encode_dt(event.starts_at);
    let ends_str      = encode_dt(event.ends_at);
    let max_attendees = event.max_attendees;
    let requires      = event.requires_registration;
    let hours         = event.registration_deadline_hours;
    let waitlist      = event.allow_waitlist;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE events SET
             title = ?2, starts_at = ?3, ends_at = ?4, max_attendees = ?5,
             requires_registration = ?6, registration_deadline_hours = ?7,
             allow_waitlist = ?8
           WHERE event_id = ?1",
          rusqlite::params![
            id_str,
            title,
            starts_str,
            ends_str,
            max_attendees,
            requires,
            hours,
            waitlist,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::EventNotFound(event.event_id));
    }
    Ok(event)
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM events WHERE event_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Registrations ─────────────────────────────────────────────────────────

  async fn get_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>> {
    let event_str = encode_uuid(event_id);
    let user_str  = encode_uuid(user_id);
    Ok(
      self
        .conn
        .call(move |conn| query_registration(conn, &event_str, &user_str))
        .await?,
    )
  }

  async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
    let event_str = encode_uuid(event_id);

    let raws: Vec<RawRegistration> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REGISTRATION_COLUMNS} FROM event_registrations
           WHERE event_id = ?1
           ORDER BY CASE status WHEN 'REGISTERED' THEN 0 ELSE 1 END, created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![event_str], RawRegistration::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRegistration::into_registration).collect()
  }

  async fn register(
    &self,
    event_id: Uuid,
    user_id:  Uuid,
    now:      DateTime<Utc>,
  ) -> Result<Decision<Registration>> {
    let event_str = encode_uuid(event_id);
    let user_str  = encode_uuid(user_id);
    let now       = stored_dt(now);
    let at_str    = encode_dt(now);

    // The IMMEDIATE transaction takes the write lock up front, so the
    // confirmed count cannot change between the capacity check and the
    // insert, even across processes sharing the database file.
    let decision = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(event) = query_event(&tx, &event_str)? else {
          return Ok(Err(Rejection::not_found("event")));
        };
        let existing  = query_registration(&tx, &event_str, &user_str)?;
        let confirmed = count_confirmed(&tx, &event_str)?;

        let status = match registration::admit(&event, existing.as_ref(), confirmed, now) {
          Ok(status) => status,
          Err(rejection) => return Ok(Err(rejection)),
        };

        tx.execute(
          "INSERT INTO event_registrations (event_id, user_id, status, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![event_str, user_str, status.as_ref(), at_str],
        )?;
        tx.commit()?;

        Ok(Ok(Registration { event_id, user_id, status, created_at: now }))
      })
      .await?;

    Ok(decision)
  }

  async fn cancel(
    &self,
    event_id: Uuid,
    user_id:  Uuid,
    now:      DateTime<Utc>,
  ) -> Result<Decision<Cancellation>> {
    let event_str = encode_uuid(event_id);
    let user_str  = encode_uuid(user_id);

    let decision = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(event) = query_event(&tx, &event_str)? else {
          return Ok(Err(Rejection::not_found("event")));
        };
        let existing = query_registration(&tx, &event_str, &user_str)?;
        let cancelled = match registration::check_cancellation(&event, existing.as_ref(), now) {
          Ok(r) => r.clone(),
          Err(rejection) => return Ok(Err(rejection)),
        };

        tx.execute(
          "DELETE FROM event_registrations WHERE event_id = ?1 AND user_id = ?2",
          rusqlite::params![event_str, user_str],
        )?;

        let confirmed_after = count_confirmed(&tx, &event_str)?;
        let mut promoted = None;
        if registration::should_promote(&event, &cancelled, confirmed_after) {
          let waitlist = query_waitlist(&tx, &event_str)?;
          if let Some(next) = registration::next_in_line(&waitlist) {
            tx.execute(
              "UPDATE event_registrations SET status = ?3
               WHERE event_id = ?1 AND user_id = ?2",
              rusqlite::params![
                event_str,
                encode_uuid(next.user_id),
                RegistrationStatus::Confirmed.as_ref(),
              ],
            )?;
            promoted = Some(Registration { status: RegistrationStatus::Confirmed, ..next.clone() });
          }
        }

        tx.commit()?;
        Ok(Ok(Cancellation { cancelled, promoted }))
      })
      .await?;

    Ok(decision)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn create_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      user_id:         input.user_id,
      kind:            input.kind,
      title:           input.title,
      body:            input.body,
      created_at:      stored_dt(Utc::now()),
      read_at:         None,
    };

    let id_str   = encode_uuid(notification.notification_id);
    let user_str = encode_uuid(notification.user_id);
    let kind_str = notification.kind.as_ref().to_owned();
    let title    = notification.title.clone();
    let body     = notification.body.clone();
    let at_str   = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (notification_id, user_id, kind, title, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, user_str, kind_str, title, body, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications
           WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn mark_notification_read(
    &self,
    id:      Uuid,
    user_id: Uuid,
    now:     DateTime<Utc>,
  ) -> Result<Option<Notification>> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(now);

    let raw: Option<RawNotification> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE notifications SET read_at = COALESCE(read_at, ?3)
           WHERE notification_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str, at_str],
        )?;
        Ok(conn
          .query_row(
            &format!(
              "SELECT {NOTIFICATION_COLUMNS} FROM notifications
               WHERE notification_id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![id_str, user_str],
            RawNotification::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawNotification::into_notification).transpose()
  }
}
