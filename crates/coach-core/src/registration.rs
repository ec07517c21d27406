//! Event capacity and waitlist policy.
//!
//! ```text
//! [none]     --register--> Confirmed    (seat free, or unlimited)
//! [none]     --register--> Waitlisted   (full, waitlist allowed)
//! [none]     --register--> rejected     (full, no waitlist)
//! Confirmed  --cancel----> [deleted] + promotion attempt
//! Waitlisted --cancel----> [deleted]
//! Waitlisted --promote---> Confirmed
//! ```
//!
//! These functions only decide. A store must call them while holding a
//! lock over the event's registration set so that the counts they are
//! given cannot change before the decision is written back.

use chrono::{DateTime, Utc};

use crate::{
  error::{DeadlineAction, Decision, Rejection},
  event::{Event, Registration, RegistrationStatus},
};

/// Decide the status of a new registration for `event`.
///
/// `confirmed` is the number of [`RegistrationStatus::Confirmed`]
/// registrations the event currently holds.
pub fn admit(
  event: &Event,
  existing: Option<&Registration>,
  confirmed: u32,
  now: DateTime<Utc>,
) -> Decision<RegistrationStatus> {
  if existing.is_some() {
    return Err(Rejection::Conflict("already registered".into()));
  }

  if event.window_closed(now) {
    return Err(Rejection::DeadlinePassed {
      action: DeadlineAction::Registration,
      hours:  event.registration_deadline_hours,
    });
  }

  let is_full = event.max_attendees.is_some_and(|max| confirmed >= max);
  match (is_full, event.allow_waitlist) {
    (false, _) => Ok(RegistrationStatus::Confirmed),
    (true, true) => Ok(RegistrationStatus::Waitlisted),
    (true, false) => Err(Rejection::CapacityExceeded),
  }
}

/// Check that `registration` may be withdrawn at `now`.
///
/// Waitlisted registrations can always be withdrawn; confirmed ones only
/// until the registration deadline.
pub fn check_cancellation<'a>(
  event: &Event,
  registration: Option<&'a Registration>,
  now: DateTime<Utc>,
) -> Decision<&'a Registration> {
  let registration = registration.ok_or_else(|| Rejection::not_found("registration"))?;

  if registration.status == RegistrationStatus::Confirmed && event.window_closed(now) {
    return Err(Rejection::DeadlinePassed {
      action: DeadlineAction::Cancellation,
      hours:  event.registration_deadline_hours,
    });
  }

  Ok(registration)
}

/// Whether withdrawing `cancelled` frees a seat for the waitlist.
///
/// `confirmed_after` is the confirmed count once `cancelled` is gone. A
/// seat only opens if the event is still under capacity, which may not be
/// the case after capacity was lowered.
pub fn should_promote(event: &Event, cancelled: &Registration, confirmed_after: u32) -> bool {
  cancelled.status == RegistrationStatus::Confirmed
    && event.allow_waitlist
    && event.max_attendees.is_none_or(|max| confirmed_after < max)
}

/// The longest-waiting registration in `waitlist`.
///
/// `waitlist` must be in insertion order; equal timestamps resolve to the
/// earlier insert.
pub fn next_in_line(waitlist: &[Registration]) -> Option<&Registration> {
  waitlist
    .iter()
    .filter(|r| r.status.is_waitlisted())
    .min_by_key(|r| r.created_at)
}
