//! [`Booking`] status machine.

use common::define_kind;
use derive_more::{Display, Error};

use super::{Booking, Validated};

define_kind! {
    #[doc = "Lifecycle status of a [`Booking`]."]
    enum Status {
        #[doc = "Awaiting a decision of the lessor."]
        Pending = "Pending",

        #[doc = "Approved by the lessor, holding its dates."]
        Approved = "Approved",

        #[doc = "Cancelled by any party. Terminal."]
        Cancelled = "Cancelled",
    }
}

/// Outcome of an applied [`Booking`] transition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    /// [`Booking`] moved to another [`Status`].
    Changed,

    /// [`Booking`] already was in the requested [`Status`].
    Unchanged,
}

impl Transition {
    /// Indicates whether the [`Booking`] has been modified.
    #[must_use]
    pub fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Error of a rejected [`Booking`] transition.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum TransitionError {
    /// [`Booking`] is [`Status::Cancelled`] and cannot be approved.
    #[display("Cancelled booking cannot be approved.")]
    AlreadyCancelled,

    /// Dates of the [`Booking`] are held by another approved [`Booking`].
    #[display("Booking for this dates is reserved.")]
    DateConflict,
}

impl Booking {
    /// Approves this [`Booking`], unless its dates are held by any of the
    /// `reserved` [`Booking`]s of the same announcement.
    ///
    /// Approving an already [`Status::Approved`] [`Booking`] changes nothing.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::AlreadyCancelled`] if this [`Booking`] is
    ///   [`Status::Cancelled`].
    /// - [`TransitionError::DateConflict`] if this [`Booking`] overlaps another
    ///   reserving one. This [`Booking`] is left untouched then.
    pub fn approve(
        &mut self,
        reserved: &[Booking],
    ) -> Result<Transition, TransitionError> {
        match self.status {
            Status::Cancelled => return Err(TransitionError::AlreadyCancelled),
            Status::Approved => return Ok(Transition::Unchanged),
            Status::Pending => {}
        }
        if self.canceled {
            return Err(TransitionError::AlreadyCancelled);
        }

        if Self::find_conflict(
            reserved,
            self.announcement_id,
            self.period(),
            Some(self.id),
        )
        .is_some()
        {
            return Err(TransitionError::DateConflict);
        }

        self.status = Status::Approved;
        self.is_approved = true;
        Ok(Transition::Changed)
    }

    /// Moves this [`Booking`] to the [`Validated`] announcement and dates.
    ///
    /// A [`Status::Approved`] [`Booking`] returns to [`Status::Pending`] once
    /// anything changes, awaiting the lessor's decision again.
    pub fn reschedule(&mut self, validated: Validated) -> Transition {
        let Validated {
            announcement_id,
            start_date,
            end_date,
        } = validated;
        if self.announcement_id == announcement_id
            && self.start_date == start_date
            && self.end_date == end_date
        {
            return Transition::Unchanged;
        }

        self.announcement_id = announcement_id;
        self.start_date = start_date;
        self.end_date = end_date;
        if self.status == Status::Approved {
            self.status = Status::Pending;
            self.is_approved = false;
        }
        Transition::Changed
    }

    /// Cancels this [`Booking`], releasing its dates.
    ///
    /// Cancelling an already [`Status::Cancelled`] [`Booking`] changes nothing.
    pub fn cancel(&mut self) -> Transition {
        if self.status == Status::Cancelled {
            return Transition::Unchanged;
        }

        self.status = Status::Cancelled;
        self.canceled = true;
        self.is_approved = false;
        Transition::Changed
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{
        announcement,
        booking::{
            spec::{approved, booking, date},
            Validated,
        },
    };

    use super::{Status, Transition, TransitionError};

    #[test]
    fn cancelling_pending_booking_clears_approval() {
        let mut d = booking(announcement::Id::new(), "2025-06-01", "2025-06-10");

        assert_eq!(d.cancel(), Transition::Changed);
        assert_eq!(d.status, Status::Cancelled);
        assert!(d.canceled);
        assert!(!d.is_approved);
    }

    #[test]
    fn cancelling_approved_booking_releases_dates() {
        let mut b = approved(announcement::Id::new(), "2025-06-01", "2025-06-10");
        assert!(b.is_reserving());

        assert_eq!(b.cancel(), Transition::Changed);
        assert!(!b.is_approved);
        assert!(!b.is_reserving());
    }

    #[test]
    fn cancelling_twice_is_idempotent() {
        let mut b = approved(announcement::Id::new(), "2025-06-01", "2025-06-10");
        _ = b.cancel();

        assert_eq!(b.cancel(), Transition::Unchanged);
        assert_eq!(b.status, Status::Cancelled);
        assert!(!b.is_approved);
    }

    #[test]
    fn approves_pending_booking() {
        let ann = announcement::Id::new();
        let mut b = booking(ann, "2025-06-11", "2025-06-20");
        let reserved = [approved(ann, "2025-06-01", "2025-06-10")];

        assert_eq!(b.approve(&reserved), Ok(Transition::Changed));
        assert_eq!(b.status, Status::Approved);
        assert!(b.is_approved);
        assert_eq!(b.approve(&reserved), Ok(Transition::Unchanged));
    }

    #[test]
    fn rejects_conflicting_approval() {
        let ann = announcement::Id::new();
        let f = approved(ann, "2025-06-01", "2025-06-10");
        let mut e = booking(ann, "2025-06-08", "2025-06-12");

        assert_eq!(
            e.approve(&[f.clone(), e.clone()]),
            Err(TransitionError::DateConflict),
        );
        assert_eq!(e.status, Status::Pending);
        assert!(!e.is_approved);
    }

    #[test]
    fn cancelled_booking_cannot_be_approved() {
        let mut b = booking(announcement::Id::new(), "2025-06-01", "2025-06-10");
        _ = b.cancel();

        assert_eq!(b.approve(&[]), Err(TransitionError::AlreadyCancelled));
        assert_eq!(b.status, Status::Cancelled);
    }

    #[test]
    fn rescheduling_approved_booking_requires_new_approval() {
        let ann = announcement::Id::new();
        let mut b = approved(ann, "2025-06-01", "2025-06-10");

        let same = Validated {
            announcement_id: ann,
            start_date: date("2025-06-01"),
            end_date: date("2025-06-10"),
        };
        assert_eq!(b.reschedule(same), Transition::Unchanged);
        assert_eq!(b.status, Status::Approved);

        let shorter = Validated {
            end_date: date("2025-06-09"),
            ..same
        };
        assert_eq!(b.reschedule(shorter), Transition::Changed);
        assert_eq!(b.end_date, date("2025-06-09"));
        assert_eq!(b.status, Status::Pending);
        assert!(!b.is_reserving());
    }

    #[test]
    fn moving_to_another_announcement_drops_approval() {
        let mut b = approved(announcement::Id::new(), "2025-06-01", "2025-06-10");
        let other = announcement::Id::new();

        let moved = Validated {
            announcement_id: other,
            start_date: b.start_date,
            end_date: b.end_date,
        };
        assert_eq!(b.reschedule(moved), Transition::Changed);
        assert_eq!(b.announcement_id, other);
        assert_eq!(b.status, Status::Pending);
        assert!(!b.is_approved);
    }

    #[test]
    fn status_is_stored_as_literal() {
        assert_eq!(Status::Pending.as_str(), "Pending");
        assert_eq!(Status::Approved.to_string(), "Approved");
        assert_eq!("Cancelled".parse::<Status>().unwrap(), Status::Cancelled);
        assert!("cancelled".parse::<Status>().is_err());
    }
}
