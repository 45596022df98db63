//! Validation of [`Booking`] creation and modification requests.

use common::Date;
use derive_more::{Display, Error};

use crate::domain::{announcement, Announcement};

use super::{Booking, Period};

/// Requested dates of a [`Booking`] being created or modified.
///
/// Omitted dates default to the ones of the modified [`Booking`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Candidate {
    /// Requested first day.
    pub start_date: Option<Date>,

    /// Requested last day.
    pub end_date: Option<Date>,
}

impl Candidate {
    /// Resolves the [`Period`] this [`Candidate`] requests, falling back to
    /// the dates of the `existing` [`Booking`] for the omitted ones.
    #[must_use]
    pub fn period(&self, existing: Option<&Booking>) -> Option<Period> {
        Some(Period {
            start: self.start_date.or(existing.map(|b| b.start_date))?,
            end: self.end_date.or(existing.map(|b| b.end_date))?,
        })
    }
}

/// [`Booking`] request which passed the [`Validator`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Validated {
    /// ID of the booked [`Announcement`].
    pub announcement_id: announcement::Id,

    /// First day of the [`Booking`].
    pub start_date: Date,

    /// Last day of the [`Booking`].
    pub end_date: Date,
}

/// Pure decision over a [`Booking`] request against the booked
/// [`Announcement`] and the [`Booking`]s already holding its dates.
#[derive(Clone, Copy, Debug)]
pub struct Validator<'a> {
    /// Current day the request is evaluated at.
    pub today: Date,

    /// [`Announcement`] being booked.
    pub announcement: &'a Announcement,

    /// [`Booking`] being modified, if any.
    pub existing: Option<&'a Booking>,

    /// [`Booking`]s which may conflict with the request.
    pub reserved: &'a [Booking],
}

impl Validator<'_> {
    /// Validates the provided [`Candidate`].
    ///
    /// Rules are checked in order, the first failing one is reported.
    ///
    /// # Errors
    ///
    /// With the [`ValidationError`] of the first failed rule.
    pub fn validate(
        &self,
        candidate: Candidate,
    ) -> Result<Validated, ValidationError> {
        use ValidationError as E;

        if candidate.start_date.is_some_and(|start| start < self.today) {
            return Err(E::PastStartDate);
        }
        // Compared against tomorrow regardless of the start date.
        if let Some(end) = candidate.end_date {
            if self.today.next_day().map_or(true, |tomorrow| end < tomorrow) {
                return Err(E::PastEndDate);
            }
        }

        if !self.announcement.is_active {
            return Err(E::InactiveAnnouncement);
        }

        let period = candidate.period(self.existing).ok_or(E::Incomplete)?;
        if period.end <= period.start {
            return Err(E::InvertedRange);
        }

        if Booking::find_conflict(
            self.reserved,
            self.announcement.id,
            period,
            self.existing.map(|b| b.id),
        )
        .is_some()
        {
            return Err(E::DateConflict);
        }

        Ok(Validated {
            announcement_id: self.announcement.id,
            start_date: period.start,
            end_date: period.end,
        })
    }
}

/// Error of a [`Booking`] request validation.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// Requested start date is before today.
    #[display("Start date cannot be in the past.")]
    PastStartDate,

    /// Requested end date is not after today.
    #[display("End date should be more than today.")]
    PastEndDate,

    /// Booked [`Announcement`] doesn't accept bookings.
    #[display("This announcement is not active.")]
    InactiveAnnouncement,

    /// Requested end date is not after the start date.
    #[display("End date cannot be less than start date.")]
    InvertedRange,

    /// Requested dates overlap an approved [`Booking`].
    #[display("Booking for this dates is reserved.")]
    DateConflict,

    /// Start or end date is missing.
    #[display("Start date and end date are required.")]
    Incomplete,
}

#[cfg(test)]
mod spec {
    use common::{Currency, DateTime, Money};

    use crate::domain::{
        announcement::{
            self, Announcement, Description, HousingType, Rooms, Title,
        },
        booking::spec::{approved, booking, date},
        user,
    };

    use super::{Candidate, ValidationError, Validator};

    fn announcement(is_active: bool) -> Announcement {
        Announcement {
            id: announcement::Id::new(),
            title: Title::new("Loft near the river").unwrap(),
            description: Description::new("Bright and quiet.").unwrap(),
            owner_id: user::Id::new(),
            price: Money {
                amount: "95".parse().unwrap(),
                currency: Currency::Eur,
            },
            rooms: Rooms::new(2).unwrap(),
            housing_type: HousingType::Loft,
            is_active,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    fn candidate(start: &str, end: &str) -> Candidate {
        Candidate {
            start_date: Some(date(start)),
            end_date: Some(date(end)),
        }
    }

    fn validator<'a>(
        announcement: &'a Announcement,
        reserved: &'a [crate::domain::Booking],
    ) -> Validator<'a> {
        Validator {
            today: date("2025-05-01"),
            announcement,
            existing: None,
            reserved,
        }
    }

    #[test]
    fn rejects_inverted_range() {
        let ann = announcement(true);
        let v = validator(&ann, &[]);

        for (start, end) in [
            ("2025-06-10", "2025-06-10"),
            ("2025-06-10", "2025-06-09"),
            ("2025-07-01", "2025-05-02"),
        ] {
            assert_eq!(
                v.validate(candidate(start, end)),
                Err(ValidationError::InvertedRange),
                "{start}..{end}",
            );
        }
    }

    #[test]
    fn rejects_past_start_date() {
        let ann = announcement(true);

        assert_eq!(
            validator(&ann, &[]).validate(candidate("2025-04-30", "2025-05-05")),
            Err(ValidationError::PastStartDate),
        );
    }

    #[test]
    fn rejects_end_date_before_tomorrow() {
        let ann = announcement(true);
        let v = validator(&ann, &[]);

        assert_eq!(
            v.validate(candidate("2025-05-01", "2025-05-01")),
            Err(ValidationError::PastEndDate),
        );
        assert!(v.validate(candidate("2025-05-01", "2025-05-02")).is_ok());
    }

    #[test]
    fn past_start_is_reported_before_past_end() {
        let ann = announcement(false);

        assert_eq!(
            validator(&ann, &[]).validate(candidate("2025-04-01", "2025-04-02")),
            Err(ValidationError::PastStartDate),
        );
    }

    #[test]
    fn rejects_inactive_announcement() {
        let ann = announcement(false);

        assert_eq!(
            validator(&ann, &[]).validate(candidate("2025-06-01", "2025-06-10")),
            Err(ValidationError::InactiveAnnouncement),
        );
    }

    #[test]
    fn rejects_overlap_with_approved_booking() {
        let ann = announcement(true);
        let reserved = [approved(ann.id, "2025-06-01", "2025-06-10")];
        let v = validator(&ann, &reserved);

        assert_eq!(
            v.validate(candidate("2025-06-05", "2025-06-15")),
            Err(ValidationError::DateConflict),
        );
        assert_eq!(
            v.validate(candidate("2025-06-10", "2025-06-15")),
            Err(ValidationError::DateConflict),
        );

        let accepted = v.validate(candidate("2025-06-11", "2025-06-20")).unwrap();
        assert_eq!(accepted.announcement_id, ann.id);
        assert_eq!(accepted.start_date, date("2025-06-11"));
        assert_eq!(accepted.end_date, date("2025-06-20"));
    }

    #[test]
    fn ignores_pending_and_cancelled_bookings() {
        let ann = announcement(true);
        let mut cancelled = approved(ann.id, "2025-06-01", "2025-06-10");
        cancelled.canceled = true;
        let reserved = [booking(ann.id, "2025-06-01", "2025-06-10"), cancelled];

        assert!(validator(&ann, &reserved)
            .validate(candidate("2025-06-05", "2025-06-15"))
            .is_ok());
    }

    #[test]
    fn update_excludes_itself_and_uses_its_dates_as_defaults() {
        let ann = announcement(true);
        let existing = approved(ann.id, "2025-06-01", "2025-06-10");
        let reserved = [existing.clone()];
        let v = Validator {
            existing: Some(&existing),
            ..validator(&ann, &reserved)
        };

        let moved = v
            .validate(Candidate {
                start_date: None,
                end_date: Some(date("2025-06-12")),
            })
            .unwrap();
        assert_eq!(moved.start_date, date("2025-06-01"));
        assert_eq!(moved.end_date, date("2025-06-12"));

        assert_eq!(
            v.validate(Candidate {
                start_date: Some(date("2025-06-10")),
                end_date: None,
            }),
            Err(ValidationError::InvertedRange),
        );
    }

    #[test]
    fn creation_requires_both_dates() {
        let ann = announcement(true);

        assert_eq!(
            validator(&ann, &[]).validate(Candidate {
                start_date: Some(date("2025-06-01")),
                end_date: None,
            }),
            Err(ValidationError::Incomplete),
        );
    }
}
