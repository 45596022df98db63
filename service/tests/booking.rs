//! Booking flows executed by the [`Service`] over an in-memory storage.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    Date, DateTime, Handler,
};
use service::{
    command::{
        approve_booking, cancel_booking, create_booking, delete_booking,
        update_booking, ApproveBooking, CancelBooking, CreateAnnouncement,
        CreateBooking, DeleteBooking, UpdateAnnouncementActivity,
        UpdateBooking, RESERVATION_CONSTRAINT,
    },
    domain::{
        announcement::{self, Description, HousingType, Rooms, Title},
        booking::{self, Status, TransitionError, ValidationError},
        user, Announcement, Booking, User,
    },
    infra::database,
    query, read, Config, Service,
};
use tracerr::Traced;

#[derive(Debug, Default)]
struct State {
    users: HashMap<user::Id, User>,
    announcements: HashMap<announcement::Id, Announcement>,
    bookings: HashMap<booking::Id, Booking>,

    /// [`Booking`]s approved by a concurrent transaction: invisible to
    /// selects, but still reserving their dates on write.
    concurrent: Vec<Booking>,

    /// Rows locked so far, in order.
    locks: Vec<Locked>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Locked {
    Announcement(announcement::Id),
    Booking(booking::Id),
}

/// Storage keeping everything in memory.
///
/// Transactions share the state, so writes are visible immediately.
#[derive(Clone, Debug, Default)]
struct Memory(Arc<Mutex<State>>);

impl Memory {
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }
}

type Result<T> = std::result::Result<T, Traced<database::Error>>;

impl Handler<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self> {
        Ok(self.clone())
    }
}

impl Handler<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<()> {
        Ok(())
    }
}

impl Handler<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Option<User>> {
        Ok(self.state().users.get(by.inner()).cloned())
    }
}

impl Handler<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Insert(user): Insert<User>) -> Result<()> {
        _ = self.state().users.insert(user.id, user);
        Ok(())
    }
}

impl Handler<Select<By<Option<Announcement>, announcement::Id>>> for Memory {
    type Ok = Option<Announcement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Announcement>, announcement::Id>>,
    ) -> Result<Option<Announcement>> {
        Ok(self.state().announcements.get(by.inner()).cloned())
    }
}

impl Handler<Insert<Announcement>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Insert(a): Insert<Announcement>) -> Result<()> {
        _ = self.state().announcements.insert(a.id, a);
        Ok(())
    }
}

impl Handler<Update<Announcement>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Update(a): Update<Announcement>) -> Result<()> {
        _ = self.state().announcements.insert(a.id, a);
        Ok(())
    }
}

impl Handler<Lock<By<Announcement, announcement::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Announcement, announcement::Id>>,
    ) -> Result<()> {
        self.state().locks.push(Locked::Announcement(by.into_inner()));
        Ok(())
    }
}

impl Handler<Select<By<Option<Booking>, booking::Id>>> for Memory {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Option<Booking>> {
        Ok(self
            .state()
            .bookings
            .get(by.inner())
            .filter(|b| !b.is_deleted())
            .cloned())
    }
}

impl Handler<Select<By<Vec<Booking>, read::booking::Conflicts>>> for Memory {
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, read::booking::Conflicts>>,
    ) -> Result<Vec<Booking>> {
        let read::booking::Conflicts {
            announcement_id,
            period,
        } = by.into_inner();
        Ok(self
            .state()
            .bookings
            .values()
            .filter(|b| {
                b.announcement_id == announcement_id
                    && b.is_reserving()
                    && b.period().overlaps(period)
            })
            .cloned()
            .collect())
    }
}

impl Handler<Select<By<read::booking::list::Page, read::booking::list::Selector>>>
    for Memory
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<read::booking::list::Page> {
        use read::booking::list::Filter;

        let read::booking::list::Selector { arguments, filter } =
            by.into_inner();
        let state = self.state();
        let mut nodes = state
            .bookings
            .values()
            .filter(|b| !b.is_deleted())
            .filter(|b| match filter {
                Filter::Renter(id) => b.renter_id == id,
                Filter::Lessor(id) => state
                    .announcements
                    .get(&b.announcement_id)
                    .is_some_and(|a| a.is_owned_by(id)),
            })
            .cloned()
            .collect::<Vec<_>>();
        nodes.sort_by_key(|b| std::cmp::Reverse((b.created_at, b.id)));
        if let Some(cursor) = arguments.cursor() {
            if let Some(pos) = nodes.iter().position(|b| b.id == *cursor) {
                _ = nodes.drain(..=pos);
            }
        }
        nodes.truncate(arguments.limit() + 1);
        Ok(read::booking::list::Page::from_overfetched(
            &arguments,
            nodes,
            |b| b.id,
        ))
    }
}

impl Handler<Insert<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Insert(b): Insert<Booking>) -> Result<()> {
        _ = self.state().bookings.insert(b.id, b);
        Ok(())
    }
}

impl Handler<Update<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Update(b): Update<Booking>) -> Result<()> {
        let mut state = self.state();
        let overlaps = b.is_reserving()
            && state.bookings.values().chain(&state.concurrent).any(|o| {
                o.id != b.id
                    && o.announcement_id == b.announcement_id
                    && o.is_reserving()
                    && o.period().overlaps(b.period())
            });
        if overlaps {
            return Err(tracerr::new!(database::Error::from(
                database::Violation {
                    kind: database::ViolationKind::Exclusion,
                    name: RESERVATION_CONSTRAINT.to_owned(),
                },
            )));
        }
        _ = state.bookings.insert(b.id, b);
        Ok(())
    }
}

impl Handler<Lock<By<Booking, booking::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<()> {
        self.state().locks.push(Locked::Booking(by.into_inner()));
        Ok(())
    }
}

/// Marketplace with one lessor owning one active announcement and two
/// renters.
struct Market {
    service: Service<Memory>,
    lessor: user::Id,
    alice: user::Id,
    bob: user::Id,
    announcement: announcement::Id,
}

impl Market {
    async fn new() -> Self {
        let service = Service::new(
            Config::new(b"test-secret", Duration::from_secs(3600)),
            Memory::default(),
        );
        let lessor = add_user(&service, "lessor", true);
        let alice = add_user(&service, "alice", false);
        let bob = add_user(&service, "bob", false);

        let announcement = service
            .execute(CreateAnnouncement {
                owner_id: lessor,
                title: Title::new("Cozy flat in Berlin").unwrap(),
                description: Description::new("Close to the park.").unwrap(),
                price: "80.50EUR".parse().unwrap(),
                rooms: Rooms::new(2).unwrap(),
                housing_type: HousingType::Apartment,
            })
            .await
            .unwrap()
            .id;

        Self {
            service,
            lessor,
            alice,
            bob,
            announcement,
        }
    }

    async fn book(
        &self,
        renter_id: user::Id,
        from: i64,
        to: i64,
    ) -> std::result::Result<Booking, create_booking::ExecutionError> {
        self.service
            .execute(CreateBooking {
                renter_id,
                announcement_id: self.announcement,
                start_date: in_days(from),
                end_date: in_days(to),
            })
            .await
            .map_err(Traced::into_inner)
    }

    async fn approve(
        &self,
        booking_id: booking::Id,
    ) -> std::result::Result<Booking, approve_booking::ExecutionError> {
        self.service
            .execute(ApproveBooking {
                booking_id,
                initiator_id: self.lessor,
                is_approved: true,
            })
            .await
            .map_err(Traced::into_inner)
    }

    fn stored(&self, id: booking::Id) -> Booking {
        self.service.database().state().bookings[&id].clone()
    }
}

fn add_user(
    service: &Service<Memory>,
    username: &str,
    is_lessor: bool,
) -> user::Id {
    let now = DateTime::now();
    let user = User {
        id: user::Id::new(),
        username: user::Username::new(username).unwrap(),
        name: user::Name::new("Anna").unwrap(),
        surname: user::Name::new("Schmidt").unwrap(),
        email: user::Email::new(format!("{username}@example.com")).unwrap(),
        phone: None,
        is_lessor,
        password_hash: user::PasswordHash::new(
            &user::Password::new("secret123").unwrap(),
        )
        .unwrap(),
        created_at: now.coerce(),
        updated_at: now.coerce(),
        deleted_at: None,
    };
    let id = user.id;
    _ = service.database().state().users.insert(id, user);
    id
}

fn in_days(days: i64) -> Date {
    Date::today().checked_add_days(days).unwrap()
}

#[tokio::test]
async fn creates_pending_booking() {
    let market = Market::new().await;

    let booking = market.book(market.alice, 10, 15).await.unwrap();

    assert_eq!(booking.status, Status::Pending);
    assert!(!booking.is_approved);
    assert!(!booking.canceled);
    assert_eq!(booking.renter_id, market.alice);
    assert_eq!(market.stored(booking.id).start_date, in_days(10));
}

#[tokio::test]
async fn rejects_invalid_periods() {
    let market = Market::new().await;

    assert!(matches!(
        market.book(market.alice, -1, 5).await,
        Err(create_booking::ExecutionError::Invalid(
            ValidationError::PastStartDate,
        )),
    ));
    assert!(matches!(
        market.book(market.alice, 0, 0).await,
        Err(create_booking::ExecutionError::Invalid(
            ValidationError::PastEndDate,
        )),
    ));
    assert!(matches!(
        market.book(market.alice, 10, 5).await,
        Err(create_booking::ExecutionError::Invalid(
            ValidationError::InvertedRange,
        )),
    ));
    assert!(market.service.database().state().bookings.is_empty());
}

#[tokio::test]
async fn rejects_booking_of_inactive_announcement() {
    let market = Market::new().await;
    _ = market
        .service
        .execute(UpdateAnnouncementActivity {
            announcement_id: market.announcement,
            initiator_id: market.lessor,
            is_active: false,
        })
        .await
        .unwrap();

    assert!(matches!(
        market.book(market.alice, 10, 15).await,
        Err(create_booking::ExecutionError::Invalid(
            ValidationError::InactiveAnnouncement,
        )),
    ));
}

#[tokio::test]
async fn rejects_booking_of_unknown_announcement() {
    let market = Market::new().await;
    let unknown = announcement::Id::new();

    let res = market
        .service
        .execute(CreateBooking {
            renter_id: market.alice,
            announcement_id: unknown,
            start_date: in_days(10),
            end_date: in_days(15),
        })
        .await
        .map_err(Traced::into_inner);

    assert!(matches!(
        res,
        Err(create_booking::ExecutionError::AnnouncementNotExists(id))
            if id == unknown,
    ));
}

#[tokio::test]
async fn approval_of_overlapping_booking_is_rejected() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    let b = market.book(market.bob, 15, 20).await.unwrap();
    let c = market.book(market.bob, 16, 20).await.unwrap();

    let approved = market.approve(a.id).await.unwrap();
    assert_eq!(approved.status, Status::Approved);
    assert!(approved.is_approved);
    assert_eq!(
        market.service.database().state().locks,
        [Locked::Announcement(market.announcement), Locked::Booking(a.id)],
    );

    assert!(matches!(
        market.approve(b.id).await,
        Err(approve_booking::ExecutionError::Transition(
            TransitionError::DateConflict,
        )),
    ));
    let b = market.stored(b.id);
    assert_eq!(b.status, Status::Pending);
    assert!(!b.is_approved);

    assert_eq!(market.approve(c.id).await.unwrap().status, Status::Approved);
}

#[tokio::test]
async fn concurrently_reserved_dates_fail_approval() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    let rival = market.book(market.bob, 12, 18).await.unwrap();
    {
        let mut state = market.service.database().state();
        let mut rival = state.bookings.remove(&rival.id).unwrap();
        rival.status = Status::Approved;
        rival.is_approved = true;
        state.concurrent.push(rival);
    }

    assert!(matches!(
        market.approve(a.id).await,
        Err(approve_booking::ExecutionError::Transition(
            TransitionError::DateConflict,
        )),
    ));
    assert_eq!(market.stored(a.id).status, Status::Pending);
}

#[tokio::test]
async fn booking_over_approved_dates_is_rejected() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    _ = market.approve(a.id).await.unwrap();

    assert!(matches!(
        market.book(market.bob, 12, 18).await,
        Err(create_booking::ExecutionError::Invalid(
            ValidationError::DateConflict,
        )),
    ));
}

#[tokio::test]
async fn only_owner_approves() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();

    let res = market
        .service
        .execute(ApproveBooking {
            booking_id: a.id,
            initiator_id: market.alice,
            is_approved: true,
        })
        .await
        .map_err(Traced::into_inner);

    assert!(matches!(
        res,
        Err(approve_booking::ExecutionError::BookingNotExists(_)),
    ));
    assert_eq!(market.stored(a.id).status, Status::Pending);
}

#[tokio::test]
async fn unset_approval_changes_nothing() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();

    let same = market
        .service
        .execute(ApproveBooking {
            booking_id: a.id,
            initiator_id: market.lessor,
            is_approved: false,
        })
        .await
        .unwrap();

    assert_eq!(same.status, Status::Pending);
    assert_eq!(market.stored(a.id).updated_at, a.updated_at);
}

#[tokio::test]
async fn cancellation_releases_dates_and_is_terminal() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    _ = market.approve(a.id).await.unwrap();

    let cancel = CancelBooking {
        booking_id: a.id,
        initiator_id: market.alice,
        canceled: true,
    };
    let cancelled = market.service.execute(cancel).await.unwrap();
    assert_eq!(cancelled.status, Status::Cancelled);
    assert!(cancelled.canceled);
    assert!(!cancelled.is_approved);

    let again = market.service.execute(cancel).await.unwrap();
    assert_eq!(again.status, Status::Cancelled);
    assert_eq!(again.updated_at, cancelled.updated_at);

    assert!(matches!(
        market.approve(a.id).await,
        Err(approve_booking::ExecutionError::Transition(
            TransitionError::AlreadyCancelled,
        )),
    ));

    let b = market.book(market.bob, 12, 14).await.unwrap();
    assert_eq!(market.approve(b.id).await.unwrap().status, Status::Approved);
}

#[tokio::test]
async fn lessor_cancels_but_stranger_does_not() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();

    let res = market
        .service
        .execute(CancelBooking {
            booking_id: a.id,
            initiator_id: market.bob,
            canceled: true,
        })
        .await
        .map_err(Traced::into_inner);
    assert!(matches!(
        res,
        Err(cancel_booking::ExecutionError::BookingNotExists(_)),
    ));

    let cancelled = market
        .service
        .execute(CancelBooking {
            booking_id: a.id,
            initiator_id: market.lessor,
            canceled: true,
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status, Status::Cancelled);
}

#[tokio::test]
async fn renter_updates_own_booking_only() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();

    let res = market
        .service
        .execute(UpdateBooking {
            booking_id: a.id,
            initiator_id: market.bob,
            announcement_id: None,
            start_date: Some(in_days(11)),
            end_date: None,
        })
        .await
        .map_err(Traced::into_inner);
    assert!(matches!(
        res,
        Err(update_booking::ExecutionError::BookingNotExists(_)),
    ));

    let res = market
        .service
        .execute(UpdateBooking {
            booking_id: a.id,
            initiator_id: market.alice,
            announcement_id: None,
            start_date: Some(in_days(16)),
            end_date: None,
        })
        .await
        .map_err(Traced::into_inner);
    assert!(matches!(
        res,
        Err(update_booking::ExecutionError::Invalid(
            ValidationError::InvertedRange,
        )),
    ));

    let updated = market
        .service
        .execute(UpdateBooking {
            booking_id: a.id,
            initiator_id: market.alice,
            announcement_id: None,
            start_date: Some(in_days(11)),
            end_date: None,
        })
        .await
        .unwrap();
    assert_eq!(updated.start_date, in_days(11));
    assert_eq!(updated.end_date, in_days(15));
}

#[tokio::test]
async fn rescheduled_approved_booking_awaits_approval_again() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    _ = market.approve(a.id).await.unwrap();

    let updated = market
        .service
        .execute(UpdateBooking {
            booking_id: a.id,
            initiator_id: market.alice,
            announcement_id: None,
            start_date: None,
            end_date: Some(in_days(14)),
        })
        .await
        .unwrap();

    assert_eq!(updated.end_date, in_days(14));
    assert_eq!(updated.status, Status::Pending);
    assert!(!market.stored(a.id).is_reserving());

    let approved = market.approve(a.id).await.unwrap();
    assert_eq!(approved.status, Status::Approved);
}

#[tokio::test]
async fn moved_booking_is_not_approved_by_new_lessor() {
    let market = Market::new().await;
    let other_lessor = add_user(&market.service, "other", true);
    let other = market
        .service
        .execute(CreateAnnouncement {
            owner_id: other_lessor,
            title: Title::new("Loft in Hamburg").unwrap(),
            description: Description::new("Near the harbour.").unwrap(),
            price: "120EUR".parse().unwrap(),
            rooms: Rooms::new(3).unwrap(),
            housing_type: HousingType::Loft,
        })
        .await
        .unwrap()
        .id;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    _ = market.approve(a.id).await.unwrap();
    market.service.database().state().locks.clear();

    let moved = market
        .service
        .execute(UpdateBooking {
            booking_id: a.id,
            initiator_id: market.alice,
            announcement_id: Some(other),
            start_date: None,
            end_date: None,
        })
        .await
        .unwrap();

    let mut announcements = [market.announcement, other];
    announcements.sort_unstable();
    assert_eq!(
        market.service.database().state().locks,
        [
            Locked::Announcement(announcements[0]),
            Locked::Announcement(announcements[1]),
            Locked::Booking(a.id),
        ],
    );
    assert_eq!(moved.announcement_id, other);
    assert_eq!(moved.status, Status::Pending);
    assert!(!moved.is_approved);
    assert!(!market.stored(a.id).is_reserving());
}

#[tokio::test]
async fn deleted_booking_disappears() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();

    let res = market
        .service
        .execute(DeleteBooking {
            booking_id: a.id,
            initiator_id: market.bob,
        })
        .await
        .map_err(Traced::into_inner);
    assert!(matches!(
        res,
        Err(delete_booking::ExecutionError::BookingNotExists(_)),
    ));

    let deleted = market
        .service
        .execute(DeleteBooking {
            booking_id: a.id,
            initiator_id: market.alice,
        })
        .await
        .unwrap();
    assert!(deleted.is_deleted());
    assert!(market.stored(a.id).is_deleted());

    let found = market
        .service
        .execute(query::booking::ById::by(a.id))
        .await
        .unwrap();
    assert!(found.is_none());
    assert!(matches!(
        market.approve(a.id).await,
        Err(approve_booking::ExecutionError::BookingNotExists(_)),
    ));
}

#[tokio::test]
async fn lists_bookings_by_role() {
    let market = Market::new().await;
    let a = market.book(market.alice, 10, 15).await.unwrap();
    let b = market.book(market.bob, 20, 25).await.unwrap();
    let c = market.book(market.alice, 30, 35).await.unwrap();

    let page = |filter, first: i32| {
        query::bookings::List::by(read::booking::list::Selector {
            arguments: read::booking::list::Arguments::new(
                Some(first),
                None,
                20,
            )
            .unwrap(),
            filter,
        })
    };

    let alice = market
        .service
        .execute(page(read::booking::list::Filter::Renter(market.alice), 20))
        .await
        .unwrap();
    let mut ids = alice.nodes().map(|b| b.id).collect::<Vec<_>>();
    ids.sort();
    let mut expected = vec![a.id, c.id];
    expected.sort();
    assert_eq!(ids, expected);

    let lessor = market
        .service
        .execute(page(read::booking::list::Filter::Lessor(market.lessor), 2))
        .await
        .unwrap();
    assert_eq!(lessor.edges.len(), 2);
    assert!(lessor.has_more);

    let bob_as_lessor = market
        .service
        .execute(page(read::booking::list::Filter::Lessor(market.bob), 20))
        .await
        .unwrap();
    assert!(bob_as_lessor.is_empty());
    assert!(alice.nodes().all(|n| n.id != b.id));
}
