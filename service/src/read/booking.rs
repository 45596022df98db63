//! [`Booking`] read model definition.

use crate::domain::{announcement, booking::Period};
#[cfg(doc)]
use crate::domain::{Announcement, Booking};

/// Selector of the approved, not cancelled and not deleted [`Booking`]s of an
/// [`Announcement`] overlapping the provided [`Period`].
#[derive(Clone, Copy, Debug)]
pub struct Conflicts {
    /// ID of the [`Announcement`] to select [`Booking`]s of.
    pub announcement_id: announcement::Id,

    /// [`Period`] the selected [`Booking`]s overlap.
    pub period: Period,
}

pub mod list {
    //! [`Booking`]s list definitions.

    use common::define_pagination;

    use crate::domain::{booking, user, Booking};
    #[cfg(doc)]
    use crate::domain::{Announcement, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = Booking;

    /// Cursor pointing to a specific [`Booking`] in a list.
    pub type Cursor = booking::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum Filter {
        /// [`Booking`]s made by the renter [`User`].
        Renter(user::Id),

        /// [`Booking`]s of the [`Announcement`]s owned by the lessor [`User`].
        Lessor(user::Id),
    }
}
