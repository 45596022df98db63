//! [`Announcement`] read model definition.
//!
//! [`Announcement`]: crate::domain::Announcement

pub mod list {
    //! [`Announcement`]s list definitions.

    use common::define_pagination;

    use crate::domain::{
        announcement::{self, HousingType, Rooms},
        Announcement,
    };

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = Announcement;

    /// Cursor pointing to a specific [`Announcement`] in a list.
    pub type Cursor = announcement::Id;

    /// Filter for [`Selector`].
    ///
    /// Only active [`Announcement`]s are ever listed.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Words to fuzzy search for in [`Announcement`] titles and
        /// descriptions.
        pub search: Option<String>,

        /// [`HousingType`] to list.
        pub housing_type: Option<HousingType>,

        /// Minimal number of [`Rooms`].
        pub min_rooms: Option<Rooms>,

        /// Maximal number of [`Rooms`].
        pub max_rooms: Option<Rooms>,
    }
}
