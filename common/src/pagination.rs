//! Abstractions for cursor-based forward pagination.

use std::fmt;

/// Generic pagination connection.
#[derive(Clone, Debug)]
pub struct Connection<C, I> {
    /// [`Edge`]s in this [`Connection`].
    pub edges: Vec<Edge<C, I>>,

    /// Indicator whether this [`Connection`] has more nodes.
    pub has_more: bool,
}

/// A page in a [`Connection`].
pub type Page<C, I> = Connection<C, I>;

impl<C, I> Connection<C, I> {
    /// Creates a new [`Connection`] from the provided [`Edge`]s.
    #[must_use]
    pub fn new(
        edges: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
        has_more: bool,
    ) -> Self {
        Self {
            edges: edges.into_iter().map(Into::into).collect(),
            has_more,
        }
    }

    /// Creates a new [`Connection`] out of the nodes selected with the limit
    /// of the provided [`Arguments`] increased by one.
    ///
    /// The extra node, if any, is dropped and only signals that a next page
    /// exists.
    #[must_use]
    pub fn from_overfetched(
        args: &Arguments<C>,
        nodes: impl IntoIterator<Item = I>,
        cursor: impl Fn(&I) -> C,
    ) -> Self {
        let mut edges = nodes
            .into_iter()
            .map(|node| Edge {
                cursor: cursor(&node),
                node,
            })
            .collect::<Vec<_>>();
        let has_more = edges.len() > args.first;
        edges.truncate(args.first);
        Self { edges, has_more }
    }

    /// Returns [`PageInfo`] of this [`Connection`].
    #[must_use]
    pub fn page_info(&self) -> PageInfo<C>
    where
        C: Clone,
    {
        PageInfo {
            end_cursor: self.edges.last().map(|e| e.cursor.clone()),
            has_next_page: self.has_more,
        }
    }

    /// Checks whether this [`Connection`] contains no [`Edge`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns an iterator over the nodes of this [`Connection`].
    pub fn nodes(&self) -> impl Iterator<Item = &I> {
        self.edges.iter().map(|e| &e.node)
    }
}

/// Information about a page in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct PageInfo<C> {
    /// Last cursor on this page.
    pub end_cursor: Option<C>,

    /// Indicator whether [`Connection`] has a next page.
    pub has_next_page: bool,
}

/// An edge in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct Edge<C, I> {
    /// Cursor of this [`Edge`].
    pub cursor: C,

    /// Node of this [`Edge`].
    pub node: I,
}

impl<C, I> From<(C, I)> for Edge<C, I> {
    fn from((cursor, node): (C, I)) -> Self {
        Self { cursor, node }
    }
}

/// Forward pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments<C> {
    /// Number of items to return.
    pub first: usize,

    /// Cursor after which to return items.
    pub after: Option<C>,
}

impl<C> Arguments<C> {
    /// Upper bound of the number of items requested at once.
    pub const MAX_FIRST: usize = 100;

    /// Creates new [`Arguments`].
    ///
    /// [`None`] is returned if `first` is zero, negative or exceeds
    /// [`Arguments::MAX_FIRST`].
    pub fn new<Num>(
        first: Option<Num>,
        after: Option<C>,
        default: Num,
    ) -> Option<Self>
    where
        Num: TryInto<usize> + fmt::Debug,
    {
        let first = first.unwrap_or(default).try_into().ok()?;
        (1..=Self::MAX_FIRST)
            .contains(&first)
            .then_some(Self { first, after })
    }

    /// Returns cursor requested by these [`Arguments`].
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        self.after.as_ref()
    }

    /// Returns limit requested by these [`Arguments`].
    #[must_use]
    pub fn limit(&self) -> usize {
        self.first
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "Edge of a [`Connection`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "A [`Connection`] of nodes."]
        pub type Connection = $crate::pagination::Connection<$cursor, $node>;

        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "An information about a [`Page`]."]
        pub type PageInfo = $crate::pagination::PageInfo<$cursor>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Connection};

    #[test]
    fn arguments_fall_back_to_default() {
        let args = Arguments::<u32>::new(None, None, 20).unwrap();

        assert_eq!(args.limit(), 20);
        assert_eq!(args.cursor(), None);
    }

    #[test]
    fn arguments_reject_out_of_range_limits() {
        assert!(Arguments::<u32>::new(Some(0), None, 20).is_none());
        assert!(Arguments::<u32>::new(Some(-1), None, 20).is_none());
        assert!(Arguments::<u32>::new(Some(101), None, 20).is_none());
        assert!(Arguments::new(Some(100), Some(7_u32), 20).is_some());
    }

    #[test]
    fn overfetched_connection_detects_next_page() {
        let args = Arguments::new(Some(2), None, 20).unwrap();

        let page = Connection::from_overfetched(&args, [1, 2, 3], |n| *n);
        assert!(page.has_more);
        assert_eq!(page.nodes().copied().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(page.page_info().end_cursor, Some(2));

        let last = Connection::from_overfetched(&args, [3], |n| *n);
        assert!(!last.has_more);
        assert!(!last.page_info().has_next_page);
    }
}
