//! [`Booking`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `bookings` table selected into a [`Booking`].
const COLUMNS: &str = "\
    b.id, b.renter_id, b.announcement_id, \
    b.start_date, b.end_date, \
    b.status, b.is_approved, b.canceled, \
    b.created_at, b.updated_at, b.deleted_at";

/// Builds a [`Booking`] out of the provided [`Row`] selected with the
/// [`COLUMNS`].
fn from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        renter_id: row.get("renter_id"),
        announcement_id: row.get("announcement_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        is_approved: row.get("is_approved"),
        canceled: row.get("canceled"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings b \
             WHERE b.id = $1::UUID \
               AND b.deleted_at IS NULL \
             LIMIT 1"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Booking>, read::booking::Conflicts>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, read::booking::Conflicts>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::Conflicts {
            announcement_id,
            period,
        } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings b \
             WHERE b.announcement_id = $1::UUID \
               AND b.is_approved \
               AND NOT b.canceled \
               AND b.deleted_at IS NULL \
               AND b.start_date <= $3::DATE \
               AND b.end_date >= $2::DATE"
        );
        Ok(self
            .query(&sql, &[&announcement_id, &period.start, &period.end])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            renter_id,
            announcement_id,
            start_date,
            end_date,
            status,
            is_approved,
            canceled,
            created_at,
            updated_at,
            deleted_at,
        } = booking;

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, renter_id, announcement_id, \
                start_date, end_date, \
                status, is_approved, canceled, \
                created_at, updated_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::DATE, \
                $6::VARCHAR, $7::BOOL, $8::BOOL, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ, $11::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET announcement_id = EXCLUDED.announcement_id, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                status = EXCLUDED.status, \
                is_approved = EXCLUDED.is_approved, \
                canceled = EXCLUDED.canceled, \
                updated_at = EXCLUDED.updated_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &renter_id,
                &announcement_id,
                &start_date,
                &end_date,
                &status,
                &is_approved,
                &canceled,
                &created_at,
                &updated_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::booking::list::Page, read::booking::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        use read::booking::list::Filter;

        let read::booking::list::Selector { arguments, filter } =
            by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);
        let (user_id, user_filtering) = match filter {
            Filter::Renter(id) => (id, "b.renter_id = $2::UUID"),
            Filter::Lessor(id) => (
                id,
                "b.announcement_id IN (\
                     SELECT a.id \
                     FROM announcements a \
                     WHERE a.owner_id = $2::UUID\
                 )",
            ),
        };
        let cursor_filtering = if arguments.cursor().is_some() {
            "AND (b.created_at, b.id) < (\
                 SELECT c.created_at, c.id \
                 FROM bookings c \
                 WHERE c.id = $3::UUID\
             )"
        } else {
            ""
        };

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings b \
             WHERE b.deleted_at IS NULL \
                   AND {user_filtering} \
                   {cursor_filtering} \
             ORDER BY b.created_at DESC, b.id DESC \
             LIMIT $1::INT4"
        );
        let rows = if let Some(cursor) = arguments.cursor() {
            self.query(&sql, &[&limit, &user_id, cursor]).await
        } else {
            self.query(&sql, &[&limit, &user_id]).await
        }
        .map_err(tracerr::wrap!())?;

        Ok(read::booking::list::Page::from_overfetched(
            &arguments,
            rows.iter().map(from_row),
            |b| b.id,
        ))
    }
}
