//! [`Announcement`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{announcement, Announcement},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of the `announcements` table selected into an [`Announcement`].
const COLUMNS: &str = "\
    id, title, description, owner_id, \
    price_amount, price_currency, \
    rooms, housing_type, is_active, \
    created_at, updated_at, deleted_at";

/// Builds an [`Announcement`] out of the provided [`Row`] selected with the
/// [`COLUMNS`].
fn from_row(row: &Row) -> Announcement {
    Announcement {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        price: Money {
            amount: row.get("price_amount"),
            currency: row.get("price_currency"),
        },
        rooms: row.get("rooms"),
        housing_type: row.get("housing_type"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<announcement::Id, Announcement>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[announcement::Id]>,
{
    type Ok = HashMap<announcement::Id, Announcement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<announcement::Id, Announcement>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[announcement::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM announcements \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
                   AND deleted_at IS NULL \
             LIMIT $2::INT4"
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let a = from_row(row);
                (a.id, a)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Announcement>, announcement::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<announcement::Id, Announcement>, [announcement::Id; 1]>>,
        Ok = HashMap<announcement::Id, Announcement>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Announcement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Announcement>, announcement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Announcement>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Announcement>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(announcement): Insert<Announcement>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(announcement))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Announcement>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(announcement): Update<Announcement>,
    ) -> Result<Self::Ok, Self::Err> {
        let Announcement {
            id,
            title,
            description,
            owner_id,
            price,
            rooms,
            housing_type,
            is_active,
            created_at,
            updated_at,
            deleted_at,
        } = announcement;

        const SQL: &str = "\
            INSERT INTO announcements (\
                id, title, description, owner_id, \
                price_amount, price_currency, \
                rooms, housing_type, is_active, \
                created_at, updated_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::TEXT, $4::UUID, \
                $5::NUMERIC, $6::VARCHAR, \
                $7::INT4, $8::VARCHAR, $9::BOOL, \
                $10::TIMESTAMPTZ, $11::TIMESTAMPTZ, $12::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                price_amount = EXCLUDED.price_amount, \
                price_currency = EXCLUDED.price_currency, \
                rooms = EXCLUDED.rooms, \
                housing_type = EXCLUDED.housing_type, \
                is_active = EXCLUDED.is_active, \
                updated_at = EXCLUDED.updated_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &title,
                &description,
                &owner_id,
                &price.amount,
                &price.currency,
                &rooms,
                &housing_type,
                &is_active,
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

impl<C> Database<Lock<By<Announcement, announcement::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Announcement, announcement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: announcement::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM announcements \
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
        Select<
            By<
                read::announcement::list::Page,
                read::announcement::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::announcement::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::announcement::list::Page,
                read::announcement::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::announcement::list::Selector {
            arguments,
            filter:
                read::announcement::list::Filter {
                    search,
                    housing_type,
                    min_rooms,
                    max_rooms,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let search_pattern =
            search.as_deref().map(FuzzPattern::new);
        let search_idx = search_pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let housing_type_idx = housing_type.as_ref().map(|t| {
            ps.push(t);
            ps.len()
        });
        let min_rooms_idx = min_rooms.as_ref().map(|r| {
            ps.push(r);
            ps.len()
        });
        let max_rooms_idx = max_rooms.as_ref().map(|r| {
            ps.push(r);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM announcements \
             WHERE is_active \
                   AND deleted_at IS NULL \
                   {cursor} \
                   {search_filtering} \
                   {housing_type_filtering} \
                   {min_rooms_filtering} \
                   {max_rooms_filtering} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND (created_at, id) < (\
                         SELECT created_at, id \
                         FROM announcements \
                         WHERE id = ${idx}::UUID\
                     )"
                ))
            }),
            search_filtering =
                search_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND LOWER(title || ' ' || description) \
                             SIMILAR TO LOWER(${idx}::VARCHAR)"
                    ))
                }),
            housing_type_filtering =
                housing_type_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND housing_type = ${idx}::VARCHAR"))
                }),
            min_rooms_filtering =
                min_rooms_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND rooms >= ${idx}::INT4"))
                }),
            max_rooms_filtering =
                max_rooms_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND rooms <= ${idx}::INT4"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::announcement::list::Page::from_overfetched(
            &arguments,
            rows.iter().map(from_row),
            |a| a.id,
        ))
    }
}
