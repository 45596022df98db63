//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a SQL query selecting a single alive [`User`] matching the provided
/// condition on `$1`.
macro_rules! select_alive_user {
    ($cond:literal) => {
        concat!(
            "SELECT id, username, name, surname, email, phone, is_lessor, \
                    password_hash, created_at, updated_at, deleted_at \
             FROM users \
             WHERE ",
            $cond,
            " AND deleted_at IS NULL \
             LIMIT 1",
        )
    };
}

/// Reads a [`User`] out of the provided [`Row`].
fn user_from(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        name: row.get("name"),
        surname: row.get("surname"),
        email: row.get("email"),
        phone: row.get("phone"),
        is_lessor: row.get("is_lessor"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C: Connection> Postgres<C> {
    /// Selects a single alive [`User`] with the provided SQL query.
    async fn select_user(
        &self,
        sql: &str,
        key: &(dyn ToSql + Sync),
    ) -> Result<Option<User>, Traced<database::Error>> {
        Ok(self
            .query_opt(sql, &[key])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(user_from))
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = select_alive_user!("id = $1::UUID");
        self.select_user(SQL, &by.into_inner())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = select_alive_user!("email = $1::VARCHAR");
        self.select_user(SQL, by.into_inner())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Username>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = select_alive_user!("username = $1::VARCHAR");
        self.select_user(SQL, by.into_inner())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO users (\
                id, username, name, surname, email, phone, is_lessor, \
                password_hash, created_at, updated_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::VARCHAR, $6::VARCHAR, $7::BOOL, $8::VARCHAR, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ, $11::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET (\
                username, name, surname, email, phone, is_lessor, \
                password_hash, updated_at, deleted_at\
            ) = (\
                EXCLUDED.username, EXCLUDED.name, EXCLUDED.surname, \
                EXCLUDED.email, EXCLUDED.phone, EXCLUDED.is_lessor, \
                EXCLUDED.password_hash, EXCLUDED.updated_at, \
                EXCLUDED.deleted_at\
            )";
        _ = self
            .exec(
                SQL,
                &[
                    &user.id,
                    &user.username,
                    &user.name,
                    &user.surname,
                    &user.email,
                    &user.phone,
                    &user.is_lessor,
                    &user.password_hash,
                    &user.created_at,
                    &user.updated_at,
                    &user.deleted_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        Ok(())
    }
}
