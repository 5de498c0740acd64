//! `PostgreSQL` gateway implementation.
//!
//! Queries are built at runtime (`sqlx::query_as` / `QueryBuilder`); dynamic
//! filter and sort fragments only ever interpolate whitelisted column names
//! from the closed sort-key enums, user input is always bound.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use store_ratings_core::{Email, RatingId, RatingValue, StoreId, UserId};

use super::RepositoryError;
use super::gateway::{Gateway, StoreFilter, UserFilter};
use crate::models::{
    NewStore, NewUser, Rating, RatingSummary, RatingWithStore, RatingWithUser, Store,
    StoreChanges, StoreWithRating, User,
};

const USER_COLUMNS: &str = "id, name, email, address, role, created_at, updated_at";
const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at, updated_at";

/// Gateway backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Create a new gateway over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row shape for login lookups.
#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Map a unique-violation database error to a `Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

#[async_trait]
impl Gateway for PgGateway {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, address, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.address)
        .bind(new_user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user email"))
    }

    async fn update_user_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));

        if let Some(name) = &filter.name {
            qb.push(" AND name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(email) = &filter.email {
            qb.push(" AND email ILIKE ");
            qb.push_bind(format!("%{email}%"));
        }
        if let Some(address) = &filter.address {
            qb.push(" AND address ILIKE ");
            qb.push_bind(format!("%{address}%"));
        }
        if let Some(role) = filter.role {
            qb.push(" AND role = ");
            qb.push_bind(role);
        }

        match filter.sort_by {
            Some(key) => {
                qb.push(" ORDER BY ");
                qb.push(key.column());
                qb.push(" ");
                qb.push(filter.sort_order.sql());
            }
            None => {
                qb.push(" ORDER BY created_at DESC");
            }
        }

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(store)
    }

    async fn find_store_by_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE owner_id = $1"
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(store)
    }

    async fn insert_store(&self, new_store: &NewStore) -> Result<Store, RepositoryError> {
        sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (name, email, address, owner_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&new_store.name)
        .bind(&new_store.email)
        .bind(&new_store.address)
        .bind(new_store.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "store email"))
    }

    async fn update_store_fields(
        &self,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<bool, RepositoryError> {
        if changes.is_empty() {
            return Ok(false);
        }

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE stores SET updated_at = NOW()");

        if let Some(name) = &changes.name {
            qb.push(", name = ");
            qb.push_bind(name);
        }
        if let Some(email) = &changes.email {
            qb.push(", email = ");
            qb.push_bind(email);
        }
        if let Some(address) = &changes.address {
            qb.push(", address = ");
            qb.push_bind(address);
        }
        if let Some(owner_id) = changes.owner_id {
            qb.push(", owner_id = ");
            qb.push_bind(owner_id);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "store email"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn duplicate_store_exists(
        &self,
        name: Option<&str>,
        email: Option<&Email>,
        exclude: Option<StoreId>,
    ) -> Result<bool, RepositoryError> {
        if name.is_none() && email.is_none() {
            return Ok(false);
        }

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM stores WHERE (FALSE");

        if let Some(name) = name {
            qb.push(" OR name = ");
            qb.push_bind(name);
        }
        if let Some(email) = email {
            qb.push(" OR email = ");
            qb.push_bind(email);
        }
        qb.push(")");

        if let Some(exclude) = exclude {
            qb.push(" AND id <> ");
            qb.push_bind(exclude);
        }
        qb.push(")");

        let (exists,): (bool,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(exists)
    }

    async fn list_stores(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithRating>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT s.id, s.name, s.email, s.address, s.owner_id, \
                    u.name AS owner_name, \
                    COALESCE(AVG(r.rating), 0)::DOUBLE PRECISION AS average_rating, \
                    COUNT(r.id) AS total_ratings, \
                    s.created_at, s.updated_at \
             FROM stores s \
             LEFT JOIN users u ON s.owner_id = u.id \
             LEFT JOIN ratings r ON r.store_id = s.id \
             WHERE TRUE",
        );

        if let Some(name) = &filter.name {
            qb.push(" AND s.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(address) = &filter.address {
            qb.push(" AND s.address ILIKE ");
            qb.push_bind(format!("%{address}%"));
        }

        qb.push(" GROUP BY s.id, u.name");

        match filter.sort_by {
            Some(key) => {
                qb.push(" ORDER BY ");
                qb.push(key.column());
                qb.push(" ");
                qb.push(filter.sort_order.sql());
            }
            None => {
                qb.push(" ORDER BY s.created_at DESC");
            }
        }

        let stores = qb
            .build_query_as::<StoreWithRating>()
            .fetch_all(&self.pool)
            .await?;
        Ok(stores)
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT id, user_id, store_id, rating, created_at, updated_at \
             FROM ratings WHERE user_id = $1 AND store_id = $2",
        )
        .bind(user)
        .bind(store)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn insert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (user_id, store_id, rating) \
             VALUES ($1, $2, $3) \
             RETURNING id, user_id, store_id, rating, created_at, updated_at",
        )
        .bind(user)
        .bind(store)
        .bind(value)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "rating"))
    }

    async fn update_rating_value(
        &self,
        id: RatingId,
        value: RatingValue,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE ratings SET rating = $1, updated_at = NOW() WHERE id = $2")
                .bind(value)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM ratings WHERE user_id = $1 AND store_id = $2")
            .bind(user)
            .bind(store)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rating_summary(&self, store: StoreId) -> Result<RatingSummary, RepositoryError> {
        let (average_rating, total_ratings): (f64, i64) = sqlx::query_as(
            "SELECT COALESCE(AVG(rating), 0)::DOUBLE PRECISION, COUNT(*) \
             FROM ratings WHERE store_id = $1",
        )
        .bind(store)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingSummary {
            average_rating,
            total_ratings,
        })
    }

    async fn ratings_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithUser>, RepositoryError> {
        let ratings = sqlx::query_as::<_, RatingWithUser>(
            "SELECT r.id, r.user_id, r.rating, \
                    u.name AS user_name, u.email AS user_email, r.created_at \
             FROM ratings r \
             JOIN users u ON r.user_id = u.id \
             WHERE r.store_id = $1 \
             ORDER BY r.created_at DESC",
        )
        .bind(store)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn ratings_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<RatingWithStore>, RepositoryError> {
        let ratings = sqlx::query_as::<_, RatingWithStore>(
            "SELECT r.id, r.store_id, r.rating, \
                    s.name AS store_name, s.address AS store_address, \
                    r.created_at, r.updated_at \
             FROM ratings r \
             JOIN stores s ON r.store_id = s.id \
             WHERE r.user_id = $1 \
             ORDER BY r.created_at DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
