//! Favorite and subscription stores
//!
//! Two link tables with different shapes get two distinct store types: the
//! favorites table is plain set membership, the subscriptions table carries
//! a four-flag notification vector. Both rely on the unique (user_id,
//! company_id) pair plus upsert semantics, so concurrent toggles from the
//! same user resolve in the database rather than with application locks.

use sqlx::PgPool;
use std::collections::HashSet;
use tracing::instrument;

use crate::error::DatabaseResult;
use crate::types::NotificationFlags;

/// Set-membership store over `user_company_favorites`
#[derive(Clone)]
pub struct FavoriteStore {
    pool: PgPool,
}

impl FavoriteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a favorite. Re-adding an existing favorite is a no-op, not an
    /// error; returns whether a new row was inserted.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: i64, company_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_company_favorites (user_id, company_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, company_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a favorite. Removing an absent favorite is a no-op; returns
    /// whether a row was deleted.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: i64, company_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "DELETE FROM user_company_favorites WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_favorited(&self, user_id: i64, company_id: i64) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_company_favorites \
             WHERE user_id = $1 AND company_id = $2)",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Which of `company_ids` the user has favorited, as one batch lookup.
    /// List views call this once per page instead of once per row.
    #[instrument(skip(self, company_ids), fields(candidates = company_ids.len()))]
    pub async fn favorited_ids(
        &self,
        user_id: i64,
        company_ids: &[i64],
    ) -> DatabaseResult<HashSet<i64>> {
        if company_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT company_id FROM user_company_favorites \
             WHERE user_id = $1 AND company_id = ANY($2)",
        )
        .bind(user_id)
        .bind(company_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}

/// Attributed-relation store over `company_subscriptions`
#[derive(Clone)]
pub struct SubscriptionStore {
    pool: PgPool,
}

impl SubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(
        &self,
        user_id: i64,
        company_id: i64,
    ) -> DatabaseResult<Option<NotificationFlags>> {
        let flags = sqlx::query_as::<_, NotificationFlags>(
            "SELECT notify_recommendations, notify_updates, notify_news, notify_price_alerts \
             FROM company_subscriptions WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(flags)
    }

    /// Create the subscription or fully replace its four flags. Concurrent
    /// upserts for the same pair resolve last-write-wins.
    #[instrument(skip(self, flags))]
    pub async fn upsert(
        &self,
        user_id: i64,
        company_id: i64,
        flags: NotificationFlags,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO company_subscriptions \
             (user_id, company_id, notify_recommendations, notify_updates, notify_news, notify_price_alerts) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, company_id) DO UPDATE SET \
                notify_recommendations = EXCLUDED.notify_recommendations, \
                notify_updates = EXCLUDED.notify_updates, \
                notify_news = EXCLUDED.notify_news, \
                notify_price_alerts = EXCLUDED.notify_price_alerts, \
                updated_at = now()",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(flags.notify_recommendations)
        .bind(flags.notify_updates)
        .bind(flags.notify_news)
        .bind(flags.notify_price_alerts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove the subscription row if present; absent rows are a no-op.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: i64, company_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "DELETE FROM company_subscriptions WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
