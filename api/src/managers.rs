//! Service layer for company browsing, aggregation and relationship
//! toggles.
//!
//! `CompanyBrowser` drives the listing/search views, `CompanyAggregator`
//! composes the company detail payload out of its bounded windows, and
//! `RelationshipManager` owns the favorite/subscribe mutations. Handlers
//! stay thin and call into these.

use chrono::{Duration, Utc};
use std::collections::HashSet;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CompanyDetailView, CompanyIndexView, CompanyListItem, FavoriteStatus, FavoritesView,
    ListCompaniesQuery, ListFilters, PageQuery, PaginationMeta, SubscriptionRequest,
    SubscriptionStatus, PAGE_SIZE,
};
use sahm_database::{
    CompanyFilter, CompanyRecord, CompanyRepository, FavoriteStore, NotificationFlags,
    SubscriptionStore,
};

/// Detail-view window policy: how much related history each collection
/// carries.
const NEWS_WINDOW: i64 = 10;
const RATINGS_WINDOW: i64 = 5;
const EARNINGS_WINDOW: i64 = 5;
const DIVIDENDS_WINDOW: i64 = 5;
const SPLITS_WINDOW: i64 = 5;
const FINANCIALS_WINDOW: i64 = 5;
const TIME_SERIES_DAYS: i64 = 30;
const RELATED_LIMIT: i64 = 4;

/// Resolve an incoming subscription request against the stored state.
///
/// On creation, omitted flags take the documented defaults. On an existing
/// subscription the request replaces the whole vector, so an omitted flag
/// disables that channel rather than preserving it.
pub fn resolve_subscription_flags(
    existing: Option<NotificationFlags>,
    request: &SubscriptionRequest,
) -> NotificationFlags {
    match existing {
        None => {
            let defaults = NotificationFlags::default();
            NotificationFlags {
                notify_recommendations: request
                    .notify_recommendations
                    .unwrap_or(defaults.notify_recommendations),
                notify_updates: request.notify_updates.unwrap_or(defaults.notify_updates),
                notify_news: request.notify_news.unwrap_or(defaults.notify_news),
                notify_price_alerts: request
                    .notify_price_alerts
                    .unwrap_or(defaults.notify_price_alerts),
            }
        }
        Some(_) => NotificationFlags {
            notify_recommendations: request.notify_recommendations.unwrap_or(false),
            notify_updates: request.notify_updates.unwrap_or(false),
            notify_news: request.notify_news.unwrap_or(false),
            notify_price_alerts: request.notify_price_alerts.unwrap_or(false),
        },
    }
}

/// Annotate listing rows with the viewer's favorite state using one batch
/// lookup, never one query per row.
async fn favorite_markers(
    favorites: &FavoriteStore,
    viewer: Option<i64>,
    company_ids: &[i64],
) -> ApiResult<HashSet<i64>> {
    match viewer {
        Some(user_id) if !company_ids.is_empty() => {
            Ok(favorites.favorited_ids(user_id, company_ids).await?)
        }
        _ => Ok(HashSet::new()),
    }
}

/// Listing and search over companies
pub struct CompanyBrowser {
    repo: CompanyRepository,
    favorites: FavoriteStore,
}

impl CompanyBrowser {
    pub fn new(repo: CompanyRepository, favorites: FavoriteStore) -> Self {
        Self { repo, favorites }
    }

    /// Filtered, paginated company listing with per-row favorite state and
    /// the type options for the filter controls
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListCompaniesQuery,
        viewer: Option<i64>,
    ) -> ApiResult<CompanyIndexView> {
        let filter = CompanyFilter {
            search: query.search.clone(),
            type_id: query.type_id,
        };

        let (rows, total) = self.repo.list(&filter, PAGE_SIZE, query.offset()).await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let favored = favorite_markers(&self.favorites, viewer, &ids).await?;

        let companies = rows
            .into_iter()
            .map(|row| {
                let is_favorited = favored.contains(&row.id);
                CompanyListItem::from_row(row, is_favorited)
            })
            .collect();

        let types = self.repo.types().await?.into_iter().map(Into::into).collect();

        Ok(CompanyIndexView {
            companies,
            pagination: PaginationMeta::new(query.page(), PAGE_SIZE, total),
            types,
            filters: ListFilters {
                search: query.search.clone(),
                type_id: query.type_id,
            },
        })
    }

    /// The viewer's favorited companies; every row is favorited by
    /// construction
    #[instrument(skip(self))]
    pub async fn favorites(&self, viewer: i64, query: &PageQuery) -> ApiResult<FavoritesView> {
        let (rows, total) = self
            .repo
            .list_favorites(viewer, PAGE_SIZE, query.offset())
            .await?;

        let companies = rows
            .into_iter()
            .map(|row| CompanyListItem::from_row(row, true))
            .collect();

        Ok(FavoritesView {
            companies,
            pagination: PaginationMeta::new(query.page(), PAGE_SIZE, total),
        })
    }
}

/// Composes the company detail payload
pub struct CompanyAggregator {
    repo: CompanyRepository,
    favorites: FavoriteStore,
    subscriptions: SubscriptionStore,
}

impl CompanyAggregator {
    pub fn new(
        repo: CompanyRepository,
        favorites: FavoriteStore,
        subscriptions: SubscriptionStore,
    ) -> Self {
        Self {
            repo,
            favorites,
            subscriptions,
        }
    }

    /// Load a company plus the bounded windows of each related collection.
    ///
    /// The sub-queries run against the shared pool without a wrapping
    /// transaction; under concurrent imports the collections may reflect
    /// slightly different snapshots.
    #[instrument(skip(self))]
    pub async fn detail(
        &self,
        company_id: i64,
        viewer: Option<i64>,
    ) -> ApiResult<CompanyDetailView> {
        let company = self.require_company(company_id).await?;

        let company_type = self
            .repo
            .type_by_id(company.company_type_id)
            .await?
            .ok_or_else(|| {
                ApiError::internal(format!(
                    "company {} references missing type {}",
                    company.id, company.company_type_id
                ))
            })?;

        let mut view = CompanyDetailView::from_profile(company.clone(), company_type);

        view.statistics = self.repo.statistic(company_id).await?;
        view.news = self
            .repo
            .recent_news(company_id, NEWS_WINDOW)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let since = Utc::now().date_naive() - Duration::days(TIME_SERIES_DAYS);
        view.time_series = self.repo.daily_series_since(company_id, since).await?;
        view.technical_indicator = self.repo.latest_daily_indicator(company_id).await?;
        view.financials = self
            .repo
            .recent_annual_financials(company_id, FINANCIALS_WINDOW)
            .await?;
        view.recommendation = self.repo.recommendation(company_id).await?;
        view.analyst_ratings = self.repo.recent_ratings(company_id, RATINGS_WINDOW).await?;
        view.earnings = self.repo.recent_earnings(company_id, EARNINGS_WINDOW).await?;
        view.dividends = self
            .repo
            .recent_dividends(company_id, DIVIDENDS_WINDOW)
            .await?;
        view.splits = self.repo.recent_splits(company_id, SPLITS_WINDOW).await?;

        view.related_companies = self
            .repo
            .related(company.company_type_id, company.id, RELATED_LIMIT)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        // Anonymous viewers never see personalized state
        if let Some(user_id) = viewer {
            view.is_favorited = self.favorites.is_favorited(user_id, company_id).await?;
            view.subscription = self.subscriptions.get(user_id, company_id).await?;
            view.is_subscribed = view.subscription.is_some();
        }

        Ok(view)
    }

    async fn require_company(&self, company_id: i64) -> ApiResult<CompanyRecord> {
        self.repo
            .find_by_id(company_id, false)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Company {company_id}")))
    }
}

/// Favorite and subscription mutations, always on behalf of the session
/// user
pub struct RelationshipManager {
    repo: CompanyRepository,
    favorites: FavoriteStore,
    subscriptions: SubscriptionStore,
}

impl RelationshipManager {
    pub fn new(
        repo: CompanyRepository,
        favorites: FavoriteStore,
        subscriptions: SubscriptionStore,
    ) -> Self {
        Self {
            repo,
            favorites,
            subscriptions,
        }
    }

    /// Add a favorite for the user. Adding twice is a success both times
    /// and leaves exactly one row.
    #[instrument(skip(self))]
    pub async fn add_favorite(&self, user_id: i64, company_id: i64) -> ApiResult<FavoriteStatus> {
        self.require_company(company_id).await?;
        self.favorites.add(user_id, company_id).await?;

        Ok(FavoriteStatus {
            company_id,
            is_favorited: true,
        })
    }

    /// Remove a favorite; removing one that was never added is still a
    /// success.
    #[instrument(skip(self))]
    pub async fn remove_favorite(
        &self,
        user_id: i64,
        company_id: i64,
    ) -> ApiResult<FavoriteStatus> {
        self.require_company(company_id).await?;
        self.favorites.remove(user_id, company_id).await?;

        Ok(FavoriteStatus {
            company_id,
            is_favorited: false,
        })
    }

    /// Create or fully replace the user's subscription for a company
    #[instrument(skip(self, request))]
    pub async fn subscribe(
        &self,
        user_id: i64,
        company_id: i64,
        request: &SubscriptionRequest,
    ) -> ApiResult<SubscriptionStatus> {
        self.require_company(company_id).await?;

        // Read-then-upsert: a concurrent subscribe for the same pair makes
        // the last writer win, which matches the store's upsert semantics.
        let existing = self.subscriptions.get(user_id, company_id).await?;
        let flags = resolve_subscription_flags(existing, request);
        self.subscriptions.upsert(user_id, company_id, flags).await?;

        Ok(SubscriptionStatus {
            company_id,
            is_subscribed: true,
            flags: Some(flags),
        })
    }

    /// Remove the subscription row; absent rows are a no-op success.
    #[instrument(skip(self))]
    pub async fn unsubscribe(
        &self,
        user_id: i64,
        company_id: i64,
    ) -> ApiResult<SubscriptionStatus> {
        self.require_company(company_id).await?;
        self.subscriptions.remove(user_id, company_id).await?;

        Ok(SubscriptionStatus {
            company_id,
            is_subscribed: false,
            flags: None,
        })
    }

    async fn require_company(&self, company_id: i64) -> ApiResult<CompanyRecord> {
        self.repo
            .find_by_id(company_id, false)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Company {company_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscribe_applies_defaults_to_omitted_flags() {
        let request = SubscriptionRequest {
            notify_news: Some(true),
            ..Default::default()
        };

        let flags = resolve_subscription_flags(None, &request);
        assert!(flags.notify_recommendations);
        assert!(flags.notify_updates);
        assert!(flags.notify_news);
        assert!(!flags.notify_price_alerts);
    }

    #[test]
    fn first_subscribe_with_empty_body_is_the_default_vector() {
        let flags = resolve_subscription_flags(None, &SubscriptionRequest::default());
        assert_eq!(flags, NotificationFlags::default());
    }

    #[test]
    fn update_replaces_the_whole_vector() {
        let existing = NotificationFlags {
            notify_recommendations: false,
            notify_updates: false,
            notify_news: false,
            notify_price_alerts: true,
        };
        let request = SubscriptionRequest {
            notify_news: Some(true),
            ..Default::default()
        };

        let flags = resolve_subscription_flags(Some(existing), &request);
        assert!(!flags.notify_recommendations);
        assert!(!flags.notify_updates);
        assert!(flags.notify_news);
        // full replace: the previously-set price alert flag does not survive
        assert!(!flags.notify_price_alerts);
    }

    #[test]
    fn update_can_disable_everything() {
        let existing = NotificationFlags::default();
        let flags =
            resolve_subscription_flags(Some(existing), &SubscriptionRequest::default());
        assert!(!flags.notify_recommendations);
        assert!(!flags.notify_updates);
        assert!(!flags.notify_news);
        assert!(!flags.notify_price_alerts);
    }

    #[test]
    fn explicit_false_beats_creation_defaults() {
        let request = SubscriptionRequest {
            notify_recommendations: Some(false),
            notify_updates: Some(false),
            ..Default::default()
        };

        let flags = resolve_subscription_flags(None, &request);
        assert!(!flags.notify_recommendations);
        assert!(!flags.notify_updates);
        assert!(!flags.notify_news);
    }
}
