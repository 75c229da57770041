//! API response models and data structures
//!
//! This module defines the request/response structures used by the API
//! endpoints, along with the pagination types shared by the listing views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sahm_database::{
    CompanyAnalystRatingRecord, CompanyDividendRecord, CompanyEarningRecord,
    CompanyFinancialRecord, CompanyListRow, CompanyNewsRecord, CompanyRecommendationRecord,
    CompanyRecord, CompanySplitRecord, CompanyStatisticRecord, CompanyTechnicalIndicatorRecord,
    CompanyTimeSeriesRecord, CompanyTypeRecord, LocalizedText, NotificationFlags,
    RelatedCompanyRow,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fixed page size for every company listing
pub const PAGE_SIZE: i64 = 24;

/// Standardized API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,

    /// Response data (None if error occurred)
    pub data: Option<T>,

    /// Error message (None if successful)
    pub error: Option<String>,

    /// Response timestamp
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an error response
    pub fn error(error_message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error_message),
            timestamp: Utc::now(),
        }
    }
}

/// Pagination metadata returned with list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page number (1-based)
    pub page: u32,

    /// Items per page
    pub per_page: i64,

    /// Total number of items
    pub total: i64,

    /// Total number of pages
    pub total_pages: i64,

    /// Whether there are more pages
    pub has_next: bool,

    /// Whether there are previous pages
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u32, per_page: i64, total: i64) -> Self {
        let total_pages = if total > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: (page as i64) < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Query parameters for the company listing endpoint
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListCompaniesQuery {
    /// Free-text search over symbol and localized names
    #[validate(length(max = 100, message = "search term is too long"))]
    pub search: Option<String>,

    /// Exact company-type filter
    pub type_id: Option<i64>,

    /// Page number (1-based, default: 1)
    #[validate(range(min = 1, message = "page must be greater than 0"))]
    pub page: Option<u32>,
}

impl ListCompaniesQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Row offset for the requested page
    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * PAGE_SIZE
    }
}

/// Query parameters for pages without filters
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, message = "page must be greater than 0"))]
    pub page: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * PAGE_SIZE
    }
}

/// Subscription upsert request: four independent opt-ins.
///
/// Flags omitted on first subscribe fall back to the defaults; on an
/// existing subscription the vector is replaced wholesale and an omitted
/// flag means false.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct SubscriptionRequest {
    pub notify_recommendations: Option<bool>,
    pub notify_updates: Option<bool>,
    pub notify_news: Option<bool>,
    pub notify_price_alerts: Option<bool>,
}

/// Company type option for the listing filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyTypeView {
    pub id: i64,
    pub name: LocalizedText,
    pub slug: String,
}

impl From<CompanyTypeRecord> for CompanyTypeView {
    fn from(record: CompanyTypeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name(),
            slug: record.slug,
        }
    }
}

/// The company-type facet embedded in list/detail rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyTypeRef {
    pub name: LocalizedText,
    pub slug: String,
}

/// One row of the company listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyListItem {
    pub id: i64,
    pub symbol: String,
    pub name: LocalizedText,
    pub current_price: Option<Decimal>,
    pub price_change: Decimal,
    pub change_percentage: Decimal,
    pub company_type: CompanyTypeRef,
    pub is_favorited: bool,
}

impl CompanyListItem {
    pub fn from_row(row: CompanyListRow, is_favorited: bool) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            name: LocalizedText::new(row.name_en, row.name_ar),
            current_price: row.current_price,
            price_change: row.price_change,
            change_percentage: row.change_percentage,
            company_type: CompanyTypeRef {
                name: LocalizedText::new(row.type_name_en, row.type_name_ar),
                slug: row.type_slug,
            },
            is_favorited,
        }
    }
}

/// Filters echoed back with the listing so the client can re-render its
/// controls without keeping local state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilters {
    pub search: Option<String>,
    pub type_id: Option<i64>,
}

/// Company listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyIndexView {
    pub companies: Vec<CompanyListItem>,
    pub pagination: PaginationMeta,
    pub types: Vec<CompanyTypeView>,
    pub filters: ListFilters,
}

/// Favorite-companies listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoritesView {
    pub companies: Vec<CompanyListItem>,
    pub pagination: PaginationMeta,
}

/// News entry on the company detail view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItemView {
    pub id: i64,
    pub title: LocalizedText,
    pub source: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl From<CompanyNewsRecord> for NewsItemView {
    fn from(record: CompanyNewsRecord) -> Self {
        Self {
            id: record.id,
            title: LocalizedText::new(record.title_en, record.title_ar),
            source: record.source,
            url: record.url,
            published_at: record.published_at,
        }
    }
}

/// Related-company entry on the detail view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedCompanyView {
    pub id: i64,
    pub symbol: String,
    pub name: LocalizedText,
    pub current_price: Option<Decimal>,
}

impl From<RelatedCompanyRow> for RelatedCompanyView {
    fn from(row: RelatedCompanyRow) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            name: LocalizedText::new(row.name_en, row.name_ar),
            current_price: row.current_price,
        }
    }
}

/// The aggregate company detail payload.
///
/// Every collection is a bounded window (see the aggregator); empty
/// collections serialize as `[]`, the 1:1 records as `null` when missing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyDetailView {
    pub id: i64,
    pub symbol: String,
    pub name: LocalizedText,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub current_price: Option<Decimal>,
    pub price_change: Decimal,
    pub change_percentage: Decimal,
    pub description: Option<LocalizedText>,
    pub ceo: Option<String>,
    pub headquarters: Option<LocalizedText>,
    pub last_updated: Option<DateTime<Utc>>,
    pub company_type: CompanyTypeRef,

    pub statistics: Option<CompanyStatisticRecord>,
    pub news: Vec<NewsItemView>,
    pub time_series: Vec<CompanyTimeSeriesRecord>,
    pub technical_indicator: Option<CompanyTechnicalIndicatorRecord>,
    pub financials: Vec<CompanyFinancialRecord>,
    pub recommendation: Option<CompanyRecommendationRecord>,
    pub analyst_ratings: Vec<CompanyAnalystRatingRecord>,
    pub earnings: Vec<CompanyEarningRecord>,
    pub dividends: Vec<CompanyDividendRecord>,
    pub splits: Vec<CompanySplitRecord>,

    pub related_companies: Vec<RelatedCompanyView>,

    pub is_favorited: bool,
    pub is_subscribed: bool,
    /// The viewer's notification flags, present only when subscribed
    pub subscription: Option<NotificationFlags>,
}

impl CompanyDetailView {
    /// Seed the profile part of the view from a company row and its type.
    /// The aggregator fills in the windows afterwards.
    pub fn from_profile(company: CompanyRecord, company_type: CompanyTypeRecord) -> Self {
        Self {
            id: company.id,
            symbol: company.symbol.clone(),
            name: company.name(),
            currency: company.currency.clone(),
            exchange: company.exchange.clone(),
            country: company.country.clone(),
            current_price: company.current_price,
            price_change: company.price_change,
            change_percentage: company.change_percentage,
            description: company.description(),
            ceo: company.ceo.clone(),
            headquarters: company.headquarters(),
            last_updated: company.last_updated,
            company_type: CompanyTypeRef {
                name: company_type.name(),
                slug: company_type.slug,
            },
            statistics: None,
            news: Vec::new(),
            time_series: Vec::new(),
            technical_indicator: None,
            financials: Vec::new(),
            recommendation: None,
            analyst_ratings: Vec::new(),
            earnings: Vec::new(),
            dividends: Vec::new(),
            splits: Vec::new(),
            related_companies: Vec::new(),
            is_favorited: false,
            is_subscribed: false,
            subscription: None,
        }
    }
}

/// Result of a favorite toggle
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub company_id: i64,
    pub is_favorited: bool,
}

/// Result of a subscription upsert or removal
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub company_id: i64,
    pub is_subscribed: bool,
    pub flags: Option<NotificationFlags>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_meta_covers_all_rows_exactly_once() {
        // 50 companies at 24 per page -> 3 pages
        let meta = PaginationMeta::new(1, PAGE_SIZE, 50);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let last = PaginationMeta::new(3, PAGE_SIZE, 50);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn pagination_meta_exact_multiple() {
        let meta = PaginationMeta::new(2, PAGE_SIZE, 48);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
    }

    #[test]
    fn pagination_meta_empty_result() {
        let meta = PaginationMeta::new(1, PAGE_SIZE, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn list_query_offsets_are_page_size_aligned() {
        let q = ListCompaniesQuery {
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(q.offset(), 2 * PAGE_SIZE);

        let default = ListCompaniesQuery::default();
        assert_eq!(default.page(), 1);
        assert_eq!(default.offset(), 0);
    }

    #[test]
    fn list_query_rejects_page_zero() {
        use validator::Validate;

        let q = ListCompaniesQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn empty_detail_collections_serialize_as_arrays() {
        let company_type = CompanyTypeRef {
            name: LocalizedText::new("Banks", "البنوك"),
            slug: "banks".to_string(),
        };
        let view = CompanyDetailView {
            id: 1,
            symbol: "1120".to_string(),
            name: LocalizedText::new("Al Rajhi Bank", "مصرف الراجحي"),
            currency: None,
            exchange: None,
            country: None,
            current_price: None,
            price_change: Decimal::ZERO,
            change_percentage: Decimal::ZERO,
            description: None,
            ceo: None,
            headquarters: None,
            last_updated: None,
            company_type,
            statistics: None,
            news: Vec::new(),
            time_series: Vec::new(),
            technical_indicator: None,
            financials: Vec::new(),
            recommendation: None,
            analyst_ratings: Vec::new(),
            earnings: Vec::new(),
            dividends: Vec::new(),
            splits: Vec::new(),
            related_companies: Vec::new(),
            is_favorited: false,
            is_subscribed: false,
            subscription: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["news"], serde_json::json!([]));
        assert_eq!(json["earnings"], serde_json::json!([]));
        assert_eq!(json["statistics"], serde_json::Value::Null);
        assert_eq!(json["recommendation"], serde_json::Value::Null);
        assert_eq!(json["is_favorited"], serde_json::json!(false));
    }
}
