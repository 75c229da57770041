//! Company repository
//!
//! Read/write access to company profiles, their sector-like types, and the
//! bounded-window readers over the related market-data collections. All
//! default queries exclude soft-deleted companies; `find_by_id` exposes an
//! `include_deleted` escape hatch for administrative paths.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::error::DatabaseResult;
use crate::types::{
    CompanyAnalystRatingRecord, CompanyDividendRecord, CompanyEarningRecord,
    CompanyFinancialRecord, CompanyListRow, CompanyNewsRecord, CompanyRecommendationRecord,
    CompanyRecord, CompanySplitRecord, CompanyStatisticRecord, CompanyTechnicalIndicatorRecord,
    CompanyTimeSeriesRecord, CompanyTypeRecord, RelatedCompanyRow,
};

/// The single OHLCV/indicator interval served by the detail view
pub const DAILY_INTERVAL: &str = "1day";

/// The financial-statement period served by the detail view
pub const ANNUAL_PERIOD: &str = "annual";

const LIST_COLUMNS: &str = "c.id, c.symbol, c.name_en, c.name_ar, c.current_price, \
     c.price_change, c.change_percentage, \
     t.name_en AS type_name_en, t.name_ar AS type_name_ar, t.slug AS type_slug";

/// Listing filter: free-text search and/or an exact type match
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// Case-insensitive substring matched against symbol OR either
    /// localized name
    pub search: Option<String>,
    /// Exact company-type id
    pub type_id: Option<i64>,
}

/// Payload for creating a company from the import pipeline
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub company_type_id: i64,
    pub symbol: String,
    pub name_en: String,
    pub name_ar: String,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub mic_code: Option<String>,
    pub country: Option<String>,
    pub figi_code: Option<String>,
    pub current_price: Option<Decimal>,
    pub price_change: Decimal,
    pub change_percentage: Decimal,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub ceo: Option<String>,
    pub headquarter_en: Option<String>,
    pub headquarter_ar: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Partial update for a company; only present fields are written
#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub company_type_id: Option<i64>,
    pub symbol: Option<String>,
    pub name_en: Option<String>,
    pub name_ar: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub mic_code: Option<String>,
    pub country: Option<String>,
    pub figi_code: Option<String>,
    pub current_price: Option<Decimal>,
    pub price_change: Option<Decimal>,
    pub change_percentage: Option<Decimal>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub ceo: Option<String>,
    pub headquarter_en: Option<String>,
    pub headquarter_ar: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Repository over companies, their types and related collections
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one company by id. Soft-deleted rows are only visible with
    /// `include_deleted` (administrative paths).
    #[instrument(skip(self))]
    pub async fn find_by_id(
        &self,
        id: i64,
        include_deleted: bool,
    ) -> DatabaseResult<Option<CompanyRecord>> {
        let query = if include_deleted {
            "SELECT * FROM companies WHERE id = $1"
        } else {
            "SELECT * FROM companies WHERE id = $1 AND deleted_at IS NULL"
        };

        let company = sqlx::query_as::<_, CompanyRecord>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(company)
    }

    /// Fetch one non-deleted company by its unique ticker symbol
    #[instrument(skip(self))]
    pub async fn find_by_symbol(&self, symbol: &str) -> DatabaseResult<Option<CompanyRecord>> {
        let company = sqlx::query_as::<_, CompanyRecord>(
            "SELECT * FROM companies WHERE symbol = $1 AND deleted_at IS NULL",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Filtered, paginated company listing with its total row count.
    ///
    /// Ordering is `symbol ASC, id ASC` so pages never skip or duplicate
    /// rows while paginating.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &CompanyFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<(Vec<CompanyListRow>, i64)> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {LIST_COLUMNS} FROM companies c \
             JOIN company_types t ON t.id = c.company_type_id \
             WHERE c.deleted_at IS NULL"
        ));
        push_list_filters(&mut qb, filter);
        qb.push(" ORDER BY c.symbol ASC, c.id ASC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<CompanyListRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = QueryBuilder::new(
            "SELECT COUNT(*) FROM companies c WHERE c.deleted_at IS NULL",
        );
        push_list_filters(&mut count_qb, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Paginated listing restricted to a user's favorites, same row shape
    /// and ordering as `list`
    #[instrument(skip(self))]
    pub async fn list_favorites(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<(Vec<CompanyListRow>, i64)> {
        let rows = sqlx::query_as::<_, CompanyListRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM companies c \
             JOIN company_types t ON t.id = c.company_type_id \
             JOIN user_company_favorites f ON f.company_id = c.id \
             WHERE f.user_id = $1 AND c.deleted_at IS NULL \
             ORDER BY c.symbol ASC, c.id ASC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM companies c \
             JOIN user_company_favorites f ON f.company_id = c.id \
             WHERE f.user_id = $1 AND c.deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Insert a company. Unique violations on `symbol` or `figi_code`
    /// surface as `DatabaseError::UniqueViolation`.
    #[instrument(skip(self, company), fields(symbol = %company.symbol))]
    pub async fn create(&self, company: &NewCompany) -> DatabaseResult<CompanyRecord> {
        let record = sqlx::query_as::<_, CompanyRecord>(
            "INSERT INTO companies (\
                company_type_id, symbol, name_en, name_ar, currency, exchange, \
                mic_code, country, figi_code, current_price, price_change, \
                change_percentage, description_en, description_ar, ceo, \
                headquarter_en, headquarter_ar, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING *",
        )
        .bind(company.company_type_id)
        .bind(&company.symbol)
        .bind(&company.name_en)
        .bind(&company.name_ar)
        .bind(&company.currency)
        .bind(&company.exchange)
        .bind(&company.mic_code)
        .bind(&company.country)
        .bind(&company.figi_code)
        .bind(company.current_price)
        .bind(company.price_change)
        .bind(company.change_percentage)
        .bind(&company.description_en)
        .bind(&company.description_ar)
        .bind(&company.ceo)
        .bind(&company.headquarter_en)
        .bind(&company.headquarter_ar)
        .bind(company.last_updated)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Apply the present fields of `changes` to a non-deleted company.
    /// Returns `None` when the company does not exist.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i64,
        changes: &CompanyChanges,
    ) -> DatabaseResult<Option<CompanyRecord>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE companies SET updated_at = now()");

        macro_rules! set_if_present {
            ($field:ident) => {
                if let Some(value) = &changes.$field {
                    qb.push(concat!(", ", stringify!($field), " = "));
                    qb.push_bind(value.clone());
                }
            };
        }

        set_if_present!(company_type_id);
        set_if_present!(symbol);
        set_if_present!(name_en);
        set_if_present!(name_ar);
        set_if_present!(currency);
        set_if_present!(exchange);
        set_if_present!(mic_code);
        set_if_present!(country);
        set_if_present!(figi_code);
        set_if_present!(current_price);
        set_if_present!(price_change);
        set_if_present!(change_percentage);
        set_if_present!(description_en);
        set_if_present!(description_ar);
        set_if_present!(ceo);
        set_if_present!(headquarter_en);
        set_if_present!(headquarter_ar);
        set_if_present!(last_updated);

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND deleted_at IS NULL RETURNING *");

        let record = qb
            .build_query_as::<CompanyRecord>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Mark a company deleted; its history rows stay in place but become
    /// unreachable through default queries. Returns false when it was
    /// already deleted or never existed.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE companies SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Up to `limit` same-type companies, excluding the company itself
    #[instrument(skip(self))]
    pub async fn related(
        &self,
        company_type_id: i64,
        exclude_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<RelatedCompanyRow>> {
        let rows = sqlx::query_as::<_, RelatedCompanyRow>(
            "SELECT id, symbol, name_en, name_ar, current_price FROM companies \
             WHERE company_type_id = $1 AND id <> $2 AND deleted_at IS NULL \
             ORDER BY symbol ASC LIMIT $3",
        )
        .bind(company_type_id)
        .bind(exclude_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// One company type by id
    pub async fn type_by_id(&self, id: i64) -> DatabaseResult<Option<CompanyTypeRecord>> {
        let row = sqlx::query_as::<_, CompanyTypeRecord>(
            "SELECT * FROM company_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// All company types, for the listing filter options
    pub async fn types(&self) -> DatabaseResult<Vec<CompanyTypeRecord>> {
        let rows = sqlx::query_as::<_, CompanyTypeRecord>(
            "SELECT * FROM company_types ORDER BY name_en ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent news, newest first
    pub async fn recent_news(
        &self,
        company_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<CompanyNewsRecord>> {
        let rows = sqlx::query_as::<_, CompanyNewsRecord>(
            "SELECT * FROM company_news WHERE company_id = $1 \
             ORDER BY published_at DESC, id DESC LIMIT $2",
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent analyst ratings, newest first
    pub async fn recent_ratings(
        &self,
        company_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<CompanyAnalystRatingRecord>> {
        let rows = sqlx::query_as::<_, CompanyAnalystRatingRecord>(
            "SELECT * FROM company_analyst_ratings WHERE company_id = $1 \
             ORDER BY rating_date DESC, id DESC LIMIT $2",
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent earnings announcements, newest first
    pub async fn recent_earnings(
        &self,
        company_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<CompanyEarningRecord>> {
        let rows = sqlx::query_as::<_, CompanyEarningRecord>(
            "SELECT * FROM company_earnings WHERE company_id = $1 \
             ORDER BY earnings_date DESC LIMIT $2",
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent dividends by ex-date, newest first
    pub async fn recent_dividends(
        &self,
        company_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<CompanyDividendRecord>> {
        let rows = sqlx::query_as::<_, CompanyDividendRecord>(
            "SELECT * FROM company_dividends WHERE company_id = $1 \
             ORDER BY ex_date DESC LIMIT $2",
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent splits, newest first
    pub async fn recent_splits(
        &self,
        company_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<CompanySplitRecord>> {
        let rows = sqlx::query_as::<_, CompanySplitRecord>(
            "SELECT * FROM company_splits WHERE company_id = $1 \
             ORDER BY split_date DESC LIMIT $2",
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Daily OHLCV bars since `since`, newest first
    pub async fn daily_series_since(
        &self,
        company_id: i64,
        since: NaiveDate,
    ) -> DatabaseResult<Vec<CompanyTimeSeriesRecord>> {
        let rows = sqlx::query_as::<_, CompanyTimeSeriesRecord>(
            "SELECT * FROM company_time_series \
             WHERE company_id = $1 AND interval = $2 AND date >= $3 \
             ORDER BY date DESC",
        )
        .bind(company_id)
        .bind(DAILY_INTERVAL)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The single most recent daily technical-indicator bar
    pub async fn latest_daily_indicator(
        &self,
        company_id: i64,
    ) -> DatabaseResult<Option<CompanyTechnicalIndicatorRecord>> {
        let row = sqlx::query_as::<_, CompanyTechnicalIndicatorRecord>(
            "SELECT * FROM company_technical_indicators \
             WHERE company_id = $1 AND interval = $2 \
             ORDER BY date DESC LIMIT 1",
        )
        .bind(company_id)
        .bind(DAILY_INTERVAL)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Most recent annual financial statement rows, newest fiscal date
    /// first; ties broken by statement type for determinism
    pub async fn recent_annual_financials(
        &self,
        company_id: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<CompanyFinancialRecord>> {
        let rows = sqlx::query_as::<_, CompanyFinancialRecord>(
            "SELECT * FROM company_financials \
             WHERE company_id = $1 AND period = $2 \
             ORDER BY fiscal_date DESC, statement_type ASC LIMIT $3",
        )
        .bind(company_id)
        .bind(ANNUAL_PERIOD)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The 1:1 statistics row, when the import has produced one
    pub async fn statistic(
        &self,
        company_id: i64,
    ) -> DatabaseResult<Option<CompanyStatisticRecord>> {
        let row = sqlx::query_as::<_, CompanyStatisticRecord>(
            "SELECT * FROM company_statistics WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// The 1:1 consensus/recommendation row, when present
    pub async fn recommendation(
        &self,
        company_id: i64,
    ) -> DatabaseResult<Option<CompanyRecommendationRecord>> {
        let row = sqlx::query_as::<_, CompanyRecommendationRecord>(
            "SELECT * FROM company_recommendations WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Append the optional search and type predicates. The search term matches
/// symbol OR name_en OR name_ar (one OR group, not independent filters);
/// the type id is an AND condition on top.
fn push_list_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CompanyFilter) {
    if let Some(term) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = like_pattern(term);
        qb.push(" AND (c.symbol ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR c.name_en ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR c.name_ar ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(type_id) = filter.type_id {
        qb.push(" AND c.company_type_id = ");
        qb.push_bind(type_id);
    }
}

/// Wrap a search term for ILIKE, escaping the pattern metacharacters so
/// user input matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("AAPL"), "%AAPL%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn filters_render_search_as_one_or_group() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE 1=1");
        let filter = CompanyFilter {
            search: Some("2222".to_string()),
            type_id: None,
        };
        push_list_filters(&mut qb, &filter);

        let sql = qb.sql();
        assert!(sql.contains("(c.symbol ILIKE $1 OR c.name_en ILIKE $2 OR c.name_ar ILIKE $3)"));
        assert!(!sql.contains("company_type_id"));
    }

    #[test]
    fn filters_combine_type_and_search_with_and() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE 1=1");
        let filter = CompanyFilter {
            search: Some("bank".to_string()),
            type_id: Some(3),
        };
        push_list_filters(&mut qb, &filter);

        let sql = qb.sql();
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains(" AND c.company_type_id = $4"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE 1=1");
        let filter = CompanyFilter {
            search: Some("   ".to_string()),
            type_id: None,
        };
        push_list_filters(&mut qb, &filter);

        assert_eq!(qb.sql(), "SELECT 1 WHERE 1=1");
    }
}
