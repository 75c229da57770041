//! Database type definitions
//!
//! Record types mapping the PostgreSQL schema, plus the small value types
//! shared across the platform (localized text, notification flags).
//! Vocabulary columns (statement periods, rating actions, earnings timing)
//! stay plain text; the table check constraints own the allowed sets.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Supported UI locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ar,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "ar" => Ok(Locale::Ar),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// An English/Arabic pair for the same logical text.
///
/// Storage keeps the two columns side by side; everything above the row
/// level passes this value type around instead of parallel fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub ar: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// Build from a pair of nullable columns. `None` when both are absent.
    pub fn from_pair(en: Option<String>, ar: Option<String>) -> Option<Self> {
        if en.is_none() && ar.is_none() {
            return None;
        }
        Some(Self {
            en: en.unwrap_or_default(),
            ar: ar.unwrap_or_default(),
        })
    }

    /// The text for a locale, falling back to English when the Arabic
    /// column was imported empty.
    pub fn resolve(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::Ar => {
                if self.ar.is_empty() {
                    &self.en
                } else {
                    &self.ar
                }
            }
        }
    }
}

/// Per-company notification opt-ins carried on a subscription row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NotificationFlags {
    pub notify_recommendations: bool,
    pub notify_updates: bool,
    pub notify_news: bool,
    pub notify_price_alerts: bool,
}

impl Default for NotificationFlags {
    fn default() -> Self {
        Self {
            notify_recommendations: true,
            notify_updates: true,
            notify_news: false,
            notify_price_alerts: false,
        }
    }
}

/// Company type (sector-like grouping) record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyTypeRecord {
    pub id: i64,
    pub name_en: String,
    pub name_ar: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyTypeRecord {
    pub fn name(&self) -> LocalizedText {
        LocalizedText::new(self.name_en.clone(), self.name_ar.clone())
    }
}

/// Company profile record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRecord {
    pub id: i64,
    pub company_type_id: i64,
    pub symbol: String,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub mic_code: Option<String>,
    pub country: Option<String>,
    pub figi_code: Option<String>,
    pub name_en: String,
    pub name_ar: String,
    pub current_price: Option<Decimal>,
    pub price_change: Decimal,
    pub change_percentage: Decimal,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub ceo: Option<String>,
    pub headquarter_en: Option<String>,
    pub headquarter_ar: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CompanyRecord {
    pub fn name(&self) -> LocalizedText {
        LocalizedText::new(self.name_en.clone(), self.name_ar.clone())
    }

    pub fn description(&self) -> Option<LocalizedText> {
        LocalizedText::from_pair(self.description_en.clone(), self.description_ar.clone())
    }

    pub fn headquarters(&self) -> Option<LocalizedText> {
        LocalizedText::from_pair(self.headquarter_en.clone(), self.headquarter_ar.clone())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Joined projection used by the listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyListRow {
    pub id: i64,
    pub symbol: String,
    pub name_en: String,
    pub name_ar: String,
    pub current_price: Option<Decimal>,
    pub price_change: Decimal,
    pub change_percentage: Decimal,
    pub type_name_en: String,
    pub type_name_ar: String,
    pub type_slug: String,
}

/// Minimal projection for the related-companies strip on the detail view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RelatedCompanyRow {
    pub id: i64,
    pub symbol: String,
    pub name_en: String,
    pub name_ar: String,
    pub current_price: Option<Decimal>,
}

/// Valuation / profitability / liquidity statistics, 1:1 with a company.
/// Every metric is nullable since the upstream feed fills them unevenly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyStatisticRecord {
    pub id: i64,
    pub company_id: i64,

    // Valuation
    pub market_cap: Option<Decimal>,
    pub enterprise_value: Option<Decimal>,
    pub ev_to_revenue: Option<Decimal>,
    pub ev_to_ebitda: Option<Decimal>,
    pub value_today: Option<Decimal>,
    pub adtv_6m: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub forward_pe: Option<Decimal>,
    pub peg_ratio: Option<Decimal>,
    pub price_to_sales_ratio: Option<Decimal>,
    pub price_to_book_ratio: Option<Decimal>,

    // Earnings
    pub eps: Option<Decimal>,
    pub trailing_eps: Option<Decimal>,
    pub forward_eps: Option<Decimal>,
    pub quarterly_earnings_growth: Option<Decimal>,

    // Dividends
    pub dividend_yield: Option<Decimal>,
    pub payout_ratio: Option<Decimal>,
    pub dividend_date: Option<NaiveDate>,
    pub ex_dividend_date: Option<NaiveDate>,
    pub last_split_date: Option<NaiveDate>,
    pub last_split_factor: Option<String>,

    // Profitability
    pub profit_margin: Option<Decimal>,
    pub operating_margin: Option<Decimal>,
    pub return_on_assets: Option<Decimal>,
    pub return_on_equity: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub revenue_per_share: Option<Decimal>,
    pub quarterly_revenue_growth: Option<Decimal>,
    pub gross_profit: Option<Decimal>,
    pub ebitda: Option<Decimal>,
    pub net_income_to_common: Option<Decimal>,

    // Price performance
    pub week_52_high: Option<Decimal>,
    pub week_52_low: Option<Decimal>,
    pub week_52_change: Option<Decimal>,
    pub sp500_week_52_change: Option<Decimal>,
    pub beta: Option<Decimal>,

    // Share statistics
    pub shares_outstanding: Option<i64>,
    pub shares_float: Option<i64>,
    pub percent_held_by_insiders: Option<Decimal>,
    pub percent_held_by_institutions: Option<Decimal>,
    pub shares_short: Option<i64>,
    pub short_ratio: Option<Decimal>,
    pub short_percent_of_float: Option<Decimal>,

    // Financial health
    pub total_cash: Option<Decimal>,
    pub total_cash_per_share: Option<Decimal>,
    pub total_debt: Option<Decimal>,
    pub debt_to_equity: Option<Decimal>,
    pub current_ratio: Option<Decimal>,
    pub book_value_per_share: Option<Decimal>,
    pub operating_cash_flow: Option<Decimal>,
    pub levered_free_cash_flow: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// News article attached to a company
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyNewsRecord {
    pub id: i64,
    pub company_id: i64,
    pub title_en: String,
    pub title_ar: String,
    pub source: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyNewsRecord {
    pub fn title(&self) -> LocalizedText {
        LocalizedText::new(self.title_en.clone(), self.title_ar.clone())
    }
}

/// One OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyTimeSeriesRecord {
    pub id: i64,
    pub company_id: i64,
    pub date: NaiveDate,
    pub interval: String,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One bar of precomputed technical indicators
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyTechnicalIndicatorRecord {
    pub id: i64,
    pub company_id: i64,
    pub date: NaiveDate,
    pub interval: String,
    pub sma_20: Option<Decimal>,
    pub sma_50: Option<Decimal>,
    pub sma_200: Option<Decimal>,
    pub ema_12: Option<Decimal>,
    pub ema_26: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub macd_signal: Option<Decimal>,
    pub macd_hist: Option<Decimal>,
    pub bb_upper: Option<Decimal>,
    pub bb_middle: Option<Decimal>,
    pub bb_lower: Option<Decimal>,
    pub rsi_14: Option<Decimal>,
    pub stoch_k: Option<Decimal>,
    pub stoch_d: Option<Decimal>,
    pub cci: Option<Decimal>,
    pub roc: Option<Decimal>,
    pub momentum: Option<Decimal>,
    pub obv: Option<Decimal>,
    pub ad: Option<Decimal>,
    pub adosc: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One financial statement row (income / balance / cash flow)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyFinancialRecord {
    pub id: i64,
    pub company_id: i64,
    pub fiscal_date: NaiveDate,
    /// `annual` or `quarterly`, constrained by the table check
    pub period: String,
    /// `income`, `balance` or `cash_flow`, constrained by the table check
    pub statement_type: String,

    // Income statement
    pub revenue: Option<Decimal>,
    pub cost_of_revenue: Option<Decimal>,
    pub gross_profit: Option<Decimal>,
    pub operating_expense: Option<Decimal>,
    pub operating_income: Option<Decimal>,
    pub ebitda: Option<Decimal>,
    pub ebit: Option<Decimal>,
    pub interest_expense: Option<Decimal>,
    pub income_before_tax: Option<Decimal>,
    pub income_tax_expense: Option<Decimal>,
    pub net_income: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub eps_diluted: Option<Decimal>,
    pub weighted_average_shares: Option<i64>,
    pub weighted_average_shares_diluted: Option<i64>,

    // Balance sheet
    pub total_assets: Option<Decimal>,
    pub current_assets: Option<Decimal>,
    pub cash_and_equivalents: Option<Decimal>,
    pub cash_and_short_term_investments: Option<Decimal>,
    pub accounts_receivable: Option<Decimal>,
    pub inventory: Option<Decimal>,
    pub non_current_assets: Option<Decimal>,
    pub property_plant_equipment: Option<Decimal>,
    pub intangible_assets: Option<Decimal>,
    pub goodwill: Option<Decimal>,
    pub total_liabilities: Option<Decimal>,
    pub current_liabilities: Option<Decimal>,
    pub accounts_payable: Option<Decimal>,
    pub short_term_debt: Option<Decimal>,
    pub non_current_liabilities: Option<Decimal>,
    pub long_term_debt: Option<Decimal>,
    pub shareholders_equity: Option<Decimal>,
    pub retained_earnings: Option<Decimal>,

    // Cash flow
    pub operating_cash_flow: Option<Decimal>,
    pub capital_expenditure: Option<Decimal>,
    pub free_cash_flow: Option<Decimal>,
    pub investing_cash_flow: Option<Decimal>,
    pub financing_cash_flow: Option<Decimal>,
    pub dividend_payments: Option<Decimal>,
    pub stock_repurchase: Option<Decimal>,
    pub net_change_in_cash: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Analyst consensus plus model-generated recommendation, 1:1 with a company
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRecommendationRecord {
    pub id: i64,
    pub company_id: i64,
    pub strong_buy_count: i32,
    pub buy_count: i32,
    pub hold_count: i32,
    pub sell_count: i32,
    pub strong_sell_count: i32,
    pub recommendation_mean: Option<Decimal>,
    pub recommendation_key: Option<String>,
    pub price_target_average: Option<Decimal>,
    pub price_target_high: Option<Decimal>,
    pub price_target_low: Option<Decimal>,
    pub price_target_median: Option<Decimal>,
    pub number_of_analysts: i32,
    /// `STRONG_BUY` .. `STRONG_SELL`, constrained by the table check
    pub ai_recommendation: Option<String>,
    pub ai_confidence: Option<Decimal>,
    pub ai_reasoning: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single analyst rating event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyAnalystRatingRecord {
    pub id: i64,
    pub company_id: i64,
    pub rating_date: NaiveDate,
    pub analyst_name: Option<String>,
    pub analyst_firm: Option<String>,
    pub rating: Option<String>,
    pub previous_rating: Option<String>,
    /// `Maintains`, `Upgrade`, `Downgrade`, `Initiates` or `Reiterates`
    pub action: Option<String>,
    pub price_target: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An earnings announcement, estimate vs. actual
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyEarningRecord {
    pub id: i64,
    pub company_id: i64,
    pub earnings_date: NaiveDate,
    /// `Before Hours`, `After Hours` or `Time Not Supplied`
    pub time: Option<String>,
    pub eps_estimate: Option<Decimal>,
    pub eps_actual: Option<Decimal>,
    pub revenue_estimate: Option<Decimal>,
    pub revenue_actual: Option<Decimal>,
    pub fiscal_date_ending: Option<String>,
    /// `Q1` .. `Q4` or `Annual`
    pub period: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dividend event keyed by ex-date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyDividendRecord {
    pub id: i64,
    pub company_id: i64,
    pub ex_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub record_date: Option<NaiveDate>,
    pub declaration_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub adjusted_amount: Option<Decimal>,
    pub currency: Option<String>,
    pub dividend_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stock split event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanySplitRecord {
    pub id: i64,
    pub company_id: i64,
    pub split_date: NaiveDate,
    pub description: Option<String>,
    pub split_ratio: Option<Decimal>,
    pub from_factor: Option<i32>,
    pub to_factor: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
