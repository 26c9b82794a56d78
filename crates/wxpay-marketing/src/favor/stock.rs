use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use wxpay::{with_optional_query, with_query, ApiClient, Method, QueryOptions, WxPayError};

use super::{segment, CreatorMchOptions};

/// A coupon stock (批次): the template coupons are issued from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belong_merchant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_begin_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_end_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributed_coupons: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_use_rule: Option<StockUseRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_info: Option<PatternInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_use_rule: Option<CouponUseRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cut_to_message: Option<CutToMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singleitem: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_request_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Issuance limits. Amounts are in fen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockUseRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_coupons: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount_by_day: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_coupons_per_user: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_person_limit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevent_api_abuse: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponUseRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_available_time: Option<CouponAvailableTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_normal_coupon: Option<FixedNormalCoupon>,
    #[serde(alias = "disscount_coupon", skip_serializing_if = "Option::is_none")]
    pub discount_coupon: Option<DiscountCoupon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_coupon: Option<ExchangeCoupon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goods_tag: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combine_use: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_merchants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponAvailableTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_available_time: Option<FixAvailableTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_day_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_time_after_receive: Option<i64>,
}

/// Weekly window; times are seconds from midnight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixAvailableTime {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_week_day: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedNormalCoupon {
    pub coupon_amount: i64,
    pub transaction_minimum: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountCoupon {
    pub discount_amount_max: i64,
    pub discount_percent: i64,
    pub transaction_minimum: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeCoupon {
    pub single_price_max: i64,
    pub exchange_price: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutToMessage {
    pub single_price_max: i64,
    pub cut_to_price: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateStockResponse {
    #[serde(default)]
    pub stock_id: String,
    pub create_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActivateStockResponse {
    #[serde(default)]
    pub stock_id: String,
    pub start_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PauseStockResponse {
    #[serde(default)]
    pub stock_id: String,
    pub pause_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RestartStockResponse {
    #[serde(default)]
    pub stock_id: String,
    pub restart_time: Option<DateTime<FixedOffset>>,
}

/// Filters for [`StockService::query_stocks`]. Empty strings are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStocksOptions {
    pub offset: u32,
    pub limit: u32,
    pub stock_creator_mchid: String,
    pub create_start_time: Option<DateTime<FixedOffset>>,
    pub create_end_time: Option<DateTime<FixedOffset>>,
    pub status: String,
}

impl QueryOptions for QueryStocksOptions {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let time = |t: &Option<DateTime<FixedOffset>>| t.map(|t| t.to_rfc3339()).unwrap_or_default();
        vec![
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
            ("stock_creator_mchid", self.stock_creator_mchid.clone()),
            ("create_start_time", time(&self.create_start_time)),
            ("create_end_time", time(&self.create_end_time)),
            ("status", self.status.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryStocksResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub data: Vec<Stock>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

pub struct StockService<'a, C> {
    client: &'a C,
}

impl<'a, C: ApiClient> StockService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Create a stock. It must be activated before coupons can be issued.
    pub async fn create_stock(&self, stock: &Stock) -> Result<CreateStockResponse, WxPayError> {
        let request = self
            .client
            .new_request(Method::POST, "marketing/srv/coupon-stocks", Some(stock))?;
        self.client.execute_json(request).await
    }

    pub async fn activate_stock(
        &self,
        stock_creator_mchid: &str,
        stock_id: &str,
    ) -> Result<ActivateStockResponse, WxPayError> {
        self.stock_action(stock_creator_mchid, stock_id, "start").await
    }

    /// Stop issuing from a stock until it is restarted.
    pub async fn pause_stock(
        &self,
        stock_creator_mchid: &str,
        stock_id: &str,
    ) -> Result<PauseStockResponse, WxPayError> {
        self.stock_action(stock_creator_mchid, stock_id, "pause").await
    }

    pub async fn restart_stock(
        &self,
        stock_creator_mchid: &str,
        stock_id: &str,
    ) -> Result<RestartStockResponse, WxPayError> {
        self.stock_action(stock_creator_mchid, stock_id, "restart").await
    }

    /// List stocks, optionally filtered.
    pub async fn query_stocks(
        &self,
        options: Option<&QueryStocksOptions>,
    ) -> Result<QueryStocksResponse, WxPayError> {
        let path = with_optional_query("marketing/srv/stocks", options);
        let request = self.client.request_without_body(Method::GET, &path)?;
        self.client.execute_json(request).await
    }

    pub async fn get_stock(
        &self,
        stock_creator_mchid: &str,
        stock_id: &str,
    ) -> Result<Stock, WxPayError> {
        let path = with_query(
            &format!("marketing/srv/stocks/{}", segment(stock_id)),
            &CreatorMchOptions {
                stock_creator_mchid,
            },
        );
        let request = self.client.request_without_body(Method::GET, &path)?;
        self.client.execute_json(request).await
    }

    async fn stock_action<T>(
        &self,
        stock_creator_mchid: &str,
        stock_id: &str,
        action: &str,
    ) -> Result<T, WxPayError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let path = with_query(
            &format!("marketing/srv/stocks/{}/{action}", segment(stock_id)),
            &CreatorMchOptions {
                stock_creator_mchid,
            },
        );
        let request = self.client.request_without_body(Method::GET, &path)?;
        tracing::debug!(stock_id, action, "stock state change");
        self.client.execute_json(request).await
    }
}
