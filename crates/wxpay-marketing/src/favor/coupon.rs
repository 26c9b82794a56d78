use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use wxpay::{with_query, ApiClient, Method, QueryOptions, WxPayError};

use super::segment;
use super::stock::CutToMessage;

/// A coupon issued to one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(default)]
    pub stock_creator_mchid: String,
    #[serde(default)]
    pub stock_id: String,
    #[serde(default)]
    pub coupon_id: String,
    pub cut_to_message: Option<CutToMessage>,
    #[serde(default)]
    pub coupon_name: String,
    /// `SENDED`, `USED` or `EXPIRED`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    pub create_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub coupon_type: String,
    pub no_cash: Option<bool>,
    pub available_begin_time: Option<DateTime<FixedOffset>>,
    pub available_end_time: Option<DateTime<FixedOffset>>,
    pub singleitem: Option<bool>,
    pub normal_coupon_information: Option<NormalCouponInformation>,
    pub consume_information: Option<ConsumeInformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalCouponInformation {
    pub coupon_amount: i64,
    pub transaction_minimum: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumeInformation {
    pub consume_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub consume_mchid: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub goods_detail: Vec<GoodsDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodsDetail {
    pub goods_id: String,
    pub quantity: i64,
    pub price: i64,
    pub discount_amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCouponRequest {
    pub stock_id: String,
    /// Merchant-side idempotency key.
    pub out_request_no: String,
    pub appid: String,
    pub stock_creator_mchid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_minimum: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateCouponResponse {
    #[serde(default)]
    pub coupon_id: String,
    #[serde(default)]
    pub trace_no: String,
}

struct AppIdOptions<'a> {
    appid: &'a str,
}

impl QueryOptions for AppIdOptions<'_> {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("appid", self.appid.to_string())]
    }
}

pub struct CouponService<'a, C> {
    client: &'a C,
}

impl<'a, C: ApiClient> CouponService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Issue a coupon from a stock to the user identified by `openid`.
    pub async fn create(
        &self,
        openid: &str,
        request: &CreateCouponRequest,
    ) -> Result<CreateCouponResponse, WxPayError> {
        let path = format!("marketing/srv/users/{}/coupons", segment(openid));
        let request = self.client.new_request(Method::POST, &path, Some(request))?;
        self.client.execute_json(request).await
    }

    pub async fn get(
        &self,
        appid: &str,
        coupon_id: &str,
        openid: &str,
    ) -> Result<Coupon, WxPayError> {
        let path = with_query(
            &format!(
                "marketing/srv/users/{}/coupons/{}",
                segment(openid),
                segment(coupon_id)
            ),
            &AppIdOptions { appid },
        );
        let request = self.client.request_without_body(Method::GET, &path)?;
        self.client.execute_json(request).await
    }
}
