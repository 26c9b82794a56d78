//! Coupon ("favor") marketing API: stocks, coupons, and the callback URL.

mod callback;
mod coupon;
mod stock;

use std::borrow::Cow;

use wxpay::{ApiClient, QueryOptions};

pub use callback::{CallbackService, SetCallbackRequest, SetCallbackResponse};
pub use coupon::{
    ConsumeInformation, Coupon, CouponService, CreateCouponRequest, CreateCouponResponse,
    GoodsDetail, NormalCouponInformation,
};
pub use stock::{
    ActivateStockResponse, CouponAvailableTime, CouponUseRule, CreateStockResponse, CutToMessage,
    DiscountCoupon, ExchangeCoupon, FixAvailableTime, FixedNormalCoupon, PatternInfo,
    PauseStockResponse, QueryStocksOptions, QueryStocksResponse, RestartStockResponse, Stock,
    StockService, StockUseRule,
};

/// Entry point grouping the favor services over one client.
pub struct Favor<'a, C> {
    client: &'a C,
}

impl<'a, C: ApiClient> Favor<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn stock(&self) -> StockService<'a, C> {
        StockService::new(self.client)
    }

    pub fn coupon(&self) -> CouponService<'a, C> {
        CouponService::new(self.client)
    }

    pub fn callback(&self) -> CallbackService<'a, C> {
        CallbackService::new(self.client)
    }
}

/// `?stock_creator_mchid=` carried by the per-stock endpoints.
pub(crate) struct CreatorMchOptions<'a> {
    pub stock_creator_mchid: &'a str,
}

impl QueryOptions for CreatorMchOptions<'_> {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("stock_creator_mchid", self.stock_creator_mchid.to_string())]
    }
}

/// Percent-encode a caller-supplied path segment.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}
