use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use wxpay::{ApiClient, Method, WxPayError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetCallbackRequest {
    pub mchid: String,
    pub notify_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SetCallbackResponse {
    pub update_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub notify_url: String,
    #[serde(default)]
    pub mchid: String,
}

pub struct CallbackService<'a, C> {
    client: &'a C,
}

impl<'a, C: ApiClient> CallbackService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Set the URL coupon-use notifications are pushed to.
    pub async fn set_callback(
        &self,
        request: &SetCallbackRequest,
    ) -> Result<SetCallbackResponse, WxPayError> {
        let request =
            self.client
                .new_request(Method::POST, "marketing/favor/callbacks", Some(request))?;
        self.client.execute_json(request).await
    }
}
