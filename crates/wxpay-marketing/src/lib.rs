//! Marketing endpoints for the WeChat Pay v3 API.
//!
//! Thin wrappers over [`wxpay::ApiClient`]: each builds a path and body,
//! signs, executes and decodes. Any client implementing the capability
//! works, so wrappers can be driven by a stub in tests.
//!
//! ```no_run
//! use wxpay::ClientConfig;
//! use wxpay_marketing::favor::Favor;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientConfig::from_env()?.build_client()?;
//! let stock = Favor::new(&client).stock().get_stock("1900000109", "9856000").await?;
//! println!("{:?}", stock.stock_name);
//! # Ok(())
//! # }
//! ```

pub mod favor;
