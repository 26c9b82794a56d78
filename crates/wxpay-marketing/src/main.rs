use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wxpay::{ClientConfig, WxPayError};
use wxpay_marketing::favor::{Favor, QueryStocksOptions, SetCallbackRequest};

/// Coupon stock operations against the WeChat Pay v3 API.
///
/// Credentials come from `WXPAY_*` environment variables (or `.env`).
#[derive(Parser)]
#[command(name = "wxpay-favor", version, about)]
struct Cli {
    /// Creator merchant id for stock operations (defaults to WXPAY_MCHID)
    #[arg(long, global = true, env = "WXPAY_STOCK_CREATOR_MCHID")]
    creator: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one stock
    GetStock { stock_id: String },
    /// List stocks
    QueryStocks {
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value = "")]
        status: String,
    },
    /// Activate a stock
    Activate { stock_id: String },
    /// Pause a stock
    Pause { stock_id: String },
    /// Restart a paused stock
    Restart { stock_id: String },
    /// Show one coupon issued to a user
    GetCoupon {
        appid: String,
        coupon_id: String,
        openid: String,
    },
    /// Set the coupon notification URL
    SetCallback {
        notify_url: String,
        #[arg(long)]
        switch: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let client = match config.build_client() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("failed to build client: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(mchid = config.mchid, base_url = %config.base_url, "client ready");

    let creator = cli.creator.unwrap_or_else(|| config.mchid.to_string());
    match run(Favor::new(&client), &creator, &config.mchid.to_string(), cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(stage = ?e.stage(), retryable = e.is_retryable(), "{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    favor: Favor<'_, wxpay::WxPayClient>,
    creator: &str,
    mchid: &str,
    command: Command,
) -> Result<(), WxPayError> {
    match command {
        Command::GetStock { stock_id } => {
            let stock = favor.stock().get_stock(creator, &stock_id).await?;
            println!("{stock:#?}");
        }
        Command::QueryStocks {
            offset,
            limit,
            status,
        } => {
            let options = QueryStocksOptions {
                offset,
                limit,
                stock_creator_mchid: creator.to_string(),
                status,
                ..Default::default()
            };
            let page = favor.stock().query_stocks(Some(&options)).await?;
            println!("{page:#?}");
        }
        Command::Activate { stock_id } => {
            let result = favor.stock().activate_stock(creator, &stock_id).await?;
            println!("{result:#?}");
        }
        Command::Pause { stock_id } => {
            let result = favor.stock().pause_stock(creator, &stock_id).await?;
            println!("{result:#?}");
        }
        Command::Restart { stock_id } => {
            let result = favor.stock().restart_stock(creator, &stock_id).await?;
            println!("{result:#?}");
        }
        Command::GetCoupon {
            appid,
            coupon_id,
            openid,
        } => {
            let coupon = favor.coupon().get(&appid, &coupon_id, &openid).await?;
            println!("{coupon:#?}");
        }
        Command::SetCallback { notify_url, switch } => {
            let request = SetCallbackRequest {
                mchid: mchid.to_string(),
                notify_url,
                switch,
            };
            let result = favor.callback().set_callback(&request).await?;
            println!("{result:#?}");
        }
    }
    Ok(())
}
