//! Stock Portfolio Backend Server
//!
//! REST API server for stock quotes, options analytics and the holdings
//! ledger.

use std::path::Path;
use std::sync::Arc;
use stock_portfolio_backend::api::create_router;
use stock_portfolio_backend::config::Config;
use stock_portfolio_backend::db::DatabasePool;
use stock_portfolio_backend::gateway::YahooGateway;
use stock_portfolio_backend::state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use stock_portfolio_backend::models::{
    CreateTransactionRequest, ExpiryListResponse, HealthResponse, HistoryBarResponse, IvResponse,
    MaxPainResponse, MessageResponse, OptionChainResponse, OptionContractResponse, PcrResponse,
    PositionProfitResponse, PositionResponse, StockHistoryResponse, StockQuoteResponse,
    StrikeOpenInterestResponse, TransactionResponse, TransactionSummaryResponse, TransactionType,
};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        stock_portfolio_backend::api::handlers::health_check,
        stock_portfolio_backend::api::handlers::get_stock,
        stock_portfolio_backend::api::handlers::get_stock_history,
        stock_portfolio_backend::api::handlers::create_transaction,
        stock_portfolio_backend::api::handlers::list_transactions,
        stock_portfolio_backend::api::handlers::get_transaction_summary,
        stock_portfolio_backend::api::handlers::get_transaction,
        stock_portfolio_backend::api::handlers::delete_transaction,
        stock_portfolio_backend::api::handlers::list_portfolio,
        stock_portfolio_backend::api::handlers::get_portfolio_profit,
        stock_portfolio_backend::api::handlers::get_position,
        stock_portfolio_backend::api::handlers::get_position_profit,
        stock_portfolio_backend::api::handlers::get_option_expiries,
        stock_portfolio_backend::api::handlers::get_max_pain,
        stock_portfolio_backend::api::handlers::get_put_call_ratio,
        stock_portfolio_backend::api::handlers::get_atm_iv,
        stock_portfolio_backend::api::handlers::get_option_chain,
    ),
    components(
        schemas(
            HealthResponse,
            MessageResponse,
            StockQuoteResponse,
            StockHistoryResponse,
            HistoryBarResponse,
            TransactionType,
            CreateTransactionRequest,
            TransactionResponse,
            TransactionSummaryResponse,
            PositionResponse,
            PositionProfitResponse,
            ExpiryListResponse,
            OptionChainResponse,
            OptionContractResponse,
            MaxPainResponse,
            StrikeOpenInterestResponse,
            PcrResponse,
            IvResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Stock", description = "Stock quotes and historical data"),
        (name = "Transaction", description = "Buy/sell transaction ledger"),
        (name = "Portfolio", description = "Derived positions and profit/loss"),
        (name = "Option", description = "Options analytics"),
    ),
    info(
        title = "Stock Portfolio API",
        version = "0.2.0",
        description = "Stock information, options analytics and portfolio management API",
        license(name = "MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a missing file falls back to defaults with
    // environment overrides still applied.
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        warn!("config file {} not found, using defaults", config_path);
        Config::default()
    };
    let config = config.with_env_overrides();

    // Connect to the database and bring the schema up to date
    let db = DatabasePool::new(&config.database).await?;
    db.run_migrations().await?;

    // Market data gateway with a bounded per-call timeout
    let gateway = Arc::new(YahooGateway::new(&config.market_data)?);

    // Create application state
    let state = Arc::new(AppState::new(&db, gateway, config.clone()));

    info!(
        "Starting Stock Portfolio Backend on {}:{}",
        config.server.host, config.server.port
    );
    info!(
        "Swagger UI available at http://{}:{}/swagger-ui/",
        config.server.host, config.server.port
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = create_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
