use anyhow::Context as _;

use infra::AppState;

use app::{
    bind_address, create_pg_pool, get_subscriber, init_subscriber, load_app_settings,
    routes::create_router,
};

/// アプリケーションエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // アプリケーション設定を読み込み
    let app_settings = load_app_settings("app_settings.toml")?;

    // ロガーを初期化
    let subscriber = get_subscriber(
        env!("CARGO_PKG_NAME").into(),
        app_settings.logging.level.into(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    // データベース接続プールを作成
    let pg_pool = create_pg_pool(&app_settings.database).await?;

    // ルーターを作成
    let (listener, port) = bind_address(&app_settings.http).await?;
    let app_state = AppState {
        app_settings: app_settings.clone(),
        pg_pool,
    };
    let router = create_router(app_state);

    // HTTPサーバーを起動
    tracing::info!(
        "HTTP server is running on {}://{}:{}",
        app_settings.http.protocol,
        app_settings.http.host,
        port
    );
    axum::serve(listener, router)
        .await
        .context("Failed to start the HTTP server")?;

    Ok(())
}
