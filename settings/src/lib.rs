use enum_display::EnumDisplay;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Deserializer};
use sqlx::postgres::PgConnectOptions;
use time::UtcOffset;

/// アプリケーション設定
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// HTTPサーバー設定
    pub http: HttpSettings,
    /// データベース設定
    pub database: DatabaseSettings,
    /// 割引コード検索設定
    #[serde(default)]
    pub lookup: LookupSettings,
    /// ログ設定
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, EnumDisplay)]
#[serde(rename = "protocol")]
#[serde(rename_all = "lowercase")]
#[enum_display(case = "Lower")]
pub enum HttpProtocol {
    /// HTTPプロトコル
    Http,
    /// HTTPSプロトコル
    Https,
}

/// HTTPサーバー設定
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// プロトコル
    pub protocol: HttpProtocol,
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
}

impl HttpSettings {
    /// バインドするアドレス（ホスト名とポート番号）を返す。
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// データベース設定
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// ユーザー名
    pub user: String,
    /// パスワード
    pub password: SecretString,
    /// データベース名
    pub name: String,
    /// 最大接続数
    pub max_connections: u32,
    /// 接続タイムアウト（秒）
    pub connection_timeout: u64,
}

impl DatabaseSettings {
    /// データベースの接続オプションを返す。
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.name)
    }
}

/// 割引コード検索設定
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LookupSettings {
    /// UNIXタイムスタンプを日付に変換するときのUTCオフセット
    ///
    /// 設定ファイルには秒数で記述する。
    #[serde(
        rename = "utc_offset_seconds",
        default = "default_utc_offset",
        deserialize_with = "deserialize_utc_offset"
    )]
    pub utc_offset: UtcOffset,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_utc_offset() -> UtcOffset {
    UtcOffset::UTC
}

fn deserialize_utc_offset<'de, D>(deserializer: D) -> Result<UtcOffset, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i32::deserialize(deserializer)?;
    UtcOffset::from_whole_seconds(seconds).map_err(serde::de::Error::custom)
}

/// ログ設定
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LoggingSettings {
    /// ログレベル
    pub level: LogLevel,
}

/// ログレベル
///
/// 設定ファイルには小文字で記述する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumDisplay)]
#[serde(rename_all = "lowercase")]
#[enum_display(case = "Lower")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
