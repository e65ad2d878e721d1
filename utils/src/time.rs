use time::{Date, OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

/// 日付フォーマット（`YYYY-MM-DD`）
pub const DATE_FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// UNIXタイムスタンプ（秒）を、指定されたオフセットにおける日付に変換する。
///
/// 時刻は切り捨てられ、日単位の精度になる。
///
/// # 引数
///
/// * `timestamp` - UNIXタイムスタンプ（秒）
/// * `offset` - 日付を決定するUTCオフセット
///
/// # 戻り値
///
/// 日付。タイムスタンプが表現できる範囲外の場合は`None`
pub fn date_of_timestamp(timestamp: i64, offset: UtcOffset) -> Option<Date> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .map(|dt| dt.to_offset(offset).date())
}

/// 日付を`YYYY-MM-DD`形式の文字列にする。
pub fn format_date(date: Date) -> String {
    // DATE_FORMATは年月日のみで構成されるため、フォーマットに失敗することはない
    date.format(&DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}
