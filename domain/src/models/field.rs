use std::collections::BTreeMap;

use garde::Validate as _;
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainErrorKind, domain_error, impl_string_primitive};

/// フィールド名
///
/// フィールド名はマシン名で、英小文字で始まり、英小文字、数字及びアンダースコアで構成される。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, garde::Validate)]
pub struct FieldName(
    #[garde(ascii, length(min = 1, max = 64), pattern(r"^[a-z][a-z0-9_]*$"))] String,
);

impl_string_primitive!(FieldName);

/// フィールド値
///
/// スカラー値のみを扱う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 真偽値
    Boolean(bool),
    /// 整数
    Integer(i64),
    /// 小数
    Decimal(f64),
    /// 文字列
    Text(String),
}

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = DomainError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(Self::Boolean(b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Self::Integer(i)),
                (None, Some(f)) => Ok(Self::Decimal(f)),
                (None, None) => Err(domain_error(
                    DomainErrorKind::Validation,
                    format!("{} can not be represented as a field value", n),
                )),
            },
            Value::String(s) => Ok(Self::Text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => Err(domain_error(
                DomainErrorKind::Validation,
                "A field value must be a boolean, a number or a string",
            )),
        }
    }
}

/// 組み込みフィールド
///
/// 割引コードのレコードが常に持つフィールドで、カスタムフィールドよりも優先して解決される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinField {
    Id,
    Title,
    Status,
    Region,
    ValidFrom,
    ValidUntil,
    CreatedAt,
    UpdatedAt,
}

impl BuiltinField {
    pub fn from_name(name: &FieldName) -> Option<Self> {
        match &**name {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "status" => Some(Self::Status),
            "region" => Some(Self::Region),
            "valid_from" => Some(Self::ValidFrom),
            "valid_until" => Some(Self::ValidUntil),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

/// カスタムフィールド
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFields(BTreeMap<FieldName, FieldValue>);

impl CustomFields {
    /// JSONオブジェクトからカスタムフィールドを構築する。
    ///
    /// フィールド名がマシン名でない項目や、値がスカラーでない項目は読み飛ばす。
    pub fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut fields = BTreeMap::new();
        for (name, value) in object {
            let name = match FieldName::new(name.clone()) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(field = %name, error = %e, "skipped custom field");
                    continue;
                }
            };
            if value.is_null() {
                continue;
            }
            match FieldValue::try_from(value) {
                Ok(value) => {
                    fields.insert(name, value);
                }
                Err(e) => tracing::warn!(field = %name, error = %e, "skipped custom field"),
            }
        }
        Self(fields)
    }

    pub fn get(&self, name: &FieldName) -> Option<&FieldValue> {
        self.0.get(name)
    }

}

impl FromIterator<(FieldName, FieldValue)> for CustomFields {
    fn from_iter<I: IntoIterator<Item = (FieldName, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
