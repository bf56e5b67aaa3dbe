//! Raw cell parsing for each declared field type.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::notice::Severity;
use crate::schema::FieldType;

use super::field_value::FieldValue;
use super::time::{Color, ServiceTime};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://[a-z0-9\-._~%]+(:[0-9]+)?(/[^\s]*)?$").expect("valid url regex")
});

static LANGUAGE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$").expect("valid language regex")
});

static TIMEZONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(UTC|GMT|[A-Za-z_]+(/[A-Za-z0-9_+\-]+)+)$").expect("valid timezone regex")
});

/// Active ISO 4217 currency codes.
const CURRENCY_CODES: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT",
    "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD",
    "CDF", "CHF", "CLP", "CNY", "COP", "CRC", "CUP", "CVE", "CZK", "DJF", "DKK", "DOP", "DZD",
    "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP", "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ",
    "GYD", "HKD", "HNL", "HTG", "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD",
    "JPY", "KES", "KGS", "KHR", "KMF", "KPW", "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR",
    "LRD", "LSL", "LYD", "MAD", "MDL", "MGA", "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR",
    "MWK", "MXN", "MYR", "MZN", "NAD", "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN",
    "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB", "RWF", "SAR", "SBD", "SCR",
    "SDG", "SEK", "SGD", "SHP", "SLE", "SOS", "SRD", "SSP", "STN", "SVC", "SYP", "SZL", "THB",
    "TJS", "TMT", "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "UYU", "UZS",
    "VES", "VND", "VUV", "WST", "XAF", "XCD", "XOF", "XPF", "YER", "ZAR", "ZMW", "ZWL",
];

/// Why a non-empty cell could not be read as its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldParseError {
    #[error("'{0}' is not an integer")]
    Integer(String),
    #[error("'{0}' is not a finite number")]
    Float(String),
    #[error("'{0}' is not a YYYYMMDD date")]
    Date(String),
    #[error("'{0}' is not an H:MM:SS time")]
    Time(String),
    #[error("'{0}' is not a six digit hexadecimal color")]
    Color(String),
    #[error("'{0}' is not an ISO 4217 currency code")]
    Currency(String),
    #[error("'{0}' is not an e-mail address")]
    Email(String),
    #[error("'{0}' is not an http(s) URL")]
    Url(String),
    #[error("'{0}' is not a language tag")]
    LanguageCode(String),
    #[error("'{0}' is not a timezone name")]
    Timezone(String),
    /// The value is a valid integer outside the allowed set. It is kept.
    #[error("{0} is not an expected enum value")]
    UnexpectedEnumValue(i64),
}

impl FieldParseError {
    /// Notice code reported for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            FieldParseError::Integer(_) => "invalid_integer",
            FieldParseError::Float(_) => "invalid_float",
            FieldParseError::Date(_) => "invalid_date",
            FieldParseError::Time(_) => "invalid_time",
            FieldParseError::Color(_) => "invalid_color",
            FieldParseError::Currency(_) => "invalid_currency",
            FieldParseError::Email(_) => "invalid_email",
            FieldParseError::Url(_) => "invalid_url",
            FieldParseError::LanguageCode(_) => "invalid_language_code",
            FieldParseError::Timezone(_) => "invalid_timezone",
            FieldParseError::UnexpectedEnumValue(_) => "unexpected_enum_value",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FieldParseError::UnexpectedEnumValue(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Value the row keeps despite the failure.
    pub fn recovered_value(&self, raw: &str) -> FieldValue {
        match self {
            FieldParseError::UnexpectedEnumValue(v) => FieldValue::Integer(*v),
            _ => FieldValue::Invalid(raw.to_string()),
        }
    }
}

/// Parse a trimmed, non-empty cell.
pub(crate) fn parse_present(value: &str, field_type: &FieldType) -> Result<FieldValue, FieldParseError> {
    let owned = || value.to_string();
    match field_type {
        FieldType::Text | FieldType::Id => Ok(FieldValue::Text(owned())),
        FieldType::Integer => value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| FieldParseError::Integer(owned())),
        FieldType::Float => match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
            _ => Err(FieldParseError::Float(owned())),
        },
        FieldType::Date => parse_date(value)
            .map(FieldValue::Date)
            .ok_or_else(|| FieldParseError::Date(owned())),
        FieldType::Time => ServiceTime::parse(value)
            .map(FieldValue::Time)
            .ok_or_else(|| FieldParseError::Time(owned())),
        FieldType::Color => Color::parse(value)
            .map(FieldValue::Color)
            .ok_or_else(|| FieldParseError::Color(owned())),
        FieldType::Currency => {
            let upper = value.to_ascii_uppercase();
            if CURRENCY_CODES.binary_search(&upper.as_str()).is_ok() {
                Ok(FieldValue::Text(upper))
            } else {
                Err(FieldParseError::Currency(owned()))
            }
        }
        FieldType::Email => matched(&EMAIL, value).ok_or_else(|| FieldParseError::Email(owned())),
        FieldType::Url => matched(&URL, value).ok_or_else(|| FieldParseError::Url(owned())),
        FieldType::LanguageCode => {
            matched(&LANGUAGE_CODE, value).ok_or_else(|| FieldParseError::LanguageCode(owned()))
        }
        FieldType::Timezone => {
            matched(&TIMEZONE, value).ok_or_else(|| FieldParseError::Timezone(owned()))
        }
        FieldType::Enum(allowed) => {
            let v = value
                .parse::<i64>()
                .map_err(|_| FieldParseError::Integer(owned()))?;
            if allowed.contains(&v) {
                Ok(FieldValue::Integer(v))
            } else {
                Err(FieldParseError::UnexpectedEnumValue(v))
            }
        }
    }
}

fn matched(pattern: &Regex, value: &str) -> Option<FieldValue> {
    pattern.is_match(value).then(|| FieldValue::Text(value.to_string()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}
