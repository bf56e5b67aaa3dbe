//! Fuzz target for typed cell parsing.
//!
//! Every field type must either parse or return a parse error with a
//! recovered value; none may panic.

#![no_main]

use feedcheck::schema::FieldType;
use feedcheck::value::FieldValue;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000 {
        return;
    }
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    for field_type in [
        FieldType::Text,
        FieldType::Id,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Date,
        FieldType::Time,
        FieldType::Color,
        FieldType::Currency,
        FieldType::Email,
        FieldType::Url,
        FieldType::LanguageCode,
        FieldType::Timezone,
        FieldType::Enum(vec![0, 1, 2, 3]),
    ] {
        if let Err(err) = FieldValue::parse(raw, &field_type) {
            let _ = err.recovered_value(raw.trim());
        }
    }
});
