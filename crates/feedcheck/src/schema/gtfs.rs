//! GTFS Schedule schema used by the default rule set.
//!
//! Only the files the default rules read, plus a few common companions, are
//! declared. Files outside the catalog are reported as unknown and ignored.

use super::catalog::SchemaCatalog;
use super::field::FieldSchema;
use super::table::TableSchema;
use super::types::{FieldType, NumericRange};

pub const AGENCY: &str = "agency";
pub const STOPS: &str = "stops";
pub const ROUTES: &str = "routes";
pub const TRIPS: &str = "trips";
pub const STOP_TIMES: &str = "stop_times";
pub const CALENDAR: &str = "calendar";
pub const CALENDAR_DATES: &str = "calendar_dates";
pub const SHAPES: &str = "shapes";
pub const FREQUENCIES: &str = "frequencies";
pub const TRANSFERS: &str = "transfers";
pub const FARE_ATTRIBUTES: &str = "fare_attributes";
pub const FEED_INFO: &str = "feed_info";

fn id(name: &str) -> FieldSchema {
    FieldSchema::new(name, FieldType::Id)
}

fn text(name: &str) -> FieldSchema {
    FieldSchema::new(name, FieldType::Text)
}

fn flag(name: &str, values: &[i64]) -> FieldSchema {
    FieldSchema::new(name, FieldType::Enum(values.to_vec()))
}

fn latitude(name: &str) -> FieldSchema {
    FieldSchema::new(name, FieldType::Float).with_range(NumericRange::new(-90.0, 90.0))
}

fn longitude(name: &str) -> FieldSchema {
    FieldSchema::new(name, FieldType::Float).with_range(NumericRange::new(-180.0, 180.0))
}

fn distance(name: &str) -> FieldSchema {
    FieldSchema::new(name, FieldType::Float).with_range(NumericRange::non_negative())
}

fn agency() -> TableSchema {
    TableSchema::new(AGENCY)
        .required()
        .field(id("agency_id").primary_key())
        .field(text("agency_name").required())
        .field(FieldSchema::new("agency_url", FieldType::Url).required())
        .field(FieldSchema::new("agency_timezone", FieldType::Timezone).required())
        .field(FieldSchema::new("agency_lang", FieldType::LanguageCode))
        .field(text("agency_phone"))
        .field(FieldSchema::new("agency_fare_url", FieldType::Url))
        .field(FieldSchema::new("agency_email", FieldType::Email))
}

fn stops() -> TableSchema {
    TableSchema::new(STOPS)
        .required()
        .field(id("stop_id").required().primary_key())
        .field(text("stop_code"))
        .field(text("stop_name"))
        .field(text("stop_desc"))
        .field(latitude("stop_lat"))
        .field(longitude("stop_lon"))
        .field(id("zone_id"))
        .field(FieldSchema::new("stop_url", FieldType::Url))
        .field(flag("location_type", &[0, 1, 2, 3, 4]))
        .field(id("parent_station").references(STOPS, "stop_id"))
        .field(FieldSchema::new("stop_timezone", FieldType::Timezone))
        .field(flag("wheelchair_boarding", &[0, 1, 2]))
        .field(id("level_id"))
        .field(text("platform_code"))
}

fn routes() -> TableSchema {
    TableSchema::new(ROUTES)
        .required()
        .field(id("route_id").required().primary_key())
        .field(id("agency_id").references(AGENCY, "agency_id"))
        .field(text("route_short_name"))
        .field(text("route_long_name"))
        .field(text("route_desc"))
        .field(flag("route_type", &[0, 1, 2, 3, 4, 5, 6, 7, 11, 12]).required())
        .field(FieldSchema::new("route_url", FieldType::Url))
        .field(FieldSchema::new("route_color", FieldType::Color))
        .field(FieldSchema::new("route_text_color", FieldType::Color))
        .field(
            FieldSchema::new("route_sort_order", FieldType::Integer)
                .with_range(NumericRange::non_negative()),
        )
}

fn trips() -> TableSchema {
    TableSchema::new(TRIPS)
        .required()
        .field(id("route_id").required().references(ROUTES, "route_id"))
        .field(id("service_id").required())
        .field(id("trip_id").required().primary_key())
        .field(text("trip_headsign"))
        .field(text("trip_short_name"))
        .field(flag("direction_id", &[0, 1]))
        .field(id("block_id").grouping())
        .field(id("shape_id").references(SHAPES, "shape_id"))
        .field(flag("wheelchair_accessible", &[0, 1, 2]))
        .field(flag("bikes_allowed", &[0, 1, 2]))
}

fn stop_times() -> TableSchema {
    TableSchema::new(STOP_TIMES)
        .required()
        .field(
            id("trip_id")
                .required()
                .primary_key()
                .grouping()
                .references(TRIPS, "trip_id"),
        )
        .field(FieldSchema::new("arrival_time", FieldType::Time))
        .field(FieldSchema::new("departure_time", FieldType::Time))
        .field(id("stop_id").required().references(STOPS, "stop_id"))
        .field(
            FieldSchema::new("stop_sequence", FieldType::Integer)
                .required()
                .primary_key()
                .sequence()
                .with_range(NumericRange::non_negative()),
        )
        .field(text("stop_headsign"))
        .field(flag("pickup_type", &[0, 1, 2, 3]))
        .field(flag("drop_off_type", &[0, 1, 2, 3]))
        .field(distance("shape_dist_traveled"))
        .field(flag("timepoint", &[0, 1]))
}

fn calendar() -> TableSchema {
    let mut schema = TableSchema::new(CALENDAR).field(id("service_id").required().primary_key());
    for day in [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ] {
        schema = schema.field(flag(day, &[0, 1]).required());
    }
    schema
        .field(FieldSchema::new("start_date", FieldType::Date).required())
        .field(FieldSchema::new("end_date", FieldType::Date).required())
}

fn calendar_dates() -> TableSchema {
    TableSchema::new(CALENDAR_DATES)
        .field(id("service_id").required().primary_key().grouping())
        .field(
            FieldSchema::new("date", FieldType::Date)
                .required()
                .primary_key()
                .sequence(),
        )
        .field(flag("exception_type", &[1, 2]).required())
}

fn shapes() -> TableSchema {
    TableSchema::new(SHAPES)
        .field(id("shape_id").required().primary_key().grouping())
        .field(latitude("shape_pt_lat").required())
        .field(longitude("shape_pt_lon").required())
        .field(
            FieldSchema::new("shape_pt_sequence", FieldType::Integer)
                .required()
                .primary_key()
                .sequence()
                .with_range(NumericRange::non_negative()),
        )
        .field(distance("shape_dist_traveled"))
}

fn frequencies() -> TableSchema {
    TableSchema::new(FREQUENCIES)
        .field(
            id("trip_id")
                .required()
                .primary_key()
                .grouping()
                .references(TRIPS, "trip_id"),
        )
        .field(
            FieldSchema::new("start_time", FieldType::Time)
                .required()
                .primary_key()
                .sequence(),
        )
        .field(FieldSchema::new("end_time", FieldType::Time).required())
        .field(
            FieldSchema::new("headway_secs", FieldType::Integer)
                .required()
                .with_range(NumericRange::non_negative()),
        )
        .field(flag("exact_times", &[0, 1]))
}

fn transfers() -> TableSchema {
    TableSchema::new(TRANSFERS)
        .field(id("from_stop_id").primary_key().references(STOPS, "stop_id"))
        .field(id("to_stop_id").primary_key().references(STOPS, "stop_id"))
        .field(id("from_route_id").primary_key().references(ROUTES, "route_id"))
        .field(id("to_route_id").primary_key().references(ROUTES, "route_id"))
        .field(id("from_trip_id").primary_key().references(TRIPS, "trip_id"))
        .field(id("to_trip_id").primary_key().references(TRIPS, "trip_id"))
        .field(flag("transfer_type", &[0, 1, 2, 3, 4, 5]).required())
        .field(
            FieldSchema::new("min_transfer_time", FieldType::Integer)
                .with_range(NumericRange::non_negative()),
        )
}

fn fare_attributes() -> TableSchema {
    TableSchema::new(FARE_ATTRIBUTES)
        .field(id("fare_id").required().primary_key())
        .field(distance("price").required())
        .field(FieldSchema::new("currency_type", FieldType::Currency).required())
        .field(flag("payment_method", &[0, 1]).required())
        .field(flag("transfers", &[0, 1, 2]))
        .field(id("agency_id").references(AGENCY, "agency_id"))
        .field(
            FieldSchema::new("transfer_duration", FieldType::Integer)
                .with_range(NumericRange::non_negative()),
        )
}

fn feed_info() -> TableSchema {
    TableSchema::new(FEED_INFO)
        .field(text("feed_publisher_name").required())
        .field(FieldSchema::new("feed_publisher_url", FieldType::Url).required())
        .field(FieldSchema::new("feed_lang", FieldType::LanguageCode).required())
        .field(FieldSchema::new("default_lang", FieldType::LanguageCode))
        .field(FieldSchema::new("feed_start_date", FieldType::Date))
        .field(FieldSchema::new("feed_end_date", FieldType::Date))
        .field(text("feed_version"))
        .field(FieldSchema::new("feed_contact_email", FieldType::Email))
        .field(FieldSchema::new("feed_contact_url", FieldType::Url))
}

/// The GTFS Schedule catalog.
pub fn catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_table(agency())
        .with_table(stops())
        .with_table(routes())
        .with_table(trips())
        .with_table(stop_times())
        .with_table(calendar())
        .with_table(calendar_dates())
        .with_table(shapes())
        .with_table(frequencies())
        .with_table(transfers())
        .with_table(fare_attributes())
        .with_table(feed_info())
}
