//! Checks and normalizes caller parameters before they reach query construction.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::errors::ValidationError;
use crate::models::entity::EntityId;
use crate::models::timeline::{
    DateRange, EntityFilter, Pagination, TimelineFilters, TimelineParams, TimelineQuery,
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;
const MAX_RANGE_DAYS: i64 = 365;

/// Validates every timeline parameter and returns the normalized query.
///
/// When both an identifier and a name are given for the same entity kind the
/// identifier wins and the name is ignored without being checked.
pub fn validate_timeline_params(params: &TimelineParams) -> Result<TimelineQuery, ValidationError> {
    let date_range = validate_date_range(params.start_date.as_deref(), params.end_date.as_deref())?;

    let filters = TimelineFilters {
        location: entity_filter(
            params.location_id.as_deref(),
            params.location_name.as_deref(),
            "locationId",
            "locationName",
        )?,
        person: entity_filter(
            params.person_id.as_deref(),
            params.person_name.as_deref(),
            "personId",
            "personName",
        )?,
        policy: params
            .policy_id
            .as_deref()
            .map(|raw| parse_entity_id(raw, "policyId"))
            .transpose()?,
        group: entity_filter(
            params.group_id.as_deref(),
            params.group_name.as_deref(),
            "groupId",
            "groupName",
        )?,
        channel: params
            .channel
            .as_deref()
            .map(validate_channel)
            .transpose()?,
    };

    let pagination = sanitize_pagination(params.page.as_deref(), params.limit.as_deref())?;

    Ok(TimelineQuery {
        date_range,
        filters,
        pagination,
    })
}

/// Both ends required and parseable, `start < end`, span at most 365 days.
pub fn validate_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DateRange, ValidationError> {
    let start_raw =
        start.ok_or_else(|| ValidationError::new("startDate", "startDate is required"))?;
    let end_raw = end.ok_or_else(|| ValidationError::new("endDate", "endDate is required"))?;

    let start = parse_timestamp(start_raw)
        .ok_or_else(|| ValidationError::new("startDate", format!("Invalid startDate: {start_raw}")))?;
    let end = parse_timestamp(end_raw)
        .ok_or_else(|| ValidationError::new("endDate", format!("Invalid endDate: {end_raw}")))?;

    if start >= end {
        return Err(ValidationError::new(
            "dateRange",
            "startDate must be before endDate",
        ));
    }
    if end - start > Duration::days(MAX_RANGE_DAYS) {
        return Err(ValidationError::new(
            "dateRange",
            "Date range cannot exceed 1 year",
        ));
    }

    Ok(DateRange { start, end })
}

/// `page` defaults to 1 and is floored at 1; `limit` defaults to 20 and is
/// clamped to `[1, 100]`. Text with no leading integer is rejected.
pub fn sanitize_pagination(
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<Pagination, ValidationError> {
    let page = match page {
        Some(raw) => parse_leading_int(raw)
            .ok_or_else(|| ValidationError::new("page", format!("Invalid page: {raw}")))?,
        None => DEFAULT_PAGE,
    };
    let limit = match limit {
        Some(raw) => parse_leading_int(raw)
            .ok_or_else(|| ValidationError::new("limit", format!("Invalid limit: {raw}")))?,
        None => DEFAULT_LIMIT,
    };

    Ok(Pagination {
        page: page.clamp(1, i64::from(u32::MAX)) as u32,
        limit: limit.clamp(1, MAX_LIMIT) as u32,
    })
}

/// Entity identifiers must coerce to a positive integer.
pub fn parse_entity_id(raw: &str, field: &'static str) -> Result<EntityId, ValidationError> {
    match parse_leading_int(raw) {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::new(field, format!("Invalid {field}: {raw}"))),
    }
}

pub fn validate_channel(raw: &str) -> Result<String, ValidationError> {
    let channel = raw.trim();
    if channel.is_empty() {
        return Err(ValidationError::new(
            "channel",
            "Channel filter must be a non-empty string",
        ));
    }
    Ok(channel.to_string())
}

fn entity_filter(
    id: Option<&str>,
    name: Option<&str>,
    id_field: &'static str,
    name_field: &'static str,
) -> Result<Option<EntityFilter>, ValidationError> {
    if let Some(raw) = id {
        return parse_entity_id(raw, id_field).map(|id| Some(EntityFilter::ById(id)));
    }
    match name {
        Some(raw) => {
            let name = raw.trim();
            if name.is_empty() {
                return Err(ValidationError::new(
                    name_field,
                    format!("{name_field} cannot be empty"),
                ));
            }
            Ok(Some(EntityFilter::ByName(name.to_string())))
        }
        None => Ok(None),
    }
}

/// Accepts RFC 3339 timestamps, naive date-times (read as UTC) and plain dates
/// (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reads an optional sign and the leading digits, ignoring surrounding
/// whitespace and anything after the digits: `" 42abc"` is 42, `"3.7"` is 3.
/// Values past the `i64` range saturate.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    // Overflow saturates.
    let value = rest[..digits_len]
        .bytes()
        .try_fold(0i64, |acc, b| {
            acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
        })
        .unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
