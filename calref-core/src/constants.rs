/// The hosted service's alias for the caller's own calendar.
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Directory alias for the caller's own organization.
pub const DEFAULT_CUSTOMER_ID: &str = "my_customer";

/// Timezone used to interpret bare dates when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

/// How many reference calendars are fetched at once.
pub const DEFAULT_REFERENCE_CONCURRENCY: usize = 4;
