//! Configuration keys, defaults and option lists

/// Integration domain
pub const DOMAIN: &str = "garbage_collection";

/// YAML key holding the list of sensors to import
pub const CONF_SENSORS: &str = "sensors";

// Step 1 keys
pub const CONF_NAME: &str = "name";
pub const CONF_FREQUENCY: &str = "frequency";
pub const CONF_ICON_NORMAL: &str = "icon_normal";
pub const CONF_ICON_TODAY: &str = "icon_today";
pub const CONF_ICON_TOMORROW: &str = "icon_tomorrow";
pub const CONF_EXPIRE_AFTER: &str = "expire_after";
pub const CONF_VERBOSE_STATE: &str = "verbose_state";
pub const CONF_HIDDEN: &str = "hidden";
pub const CONF_MANUAL: &str = "manual_update";

// Step 2 keys
pub const CONF_DATE: &str = "date";
pub const CONF_ENTITIES: &str = "entities";
pub const CONF_COLLECTION_DAYS: &str = "collection_days";
pub const CONF_FIRST_MONTH: &str = "first_month";
pub const CONF_LAST_MONTH: &str = "last_month";
pub const CONF_WEEKDAY_ORDER_NUMBER: &str = "weekday_order_number";
pub const CONF_WEEK_ORDER_NUMBER: &str = "week_order_number";
pub const CONF_PERIOD: &str = "period";
pub const CONF_FIRST_WEEK: &str = "first_week";
pub const CONF_FIRST_DATE: &str = "first_date";
pub const CONF_VERBOSE_FORMAT: &str = "verbose_format";
pub const CONF_DATE_FORMAT: &str = "date_format";

/// Identifier generated for entries created by the config flow
pub const CONF_UNIQUE_ID: &str = "unique_id";

pub const DEFAULT_FREQUENCY: &str = "weekly";
pub const DEFAULT_ICON_NORMAL: &str = "mdi:trash-can";
pub const DEFAULT_ICON_TODAY: &str = "mdi:delete-restore";
pub const DEFAULT_ICON_TOMORROW: &str = "mdi:delete-circle";
pub const DEFAULT_VERBOSE_STATE: bool = false;
pub const DEFAULT_FIRST_MONTH: &str = "jan";
pub const DEFAULT_LAST_MONTH: &str = "dec";
pub const DEFAULT_PERIOD: i64 = 1;
pub const DEFAULT_FIRST_WEEK: i64 = 1;
pub const DEFAULT_VERBOSE_FORMAT: &str = "on {date}, in {days} days";
pub const DEFAULT_DATE_FORMAT: &str = "%d-%b-%Y";

pub const MONTH_OPTIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Range of `period`, in days, weeks or months depending on the frequency
pub const PERIOD_RANGE: (i64, i64) = (1, 365);
/// Range of `first_week` (ISO week number)
pub const FIRST_WEEK_RANGE: (i64, i64) = (1, 52);
/// Range of the monthly order numbers (1st..5th)
pub const ORDER_NUMBER_RANGE: (i64, i64) = (1, 5);

/// Error code for a malformed icon
pub const ERROR_ICON: &str = "icon";
/// Error code for a malformed `expire_after`
pub const ERROR_TIME: &str = "time";
/// Abort reason of the options flow for entries without a unique id
pub const ABORT_NO_OPTIONS: &str = "no_options";

// Step ids
pub const STEP_USER: &str = "user";
pub const STEP_DETAIL: &str = "detail";
pub const STEP_IMPORT: &str = "import";
pub const STEP_INIT: &str = "init";
