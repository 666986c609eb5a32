//! Constants used throughout the registro core crate.
//!
//! Display vocabulary, endpoint defaults and chart geometry live here so the formatter, chart
//! renderer and controller agree on them.

use std::time::Duration;

/// Display substitute for absent, null or empty field values.
pub const PLACEHOLDER: &str = "—";

/// API base used when the runtime host is a local development machine.
pub const DEV_API_BASE: &str = "http://localhost:5000/api";

/// Path the API is mounted under in deployment, relative to the serving origin.
pub const API_PATH: &str = "/api";

/// Host names treated as local development.
pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Host assumed when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Page sizes the operator may choose from.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];

/// Page size selected at start-up.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Quiet period after the last name-search keystroke before a fetch fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Text shown for `true` flags in the patient table.
pub const YES: &str = "Sí";

/// Text shown for `false` flags in the patient table.
pub const NO: &str = "No";

/// Risk chart padding around the plot area, in pixels.
pub const CHART_PADDING: f64 = 40.0;

/// Fraction of each category slot filled by its bar.
pub const CHART_BAR_FILL: f64 = 0.6;

/// Default chart canvas size.
pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 320;

pub const CHART_FONT: &str = "12px system-ui";
