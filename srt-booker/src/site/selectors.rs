//! The reservation site's fixed markup contract.
//!
//! These identifiers belong to the operator's site. They are not ours to
//! change; when the site changes, this file changes.

/// Login form URL.
pub const LOGIN_URL: &str = "https://etk.srail.kr/cmc/01/selectLoginForm.do?pageId=TK0701000000";

/// Fragment of the login URL used to tell whether we are still on it.
pub const LOGIN_PATH: &str = "selectLoginForm";

/// General ticket search URL, used when menu navigation fails.
pub const SEARCH_URL: &str = "https://etk.srail.kr/hpg/hra/01/selectTicketList.do?pageId=TK0101010000";

/// Member id input on the login form.
pub const LOGIN_ID_INPUT: &str = "srchDvNm01";

/// Password input on the login form.
pub const LOGIN_PASSWORD_INPUT: &str = "hmpgPwdCphd01";

/// Login submit control.
pub const LOGIN_SUBMIT: &str = "input.submit";

/// Top-level ticket menu.
pub const TICKET_MENU: &str = "gnb";

/// Submenu entry for general tickets, located by visible text.
pub const GENERAL_TICKET_LINK: &str = "//a[contains(text(), '일반승차권')]";

/// Departure station text input.
pub const ORIGIN_INPUT: &str = "dptRsStnCdNm";

/// Arrival station text input.
pub const DESTINATION_INPUT: &str = "arvRsStnCdNm";

/// Departure date dropdown; values are `YYYYMMDD`.
pub const DATE_SELECT: &str = "dptDt";

/// Departure time dropdown; values are `HH0000` in 2-hour steps.
pub const TIME_SELECT: &str = "dptTm";

/// Adult passenger dropdown.
pub const ADULT_SELECT: &str = "psgInfoPerPrnb1";

/// Search trigger button.
pub const SEARCH_BUTTON: &str = ".inquery_btn";

/// One row per candidate train.
pub const RESULT_ROWS: &str = "#search-list tbody tr";

/// Cell holding the departure station and time.
pub const DEPARTURE_CELL: &str = "td:nth-child(4)";

/// Cell holding the general-seat reservation affordances.
pub const GENERAL_SEAT_CELL: &str = "td:nth-child(7)";

/// Affordances inside the general-seat cell.
pub const CLAIM_ANCHORS: &str = "a";

/// Label carried by an actionable reservation affordance.
///
/// Sold-out, waitlist and disabled states share the same cell with other
/// labels, so position alone says nothing.
pub const RESERVE_LABEL: &str = "예약하기";
