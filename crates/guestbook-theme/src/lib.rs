//! Guestbook theme selection
//!
//! Maps the current date to one of ten decorative themes. Holidays win over
//! seasons; the holiday lookup is pluggable so deployments can ship an exact
//! calendar while tests force the date-range heuristics.

pub mod calendar;
pub mod detect;
pub mod styles;

pub use calendar::{HeuristicOnly, HolidayCalendar, HolidayTable};
pub use detect::{ThemeId, detect_theme};
