use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::HolidayCalendar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeId {
    Spring,
    Summer,
    Autumn,
    Winter,
    ChineseNewYear,
    Qingming,
    DragonBoat,
    MidAutumn,
    Christmas,
    #[default]
    Default,
}

impl ThemeId {
    pub const ALL: [ThemeId; 10] = [
        ThemeId::Spring,
        ThemeId::Summer,
        ThemeId::Autumn,
        ThemeId::Winter,
        ThemeId::ChineseNewYear,
        ThemeId::Qingming,
        ThemeId::DragonBoat,
        ThemeId::MidAutumn,
        ThemeId::Christmas,
        ThemeId::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::Spring => "spring",
            ThemeId::Summer => "summer",
            ThemeId::Autumn => "autumn",
            ThemeId::Winter => "winter",
            ThemeId::ChineseNewYear => "chinese_new_year",
            ThemeId::Qingming => "qingming",
            ThemeId::DragonBoat => "dragon_boat",
            ThemeId::MidAutumn => "mid_autumn",
            ThemeId::Christmas => "christmas",
            ThemeId::Default => "default",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ThemeId::Spring => "春季",
            ThemeId::Summer => "夏季",
            ThemeId::Autumn => "秋季",
            ThemeId::Winter => "冬季",
            ThemeId::ChineseNewYear => "春節",
            ThemeId::Qingming => "清明節",
            ThemeId::DragonBoat => "端午節",
            ThemeId::MidAutumn => "中秋節",
            ThemeId::Christmas => "聖誕節",
            ThemeId::Default => "預設",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ThemeId::Spring => "春季主題：嫩綠漸變背景配以淡雅花朵點綴",
            ThemeId::Summer => "夏季主題：海藍漸變背景搭配明亮陽光元素",
            ThemeId::Autumn => "秋季主題：暖橙褐色背景與秋葉圖案",
            ThemeId::Winter => "冬季主題：冰藍色背景與雪花圖案",
            ThemeId::ChineseNewYear => "春節主題：喜慶的紅金配色，象徵新年的祝福與喜悅",
            ThemeId::Qingming => "清明節主題：清新綠色，象徵生機與懷念",
            ThemeId::DragonBoat => "端午節主題：代表端午的五彩裝飾與艾草綠",
            ThemeId::MidAutumn => "中秋節主題：皎潔的月色和溫暖的燈籠橘",
            ThemeId::Christmas => "聖誕節主題：紅綠相間的經典聖誕配色與雪花點綴",
            ThemeId::Default => "預設主題：簡潔現代風格",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ThemeId::Spring => "🌸",
            ThemeId::Summer => "🌞",
            ThemeId::Autumn => "🍂",
            ThemeId::Winter => "❄️",
            ThemeId::ChineseNewYear => "🧧",
            ThemeId::Qingming => "🌿",
            ThemeId::DragonBoat => "🚣",
            ThemeId::MidAutumn => "🌕",
            ThemeId::Christmas => "🎄",
            ThemeId::Default => "🎨",
        }
    }
}

impl FromStr for ThemeId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeId::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.display_name() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{}'", s))
    }
}

/// Pick the theme for `now`.
///
/// Order: holiday named by `calendar` > holiday date ranges > season.
/// Calendar failures are logged and fall through to the date rules.
pub fn detect_theme<Tz: TimeZone>(
    now: &DateTime<Tz>,
    calendar: &dyn HolidayCalendar,
) -> (ThemeId, &'static str) {
    let date = now.date_naive();

    match calendar.holiday_name(date) {
        Ok(Some(name)) => {
            if let Some(theme) = theme_for_holiday_name(&name) {
                debug!("Calendar holiday '{}' on {} -> {:?}", name, date, theme);
                return (theme, theme.description());
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Holiday calendar lookup failed for {}: {}", date, e),
    }

    let theme = holiday_by_range(date).unwrap_or_else(|| season_of(date.month()));
    (theme, theme.description())
}

/// Map a calendar holiday name to its theme. Names come either in Chinese or
/// in the English spelling used by common holiday datasets.
pub fn theme_for_holiday_name(name: &str) -> Option<ThemeId> {
    let lower = name.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| name.contains(k) || lower.contains(k));

    if has(&["春節", "除夕", "初一", "大年初", "spring festival", "lunar new year"]) {
        Some(ThemeId::ChineseNewYear)
    } else if has(&["清明", "tomb-sweeping", "tomb sweeping", "qingming"]) {
        Some(ThemeId::Qingming)
    } else if has(&["端午", "dragon boat"]) {
        Some(ThemeId::DragonBoat)
    } else if has(&["中秋", "mid-autumn", "mid autumn"]) {
        Some(ThemeId::MidAutumn)
    } else {
        None
    }
}

/// Approximate holiday windows used when the calendar names nothing.
pub fn holiday_by_range(date: NaiveDate) -> Option<ThemeId> {
    let (month, day) = (date.month(), date.day());
    match (month, day) {
        (1, 20..) | (2, ..=20) => Some(ThemeId::ChineseNewYear),
        (4, 4 | 5) => Some(ThemeId::Qingming),
        (5, 25..) | (6, ..=5) => Some(ThemeId::DragonBoat),
        (9, 15..=25) => Some(ThemeId::MidAutumn),
        (12, 15..=31) => Some(ThemeId::Christmas),
        _ => None,
    }
}

pub fn season_of(month: u32) -> ThemeId {
    match month {
        3..=5 => ThemeId::Spring,
        6..=8 => ThemeId::Summer,
        9..=11 => ThemeId::Autumn,
        _ => ThemeId::Winter,
    }
}
