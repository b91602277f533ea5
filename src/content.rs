//! Static catalogue served to the front end: courses, the economic calendar
//! and the chart widget configuration.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: &'static str,
    pub title: &'static str,
    pub level: CourseLevel,
    pub duration: &'static str,
    pub thumbnail: &'static str,
    pub category: &'static str,
}

pub fn courses() -> Vec<Course> {
    vec![
        Course {
            id: "1",
            title: "Gold Trading Fundamentals",
            level: CourseLevel::Beginner,
            duration: "2.5 hrs",
            thumbnail: "https://images.unsplash.com/photo-1589750670744-dc963161a917?auto=format&fit=crop&q=80&w=400",
            category: "Basics",
        },
        Course {
            id: "2",
            title: "Advanced XAUUSD Price Action",
            level: CourseLevel::Advanced,
            duration: "4 hrs",
            thumbnail: "https://images.unsplash.com/photo-1611974717482-58a2522e5686?auto=format&fit=crop&q=80&w=400",
            category: "Technical",
        },
        Course {
            id: "3",
            title: "Risk Management for 1:2 RR",
            level: CourseLevel::Intermediate,
            duration: "1.5 hrs",
            thumbnail: "https://images.unsplash.com/photo-1460925895917-afdab827c52f?auto=format&fit=crop&q=80&w=400",
            category: "Strategy",
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub time: &'static str,
    pub event: &'static str,
    pub impact: Impact,
    pub currency: &'static str,
}

pub fn economic_calendar() -> Vec<CalendarEvent> {
    vec![
        CalendarEvent { time: "20:30", event: "US CPI y/y", impact: Impact::High, currency: "USD" },
        CalendarEvent { time: "22:00", event: "Fed Chair Powell Speaks", impact: Impact::High, currency: "USD" },
        CalendarEvent { time: "23:30", event: "Crude Oil Inventories", impact: Impact::Low, currency: "USD" },
    ]
}

/// Options handed verbatim to the embedded chart widget
#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig {
    pub autosize: bool,
    pub symbol: &'static str,
    pub interval: &'static str,
    pub timezone: &'static str,
    pub theme: &'static str,
    pub style: &'static str,
    pub locale: &'static str,
    pub enable_publishing: bool,
    #[serde(rename = "backgroundColor")]
    pub background_color: &'static str,
    #[serde(rename = "gridColor")]
    pub grid_color: &'static str,
    pub withdateranges: bool,
    pub hide_side_toolbar: bool,
    pub allow_symbol_change: bool,
    pub save_image: bool,
    pub calendar: bool,
    pub support_host: &'static str,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            autosize: true,
            symbol: "OANDA:XAUUSD",
            interval: "60",
            timezone: "Etc/UTC",
            theme: "dark",
            style: "1",
            locale: "en",
            enable_publishing: false,
            background_color: "rgba(5, 5, 5, 1)",
            grid_color: "rgba(255, 255, 255, 0.06)",
            withdateranges: true,
            hide_side_toolbar: false,
            allow_symbol_change: true,
            save_image: false,
            calendar: false,
            support_host: "https://www.tradingview.com",
        }
    }
}
