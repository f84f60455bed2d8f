use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: DriverStatus,
    pub rating: f64,
    pub total_rides: i64,
    pub vehicle: Vehicle,
    /// Daily shift window, "HH:MM" strings.
    pub start_time: String,
    pub end_time: String,
    /// Working weekdays, 0 = Sunday through 6 = Saturday.
    pub days_of_week: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub plate: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Available,
    Busy,
    Offline,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "available",
            DriverStatus::Busy => "busy",
            DriverStatus::Offline => "offline",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "available" => DriverStatus::Available,
            "busy" => DriverStatus::Busy,
            _ => DriverStatus::Offline,
        }
    }
}

impl Driver {
    /// Whether this driver's weekly window covers the pickup time.
    ///
    /// Only the hour component of the shift times is compared, so a
    /// driver with a 09:30 start is treated as on shift from 09:00.
    pub fn covers(&self, pickup: &NaiveDateTime) -> bool {
        let weekday = pickup.date().weekday().num_days_from_sunday();
        if !self.days_of_week.contains(&weekday) {
            return false;
        }

        let hour = pickup.time().hour();
        let start = parse_hour(&self.start_time);
        let end = parse_hour(&self.end_time);
        match (start, end) {
            (Some(start), Some(end)) => hour >= start && hour < end,
            _ => false,
        }
    }
}

fn parse_hour(s: &str) -> Option<u32> {
    let hour: u32 = s.split(':').next()?.parse().ok()?;
    if hour > 23 {
        return None;
    }
    Some(hour)
}
