use chrono::{DateTime, Utc};
use icare_core::{
    Facility, FacilityHours, FacilityKind, FacilityLocation, HolidayPolicy, LunchBreak,
    ReceptionHours, TimeWindow, WeeklySchedule,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// A row from the `hospitals` table. Hours columns stay as raw JSON so a
/// malformed value only affects its own facility.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HospitalRow {
    pub id: i64,
    pub ykiho: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub hospital_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub weekday_hours: Value,
    pub saturday_hours: Option<Value>,
    pub sunday_hours: Option<Value>,
    pub reception_hours: Value,
    pub lunch_time: Value,
    pub sunday_closed: bool,
    pub holiday_info: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Monday to Friday windows as stored in `weekday_hours`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WeekdayHours {
    pub mon: Option<TimeWindow>,
    pub tue: Option<TimeWindow>,
    pub wed: Option<TimeWindow>,
    pub thu: Option<TimeWindow>,
    pub fri: Option<TimeWindow>,
}

impl WeekdayHours {
    pub(crate) fn from_schedule(schedule: &WeeklySchedule) -> Self {
        Self {
            mon: schedule.mon.clone(),
            tue: schedule.tue.clone(),
            wed: schedule.wed.clone(),
            thu: schedule.thu.clone(),
            fri: schedule.fri.clone(),
        }
    }
}

impl HospitalRow {
    /// Converts the row into the shared facility model. Weekday and Saturday
    /// gaps are filled from reception hours, and a blank type is labelled as
    /// a general clinic.
    #[must_use]
    pub fn to_facility(&self) -> Facility {
        let weekdays: WeekdayHours = self.lenient("weekday_hours", &self.weekday_hours);
        let saturday: Option<TimeWindow> = self
            .saturday_hours
            .as_ref()
            .and_then(|v| self.lenient("saturday_hours", v));
        let sunday: Option<TimeWindow> = self
            .sunday_hours
            .as_ref()
            .and_then(|v| self.lenient("sunday_hours", v));
        let reception: ReceptionHours = self.lenient("reception_hours", &self.reception_hours);
        let lunch: LunchBreak = self.lenient("lunch_time", &self.lunch_time);
        let mut holiday: HolidayPolicy = self.lenient("holiday_info", &self.holiday_info);
        holiday.sunday_closed = self.sunday_closed;

        let schedule = WeeklySchedule {
            mon: weekdays.mon,
            tue: weekdays.tue,
            wed: weekdays.wed,
            thu: weekdays.thu,
            fri: weekdays.fri,
            sat: saturday,
            sun: sunday,
        }
        .with_reception_fallback(&reception);

        Facility {
            id: self.id,
            kind: FacilityKind::Hospital,
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            category: Some(self.display_type().to_string()),
            location: FacilityLocation::from_parts(self.latitude, self.longitude),
            hours: FacilityHours {
                schedule,
                lunch: (!lunch.is_empty()).then_some(lunch),
                holiday,
            },
        }
    }

    fn display_type(&self) -> &str {
        match self.hospital_type.trim() {
            "" => icare_core::department::GENERAL_CLINIC,
            kind => kind,
        }
    }

    fn lenient<T: DeserializeOwned + Default>(&self, column: &str, value: &Value) -> T {
        serde_json::from_value(value.clone()).unwrap_or_else(|error| {
            tracing::warn!(
                hospital_id = self.id,
                column,
                error = %error,
                "ignoring malformed hours column"
            );
            T::default()
        })
    }
}
