use serde::{Deserialize, Serialize};
use time::Date;

/// Result of a finished session, as exchanged with the score service and stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Display name of the participant.
    #[serde(default)]
    pub name: String,
    /// Number of rounds completed before the mistake.
    pub score: u32,
    /// Calendar date of the session, `M/D/YYYY`.
    #[serde(default)]
    pub date: String,
}

impl ScoreRecord {
    /// Build a record stamped with `date`.
    pub fn new(name: impl Into<String>, score: u32, date: Date) -> Self {
        Self {
            name: name.into(),
            score,
            date: date_stamp(date),
        }
    }
}

/// Format `date` as an unpadded US-style calendar date (`10/14/2026`).
pub fn date_stamp(date: Date) -> String {
    format!("{}/{}/{}", u8::from(date.month()), date.day(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn date_stamp_is_unpadded() {
        let date = Date::from_calendar_date(2026, Month::March, 7).unwrap();
        assert_eq!(date_stamp(date), "3/7/2026");
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let date = Date::from_calendar_date(2026, Month::October, 14).unwrap();
        let record = ScoreRecord::new("Ada", 4, date);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "Ada", "score": 4, "date": "10/14/2026" })
        );
    }

    #[test]
    fn record_ignores_extra_fields_from_the_store() {
        let record: ScoreRecord = serde_json::from_str(
            r#"{"_id":"65f0","name":"Grace","score":12,"date":"1/2/2026"}"#,
        )
        .unwrap();
        assert_eq!(record.score, 12);
        assert_eq!(record.name, "Grace");
    }
}
