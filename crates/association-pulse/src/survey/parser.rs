use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct SurveyRecord {
    pub(crate) question_code: String,
    pub(crate) answer: Option<String>,
    pub(crate) submitted_at: Option<DateTime<Utc>>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<SurveyRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<SurveyRow>() {
        let row = record?;
        if row.question_code.is_empty() {
            continue;
        }
        let submitted_at = row.submitted_at.as_deref().and_then(parse_timestamp);

        records.push(SurveyRecord {
            question_code: row.question_code,
            answer: row.answer,
            submitted_at,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct SurveyRow {
    #[serde(rename = "Question Code")]
    question_code: String,
    #[serde(rename = "Answer", default, deserialize_with = "empty_string_as_none")]
    answer: Option<String>,
    #[serde(
        rename = "Submitted At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    submitted_at: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
