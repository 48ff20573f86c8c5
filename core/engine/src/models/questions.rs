use chrono::{DateTime, FixedOffset, NaiveDate};
use dailys_schemas::{DailysError, DailysResult, Entry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{parse_timestamp, payload, StatModel};

/// A question from the static catalogue. Fields other than the id are
/// kept as-is for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticQuestion {
    pub id: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionsStatic {
    #[serde(default)]
    pub questions: Vec<StaticQuestion>,
}

#[derive(Debug, Deserialize)]
struct ResponsePayload {
    answer: String,
    answer_time: String,
}

#[derive(Debug, Deserialize)]
struct AnswerPayload {
    question_id: String,
    asked_time: String,
    #[serde(default)]
    edit_history: Vec<ResponsePayload>,
    answer: Option<String>,
    answer_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    answers: Vec<AnswerPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub answer: String,
    pub answer_time: DateTime<FixedOffset>,
}

impl Response {
    fn from_parts(answer: String, answer_time: &str) -> DailysResult<Self> {
        Ok(Self {
            answer,
            answer_time: parse_timestamp(answer_time)?,
        })
    }
}

/// A question asked on a day, with every revision of its answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question_id: String,
    pub asked_time: DateTime<FixedOffset>,
    /// Edit history first, then the current answer
    pub responses: Vec<Response>,
}

impl Answer {
    fn from_payload(raw: AnswerPayload) -> DailysResult<Self> {
        let mut responses = raw
            .edit_history
            .into_iter()
            .map(|edit| Response::from_parts(edit.answer, &edit.answer_time))
            .collect::<DailysResult<Vec<_>>>()?;
        if let Some(answer) = raw.answer {
            let answer_time = raw.answer_time.as_deref().ok_or_else(|| {
                DailysError::MissingField(format!("answer to {} has no answer_time", raw.question_id))
            })?;
            responses.push(Response::from_parts(answer, answer_time)?);
        }
        Ok(Self {
            question_id: raw.question_id,
            asked_time: parse_timestamp(&raw.asked_time)?,
            responses,
        })
    }

    pub fn is_answered(&self) -> bool {
        !self.responses.is_empty()
    }

    pub fn latest_response(&self) -> Option<&Response> {
        self.responses.last()
    }
}

/// One day's questions and answers, keyed by question id.
#[derive(Debug, Clone)]
pub struct QuestionsDay {
    pub date: NaiveDate,
    pub source: String,
    pub answers: BTreeMap<String, Answer>,
}

impl QuestionsDay {
    pub fn from_entry(entry: &Entry) -> DailysResult<Self> {
        let raw: QuestionsPayload = payload(entry)?;
        let answers = raw
            .answers
            .into_iter()
            .map(|answer| Answer::from_payload(answer).map(|answer| (answer.question_id.clone(), answer)))
            .collect::<DailysResult<BTreeMap<_, _>>>()?;
        Ok(Self {
            date: entry.require_day()?,
            source: entry.source.clone(),
            answers,
        })
    }
}

impl StatModel for QuestionsDay {
    fn stat_name(&self) -> &'static str {
        "questions"
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn value_count(&self) -> usize {
        self.answers.values().filter(|answer| answer.is_answered()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn questions_day() -> QuestionsDay {
        let entry = Entry::on_day(
            "questions",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "telegram",
            json!({"answers": [
                {
                    "question_id": "grateful",
                    "asked_time": "2024-01-01T20:00:00Z",
                    "edit_history": [{"answer": "tea", "answer_time": "2024-01-01T20:05:00Z"}],
                    "answer": "tea and cake",
                    "answer_time": "2024-01-01T20:06:00Z"
                },
                {"question_id": "dinner", "asked_time": "2024-01-01T20:00:00Z"}
            ]}),
        );
        QuestionsDay::from_entry(&entry).unwrap()
    }

    #[test]
    fn test_responses_follow_edit_history() {
        let day = questions_day();
        let grateful = &day.answers["grateful"];
        assert_eq!(grateful.responses.len(), 2);
        assert_eq!(grateful.responses[0].answer, "tea");
        assert_eq!(grateful.latest_response().unwrap().answer, "tea and cake");
        assert!(grateful.is_answered());
    }

    #[test]
    fn test_unanswered_questions_do_not_count() {
        let day = questions_day();
        assert!(!day.answers["dinner"].is_answered());
        assert_eq!(day.value_count(), 1);
    }

    #[test]
    fn test_static_question_keeps_details() {
        let question: StaticQuestion =
            serde_json::from_value(json!({"id": "grateful", "question": "What are you grateful for?"})).unwrap();
        assert_eq!(question.id, "grateful");
        assert_eq!(question.details["question"], "What are you grateful for?");
    }
}
