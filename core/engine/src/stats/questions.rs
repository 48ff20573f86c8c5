use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Answer, QuestionsDay, QuestionsStatic, StaticQuestion};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionsReport {
    pub questions: Vec<StaticQuestion>,
    /// Date → question id → answer
    pub days: BTreeMap<NaiveDate, BTreeMap<String, Answer>>,
}

pub fn questions_report(questions_static: &QuestionsStatic, days: &[QuestionsDay]) -> QuestionsReport {
    QuestionsReport {
        questions: questions_static.questions.clone(),
        days: days.iter().map(|day| (day.date, day.answers.clone())).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionHistory {
    pub question: Option<StaticQuestion>,
    /// Only the days the question was asked
    pub answers: BTreeMap<NaiveDate, Answer>,
}

/// Every day a single question was asked.
pub fn question_history(
    questions_static: &QuestionsStatic,
    days: &[QuestionsDay],
    question_id: &str,
) -> QuestionHistory {
    QuestionHistory {
        question: questions_static
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .cloned(),
        answers: days
            .iter()
            .filter_map(|day| day.answers.get(question_id).map(|answer| (day.date, answer.clone())))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailys_schemas::Entry;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn questions_day(d: u32, ids: &[&str]) -> QuestionsDay {
        let answers: Vec<_> = ids
            .iter()
            .map(|id| json!({"question_id": id, "asked_time": "2024-01-01T20:00:00Z",
                             "answer": "yes", "answer_time": "2024-01-01T20:01:00Z"}))
            .collect();
        let entry = Entry::on_day("questions", day(d), "telegram", json!({ "answers": answers }));
        QuestionsDay::from_entry(&entry).unwrap()
    }

    fn questions_static() -> QuestionsStatic {
        serde_json::from_value(json!({"questions": [
            {"id": "grateful", "question": "What are you grateful for?"},
            {"id": "exercise", "question": "Did you exercise?"}
        ]}))
        .unwrap()
    }

    #[test]
    fn test_report_keeps_catalogue_and_days() {
        let days = vec![questions_day(1, &["grateful"]), questions_day(2, &["grateful", "exercise"])];
        let report = questions_report(&questions_static(), &days);
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.days[&day(2)].len(), 2);
    }

    #[test]
    fn test_history_only_lists_days_with_question() {
        let days = vec![
            questions_day(1, &["grateful"]),
            questions_day(2, &["exercise"]),
            questions_day(3, &["exercise", "grateful"]),
        ];
        let history = question_history(&questions_static(), &days, "exercise");
        assert_eq!(history.question.unwrap().details["question"], "Did you exercise?");
        assert_eq!(history.answers.keys().copied().collect::<Vec<_>>(), vec![day(2), day(3)]);

        let unknown = question_history(&questions_static(), &days, "dinner");
        assert!(unknown.question.is_none());
        assert!(unknown.answers.is_empty());
    }
}
