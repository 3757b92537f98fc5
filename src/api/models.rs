use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Empty in list summaries; populated when a quiz is fetched by id.
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub context: String,
    pub qtype: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    TrueFalse,
    Mcq,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    /// The backend hides this flag while a quiz is being taken.
    #[serde(default)]
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    // The deployed backend serialises this field as "sore".
    #[serde(default, alias = "sore")]
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
}

/// One answered question in a submission, `response` being free text for
/// `text` questions and the stringified option id for choice questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub question_id: i64,
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitPayload {
    pub quiz_id: i64,
    pub answers: Vec<AnswerPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOutcome {
    pub attempt: Attempt,
    pub score: i64,
    pub total_questions: i64,
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizParams {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuizPayload {
    pub quiz: QuizParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionParams {
    pub context: String,
    pub qtype: QuestionKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOption {
    pub content: String,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuestionPayload {
    pub question: QuestionParams,
    pub options: Vec<NewOption>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question_by_id(&self, id: i64) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }
}

impl Question {
    pub fn option_by_id(&self, id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id.to_string() == id)
    }
}

impl QuestionKind {
    pub fn is_choice(self) -> bool {
        matches!(self, Self::TrueFalse | Self::Mcq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quiz_tree_deserializes_from_the_wire_shape() {
        let quiz: Quiz = serde_json::from_value(json!({
            "id": 7,
            "title": "Capitals of Europe",
            "created_at": "2024-05-02T10:00:00.000Z",
            "updated_at": "2024-05-02T10:00:00.000Z",
            "questions": [
                {
                    "id": 71,
                    "quiz_id": 7,
                    "context": "Paris is the capital of France.",
                    "qtype": "true_false",
                    "options": [
                        {"id": 711, "question_id": 71, "content": "True"},
                        {"id": 712, "question_id": 71, "content": "False"}
                    ]
                },
                {
                    "id": 72,
                    "quiz_id": 7,
                    "context": "Name any Baltic capital.",
                    "qtype": "text"
                }
            ]
        }))
        .expect("quiz should deserialize");

        assert_eq!(quiz.question_count(), 2);
        assert_eq!(quiz.questions[0].qtype, QuestionKind::TrueFalse);
        assert_eq!(quiz.questions[0].options.len(), 2);
        assert!(quiz.questions[1].options.is_empty());
        assert!(quiz.created_at.is_some());
    }

    #[test]
    fn list_summaries_tolerate_missing_questions_and_timestamps() {
        let quizzes: Vec<Quiz> =
            serde_json::from_value(json!([{"id": 1, "title": "Solo"}])).expect("summary list");

        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].question_count(), 0);
        assert!(quizzes[0].created_at.is_none());
    }

    #[test]
    fn hidden_correct_flag_defaults_to_false() {
        let option: AnswerOption = serde_json::from_value(json!({
            "id": 711, "question_id": 71, "content": "True"
        }))
        .expect("option without a correct flag");

        assert!(!option.correct);
    }

    #[test]
    fn question_kind_uses_snake_case_wire_names() {
        assert_eq!(
            serde_json::to_value(QuestionKind::TrueFalse).unwrap(),
            json!("true_false")
        );
        assert_eq!(serde_json::to_value(QuestionKind::Mcq).unwrap(), json!("mcq"));
        assert_eq!(serde_json::to_value(QuestionKind::Text).unwrap(), json!("text"));
    }

    #[test]
    fn attempt_accepts_both_score_spellings() {
        let legacy: Attempt =
            serde_json::from_value(json!({"id": 1, "quiz_id": 7, "sore": 3})).expect("legacy field");
        assert_eq!(legacy.score, 3);

        let current: Attempt =
            serde_json::from_value(json!({"id": 1, "quiz_id": 7, "score": 4})).expect("plain field");
        assert_eq!(current.score, 4);
    }

    #[test]
    fn submit_payload_matches_the_attempts_contract() {
        let payload = SubmitPayload {
            quiz_id: 7,
            answers: vec![AnswerPayload {
                question_id: 71,
                response: "711".into(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "quiz_id": 7,
                "answers": [{"question_id": 71, "response": "711"}]
            })
        );
    }

    #[test]
    fn create_payloads_nest_params_the_way_the_backend_expects() {
        let quiz = CreateQuizPayload {
            quiz: QuizParams {
                title: "Capitals".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&quiz).unwrap(),
            json!({"quiz": {"title": "Capitals"}})
        );

        let question = CreateQuestionPayload {
            question: QuestionParams {
                context: "Paris is the capital of France.".into(),
                qtype: QuestionKind::TrueFalse,
            },
            options: vec![
                NewOption {
                    content: "True".into(),
                    correct: true,
                },
                NewOption {
                    content: "False".into(),
                    correct: false,
                },
            ],
        };
        assert_eq!(
            serde_json::to_value(&question).unwrap(),
            json!({
                "question": {"context": "Paris is the capital of France.", "qtype": "true_false"},
                "options": [
                    {"content": "True", "correct": true},
                    {"content": "False", "correct": false}
                ]
            })
        );
    }

    #[test]
    fn submit_outcome_carries_the_scored_quiz_when_present() {
        let outcome: SubmitOutcome = serde_json::from_value(json!({
            "attempt": {"id": 900, "quiz_id": 7, "sore": 2},
            "score": 2,
            "total_questions": 3,
            "quiz": {"id": 7, "title": "Capitals of Europe"}
        }))
        .expect("submit outcome");

        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.total_questions, 3);
        assert_eq!(outcome.quiz.as_ref().map(|quiz| quiz.id), Some(7));
        assert_eq!(outcome.attempt.score, 2);
    }

    #[test]
    fn error_body_defaults_to_no_messages() {
        let body: ErrorBody = serde_json::from_value(json!({})).expect("empty body");
        assert!(body.errors.is_empty());
    }
}
