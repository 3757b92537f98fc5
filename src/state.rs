use std::collections::HashMap;

use crate::api::models::Quiz;

/// Responses collected so far, keyed by question id. A question counts as
/// answered iff its id maps to a non-empty response.
pub type AnswerMap = HashMap<i64, String>;

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,
    /// The quiz list is on screen; waiting for a pick.
    Browsing,
    /// A quiz is loaded; waiting for the ready confirmation.
    AwaitingStart { quiz: Quiz },
    /// Walking through the questions one at a time.
    Answering {
        quiz: Quiz,
        current: usize,
        answers: AnswerMap,
    },
    /// Every question visited once; waiting for submit or another pass.
    Reviewing { quiz: Quiz, answers: AnswerMap },
    /// The attempt is scored; the payload is everything the result card needs.
    Finished {
        attempt_id: i64,
        score: i64,
        total: i64,
        quiz_title: String,
    },
}
