use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::api::models::{AnswerOption, Question, Quiz};
use crate::listing::question_count_label;

pub(crate) const REFRESH_LIST: &str = "refresh";
pub(crate) const SKIP_QUESTION: &str = "skip";
pub(crate) const SUBMIT_ATTEMPT: &str = "submit";
pub(crate) const REVISIT_QUESTIONS: &str = "revisit";
pub(crate) const SHOW_ANSWERS: &str = "answers";
pub(crate) const BACK_TO_LIST: &str = "back";

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new("Yes✔️"),
        KeyboardButton::new("No❌"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn quizzes_keyboard(quizzes: &[Quiz]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = quizzes
        .iter()
        .map(|quiz| {
            vec![InlineKeyboardButton::callback(
                format!(
                    "{} ({})",
                    quiz.title,
                    question_count_label(quiz.question_count())
                ),
                quiz_callback_data(quiz),
            )]
        })
        .collect();
    keyboard.push(vec![InlineKeyboardButton::callback("Refresh 🔄", REFRESH_LIST)]);

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn refresh_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Refresh 🔄",
        REFRESH_LIST,
    )]])
}

/// One row per option, the recorded pick marked, and a skip row at the end.
pub(crate) fn options_keyboard(question: &Question, recorded: Option<&str>) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = question
        .options
        .iter()
        .map(|option| {
            let marked = recorded.is_some_and(|response| response == option.id.to_string());
            let label = if marked {
                format!("🔘 {}", option.content)
            } else {
                option.content.clone()
            };
            vec![InlineKeyboardButton::callback(
                label,
                answer_callback_data(question, option),
            )]
        })
        .collect();
    keyboard.push(vec![InlineKeyboardButton::callback("Skip ⏭️", SKIP_QUESTION)]);

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn skip_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Skip ⏭️",
        SKIP_QUESTION,
    )]])
}

pub(crate) fn review_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("Submit ✅", SUBMIT_ATTEMPT)],
        vec![InlineKeyboardButton::callback(
            "Go over questions ✏️",
            REVISIT_QUESTIONS,
        )],
    ])
}

pub(crate) fn result_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("My Answers 📊", SHOW_ANSWERS)],
        vec![InlineKeyboardButton::callback("Back to Quizzes 📋", BACK_TO_LIST)],
    ])
}

fn quiz_callback_data(quiz: &Quiz) -> String {
    format!("quiz:{}", quiz.id)
}

pub(crate) fn parse_quiz_callback(data: &str) -> Option<i64> {
    data.strip_prefix("quiz:")?.parse().ok()
}

/// Carries the question id so a tap on an older keyboard still lands on the
/// question it belongs to.
fn answer_callback_data(question: &Question, option: &AnswerOption) -> String {
    format!("ans:{}:{}", question.id, option.id)
}

pub(crate) fn parse_answer_callback(data: &str) -> Option<(i64, String)> {
    let rest = data.strip_prefix("ans:")?;
    let (question_id, option_id) = rest.split_once(':')?;
    Some((question_id.parse().ok()?, option_id.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::QuestionKind;
    use teloxide::types::InlineKeyboardButtonKind;

    fn quiz_summary(id: i64, title: &str) -> Quiz {
        Quiz {
            id,
            title: title.to_owned(),
            created_at: None,
            updated_at: None,
            questions: vec![],
        }
    }

    fn choice_question() -> Question {
        Question {
            id: 71,
            quiz_id: 7,
            context: "Paris is the capital of France.".to_owned(),
            qtype: QuestionKind::TrueFalse,
            created_at: None,
            updated_at: None,
            options: vec![
                AnswerOption {
                    id: 711,
                    question_id: 71,
                    content: "True".to_owned(),
                    correct: false,
                    created_at: None,
                    updated_at: None,
                },
                AnswerOption {
                    id: 712,
                    question_id: 71,
                    content: "False".to_owned(),
                    correct: false,
                    created_at: None,
                    updated_at: None,
                },
            ],
        }
    }

    fn button_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("expected callback data, got {other:?}"),
        }
    }

    #[test]
    fn list_keyboard_has_one_row_per_quiz_plus_refresh() {
        let quizzes = vec![quiz_summary(1, "Capitals"), quiz_summary(2, "Rivers")];
        let markup = quizzes_keyboard(&quizzes);

        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(button_data(&markup.inline_keyboard[0][0]), "quiz:1");
        assert_eq!(button_data(&markup.inline_keyboard[1][0]), "quiz:2");
        assert_eq!(button_data(&markup.inline_keyboard[2][0]), REFRESH_LIST);
    }

    #[test]
    fn option_rows_mark_the_recorded_choice() {
        let question = choice_question();

        let fresh = options_keyboard(&question, None);
        assert_eq!(fresh.inline_keyboard.len(), 3);
        assert_eq!(fresh.inline_keyboard[0][0].text, "True");
        assert_eq!(fresh.inline_keyboard[1][0].text, "False");

        let marked = options_keyboard(&question, Some("712"));
        assert_eq!(marked.inline_keyboard[0][0].text, "True");
        assert_eq!(marked.inline_keyboard[1][0].text, "🔘 False");
        assert_eq!(button_data(&marked.inline_keyboard[2][0]), SKIP_QUESTION);
    }

    #[test]
    fn quiz_callback_data_round_trips() {
        let quiz = quiz_summary(42, "Capitals");
        assert_eq!(parse_quiz_callback(&quiz_callback_data(&quiz)), Some(42));
        assert_eq!(parse_quiz_callback("quiz:oops"), None);
        assert_eq!(parse_quiz_callback(REFRESH_LIST), None);
    }

    #[test]
    fn answer_callback_data_round_trips() {
        let question = choice_question();
        let data = answer_callback_data(&question, &question.options[1]);

        assert_eq!(parse_answer_callback(&data), Some((71, "712".to_owned())));
        assert_eq!(parse_answer_callback(SKIP_QUESTION), None);
        assert_eq!(parse_answer_callback("ans:seventy"), None);
    }
}
