use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use super::models::{
    AnswerPayload, Attempt, CreateQuestionPayload, CreateQuizPayload, ErrorBody, NewOption,
    Question, QuestionParams, Quiz, QuizParams, SubmitOutcome, SubmitPayload,
};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

const USER_ID_HEADER: &str = "X-User-Id";
const USER_ROLE_HEADER: &str = "X-User-Role";

/// Who the backend should attribute reads and submissions to.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
        }
    }

    /// Reads `QUIZ_USER_ID`/`QUIZ_USER_ROLE`, falling back to the demo user.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("QUIZ_USER_ID").unwrap_or_else(|_| "1".into()),
            std::env::var("QUIZ_USER_ROLE").unwrap_or_else(|_| "user".into()),
        )
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

pub(crate) trait ListQuizzes {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, ApiError>;
}

pub(crate) trait FetchQuiz {
    async fn fetch_quiz(&self, quiz_id: i64) -> Result<Quiz, ApiError>;
}

pub(crate) trait SubmitAttempt {
    async fn submit_attempt(
        &self,
        quiz_id: i64,
        answers: Vec<AnswerPayload>,
        identity: &Identity,
    ) -> Result<SubmitOutcome, ApiError>;
}

pub(crate) trait FetchAttempt {
    async fn fetch_attempt(&self, attempt_id: i64, identity: &Identity)
        -> Result<Attempt, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// Authoring half of the backend contract, not wired to any bot flow.
    pub async fn create_quiz(&self, title: String, identity: &Identity) -> Result<Quiz, ApiError> {
        log::debug!("Creating quiz '{title}'");
        let payload = CreateQuizPayload {
            quiz: QuizParams { title },
        };
        let response = self
            .http
            .post(self.endpoint("quizzes"))
            .header(USER_ID_HEADER, identity.user_id.as_str())
            .header(USER_ROLE_HEADER, identity.role.as_str())
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_with_body(response, "Failed to create quiz").await);
        }
        Ok(response.json().await?)
    }

    pub async fn create_question(
        &self,
        quiz_id: i64,
        params: QuestionParams,
        options: Vec<NewOption>,
        identity: &Identity,
    ) -> Result<Question, ApiError> {
        log::debug!("Creating a question for quiz {quiz_id}");
        let payload = CreateQuestionPayload {
            question: params,
            options,
        };
        let response = self
            .http
            .post(self.endpoint(&format!("quizzes/{quiz_id}/questions")))
            .header(USER_ID_HEADER, identity.user_id.as_str())
            .header(USER_ROLE_HEADER, identity.role.as_str())
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_with_body(response, "Failed to create question").await);
        }
        Ok(response.json().await?)
    }
}

fn rejection(status: StatusCode, fallback: &str) -> ApiError {
    ApiError::Rejected {
        status,
        message: fallback.to_owned(),
    }
}

/// Prefers the backend's own `errors` array, joined into one line.
fn error_message(body: ErrorBody, fallback: &str) -> String {
    let joined = body.errors.join(", ");
    if joined.is_empty() {
        fallback.to_owned()
    } else {
        joined
    }
}

async fn rejection_with_body(response: reqwest::Response, fallback: &str) -> ApiError {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    ApiError::Rejected {
        status,
        message: error_message(body, fallback),
    }
}

impl ListQuizzes for ApiClient {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, ApiError> {
        log::debug!("Fetching the quiz list");
        let response = self.http.get(self.endpoint("quizzes")).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response.status(), "Failed to fetch quizzes"));
        }
        Ok(response.json().await?)
    }
}

impl FetchQuiz for ApiClient {
    async fn fetch_quiz(&self, quiz_id: i64) -> Result<Quiz, ApiError> {
        log::debug!("Fetching quiz {quiz_id}");
        let response = self
            .http
            .get(self.endpoint(&format!("quizzes/{quiz_id}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response.status(), "Failed to fetch quiz"));
        }
        Ok(response.json().await?)
    }
}

impl SubmitAttempt for ApiClient {
    async fn submit_attempt(
        &self,
        quiz_id: i64,
        answers: Vec<AnswerPayload>,
        identity: &Identity,
    ) -> Result<SubmitOutcome, ApiError> {
        log::debug!("Submitting an attempt for quiz {quiz_id}");
        let payload = SubmitPayload { quiz_id, answers };
        let response = self
            .http
            .post(self.endpoint("attempts"))
            .header(USER_ID_HEADER, identity.user_id.as_str())
            .header(USER_ROLE_HEADER, identity.role.as_str())
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_with_body(response, "Failed to submit quiz").await);
        }
        Ok(response.json().await?)
    }
}

impl FetchAttempt for ApiClient {
    async fn fetch_attempt(
        &self,
        attempt_id: i64,
        identity: &Identity,
    ) -> Result<Attempt, ApiError> {
        log::debug!("Fetching attempt {attempt_id}");
        let response = self
            .http
            .get(self.endpoint(&format!("attempts/{attempt_id}")))
            .header(USER_ID_HEADER, identity.user_id.as_str())
            .header(USER_ROLE_HEADER, identity.role.as_str())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response.status(), "Failed to fetch attempt"));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_cleanly_with_and_without_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/api/v1/".parse().unwrap());
        assert_eq!(client.endpoint("quizzes"), "http://localhost:3000/api/v1/quizzes");

        let client = ApiClient::new("http://localhost:3000/api/v1".parse().unwrap());
        assert_eq!(
            client.endpoint("quizzes/7"),
            "http://localhost:3000/api/v1/quizzes/7"
        );
    }

    #[test]
    fn rejection_messages_join_backend_errors() {
        let body = ErrorBody {
            errors: vec!["Title can't be blank".into(), "Quiz not found".into()],
        };
        assert_eq!(
            error_message(body, "Failed to submit quiz"),
            "Title can't be blank, Quiz not found"
        );
    }

    #[test]
    fn rejection_messages_fall_back_when_the_body_is_unusable() {
        assert_eq!(
            error_message(ErrorBody::default(), "Failed to submit quiz"),
            "Failed to submit quiz"
        );

        let blank = ErrorBody {
            errors: vec![String::new()],
        };
        assert_eq!(error_message(blank, "Failed to submit quiz"), "Failed to submit quiz");
    }

    #[test]
    fn rejected_errors_display_their_message_alone() {
        let error = rejection(StatusCode::NOT_FOUND, "Failed to fetch quiz");
        assert_eq!(error.to_string(), "Failed to fetch quiz");
    }
}
