// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{PublicQuestion, QuestionWithOptions};

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,

    /// Owning admin. Never changes after creation.
    pub admin_id: Uuid,

    /// Time budget for one attempt.
    pub duration_minutes: i32,

    /// Passing threshold as a percentage of total points.
    pub passing_score: i32,

    /// Inactive quizzes are hidden from the public listing.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sanitized quiz fields handed to the store on create/update.
#[derive(Debug, Clone)]
pub struct QuizDraft {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub passing_score: i32,
    /// `None` keeps the stored flag on update and means active on create.
    pub is_active: Option<bool>,
}

/// DTO for creating or replacing a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required."))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(
        required(message = "Duration is required."),
        range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes.")
    )]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "Passing score must be a percentage."))]
    pub passing_score: Option<i32>,
    pub is_active: Option<bool>,
}

/// Quiz with its ordered questions, correctness flags withheld.
#[derive(Debug, Serialize)]
pub struct PublicQuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<PublicQuestion>,
}

/// Quiz with its ordered questions and the full answer key, for the owner.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithOptions>,
}

impl From<QuizDetail> for PublicQuizDetail {
    fn from(detail: QuizDetail) -> Self {
        Self {
            quiz: detail.quiz,
            questions: detail.questions.into_iter().map(PublicQuestion::from).collect(),
        }
    }
}
