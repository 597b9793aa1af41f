// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Attempt state machine: `in_progress -> submitted -> graded`.
/// Stored as the `attempt_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attempt_status", rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Graded,
}

impl AttemptStatus {
    /// Only an open attempt accepts answers or a submit.
    pub fn is_open(self) -> bool {
        self == AttemptStatus::InProgress
    }
}

/// Represents the 'quiz_attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub student_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,

    /// Points earned. Set when graded.
    pub score: Option<i32>,

    /// Points available across the whole quiz. Set when graded.
    pub total_points: Option<i32>,

    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// Whether a graded attempt meets the quiz's passing percentage.
    /// A quiz worth zero points is passed at any threshold.
    pub fn passed(&self, passing_score: i32) -> Option<bool> {
        if self.status != AttemptStatus::Graded {
            return None;
        }
        let score = i64::from(self.score?);
        let total = i64::from(self.total_points?);
        Some(score * 100 >= i64::from(passing_score) * total)
    }
}

/// Represents the 'answers' table in the database.
/// Unique per (attempt_id, question_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub selected_option_id: Option<Uuid>,

    /// Unset until graded, and left unset for short answers.
    pub is_correct: Option<bool>,
    pub points_earned: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated answer handed to the store for upsert.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub selected_option_id: Option<Uuid>,
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(required(message = "Quiz ID is required."))]
    pub quiz_id: Option<Uuid>,
}

/// DTO for recording one answer within an open attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    #[validate(required(message = "Attempt ID is required."))]
    pub attempt_id: Option<Uuid>,
    #[validate(required(message = "Question ID is required."))]
    pub question_id: Option<Uuid>,
    #[validate(length(max = 10000))]
    pub answer_text: Option<String>,
    pub selected_option_id: Option<Uuid>,
}

/// DTO for finalizing an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(required(message = "Attempt ID is required."))]
    pub attempt_id: Option<Uuid>,
}

/// Attempt with its answers, as returned by get-attempt.
#[derive(Debug, Serialize)]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub passed: Option<bool>,
    pub answers: Vec<Answer>,
}
