// src/repositories/mod.rs

//! Storage seams. Every entity lives behind one of these traits; `PgStore`
//! backs them with PostgreSQL and `MemoryStore` keeps everything in process.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        attempt::{Answer, NewAnswer, QuizAttempt},
        question::{OptionDraft, Question, QuestionDraft, QuestionOption},
        quiz::{Quiz, QuizDraft},
        user::{NewUser, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_students(&self) -> Result<Vec<User>, AppError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create_quiz(&self, admin_id: Uuid, draft: QuizDraft) -> Result<Quiz, AppError>;
    async fn find_quiz(&self, id: Uuid) -> Result<Option<Quiz>, AppError>;
    /// Active quizzes, newest first.
    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, AppError>;
    /// Quizzes owned by the admin, newest first.
    async fn list_quizzes_by_admin(&self, admin_id: Uuid) -> Result<Vec<Quiz>, AppError>;
    async fn update_quiz(&self, id: Uuid, draft: QuizDraft) -> Result<Option<Quiz>, AppError>;
    /// Cascades to questions, options, attempts and answers.
    async fn delete_quiz(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_question(
        &self,
        quiz_id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Question, AppError>;
    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError>;
    /// Ascending display order, ties broken by creation order.
    async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>, AppError>;
    async fn update_question(
        &self,
        id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, AppError>;
    /// Cascades to options and answers.
    async fn delete_question(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_option(
        &self,
        question_id: Uuid,
        draft: OptionDraft,
    ) -> Result<QuestionOption, AppError>;
    async fn find_option(&self, id: Uuid) -> Result<Option<QuestionOption>, AppError>;
    /// Ascending display order, ties broken by creation order.
    async fn list_options(&self, question_id: Uuid) -> Result<Vec<QuestionOption>, AppError>;
    async fn delete_option(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn create_attempt(&self, quiz_id: Uuid, student_id: Uuid)
    -> Result<QuizAttempt, AppError>;
    async fn find_attempt(&self, id: Uuid) -> Result<Option<QuizAttempt>, AppError>;
    /// Newest first.
    async fn list_attempts_by_student(&self, student_id: Uuid)
    -> Result<Vec<QuizAttempt>, AppError>;
    /// Newest first.
    async fn list_attempts_by_quiz(&self, quiz_id: Uuid) -> Result<Vec<QuizAttempt>, AppError>;
    async fn list_answers(&self, attempt_id: Uuid) -> Result<Vec<Answer>, AppError>;

    /// Inserts or replaces the answer for (attempt, question), resetting its
    /// grading fields. Fails with `Conflict` unless the attempt is still
    /// in progress at write time, and with `NotFound` when the question or
    /// the selected option disappeared since it was validated.
    async fn upsert_answer(&self, answer: NewAnswer) -> Result<Answer, AppError>;

    /// Atomically moves an in-progress attempt to submitted, runs the grading
    /// pass, writes the results back and marks it graded. Fails with
    /// `NotFound` for an unknown attempt and `Conflict` for one that is no
    /// longer in progress; in both cases nothing is written.
    async fn submit_and_grade(&self, attempt_id: Uuid) -> Result<QuizAttempt, AppError>;
}
