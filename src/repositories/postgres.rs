// src/repositories/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        attempt::{Answer, AttemptStatus, NewAnswer, QuizAttempt},
        question::{OptionDraft, Question, QuestionDraft, QuestionOption},
        quiz::{Quiz, QuizDraft},
        user::{NewUser, Role, User},
    },
    repositories::{AttemptRepository, QuizRepository, UserRepository},
    services::grading,
};

const USER_COLUMNS: &str = "id, name, email, password, role, created_at, updated_at";

const QUIZ_COLUMNS: &str = "\
    id, title, description, admin_id, duration_minutes, passing_score, is_active, \
    created_at, updated_at";

const QUESTION_COLUMNS: &str =
    "id, quiz_id, question_text, question_type, points, order_num, created_at, updated_at";

const OPTION_COLUMNS: &str = "id, question_id, option_text, is_correct, order_num, created_at";

const ATTEMPT_COLUMNS: &str = "\
    id, quiz_id, student_id, started_at, submitted_at, score, total_points, status, \
    created_at, updated_at";

const ANSWER_COLUMNS: &str = "\
    id, attempt_id, question_id, answer_text, selected_option_id, is_correct, points_earned, \
    created_at, updated_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the attempt row for the rest of the transaction and returns it.
    async fn lock_attempt(
        tx: &mut Transaction<'_, Postgres>,
        attempt_id: Uuid,
    ) -> Result<QuizAttempt, AppError> {
        sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 FOR UPDATE"
        ))
        .bind(attempt_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unique = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if unique {
                AppError::Conflict(format!("Email '{}' already exists", user.email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_students(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at"
        ))
        .bind(Role::Student)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[async_trait]
impl QuizRepository for PgStore {
    async fn create_quiz(&self, admin_id: Uuid, draft: QuizDraft) -> Result<Quiz, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "INSERT INTO quizzes
             (id, title, description, admin_id, duration_minutes, passing_score, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(draft.title)
        .bind(draft.description)
        .bind(admin_id)
        .bind(draft.duration_minutes)
        .bind(draft.passing_score)
        .bind(draft.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn find_quiz(&self, id: Uuid) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE is_active = TRUE ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(quizzes)
    }

    async fn list_quizzes_by_admin(&self, admin_id: Uuid) -> Result<Vec<Quiz>, AppError> {
        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE admin_id = $1 ORDER BY created_at DESC"
        ))
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quizzes)
    }

    async fn update_quiz(&self, id: Uuid, draft: QuizDraft) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "UPDATE quizzes
             SET title = $1,
                 description = $2,
                 duration_minutes = $3,
                 passing_score = $4,
                 is_active = COALESCE($5, is_active),
                 updated_at = NOW()
             WHERE id = $6
             RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(draft.title)
        .bind(draft.description)
        .bind(draft.duration_minutes)
        .bind(draft.passing_score)
        .bind(draft.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn delete_quiz(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_question(
        &self,
        quiz_id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Question, AppError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (id, quiz_id, question_text, question_type, points, order_num)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(quiz_id)
        .bind(draft.question_text)
        .bind(draft.question_type)
        .bind(draft.points)
        .bind(draft.order_num)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions
             WHERE quiz_id = $1
             ORDER BY order_num, created_at"
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn update_question(
        &self,
        id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "UPDATE questions
             SET question_text = $1,
                 question_type = $2,
                 points = $3,
                 order_num = $4,
                 updated_at = NOW()
             WHERE id = $5
             RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(draft.question_text)
        .bind(draft.question_type)
        .bind(draft.points)
        .bind(draft.order_num)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_option(
        &self,
        question_id: Uuid,
        draft: OptionDraft,
    ) -> Result<QuestionOption, AppError> {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "INSERT INTO options (id, question_id, option_text, is_correct, order_num)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {OPTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(draft.option_text)
        .bind(draft.is_correct)
        .bind(draft.order_num)
        .fetch_one(&self.pool)
        .await?;
        Ok(option)
    }

    async fn find_option(&self, id: Uuid) -> Result<Option<QuestionOption>, AppError> {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn list_options(&self, question_id: Uuid) -> Result<Vec<QuestionOption>, AppError> {
        let options = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options
             WHERE question_id = $1
             ORDER BY order_num, created_at"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn delete_option(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM options WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttemptRepository for PgStore {
    async fn create_attempt(
        &self,
        quiz_id: Uuid,
        student_id: Uuid,
    ) -> Result<QuizAttempt, AppError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            "INSERT INTO quiz_attempts (id, quiz_id, student_id, started_at, status)
             VALUES ($1, $2, $3, NOW(), $4)
             RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(quiz_id)
        .bind(student_id)
        .bind(AttemptStatus::InProgress)
        .fetch_one(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<QuizAttempt>, AppError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn list_attempts_by_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<QuizAttempt>, AppError> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts
             WHERE student_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn list_attempts_by_quiz(&self, quiz_id: Uuid) -> Result<Vec<QuizAttempt>, AppError> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts
             WHERE quiz_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn list_answers(&self, attempt_id: Uuid) -> Result<Vec<Answer>, AppError> {
        let answers = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE attempt_id = $1 ORDER BY created_at"
        ))
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<Answer, AppError> {
        let mut tx = self.pool.begin().await?;

        let attempt = Self::lock_attempt(&mut tx, answer.attempt_id).await?;
        if !attempt.status.is_open() {
            return Err(AppError::Conflict("Attempt is no longer in progress".to_string()));
        }

        // Holds the option until commit so a concurrent delete waits for us.
        if let Some(option_id) = answer.selected_option_id {
            sqlx::query("SELECT id FROM options WHERE id = $1 AND question_id = $2 FOR SHARE")
                .bind(option_id)
                .bind(answer.question_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Option not found".to_string()))?;
        }

        let row = sqlx::query_as::<_, Answer>(&format!(
            "INSERT INTO answers (id, attempt_id, question_id, answer_text, selected_option_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (attempt_id, question_id) DO UPDATE SET
                answer_text = EXCLUDED.answer_text,
                selected_option_id = EXCLUDED.selected_option_id,
                is_correct = NULL,
                points_earned = 0,
                updated_at = NOW()
             RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(answer.attempt_id)
        .bind(answer.question_id)
        .bind(answer.answer_text)
        .bind(answer.selected_option_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            let missing_parent = e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation());
            if missing_parent {
                AppError::NotFound("Question not found".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(row)
    }

    async fn submit_and_grade(&self, attempt_id: Uuid) -> Result<QuizAttempt, AppError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent submits queue here; the loser sees a graded row.
        let attempt = Self::lock_attempt(&mut tx, attempt_id).await?;
        if !attempt.status.is_open() {
            return Err(AppError::Conflict("Attempt has already been submitted".to_string()));
        }

        sqlx::query(
            "UPDATE quiz_attempts
             SET status = $1, submitted_at = NOW(), updated_at = NOW()
             WHERE id = $2",
        )
        .bind(AttemptStatus::Submitted)
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;

        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions
             WHERE quiz_id = $1
             ORDER BY order_num, created_at"
        ))
        .bind(attempt.quiz_id)
        .fetch_all(&mut *tx)
        .await?;

        let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM options
             WHERE question_id = ANY($1)
             ORDER BY order_num, created_at"
        ))
        .bind(&question_ids)
        .fetch_all(&mut *tx)
        .await?;

        let answers = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE attempt_id = $1 ORDER BY created_at"
        ))
        .bind(attempt_id)
        .fetch_all(&mut *tx)
        .await?;

        let report = grading::grade(&grading::assemble(questions, options), &answers);

        for graded in &report.graded {
            sqlx::query(
                "UPDATE answers
                 SET is_correct = $1, points_earned = $2, updated_at = NOW()
                 WHERE id = $3",
            )
            .bind(graded.is_correct)
            .bind(graded.points_earned)
            .bind(graded.answer_id)
            .execute(&mut *tx)
            .await?;
        }

        let graded = sqlx::query_as::<_, QuizAttempt>(&format!(
            "UPDATE quiz_attempts
             SET score = $1, total_points = $2, status = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(report.score)
        .bind(report.total_points)
        .bind(AttemptStatus::Graded)
        .bind(attempt_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(graded)
    }
}
