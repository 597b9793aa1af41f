// src/repositories/memory.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
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

/// Rows kept in insertion order, which doubles as creation order.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    quizzes: Vec<Quiz>,
    questions: Vec<Question>,
    options: Vec<QuestionOption>,
    attempts: Vec<QuizAttempt>,
    answers: Vec<Answer>,
}

impl Tables {
    fn questions_of(&self, quiz_id: Uuid) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        // Stable sort keeps creation order among equal display positions.
        questions.sort_by_key(|q| q.order_num);
        questions
    }

    fn options_of(&self, question_id: Uuid) -> Vec<QuestionOption> {
        let mut options: Vec<QuestionOption> = self
            .options
            .iter()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.order_num);
        options
    }

    fn remove_questions(&mut self, ids: &[Uuid]) {
        self.questions.retain(|q| !ids.contains(&q.id));
        self.options.retain(|o| !ids.contains(&o.question_id));
        self.answers.retain(|a| !ids.contains(&a.question_id));
    }
}

/// In-process store used by tests and by local runs without `DATABASE_URL`.
///
/// A single lock guards every table, so each trait method is one atomic unit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_students(&self) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.role == Role::Student)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn create_quiz(&self, admin_id: Uuid, draft: QuizDraft) -> Result<Quiz, AppError> {
        let now = Utc::now();
        let quiz = Quiz {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            admin_id,
            duration_minutes: draft.duration_minutes,
            passing_score: draft.passing_score,
            is_active: draft.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn find_quiz(&self, id: Uuid) -> Result<Option<Quiz>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .quizzes
            .iter()
            .rev()
            .filter(|q| q.is_active)
            .cloned()
            .collect())
    }

    async fn list_quizzes_by_admin(&self, admin_id: Uuid) -> Result<Vec<Quiz>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .quizzes
            .iter()
            .rev()
            .filter(|q| q.admin_id == admin_id)
            .cloned()
            .collect())
    }

    async fn update_quiz(&self, id: Uuid, draft: QuizDraft) -> Result<Option<Quiz>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(quiz) = tables.quizzes.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };

        quiz.title = draft.title;
        quiz.description = draft.description;
        quiz.duration_minutes = draft.duration_minutes;
        quiz.passing_score = draft.passing_score;
        if let Some(is_active) = draft.is_active {
            quiz.is_active = is_active;
        }
        quiz.updated_at = Utc::now();
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.quizzes.len();
        tables.quizzes.retain(|q| q.id != id);
        if tables.quizzes.len() == before {
            return Ok(false);
        }

        let question_ids: Vec<Uuid> = tables
            .questions
            .iter()
            .filter(|q| q.quiz_id == id)
            .map(|q| q.id)
            .collect();
        tables.remove_questions(&question_ids);

        let attempt_ids: Vec<Uuid> = tables
            .attempts
            .iter()
            .filter(|a| a.quiz_id == id)
            .map(|a| a.id)
            .collect();
        tables.attempts.retain(|a| a.quiz_id != id);
        tables.answers.retain(|a| !attempt_ids.contains(&a.attempt_id));
        Ok(true)
    }

    async fn create_question(
        &self,
        quiz_id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Question, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.iter().any(|q| q.id == quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }

        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            quiz_id,
            question_text: draft.question_text,
            question_type: draft.question_type,
            points: draft.points,
            order_num: draft.order_num,
            created_at: now,
            updated_at: now,
        };
        tables.questions.push(question.clone());
        Ok(question)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>, AppError> {
        Ok(self.tables.read().await.questions_of(quiz_id))
    }

    async fn update_question(
        &self,
        id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(question) = tables.questions.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };

        question.question_text = draft.question_text;
        question.question_type = draft.question_type;
        question.points = draft.points;
        question.order_num = draft.order_num;
        question.updated_at = Utc::now();
        Ok(Some(question.clone()))
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.questions.iter().any(|q| q.id == id) {
            return Ok(false);
        }
        tables.remove_questions(&[id]);
        Ok(true)
    }

    async fn create_option(
        &self,
        question_id: Uuid,
        draft: OptionDraft,
    ) -> Result<QuestionOption, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.questions.iter().any(|q| q.id == question_id) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let option = QuestionOption {
            id: Uuid::new_v4(),
            question_id,
            option_text: draft.option_text,
            is_correct: draft.is_correct,
            order_num: draft.order_num,
            created_at: Utc::now(),
        };
        tables.options.push(option.clone());
        Ok(option)
    }

    async fn find_option(&self, id: Uuid) -> Result<Option<QuestionOption>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.options.iter().find(|o| o.id == id).cloned())
    }

    async fn list_options(&self, question_id: Uuid) -> Result<Vec<QuestionOption>, AppError> {
        Ok(self.tables.read().await.options_of(question_id))
    }

    async fn delete_option(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.options.len();
        tables.options.retain(|o| o.id != id);
        if tables.options.len() == before {
            return Ok(false);
        }

        // Mirrors ON DELETE SET NULL on answers.selected_option_id.
        for answer in tables.answers.iter_mut() {
            if answer.selected_option_id == Some(id) {
                answer.selected_option_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl AttemptRepository for MemoryStore {
    async fn create_attempt(
        &self,
        quiz_id: Uuid,
        student_id: Uuid,
    ) -> Result<QuizAttempt, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.iter().any(|q| q.id == quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }

        let now = Utc::now();
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id,
            student_id,
            started_at: now,
            submitted_at: None,
            score: None,
            total_points: None,
            status: AttemptStatus::InProgress,
            created_at: now,
            updated_at: now,
        };
        tables.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn find_attempt(&self, id: Uuid) -> Result<Option<QuizAttempt>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.attempts.iter().find(|a| a.id == id).cloned())
    }

    async fn list_attempts_by_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<QuizAttempt>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .iter()
            .rev()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn list_attempts_by_quiz(&self, quiz_id: Uuid) -> Result<Vec<QuizAttempt>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .iter()
            .rev()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn list_answers(&self, attempt_id: Uuid) -> Result<Vec<Answer>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<Answer, AppError> {
        let mut tables = self.tables.write().await;
        let status = tables
            .attempts
            .iter()
            .find(|a| a.id == answer.attempt_id)
            .map(|a| a.status)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
        if !status.is_open() {
            return Err(AppError::Conflict("Attempt is no longer in progress".to_string()));
        }
        if !tables.questions.iter().any(|q| q.id == answer.question_id) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        if let Some(option_id) = answer.selected_option_id {
            let present = tables
                .options
                .iter()
                .any(|o| o.id == option_id && o.question_id == answer.question_id);
            if !present {
                return Err(AppError::NotFound("Option not found".to_string()));
            }
        }

        let now = Utc::now();
        if let Some(existing) = tables
            .answers
            .iter_mut()
            .find(|a| a.attempt_id == answer.attempt_id && a.question_id == answer.question_id)
        {
            existing.answer_text = answer.answer_text;
            existing.selected_option_id = answer.selected_option_id;
            existing.is_correct = None;
            existing.points_earned = 0;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = Answer {
            id: Uuid::new_v4(),
            attempt_id: answer.attempt_id,
            question_id: answer.question_id,
            answer_text: answer.answer_text,
            selected_option_id: answer.selected_option_id,
            is_correct: None,
            points_earned: 0,
            created_at: now,
            updated_at: now,
        };
        tables.answers.push(row.clone());
        Ok(row)
    }

    async fn submit_and_grade(&self, attempt_id: Uuid) -> Result<QuizAttempt, AppError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .attempts
            .iter()
            .position(|a| a.id == attempt_id)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
        if !tables.attempts[index].status.is_open() {
            return Err(AppError::Conflict("Attempt has already been submitted".to_string()));
        }

        let quiz_id = tables.attempts[index].quiz_id;
        let questions = tables.questions_of(quiz_id);
        let options = questions
            .iter()
            .flat_map(|q| tables.options_of(q.id))
            .collect();
        let answers: Vec<Answer> = tables
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect();
        let report = grading::grade(&grading::assemble(questions, options), &answers);

        // Nothing above can fail, so the whole transition lands at once.
        let now = Utc::now();
        for graded in &report.graded {
            if let Some(row) = tables.answers.iter_mut().find(|a| a.id == graded.answer_id) {
                row.is_correct = Some(graded.is_correct);
                row.points_earned = graded.points_earned;
                row.updated_at = now;
            }
        }

        let attempt = &mut tables.attempts[index];
        attempt.submitted_at = Some(now);
        attempt.score = Some(report.score);
        attempt.total_points = Some(report.total_points);
        attempt.status = AttemptStatus::Graded;
        attempt.updated_at = now;
        Ok(attempt.clone())
    }
}
