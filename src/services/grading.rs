// src/services/grading.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    attempt::Answer,
    question::{Question, QuestionOption, QuestionWithOptions},
};

/// Grading outcome for one auto-gradable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedAnswer {
    pub answer_id: Uuid,
    pub is_correct: bool,
    pub points_earned: i32,
}

/// Result of one grading pass over an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub score: i32,
    pub total_points: i32,
    /// Only choice answers with a selected option appear here.
    pub graded: Vec<GradedAnswer>,
}

/// Groups options under their questions, keeping the question order and each
/// option list in the order given.
pub fn assemble(questions: Vec<Question>, options: Vec<QuestionOption>) -> Vec<QuestionWithOptions> {
    let mut by_question: HashMap<Uuid, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    questions
        .into_iter()
        .map(|question| {
            let options = by_question.remove(&question.id).unwrap_or_default();
            QuestionWithOptions { question, options }
        })
        .collect()
}

/// Scores an attempt's answers against the quiz structure.
///
/// * Every question counts toward `total_points`, answered or not.
/// * The first answer matching a question is the one consulted.
/// * Choice answers earn the full point value iff the selected option belongs
///   to the question and is flagged correct.
/// * Short answers and choice answers without a selection are left ungraded.
pub fn grade(questions: &[QuestionWithOptions], answers: &[Answer]) -> GradeReport {
    let mut score = 0;
    let mut total_points = 0;
    let mut graded = Vec::new();

    for item in questions {
        let question = &item.question;
        total_points += question.points;

        let Some(answer) = answers.iter().find(|a| a.question_id == question.id) else {
            continue;
        };

        if !question.question_type.is_choice() {
            continue;
        }

        let Some(selected) = answer.selected_option_id else {
            continue;
        };

        let is_correct = item
            .options
            .iter()
            .find(|o| o.id == selected)
            .is_some_and(|o| o.is_correct);
        let points_earned = if is_correct { question.points } else { 0 };

        score += points_earned;
        graded.push(GradedAnswer {
            answer_id: answer.id,
            is_correct,
            points_earned,
        });
    }

    GradeReport {
        score,
        total_points,
        graded,
    }
}
