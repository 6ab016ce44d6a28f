use std::collections::HashMap;

use crate::metrics::AGGREGATIONS_TOTAL;
use crate::models::{ProficiencyLevel, ProficiencyResult, SurveyAnswer, SurveyQuestion};

/// Buckets a survey submission into a proficiency level.
///
/// Only required questions that were answered with a scored option count:
/// the chosen score goes into the total and the question's best option into
/// the maximum. A submission with nothing scorable yields 0%.
pub fn aggregate_proficiency(
    questions: &[SurveyQuestion],
    answers: &HashMap<String, String>,
) -> ProficiencyResult {
    AGGREGATIONS_TOTAL.with_label_values(&["proficiency"]).inc();

    let mut total_score = 0u32;
    let mut max_score = 0u32;

    for question in questions.iter().filter(|q| q.required) {
        let Some(chosen) = answers.get(&question.id) else {
            continue;
        };
        let Some(score) = question.option(chosen).and_then(|option| option.score) else {
            continue;
        };
        total_score += score;
        max_score += question.max_score().unwrap_or(score);
    }

    // maxScore == 0 is reported as 0% rather than a division error.
    let percentage = if max_score == 0 {
        0.0
    } else {
        f64::from(total_score) / f64::from(max_score) * 100.0
    };
    let level = ProficiencyLevel::from_percentage(percentage);

    ProficiencyResult {
        level,
        description: level.description().to_string(),
        total_score,
        max_score,
        percentage,
    }
}

/// Collects answer rows into the lookup `aggregate_proficiency` expects.
/// A later answer to the same question replaces an earlier one.
pub fn answers_by_question(answers: &[SurveyAnswer]) -> HashMap<String, String> {
    answers
        .iter()
        .map(|a| (a.question_id.clone(), a.option_value.clone()))
        .collect()
}
