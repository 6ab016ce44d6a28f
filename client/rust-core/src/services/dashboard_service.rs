use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::api::degrade::{fetch_or_degrade, settle};
use crate::api::dto::{ProgressOverview, RawProgressOverview};
use crate::api::{ApiClient, Subject};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::survey::onboarding_survey;
use crate::models::{Module, ProficiencyResult, SurveyAnswer};
use crate::services::activity_timeline::{build_timeline, ActivityTimeline};
use crate::services::mistake_grouper::{group_mistakes, MistakeGroups};
use crate::services::progress_summarizer::{summarize_progress, ProgressSummary};
use crate::services::score_aggregator::{aggregate_proficiency, answers_by_question};
use crate::session::AuthSession;

/// Everything the progress, mistakes and activity screens render for one
/// learner. `degraded` names the resources that were replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerDashboard {
    pub summary: ProgressSummary,
    pub mistakes: MistakeGroups,
    pub timeline: ActivityTimeline,
    pub degraded: Vec<String>,
}

impl LearnerDashboard {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAssessment {
    pub result: ProficiencyResult,
    /// True when the built-in questions were used instead of the backend's.
    pub used_builtin_questions: bool,
    /// False when the level could not be stored (signed out or backend error).
    pub submitted: bool,
}

pub struct DashboardService<'a> {
    api: &'a ApiClient,
    config: &'a Config,
}

impl<'a> DashboardService<'a> {
    pub fn new(api: &'a ApiClient, config: &'a Config) -> Self {
        Self { api, config }
    }

    pub async fn load_learner(
        &self,
        session: &AuthSession,
        now: DateTime<FixedOffset>,
    ) -> Result<LearnerDashboard> {
        self.load(session, &Subject::Me, now).await
    }

    /// Parent monitor view of one linked child.
    pub async fn load_child(
        &self,
        session: &AuthSession,
        child_id: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<LearnerDashboard> {
        if !session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }
        if !session.is_parent() {
            return Err(ClientError::Forbidden(
                "only parent accounts can view a child's progress".to_string(),
            ));
        }
        self.load(session, &Subject::Child(child_id.to_string()), now)
            .await
    }

    /// Fetches the five resources concurrently. Any of them may fail and be
    /// replaced by an empty placeholder; only a missing sign-in is an error.
    pub async fn load(
        &self,
        session: &AuthSession,
        subject: &Subject,
        now: DateTime<FixedOffset>,
    ) -> Result<LearnerDashboard> {
        if !session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }

        let fallback_totals = self.config.curriculum.totals();
        let (progress, overview, mistakes, quizzes, achievements) = tokio::join!(
            fetch_or_degrade("progress", self.api.progress(session, subject), Vec::new),
            fetch_or_degrade(
                "progress_overview",
                self.api.progress_overview(session, subject, &fallback_totals),
                || placeholder_overview(&fallback_totals),
            ),
            fetch_or_degrade("mistakes", self.api.mistakes(session, subject), Vec::new),
            fetch_or_degrade("quiz_results", self.api.quiz_results(session, subject), Vec::new),
            fetch_or_degrade("achievements", self.api.achievements(session, subject), Vec::new),
        );

        let mut degraded = Vec::new();
        let progress_ok = progress.is_ok();
        let progress = settle(progress, &mut degraded);
        let overview = settle(overview, &mut degraded);
        let mistakes = settle(mistakes, &mut degraded);
        let quizzes = settle(quizzes, &mut degraded);
        let achievements = settle(achievements, &mut degraded);

        let mut summary = summarize_progress(
            &progress,
            &overview.totals(),
            self.config.progress.lookback_days,
            &now,
        );
        if !progress_ok {
            // Without rows the overview is the only source of completed counts.
            summary.lessons_by_type = overview.lessons_by_type;
        }

        let now_utc = now.with_timezone(&Utc);
        let dashboard = LearnerDashboard {
            summary,
            mistakes: group_mistakes(&mistakes, now_utc),
            timeline: build_timeline(&progress, &quizzes, &achievements, now_utc, None),
            degraded: degraded.into_iter().map(str::to_string).collect(),
        };

        tracing::info!(
            subject = ?subject,
            lessons = progress.len(),
            mistakes = mistakes.len(),
            degraded = ?dashboard.degraded,
            "Loaded dashboard"
        );

        Ok(dashboard)
    }

    /// Scores onboarding answers. The questions come from the backend when it
    /// answers, else the built-in survey. Storing the level is best-effort.
    pub async fn assess_survey(
        &self,
        session: Option<&AuthSession>,
        answers: &[SurveyAnswer],
    ) -> SurveyAssessment {
        let mut degraded = Vec::new();
        let questions = settle(
            fetch_or_degrade(
                "survey_questions",
                self.api.survey_questions(),
                onboarding_survey,
            )
            .await,
            &mut degraded,
        );

        let result = aggregate_proficiency(&questions, &answers_by_question(answers));
        tracing::info!(
            level = result.level.as_str(),
            percentage = result.percentage,
            "Assessed onboarding survey"
        );

        let submitted = match session.filter(|s| s.is_authenticated()) {
            Some(session) => match self.api.submit_survey(session, answers, &result).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to store proficiency level");
                    false
                }
            },
            None => false,
        };

        SurveyAssessment {
            result,
            used_builtin_questions: !degraded.is_empty(),
            submitted,
        }
    }
}

fn placeholder_overview(fallback_totals: &HashMap<Module, u32>) -> ProgressOverview {
    RawProgressOverview::default().normalize(fallback_totals)
}
