use std::collections::HashMap;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use url::Url;
use validator::Validate;

use super::dto::{ProgressOverview, RawItem, RawList, RawProgressOverview};
use crate::config::ApiConfig;
use crate::error::{ClientError, Result};
use crate::metrics::track_api_request;
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::models::{
    AchievementRecord, AuthTokens, ChildSummary, MistakeRecord, Module, PracticeOutcome,
    PracticeSubmission, ProficiencyResult, ProgressRecord, QuizResult, SurveyAnswer,
    SurveyQuestion, UserProfile,
};
use crate::session::AuthSession;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Whose records to fetch: the signed-in learner, or a child linked to the
/// signed-in parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Me,
    Child(String),
}

impl Subject {
    fn path(&self, resource: &str) -> String {
        match self {
            Subject::Me => resource.to_string(),
            Subject::Child(id) => format!("parent/children/{}/{}", encode_segment(id), resource),
        }
    }
}

/// Unreserved characters stay as they are; everything else is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SurveySubmission<'a> {
    answers: &'a [SurveyAnswer],
    level: &'a str,
    percentage: f64,
}

/// Typed client for the learning backend.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Url::join drops the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("quran-learn-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            retry: RetryConfig::with_attempts(config.retry_attempts),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens> {
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        req.validate()?;
        let body = serde_json::to_value(&req)?;
        self.send::<RawItem<AuthTokens>>("login", Method::POST, "auth/login", None, Some(body), &RetryConfig::none())
            .await
            .map(RawItem::into_inner)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthTokens> {
        req.validate()?;
        let body = serde_json::to_value(req)?;
        self.send::<RawItem<AuthTokens>>("register", Method::POST, "auth/register", None, Some(body), &RetryConfig::none())
            .await
            .map(RawItem::into_inner)
    }

    pub async fn current_user(&self, session: &AuthSession) -> Result<UserProfile> {
        self.get::<RawItem<UserProfile>>("me", session, "auth/me")
            .await
            .map(RawItem::into_inner)
    }

    pub async fn children(&self, session: &AuthSession) -> Result<Vec<ChildSummary>> {
        self.get::<RawList<ChildSummary>>("children", session, "parent/children")
            .await
            .map(RawList::into_vec)
    }

    pub async fn progress(&self, session: &AuthSession, subject: &Subject) -> Result<Vec<ProgressRecord>> {
        self.get::<RawList<ProgressRecord>>("progress", session, &subject.path("progress"))
            .await
            .map(RawList::into_vec)
    }

    /// Per-module completion, normalized; `fallback_totals` fills in
    /// curriculum sizes the backend leaves out.
    pub async fn progress_overview(
        &self,
        session: &AuthSession,
        subject: &Subject,
        fallback_totals: &HashMap<Module, u32>,
    ) -> Result<ProgressOverview> {
        let raw = self
            .get::<RawItem<RawProgressOverview>>(
                "progress_overview",
                session,
                &subject.path("progress/overview"),
            )
            .await?
            .into_inner();
        Ok(raw.normalize(fallback_totals))
    }

    pub async fn mistakes(&self, session: &AuthSession, subject: &Subject) -> Result<Vec<MistakeRecord>> {
        self.get::<RawList<MistakeRecord>>("mistakes", session, &subject.path("mistakes"))
            .await
            .map(RawList::into_vec)
    }

    /// Marks a mistake resolved on the backend and returns the updated record.
    pub async fn resolve_mistake(&self, session: &AuthSession, mistake_id: &str) -> Result<MistakeRecord> {
        let path = format!("mistakes/{}/resolve", encode_segment(mistake_id));
        self.send::<RawItem<MistakeRecord>>(
            "resolve_mistake",
            Method::PATCH,
            &path,
            Some(session),
            None,
            &self.retry,
        )
        .await
        .map(RawItem::into_inner)
    }

    pub async fn achievements(&self, session: &AuthSession, subject: &Subject) -> Result<Vec<AchievementRecord>> {
        self.get::<RawList<AchievementRecord>>("achievements", session, &subject.path("achievements"))
            .await
            .map(RawList::into_vec)
    }

    pub async fn quiz_results(&self, session: &AuthSession, subject: &Subject) -> Result<Vec<QuizResult>> {
        self.get::<RawList<QuizResult>>("quiz_results", session, &subject.path("quizzes/results"))
            .await
            .map(RawList::into_vec)
    }

    /// The onboarding survey is public; no session needed.
    pub async fn survey_questions(&self) -> Result<Vec<SurveyQuestion>> {
        self.send::<RawList<SurveyQuestion>>(
            "survey_questions",
            Method::GET,
            "onboarding/survey",
            None,
            None,
            &self.retry,
        )
        .await
        .map(RawList::into_vec)
    }

    pub async fn submit_survey(
        &self,
        session: &AuthSession,
        answers: &[SurveyAnswer],
        result: &ProficiencyResult,
    ) -> Result<()> {
        let body = serde_json::to_value(SurveySubmission {
            answers,
            level: result.level.as_str(),
            percentage: result.percentage,
        })?;
        self.send::<IgnoredAny>(
            "submit_survey",
            Method::POST,
            "onboarding/survey",
            Some(session),
            Some(body),
            // No idempotency key, so a retry could store the level twice.
            &RetryConfig::none(),
        )
        .await?;
        Ok(())
    }

    /// Posts a scored attempt. Retried because the idempotency key lets the
    /// backend drop duplicates.
    pub async fn submit_practice(
        &self,
        session: &AuthSession,
        submission: &PracticeSubmission,
    ) -> Result<PracticeOutcome> {
        submission.validate()?;
        let body = serde_json::to_value(submission)?;
        self.send::<RawItem<PracticeOutcome>>(
            "submit_practice",
            Method::POST,
            "progress/practice",
            Some(session),
            Some(body),
            &self.retry,
        )
        .await
        .map(RawItem::into_inner)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &'static str, session: &AuthSession, path: &str) -> Result<T> {
        self.send(endpoint, Method::GET, path, Some(session), None, &self.retry)
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        method: Method,
        path: &str,
        session: Option<&AuthSession>,
        body: Option<serde_json::Value>,
        retry: &RetryConfig,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        let bearer = match session {
            Some(session) => Some(session.bearer().ok_or(ClientError::Unauthenticated)?),
            None => None,
        };

        tracing::debug!(endpoint, method = %method, url = %url, "Calling backend");

        track_api_request(
            endpoint,
            retry_async_with_config(retry, ClientError::is_retryable, || async {
                let mut request = self.http.request(method.clone(), url.clone());
                if let Some(token) = bearer {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = &body {
                    request = request.json(body);
                }
                let response = request.send().await?;
                Self::decode(response).await
            }),
        )
        .await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .and_then(|value| {
                    value
                        .get("message")
                        .or_else(|| value.get("error"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ClientError::Status { status, message });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}
