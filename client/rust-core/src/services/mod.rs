pub mod activity_timeline;
pub mod dashboard_service;
pub mod mistake_grouper;
pub mod practice;
pub mod progress_summarizer;
pub mod score_aggregator;

pub use dashboard_service::{DashboardService, LearnerDashboard, SurveyAssessment};
