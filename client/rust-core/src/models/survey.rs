use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
    pub options: Vec<SurveyOption>,
}

impl SurveyQuestion {
    /// Highest score any option of this question carries.
    pub fn max_score(&self) -> Option<u32> {
        self.options.iter().filter_map(|option| option.score).max()
    }

    pub fn option(&self, value: &str) -> Option<&SurveyOption> {
        self.options.iter().find(|option| option.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyOption {
    pub value: String,
    pub label: String,
    /// Unscored options (free choice questions) never contribute to the level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswer {
    pub question_id: String,
    pub option_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    Advanced,
    Intermediate,
    Beginner,
    AbsoluteBeginner,
}

impl ProficiencyLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ProficiencyLevel::Advanced
        } else if percentage >= 60.0 {
            ProficiencyLevel::Intermediate
        } else if percentage >= 40.0 {
            ProficiencyLevel::Beginner
        } else {
            ProficiencyLevel::AbsoluteBeginner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Advanced => "Advanced",
            ProficiencyLevel::Intermediate => "Intermediate",
            ProficiencyLevel::Beginner => "Beginner",
            ProficiencyLevel::AbsoluteBeginner => "Absolute Beginner",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProficiencyLevel::Advanced => {
                "You read fluently. Start with Quran recitation and tajweed refinement."
            }
            ProficiencyLevel::Intermediate => {
                "You know the letters and can read slowly. Continue with Qaida joining rules and short surahs."
            }
            ProficiencyLevel::Beginner => {
                "You recognise some letters. Start with the Qaida alphabet and harakat."
            }
            ProficiencyLevel::AbsoluteBeginner => {
                "Start from the beginning with the Arabic alphabet in Qaida."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyResult {
    pub level: ProficiencyLevel,
    pub description: String,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: f64,
}

fn scored(value: &str, label: &str, score: u32) -> SurveyOption {
    SurveyOption {
        value: value.to_string(),
        label: label.to_string(),
        score: Some(score),
    }
}

fn unscored(value: &str, label: &str) -> SurveyOption {
    SurveyOption {
        value: value.to_string(),
        label: label.to_string(),
        score: None,
    }
}

/// Built-in onboarding survey, used when the backend survey cannot be fetched.
pub fn onboarding_survey() -> Vec<SurveyQuestion> {
    vec![
        SurveyQuestion {
            id: "q1".to_string(),
            prompt: "How well do you know the Arabic alphabet?".to_string(),
            required: true,
            options: vec![
                scored("none", "I don't know any letters", 0),
                scored("some_letters", "I know a few letters", 1),
                scored("most_letters", "I know most letters", 2),
                scored("all_alphabets", "I know all the letters", 3),
            ],
        },
        SurveyQuestion {
            id: "q2".to_string(),
            prompt: "Can you read the Quran in Arabic?".to_string(),
            required: true,
            options: vec![
                scored("not_at_all", "Not at all", 0),
                scored("with_help", "Only with help", 1),
                scored("slowly", "Slowly, letter by letter", 2),
                scored("fairly_well", "Fairly well", 3),
                scored("easily", "Easily and fluently", 4),
            ],
        },
        SurveyQuestion {
            id: "q3".to_string(),
            prompt: "How familiar are you with tajweed rules?".to_string(),
            required: true,
            options: vec![
                scored("never_heard", "Never heard of them", 0),
                scored("basic", "I know the basics", 1),
                scored("apply_most", "I apply most rules", 2),
                scored("apply_all", "I apply them consistently", 3),
            ],
        },
        SurveyQuestion {
            id: "q4".to_string(),
            prompt: "How many surahs have you memorised?".to_string(),
            required: true,
            options: vec![
                scored("none", "None yet", 0),
                scored("few", "A few short surahs", 1),
                scored("juz_amma", "Most of Juz Amma", 2),
                scored("more", "More than Juz Amma", 3),
            ],
        },
        SurveyQuestion {
            id: "q5".to_string(),
            prompt: "What would you like to focus on?".to_string(),
            required: false,
            options: vec![
                unscored("reading", "Reading"),
                unscored("memorisation", "Memorisation"),
                unscored("duas", "Daily duas"),
            ],
        },
        SurveyQuestion {
            id: "q6".to_string(),
            prompt: "How much time can you practise each day?".to_string(),
            required: true,
            options: vec![
                unscored("5_min", "5 minutes"),
                unscored("15_min", "15 minutes"),
                unscored("30_min", "30 minutes or more"),
            ],
        },
    ]
}
