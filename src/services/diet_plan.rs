//! Diet plan generation through an OpenAI-compatible chat completions API,
//! with a deterministic plan when the API is unavailable.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::models::daily_log::DietPlan;
use crate::models::user::UserProfile;

#[async_trait]
pub trait DietPlanGenerator: Send + Sync {
    async fn generate(&self, profile: &UserProfile) -> anyhow::Result<DietPlan>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlan {
    pub plan: DietPlan,
    pub source: PlanSource,
}

/// Ask the generator, falling back to the built-in plan on any failure.
pub async fn generate_with_fallback(
    generator: &dyn DietPlanGenerator,
    profile: &UserProfile,
) -> GeneratedPlan {
    match generator.generate(profile).await {
        Ok(plan) => GeneratedPlan {
            plan,
            source: PlanSource::Llm,
        },
        Err(e) => {
            tracing::warn!(
                user_id = %profile.id,
                error = %e,
                "Diet plan API unavailable, using fallback plan"
            );
            GeneratedPlan {
                plan: fallback_plan(profile),
                source: PlanSource::Fallback,
            }
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a professional nutritionist and dietitian.";

pub struct LlmDietPlanner {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmDietPlanner {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        })
    }
}

#[async_trait]
impl DietPlanGenerator for LlmDietPlanner {
    async fn generate(&self, profile: &UserProfile) -> anyhow::Result<DietPlan> {
        if self.api_key.is_empty() {
            anyhow::bail!("LLM_API_KEY is not configured");
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "temperature": 0.7,
                "max_tokens": 1000,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": build_prompt(profile) },
                ]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Diet plan API error {}: {}", status, body);
        }

        let body: Value = response.json().await?;
        let text = extract_content(&body)
            .ok_or_else(|| anyhow::anyhow!("Diet plan API returned no content"))?;

        Ok(DietPlan::Text(text))
    }
}

pub fn build_prompt(profile: &UserProfile) -> String {
    let age = profile
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "N/A".into());
    let gender = profile.gender.as_deref().unwrap_or("N/A");
    let height = profile
        .height_cm
        .map(|h| format!("{}cm", h))
        .unwrap_or_else(|| "N/A".into());
    let weight = profile
        .weight_kg
        .map(|w| format!("{}kg", w))
        .unwrap_or_else(|| "N/A".into());
    let goal = profile.goal.as_deref().unwrap_or("general health");

    format!(
        r#"Generate a personalized daily diet plan for:
- Age: {age}
- Gender: {gender}
- Height: {height}
- Weight: {weight}
- Goal: {goal}

Format as markdown with:
## Breakfast (8:00 AM)
- [ ] Item 1
- [ ] Item 2

## Lunch (1:00 PM)
- [ ] Item 1
- [ ] Item 2

## Dinner (7:00 PM)
- [ ] Item 1
- [ ] Item 2

## Snacks
- [ ] Item 1

Include calories and nutritional benefits. Keep it simple and practical."#
    )
}

/// Pull the completion text out of a chat-completions style response.
pub fn extract_content(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .or_else(|| body["output_text"].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Recommended liters per day: ~33 ml per kg, 2.5 l without a weight.
pub fn recommended_water_liters(weight_kg: Option<f64>) -> f64 {
    match weight_kg {
        Some(w) if w > 0.0 => ((w * 0.033) * 10.0).round() / 10.0,
        _ => 2.5,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GoalKind {
    LoseWeight,
    GainMuscle,
    Maintain,
}

fn goal_kind(goal: Option<&str>) -> GoalKind {
    let goal = goal.unwrap_or_default().to_lowercase();
    if goal.contains("lose") || goal.contains("loss") || goal.contains("cut") {
        GoalKind::LoseWeight
    } else if goal.contains("gain") || goal.contains("muscle") || goal.contains("bulk") {
        GoalKind::GainMuscle
    } else {
        GoalKind::Maintain
    }
}

/// Built-in markdown checklist plan keyed on the user's goal.
pub fn fallback_plan(profile: &UserProfile) -> DietPlan {
    let (breakfast, lunch, dinner, snacks): (&[&str], &[&str], &[&str], &[&str]) =
        match goal_kind(profile.goal.as_deref()) {
            GoalKind::LoseWeight => (
                &["Vegetable omelette with 2 eggs (250 kcal)", "Black coffee or green tea"],
                &["Grilled chicken salad with olive oil dressing (400 kcal)", "Apple"],
                &["Baked white fish with steamed vegetables (380 kcal)"],
                &["Greek yogurt, plain (100 kcal)"],
            ),
            GoalKind::GainMuscle => (
                &[
                    "Oatmeal with banana and peanut butter (550 kcal)",
                    "3 scrambled eggs (210 kcal)",
                ],
                &["Rice, chicken breast and broccoli (700 kcal)", "Glass of milk"],
                &["Salmon with sweet potato and greens (650 kcal)"],
                &["Protein shake (200 kcal)", "Handful of almonds (160 kcal)"],
            ),
            GoalKind::Maintain => (
                &["Whole-grain toast with avocado (350 kcal)", "Boiled egg (70 kcal)"],
                &["Turkey and vegetable wrap (500 kcal)", "Orange"],
                &["Lentil curry with brown rice (550 kcal)"],
                &["Carrot sticks with hummus (150 kcal)"],
            ),
        };

    let mut md = String::new();
    for (heading, items) in [
        ("Breakfast (8:00 AM)", breakfast),
        ("Lunch (1:00 PM)", lunch),
        ("Dinner (7:00 PM)", dinner),
        ("Snacks", snacks),
    ] {
        md.push_str("## ");
        md.push_str(heading);
        md.push('\n');
        for item in items {
            md.push_str("- [ ] ");
            md.push_str(item);
            md.push('\n');
        }
        md.push('\n');
    }
    md.push_str(&format!(
        "Drink about {:.1} liters of water across the day.\n",
        recommended_water_liters(profile.weight_kg)
    ));

    DietPlan::Text(md)
}
