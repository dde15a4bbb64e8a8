use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Height, weight and goal are what a diet plan needs.
    pub fn is_ready_for_diet_plan(&self) -> bool {
        self.height_cm.is_some()
            && self.weight_kg.is_some()
            && self.goal.as_deref().is_some_and(|g| !g.trim().is_empty())
    }
}

/// POST /api/user/onboarding. Web forms post numbers as strings and blanks
/// as `""`; both are accepted.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default, deserialize_with = "form_text")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "form_integer")]
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: Option<i32>,

    #[serde(default, deserialize_with = "form_text")]
    #[validate(length(max = 32, message = "Gender must be at most 32 characters"))]
    pub gender: Option<String>,

    #[serde(default, alias = "height", deserialize_with = "form_number")]
    #[validate(
        required(message = "Height is required"),
        range(min = 50.0, max = 300.0, message = "Height must be between 50 and 300 cm")
    )]
    pub height_cm: Option<f64>,

    #[serde(default, alias = "weight", deserialize_with = "form_number")]
    #[validate(
        required(message = "Weight is required"),
        range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg")
    )]
    pub weight_kg: Option<f64>,

    #[validate(length(min = 1, max = 200, message = "Goal must be 1-200 characters"))]
    pub goal: String,
}

/// PUT /api/user/profile: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "form_text")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "form_integer")]
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: Option<i32>,

    #[serde(default, deserialize_with = "form_text")]
    #[validate(length(max = 32, message = "Gender must be at most 32 characters"))]
    pub gender: Option<String>,

    #[serde(default, alias = "height", deserialize_with = "form_number")]
    #[validate(range(min = 50.0, max = 300.0, message = "Height must be between 50 and 300 cm"))]
    pub height_cm: Option<f64>,

    #[serde(default, alias = "weight", deserialize_with = "form_number")]
    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    pub weight_kg: Option<f64>,

    #[validate(length(min = 1, max = 200, message = "Goal must be 1-200 characters"))]
    pub goal: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FormValue {
    Number(f64),
    Text(String),
}

/// A JSON number or a numeric string; `null` and blank strings are absent.
fn form_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<FormValue>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(FormValue::Number(n)) => n,
        Some(FormValue::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(FormValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got \"{}\"", s)))?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom("expected a finite number"));
    }
    Ok(Some(value))
}

fn form_integer<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match form_number(deserializer)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) => {
            Ok(Some(n as i32))
        }
        Some(n) => Err(de::Error::custom(format!("expected a whole number, got {}", n))),
    }
}

fn form_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text.filter(|s| !s.trim().is_empty()))
}

/// Field-level changes applied by the user store. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
}

impl ProfileChanges {
    /// Apply onto an existing profile, or build a fresh one.
    pub fn apply(self, id: Uuid, existing: Option<UserProfile>, now: DateTime<Utc>) -> UserProfile {
        match existing {
            Some(mut p) => {
                if let Some(name) = self.name {
                    p.name = name;
                }
                p.email = self.email.or(p.email);
                p.age = self.age.or(p.age);
                p.gender = self.gender.or(p.gender);
                p.height_cm = self.height_cm.or(p.height_cm);
                p.weight_kg = self.weight_kg.or(p.weight_kg);
                p.goal = self.goal.or(p.goal);
                p.updated_at = now;
                p
            }
            None => UserProfile {
                id,
                email: self.email,
                name: self.name.unwrap_or_else(|| "Unknown".into()),
                age: self.age,
                gender: self.gender,
                height_cm: self.height_cm,
                weight_kg: self.weight_kg,
                goal: self.goal,
                created_at: now,
                updated_at: now,
            },
        }
    }
}

impl From<OnboardingRequest> for ProfileChanges {
    fn from(req: OnboardingRequest) -> Self {
        Self {
            name: Some(req.name),
            email: req.email,
            age: req.age,
            gender: req.gender,
            height_cm: req.height_cm,
            weight_kg: req.weight_kg,
            goal: Some(req.goal),
        }
    }
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            age: req.age,
            gender: req.gender,
            height_cm: req.height_cm,
            weight_kg: req.weight_kg,
            goal: req.goal,
        }
    }
}
