//! Turns a diet plan into tickable checklist items grouped by meal, and
//! derives the diet score from how many items were ticked.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::daily_log::{DietPlan, StructuredDietPlan};
use crate::services::scoring::DIET_MAX_POINTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Morning,
    Afternoon,
    Evening,
    Snacks,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Snacks];

    /// Map a heading or meal name to its slot, if it names one.
    pub fn from_heading(heading: &str) -> Option<Self> {
        let h = heading.to_lowercase();
        if h.contains("breakfast") || h.contains("morning") {
            Some(Self::Morning)
        } else if h.contains("lunch") || h.contains("afternoon") {
            Some(Self::Afternoon)
        } else if h.contains("dinner") || h.contains("evening") {
            Some(Self::Evening)
        } else if h.contains("snack") {
            Some(Self::Snacks)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealSection {
    pub slot: MealSlot,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub sections: Vec<MealSection>,
    pub total_items: usize,
}

impl Checklist {
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.id.as_str()))
    }

    /// Count distinct ticked ids that belong to this checklist.
    pub fn count_checked<'a, I>(&self, checked: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: HashSet<&str> = self.item_ids().collect();
        checked
            .into_iter()
            .filter(|id| known.contains(id))
            .collect::<HashSet<_>>()
            .len()
    }

    fn empty() -> Self {
        Self {
            sections: MealSlot::ALL
                .iter()
                .map(|&slot| MealSection { slot, items: Vec::new() })
                .collect(),
            total_items: 0,
        }
    }

    fn push(&mut self, slot: MealSlot, text: String) {
        let id = format!("item-{}", self.total_items);
        self.total_items += 1;
        if let Some(section) = self.sections.iter_mut().find(|s| s.slot == slot) {
            section.items.push(ChecklistItem { id, text });
        }
    }
}

pub fn checklist_for(plan: &DietPlan) -> Checklist {
    match plan {
        DietPlan::Text(markdown) => parse_markdown(markdown),
        DietPlan::Structured(plan) => from_structured(plan),
    }
}

/// `## ` headings pick the current meal, `- ` lines become items. Items
/// before any recognised heading land in the morning section.
pub fn parse_markdown(markdown: &str) -> Checklist {
    let mut checklist = Checklist::empty();
    let mut current = MealSlot::Morning;

    for line in markdown.lines() {
        let line = line.trim();
        if let Some(heading) = line.strip_prefix("## ") {
            if let Some(slot) = MealSlot::from_heading(heading) {
                current = slot;
            }
        } else if let Some(item) = line.strip_prefix("- ") {
            let text = strip_checkbox(item);
            if !text.is_empty() {
                checklist.push(current, text.to_string());
            }
        }
    }

    checklist
}

fn strip_checkbox(item: &str) -> &str {
    let item = item.trim();
    ["[ ]", "[x]", "[X]"]
        .iter()
        .find_map(|marker| item.strip_prefix(marker))
        .unwrap_or(item)
        .trim()
}

fn from_structured(plan: &StructuredDietPlan) -> Checklist {
    let mut checklist = Checklist::empty();
    for meal in &plan.meals {
        let slot = MealSlot::from_heading(&meal.name).unwrap_or(MealSlot::Snacks);
        let text = if meal.description.is_empty() {
            meal.name.clone()
        } else {
            format!("{}: {}", meal.name, meal.description)
        };
        checklist.push(slot, text);
    }
    checklist
}

/// Diet points for `checked` of `total` items, rounded and capped at 30.
pub fn diet_score(checked: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = checked.min(total) as f64 / total as f64;
    (ratio * DIET_MAX_POINTS).round().min(DIET_MAX_POINTS)
}
