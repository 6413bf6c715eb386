use serde::{Deserialize, Serialize};

use scalekeeper_schedule::{DueEvent, DueKind};

/// Rendered notification content.
///
/// The core only knows subject ids; the presentation layer may re-render
/// with pet or food names before display. Title/body wording mirrors the
/// reminder copy of the surrounding app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub title: String,
    pub body: String,
}

impl Message {
    pub fn for_event(event: &DueEvent) -> Self {
        match event.kind {
            DueKind::OverdueFeeding => Self {
                title: "Overdue feeding".to_string(),
                body: format!(
                    "A reptile in your household ({}) is overdue for feeding. Time to feed!",
                    event.subject_id
                ),
            },
            DueKind::LowStock => Self {
                title: "Food running low".to_string(),
                body: format!(
                    "A food item ({}) is running low. Consider restocking soon.",
                    event.subject_id
                ),
            },
            DueKind::OutOfStock => Self {
                title: "Food out of stock".to_string(),
                body: format!(
                    "A food item ({}) is out of stock. Restock before the next feeding.",
                    event.subject_id
                ),
            },
        }
    }
}
