use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{ChecklistItem, ChecklistItemId};

/// Active checklist items sharing a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistSection {
    pub category: String,
    pub items: Vec<ChecklistItem>,
}

/// Read-only view over the checklist catalog.
#[derive(Debug, Clone, Default)]
pub struct ChecklistCatalog {
    items: BTreeMap<ChecklistItemId, ChecklistItem>,
}

impl ChecklistCatalog {
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ChecklistItem>,
    {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    pub fn get(&self, id: ChecklistItemId) -> Option<&ChecklistItem> {
        self.items.get(&id)
    }

    /// Active items grouped by category, ordered by (category, code).
    pub fn list_active_items(&self, category: Option<&str>) -> Vec<ChecklistSection> {
        let mut grouped: BTreeMap<&str, Vec<ChecklistItem>> = BTreeMap::new();
        for item in self.items.values().filter(|item| item.active) {
            if let Some(wanted) = category {
                if !item.category.eq_ignore_ascii_case(wanted) {
                    continue;
                }
            }
            grouped.entry(&item.category).or_default().push(item.clone());
        }

        grouped
            .into_iter()
            .map(|(category, mut items)| {
                items.sort_by(|a, b| a.code.cmp(&b.code));
                ChecklistSection {
                    category: category.to_string(),
                    items,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, code: &str, category: &str, active: bool) -> ChecklistItem {
        ChecklistItem {
            id: ChecklistItemId(id),
            code: code.to_string(),
            description: format!("{code} check"),
            category: category.to_string(),
            compliance_standard: None,
            active,
        }
    }

    #[test]
    fn groups_active_items_by_category_and_code() {
        let catalog = ChecklistCatalog::new([
            item(1, "FE-02", "extinguishers", true),
            item(2, "EX-01", "exits", true),
            item(3, "FE-01", "extinguishers", true),
            item(4, "EX-09", "exits", false),
        ]);

        let sections = catalog.list_active_items(None);
        let layout: Vec<(&str, Vec<&str>)> = sections
            .iter()
            .map(|section| {
                (
                    section.category.as_str(),
                    section.items.iter().map(|item| item.code.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            layout,
            vec![
                ("exits", vec!["EX-01"]),
                ("extinguishers", vec!["FE-01", "FE-02"]),
            ]
        );
    }

    #[test]
    fn category_filter_narrows_sections() {
        let catalog = ChecklistCatalog::new([
            item(1, "FE-01", "extinguishers", true),
            item(2, "EX-01", "exits", true),
        ]);
        let sections = catalog.list_active_items(Some("Exits"));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, "exits");
        assert!(catalog.list_active_items(Some("alarms")).is_empty());
    }
}
