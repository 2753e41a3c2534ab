use serde::Serialize;

use crate::normalize_key;

/// One taxonomy entry. Display fields keep their source casing; the `*_key`
/// accessors are what every comparison uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyRecord {
    department: String,
    family: String,
    category: String,
    naming_template: String,
    example: String,
    /// 0-based position in source order.
    position: usize,
    #[serde(skip)]
    keys: [String; 3],
}

impl TaxonomyRecord {
    pub fn new(
        department: &str,
        family: &str,
        category: &str,
        naming_template: &str,
        example: &str,
    ) -> Self {
        Self {
            department: department.trim().to_string(),
            family: family.trim().to_string(),
            category: category.trim().to_string(),
            naming_template: naming_template.trim().to_string(),
            example: example.trim().to_string(),
            position: 0,
            keys: [
                normalize_key(department),
                normalize_key(family),
                normalize_key(category),
            ],
        }
    }

    pub(crate) fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn naming_template(&self) -> &str {
        &self.naming_template
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn department_key(&self) -> &str {
        &self.keys[0]
    }

    pub fn family_key(&self) -> &str {
        &self.keys[1]
    }

    pub fn category_key(&self) -> &str {
        &self.keys[2]
    }

    /// `DEPARTMENT > FAMILY > CATEGORY` in display casing.
    pub fn path(&self) -> String {
        format!("{} > {} > {}", self.department, self.family, self.category)
    }
}
