use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A vocabulary hit: the raw token as it appeared in the title, its semantic
/// tag, and the taxonomy-language gloss used for overlap scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTerm {
    pub token: String,
    pub tag: String,
    pub gloss: String,
}

/// Structured, per-title working data.
///
/// `raw_title` is fixed at construction. Everything else is optional and
/// absent fields simply do not contribute to scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    raw_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,

    #[serde(default)]
    pub detected_keywords: BTreeSet<String>,
    /// Discovery order, no duplicates.
    #[serde(default)]
    pub detected_domain_terms: Vec<DomainTerm>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_pattern: Option<String>,

    /// Derived fields appended by collaborators (web research, model output).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enrichment: BTreeMap<String, String>,
}

impl ProductDescriptor {
    pub fn new(raw_title: impl Into<String>) -> Self {
        Self {
            raw_title: raw_title.into(),
            ..Default::default()
        }
    }

    pub fn raw_title(&self) -> &str {
        &self.raw_title
    }

    /// Set all three taxonomy hints at once (builder style).
    pub fn with_hints(
        mut self,
        department: impl Into<String>,
        family: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        self.department_hint = Some(department.into());
        self.family_hint = Some(family.into());
        self.category_hint = Some(category.into());
        self
    }

    pub fn has_full_hints(&self) -> bool {
        [&self.department_hint, &self.family_hint, &self.category_hint]
            .iter()
            .all(|h| h.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.detected_domain_terms.iter().any(|t| t.tag == tag)
    }

    /// Append a domain term unless one with the same token is already present.
    pub fn push_domain_term(&mut self, term: DomainTerm) {
        if !self
            .detected_domain_terms
            .iter()
            .any(|t| t.token == term.token)
        {
            self.detected_domain_terms.push(term);
        }
    }

    /// Return a copy carrying extra derived fields.
    ///
    /// Existing values always win: `product_type`, `brand` and `color` are
    /// only filled when absent, and an enrichment key that already exists is
    /// left untouched. Keywords are unioned in upper case.
    pub fn enriched<I, K, V, W>(&self, fields: I, keywords: W) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        let mut out = self.clone();
        for (key, value) in fields {
            let key = key.into();
            let value = value.into();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_str() {
                "product_type" => Some(&mut out.product_type),
                "brand" => Some(&mut out.brand),
                "color" => Some(&mut out.color),
                _ => None,
            };
            if let Some(slot) = slot {
                if slot.is_none() {
                    *slot = Some(value.to_string());
                }
            }
            out.enrichment
                .entry(key)
                .or_insert_with(|| value.to_string());
        }
        for kw in keywords {
            let kw = kw.as_ref().trim();
            if !kw.is_empty() {
                out.detected_keywords.insert(kw.to_uppercase());
            }
        }
        out
    }

    /// Description, hints and product type, space-joined.
    pub fn searchable_text(&self) -> String {
        [
            self.description.as_deref(),
            self.department_hint.as_deref(),
            self.family_hint.as_deref(),
            self.category_hint.as_deref(),
            self.product_type.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_never_overwrites_source_fields() {
        let mut d = ProductDescriptor::new("Caseton 60x60");
        d.brand = Some("Foamex".into());

        let e = d.enriched(
            [("brand", "Other"), ("product_type", "caseton"), ("uso", "plafon")],
            ["plafon", " "],
        );

        assert_eq!(e.raw_title(), "Caseton 60x60");
        assert_eq!(e.brand.as_deref(), Some("Foamex"));
        assert_eq!(e.product_type.as_deref(), Some("caseton"));
        assert_eq!(e.enrichment.get("uso").map(String::as_str), Some("plafon"));
        assert!(e.detected_keywords.contains("PLAFON"));
        assert_eq!(e.detected_keywords.len(), 1);

        // original untouched
        assert!(d.product_type.is_none());
        assert!(d.enrichment.is_empty());
    }

    #[test]
    fn test_full_hints_requires_non_blank() {
        let d = ProductDescriptor::new("x").with_hints("A", "B", " ");
        assert!(!d.has_full_hints());
        let d = ProductDescriptor::new("x").with_hints("A", "B", "C");
        assert!(d.has_full_hints());
    }

    #[test]
    fn test_push_domain_term_dedupes_by_token() {
        let mut d = ProductDescriptor::new("x");
        let term = DomainTerm {
            token: "TOR".into(),
            tag: "screw".into(),
            gloss: "TORNILLO".into(),
        };
        d.push_domain_term(term.clone());
        d.push_domain_term(term);
        assert_eq!(d.detected_domain_terms.len(), 1);
        assert!(d.has_tag("screw"));
    }
}
