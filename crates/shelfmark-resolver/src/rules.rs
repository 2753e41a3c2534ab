//! Domain rule table
//!
//! Rules disambiguate known cross-category confusions (self-drilling screws vs
//! drill bits, door hardware vs plumbing). They are data, not code: the
//! DOMAIN_AWARE scoring loop only iterates the table.
//!
//! - A rule fires for a record when the descriptor carries every tag in
//!   `when_tags` and the record's category key matches the rule's substrings.
//! - Bonus rules sharing a `group` are alternatives: only the largest firing
//!   bonus in a group is added. Ungrouped bonuses are independent.
//! - Penalty rules subtract unless one of `unless_any` is in the category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use shelfmark_extract::ProductDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub when_tags: Vec<String>,
    /// Every substring must be present in the category key.
    #[serde(default)]
    pub category_all: Vec<String>,
    /// At least one must be present (ignored when empty).
    #[serde(default)]
    pub category_any: Vec<String>,
    pub bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRule {
    pub name: String,
    pub when_tags: Vec<String>,
    pub category_any: Vec<String>,
    #[serde(default)]
    pub unless_any: Vec<String>,
    pub penalty: f64,
}

fn triggered(when_tags: &[String], descriptor: &ProductDescriptor) -> bool {
    !when_tags.is_empty() && when_tags.iter().all(|t| descriptor.has_tag(t))
}

fn contains_any(category: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| category.contains(n.as_str()))
}

impl BonusRule {
    pub fn applies(&self, descriptor: &ProductDescriptor, category_key: &str) -> bool {
        triggered(&self.when_tags, descriptor)
            && self
                .category_all
                .iter()
                .all(|n| category_key.contains(n.as_str()))
            && (self.category_any.is_empty() || contains_any(category_key, &self.category_any))
    }
}

impl PenaltyRule {
    pub fn applies(&self, descriptor: &ProductDescriptor, category_key: &str) -> bool {
        triggered(&self.when_tags, descriptor)
            && contains_any(category_key, &self.category_any)
            && !contains_any(category_key, &self.unless_any)
    }
}

/// Net rule adjustment for one record, plus the names of the rules that fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub adjustment: f64,
    pub fired: Vec<String>,
}

pub fn evaluate_rules(
    bonuses: &[BonusRule],
    penalties: &[PenaltyRule],
    descriptor: &ProductDescriptor,
    category_key: &str,
) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();
    let mut grouped: BTreeMap<&str, &BonusRule> = BTreeMap::new();

    for rule in bonuses.iter().filter(|r| r.applies(descriptor, category_key)) {
        match rule.group.as_deref() {
            Some(group) => {
                let keep = grouped.get(group).map_or(true, |best| rule.bonus > best.bonus);
                if keep {
                    grouped.insert(group, rule);
                }
            }
            None => {
                outcome.adjustment += rule.bonus;
                outcome.fired.push(rule.name.clone());
            }
        }
    }
    for rule in grouped.values() {
        outcome.adjustment += rule.bonus;
        outcome.fired.push(rule.name.clone());
    }

    for rule in penalties.iter().filter(|r| r.applies(descriptor, category_key)) {
        outcome.adjustment -= rule.penalty;
        outcome.fired.push(rule.name.clone());
    }
    outcome
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

pub fn default_bonus_rules() -> Vec<BonusRule> {
    vec![
        BonusRule {
            name: "door-lock-hardware".into(),
            group: None,
            when_tags: strings(&["door-lock"]),
            category_all: Vec::new(),
            category_any: strings(&["CHAPA", "CERRADURA", "HERRAJE"]),
            bonus: 100.0,
        },
        BonusRule {
            name: "self-drilling-screw".into(),
            group: Some("screw-vs-drill".into()),
            when_tags: strings(&["screw", "drill-tip"]),
            category_all: strings(&["TORNILLO"]),
            category_any: strings(&["BROCA", "AUTORROSCANTE"]),
            bonus: 100.0,
        },
        BonusRule {
            name: "screw-over-drill".into(),
            group: Some("screw-vs-drill".into()),
            when_tags: strings(&["screw", "drill-tip"]),
            category_all: strings(&["TORNILLO"]),
            category_any: Vec::new(),
            bonus: 80.0,
        },
    ]
}

pub fn default_penalty_rules() -> Vec<PenaltyRule> {
    vec![
        PenaltyRule {
            name: "door-lock-not-plumbing".into(),
            when_tags: strings(&["door-lock"]),
            category_any: strings(&["GRIFO", "LLAVE", "AGUA"]),
            unless_any: Vec::new(),
            penalty: 50.0,
        },
        PenaltyRule {
            name: "screw-not-drill-bit".into(),
            when_tags: strings(&["screw", "drill-tip"]),
            category_any: strings(&["BROCA"]),
            unless_any: strings(&["TORNILLO"]),
            penalty: 50.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_extract::extract_descriptor;

    fn eval(title: &str, category: &str) -> RuleOutcome {
        evaluate_rules(
            &default_bonus_rules(),
            &default_penalty_rules(),
            &extract_descriptor(title),
            category,
        )
    }

    #[test]
    fn test_grouped_bonus_takes_max_only() {
        let out = eval("TOR. PUNTA DE BROCA", "TORNILLOS AUTORROSCANTES");
        assert_eq!(out.adjustment, 100.0);
        assert_eq!(out.fired, vec!["self-drilling-screw"]);

        let out = eval("TOR. PUNTA DE BROCA", "TORNILLOS PARA MADERA");
        assert_eq!(out.adjustment, 80.0);
    }

    #[test]
    fn test_penalty_respects_unless() {
        let out = eval("TOR. PUNTA DE BROCA", "BROCAS PARA METAL");
        assert_eq!(out.adjustment, -50.0);
        assert_eq!(out.fired, vec!["screw-not-drill-bit"]);
    }

    #[test]
    fn test_rules_need_every_trigger_tag() {
        // drill-tip alone does not trigger screw rules
        let out = eval("BROCA 1/4", "BROCAS PARA METAL");
        assert_eq!(out, RuleOutcome::default());
    }

    #[test]
    fn test_door_lock_rules() {
        assert_eq!(eval("CHAPA BARI DE BAÑO", "CHAPAS Y CERRADURAS").adjustment, 100.0);
        assert_eq!(eval("CHAPA BARI DE BAÑO", "LLAVES DE AGUA").adjustment, -50.0);
    }

    #[test]
    fn test_rule_table_json_roundtrip_keeps_groups() {
        let json = serde_json::to_string(&default_bonus_rules()).unwrap();
        let back: Vec<BonusRule> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, default_bonus_rules());
        assert!(!json.contains("\"group\":null"));
    }
}
