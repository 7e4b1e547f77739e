use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
#[error("invalid label selector: {0}")]
pub struct SelectorError(pub String);

/// Standard match-labels / match-expressions label selector.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq,
)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl LabelSelector {
    /// Render the selector in the server-side list syntax. Match labels come
    /// first, then expressions, each in declaration order.
    pub fn to_selector(&self) -> Result<String, SelectorError> {
        let mut parts = Vec::new();
        for (k, v) in &self.match_labels {
            parts.push(format!("{}={}", k, v));
        }
        for req in &self.match_expressions {
            match req.operator {
                SelectorOperator::In | SelectorOperator::NotIn => {
                    if req.values.is_empty() {
                        return Err(SelectorError(format!(
                            "operator {:?} on {} requires values",
                            req.operator, req.key
                        )));
                    }
                    let op = if req.operator == SelectorOperator::In {
                        "in"
                    } else {
                        "notin"
                    };
                    parts.push(format!(
                        "{} {} ({})",
                        req.key,
                        op,
                        req.values.join(",")
                    ));
                }
                SelectorOperator::Exists | SelectorOperator::DoesNotExist => {
                    if !req.values.is_empty() {
                        return Err(SelectorError(format!(
                            "operator {:?} on {} forbids values",
                            req.operator, req.key
                        )));
                    }
                    if req.operator == SelectorOperator::Exists {
                        parts.push(req.key.clone());
                    } else {
                        parts.push(format!("!{}", req.key));
                    }
                }
            }
        }
        Ok(parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_labels_render_as_equality() {
        let sel = LabelSelector {
            match_labels: BTreeMap::from([
                ("env".to_string(), "prod".to_string()),
                ("tier".to_string(), "edge".to_string()),
            ]),
            match_expressions: vec![],
        };
        assert_eq!(sel.to_selector().unwrap(), "env=prod,tier=edge");
    }

    #[test]
    fn expressions_render_with_set_syntax() {
        let sel = LabelSelector {
            match_labels: BTreeMap::new(),
            match_expressions: vec![
                LabelSelectorRequirement {
                    key: "region".into(),
                    operator: SelectorOperator::In,
                    values: vec!["us".into(), "eu".into()],
                },
                LabelSelectorRequirement {
                    key: "gpu".into(),
                    operator: SelectorOperator::Exists,
                    values: vec![],
                },
                LabelSelectorRequirement {
                    key: "spot".into(),
                    operator: SelectorOperator::DoesNotExist,
                    values: vec![],
                },
            ],
        };
        assert_eq!(sel.to_selector().unwrap(), "region in (us,eu),gpu,!spot");
    }

    #[test]
    fn in_without_values_is_rejected() {
        let sel = LabelSelector {
            match_labels: BTreeMap::new(),
            match_expressions: vec![LabelSelectorRequirement {
                key: "region".into(),
                operator: SelectorOperator::In,
                values: vec![],
            }],
        };
        assert!(sel.to_selector().is_err());
    }

    #[test]
    fn exists_with_values_is_rejected() {
        let sel = LabelSelector {
            match_labels: BTreeMap::new(),
            match_expressions: vec![LabelSelectorRequirement {
                key: "gpu".into(),
                operator: SelectorOperator::Exists,
                values: vec!["yes".into()],
            }],
        };
        assert!(sel.to_selector().is_err());
    }

    #[test]
    fn empty_selector_selects_everything() {
        let sel = LabelSelector::default();
        assert_eq!(sel.to_selector().unwrap(), "");
    }
}
