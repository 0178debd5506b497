//! Enumerating declared units.

use std::collections::BTreeSet;

use serde::Serialize;

use rclonectl_core::types::{LEGACY_SERVICE_PREFIX, UNIT_PREFIX};
use rclonectl_core::{ConfigSource, UnitName};

use crate::unit::{bind, resolve, UnitKind};

/// One row of `rclonectl unit list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub name: UnitName,
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Why the unit cannot be bound, if it cannot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Every declared unit name, sorted, without duplicates.
pub fn unit_names(source: &impl ConfigSource) -> Vec<UnitName> {
    source
        .sections()
        .iter()
        .filter_map(|section| {
            section
                .strip_prefix(UNIT_PREFIX)
                .or_else(|| section.strip_prefix(LEGACY_SERVICE_PREFIX))
        })
        .filter(|name| !name.is_empty())
        .map(UnitName::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Resolve and bind every declared unit, keeping failures as rows.
pub fn list(source: &impl ConfigSource) -> Vec<UnitSummary> {
    unit_names(source)
        .into_iter()
        .map(|name| {
            let config = match resolve(&name, source) {
                Ok(config) => config,
                Err(err) => {
                    return UnitSummary {
                        name,
                        section: String::new(),
                        kind: None,
                        protocol: None,
                        problem: Some(err.to_string()),
                    }
                }
            };
            let section = config.section.clone();
            match bind(config) {
                Ok(unit) => UnitSummary {
                    protocol: match &unit.kind {
                        UnitKind::Service(handler) => Some(handler.protocol.to_string()),
                        UnitKind::Mount(_) => None,
                    },
                    kind: Some(unit.kind.label().to_owned()),
                    name,
                    section,
                    problem: None,
                },
                Err(err) => UnitSummary {
                    name,
                    section,
                    kind: None,
                    protocol: None,
                    problem: Some(err.to_string()),
                },
            }
        })
        .collect()
}
