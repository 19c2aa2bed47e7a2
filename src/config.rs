//! Application-level configuration loading, including the runtime worship roster.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/roster.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "WORSHIP_BACK_CONFIG_PATH";

/// Number of worship groups in the weekly rotation. One rests each Sunday
/// while the other two each sing one of the two Sunday services.
pub const GROUP_COUNT: usize = 3;

/// One of the three rotating vocal teams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorshipGroup {
    /// Stable identifier carried into persisted service rows.
    pub id: Uuid,
    /// Display name of the group.
    pub name: String,
}

/// A service leader in the fixed rotation, with scheduling constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Director {
    /// Display name, persisted verbatim as the `leader` of a service row.
    pub name: String,
    /// When set, the director may not lead the later (10:45) Sunday service.
    pub only_morning: bool,
    /// Name of the worship group this director leads, if any. A leading
    /// director is preferentially scheduled alongside their own group.
    pub leads_group: Option<String>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    groups: Vec<WorshipGroup>,
    directors: Vec<Director>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in default roster.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => match AppConfig::try_from(raw) {
                    Ok(config) => {
                        info!(
                            path = %path.display(),
                            groups = config.groups.len(),
                            directors = config.directors.len(),
                            "loaded worship roster from config"
                        );
                        config
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "invalid roster config; falling back to defaults"
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in roster"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// The three worship groups, in rotation order.
    pub fn groups(&self) -> &[WorshipGroup] {
        &self.groups
    }

    /// The fixed director rotation, in rotation order.
    pub fn directors(&self) -> &[Director] {
        &self.directors
    }

    /// Look up a group's rotation position by name.
    pub fn group_position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.name == name)
    }

    /// Look up a group's rotation position by its persisted identifier.
    pub fn group_position_by_id(&self, id: Uuid) -> Option<usize> {
        self.groups.iter().position(|group| group.id == id)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            directors: default_directors(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    groups: Vec<RawGroup>,
    directors: Vec<RawDirector>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a worship group entry.
struct RawGroup {
    id: Uuid,
    name: String,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a director rotation entry.
struct RawDirector {
    name: String,
    #[serde(default)]
    only_morning: bool,
    #[serde(default)]
    leads_group: Option<String>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = String;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        if raw.groups.len() != GROUP_COUNT {
            return Err(format!(
                "roster must declare exactly {} groups (got {})",
                GROUP_COUNT,
                raw.groups.len()
            ));
        }
        if raw.directors.is_empty() {
            return Err("roster must declare at least one director".into());
        }

        let groups = raw
            .groups
            .into_iter()
            .map(|group| WorshipGroup {
                id: group.id,
                name: group.name,
            })
            .collect::<Vec<_>>();

        for director in &raw.directors {
            if let Some(led) = &director.leads_group
                && !groups.iter().any(|group| &group.name == led)
            {
                return Err(format!(
                    "director `{}` leads unknown group `{}`",
                    director.name, led
                ));
            }
        }

        let directors = raw
            .directors
            .into_iter()
            .map(|director| Director {
                name: director.name,
                only_morning: director.only_morning,
                leads_group: director.leads_group,
            })
            .collect();

        Ok(Self { groups, directors })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in roster shipped with the binary.
fn default_groups() -> Vec<WorshipGroup> {
    vec![
        WorshipGroup {
            id: Uuid::from_u128(0x8a1f3b6c_0001_4000_a000_000000000001),
            name: "Kerigma".into(),
        },
        WorshipGroup {
            id: Uuid::from_u128(0x8a1f3b6c_0001_4000_a000_000000000002),
            name: "Maranata".into(),
        },
        WorshipGroup {
            id: Uuid::from_u128(0x8a1f3b6c_0001_4000_a000_000000000003),
            name: "Shalom".into(),
        },
    ]
}

/// Built-in nine-entry director rotation shipped with the binary.
fn default_directors() -> Vec<Director> {
    vec![
        Director {
            name: "Marcos Rivera".into(),
            only_morning: false,
            leads_group: Some("Kerigma".into()),
        },
        Director {
            name: "Lucía Ferrer".into(),
            only_morning: false,
            leads_group: None,
        },
        Director {
            name: "Abigail Soto".into(),
            only_morning: true,
            leads_group: None,
        },
        Director {
            name: "Daniel Quintero".into(),
            only_morning: false,
            leads_group: Some("Maranata".into()),
        },
        Director {
            name: "Ruth Cabrera".into(),
            only_morning: false,
            leads_group: None,
        },
        Director {
            name: "Samuel Ortega".into(),
            only_morning: true,
            leads_group: None,
        },
        Director {
            name: "Esther Molina".into(),
            only_morning: false,
            leads_group: Some("Shalom".into()),
        },
        Director {
            name: "Josué Delgado".into(),
            only_morning: false,
            leads_group: None,
        },
        Director {
            name: "Noemí Prado".into(),
            only_morning: false,
            leads_group: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_is_consistent() {
        let config = AppConfig::default();
        assert_eq!(config.groups().len(), GROUP_COUNT);
        assert_eq!(config.directors().len(), 9);

        for director in config.directors() {
            if let Some(led) = &director.leads_group {
                assert!(config.group_position(led).is_some(), "unknown group {led}");
            }
        }
    }

    #[test]
    fn raw_config_rejects_wrong_group_count() {
        let raw = RawConfig {
            groups: vec![RawGroup {
                id: Uuid::new_v4(),
                name: "Solo".into(),
            }],
            directors: vec![RawDirector {
                name: "Ana".into(),
                only_morning: false,
                leads_group: None,
            }],
        };
        assert!(AppConfig::try_from(raw).is_err());
    }

    #[test]
    fn raw_config_rejects_unknown_led_group() {
        let groups = default_groups()
            .into_iter()
            .map(|group| RawGroup {
                id: group.id,
                name: group.name,
            })
            .collect();
        let raw = RawConfig {
            groups,
            directors: vec![RawDirector {
                name: "Ana".into(),
                only_morning: false,
                leads_group: Some("Inexistente".into()),
            }],
        };
        assert!(AppConfig::try_from(raw).is_err());
    }
}
