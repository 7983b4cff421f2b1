use crate::empower::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;

/// The optional run configuration file.
///
/// Every key is optional: the built-in defaults apply to what is missing.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "activeCtaIds")]
    pub active_cta_ids: Option<Vec<i64>>,
    #[serde(rename = "currentCtaIds")]
    pub current_cta_ids: Option<Vec<i64>>,
    #[serde(rename = "loginCutoffDays")]
    pub login_cutoff_days: Option<u64>,
    #[serde(rename = "badFirstNames")]
    pub bad_first_names: Option<Vec<String>>,
    #[serde(rename = "badLastNames")]
    pub bad_last_names: Option<Vec<String>>,
    /// Every character of the string is forbidden.
    #[serde(rename = "badFirstNameChars")]
    pub bad_first_name_chars: Option<String>,
    #[serde(rename = "badLastNameChars")]
    pub bad_last_name_chars: Option<String>,
}

impl RunConfig {
    pub fn quality_rules(&self) -> QualityRules {
        let mut rules = QualityRules::default();
        if let Some(names) = &self.bad_first_names {
            rules.bad_first_names = names.clone();
        }
        if let Some(names) = &self.bad_last_names {
            rules.bad_last_names = names.clone();
        }
        if let Some(chars) = &self.bad_first_name_chars {
            rules.bad_first_name_chars = chars.chars().collect();
        }
        if let Some(chars) = &self.bad_last_name_chars {
            rules.bad_last_name_chars = chars.chars().collect();
        }
        rules
    }

    /// The current scope comes from the configuration, then from the CTAs
    /// attached to the regions, then from each contact.
    pub fn activation_scopes(&self, regions: &[Region]) -> ActivationScopes {
        let active_cta_ids: Option<HashSet<i64>> = self
            .active_cta_ids
            .as_ref()
            .map(|ids| ids.iter().cloned().collect());
        let region_ctas: HashSet<i64> = regions.iter().filter_map(|r| r.cta_id).collect();
        let current = match &self.current_cta_ids {
            Some(ids) => CurrentCta::Ids(ids.iter().cloned().collect()),
            None if !region_ctas.is_empty() => CurrentCta::Ids(region_ctas),
            None => CurrentCta::PerContact,
        };
        debug!(
            "activation_scopes: active: {:?} current: {:?}",
            active_cta_ids, current
        );
        ActivationScopes {
            active_cta_ids,
            current,
        }
    }
}

pub fn read_run_config(path: &str) -> BEmpowerResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: RunConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("read_run_config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: i64, cta_id: Option<i64>) -> Region {
        Region {
            id,
            name: format!("Region {}", id),
            invite_code: String::new(),
            cta_id,
            organization_id: 1,
            description: String::new(),
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.quality_rules(), QualityRules::default());
        assert_eq!(config.activation_scopes(&[]), ActivationScopes::default());
    }

    #[test]
    fn stoplists_replace_the_defaults() {
        let config: RunConfig = serde_json::from_str(
            r##"{"badFirstNames": ["Test"], "badLastNameChars": "#$", "loginCutoffDays": 30}"##,
        )
        .unwrap();
        let rules = config.quality_rules();
        assert_eq!(rules.bad_first_names, vec!["Test".to_string()]);
        assert_eq!(rules.bad_last_name_chars, vec!['#', '$']);
        assert_eq!(rules.bad_last_names, QualityRules::default().bad_last_names);
        assert_eq!(config.login_cutoff_days, Some(30));
    }

    #[test]
    fn current_scope_precedence() {
        let regions = vec![region(1, Some(7)), region(2, None), region(3, Some(8))];
        let from_regions = RunConfig::default().activation_scopes(&regions);
        assert_eq!(
            from_regions.current,
            CurrentCta::Ids([7, 8].into_iter().collect())
        );

        let config = RunConfig {
            active_cta_ids: Some(vec![1, 2]),
            current_cta_ids: Some(vec![2]),
            ..RunConfig::default()
        };
        let scopes = config.activation_scopes(&regions);
        assert_eq!(scopes.current, CurrentCta::Ids([2].into_iter().collect()));
        assert_eq!(scopes.active_cta_ids, Some([1, 2].into_iter().collect()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_run_config("/nonexistent/run_config.json").unwrap_err();
        assert!(matches!(*err, EmpowerError::OpeningFile { .. }));
    }
}
