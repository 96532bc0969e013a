//! Infrastructure targets for the `servers` and `deploy` commands.
//!
//! Every value can be overridden through an environment variable; the
//! defaults are the identifiers the commands were first written against.

use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub servers: ServersConfig,
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServersConfig {
    /// `SERVERS_REGION`, default `us-west-2`.
    pub region: String,
    /// `SCALING_GROUP_NAME`, default `MY_ASG_NAME`.
    pub scaling_group: String,
    /// `SCALING_GROUP_CAPACITY`, default `10`. Used by `servers start`.
    pub running_capacity: i32,
    /// `SERVERS_DASHBOARD_URL`, linked from `servers status`.
    pub dashboard_url: String,
    pub cache: CacheClusterSpec,
}

/// Parameters for creating the cache cluster on `servers start`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheClusterSpec {
    pub cluster_id: String,
    pub az_mode: String,
    pub node_type: String,
    pub subnet_group: String,
    pub engine: String,
    pub engine_version: String,
    pub num_nodes: i32,
    pub port: i32,
    pub preferred_az: String,
    pub security_group_ids: Vec<String>,
    pub snapshot_retention_limit: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    /// `DEPLOY_REGION`, default `us-east-1`.
    pub region: String,
}

impl DeployConfig {
    pub fn deployment_url(&self, stack_id: &str, deployment_id: &str) -> String {
        format!(
            "https://console.aws.amazon.com/opsworks/home?region={}#stack/{}/deployments/{}",
            self.region, stack_id, deployment_id
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            servers: ServersConfig {
                region: "us-west-2".to_string(),
                scaling_group: "MY_ASG_NAME".to_string(),
                running_capacity: 10,
                dashboard_url: "https://MY_LINK_TO_DASHBOARD".to_string(),
                cache: CacheClusterSpec {
                    cluster_id: "MY_REDIS_CLUSTER".to_string(),
                    az_mode: "single-az".to_string(),
                    node_type: "cache.r3.xlarge".to_string(),
                    subnet_group: "MY_CACHE_SUBNET".to_string(),
                    engine: "redis".to_string(),
                    engine_version: "2.8.24".to_string(),
                    num_nodes: 1,
                    port: 6379,
                    preferred_az: "us-west-2b".to_string(),
                    security_group_ids: vec!["MY_CACHE_SG".to_string()],
                    snapshot_retention_limit: 0,
                },
            },
            deploy: DeployConfig {
                region: "us-east-1".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source, falling
    /// back to the defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let servers = &mut config.servers;
        let cache = &mut servers.cache;

        set_string(&lookup, "SERVERS_REGION", &mut servers.region);
        set_string(&lookup, "SCALING_GROUP_NAME", &mut servers.scaling_group);
        set_parsed(&lookup, "SCALING_GROUP_CAPACITY", &mut servers.running_capacity)?;
        set_string(&lookup, "SERVERS_DASHBOARD_URL", &mut servers.dashboard_url);

        set_string(&lookup, "CACHE_CLUSTER_ID", &mut cache.cluster_id);
        set_string(&lookup, "CACHE_AZ_MODE", &mut cache.az_mode);
        set_string(&lookup, "CACHE_NODE_TYPE", &mut cache.node_type);
        set_string(&lookup, "CACHE_SUBNET_GROUP", &mut cache.subnet_group);
        set_string(&lookup, "CACHE_ENGINE", &mut cache.engine);
        set_string(&lookup, "CACHE_ENGINE_VERSION", &mut cache.engine_version);
        set_parsed(&lookup, "CACHE_NUM_NODES", &mut cache.num_nodes)?;
        set_parsed(&lookup, "CACHE_PORT", &mut cache.port)?;
        set_string(&lookup, "CACHE_PREFERRED_AZ", &mut cache.preferred_az);
        set_parsed(&lookup, "CACHE_SNAPSHOT_RETENTION", &mut cache.snapshot_retention_limit)?;
        if let Some(ids) = lookup("CACHE_SECURITY_GROUP_IDS") {
            cache.security_group_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }

        set_string(&lookup, "DEPLOY_REGION", &mut config.deploy.region);

        if config.servers.running_capacity < 0 {
            return Err(ConfigError::Invalid {
                name: "SCALING_GROUP_CAPACITY",
                value: config.servers.running_capacity.to_string(),
            });
        }

        Ok(config)
    }
}

/// Reads a variable that must be present.
pub fn required<F>(lookup: F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn set_string<F>(lookup: &F, name: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
        *target = value.trim().to_string();
    }
}

fn set_parsed<F, T>(lookup: &F, name: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.servers.cache.port, 6379);
        assert_eq!(config.deploy.region, "us-east-1");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SCALING_GROUP_NAME", "web-asg"),
            ("SCALING_GROUP_CAPACITY", "4"),
            ("CACHE_SECURITY_GROUP_IDS", "sg-1, sg-2,,"),
            ("DEPLOY_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(config.servers.scaling_group, "web-asg");
        assert_eq!(config.servers.running_capacity, 4);
        assert_eq!(config.servers.cache.security_group_ids, vec!["sg-1", "sg-2"]);
        assert_eq!(config.deploy.region, "eu-west-1");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("CACHE_PORT", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CACHE_PORT", .. }));
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let err =
            AppConfig::from_lookup(lookup_from(&[("SCALING_GROUP_CAPACITY", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_required_missing() {
        let err = required(lookup_from(&[("SQS_QUEUE_URL", "")]), "SQS_QUEUE_URL").unwrap_err();
        assert_eq!(err.to_string(), "SQS_QUEUE_URL not set");
    }

    #[test]
    fn test_deployment_url() {
        let deploy = DeployConfig {
            region: "us-east-1".to_string(),
        };
        assert_eq!(
            deploy.deployment_url("stack-1", "dep-9"),
            "https://console.aws.amazon.com/opsworks/home?region=us-east-1#stack/stack-1/deployments/dep-9"
        );
    }
}
