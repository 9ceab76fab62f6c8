use crate::error::Error;
use serde::Deserialize;
use std::io;
use std::path::Path;

/// Stack configuration loaded from stack_config.yml
///
/// Immutable once loaded, passed by reference into the template builder and
/// the reconciler. Field names map the YAML keys one to one.
#[derive(Clone, Debug)]
pub struct StackConfig {
    pub stack_name: String,
    pub region: String,
    pub vpc_cidr_block: String,
    pub subnet_az: String,
    pub ami: String,
    pub ssh_key_name: String,
    pub domain_name: String,
    pub storage_bucket_name: String,
    pub template_bucket: String,
    pub notification_arn: Option<String>,
}

/// The file nests all keys under a top-level "config" mapping
#[derive(Debug, Deserialize)]
struct Document {
    config: RawConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "STACK_NAME")]
    stack_name: Option<String>,

    #[serde(rename = "AWS_REGION_NAME")]
    region: Option<String>,

    #[serde(rename = "FUSEBOX_VPC_CIDR_BLOCK")]
    vpc_cidr_block: Option<String>,

    #[serde(rename = "VPC_SUBNET_AZ")]
    subnet_az: Option<String>,

    #[serde(rename = "FUSEBOX_AMI")]
    ami: Option<String>,

    #[serde(rename = "FUSEBOX_SSH_KEY_NAME")]
    ssh_key_name: Option<String>,

    #[serde(rename = "DOMAIN_NAME")]
    domain_name: Option<String>,

    #[serde(rename = "STORAGE_BUCKET_NAME")]
    storage_bucket_name: Option<String>,

    #[serde(rename = "CF_TEMPLATE_BUCKET")]
    template_bucket: Option<String>,

    #[serde(rename = "CLOUDFORMATION_NOTIFICATION_ARN")]
    notification_arn: Option<String>,
}

/// An absent or empty value counts as missing
fn required(value: Option<String>, key: &'static str) -> Result<String, Error> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingKey(key))
}

impl StackConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => Error::ConfigNotFound(path.display().to_string()),
            _ => Error::ConfigParse(error.to_string()),
        })?;

        let document: Document =
            serde_yaml::from_str(&contents).map_err(|error| Error::ConfigParse(error.to_string()))?;

        let raw = document.config;

        Ok(StackConfig {
            stack_name: required(raw.stack_name, "STACK_NAME")?,
            region: required(raw.region, "AWS_REGION_NAME")?,
            vpc_cidr_block: required(raw.vpc_cidr_block, "FUSEBOX_VPC_CIDR_BLOCK")?,
            subnet_az: required(raw.subnet_az, "VPC_SUBNET_AZ")?,
            ami: required(raw.ami, "FUSEBOX_AMI")?,
            ssh_key_name: required(raw.ssh_key_name, "FUSEBOX_SSH_KEY_NAME")?,
            domain_name: required(raw.domain_name, "DOMAIN_NAME")?,
            storage_bucket_name: required(raw.storage_bucket_name, "STORAGE_BUCKET_NAME")?,
            template_bucket: required(raw.template_bucket, "CF_TEMPLATE_BUCKET")?,
            notification_arn: raw.notification_arn.filter(|v| !v.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::StackConfig;
    use crate::error::Error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack_config.yml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", contents).unwrap();
        (dir, path)
    }

    const FULL: &str = "
config:
    STACK_NAME: demo
    AWS_REGION_NAME: us-east-1
    FUSEBOX_VPC_CIDR_BLOCK: 10.0.0.0/24
    VPC_SUBNET_AZ: us-east-1a
    FUSEBOX_AMI: ami-0123456789abcdef0
    FUSEBOX_SSH_KEY_NAME: fusebox-key
    DOMAIN_NAME: demo.example.com
    STORAGE_BUCKET_NAME: demo-storage
    CF_TEMPLATE_BUCKET: demo-cf-templates
";

    #[test]
    fn file_does_not_exist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack_config.yml");

        match StackConfig::load(&path) {
            Err(Error::ConfigNotFound(_)) => {}
            other => panic!("Expected ConfigNotFound, got {other:?}"),
        }
    }

    #[test]
    fn file_is_not_yaml() {
        let (_dir, path) = write_config(": not: valid: yaml: [");

        match StackConfig::load(&path) {
            Err(Error::ConfigParse(_)) => {}
            other => panic!("Expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_key() {
        let without_ami = FULL.replace("    FUSEBOX_AMI: ami-0123456789abcdef0\n", "");
        let (_dir, path) = write_config(&without_ami);

        match StackConfig::load(&path) {
            Err(Error::MissingKey("FUSEBOX_AMI")) => {}
            other => panic!("Expected MissingKey(FUSEBOX_AMI), got {other:?}"),
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let empty_name = FULL.replace("STACK_NAME: demo", "STACK_NAME: \"\"");
        let (_dir, path) = write_config(&empty_name);

        match StackConfig::load(&path) {
            Err(Error::MissingKey("STACK_NAME")) => {}
            other => panic!("Expected MissingKey(STACK_NAME), got {other:?}"),
        }
    }

    #[test]
    fn parses_full_config() {
        let (_dir, path) = write_config(FULL);
        let config = StackConfig::load(&path).unwrap();

        assert_eq!(config.stack_name, "demo");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.domain_name, "demo.example.com");
        assert_eq!(config.notification_arn, None);
    }

    #[test]
    fn parses_optional_notification_arn() {
        let with_arn = format!(
            "{FULL}    CLOUDFORMATION_NOTIFICATION_ARN: arn:aws:sns:us-east-1:123456789012:stack-events\n"
        );
        let (_dir, path) = write_config(&with_arn);
        let config = StackConfig::load(&path).unwrap();

        assert_eq!(
            config.notification_arn.as_deref(),
            Some("arn:aws:sns:us-east-1:123456789012:stack-events")
        );
    }
}
