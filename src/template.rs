mod dns;
mod instance;
mod network;
mod storage;

use crate::config::StackConfig;
use serde_json::{json, Value};

/// A single CloudFormation resource and its logical id
#[derive(Clone, Debug)]
pub(crate) struct CfnResource {
    pub(crate) name: String,
    pub(crate) resource: Value,
}

/// The assembled CloudFormation template document
///
/// A pure function of the configuration. Built once, never mutated after
/// construction; the reconciler only ever sees the serialized body.
#[derive(Clone, Debug)]
pub struct Template {
    document: Value,
}

/// All Fusebox resources in declaration order
pub(crate) fn resources(config: &StackConfig) -> Vec<CfnResource> {
    network::resources(config)
        .into_iter()
        .chain(instance::resources(config))
        .chain(dns::resources(config))
        .chain(storage::resources(config))
        .collect()
}

/// Tags shared by every resource in the stack, plus an optional Name tag
pub(crate) fn tags(config: &StackConfig, name: Option<String>) -> Value {
    let mut tags = Vec::new();

    if let Some(name) = name {
        tags.push(json!({"Key": "Name", "Value": name}));
    }

    tags.push(json!({"Key": "Stack", "Value": config.stack_name}));
    Value::Array(tags)
}

impl Template {
    pub fn new(config: &StackConfig) -> Self {
        let mut document = json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Resources": {},
            "Outputs": {
                "FuseboxUrl": {
                    "Description": "Fusebox url",
                    "Value": config.domain_name,
                }
            }
        });

        // "Resources" is present in the literal above, the unwraps cannot fire
        for CfnResource { name, resource } in resources(config) {
            document
                .get_mut("Resources")
                .unwrap()
                .as_object_mut()
                .unwrap()
                .insert(name, resource);
        }

        Template { document }
    }

    /// Serialized body submitted to CloudFormation
    pub fn body(&self) -> eyre::Result<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    #[cfg(test)]
    pub(crate) fn document(&self) -> &Value {
        &self.document
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.document)
    }
}
