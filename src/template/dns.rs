use crate::config::StackConfig;
use crate::template::CfnResource;
use serde_json::json;

/// Hosted zone for the configured domain with an A record on the Fusebox EIP
pub(crate) fn resources(config: &StackConfig) -> Vec<CfnResource> {
    let domain_name = &config.domain_name;

    vec![
        CfnResource {
            name: "HostedZone".into(),
            resource: json!({
                "Type": "AWS::Route53::HostedZone",
                "Properties": {
                    "Name": domain_name,
                    "HostedZoneConfig": {
                        "Comment": format!("{} stack HostedZone", config.stack_name),
                    }
                }
            }),
        },
        CfnResource {
            name: "FuseboxRecordSetGroup".into(),
            resource: json!({
                "Type": "AWS::Route53::RecordSetGroup",
                "Properties": {
                    "HostedZoneId": {"Ref": "HostedZone"},
                    "RecordSets": [{
                        // Record names are fully qualified
                        "Name": format!("{domain_name}."),
                        "Type": "A",
                        "ResourceRecords": [{"Ref": "FuseboxEIP"}],
                        "TTL": "300",
                    }]
                }
            }),
        },
    ]
}
