use crate::config::StackConfig;
use crate::template::{tags, CfnResource};
use serde_json::json;

/// Versioned private storage bucket, accessible to the instance role only
pub(crate) fn resources(config: &StackConfig) -> Vec<CfnResource> {
    vec![
        CfnResource {
            name: "StorageBucket".into(),
            resource: json!({
                "Type": "AWS::S3::Bucket",
                // The bucket outlives the stack
                "DeletionPolicy": "Retain",
                "Properties": {
                    "BucketName": config.storage_bucket_name,
                    "AccessControl": "Private",
                    "VersioningConfiguration": {
                        "Status": "Enabled",
                    },
                    "Tags": tags(config, None),
                }
            }),
        },
        CfnResource {
            name: "StorageBucketPolicy".into(),
            resource: json!({
                "Type": "AWS::S3::BucketPolicy",
                "Properties": {
                    "Bucket": {"Ref": "StorageBucket"},
                    "PolicyDocument": {
                        "Statement": [{
                            "Action": "s3:*",
                            "Effect": "Allow",
                            "Resource": [
                                {"Fn::Join": ["", ["arn:aws:s3:::", {"Ref": "StorageBucket"}, "/*"]]},
                                {"Fn::Join": ["", ["arn:aws:s3:::", {"Ref": "StorageBucket"}]]},
                            ],
                            "Principal": {
                                "AWS": {"Fn::GetAtt": ["FuseboxRole", "Arn"]},
                            },
                        }]
                    }
                }
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::resources;
    use crate::template::tests::config;

    #[test]
    fn bucket_is_retained_and_versioned() {
        let resources = resources(&config());
        let bucket = &resources
            .iter()
            .find(|r| r.name == "StorageBucket")
            .unwrap()
            .resource;

        assert_eq!(bucket["DeletionPolicy"], "Retain");
        assert_eq!(bucket["Properties"]["AccessControl"], "Private");
        assert_eq!(
            bucket["Properties"]["VersioningConfiguration"]["Status"],
            "Enabled"
        );
    }

    #[test]
    fn policy_grants_the_instance_role() {
        let resources = resources(&config());
        let policy = &resources
            .iter()
            .find(|r| r.name == "StorageBucketPolicy")
            .unwrap()
            .resource;

        let statement = &policy["Properties"]["PolicyDocument"]["Statement"][0];
        assert_eq!(
            statement["Principal"]["AWS"]["Fn::GetAtt"][0],
            "FuseboxRole"
        );
        assert_eq!(statement["Action"], "s3:*");
    }
}
