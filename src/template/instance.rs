use crate::config::StackConfig;
use crate::template::{tags, CfnResource};
use serde_json::json;

/// The Fusebox host itself: IAM role and instance profile, security group,
/// the EC2 instance, and its Elastic IP
pub(crate) fn resources(config: &StackConfig) -> Vec<CfnResource> {
    let stack_name = &config.stack_name;

    vec![
        CfnResource {
            name: "FuseboxRole".into(),
            resource: json!({
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "Path": "/",
                    "ManagedPolicyArns": [
                        "arn:aws:iam::aws:policy/service-role/AmazonEC2RoleforSSM"
                    ],
                    "AssumeRolePolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Action": "sts:AssumeRole",
                            "Principal": {"Service": "ec2.amazonaws.com"},
                            "Effect": "Allow",
                        }]
                    }
                }
            }),
        },
        CfnResource {
            name: "FuseboxInstanceProfile".into(),
            resource: json!({
                "Type": "AWS::IAM::InstanceProfile",
                "Properties": {
                    "Path": "/",
                    "Roles": [{"Ref": "FuseboxRole"}],
                }
            }),
        },
        CfnResource {
            name: "FuseboxSecurityGroup".into(),
            resource: json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": "Fusebox security group",
                    "VpcId": {"Ref": "FuseboxVPC"},
                    "Tags": tags(config, None),
                }
            }),
        },
        CfnResource {
            name: "FuseboxInstance".into(),
            resource: json!({
                "Type": "AWS::EC2::Instance",
                "Properties": {
                    "AvailabilityZone": config.subnet_az,
                    "SubnetId": {"Ref": "FuseboxVPCSubnet"},
                    "DisableApiTermination": true,
                    "EbsOptimized": false,
                    "IamInstanceProfile": {"Ref": "FuseboxInstanceProfile"},
                    "ImageId": config.ami,
                    "InstanceInitiatedShutdownBehavior": "stop",
                    "InstanceType": "t2.micro",
                    "KeyName": config.ssh_key_name,
                    // No detailed monitoring
                    "Monitoring": false,
                    "SecurityGroupIds": [{"Fn::GetAtt": ["FuseboxSecurityGroup", "GroupId"]}],
                    "SourceDestCheck": true,
                    "Tenancy": "default",
                    "Tags": [
                        {"Key": "Name", "Value": format!("{stack_name}-Fusebox")},
                        {"Key": "InstanceResponsibility", "Value": "Fusebox"},
                        {"Key": "Stack", "Value": stack_name},
                    ]
                }
            }),
        },
        CfnResource {
            name: "FuseboxEIP".into(),
            resource: json!({
                "Type": "AWS::EC2::EIP",
                "DependsOn": ["FuseboxVPC"],
                "Properties": {
                    "InstanceId": {"Ref": "FuseboxInstance"},
                    "Domain": "vpc",
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
    fn instance_uses_configured_ami_and_key() {
        let resources = resources(&config());
        let instance = &resources
            .iter()
            .find(|r| r.name == "FuseboxInstance")
            .unwrap()
            .resource;

        assert_eq!(
            instance["Properties"]["ImageId"],
            "ami-0123456789abcdef0"
        );
        assert_eq!(instance["Properties"]["KeyName"], "fusebox-key");
        assert_eq!(instance["Properties"]["DisableApiTermination"], true);
    }

    #[test]
    fn role_trusts_ec2_only() {
        let resources = resources(&config());
        let role = &resources
            .iter()
            .find(|r| r.name == "FuseboxRole")
            .unwrap()
            .resource;

        let statement = &role["Properties"]["AssumeRolePolicyDocument"]["Statement"][0];
        assert_eq!(statement["Principal"]["Service"], "ec2.amazonaws.com");
        assert_eq!(statement["Action"], "sts:AssumeRole");
    }

    #[test]
    fn eip_is_bound_to_the_instance() {
        let resources = resources(&config());
        let eip = &resources
            .iter()
            .find(|r| r.name == "FuseboxEIP")
            .unwrap()
            .resource;

        assert_eq!(eip["Properties"]["InstanceId"]["Ref"], "FuseboxInstance");
        assert_eq!(eip["Properties"]["Domain"], "vpc");
    }
}
