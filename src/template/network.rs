use crate::config::StackConfig;
use crate::template::{tags, CfnResource};
use serde_json::json;

/// VPC, internet gateway, routing, and the single public subnet
pub(crate) fn resources(config: &StackConfig) -> Vec<CfnResource> {
    let stack_name = &config.stack_name;

    vec![
        CfnResource {
            name: "FuseboxVPC".into(),
            resource: json!({
                "Type": "AWS::EC2::VPC",
                "Properties": {
                    "CidrBlock": config.vpc_cidr_block,
                    "EnableDnsSupport": "true",
                    "EnableDnsHostnames": "true",
                    "Tags": tags(config, Some(format!("{stack_name}-app-vpc"))),
                }
            }),
        },
        CfnResource {
            name: "FuseboxIGW".into(),
            resource: json!({
                "Type": "AWS::EC2::InternetGateway",
                "Properties": {
                    "Tags": tags(config, Some(format!("{stack_name}-fusebox-igw"))),
                }
            }),
        },
        CfnResource {
            name: "FuseboxIGWAttachment".into(),
            resource: json!({
                "Type": "AWS::EC2::VPCGatewayAttachment",
                "Properties": {
                    "VpcId": {"Ref": "FuseboxVPC"},
                    "InternetGatewayId": {"Ref": "FuseboxIGW"},
                }
            }),
        },
        CfnResource {
            name: "FuseboxRouteTable".into(),
            resource: json!({
                "Type": "AWS::EC2::RouteTable",
                "Properties": {
                    "VpcId": {"Ref": "FuseboxVPC"},
                    "Tags": tags(config, Some(format!("{stack_name}-fusebox-rtb"))),
                }
            }),
        },
        CfnResource {
            name: "FuseboxRouteToIGW".into(),
            resource: json!({
                "Type": "AWS::EC2::Route",
                "DependsOn": ["FuseboxIGWAttachment"],
                "Properties": {
                    "RouteTableId": {"Ref": "FuseboxRouteTable"},
                    "GatewayId": {"Ref": "FuseboxIGW"},
                    "DestinationCidrBlock": "0.0.0.0/0",
                }
            }),
        },
        CfnResource {
            name: "FuseboxVPCSubnet".into(),
            resource: json!({
                "Type": "AWS::EC2::Subnet",
                "Properties": {
                    "VpcId": {"Ref": "FuseboxVPC"},
                    "CidrBlock": config.vpc_cidr_block,
                    "AvailabilityZone": config.subnet_az,
                    "MapPublicIpOnLaunch": "true",
                    "Tags": tags(config, Some(format!("{stack_name}-app-subnet-1a"))),
                }
            }),
        },
        CfnResource {
            name: "FuseboxVPCSubnetAssociation".into(),
            resource: json!({
                "Type": "AWS::EC2::SubnetRouteTableAssociation",
                "Properties": {
                    "SubnetId": {"Ref": "FuseboxVPCSubnet"},
                    "RouteTableId": {"Ref": "FuseboxRouteTable"},
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
    fn route_waits_for_the_gateway_attachment() {
        let resources = resources(&config());
        let route = &resources
            .iter()
            .find(|r| r.name == "FuseboxRouteToIGW")
            .unwrap()
            .resource;

        assert_eq!(route["DependsOn"][0], "FuseboxIGWAttachment");
        assert_eq!(route["Properties"]["DestinationCidrBlock"], "0.0.0.0/0");
    }

    #[test]
    fn subnet_maps_public_ips() {
        let resources = resources(&config());
        let subnet = &resources
            .iter()
            .find(|r| r.name == "FuseboxVPCSubnet")
            .unwrap()
            .resource;

        assert_eq!(subnet["Properties"]["MapPublicIpOnLaunch"], "true");
        assert_eq!(subnet["Properties"]["CidrBlock"], "10.0.0.0/24");
    }
}
