//! AWS Config recording resources.

#[cfg(test)]
mod tests {
    use baseline_template::resource_types::{CONFIG_DELIVERY_CHANNEL, CONFIG_RECORDER};
    use serde_json::json;

    use crate::{
        baseline_config, bucket_policy_for, has_action, resources_of_type, statements, synth,
    };

    #[test]
    fn test_should_declare_single_recorder_and_delivery_channel() {
        let template = synth(&baseline_config("acme"));
        assert_eq!(resources_of_type(&template, CONFIG_RECORDER).len(), 1);
        assert_eq!(resources_of_type(&template, CONFIG_DELIVERY_CHANNEL).len(), 1);

        let recorder = &template["Resources"]["ConfigRecorder"];
        assert_eq!(
            recorder["Properties"]["RecordingGroup"],
            json!({"AllSupported": true, "IncludeGlobalResourceTypes": true})
        );
    }

    #[test]
    fn test_should_trust_config_service_with_managed_policy() {
        let template = synth(&baseline_config("acme"));
        let role = &template["Resources"]["ConfigRole"];
        let trust = statements(role, "AssumeRolePolicyDocument");
        assert_eq!(trust.len(), 1);
        assert_eq!(trust[0]["Principal"], json!({"Service": "config.amazonaws.com"}));
        assert_eq!(trust[0]["Action"], "sts:AssumeRole");
        assert_eq!(
            role["Properties"]["ManagedPolicyArns"],
            json!([{"Fn::Join": ["", [
                "arn:", {"Ref": "AWS::Partition"}, ":iam::aws:policy/service-role/AWS_ConfigRole",
            ]]}])
        );
    }

    #[test]
    fn test_should_limit_role_writes_to_config_prefix() {
        let template = synth(&baseline_config("acme"));
        let policy = bucket_policy_for(&template, "ConfigBucket").expect("bucket policy");
        let role_arn = json!({"Fn::GetAtt": ["ConfigRole", "Arn"]});

        let puts: Vec<_> = statements(policy, "PolicyDocument")
            .iter()
            .filter(|s| has_action(s, "s3:PutObject"))
            .collect();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0]["Effect"], "Allow");
        assert_eq!(puts[0]["Principal"], json!({"AWS": role_arn}));
        assert_eq!(
            puts[0]["Resource"],
            json!({"Fn::Join": ["", [
                {"Fn::GetAtt": ["ConfigBucket", "Arn"]},
                "/AWSLogs/123456789012/Config/*",
            ]]})
        );
        assert_eq!(
            puts[0]["Condition"],
            json!({"StringEquals": {"s3:x-amz-acl": "bucket-owner-full-control"}})
        );

        let acl = statements(policy, "PolicyDocument")
            .iter()
            .find(|s| has_action(s, "s3:GetBucketAcl"))
            .expect("acl statement");
        assert_eq!(acl["Principal"], json!({"AWS": role_arn}));
        assert_eq!(acl["Resource"], json!({"Fn::GetAtt": ["ConfigBucket", "Arn"]}));
    }

    #[test]
    fn test_should_deliver_to_config_bucket() {
        let template = synth(&baseline_config("acme"));
        let channel = &template["Resources"]["ConfigDeliveryChannel"];
        assert_eq!(channel["Properties"], json!({"S3BucketName": {"Ref": "ConfigBucket"}}));
        assert_eq!(channel["DependsOn"], json!(["ConfigBucketPolicy", "ConfigRecorder"]));
    }
}
