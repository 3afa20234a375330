//! CloudTrail key policy and trail wiring.

#[cfg(test)]
mod tests {
    use baseline_template::resource_types::CLOUDTRAIL_TRAIL;
    use serde_json::json;

    use crate::{baseline_config, has_action, statements, synth};

    const TRAIL_CONTEXT: &str = "kms:EncryptionContext:aws:cloudtrail:arn";

    #[test]
    fn test_should_grant_data_keys_to_cloudtrail_only_for_account_trails() {
        let template = synth(&baseline_config("acme"));
        let key = &template["Resources"]["CloudTrailKey"];
        let grants: Vec<_> = statements(key, "KeyPolicy")
            .iter()
            .filter(|s| s["Principal"]["Service"] == "cloudtrail.amazonaws.com")
            .filter(|s| has_action(s, "kms:GenerateDataKey*"))
            .collect();
        assert_eq!(grants.len(), 1);
        assert_eq!(
            grants[0]["Condition"],
            json!({"StringLike": {TRAIL_CONTEXT: ["arn:aws:cloudtrail:*:123456789012:trail/*"]}})
        );
    }

    #[test]
    fn test_should_restrict_decrypt_to_deploying_account() {
        let template = synth(&baseline_config("acme"));
        let key = &template["Resources"]["CloudTrailKey"];
        let decrypt = statements(key, "KeyPolicy")
            .iter()
            .find(|s| has_action(s, "kms:ReEncryptFrom"))
            .expect("decrypt statement");
        assert_eq!(decrypt["Principal"], json!({"AWS": "*"}));
        assert_eq!(decrypt["Action"], json!(["kms:Decrypt", "kms:ReEncryptFrom"]));
        assert_eq!(
            decrypt["Condition"],
            json!({
                "StringEquals": {"kms:CallerAccount": "123456789012"},
                "StringLike": {TRAIL_CONTEXT: ["arn:aws:cloudtrail:*:123456789012:trail/*"]},
            })
        );
    }

    #[test]
    fn test_should_scope_logs_service_to_stack_region() {
        let template = synth(&baseline_config("acme"));
        let key = &template["Resources"]["CloudTrailKey"];
        let logs = statements(key, "KeyPolicy")
            .iter()
            .find(|s| s["Principal"]["Service"] == "logs.amazonaws.com")
            .expect("logs statement");
        assert_eq!(
            logs["Condition"]["ArnEquals"]["kms:EncryptionContext:aws:logs:arn"],
            "arn:aws:logs:ap-northeast-1:123456789012:log-group:*"
        );
    }

    #[test]
    fn test_should_keep_account_root_as_key_administrator() {
        let template = synth(&baseline_config("acme"));
        let key = &template["Resources"]["CloudTrailKey"];
        let policy = statements(key, "KeyPolicy");
        assert_eq!(policy.len(), 5);
        assert_eq!(policy[0]["Action"], "kms:*");
        assert_eq!(
            policy[0]["Principal"]["AWS"],
            json!({"Fn::Join": ["", [
                "arn:",
                {"Ref": "AWS::Partition"},
                ":iam::123456789012:root",
            ]]})
        );
        assert_eq!(key["Properties"]["EnableKeyRotation"], true);
        assert_eq!(key["Properties"]["Description"], "for CloudTrail");
        assert_eq!(
            template["Resources"]["CloudTrailKeyAlias"]["Properties"]["AliasName"],
            "alias/for-cloudtrail"
        );
    }

    #[test]
    fn test_should_wire_trail_to_bucket_key_and_log_group() {
        let template = synth(&baseline_config("acme"));
        let trail = &template["Resources"]["CloudTrail"];
        assert_eq!(trail["Type"], CLOUDTRAIL_TRAIL);
        assert_eq!(
            trail["Properties"],
            json!({
                "CloudWatchLogsLogGroupArn": {"Fn::GetAtt": ["CloudTrailLogGroup", "Arn"]},
                "CloudWatchLogsRoleArn": {"Fn::GetAtt": ["CloudTrailLogsRole", "Arn"]},
                "EnableLogFileValidation": true,
                "IncludeGlobalServiceEvents": true,
                "IsLogging": true,
                "IsMultiRegionTrail": true,
                "KMSKeyId": {"Fn::GetAtt": ["CloudTrailKey", "Arn"]},
                "S3BucketName": {"Ref": "CloudTrailBucket"},
            })
        );
        assert_eq!(
            trail["DependsOn"],
            json!([
                "CloudTrailBucketPolicy",
                "CloudTrailLogsRole",
                "CloudTrailLogsRoleDefaultPolicy",
            ])
        );
        assert_eq!(
            template["Resources"]["CloudTrailLogGroup"]["Properties"],
            json!({"KmsKeyId": {"Fn::GetAtt": ["CloudTrailKey", "Arn"]}, "RetentionInDays": 90})
        );
    }
}
