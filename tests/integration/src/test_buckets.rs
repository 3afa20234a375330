//! Bucket hardening across the whole stack.

#[cfg(test)]
mod tests {
    use baseline_template::resource_types::S3_BUCKET;
    use serde_json::json;

    use crate::{
        baseline_config, bucket_policy_for, has_action, resources_of_type, statements, synth,
    };

    #[test]
    fn test_should_declare_three_retained_buckets() {
        let template = synth(&baseline_config("acme"));
        let buckets = resources_of_type(&template, S3_BUCKET);
        let ids: Vec<&str> = buckets.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ["CloudTrailBucket", "ConfigBucket", "ServerAccessLogBucket"]);

        for (id, bucket) in buckets {
            assert_eq!(bucket["DeletionPolicy"], "Retain", "{id}");
            assert_eq!(bucket["UpdateReplacePolicy"], "Retain", "{id}");
        }
    }

    #[test]
    fn test_should_block_public_access_on_every_bucket() {
        let template = synth(&baseline_config("acme"));
        for (id, bucket) in resources_of_type(&template, S3_BUCKET) {
            assert_eq!(
                bucket["Properties"]["PublicAccessBlockConfiguration"],
                json!({
                    "BlockPublicAcls": true,
                    "BlockPublicPolicy": true,
                    "IgnorePublicAcls": true,
                    "RestrictPublicBuckets": true,
                }),
                "{id}"
            );
            assert_eq!(
                bucket["Properties"]["VersioningConfiguration"]["Status"],
                "Enabled",
                "{id}"
            );
            assert_eq!(
                bucket["Properties"]["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
                    ["ServerSideEncryptionByDefault"]["SSEAlgorithm"],
                "AES256",
                "{id}"
            );
            assert_eq!(
                bucket["Properties"]["LifecycleConfiguration"]["Rules"][0]["ExpirationInDays"],
                1825,
                "{id}"
            );
        }
    }

    #[test]
    fn test_should_enforce_tls_on_every_bucket() {
        let template = synth(&baseline_config("acme"));
        for (id, _) in resources_of_type(&template, S3_BUCKET) {
            let policy = bucket_policy_for(&template, id).expect("bucket policy");
            let tls = statements(policy, "PolicyDocument")
                .iter()
                .find(|s| s["Condition"]["Bool"]["aws:SecureTransport"] == "false")
                .unwrap_or_else(|| panic!("{id} has no TLS statement"));
            assert_eq!(tls["Effect"], "Deny");
            assert!(has_action(tls, "s3:*"));
            assert_eq!(tls["Principal"], json!({"AWS": "*"}));
            assert_eq!(tls["Resource"].as_array().map(Vec::len), Some(2));
        }
    }

    #[test]
    fn test_should_deny_object_deletion_on_every_bucket() {
        let template = synth(&baseline_config("acme"));
        for (id, _) in resources_of_type(&template, S3_BUCKET) {
            let policy = bucket_policy_for(&template, id).expect("bucket policy");
            let deny = statements(policy, "PolicyDocument")
                .iter()
                .find(|s| has_action(s, "s3:Delete*"))
                .unwrap_or_else(|| panic!("{id} has no delete restriction"));
            assert_eq!(deny["Effect"], "Deny");
            assert_eq!(deny["Sid"], "Restrict Delete* Actions");
            assert_eq!(deny["Principal"], json!({"AWS": "*"}));
            assert_eq!(
                deny["Resource"],
                json!({"Fn::Join": ["", [{"Fn::GetAtt": [id, "Arn"]}, "/*"]]})
            );
        }
    }

    #[test]
    fn test_should_route_trail_bucket_access_logs() {
        let template = synth(&baseline_config("acme"));
        let resources = &template["Resources"];
        assert_eq!(
            resources["ServerAccessLogBucket"]["Properties"]["AccessControl"],
            "LogDeliveryWrite"
        );
        assert_eq!(resources["CloudTrailBucket"]["Properties"]["AccessControl"], "Private");
        assert_eq!(
            resources["CloudTrailBucket"]["Properties"]["LoggingConfiguration"],
            json!({
                "DestinationBucketName": {"Ref": "ServerAccessLogBucket"},
                "LogFilePrefix": "cloudtraillogs",
            })
        );
    }

    #[test]
    fn test_should_grant_cloudtrail_write_to_trail_bucket() {
        let template = synth(&baseline_config("acme"));
        let policy = bucket_policy_for(&template, "CloudTrailBucket").expect("bucket policy");
        let put = statements(policy, "PolicyDocument")
            .iter()
            .find(|s| has_action(s, "s3:PutObject"))
            .expect("put statement");
        assert_eq!(put["Principal"], json!({"Service": "cloudtrail.amazonaws.com"}));
        assert_eq!(
            put["Condition"],
            json!({"StringEquals": {"s3:x-amz-acl": "bucket-owner-full-control"}})
        );
        assert_eq!(
            put["Resource"],
            json!({"Fn::Join": ["", [
                {"Fn::GetAtt": ["CloudTrailBucket", "Arn"]},
                "/AWSLogs/123456789012/*",
            ]]})
        );
    }
}
