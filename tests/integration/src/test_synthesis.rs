//! Whole-template properties: determinism, environments, names, alarms.

#[cfg(test)]
mod tests {
    use baseline_constructs::BaselineStack;
    use baseline_core::{AlarmConfig, BaselineConfig, BaselineError, Environment};
    use baseline_template::resource_types::{CLOUDWATCH_ALARM, LOGS_METRIC_FILTER};
    use serde_json::{Value, json};

    use crate::{baseline_config, resources_of_type, synth};

    /// Replace every occurrence of `from` in string leaves with `to`.
    fn rename(value: &Value, from: &str, to: &str) -> Value {
        match value {
            Value::String(s) => Value::String(s.replace(from, to)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| rename(v, from, to)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), rename(v, from, to)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    #[test]
    fn test_should_synthesize_byte_identical_output() {
        let config = baseline_config("acme");
        let first = BaselineStack::new(&config).unwrap().to_json().unwrap();
        let second = BaselineStack::new(&config).unwrap().to_json().unwrap();
        assert_eq!(first, second);

        let stack = BaselineStack::new(&config).unwrap();
        assert_eq!(stack.to_json().unwrap(), stack.to_json().unwrap());
    }

    #[test]
    fn test_should_only_change_bucket_names_between_configs() {
        let acme = synth(&baseline_config("acme"));
        let globex = synth(&baseline_config("globex"));
        assert_ne!(acme, globex);
        assert_eq!(rename(&globex, "globex-", "acme-"), acme);
        assert_eq!(
            acme["Resources"]["ConfigBucket"]["Properties"]["BucketName"],
            "acme-config"
        );
    }

    #[test]
    fn test_should_use_pseudo_parameters_without_environment() {
        let mut config = baseline_config("acme");
        config.env = Environment::default();
        let template = synth(&config);
        let text = template.to_string();
        assert!(!text.contains("123456789012"));
        assert!(text.contains("AWS::AccountId"));
        assert_eq!(
            template["Resources"]["CloudTrailKey"]["Properties"]["KeyPolicy"]["Statement"][4]
                ["Condition"]["ArnEquals"]["kms:EncryptionContext:aws:logs:arn"],
            json!({"Fn::Join": ["", [
                "arn:aws:logs:",
                {"Ref": "AWS::Region"},
                ":",
                {"Ref": "AWS::AccountId"},
                ":log-group:*",
            ]]})
        );
    }

    #[test]
    fn test_should_tag_taggable_resources() {
        let mut config = baseline_config("acme");
        config.tags.insert("owner".to_owned(), "security".to_owned());
        let template = synth(&config);
        let tags = json!([{"Key": "owner", "Value": "security"}]);
        for id in [
            "CloudTrailBucket",
            "CloudTrailKey",
            "CloudTrailLogGroup",
            "ConfigRole",
            "CloudTrail",
        ] {
            assert_eq!(template["Resources"][id]["Properties"]["Tags"], tags, "{id}");
        }
        assert!(
            template["Resources"]["ConfigRecorder"]["Properties"]
                .get("Tags")
                .is_none()
        );
    }

    #[test]
    fn test_should_export_log_group_name() {
        let template = synth(&baseline_config("acme"));
        assert_eq!(
            template["Outputs"]["CloudTrailLogGroupName"],
            json!({
                "Description": "Log group receiving CloudTrail events",
                "Export": {"Name": {"Fn::Join": ["", [
                    {"Ref": "AWS::StackName"}, "-CloudTrailLogGroupName",
                ]]}},
                "Value": {"Ref": "CloudTrailLogGroup"},
            })
        );
    }

    #[test]
    fn test_should_omit_alarms_by_default() {
        let template = synth(&baseline_config("acme"));
        assert!(resources_of_type(&template, CLOUDWATCH_ALARM).is_empty());
        assert!(resources_of_type(&template, LOGS_METRIC_FILTER).is_empty());
    }

    #[test]
    fn test_should_add_alarms_with_topic() {
        let topic = "arn:aws:sns:ap-northeast-1:123456789012:security";
        let config = BaselineConfig {
            alarms: Some(AlarmConfig::builder().topic_arn(topic.to_owned()).build()),
            ..baseline_config("acme")
        };
        let template = synth(&config);

        let alarms = resources_of_type(&template, CLOUDWATCH_ALARM);
        let ids: Vec<&str> = alarms.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            [
                "IAMPolicyChangeAlarm",
                "NewAccessKeyCreatedAlarm",
                "RootUserPolicyEventCountAlarm",
                "UnauthorizedAttemptsAlarm",
            ]
        );
        for (id, alarm) in alarms {
            assert_eq!(alarm["Properties"]["AlarmActions"], json!([topic]), "{id}");
            assert_eq!(alarm["Properties"]["Namespace"], "CloudTrailMetrics", "{id}");
        }
        assert_eq!(
            template["Resources"]["UnauthorizedAttempts"]["Properties"]["LogGroupName"],
            json!({"Ref": "CloudTrailLogGroup"})
        );
    }

    #[test]
    fn test_should_reject_invalid_bucket_names() {
        let mut config = baseline_config("acme");
        config.cloudtrail_bucket_name = "Acme_CloudTrail".to_owned();
        let err = BaselineStack::new(&config).unwrap_err();
        assert!(matches!(err, BaselineError::InvalidBucketName { .. }));
    }
}
