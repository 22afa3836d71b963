//! SDK backend behavior against a live server.

#[cfg(test)]
mod tests {
    use bucketweb_core::{RemoteError, WebsiteApi};
    use bucketweb_model::{
        AbsenceReason, Condition, Protocol, Redirect, RoutingRule, WebsiteConfiguration,
    };

    use crate::{cleanup_bucket, s3_client, test_bucket_name, website_api};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_classify_missing_bucket() {
        let api = website_api();
        let err = api
            .get_bucket_website(&test_bucket_name("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.absence(), Some(AbsenceReason::BucketNotFound));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_classify_missing_website_configuration() -> anyhow::Result<()> {
        let api = website_api();
        let bucket = test_bucket_name("noweb");
        api.create_bucket(&bucket).await?;

        let result = api.get_bucket_website(&bucket).await;
        cleanup_bucket(&s3_client(), &bucket).await;

        assert!(matches!(
            result,
            Err(RemoteError::Absent(AbsenceReason::WebsiteConfigurationNotFound))
        ));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_store_routing_rules() -> anyhow::Result<()> {
        let api = website_api();
        let bucket = test_bucket_name("rules");
        api.create_bucket(&bucket).await?;

        let config = WebsiteConfiguration::with_index("index.html")
            .error_document("error.html")
            .routing_rule(RoutingRule::when(
                Condition::http_error_code("404"),
                Redirect::replace_key_prefix_with("report-404"),
            ))
            .routing_rule(RoutingRule::unconditional(
                Redirect::replace_key_with("errorpage.html").with_protocol(Protocol::Https),
            ));
        api.put_bucket_website(&bucket, &config).await?;
        let observed = api.get_bucket_website(&bucket).await;
        cleanup_bucket(&s3_client(), &bucket).await;

        let observed = observed?.expect("website configuration");
        assert_eq!(observed.index_document, config.index_document);
        assert_eq!(observed.error_document, config.error_document);
        assert_eq!(observed.routing_rules.len(), 2);
        for rule in &config.routing_rules {
            assert!(observed.routing_rules.contains(rule), "missing {rule:?}");
        }
        Ok(())
    }
}
