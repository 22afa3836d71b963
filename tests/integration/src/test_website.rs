//! Website configuration lifecycle scenarios.

#[cfg(test)]
mod tests {
    use bucketweb_core::fixtures;

    use crate::{run_scenario, test_bucket_name};

    macro_rules! assert_passes {
        ($scenario:expr) => {{
            let report = run_scenario(&$scenario).await;
            assert!(report.passed(), "{} failed at {}: {:?}", report.name, report.stage, report.result);
        }};
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_import_basic_website() {
        assert_passes!(fixtures::basic_scenario(&test_bucket_name("basic")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_detect_out_of_band_deletion() {
        assert_passes!(fixtures::disappears_scenario(&test_bucket_name("gone")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_add_error_document_in_place() {
        assert_passes!(fixtures::update_scenario(&test_bucket_name("update")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_redirect_all_requests() {
        assert_passes!(fixtures::redirect_scenario(&test_bucket_name("redirect")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_swap_conditional_routing_rules() {
        assert_passes!(fixtures::condition_and_redirect_scenario(&test_bucket_name("cond")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_match_multiple_routing_rules_as_set() {
        assert_passes!(fixtures::multiple_rules_scenario(&test_bucket_name("multi")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_apply_unconditional_https_redirect() {
        assert_passes!(fixtures::redirect_only_scenario(&test_bucket_name("redir-only")));
    }
}
