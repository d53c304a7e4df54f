//! Run polling against a mock HTTP server

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::resilience::{FixedInterval, RunPoller};
    use crate::services::assistants::{AssistantClient, RunStatus};
    use crate::AssistantError;

    const RUN_PATH: &str = "/threads/thread_1/runs/run_1";

    fn run_body(status: &str) -> serde_json::Value {
        json!({"id": "run_1", "thread_id": "thread_1", "status": status})
    }

    fn client(server: &MockServer) -> AssistantClient {
        AssistantClient::builder()
            .api_key("sk-test")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_polls_until_completed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RUN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_body("in_progress")))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(RUN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
            .expect(1)
            .mount(&server)
            .await;

        let poller = RunPoller::new(FixedInterval::immediate(10));
        let run = poller
            .wait_for_completion(&client(&server), "thread_1", "run_1")
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_server_error_aborts_polling() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RUN_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let poller = RunPoller::new(FixedInterval::immediate(10));
        let err = poller
            .wait_for_completion(&client(&server), "thread_1", "run_1")
            .await
            .unwrap_err();

        assert!(err.is_api());
        assert_eq!(err.body(), Some("overloaded"));
    }

    #[tokio::test]
    async fn test_budget_is_exact() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RUN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
            .expect(3)
            .mount(&server)
            .await;

        let poller = RunPoller::new(FixedInterval::immediate(3));
        let err = poller
            .wait_for_completion(&client(&server), "thread_1", "run_1")
            .await
            .unwrap_err();

        match err.root() {
            AssistantError::PollExhausted {
                attempts,
                last_status,
                ..
            } => {
                assert_eq!(*attempts, 3);
                assert_eq!(last_status, "queued");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
