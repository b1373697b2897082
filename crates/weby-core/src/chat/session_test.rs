#[cfg(test)]
mod tests {
    use crate::chat::client::{GenerationClient, GenerationFailure};
    use crate::chat::session::ChatSession;
    use crate::chat::state::{SessionState, SubmitOutcome};
    use crate::chat::turn::{Speaker, Turn};
    use crate::config::{ChatConfig, DEFAULT_FALLBACK_MESSAGE, DEFAULT_GREETING};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Reply = Result<String, GenerationFailure>;

    // Client whose replies are released by the test, one per call
    struct ScriptedClient {
        calls: Mutex<Vec<(String, Vec<Turn>)>>,
        replies: tokio::sync::Mutex<mpsc::UnboundedReceiver<Reply>>,
    }

    impl ScriptedClient {
        fn new() -> (Arc<Self>, mpsc::UnboundedSender<Reply>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let client = Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                replies: tokio::sync::Mutex::new(rx),
            });
            (client, tx)
        }

        fn calls(&self) -> Vec<(String, Vec<Turn>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, new_message: &str, history: &[Turn]) -> Reply {
            self.calls
                .lock()
                .unwrap()
                .push((new_message.to_string(), history.to_vec()));
            self.replies
                .lock()
                .await
                .recv()
                .await
                .unwrap_or_else(|| Err(GenerationFailure::Transport("script exhausted".into())))
        }
    }

    struct PanickingClient;

    #[async_trait::async_trait]
    impl GenerationClient for PanickingClient {
        async fn generate(&self, _: &str, _: &[Turn]) -> Reply {
            panic!("client bug");
        }
    }

    fn texts(session_turns: &[Turn]) -> Vec<(Speaker, &str)> {
        session_turns
            .iter()
            .map(|turn| (turn.speaker, turn.text.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn test_new_session_has_only_greeting() {
        let (client, _tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default());

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].speaker, Speaker::Assistant);
        assert_eq!(transcript.turns()[0].text, DEFAULT_GREETING);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_blank_greeting_seeds_default() {
        let (client, _tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default().with_greeting(""));

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].text, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn test_successful_round_trip() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default());

        let outcome = session.submit("What services do you offer?").await;
        assert_eq!(outcome, SubmitOutcome::Accepted);
        assert_eq!(session.state(), SessionState::AwaitingResponse);
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[1].speaker, Speaker::User);

        tx.send(Ok("We build websites.".to_string())).unwrap();
        session.wait_idle().await;

        let transcript = session.transcript().await;
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            texts(transcript.turns()),
            vec![
                (Speaker::Assistant, DEFAULT_GREETING),
                (Speaker::User, "What services do you offer?"),
                (Speaker::Assistant, "We build websites."),
            ]
        );
    }

    #[tokio::test]
    async fn test_transcript_grows_by_two_per_round_trip() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default());

        for n in 1..=4 {
            assert!(session.submit(&format!("question {n}")).await.is_accepted());
            tx.send(Ok(format!("answer {n}"))).unwrap();
            session.wait_idle().await;
            assert_eq!(session.transcript().await.len(), 1 + 2 * n);
        }
    }

    #[tokio::test]
    async fn test_submit_while_awaiting_is_dropped() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client.clone(), ChatConfig::default());

        assert_eq!(session.submit("a").await, SubmitOutcome::Accepted);
        assert_eq!(session.submit("b").await, SubmitOutcome::Busy);

        tx.send(Ok("reply".to_string())).unwrap();
        session.wait_idle().await;

        let transcript = session.transcript().await;
        let user_turns: Vec<&str> = transcript
            .iter()
            .filter(|turn| turn.speaker == Speaker::User)
            .map(|turn| turn.text.as_str())
            .collect();
        assert_eq!(user_turns, vec!["a"]);
        assert_eq!(transcript.len(), 3);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_ignored() {
        let (client, _tx) = ScriptedClient::new();
        let session = ChatSession::new(client.clone(), ChatConfig::default());

        assert_eq!(session.submit("").await, SubmitOutcome::EmptyInput);
        assert_eq!(session.submit("   ").await, SubmitOutcome::EmptyInput);
        assert_eq!(session.submit("\n\t").await, SubmitOutcome::EmptyInput);

        assert_eq!(session.transcript().await.len(), 1);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_appends_fallback() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default());

        assert!(session.submit("hello?").await.is_accepted());
        tx.send(Err(GenerationFailure::Transport("connection refused".into())))
            .unwrap();
        session.wait_idle().await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turns()[1].text, "hello?");
        let last = transcript.last().unwrap();
        assert_eq!(last.speaker, Speaker::Assistant);
        assert_eq!(last.text, DEFAULT_FALLBACK_MESSAGE);
        assert!(last.text.contains("WhatsApp"));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_every_failure_kind_is_recovered() {
        let failures = vec![
            GenerationFailure::Http {
                status: 401,
                message: "API key not valid".into(),
            },
            GenerationFailure::Unauthorized("no key".into()),
            GenerationFailure::Malformed("expected value".into()),
            GenerationFailure::EmptyPayload,
        ];

        let (client, tx) = ScriptedClient::new();
        let config = ChatConfig::default().with_fallback_message("call us");
        let session = ChatSession::new(client, config);

        for failure in failures {
            assert!(session.submit("hi").await.is_accepted());
            tx.send(Err(failure)).unwrap();
            session.wait_idle().await;
            assert_eq!(session.transcript().await.last().unwrap().text, "call us");
        }
        assert_eq!(session.transcript().await.len(), 9);
    }

    #[tokio::test]
    async fn test_history_excludes_new_message_and_starts_with_greeting() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client.clone(), ChatConfig::default());

        session.submit("first").await;
        tx.send(Ok("one".to_string())).unwrap();
        session.wait_idle().await;

        session.submit("second").await;
        tx.send(Ok("two".to_string())).unwrap();
        session.wait_idle().await;

        let calls = client.calls();
        assert_eq!(calls.len(), 2);

        let (message, history) = &calls[0];
        assert_eq!(message, "first");
        assert_eq!(texts(history), vec![(Speaker::Assistant, DEFAULT_GREETING)]);

        let (message, history) = &calls[1];
        assert_eq!(message, "second");
        assert_eq!(
            texts(history),
            vec![
                (Speaker::Assistant, DEFAULT_GREETING),
                (Speaker::User, "first"),
                (Speaker::Assistant, "one"),
            ]
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default());
        let mut rx = session.subscribe();

        session.submit("ping").await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::AwaitingResponse);

        tx.send(Ok("pong".to_string())).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_close_discards_late_reply() {
        let (client, tx) = ScriptedClient::new();
        let session = ChatSession::new(client, ChatConfig::default());

        session.submit("are you there?").await;
        session.close().await;
        let _ = tx.send(Ok("too late".to_string()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert!(transcript.iter().all(|turn| turn.text != "too late"));
        assert!(session.is_closed().await);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.submit("hello").await, SubmitOutcome::Closed);
    }

    #[tokio::test]
    async fn test_drop_releases_outstanding_call() {
        let (client, _tx) = ScriptedClient::new();
        let session = ChatSession::new(client.clone(), ChatConfig::default());

        session.submit("hello").await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.calls().len(), 1);

        drop(session);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(Arc::strong_count(&client), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_fallback() {
        let (client, _tx) = ScriptedClient::new();
        let config = ChatConfig::default().with_request_timeout_secs(5);
        let session = ChatSession::new(client, config);

        session.submit("slow question").await;
        session.wait_idle().await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().unwrap().text, DEFAULT_FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_panicking_client_uses_fallback() {
        let session = ChatSession::new(Arc::new(PanickingClient), ChatConfig::default());

        session.submit("boom").await;
        session.wait_idle().await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.last().unwrap().text, DEFAULT_FALLBACK_MESSAGE);
        assert_eq!(session.state(), SessionState::Idle);
    }
}
