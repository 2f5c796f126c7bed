use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    context::SenderContextStore,
    domain::{SenderId, FALLBACK_MESSAGE},
    messaging::{port::SessionConnector, types::InboundMessage},
    ports::AnswerService,
};

/// What happened to one inbound message.
///
/// Informational only: the connector never sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The answer was sent back to the sender.
    Answered,
    /// The backend answered with nothing; the sender gets no reply.
    NoAnswer,
    /// The fixed fallback message was sent (or attempted).
    Fallback,
    /// The message had no sender id and was dropped.
    Ignored,
}

/// Turns one inbound chat message into at most one outbound chat message.
pub struct RelayDispatcher {
    contexts: Arc<SenderContextStore>,
    answers: Arc<dyn AnswerService>,
    connector: Arc<dyn SessionConnector>,
}

impl RelayDispatcher {
    pub fn new(
        contexts: Arc<SenderContextStore>,
        answers: Arc<dyn AnswerService>,
        connector: Arc<dyn SessionConnector>,
    ) -> Self {
        Self {
            contexts,
            answers,
            connector,
        }
    }

    pub fn contexts(&self) -> &Arc<SenderContextStore> {
        &self.contexts
    }

    /// Relay `msg.text` to the answer service and reply to `msg.sender`.
    ///
    /// Never fails: backend and delivery errors end in the fallback reply or a log line.
    pub async fn handle_message(&self, msg: InboundMessage) -> Delivery {
        let sender = &msg.sender;
        if sender.as_str().is_empty() {
            warn!("inbound message without sender id ignored");
            return Delivery::Ignored;
        }

        if self.contexts.ensure(sender).await {
            debug!(%sender, "created sender context");
        }
        self.contexts.record_message(sender, &msg.text).await;

        debug!(%sender, len = msg.text.len(), "asking answer service");
        match self.answers.ask(&msg.text).await {
            Ok(Some(answer)) if !answer.is_empty() => {
                match self.connector.send_text(sender, &answer).await {
                    Ok(()) => Delivery::Answered,
                    Err(e) => {
                        warn!(%sender, error = %e, "failed to deliver answer; sending fallback");
                        self.send_fallback(sender).await;
                        Delivery::Fallback
                    }
                }
            }
            Ok(_) => {
                debug!(%sender, "answer service returned no answer; nothing sent");
                Delivery::NoAnswer
            }
            Err(e) => {
                warn!(%sender, error = %e, "answer service failed; sending fallback");
                self.send_fallback(sender).await;
                Delivery::Fallback
            }
        }
    }

    async fn send_fallback(&self, sender: &SenderId) {
        if let Err(e) = self.connector.send_text(sender, FALLBACK_MESSAGE).await {
            warn!(
                %sender,
                connector = self.connector.name(),
                error = %e,
                "failed to deliver fallback message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::errors::Error;
    use crate::test_support::{FakeAnswers, FakeConnector, Scripted};

    fn dispatcher(
        answers: FakeAnswers,
        connector: Arc<FakeConnector>,
    ) -> (RelayDispatcher, Arc<FakeAnswers>) {
        let answers = Arc::new(answers);
        let d = RelayDispatcher::new(
            Arc::new(SenderContextStore::new()),
            answers.clone(),
            connector,
        );
        (d, answers)
    }

    #[tokio::test]
    async fn relays_answer_to_sender() {
        let connector = Arc::new(FakeConnector::new());
        let (d, answers) = dispatcher(
            FakeAnswers::scripted(Scripted::Answer("hello!".to_string())),
            connector.clone(),
        );

        let out = d.handle_message(InboundMessage::new("alice", "hi")).await;

        assert_eq!(out, Delivery::Answered);
        assert_eq!(answers.questions(), vec!["hi".to_string()]);
        assert_eq!(
            connector.sent(),
            vec![(SenderId::from("alice"), "hello!".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_or_missing_answer_sends_nothing() {
        for script in [Scripted::Answer(String::new()), Scripted::Missing] {
            let connector = Arc::new(FakeConnector::new());
            let (d, _) = dispatcher(FakeAnswers::scripted(script), connector.clone());

            let out = d.handle_message(InboundMessage::new("alice", "hi")).await;

            assert_eq!(out, Delivery::NoAnswer);
            assert!(connector.sent().is_empty());
        }
    }

    #[tokio::test]
    async fn backend_failures_send_fallback() {
        let failures = [
            Error::Transport("connection refused".to_string()),
            Error::Status {
                status: 500,
                body: "boom".to_string(),
            },
            Error::MalformedResponse("not json".to_string()),
        ];
        for err in failures {
            let connector = Arc::new(FakeConnector::new());
            let (d, _) = dispatcher(FakeAnswers::scripted(Scripted::Fail(err)), connector.clone());

            let out = d.handle_message(InboundMessage::new("alice", "hi")).await;

            assert_eq!(out, Delivery::Fallback);
            assert_eq!(
                connector.sent(),
                vec![(SenderId::from("alice"), FALLBACK_MESSAGE.to_string())]
            );
        }
    }

    #[tokio::test]
    async fn failed_answer_delivery_falls_back() {
        let connector = Arc::new(FakeConnector::failing_first(1));
        let (d, _) = dispatcher(
            FakeAnswers::scripted(Scripted::Answer("hello!".to_string())),
            connector.clone(),
        );

        let out = d.handle_message(InboundMessage::new("alice", "hi")).await;

        assert_eq!(out, Delivery::Fallback);
        assert_eq!(
            connector.sent(),
            vec![(SenderId::from("alice"), FALLBACK_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn failed_fallback_delivery_is_swallowed() {
        let connector = Arc::new(FakeConnector::failing_first(usize::MAX));
        let (d, _) = dispatcher(
            FakeAnswers::scripted(Scripted::Fail(Error::Transport("down".to_string()))),
            connector.clone(),
        );

        let out = d.handle_message(InboundMessage::new("alice", "hi")).await;

        assert_eq!(out, Delivery::Fallback);
        assert!(connector.sent().is_empty());
    }

    #[tokio::test]
    async fn context_exists_before_backend_is_called() {
        let store = Arc::new(SenderContextStore::new());
        let answers = Arc::new(FakeAnswers::observing(store.clone(), SenderId::from("alice")));
        let connector = Arc::new(FakeConnector::new());
        let d = RelayDispatcher::new(store.clone(), answers.clone(), connector);

        assert!(!store.contains(&SenderId::from("alice")).await);
        d.handle_message(InboundMessage::new("alice", "hi")).await;

        assert_eq!(answers.context_seen(), vec![true]);
        let ctx = store.get(&SenderId::from("alice")).await.unwrap();
        assert_eq!(ctx.previous_message, "hi");
    }

    #[tokio::test]
    async fn one_context_per_sender() {
        let connector = Arc::new(FakeConnector::new());
        let (d, _) = dispatcher(FakeAnswers::echo(Duration::ZERO), connector);

        for (who, text) in [("alice", "a"), ("bob", "b"), ("alice", "c")] {
            d.handle_message(InboundMessage::new(who, text)).await;
        }

        assert_eq!(d.contexts().len().await, 2);
        let alice = d.contexts().get(&SenderId::from("alice")).await.unwrap();
        assert_eq!(alice.previous_message, "c");
    }

    #[tokio::test]
    async fn empty_text_is_still_forwarded() {
        let connector = Arc::new(FakeConnector::new());
        let (d, answers) = dispatcher(
            FakeAnswers::scripted(Scripted::Fail(Error::Status {
                status: 400,
                body: r#"{"error":"No question provided"}"#.to_string(),
            })),
            connector.clone(),
        );

        let out = d.handle_message(InboundMessage::new("alice", "")).await;

        assert_eq!(out, Delivery::Fallback);
        assert_eq!(answers.questions(), vec![String::new()]);
    }

    #[tokio::test]
    async fn missing_sender_is_ignored() {
        let connector = Arc::new(FakeConnector::new());
        let (d, answers) = dispatcher(FakeAnswers::echo(Duration::ZERO), connector.clone());

        let out = d.handle_message(InboundMessage::new("", "hi")).await;

        assert_eq!(out, Delivery::Ignored);
        assert!(answers.questions().is_empty());
        assert!(connector.sent().is_empty());
        assert!(d.contexts().is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_senders_never_cross_deliver() {
        let connector = Arc::new(FakeConnector::new());
        let (d, _) = dispatcher(FakeAnswers::echo(Duration::from_millis(20)), connector.clone());

        let (a, b) = tokio::join!(
            d.handle_message(InboundMessage::new("alice", "from alice")),
            d.handle_message(InboundMessage::new("bob", "from bob")),
        );
        assert_eq!((a, b), (Delivery::Answered, Delivery::Answered));

        let mut sent = connector.sent();
        sent.sort();
        assert_eq!(
            sent,
            vec![
                (SenderId::from("alice"), "echo: from alice".to_string()),
                (SenderId::from("bob"), "echo: from bob".to_string()),
            ]
        );
    }
}
