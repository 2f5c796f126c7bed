//! Hand-rolled port fakes shared by the unit tests.

use std::{sync::Arc, sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::{
    context::SenderContextStore,
    domain::SenderId,
    errors::Error,
    messaging::port::SessionConnector,
    ports::AnswerService,
    Result,
};

pub enum Scripted {
    Answer(String),
    Missing,
    Fail(Error),
}

enum Mode {
    Scripted(Scripted),
    Echo(Duration),
    Observing {
        store: Arc<SenderContextStore>,
        sender: SenderId,
    },
}

pub struct FakeAnswers {
    mode: Mode,
    questions: Mutex<Vec<String>>,
    context_seen: Mutex<Vec<bool>>,
}

impl FakeAnswers {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            questions: Mutex::new(Vec::new()),
            context_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(script: Scripted) -> Self {
        Self::with_mode(Mode::Scripted(script))
    }

    /// Answers `echo: <question>` after `delay`.
    pub fn echo(delay: Duration) -> Self {
        Self::with_mode(Mode::Echo(delay))
    }

    /// Records whether `sender` already had a context when the question arrived.
    pub fn observing(store: Arc<SenderContextStore>, sender: SenderId) -> Self {
        Self::with_mode(Mode::Observing { store, sender })
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    pub fn context_seen(&self) -> Vec<bool> {
        self.context_seen.lock().unwrap().clone()
    }
}

fn replay_error(e: &Error) -> Error {
    match e {
        Error::Config(s) => Error::Config(s.clone()),
        Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
        Error::Transport(s) => Error::Transport(s.clone()),
        Error::Status { status, body } => Error::Status {
            status: *status,
            body: body.clone(),
        },
        Error::MalformedResponse(s) => Error::MalformedResponse(s.clone()),
        Error::External(s) => Error::External(s.clone()),
    }
}

#[async_trait]
impl AnswerService for FakeAnswers {
    async fn ask(&self, question: &str) -> Result<Option<String>> {
        self.questions.lock().unwrap().push(question.to_string());
        match &self.mode {
            Mode::Scripted(Scripted::Answer(a)) => Ok(Some(a.clone())),
            Mode::Scripted(Scripted::Missing) => Ok(None),
            Mode::Scripted(Scripted::Fail(e)) => Err(replay_error(e)),
            Mode::Echo(delay) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Some(format!("echo: {question}")))
            }
            Mode::Observing { store, sender } => {
                let seen = store.contains(sender).await;
                self.context_seen.lock().unwrap().push(seen);
                Ok(Some("ok".to_string()))
            }
        }
    }
}

pub struct FakeConnector {
    sent: Mutex<Vec<(SenderId, String)>>,
    failures_left: Mutex<usize>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    /// The first `n` sends fail with a transport error.
    pub fn failing_first(n: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: Mutex::new(n),
        }
    }

    pub fn sent(&self) -> Vec<(SenderId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send_text(&self, to: &SenderId, text: &str) -> Result<()> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(Error::Transport("send failed".to_string()));
            }
        }
        self.sent.lock().unwrap().push((to.clone(), text.to_string()));
        Ok(())
    }
}
