//! Session state injected into the dashboard. The owner of the session
//! publishes through a [`SessionHandle`]; views observe it with a
//! [`SessionWatch`] and navigate away once it disappears.

use std::sync::Arc;

use tokio::sync::watch;

/// Value of the session cookie (`name=value`) as issued by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn cookie_header(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Redirect(&'static str),
}

pub const ENTRY_POINT: &str = "/";

#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<SessionToken>>>,
}

impl SessionHandle {
    pub fn set(&self, token: Option<SessionToken>) {
        self.tx.send_replace(token);
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.tx.borrow().clone()
    }

    pub fn watch(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
            evaluated: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<Option<SessionToken>>,
    evaluated: bool,
}

pub fn session_channel(initial: Option<SessionToken>) -> (SessionHandle, SessionWatch) {
    let (tx, rx) = watch::channel(initial);
    (
        SessionHandle { tx: Arc::new(tx) },
        SessionWatch {
            rx,
            evaluated: false,
        },
    )
}

impl SessionWatch {
    pub fn current(&self) -> Option<SessionToken> {
        self.rx.borrow().clone()
    }

    /// Evaluates the session once per change; repeated calls without a
    /// change return `None`.
    pub fn check(&mut self) -> Option<Navigation> {
        let changed = self.rx.has_changed().unwrap_or(false);
        if self.evaluated && !changed {
            return None;
        }
        self.evaluated = true;
        redirect_if_absent(self.rx.borrow_and_update().as_ref())
    }

    /// Waits for the next session change. Returns `None` once the publisher
    /// is gone.
    pub async fn changed(&mut self) -> Option<Option<Navigation>> {
        self.rx.changed().await.ok()?;
        self.evaluated = true;
        Some(redirect_if_absent(self.rx.borrow_and_update().as_ref()))
    }
}

fn redirect_if_absent(token: Option<&SessionToken>) -> Option<Navigation> {
    match token {
        Some(_) => None,
        None => Some(Navigation::Redirect(ENTRY_POINT)),
    }
}
