//! Interactive front end. Every navigation runs the route guard against the
//! session as it is right now, then renders the view it lands on. Views
//! return the next path to visit, or `None` to leave the shell.

mod console;
mod dashboard;
mod login;

pub use self::console::Console;

use crate::{
    api::ApiClient,
    error::{Error, GENERIC_FAILURE},
    routes::{self, Route},
    schedule::Scheduler,
    session::{self, SessionStore},
};
use std::sync::Arc;
use tokio::io::{self, AsyncBufRead, AsyncWrite};
use tracing::debug;

/// Result of rendering one view.
type Next = io::Result<Option<&'static str>>;

pub struct Shell<R, W> {
    console: Console<R, W>,
    api: ApiClient,
    session: Arc<SessionStore>,
    scheduler: Arc<dyn Scheduler>,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        console: Console<R, W>,
        api: ApiClient,
        session: Arc<SessionStore>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            console,
            api,
            session,
            scheduler,
        }
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Navigates to `start` and keeps following views until one quits or the
    /// input closes.
    ///
    /// # Errors
    /// Only terminal I/O errors; API failures are shown to the user.
    pub async fn run(&mut self, start: &str) -> io::Result<()> {
        let mut intent = start.to_string();
        loop {
            let route = routes::resolve(&intent, self.session.is_present());
            debug!(intent = %intent, route = route.path(), "navigating");

            let next = match route {
                Route::Login => self.login().await?,
                Route::Register => self.register().await?,
                Route::Dashboard => self.dashboard().await?,
                Route::Logout => self.logout().await?,
                Route::Root => Some(routes::DASHBOARD),
            };

            match next {
                Some(path) => intent = path.to_string(),
                None => return Ok(()),
            }
        }
    }

    async fn register(&mut self) -> Next {
        self.console
            .say("Registration is not available here. Sign in with the email your account uses.")
            .await?;
        Ok(Some(routes::LOGIN))
    }

    async fn logout(&mut self) -> Next {
        let next = session::logout(&self.session);
        self.console.say("You have been logged out!").await?;
        Ok(Some(next))
    }
}

/// What the user sees for an error: the server's message when it sent one.
fn describe(err: &Error) -> String {
    match (err.server_message(), err) {
        (Some(message), _) => message.to_string(),
        (None, Error::Http { .. }) => GENERIC_FAILURE.to_string(),
        (None, other) => other.to_string(),
    }
}
