use super::{describe, Next, Shell};
use crate::{otp::OtpChallengeController, routes, session::Lifetime};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::warn;

const CODE_PROMPT: &str = "OTP (:resend, :register, :quit): ";

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Email phase, then code phase. The controller lives only as long as this
    /// view, so leaving it stops the cooldown ticker.
    pub(super) async fn login(&mut self) -> Next {
        let mut controller = OtpChallengeController::new(self.api.clone(), self.scheduler.clone());
        controller.begin();
        self.console
            .say("Sign in with your email. Type :register or :quit at any prompt.")
            .await?;

        let email = loop {
            let Some(line) = self.console.ask("Email: ").await? else {
                return Ok(None);
            };
            match line.trim() {
                ":quit" => return Ok(None),
                ":register" => return Ok(Some(routes::REGISTER)),
                email => match controller.request_otp(email).await {
                    Ok(()) => {
                        self.console.say("OTP sent to your email!").await?;
                        break email.to_string();
                    }
                    Err(err) => self.console.say(&describe(&err)).await?,
                },
            }
        };

        loop {
            let Some(line) = self.console.ask(CODE_PROMPT).await? else {
                return Ok(None);
            };
            match line.trim() {
                ":quit" => return Ok(None),
                ":register" => return Ok(Some(routes::REGISTER)),
                ":resend" => match controller.resend_otp().await {
                    Ok(()) => self.console.say("OTP sent to your email!").await?,
                    Err(err) => self.console.say(&describe(&err)).await?,
                },
                code => {
                    // the lifetime must be known before the token arrives
                    let keep = if code.is_empty() {
                        false
                    } else {
                        match self.console.confirm("Keep me logged in?").await? {
                            Some(keep) => keep,
                            None => return Ok(None),
                        }
                    };

                    let login = match controller.verify_otp(&email, code).await {
                        Ok(login) => login,
                        Err(err) => {
                            self.console.say(&describe(&err)).await?;
                            continue;
                        }
                    };

                    let lifetime = Lifetime::from_keep_logged_in(keep);
                    if let Err(err) = login.persist(&self.session, lifetime) {
                        warn!("could not store the session: {err}");
                        let line = format!("Login failed: {}", describe(&err));
                        self.console.say(&line).await?;
                        // a leftover session belongs to someone else, don't enter it
                        if self.session.is_present() {
                            return Ok(None);
                        }
                        return Ok(Some(routes::LOGIN));
                    }

                    self.console.say("Login successful!").await?;
                    return Ok(Some(routes::DASHBOARD));
                }
            }
        }
    }
}
