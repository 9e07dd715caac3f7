use super::{describe, Next, Shell};
use crate::{
    dashboard::{Dashboard, DashboardError},
    notes::{Confirmation, DeleteOutcome},
    routes,
};
use tokio::io::{self, AsyncBufRead, AsyncWrite};

const HELP: &str = "\
Commands:
  add <text>   create a note
  delete <n>   delete note number n
  list         show your notes
  logout       sign out
  help         show this help
  quit         leave jotpad";

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub(super) async fn dashboard(&mut self) -> Next {
        let mut view = Dashboard::new(self.api.clone(), self.session.clone());

        let report = match view.enter().await {
            Ok(report) => report,
            Err(DashboardError::Redirect(to)) => return self.expired(to).await,
            Err(DashboardError::Failed(err)) => {
                self.console.say(&describe(&err)).await?;
                return Ok(Some(routes::LOGIN));
            }
        };

        match view.profile() {
            Some(profile) => {
                let greeting = format!("Welcome, {}!", profile.display_name);
                self.console.say(&greeting).await?;
                self.console.say(&profile.email).await?;
            }
            None => {
                let greeting = format!("Welcome, {}!", view.account_label());
                self.console.say(&greeting).await?;
            }
        }
        if let Some(err) = &report.profile_error {
            let line = format!("Could not load your profile: {}", describe(err));
            self.console.say(&line).await?;
        }
        match &report.notes_error {
            Some(err) => {
                let line = format!("Could not load your notes: {}", describe(err));
                self.console.say(&line).await?;
            }
            None => self.render_notes(&view).await?,
        }
        self.console.say("Type help for commands.").await?;

        loop {
            let Some(line) = self.console.ask("> ").await? else {
                return Ok(None);
            };
            let line = line.trim();
            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

            match command {
                "" => {}
                "add" => match view.add_note(rest).await {
                    Ok(_) => self.console.say("Note added.").await?,
                    Err(DashboardError::Redirect(to)) => return self.expired(to).await,
                    Err(DashboardError::Failed(err)) => self.console.say(&describe(&err)).await?,
                },
                "delete" => {
                    let Some(id) = note_at(&view, rest) else {
                        self.console
                            .say("Usage: delete <n>, where n is a number from list")
                            .await?;
                        continue;
                    };
                    let Some(yes) = self
                        .console
                        .confirm("Are you sure you want to delete this note?")
                        .await?
                    else {
                        return Ok(None);
                    };
                    match view.delete_note(&id, Confirmation::from_answer(yes)).await {
                        Ok(DeleteOutcome::Deleted(_) | DeleteOutcome::DeletedRemote) => {
                            self.console.say("Note deleted.").await?;
                        }
                        Ok(DeleteOutcome::Cancelled) => {}
                        Err(DashboardError::Redirect(to)) => return self.expired(to).await,
                        Err(DashboardError::Failed(err)) => {
                            self.console.say(&describe(&err)).await?;
                        }
                    }
                }
                "list" => self.render_notes(&view).await?,
                "logout" => return Ok(Some(routes::LOGOUT)),
                "help" => self.console.say(HELP).await?,
                "quit" | ":quit" => return Ok(None),
                other => {
                    let line = format!("Unknown command: {other}. Type help for commands.");
                    self.console.say(&line).await?;
                }
            }
        }
    }

    async fn render_notes(&mut self, view: &Dashboard) -> io::Result<()> {
        if view.notes().is_empty() {
            return self.console.say("No notes yet. Add one!").await;
        }
        for (index, note) in view.notes().iter().enumerate() {
            let line = format!("{}. {}", index + 1, note.content);
            self.console.say(&line).await?;
        }
        Ok(())
    }

    async fn expired(&mut self, to: &'static str) -> Next {
        self.console
            .say("Your session has expired. Please sign in again.")
            .await?;
        Ok(Some(to))
    }
}

/// Id of the note shown as number `position` (1-based) by `list`.
fn note_at(view: &Dashboard, position: &str) -> Option<String> {
    let position: usize = position.trim().parse().ok()?;
    view.notes()
        .get(position.checked_sub(1)?)
        .map(|note| note.id.clone())
}
