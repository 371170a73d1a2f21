use std::io;

use crate::cli::CliConfig;
use crate::client::{HttpClient, TaskApi};
use crate::dashboard::Dashboard;
use crate::error::CliError;
use crate::models::Notice;
use crate::render::{self, Theme};
use crate::session::{Route, Session, View};

pub struct Repl {
    pub config: CliConfig,
    pub session: Session,
    view: View,
    dashboard: Option<Dashboard<HttpClient>>,
}

impl Repl {
    pub fn new(config: CliConfig, session: Session) -> Self {
        let view = session.resolve(Route::Other);
        Self {
            config,
            session,
            view,
            dashboard: None,
        }
    }

    fn theme(&self) -> Theme {
        Theme {
            dark: self.session.dark_mode(),
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config, self.theme());
        self.navigate(Route::Other);
        loop {
            render::prompt(self.view);
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.handle_text(&line);
        }
    }

    fn navigate(&mut self, route: Route) {
        self.view = self.session.resolve(route);
        if self.view != View::Dashboard {
            self.dashboard = None;
            return;
        }
        let client = match HttpClient::new(&self.config.base_url, self.session.token().map(str::to_string)) {
            Ok(client) => client,
            Err(err) => {
                render::error(&err.to_string());
                return;
            }
        };
        let mut dashboard = Dashboard::new(client);
        let failed = dashboard.load();
        self.dashboard = Some(dashboard);
        match failed {
            Some(notice) => self.after_action(notice),
            None => {
                self.show_profile();
                self.show_tasks();
            }
        }
    }

    /// Plain text adds a task, or saves the title of the task being edited.
    fn handle_text(&mut self, line: &str) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            render::info("log in first, type /help");
            return;
        };
        let notice = if dashboard.editing().is_some() {
            dashboard.save_edit(line)
        } else {
            dashboard.add(line)
        };
        self.after_action(notice);
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(self.view),
            "theme" => match self.session.toggle_dark_mode() {
                Ok(_) => render::info(&format!("theme: {}", self.theme().name())),
                Err(err) => render::error(&err.to_string()),
            },
            _ if self.view == View::Dashboard => self.dashboard_command(cmd, rest),
            _ => self.auth_command(cmd, rest),
        }
        false
    }

    fn auth_command(&mut self, cmd: &str, rest: &str) {
        match cmd {
            "login" => {
                if let Err(err) = self.login(rest) {
                    render::error(&err.to_string());
                }
            }
            "signup" => {
                self.view = self.session.resolve(Route::Signup);
                match self.signup(rest) {
                    Ok(()) => {
                        render::info("account created, log in with /login");
                        self.navigate(Route::Login);
                    }
                    Err(err) => render::error(&err.to_string()),
                }
            }
            _ => render::info("unknown command, type /help"),
        }
    }

    fn login(&mut self, rest: &str) -> Result<(), CliError> {
        let email = parse_login(rest)?;
        let password = read_secret("Password: ")?;
        let client = HttpClient::new(&self.config.base_url, None)?;
        let token = client.login(email, &password)?;
        self.session.set_token(token)?;
        self.navigate(Route::Dashboard);
        Ok(())
    }

    fn signup(&mut self, rest: &str) -> Result<(), CliError> {
        let (name, email) = parse_signup(rest)?;
        let password = read_secret("Password: ")?;
        let confirm = read_secret("Confirm Password: ")?;
        check_new_password(&password, &confirm)?;
        let client = HttpClient::new(&self.config.base_url, None)?;
        client.signup(&name, email, &password)
    }

    fn dashboard_command(&mut self, cmd: &str, rest: &str) {
        if cmd == "logout" {
            self.logout();
            return;
        }
        let Some(dashboard) = self.dashboard.as_mut() else {
            render::error("dashboard unavailable, try /logout");
            return;
        };
        match cmd {
            "tasks" => self.show_tasks(),
            "profile" => self.show_profile(),
            "refresh" => {
                if let Some(notice) = dashboard.load() {
                    self.after_action(notice);
                } else {
                    self.show_tasks();
                }
            }
            "add" => {
                let notice = dashboard.add(rest);
                self.after_action(notice);
            }
            "edit" => match dashboard.resolve(rest) {
                Some(id) => match dashboard.start_edit(&id) {
                    Ok(title) => render::info(&format!("editing {:?}, send /save <title> or /cancel", title)),
                    Err(notice) => render::notice(&notice),
                },
                None => render::error("no such task"),
            },
            "save" => {
                let notice = dashboard.save_edit(rest);
                self.after_action(notice);
            }
            "cancel" => {
                dashboard.cancel_edit();
                render::info("edit cancelled");
            }
            "delete" => {
                let Some(id) = dashboard.resolve(rest) else {
                    render::error("no such task");
                    return;
                };
                if !confirm("Are you sure you want to delete this task?") {
                    return;
                }
                let notice = dashboard.delete(&id);
                self.after_action(notice);
            }
            "search" => {
                dashboard.set_search(rest);
                self.show_tasks();
            }
            "clear" => {
                dashboard.clear_search();
                self.show_tasks();
            }
            _ => render::info("unknown command, type /help"),
        }
    }

    fn after_action(&mut self, notice: Notice) {
        render::notice(&notice);
        let expired = self
            .dashboard
            .as_ref()
            .map(|dashboard| dashboard.session_expired())
            .unwrap_or(false);
        if expired {
            render::info("session expired, please log in again");
            self.logout();
        } else if !notice.is_error() {
            self.show_tasks();
        }
    }

    /// Revokes the token server-side when possible, then forgets it locally
    /// either way.
    fn logout(&mut self) {
        if let Some(token) = self.session.token() {
            let revoked = HttpClient::new(&self.config.base_url, Some(token.to_string()))
                .and_then(|client| client.logout());
            if let Err(err) = revoked {
                tracing::debug!(error = %err, "server-side logout failed");
            }
        }
        if let Err(err) = self.session.logout() {
            render::error(&err.to_string());
        }
        self.navigate(Route::Login);
        render::info("logged out");
    }

    fn show_tasks(&self) {
        if let Some(dashboard) = &self.dashboard {
            render::tasks(
                &dashboard.visible(),
                dashboard.tasks().len(),
                dashboard.search(),
                dashboard.editing(),
                self.theme(),
            );
        }
    }

    fn show_profile(&self) {
        if let Some(dashboard) = &self.dashboard {
            render::profile(dashboard.profile(), self.theme());
        }
    }
}

fn confirm(question: &str) -> bool {
    render::info(&format!("{} [y/N]", question));
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Reads a line from the terminal without echoing it.
fn read_secret(prompt: &str) -> Result<String, CliError> {
    rpassword::prompt_password(prompt).map_err(CliError::Prompt)
}

fn parse_login(rest: &str) -> Result<&str, CliError> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(email), None) => Ok(email),
        _ => Err(CliError::Validation("usage: /login <email>".to_string())),
    }
}

/// The name may contain spaces, so the email is taken from the end.
fn parse_signup(rest: &str) -> Result<(String, &str), CliError> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    match words.split_last() {
        Some((email, name)) if !name.is_empty() => Ok((name.join(" "), *email)),
        _ => Err(CliError::Validation("usage: /signup <name> <email>".to_string())),
    }
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), CliError> {
    if password.chars().count() < 6 {
        return Err(CliError::Validation("Minimum length is 6".to_string()));
    }
    if password != confirm {
        return Err(CliError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_takes_only_the_email() {
        assert_eq!(parse_login("a@b.c").unwrap(), "a@b.c");
        assert!(parse_login("").is_err());
        // A password typed inline is refused rather than sent.
        assert!(parse_login("a@b.c secret1").is_err());
    }

    #[test]
    fn signup_name_may_have_spaces() {
        let (name, email) = parse_signup("Ada King Lovelace ada@example.com").unwrap();
        assert_eq!(name, "Ada King Lovelace");
        assert_eq!(email, "ada@example.com");
        assert!(parse_signup("ada@example.com").is_err());
        assert!(parse_signup("").is_err());
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let err = check_new_password("secret1", "secret2").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
        assert!(check_new_password("secret1", "secret1").is_ok());
    }

    #[test]
    fn short_password_is_rejected_before_confirmation() {
        let err = check_new_password("123", "123").unwrap_err();
        assert_eq!(err.to_string(), "Minimum length is 6");
    }
}
