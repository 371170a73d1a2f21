use std::io::{self, Write};

use crate::cli::CliConfig;
use crate::models::{Notice, NoticeLevel, Profile, TaskInfo};
use crate::session::View;

const RESET: &str = "\x1b[0m";

/// ANSI palette picked by the session's dark-mode flag.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub dark: bool,
}

impl Theme {
    fn accent(&self) -> &'static str {
        if self.dark {
            "\x1b[96m"
        } else {
            "\x1b[34m"
        }
    }

    fn muted(&self) -> &'static str {
        if self.dark {
            "\x1b[37m"
        } else {
            "\x1b[90m"
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        format!("{}{}{}", color, text, RESET)
    }

    pub fn name(&self) -> &'static str {
        if self.dark {
            "dark"
        } else {
            "light"
        }
    }
}

pub fn banner(cfg: &CliConfig, theme: Theme) {
    println!("{}", theme.paint(theme.accent(), "Task Tracker"));
    println!("API: {}", cfg.base_url);
    println!("Theme: {}", theme.name());
    println!("Type /help for commands.");
}

pub fn prompt(view: View) {
    let label = match view {
        View::Login => "login",
        View::Signup => "signup",
        View::Dashboard => "tasks",
    };
    print!("{}> ", label);
    let _ = io::stdout().flush();
}

pub fn help(view: View) {
    println!("Commands:");
    match view {
        View::Login | View::Signup => {
            println!("  /login <email>         Log in, the password is prompted");
            println!("  /signup <name> <email> Create an account");
        }
        View::Dashboard => {
            println!("  /tasks                 List tasks matching the search");
            println!("  /add <title>           Add a task");
            println!("  /edit <n|id>           Start editing a task");
            println!("  /save <title>          Save the task being edited");
            println!("  /cancel                Stop editing");
            println!("  /delete <n|id>         Delete a task");
            println!("  /search <term>         Filter tasks by title");
            println!("  /clear                 Clear the search");
            println!("  /profile               Show your profile");
            println!("  /refresh               Reload profile and tasks");
            println!("  /logout                Log out");
        }
    }
    println!("  /theme                 Toggle dark mode");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
}

pub fn profile(profile: Option<&Profile>, theme: Theme) {
    match profile {
        Some(p) => {
            println!("{}", theme.paint(theme.accent(), &format!("Welcome, {}", p.name)));
            println!("Email: {}", p.email);
        }
        None => println!("profile not loaded"),
    }
}

pub fn tasks(visible: &[&TaskInfo], total: usize, search: &str, editing: Option<&str>, theme: Theme) {
    if !search.is_empty() {
        let line = format!("search: {:?} ({} of {})", search, visible.len(), total);
        println!("{}", theme.paint(theme.muted(), &line));
    }
    if visible.is_empty() {
        println!("{}", theme.paint(theme.muted(), "No tasks match your search."));
        return;
    }
    for (idx, task) in visible.iter().enumerate() {
        let marker = if editing == Some(task.id.as_str()) { "*" } else { " " };
        println!(
            "{}{:>3}. [{}] {} {}",
            marker,
            idx + 1,
            task.status,
            task.title,
            theme.paint(theme.muted(), &task.id)
        );
        if let Some(description) = &task.description {
            println!("       {}", theme.paint(theme.muted(), description));
        }
    }
}

pub fn notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("\x1b[32m{}{}", notice.message, RESET),
        NoticeLevel::Error => eprintln!("\x1b[31merror: {}{}", notice.message, RESET),
    }
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
