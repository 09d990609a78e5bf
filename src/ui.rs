// Workflow layer: one method per user-facing operation, composing the
// domain types, the menu engine and the backend collaborator. The
// backend and the console are injected, so every flow runs unchanged
// against the real service or against test doubles.

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::api::Backend;
use crate::console::{Console, ConsoleError};
use crate::domain::{Email, Expiry, Label, LinkDraft, LinkRecord, LinkTarget, Password, Username};
use crate::menu::Menu;

/// Input format for expiry timestamps.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// yes/y/true/1 count as yes, anything else as no.
pub fn parse_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}

/// Render an ordered set of records as a fixed-width table, ordinals
/// assigned 1..N in sequence order. Pure display rules: long targets
/// and labels are truncated with an ellipsis, expiry shows as
/// DD/MM/YYYY HH:MM or N/A. An empty set yields a single notice.
pub fn format_links_table(records: &[LinkRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No URLs found.\n".to_string()];
    }
    let header = format!(
        "{:<4} | {:<10} | {:<50} | {:<20} | {:<7} | {:<20}",
        "N°", "CODE", "TARGET", "LABEL", "PRIVATE", "EXPIRE"
    );
    let rule = "*".repeat(header.chars().count());
    let mut lines = vec![rule.clone(), header, rule.clone()];
    for (i, record) in records.iter().enumerate() {
        let expire = record
            .expired_at
            .map_or_else(|| "N/A".to_string(), |t| t.format("%d/%m/%Y %H:%M").to_string());
        lines.push(format!(
            "{:<4} | {:<10} | {:<50} | {:<20} | {:<7} | {:<20}",
            i + 1,
            record.code,
            truncate(&record.target, 50, 47),
            truncate(&record.label, 20, 17),
            record.private,
            expire
        ));
    }
    lines.push(rule);
    lines.push(String::new());
    lines
}

fn truncate(text: &str, limit: usize, keep: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(keep).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// The interactive application: a backend session handle plus a
/// console, both caller-owned.
pub struct App<B, C> {
    backend: B,
    console: C,
}

// Menus prompt through their context, so the app forwards console
// calls to the console it owns.
impl<B, C: Console> Console for App<B, C> {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.console.read_line(prompt)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.console.read_secret(prompt)
    }

    fn print(&mut self, text: &str) {
        self.console.print(text)
    }
}

impl<B: Backend + 'static, C: Console + 'static> App<B, C> {
    pub fn new(backend: B, console: C) -> Self {
        Self { backend, console }
    }

    pub fn into_parts(self) -> (B, C) {
        (self.backend, self.console)
    }

    /// Top-level menu. Exiting logs out, so a session left open by a
    /// previous login is always closed.
    pub fn run(&mut self) -> Result<()> {
        let mut menu = Menu::builder("MENU")
            .entry("1", "Login", |app: &mut Self| app.do_login())
            .entry("2", "Registration", |app: &mut Self| app.do_register())
            .exit_entry("0", "Exit", |app: &mut Self| {
                app.do_logout();
                Ok(())
            })
            .build()?;
        menu.run(self)
    }

    fn do_login(&mut self) -> Result<()> {
        self.print("\n--- LOGIN ---");
        loop {
            let raw_user = self.read_line("Username: ")?;
            let user = match Username::new(raw_user) {
                Ok(u) => u,
                Err(e) => {
                    self.print(&format!("Error: {e}. Try again.\n"));
                    continue;
                }
            };

            let raw_pass = self.read_secret("Password")?;
            let pw = match Password::new(raw_pass) {
                Ok(p) => p,
                Err(e) => {
                    self.print(&format!("Error: {e}. Try again.\n"));
                    continue;
                }
            };

            if self.backend.login(&user, &pw) {
                self.print("\nLogin successful.");
                self.session_menu()?;
                return Ok(());
            }
            self.print("\nWrong username or password.");
        }
    }

    fn do_register(&mut self) -> Result<()> {
        self.print("\n--- REGISTRATION ---");
        loop {
            let raw_user = self.read_line("Username: ")?;
            let user = match Username::new(raw_user) {
                Ok(u) => u,
                Err(e) => {
                    self.print(&format!("Error: {e}. Try again.\n"));
                    continue;
                }
            };

            let raw_email = self.read_line("Email: ")?;
            let email = match Email::new(raw_email) {
                Ok(m) => m,
                Err(e) => {
                    self.print(&format!("Error: {e}. Try again.\n"));
                    continue;
                }
            };

            let raw_pw1 = self.read_secret("Password")?;
            let pw1 = match Password::new(raw_pw1) {
                Ok(p) => p,
                Err(e) => {
                    self.print(&format!("Error: {e}. Try again.\n"));
                    continue;
                }
            };

            let raw_pw2 = self.read_secret("Confirm password")?;
            let pw2 = match Password::new(raw_pw2) {
                Ok(p) => p,
                Err(e) => {
                    self.print(&format!("Error: {e}. Try again.\n"));
                    continue;
                }
            };

            if pw1 != pw2 {
                self.print("Passwords do not match. Try again.\n");
                continue;
            }

            if self.backend.register(&user, &pw1, &pw2, &email) {
                self.print("\nRegistration successful. You can now log in.");
                if self.backend.login(&user, &pw1) {
                    self.print("\nLogin successful.");
                    self.session_menu()?;
                    return Ok(());
                }
            } else {
                self.print("\nRegistration failed. Try again.");
            }
        }
    }

    fn do_logout(&mut self) {
        self.backend.logout();
        self.print("Logged out.\n");
    }

    fn session_menu(&mut self) -> Result<()> {
        self.print("\n============= USER MENU ==============");
        let mut menu = Menu::builder("USER OPTIONS")
            .entry("1", "CONVERT URL", |app: &mut Self| app.convert_url())
            .entry("2", "EDIT SHORT", |app: &mut Self| app.edit_menu())
            .entry("3", "DELETE URL", |app: &mut Self| app.delete_link())
            .entry("4", "CHRONOLOGY URL", |app: &mut Self| app.link_history())
            .entry("5", "EDIT USERNAME", |app: &mut Self| app.edit_username())
            .entry("6", "EDIT PASSWORD", |app: &mut Self| app.edit_password())
            .exit_entry("0", "BACK", |_: &mut Self| Ok(()))
            .build()?;
        menu.run(self)
    }

    fn edit_menu(&mut self) -> Result<()> {
        self.print("\n============= EDIT MENU ==============");
        let mut menu = Menu::builder("EDIT URL")
            .entry("1", "TARGET", |app: &mut Self| app.modify_target())
            .entry("2", "LABEL", |app: &mut Self| app.modify_label())
            .entry("3", "PRIVATE", |app: &mut Self| app.modify_visibility())
            .entry("4", "EXPIRE AT", |app: &mut Self| app.modify_expiry())
            .exit_entry("0", "BACK", |_: &mut Self| Ok(()))
            .build()?;
        menu.run(self)
    }

    fn convert_url(&mut self) -> Result<()> {
        self.print("\n--- URL CONVERSION ---");
        let raw_url = self.read_line("URL: ")?;
        let raw_label = self.read_line("Label: ")?;
        let expiry_str = self.read_line("Expiry Date and Time (YYYY-MM-DD HH:MM, optional): ")?;
        let private_answer = self.read_line("Private (yes/no): ")?;
        let private = parse_yes(&private_answer);

        // The date format has its own fixed message; field rules come
        // after, through the draft constructor.
        let expiry_when = if expiry_str.is_empty() {
            None
        } else {
            match NaiveDateTime::parse_from_str(&expiry_str, DATETIME_FORMAT) {
                Ok(t) => Some(t),
                Err(_) => {
                    self.print("Invalid date format. Use YYYY-MM-DD HH:MM\n");
                    return Ok(());
                }
            }
        };

        let draft = match LinkDraft::build(&raw_url, &raw_label, expiry_when, private) {
            Ok(d) => d,
            Err(e) => {
                self.print(&format!("Error in input: {e}"));
                return Ok(());
            }
        };

        let (ok, msg) = self.backend.create_link(&draft);
        if ok {
            self.print(&format!("Short URL created: {msg}\n"));
        } else {
            self.print(&format!("Conversion Error: {msg}\n"));
        }
        Ok(())
    }

    fn delete_link(&mut self) -> Result<()> {
        let records = match self.backend.list_links() {
            Ok(list) => list,
            Err(msg) => {
                self.print(&format!("Error fetching URLs: {msg}"));
                return Ok(());
            }
        };
        self.render_links(&records);

        let choice = self.read_line("Which URL do you want to delete? (number) ")?;
        let Ok(index) = choice.parse::<usize>() else {
            self.print("Enter valid number.");
            return Ok(());
        };
        if index == 0 || index > records.len() {
            self.print("Invalid number.");
            return Ok(());
        }
        let record = &records[index - 1];

        let confirm = self.read_line(&format!(
            "Are you sure you want to delete '{}'? (y/n): ",
            record.label
        ))?;
        if !matches!(confirm.to_ascii_lowercase().as_str(), "y" | "yes") {
            self.print("Deletion cancelled.");
            return Ok(());
        }

        let (ok, msg) = self.backend.delete_link(record);
        if ok {
            self.print(&msg);
        } else {
            self.print(&format!("Error: {msg}"));
        }
        Ok(())
    }

    fn link_history(&mut self) -> Result<()> {
        match self.backend.list_links() {
            Ok(list) => self.render_links(&list),
            Err(msg) => self.print(&format!("Error fetching URLs: {msg}")),
        }
        Ok(())
    }

    fn modify_target(&mut self) -> Result<()> {
        let Some(record) = self.select_link()? else {
            return Ok(());
        };
        let raw = self.read_line("Enter the new target: ")?;
        let target = match LinkTarget::new(raw) {
            Ok(t) => t,
            Err(_) => {
                self.print("Invalid target. Operation canceled.");
                return Ok(());
            }
        };
        if self.backend.edit_target(&record, &target) {
            self.print(&format!("Target successfully updated to: {target}"));
        } else {
            self.print("Error updating target");
        }
        Ok(())
    }

    fn modify_label(&mut self) -> Result<()> {
        let Some(record) = self.select_link()? else {
            return Ok(());
        };
        let raw = self.read_line("Enter the new label: ")?;
        let label = match Label::new(raw) {
            Ok(l) => l,
            Err(e) => {
                self.print(&format!("Error: {e}"));
                return Ok(());
            }
        };
        let (ok, msg) = self.backend.edit_label(&label, &record);
        if ok {
            self.print(&format!("Label successfully updated to: {label}"));
        } else {
            self.print(&format!("Error: {msg}"));
        }
        Ok(())
    }

    fn modify_visibility(&mut self) -> Result<()> {
        let Some(record) = self.select_link()? else {
            return Ok(());
        };
        let answer = self.read_line("Enter the new visibility (yes/no): ")?;
        let private = parse_yes(&answer);
        let (ok, msg) = self.backend.edit_visibility(&record, private);
        if ok {
            self.print("Visibility updated!");
        } else {
            self.print(&format!("Error: {msg}"));
        }
        Ok(())
    }

    fn modify_expiry(&mut self) -> Result<()> {
        let Some(record) = self.select_link()? else {
            return Ok(());
        };
        let raw =
            self.read_line("Enter the new expiration date (YYYY-MM-DD HH:MM) or 0 to cancel: ")?;
        if raw == "0" {
            return Ok(());
        }
        let when = match NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT) {
            Ok(t) => t,
            Err(_) => {
                self.print("Invalid date format. Use YYYY-MM-DD HH:MM");
                return Ok(());
            }
        };
        let expiry = match Expiry::at(when) {
            Ok(e) => e,
            Err(e) => {
                self.print(&format!("Error: {e}"));
                return Ok(());
            }
        };
        let (ok, msg) = self.backend.edit_expiry(&record, expiry.get());
        if ok {
            self.print("Updated expiration date!");
        } else {
            self.print(&format!("Error: {msg}"));
        }
        Ok(())
    }

    fn edit_username(&mut self) -> Result<()> {
        let raw = self.read_line("New Username: ")?;
        let new_username = match Username::new(raw) {
            Ok(u) => u,
            Err(e) => {
                self.print(&format!("Error: {e}"));
                return Ok(());
            }
        };
        let (ok, msg) = self.backend.edit_username(&new_username);
        if ok {
            self.print(&format!(
                "\nUsername Updated: {new_username}! Press enter to go back to the menu."
            ));
        } else {
            self.print(&format!("\nError: {msg}. Press enter to go back to the menu."));
        }
        self.read_line("")?;
        Ok(())
    }

    fn edit_password(&mut self) -> Result<()> {
        let raw_old = self.read_secret("Old password")?;
        let raw_new1 = self.read_secret("New password")?;
        let raw_new2 = self.read_secret("Confirm new password")?;
        let (old, new1, new2) = match (
            Password::new(raw_old),
            Password::new(raw_new1),
            Password::new(raw_new2),
        ) {
            (Ok(a), Ok(b), Ok(c)) => (a, b, c),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.print(&format!("Error: {e}"));
                return Ok(());
            }
        };
        let (ok, msg) = self.backend.edit_password(&old, &new1, &new2);
        if ok {
            self.print("\nPassword updated. Press enter to go back to the menu.");
        } else {
            self.print(&format!("\nError: {msg}. Press enter to go back to the menu."));
        }
        self.read_line("")?;
        Ok(())
    }

    /// Shared selection helper: fetch, show the table, read an ordinal.
    /// Any rejection yields "no selection" and the caller declines to
    /// proceed; nothing is mutated.
    fn select_link(&mut self) -> Result<Option<LinkRecord>> {
        let records = match self.backend.list_links() {
            Ok(list) => list,
            Err(msg) => {
                self.print(&format!("Error fetching URLs: {msg}"));
                return Ok(None);
            }
        };
        self.render_links(&records);

        let choice = self.read_line("Enter the URL number to edit: ")?;
        let Ok(index) = choice.parse::<usize>() else {
            self.print("Invalid input. Please enter a number.");
            return Ok(None);
        };
        if index == 0 || index > records.len() {
            self.print("Invalid choice. Number out of range.");
            return Ok(None);
        }
        Ok(records.into_iter().nth(index - 1))
    }

    fn render_links(&mut self, records: &[LinkRecord]) {
        for line in format_links_table(records) {
            self.print(&line);
        }
    }
}
