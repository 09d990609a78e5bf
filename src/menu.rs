// Menu engine: an ordered set of keyed entries with exactly one role
// that can end the loop. A menu is built once, then run against a
// context that provides console I/O; entry actions receive that same
// context, so nested menus are ordinary recursion through an action.

use anyhow::Result;

use crate::console::Console;

pub type Action<Ctx> = Box<dyn FnMut(&mut Ctx) -> Result<()>>;

pub struct Entry<Ctx> {
    key: String,
    description: String,
    action: Action<Ctx>,
    is_exit: bool,
}

/// Configuration errors caught at build time, before the loop can run.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MenuError {
    /// Without an exit entry the run loop could never terminate.
    #[error("menu \"{0}\" has no exit entry")]
    NoExitEntry(String),
}

pub struct MenuBuilder<Ctx> {
    description: String,
    entries: Vec<Entry<Ctx>>,
    on_enter: Option<Action<Ctx>>,
}

impl<Ctx> MenuBuilder<Ctx> {
    pub fn entry(
        mut self,
        key: &str,
        description: &str,
        action: impl FnMut(&mut Ctx) -> Result<()> + 'static,
    ) -> Self {
        self.entries.push(Entry {
            key: key.to_string(),
            description: description.to_string(),
            action: Box::new(action),
            is_exit: false,
        });
        self
    }

    /// The designated exit entry: its action still runs once, then the
    /// loop terminates.
    pub fn exit_entry(
        mut self,
        key: &str,
        description: &str,
        action: impl FnMut(&mut Ctx) -> Result<()> + 'static,
    ) -> Self {
        self.entries.push(Entry {
            key: key.to_string(),
            description: description.to_string(),
            action: Box::new(action),
            is_exit: true,
        });
        self
    }

    /// Hook executed once when the menu starts, before the first prompt.
    pub fn on_enter(mut self, hook: impl FnMut(&mut Ctx) -> Result<()> + 'static) -> Self {
        self.on_enter = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<Menu<Ctx>, MenuError> {
        if !self.entries.iter().any(|e| e.is_exit) {
            return Err(MenuError::NoExitEntry(self.description));
        }
        Ok(Menu {
            description: self.description,
            entries: self.entries,
            on_enter: self.on_enter,
        })
    }
}

pub struct Menu<Ctx> {
    description: String,
    entries: Vec<Entry<Ctx>>,
    on_enter: Option<Action<Ctx>>,
}

impl<Ctx> Menu<Ctx> {
    pub fn builder(description: &str) -> MenuBuilder<Ctx> {
        MenuBuilder {
            description: description.to_string(),
            entries: Vec::new(),
            on_enter: None,
        }
    }
}

impl<Ctx: Console> Menu<Ctx> {
    /// Loop: show the options, read a key, dispatch. An unknown key
    /// re-prompts with no side effects; duplicate keys shadow (first
    /// match wins). Errors from actions or from reading input (the
    /// user's hard escape included) propagate out unchanged.
    pub fn run(&mut self, ctx: &mut Ctx) -> Result<()> {
        if let Some(hook) = self.on_enter.as_mut() {
            hook(ctx)?;
        }
        loop {
            ctx.print(&format!("*** {} ***", self.description));
            for entry in &self.entries {
                ctx.print(&format!("{}:\t{}", entry.key, entry.description));
            }
            let choice = ctx.read_line("? ")?;
            let Some(entry) = self.entries.iter_mut().find(|e| e.key == choice) else {
                ctx.print("Invalid selection. Please, try again.");
                continue;
            };
            (entry.action)(ctx)?;
            if entry.is_exit {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleError, ScriptedConsole};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn build_fails_without_exit_entry() {
        let result = Menu::<ScriptedConsole>::builder("MENU")
            .entry("1", "Only option", |_| Ok(()))
            .build();
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("menu \"MENU\" has no exit entry".to_string())
        );
    }

    #[test]
    fn normal_entry_runs_once_then_exit_terminates() {
        let hits = Rc::new(Cell::new(0));
        let in_action = Rc::clone(&hits);
        let mut menu = Menu::builder("MENU")
            .entry("1", "Do something", move |_: &mut ScriptedConsole| {
                in_action.set(in_action.get() + 1);
                Ok(())
            })
            .exit_entry("0", "Exit", |_| Ok(()))
            .build()
            .unwrap();

        let mut console = ScriptedConsole::new(["1", "0"]);
        menu.run(&mut console).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unknown_key_reprompts_without_side_effects() {
        let hits = Rc::new(Cell::new(0));
        let in_action = Rc::clone(&hits);
        let mut menu = Menu::builder("MENU")
            .entry("1", "Do something", move |_: &mut ScriptedConsole| {
                in_action.set(in_action.get() + 1);
                Ok(())
            })
            .exit_entry("0", "Exit", |_| Ok(()))
            .build()
            .unwrap();

        let mut console = ScriptedConsole::new(["X", "1", "0"]);
        menu.run(&mut console).unwrap();
        assert_eq!(console.printed("Invalid selection. Please, try again."), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn exit_action_still_runs_once() {
        let hits = Rc::new(Cell::new(0));
        let in_action = Rc::clone(&hits);
        let mut menu = Menu::builder("MENU")
            .exit_entry("0", "Logout", move |_: &mut ScriptedConsole| {
                in_action.set(in_action.get() + 1);
                Ok(())
            })
            .build()
            .unwrap();

        let mut console = ScriptedConsole::new(["0"]);
        menu.run(&mut console).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn on_enter_hook_runs_once_before_first_prompt() {
        let hits = Rc::new(Cell::new(0));
        let in_hook = Rc::clone(&hits);
        let mut menu = Menu::builder("MENU")
            .on_enter(move |console: &mut ScriptedConsole| {
                in_hook.set(in_hook.get() + 1);
                console.print("welcome");
                Ok(())
            })
            .exit_entry("0", "Exit", |_| Ok(()))
            .build()
            .unwrap();

        let mut console = ScriptedConsole::new(["0"]);
        menu.run(&mut console).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(console.output.first().map(String::as_str), Some("welcome"));
    }

    #[test]
    fn interrupted_input_propagates_out_of_the_loop() {
        let mut menu = Menu::builder("MENU")
            .exit_entry("0", "Exit", |_: &mut ScriptedConsole| Ok(()))
            .build()
            .unwrap();

        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let err = menu.run(&mut console).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConsoleError>(),
            Some(ConsoleError::Interrupted)
        ));
    }

    #[test]
    fn duplicate_keys_shadow_first_match_wins() {
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let in_first = Rc::clone(&first);
        let in_second = Rc::clone(&second);
        let mut menu = Menu::builder("MENU")
            .entry("1", "First", move |_: &mut ScriptedConsole| {
                in_first.set(in_first.get() + 1);
                Ok(())
            })
            .entry("1", "Second", move |_: &mut ScriptedConsole| {
                in_second.set(in_second.get() + 1);
                Ok(())
            })
            .exit_entry("0", "Exit", |_| Ok(()))
            .build()
            .unwrap();

        let mut console = ScriptedConsole::new(["1", "0"]);
        menu.run(&mut console).unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
    }
}
