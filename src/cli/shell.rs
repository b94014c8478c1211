//! Interactive shell subcommand.
//!
//! A line-oriented front end over [`TaskListView`]: every line is one UI
//! event, handled to completion before the next one is read.

use crate::error::TaskError;
use crate::gateway::TaskGateway;
use crate::types::{Filter, Task};
use crate::view::TaskListView;
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Commands:
  ls                         show tasks under the current filter
  add <title> [| details]    add a task
  toggle <id>                mark done / not done
  rm <id>                    delete a task
  edit <id>                  start editing a task
  title <id> <text>          set the edited title
  desc <id> <text>           set the edited description
  save <id>                  save edits
  cancel <id>                discard edits
  filter all|active|completed
  reload                     re-fetch tasks from the store
  help
  quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Add {
        title: String,
        description: Option<String>,
    },
    Toggle(i64),
    Delete(i64),
    Edit(i64),
    SetTitle(i64, String),
    SetDescription(i64, String),
    Save(i64),
    Cancel(i64),
    Filter(Filter),
    Reload,
    Help,
    Quit,
}

fn parse_id(arg: Option<&str>) -> Result<i64, String> {
    let arg = arg.map(str::trim).filter(|a| !a.is_empty());
    let arg = arg.ok_or_else(|| "missing task id".to_string())?;
    arg.parse()
        .map_err(|_| format!("'{}' is not a task id", arg))
}

/// Split `"<id> <text>"`.
fn parse_id_and_text(rest: &str) -> Result<(i64, String), String> {
    let rest = rest.trim_start();
    let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Ok((parse_id(Some(id))?, text.trim().to_string()))
}

/// Parse a line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let command = match verb.to_lowercase().as_str() {
        "ls" | "list" => ShellCommand::List,
        "add" => {
            let (title, description) = match rest.split_once('|') {
                Some((t, d)) => (t.trim(), Some(d.trim().to_string()).filter(|d| !d.is_empty())),
                None => (rest.trim(), None),
            };
            ShellCommand::Add {
                title: title.to_string(),
                description,
            }
        }
        "toggle" | "done" => ShellCommand::Toggle(parse_id(Some(rest))?),
        "rm" | "delete" => ShellCommand::Delete(parse_id(Some(rest))?),
        "edit" => ShellCommand::Edit(parse_id(Some(rest))?),
        "title" => {
            let (id, text) = parse_id_and_text(rest)?;
            ShellCommand::SetTitle(id, text)
        }
        "desc" => {
            let (id, text) = parse_id_and_text(rest)?;
            ShellCommand::SetDescription(id, text)
        }
        "save" => ShellCommand::Save(parse_id(Some(rest))?),
        "cancel" => ShellCommand::Cancel(parse_id(Some(rest))?),
        "filter" => ShellCommand::Filter(rest.parse()?),
        "reload" => ShellCommand::Reload,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

fn format_task<G: TaskGateway>(view: &TaskListView<G>, task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!("[{}] #{} {}", mark, task.id, task.title);
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(" - ");
        line.push_str(description);
    }
    if let Some(buffer) = view.edit_buffer(task.id) {
        line.push_str(&format!(
            "\n      editing: title={:?} desc={:?}",
            buffer.title, buffer.description
        ));
    }
    line
}

fn render_list<G: TaskGateway>(view: &TaskListView<G>) -> String {
    let visible = view.visible();
    if visible.is_empty() {
        return format!("No tasks found (filter: {})", view.filter());
    }
    visible
        .iter()
        .map(|t| format_task(view, t))
        .collect::<Vec<_>>()
        .join("\n")
}

fn failure(action: &str, err: &TaskError) -> String {
    format!("Failed to {}: {}", action, err)
}

/// Apply one command to the view and return the text to show.
///
/// Returns `None` for [`ShellCommand::Quit`].
pub async fn execute<G: TaskGateway>(
    view: &mut TaskListView<G>,
    command: ShellCommand,
) -> Option<String> {
    let output = match command {
        ShellCommand::List => render_list(view),
        ShellCommand::Add { title, description } => {
            view.set_new_title(title);
            view.set_new_description(description.unwrap_or_default());
            match view.submit().await {
                Ok(Some(task)) => format!("Added #{}", task.id),
                Ok(None) => "Title is required".to_string(),
                Err(e) => failure("add task", &e),
            }
        }
        ShellCommand::Toggle(id) => match view.toggle(id).await {
            Ok(task) if task.completed => format!("#{} done", task.id),
            Ok(task) => format!("#{} not done", task.id),
            Err(e) => failure("toggle task", &e),
        },
        ShellCommand::Delete(id) => match view.delete(id).await {
            Ok(()) => format!("Deleted #{}", id),
            Err(e) => failure("delete task", &e),
        },
        ShellCommand::Edit(id) => {
            if view.begin_edit(id) {
                format!("Editing #{}; use title/desc, then save or cancel", id)
            } else {
                format!("No task #{}", id)
            }
        }
        ShellCommand::SetTitle(id, text) => match view.edit_buffer_mut(id) {
            Some(buffer) => {
                buffer.title = text;
                format!("#{} title set", id)
            }
            None => format!("#{} is not being edited", id),
        },
        ShellCommand::SetDescription(id, text) => match view.edit_buffer_mut(id) {
            Some(buffer) => {
                buffer.description = text;
                format!("#{} description set", id)
            }
            None => format!("#{} is not being edited", id),
        },
        ShellCommand::Save(id) => {
            if !view.is_editing(id) {
                format!("#{} is not being edited", id)
            } else {
                match view.save_edit(id).await {
                    Ok(Some(_)) => format!("Saved #{}", id),
                    Ok(None) => "Title is required".to_string(),
                    Err(e) => failure("update task", &e),
                }
            }
        }
        ShellCommand::Cancel(id) => {
            if view.cancel_edit(id) {
                format!("Discarded edits to #{}", id)
            } else {
                format!("#{} is not being edited", id)
            }
        }
        ShellCommand::Filter(filter) => {
            view.set_filter(filter);
            render_list(view)
        }
        ShellCommand::Reload => match view.load().await {
            Ok(()) => render_list(view),
            Err(e) => failure("fetch tasks", &e),
        },
        ShellCommand::Help => HELP.to_string(),
        ShellCommand::Quit => return None,
    };
    Some(output)
}

/// Read commands from `input` until EOF or `quit`, writing responses to `out`.
pub async fn run<G, R, W>(view: &mut TaskListView<G>, input: R, out: &mut W) -> Result<()>
where
    G: TaskGateway,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", render_list(view))?;
    write!(out, "> ")?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(command)) => match execute(view, command).await {
                Some(output) => writeln!(out, "{}", output)?,
                None => break,
            },
            Ok(None) => {}
            Err(message) => writeln!(out, "{}", message)?,
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_description() {
        assert_eq!(
            parse_line("add Buy milk | 2 cartons").unwrap(),
            Some(ShellCommand::Add {
                title: "Buy milk".to_string(),
                description: Some("2 cartons".to_string()),
            })
        );
        assert_eq!(
            parse_line("add Walk dog").unwrap(),
            Some(ShellCommand::Add {
                title: "Walk dog".to_string(),
                description: None,
            })
        );
    }

    #[test]
    fn test_parse_id_commands() {
        assert_eq!(parse_line("toggle 4").unwrap(), Some(ShellCommand::Toggle(4)));
        assert_eq!(parse_line("RM 2").unwrap(), Some(ShellCommand::Delete(2)));
        assert_eq!(
            parse_line("title 3 Buy oat milk").unwrap(),
            Some(ShellCommand::SetTitle(3, "Buy oat milk".to_string()))
        );
        assert_eq!(
            parse_line("desc 3").unwrap(),
            Some(ShellCommand::SetDescription(3, String::new()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("toggle").is_err());
        assert!(parse_line("toggle abc").is_err());
        assert!(parse_line("filter archived").is_err());
        assert!(parse_line("frobnicate").is_err());
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_line("filter completed").unwrap(),
            Some(ShellCommand::Filter(Filter::Completed))
        );
    }
}
