//! Line Shell
//!
//! Parses one command per line and runs it through the command layer.

use std::str::FromStr;

use counter_core::{Board, Container, Counter, CounterEdit, Goal, MoveOutcome};
use drag_tracker::DropTarget;

use crate::commands::{self, container_of};
use crate::session::{DropOutcome, InteractionSession};
use crate::AppState;

pub const HELP: &str = "\
commands:
  list [query]                             show the board
  show <id>                                one counter in detail
  collections                              collections in order
  add <name> [collection-id] [--step N]    new counter (pool by default)
  collection <name>                        new collection
  inc <id> | dec <id>                      step a counter
  set <id> <value>                         overwrite a value
  edit <id> name|theme <text>
  edit <id> step|daily <n>
  edit <id> notes|icon <text|none>
  edit <id> goal <target> [up|down] | goal none
  move <id> <pool|collection-id> <index>   move a counter
  reorder <pool|collection-id> <from> <to> reorder inside a container
  move-collection <from> <to>              reorder collections
  drop <payload> <pool|collection-id> <gap>
  delete <id> | delete-collection <id>
  rename <collection-id> <name>
  toggle <collection-id>
  repair | help | quit";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List(Option<String>),
    Show(u32),
    Collections,
    Add { name: String, collection: Option<u32>, step: Option<u32> },
    Collection(String),
    Inc(u32),
    Dec(u32),
    Set(u32, i64),
    Edit(u32, CounterEdit),
    Move { id: u32, collection: Option<u32>, index: usize },
    Reorder { collection: Option<u32>, from: usize, to: usize },
    MoveCollection { from: usize, to: usize },
    Drop { payload: String, collection: Option<u32>, index: usize },
    Delete(u32),
    DeleteCollection(u32),
    Rename(u32, String),
    Toggle(u32),
    Repair,
    Help,
    Quit,
}

/// What the loop should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue(String),
    Quit,
}

fn number<T: FromStr>(token: Option<&&str>, what: &str) -> Result<T, String> {
    let token = token.ok_or_else(|| format!("missing {}", what))?;
    token
        .parse()
        .map_err(|_| format!("invalid {}: {}", what, token))
}

/// `pool` or a collection id
fn container_arg(token: Option<&&str>) -> Result<Option<u32>, String> {
    match token {
        Some(t) if t.eq_ignore_ascii_case("pool") => Ok(None),
        other => number(other, "container").map(Some),
    }
}

fn rest(tokens: &[&str], what: &str) -> Result<String, String> {
    if tokens.is_empty() {
        return Err(format!("missing {}", what));
    }
    Ok(tokens.join(" "))
}

fn parse_add(args: &[&str]) -> Result<Command, String> {
    let mut step = None;
    let mut words = Vec::new();
    let mut tokens = args.iter();
    while let Some(token) = tokens.next() {
        if *token == "--step" {
            step = Some(number(tokens.next(), "step")?);
        } else {
            words.push(*token);
        }
    }

    // a trailing number names the collection
    let (name, collection) = match words.split_last() {
        Some((last, name)) if !name.is_empty() && last.parse::<u32>().is_ok() => {
            (name.join(" "), Some(number(Some(last), "collection")?))
        }
        _ => (rest(&words, "name")?, None),
    };
    Ok(Command::Add { name, collection, step })
}

/// Text, or `none` to clear
fn optional_text(values: &[&str]) -> Result<Option<String>, String> {
    let text = rest(values, "value")?;
    Ok(if text.eq_ignore_ascii_case("none") { None } else { Some(text) })
}

fn parse_goal(values: &[&str]) -> Result<Option<Goal>, String> {
    if values.first().is_some_and(|v| v.eq_ignore_ascii_case("none")) {
        return Ok(None);
    }
    let target: i64 = number(values.first(), "goal")?;
    match values.get(1).map(|d| d.to_ascii_lowercase()).as_deref() {
        None | Some("up") | Some("increasing") => Ok(Some(Goal::increasing(target))),
        Some("down") | Some("decreasing") => Ok(Some(Goal::decreasing(target))),
        Some(other) => Err(format!("invalid goal direction: {}", other)),
    }
}

fn parse_edit(args: &[&str]) -> Result<Command, String> {
    let id = number(args.first(), "id")?;
    let field = args.get(1).ok_or("missing field")?.to_ascii_lowercase();
    let values = args.get(2..).unwrap_or(&[]);

    let mut edit = CounterEdit::default();
    match field.as_str() {
        "name" => edit.name = Some(rest(values, "name")?),
        "step" => edit.step = Some(number(values.first(), "step")?),
        "daily" => edit.daily_increment = Some(number(values.first(), "daily increment")?),
        "goal" => edit.goal = Some(parse_goal(values)?),
        "notes" => edit.notes = Some(optional_text(values)?),
        "icon" => edit.icon_name = Some(optional_text(values)?),
        "theme" => edit.theme_name = Some(rest(values, "theme")?),
        other => return Err(format!("unknown field: {}", other)),
    }
    Ok(Command::Edit(id, edit))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((head, args)) = tokens.split_first() else {
            return Err("empty command".to_string());
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List((!args.is_empty()).then(|| args.join(" "))),
            "show" => Command::Show(number(args.first(), "id")?),
            "collections" => Command::Collections,
            "add" => parse_add(args)?,
            "edit" => parse_edit(args)?,
            "collection" => Command::Collection(rest(args, "name")?),
            "inc" => Command::Inc(number(args.first(), "id")?),
            "dec" => Command::Dec(number(args.first(), "id")?),
            "set" => Command::Set(number(args.first(), "id")?, number(args.get(1), "value")?),
            "move" => Command::Move {
                id: number(args.first(), "id")?,
                collection: container_arg(args.get(1))?,
                index: number(args.get(2), "index")?,
            },
            "reorder" => Command::Reorder {
                collection: container_arg(args.first())?,
                from: number(args.get(1), "from")?,
                to: number(args.get(2), "to")?,
            },
            "move-collection" => Command::MoveCollection {
                from: number(args.first(), "from")?,
                to: number(args.get(1), "to")?,
            },
            "drop" => Command::Drop {
                payload: args.first().ok_or("missing payload")?.to_string(),
                collection: container_arg(args.get(1))?,
                index: number(args.get(2), "index")?,
            },
            "delete" | "rm" => Command::Delete(number(args.first(), "id")?),
            "delete-collection" => Command::DeleteCollection(number(args.first(), "id")?),
            "rename" => Command::Rename(number(args.first(), "id")?, rest(args.get(1..).unwrap_or(&[]), "name")?),
            "toggle" => Command::Toggle(number(args.first(), "id")?),
            "repair" => Command::Repair,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command: {} (try help)", other)),
        };
        Ok(command)
    }
}

fn describe_counter(counter: &Counter) -> String {
    let mut line = format!("  #{} {} = {}", counter.id, counter.name, counter.value);
    if let Some(goal) = &counter.goal {
        line.push_str(&format!(
            " (goal {} {}, {:.0}%)",
            goal.direction.as_str(),
            goal.target_value,
            counter.progress() * 100.0
        ));
    }
    line
}

/// Text rendering of the board; collapsed sections only show their size
pub fn render_board(board: &Board) -> String {
    let mut lines = vec![format!("Pool ({})", board.pool.len())];
    lines.extend(board.pool.iter().map(describe_counter));
    for section in &board.sections {
        let marker = if section.collection.is_expanded { "-" } else { "+" };
        lines.push(format!(
            "{} [{}] {} ({})",
            marker,
            section.collection.id,
            section.collection.name,
            section.counters.len()
        ));
        if section.collection.is_expanded {
            lines.extend(section.counters.iter().map(describe_counter));
        }
    }
    lines.join("\n")
}

fn describe_details(counter: &Counter) -> String {
    let mut lines = vec![
        describe_counter(counter),
        format!(
            "    in {}, step {}, daily {}, theme {}",
            Container::from(counter.collection),
            counter.step,
            counter.daily_increment,
            counter.theme_name
        ),
    ];
    if let Some(notes) = &counter.notes {
        lines.push(format!("    notes: {}", notes));
    }
    lines.join("\n")
}

fn describe_move(outcome: MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Moved => "moved".to_string(),
        MoveOutcome::Unchanged => "unchanged".to_string(),
        MoveOutcome::OutOfRange => "ignored: index out of range".to_string(),
    }
}

/// Run one parsed command
pub async fn execute(
    state: &AppState,
    session: &InteractionSession,
    command: Command,
) -> Result<Flow, String> {
    let reply = match command {
        Command::List(query) => render_board(&commands::list_board(state, query).await?),
        Command::Show(id) => {
            let counter = commands::get_counter(state, id)
                .await?
                .ok_or_else(|| format!("counter #{} not found", id))?;
            describe_details(&counter)
        }
        Command::Collections => {
            let collections = commands::list_collections(state).await?;
            if collections.is_empty() {
                "no collections".to_string()
            } else {
                collections
                    .iter()
                    .map(|c| format!("[{}] {}", c.id, c.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Add { name, collection, step } => {
            let counter = commands::create_counter(state, name, collection, step).await?;
            format!("created counter #{} in {}", counter.id, Container::from(counter.collection))
        }
        Command::Collection(name) => {
            let collection = commands::create_collection(state, name, None).await?;
            format!("created collection [{}] {}", collection.id, collection.name)
        }
        Command::Inc(id) => describe_counter(&commands::increment_counter(state, id).await?),
        Command::Dec(id) => describe_counter(&commands::decrement_counter(state, id).await?),
        Command::Set(id, value) => {
            describe_counter(&commands::set_counter_value(state, id, value).await?)
        }
        Command::Edit(id, edit) => describe_counter(&commands::edit_counter(state, id, edit).await?),
        Command::Move { id, collection, index } => {
            describe_move(commands::move_counter(state, id, collection, index).await?)
        }
        Command::Reorder { collection, from, to } => {
            describe_move(commands::reorder_counters(state, collection, from, to).await?)
        }
        Command::MoveCollection { from, to } => {
            describe_move(commands::move_collection(state, from, to).await?)
        }
        Command::Drop { payload, collection, index } => {
            let target = DropTarget { container: container_of(collection), index };
            let outcome = session
                .drop_payload(payload, target)
                .await
                .map_err(|e| format!("drop task failed: {}", e))?;
            match outcome {
                DropOutcome::Applied(outcome) => describe_move(outcome),
                DropOutcome::Rejected => "ignored: nothing to drop".to_string(),
                DropOutcome::Cancelled => "cancelled".to_string(),
                DropOutcome::Failed(e) => return Err(e),
            }
        }
        Command::Delete(id) => {
            commands::delete_counter(state, id).await?;
            format!("deleted counter #{}", id)
        }
        Command::DeleteCollection(id) => {
            commands::delete_collection(state, id).await?;
            format!("deleted collection [{}]", id)
        }
        Command::Rename(id, name) => {
            let collection = commands::rename_collection(state, id, name).await?;
            format!("renamed [{}] to {}", collection.id, collection.name)
        }
        Command::Toggle(id) => {
            let expanded = commands::toggle_collection(state, id).await?;
            format!("[{}] {}", id, if expanded { "expanded" } else { "collapsed" })
        }
        Command::Repair => {
            let rewritten = commands::repair_orders(state).await?;
            format!("repaired {} entities", rewritten)
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Flow::Quit),
    };
    Ok(Flow::Continue(reply))
}
