//! Interactive REPL
//!
//! Line-oriented loop accepting `command:: arguments`. Every command failure
//! is reported inline and the loop continues; only startup errors terminate
//! the process. Exit (and interrupt, handled by the binary) archives the
//! session into the cumulative history file.

use crate::agent::CodeAgent;
use crate::compose::extract_quoted_paths;
use crate::confirm::{format_preview, ConfirmationGate, Decision, TerminalResponses, UnsupportedAction};
use crate::error::AgentError;
use crate::session::Role;
use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::io::Write;

/// Lines shown per file in `compare` output.
const COMPARE_PREVIEW_LINES: usize = 20;

/// Entries shown in the `history` table.
const HISTORY_TABLE_ROWS: usize = 10;

/// Characters of entry content shown per `history` table row.
const HISTORY_CELL_CHARS: usize = 60;

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Read { path: String },
    Create { path: String },
    List { directory: String },
    Generate { instruction: String },
    Analyze { path: String, task: String },
    Plan { objective: String },
    Extend { template: String, description: String },
    Compare { left: String, right: String },
    History,
    Memory { action: String, argument: Option<String> },
    Clear,
    ModifyHint,
    Help,
    Exit,
}

/// Parse one input line. `Ok(None)` for blank lines; `Err` carries the usage
/// message to print before continuing the loop.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, args) = match line.split_once("::") {
        Some((name, args)) => (name.trim(), args.trim()),
        None => (line, ""),
    };
    let name = name.to_lowercase();

    // Bare words accepted without the `::` form.
    if !line.contains("::") {
        return match name.as_str() {
            "help" => Ok(Some(Command::Help)),
            "exit" | "quit" => Ok(Some(Command::Exit)),
            "history" => Ok(Some(Command::History)),
            "clear" => Ok(Some(Command::Clear)),
            "modify" => Ok(Some(Command::ModifyHint)),
            _ => Err("Commands use the form `command:: arguments`. Try `help`.".to_string()),
        };
    }

    match name.as_str() {
        "read" => require_args(args, "read:: <file>")
            .map(|path| Some(Command::Read { path: strip_quotes(path).to_string() })),
        "create" => require_args(args, "create:: <file>")
            .map(|path| Some(Command::Create { path: strip_quotes(path).to_string() })),
        "list" => Ok(Some(Command::List {
            directory: if args.is_empty() {
                ".".to_string()
            } else {
                strip_quotes(args).to_string()
            },
        })),
        "generate" => require_args(args, "generate:: <instruction>")
            .map(|instruction| Some(Command::Generate { instruction: instruction.to_string() })),
        "analyze" => {
            let (path, task) = split_head(args)
                .ok_or_else(|| "Usage: analyze:: <file> <task>".to_string())?;
            Ok(Some(Command::Analyze {
                path: strip_quotes(path).to_string(),
                task: task.to_string(),
            }))
        }
        "plan" => require_args(args, "plan:: <objective>")
            .map(|objective| Some(Command::Plan { objective: objective.to_string() })),
        "extend" => {
            let (template, description) = split_head(args)
                .ok_or_else(|| "Usage: extend:: <template file> <description>".to_string())?;
            Ok(Some(Command::Extend {
                template: strip_quotes(template).to_string(),
                description: description.to_string(),
            }))
        }
        "compare" => {
            let tokens: Vec<&str> = args.split_whitespace().collect();
            if tokens.len() != 2 {
                return Err("Usage: compare:: <file a> <file b>".to_string());
            }
            Ok(Some(Command::Compare {
                left: strip_quotes(tokens[0]).to_string(),
                right: strip_quotes(tokens[1]).to_string(),
            }))
        }
        "memory" => {
            let (action, argument) = match split_head(args) {
                Some((action, rest)) => (action.to_lowercase(), Some(rest.to_string())),
                None if args.is_empty() => ("summary".to_string(), None),
                None => (args.to_lowercase(), None),
            };
            Ok(Some(Command::Memory { action, argument }))
        }
        "help" => Ok(Some(Command::Help)),
        "exit" | "quit" => Ok(Some(Command::Exit)),
        "history" => Ok(Some(Command::History)),
        "clear" => Ok(Some(Command::Clear)),
        "modify" => Ok(Some(Command::ModifyHint)),
        other => Err(format!("Unknown command: {}. Try `help`.", other)),
    }
}

fn require_args<'a>(args: &'a str, usage: &str) -> Result<&'a str, String> {
    if args.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(args)
    }
}

/// Split the first whitespace-delimited token from the remainder.
fn split_head(args: &str) -> Option<(&str, &str)> {
    let args = args.trim();
    let (head, rest) = args.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    Some((head, rest))
}

/// Drop one pair of surrounding double quotes, if present.
fn strip_quotes(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// Read one raw line from stdin. `Ok(None)` on EOF.
fn read_raw_line() -> Result<Option<String>, AgentError> {
    let mut line = String::new();
    let read = std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| AgentError::Config(format!("Failed to read input: {}", e)))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// The interactive session loop.
pub struct Repl {
    agent: CodeAgent,
    gate: ConfirmationGate<TerminalResponses>,
}

impl Repl {
    pub fn new(agent: CodeAgent) -> Self {
        Self {
            agent,
            gate: ConfirmationGate::new(),
        }
    }

    /// Run until `exit` or EOF, archiving the session on the way out.
    pub async fn run(&mut self) -> Result<(), AgentError> {
        self.print_banner();
        loop {
            print!("{} ", "blink>".cyan().bold());
            let _ = std::io::stdout().flush();

            let Some(line) = read_raw_line()? else {
                break;
            };
            match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Exit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.dispatch(command).await {
                        println!("{} {}", "[ERROR]".red().bold(), e);
                    }
                }
                Err(usage) => println!("{}", usage),
            }
        }

        self.agent.log().lock().archive();
        println!("Session saved. Goodbye.");
        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> Result<(), AgentError> {
        match command {
            Command::Read { path } => self.handle_read(&path),
            Command::Create { path } => self.handle_create(&path),
            Command::List { directory } => self.handle_list(&directory),
            Command::Generate { instruction } => self.handle_generate(&instruction).await,
            Command::Analyze { path, task } => self.handle_analyze(&path, &task).await,
            Command::Plan { objective } => self.handle_plan(&objective).await,
            Command::Extend { template, description } => {
                self.handle_extend(&template, &description).await
            }
            Command::Compare { left, right } => self.handle_compare(&left, &right),
            Command::History => self.handle_history(),
            Command::Memory { action, argument } => self.handle_memory(&action, argument.as_deref()),
            Command::Clear => self.handle_clear(),
            Command::ModifyHint => {
                println!(
                    "There is no direct modify command. Use generate:: or analyze:: and accept \
                     the result."
                );
                Ok(())
            }
            Command::Help => {
                self.print_help();
                Ok(())
            }
            Command::Exit => Ok(()),
        }
    }

    fn handle_read(&mut self, path: &str) -> Result<(), AgentError> {
        match self.agent.store().read(path)? {
            Some(content) => {
                let lines = content.lines().count();
                println!("\n{} {} ({} lines)", "FILE:".cyan().bold(), path, lines);
                println!("{}", content);

                let log = self.agent.log();
                let mut log = log.lock();
                log.append(Role::User, path, Some("read"), BTreeMap::new())?;
                log.append(
                    Role::Assistant,
                    format!("Displayed {} ({} lines)", path, lines),
                    Some("read"),
                    BTreeMap::new(),
                )?;
                log.set_context("last_read_file", path)?;
            }
            None => println!("File not found: {}", path),
        }
        Ok(())
    }

    fn handle_create(&mut self, path: &str) -> Result<(), AgentError> {
        println!(
            "Enter content for {} (finish with a line containing only END):",
            path
        );
        let mut collected = Vec::new();
        loop {
            match read_raw_line()? {
                None => break,
                Some(line) if line.trim() == "END" => break,
                Some(line) => collected.push(line),
            }
        }
        let content = if collected.is_empty() {
            String::new()
        } else {
            collected.join("\n") + "\n"
        };

        match self.gate.confirm(&format!("create {}", path), Some(&content))? {
            Decision::Accepted => {
                let written = self.agent.store().write(path, &content)?;
                println!("{} {}", "Created".green(), written.display());

                let log = self.agent.log();
                let mut log = log.lock();
                log.append(Role::User, path, Some("create"), BTreeMap::new())?;
                log.append(
                    Role::Assistant,
                    format!("Created {} ({} lines)", path, collected.len()),
                    Some("create"),
                    BTreeMap::new(),
                )?;
                log.set_context("last_created_file", path)?;
            }
            Decision::Rejected => println!("Discarded, nothing written."),
            Decision::Unsupported(action) => print_unsupported(action),
        }
        Ok(())
    }

    fn handle_list(&mut self, directory: &str) -> Result<(), AgentError> {
        let files = self.agent.store().list(directory)?;
        let dirs = self.agent.store().list_dirs(directory)?;
        if files.is_empty() && dirs.is_empty() {
            println!("{} is empty.", directory);
            return Ok(());
        }

        let mut table = comfy_table::Table::new();
        table.set_header(vec!["Name", "Kind"]);
        for dir in &dirs {
            table.add_row(vec![dir.as_str(), "directory"]);
        }
        for file in &files {
            table.add_row(vec![file.as_str(), "file"]);
        }
        println!("{table}");
        Ok(())
    }

    async fn handle_generate(&mut self, instruction: &str) -> Result<(), AgentError> {
        let paths = extract_quoted_paths(instruction);
        println!("Generating...");
        let code = self.agent.generate_with_context(instruction, &paths).await?;

        println!("\n{}", "GENERATED:".cyan().bold());
        println!("{}", code);

        {
            let log = self.agent.log();
            let mut log = log.lock();
            log.append(Role::User, instruction, Some("generate"), BTreeMap::new())?;
            log.append(Role::Assistant, code.clone(), Some("generate"), BTreeMap::new())?;
        }

        match self.gate.confirm("save the generated code to a file", Some(&code))? {
            Decision::Accepted => self.save_to_prompted_path(&code)?,
            Decision::Rejected => println!("Discarded, nothing written."),
            Decision::Unsupported(action) => print_unsupported(action),
        }
        Ok(())
    }

    async fn handle_analyze(&mut self, path: &str, task: &str) -> Result<(), AgentError> {
        println!("Analyzing {}...", path);
        let Some(analysis) = self.agent.analyze_file(path, task).await? else {
            println!("File not found: {}", path);
            return Ok(());
        };

        println!("\n{}", "ANALYSIS:".cyan().bold());
        println!("{}", analysis);

        {
            let log = self.agent.log();
            let mut log = log.lock();
            log.append(
                Role::User,
                format!("{} {}", path, task),
                Some("analyze"),
                BTreeMap::new(),
            )?;
            log.append(Role::Assistant, analysis.clone(), Some("analyze"), BTreeMap::new())?;
        }

        match self
            .gate
            .confirm(&format!("overwrite {} with this output", path), Some(&analysis))?
        {
            Decision::Accepted => {
                self.agent.store().modify(path, &analysis)?;
                println!("{} {}", "Updated".green(), path);
                self.agent.log().lock().set_context("last_modified_file", path)?;
            }
            Decision::Rejected => {
                print!("Save to a different path instead (blank to skip): ");
                let _ = std::io::stdout().flush();
                match read_raw_line()? {
                    Some(alt) if !alt.trim().is_empty() => {
                        let alt = strip_quotes(&alt).to_string();
                        match self.gate.confirm(&format!("create {}", alt), None)? {
                            Decision::Accepted => {
                                let written = self.agent.store().write(&alt, &analysis)?;
                                println!("{} {}", "Created".green(), written.display());
                                self.agent.log().lock().set_context("last_created_file", &alt)?;
                            }
                            Decision::Rejected => println!("Discarded, nothing written."),
                            Decision::Unsupported(action) => print_unsupported(action),
                        }
                    }
                    _ => println!("Nothing written."),
                }
            }
            Decision::Unsupported(action) => print_unsupported(action),
        }
        Ok(())
    }

    async fn handle_plan(&mut self, objective: &str) -> Result<(), AgentError> {
        println!("Planning...");
        let steps = self.agent.plan(objective).await?;
        if steps.is_empty() {
            println!("No plan steps returned.");
            return Ok(());
        }

        println!("\n{}", "PLAN:".cyan().bold());
        for (index, step) in steps.iter().enumerate() {
            println!("  {}. {}", index + 1, step);
        }

        {
            let log = self.agent.log();
            let mut log = log.lock();
            log.append(Role::User, objective, Some("plan"), BTreeMap::new())?;
            log.append(Role::Assistant, steps.join("\n"), Some("plan"), BTreeMap::new())?;
        }

        match self.gate.confirm("adopt this plan", None)? {
            Decision::Accepted => println!("Plan accepted."),
            Decision::Rejected => println!("Plan discarded."),
            Decision::Unsupported(action) => print_unsupported(action),
        }
        Ok(())
    }

    async fn handle_extend(&mut self, template: &str, description: &str) -> Result<(), AgentError> {
        println!("Extending {}...", template);
        let Some(code) = self.agent.extend_template(template, description).await? else {
            println!("Template not found: {}", template);
            return Ok(());
        };

        println!("\n{}", "GENERATED:".cyan().bold());
        println!("{}", code);

        {
            let log = self.agent.log();
            let mut log = log.lock();
            log.append(
                Role::User,
                format!("{} {}", template, description),
                Some("extend"),
                BTreeMap::new(),
            )?;
            log.append(Role::Assistant, code.clone(), Some("extend"), BTreeMap::new())?;
        }

        match self.gate.confirm("save the extended code to a file", Some(&code))? {
            Decision::Accepted => self.save_to_prompted_path(&code)?,
            Decision::Rejected => println!("Discarded, nothing written."),
            Decision::Unsupported(action) => print_unsupported(action),
        }
        Ok(())
    }

    fn handle_compare(&mut self, left: &str, right: &str) -> Result<(), AgentError> {
        let Some(left_content) = self.agent.store().read(left)? else {
            println!("File not found: {}", left);
            return Ok(());
        };
        let Some(right_content) = self.agent.store().read(right)? else {
            println!("File not found: {}", right);
            return Ok(());
        };

        let mut table = comfy_table::Table::new();
        table.set_header(vec![left, right]);
        table.add_row(vec![
            format_preview(&left_content, COMPARE_PREVIEW_LINES),
            format_preview(&right_content, COMPARE_PREVIEW_LINES),
        ]);
        println!("{table}");
        Ok(())
    }

    fn handle_history(&mut self) -> Result<(), AgentError> {
        let log = self.agent.log();
        let log = log.lock();
        let summary = log.summary();
        println!(
            "Session: {} entries, {} from you, {} context keys",
            summary.total, summary.user_messages, summary.context_entries
        );
        if !summary.commands.is_empty() {
            let counts: Vec<String> = summary
                .commands
                .iter()
                .map(|(command, count)| format!("{} x{}", command, count))
                .collect();
            println!("Commands: {}", counts.join(", "));
        }

        let entries = log.entries();
        if entries.is_empty() {
            return Ok(());
        }
        let start = entries.len().saturating_sub(HISTORY_TABLE_ROWS);
        let mut table = comfy_table::Table::new();
        table.set_header(vec!["Time", "Role", "Command", "Content"]);
        for entry in &entries[start..] {
            let preview: String = entry.content.chars().take(HISTORY_CELL_CHARS).collect();
            let ellipsis = if entry.content.chars().count() > HISTORY_CELL_CHARS {
                "..."
            } else {
                ""
            };
            table.add_row(vec![
                entry.timestamp.format("%H:%M:%S").to_string(),
                entry.role.label().to_string(),
                entry.command.clone().unwrap_or_else(|| "-".to_string()),
                format!("{}{}", preview, ellipsis),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    fn handle_memory(&mut self, action: &str, argument: Option<&str>) -> Result<(), AgentError> {
        match action {
            "summary" => self.handle_history(),
            "history" => {
                let context = self.agent.log().lock().recent_context(HISTORY_TABLE_ROWS);
                println!("{}", context);
                Ok(())
            }
            "clear" => self.handle_clear(),
            "export" => {
                let target = argument.unwrap_or("conversation_export.md");
                let resolved = self.agent.store().resolve(target);
                let written = self.agent.log().lock().export(&resolved)?;
                println!("Exported to {}", written.display());
                Ok(())
            }
            other => {
                println!(
                    "Unknown memory action: {}. Use summary, history, clear, or export.",
                    other
                );
                Ok(())
            }
        }
    }

    fn handle_clear(&mut self) -> Result<(), AgentError> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Clear the current session?")
            .default(false)
            .interact()
            .map_err(|e| AgentError::Config(format!("Failed to get user input: {}", e)))?;
        if confirmed {
            self.agent.log().lock().clear()?;
            println!("Session cleared.");
        } else {
            println!("Session kept.");
        }
        Ok(())
    }

    /// Prompt for a target path and write accepted content there. The accept
    /// that led here covers the write.
    fn save_to_prompted_path(&mut self, content: &str) -> Result<(), AgentError> {
        print!("Save to path: ");
        let _ = std::io::stdout().flush();
        match read_raw_line()? {
            Some(path) if !path.trim().is_empty() => {
                let path = strip_quotes(&path).to_string();
                let written = self.agent.store().write(&path, content)?;
                println!("{} {}", "Saved".green(), written.display());
                self.agent.log().lock().set_context("last_created_file", &path)?;
            }
            _ => println!("No path given, nothing written."),
        }
        Ok(())
    }

    fn print_banner(&self) {
        println!("{}", "Blink - conversational code generation".cyan().bold());
        println!("Workspace: {}", self.agent.store().root().display());
        println!("Type `help` for commands, `exit` to leave.\n");
    }

    fn print_help(&self) {
        println!("Commands use the form `command:: arguments`:");
        println!("  read:: <file>                     show a workspace file");
        println!("  create:: <file>                   enter content, then confirm the write");
        println!("  list:: [directory]                list files and directories");
        println!("  generate:: <instruction>          generate code; quote paths to include them");
        println!("  analyze:: <file> <task>           transform a file, optionally overwrite it");
        println!("  plan:: <objective>                ask for ordered steps, then confirm");
        println!("  extend:: <template> <description> re-target a template into a new file");
        println!("  compare:: <file a> <file b>       side-by-side preview of two files");
        println!("  history                           session summary and recent entries");
        println!("  memory:: summary|history|clear|export [path]");
        println!("  clear                             discard the current session");
        println!("  help, exit");
    }
}

fn print_unsupported(action: UnsupportedAction) {
    let name = match action {
        UnsupportedAction::Edit => "edit",
        UnsupportedAction::Undo => "undo",
    };
    println!("{} is not available yet; nothing was committed.", name);
}
