// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

// Allowed: the shell talks to the user on stdout/stderr.
#![allow(clippy::disallowed_macros)]

use anyhow::{anyhow, bail, Context as _};
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::{MatchingBracketValidator, Validator};
use rustyline::Helper;
use rustyline::{Cmd, CompletionType, Config, EditMode, Editor, KeyEvent};
use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wirekit_api::design::{load_design_file, save_design_file};
use wirekit_api::{pinout, summary, PinUsageView};
use wirekit_core::{
    conflict_alert, DeviceId, DevicePatch, DeviceRegistry, PlugType, SelectorValue, WireMode,
};

use crate::config::ExportConfig;
use crate::export::{self, ExportFormat};
use crate::render;

const COMMANDS: &[&str] = &[
    "add", "set", "mode", "label", "wire", "rm", "ls", "usage", "conflicts", "summary",
    "templates", "pinout", "save", "load", "export", "clear", "help", "exit", "quit",
];

const ID_COMMANDS: &[&str] = &["set", "mode", "label", "wire", "rm", "usage"];

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Print the text (if any) and prompt again.
    Continue(String),
    Exit,
}

/// The editing state behind the shell: a registry and the commands that act on it.
pub struct Session {
    registry: DeviceRegistry,
    export: ExportConfig,
}

fn parse_id(args: &[&str], usage: &str) -> anyhow::Result<DeviceId> {
    args.first().map(|s| DeviceId::from(*s)).ok_or_else(|| anyhow!("Usage: {usage}"))
}

fn parse_plug(arg: Option<&&str>, usage: &str) -> anyhow::Result<PlugType> {
    let s = arg.ok_or_else(|| anyhow!("Usage: {usage}"))?;
    Ok(s.parse()?)
}

fn parse_selector(arg: Option<&&str>, usage: &str) -> anyhow::Result<SelectorValue> {
    let s = arg.ok_or_else(|| anyhow!("Usage: {usage}"))?;
    s.parse().with_context(|| format!("'{s}' is not a channel/output/input number"))
}

impl Session {
    pub const fn new(registry: DeviceRegistry, export: ExportConfig) -> Self {
        Self { registry, export }
    }

    pub const fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Runs one command line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown commands, bad arguments, unknown device ids,
    /// or failed file operations. The registry is unchanged in every error case.
    pub fn execute(&mut self, line: &str) -> anyhow::Result<Flow> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Ok(Flow::Continue(String::new()));
        };

        let output = match command {
            "help" | "h" => help_text(),
            "exit" | "quit" | "q" => return Ok(Flow::Exit),
            "templates" | "tpl" => {
                let plug = args.first().map(|s| s.parse::<PlugType>()).transpose()?;
                render::templates(self.registry.catalog(), plug)
            },
            "add" => self.add(args)?,
            "set" => {
                let usage = "set <id> <n>";
                let id = parse_id(args, usage)?;
                let selector = parse_selector(args.get(1), usage)?;
                let patch = DevicePatch { selector: Some(selector), ..DevicePatch::default() };
                self.update(&id, patch)?
            },
            "mode" => {
                let usage = "mode <id> 2-wire|3-wire";
                let id = parse_id(args, usage)?;
                let mode = args
                    .get(1)
                    .and_then(|s| WireMode::parse(s))
                    .ok_or_else(|| anyhow!("Usage: {usage}"))?;
                if self.registry.get(&id).is_some_and(|d| d.kind.wire_mode().is_none()) {
                    bail!("Device '{id}' has no wire mode");
                }
                self.update(&id, DevicePatch { wire_mode: Some(mode), ..DevicePatch::default() })?
            },
            "label" => {
                let usage = "label <id> <text>";
                let id = parse_id(args, usage)?;
                if args.len() < 2 {
                    bail!("Usage: {usage}");
                }
                let label = args[1..].join(" ");
                self.update(&id, DevicePatch { label: Some(label), ..DevicePatch::default() })?
            },
            "wire" => self.wire(args)?,
            "rm" | "remove" => {
                let id = parse_id(args, "rm <id>")?;
                self.registry
                    .remove_device(&id)
                    .map(|d| format!("Removed {} ({})", d.id, d.label))
                    .ok_or_else(|| anyhow!("Device '{id}' not found"))?
            },
            "ls" | "list" => render::devices(&self.registry),
            "usage" => {
                let id = parse_id(args, "usage <id>")?;
                let usage = self
                    .registry
                    .pin_usage(&id)
                    .ok_or_else(|| anyhow!("Device '{id}' not found"))?;
                render::usage(&PinUsageView::from(&usage))
            },
            "conflicts" => render::conflicts(&self.registry),
            "summary" => render::summary(&summary::summarize(&self.registry)),
            "pinout" => {
                let usage = "pinout <plug> <type> [n]";
                let plug = parse_plug(args.first(), usage)?;
                let device_type = args.get(1).ok_or_else(|| anyhow!("Usage: {usage}"))?;
                let selector =
                    if args.len() > 2 { Some(parse_selector(args.get(2), usage)?) } else { None };
                let view = pinout::pinout(self.registry.catalog(), plug, device_type, selector)
                    .ok_or_else(|| {
                        anyhow!("Plug '{plug}' does not offer device type '{device_type}'")
                    })?;
                render::pinout(&view)
            },
            "save" => {
                let path = args.first().ok_or_else(|| anyhow!("Usage: save <file.json>"))?;
                save_design_file(&self.registry, Path::new(path), self.export.pretty_json)?;
                format!("Saved {} device(s) to {path}", self.registry.len())
            },
            "load" => {
                let path = args.first().ok_or_else(|| anyhow!("Usage: load <file>"))?;
                let count = load_design_file(&mut self.registry, Path::new(path))?;
                let mut text = format!("Loaded {count} device(s) from {path}");
                if let Some(alert) = self.registry.conflict_report().alert() {
                    text.push('\n');
                    text.push_str(&alert);
                }
                text
            },
            "export" => {
                let usage = "export json|csv|diagram [file]";
                let format = args
                    .first()
                    .and_then(|s| ExportFormat::parse(s))
                    .ok_or_else(|| anyhow!("Usage: {usage}"))?;
                match args.get(1) {
                    Some(path) => {
                        export::write(&self.registry, format, &self.export, Path::new(path))?;
                        format!("Wrote {path}")
                    },
                    None => export::render(&self.registry, format, &self.export)?,
                }
            },
            "clear" => {
                self.registry.clear();
                "Cleared all devices".to_string()
            },
            other => bail!("Unknown command: {other}. Type 'help' for available commands."),
        };

        Ok(Flow::Continue(output))
    }

    fn add(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let usage = "add <plug> <type>";
        let plug = parse_plug(args.first(), usage)?;
        let device_type = args.get(1).ok_or_else(|| anyhow!("Usage: {usage}"))?;
        let added = self
            .registry
            .add_device_of_type(plug, device_type)
            .ok_or_else(|| anyhow!("Plug '{plug}' does not offer device type '{device_type}'"))?;

        let device = &added.device;
        let mut text = format!("Added {} ({})", device.id, device.label);
        if let (Some(kind), Some(value)) = (device.kind.selector_kind(), device.kind.selector()) {
            text.push_str(&format!(" on {} {value}", kind.label()));
        }
        if let Some(alert) = conflict_alert(&added.conflicts) {
            text.push('\n');
            text.push_str(&alert);
        }
        Ok(text)
    }

    fn wire(&mut self, args: &[&str]) -> anyhow::Result<String> {
        let usage = "wire <id> <terminal> <number>";
        let id = parse_id(args, usage)?;
        let (Some(terminal), Some(number)) = (args.get(1), args.get(2)) else {
            bail!("Usage: {usage}");
        };
        let mut wire_numbers = self
            .registry
            .get(&id)
            .map(|d| d.wire_numbers.clone())
            .ok_or_else(|| anyhow!("Device '{id}' not found"))?;
        wire_numbers.insert((*terminal).to_string(), (*number).to_string());
        self.update(&id, DevicePatch { wire_numbers: Some(wire_numbers), ..DevicePatch::default() })
    }

    fn update(&mut self, id: &DeviceId, patch: DevicePatch) -> anyhow::Result<String> {
        let device = self
            .registry
            .update_device(id, patch)
            .ok_or_else(|| anyhow!("Device '{id}' not found"))?;
        let mut text = format!("Updated {} ({})", device.id, device.label);
        if let Some(alert) = conflict_alert(&self.registry.conflicts_for(id)) {
            text.push('\n');
            text.push_str(&alert);
        }
        Ok(text)
    }
}

fn help_text() -> String {
    [
        "Available commands:",
        "",
        "Devices:",
        "  add <plug> <type>                 Add a device, auto-assigning a free slot",
        "  set <id> <n>                      Change channel/output/input",
        "  mode <id> 2-wire|3-wire           Change an analog sensor's wire mode",
        "  label <id> <text>                 Rename a device",
        "  wire <id> <terminal> <number>     Record a wire number",
        "  rm <id>                           Remove a device",
        "  ls                                List devices and their pins",
        "  clear                             Remove every device",
        "",
        "Analysis:",
        "  usage <id>                        Pins a device occupies",
        "  conflicts                         Pin conflicts and shared power pins",
        "  summary                           Used pins per plug",
        "  templates [plug]                  Device palette",
        "  pinout <plug> <type> [n]          Pin map with the selection highlighted",
        "",
        "Files:",
        "  save <file.json>                  Save the design",
        "  load <file>                       Load a JSON or YAML design",
        "  export json|csv|diagram [file]    Print or write an export",
        "",
        "General:",
        "  help, h                           Show this help message",
        "  exit, quit, q                     Exit the shell",
    ]
    .join("\n")
}

struct WkHelper {
    completer: WkCompleter,
    hinter: HistoryHinter,
    validator: MatchingBracketValidator,
}

impl Helper for WkHelper {}

impl Completer for WkHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for WkHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Validator for WkHelper {
    fn validate(
        &self,
        ctx: &mut rustyline::validate::ValidationContext,
    ) -> rustyline::Result<rustyline::validate::ValidationResult> {
        self.validator.validate(ctx)
    }
}

impl Highlighter for WkHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        let _ = default;
        Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned("\x1b[1m".to_owned() + hint + "\x1b[m")
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let _ = pos;
        Borrowed(line)
    }

    fn highlight_char(&self, line: &str, pos: usize, kind: CmdKind) -> bool {
        let _ = (line, pos, kind);
        false
    }
}

struct WkCompleter {
    device_ids: Vec<String>,
    /// `(plug, type)` pairs from the catalog.
    device_types: Vec<(PlugType, String)>,
    filename_completer: FilenameCompleter,
}

impl WkCompleter {
    fn new(registry: &DeviceRegistry) -> Self {
        let device_types = registry
            .catalog()
            .templates
            .iter()
            .map(|t| (t.plug_type, t.type_name.clone()))
            .collect();
        let mut completer = Self {
            device_ids: Vec::new(),
            device_types,
            filename_completer: FilenameCompleter::new(),
        };
        completer.update_devices(registry);
        completer
    }

    fn update_devices(&mut self, registry: &DeviceRegistry) {
        self.device_ids = registry.devices().map(|d| d.id.to_string()).collect();
    }

    fn candidates<'a>(prefix: &str, options: impl Iterator<Item = &'a str>) -> Vec<Pair> {
        options
            .filter(|o| o.starts_with(prefix))
            .map(|o| Pair { display: o.to_string(), replacement: o.to_string() })
            .collect()
    }
}

impl Completer for WkCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let words: Vec<&str> = line[..pos].split_whitespace().collect();
        let start = line[..pos].rfind(' ').map_or(0, |i| i + 1);
        let prefix = &line[start..pos];
        // Index of the word being completed.
        let index =
            if line[..pos].ends_with(' ') { words.len() } else { words.len().saturating_sub(1) };

        let matches = match (words.first().copied(), index) {
            (_, 0) => Self::candidates(prefix, COMMANDS.iter().copied()),
            (Some("add" | "pinout" | "templates" | "tpl"), 1) => {
                Self::candidates(prefix, PlugType::ALL.iter().map(|p| p.as_str()))
            },
            (Some("add" | "pinout"), 2) => {
                let plug = words.get(1).and_then(|w| w.parse::<PlugType>().ok());
                Self::candidates(
                    prefix,
                    self.device_types
                        .iter()
                        .filter(|(p, _)| Some(*p) == plug)
                        .map(|(_, t)| t.as_str()),
                )
            },
            (Some("export"), 1) => Self::candidates(prefix, ["json", "csv", "diagram"].into_iter()),
            (Some("mode"), 2) => Self::candidates(prefix, ["2-wire", "3-wire"].into_iter()),
            (Some(cmd), 1) if ID_COMMANDS.contains(&cmd) => {
                Self::candidates(prefix, self.device_ids.iter().map(String::as_str))
            },
            (Some("save" | "load"), 1) | (Some("export"), 2) => {
                return self.filename_completer.complete(line, pos, ctx);
            },
            _ => Vec::new(),
        };
        Ok((start, matches))
    }
}

/// Interactive line editor around a [`Session`].
pub struct Shell {
    session: Session,
    editor: Editor<WkHelper, DefaultHistory>,
    history_file: PathBuf,
    autosave_path: Option<PathBuf>,
}

impl Shell {
    /// Creates a shell over `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line editor cannot be initialized.
    pub fn new(
        registry: DeviceRegistry,
        export: ExportConfig,
        history_file: PathBuf,
        autosave_path: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let helper = WkHelper {
            completer: WkCompleter::new(&registry),
            hinter: HistoryHinter::new(),
            validator: MatchingBracketValidator::new(),
        };

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(helper));
        editor.bind_sequence(KeyEvent::alt('n'), Cmd::HistorySearchForward);
        editor.bind_sequence(KeyEvent::alt('p'), Cmd::HistorySearchBackward);

        if editor.load_history(&history_file).is_err() {
            debug!("No previous history found");
        }

        Ok(Self { session: Session::new(registry, export), editor, history_file, autosave_path })
    }

    /// Runs the interactive loop until `exit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal fails.
    pub fn run(&mut self) -> anyhow::Result<()> {
        println!("WireKit shell");
        println!("Type 'help' for available commands, 'exit' to quit");
        println!();

        loop {
            let prompt = match self.session.registry().len() {
                0 => "wkit> ".to_string(),
                n => format!("wkit ({n} devices)> "),
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(line)?;

                    match self.session.execute(line) {
                        Ok(Flow::Continue(text)) => {
                            if !text.is_empty() {
                                println!("{text}");
                            }
                        },
                        Ok(Flow::Exit) => break,
                        Err(e) => eprintln!("Error: {e}"),
                    }

                    let registry = self.session.registry();
                    if let Some(helper) = self.editor.helper_mut() {
                        helper.completer.update_devices(registry);
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                },
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err:?}");
                    break;
                },
            }
        }

        if let Err(e) = self.editor.save_history(&self.history_file) {
            warn!("Failed to save history: {e}");
        }

        if let Some(path) = &self.autosave_path {
            match save_design_file(self.session.registry(), path, true) {
                Ok(()) => info!(path = %path.display(), "Autosaved design"),
                Err(e) => warn!(path = %path.display(), error = %e, "Autosave failed"),
            }
        }

        println!("Goodbye!");
        Ok(())
    }
}
