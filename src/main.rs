use std::error::Error;
use std::fs::File;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use crossterm::style::Stylize;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use promptkit::core::config::{self, ConfigError};
use promptkit::core::key::KeyName;
use promptkit::core::state::{PromptState, Session};
use promptkit::core::text::FrameBuilder;
use promptkit::tui::components::{
    ConfirmParams, ConfirmState, GroupMultiSelectParams, GroupMultiSelectState, GroupRow,
    KeyOption, MultiSelectOption, MultiSelectParams,
    MultiSelectState, PasswordParams, PasswordState, SelectKeyParams, SelectKeyState, SelectOption,
    OptionGroup, SelectParams, SelectState, TextParams, TextState, confirm, group_multi_select,
    multi_select, password, select, select_key, text,
};
use promptkit::tui::{CancellationToken, PromptError, PromptOptions};

type LanguageSession = Session<Option<&'static str>, SelectState<&'static str>>;
type ToppingSession = Session<Vec<&'static str>, MultiSelectState<&'static str>>;
type PackingSession = Session<Vec<&'static str>, GroupMultiSelectState<&'static str>>;
type NextStepSession = Session<Option<&'static str>, SelectKeyState<&'static str>>;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Widget {
    #[default]
    Text,
    Password,
    Confirm,
    Select,
    MultiSelect,
    GroupMultiSelect,
    SelectKey,
}

#[derive(Parser)]
#[command(name = "promptkit", about = "Interactive terminal prompt demo")]
struct Args {
    /// Prompt to show
    #[arg(short, long, default_value_t, value_enum)]
    widget: Widget,

    /// Cancel the prompt after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - the terminal belongs to the prompt
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("promptkit.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    info!("promptkit demo starting with widget: {:?}", args.widget);

    let resolved = config::load_config().and_then(|c| config::resolve(&c));
    match resolved {
        Ok(resolved) => config::apply(&resolved),
        Err(ConfigError::Parse(e)) => {
            warn!("Ignoring malformed config: {}", e);
            eprintln!("warning: ignoring malformed config file: {e}");
        }
        Err(e) => return Err(e.into()),
    }

    let (token, handle) = CancellationToken::new();
    if let Some(secs) = args.timeout {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!("Timeout of {}s reached", secs);
            handle.cancel();
        });
    }

    let widget = args.widget;
    let outcome = tokio::task::spawn_blocking(move || run_widget(widget, token)).await?;
    match outcome {
        Ok(answer) => println!("{answer}"),
        Err(PromptError::Cancelled) => println!("Cancelled."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn options(token: &CancellationToken) -> PromptOptions {
    PromptOptions {
        cancel: Some(token.clone()),
        ..PromptOptions::default()
    }
}

fn run_widget(widget: Widget, token: CancellationToken) -> Result<String, PromptError> {
    match widget {
        Widget::Text => text(TextParams {
            options: options(&token),
            placeholder: "ferris".to_string(),
            required: true,
            validate: Some(Box::new(|name: &String| {
                // Pretend to look the name up somewhere slow
                thread::sleep(Duration::from_millis(700));
                if name.trim().len() < 2 {
                    return Err("Names need at least two characters.".to_string());
                }
                Ok(())
            })),
            render: Some(Box::new(|s: &Session<String, TextState>| {
                let body = match s.state {
                    PromptState::Submit | PromptState::Cancel => s.value.clone(),
                    _ if s.value.is_empty() => {
                        format!("{}{}", "█", s.widget.placeholder.as_str().dark_grey())
                    }
                    _ => s.value_with_cursor(),
                };
                frame("What is your name?", s, body)
            })),
            ..TextParams::default()
        })?
        .run(),

        Widget::Password => password(PasswordParams {
            options: options(&token),
            required: true,
            validate: Some(Box::new(|value: &String| {
                if value.chars().count() < 4 {
                    return Err("Use at least four characters.".to_string());
                }
                Ok(())
            })),
            render: Some(Box::new(|s: &Session<String, PasswordState>| {
                let body = match s.state {
                    PromptState::Submit | PromptState::Cancel => s.masked(),
                    _ => s.masked_with_cursor(),
                };
                frame("Choose a password", s, body)
            })),
            ..PasswordParams::default()
        })?
        .run()
        .map(|value| "*".repeat(value.chars().count())),

        Widget::Confirm => confirm(ConfirmParams {
            options: options(&token),
            initial_value: true,
            render: Some(Box::new(|s: &Session<bool, ConfirmState>| {
                let choice = |on: bool, label: &str| {
                    if on {
                        format!("● {}", label.green())
                    } else {
                        format!("○ {}", label.dark_grey())
                    }
                };
                let body = match s.state {
                    PromptState::Submit | PromptState::Cancel => s.label().to_string(),
                    _ => format!(
                        "{} / {}",
                        choice(s.value, s.widget.active.as_str()),
                        choice(!s.value, s.widget.inactive.as_str())
                    ),
                };
                frame("Continue?", s, body)
            })),
            ..ConfirmParams::default()
        })?
        .run()
        .map(|yes| if yes { "yes" } else { "no" }.to_string()),

        Widget::Select => select(SelectParams {
            options: options(&token),
            choices: vec![
                SelectOption::new("rust", "Rust"),
                SelectOption::new("go", "Go"),
                SelectOption::new("zig", "Zig"),
                SelectOption::new("ocaml", "OCaml"),
            ],
            filter: true,
            required: true,
            render: Some(Box::new(|s: &LanguageSession| {
                let body = match s.state {
                    PromptState::Submit | PromptState::Cancel => {
                        s.highlighted().map(|o| o.label.clone()).unwrap_or_default()
                    }
                    _ => {
                        let mut lines: Vec<String> = s
                            .widget
                            .options
                            .iter()
                            .enumerate()
                            .map(|(i, o)| {
                                if i == s.cursor {
                                    format!("● {}", o.label.as_str().cyan())
                                } else {
                                    format!("○ {}", o.label.as_str().dark_grey())
                                }
                            })
                            .collect();
                        if !s.widget.search.is_empty() {
                            lines.insert(0, format!("Search: {}", s.widget.search));
                        }
                        lines.join("\r\n│  ")
                    }
                };
                frame("Pick a language (type to filter)", s, body)
            })),
            ..SelectParams::default()
        })?
        .run()
        .map(|value| value.unwrap_or_default().to_string()),

        Widget::MultiSelect => multi_select(MultiSelectParams {
            options: options(&token),
            choices: vec![
                MultiSelectOption::new("cheese", "Cheese").preselected(),
                MultiSelectOption::new("olives", "Olives"),
                MultiSelectOption::new("basil", "Basil").with_hint("fresh"),
                MultiSelectOption::new("chili", "Chili"),
            ],
            required: true,
            render: Some(Box::new(|s: &ToppingSession| {
                let body = match s.state {
                    PromptState::Submit | PromptState::Cancel => s.value.join(", "),
                    _ => s
                        .widget
                        .options
                        .iter()
                        .enumerate()
                        .map(|(i, o)| {
                            let mark = if s.is_selected(&o.value) { "◼" } else { "◻" };
                            let mut line = format!("{mark} {}", o.label);
                            if !o.hint.is_empty() {
                                line.push_str(&format!(" ({})", o.hint.as_str().dark_grey()));
                            }
                            if i == s.cursor {
                                line = line.cyan().to_string();
                            }
                            line
                        })
                        .collect::<Vec<_>>()
                        .join("\r\n│  "),
                };
                frame("Toppings (space to toggle, a for all)", s, body)
            })),
            ..MultiSelectParams::default()
        })?
        .run()
        .map(|values| values.join(", ")),

        Widget::GroupMultiSelect => group_multi_select(GroupMultiSelectParams {
            options: options(&token),
            groups: vec![
                OptionGroup::new(
                    "Clothes",
                    vec![
                        MultiSelectOption::new("jacket", "Jacket"),
                        MultiSelectOption::new("boots", "Boots").preselected(),
                    ],
                ),
                OptionGroup::new(
                    "Gear",
                    vec![
                        MultiSelectOption::new("tent", "Tent"),
                        MultiSelectOption::new("stove", "Stove").with_hint("gas"),
                    ],
                ),
            ],
            render: Some(Box::new(|s: &PackingSession| {
                let body = match s.state {
                    PromptState::Submit | PromptState::Cancel => s.value.join(", "),
                    _ => s
                        .widget
                        .rows
                        .iter()
                        .enumerate()
                        .map(|(i, row)| {
                            let line = match row {
                                GroupRow::Group { label, .. } => {
                                    let mark = if s.is_group_selected(i) { "◼" } else { "◻" };
                                    format!("{mark} {}", label.as_str().bold())
                                }
                                GroupRow::Option(o) => {
                                    let mark = if s.is_selected(&o.value) { "◼" } else { "◻" };
                                    format!("  {mark} {}", o.label)
                                }
                            };
                            if i == s.cursor {
                                line.cyan().to_string()
                            } else {
                                line
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\r\n│  "),
                };
                frame("Pack for the trip (space on a group takes it all)", s, body)
            })),
            ..GroupMultiSelectParams::default()
        })?
        .run()
        .map(|values| values.join(", ")),

        Widget::SelectKey => select_key(SelectKeyParams {
            options: options(&token),
            choices: vec![
                KeyOption::new(KeyName::Char('c'), "commit", "Commit"),
                KeyOption::new(KeyName::Char('e'), "edit", "Edit message"),
                KeyOption::new(KeyName::Char('q'), "quit", "Quit"),
            ],
            render: Some(Box::new(|s: &NextStepSession| {
                let body = match s.state {
                    PromptState::Submit => {
                        s.chosen().map(|o| o.label.clone()).unwrap_or_default()
                    }
                    _ => s
                        .widget
                        .options
                        .iter()
                        .map(|o| format!("[{}] {}", o.key.to_string().cyan(), o.label))
                        .collect::<Vec<_>>()
                        .join("\r\n│  "),
                };
                frame("What next?", s, body)
            })),
        })?
        .run()
        .map(|value| value.unwrap_or_default().to_string()),
    }
}

/// Shared frame layout: a status symbol and title, the widget body, and a
/// footer line for validation progress or the last error.
fn frame<T, W>(title: &str, s: &Session<T, W>, body: String) -> String {
    let symbol = match s.state {
        PromptState::Initial | PromptState::Active => "◆".cyan(),
        PromptState::Validating => "◒".magenta(),
        PromptState::Error => "▲".yellow(),
        PromptState::Cancel => "■".red(),
        PromptState::Submit => "◇".green(),
    };

    let mut out = FrameBuilder::new();
    out.write_ln(format!("{symbol}  {}", title.bold()));
    out.write_ln(format!("│  {body}"));
    match s.state {
        PromptState::Validating => {
            out.write_ln(format!(
                "└  {}",
                format!("Checking... {}ms", s.validation_duration.as_millis()).dark_grey()
            ));
        }
        PromptState::Error => {
            out.write_ln(format!("└  {}", s.error.as_str().yellow()));
        }
        _ => {
            out.write_ln("└");
        }
    }
    out.remove_trailing_crlf();
    out.build()
}
