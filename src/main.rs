use clap::Parser;
use iced::widget::canvas::Canvas;
use iced::widget::{Space, button, column, container, row, scrollable, text, text_input};
use iced::{Alignment, Element, Length, Task};
use std::path::PathBuf;

mod curve;
mod data;
mod editor;
mod ui;

use crate::curve::{CurveConfig, CurveKind, DelayCurve};
use crate::data::Account;

/// Assign staggered execution delays to an ordered account roster by
/// shaping a delay curve.
#[derive(Debug, Clone, Parser)]
#[command(name = "stagger")]
struct Args {
    /// Account roster to load on startup (one address per line).
    roster: Option<PathBuf>,
    /// Initial upper bound of the delay axis, in seconds.
    #[arg(long, default_value_t = curve::DEFAULT_MAX_DELAY)]
    max_delay: f64,
    /// Accepted for host compatibility; not applied to the schedule.
    #[arg(long, default_value_t = 0.0)]
    min_delay: f64,
    /// Print the updated schedule to stdout as a JSON line on every
    /// change.
    #[arg(long)]
    follow: bool,
}

pub fn main() -> iced::Result {
    env_logger::init();
    let args = Args::parse();

    iced::application(
        move || Stagger::new(args.clone()),
        Stagger::update,
        Stagger::view,
    )
    .title(Stagger::title)
    .run()
}

#[derive(Debug, Clone)]
pub enum Message {
    OpenRoster,
    RosterSelected(PathBuf),
    RosterLoaded(PathBuf, Vec<Account>),
    ExportSchedule,
    ExportSelected(PathBuf),
    ErrorOccurred(String),
    PresetSelected(CurveKind),
    FlipToggled,
    CurveReset,
    MaxDelayInput(String),
    MaxDelaySubmit,
    MarkerDragged { index: usize, y: f64 },
    MarkerHovered(Option<usize>),
    None,
}

struct Stagger {
    roster_path: Option<PathBuf>,
    curve: DelayCurve,
    max_delay_input: String,
    hovered: Option<usize>,
    status: Option<String>,
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{bound:.0}")
    } else {
        format!("{bound}")
    }
}

fn load_roster_task(path: PathBuf) -> Task<Message> {
    Task::perform(
        async move {
            data::load_roster(&path)
                .map(|accounts| (path.clone(), accounts))
                .map_err(|e| format!("Failed to load roster from {}: {e}", path.display()))
        },
        |result| match result {
            Ok((path, accounts)) => Message::RosterLoaded(path, accounts),
            Err(e) => Message::ErrorOccurred(e),
        },
    )
}

impl Stagger {
    fn new(args: Args) -> (Self, Task<Message>) {
        let config = CurveConfig {
            max_delay_secs: curve::clamp_max_delay(args.max_delay),
            min_delay_secs: args.min_delay,
            ..CurveConfig::default()
        };
        if config.min_delay_secs != 0.0 {
            log::warn!("--min-delay is accepted for compatibility but not applied");
        }

        let follow = args.follow;
        let curve = DelayCurve::new(
            config,
            Box::new(move |delays| {
                log::debug!("schedule updated: {} entries", delays.len());
                if follow {
                    match serde_json::to_string(delays) {
                        Ok(line) => println!("{line}"),
                        Err(e) => log::error!("failed to serialize schedule: {e}"),
                    }
                }
            }),
        );

        let max_delay_input = format_bound(curve.config().max_delay_secs);

        let initial_task = match args.roster {
            Some(path) => load_roster_task(path),
            None => Task::none(),
        };

        (
            Stagger {
                roster_path: None,
                curve,
                max_delay_input,
                hovered: None,
                status: None,
            },
            initial_task,
        )
    }

    fn title(&self) -> String {
        match &self.roster_path {
            Some(path) => path
                .file_name()
                .map(|name| format!("Stagger - {}", name.to_string_lossy()))
                .unwrap_or_else(|| "Stagger".to_string()),
            None => "Stagger - delay curve editor".to_string(),
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenRoster => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .add_filter("account roster", &["txt", "list"])
                            .pick_file()
                            .await
                    },
                    |file_handle| {
                        if let Some(handle) = file_handle {
                            Message::RosterSelected(handle.path().to_path_buf())
                        } else {
                            Message::None
                        }
                    },
                );
            }
            Message::RosterSelected(path) => {
                return load_roster_task(path);
            }
            Message::RosterLoaded(path, accounts) => {
                self.curve.sync_accounts(&accounts);
                self.hovered = None;
                self.status = Some(if accounts.is_empty() {
                    format!("{} contains no accounts", path.display())
                } else {
                    format!("Loaded {} accounts", accounts.len())
                });
                self.roster_path = Some(path);
            }
            Message::ExportSchedule => {
                if self.curve.is_empty() {
                    self.status = Some("Nothing to export".to_string());
                    return Task::none();
                }
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_file_name("stagger-schedule.json")
                            .save_file()
                            .await
                    },
                    |file_handle| {
                        if let Some(handle) = file_handle {
                            Message::ExportSelected(handle.path().to_path_buf())
                        } else {
                            Message::None
                        }
                    },
                );
            }
            Message::ExportSelected(path) => {
                match data::export_schedule(&path, self.curve.markers()) {
                    Ok(()) => {
                        log::info!("exported schedule to {}", path.display());
                        self.status = Some(format!("Exported schedule to {}", path.display()));
                    }
                    Err(e) => {
                        log::error!("schedule export failed: {e}");
                        self.status = Some(format!("Export failed: {e}"));
                    }
                }
            }
            Message::ErrorOccurred(e) => {
                log::error!("{e}");
                self.status = Some(e);
            }
            Message::PresetSelected(kind) => {
                self.curve.apply_preset(kind);
            }
            Message::FlipToggled => {
                self.curve.toggle_flip();
            }
            Message::CurveReset => {
                self.curve.reset();
            }
            Message::MaxDelayInput(input) => {
                self.max_delay_input = input;
            }
            Message::MaxDelaySubmit => {
                let bound = self.curve.set_max_delay(&self.max_delay_input);
                self.max_delay_input = format_bound(bound);
            }
            Message::MarkerDragged { index, y } => {
                self.curve.commit_drag(index, y);
            }
            Message::MarkerHovered(hovered) => {
                self.hovered = hovered;
            }
            Message::None => {}
        }
        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let header = row![
            text("Stagger").size(20),
            Space::new().width(Length::Fill),
            button("Export")
                .style(ui::neutral_button_style)
                .on_press(Message::ExportSchedule),
            button("Open").on_press(Message::OpenRoster),
        ]
        .spacing(10)
        .padding(5)
        .align_y(Alignment::Center);

        let mut presets = row![].spacing(6);
        for kind in CurveKind::PRESETS {
            let active = self.curve.config().kind == kind;
            presets = presets.push(
                button(text(kind.to_string()).size(13))
                    .style(ui::preset_button_style(active))
                    .on_press(Message::PresetSelected(kind)),
            );
        }

        let controls = row![
            presets,
            button(text("Flip").size(13))
                .style(ui::neutral_button_style)
                .on_press(Message::FlipToggled),
            button(text("Reset").size(13))
                .style(ui::neutral_button_style)
                .on_press(Message::CurveReset),
            Space::new().width(Length::Fill),
            text("Max delay").size(13),
            text_input("10", &self.max_delay_input)
                .on_input(Message::MaxDelayInput)
                .on_submit(Message::MaxDelaySubmit)
                .width(Length::Fixed(70.0)),
            text("s").size(13),
        ]
        .spacing(10)
        .padding(5)
        .align_y(Alignment::Center);

        let content: Element<'_, Message> = if self.curve.is_empty() {
            container(text("Open an account roster to start").size(20))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into()
        } else {
            let canvas = Canvas::new(editor::CurveProgram {
                markers: self.curve.markers(),
                config: self.curve.config(),
            })
            .width(Length::Fill)
            .height(Length::Fill);

            row![
                container(canvas)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .padding(8),
                self.schedule_panel(),
            ]
            .into()
        };

        let status: Element<'_, Message> = match &self.status {
            Some(message) => container(text(message).size(12)).padding(4).into(),
            _ => Space::new().height(0).into(),
        };

        column![header, controls, content, status].into()
    }

    fn schedule_panel(&self) -> Element<'_, Message> {
        let mut rows = column![].spacing(2);
        for marker in self.curve.markers() {
            let highlighted = self.hovered == Some(marker.index);
            let entry = row![
                text(format!("{:>3}", marker.index))
                    .size(12)
                    .width(Length::Fixed(30.0)),
                text(data::short_address(&marker.address))
                    .size(12)
                    .width(Length::Fill),
                text(format!("{:.2} s", marker.delay_secs)).size(12),
            ]
            .spacing(8);

            rows = rows.push(container(entry).padding(3).style(
                move |theme: &iced::Theme| {
                    if highlighted {
                        container::Style::default()
                            .background(theme.extended_palette().primary.weak.color)
                    } else {
                        container::Style::default()
                    }
                },
            ));
        }

        let heading = format!("Schedule - {} accounts", self.curve.markers().len());

        container(
            column![
                text(heading).size(14),
                scrollable(rows).height(Length::Fill),
            ]
            .spacing(8)
            .padding(10),
        )
        .width(Length::Fixed(260.0))
        .height(Length::Fill)
        .style(ui::panel_style)
        .into()
    }
}
