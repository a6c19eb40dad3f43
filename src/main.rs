use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod joke_client;
mod models;
mod store;

use crate::joke_client::DadJokeClient;
use crate::models::{Joke, JokeIntent};
use crate::store::JokeStore;

/// A native reader for icanhazdadjoke.com. Fetches a board of jokes, lets
/// you vote on them, and swaps out everything you haven't locked.
#[derive(Debug, Parser)]
#[command(name = "dad_joke_reader", version)]
struct Args {
    /// Number of jokes to keep on the board
    #[arg(long, default_value_t = 5)]
    count: usize,
}

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([720.0, 860.0])
            .with_min_inner_size([480.0, 400.0])
            .with_title("Dad Joke Reader"),
        ..Default::default()
    };

    eframe::run_native(
        "Dad Joke Reader",
        options,
        Box::new(move |cc| {
            let mut app = JokeReaderApp::new(args.count);

            if let Some(storage) = cc.storage {
                // Restore the saved theme preference
                if let Some(theme_str) = storage.get_string("is_dark_mode") {
                    if let Ok(is_dark_mode) = theme_str.parse::<bool>() {
                        app.is_dark_mode = is_dark_mode;
                        app.theme = if is_dark_mode {
                            AppTheme::dark()
                        } else {
                            AppTheme::light()
                        };
                    }
                }
            }

            Ok(Box::new(app))
        }),
    )
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    separator: Color32,
    vote_up: Color32,
    vote_down: Color32,
    vote_neutral: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(255, 152, 0), // Amber
            separator: Color32::from_rgb(60, 60, 60),
            vote_up: Color32::from_rgb(76, 175, 80),   // Green
            vote_down: Color32::from_rgb(229, 85, 78), // Red
            vote_neutral: Color32::from_rgb(158, 158, 158),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(255, 152, 0),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(225, 120, 0), // Darker amber for contrast
            separator: Color32::from_rgb(200, 200, 200),
            vote_up: Color32::from_rgb(30, 110, 40),
            vote_down: Color32::from_rgb(180, 50, 45),
            vote_neutral: Color32::from_rgb(80, 80, 80),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(225, 120, 0),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        // Base colors
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;

        // Text
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        // Buttons
        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        // Selection
        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        // Rounding
        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.menu_corner_radius = CornerRadius::same(6);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    // Color for a vote counter based on its value
    fn vote_color(&self, votes: i32) -> Color32 {
        if votes >= 5 {
            // Crowd favorites get an extra bright counter
            Color32::from_rgb(
                self.vote_up.r().saturating_add(20),
                self.vote_up.g().saturating_add(20),
                self.vote_up.b().saturating_add(5),
            )
        } else if votes > 0 {
            self.vote_up
        } else if votes < 0 {
            self.vote_down
        } else {
            self.vote_neutral
        }
    }

    // Border stroke for a joke card; locked cards get a highlighted frame
    fn card_stroke(&self, locked: bool) -> Stroke {
        if locked {
            Stroke::new(1.5, self.highlight)
        } else {
            Stroke::new(1.0, self.separator)
        }
    }
}

struct JokeReaderApp {
    client: DadJokeClient,
    store: JokeStore,
    // Desired board size for this session
    target_count: usize,
    theme: AppTheme,
    is_dark_mode: bool,
    needs_repaint: bool,
    // Live while a fill is running on the worker thread
    fill_receiver: Option<mpsc::Receiver<Option<Vec<Joke>>>>,
    fill_thread: Option<thread::JoinHandle<()>>,
    // Set when the last fill failed; the board stays on the loading screen
    fetch_error: Option<String>,
    jokes_scroll_offset: f32,
}

impl JokeReaderApp {
    fn new(target_count: usize) -> Self {
        Self {
            client: DadJokeClient::new(),
            store: JokeStore::new(),
            target_count,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            needs_repaint: false,
            fill_receiver: None,
            fill_thread: None,
            fetch_error: None,
            jokes_scroll_offset: 0.0,
        }
    }

    /// Kicks off a fill on a worker thread. The worker runs the fetch loop
    /// against a copy of the current collection and sends the finished
    /// board back over the channel; a failed fill sends None.
    fn start_fill(&mut self) {
        if self.fill_receiver.is_some() {
            return; // A fill is already in flight
        }

        info!(target_count = self.target_count, "starting joke fill");

        let mut working = self.store.clone();
        let client = self.client.clone();
        let target = self.target_count;
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || match working.ensure_filled(target, &client) {
            Ok(()) => {
                let _ = tx.send(Some(working.into_jokes()));
            }
            Err(err) => {
                warn!("joke fill failed: {err:#}");
                let _ = tx.send(None);
            }
        });

        self.fill_thread = Some(handle);
        self.fill_receiver = Some(rx);
    }

    fn check_fill_thread(&mut self) {
        if let Some(rx) = &self.fill_receiver {
            match rx.try_recv() {
                Ok(Some(jokes)) => {
                    self.store.replace(jokes);
                    self.fill_receiver = None;
                    self.needs_repaint = true;
                }
                Ok(None) => {
                    // The board stays on the loading screen; surface why so
                    // the stall isn't silent
                    self.fetch_error = Some(
                        "Couldn't reach icanhazdadjoke.com. Press G to try again.".to_string(),
                    );
                    self.fill_receiver = None;
                    self.needs_repaint = true;
                }
                Err(_) => {
                    // Still waiting for the worker
                }
            }
        }

        // Reap the worker once it's done; results come via the channel
        if let Some(handle) = &self.fill_thread {
            if handle.is_finished() {
                if let Some(handle) = self.fill_thread.take() {
                    let _ = handle.join();
                }
            }
        }
    }

    /// "Get new jokes": keep the locked ones, flag the store as loading,
    /// and let the next frame's fill trigger top the board back up.
    fn request_more(&mut self) {
        self.store.apply(JokeIntent::RequestMore);
        self.fetch_error = None;
        self.jokes_scroll_offset = 0.0;
        self.needs_repaint = true;
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = if self.is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
        self.needs_repaint = true;
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!("failed to open URL {url}: {e}");
        }
    }

    fn process_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let (key_g, key_t) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::G), // G - Get new jokes
                i.key_pressed(egui::Key::T), // T - Toggle theme
            )
        });

        if key_t {
            self.toggle_theme();
        }

        // G also retries after a failed fill, where the button is hidden
        // behind the loading screen
        if key_g && self.fill_receiver.is_none() {
            self.request_more();
        }
    }

    fn render_loading_screen(&self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);
            ui.spinner();
            ui.add_space(20.0);
            ui.label(
                RichText::new("Fetching jokes...")
                    .color(self.theme.secondary_text)
                    .size(18.0),
            );

            if let Some(error) = &self.fetch_error {
                ui.add_space(12.0);
                ui.label(
                    RichText::new(error)
                        .color(self.theme.vote_down)
                        .size(14.0),
                );
            }
        });
    }

    /// One card per joke: vote controls and counter on the left, lock /
    /// copy / permalink controls on the right, joke text below. Clicks are
    /// collected as intents and applied after the frame is laid out.
    fn render_joke_card(&self, ui: &mut Ui, joke: &Joke, intents: &mut Vec<JokeIntent>) {
        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(self.theme.card_stroke(joke.locked))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    // Vote up
                    let up_btn = ui.add(
                        egui::Button::new(
                            RichText::new("▲").color(self.theme.vote_up).size(16.0),
                        )
                        .min_size(egui::Vec2::new(30.0, 26.0))
                        .corner_radius(CornerRadius::same(4))
                        .fill(self.theme.button_background),
                    );
                    if up_btn.clicked() {
                        intents.push(JokeIntent::Vote {
                            id: joke.id.clone(),
                            delta: 1,
                        });
                    }

                    // Vote down
                    let down_btn = ui.add(
                        egui::Button::new(
                            RichText::new("▼").color(self.theme.vote_down).size(16.0),
                        )
                        .min_size(egui::Vec2::new(30.0, 26.0))
                        .corner_radius(CornerRadius::same(4))
                        .fill(self.theme.button_background),
                    );
                    if down_btn.clicked() {
                        intents.push(JokeIntent::Vote {
                            id: joke.id.clone(),
                            delta: -1,
                        });
                    }

                    ui.add_space(4.0);
                    ui.label(
                        RichText::new(format!("{}", joke.votes))
                            .color(self.theme.vote_color(joke.votes))
                            .size(16.0)
                            .strong(),
                    );

                    if up_btn.hovered() || down_btn.hovered() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        // Lock toggle; a locked joke survives "Get New Jokes"
                        let lock_icon = if joke.locked { "🔒" } else { "🔓" };
                        let lock_color = if joke.locked {
                            self.theme.highlight
                        } else {
                            self.theme.secondary_text
                        };

                        let lock_btn = ui
                            .add(
                                egui::Button::new(
                                    RichText::new(lock_icon).color(lock_color).size(16.0),
                                )
                                .min_size(egui::Vec2::new(30.0, 26.0))
                                .corner_radius(CornerRadius::same(4))
                                .fill(self.theme.button_background),
                            )
                            .on_hover_text(if joke.locked {
                                "Unlock (replaced on refresh)"
                            } else {
                                "Lock (kept on refresh)"
                            });
                        if lock_btn.clicked() {
                            intents.push(JokeIntent::ToggleLock {
                                id: joke.id.clone(),
                            });
                        }

                        ui.add_space(4.0);

                        // Copy the joke text
                        let copy_btn = ui
                            .add(
                                egui::Button::new(
                                    RichText::new("📋")
                                        .color(self.theme.button_foreground)
                                        .size(14.0),
                                )
                                .min_size(egui::Vec2::new(30.0, 26.0))
                                .corner_radius(CornerRadius::same(4))
                                .fill(self.theme.button_background),
                            )
                            .on_hover_text("Copy joke");
                        if copy_btn.clicked() {
                            ui.ctx().copy_text(joke.text.clone());
                        }

                        ui.add_space(4.0);

                        // Open the joke's permalink in the browser
                        let link_btn = ui
                            .add(
                                egui::Button::new(
                                    RichText::new("↗")
                                        .color(self.theme.button_foreground)
                                        .size(14.0),
                                )
                                .min_size(egui::Vec2::new(30.0, 26.0))
                                .corner_radius(CornerRadius::same(4))
                                .fill(self.theme.button_background),
                            )
                            .on_hover_text("Open on icanhazdadjoke.com");
                        if link_btn.clicked() {
                            self.open_link(&joke.permalink());
                        }

                        if lock_btn.hovered() || copy_btn.hovered() || link_btn.hovered() {
                            ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                        }
                    });
                });

                ui.add_space(6.0);
                ui.label(RichText::new(&joke.text).color(self.theme.text).size(16.0));
            });

        ui.add_space(8.0);
    }

    fn render_joke_board(&mut self, ui: &mut Ui) {
        let mut intents = Vec::new();

        ui.vertical_centered(|ui| {
            let get_more_btn = ui.add_sized(
                [220.0, 36.0],
                egui::Button::new(
                    RichText::new("Get New Jokes")
                        .color(self.theme.button_foreground)
                        .size(16.0)
                        .strong(),
                )
                .corner_radius(CornerRadius::same(6))
                .fill(self.theme.button_background),
            );

            if get_more_btn.hovered() {
                ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
            }
            if get_more_btn.clicked() {
                intents.push(JokeIntent::RequestMore);
            }
        });

        ui.add_space(12.0);

        if self.store.jokes().is_empty() {
            // Possible with --count 0
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(
                    RichText::new("The board is empty.")
                        .color(self.theme.secondary_text)
                        .size(15.0),
                );
            });
        } else {
            // Sort order is derived from the live vote counts every frame;
            // the stored order never changes
            let sorted = self.store.sorted_for_display();

            let scroll_response = ScrollArea::vertical()
                .id_salt("jokes_scroll_area")
                .auto_shrink([false, false])
                .vertical_scroll_offset(self.jokes_scroll_offset)
                .show(ui, |ui| {
                    for joke in &sorted {
                        self.render_joke_card(ui, joke, &mut intents);
                    }
                    ui.add_space(20.0);
                });

            self.jokes_scroll_offset = scroll_response.state.offset.y;
        }

        for intent in intents {
            if intent == JokeIntent::RequestMore {
                self.request_more();
            } else {
                self.store.apply(intent);
            }
            self.needs_repaint = true;
        }
    }
}

impl eframe::App for JokeReaderApp {
    // Persist the theme preference; jokes are session-only by design
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        self.check_fill_thread();
        self.process_keyboard_shortcuts(ctx);

        // The fill trigger: whenever the store wants jokes and no fill is
        // in flight, start one. A failed fill parks the board on the error
        // note until the user asks again.
        if self.store.is_loading() && self.fill_receiver.is_none() && self.fetch_error.is_none() {
            self.start_fill();
        }

        // Keep repainting while a fill is running so its result is picked
        // up promptly
        if self.fill_receiver.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        if self.needs_repaint {
            ctx.request_repaint();
            self.needs_repaint = false;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(
                    RichText::new("Dad Joke Reader")
                        .color(self.theme.highlight)
                        .size(24.0),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    // Theme toggle
                    let theme_icon = if self.is_dark_mode { "☀" } else { "☾" };
                    let theme_btn = ui
                        .add(
                            egui::Button::new(
                                RichText::new(theme_icon)
                                    .color(self.theme.button_foreground)
                                    .size(20.0),
                            )
                            .min_size(egui::Vec2::new(32.0, 32.0))
                            .corner_radius(CornerRadius::same(16))
                            .fill(self.theme.button_background),
                        )
                        .on_hover_text(if self.is_dark_mode {
                            "Switch to Light Mode (T)"
                        } else {
                            "Switch to Dark Mode (T)"
                        });

                    if theme_btn.hovered() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }
                    if theme_btn.clicked() {
                        self.toggle_theme();
                        ctx.request_repaint();
                    }

                    ui.add_space(12.0);

                    let locked = self.store.locked_count();
                    if locked > 0 {
                        ui.label(
                            RichText::new(format!("{locked} locked"))
                                .color(self.theme.secondary_text)
                                .size(14.0),
                        );
                    }
                });
            });

            ui.add(egui::Separator::default().spacing(12.0));

            if self.store.is_loading() {
                self.render_loading_screen(ui);
                return;
            }

            self.render_joke_board(ui);
        });
    }
}
