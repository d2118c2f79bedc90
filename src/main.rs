use eframe::egui;
use egui::{Color32, RichText, ScrollArea, Ui, ViewportBuilder};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mars_rover_story::config::Config;
use mars_rover_story::curator::Curator;
use mars_rover_story::db::ListDatabase;
use mars_rover_story::explorer::Explorer;
use mars_rover_story::filters::{apply_filters, extract_filter_options, FilterOptions, PhotoFilter};
use mars_rover_story::loading::LoadingFlag;
use mars_rover_story::mars_client::MarsPhotosClient;
use mars_rover_story::models::{Photo, PhotoId};
use mars_rover_story::resolver::Resolution;
use mars_rover_story::session::MemorySessionStore;
use mars_rover_story::{Error, SourceError};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mars_rover_story=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let mut app = MarsStoryApp::new(config)?;

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1100.0, 780.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Mars Rover Story"),
        ..Default::default()
    };

    eframe::run_native(
        "Mars Rover Story",
        options,
        Box::new(move |cc| {
            if let Some(storage) = cc.storage {
                if let Some(dark) = storage.get_string("is_dark_mode") {
                    app.is_dark_mode = dark.parse().unwrap_or(true);
                }
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("UI error: {e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Photos,
    List,
    Story,
}

struct Notice {
    text: String,
    is_error: bool,
}

// User actions collected while drawing, applied once the frame's borrows end
enum Action {
    AddToList(Photo),
    Remove(PhotoId),
    Describe(PhotoId, String),
    OpenImage(String),
    CopyLink(String),
}

struct MarsStoryApp {
    runtime: Runtime,
    explorer: Arc<Explorer<MarsPhotosClient>>,
    db: Option<ListDatabase>,
    curator: Curator,
    tab: Tab,
    is_dark_mode: bool,
    notice: Option<Notice>,

    // Search view
    date_input: String,
    rover_filter: Option<String>,
    camera_filter: Option<String>,
    results: Vec<Photo>,
    filter_options: FilterOptions,
    has_searched: bool,

    // Story view
    story_index: usize,

    // Background work
    startup: LoadingFlag,
    fetching: LoadingFlag,
    registry_receiver: Option<Receiver<Result<usize, String>>>,
    fetch_receiver: Option<Receiver<Result<Resolution, Error>>>,
    fetch_cancel: Option<CancellationToken>,
}

impl MarsStoryApp {
    fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mars-io")
            .enable_all()
            .build()
            .context("starting async runtime")?;

        let client = MarsPhotosClient::new(&config).context("building HTTP client")?;
        let explorer = Explorer::new(client, Box::new(MemorySessionStore::new()), &config);

        // A missing database only costs persistence, so keep going without it
        let db = match ListDatabase::open(&config.database_path()) {
            Ok(db) => Some(db),
            Err(e) => {
                error!(error = %e, "failed to open list database");
                None
            }
        };
        let curator = match db.as_ref().map(ListDatabase::load_entries) {
            Some(Ok(entries)) => Curator::from_entries(entries),
            Some(Err(e)) => {
                error!(error = %e, "failed to load saved list");
                Curator::new()
            }
            None => Curator::new(),
        };
        info!(entries = curator.len(), "list restored");

        let mut app = Self {
            runtime,
            explorer: Arc::new(explorer),
            db,
            curator,
            tab: Tab::Photos,
            is_dark_mode: true,
            notice: None,
            date_input: String::new(),
            rover_filter: None,
            camera_filter: None,
            results: Vec::new(),
            filter_options: FilterOptions::default(),
            has_searched: false,
            story_index: 0,
            startup: LoadingFlag::new(),
            fetching: LoadingFlag::new(),
            registry_receiver: None,
            fetch_receiver: None,
            fetch_cancel: None,
        };
        app.load_registry();
        Ok(app)
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
        });
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: true,
        });
    }

    fn load_registry(&mut self) {
        let (tx, rx) = mpsc::channel();
        let explorer = Arc::clone(&self.explorer);
        let guard = self.startup.begin();

        self.runtime.spawn(async move {
            let _guard = guard;
            let result = explorer
                .registry()
                .await
                .map(|registry| registry.len())
                .map_err(|e| format!("Failed to fetch rover information. {e}"));
            let _ = tx.send(result);
        });

        self.registry_receiver = Some(rx);
    }

    fn fetch_photos(&mut self) {
        let date = match NaiveDate::parse_from_str(self.date_input.trim(), DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                self.notify_error("Please select a valid date.");
                return;
            }
        };

        // A new search supersedes whatever is still running
        if let Some(previous) = self.fetch_cancel.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let filter = PhotoFilter::new(self.rover_filter.clone(), self.camera_filter.clone());
        let explorer = Arc::clone(&self.explorer);
        let guard = self.fetching.begin();
        let (tx, rx) = mpsc::channel();

        self.runtime.spawn(async move {
            let _guard = guard;
            let result = explorer.resolve(date, &filter, &task_cancel).await;
            let _ = tx.send(result);
        });

        self.fetch_receiver = Some(rx);
        self.fetch_cancel = Some(cancel);
    }

    fn reset(&mut self) {
        if let Some(cancel) = self.fetch_cancel.take() {
            cancel.cancel();
        }
        self.fetch_receiver = None;
        self.date_input.clear();
        self.rover_filter = None;
        self.camera_filter = None;
        self.results.clear();
        self.filter_options = FilterOptions::default();
        self.has_searched = false;
    }

    fn check_background_tasks(&mut self) {
        let registry = self.registry_receiver.as_ref().map(Receiver::try_recv);
        match registry {
            Some(Ok(Ok(count))) => {
                info!(count, "rover registry ready");
                self.registry_receiver = None;
            }
            Some(Ok(Err(message))) => {
                self.registry_receiver = None;
                self.notify_error(message);
            }
            Some(Err(TryRecvError::Disconnected)) => self.registry_receiver = None,
            Some(Err(TryRecvError::Empty)) | None => {}
        }

        let fetch = self.fetch_receiver.as_ref().map(Receiver::try_recv);
        match fetch {
            Some(Ok(result)) => {
                self.fetch_receiver = None;
                self.fetch_cancel = None;
                self.handle_resolution(result);
            }
            Some(Err(TryRecvError::Disconnected)) => self.fetch_receiver = None,
            Some(Err(TryRecvError::Empty)) | None => {}
        }
    }

    fn handle_resolution(&mut self, result: Result<Resolution, Error>) {
        self.has_searched = true;
        match result {
            Ok(resolution) => {
                if !resolution.is_exact() {
                    let found = resolution.resolved_date.format(DATE_FORMAT).to_string();
                    self.notify(format!(
                        "No photos found for this date, but we found photos on {found}"
                    ));
                    self.date_input = found;
                }
                self.filter_options = extract_filter_options(&resolution.photos);
                // Drop selections the new result set cannot satisfy
                if let Some(rover) = &self.rover_filter {
                    if !self.filter_options.rovers.contains(rover) {
                        self.rover_filter = None;
                    }
                }
                if let Some(camera) = &self.camera_filter {
                    if !self.filter_options.cameras.contains(camera) {
                        self.camera_filter = None;
                    }
                }
                self.results = resolution.photos;
            }
            Err(Error::SourceUnavailable(SourceError::Cancelled)) => {
                info!("fetch cancelled");
            }
            Err(e) => {
                warn!(error = %e, "fetch failed");
                self.results.clear();
                self.filter_options = FilterOptions::default();
                match e {
                    Error::SourceUnavailable(_) => {
                        self.notify_error(format!("Failed to fetch photos: {e}"))
                    }
                    _ => self.notify_error(e.to_string()),
                }
            }
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::AddToList(photo) => match self.curator.add(photo) {
                Ok(entry) => {
                    if let Some(db) = &self.db {
                        if let Err(e) = db.add_entry(entry) {
                            error!(error = %e, "failed to save list entry");
                        }
                    }
                    self.notify("Photo added to the list!");
                }
                Err(e) if e.is_notice() => self.notify(e.to_string()),
                Err(e) => self.notify_error(e.to_string()),
            },
            Action::Remove(id) => {
                if self.curator.remove(id).is_some() {
                    if let Some(db) = &self.db {
                        if let Err(e) = db.remove_entry(id) {
                            error!(error = %e, "failed to delete list entry");
                        }
                    }
                    self.story_index = self.story_index.min(self.curator.len().saturating_sub(1));
                }
            }
            Action::Describe(id, text) => {
                if let Some(db) = &self.db {
                    if let Err(e) = db.update_description(id, &text) {
                        error!(error = %e, "failed to save description");
                    }
                }
                self.curator.set_description(id, text);
            }
            Action::OpenImage(url) => {
                if let Err(e) = open::that(&url) {
                    warn!(error = %e, url = %url, "failed to open image");
                    self.notify_error(format!("Could not open image: {e}"));
                }
            }
            Action::CopyLink(url) => {
                match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url)) {
                    Ok(()) => self.notify("Image link copied to clipboard"),
                    Err(e) => self.notify_error(format!("Could not copy link: {e}")),
                }
            }
        }
    }

    fn render_tab_buttons(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, Tab::Photos, RichText::new("Photos").size(16.0));
            ui.selectable_value(
                &mut self.tab,
                Tab::List,
                RichText::new(format!("List ({})", self.curator.len())).size(16.0),
            );
            ui.selectable_value(&mut self.tab, Tab::Story, RichText::new("Story").size(16.0));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.is_dark_mode { "Light mode" } else { "Dark mode" };
                if ui.button(label).clicked() {
                    self.is_dark_mode = !self.is_dark_mode;
                }
            });
        });
    }

    fn render_notice(&mut self, ui: &mut Ui) {
        let mut dismissed = false;
        if let Some(notice) = &self.notice {
            ui.horizontal(|ui| {
                let color = if notice.is_error {
                    Color32::from_rgb(230, 90, 80)
                } else {
                    Color32::from_rgb(110, 190, 120)
                };
                ui.label(RichText::new(&notice.text).color(color));
                if ui.small_button("Dismiss").clicked() {
                    dismissed = true;
                }
            });
        }
        if dismissed {
            self.notice = None;
        }
    }

    fn render_photos_tab(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        let mut fetch = false;
        let mut reset = false;

        ui.horizontal(|ui| {
            ui.label("Earth date:");
            let date_field = ui.add(
                egui::TextEdit::singleline(&mut self.date_input)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(110.0),
            );
            if date_field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                fetch = true;
            }

            ui.add_enabled_ui(!self.filter_options.is_empty(), |ui| {
                filter_combo(
                    ui,
                    "rover_filter",
                    "Select Rover",
                    &self.filter_options.rovers,
                    &mut self.rover_filter,
                );
                filter_combo(
                    ui,
                    "camera_filter",
                    "Select Camera",
                    &self.filter_options.cameras,
                    &mut self.camera_filter,
                );
            });

            if ui.button("Fetch Images").clicked() {
                fetch = true;
            }
            if ui.button("Reset").clicked() {
                reset = true;
            }
            if self.fetching.is_loading() {
                ui.spinner();
            }
        });
        ui.separator();

        if reset {
            self.reset();
        } else if fetch {
            self.fetch_photos();
        }

        if !self.has_searched {
            ui.label(RichText::new("Select a date and click \"Fetch Images\" to see results.").size(18.0));
            return;
        }

        let selection = PhotoFilter::new(self.rover_filter.clone(), self.camera_filter.clone());
        let displayed = apply_filters(&self.results, &selection);
        if displayed.is_empty() {
            ui.label(RichText::new("No photos found for the selected date.").color(Color32::YELLOW));
            return;
        }

        ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
            for photo in displayed {
                let listed = self.curator.contains(photo.id);
                ui.group(|ui| {
                    ui.heading(format!("Rover: {}", photo.rover_name()));
                    ui.label(RichText::new(format!("Camera: {}", photo.camera_full_name())).strong());
                    ui.label(format!("Date: {}", photo.earth_date));
                    if let Some(sol) = photo.sol {
                        ui.label(format!("Sol: {sol}"));
                    }
                    ui.hyperlink_to(photo.img_src.as_str(), &photo.img_src);
                    ui.horizontal(|ui| {
                        if ui.button("View Fullscreen").clicked() {
                            actions.push(Action::OpenImage(photo.img_src.clone()));
                        }
                        if ui.button("Copy Link").clicked() {
                            actions.push(Action::CopyLink(photo.img_src.clone()));
                        }
                        let add_label = if listed { "In List" } else { "Add to List" };
                        if ui.button(add_label).clicked() {
                            actions.push(Action::AddToList(photo.clone()));
                        }
                    });
                });
                ui.add_space(6.0);
            }
        });
    }

    fn render_list_tab(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        if ui.button("Back to Search").clicked() {
            self.tab = Tab::Photos;
        }
        ui.separator();

        if self.curator.is_empty() {
            ui.label(
                RichText::new("Your list is empty. Add some photos and they will appear here.").size(18.0),
            );
            ui.label("Add some photos to create a story.");
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false; 2])
            .max_height(ui.available_height() - 48.0)
            .show(ui, |ui| {
                for entry in self.curator.entries() {
                    let photo = &entry.photo;
                    ui.group(|ui| {
                        ui.heading(format!("Rover: {}", photo.rover_name()));
                        ui.label(RichText::new(format!("Camera: {}", photo.camera_full_name())).strong());
                        ui.label(format!("Date: {}", photo.earth_date));
                        ui.hyperlink_to(photo.img_src.as_str(), &photo.img_src);

                        let mut description = entry.description.clone();
                        let editor = ui.add(
                            egui::TextEdit::multiline(&mut description)
                                .hint_text("Write a description...")
                                .desired_rows(2)
                                .desired_width(f32::INFINITY),
                        );
                        if editor.changed() {
                            actions.push(Action::Describe(photo.id, description));
                        }

                        if ui.button(RichText::new("Remove").color(Color32::from_rgb(230, 90, 80))).clicked() {
                            actions.push(Action::Remove(photo.id));
                        }
                    });
                    ui.add_space(6.0);
                }
            });

        ui.separator();
        if ui.button(RichText::new("Navigate to Story").size(18.0)).clicked() {
            self.tab = Tab::Story;
        }
    }

    fn render_story_tab(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            if ui.button("Back to List").clicked() {
                self.tab = Tab::List;
            }
            if ui.button("Back to Photos").clicked() {
                self.tab = Tab::Photos;
            }
        });
        ui.separator();

        let story = self.curator.story();
        if story.is_empty() {
            ui.label(RichText::new("Your list is empty. Add some photos to view the story.").size(18.0));
            return;
        }

        let index = self.story_index.min(story.len() - 1);
        let slide = story[index];
        let mut next_index = index;

        ui.vertical_centered(|ui| {
            ui.label(RichText::new(slide.caption).size(22.0));
            ui.add_space(8.0);
            ui.label(format!(
                "{} · {} · {}",
                slide.photo.rover_name(),
                slide.photo.camera_full_name(),
                slide.photo.earth_date
            ));
            ui.hyperlink_to(slide.photo.img_src.as_str(), &slide.photo.img_src);
            if ui.button("View Fullscreen").clicked() {
                actions.push(Action::OpenImage(slide.photo.img_src.clone()));
            }
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.add_enabled(index > 0, egui::Button::new("◀ Previous")).clicked() {
                    next_index = index - 1;
                }
                ui.label(format!("Slide {} of {}", index + 1, story.len()));
                if ui
                    .add_enabled(index + 1 < story.len(), egui::Button::new("Next ▶"))
                    .clicked()
                {
                    next_index = index + 1;
                }
            });
        });

        self.story_index = next_index;
    }
}

fn filter_combo(
    ui: &mut Ui,
    id: &str,
    placeholder: &str,
    options: &[String],
    selected: &mut Option<String>,
) {
    let text = selected.clone().unwrap_or_else(|| placeholder.to_string());
    egui::ComboBox::from_id_salt(id)
        .selected_text(text)
        .show_ui(ui, |ui| {
            ui.selectable_value(selected, None, placeholder);
            for option in options {
                ui.selectable_value(selected, Some(option.clone()), option.as_str());
            }
        });
}

impl eframe::App for MarsStoryApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.is_dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        self.check_background_tasks();

        if self.startup.is_loading() || self.fetching.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if self.startup.is_loading() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.spinner();
                        ui.label("Loading rover information...");
                    });
                });
            });
            return;
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            self.render_tab_buttons(ui);
            self.render_notice(ui);
        });

        let mut actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Photos => self.render_photos_tab(ui, &mut actions),
            Tab::List => self.render_list_tab(ui, &mut actions),
            Tab::Story => self.render_story_tab(ui, &mut actions),
        });

        for action in actions {
            self.apply_action(action);
        }
    }
}
