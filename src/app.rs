//! Desktop reviewer UI and state management.
//! Handles study packs, flashcard review sessions, and page highlights.

use study_core::config::Config;
use study_core::database::{SqliteTimerStore, db, timer_store::timer_key};
use study_core::export::json::{export_json_to_path, import_json, store_imported_pack};
use study_core::handlers::{self, CreateHighlightRequest, UpdateHighlightRequest};
use study_core::models::anchor::{self, render_page_highlights};
use study_core::models::highlight::group_by_color;
use study_core::models::scheduler::{format_interval, preview_intervals};
use study_core::models::{
    Highlight, HighlightColor, Rating, Rect, ReviewSession, ReviewStats, SessionPhase, StudyPack,
    StudyTimer, load_timer, sync_tick,
};
use study_core::{DataIntegrityWarning, Result};
use chrono::{DateTime, Local, Utc};
use eframe::egui;
use rusqlite::Connection;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Base size of the page canvas at 100% zoom (US Letter at 50 dpi).
const PAGE_SIZE: egui::Vec2 = egui::vec2(425.0, 550.0);

#[derive(Default, PartialEq)]
enum AppScreen {
    #[default]
    Main,
    Review,
    Highlights,
}

/// State of the highlights screen for the selected pack
struct HighlightPanel {
    page_number: u32,
    zoom: f32,
    color: HighlightColor,
    selection_text: String,
    drag_start: Option<egui::Pos2>,
    drag_end: Option<egui::Pos2>,
    /// Selection and page box, both in screen pixels, captured when the drag ended.
    pending: Option<(Rect, Rect)>,
    filter_color: Option<HighlightColor>,
    note_edits: HashMap<i64, String>,
    highlights: Vec<Highlight>,
    warnings: Vec<DataIntegrityWarning>,
}

impl Default for HighlightPanel {
    fn default() -> Self {
        Self {
            page_number: 1,
            zoom: 1.0,
            color: HighlightColor::Yellow,
            selection_text: String::new(),
            drag_start: None,
            drag_end: None,
            pending: None,
            filter_color: None,
            note_edits: HashMap::new(),
            highlights: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl HighlightPanel {
    /// Switches the displayed page; a selection made on another page is dropped.
    fn set_page(&mut self, page_number: u32) {
        if page_number != self.page_number {
            self.page_number = page_number;
            self.pending = None;
            self.drag_start = None;
            self.drag_end = None;
        }
    }
}

pub struct StudyApp {
    conn: Connection,
    config: Config,
    packs: Vec<StudyPack>,
    stats: HashMap<i64, ReviewStats>,
    selected_pack: Option<usize>,
    new_pack_name: String,
    current_front: String,
    current_back: String,

    current_screen: AppScreen,
    session: Option<ReviewSession>,
    panel: HighlightPanel,

    timer: StudyTimer,
    last_timer_sync: Instant,

    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    show_export_dialog: bool,
    message: Option<String>,
}

fn format_date(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d").to_string()
}

fn format_elapsed(secs: i64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn to_color32(color: HighlightColor, alpha: u8) -> egui::Color32 {
    let [r, g, b] = color.rgb();
    egui::Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

fn to_rect(r: egui::Rect) -> Rect {
    Rect::new(r.min.x as f64, r.min.y as f64, r.width() as f64, r.height() as f64)
}

fn to_egui_rect(r: &Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(r.left as f32, r.top as f32),
        egui::vec2(r.width as f32, r.height as f32),
    )
}

impl eframe::App for StudyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick_timer();

        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
            AppScreen::Highlights => self.render_highlights_screen(ctx),
        }

        if self.timer.is_running() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            self.pause_timer();
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            let mut export_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Study Pack")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a study pack to export:");
                    ui.separator();
                    for (i, pack) in self.packs.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", pack.name, pack.flashcards.len()))
                            .clicked()
                        {
                            export_index = Some(i);
                        }
                    }
                    ui.separator();
                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if let Some(message) = self.message.clone() {
            egui::Window::new("Study")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.message = None;
                    }
                });
        }
    }
}

impl StudyApp {
    pub fn new(conn: Connection, config: Config) -> Result<Self> {
        let packs = db::load_all_study_packs(&conn)?;
        let has_packs = !packs.is_empty();
        let mut app = Self {
            selected_pack: None,
            packs,
            conn,
            config,
            stats: HashMap::new(),
            new_pack_name: String::new(),
            current_front: String::new(),
            current_back: String::new(),
            current_screen: AppScreen::Main,
            session: None,
            panel: HighlightPanel::default(),
            timer: StudyTimer::default(),
            last_timer_sync: Instant::now(),
            show_confirmation_dialog: false,
            allowed_to_close: false,
            show_export_dialog: false,
            message: None,
        };
        if has_packs {
            app.select_pack(0);
        }
        app.refresh_stats();
        Ok(app)
    }

    /// Shows a failed operation to the user and logs it.
    fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{}", e);
                self.message = Some(e.to_string());
                None
            }
        }
    }

    fn now(&self) -> DateTime<Utc> {
        db::get_current_date(&self.conn).unwrap_or_else(|_| Utc::now())
    }

    fn selected_pack_id(&self) -> Option<i64> {
        self.selected_pack
            .and_then(|i| self.packs.get(i))
            .map(|pack| pack.id)
    }

    fn reload_packs(&mut self) {
        let loaded = db::load_all_study_packs(&self.conn);
        if let Some(packs) = self.report(loaded) {
            self.packs = packs;
            if self.selected_pack.is_none_or(|i| i >= self.packs.len()) {
                self.selected_pack = if self.packs.is_empty() { None } else { Some(0) };
            }
        }
        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        let now = self.now();
        let mut stats = HashMap::new();
        for pack in &self.packs {
            match handlers::list_reviews(&self.conn, &self.config.user_id, pack.id, now) {
                Ok(listed) => {
                    stats.insert(pack.id, listed.stats);
                }
                Err(e) => log::warn!("Could not load stats of pack {}: {}", pack.id, e),
            }
        }
        self.stats = stats;
    }

    // ==================== Study timer ====================

    fn tick_timer(&mut self) {
        let Some(pack_id) = self.selected_pack_id() else {
            return;
        };
        let period = Duration::from_secs(self.config.timer_sync_secs);
        if !self.timer.is_running() || self.last_timer_sync.elapsed() < period {
            return;
        }
        self.last_timer_sync = Instant::now();
        let store = SqliteTimerStore::new(&self.conn);
        if let Err(e) = sync_tick(&self.timer, &store, &timer_key(pack_id), Utc::now()) {
            log::warn!("Timer sync failed: {}", e);
        }
    }

    fn pause_timer(&mut self) {
        self.timer.pause(Utc::now());
        if let Some(pack_id) = self.selected_pack_id() {
            let store = SqliteTimerStore::new(&self.conn);
            if let Err(e) = sync_tick(&self.timer, &store, &timer_key(pack_id), Utc::now()) {
                log::warn!("Timer sync failed: {}", e);
            }
        }
    }

    fn select_pack(&mut self, index: usize) {
        if self.selected_pack == Some(index) {
            return;
        }
        self.pause_timer();
        self.selected_pack = Some(index);
        self.panel = HighlightPanel::default();
        if let Some(pack_id) = self.selected_pack_id() {
            let store = SqliteTimerStore::new(&self.conn);
            let restored = load_timer(&store, &timer_key(pack_id), Utc::now());
            self.timer = self.report(restored).unwrap_or_default();
        }
    }

    // ==================== Main screen ====================

    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format_date(self.now()));
                if ui.button("Next Day").clicked() {
                    let advanced = db::advance_day(&self.conn);
                    self.report(advanced);
                    self.refresh_stats();
                }
                ui.separator();
                if ui.button("Export Pack").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Pack").clicked() {
                    self.handle_import();
                }
            });
            ui.separator();

            ui.heading("Create Study Pack");
            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut self.new_pack_name);
                if ui.button("Create").clicked() && !self.new_pack_name.trim().is_empty() {
                    let created = db::new_study_pack(self.new_pack_name.trim(), &self.conn);
                    if self.report(created).is_some() {
                        self.new_pack_name.clear();
                        self.reload_packs();
                    }
                }
            });
            ui.separator();

            ui.heading(format!("Study Packs ({})", self.packs.len()));

            // Actions are applied after the list is drawn
            let mut action_select: Option<usize> = None;
            let mut action_review: Option<usize> = None;
            let mut action_highlights: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_salt("packs_list")
                .max_height(180.0)
                .show(ui, |ui| {
                    for (i, pack) in self.packs.iter().enumerate() {
                        let stats = self.stats.get(&pack.id).cloned().unwrap_or_default();
                        ui.horizontal(|ui| {
                            let label = format!(
                                "{}. {} ({} cards, {} due, {} mastered, {}% accuracy)",
                                i + 1,
                                pack.name,
                                pack.flashcards.len(),
                                stats.due_cards,
                                stats.mastered_cards,
                                stats.accuracy
                            );
                            if ui.selectable_label(self.selected_pack == Some(i), label).clicked() {
                                action_select = Some(i);
                            }
                            if ui.button("Review").clicked() {
                                action_review = Some(i);
                            }
                            if ui.button("Highlights").clicked() {
                                action_highlights = Some(i);
                            }
                        });
                    }
                });

            if let Some(i) = action_select {
                self.select_pack(i);
            }
            if let Some(i) = action_review {
                self.select_pack(i);
                self.start_review_session();
            }
            if let Some(i) = action_highlights {
                self.select_pack(i);
                self.open_highlights();
            }

            ui.separator();
            self.render_timer(ui);
            ui.separator();

            let Some(pack_index) = self.selected_pack else {
                ui.label("Select a study pack to add flashcards");
                return;
            };
            let Some(pack) = self.packs.get(pack_index) else {
                return;
            };
            let pack_id = pack.id;
            ui.heading(format!("Selected: {}", pack.name));
            if let Some(stats) = self.stats.get(&pack_id) {
                ui.label(format!(
                    "learning {} · young {} · mature {} · mastered {} · {} reviews",
                    stats.learning_cards,
                    stats.young_cards,
                    stats.mature_cards,
                    stats.mastered_cards,
                    stats.total_reviews
                ));
            }

            ui.horizontal(|ui| {
                ui.label("Front:");
                ui.text_edit_singleline(&mut self.current_front);
            });
            ui.horizontal(|ui| {
                ui.label("Back:");
                ui.text_edit_singleline(&mut self.current_back);
            });
            if ui.button("Add Flashcard").clicked()
                && !self.current_front.trim().is_empty()
                && !self.current_back.trim().is_empty()
            {
                let added = db::add_flashcard(
                    pack_id,
                    self.current_front.trim(),
                    self.current_back.trim(),
                    &self.conn,
                );
                if self.report(added).is_some() {
                    self.current_front.clear();
                    self.current_back.clear();
                    self.reload_packs();
                }
            }

            ui.separator();
            if let Some(pack) = self.packs.get(pack_index) {
                ui.heading(format!("Flashcards ({})", pack.flashcards.len()));
                egui::ScrollArea::vertical()
                    .id_salt("flashcards_list")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for (i, card) in pack.flashcards.iter().enumerate() {
                            ui.group(|ui| {
                                ui.label(format!("{}. {}", i + 1, card.front));
                                ui.label(format!("   {}", card.back));
                            });
                        }
                    });
            }
        });
    }

    fn render_timer(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("Study time: {}", format_elapsed(self.timer.elapsed_secs(Utc::now()))));
            if self.timer.is_running() {
                if ui.button("Pause").clicked() {
                    self.pause_timer();
                }
            } else if ui.button("Start").clicked() && self.selected_pack.is_some() {
                self.timer.start(Utc::now());
                self.last_timer_sync = Instant::now();
            }
            if ui.button("Reset").clicked() {
                self.timer.reset();
                self.pause_timer();
            }
        });
    }

    // ==================== Review screen ====================

    fn start_review_session(&mut self) {
        let Some(pack) = self.selected_pack.and_then(|i| self.packs.get(i)).cloned() else {
            return;
        };
        let now = self.now();
        let listed = handlers::list_reviews(&self.conn, &self.config.user_id, pack.id, now);
        let Some(listed) = self.report(listed) else {
            return;
        };

        let due: Vec<_> = pack
            .flashcards
            .into_iter()
            .filter(|card| listed.due_flashcard_ids.contains(&card.id))
            .map(|card| {
                let review = listed
                    .reviews
                    .iter()
                    .find(|r| r.flashcard_id == card.id)
                    .cloned();
                (card, review)
            })
            .collect();

        if due.is_empty() {
            self.message = Some(format!("Nothing due in '{}' today.", pack.name));
            return;
        }
        self.session = Some(ReviewSession::new(pack.id, pack.name, due));
        self.timer.start(Utc::now());
        self.current_screen = AppScreen::Review;
    }

    fn render_review_screen(&mut self, ctx: &egui::Context) {
        let now = self.now();
        let mut action_back = false;
        let mut action_rating: Option<Rating> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.session else {
                action_back = true;
                return;
            };
            ui.heading(format!("Reviewing: {}", session.pack_name));
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} passed ({} remaining)",
                session.passed_count(),
                session.total_count(),
                session.remaining_count()
            ));
            ui.add_space(20.0);

            if session.is_completed() {
                ui.heading("All due cards reviewed!");
                ui.add_space(20.0);
                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
                return;
            }

            let Some(card) = session.current_card() else {
                return;
            };
            let front = card.flashcard.front.clone();
            let back = card.flashcard.back.clone();
            let previews = preview_intervals(card.review.as_ref(), now);
            let show_answer = session.phase == SessionPhase::Answer;

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading(&front);
                    ui.add_space(20.0);
                    if show_answer {
                        ui.label(&back);
                    } else {
                        ui.label("(Click 'Show Answer' to reveal)");
                    }
                    ui.add_space(20.0);
                });
            });
            ui.add_space(20.0);

            if !show_answer {
                if ui.button("Show Answer").clicked() {
                    session.reveal_answer();
                }
            } else {
                ui.label("How well did you remember?");
                ui.horizontal(|ui| {
                    for (rating, days) in Rating::ALL.into_iter().zip(previews) {
                        let label = format!("{} ({})", rating, format_interval(days));
                        if ui.button(label).clicked() {
                            action_rating = Some(rating);
                        }
                    }
                });
            }

            ui.add_space(20.0);
            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }
        });

        if let Some(rating) = action_rating {
            if let Some(mut session) = self.session.take() {
                let graded = session.grade_current_card(&self.conn, &self.config.user_id, rating, now);
                self.report(graded);
                self.session = Some(session);
            }
        }
        if action_back {
            self.session = None;
            self.current_screen = AppScreen::Main;
            self.refresh_stats();
        }
    }

    // ==================== Highlights screen ====================

    fn open_highlights(&mut self) {
        self.reload_highlights();
        self.current_screen = AppScreen::Highlights;
    }

    fn reload_highlights(&mut self) {
        let Some(pack_id) = self.selected_pack_id() else {
            return;
        };
        let listed = handlers::list_highlights(&self.conn, pack_id, None, None);
        if let Some(highlights) = self.report(listed) {
            self.panel.note_edits = highlights
                .iter()
                .map(|h| (h.id, h.note.clone().unwrap_or_default()))
                .collect();
            self.panel.highlights = highlights;
        }
    }

    fn render_highlights_screen(&mut self, ctx: &egui::Context) {
        let Some(pack_id) = self.selected_pack_id() else {
            self.current_screen = AppScreen::Main;
            return;
        };

        let mut action_back = false;
        let mut action_save = false;
        let mut action_quiz: Option<HighlightColor> = None;
        let mut action_note: Option<i64> = None;
        let mut action_delete: Option<i64> = None;

        egui::SidePanel::right("highlight_list")
            .min_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Highlights");
                ui.horizontal(|ui| {
                    ui.label("Show:");
                    ui.selectable_value(&mut self.panel.filter_color, None, "all");
                    for color in HighlightColor::PALETTE {
                        ui.selectable_value(&mut self.panel.filter_color, Some(color), color.as_str());
                    }
                });

                for (color, group) in group_by_color(&self.panel.highlights) {
                    ui.horizontal(|ui| {
                        ui.colored_label(to_color32(color, 255), format!("{}: {}", color, group.len()));
                        if ui.small_button("Quiz me").clicked() {
                            action_quiz = Some(color);
                        }
                    });
                }
                ui.separator();

                egui::ScrollArea::vertical().id_salt("highlights").show(ui, |ui| {
                    for h in &self.panel.highlights {
                        if self.panel.filter_color.is_some_and(|c| c != h.color) {
                            continue;
                        }
                        ui.group(|ui| {
                            ui.colored_label(
                                to_color32(h.color, 255),
                                format!("p.{} · {}", h.page_number, h.text),
                            );
                            let note = self.panel.note_edits.entry(h.id).or_default();
                            ui.text_edit_singleline(note);
                            ui.horizontal(|ui| {
                                if ui.small_button("Save note").clicked() {
                                    action_note = Some(h.id);
                                }
                                if ui.small_button("Delete").clicked() {
                                    action_delete = Some(h.id);
                                }
                            });
                        });
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Back").clicked() {
                    action_back = true;
                }
                ui.label("Page:");
                let mut page_number = self.panel.page_number;
                ui.add(egui::DragValue::new(&mut page_number).range(1..=9999));
                self.panel.set_page(page_number);
                ui.add(egui::Slider::new(&mut self.panel.zoom, 0.5..=2.0).text("Zoom"));
            });
            ui.horizontal(|ui| {
                ui.label("Selected text:");
                ui.text_edit_singleline(&mut self.panel.selection_text);
                egui::ComboBox::from_id_salt("highlight_color")
                    .selected_text(self.panel.color.as_str())
                    .show_ui(ui, |ui| {
                        for color in HighlightColor::PALETTE {
                            ui.selectable_value(&mut self.panel.color, color, color.as_str());
                        }
                    });
                let can_save = self.panel.pending.is_some();
                if ui.add_enabled(can_save, egui::Button::new("Save highlight")).clicked() {
                    action_save = true;
                }
            });
            if !self.panel.warnings.is_empty() {
                ui.colored_label(
                    egui::Color32::from_rgb(200, 120, 0),
                    format!("{} highlight(s) on this page could not be drawn", self.panel.warnings.len()),
                );
            }
            ui.separator();

            egui::ScrollArea::both().id_salt("page").show(ui, |ui| {
                self.render_page(ui);
            });
        });

        if action_save {
            self.save_pending_highlight(pack_id);
        }
        if let Some(color) = action_quiz {
            let request = handlers::quiz_request(&self.conn, pack_id, color);
            if let Some(quiz) = self.report(request) {
                match serde_json::to_string_pretty(&quiz) {
                    Ok(json) => {
                        ctx.copy_text(json);
                        self.message = Some(format!(
                            "Quiz request for {} {} highlight(s) copied to the clipboard.",
                            quiz.highlight_count, color
                        ));
                    }
                    Err(e) => self.message = Some(e.to_string()),
                }
            }
        }
        if let Some(id) = action_note {
            let note = self.panel.note_edits.get(&id).cloned();
            let updated = handlers::update_highlight_note(&self.conn, id, &UpdateHighlightRequest { note });
            self.report(updated);
            self.reload_highlights();
        }
        if let Some(id) = action_delete {
            let deleted = handlers::delete_highlight(&self.conn, id);
            self.report(deleted);
            self.reload_highlights();
        }
        if action_back {
            self.current_screen = AppScreen::Main;
        }
    }

    /// Draws the page box with its highlights and handles drag selection.
    fn render_page(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(PAGE_SIZE * self.panel.zoom, egui::Sense::drag());
        let page_rect = response.rect;
        painter.rect_filled(page_rect, 0.0, egui::Color32::WHITE);
        painter.rect_stroke(page_rect, 0.0, egui::Stroke::new(1.0, egui::Color32::GRAY));

        let (rendered, warnings) = render_page_highlights(
            &self.panel.highlights,
            self.panel.page_number,
            &to_rect(page_rect),
        );
        for r in rendered {
            if self.panel.filter_color.is_some_and(|c| c != r.color) {
                continue;
            }
            painter.rect_filled(to_egui_rect(&r.rect), 0.0, to_color32(r.color, 110));
        }
        self.panel.warnings = warnings;

        if response.drag_started() {
            self.panel.drag_start = response.interact_pointer_pos();
            self.panel.pending = None;
        }
        if let Some(pos) = response.interact_pointer_pos() {
            self.panel.drag_end = Some(pos);
        }
        if let (Some(start), Some(end)) = (self.panel.drag_start, self.panel.drag_end) {
            let selection = egui::Rect::from_two_pos(start, end).intersect(page_rect);
            painter.rect_stroke(
                selection,
                0.0,
                egui::Stroke::new(1.5, to_color32(self.panel.color, 255)),
            );
            if response.drag_stopped() {
                self.panel.pending = Some((to_rect(selection), to_rect(page_rect)));
                self.panel.drag_start = None;
                self.panel.drag_end = None;
            }
        }
        if let Some((selection, _)) = &self.panel.pending {
            painter.rect_filled(to_egui_rect(selection), 0.0, to_color32(self.panel.color, 70));
        }
    }

    fn save_pending_highlight(&mut self, pack_id: i64) {
        let Some((selection, page)) = self.panel.pending else {
            return;
        };
        let anchored = anchor::anchor_with_pixels(&selection, &page);
        let Some(coordinates) = self.report(anchored.map_err(Into::into)) else {
            return;
        };
        let request = CreateHighlightRequest {
            study_pack_id: pack_id,
            page_number: self.panel.page_number,
            coordinates,
            color: self.panel.color.to_string(),
            text: self.panel.selection_text.clone(),
        };
        let created = handlers::create_highlight(&self.conn, &request, Utc::now());
        if self.report(created).is_some() {
            self.panel.pending = None;
            self.panel.selection_text.clear();
            self.reload_highlights();
        }
    }

    // ==================== Import / export ====================

    fn handle_export(&mut self, index: usize) {
        if let Some(pack) = self.packs.get(index).cloned() {
            if let Some(path) = rfd::FileDialog::new()
                .set_file_name(format!("{}.json", pack.name))
                .add_filter("JSON files", &["json"])
                .save_file()
            {
                let exported = export_json_to_path(&pack, &path);
                if self.report(exported).is_some() {
                    self.message = Some(format!("Study pack '{}' exported successfully!", pack.name));
                }
            }
        }
        self.show_export_dialog = false;
    }

    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let imported = import_json(&path);
        let Some(pack) = self.report(imported) else {
            return;
        };
        let stored = store_imported_pack(&pack, &self.conn);
        if self.report(stored).is_some() {
            self.message = Some(format!(
                "Study pack '{}' imported with {} cards!",
                pack.name,
                pack.flashcards.len()
            ));
            self.reload_packs();
        }
    }
}
