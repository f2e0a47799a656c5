// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for managing knowledge-base metadata.
//! Handles layout, the connection form, and wiring to the background workers.

pub mod components;

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use eframe::egui;

use crate::config::Config;
use crate::logic::client::{HttpBackend, MetadataBackend};
use crate::mvu::{self, AppModel, Command, Msg};
use crate::ui::components::connection::{self, ConnectionMsg, ConnectionSettings};
use crate::ui::components::documents::{self, DocumentsMsg};
use crate::ui::components::manage_modal;

/// Backend shared with the workers; replaced when the connection changes.
type SharedBackend = Arc<RwLock<Arc<dyn MetadataBackend>>>;

/// Stateful egui application for the metadata manager.
pub struct KbMetaApp {
    model: AppModel,
    inbox: Vec<Msg>,
    backend: SharedBackend,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
}

impl KbMetaApp {
    pub fn new(config: &Config, backend: Arc<dyn MetadataBackend>) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();
        let backend: SharedBackend = Arc::new(RwLock::new(backend));

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().clamp(2, 4))
            .unwrap_or(2);
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let backend = Arc::clone(&backend);
            std::thread::spawn(move || {
                for cmd in cmd_rx.iter() {
                    let current = current_backend(&backend);
                    let msg = mvu::run_command(cmd, current.as_ref());
                    let _ = msg_tx.send(msg);
                }
            });
        }

        let first = match config.dataset_id() {
            Some(dataset_id) => Msg::Documents(DocumentsMsg::Load(dataset_id.to_string())),
            None => Msg::Connection(ConnectionMsg::Open),
        };

        Self {
            model: AppModel::from_config(config),
            inbox: vec![first],
            backend,
            cmd_tx,
            msg_rx,
        }
    }

    /// Swap in a backend for `settings` and report the outcome as a message.
    fn reconnect(&self, settings: ConnectionSettings) -> Msg {
        match HttpBackend::new(
            &settings.base_url,
            settings.api_key.as_deref(),
            settings.timeout,
        ) {
            Ok(http) => {
                tracing::info!(base_url = http.base_url(), "reconnected");
                let http: Arc<dyn MetadataBackend> = Arc::new(http);
                match self.backend.write() {
                    Ok(mut guard) => *guard = http,
                    Err(poisoned) => *poisoned.into_inner() = http,
                }
                Msg::Connected(Ok(settings))
            }
            Err(err) => Msg::Connected(Err(format!("{err:#}"))),
        }
    }

    fn process_messages(&mut self) {
        let mut queue: VecDeque<Msg> = std::mem::take(&mut self.inbox).into();
        while let Some(msg) = queue.pop_front() {
            let mut commands = Vec::new();
            mvu::update(&mut self.model, msg, &mut commands);
            for cmd in commands {
                match cmd {
                    Command::Reconnect(settings) => queue.push_back(self.reconnect(settings)),
                    other => {
                        if self.cmd_tx.send(other).is_ok() {
                            self.model.pending_commands += 1;
                        }
                    }
                }
            }
        }
    }
}

fn current_backend(shared: &SharedBackend) -> Arc<dyn MetadataBackend> {
    match shared.read() {
        Ok(guard) => Arc::clone(&guard),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

impl eframe::App for KbMetaApp {
    // Required by eframe 0.34; rendering happens in `update`, which eframe still calls first.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}

    /// Drains worker results, applies queued messages, and renders one frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }
        self.process_messages();
        if self.model.pending_commands > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Knowledge-base metadata");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_space(2.0);
                    egui::widgets::global_theme_preference_switch(ui);
                    ui.separator();
                    if ui
                        .button(format!("{} Connection", egui_phosphor::regular::PLUGS))
                        .clicked()
                    {
                        self.inbox.push(Msg::Connection(ConnectionMsg::Open));
                    }
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            let doc_msgs = documents::view(ui, &self.model.documents);
            self.inbox.extend(doc_msgs.into_iter().map(Msg::Documents));
        });

        let manage_msgs = manage_modal::view(ctx, &self.model.manage);
        self.inbox.extend(manage_msgs.into_iter().map(Msg::Manage));

        let conn_msgs = connection::view(ctx, &self.model.connection);
        self.inbox.extend(conn_msgs.into_iter().map(Msg::Connection));
    }
}

impl KbMetaApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        let text = self.model.status.as_deref().unwrap_or("Ready");
        let display = if self.model.pending_commands > 0 {
            format!("{}  ({} working…)", text, self.model.pending_commands)
        } else {
            text.to_string()
        };
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(display).color(egui::Color32::from_gray(68)));
            if self.model.pending_commands > 0 {
                ui.add(egui::Spinner::new().size(14.0)).on_hover_text(format!(
                    "{} request(s) in flight",
                    self.model.pending_commands
                ));
            }
        });
    }
}
