//! Main application for the Universal Converter GUI

// Command-line and environment configuration
mod config;
// Error type shared by every module
mod error;
// Supported formats and endpoint routing
mod format;
// Selected file, status line and history records
mod model;
// Revocable handles to converted output
mod blob;
// Convertibility state machine
mod widget;
// Multipart upload to the conversion service
mod client;
// Preview decoding and the embedded PDF icon
mod preview;
// Saving results to disk
mod save;

use std::path::Path;

use clap::Parser;
// eframe/egui for GUI application framework
use eframe::{egui, App, Frame};
use egui::{Color32, TextureHandle, TextureOptions, Visuals};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// FileDialog for picking the input file
use rfd::FileDialog;
use tokio::{
    runtime::Runtime,
    sync::oneshot::{self, error::TryRecvError},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{Args, Theme};
use error::ConvertError;
use format::FileFormat;
use model::StatusKind;
use widget::{ConversionOutcome, WidgetState};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Runtime> = OnceCell::new();

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 38, 38);
const PREVIEW_SIZE: egui::Vec2 = egui::vec2(320.0, 240.0);

/// Program entry point: parses arguments, initializes runtime and launches GUI
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = args.server_url()?;
    let runtime = RUNTIME.get_or_try_init(Runtime::new)?;
    let http = client::build_client()?;
    info!("Using conversion service at {}", server);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 620.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    let visuals = match args.theme {
        Theme::Dark => Visuals::dark(),
        Theme::Light => Visuals::light(),
    };
    let preload = args.file;

    eframe::run_native(
        "Universal Converter",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(visuals);
            let mut app = ConverterApp::new(runtime, http, server);
            if let Some(path) = preload {
                app.load_path(&path);
            }
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to open window: {e}"))
}

/// A request that has been sent and not yet answered
struct Pending {
    generation: u64,
    target: FileFormat,
    rx: oneshot::Receiver<ConversionOutcome>,
}

/// Application state for the GUI
struct ConverterApp {
    /// Input, target format, result and status
    state: WidgetState,
    /// Runtime the uploads run on
    runtime: &'static Runtime,
    /// Shared HTTP client
    http: reqwest::Client,
    /// Base URL of the conversion service
    server: String,
    /// The in-flight conversion, if any
    pending: Option<Pending>,
    /// Input preview, keyed by input generation
    input_preview: Option<(u64, Option<TextureHandle>)>,
    /// Output preview, keyed by result handle id
    output_preview: Option<(u64, Option<TextureHandle>)>,
    /// Blocking message for rejected files
    alert: Option<String>,
    /// Files are being dragged over the window
    drag_hover: bool,
}

impl ConverterApp {
    fn new(runtime: &'static Runtime, http: reqwest::Client, server: String) -> Self {
        Self {
            state: WidgetState::new(),
            runtime,
            http,
            server,
            pending: None,
            input_preview: None,
            output_preview: None,
            alert: None,
            drag_hover: false,
        }
    }

    fn report(&mut self, result: Result<(), ConvertError>) {
        if let Err(e) = result {
            if e.is_alert() {
                self.alert = Some(e.to_string());
            }
        }
    }

    fn load_path(&mut self, path: &Path) {
        let result = self.state.load_path(path);
        self.report(result);
    }

    fn browse(&mut self) {
        let extensions: Vec<&str> = FileFormat::ALL.iter().map(|f| f.extension()).collect();
        if let Some(path) = FileDialog::new()
            .add_filter("Images & PDF", &extensions)
            .pick_file()
        {
            self.load_path(&path);
        }
    }

    fn accept_dropped(&mut self, file: egui::DroppedFile) {
        let result = if let Some(path) = &file.path {
            self.state.load_path(path)
        } else if let Some(bytes) = file.bytes {
            self.state.load_bytes(&file.name, bytes)
        } else {
            Ok(())
        };
        self.report(result);
    }

    fn start_conversion(&mut self, ctx: &egui::Context) {
        let Some(request) = self.state.begin_conversion() else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        self.pending = Some(Pending {
            generation: request.generation,
            target: request.target,
            rx,
        });

        let http = self.http.clone();
        let server = self.server.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = client::run_conversion(http, server, request).await;
            let _ = tx.send(outcome);
            ctx.request_repaint();
        });
    }

    fn poll_pending(&mut self) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        let outcome = match pending.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            // Task died without answering
            Err(TryRecvError::Closed) => ConversionOutcome {
                generation: pending.generation,
                target: pending.target,
                result: Err(ConvertError::request_failed("Conversion failed")),
            },
        };
        self.pending = None;
        self.state.finish_conversion(outcome);
    }

    fn download(&mut self) {
        let Some(path) = self.state.result().and_then(save::prompt_save_path) else {
            return;
        };
        // Failures land in the status line.
        let _ = self.state.save_result(&path);
    }

    /// Keeps preview textures in step with the current input and result.
    fn refresh_previews(&mut self, ctx: &egui::Context) {
        match self.state.input() {
            None => self.input_preview = None,
            Some(file) => {
                let key = self.state.generation();
                if self.input_preview.as_ref().map(|(k, _)| *k) != Some(key) {
                    debug!("Building input preview for {}", file.name);
                    let tex = preview::render(file.format, &file.bytes)
                        .map(|img| ctx.load_texture("input-preview", img, TextureOptions::LINEAR));
                    self.input_preview = Some((key, tex));
                }
            }
        }

        match self.state.result() {
            None => self.output_preview = None,
            Some(handle) => {
                let key = handle.id();
                if self.output_preview.as_ref().map(|(k, _)| *k) != Some(key) {
                    let format = handle.format;
                    let tex = self
                        .state
                        .result_bytes()
                        .and_then(|bytes| preview::render(format, &bytes))
                        .map(|img| ctx.load_texture("output-preview", img, TextureOptions::LINEAR));
                    self.output_preview = Some((key, tex));
                }
            }
        }
    }

    fn input_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Input");
        ui.separator();

        if self.state.input().is_none() {
            let fill = if self.drag_hover {
                ui.visuals().widgets.hovered.bg_fill
            } else {
                ui.visuals().extreme_bg_color
            };
            let zone = egui::Frame::group(ui.style()).fill(fill).show(ui, |ui| {
                ui.set_min_size(PREVIEW_SIZE);
                ui.centered_and_justified(|ui| {
                    ui.label("Drop an image or PDF here, or click to browse");
                });
            });
            if zone.response.interact(egui::Sense::click()).clicked() {
                self.browse();
            }
        } else {
            if let Some((_, Some(tex))) = &self.input_preview {
                ui.add(egui::Image::new(tex).max_size(PREVIEW_SIZE));
            }
            ui.horizontal(|ui| {
                if let Some(file) = self.state.input() {
                    ui.label(&file.name);
                }
                if ui.add(egui::Button::new("✖ Remove").fill(ERROR_COLOR)).clicked() {
                    self.state.clear_input();
                }
            });
        }

        ui.add_space(8.0);
        ui.label("Convert to:");
        ui.horizontal_wrapped(|ui| {
            for format in FileFormat::TARGETS {
                let active = self.state.target() == Some(format);
                if ui.selectable_label(active, format.label()).clicked() {
                    self.state.select_format(format);
                }
            }
        });

        ui.add_space(8.0);
        let label = if self.state.is_converting() { "Converting..." } else { "Convert" };
        let convert = ui.add_enabled(self.state.can_convert(), egui::Button::new(label));
        if convert.clicked() {
            self.start_conversion(ui.ctx());
        }

        if let Some(status) = self.state.status() {
            ui.horizontal(|ui| match status.kind {
                StatusKind::Loading => {
                    ui.add(egui::Spinner::new());
                    ui.label(&status.text);
                }
                StatusKind::Error => {
                    ui.colored_label(ERROR_COLOR, &status.text);
                }
            });
        }
    }

    fn output_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Output");
        ui.separator();

        match &self.output_preview {
            Some((_, Some(tex))) => {
                ui.add(egui::Image::new(tex).max_size(PREVIEW_SIZE));
            }
            Some((_, None)) => {
                ui.label("Preview unavailable");
            }
            None => {
                ui.weak("Your converted file will appear here");
            }
        }

        if let Some(details) = self.state.details() {
            ui.label(details);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let download = ui.add_enabled(self.state.can_download(), egui::Button::new("Download"));
            if download.clicked() {
                self.download();
            }
            if let Some(saved) = self.state.saved_to().map(Path::to_path_buf) {
                if ui.button("Show in folder").clicked() {
                    save::reveal_in_file_manager(&saved);
                }
            }
        });
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 1️⃣ Settle a finished conversion
        self.poll_pending();

        // 2️⃣ Drag & drop: highlight while hovering, take the first dropped file
        let (hovering, dropped) = ctx.input(|i| (!i.raw.hovered_files.is_empty(), i.raw.dropped_files.clone()));
        self.drag_hover = hovering;
        if let Some(file) = dropped.into_iter().next() {
            self.accept_dropped(file);
        }

        self.refresh_previews(ctx);

        // 3️⃣ Right-side panel: conversions made this session
        egui::SidePanel::right("history_panel").show(ctx, |ui| {
            ui.heading("Recent Conversions");
            ui.separator();

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    for record in self.state.history().iter().rev() {
                        ui.group(|ui| {
                            ui.label(&record.filename);
                            ui.label(format!(
                                "{} → {}",
                                record.source_format.to_uppercase(),
                                record.target_format.label()
                            ));
                            ui.weak(format!(
                                "{} • {}",
                                model::format_details(record.file_size, record.target_format),
                                record.timestamp.format("%H:%M:%S")
                            ));
                        });
                    }
                });
        });

        // 4️⃣ Main panel: input on the left, output on the right
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Universal Converter");
            ui.add_space(4.0);
            ui.columns(2, |cols| {
                self.input_panel(&mut cols[0]);
                self.output_panel(&mut cols[1]);
            });
        });

        // 5️⃣ Alert for rejected files
        if let Some(message) = self.alert.clone() {
            egui::Window::new("Cannot open file")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                });
        }
    }
}
