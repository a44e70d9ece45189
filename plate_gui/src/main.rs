use eframe::egui;
use plate_core::{
    ExportRequest, FileStore, Fill, PatternId, PlateFormat, Region, Runtime, StyleKey, export,
    stats, style, well_id,
};

fn main() -> eframe::Result<()> {
    env_logger::init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Plate Designer",
        options,
        Box::new(|_cc| Ok(Box::new(PlateApp::new(data_dir)))),
    )
}

/// What the label dialog is holding while it is open.
struct LabelDialog {
    label: String,
    style: StyleKey,
    well_count: usize,
    error: Option<String>,
    needs_focus: bool,
}

impl LabelDialog {
    fn new(well_count: usize) -> Self {
        Self {
            label: String::new(),
            style: StyleKey::default_color(),
            well_count,
            error: None,
            needs_focus: true,
        }
    }
}

struct PlateApp {
    rt: Runtime,

    // UI state
    dialog: Option<LabelDialog>,
    confirm_clear: bool,
    include_legend: bool,
    grid_rect: Option<egui::Rect>,
    legend_rect: Option<egui::Rect>,
    pending_export: Option<ExportRequest>,
    status: Option<String>,
    last_error: Option<String>,
}

impl PlateApp {
    fn new(data_dir: String) -> Self {
        let blobs = FileStore::new(data_dir);
        Self {
            rt: Runtime::new(Box::new(blobs)),
            dialog: None,
            confirm_clear: false,
            include_legend: true,
            grid_rect: None,
            legend_rect: None,
            pending_export: None,
            status: None,
            last_error: None,
        }
    }

    /// The screen region handed to the rasterizer: the plate card, widened
    /// to take the legend panel in when the user asked for it.
    fn export_region(&self) -> Option<Region> {
        let mut rect = self.grid_rect?;
        if self.include_legend {
            if let Some(legend) = self.legend_rect {
                rect = rect.union(legend);
            }
        }
        Some(Region {
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        })
    }

    fn start_export(&mut self, ctx: &egui::Context) {
        match export::request(self.rt.active(), self.export_region(), self.include_legend) {
            Ok(req) => {
                self.pending_export = Some(req);
                ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    /// Crops the viewport screenshot to the requested region and writes the
    /// PNG. Failures surface once; the layout itself is never touched.
    fn finish_export(&mut self, screenshot: &egui::ColorImage, pixels_per_point: f32) {
        let Some(req) = self.pending_export.take() else {
            return;
        };
        match crop_and_save(screenshot, pixels_per_point, &req) {
            Ok(()) => {
                self.status = Some(format!("Exported {}", req.file_name));
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(format!("export failed: {e:#}")),
        }
    }
}

fn crop_and_save(
    screenshot: &egui::ColorImage,
    pixels_per_point: f32,
    req: &ExportRequest,
) -> anyhow::Result<()> {
    let [img_w, img_h] = screenshot.size;

    let x0 = ((req.region.x * pixels_per_point).floor().max(0.0) as usize).min(img_w);
    let y0 = ((req.region.y * pixels_per_point).floor().max(0.0) as usize).min(img_h);
    let x1 = (((req.region.x + req.region.width) * pixels_per_point).ceil() as usize).min(img_w);
    let y1 = (((req.region.y + req.region.height) * pixels_per_point).ceil() as usize).min(img_h);
    if x1 <= x0 || y1 <= y0 {
        anyhow::bail!("plate region is outside the captured frame");
    }

    let (w, h) = (x1 - x0, y1 - y0);
    let mut out = image::RgbaImage::new(w as u32, h as u32);
    for y in 0..h {
        for x in 0..w {
            let c = screenshot.pixels[(y0 + y) * img_w + (x0 + x)];
            out.put_pixel(x as u32, y as u32, image::Rgba([c.r(), c.g(), c.b(), c.a()]));
        }
    }
    out.save(&req.file_name)?;
    Ok(())
}

/// "#rrggbb" to a Color32; anything unparseable renders as white so a bad
/// stored color is visible instead of crashing the paint pass.
fn hex_color(hex: &str) -> egui::Color32 {
    let s = hex.strip_prefix('#').unwrap_or(hex);
    if s.len() == 6 && s.is_ascii() {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&s[0..2], 16),
            u8::from_str_radix(&s[2..4], 16),
            u8::from_str_radix(&s[4..6], 16),
        ) {
            return egui::Color32::from_rgb(r, g, b);
        }
    }
    egui::Color32::WHITE
}

/// Draws one of the black/white textures inside `rect`. White ground is
/// painted first; everything else is clipped ink.
fn paint_pattern(painter: &egui::Painter, rect: egui::Rect, pattern: PatternId) {
    use egui::{Color32, Pos2, Stroke, pos2, vec2};

    painter.rect_filled(rect, 2.0, Color32::WHITE);
    let painter = painter.with_clip_rect(rect);
    let ink = Color32::BLACK;
    let stroke = Stroke::new(1.0, ink);
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());

    let hline = |y: f32| painter.line_segment([pos2(l, y), pos2(r, y)], stroke);
    let vline = |x: f32| painter.line_segment([pos2(x, t), pos2(x, b)], stroke);

    match pattern {
        PatternId::StripesHorizontal => {
            let mut y = t + 2.0;
            while y < b {
                hline(y);
                y += 4.0;
            }
        }
        PatternId::StripesVertical => {
            let mut x = l + 2.0;
            while x < r {
                vline(x);
                x += 4.0;
            }
        }
        PatternId::DiagonalUp => {
            let mut o = 0.0;
            while o < rect.width() + rect.height() {
                painter.line_segment([pos2(l + o, b), pos2(l + o - rect.height(), t)], stroke);
                o += 5.0;
            }
        }
        PatternId::DiagonalDown => {
            let mut o = -rect.height();
            while o < rect.width() {
                painter.line_segment([pos2(l + o, t), pos2(l + o + rect.height(), b)], stroke);
                o += 5.0;
            }
        }
        PatternId::Crosshatch => {
            let mut y = t + 2.0;
            while y < b {
                hline(y);
                y += 4.0;
            }
            let mut x = l + 2.0;
            while x < r {
                vline(x);
                x += 4.0;
            }
        }
        PatternId::DiagonalCrosshatch => {
            let mut o = 0.0;
            while o < rect.width() + rect.height() {
                painter.line_segment([pos2(l + o, b), pos2(l + o - rect.height(), t)], stroke);
                painter.line_segment(
                    [pos2(l + o - rect.height(), b), pos2(l + o, t)],
                    stroke,
                );
                o += 6.0;
            }
        }
        PatternId::DotsSmall => {
            let mut y = t + 3.0;
            while y < b {
                let mut x = l + 3.0;
                while x < r {
                    painter.circle_filled(pos2(x, y), 1.0, ink);
                    x += 5.0;
                }
                y += 5.0;
            }
        }
        PatternId::DotsLarge => {
            let mut y = t + 4.0;
            while y < b {
                let mut x = l + 4.0;
                while x < r {
                    painter.circle_filled(pos2(x, y), 2.2, ink);
                    x += 8.0;
                }
                y += 8.0;
            }
        }
        PatternId::Grid => {
            let mut y = t;
            while y < b {
                hline(y);
                y += 6.0;
            }
            let mut x = l;
            while x < r {
                vline(x);
                x += 6.0;
            }
        }
        PatternId::Checkerboard => {
            let cell = 4.0;
            let mut row = 0;
            let mut y = t;
            while y < b {
                let mut col = 0;
                let mut x = l;
                while x < r {
                    if (row + col) % 2 == 0 {
                        painter.rect_filled(
                            egui::Rect::from_min_size(pos2(x, y), vec2(cell, cell)),
                            0.0,
                            ink,
                        );
                    }
                    x += cell;
                    col += 1;
                }
                y += cell;
                row += 1;
            }
        }
        PatternId::Zigzag => {
            let mut y = t + 3.0;
            while y < b {
                let mut x = l;
                let mut up = true;
                while x < r {
                    let (y1, y2) = if up { (y + 2.0, y - 2.0) } else { (y - 2.0, y + 2.0) };
                    painter.line_segment([pos2(x, y1), pos2(x + 3.0, y2)], stroke);
                    x += 3.0;
                    up = !up;
                }
                y += 7.0;
            }
        }
        PatternId::Waves => {
            let mut y = t + 3.0;
            while y < b {
                let mut x = l;
                let mut prev = pos2(x, y);
                while x < r {
                    x += 2.0;
                    let next = pos2(x, y + 2.0 * ((x - l) * 0.8).sin());
                    painter.line_segment([prev, next], stroke);
                    prev = next;
                }
                y += 7.0;
            }
        }
        PatternId::Bricks => {
            let (bw, bh) = (8.0, 5.0);
            let mut row = 0;
            let mut y = t;
            while y < b {
                hline(y);
                let offset = if row % 2 == 0 { 0.0 } else { bw / 2.0 };
                let mut x = l + offset;
                while x < r {
                    painter.line_segment([pos2(x, y), pos2(x, (y + bh).min(b))], stroke);
                    x += bw;
                }
                y += bh;
                row += 1;
            }
        }
        PatternId::Triangles => {
            let step = 8.0;
            let mut y = t + step;
            while y < b + step {
                let mut x = l;
                while x < r {
                    painter.add(egui::Shape::convex_polygon(
                        vec![
                            pos2(x, y),
                            pos2(x + step, y),
                            pos2(x + step / 2.0, y - step * 0.7),
                        ],
                        Color32::TRANSPARENT,
                        stroke,
                    ));
                    x += step;
                }
                y += step;
            }
        }
        PatternId::Diamonds => {
            let step = 8.0;
            let mut y = t + step / 2.0;
            while y < b + step {
                let mut x = l + step / 2.0;
                while x < r + step {
                    painter.add(egui::Shape::closed_line(
                        vec![
                            pos2(x, y - step / 2.0),
                            pos2(x + step / 2.0, y),
                            pos2(x, y + step / 2.0),
                            pos2(x - step / 2.0, y),
                        ],
                        stroke,
                    ));
                    x += step;
                }
                y += step;
            }
        }
        PatternId::Honeycomb => {
            let step = 7.0;
            let mut row = 0;
            let mut y = t + 3.0;
            while y < b + step {
                let offset = if row % 2 == 0 { 0.0 } else { step / 2.0 };
                let mut x = l + 3.0 + offset;
                while x < r + step {
                    painter.circle_stroke(pos2(x, y), 3.0, stroke);
                    x += step;
                }
                y += step * 0.85;
                row += 1;
            }
        }
        PatternId::Speckle => {
            // Deterministic scatter so the texture doesn't shimmer between
            // frames.
            let mut y = t;
            let mut iy = 0u32;
            while y < b {
                let mut x = l;
                let mut ix = 0u32;
                while x < r {
                    if (ix.wrapping_mul(31).wrapping_add(iy.wrapping_mul(17))) % 5 == 0 {
                        painter.circle_filled(pos2(x + 1.5, y + 1.5), 1.0, ink);
                    }
                    x += 4.0;
                    ix += 1;
                }
                y += 4.0;
                iy += 1;
            }
        }
        PatternId::Rings => {
            let center = rect.center();
            let max = rect.width().max(rect.height());
            let mut radius = 2.0;
            while radius < max {
                painter.circle_stroke(center, radius, stroke);
                radius += 4.0;
            }
        }
        PatternId::Weave => {
            let cell = 6.0;
            let mut row = 0;
            let mut y = t;
            while y < b {
                let mut col = 0;
                let mut x = l;
                while x < r {
                    let mid: Pos2 = pos2(x + cell / 2.0, y + cell / 2.0);
                    if (row + col) % 2 == 0 {
                        painter.line_segment(
                            [pos2(x + 1.0, mid.y), pos2(x + cell - 1.0, mid.y)],
                            stroke,
                        );
                    } else {
                        painter.line_segment(
                            [pos2(mid.x, y + 1.0), pos2(mid.x, y + cell - 1.0)],
                            stroke,
                        );
                    }
                    x += cell;
                    col += 1;
                }
                y += cell;
                row += 1;
            }
        }
    }
}

/// Paints a resolved fill into a rect; used identically for wells and legend
/// swatches.
fn paint_fill(painter: &egui::Painter, rect: egui::Rect, fill: &Fill) {
    match fill {
        Fill::Solid(color) => {
            painter.rect_filled(rect, 2.0, hex_color(color));
        }
        Fill::Pattern(p) => paint_pattern(painter, rect, *p),
    }
}

impl PlateApp {
    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Plate Designer");
                ui.separator();
                ui.label(self.rt.active().to_string());
            });

            ui.horizontal(|ui| {
                for format in PlateFormat::ALL {
                    let active = self.rt.active() == format;
                    if ui
                        .selectable_label(active, format!("{} wells", format.size()))
                        .clicked()
                    {
                        self.rt.set_active(format);
                        self.dialog = None;
                    }
                }

                ui.separator();
                ui.checkbox(&mut self.include_legend, "Export with legend");
                if ui.button("Export PNG").clicked() {
                    self.start_export(ctx);
                }
            });

            if let Some(status) = &self.status {
                ui.label(status.clone());
            }
            if let Some(err) = &self.last_error {
                ui.colored_label(egui::Color32::RED, format!("Error: {err}"));
            }
        });
    }

    fn legend_panel(&mut self, ctx: &egui::Context) {
        let response = egui::SidePanel::right("legend")
            .min_width(230.0)
            .show(ctx, |ui| {
                let legend = self.rt.legend();

                ui.horizontal(|ui| {
                    ui.heading("Global stats");
                    ui.label(format!("{} groups", legend.len()));
                });
                ui.separator();

                if legend.is_empty() {
                    ui.label("No data yet.");
                    ui.small("Drag over wells on the left to label them.");
                } else {
                    let columns = stats::legend_columns(legend.len());
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        egui::Grid::new("legend_grid")
                            .num_columns(columns)
                            .spacing([12.0, 6.0])
                            .show(ui, |ui| {
                                for (i, entry) in legend.iter().enumerate() {
                                    let resolved = style::resolve(&entry.style, false);
                                    ui.horizontal(|ui| {
                                        let (rect, _) = ui.allocate_exact_size(
                                            egui::vec2(14.0, 14.0),
                                            egui::Sense::hover(),
                                        );
                                        paint_fill(ui.painter(), rect, &resolved.fill);
                                        ui.painter().rect_stroke(
                                            rect,
                                            2.0,
                                            egui::Stroke::new(1.0, hex_color(&resolved.border)),
                                        );
                                        ui.label(&entry.label);
                                        ui.label(format!("{} wells", entry.count));
                                    });
                                    if (i + 1) % columns == 0 {
                                        ui.end_row();
                                    }
                                }
                            });
                    });
                }

                ui.separator();
                if ui.button("Clear current plate").clicked() {
                    self.confirm_clear = true;
                }
            });
        self.legend_rect = Some(response.response.rect);
    }

    fn plate_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let format = self.rt.active();
            ui.heading(format.to_string());
            ui.add_space(6.0);

            let (rows, cols) = (format.rows(), format.cols());
            let avail = ui.available_size();
            let cell = ((avail.x - 16.0) / cols as f32)
                .min((avail.y - 16.0) / rows as f32)
                .clamp(24.0, 72.0);
            let gap = 4.0;
            let grid_size = egui::vec2(
                cols as f32 * cell + (cols - 1) as f32 * gap,
                rows as f32 * cell + (rows - 1) as f32 * gap,
            );

            let (grid_rect, response) =
                ui.allocate_exact_size(grid_size, egui::Sense::click_and_drag());
            self.grid_rect = Some(grid_rect);

            let well_at = |pos: egui::Pos2| -> Option<String> {
                if !grid_rect.contains(pos) {
                    return None;
                }
                let col = ((pos.x - grid_rect.left()) / (cell + gap)) as usize;
                let row = ((pos.y - grid_rect.top()) / (cell + gap)) as usize;
                if row >= rows || col >= cols {
                    return None;
                }
                // Ignore hits inside the gap between cells.
                let cell_rect = egui::Rect::from_min_size(
                    grid_rect.min
                        + egui::vec2(col as f32 * (cell + gap), row as f32 * (cell + gap)),
                    egui::vec2(cell, cell),
                );
                cell_rect.contains(pos).then(|| well_id(row, col))
            };

            // Pointer wiring: press on a well starts the drag, the hovered
            // well while dragging grows it, a release anywhere finishes it
            // (released outside the grid counts as the global pointer-up).
            let pressed = ctx.input(|i| i.pointer.primary_pressed());
            let released = ctx.input(|i| i.pointer.any_released());
            let pointer = ctx.input(|i| i.pointer.interact_pos());
            if self.dialog.is_none() && !self.confirm_clear {
                if pressed {
                    if let Some(id) = pointer.and_then(well_at) {
                        self.rt.pointer_down(&id);
                    }
                }
                if self.rt.selection.is_selecting() {
                    if let Some(id) = pointer.and_then(well_at) {
                        self.rt.pointer_enter(&id);
                    }
                    if released {
                        if let Some(ids) = self.rt.pointer_up() {
                            self.dialog = Some(LabelDialog::new(ids.len()));
                        }
                    }
                }
            }

            // Tooltip for the hovered well.
            let hovered = response.hover_pos().and_then(|pos| well_at(pos));
            if let Some(id) = &hovered {
                if let Some(well) = self.rt.store.get(format).well(id) {
                    let name = if well.label.is_empty() {
                        "unnamed"
                    } else {
                        &well.label
                    };
                    response.clone().on_hover_text(format!("Well {id}\nLabel: {name}"));
                }
            }

            // Paint pass.
            let painter = ui.painter_at(grid_rect);
            let grid = self.rt.store.get(format).clone();
            for (idx, well) in grid.wells.iter().enumerate() {
                let row = idx / cols;
                let col = idx % cols;
                let rect = egui::Rect::from_min_size(
                    grid_rect.min
                        + egui::vec2(col as f32 * (cell + gap), row as f32 * (cell + gap)),
                    egui::vec2(cell, cell),
                );

                let selected = self.rt.selection.contains(&well.id);
                let resolved = style::resolve(&well.color, selected);

                paint_fill(&painter, rect, &resolved.fill);
                painter.rect_stroke(
                    rect,
                    2.0,
                    egui::Stroke::new(1.5, hex_color(&resolved.border)),
                );

                let text = well.display_text();
                let font = egui::FontId::proportional((cell * 0.3).clamp(9.0, 14.0));
                if let Some(outline) = &resolved.text_outline {
                    let oc = hex_color(outline);
                    for offset in [
                        egui::vec2(-1.0, 0.0),
                        egui::vec2(1.0, 0.0),
                        egui::vec2(0.0, -1.0),
                        egui::vec2(0.0, 1.0),
                    ] {
                        painter.text(
                            rect.center() + offset,
                            egui::Align2::CENTER_CENTER,
                            &text,
                            font.clone(),
                            oc,
                        );
                    }
                }
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    &text,
                    font,
                    hex_color(&resolved.text),
                );
            }
        });
    }

    fn label_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &mut self.dialog else {
            return;
        };
        let mut apply = false;
        let mut cancel = false;

        egui::Window::new("Label selection")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!("{} wells selected", dialog.well_count));

                ui.add_space(4.0);
                ui.label("Group name");
                let edit = ui.text_edit_singleline(&mut dialog.label);
                if dialog.needs_focus {
                    edit.request_focus();
                    dialog.needs_focus = false;
                }
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    apply = true;
                }

                ui.add_space(4.0);
                ui.label("Color");
                ui.horizontal_wrapped(|ui| {
                    for preset in style::PRESET_COLORS {
                        let selected = dialog.style == StyleKey::Color(preset.to_string());
                        let (rect, resp) = ui
                            .allocate_exact_size(egui::vec2(20.0, 20.0), egui::Sense::click());
                        ui.painter().rect_filled(rect, 4.0, hex_color(preset));
                        if selected {
                            ui.painter().rect_stroke(
                                rect,
                                4.0,
                                egui::Stroke::new(2.0, egui::Color32::DARK_BLUE),
                            );
                        }
                        if resp.clicked() {
                            dialog.style = StyleKey::Color(preset.to_string());
                        }
                    }
                });

                ui.add_space(4.0);
                ui.label("Or a texture");
                let current = match &dialog.style {
                    StyleKey::Pattern(p) => p.display_name(),
                    StyleKey::Color(_) => "(none)",
                };
                egui::ComboBox::from_id_salt("pattern_pick")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(
                            matches!(dialog.style, StyleKey::Color(_)),
                            "(none)",
                        )
                        .clicked()
                        {
                            dialog.style = StyleKey::default_color();
                        }
                        for p in PatternId::ALL {
                            let selected = dialog.style == StyleKey::Pattern(p);
                            if ui.selectable_label(selected, p.display_name()).clicked() {
                                dialog.style = StyleKey::Pattern(p);
                            }
                        }
                    });

                if let Some(err) = &dialog.error {
                    ui.colored_label(egui::Color32::RED, err.clone());
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    if ui.button("Apply").clicked() {
                        apply = true;
                    }
                });
            });

        if apply {
            let label = dialog.label.clone();
            let style = dialog.style.clone();
            match self.rt.commit(&label, Some(style)) {
                Ok(n) => {
                    self.status = Some(format!("Labeled {n} wells as '{label}'"));
                    self.dialog = None;
                }
                Err(e) => {
                    // Store untouched, selection retained; let the user fix
                    // the input.
                    if let Some(dialog) = &mut self.dialog {
                        dialog.error = Some(e.to_string());
                    }
                }
            }
        } else if cancel {
            self.rt.cancel_selection();
            self.dialog = None;
        }
    }

    fn clear_dialog(&mut self, ctx: &egui::Context) {
        if !self.confirm_clear {
            return;
        }
        let mut done = false;
        egui::Window::new("Clear plate")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!("Empty the {}?", self.rt.active()));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        done = true;
                    }
                    if ui.button("Clear").clicked() {
                        self.rt.clear_active();
                        self.status = Some(format!("Cleared the {}", self.rt.active()));
                        done = true;
                    }
                });
            });
        if done {
            self.confirm_clear = false;
        }
    }
}

impl eframe::App for PlateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // A finished screenshot arrives as an input event on a later frame.
        let screenshot = ctx.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        if let Some(image) = screenshot {
            let ppp = ctx.pixels_per_point();
            self.finish_export(&image, ppp);
        }

        self.top_bar(ctx);
        self.legend_panel(ctx);
        self.plate_panel(ctx);
        self.label_dialog(ctx);
        self.clear_dialog(ctx);
    }
}
