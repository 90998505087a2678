//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter
//! can remain agnostic of Macroquad's UI types. The panel lists every
//! discovered category with its selection marker and exposes the three
//! sliders of the current selection.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use rollout_reef_rendering::{PanelCommand, PanelView};

/// Snapshot of the control panel's UI layout for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PanelUiContext {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin.
    pub background: Color,
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Renders the control panel and reports at most one interaction.
///
/// Category row clicks win over slider movement so a selection change never
/// drags the previous row's slider values along with it.
pub(crate) fn draw_panel_ui(ui: &mut Ui, view: &PanelView, context: PanelUiContext) -> Option<PanelCommand> {
    let mut skin = ui.default_skin();

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .text_color(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut selected_row = None;
    let mut adjustment = None;

    let _ = ui.window(hash!("rollout_panel"), context.origin, context.size, |ui| {
        ui.label(None, "Rollout tuning");

        if view.entries.is_empty() {
            ui.label(None, "Waiting for the first response...");
        }

        for entry in &view.entries {
            let marker = if entry.selected { "*" } else { " " };
            let row = format!("[{marker}] {}", capitalize(entry.category.wire_name()));
            if ui.button(None, row.as_str()) {
                selected_row = Some(PanelCommand::Select(entry.category));
            }
        }

        if let Some(entry) = view.entries.iter().find(|entry| entry.selected) {
            let mut return_500 = entry.return_500 as f32;
            let mut delay_percent = entry.delay_percent as f32;
            let mut delay_length = entry.delay_length as f32;

            ui.slider(hash!("return500"), "Error %", 0f32..100f32, &mut return_500);
            ui.slider(
                hash!("delay_percent"),
                "Delay %",
                0f32..100f32,
                &mut delay_percent,
            );
            ui.slider(
                hash!("delay_length"),
                "Delay s",
                0f32..10f32,
                &mut delay_length,
            );

            let moved = Moved {
                return_500: return_500.round() as u32,
                delay_percent: delay_percent.round() as u32,
                delay_length: delay_length.round() as u32,
            };
            if moved.return_500 != entry.return_500
                || moved.delay_percent != entry.delay_percent
                || moved.delay_length != entry.delay_length
            {
                adjustment = Some(PanelCommand::Adjust {
                    return_500: moved.return_500,
                    delay_percent: moved.delay_percent,
                    delay_length: moved.delay_length,
                });
            }
        }
    });

    ui.pop_skin();

    selected_row.or(adjustment)
}

struct Moved {
    return_500: u32,
    delay_percent: u32,
    delay_length: u32,
}
