//! Dirty-flag render loop and seat styling.
//!
//! The loop is driven by an external frame tick. Each tick asks [`RenderLoop::frame`]
//! to draw; the draw body only runs when something marked the map dirty since the
//! last drawn frame. Drawing goes through the [`Surface`] trait, so the same loop
//! feeds a browser canvas (via [`CommandSurface`]) or a test double.

use serde::Serialize;
use std::fmt;

use crate::models::{MapSize, Seat, SeatStatus, SelectionSet};

/// Side of the square drawn for each seat, in map units.
pub const SEAT_SIZE: f64 = 8.0;
/// Side of the hover outline square.
pub const HOVER_SIZE: f64 = 12.0;

/// Opaque RGB color, serialized as a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BACKGROUND: Self = Self::rgb(0x02, 0x10, 0x18);
    pub const AVAILABLE: Self = Self::rgb(0x0b, 0x8a, 0x4e);
    pub const SOLD: Self = Self::rgb(0x7f, 0x1d, 0x1d);
    pub const RESERVED: Self = Self::rgb(0xb4, 0x53, 0x09);
    pub const HELD: Self = Self::rgb(0x33, 0x41, 0x55);
    pub const SELECTED_OUTLINE: Self = Self::rgb(0xff, 0xd7, 0x00);
    pub const HOVER_OUTLINE: Self = Self::rgb(0xff, 0xff, 0xff);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

pub fn status_color(status: SeatStatus) -> Color {
    match status {
        SeatStatus::Available => Color::AVAILABLE,
        SeatStatus::Sold => Color::SOLD,
        SeatStatus::Reserved => Color::RESERVED,
        SeatStatus::Held => Color::HELD,
    }
}

/// Heatmap color: tier 1 is the cool end, tier 4 the hot end, anything else clamps.
pub fn tier_color(tier: u8) -> Color {
    let t = ((f64::from(tier) - 1.0) / 3.0).clamp(0.0, 1.0);
    let r = (80.0 + t * 160.0).floor() as u8;
    let g = (200.0 - t * 120.0).floor() as u8;
    Color::rgb(r, g, 70)
}

pub fn seat_fill(seat: &Seat, heatmap: bool) -> Color {
    if heatmap {
        tier_color(seat.price_tier)
    } else {
        status_color(seat.status)
    }
}

/// One row of the static legend.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LegendEntry {
    pub color: Color,
    pub label: &'static str,
}

pub const LEGEND: [LegendEntry; 5] = [
    LegendEntry { color: Color::AVAILABLE, label: "Available" },
    LegendEntry { color: Color::SOLD, label: "Sold" },
    LegendEntry { color: Color::RESERVED, label: "Reserved" },
    LegendEntry { color: Color::HELD, label: "Held" },
    LegendEntry { color: Color::SELECTED_OUTLINE, label: "Selected (outline)" },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn centered(x: f64, y: f64, size: f64) -> Self {
        Self {
            x: x - size / 2.0,
            y: y - size / 2.0,
            w: size,
            h: size,
        }
    }
}

/// Drawing target for the render loop.
pub trait Surface {
    /// Sets the backing-store size in device pixels.
    fn resize_backing(&mut self, width: u32, height: u32);
    /// Sets a uniform scale from map units to device pixels.
    fn set_transform(&mut self, scale: f64);
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64);
}

/// Serializable draw call, produced by [`CommandSurface`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RenderCommand {
    Resize { width: u32, height: u32 },
    SetTransform { scale: f64 },
    Clear,
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color, line_width: f64 },
}

/// Surface that records draw calls so a remote canvas can replay them.
#[derive(Debug, Default)]
pub struct CommandSurface {
    width: u32,
    height: u32,
    scale: f64,
    commands: Vec<RenderCommand>,
}

impl CommandSurface {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            ..Self::default()
        }
    }

    pub fn backing_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for CommandSurface {
    fn resize_backing(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.push(RenderCommand::Resize { width, height });
    }

    fn set_transform(&mut self, scale: f64) {
        self.scale = scale;
        self.commands.push(RenderCommand::SetTransform { scale });
    }

    fn clear(&mut self) {
        // A clear supersedes everything recorded before it except sizing
        self.commands.retain(|c| {
            matches!(c, RenderCommand::Resize { .. } | RenderCommand::SetTransform { .. })
        });
        self.commands.push(RenderCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(RenderCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) {
        self.commands
            .push(RenderCommand::StrokeRect { rect, color, line_width });
    }
}

/// Everything the draw body reads.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub map: MapSize,
    pub seats: &'a [Seat],
    pub selection: &'a SelectionSet,
    pub hover: Option<&'a Seat>,
    pub heatmap: bool,
}

/// Backing-store size for a logical map at a device pixel ratio.
pub fn backing_size(map: MapSize, device_pixel_ratio: f64) -> (u32, u32) {
    (
        (map.width * device_pixel_ratio).floor() as u32,
        (map.height * device_pixel_ratio).floor() as u32,
    )
}

/// Dirty-flag gated renderer over an optionally mounted surface.
#[derive(Debug)]
pub struct RenderLoop<S: Surface> {
    surface: Option<S>,
    dirty: bool,
    device_pixel_ratio: f64,
    frames_drawn: u64,
}

impl<S: Surface> Default for RenderLoop<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Surface> RenderLoop<S> {
    pub fn new() -> Self {
        Self {
            surface: None,
            dirty: true,
            device_pixel_ratio: 1.0,
            frames_drawn: 0,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn mount(&mut self, surface: S, map: MapSize, device_pixel_ratio: f64) {
        self.surface = Some(surface);
        self.resize(map, device_pixel_ratio);
    }

    /// Detaches the surface; later frames are no-ops until the next mount.
    pub fn unmount(&mut self) -> Option<S> {
        self.surface.take()
    }

    /// Recomputes the backing store from the logical map size and rescales the
    /// transform. Always marks the map dirty.
    pub fn resize(&mut self, map: MapSize, device_pixel_ratio: f64) {
        self.device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        if let Some(surface) = self.surface.as_mut() {
            let (width, height) = backing_size(map, self.device_pixel_ratio);
            surface.resize_backing(width, height);
            surface.set_transform(self.device_pixel_ratio);
        }
        self.dirty = true;
    }

    /// Runs one frame. Returns whether the draw body executed.
    pub fn frame(&mut self, scene: &Scene<'_>) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if !self.dirty {
            return false;
        }

        draw(surface, scene);
        self.dirty = false;
        self.frames_drawn += 1;
        true
    }
}

fn draw<S: Surface>(surface: &mut S, scene: &Scene<'_>) {
    surface.clear();
    surface.fill_rect(
        Rect { x: 0.0, y: 0.0, w: scene.map.width, h: scene.map.height },
        Color::BACKGROUND,
    );

    for seat in scene.seats {
        let rect = Rect::centered(seat.x, seat.y, SEAT_SIZE);
        surface.fill_rect(rect, seat_fill(seat, scene.heatmap));
        if scene.selection.contains(&seat.id) {
            surface.stroke_rect(rect, Color::SELECTED_OUTLINE, 2.0);
        }
    }

    if let Some(hover) = scene.hover {
        surface.stroke_rect(
            Rect::centered(hover.x, hover.y, HOVER_SIZE),
            Color::HOVER_OUTLINE,
            1.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(id: &str, status: SeatStatus, tier: u8) -> Seat {
        Seat {
            id: id.to_string(),
            x: 20.0,
            y: 20.0,
            price: 10.0,
            price_tier: tier,
            section: "A".to_string(),
            row: 1,
            col: 1,
            status,
        }
    }

    const MAP: MapSize = MapSize { width: 400.0, height: 300.0 };

    fn scene<'a>(seats: &'a [Seat], selection: &'a SelectionSet, heatmap: bool) -> Scene<'a> {
        Scene { map: MAP, seats, selection, hover: None, heatmap }
    }

    #[test]
    fn status_palette() {
        assert_eq!(status_color(SeatStatus::Available).to_string(), "#0b8a4e");
        assert_eq!(status_color(SeatStatus::Sold).to_string(), "#7f1d1d");
        assert_eq!(status_color(SeatStatus::Reserved).to_string(), "#b45309");
        assert_eq!(status_color(SeatStatus::Held).to_string(), "#334155");
    }

    #[test]
    fn tier_colors_interpolate_and_clamp() {
        assert_eq!(tier_color(1), Color::rgb(80, 200, 70));
        assert_eq!(tier_color(4), Color::rgb(240, 80, 70));
        assert_eq!(tier_color(0), tier_color(1));
        assert_eq!(tier_color(9), tier_color(4));
    }

    #[test]
    fn heatmap_overrides_status() {
        let s = seat("a", SeatStatus::Sold, 4);
        assert_eq!(seat_fill(&s, false), Color::SOLD);
        assert_eq!(seat_fill(&s, true), tier_color(4));
    }

    #[test]
    fn unmounted_loop_is_a_noop() {
        let seats = vec![seat("a", SeatStatus::Available, 1)];
        let selection = SelectionSet::default();
        let mut render: RenderLoop<CommandSurface> = RenderLoop::new();
        assert!(!render.frame(&scene(&seats, &selection, false)));
        assert!(render.is_dirty());
    }

    #[test]
    fn draws_only_when_dirty() {
        let seats = vec![seat("a", SeatStatus::Available, 1)];
        let selection = SelectionSet::default();
        let mut render = RenderLoop::new();
        render.mount(CommandSurface::new(), MAP, 1.0);

        assert!(render.frame(&scene(&seats, &selection, false)));
        assert!(!render.frame(&scene(&seats, &selection, false)));
        render.mark_dirty();
        assert!(render.frame(&scene(&seats, &selection, false)));
        assert_eq!(render.frames_drawn(), 2);
    }

    #[test]
    fn selected_seats_get_an_outline() {
        let seats = vec![seat("a", SeatStatus::Available, 1), seat("b", SeatStatus::Available, 1)];
        let mut selection = SelectionSet::default();
        selection.insert(&seats[1]);

        let mut render = RenderLoop::new();
        render.mount(CommandSurface::new(), MAP, 1.0);
        render.frame(&scene(&seats, &selection, false));

        let outlines: Vec<_> = render
            .surface()
            .map(|s| s.commands().to_vec())
            .unwrap_or_default()
            .into_iter()
            .filter(|c| matches!(c, RenderCommand::StrokeRect { color, .. } if *color == Color::SELECTED_OUTLINE))
            .collect();
        assert_eq!(outlines.len(), 1);
    }

    #[test]
    fn hover_outline_is_drawn_last() {
        let seats = vec![seat("a", SeatStatus::Sold, 1)];
        let selection = SelectionSet::default();
        let mut render = RenderLoop::new();
        render.mount(CommandSurface::new(), MAP, 2.0);
        let mut sc = scene(&seats, &selection, true);
        sc.hover = Some(&seats[0]);
        render.frame(&sc);

        let last = render.surface().and_then(|s| s.commands().last().cloned());
        assert_eq!(
            last,
            Some(RenderCommand::StrokeRect {
                rect: Rect::centered(20.0, 20.0, HOVER_SIZE),
                color: Color::HOVER_OUTLINE,
                line_width: 1.0,
            })
        );
    }

    #[test]
    fn resize_scales_backing_store() {
        let mut render = RenderLoop::new();
        render.mount(CommandSurface::new(), MAP, 1.0);
        for dpr in [1.0, 1.5, 2.0, 3.0] {
            render.resize(MAP, dpr);
            let surface = render.surface().expect("mounted");
            assert_eq!(surface.backing_size(), ((400.0 * dpr) as u32, (300.0 * dpr) as u32));
            assert_eq!(surface.scale(), dpr);
            assert!(render.is_dirty());
        }
    }
}
