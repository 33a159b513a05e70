use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::{App, Viewport};
use crate::atlas::Atlas;
use crate::globe::{self, GLOBE_RADIUS, SURFACE_CENTER};
use crate::places;

const SPACE_BG: Color = Color::Rgb(10, 10, 15);
const ATMOSPHERE: (f64, f64, f64) = (100.0, 150.0, 200.0);
const OUTLINE_FG: Color = Color::Rgb(60, 95, 125);
const LAND_FG: Color = Color::Rgb(100, 150, 110);
const PIN_CORE: Color = Color::Rgb(255, 240, 180);
const HUD_DIM: Color = Color::Rgb(80, 80, 100);
const HUD_TEXT: Color = Color::Rgb(180, 200, 220);
const AMBER: Color = Color::Rgb(255, 200, 100);

const LAND_CHAR: char = '▒';

pub struct GlobeWidget<'a> {
    pub app: &'a mut App,
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = area.inner(ratatui::layout::Margin {
            vertical: 1,
            horizontal: 1,
        });
        if inner.width < 8 || inner.height < 4 {
            return;
        }

        // Square viewport over the logical surface: two columns per row of
        // height so the sphere comes out round.
        let rows = inner.height.min(inner.width / 2);
        let cols = rows * 2;
        let viewport = Viewport {
            x: inner.x + (inner.width - cols) / 2,
            y: inner.y + (inner.height - rows) / 2,
            width: cols,
            height: rows,
        };
        self.app.viewport = Some(viewport);

        let rotation = self.app.rotation;

        // Star cells, looked up during the background pass so the sphere
        // always paints over them.
        let mut star_cells: HashMap<(u16, u16), (char, Color)> = HashMap::new();
        for star in &self.app.stars {
            if let Some(cell) = viewport.surface_to_cell(star.x, star.y) {
                star_cells.insert(cell, (star_glyph(star.radius), star_color(star.opacity)));
            }
        }

        // Half a row of thickness for the rim outline.
        let outline_eps = globe::SURFACE_SIZE / viewport.height as f64 / GLOBE_RADIUS * 0.5;

        for row in viewport.y..viewport.y + viewport.height {
            for col in viewport.x..viewport.x + viewport.width {
                let (sx, sy) = viewport.cell_to_surface(col, row);
                let dx = sx - SURFACE_CENTER.0;
                let dy = sy - SURFACE_CENTER.1;
                let d = (dx * dx + dy * dy).sqrt() / GLOBE_RADIUS;

                let Some(cell) = buf.cell_mut((col, row)) else {
                    continue;
                };
                cell.set_char(' ').set_bg(SPACE_BG);

                if d <= 1.0 {
                    cell.set_bg(sphere_shade(sx, sy));
                } else {
                    if d <= 1.15 {
                        let alpha = (1.15 - d) / 0.15 * 0.3;
                        cell.set_bg(tint(SPACE_BG, ATMOSPHERE, alpha));
                    }
                    if let Some(&(glyph, color)) = star_cells.get(&(col, row)) {
                        cell.set_char(glyph).set_fg(color);
                    }
                }
                if (d - 1.0).abs() <= outline_eps {
                    cell.set_char('·').set_fg(OUTLINE_FG);
                }
            }
        }

        match &self.app.atlas {
            Atlas::Ready(rings) => {
                for ring in rings.iter() {
                    for run in globe::ring_runs(ring, rotation) {
                        for pair in run.windows(2) {
                            stroke(buf, viewport, pair[0], pair[1]);
                        }
                        if run.len() >= 3 {
                            stroke(buf, viewport, run[run.len() - 1], run[0]);
                        }
                    }
                }
            }
            Atlas::Loading => {
                let label = "Loading map...";
                let col = viewport.x + (viewport.width.saturating_sub(label.len() as u16)) / 2;
                let row = viewport.y + viewport.height / 2;
                buf.set_string(col, row, label, Style::default().fg(HUD_DIM));
            }
            // Degraded mode: sphere and pins only, for the rest of the session.
            Atlas::Failed => {}
        }

        for place in &places::VISITED {
            let p = globe::project(place.lat, place.lon, rotation);
            if !p.visible {
                continue;
            }
            let Some((col, row)) = viewport.surface_to_cell(p.x, p.y) else {
                continue;
            };
            let brightness = 0.7 + 0.3 * p.depth;
            let pin = Color::Rgb(
                (255.0 * brightness) as u8,
                (200.0 * brightness) as u8,
                (100.0 * brightness) as u8,
            );

            // Glow halo on the neighboring cells for the front-most pins.
            if p.depth > 0.6 {
                for halo_col in [col.saturating_sub(1), col + 1] {
                    if let Some(cell) = buf.cell_mut((halo_col, row)) {
                        if cell.symbol() == " " {
                            cell.set_char('·').set_fg(pin);
                        }
                    }
                }
            }
            if let Some(cell) = buf.cell_mut((col, row)) {
                cell.set_char(pin_glyph(p.depth))
                    .set_fg(if p.depth > 0.8 { PIN_CORE } else { pin })
                    .set_style(Style::default().add_modifier(Modifier::BOLD));
            }
        }

        if let Some(hit) = self.app.hover() {
            render_tooltip(buf, viewport, places::VISITED[hit.index].name, hit.x, hit.y);
        }
    }
}

fn star_glyph(radius: f64) -> char {
    if radius > 1.0 {
        '✦'
    } else if radius > 0.5 {
        '•'
    } else {
        '·'
    }
}

fn star_color(opacity: f64) -> Color {
    let level = (255.0 * opacity) as u8;
    Color::Rgb(level, level, level)
}

fn pin_glyph(depth: f64) -> char {
    if depth > 0.66 {
        '◉'
    } else if depth > 0.33 {
        '●'
    } else {
        '•'
    }
}

// Radial night-side shading, light biased to the upper left.
fn sphere_shade(sx: f64, sy: f64) -> Color {
    let light = (
        SURFACE_CENTER.0 - GLOBE_RADIUS * 0.3,
        SURFACE_CENTER.1 - GLOBE_RADIUS * 0.3,
    );
    let dx = sx - light.0;
    let dy = sy - light.1;
    let t = ((dx * dx + dy * dy).sqrt() / (GLOBE_RADIUS * 1.3)).clamp(0.0, 1.0);

    if t < 0.7 {
        lerp_rgb((30.0, 40.0, 60.0), (15.0, 20.0, 35.0), t / 0.7)
    } else {
        lerp_rgb((15.0, 20.0, 35.0), (5.0, 10.0, 20.0), (t - 0.7) / 0.3)
    }
}

fn lerp_rgb(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> Color {
    Color::Rgb(
        (a.0 + (b.0 - a.0) * t) as u8,
        (a.1 + (b.1 - a.1) * t) as u8,
        (a.2 + (b.2 - a.2) * t) as u8,
    )
}

fn tint(base: Color, toward: (f64, f64, f64), alpha: f64) -> Color {
    let Color::Rgb(r, g, b) = base else {
        return base;
    };
    Color::Rgb(
        (r as f64 + (toward.0 - r as f64) * alpha) as u8,
        (g as f64 + (toward.1 - g as f64) * alpha) as u8,
        (b as f64 + (toward.2 - b as f64) * alpha) as u8,
    )
}

// Bresenham stroke between two surface points, in cell space.
fn stroke(buf: &mut Buffer, viewport: Viewport, from: (f64, f64), to: (f64, f64)) {
    let (Some(start), Some(end)) = (
        viewport.surface_to_cell(from.0, from.1),
        viewport.surface_to_cell(to.0, to.1),
    ) else {
        return;
    };

    let (mut x, mut y) = (start.0 as i32, start.1 as i32);
    let (x1, y1) = (end.0 as i32, end.1 as i32);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = if x < x1 { 1 } else { -1 };
    let step_y = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
            cell.set_char(LAND_CHAR).set_fg(LAND_FG);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += step_x;
        }
        if e2 <= dx {
            err += dx;
            y += step_y;
        }
    }
}

fn render_tooltip(buf: &mut Buffer, viewport: Viewport, name: &str, pin_x: f64, pin_y: f64) {
    let Some((pin_col, pin_row)) = viewport.surface_to_cell(pin_x, pin_y) else {
        return;
    };
    if pin_row < 4 {
        return;
    }

    let width = name.len() as u16 + 4;
    let area = buf.area;
    let mut col = pin_col.saturating_sub(width / 2).max(area.x);
    if col + width > area.right() {
        col = area.right().saturating_sub(width);
    }
    let tooltip_area = Rect {
        x: col,
        y: pin_row - 4,
        width: width.min(area.width),
        height: 3,
    };

    Clear.render(tooltip_area, buf);
    Paragraph::new(Line::from(Span::styled(
        name,
        Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
    )))
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(AMBER))
            .style(Style::default().bg(SPACE_BG)),
    )
    .render(tooltip_area, buf);

    // Notch pointing from the box down to the pin.
    if let Some(cell) = buf.cell_mut((pin_col, pin_row - 1)) {
        cell.set_char('▾').set_fg(AMBER);
    }
}

// Atlas status dot for the frame border, blinking while the fetch is
// outstanding.
fn atlas_indicator(atlas: &Atlas, tick: u64) -> (char, Color, String) {
    match atlas {
        Atlas::Loading => {
            let dot = if tick % 6 < 3 { '◌' } else { '○' };
            (dot, AMBER, "LINKING".to_string())
        }
        Atlas::Ready(rings) => (
            '●',
            Color::Rgb(0, 255, 100),
            format!("{} OUTLINES", rings.len()),
        ),
        Atlas::Failed => ('○', Color::Rgb(255, 50, 50), "OFFLINE".to_string()),
    }
}

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let title = Line::from(vec![
        Span::styled("╡ ", Style::default().fg(HUD_DIM)),
        Span::styled(
            "TERRA-SCOPE",
            Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" v0.1.0 ", Style::default().fg(HUD_DIM)),
        Span::styled("╞", Style::default().fg(HUD_DIM)),
    ]);

    let (dot, dot_color, label) = atlas_indicator(&app.atlas, app.tick_count);
    let status_bar = Line::from(vec![
        Span::styled("╡ ", Style::default().fg(HUD_DIM)),
        Span::styled(format!("{dot}"), Style::default().fg(dot_color)),
        Span::styled(format!(" {label} "), Style::default().fg(HUD_TEXT)),
        Span::styled("╞", Style::default().fg(HUD_DIM)),
    ]);

    let block = Block::default()
        .title_top(title)
        .title_bottom(status_bar)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(OUTLINE_FG))
        .style(Style::default().bg(SPACE_BG));

    f.render_widget(block, area);

    let hovered = app.hover().map(|hit| hit.index);
    let globe = GlobeWidget { app: &mut *app };
    f.render_widget(globe, area);

    render_places_panel(f, hovered);
    render_footer(f);
}

fn render_places_panel(f: &mut Frame, hovered: Option<usize>) {
    let area = f.area();

    let mut lines = Vec::with_capacity(places::VISITED.len());
    for (index, place) in places::VISITED.iter().enumerate() {
        let style = if hovered == Some(index) {
            Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(HUD_TEXT)
        };
        let marker = if place.country { "◦ " } else { "· " };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(HUD_DIM)),
            Span::styled(place.name, style),
        ]));
    }

    let panel_height = (lines.len() as u16 + 2).min(area.height.saturating_sub(3));
    let panel_area = Rect {
        x: area.right().saturating_sub(24).max(area.x),
        y: area.y + 1,
        width: 24.min(area.width),
        height: panel_height,
    };

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![
                    Span::styled("┤ ", Style::default().fg(HUD_DIM)),
                    Span::styled("VISITED", Style::default().fg(AMBER)),
                    Span::styled(" ├", Style::default().fg(HUD_DIM)),
                ]))
                .border_style(Style::default().fg(OUTLINE_FG)),
        )
        .style(Style::default().fg(HUD_TEXT).bg(SPACE_BG));

    f.render_widget(Clear, panel_area);
    f.render_widget(panel, panel_area);
}

fn render_footer(f: &mut Frame) {
    let area = f.area();

    let legend = Line::from(vec![
        Span::styled(" [", Style::default().fg(HUD_DIM)),
        Span::styled("Q", Style::default().fg(AMBER)),
        Span::styled("]uit  [", Style::default().fg(HUD_DIM)),
        Span::styled("←→", Style::default().fg(AMBER)),
        Span::styled("]Spin  [", Style::default().fg(HUD_DIM)),
        Span::styled("↑↓", Style::default().fg(AMBER)),
        Span::styled("]Tilt  │  drag the globe, hover a pin", Style::default().fg(HUD_DIM)),
    ]);

    let footer_area = Rect {
        x: area.x + 1,
        y: area.bottom().saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    };

    let footer = Paragraph::new(legend).style(Style::default().bg(SPACE_BG));
    f.render_widget(footer, footer_area);
}
