use ratatui::prelude::*;
use ratatui::widgets::{Block, Gauge, Paragraph, Widget};

use crate::color::Color as AppColor;
use crate::paint::{PaintState, Progress};

/// Job progress: a gauge, counters, the current color and the key help.
pub struct ProgressWidget<'a> {
    title: &'a str,
    state: PaintState,
    pixels_done: usize,
    pixels_total: usize,
    latest: Option<&'a Progress>,
}

impl<'a> ProgressWidget<'a> {
    pub fn new(
        title: &'a str,
        state: PaintState,
        (pixels_done, pixels_total): (usize, usize),
        latest: Option<&'a Progress>,
    ) -> Self {
        Self {
            title,
            state,
            pixels_done,
            pixels_total,
            latest,
        }
    }

    fn ratio(&self) -> f64 {
        if self.pixels_total == 0 {
            return 0.0;
        }
        (self.pixels_done as f64 / self.pixels_total as f64).clamp(0.0, 1.0)
    }
}

fn to_color(c: AppColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Black or white, whichever reads better on `c`.
fn contrast_fg(c: AppColor) -> Color {
    if c.relative_luminance() > 0.4 {
        Color::Black
    } else {
        Color::White
    }
}

fn state_style(state: PaintState) -> Style {
    let color = match state {
        PaintState::Running => Color::Green,
        PaintState::Paused => Color::Yellow,
        PaintState::Completed => Color::Cyan,
        PaintState::Stopped => Color::Magenta,
        PaintState::Failed => Color::Red,
        PaintState::Idle => Color::DarkGray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn color_line(progress: Option<&Progress>) -> Line<'static> {
    let Some(p) = progress else {
        return Line::from(Span::styled(
            "waiting for the first color...",
            Style::default().fg(Color::DarkGray),
        ));
    };
    let swatch = Span::styled(
        format!(" {} ", p.color),
        Style::default().bg(to_color(p.color)).fg(contrast_fg(p.color)),
    );
    let page = match p.category {
        Some(category) => format!("  page {category}"),
        None => "  skipped".to_string(),
    };
    Line::from(vec![swatch, Span::raw(page)])
}

impl Widget for ProgressWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(format!(" {} ", self.title));
        let inner = block.inner(area);
        block.render(area, buf);

        let [gauge_area, stats_area, color_area, state_area, help_area] =
            Layout::vertical([Constraint::Length(1); 5]).areas(inner);

        let ratio = self.ratio();
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .ratio(ratio)
            .label(format!("{:.1}%", ratio * 100.0))
            .render(gauge_area, buf);

        let groups = self
            .latest
            .map(|p| format!(" | color {}/{}", p.group_index, p.group_count))
            .unwrap_or_default();
        Paragraph::new(format!(
            "{}/{} ({:.1}%){groups}",
            self.pixels_done,
            self.pixels_total,
            ratio * 100.0
        ))
        .render(stats_area, buf);

        Paragraph::new(color_line(self.latest)).render(color_area, buf);

        Paragraph::new(Line::from(vec![
            Span::raw("state: "),
            Span::styled(self.state.to_string(), state_style(self.state)),
        ]))
        .render(state_area, buf);

        let help = if self.state.is_terminal() {
            "any key: close"
        } else {
            "o: pause/resume  i/Esc: stop  q: stop and quit"
        };
        Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray)))
            .render(help_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buf: &Buffer) -> String {
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn renders_counters_and_current_color() {
        let progress = Progress {
            pixels_done: 25,
            pixels_total: 100,
            color: AppColor::new(0xCF, 0x35, 0x4D),
            group_index: 2,
            group_count: 7,
            category: Some(2),
        };
        let area = Rect::new(0, 0, 60, 7);
        let mut buf = Buffer::empty(area);
        ProgressWidget::new("art.json", PaintState::Paused, (25, 100), Some(&progress))
            .render(area, &mut buf);

        let text = text(&buf);
        assert!(text.contains("art.json"));
        assert!(text.contains("25/100 (25.0%) | color 2/7"));
        assert!(text.contains("#CF354D"));
        assert!(text.contains("page 2"));
        assert!(text.contains("state: paused"));
        assert!(text.contains("o: pause/resume"));
    }

    #[test]
    fn empty_job_renders_without_dividing_by_zero() {
        let area = Rect::new(0, 0, 60, 7);
        let mut buf = Buffer::empty(area);
        ProgressWidget::new("x", PaintState::Completed, (0, 0), None).render(area, &mut buf);

        let text = text(&buf);
        assert!(text.contains("0/0 (0.0%)"));
        assert!(text.contains("waiting for the first color"));
        assert!(text.contains("any key: close"));
    }
}
