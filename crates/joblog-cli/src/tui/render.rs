//! Widgets for each screen. Pure: reads the dashboard, never changes it.

use joblog_core::dashboard::Dashboard;
use joblog_core::job::JobStatus;
use joblog_core::nav::{DownloadState, LogView, Screen, TrialsView};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use super::keys;

pub(crate) fn status_style(status: &JobStatus) -> Style {
    match status {
        JobStatus::Done => Style::default().fg(Color::Green),
        JobStatus::Failed => Style::default().fg(Color::Red),
        JobStatus::Running => Style::default().fg(Color::Cyan),
        JobStatus::Waiting => Style::default().fg(Color::Yellow),
        JobStatus::Other(_) => Style::default(),
    }
}

pub(crate) fn draw(frame: &mut Frame, dashboard: &Dashboard) {
    let search_height = if dashboard.search_input().is_some() { 3 } else { 0 };
    let [search, main, status, footer] = Layout::vertical([
        Constraint::Length(search_height),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if let Some(query) = dashboard.search_input() {
        let bar = Paragraph::new(format!("{query}_")).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search name, owner or date (regex) "),
        );
        frame.render_widget(bar, search);
    }

    match dashboard.screen() {
        Screen::Jobs => draw_jobs(frame, main, dashboard),
        Screen::Trials(view) => draw_trials(frame, main, view),
        Screen::Log(view) => draw_log(frame, main, view),
    }

    let mut line = dashboard.summary();
    if let Some(msg) = dashboard.status() {
        line.push_str(" | ");
        line.push_str(msg);
    }
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        status,
    );
    frame.render_widget(Paragraph::new(footer_line(dashboard)), footer);
}

fn footer_line(dashboard: &Dashboard) -> Line<'static> {
    let key_style = Style::default().add_modifier(Modifier::BOLD);
    let pairs: Vec<(&str, &str)> = if dashboard.search_input().is_some() {
        vec![("enter", "Apply"), ("esc", "Close"), ("backspace", "Delete")]
    } else {
        dashboard
            .legal_actions()
            .into_iter()
            .map(|a| (keys::binding(a), a.label()))
            .collect()
    };
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (key, label) in pairs {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        spans.push(Span::raw(format!(" {label}  ")));
    }
    Line::from(spans)
}

fn message(frame: &mut Frame, area: Rect, block: Block<'_>, text: String, style: Style) {
    let p = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(p, area);
}

fn draw_jobs(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Jobs ({}) ", dashboard.filter().describe()));

    if let Some(err) = dashboard.jobs_error() {
        let text = format!("Could not load jobs: {err}\n\nPress t to retry.");
        message(frame, area, block, text, Style::default().fg(Color::Red));
        return;
    }

    let jobs = dashboard.visible_jobs();
    if jobs.is_empty() {
        let text = if dashboard.is_loading() {
            "Fetching jobs..."
        } else {
            "No jobs to show."
        };
        message(frame, area, block, text.to_string(), Style::default());
        return;
    }

    let rows = jobs.iter().map(|job| {
        Row::new(vec![
            job.name.clone(),
            job.submitted.clone(),
            job.runtime.to_string(),
            job.status.to_string(),
            job.owner.clone(),
        ])
        .style(status_style(&job.status))
    });
    let widths = [
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(18),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(["Name", "Date", "Runtime", "Status", "Owner"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = TableState::default().with_selected(Some(dashboard.cursor()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_trials(frame: &mut Frame, area: Rect, view: &TrialsView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Attempts of {} ", view.job_id));

    if let Some(err) = &view.error {
        let text = format!("Could not list attempts: {err}");
        message(frame, area, block, text, Style::default().fg(Color::Red));
        return;
    }
    let attempts = match &view.attempts {
        None => {
            message(frame, area, block, "Probing attempts...".to_string(), Style::default());
            return;
        }
        Some(list) if list.is_empty() => {
            message(frame, area, block, "No attempts found.".to_string(), Style::default());
            return;
        }
        Some(list) => list,
    };

    let items: Vec<ListItem> = attempts
        .iter()
        .map(|a| {
            if a.is_final {
                ListItem::new(format!("{}  (final)", a.label())).style(Style::default().fg(Color::Green))
            } else {
                ListItem::new(a.label()).style(Style::default().fg(Color::Red))
            }
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(view.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_log(frame: &mut Frame, area: Rect, view: &LogView) {
    let (log_area, gauge_area) = if view.download.is_some() {
        let [log, gauge] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(area);
        (log, Some(gauge))
    } else {
        (area, None)
    };

    let title = match view.attempt {
        Some(n) => format!(" Log of {} (attempt {}) ", view.job_id, n + 1),
        None => format!(" Log of {} ", view.job_id),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_bottom(format!(" {} outputs ", view.outputs.len()));

    if let Some(err) = &view.error {
        let text = format!("Could not load log: {err}");
        message(frame, log_area, block, text, Style::default().fg(Color::Red));
    } else if let Some(text) = &view.text {
        let scroll = u16::try_from(view.scroll).unwrap_or(u16::MAX);
        let p = Paragraph::new(text.as_str()).block(block).scroll((scroll, 0));
        frame.render_widget(p, log_area);
    } else {
        message(frame, log_area, block, "Fetching log...".to_string(), Style::default());
    }

    let (Some(gauge_area), Some(download)) = (gauge_area, &view.download) else {
        return;
    };
    let (ratio, label) = match download {
        DownloadState::Running { progress: p, .. } => {
            let mut label = format!("{}/{} downloaded", p.completed, p.total);
            if p.failed > 0 {
                label.push_str(&format!(", {} failed", p.failed));
            }
            (p.fraction(), label)
        }
        DownloadState::Finished(report) => (1.0, report.summary()),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Download "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, gauge_area);
}
